use crate::domain::model::{Gender, Theme};
use crate::utils::error::{Result, StyloError};
use crate::utils::validation::{validate_path, validate_url, Validate};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "stylo")]
#[command(about = "Your AI-powered personal stylist, in the terminal")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Backend base URL, overrides --host")]
    pub base_url: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Host the client runs on; 'localhost' selects the local backend"
    )]
    pub host: Option<String>,

    #[arg(long, global = true, help = "Path to a stylo.toml settings file")]
    pub config: Option<String>,

    #[arg(long, global = true, help = "Path to the preferences file")]
    pub prefs_file: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Get outfit recommendations for a clothing item
    Recommend(RecommendArgs),
    /// Generate a single image for a prompt
    Image {
        #[arg(long)]
        prompt: String,
    },
    /// Show or change saved preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Show or change the color theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
    /// Check that the backend is up
    Health,
    /// List suggestions for colors, clothing items and styles
    Suggestions {
        #[arg(long, help = "Only show entries starting with this text")]
        prefix: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct RecommendArgs {
    #[arg(long, help = "Clothing item, e.g. shirt")]
    pub item: String,

    #[arg(long, default_value = "", help = "Specific color, e.g. red")]
    pub color: String,

    #[arg(
        long = "style",
        value_delimiter = ',',
        help = "Desired style, up to 3 (repeat or comma-separate)"
    )]
    pub styles: Vec<String>,

    #[arg(long, help = "men or women; defaults to the saved preference")]
    pub gender: Option<Gender>,

    #[arg(long, help = "Skip inspiration image generation")]
    pub no_images: bool,

    #[arg(long, help = "Print the raw streamed response instead of the board")]
    pub stream: bool,

    #[arg(long, help = "Regenerate the image of card N after it loads")]
    pub regenerate: Option<usize>,

    #[arg(long, help = "Disable ANSI colors")]
    pub no_color: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum PrefsAction {
    Show,
    SetGender { gender: Gender },
    AddStyle { style: String },
    RemoveStyle { style: String },
    ClearStyles,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ThemeAction {
    Show,
    Toggle,
    Set { theme: Theme },
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            validate_url("base_url", base_url)?;
        }
        if let Some(path) = &self.prefs_file {
            validate_path("prefs_file", path)?;
        }
        if let Some(path) = &self.config {
            validate_path("config", path)?;
        }
        if let Command::Recommend(args) = &self.command {
            if args.regenerate == Some(0) {
                return Err(StyloError::InvalidConfigValueError {
                    field: "regenerate".to_string(),
                    value: "0".to_string(),
                    reason: "Cards are numbered from 1".to_string(),
                });
            }
            if let Some(card) = args.regenerate {
                if args.no_images || args.stream {
                    return Err(StyloError::InvalidConfigValueError {
                        field: "regenerate".to_string(),
                        value: card.to_string(),
                        reason: "Regenerating needs images, drop --no-images and --stream"
                            .to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recommend() {
        let config = CliConfig::parse_from([
            "stylo",
            "recommend",
            "--item",
            "shirt",
            "--color",
            "red",
            "--style",
            "casual,smart",
            "--style",
            "street",
            "--gender",
            "women",
            "--base-url",
            "http://localhost:8000",
        ]);

        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8000"));
        match config.command {
            Command::Recommend(args) => {
                assert_eq!(args.item, "shirt");
                assert_eq!(args.styles, vec!["casual", "smart", "street"]);
                assert_eq!(args.gender, Some(Gender::Women));
                assert!(!args.no_images);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_gender() {
        let result = CliConfig::try_parse_from(["stylo", "recommend", "--item", "x", "--gender", "kids"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_regenerate_index() {
        let config = CliConfig::parse_from(["stylo", "recommend", "--item", "x", "--regenerate", "0"]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["stylo", "theme", "toggle"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_regenerate_requires_images() {
        let config = CliConfig::parse_from([
            "stylo", "recommend", "--item", "x", "--regenerate", "1", "--no-images",
        ]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from([
            "stylo", "recommend", "--item", "x", "--regenerate", "1", "--stream",
        ]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["stylo", "recommend", "--item", "x", "--regenerate", "1"]);
        assert!(config.validate().is_ok());
    }
}
