use clap::Parser;
use std::io::{IsTerminal, Write};
use std::sync::Arc;
use stylo::config::cli::{Command, PrefsAction, RecommendArgs, ThemeAction};
use stylo::config::Overrides;
use stylo::core::catalog;
use stylo::domain::model::Prompt;
use stylo::domain::ports::PreferenceStore;
use stylo::ui::render::{render_board, render_slot, RenderOptions};
use stylo::utils::{logger, validation::Validate};
use stylo::{
    ApiClient, CliConfig, FileStore, ImageSequencer, ImageSlot, Preferences, RecommendationForm,
    Result, Settings, SlotStatus, StylistSession, TomlConfig,
};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(config).await {
        tracing::error!("❌ {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }
}

async fn run(config: CliConfig) -> Result<()> {
    config.validate()?;

    let file = match &config.config {
        Some(path) => Some(TomlConfig::from_file(path)?),
        None => None,
    };
    let settings = Settings::resolve(&Overrides::from(&config), file.as_ref())?;
    tracing::debug!("Using backend {}", settings.base_url);

    let store = FileStore::new(&settings.preferences_path);

    match config.command {
        Command::Recommend(args) => recommend(&settings, &store, args).await,
        Command::Image { prompt } => image(&settings, prompt).await,
        Command::Prefs { action } => prefs(&store, action),
        Command::Theme { action } => theme(&store, action.unwrap_or(ThemeAction::Show)),
        Command::Health => health(&settings).await,
        Command::Suggestions { prefix } => {
            suggestions(prefix.as_deref().unwrap_or(""));
            Ok(())
        }
    }
}

fn api_client(settings: &Settings) -> Result<ApiClient> {
    match settings.request_timeout {
        Some(timeout) => ApiClient::with_timeout(&settings.base_url, timeout),
        None => Ok(ApiClient::new(&settings.base_url)),
    }
}

async fn recommend(settings: &Settings, store: &FileStore, args: RecommendArgs) -> Result<()> {
    let preferences = Preferences::load(store);
    let mut form = RecommendationForm::from_preferences(&preferences);
    form.clothing_item = args.item;
    form.color = args.color;
    if let Some(gender) = args.gender {
        form.gender = gender;
    }
    if !args.styles.is_empty() {
        form.clear_styles();
        for style in &args.styles {
            form.current_style_input = style.clone();
            if !form.add_style() {
                tracing::warn!(
                    "Skipping style '{}': blank, duplicate or 3 already selected",
                    style.trim()
                );
                form.current_style_input.clear();
            }
        }
    }
    persist_form(store, &form);

    let client = Arc::new(api_client(settings)?);

    if args.stream {
        let request = form.to_request()?;
        let mut stdout = std::io::stdout();
        client
            .stream_recommendations(&request, |chunk| {
                let _ = write!(stdout, "{}", chunk);
                let _ = stdout.flush();
            })
            .await?;
        println!();
        return Ok(());
    }

    let session =
        StylistSession::new(client.clone(), client).with_retry_policy(settings.retry_policy);
    let mut board = session.recommend(&form).await?;

    let show_images = settings.images_enabled && !args.no_images;
    if args.regenerate.is_some() && !settings.images_enabled {
        tracing::warn!("Ignoring --regenerate: images are disabled in the configuration");
    }
    if show_images {
        session.acquire_images(&mut board).await?;

        if let Some(card) = args.regenerate {
            match session.regenerate(&mut board, card - 1).await {
                Ok(SlotStatus::Failed) => eprintln!("⚠️ Failed to regenerate. Please try again."),
                Ok(_) => println!("✅ Image updated: generated a new variation."),
                Err(e) => eprintln!("⚠️ {}", e.user_friendly_message()),
            }
        }
    }

    let options = RenderOptions {
        theme: preferences.theme,
        ansi: !args.no_color && std::io::stdout().is_terminal(),
        show_images,
    };
    print!("{}", render_board(&board, &options));
    Ok(())
}

fn persist_form(store: &dyn PreferenceStore, form: &RecommendationForm) {
    if let Err(e) = Preferences::save_gender(store, form.gender) {
        tracing::warn!("Could not save gender preference: {}", e);
    }
    if let Err(e) = Preferences::save_styles(store, form.selected_styles()) {
        tracing::warn!("Could not save style preferences: {}", e);
    }
}

async fn image(settings: &Settings, prompt: String) -> Result<()> {
    let sequencer = ImageSequencer::new(Arc::new(api_client(settings)?));
    let mut slot = ImageSlot::with_policy(Some(Prompt::new(prompt)), settings.retry_policy);

    let status = sequencer.run(&mut slot).await;
    tracing::info!("Image slot finished as {}", status);
    println!("{}", render_slot(&slot));
    Ok(())
}

fn prefs(store: &FileStore, action: PrefsAction) -> Result<()> {
    let preferences = Preferences::load(store);
    let mut form = RecommendationForm::from_preferences(&preferences);

    match action {
        PrefsAction::Show => {
            println!("📁 {}", store.path().display());
            println!("theme:  {}", preferences.theme);
            println!("gender: {}", preferences.gender);
            println!("styles: {}", preferences.styles.join(", "));
            return Ok(());
        }
        PrefsAction::SetGender { gender } => {
            form.gender = gender;
        }
        PrefsAction::AddStyle { style } => {
            form.current_style_input = style;
            if !form.add_style() {
                println!("Style not added: blank, duplicate or 3 already selected");
                return Ok(());
            }
        }
        PrefsAction::RemoveStyle { style } => {
            if !form.remove_style(&style) {
                println!("Style '{}' was not selected", style);
                return Ok(());
            }
        }
        PrefsAction::ClearStyles => form.clear_styles(),
    }

    Preferences::save_gender(store, form.gender)?;
    Preferences::save_styles(store, form.selected_styles())?;
    println!("✅ Preferences saved");
    Ok(())
}

fn theme(store: &FileStore, action: ThemeAction) -> Result<()> {
    let current = Preferences::load(store).theme;
    let next = match action {
        ThemeAction::Show => {
            println!("{}", current);
            return Ok(());
        }
        ThemeAction::Toggle => current.toggled(),
        ThemeAction::Set { theme } => theme,
    };

    Preferences::save_theme(store, next)?;
    println!("🎨 Theme set to {}", next);
    Ok(())
}

async fn health(settings: &Settings) -> Result<()> {
    let status = api_client(settings)?.health().await?;
    println!("{}: {}", settings.base_url, status.status);
    Ok(())
}

fn suggestions(prefix: &str) {
    let sections = [
        ("Colors", catalog::COLORS),
        ("Clothing items", catalog::CLOTHING_CATEGORIES),
        ("Styles", catalog::STYLES),
    ];

    for (title, list) in sections {
        let matches = catalog::suggest(list, prefix);
        if matches.is_empty() {
            continue;
        }
        println!("{}:", title);
        for entry in matches {
            println!("  {}", entry);
        }
    }
}
