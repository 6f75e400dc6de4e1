//! 表單自由輸入欄位旁的建議清單

pub const COLORS: &[&str] = &[
    "red",
    "blue",
    "green",
    "yellow",
    "black",
    "white",
    "beige",
    "navy",
    "purple",
    "pink",
    "olive green",
    "gray",
    "brown",
    "cream",
    "khaki",
    "silver",
    "burgundy",
    "camel",
    "denim",
    "tan",
    "light blue",
    "dark wash",
];

pub const CLOTHING_CATEGORIES: &[&str] = &[
    "t-shirt",
    "sneakers",
    "pants",
    "polo shirt",
    "jeans",
    "shirt",
    "blouse",
    "hoodie",
    "sweater",
    "pullover",
    "top",
    "jacket",
    "blazer",
    "trousers",
    "shorts",
    "skirt",
    "leggings",
    "culottes",
    "shoes",
    "boots",
    "sandals",
    "loafers",
    "heels",
    "flats",
    "dress",
];

pub const STYLES: &[&str] = &[
    "elegant",
    "sportive",
    "casual",
    "smart",
    "street",
    "business casual",
    "professional",
    "date night",
    "edgy casual",
    "smart casual",
    "business formal",
    "sophisticated casual",
    "feminine casual",
    "relaxed casual",
    "cozy smart casual",
    "chic Parisian",
    "urban chic",
    "street style",
];

/// 以 `prefix` 開頭的建議（不分大小寫）
pub fn suggest<'a>(list: &[&'a str], prefix: &str) -> Vec<&'a str> {
    let prefix = prefix.trim().to_lowercase();
    list.iter()
        .copied()
        .filter(|entry| entry.to_lowercase().starts_with(&prefix))
        .collect()
}
