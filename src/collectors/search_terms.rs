// src/collectors/search_terms.rs
// Platform search phrases derived from catalog product names. Full catalog
// names are too specific for platform search; a category plus material does better.

const SEARCH_CATEGORIES: [&str; 9] = [
    "Sunglasses",
    "Thermos",
    "Bottle",
    "Mug",
    "Phone Stand",
    "Notebook",
    "Lunchbox",
    "Stole",
    "Silk",
];

const SEARCH_MATERIALS: [&str; 2] = ["Wooden", "Silk"];

const FALLBACK_WORDS: usize = 3;

/// Search phrase for `product_name`: the first known category it mentions,
/// prefixed by its material, or else its last three words.
pub fn search_keywords(product_name: &str) -> String {
    let lowered = product_name.to_lowercase();

    if let Some(category) = SEARCH_CATEGORIES
        .iter()
        .find(|c| lowered.contains(&c.to_lowercase()))
    {
        let material = SEARCH_MATERIALS
            .iter()
            .find(|m| lowered.contains(&m.to_lowercase()) && !m.eq_ignore_ascii_case(category));
        return match material {
            Some(material) => format!("{} {}", material, category),
            None => category.to_string(),
        };
    }

    let words: Vec<&str> = product_name.split_whitespace().collect();
    if words.len() >= FALLBACK_WORDS {
        words[words.len() - FALLBACK_WORDS..].join(" ")
    } else {
        product_name.trim().to_string()
    }
}
