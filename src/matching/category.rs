// src/matching/category.rs
// Keyword-driven product category classification used by the category gate.

use std::fmt;

use crate::config::CategoryRule;
use crate::matching::normalize::{normalize, parse_keywords, Keyword, NormalizedText};

// Checked in this order; the first category with a matching keyword wins.
const DEFAULT_CATEGORY_KEYWORDS: [(&str, &[&str]); 8] = [
    ("sunglasses", &["sunglass", "shades", "eyewear", "goggles"]),
    ("thermos", &["thermos", "flask", "bottle"]),
    ("mug", &["mug", "cup", "tumbler", "drinkware"]),
    ("stole", &["stole", "scarf", "shawl", "wrap", "dupatta"]),
    (
        "phone_stand",
        &["phone stand", "phone holder", "mobile stand", "dock"],
    ),
    ("notebook", &["notebook", "journal", "diary"]),
    ("lunchbox", &["lunchbox", "lunch box", "tiffin"]),
    ("toothbrush", &["toothbrush", "tooth brush"]),
];

pub fn default_category_rules() -> Vec<CategoryRule> {
    DEFAULT_CATEGORY_KEYWORDS
        .iter()
        .map(|(name, keywords)| CategoryRule::new(name, keywords))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Known(String),
    Unknown,
}

impl Category {
    /// Only two different known categories conflict; `Unknown` carries no information.
    pub fn conflicts_with(&self, other: &Category) -> bool {
        match (self, other) {
            (Category::Known(a), Category::Known(b)) => a != b,
            _ => false,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Known(name) => f.write_str(name),
            Category::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    rules: Vec<(String, Vec<Keyword>)>,
}

impl CategoryClassifier {
    pub fn new(rules: &[CategoryRule]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|rule| (rule.name.clone(), parse_keywords(&rule.keywords)))
                .collect(),
        }
    }

    pub fn classify(&self, text: &NormalizedText) -> Category {
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains_keyword(k)))
            .map(|(name, _)| Category::Known(name.clone()))
            .unwrap_or(Category::Unknown)
    }

    pub fn classify_text(&self, text: &str) -> Category {
        self.classify(&normalize(text))
    }

    /// Category of a query: a hint naming a configured category wins over the name itself.
    pub fn classify_query(&self, name: &NormalizedText, hint: Option<&str>) -> Category {
        if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) {
            if let Some((known, _)) = self
                .rules
                .iter()
                .find(|(rule_name, _)| rule_name.eq_ignore_ascii_case(hint))
            {
                return Category::Known(known.clone());
            }
            log::debug!("Ignoring unknown category hint '{}'", hint);
        }
        self.classify(name)
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(name, _)| name.as_str())
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new(&default_category_rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(name: &str) -> Category {
        Category::Known(name.to_string())
    }

    #[test]
    fn test_classify_default_table() {
        let classifier = CategoryClassifier::default();

        assert_eq!(classifier.classify_text("Reiek Peak Wooden Sunglasses"), known("sunglasses"));
        assert_eq!(classifier.classify_text("Polarized Shades UV400"), known("sunglasses"));
        assert_eq!(classifier.classify_text("Steel Vacuum Flask 750ml"), known("thermos"));
        assert_eq!(classifier.classify_text("Ceramic Coffee Mugs"), known("mug"));
        assert_eq!(classifier.classify_text("Bamboo Mobile Stand"), known("phone_stand"));
        assert_eq!(classifier.classify_text("Kids Lunch Box"), known("lunchbox"));
        assert_eq!(classifier.classify_text("Random Gadget"), Category::Unknown);
        assert_eq!(classifier.classify_text(""), Category::Unknown);
    }

    #[test]
    fn test_first_category_wins() {
        let classifier = CategoryClassifier::default();
        // Both "thermos" and "mug" keywords present; thermos is listed first.
        assert_eq!(classifier.classify_text("Thermos Travel Mug"), known("thermos"));
    }

    #[test]
    fn test_conflicts() {
        assert!(known("sunglasses").conflicts_with(&known("thermos")));
        assert!(!known("sunglasses").conflicts_with(&known("sunglasses")));
        assert!(!known("sunglasses").conflicts_with(&Category::Unknown));
        assert!(!Category::Unknown.conflicts_with(&known("mug")));
        assert!(!Category::Unknown.conflicts_with(&Category::Unknown));
    }

    #[test]
    fn test_query_hint_overrides_name() {
        let classifier = CategoryClassifier::default();
        let name = normalize("Reiek Peak Wooden Sunglasses");

        assert_eq!(classifier.classify_query(&name, Some("Mug")), known("mug"));
        assert_eq!(
            classifier.classify_query(&name, Some("garden tools")),
            known("sunglasses")
        );
        assert_eq!(classifier.classify_query(&name, None), known("sunglasses"));
    }

    #[test]
    fn test_custom_rules() {
        let classifier = CategoryClassifier::new(&[CategoryRule::new("lamp", &["lamp", "lantern"])]);
        assert_eq!(classifier.classify_text("Brass Table Lamps"), known("lamp"));
        assert_eq!(classifier.classify_text("Wooden Sunglasses"), Category::Unknown);
        assert_eq!(classifier.category_names().collect::<Vec<_>>(), vec!["lamp"]);
    }
}
