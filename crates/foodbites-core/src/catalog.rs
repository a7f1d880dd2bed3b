//! Read-only menu catalog.
//!
//! Built once at startup from the `menu` config section and shared behind an
//! `Arc`. Lookups never fail: absence of a matching item is a valid answer.

use foodbites_types::config::{check_menu, MenuConfig};
use foodbites_types::errors::BotError;
use foodbites_types::{CatalogItem, Category};

/// Immutable, ordered menu: categories in display order, items in display order.
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    /// Build a catalog from categories in display order.
    ///
    /// Applies the same menu rules as the config loader ([`check_menu`]), so
    /// a catalog built in code is held to what a `menu.yaml` would be.
    pub fn new(categories: Vec<Category>) -> Result<Self, BotError> {
        check_menu(&categories).map_err(BotError::Catalog)?;
        Ok(Self { categories })
    }

    /// Build a catalog from the `menu` config section.
    pub fn from_config(menu: &MenuConfig) -> Result<Self, BotError> {
        Self::new(menu.categories.clone())
    }

    /// Categories in display order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// All items, category by category, in display order.
    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }

    /// Total number of items across all categories.
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    /// Whether the catalog has no items at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find an item by name.
    ///
    /// Case-insensitive exact match first, then the first item (in display
    /// order) whose name contains the query.
    pub fn lookup(&self, query: &str) -> Option<&CatalogItem> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        self.items()
            .find(|item| item.name.to_lowercase() == query)
            .or_else(|| self.items().find(|item| item.name.to_lowercase().contains(&query)))
    }

    /// The whole catalog as pretty-printed JSON, for embedding in prompts.
    pub fn to_json(&self) -> Result<String, BotError> {
        Ok(serde_json::to_string_pretty(&self.categories)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, price: &str) -> CatalogItem {
        CatalogItem {
            name: name.to_string(),
            description: None,
            price: price.to_string(),
        }
    }

    fn sample() -> Catalog {
        Catalog::new(vec![
            Category {
                name: "Rice".to_string(),
                items: vec![
                    item("Jollof Rice & Chicken", "₦2,500"),
                    item("Fried Rice & Dodo", "₦2,700"),
                ],
            },
            Category {
                name: "Swallow".to_string(),
                items: vec![item("Amala", "₦1,000"), item("Amala & Ewedu", "₦1,800")],
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let catalog = sample();
        let found = catalog.lookup("FRIED RICE & DODO").unwrap();
        assert_eq!(found.price, "₦2,700");
    }

    #[test]
    fn test_exact_match_beats_earlier_substring() {
        let catalog = Catalog::new(vec![Category {
            name: "Swallow".to_string(),
            items: vec![item("Amala & Ewedu", "₦1,800"), item("Amala", "₦1,000")],
        }])
        .unwrap();
        assert_eq!(catalog.lookup("amala").unwrap().price, "₦1,000");
    }

    #[test]
    fn test_substring_match_in_display_order() {
        let catalog = sample();
        assert_eq!(catalog.lookup("rice").unwrap().name, "Jollof Rice & Chicken");
        assert_eq!(catalog.lookup("ewedu").unwrap().name, "Amala & Ewedu");
    }

    #[test]
    fn test_absent_item_is_none() {
        let catalog = sample();
        assert!(catalog.lookup("shawarma").is_none());
        assert!(catalog.lookup("   ").is_none());
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let err = Catalog::new(vec![
            Category {
                name: "Rice".to_string(),
                items: vec![],
            },
            Category {
                name: "Rice".to_string(),
                items: vec![],
            },
        ])
        .unwrap_err();
        assert!(matches!(err, BotError::Catalog(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_empty_item_name_rejected() {
        let err = Catalog::new(vec![Category {
            name: "Rice".to_string(),
            items: vec![item(" ", "₦100")],
        }])
        .unwrap_err();
        assert!(matches!(err, BotError::Catalog(_)));
    }

    #[test]
    fn test_default_menu_loads() {
        let catalog = Catalog::from_config(&MenuConfig::default()).unwrap();
        assert_eq!(catalog.categories().len(), 1);
        assert_eq!(catalog.len(), 10);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_json_keeps_display_order() {
        let json = sample().to_json().unwrap();
        let jollof = json.find("Jollof").unwrap();
        let amala = json.find("Amala").unwrap();
        assert!(jollof < amala);
        assert!(json.contains("\"price\": \"₦2,500\""));
    }

    #[test]
    fn test_empty_menu_and_missing_price_rejected() {
        let err = Catalog::new(vec![]).unwrap_err();
        assert!(matches!(err, BotError::Catalog(msg) if msg.contains("no categories")));

        let err = Catalog::new(vec![Category {
            name: "Rice".to_string(),
            items: vec![item("Jollof Rice", "  ")],
        }])
        .unwrap_err();
        assert!(matches!(err, BotError::Catalog(msg) if msg.contains("has no price")));
    }
}
