//! Renders catalog and order data into outbound payloads.
//!
//! Content only. Nothing here talks to a channel.

use foodbites_types::config::{AssetsConfig, ImageAsset};
use foodbites_types::{OrderLine, OutboundPayload};

use crate::catalog::Catalog;

/// Builds the reply payloads for the deterministic intents.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    assets: AssetsConfig,
}

impl MessageFormatter {
    /// Create a formatter over the configured reply assets.
    pub fn new(assets: AssetsConfig) -> Self {
        Self { assets }
    }

    /// Welcome sequence: the two welcome images, then the intro button prompt.
    pub fn welcome(&self) -> Vec<OutboundPayload> {
        let mut payloads: Vec<OutboundPayload> =
            self.assets.welcome_images.iter().map(image).collect();
        payloads.push(OutboundPayload::Buttons {
            prompt: self.assets.welcome_prompt.clone(),
            labels: self.assets.option_labels.clone(),
        });
        payloads
    }

    /// Button prompt for a returning user who says hello.
    pub fn welcome_back(&self) -> Vec<OutboundPayload> {
        vec![OutboundPayload::Buttons {
            prompt: self.assets.welcome_back_prompt.clone(),
            labels: self.assets.option_labels.clone(),
        }]
    }

    /// Menu image followed by the formatted catalog.
    pub fn menu(&self, catalog: &Catalog) -> Vec<OutboundPayload> {
        vec![
            image(&self.assets.menu_image),
            OutboundPayload::Text {
                body: format_menu(catalog),
            },
        ]
    }

    /// Order summary ending in the pickup-or-delivery question.
    pub fn order_summary(&self, order: &OrderLine) -> OutboundPayload {
        let currency = &self.assets.currency_symbol;
        OutboundPayload::Text {
            body: format!(
                "🧾 *Order Summary:*\n{} × {}\n💵 Unit: {currency}{}\n💰 Total: {currency}{}\nWould you like *pickup* or *delivery*?",
                order.quantity,
                order.item_name,
                format_amount(order.unit_price),
                format_amount(order.total_price),
            ),
        }
    }

    /// The generic apology for a failed assistant turn.
    pub fn apology(&self) -> OutboundPayload {
        OutboundPayload::Text {
            body: self.assets.apology.clone(),
        }
    }
}

fn image(asset: &ImageAsset) -> OutboundPayload {
    OutboundPayload::Image {
        media: asset.media.clone(),
        caption: asset.caption.clone(),
    }
}

/// Render the catalog as WhatsApp-flavoured markdown.
///
/// ```text
/// 🍽️ *MAIN COURSES*
/// • Jollof Rice & Chicken – ₦2,500
///   _Classic Nigerian jollof_
/// ```
///
/// Categories are separated by a blank line. Items without a description
/// get no description line.
pub fn format_menu(catalog: &Catalog) -> String {
    catalog
        .categories()
        .iter()
        .map(|category| {
            let items: Vec<String> = category
                .items
                .iter()
                .map(|item| match &item.description {
                    Some(desc) => format!("• {} – {}\n  _{}_", item.name, item.price, desc),
                    None => format!("• {} – {}", item.name, item.price),
                })
                .collect();
            format!(
                "🍽️ *{}*\n{}",
                category.name.to_uppercase(),
                items.join("\n")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Group digits in threes: `2500` is `"2,500"`.
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodbites_types::config::MenuConfig;
    use foodbites_types::{CatalogItem, Category};

    fn formatter() -> MessageFormatter {
        MessageFormatter::new(AssetsConfig::default())
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(2500), "2,500");
        assert_eq!(format_amount(125000), "125,000");
        assert_eq!(format_amount(1234567), "1,234,567");
    }

    #[test]
    fn test_welcome_sequence_shape() {
        let payloads = formatter().welcome();
        assert_eq!(payloads.len(), 3);
        assert!(matches!(payloads[0], OutboundPayload::Image { .. }));
        assert!(matches!(payloads[1], OutboundPayload::Image { .. }));
        match &payloads[2] {
            OutboundPayload::Buttons { prompt, labels } => {
                assert!(prompt.contains("Welcome to FoodBites Kitchen"));
                assert_eq!(labels.len(), 3);
            }
            other => panic!("Expected buttons, got: {other:?}"),
        }
    }

    #[test]
    fn test_welcome_back_is_single_prompt() {
        let payloads = formatter().welcome_back();
        assert_eq!(payloads.len(), 1);
        match &payloads[0] {
            OutboundPayload::Buttons { prompt, labels } => {
                assert!(prompt.contains("Welcome back"));
                assert_eq!(labels[0], "📋 View Menu");
            }
            other => panic!("Expected buttons, got: {other:?}"),
        }
    }

    #[test]
    fn test_order_summary_text() {
        let order = OrderLine {
            item_name: "Egusi Soup & Pounded Yam".to_string(),
            quantity: 2,
            unit_price: 2800,
            total_price: 5600,
        };
        match formatter().order_summary(&order) {
            OutboundPayload::Text { body } => assert_eq!(
                body,
                "🧾 *Order Summary:*\n2 × Egusi Soup & Pounded Yam\n💵 Unit: ₦2,800\n💰 Total: ₦5,600\nWould you like *pickup* or *delivery*?"
            ),
            other => panic!("Expected text, got: {other:?}"),
        }
    }

    #[test]
    fn test_menu_is_image_then_text() {
        let catalog = Catalog::from_config(&MenuConfig::default()).unwrap();
        let payloads = formatter().menu(&catalog);
        assert_eq!(payloads.len(), 2);
        assert!(matches!(payloads[0], OutboundPayload::Image { .. }));
        match &payloads[1] {
            OutboundPayload::Text { body } => {
                assert!(body.starts_with("🍽️ *MAIN COURSES (LUNCH & DINNER)*\n"));
                assert!(body.contains("• Jollof Rice & Chicken – ₦2,500\n  _Classic Nigerian jollof"));
            }
            other => panic!("Expected text, got: {other:?}"),
        }
    }

    #[test]
    fn test_menu_layout_across_categories() {
        let catalog = Catalog::new(vec![
            Category {
                name: "Rice".to_string(),
                items: vec![CatalogItem {
                    name: "Fried Rice".to_string(),
                    description: Some("With dodo".to_string()),
                    price: "₦2,700".to_string(),
                }],
            },
            Category {
                name: "Drinks".to_string(),
                items: vec![
                    CatalogItem {
                        name: "Zobo".to_string(),
                        description: None,
                        price: "₦500".to_string(),
                    },
                    CatalogItem {
                        name: "Chapman".to_string(),
                        description: None,
                        price: "₦900".to_string(),
                    },
                ],
            },
        ])
        .unwrap();

        assert_eq!(
            format_menu(&catalog),
            "🍽️ *RICE*\n• Fried Rice – ₦2,700\n  _With dodo_\n\n🍽️ *DRINKS*\n• Zobo – ₦500\n• Chapman – ₦900"
        );
    }
}
