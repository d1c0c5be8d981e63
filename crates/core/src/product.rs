//! Catalog products.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Category name that means "no filter" in listing requests.
pub const ALL_CATEGORIES: &str = "All";

/// A menu item offered by the restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    /// Public URL of the product photo, if one was uploaded.
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: String,
    /// Whether the kitchen currently serves this item.
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

/// Errors that can occur when validating a [`ProductInput`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductInputError {
    /// The product name is empty.
    #[error("product name cannot be empty")]
    EmptyName,
    /// The category is empty.
    #[error("product category cannot be empty")]
    EmptyCategory,
    /// The price is below zero.
    #[error("product price cannot be negative")]
    NegativePrice,
}

/// Body of a create or update request for a product.
///
/// Updates replace every field, matching the admin form which always submits
/// the full product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

impl ProductInput {
    /// Check the input and return a copy with surrounding whitespace removed
    /// and a blank image URL treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or category is blank, or the price is
    /// negative.
    pub fn normalized(&self) -> Result<Self, ProductInputError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ProductInputError::EmptyName);
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err(ProductInputError::EmptyCategory);
        }
        if self.price.is_negative() {
            return Err(ProductInputError::NegativePrice);
        }

        Ok(Self {
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
            price: self.price,
            image_url: self
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_owned),
            category: category.to_owned(),
            available: self.available,
        })
    }
}

impl Product {
    /// Case-insensitive match of `term` against the name and description.
    ///
    /// A blank term matches everything.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

/// Category tabs for a listing: `"All"` followed by each distinct category
/// in first-seen order.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<&str> {
    let mut tabs = vec![ALL_CATEGORIES];
    for product in products {
        if !tabs.contains(&product.category.as_str()) {
            tabs.push(product.category.as_str());
        }
    }
    tabs
}

/// Turn a raw category query value into a filter.
///
/// Absent, blank and `"All"` (any case) mean no filtering.
#[must_use]
pub fn category_filter(category: Option<&str>) -> Option<&str> {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        ProductInput {
            name: "  Lava Cake ".to_string(),
            description: "Molten chocolate center".to_string(),
            price: Price::from_cents(1200),
            image_url: Some("   ".to_string()),
            category: "Desserts".to_string(),
            available: true,
        }
    }

    #[test]
    fn test_normalized_trims_and_drops_blank_image() {
        let normalized = input().normalized().unwrap();
        assert_eq!(normalized.name, "Lava Cake");
        assert_eq!(normalized.image_url, None);
    }

    #[test]
    fn test_normalized_rejects_blank_name() {
        let mut bad = input();
        bad.name = "   ".to_string();
        assert_eq!(bad.normalized(), Err(ProductInputError::EmptyName));
    }

    #[test]
    fn test_normalized_rejects_blank_category() {
        let mut bad = input();
        bad.category = String::new();
        assert_eq!(bad.normalized(), Err(ProductInputError::EmptyCategory));
    }

    #[test]
    fn test_normalized_rejects_negative_price() {
        let mut bad = input();
        bad.price = Price::from_cents(-100);
        assert_eq!(bad.normalized(), Err(ProductInputError::NegativePrice));
    }

    #[test]
    fn test_category_filter() {
        assert_eq!(category_filter(None), None);
        assert_eq!(category_filter(Some("All")), None);
        assert_eq!(category_filter(Some("all")), None);
        assert_eq!(category_filter(Some(" ")), None);
        assert_eq!(category_filter(Some("Mains")), Some("Mains"));
    }

    #[test]
    fn test_product_defaults_when_fields_missing() {
        let product: Product = serde_json::from_str(
            r#"{"id": 1, "name": "Wagyu Burger", "price": 24, "category": "Mains"}"#,
        )
        .unwrap();
        assert!(product.available);
        assert_eq!(product.description, "");
        assert_eq!(product.image_url, None);
    }

    fn dish(name: &str, description: &str, category: &str) -> Product {
        Product {
            id: crate::ProductId::new(1),
            name: name.to_string(),
            description: description.to_string(),
            price: Price::from_cents(100),
            image_url: None,
            category: category.to_string(),
            available: true,
        }
    }

    #[test]
    fn test_search_matches_name_or_description() {
        let tartare = dish("Tuna Tartare", "Fresh and spicy", "Starters");
        assert!(tartare.matches_search("tuna"));
        assert!(tartare.matches_search("SPICY"));
        assert!(tartare.matches_search("  "));
        assert!(!tartare.matches_search("cake"));
    }

    #[test]
    fn test_categories_start_with_all_and_dedupe() {
        let menu = [
            dish("Wagyu Burger", "", "Mains"),
            dish("Tuna Tartare", "", "Starters"),
            dish("Saffron Paella", "", "Mains"),
        ];
        assert_eq!(categories(&menu), vec!["All", "Mains", "Starters"]);
    }
}
