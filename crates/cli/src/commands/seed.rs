//! Seed the catalog with the demo menu.

use bistro_core::{Price, ProductInput};
use bistro_server::db::ProductRepository;
use tracing::info;

use super::{CliError, connect};

/// Insert the demo menu if the catalog is empty.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;
    let products = ProductRepository::new(&pool);

    let existing = products.count().await?;
    if existing > 0 {
        info!(existing, "Catalog already has products; skipping seed");
        return Ok(());
    }

    for input in demo_menu() {
        let product = products.create(&input).await?;
        info!(product_id = %product.id, name = %product.name, "Seeded product");
    }

    info!("Seeding complete");
    Ok(())
}

fn dish(name: &str, description: &str, dollars: i64, category: &str, photo: &str) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: description.to_string(),
        price: Price::from_cents(dollars * 100),
        image_url: Some(format!(
            "https://images.unsplash.com/{photo}?auto=format&fit=crop&w=800"
        )),
        category: category.to_string(),
        available: true,
    }
}

/// The demo menu.
pub fn demo_menu() -> Vec<ProductInput> {
    vec![
        dish(
            "Wagyu Burger",
            "Premium beef with truffle",
            24,
            "Mains",
            "photo-1568901346375-23c9450c58cd",
        ),
        dish(
            "Saffron Paella",
            "Seafood delight",
            32,
            "Mains",
            "photo-1534080564583-6be75777b70a",
        ),
        dish(
            "Tuna Tartare",
            "Fresh and spicy",
            16,
            "Starters",
            "photo-1546069901-ba9599a7e63c",
        ),
        dish(
            "Lava Cake",
            "Molten chocolate center",
            12,
            "Desserts",
            "photo-1624353365286-3f8d62daad51",
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_menu_is_valid_input() {
        for input in demo_menu() {
            assert_eq!(input.normalized().unwrap(), input);
        }
    }

    #[test]
    fn test_demo_menu_prices() {
        let prices: Vec<Price> = demo_menu().iter().map(|p| p.price).collect();
        assert_eq!(
            prices,
            vec![
                Price::from_cents(2400),
                Price::from_cents(3200),
                Price::from_cents(1600),
                Price::from_cents(1200),
            ]
        );
    }
}
