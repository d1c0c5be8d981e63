//! Inspect and change the persisted cart.

use bistro_client::{ApiClient, CartStore, ClientConfig, FileCartStorage};
use bistro_core::{ProductId, QuantityChange};
use clap::Subcommand;
use tracing::{info, warn};

use super::CliError;
use crate::output;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,
    /// Add one of a dish
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a dish entirely
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Change a dish's quantity by a delta (reaching zero removes it)
    Qty {
        /// Product ID
        id: ProductId,

        /// Amount to add (negative to take away)
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Empty the cart
    Clear,
}

/// Apply `action` to the cart file and print the result.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or, for `add`, the
/// product cannot be fetched.
pub async fn run(action: CartAction) -> Result<(), CliError> {
    let config = ClientConfig::from_env()?;
    let cart = CartStore::open(FileCartStorage::new(&config.cart_path));

    match action {
        CartAction::Show => {}
        CartAction::Add { id } => {
            let api = ApiClient::from_config(&config);
            let product = api.get_product(id).await?;
            if !product.available {
                warn!(product_id = %id, "{} is currently unavailable", product.name);
            }
            let quantity = cart.add_item(&product);
            info!(product_id = %id, quantity, "Added {}", product.name);
        }
        CartAction::Remove { id } => {
            if !cart.remove_item(id) {
                warn!(product_id = %id, "Not in cart");
            }
        }
        CartAction::Qty { id, delta } => match cart.set_quantity(id, delta) {
            QuantityChange::Updated(quantity) => info!(product_id = %id, quantity, "Updated"),
            QuantityChange::Removed => info!(product_id = %id, "Removed"),
            QuantityChange::Missing => warn!(product_id = %id, "Not in cart"),
        },
        CartAction::Clear => cart.clear(),
    }

    cart.flush().await;
    output::emit(&output::render_cart(&cart.items()));
    Ok(())
}
