//! Submit the cart as a delivery order.

use bistro_client::{ApiClient, CartStore, Checkout, ClientConfig, FileCartStorage, SubmitOutcome};
use bistro_core::{DeliveryDetails, PaymentMethod};

use super::CliError;
use crate::output;

/// Review the cart, send it with the given delivery details and print the
/// confirmation.
///
/// On failure the cart is left as it was so the command can be retried.
///
/// # Errors
///
/// Returns an error if the cart is empty, a detail is blank, or the service
/// does not accept the order in time.
pub async fn run(
    full_name: String,
    address: String,
    phone: String,
    payment_method: PaymentMethod,
) -> Result<(), CliError> {
    let config = ClientConfig::from_env()?;
    let cart = CartStore::open(FileCartStorage::new(&config.cart_path));
    let api = ApiClient::from_config(&config);
    let checkout = Checkout::new(cart.clone(), api, config.checkout_settings());

    checkout.begin()?;
    checkout.set_delivery_details(DeliveryDetails {
        full_name,
        address,
        phone,
        payment_method,
    })?;

    output::emit(&output::render_cart(&cart.items()));
    output::emit(&output::render_summary(&checkout.summary()));

    let outcome = checkout.submit().await;
    cart.flush().await;

    match outcome? {
        SubmitOutcome::Confirmed(confirmation) => {
            output::emit(&output::render_confirmation(&confirmation));
        }
        SubmitOutcome::AlreadySubmitting => {
            tracing::warn!("An order is already being submitted");
        }
    }
    Ok(())
}
