//! Plain-text rendering of menus, carts and confirmations.
//!
//! Rendering is kept apart from printing so the layouts can be tested.

use std::fmt::Write as _;

use bistro_client::CheckoutSummary;
use bistro_core::{LineItem, OrderConfirmation, Product};

/// Write a rendered block to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(text: &str) {
    print!("{text}");
}

/// Category tabs with the active one bracketed.
pub fn render_tabs(tabs: &[&str], active: Option<&str>) -> String {
    let active = active.unwrap_or(bistro_core::ALL_CATEGORIES);
    let rendered: Vec<String> = tabs
        .iter()
        .map(|tab| {
            if tab.eq_ignore_ascii_case(active) {
                format!("[{tab}]")
            } else {
                (*tab).to_string()
            }
        })
        .collect();
    format!("{}\n", rendered.join("  "))
}

/// One line per product: id, name, price, category and description.
pub fn render_menu(products: &[Product]) -> String {
    if products.is_empty() {
        return "No dishes match.\n".to_string();
    }

    let mut out = String::new();
    for product in products {
        let _ = write!(
            out,
            "{:>4}  {:<24} {:>9}  {:<10} {}",
            product.id.to_string(),
            product.name,
            product.price.to_string(),
            product.category,
            product.description
        );
        if !product.available {
            out.push_str("  (unavailable)");
        }
        out.push('\n');
    }
    out
}

/// Cart lines with their totals, followed by the cart total.
pub fn render_cart(items: &[LineItem]) -> String {
    if items.is_empty() {
        return "Your cart is empty.\n".to_string();
    }

    let mut out = String::new();
    for item in items {
        let _ = writeln!(
            out,
            "{:>4}  {:<24} {:>3} x {:>9} = {:>9}",
            item.product_id.to_string(),
            item.name,
            item.quantity,
            item.unit_price.to_string(),
            item.line_total().to_string()
        );
    }
    let count: u32 = items.iter().map(|i| i.quantity).sum();
    let total: bistro_core::Price = items.iter().map(LineItem::line_total).sum();
    let _ = writeln!(out, "{count} item(s), total {total}");
    out
}

/// Review amounts shown before an order is sent.
pub fn render_summary(summary: &CheckoutSummary) -> String {
    format!(
        "Subtotal {}\nDelivery {}\nTotal    {}\n",
        summary.subtotal, summary.delivery_fee, summary.total
    )
}

/// The service's acknowledgment of an accepted order.
pub fn render_confirmation(confirmation: &OrderConfirmation) -> String {
    let mut out = format!(
        "Order #{} confirmed ({})\n",
        confirmation.confirmation_id, confirmation.status
    );
    for line in &confirmation.lines {
        let _ = writeln!(
            out,
            "  {:>3} x {:<24} {:>9}",
            line.quantity,
            line.name,
            line.line_total.to_string()
        );
    }
    let _ = write!(
        out,
        "Subtotal {}\nDelivery {}\nTotal    {}\n",
        confirmation.subtotal, confirmation.delivery_fee, confirmation.total_price
    );
    out
}
