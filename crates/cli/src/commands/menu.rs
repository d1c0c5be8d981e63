//! List the menu from the Order & Catalog Service.

use bistro_client::{ApiClient, ClientConfig};
use bistro_core::{Product, categories, category_filter};

use super::CliError;
use crate::output;

/// Print the category tabs and the matching dishes.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the service cannot
/// be reached.
pub async fn run(category: Option<&str>, search: Option<&str>) -> Result<(), CliError> {
    let config = ClientConfig::from_env()?;
    let api = ApiClient::from_config(&config);
    let category = category_filter(category);

    let everything = api.list_products(None).await?;
    let listed = match category {
        None => everything.clone(),
        Some(c) => api.list_products(Some(c)).await?,
    };

    let shown = search_results(listed, search);
    tracing::debug!(count = shown.len(), ?category, ?search, "Listing menu");

    output::emit(&output::render_tabs(&categories(&everything), category));
    output::emit(&output::render_menu(&shown));
    Ok(())
}

fn search_results(products: Vec<Product>, search: Option<&str>) -> Vec<Product> {
    match search {
        Some(term) => products
            .into_iter()
            .filter(|p| p.matches_search(term))
            .collect(),
        None => products,
    }
}
