//! Bistro CLI - migrations, seeding, and a terminal ordering shell.
//!
//! # Usage
//!
//! ```bash
//! # Prepare the database
//! bistro migrate
//! bistro seed
//!
//! # Browse and order
//! bistro menu --category Mains
//! bistro cart add 1
//! bistro cart qty 1 2
//! bistro cart show
//! bistro checkout --name "Ada Lovelace" --address "12 Analytical Row" --phone 555-0199 --payment cash
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert the demo menu into an empty catalog
//! - `menu` - List products from the Order & Catalog Service
//! - `cart` - Inspect and change the persisted cart
//! - `checkout` - Submit the cart as a delivery order

#![cfg_attr(not(test), forbid(unsafe_code))]

use bistro_core::PaymentMethod;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::CliError;
use commands::cart::CartAction;

#[derive(Parser)]
#[command(name = "bistro")]
#[command(author, version, about = "Bistro restaurant ordering CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert the demo menu when the catalog is empty
    Seed,
    /// List the menu
    Menu {
        /// Only show this category ("All" shows everything)
        #[arg(short, long)]
        category: Option<String>,

        /// Only show dishes whose name or description contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Submit the cart as a delivery order
    Checkout {
        /// Recipient name
        #[arg(short, long)]
        name: String,

        /// Delivery address
        #[arg(short, long)]
        address: String,

        /// Contact phone number
        #[arg(short, long)]
        phone: String,

        /// Payment method (`card`, `cash`)
        #[arg(long, default_value = "card")]
        payment: PaymentMethod,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bistro=info,bistro_client=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Menu { category, search } => {
            commands::menu::run(category.as_deref(), search.as_deref()).await?;
        }
        Commands::Cart { action } => commands::cart::run(action).await?,
        Commands::Checkout {
            name,
            address,
            phone,
            payment,
        } => commands::checkout::run(name, address, phone, payment).await?,
    }
    Ok(())
}
