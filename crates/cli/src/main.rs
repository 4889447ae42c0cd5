//! Vitrine CLI - Browse catalogues, request access and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Show a catalogue and whether it is private
//! vitrine catalogue show spring-wholesale
//!
//! # List products with their effective prices
//! vitrine catalogue products spring-wholesale --page 2
//!
//! # Request access to a private catalogue and enter the code
//! vitrine access spring-wholesale --name "Awa Ndiaye" --email awa@example.com
//!
//! # Fill the cart and check out
//! vitrine cart add spring-wholesale cp_123 --unit carton
//! vitrine checkout --payment-method mobile_money --notes "Deliver after 5pm"
//! ```
//!
//! # Commands
//!
//! - `catalogue` - Show catalogue details and products
//! - `access` - Unlock a private catalogue with a one-time code
//! - `cart` - Add, remove, list and clear cart lines
//! - `checkout` - Submit the cart as an order
//! - `session` - Inspect or forget the stored token and profile

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use vitrine_client::ClientConfig;
use vitrine_core::{PaymentMethod, ProductId, UnitId};

mod commands;

use commands::{App, CliError};

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(author, version, about = "Browse Vitrine catalogues and place orders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show catalogue details and products
    Catalogue {
        #[command(subcommand)]
        action: CatalogueAction,
    },
    /// Unlock a private catalogue with a one-time code
    Access {
        /// Catalogue slug
        slug: String,

        /// Your name
        #[arg(short, long)]
        name: Option<String>,

        /// Email address to receive the code
        #[arg(short, long)]
        email: Option<String>,

        /// Phone number to receive the code
        #[arg(short, long)]
        phone: Option<String>,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Submit the cart as an order
    Checkout {
        /// Delivery or order notes
        #[arg(long)]
        notes: Option<String>,

        /// Payment method (`cash_on_delivery`, `mobile_money`, `card`, `bank_transfer`)
        #[arg(long, default_value_t = PaymentMethod::default())]
        payment_method: PaymentMethod,

        /// Clear the cart if it cannot be ordered as is
        #[arg(long)]
        clear_stale: bool,
    },
    /// Inspect or forget the stored session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum CatalogueAction {
    /// Show catalogue details
    Show {
        /// Catalogue slug
        slug: String,
    },
    /// List visible products with effective prices
    Products {
        /// Catalogue slug
        slug: String,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Products per page (defaults to `VITRINE_PAGE_SIZE`)
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one of a catalogue product
    Add {
        /// Catalogue slug
        slug: String,

        /// Catalogue product ID
        catalogue_product_id: String,

        /// Unit ID, for products sold in several units
        #[arg(short, long)]
        unit: Option<String>,
    },
    /// Remove one of a product
    Remove {
        /// Product ID
        product_id: String,

        /// Unit ID the line was added with
        #[arg(short, long)]
        unit: Option<String>,
    },
    /// Show the cart and its total
    Show,
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Show the stored session
    Show,
    /// Forget the stored token and profile
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Command failed: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry first so the tracing layer has a client to report to
    let _sentry_guard = vitrine_client::telemetry::init_sentry(&config);
    vitrine_client::telemetry::init_tracing(&config);

    // Ctrl-C abandons whatever request is in flight
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        }
    });

    if let Err(e) = run(cli, config, shutdown).await {
        match &e {
            CliError::Client(client_error) => {
                client_error.report();
                tracing::error!("Command failed: {}", client_error.user_message());
                if client_error.offers_cart_reset() {
                    tracing::info!("Run `vitrine cart clear` or `vitrine checkout --clear-stale` to start over");
                }
            }
            CliError::Input(_) | CliError::Aborted => tracing::error!("Command failed: {e}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig, shutdown: CancellationToken) -> Result<(), CliError> {
    let mut app = App::new(config, shutdown)?;

    match cli.command {
        Commands::Catalogue { action } => match action {
            CatalogueAction::Show { slug } => commands::catalogue::show(&mut app, &slug).await?,
            CatalogueAction::Products { slug, page, limit } => {
                commands::catalogue::products(&mut app, &slug, page, limit).await?;
            }
        },
        Commands::Access {
            slug,
            name,
            email,
            phone,
        } => commands::access::run(&mut app, &slug, name, email, phone).await?,
        Commands::Cart { action } => match action {
            CartAction::Add {
                slug,
                catalogue_product_id,
                unit,
            } => {
                commands::cart::add(&mut app, &slug, &catalogue_product_id, unit.map(UnitId::new))
                    .await?;
            }
            CartAction::Remove { product_id, unit } => {
                commands::cart::remove(&mut app, &ProductId::new(product_id), unit.map(UnitId::new))?;
            }
            CartAction::Show => commands::cart::show(&app)?,
            CartAction::Clear => commands::cart::clear(&mut app)?,
        },
        Commands::Checkout {
            notes,
            payment_method,
            clear_stale,
        } => commands::checkout::run(&mut app, notes, payment_method, clear_stale).await?,
        Commands::Session { action } => match action {
            SessionAction::Show => commands::session::show(&app),
            SessionAction::Clear => commands::session::clear(&mut app)?,
        },
    }
    Ok(())
}
