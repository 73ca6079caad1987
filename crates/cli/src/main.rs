//! Artprint CLI - checkout from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Delivery quote for a subtotal
//! ap-cli quote --city Dhaka --subtotal 1000
//!
//! # Guest express checkout of one product
//! ap-cli express --product 65f0c2 --quantity 2 --size A3 \
//!     --name "Rahim Uddin" --phone 01711000000 --address "House 12, Road 5" \
//!     --city Dhaka --postal-code 1207 --landing-page eid-sale
//!
//! # Signed-in cart and checkout (ARTPRINT_API_TOKEN + ARTPRINT_USER_ID)
//! ap-cli cart add --product 65f0c2 --quantity 1
//! ap-cli cart show
//! ap-cli checkout --name "Rahim Uddin" --phone 01711000000 \
//!     --address "House 12, Road 5" --city Sylhet --postal-code 3100
//!
//! # Order history and tracking
//! ap-cli orders list
//! ap-cli orders track 65f0d9
//! ```
//!
//! # Commands
//!
//! - `quote` - Delivery tier, charge and grand total (offline)
//! - `cart` - Show or edit the signed-in buyer's cart
//! - `express` - Guest checkout of a single product
//! - `checkout` - Place an order for the signed-in buyer's cart
//! - `orders` - List or track orders

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use artprint_core::{DeliveryArea, Money, ProductId};
use artprint_storefront::config::StorefrontConfig;
use artprint_storefront::error::set_sentry_user;

mod commands;

use commands::{CommandError, ShippingArgs, VariantArgs};

#[derive(Parser)]
#[command(name = "ap-cli")]
#[command(author, version, about = "Artprint checkout CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote delivery charge and grand total for a city
    Quote {
        /// City as the buyer would type it
        #[arg(long)]
        city: String,

        /// Cart subtotal in taka
        #[arg(long, value_parser = commands::parse_money)]
        subtotal: Money,

        /// Override the delivery tier (`inside` or `outside`)
        #[arg(long)]
        area: Option<DeliveryArea>,
    },
    /// Show or edit the signed-in buyer's cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Guest checkout of a single product
    Express {
        /// Product ID
        #[arg(long)]
        product: ProductId,

        /// Units to order
        #[arg(long, default_value_t = 1)]
        quantity: u32,

        #[command(flatten)]
        variant: VariantArgs,

        #[command(flatten)]
        shipping: ShippingArgs,

        /// Landing page slug to record a conversion for
        #[arg(long)]
        landing_page: Option<String>,
    },
    /// Place an order for the signed-in buyer's cart
    Checkout {
        #[command(flatten)]
        shipping: ShippingArgs,
    },
    /// List or track orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and subtotal
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        #[arg(long)]
        product: ProductId,

        /// Units to add
        #[arg(long, default_value_t = 1)]
        quantity: u32,

        #[command(flatten)]
        variant: VariantArgs,
    },
    /// Change a line's quantity
    Update {
        /// Cart line ID
        line: String,

        /// New quantity
        quantity: u32,
    },
    /// Remove a line
    Remove {
        /// Cart line ID
        line: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List the signed-in buyer's orders
    List,
    /// Show one order's status
    Track {
        /// Order ID
        id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `quote` works without configuration, so a load failure is only fatal
    // for commands that talk to the backend.
    let config = StorefrontConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "artprint_storefront=info,artprint_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Some(session) = config.as_ref().ok().and_then(|c| c.session.as_ref()) {
        set_sentry_user(&session.user().id, session.user().name.as_deref());
    }

    if let Err(e) = run(cli, config).await {
        e.report();
        tracing::error!("Command failed: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(
    cli: Cli,
    config: Result<StorefrontConfig, artprint_storefront::config::ConfigError>,
) -> Result<(), CommandError> {
    if let Commands::Quote {
        city,
        subtotal,
        area,
    } = &cli.command
    {
        commands::quote::run(city, *subtotal, *area);
        return Ok(());
    }

    let state = commands::state(config?)?;

    match cli.command {
        Commands::Quote { .. } => {}
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state).await?,
            CartAction::Add {
                product,
                quantity,
                variant,
            } => commands::cart::add(&state, &product, quantity, variant).await?,
            CartAction::Update { line, quantity } => {
                commands::cart::update(&state, &line.into(), quantity).await?;
            }
            CartAction::Remove { line } => commands::cart::remove(&state, &line.into()).await?,
        },
        Commands::Express {
            product,
            quantity,
            variant,
            shipping,
            landing_page,
        } => {
            commands::checkout::express(
                &state,
                &product,
                quantity,
                variant,
                &shipping,
                landing_page.as_deref(),
            )
            .await?;
        }
        Commands::Checkout { shipping } => commands::checkout::checkout(&state, &shipping).await?,
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&state).await?,
            OrdersAction::Track { id } => commands::orders::track(&state, &id.into()).await?,
        },
    }
    Ok(())
}
