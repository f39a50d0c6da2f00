//! Bazaar CLI - command-line front end for the marketplace.
//!
//! A thin stand-in for the view layer: every command resolves the stored
//! session, runs one SDK operation, and renders the outcome. All state logic
//! lives in `bazaar-client`.
//!
//! # Usage
//!
//! ```bash
//! # Authenticate (the credential persists across invocations)
//! bazaar login -u alice -p hunter2
//!
//! # Who am I?
//! bazaar whoami
//!
//! # Cart operations
//! bazaar cart show
//! bazaar cart add 7c9e6679-7425-40de-944b-e07fc1f90ae7 -q 2
//! bazaar cart clear
//!
//! # Catalog
//! bazaar products list --page 1
//! bazaar products search mug
//!
//! # End the session
//! bazaar logout
//! ```
//!
//! # Environment Variables
//!
//! - `BAZAAR_API_URL` - Base URL of the marketplace API
//! - `BAZAAR_CREDENTIAL_FILE` - Override the credential slot location

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};

use bazaar_core::{ProductId, Role};

mod commands;

use commands::App;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar marketplace CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session credential
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create a new account (does not log in)
    Register {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// Show the current session identity
    Whoami,
    /// Change the account role (`buyer`, `seller`, `admin`)
    Role { role: Role },
    /// Cart operations
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Catalog browsing
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart contents and total
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: ProductId,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a product already in the cart
    Update {
        /// Product ID
        product_id: ProductId,

        /// New quantity
        #[arg(short, long)]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove every item from the cart
    Clear,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Items per page (5-10)
        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },
    /// Search products by name
    Search {
        /// Search query
        query: String,
    },
    /// Show a single product
    Show {
        /// Product ID
        product_id: ProductId,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::bootstrap().await?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::session::login(&app, &username, &password).await?;
        }
        Commands::Register {
            username,
            email,
            password,
        } => commands::session::register(&app, &username, &email, &password).await?,
        Commands::Logout => commands::session::logout(&app),
        Commands::Whoami => commands::session::whoami(&app),
        Commands::Role { role } => commands::session::update_role(&app, role).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&app),
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&app, product_id, quantity).await?,
            CartAction::Update {
                product_id,
                quantity,
            } => commands::cart::update(&app, product_id, quantity).await?,
            CartAction::Remove { product_id } => commands::cart::remove(&app, product_id).await?,
            CartAction::Clear => commands::cart::clear(&app).await?,
        },
        Commands::Products { action } => match action {
            ProductAction::List { page, page_size } => {
                commands::catalog::list(&app, page, page_size).await?;
            }
            ProductAction::Search { query } => commands::catalog::search(&app, &query).await?,
            ProductAction::Show { product_id } => commands::catalog::show(&app, product_id).await?,
        },
    }
    Ok(())
}
