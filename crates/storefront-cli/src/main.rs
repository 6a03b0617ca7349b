mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    category::CategorySubcommand, order::OrderSubcommand, product::ProductSubcommand,
    user::UserSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "storefront",
    about = "Small online shop: catalog, carts, checkout with GST, and order history",
    version,
    propagate_version = true
)]
struct Cli {
    /// Store root (default: auto-detect from storefront.yaml)
    #[arg(long, global = true, env = "STOREFRONT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config, create the database and seed it
    Init,

    /// Run the HTTP API
    Serve {
        /// Port to listen on (default: `port` from storefront.yaml)
        #[arg(long, env = "STOREFRONT_PORT")]
        port: Option<u16>,
        /// Open the browser once listening
        #[arg(long)]
        open: bool,
    },

    /// Inspect the product catalog
    Product {
        #[command(subcommand)]
        subcommand: ProductSubcommand,
    },

    /// Inspect categories
    Category {
        #[command(subcommand)]
        subcommand: CategorySubcommand,
    },

    /// Inspect order history
    Order {
        #[command(subcommand)]
        subcommand: OrderSubcommand,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        subcommand: UserSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Serve { port, open } => cmd::serve::run(&root, port, open),
        Commands::Product { subcommand } => cmd::product::run(&root, subcommand, cli.json),
        Commands::Category { subcommand } => cmd::category::run(&root, subcommand, cli.json),
        Commands::Order { subcommand } => cmd::order::run(&root, subcommand, cli.json),
        Commands::User { subcommand } => cmd::user::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
