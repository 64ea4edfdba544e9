pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

use crate::config::config;
use crate::database::{DatabaseManager, PgStore};

#[derive(Parser)]
#[command(name = "collections")]
#[command(about = "Collections CLI - operator commands against the collections database")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "List users with their roles and status")]
    Users,

    #[command(about = "Grant the Admin role (use this to bootstrap the first admin)")]
    Promote {
        #[arg(help = "Username")]
        username: String,
    },

    #[command(about = "Revoke the Admin role")]
    Demote {
        #[arg(help = "Username")]
        username: String,
    },

    #[command(about = "Block a user; their tokens stop working immediately")]
    Block {
        #[arg(help = "Username")]
        username: String,
    },

    #[command(about = "Unblock a user")]
    Unblock {
        #[arg(help = "Username")]
        username: String,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let pool = DatabaseManager::connect_lazy(&config().database)?;
    let store = PgStore::new(pool.clone());

    match cli.command {
        Commands::Migrate => commands::migrate::handle(&pool, output_format).await,
        Commands::Users => commands::users::list(&store, output_format).await,
        Commands::Promote { username } => commands::users::promote(&store, &username, output_format).await,
        Commands::Demote { username } => commands::users::demote(&store, &username, output_format).await,
        Commands::Block { username } => commands::users::block(&store, &username, output_format).await,
        Commands::Unblock { username } => commands::users::unblock(&store, &username, output_format).await,
    }
}
