pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "godplan-api")]
#[command(about = "GodPlan API - attendance backend with geofenced clock-in/out")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Mint a bearer token with the configured secret")]
    Token {
        #[arg(help = "User id (UUID)")]
        user_id: uuid::Uuid,
        #[arg(help = "Email claim")]
        email: String,
        #[arg(long, default_value = crate::database::models::user::DEFAULT_ROLE, help = "Role claim")]
        role: String,
    },

    #[command(about = "Evaluate a coordinate against the office geofence")]
    Distance {
        #[arg(allow_hyphen_values = true, help = "Latitude in degrees")]
        latitude: f64,
        #[arg(allow_hyphen_values = true, help = "Longitude in degrees")]
        longitude: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve::handle(config).await,
        Commands::Migrate => commands::migrate::handle(config, output_format).await,
        Commands::Token { user_id, email, role } => {
            commands::token::handle(&config, user_id, &email, &role, output_format)
        }
        Commands::Distance { latitude, longitude } => {
            commands::distance::handle(&config, latitude, longitude, output_format)
        }
    }
}
