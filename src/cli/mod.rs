pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "pragxi")]
#[command(about = "Pragxi CLI - rider enrollment from the command line")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format instead of text")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in as a staff member")]
    Login {
        #[arg(long, help = "Admin API base URL (defaults to the last server used)")]
        server: Option<String>,
        #[arg(long, help = "Staff email")]
        email: String,
        #[arg(long, help = "Staff password")]
        password: String,
    },

    #[command(about = "Sign out and forget the stored token")]
    Logout,

    #[command(about = "Rider enrollment wizard")]
    Enroll {
        #[command(subcommand)]
        cmd: commands::enroll::EnrollCommands,
    },

    #[command(about = "Browse enrolled riders")]
    Riders {
        #[command(subcommand)]
        cmd: commands::riders::RidersCommands,
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

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Login { server, email, password } => {
            commands::auth::login(server, email, password, output_format).await
        }
        Commands::Logout => commands::auth::logout(output_format).await,
        Commands::Enroll { cmd } => commands::enroll::handle(cmd, output_format).await,
        Commands::Riders { cmd } => commands::riders::handle(cmd, output_format).await,
    }
}
