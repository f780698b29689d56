//! Spiral Screen - HTTP entry point
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Upload  │───▶│ Normalize│───▶│ Classify │───▶│  Record  │
//! │(multipart)│   │ (224x224)│    │  (ONNX)  │    │ (SQLite) │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use utoipa::OpenApi;

use spiral_screen::config::AppConfig;
use spiral_screen::gateway::openapi::ApiDoc;
use spiral_screen::user_auth::AdminProvision;
use spiral_screen::{AppState, Database, UserAuthService, logging};

/// Parkinson's screening service for spiral and wave drawings
#[derive(Parser)]
#[command(name = "spiral_screen")]
#[command(version)]
struct Cli {
    /// Configuration profile, read from config/{env}.yaml
    #[arg(short, long, global = true, default_value = "dev")]
    env: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Override the configured listen port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create an admin account (no-op if the username exists)
    CreateAdmin {
        #[arg(short, long, default_value = "admin1")]
        username: String,

        #[arg(short, long, env = "SPIRAL_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Print the OpenAPI document, or write it to a file
    ExportOpenapi {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::ExportOpenapi { output } = &cli.command {
        return export_openapi(output.as_deref());
    }

    let app_config = AppConfig::load(&cli.env)?;
    let _log_guard = logging::init_logging(&app_config);

    tracing::info!(
        "Starting Spiral Screen ({}) in {} mode",
        env!("GIT_HASH"),
        cli.env
    );

    match cli.command {
        Commands::Serve { port } => {
            let state = Arc::new(AppState::from_config(&app_config).await?);
            let gateway = &app_config.gateway;
            spiral_screen::run_server(
                &gateway.host,
                port.unwrap_or(gateway.port),
                state,
                gateway.max_upload_bytes,
            )
            .await
        }
        Commands::CreateAdmin { username, password } => {
            let db = Database::connect(&app_config.database_url).await?;
            db.migrate().await?;
            let user_auth = UserAuthService::new(db.pool().clone(), &app_config.auth)?;
            match user_auth
                .provision_admin(&username, &password)
                .await
                .context("Failed to create admin")?
            {
                AdminProvision::Created(id) => {
                    println!("Admin user '{}' created (id {})", username, id)
                }
                AdminProvision::AlreadyExists => {
                    println!("User '{}' already exists, nothing to do", username)
                }
            }
            Ok(())
        }
        Commands::ExportOpenapi { .. } => Ok(()),
    }
}

fn export_openapi(output: Option<&std::path::Path>) -> Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("OpenAPI document exported to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
