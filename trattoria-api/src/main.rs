use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::info;
use trattoria_api::{
    app,
    config::Config,
    handlers::{AppState, Database},
};
use trattoria_service::{account, establish_connection, run_migrations, token::TokenIssuer};

#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations, then serve the HTTP API
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Register an administrator account
    CreateAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Migrate => {
            let mut conn = establish_connection(&config.database_url)?;
            let applied = run_migrations(&mut conn)?;
            info!(applied, "migrations complete");
            Ok(())
        }
        Commands::CreateAdmin { name, password } => {
            let mut conn = establish_connection(&config.database_url)?;
            let admin = account::create_admin(&mut conn, &name, &password)?;
            info!(admin_id = %admin.id, name = %admin.name, "admin account ready");
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = establish_connection(&config.database_url)?;
    run_migrations(&mut conn)?;
    drop(conn);

    let state = AppState {
        db: Database::new(&config.database_url),
        tokens: Arc::new(TokenIssuer::new(config.secret_key.as_bytes())),
        secure_cookies: config.secure_cookies,
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("Trattoria API listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
