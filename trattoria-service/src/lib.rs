use diesel::{Connection, ConnectionResult, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub mod account;
pub mod cart;
pub mod course;
pub mod error;
pub mod menu;
pub mod models;
pub mod reservation;
pub mod schema;
pub mod token;

pub use error::{ServiceError, ServiceResult};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub fn establish_connection(database_url: &str) -> ConnectionResult<PgConnection> {
    PgConnection::establish(database_url)
}

pub fn run_migrations(
    conn: &mut PgConnection,
) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in &applied {
        tracing::info!(%version, "applied migration");
    }
    Ok(applied.len())
}
