use anyhow::Result;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS weather_notifications (
        id BIGSERIAL PRIMARY KEY,
        city TEXT NOT NULL,
        condition TEXT NOT NULL,
        temperature_celsius DOUBLE PRECISION NOT NULL,
        message TEXT NOT NULL,
        occurred_at TIMESTAMP NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS weather_notifications_occurred_at_idx
        ON weather_notifications (occurred_at DESC)",
    "CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        user_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        city TEXT NOT NULL,
        notification_preference TEXT NOT NULL
    )",
];

/// PostgreSQL client wrapper with connection pooling
#[derive(Clone)]
pub struct PostgresClient {
    pool: Pool,
}

impl PostgresClient {
    /// Creates a new PostgreSQL client with connection pooling
    pub fn new(
        host: &str,
        port: u16,
        database: &str,
        username: &str,
        password: &str,
        max_pool_size: usize,
    ) -> Result<Self> {
        let mut cfg = Config::new();
        cfg.host = Some(host.to_string());
        cfg.port = Some(port);
        cfg.dbname = Some(database.to_string());
        cfg.user = Some(username.to_string());
        cfg.password = Some(password.to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
        pool.resize(max_pool_size);

        Ok(Self { pool })
    }

    /// Pings the database to verify connectivity
    pub async fn ping(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client.execute("SELECT 1", &[]).await?;
        debug!("postgreSQL connection successful");
        Ok(())
    }

    /// Creates the notification and user tables when they do not exist yet.
    ///
    /// Idempotent startup bootstrap; there is no versioned migration tooling
    /// in scope.
    pub async fn init_schema(&self) -> Result<()> {
        let client = self.pool.get().await?;
        for statement in SCHEMA {
            client.execute(*statement, &[]).await?;
        }
        info!("database schema ready");
        Ok(())
    }

    /// Gets a connection from the pool
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Client> {
        Ok(self.pool.get().await?)
    }
}
