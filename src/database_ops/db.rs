use anyhow::Result;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

use crate::catalog::error::WriteError;
use crate::catalog::record::PricedGame;
use crate::util::env::env_flag;

const INSERT_GAME: &str = r#"INSERT INTO games (title, genre, developer, publisher,
        release_date, cover_url, stripe_id, price, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#;

/// Appends one enriched record to the catalog store. No upsert: persisting the
/// same record twice yields two rows.
#[async_trait::async_trait]
pub trait CatalogWriter: Send + Sync {
    async fn persist(&self, game: &PricedGame) -> Result<(), WriteError>;
}

#[derive(Clone)]
pub struct Db {
    pub pool: PgPool,
}

impl Db {
    /// Connect without running migrations. The seeder owns a single connection
    /// for the whole run.
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let use_prepared = env_flag("USE_PREPARED", false);
        let mut connect_options = PgConnectOptions::from_str(database_url)?;

        if database_url.contains("sslmode=require") {
            connect_options = connect_options.ssl_mode(PgSslMode::Require);
        }

        if !use_prepared {
            // PgBouncer txn mode safe
            connect_options = connect_options.statement_cache_capacity(0);
        }

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(connect_options)
            .await?;
        info!(use_prepared, "connected to db");
        Ok(Self { pool })
    }

    pub async fn insert_game(&self, game: &PricedGame) -> Result<(), WriteError> {
        let rec = &game.record;
        let done = sqlx::query(INSERT_GAME)
            .bind(&rec.title)
            .bind(&rec.genre)
            .bind(&rec.developer)
            .bind(&rec.publisher)
            .bind(rec.release_date)
            .bind(&rec.cover_url)
            .bind(game.price_id.as_str())
            .bind(rec.price)
            .bind(&rec.description)
            .execute(&self.pool)
            .await?;
        match done.rows_affected() {
            1 => Ok(()),
            n => Err(WriteError::RowCount(n)),
        }
    }
}

#[async_trait::async_trait]
impl CatalogWriter for Db {
    async fn persist(&self, game: &PricedGame) -> Result<(), WriteError> {
        self.insert_game(game).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_binds_all_nine_columns() {
        let cols = INSERT_GAME
            .split_once('(')
            .and_then(|(_, rest)| rest.split_once(')'))
            .map(|(cols, _)| cols.split(',').map(str::trim).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(
            cols,
            [
                "title",
                "genre",
                "developer",
                "publisher",
                "release_date",
                "cover_url",
                "stripe_id",
                "price",
                "description"
            ]
        );
        assert!(INSERT_GAME.contains("$9"));
        assert!(!INSERT_GAME.contains("$10"));
    }

    #[tokio::test]
    async fn connect_rejects_malformed_dsn() {
        assert!(Db::connect("not a dsn").await.is_err());
    }
}
