//! Development reset: tear the service's database down.
//!
//! Drops the two trigger functions (cascading to the database triggers that
//! use them), then, only once that has succeeded, drops every table of the
//! current schema. There is no confirmation and no rollback.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::NukeError;

pub const DROP_TRIGGER_FUNCTIONS: &str = "\
DROP FUNCTION IF EXISTS response_trigger() CASCADE;
DROP FUNCTION IF EXISTS user_trigger() CASCADE;";

const LIST_TABLES: &str =
    "SELECT tablename::text FROM pg_catalog.pg_tables WHERE schemaname = current_schema()";

#[async_trait]
pub trait Teardown: Send + Sync {
    async fn drop_functions(&self) -> Result<(), NukeError>;

    async fn tables(&self) -> Result<Vec<String>, NukeError>;

    async fn drop_table(&self, table: &str) -> Result<(), NukeError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NukeReport {
    pub dropped_tables: Vec<String>,
}

pub async fn nuke(target: &dyn Teardown) -> Result<NukeReport, NukeError> {
    target.drop_functions().await?;

    let tables = target.tables().await?;
    for table in &tables {
        target.drop_table(table).await?;
        tracing::debug!(table, "dropped table");
    }

    tracing::info!(tables = tables.len(), "NUKED!!!");
    Ok(NukeReport {
        dropped_tables: tables,
    })
}

/// Postgres-backed teardown over a single-connection pool.
pub struct PgTeardown {
    pool: PgPool,
}

impl PgTeardown {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Teardown for PgTeardown {
    async fn drop_functions(&self) -> Result<(), NukeError> {
        sqlx::raw_sql(DROP_TRIGGER_FUNCTIONS)
            .execute(&self.pool)
            .await
            .map_err(|e| NukeError::DropFunctions(e.to_string()))?;
        Ok(())
    }

    async fn tables(&self) -> Result<Vec<String>, NukeError> {
        sqlx::query_scalar::<_, String>(LIST_TABLES)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| NukeError::ListTables(e.to_string()))
    }

    async fn drop_table(&self, table: &str) -> Result<(), NukeError> {
        let statement = format!("DROP TABLE IF EXISTS {} CASCADE", quote_ident(table));
        sqlx::raw_sql(&statement)
            .execute(&self.pool)
            .await
            .map_err(|e| NukeError::DropTable {
                table: table.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

/// Quote a Postgres identifier; embedded quotes are doubled.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
