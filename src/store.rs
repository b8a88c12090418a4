//! Connection pool setup and schema helpers for entity tables.

use crate::config::AppConfig;
use crate::entity::Entity;
use crate::error::AppError;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyConnection, AnyPool, Connection};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Backend::Postgres)
        } else if url.starts_with("sqlite:") {
            Some(Backend::Sqlite)
        } else {
            None
        }
    }
}

/// Connect the pool described by `config`, creating the PostgreSQL database first if needed.
pub async fn connect(config: &AppConfig) -> Result<AnyPool, AppError> {
    sqlx::any::install_default_drivers();
    let backend = Backend::from_url(&config.database_url).ok_or_else(|| {
        AppError::invalid_argument(format!(
            "unsupported DATABASE_URL scheme: {}",
            config.database_url
        ))
    })?;
    if backend == Backend::Postgres {
        ensure_database_exists(&config.database_url).await?;
    }
    // Every in-memory SQLite connection is its own database.
    let max_connections = match backend {
        Backend::Sqlite if config.database_url.contains(":memory:") => 1,
        _ => config.max_connections,
    };
    let pool = AnyPoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(&config.database_url)
        .await?;
    tracing::info!(?backend, max_connections, "database pool ready");
    Ok(pool)
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    sqlx::any::install_default_drivers();
    let mut conn = AnyConnection::connect(&admin_url).await?;
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pg_database WHERE datname = $1")
        .bind(db_name.clone())
        .fetch_one(&mut conn)
        .await?;
    if exists == 0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    conn.close().await?;
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url
        .get(scheme_end..)
        .and_then(|rest| rest.find('/'))
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| AppError::invalid_argument("DATABASE_URL: no path"))?;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let mut parts = path_and_query.splitn(2, '?');
    let db_name = parts.next().unwrap_or("").trim();
    let query = parts.next().map(|q| format!("?{}", q)).unwrap_or_default();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres{}", base, query);
    Ok((admin_url, db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column definitions for the audit fields, for use inside CREATE TABLE.
pub fn audit_columns_ddl(backend: Backend) -> &'static str {
    match backend {
        Backend::Postgres => {
            "\"id\" BIGSERIAL PRIMARY KEY, \
             \"create_time\" BIGINT NOT NULL, \
             \"update_time\" BIGINT NOT NULL, \
             \"deleted\" BIGINT NOT NULL DEFAULT 0, \
             \"create_by\" BIGINT, \
             \"update_by\" BIGINT, \
             \"version\" BIGINT NOT NULL DEFAULT 1"
        }
        Backend::Sqlite => {
            "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"create_time\" BIGINT NOT NULL, \
             \"update_time\" BIGINT NOT NULL, \
             \"deleted\" BIGINT NOT NULL DEFAULT 0, \
             \"create_by\" BIGINT, \
             \"update_by\" BIGINT, \
             \"version\" BIGINT NOT NULL DEFAULT 1"
        }
    }
}

/// CREATE TABLE IF NOT EXISTS for an entity. `columns_ddl` defines the entity's own columns
/// (and any table constraints), e.g. `"title" TEXT NOT NULL`.
pub fn create_table_sql<E: Entity>(backend: Backend, columns_ddl: &str) -> String {
    let extra = if columns_ddl.trim().is_empty() {
        String::new()
    } else {
        format!(", {}", columns_ddl)
    };
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({}{})",
        quote_ident(E::TABLE),
        audit_columns_ddl(backend),
        extra
    )
}

/// Create the entity's table plus an index serving the live, newest-first listing.
pub async fn ensure_table<E: Entity>(pool: &AnyPool, columns_ddl: &str) -> Result<(), AppError> {
    let mut conn = pool.acquire().await?;
    let backend = if conn.backend_name() == "PostgreSQL" {
        Backend::Postgres
    } else {
        Backend::Sqlite
    };
    sqlx::query(&create_table_sql::<E>(backend, columns_ddl))
        .execute(&mut *conn)
        .await?;
    let index = format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} (\"deleted\", \"create_time\")",
        quote_ident(&format!("{}_live_idx", E::TABLE)),
        quote_ident(E::TABLE)
    );
    sqlx::query(&index).execute(&mut *conn).await?;
    tracing::info!(table = E::TABLE, "table ready");
    Ok(())
}
