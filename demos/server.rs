//! Demo server: one `Article` entity mounted at /api/articles next to the health,
//! greeting and diagnostic routes. Configuration comes from the environment (.env honored).

use axum::Router;
use crud_starter::{
    base_routes, connect, entity_routes, ensure_table, with_layers, AnyQuery, AppConfig, AppError,
    AppState, AuditFields, Entity,
};
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::Row;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    #[serde(flatten)]
    audit: AuditFields,
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    published: bool,
}

impl Entity for Article {
    const TABLE: &'static str = "articles";
    const COLUMNS: &'static [&'static str] = &["title", "body", "published"];

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn bind_columns<'q>(&self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query
            .bind(self.title.clone())
            .bind(self.body.clone())
            .bind(i64::from(self.published))
    }

    fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Article {
            audit: AuditFields::from_row(row)?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            published: row.try_get::<i64, _>("published")? != 0,
        })
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::invalid_argument("title must not be blank"));
        }
        Ok(())
    }
}

const ARTICLE_COLUMNS: &str =
    "\"title\" TEXT NOT NULL, \"body\" TEXT NOT NULL DEFAULT '', \"published\" BIGINT NOT NULL DEFAULT 0";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("crud_starter=info".parse()?))
        .init();

    let config = AppConfig::from_env()?;
    let pool = connect(&config).await?;
    ensure_table::<Article>(&pool, ARTICLE_COLUMNS).await?;

    let state = AppState::new(pool, &config);
    let app = with_layers(
        Router::new()
            .merge(base_routes(state.clone()))
            .nest("/api/articles", entity_routes::<Article>(state)),
        config.body_limit,
    );

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
