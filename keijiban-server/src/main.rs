use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;
use axum::{
    routing::{get, put},
    Router,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use structopt::StructOpt;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod db;
mod error;
mod extractors;
mod fuzz;
mod handlers;

use error::Error;
use extractors::*;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(structopt::StructOpt)]
struct Opt {
    /// Database to store posts in, created if missing
    #[structopt(long, env = "DATABASE_URL", default_value = "sqlite://keijiban.db")]
    database_url: String,

    /// Address to listen on
    #[structopt(long, env = "KEIJIBAN_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,
}

pub async fn create_sqlx_pool(db_url: &str) -> anyhow::Result<sqlx::SqlitePool> {
    let opts = SqliteConnectOptions::from_str(db_url)
        .with_context(|| format!("parsing database url {db_url:?}"))?
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(opts)
        .await
        .with_context(|| format!("opening database {db_url:?}"))
}

pub fn app(db: sqlx::SqlitePool) -> Router {
    let state = AppState {
        db: DbPool::new(db),
    };
    Router::new()
        .route(
            "/api/posts",
            get(handlers::fetch_posts).post(handlers::create_post),
        )
        .route(
            "/api/posts/:id",
            put(handlers::update_post).delete(handlers::delete_post),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opt = Opt::from_args();

    let db = create_sqlx_pool(&opt.database_url).await?;
    MIGRATOR
        .run(&db)
        .await
        .context("running pending migrations")?;

    let app = app(db);

    tracing::info!("listening on {}", opt.listen);
    axum::Server::bind(&opt.listen)
        .serve(app.into_make_service())
        .await
        .context("serving axum webserver")
}
