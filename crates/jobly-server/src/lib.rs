//! HTTP API for companies and the jobs they post.

pub mod auth;
pub mod config;
pub mod error;
pub mod params;
pub mod routes;

use crate::auth::{Claims, TokenKey};
use crate::config::{ConfigFile, Settings};
use crate::error::ApiResult;
use anyhow::Context;
use axum::Router;
use axum::extract::FromRef;
use axum::routing::get;
use clap::{Parser, Subcommand};
use jobly::TracingClient;
use jobly::deadpool_postgres::{Client, Pool};
use std::path::PathBuf;
use tower_http::trace::TraceLayer;

#[derive(Debug, Parser)]
#[command(name = "jobly")]
#[command(about = "Companies and job postings API server")]
pub struct Cli {
    /// Path to the config file (default: ./jobly.toml, optional)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Print a signed bearer token for the configured secret
    IssueToken {
        #[arg(long)]
        username: String,
        /// Grant admin rights
        #[arg(long)]
        admin: bool,
    },
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub tokens: TokenKey,
    pub max_sql_length: usize,
}

impl AppState {
    pub fn new(pool: Pool, tokens: TokenKey, max_sql_length: usize) -> Self {
        Self {
            pool,
            tokens,
            max_sql_length,
        }
    }

    /// Check out a pooled connection that logs its statements.
    pub async fn conn(&self) -> ApiResult<TracingClient<Client>> {
        let client = self.pool.get().await.map_err(jobly::JoblyError::from)?;
        Ok(TracingClient::new(client).max_sql_length(self.max_sql_length))
    }
}

impl FromRef<AppState> for TokenKey {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// The full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .nest("/companies", routes::companies::router())
        .nest("/jobs", routes::jobs::router())
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = ConfigFile::load(cli.config.as_deref())?
        .resolve(|key| std::env::var(key).ok())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::IssueToken { username, admin } => {
            let key = token_key(&settings)?;
            let token = key.sign(&Claims {
                username,
                is_admin: admin,
            })?;
            println!("{token}");
            Ok(())
        }
    }
}

fn token_key(settings: &Settings) -> anyhow::Result<TokenKey> {
    TokenKey::new(settings.secret_key.as_bytes()).context("invalid secret key")
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let tokens = token_key(&settings)?;
    let pool = jobly::create_pool_with_config(&settings.database_url, settings.max_pool_size)
        .context("failed to create database pool")?;

    let state = AppState::new(pool.clone(), tokens, settings.max_sql_length);
    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("cannot bind {}", settings.bind))?;
    tracing::info!(addr = %settings.bind, "listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close();
    tracing::info!("database pool closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
