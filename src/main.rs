//! Bearer Authorizer
//!
//! Usage:
//!   bearer-authorizer lambda
//!   bearer-authorizer serve --port 8080
//!   bearer-authorizer evaluate --event event.json
//!   cat event.json | bearer-authorizer evaluate
//!
//! Environment:
//!   AUTHORIZER_SECRET - Static signing secret (skips the parameter store)
//!   AUTHORIZER_SECRET_PARAMETER - SSM parameter holding the secret
//!   AUTHORIZER_SECRET_ENDPOINT - Parameter store base URL (default: local extension)
//!   PARAMETERS_SECRETS_EXTENSION_HTTP_PORT - Local extension port (default: 2773)
//!   PORT - HTTP listen port for `serve` (default: 8080, invalid values are an error)
//!   AWS_SESSION_TOKEN - Token for the Parameters and Secrets extension
//!   LOG_FORMAT - `json` for JSON logs without ANSI colours
//!   RUST_LOG - Log filter (default: bearer_authorizer=info,tower_http=info)

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bearer_authorizer::{
    api,
    auth::{AuthorizerRequest, SystemClock, TokenValidator, TracingDiagnostics},
    lambda,
    Authorizer, AuthorizerConfig, AuthorizerError,
};

#[derive(Parser, Debug)]
#[command(name = "bearer-authorizer")]
#[command(about = "Bearer token authorizer for API gateways")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run as an API Gateway Lambda authorizer
    Lambda,
    /// Serve POST /authorize over HTTP
    Serve {
        /// Listen port (falls back to PORT, then 8080)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Decide a single authorizer event and print the policy
    Evaluate {
        /// Event JSON file (stdin when omitted)
        #[arg(long)]
        event: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bearer_authorizer=info,tower_http=info".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_ansi(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_authorizer(config: &AuthorizerConfig) -> Result<Authorizer> {
    let secrets = config.secret_source.build_provider()?;
    let validator = TokenValidator::new(Arc::new(SystemClock), Arc::new(TracingDiagnostics))
        .with_policy(config.window);
    Ok(Authorizer::new(secrets, validator))
}

async fn run_lambda(config: AuthorizerConfig) -> Result<()> {
    let authorizer = Arc::new(build_authorizer(&config)?);

    info!("🚀 Bearer authorizer starting in Lambda mode");
    info!("  Secret source: {:?}", config.secret_source);

    lambda::run(authorizer)
        .await
        .map_err(|err| anyhow::anyhow!("Lambda runtime failed: {}", err))
}

async fn serve(config: AuthorizerConfig, port: Option<u16>) -> Result<()> {
    let authorizer = Arc::new(build_authorizer(&config)?);
    let port = port.unwrap_or(config.port);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    info!("🚀 Bearer authorizer listening on port {}", port);
    info!("  Secret source: {:?}", config.secret_source);
    info!("  Time window: {:?}", config.window);

    axum::serve(listener, api::router(authorizer))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP server failed")
}

async fn evaluate(config: AuthorizerConfig, event: Option<PathBuf>) -> Result<ExitCode> {
    let raw = match event {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
    };
    let request: AuthorizerRequest =
        serde_json::from_str(&raw).context("Event is not a valid authorizer request")?;

    let authorizer = build_authorizer(&config)?;
    match authorizer.authorize(&request).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(AuthorizerError::Denied(_)) => {
            println!("Unauthorized");
            Ok(ExitCode::from(1))
        }
        Err(err @ AuthorizerError::SecretUnavailable(_)) => {
            eprintln!("{}", err);
            Ok(ExitCode::from(2))
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let args = Args::parse();
    let config = AuthorizerConfig::from_env()?;

    match args.command {
        Command::Lambda => run_lambda(config).await.map(|_| ExitCode::SUCCESS),
        Command::Serve { port } => serve(config, port).await.map(|_| ExitCode::SUCCESS),
        Command::Evaluate { event } => evaluate(config, event).await,
    }
}
