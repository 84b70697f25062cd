use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use http::StatusCode;
use tracing::info;

use crate::dispatcher::{Context, Engine};
use crate::middleware::{basic_auth, handler, request_id};
use crate::runtime_config::RuntimeConfig;
use crate::server::HttpServer;

/// Command-line interface for the demo server
#[derive(Parser, Debug)]
#[command(name = "chainrouter")]
#[command(about = "chainrouter demo server", long_about = None, version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the demo routes until Ctrl-C
    Serve {
        /// Listen address, overrides config file and environment
        #[arg(short, long)]
        addr: Option<String>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the demo route table
    Routes,
}

fn hello(c: &mut Context) {
    let body = format!("hello {}, you're at {}", c.param("name"), c.path());
    c.string(StatusCode::OK, body);
}

fn static_echo(c: &mut Context) {
    let filepath = c.param("filepath").to_string();
    c.json(StatusCode::OK, serde_json::json!({ "filepath": filepath }));
}

fn echo_body(c: &mut Context) {
    let body = c.body().clone();
    c.data(StatusCode::OK, "application/octet-stream", body);
}

/// Build the engine served by `chainrouter serve`
///
/// # Errors
///
/// Route registration errors.
pub fn demo_engine(config: &RuntimeConfig) -> anyhow::Result<Engine> {
    let mut engine = Engine::default_stack().with_pool_capacity(config.pool_capacity);
    let mut root = engine.root();
    root.get("/", [handler(|c| c.string(StatusCode::OK, "chainrouter"))])?
        .get("/hello/:name", [handler(hello)])?
        .get("/static/*filepath", [handler(static_echo)])?
        .get("/panic", [handler(|_| panic!("demo panic"))])?;

    let mut v1 = root.group("/api/v1");
    v1.use_middleware([request_id(), basic_auth("admin", "secret")]);
    v1.get("/ping", [handler(|c| c.json(StatusCode::OK, serde_json::json!({ "pong": true })))])?
        .post("/echo", [handler(echo_body)])?;

    Ok(engine)
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<RuntimeConfig> {
    let mut config = match path {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::default(),
    };
    config.apply_env()?;
    Ok(config)
}

/// Execute a parsed command
///
/// # Errors
///
/// Configuration, registration and server errors; any of them should stop
/// the process.
pub async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { addr, config } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(addr) = addr {
                config.addr = addr;
            }
            let dispatcher = Arc::new(demo_engine(&config)?.build());
            info!(addr = %config.addr, "Starting demo server");
            HttpServer::new(dispatcher)
                .with_config(&config)
                .run_until_signal(&config.addr)
                .await
                .with_context(|| format!("server on {} failed", config.addr))?;
        }
        Commands::Routes => {
            let engine = demo_engine(&RuntimeConfig::default())?;
            for (method, pattern) in engine.routes() {
                println!("{method:<7} {pattern}");
            }
        }
    }
    Ok(())
}
