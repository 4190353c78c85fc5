use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use intelix::abilities::Services;
use intelix::{config::Config, create_router, db, utils::init_logger, AppState, TaskRunner};

const PROGRESS_CAPACITY: usize = 256;

/// Intelix CLI.
#[derive(Parser)]
#[command(name = "intelix")]
#[command(about = "Personal-assistant task runner")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Run one task and print the JSON result
    Run {
        /// Free-text task, e.g. "find wireless earbuds under 2000"
        task: String,

        /// User the task is recorded for
        #[arg(long, default_value_t = 1)]
        user: i64,

        /// Answer the form submission prompt up front
        #[arg(long, value_enum)]
        confirm_submit: Option<Answer>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Answer {
    Yes,
    No,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    let _log_guard = init_logger(log_dir.as_deref());

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    info!("Configuration loaded: {:?}", config.server);

    let store = db::create_store(&config.database).await?;
    let services = Services::from_config(config.clone(), store.clone());
    let (progress, _) = broadcast::channel(PROGRESS_CAPACITY);
    let runner = Arc::new(TaskRunner::new(services, progress.clone()));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let state = AppState {
                config: config.clone(),
                store,
                runner,
                progress,
            };
            serve(state).await
        }
        Commands::Run {
            task,
            user,
            confirm_submit,
        } => {
            let confirm = confirm_submit.map(|answer| matches!(answer, Answer::Yes));
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling task");
                    on_interrupt.cancel();
                }
            });

            let response = runner.run_with_cancel(user, &task, confirm, cancel).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let host: std::net::IpAddr = state
        .config
        .server
        .host
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid HOST '{}': {}", state.config.server.host, e))?;
    let addr = SocketAddr::new(host, state.config.server.port);

    // Create router
    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
