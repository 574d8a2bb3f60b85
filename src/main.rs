use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use localshare::config::Config;
use localshare::state::AppState;
use localshare::server::{build_router, print_startup_banner, start_server};
use localshare::utils::cleanup_shared_dir;

// use mimalloc as the global allocator
// 10-20% faster than system allocator
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> ExitCode {
    // load .env file if it exists (fails silently if not found)
    let _ = dotenvy::dotenv();

    // load configuration from environment variables
    let config = Config::from_env();

    // build tokio runtime with configured worker threads
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to build Tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async {
        // initialize tracing
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();

        // create the directory if it doesn't exist
        if !config.files_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(&config.files_dir) {
                tracing::error!("Failed to create shared directory {:?}: {}", config.files_dir, e);
                return ExitCode::FAILURE;
            }
            tracing::info!("Created shared directory at: {:?}", config.files_dir);
        }

        let addr = match config.host.parse::<std::net::IpAddr>() {
            Ok(ip) => SocketAddr::from((ip, config.port)),
            Err(e) => {
                tracing::error!("Invalid SHARE_HOST {:?}: {}", config.host, e);
                return ExitCode::FAILURE;
            }
        };

        let state = Arc::new(AppState::from_config(&config));
        let app = build_router(state, config.max_upload_size);

        print_startup_banner(&config);
        let status = match start_server(app, addr).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("Server error: {}", e);
                ExitCode::FAILURE
            }
        };

        if config.cleanup_on_exit {
            cleanup_shared_dir(&config.files_dir).await;
        }
        status
    })
}
