use clap::Parser;
use reviewlens_core::config;
use reviewlens_core::lexicon::Lexicon;
use reviewlens_core::sentiment::SentimentAnalyzer;
use reviewlens_core::storage::{ReviewStore, StoreOptions};
use reviewlens_server::api::create_router;
use reviewlens_server::api::handlers::AppState;
use reviewlens_server::api::metrics;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reviewlens", about = "Customer review sentiment service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Data directory holding reviews.csv and the WAL
    #[arg(short, long, env = "REVIEWLENS_DATA_DIR", default_value = config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// VADER-format lexicon file (defaults to the bundled English lexicon)
    #[arg(long, env = "REVIEWLENS_LEXICON")]
    lexicon: Option<PathBuf>,

    /// Compaction interval in seconds (0 = only at startup and shutdown)
    #[arg(long, default_value_t = config::DEFAULT_COMPACT_INTERVAL_SECS)]
    compact_interval: u64,

    /// Start even if WAL replay finds corrupt entries (they are dropped)
    #[arg(long, default_value_t = false)]
    wal_lenient: bool,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    shutdown_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(
                    "reviewlens_server=info"
                        .parse()
                        .expect("valid directive literal"),
                )
                .add_directive(
                    "reviewlens_core=info"
                        .parse()
                        .expect("valid directive literal"),
                ),
        )
        .init();

    let args = Args::parse();

    if args.port == 0 {
        eprintln!("Error: port must be > 0");
        std::process::exit(1);
    }
    if args.data_dir.exists() && !args.data_dir.is_dir() {
        eprintln!(
            "Error: data_dir '{}' exists but is not a directory",
            args.data_dir.display()
        );
        std::process::exit(1);
    }

    let lexicon = match args.lexicon {
        Some(ref path) => Lexicon::from_path(path).unwrap_or_else(|e| {
            eprintln!("Error: failed to load lexicon '{}': {}", path.display(), e);
            std::process::exit(1);
        }),
        None => Lexicon::builtin(),
    };
    tracing::info!("Lexicon ready ({} entries)", lexicon.len());

    let options = StoreOptions {
        wal_strict: !args.wal_lenient,
    };
    let store = match ReviewStore::open(&args.data_dir, options) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!(
                "Error: cannot load reviews from '{}': {}. \
                 Refusing to serve an unknown review set.",
                args.data_dir.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let prometheus_handle =
        metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let state = AppState {
        store: store.clone(),
        analyzer: SentimentAnalyzer::new(Arc::new(lexicon)),
        prometheus_handle,
        start_time: Instant::now(),
    };
    let app = create_router(state);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = args.port,
        data_dir = %args.data_dir.display(),
        compact_interval_secs = args.compact_interval,
        wal_strict = options.wal_strict,
        reviews = store.len(),
        "reviewlens ready"
    );

    // Spawn store metrics background task
    let metrics_store = store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(15));
        loop {
            interval.tick().await;
            metrics::update_store_metrics(&metrics_store);
        }
    });

    // Spawn periodic compaction task
    if args.compact_interval > 0 {
        let compact_store = store.clone();
        let compact_interval = args.compact_interval;
        tracing::info!("Periodic compaction enabled every {}s", compact_interval);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(compact_interval));
            interval.tick().await;
            loop {
                interval.tick().await;
                if compact_store.wal_size_bytes() == 0 {
                    continue;
                }
                let store = compact_store.clone();
                match tokio::task::spawn_blocking(move || store.compact()).await {
                    Ok(Ok(count)) => tracing::info!("Periodic compaction wrote {} reviews", count),
                    Ok(Err(e)) => tracing::error!("Periodic compaction failed: {}", e),
                    Err(e) => tracing::error!("Periodic compaction task panicked: {}", e),
                }
            }
        });
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    flush_and_shutdown(store, args.shutdown_timeout).await;
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    tracing::info!("Shutting down gracefully, draining in-flight requests...");
}

/// Folds the WAL into the snapshot before exit. The WAL is left in place if
/// this fails or times out, so nothing acknowledged is lost.
async fn flush_and_shutdown(store: Arc<ReviewStore>, timeout_secs: u64) {
    tracing::info!("All requests drained, compacting review store...");
    let task = tokio::task::spawn_blocking(move || store.compact());
    match tokio::time::timeout(Duration::from_secs(timeout_secs), task).await {
        Ok(Ok(Ok(count))) => tracing::info!("Saved {} reviews on shutdown", count),
        Ok(Ok(Err(e))) => {
            tracing::error!("Shutdown compaction failed, WAL preserved for recovery: {}", e)
        }
        Ok(Err(e)) => tracing::error!("Shutdown compaction task panicked: {}", e),
        Err(_) => tracing::error!(
            "Shutdown compaction timeout ({}s) exceeded, WAL preserved for recovery",
            timeout_secs
        ),
    }
}
