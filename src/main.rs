use quote_sync::AppConfig;
use quote_sync::remote::{
	HttpRemote, OfflineTransport, RemoteGateway, RemoteSource, SimulatedServer,
};
use quote_sync::storage::FileKeyValueStore;
use quote_sync::sync::{SyncOrchestrator, SyncOutcome, SyncScheduler, TracingEventHandler};

use std::sync::Arc;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.init();

	if let Err(e) = run().await {
		error!("{}", e);
		std::process::exit(1);
	}
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
	let once = std::env::args().skip(1).any(|arg| arg == "--once");
	let config = AppConfig::from_env();

	info!("Starting quote sync with data in {:?}", config.data_dir);

	let storage = Arc::new(FileKeyValueStore::open(config.data_dir.clone()).await?);
	let http = HttpRemote::new(&config.remote)?;

	let source: Box<dyn RemoteSource> = if config.remote.snapshot_url.is_some() {
		Box::new(http.clone())
	} else {
		info!("No snapshot endpoint configured, using simulated server");
		Box::new(SimulatedServer::new())
	};

	let gateway = RemoteGateway::new(
		source,
		Box::new(http),
		Box::new(OfflineTransport::new()),
		config.sync.delivery,
	);

	let orchestrator = Arc::new(
		SyncOrchestrator::restore(storage, gateway, config.sync.clone())
			.await?
			.with_identity(config.identity),
	);
	orchestrator
		.register_handler(Box::new(TracingEventHandler))
		.await;

	orchestrator.show_startup_quote().await;
	info!("{}", orchestrator.quote_count().await);

	if once {
		return match orchestrator.sync_now().await {
			SyncOutcome::Failed(e) => Err(e.into()),
			_ => Ok(()),
		};
	}

	let mut scheduler = SyncScheduler::start(orchestrator.clone());
	tokio::signal::ctrl_c().await?;
	info!("Shutting down");
	scheduler.stop();

	let status = orchestrator.status().await;
	info!(
		"{} quotes, {} pending changes, last sync {:?}",
		orchestrator.quotes().await.len(),
		status.pending_count,
		status.last_sync_time
	);
	Ok(())
}
