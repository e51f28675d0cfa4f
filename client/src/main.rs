//! Quotebook - show a random quote and keep the collection in sync.
//!
//! Loads the local collection, shows a quote, runs one sync with the remote,
//! then keeps syncing on a timer until interrupted.

use quotebook_client::{
    transfer, Config, FileStorage, HttpRemote, QuoteBook, RemoteSource, SyncService,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quotebook=info,quotebook_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(data_dir = %config.data_dir.display(), remote = %config.remote_url, "Starting Quotebook");

    let storage = FileStorage::open(&config.data_dir)?;
    let mut book = QuoteBook::open(storage);

    if let Some(category) = &config.category {
        book.select_category(category)?;
    }

    if let Some(path) = &config.import_file {
        match transfer::import_from_file(&mut book, path).await {
            Ok(summary) => println!(
                "Imported {} quotes ({} invalid, {} duplicates).",
                summary.added, summary.invalid, summary.duplicates
            ),
            Err(e) => eprintln!("Import failed: {}", e),
        }
    }

    if let Some(path) = &config.export_file {
        transfer::export_to_file(&book, path).await?;
        println!("Exported {} quotes to {}.", book.store().len(), path.display());
    }

    println!("{}", book.restore_view()?);

    let remote: Arc<dyn RemoteSource> = Arc::new(HttpRemote::from_config(&config)?);
    let service = SyncService::from_config(book, remote, &config);

    // Print notifications
    let mut events = service.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => println!("{}", event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification receiver lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    service.sync_once().await;
    service.start_periodic(config.sync_interval);

    tokio::signal::ctrl_c().await?;
    service.stop_periodic();

    let book = service.book().lock().await;
    tracing::info!(records = book.store().len(), "Shutting down");

    Ok(())
}
