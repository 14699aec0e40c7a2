/// Service entry point: one aggregator behind a small HTTP front end
use nasa_image_search::clients::HttpTransport;
use nasa_image_search::config::AppConfig;
use nasa_image_search::handlers::AppState;
use nasa_image_search::observer::{ChannelObserver, SearchEvent};
use nasa_image_search::repo::FileQueryStore;
use nasa_image_search::routes::build_router;
use nasa_image_search::services::{SearchAggregator, FIRST_PAGE};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");

    let store = Arc::new(FileQueryStore::open(&config.state_file)?);
    info!(path = %store.path().display(), "Query store opened");

    let transport = Arc::new(HttpTransport::new(config.http_timeout));
    let mut aggregator = SearchAggregator::with_endpoint(
        transport,
        store,
        config.api_base_url.clone(),
        config.search_path.clone(),
    );

    // Notifications are handled on one dedicated task
    let (observer, events) = ChannelObserver::new();
    let observer = Arc::new(observer);
    aggregator.set_observer(&observer);
    tokio::spawn(drain_events(events));

    let aggregator = Arc::new(Mutex::new(aggregator));

    start_initial_search(aggregator.clone(), config.default_query.clone());

    let state = AppState {
        aggregator,
        default_query: config.default_query.clone(),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("nasa_image_search listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    drop(observer);
    Ok(())
}

/// Load the first page of the restored query, or the default one
fn start_initial_search(aggregator: Arc<Mutex<SearchAggregator>>, default_query: String) {
    tokio::spawn(async move {
        let mut aggregator = aggregator.lock().await;
        let query = aggregator
            .current_query()
            .map(str::to_string)
            .unwrap_or(default_query);

        info!(query = %query, "Running initial search");
        if let Err(e) = aggregator.search(&query, FIRST_PAGE).await {
            error!("Initial search error: {:?}", e);
        }
    });
}

async fn drain_events(mut events: mpsc::UnboundedReceiver<SearchEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SearchEvent::QueryChanged => info!("Query changed, results cleared"),
            SearchEvent::DataUpdated(response) => {
                let collection = &response.collection;
                info!(
                    href = %collection.href,
                    items = collection.items.len(),
                    total_hits = collection.metadata.total_hits,
                    "Results updated"
                );
                for item in &collection.items {
                    if let (Some(data), Some(preview)) = (item.primary(), item.preview_link()) {
                        info!(nasa_id = %data.nasa_id, preview = %preview.href, "{}", data.title);
                    }
                }
            }
        }
    }
}
