use std::sync::Arc;

use color_eyre::eyre::{Result, eyre};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use galleria::domain::ports::{AssetStorePort, ImageFetchPort, PreloadCachePort, UrlResolverPort};
use galleria::infrastructure::media::{DEFAULT_TIMEOUT_SECS, default_cache_dir};
use galleria::infrastructure::{
    AppConfig, DiskPreloadCache, HttpAssetStore, HttpImageFetcher, MemoryImageCache,
    PublicUrlResolver, StaticAssetStore,
};
use galleria::presentation::{AppServices, GalleryApp};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level().to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

async fn build_services(config: &AppConfig) -> Result<AppServices> {
    let store: Arc<dyn AssetStorePort> = if config.offline {
        Arc::new(StaticAssetStore::new())
    } else {
        let base_url = config.server_url.clone().ok_or_else(|| {
            eyre!("a server URL is required unless --offline is set (--server-url or GALLERIA_SERVER_URL)")
        })?;
        Arc::new(HttpAssetStore::new(base_url, config.api_key.clone())?)
    };

    let resolver_base = config
        .server_url
        .clone()
        .unwrap_or_else(|| "https://gallery.invalid".to_string());
    let resolver: Arc<dyn UrlResolverPort> =
        Arc::new(PublicUrlResolver::new(resolver_base, config.bucket()));

    let fetcher: Arc<dyn ImageFetchPort> = Arc::new(HttpImageFetcher::with_limits(
        DEFAULT_TIMEOUT_SECS,
        config.max_concurrent_downloads(),
    )?);

    let cache_dir = config.cache_dir.clone().unwrap_or_else(default_cache_dir);
    let preload_cache: Arc<dyn PreloadCachePort> =
        Arc::new(DiskPreloadCache::new(cache_dir, config.cache_size_bytes()).await?);

    Ok(AppServices {
        store,
        resolver,
        fetcher,
        preload_cache,
        memory_cache: Arc::new(MemoryImageCache::with_default_capacity()),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config)?;

    info!(version = galleria::VERSION, "starting galleria");

    let services = build_services(&config).await?;
    let app = GalleryApp::new(services, config.loader_config(), config.page_size());

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal).await;
    ratatui::restore();

    result
}
