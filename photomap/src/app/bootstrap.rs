//! Application bootstrap.
//!
//! `PhotoMapApp` is the composition root: it builds the photo backend, the
//! repository over it, and the shared image cache, then hands out feeds wired
//! to both. Nothing in the library reaches for a global client; everything a
//! feed talks to is created here and passed in.

use std::sync::Arc;

use tracing::info;

use super::config::{AppConfig, BackendConfig};
use super::error::AppError;
use crate::cache::{ImageCache, ImageFetcher, ReqwestFetcher};
use crate::feed::{FeedHandle, RegionFetchController};
use crate::repository::{MemoryBackend, PhotoBackend, PhotoRepository, RestBackend};

/// A started application.
pub struct PhotoMapApp {
    config: AppConfig,
    repository: PhotoRepository,
    cache: ImageCache,
    /// Set when running against the in-memory backend.
    memory: Option<Arc<MemoryBackend>>,
}

impl PhotoMapApp {
    /// Start the application with the backend and cache described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the cache
    /// directory cannot be created.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        let fetcher = ReqwestFetcher::with_timeout(config.cache.download_timeout)
            .map_err(AppError::Fetcher)?;

        let (backend, memory) = build_backend(&config.backend)?;
        Self::start_with(config, backend, memory, Arc::new(fetcher)).await
    }

    /// Start with explicitly provided collaborators.
    pub async fn start_with_backend(
        config: AppConfig,
        backend: Arc<dyn PhotoBackend>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Result<Self, AppError> {
        Self::start_with(config, backend, None, fetcher).await
    }

    async fn start_with(
        config: AppConfig,
        backend: Arc<dyn PhotoBackend>,
        memory: Option<Arc<MemoryBackend>>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Result<Self, AppError> {
        let repository = PhotoRepository::new(backend);
        let cache = ImageCache::open_with_concurrency(
            config.cache.directory.clone(),
            fetcher,
            config.cache.download_concurrency,
        )
        .await
        .map_err(|source| AppError::CacheOpen {
            directory: config.cache.directory.clone(),
            source,
        })?;

        info!(
            backend = repository.backend_name(),
            cache = %config.cache.directory.display(),
            "PhotoMap started"
        );

        Ok(Self {
            config,
            repository,
            cache,
            memory,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn repository(&self) -> &PhotoRepository {
        &self.repository
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// The in-memory backend, when no hosted backend is configured.
    pub fn memory_backend(&self) -> Option<&Arc<MemoryBackend>> {
        self.memory.as_ref()
    }

    /// Start a new feed sharing this application's repository and cache.
    ///
    /// Must be called from within the runtime the feed should run on.
    pub fn open_feed(&self) -> FeedHandle {
        RegionFetchController::spawn(
            self.config.feed.clone(),
            self.repository.clone(),
            Some(self.cache.clone()),
        )
    }
}

fn build_backend(
    config: &BackendConfig,
) -> Result<(Arc<dyn PhotoBackend>, Option<Arc<MemoryBackend>>), AppError> {
    let Some(url) = &config.url else {
        let memory = Arc::new(MemoryBackend::new());
        if let Some(user_id) = &config.user_id {
            memory.sign_in(user_id.clone());
        }
        let backend: Arc<dyn PhotoBackend> = memory.clone();
        return Ok((backend, Some(memory)));
    };

    let mut backend = RestBackend::with_timeout(url.clone(), config.timeout)?;
    if let Some(key) = &config.api_key {
        backend = backend.with_api_key(key.clone());
    }
    if let Some(session) = config.session() {
        backend = backend.with_session(session);
    }
    let backend: Arc<dyn PhotoBackend> = Arc::new(backend);
    Ok((backend, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::fetcher::tests::StubFetcher;
    use crate::geo::Coordinate;
    use crate::photo::NewPhotoInput;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> AppConfig {
        AppConfig::default().with_cache_directory(dir.path().join("images"))
    }

    #[test]
    fn test_build_in_memory_backend() {
        let config = BackendConfig {
            user_id: Some("u1".into()),
            ..BackendConfig::default()
        };
        let (backend, memory) = build_backend(&config).unwrap();
        assert_eq!(backend.name(), "memory");
        assert_eq!(memory.unwrap().session_user().as_deref(), Some("u1"));
    }

    #[test]
    fn test_build_rest_backend() {
        let config = BackendConfig::remote("https://db.example.com").with_api_key("anon");
        let (backend, memory) = build_backend(&config).unwrap();
        assert_eq!(backend.name(), "rest");
        assert!(memory.is_none());
    }

    #[tokio::test]
    async fn test_start_creates_cache_directory() {
        let dir = TempDir::new().unwrap();
        let app = PhotoMapApp::start(config_in(&dir)).await.unwrap();

        assert!(dir.path().join("images").is_dir());
        assert_eq!(app.repository().backend_name(), "memory");
        assert!(app.memory_backend().is_some());
    }

    #[tokio::test]
    async fn test_open_feed_sees_backend_photos() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(MemoryBackend::new());
        backend.sign_in("u1");
        let app = PhotoMapApp::start_with_backend(
            config_in(&dir),
            backend.clone(),
            Arc::new(StubFetcher::new()),
        )
        .await
        .unwrap();

        app.repository()
            .create(NewPhotoInput::new(
                "Harbour",
                Coordinate::new(53.54, 9.99),
                vec!["https://cdn.example.com/h.jpg".into()],
            ))
            .await
            .unwrap();

        let feed = app.open_feed();
        let mut state = feed.subscribe_state();
        feed.fetch_now(None).await.unwrap();
        let state = state.wait_for(|s| s.revision > 0).await.unwrap().clone();

        assert_eq!(state.photos.len(), 1);
        assert_eq!(state.photos[0].title, "Harbour");
        feed.shutdown().await;
    }
}
