//! Service container for dependency injection
//!
//! Wires the engine components from settings.

use std::path::Path;
use std::sync::Arc;

use crate::application::{FrameComposer, ItemCatalog, SearchResponse};
use crate::config::Settings;
use crate::domain::CombinationRecord;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::loader;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding settings, I/O and the configured engine.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    composer: FrameComposer,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let composer = FrameComposer::new(settings.tree_builder(), settings.layout_engine());
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            composer,
        }
    }

    pub fn composer(&self) -> &FrameComposer {
        &self.composer
    }

    pub fn load_response(&self, path: &Path) -> InfraResult<SearchResponse> {
        loader::load_response(self.fs.as_ref(), path)
    }

    pub fn load_records(&self, path: &Path) -> InfraResult<Vec<CombinationRecord>> {
        loader::load_records(self.fs.as_ref(), path)
    }

    pub fn load_catalog(&self, path: &Path) -> InfraResult<ItemCatalog> {
        Ok(ItemCatalog::from_records(&self.load_records(path)?))
    }
}
