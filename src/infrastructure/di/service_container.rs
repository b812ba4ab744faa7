//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::RenderService;
use crate::config::Settings;
use crate::infrastructure::persist::DatedFileSink;
use crate::infrastructure::traits::{FileSystem, PageSink, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Where persisted and debug copies go
    pub sink: Arc<dyn PageSink>,

    pub render_service: RenderService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let sink = Arc::new(DatedFileSink::new(settings.output_dir.clone(), fs.clone()));
        Self::with_deps(settings, fs, sink)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>, sink: Arc<dyn PageSink>) -> Self {
        let settings = Arc::new(settings);
        let render_service = RenderService::new(settings.clone(), fs.clone(), sink.clone());

        Self {
            settings,
            fs,
            sink,
            render_service,
        }
    }
}
