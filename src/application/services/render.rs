//! Page rendering service
//!
//! Loads page documents, builds pages from them and renders them, handing
//! results to the page sink where asked.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::application::document::{DocumentFormat, PageDocument};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::page::DEFAULT_MAX_NODES;
use crate::domain::{Capabilities, Page, PageOptions};
use crate::infrastructure::traits::{FileSystem, PageSink};

/// Output of one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub title: String,
    pub content: String,
    /// Where the sink stored the page, when persisting succeeded
    pub location: Option<PathBuf>,
}

/// What to produce from a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderMode {
    /// Strip markup down to readable text
    pub text: bool,
    /// Hand the output to the page sink
    pub persist: bool,
}

/// Service for turning page documents into markup.
pub struct RenderService {
    settings: Arc<Settings>,
    fs: Arc<dyn FileSystem>,
    sink: Arc<dyn PageSink>,
}

impl RenderService {
    pub fn new(settings: Arc<Settings>, fs: Arc<dyn FileSystem>, sink: Arc<dyn PageSink>) -> Self {
        Self { settings, fs, sink }
    }

    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            id_prefix: self.settings.id_prefix.clone(),
            max_expansion_passes: self.settings.max_expansion_passes,
            max_nodes: DEFAULT_MAX_NODES,
            dictionary_var: self.settings.dictionary_var.clone(),
        }
    }

    /// Capability context handed to every hook.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::new()
            .with("generator", env!("CARGO_PKG_NAME"))
            .with("version", env!("CARGO_PKG_VERSION"))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn load_document(&self, path: &Path) -> ApplicationResult<PageDocument> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read page document", path)?;
        PageDocument::parse(&content, DocumentFormat::from_path(path)).map_err(|source| {
            ApplicationError::Document {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Loads and builds a page without rendering it.
    pub fn build(&self, path: &Path) -> ApplicationResult<Page> {
        let document = self.load_document(path)?;
        Ok(document.build(self.page_options())?)
    }

    /// Renders a page; with `debug_copy` the markup is also persisted best-effort.
    #[instrument(level = "debug", skip_all)]
    pub fn render(&self, page: &Page) -> ApplicationResult<String> {
        let markup = page.render(&self.capabilities())?;
        if self.settings.debug_copy {
            self.persist_best_effort(&page.title(), &markup, &self.settings.extension);
        }
        Ok(markup)
    }

    /// Renders a page and reduces it to readable text.
    pub fn render_text(&self, page: &Page) -> ApplicationResult<String> {
        Ok(strip_markup(&self.render(page)?))
    }

    /// Renders and persists; a persistence failure leaves `location` empty.
    pub fn render_persisted(&self, page: &Page, mode: RenderMode) -> ApplicationResult<RenderedPage> {
        let (content, extension) = if mode.text {
            (self.render_text(page)?, &self.settings.text_extension)
        } else {
            (self.render(page)?, &self.settings.extension)
        };
        let title = page.title();
        let location = if mode.persist {
            self.persist_best_effort(&title, &content, extension)
        } else {
            None
        };
        Ok(RenderedPage {
            title,
            content,
            location,
        })
    }

    /// Renders one document file end to end.
    pub fn render_document(&self, path: &Path, mode: RenderMode) -> ApplicationResult<RenderedPage> {
        let page = self.build(path)?;
        self.render_persisted(&page, mode)
    }

    /// Renders documents in parallel; each gets its own page on its worker thread.
    ///
    /// Results keep the input order.
    #[instrument(level = "debug", skip(self, paths), fields(count = paths.len()))]
    pub fn render_documents(
        &self,
        paths: &[PathBuf],
        mode: RenderMode,
    ) -> Vec<(PathBuf, ApplicationResult<RenderedPage>)> {
        let results: Vec<_> = paths
            .par_iter()
            .map(|path| (path.clone(), self.render_document(path, mode)))
            .collect();
        info!(
            "rendered {} of {} documents",
            results.iter().filter(|(_, r)| r.is_ok()).count(),
            results.len()
        );
        results
    }

    fn persist_best_effort(&self, title: &str, content: &str, extension: &str) -> Option<PathBuf> {
        match self.sink.persist(title, content, extension) {
            Ok(location) => {
                debug!("page '{}' stored at {}", title, location.display());
                Some(location)
            }
            Err(e) => {
                warn!("could not persist page '{}': {}", title, e);
                None
            }
        }
    }
}

fn block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!DOCTYPE[^>]*>")
            .expect("valid block regex")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"))
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+").expect("valid blank line regex"))
}

/// Drops scripts, styles and tags, leaving the text content with blank runs collapsed.
pub fn strip_markup(markup: &str) -> String {
    let without_blocks = block_re().replace_all(markup, "");
    let without_tags = tag_re().replace_all(&without_blocks, "");
    let collapsed = blank_lines_re().replace_all(&without_tags, "\n");
    collapsed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
