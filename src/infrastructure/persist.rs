//! Date-partitioned page sink
//!
//! Pages land in `<root>/YYYY/MM/DD/<slug>.<ext>`; a name already taken gets
//! a numeric suffix (`<slug>-1.<ext>`, `<slug>-2.<ext>`, …).

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, instrument};

use crate::infrastructure::traits::{FileSystem, PageSink};

const UNTITLED: &str = "untitled";

fn slug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"))
}

/// Lower-case, dash-separated file stem for a page title.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let slug = slug_re().replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        UNTITLED.to_string()
    } else {
        slug.to_string()
    }
}

pub struct DatedFileSink {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    date: Option<NaiveDate>,
    // serializes name picking so parallel renders never claim the same file
    claim: Mutex<()>,
}

impl DatedFileSink {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
            date: None,
            claim: Mutex::new(()),
        }
    }

    /// Pin the partition date instead of using today.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition(&self) -> PathBuf {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        self.root.join(date.format("%Y/%m/%d").to_string())
    }

    fn free_path(&self, dir: &Path, stem: &str, extension: &str) -> PathBuf {
        let extension = extension.trim_start_matches('.');
        let candidate = dir.join(format!("{stem}.{extension}"));
        if !self.fs.exists(&candidate) {
            return candidate;
        }
        (1u32..)
            .map(|n| dir.join(format!("{stem}-{n}.{extension}")))
            .find(|path| !self.fs.exists(path))
            .unwrap_or(candidate)
    }
}

impl PageSink for DatedFileSink {
    #[instrument(level = "debug", skip(self, content))]
    fn persist(&self, title: &str, content: &str, extension: &str) -> io::Result<PathBuf> {
        let dir = self.partition();
        let _guard = self.claim.lock();
        self.fs.create_dir_all(&dir)?;
        let path = self.free_path(&dir, &slugify(title), extension);
        self.fs.write(&path, content)?;
        debug!("persisted page to {}", path.display());
        Ok(path)
    }
}
