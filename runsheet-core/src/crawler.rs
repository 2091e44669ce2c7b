//! Run directory discovery.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   <prefix>_<ordinal>/
//!     <anything>_finished.json   (preferred; must be unique)
//!     <prefix>_<ordinal>.json    (fallback)
//! ```
//!
//! [`RunCrawler::crawl`] lists, filters and orders the run directories and
//! resolves each one's metadata file up front. The returned [`Crawl`] parses
//! the files lazily, one per `next()`.
//!
//! Runs are ordered by ordinal, then by name. Names without an ordinal come
//! first. Zero-padded names therefore keep their lexicographic order, and
//! `run_2` still precedes `run_10` when they are not padded.

use std::path::{Path, PathBuf};

use crate::error::{crawl_io, CrawlError, ParseError};
use crate::metadata;
use crate::types::{trailing_ordinal, LastMarker, RawRecord};

const FINISHED_SUFFIX: &str = "_finished.json";

/// Walks a root directory for run folders matching a keyword.
#[derive(Debug, Clone)]
pub struct RunCrawler {
    root: PathBuf,
    keyword: String,
}

/// A run directory that survived filtering, with its metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDir {
    pub name: String,
    pub path: PathBuf,
    pub ordinal: Option<u64>,
    pub metadata: PathBuf,
}

impl RunCrawler {
    /// `root` may start with `~`, which is expanded to the home directory.
    pub fn new(root: impl AsRef<Path>, keyword: impl Into<String>) -> Self {
        Self {
            root: expand_home(root.as_ref()),
            keyword: keyword.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Select run directories with an ordinal in `(last_marker, stop_ordinal]`.
    ///
    /// A marker that does not resolve to an ordinal (for instance a header
    /// cell) disables the lower bound. When either bound is active, directories
    /// without an ordinal are skipped.
    pub fn crawl(
        &self,
        last_marker: Option<&LastMarker>,
        stop_ordinal: Option<u64>,
    ) -> Result<Crawl, CrawlError> {
        tracing::info!(root = %self.root.display(), keyword = %self.keyword, "crawling");
        if !self.root.is_dir() {
            return Err(CrawlError::DirectoryNotFound {
                path: self.root.clone(),
            });
        }

        let lower = last_marker.and_then(LastMarker::ordinal);
        if let (Some(marker), None) = (last_marker, lower) {
            tracing::debug!(%marker, "marker has no ordinal; crawling without lower bound");
        }

        let mut candidates = self.list_candidates()?;
        candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let mut runs = Vec::new();
        for (name, ordinal) in candidates {
            if lower.is_some() || stop_ordinal.is_some() {
                let Some(n) = ordinal else {
                    tracing::warn!(dir = %name, "run directory has no ordinal; skipping");
                    continue;
                };
                if lower.is_some_and(|l| n <= l) || stop_ordinal.is_some_and(|s| n > s) {
                    continue;
                }
            }

            let path = self.root.join(&name);
            let Some(metadata) = locate_metadata(&path, &name)? else {
                continue;
            };
            runs.push(RunDir {
                name,
                path,
                ordinal,
                metadata,
            });
        }

        tracing::info!(runs = runs.len(), "selected run directories");
        Ok(Crawl { runs, next: 0 })
    }

    fn list_candidates(&self) -> Result<Vec<(String, Option<u64>)>, CrawlError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| crawl_io(&self.root, e))?;
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| crawl_io(&self.root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!(path = %entry.path().display(), "skipping non UTF-8 directory name");
                continue;
            };
            if name.contains(&self.keyword) {
                let ordinal = trailing_ordinal(&name);
                out.push((name, ordinal));
            }
        }
        Ok(out)
    }
}

/// Find the unique metadata file for a run directory.
///
/// Returns `Ok(None)` (after logging) when the directory has several
/// `*_finished.json` files or no candidate at all.
pub fn locate_metadata(dir: &Path, name: &str) -> Result<Option<PathBuf>, CrawlError> {
    let mut finished = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| crawl_io(dir, e))? {
        let entry = entry.map_err(|e| crawl_io(dir, e))?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().ends_with(FINISHED_SUFFIX) && path.is_file() {
            finished.push(path);
        }
    }
    finished.sort();

    match finished.len() {
        1 => return Ok(finished.pop()),
        0 => {}
        n => {
            tracing::warn!(dir = %dir.display(), count = n, "multiple finished jsons found; skipping");
            return Ok(None);
        }
    }

    let fallback = dir.join(format!("{name}.json"));
    if fallback.is_file() {
        Ok(Some(fallback))
    } else {
        tracing::warn!(dir = %dir.display(), "no metadata json found; skipping");
        Ok(None)
    }
}

/// Lazily parsed run records, in crawl order.
#[derive(Debug)]
pub struct Crawl {
    runs: Vec<RunDir>,
    next: usize,
}

impl Crawl {
    /// Every run directory selected by the crawl, parsed or not.
    pub fn runs(&self) -> &[RunDir] {
        &self.runs
    }
}

impl Iterator for Crawl {
    type Item = Result<RawRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let run = self.runs.get(self.next)?;
        self.next += 1;
        Some(metadata::parse(&run.metadata).map(|mut record| {
            record.ordinal = run.ordinal;
            record
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.runs.len() - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Crawl {}

fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::write(path, "{}").expect("write");
    }

    #[test]
    fn locate_prefers_unique_finished_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("run_001");
        std::fs::create_dir_all(&dir).unwrap();
        touch(&dir.join("run_001_finished.json"));
        touch(&dir.join("run_001.json"));

        let found = locate_metadata(&dir, "run_001").unwrap();
        assert_eq!(found, Some(dir.join("run_001_finished.json")));
    }

    #[test]
    fn locate_skips_ambiguous_finished_files() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("run_001");
        std::fs::create_dir_all(&dir).unwrap();
        touch(&dir.join("a_finished.json"));
        touch(&dir.join("b_finished.json"));
        touch(&dir.join("run_001.json"));

        assert_eq!(locate_metadata(&dir, "run_001").unwrap(), None);
    }

    #[test]
    fn locate_falls_back_to_dirname_json() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("run_001");
        std::fs::create_dir_all(&dir).unwrap();
        touch(&dir.join("run_001.json"));
        touch(&dir.join("other.json"));

        let found = locate_metadata(&dir, "run_001").unwrap();
        assert_eq!(found, Some(dir.join("run_001.json")));
    }

    #[test]
    fn locate_reports_unreadable_dir() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("run_001");
        touch(&file);

        let err = locate_metadata(&file, "run_001").unwrap_err();
        match err {
            CrawlError::Io { path, .. } => assert_eq!(path, file),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn locate_ignores_finished_named_directories() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("run_001");
        std::fs::create_dir_all(dir.join("old_finished.json")).unwrap();
        touch(&dir.join("run_001_finished.json"));

        let found = locate_metadata(&dir, "run_001").unwrap();
        assert_eq!(found, Some(dir.join("run_001_finished.json")));
    }

    #[test]
    fn locate_returns_none_for_empty_dir() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(locate_metadata(tmp.path(), "run_001").unwrap(), None);
    }

    #[test]
    fn expand_home_leaves_plain_paths_alone() {
        assert_eq!(expand_home(Path::new("/data/runs")), PathBuf::from("/data/runs"));
        assert_eq!(expand_home(Path::new("runs/~x")), PathBuf::from("runs/~x"));
    }

    #[test]
    fn expand_home_replaces_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/runs")), home.join("runs"));
        }
    }
}
