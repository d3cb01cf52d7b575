//! Shared round-trip harness for integration tests
//!
//! Provides a per-test scoped persistence environment: each test constructs
//! its own [`RoundTrip`], which owns its codec registry and tracks every file
//! it writes. Teardown runs on drop, even when the test body panicked, and
//! archives created files under `target/test-results/` for inspection.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bpmn2::{CodecRegistry, Definitions, Error, Result};

/// Archive area tracked files are moved to on teardown
pub const RESULTS_DIR: &str = "target/test-results";

/// Per-test persistence environment
///
/// Parameterized by the file-extension token (which selects the codec) and an
/// optional subdirectory under `tmp/`, so specializations control where and
/// how files land without changing the save/reload algorithm.
pub struct RoundTrip {
    registry: CodecRegistry,
    extension: String,
    subdirectory: Option<String>,
    created_files: Vec<PathBuf>,
}

impl RoundTrip {
    /// Create a harness writing `tmp/<name>.<extension>` files
    pub fn new(extension: &str) -> Self {
        Self {
            registry: CodecRegistry::with_default_codecs(),
            extension: extension.to_string(),
            subdirectory: None,
            created_files: Vec::new(),
        }
    }

    /// Create a harness writing `tmp/<subdirectory>/<name>.<extension>` files
    pub fn with_subdirectory(extension: &str, subdirectory: &str) -> Self {
        let mut harness = Self::new(extension);
        harness.subdirectory = Some(subdirectory.to_string());
        harness
    }

    /// The codec registry owned by this harness
    pub fn registry(&mut self) -> &mut CodecRegistry {
        &mut self.registry
    }

    /// The location a logical name maps to under this harness
    pub fn file_path(&self, name: &str) -> PathBuf {
        let mut path = PathBuf::from("tmp");
        if let Some(ref subdirectory) = self.subdirectory {
            path.push(subdirectory);
        }
        path.push(format!("{}.{}", name, self.extension));
        path
    }

    /// Record a file location for archival on teardown
    ///
    /// Must be called for every file a test writes outside
    /// [`save_and_reload`](Self::save_and_reload).
    pub fn track(&mut self, path: PathBuf) {
        self.created_files.push(path);
    }

    /// Save a document under a logical name, then load it back
    ///
    /// The returned document is read from disk into a fresh in-memory graph;
    /// it is never the graph that was saved.
    pub fn save_and_reload(&mut self, name: &str, document: &Definitions) -> Result<Definitions> {
        self.save_and_reload_with(name, document, false)
    }

    /// Like [`save_and_reload`](Self::save_and_reload), with an absolute path
    pub fn save_and_reload_absolute(
        &mut self,
        name: &str,
        document: &Definitions,
    ) -> Result<Definitions> {
        self.save_and_reload_with(name, document, true)
    }

    fn save_and_reload_with(
        &mut self,
        name: &str,
        document: &Definitions,
        use_absolute_path: bool,
    ) -> Result<Definitions> {
        let mut path = self.file_path(name);
        if use_absolute_path {
            path = std::env::current_dir().map_err(Error::Io)?.join(path);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Error::Io)?;
        }
        self.registry.save(&path, document)?;
        self.created_files.push(path.clone());
        self.registry.load(&path)
    }
}

impl Drop for RoundTrip {
    /// Teardown runs unconditionally, panicking test body included: the
    /// registry is cleared and every created file is moved to the archive
    /// area. Failures are swallowed so they cannot mask the test failure
    /// that unwound us here.
    fn drop(&mut self) {
        self.registry.clear();

        let results = Path::new(RESULTS_DIR);
        let _ = fs::create_dir_all(results);
        for path in self.created_files.drain(..) {
            if let Some(file_name) = path.file_name() {
                let _ = fs::rename(&path, results.join(file_name));
            }
        }
        if let Some(ref subdirectory) = self.subdirectory {
            let _ = fs::remove_dir(Path::new("tmp").join(subdirectory));
        }
    }
}

/// Build the minimal valid document the extension scenarios start from
pub fn basic_definitions(target_namespace: &str) -> Definitions {
    Definitions::with_target_namespace(target_namespace)
}

/// Absolute path of an on-disk fixture file
pub fn fixture_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
}
