//! Codec registry and file-level persistence for BPMN 2.0 documents
//!
//! A [`CodecRegistry`] maps file-extension tokens to [`DocumentCodec`]
//! implementations and resolves the right codec when saving or loading a
//! path. Registries are owned values: each caller (typically one test run)
//! constructs and owns its own, so there is no process-global state to
//! acquire or release.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::Definitions;
use crate::parser;
use crate::writer::{self, XmlDialect};

/// File-extension token of the native BPMN 2.0 XML format
pub const EXTENSION_BPMN_XML: &str = "bpmn2";

/// File-extension token of the XMI-flavored BPMN 2.0 format
pub const EXTENSION_BPMN_XMI: &str = "bpmn2xmi";

/// A format codec that can read and write whole documents
pub trait DocumentCodec: Send + Sync {
    /// Human-readable codec name
    fn name(&self) -> &'static str;

    /// Read a document from a stream
    fn read(&self, reader: &mut dyn BufRead) -> Result<Definitions>;

    /// Write a document to a stream
    fn write(&self, document: &Definitions, writer: &mut dyn Write) -> Result<()>;
}

/// The XML codec, parameterized by serialization dialect
pub struct XmlCodec {
    dialect: XmlDialect,
}

impl XmlCodec {
    /// Create a codec for the native BPMN 2.0 XML format
    pub fn new() -> Self {
        Self {
            dialect: XmlDialect::Native,
        }
    }

    /// Create a codec for the XMI-flavored format
    pub fn xmi() -> Self {
        Self {
            dialect: XmlDialect::Xmi,
        }
    }
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCodec for XmlCodec {
    fn name(&self) -> &'static str {
        match self.dialect {
            XmlDialect::Native => "BPMN 2.0 XML",
            XmlDialect::Xmi => "BPMN 2.0 XMI",
        }
    }

    fn read(&self, reader: &mut dyn BufRead) -> Result<Definitions> {
        let mut xml = String::new();
        reader.read_to_string(&mut xml)?;
        parser::parse_document(&xml)
    }

    fn write(&self, document: &Definitions, writer: &mut dyn Write) -> Result<()> {
        writer::write_document(document, writer, self.dialect)
    }
}

/// Registry mapping file-extension tokens to codecs
///
/// # Example
///
/// ```no_run
/// use bpmn2::{CodecRegistry, Definitions};
/// use std::path::Path;
///
/// # fn main() -> bpmn2::Result<()> {
/// let registry = CodecRegistry::with_default_codecs();
/// let document = Definitions::with_target_namespace("urn:tns1");
/// registry.save(Path::new("tmp/example.bpmn2"), &document)?;
/// let reloaded = registry.load(Path::new("tmp/example.bpmn2"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn DocumentCodec>>,
}

impl CodecRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Create a registry with the native XML and XMI codecs registered
    pub fn with_default_codecs() -> Self {
        let mut registry = Self::new();
        registry.register(EXTENSION_BPMN_XML, Arc::new(XmlCodec::new()));
        registry.register(EXTENSION_BPMN_XMI, Arc::new(XmlCodec::xmi()));
        registry
    }

    /// Register a codec under a file-extension token
    ///
    /// Replaces any codec previously registered under the same token.
    pub fn register(&mut self, extension: impl Into<String>, codec: Arc<dyn DocumentCodec>) {
        self.codecs.insert(extension.into(), codec);
    }

    /// Remove the codec registered under a file-extension token
    pub fn unregister(&mut self, extension: &str) -> Option<Arc<dyn DocumentCodec>> {
        self.codecs.remove(extension)
    }

    /// Remove all registered codecs
    ///
    /// Clearing an already empty registry is a no-op.
    pub fn clear(&mut self) {
        self.codecs.clear();
    }

    /// Look up the codec registered under a file-extension token
    pub fn get(&self, extension: &str) -> Option<&Arc<dyn DocumentCodec>> {
        self.codecs.get(extension)
    }

    /// Number of registered codecs
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether the registry has no codecs
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    fn codec_for_path(&self, path: &Path) -> Result<&Arc<dyn DocumentCodec>> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .ok_or_else(|| {
                Error::Unsupported(format!("File '{}' has no extension", path.display()))
            })?;
        self.get(extension).ok_or_else(|| {
            Error::Unsupported(format!("No codec registered for extension '{}'", extension))
        })
    }

    /// Write a document to a file, resolving the codec from the extension
    pub fn save(&self, path: &Path, document: &Definitions) -> Result<()> {
        let codec = self.codec_for_path(path)?;
        let mut file = std::fs::File::create(path)?;
        codec.write(document, &mut file)
    }

    /// Load a document from a file, resolving the codec from the extension
    ///
    /// The document is read into a fresh in-memory graph, independent of any
    /// graph it was written from.
    pub fn load(&self, path: &Path) -> Result<Definitions> {
        let codec = self.codec_for_path(path)?;
        let file = std::fs::File::open(path)?;
        let mut reader = BufReader::new(file);
        codec.read(&mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Process, RootElement};

    #[test]
    fn test_register_and_unregister() {
        let mut registry = CodecRegistry::new();
        assert!(registry.is_empty());

        registry.register(EXTENSION_BPMN_XML, Arc::new(XmlCodec::new()));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(EXTENSION_BPMN_XML).is_some());
        assert!(registry.get(EXTENSION_BPMN_XMI).is_none());

        assert!(registry.unregister(EXTENSION_BPMN_XML).is_some());
        assert!(registry.unregister(EXTENSION_BPMN_XML).is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut registry = CodecRegistry::with_default_codecs();
        assert_eq!(registry.len(), 2);
        registry.clear();
        assert!(registry.is_empty());
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let registry = CodecRegistry::with_default_codecs();
        let result = registry.load(Path::new("model.unknown"));
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_save_and_load_through_registry() {
        let registry = CodecRegistry::with_default_codecs();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("roundtrip.bpmn2");

        let mut document = Definitions::with_target_namespace("urn:tns1");
        document
            .root_elements
            .push(RootElement::Process(Process::new("p1")));

        registry.save(&path, &document).expect("Failed to save");
        let reloaded = registry.load(&path).expect("Failed to load");
        assert_eq!(document, reloaded);
    }

    #[test]
    fn test_codec_names() {
        assert_eq!(XmlCodec::new().name(), "BPMN 2.0 XML");
        assert_eq!(XmlCodec::xmi().name(), "BPMN 2.0 XMI");
    }
}
