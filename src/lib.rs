//! # bpmn2
//!
//! A pure Rust implementation for reading and writing BPMN 2.0 (Business
//! Process Model and Notation) process model files.
//!
//! The crate focuses on persistence fidelity: documents are parsed into a
//! plain in-memory model, written back out, and vendor extension data
//! (namespaced attributes and child elements outside the BPMN schema)
//! survives the round trip byte-for-byte, including attribute order.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Read and write the BPMN 2.0 XML interchange format
//! - An XMI-flavored dialect for model interchange tooling
//! - First-class vendor extension attributes and extension elements
//! - Explicit, instance-scoped codec and extension-feature registries
//!
//! ## Example
//!
//! ```no_run
//! use bpmn2::Definitions;
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = File::open("process.bpmn2")?;
//! let document = Definitions::from_reader(file)?;
//!
//! println!("Document contains {} root elements", document.root_elements.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod metadata;
pub mod model;
pub mod parser;
pub mod resource;
mod validator;
mod writer;

pub use error::{Error, Result};
pub use metadata::{FeatureDescriptor, FeatureKind, FeatureRegistry};
pub use model::{
    BPMN_NAMESPACE, Definitions, Element, ExtensionAttribute, ExtensionElement, ExtensionValue,
    Lane, LaneSet, Process, ProcessType, RootElement, SchemaLocation, XMI_NAMESPACE, XSI_NAMESPACE,
};
pub use resource::{
    CodecRegistry, DocumentCodec, EXTENSION_BPMN_XMI, EXTENSION_BPMN_XML, XmlCodec,
};
pub use writer::XmlDialect;

use std::io::Read;
use std::path::Path;

impl Definitions {
    /// Parse a BPMN 2.0 document from a reader
    ///
    /// Reads the native XML interchange format. Use a [`CodecRegistry`] to
    /// resolve the format from a file extension instead.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bpmn2::Definitions;
    /// use std::fs::File;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let file = File::open("process.bpmn2")?;
    /// let document = Definitions::from_reader(file)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut xml = String::new();
        reader.read_to_string(&mut xml)?;
        parser::parse_document(&xml)
    }

    /// Parse a BPMN 2.0 document from a file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Write this document to a writer in the native XML format
    pub fn to_writer<W: std::io::Write>(&self, writer: W) -> Result<()> {
        writer::write_document(self, writer, XmlDialect::Native)
    }

    /// Write this document to a file in the native XML format
    ///
    /// This is a convenience method that creates the file and writes the
    /// document to it.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_writer(file)
    }
}
