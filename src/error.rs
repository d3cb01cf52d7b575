//! Error types for BPMN 2.0 document processing
//!
//! All errors include error codes for categorization and enough context to
//! locate the offending construct.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O errors
//! - **E2xxx**: XML parsing, structure and writing errors
//! - **E3xxx**: Model validation errors
//! - **E4xxx**: Unsupported features

use std::io;
use thiserror::Error;

/// Result type for BPMN 2.0 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when reading, writing or validating BPMN 2.0 documents
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading or writing a file
    ///
    /// **Error Code**: E1001
    ///
    /// **Common Causes**:
    /// - File not found
    /// - Insufficient permissions
    /// - Disk read or write error
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    ///
    /// **Common Causes**:
    /// - Malformed XML syntax
    /// - Invalid character encoding
    /// - Unclosed tags
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    ///
    /// **Common Causes**:
    /// - Missing required attribute
    /// - Duplicate attribute
    /// - Invalid attribute syntax
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Missing required XML elements
    /// - Elements nested incorrectly
    /// - Undeclared namespace prefixes
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// Invalid BPMN 2.0 document format
    ///
    /// **Error Code**: E2004
    ///
    /// **Common Causes**:
    /// - Root element is not a definitions element
    /// - More than one definitions root
    #[error("[E2004] Invalid BPMN format: {0}")]
    InvalidFormat(String),

    /// XML writing error
    ///
    /// **Error Code**: E2005
    #[error("[E2005] XML writing error: {0}")]
    XmlWrite(String),

    /// Invalid model structure or validation failure
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - Duplicate element identifiers within a document
    /// - References to elements that do not exist
    #[error("[E3001] Invalid model: {0}")]
    InvalidModel(String),

    /// Parse error for attribute literals
    ///
    /// **Error Code**: E3002
    ///
    /// **Common Causes**:
    /// - Invalid enumeration literal (e.g. an unknown process type)
    /// - Non-boolean value in a boolean attribute
    #[error("[E3002] Parse error: {0}")]
    ParseError(String),

    /// Unsupported feature
    ///
    /// **Error Code**: E4001
    ///
    /// **Common Causes**:
    /// - Loading or saving through a file extension with no registered codec
    #[error("[E4001] Unsupported feature: {0}")]
    Unsupported(String),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Create an InvalidXml error with element context
    ///
    /// # Example
    /// ```ignore
    /// Error::invalid_xml_element("lane", "Missing required 'id' attribute")
    /// ```
    pub fn invalid_xml_element(element: &str, message: &str) -> Self {
        Error::InvalidXml(format!("Element '<{}>': {}", element, message))
    }

    /// Create an InvalidXml error for a missing required attribute
    pub fn missing_attribute(element: &str, attribute: &str) -> Self {
        Error::InvalidXml(format!(
            "Element '<{}>': Missing required '{}' attribute",
            element, attribute
        ))
    }

    /// Create an XmlWrite error
    pub fn xml_write(message: impl Into<String>) -> Self {
        Error::XmlWrite(message.into())
    }
}
