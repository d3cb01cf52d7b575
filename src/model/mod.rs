//! BPMN 2.0 document model
//!
//! Plain data structures representing a BPMN 2.0 document: the `Definitions`
//! root container, its root elements, lane containers and the namespaced
//! extension data that can be attached to any of them.

mod core;
mod extension;

pub use core::{
    Definitions, Element, Lane, LaneSet, Process, ProcessType, RootElement, SchemaLocation,
};
pub use extension::{ExtensionAttribute, ExtensionElement, ExtensionValue};

/// Namespace URI of the BPMN 2.0 model interchange format
pub const BPMN_NAMESPACE: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";

/// Namespace URI of the OMG XMI format
pub const XMI_NAMESPACE: &str = "http://www.omg.org/XMI";

/// Namespace URI of XML Schema instance attributes (`xsi:`)
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
