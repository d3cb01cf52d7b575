//! Core BPMN 2.0 types and structures

use std::path::{Path, PathBuf};

use super::extension::{ExtensionAttribute, ExtensionElement, ExtensionValue};

/// The root container of a BPMN 2.0 document
///
/// A persisted file holds exactly one `Definitions` element. Root elements
/// are kept in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Definitions {
    /// Stable identifier of the definitions element
    pub id: Option<String>,
    /// Human-readable name
    pub name: Option<String>,
    /// Target namespace of the definitions in this document
    pub target_namespace: Option<String>,
    /// Root elements in document order
    pub root_elements: Vec<RootElement>,
    /// Schema location hints (`xsi:schemaLocation` pairs), surfaced verbatim
    pub schema_locations: Vec<SchemaLocation>,
}

impl Definitions {
    /// Create an empty definitions container
    pub fn new() -> Self {
        Self {
            id: None,
            name: None,
            target_namespace: None,
            root_elements: Vec::new(),
            schema_locations: Vec::new(),
        }
    }

    /// Create a definitions container with a target namespace
    pub fn with_target_namespace(target_namespace: impl Into<String>) -> Self {
        let mut definitions = Self::new();
        definitions.target_namespace = Some(target_namespace.into());
        definitions
    }

    /// Look up any element in the document by its identifier
    ///
    /// Walks root elements, lane sets and lanes in document order and returns
    /// a borrowed handle to the first element whose identifier matches.
    /// Foreign-namespace root elements are matched on their `id` attribute.
    pub fn element_by_id(&self, id: &str) -> Option<Element<'_>> {
        for root in &self.root_elements {
            match root {
                RootElement::Process(process) => {
                    if process.id == id {
                        return Some(Element::Process(process));
                    }
                    for lane_set in &process.lane_sets {
                        if lane_set.id == id {
                            return Some(Element::LaneSet(lane_set));
                        }
                        for lane in &lane_set.lanes {
                            if lane.id == id {
                                return Some(Element::Lane(lane));
                            }
                        }
                    }
                }
                RootElement::Extension(element) => {
                    if element.id() == Some(id) {
                        return Some(Element::Extension(element));
                    }
                }
            }
        }
        None
    }

    /// Iterate over the processes among the root elements
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.root_elements.iter().filter_map(|root| match root {
            RootElement::Process(process) => Some(process),
            _ => None,
        })
    }
}

impl Default for Definitions {
    fn default() -> Self {
        Self::new()
    }
}

/// A `(namespace, location)` pair from an `xsi:schemaLocation` attribute
///
/// Locations are surfaced exactly as written; no schema is ever loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaLocation {
    /// The namespace the schema governs
    pub namespace: String,
    /// The schema location as written in the document
    pub location: String,
}

impl SchemaLocation {
    /// Resolve the location against the directory of the referencing document
    ///
    /// Relative locations resolve against the document's own directory, never
    /// against the process working directory. Absolute locations are returned
    /// unchanged.
    pub fn resolve(&self, document_path: &Path) -> PathBuf {
        let location = Path::new(&self.location);
        if location.is_absolute() {
            return location.to_path_buf();
        }
        match document_path.parent() {
            Some(parent) => parent.join(location),
            None => location.to_path_buf(),
        }
    }
}

/// A top-level, independently identifiable element of a document
///
/// The variant set is closed: BPMN-native root elements are typed, while
/// foreign-namespace roots (third-party typed extensions) are exposed
/// generically as [`ExtensionElement`] trees.
#[derive(Debug, Clone, PartialEq)]
pub enum RootElement {
    /// A BPMN process
    Process(Process),
    /// A foreign-namespace root element
    Extension(ExtensionElement),
}

impl RootElement {
    /// The identifier of this root element, if it has one
    pub fn id(&self) -> Option<&str> {
        match self {
            RootElement::Process(process) => Some(&process.id),
            RootElement::Extension(element) => element.id(),
        }
    }

    /// Borrow the process if this root element is one
    pub fn as_process(&self) -> Option<&Process> {
        match self {
            RootElement::Process(process) => Some(process),
            _ => None,
        }
    }
}

/// The visibility of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessType {
    /// Unspecified visibility
    #[default]
    None,
    /// Public process, visible to collaborators
    Public,
    /// Private process, internal to the modeler
    Private,
}

impl ProcessType {
    /// The XML enumeration literal for this process type
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessType::None => "None",
            ProcessType::Public => "Public",
            ProcessType::Private => "Private",
        }
    }

    /// Parse an XML enumeration literal
    pub fn from_literal(literal: &str) -> Option<Self> {
        match literal {
            "None" => Some(ProcessType::None),
            "Public" => Some(ProcessType::Public),
            "Private" => Some(ProcessType::Private),
            _ => None,
        }
    }
}

/// A BPMN process
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    /// Stable identifier, unique within the document
    pub id: String,
    /// Human-readable name
    pub name: Option<String>,
    /// Process visibility
    pub process_type: ProcessType,
    /// Whether the process is intended to be executable
    pub is_executable: bool,
    /// Lane sets in document order
    pub lane_sets: Vec<LaneSet>,
    /// Extension attributes outside the BPMN schema, in written order
    pub any_attributes: Vec<ExtensionAttribute>,
    /// Extension element groups attached to this process
    ///
    /// The in-memory model allows any number of groups, but the wire format
    /// permits at most one `<extensionElements>` wrapper: writing merges all
    /// groups into one wrapper and reading yields at most one group.
    pub extension_values: Vec<ExtensionValue>,
}

impl Process {
    /// Create a process with the given identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            process_type: ProcessType::default(),
            is_executable: false,
            lane_sets: Vec::new(),
            any_attributes: Vec::new(),
            extension_values: Vec::new(),
        }
    }
}

/// A set of lanes partitioning the flow nodes of a process
#[derive(Debug, Clone, PartialEq)]
pub struct LaneSet {
    /// Stable identifier, unique within the document
    pub id: String,
    /// Human-readable name
    pub name: Option<String>,
    /// Lanes in document order
    pub lanes: Vec<Lane>,
}

impl LaneSet {
    /// Create a lane set with the given identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            lanes: Vec::new(),
        }
    }
}

/// A lane within a lane set
#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    /// Stable identifier, unique within the document
    pub id: String,
    /// Human-readable name
    pub name: Option<String>,
    /// Identifiers of the flow nodes contained in this lane
    pub flow_node_refs: Vec<String>,
    /// Extension attributes outside the BPMN schema, in written order
    pub any_attributes: Vec<ExtensionAttribute>,
    /// Extension element groups attached to this lane
    pub extension_values: Vec<ExtensionValue>,
}

impl Lane {
    /// Create a lane with the given identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            flow_node_refs: Vec::new(),
            any_attributes: Vec::new(),
            extension_values: Vec::new(),
        }
    }
}

/// A borrowed, polymorphic handle to an element found by identifier
///
/// Returned by [`Definitions::element_by_id`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element<'a> {
    /// A process root element
    Process(&'a Process),
    /// A lane set inside a process
    LaneSet(&'a LaneSet),
    /// A lane inside a lane set
    Lane(&'a Lane),
    /// A foreign-namespace root element
    Extension(&'a ExtensionElement),
}

impl<'a> Element<'a> {
    /// Borrow the lane if this element is one
    pub fn as_lane(&self) -> Option<&'a Lane> {
        match *self {
            Element::Lane(lane) => Some(lane),
            _ => None,
        }
    }

    /// Borrow the process if this element is one
    pub fn as_process(&self) -> Option<&'a Process> {
        match *self {
            Element::Process(process) => Some(process),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_by_id_walks_lanes() {
        let mut lane_set = LaneSet::new("ls1");
        lane_set.lanes.push(Lane::new("lane1"));
        let mut process = Process::new("p1");
        process.lane_sets.push(lane_set);

        let mut definitions = Definitions::with_target_namespace("urn:tns1");
        definitions.root_elements.push(RootElement::Process(process));

        assert!(matches!(
            definitions.element_by_id("p1"),
            Some(Element::Process(_))
        ));
        assert!(matches!(
            definitions.element_by_id("ls1"),
            Some(Element::LaneSet(_))
        ));
        assert!(matches!(
            definitions.element_by_id("lane1"),
            Some(Element::Lane(_))
        ));
        assert!(definitions.element_by_id("missing").is_none());
    }

    #[test]
    fn test_process_type_literals() {
        assert_eq!(ProcessType::from_literal("None"), Some(ProcessType::None));
        assert_eq!(
            ProcessType::from_literal("Private"),
            Some(ProcessType::Private)
        );
        assert_eq!(ProcessType::from_literal("private"), None);
        assert_eq!(ProcessType::Public.as_str(), "Public");
    }

    #[test]
    fn test_schema_location_resolves_against_document_directory() {
        let location = SchemaLocation {
            namespace: "http://example.org/ext".to_string(),
            location: "Extension.xsd".to_string(),
        };
        let resolved = location.resolve(Path::new("fixtures/sub/model.bpmn2"));
        assert_eq!(resolved, PathBuf::from("fixtures/sub/Extension.xsd"));

        let absolute = SchemaLocation {
            namespace: "http://example.org/ext".to_string(),
            location: "/schemas/Extension.xsd".to_string(),
        };
        let resolved = absolute.resolve(Path::new("fixtures/model.bpmn2"));
        assert_eq!(resolved, PathBuf::from("/schemas/Extension.xsd"));
    }
}
