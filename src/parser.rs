//! XML parsing for BPMN 2.0 document files
//!
//! A single event loop over the document, in the style of a streaming pull
//! parser. BPMN-namespace elements map to model types; foreign-namespace
//! elements become [`ExtensionElement`] trees. Namespace prefixes are
//! resolved through a scope stack, so declarations on any ancestor element
//! apply to its descendants.

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::metadata::{FeatureKind, FeatureRegistry};
use crate::model::{
    BPMN_NAMESPACE, Definitions, ExtensionAttribute, ExtensionElement, ExtensionValue, Lane,
    LaneSet, Process, ProcessType, RootElement, SchemaLocation, XMI_NAMESPACE, XSI_NAMESPACE,
};
use crate::validator;

/// Default buffer capacity for XML parsing (4KB)
const XML_BUFFER_CAPACITY: usize = 4096;

/// The `xml:` prefix is predeclared by the XML specification
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Extract the local name from a potentially prefixed XML name
///
/// # Examples
///
/// - `"bpmn2:process"` returns `"process"`
/// - `"signavio:signavioMetaData"` returns `"signavioMetaData"`
/// - `"process"` returns `"process"`
pub(crate) fn get_local_name(name_str: &str) -> &str {
    if let Some(pos) = name_str.rfind(':') {
        &name_str[pos + 1..]
    } else {
        name_str
    }
}

/// Stack of in-scope namespace declarations, innermost last
struct NamespaceScopes {
    scopes: Vec<HashMap<String, String>>,
}

impl NamespaceScopes {
    fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    fn push(&mut self, declarations: HashMap<String, String>) {
        self.scopes.push(declarations);
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Resolve a prefix against the given declarations first, then the stack
    ///
    /// The empty prefix resolves the default namespace.
    fn resolve_with<'a>(
        &'a self,
        declarations: &'a HashMap<String, String>,
        prefix: &str,
    ) -> Option<&'a str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        if let Some(uri) = declarations.get(prefix) {
            return Some(uri.as_str());
        }
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(prefix).map(|uri| uri.as_str()))
    }
}

/// Collect element attributes as ordered `(raw key, unescaped value)` pairs
fn collect_attributes(e: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attr_result in e.attributes() {
        let attr = attr_result?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::InvalidXml(e.to_string()))?
            .to_string();
        let raw = std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let value = quick_xml::escape::unescape(raw)
            .map_err(|e| Error::InvalidXml(e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

/// Extract `xmlns` declarations from collected attributes
///
/// The default namespace is stored under the empty prefix.
fn extract_declarations(attributes: &[(String, String)]) -> HashMap<String, String> {
    let mut declarations = HashMap::new();
    for (key, value) in attributes {
        if key == "xmlns" {
            declarations.insert(String::new(), value.clone());
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.insert(prefix.to_string(), value.clone());
        }
    }
    declarations
}

/// Resolve the namespace of an element name
fn resolve_element_namespace(
    raw_name: &str,
    declarations: &HashMap<String, String>,
    scopes: &NamespaceScopes,
) -> Result<String> {
    match raw_name.find(':') {
        Some(pos) => {
            let prefix = &raw_name[..pos];
            scopes
                .resolve_with(declarations, prefix)
                .map(String::from)
                .ok_or_else(|| {
                    Error::InvalidXml(format!("Undeclared namespace prefix '{}'", prefix))
                })
        }
        None => Ok(scopes
            .resolve_with(declarations, "")
            .unwrap_or("")
            .to_string()),
    }
}

/// Get an attribute value by its raw key
fn attribute_value<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Get the element identifier: a plain `id` attribute or an `xmi:id`
fn identifier_attribute(
    attributes: &[(String, String)],
    declarations: &HashMap<String, String>,
    scopes: &NamespaceScopes,
) -> Option<String> {
    if let Some(value) = attribute_value(attributes, "id") {
        return Some(value.to_string());
    }
    for (key, value) in attributes {
        if let Some(pos) = key.find(':') {
            let prefix = &key[..pos];
            if &key[pos + 1..] == "id"
                && scopes.resolve_with(declarations, prefix) == Some(XMI_NAMESPACE)
            {
                return Some(value.clone());
            }
        }
    }
    None
}

/// Collect attributes outside an element's native schema, in written order
///
/// Unprefixed attributes not in `known` are kept with an empty namespace.
/// Prefixed attributes resolve to their namespace; `xsi:` and `xmi:`
/// attributes are bookkeeping, not extension data, and are skipped.
fn collect_extension_attributes(
    attributes: &[(String, String)],
    known: &[&str],
    declarations: &HashMap<String, String>,
    scopes: &NamespaceScopes,
    features: &mut FeatureRegistry,
) -> Result<Vec<ExtensionAttribute>> {
    let mut extension_attributes = Vec::new();
    for (key, value) in attributes {
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        match key.find(':') {
            None => {
                if !known.contains(&key.as_str()) {
                    extension_attributes.push(ExtensionAttribute::new("", key.clone(), value.clone()));
                }
            }
            Some(pos) => {
                let prefix = &key[..pos];
                let local_name = &key[pos + 1..];
                if prefix == "xml" {
                    continue;
                }
                let namespace = scopes
                    .resolve_with(declarations, prefix)
                    .ok_or_else(|| {
                        Error::InvalidXml(format!("Undeclared namespace prefix '{}'", prefix))
                    })?
                    .to_string();
                if namespace == XSI_NAMESPACE || namespace == XMI_NAMESPACE {
                    continue;
                }
                features.demand_feature(namespace.clone(), local_name, FeatureKind::Attribute);
                extension_attributes.push(ExtensionAttribute::new(namespace, local_name, value.clone()));
            }
        }
    }
    Ok(extension_attributes)
}

/// Parse definitions element attributes
fn parse_definitions(
    attributes: &[(String, String)],
    declarations: &HashMap<String, String>,
    scopes: &NamespaceScopes,
) -> Result<Definitions> {
    let mut definitions = Definitions::new();
    definitions.id = identifier_attribute(attributes, declarations, scopes);
    definitions.name = attribute_value(attributes, "name").map(String::from);
    definitions.target_namespace = attribute_value(attributes, "targetNamespace").map(String::from);

    for (key, value) in attributes {
        if let Some(pos) = key.find(':') {
            let prefix = &key[..pos];
            if &key[pos + 1..] == "schemaLocation"
                && scopes.resolve_with(declarations, prefix) == Some(XSI_NAMESPACE)
            {
                let tokens: Vec<&str> = value.split_whitespace().collect();
                if tokens.len() % 2 != 0 {
                    return Err(Error::XmlAttr(
                        "xsi:schemaLocation must contain namespace/location pairs".to_string(),
                    ));
                }
                for pair in tokens.chunks(2) {
                    definitions.schema_locations.push(SchemaLocation {
                        namespace: pair[0].to_string(),
                        location: pair[1].to_string(),
                    });
                }
            }
        }
    }
    Ok(definitions)
}

/// Parse process element attributes
fn parse_process(
    attributes: &[(String, String)],
    declarations: &HashMap<String, String>,
    scopes: &NamespaceScopes,
    features: &mut FeatureRegistry,
) -> Result<Process> {
    let id = identifier_attribute(attributes, declarations, scopes)
        .ok_or_else(|| Error::missing_attribute("process", "id"))?;
    let mut process = Process::new(id);
    process.name = attribute_value(attributes, "name").map(String::from);

    if let Some(literal) = attribute_value(attributes, "processType") {
        process.process_type = ProcessType::from_literal(literal).ok_or_else(|| {
            Error::ParseError(format!(
                "Invalid processType '{}'. Must be one of: None, Public, Private",
                literal
            ))
        })?;
    }

    if let Some(literal) = attribute_value(attributes, "isExecutable") {
        process.is_executable = match literal {
            "true" => true,
            "false" => false,
            _ => {
                return Err(Error::ParseError(format!(
                    "Invalid isExecutable value '{}'. Must be 'true' or 'false'",
                    literal
                )));
            }
        };
    }

    process.any_attributes = collect_extension_attributes(
        attributes,
        &["id", "name", "processType", "isExecutable"],
        declarations,
        scopes,
        features,
    )?;
    Ok(process)
}

/// Parse laneSet element attributes
fn parse_lane_set(
    attributes: &[(String, String)],
    declarations: &HashMap<String, String>,
    scopes: &NamespaceScopes,
) -> Result<LaneSet> {
    let id = identifier_attribute(attributes, declarations, scopes)
        .ok_or_else(|| Error::missing_attribute("laneSet", "id"))?;
    let mut lane_set = LaneSet::new(id);
    lane_set.name = attribute_value(attributes, "name").map(String::from);
    Ok(lane_set)
}

/// Parse lane element attributes
fn parse_lane(
    attributes: &[(String, String)],
    declarations: &HashMap<String, String>,
    scopes: &NamespaceScopes,
    features: &mut FeatureRegistry,
) -> Result<Lane> {
    let id = identifier_attribute(attributes, declarations, scopes)
        .ok_or_else(|| Error::missing_attribute("lane", "id"))?;
    let mut lane = Lane::new(id);
    lane.name = attribute_value(attributes, "name").map(String::from);
    lane.any_attributes = collect_extension_attributes(
        attributes,
        &["id", "name"],
        declarations,
        scopes,
        features,
    )?;
    Ok(lane)
}

/// Read one foreign-namespace element into an [`ExtensionElement`] tree
///
/// Consumes events through the element's closing tag. Child elements recurse;
/// text content is accumulated. All attributes are kept in written order,
/// except namespace declarations and `xsi:` bookkeeping.
fn read_extension_element<R: BufRead>(
    reader: &mut Reader<R>,
    raw_name: &str,
    attributes: Vec<(String, String)>,
    declarations: HashMap<String, String>,
    is_empty: bool,
    scopes: &mut NamespaceScopes,
    features: &mut FeatureRegistry,
) -> Result<ExtensionElement> {
    let namespace = resolve_element_namespace(raw_name, &declarations, scopes)?;
    let local_name = get_local_name(raw_name).to_string();
    features.demand_feature(namespace.clone(), local_name.clone(), FeatureKind::Element);
    let mut element = ExtensionElement::new(namespace, local_name);

    for (key, value) in &attributes {
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        match key.find(':') {
            None => {
                element
                    .attributes
                    .push(ExtensionAttribute::new("", key.clone(), value.clone()));
            }
            Some(pos) => {
                let prefix = &key[..pos];
                let attr_local = &key[pos + 1..];
                if prefix == "xml" {
                    continue;
                }
                let attr_namespace = scopes
                    .resolve_with(&declarations, prefix)
                    .ok_or_else(|| {
                        Error::InvalidXml(format!("Undeclared namespace prefix '{}'", prefix))
                    })?
                    .to_string();
                if attr_namespace == XSI_NAMESPACE {
                    continue;
                }
                features.demand_feature(attr_namespace.clone(), attr_local, FeatureKind::Attribute);
                element
                    .attributes
                    .push(ExtensionAttribute::new(attr_namespace, attr_local, value.clone()));
            }
        }
    }

    if is_empty {
        return Ok(element);
    }

    scopes.push(declarations);
    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    loop {
        let event = reader.read_event_into(&mut buf);
        let child_empty = matches!(&event, Ok(Event::Empty(_)));
        match event {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let child_name = std::str::from_utf8(e.name().as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?
                    .to_string();
                let child_attributes = collect_attributes(e)?;
                let child_declarations = extract_declarations(&child_attributes);
                let child = read_extension_element(
                    reader,
                    &child_name,
                    child_attributes,
                    child_declarations,
                    child_empty,
                    scopes,
                    features,
                )?;
                element.children.push(child);
            }
            Ok(Event::Text(ref t)) => {
                let decoded = t.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
                let text = quick_xml::escape::unescape(&decoded)
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;
                if !text.is_empty() {
                    match element.text {
                        Some(ref mut existing) => existing.push_str(&text),
                        None => element.text = Some(text.into_owned()),
                    }
                }
            }
            Ok(Event::CData(ref t)) => {
                let text = std::str::from_utf8(t.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;
                match element.text {
                    Some(ref mut existing) => existing.push_str(text),
                    None => element.text = Some(text.to_string()),
                }
            }
            Ok(Event::End(_)) => {
                // Children consume their own end tags, so this one is ours.
                scopes.pop();
                return Ok(element);
            }
            Ok(Event::Comment(_)) => {}
            Ok(Event::Eof) => {
                return Err(Error::InvalidXml(format!(
                    "Unexpected end of document inside element '<{}>'",
                    raw_name
                )));
            }
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }
        buf.clear();
    }
}

/// Which element currently owns an open `<extensionElements>` wrapper
enum ExtensionOwner {
    Process,
    Lane,
}

/// Parse a BPMN 2.0 document from XML text
///
/// Extension features encountered along the way are demanded into a
/// throwaway registry; use [`parse_document_with_features`] to keep them.
pub fn parse_document(xml: &str) -> Result<Definitions> {
    let mut features = FeatureRegistry::new();
    parse_document_with_features(xml, &mut features)
}

/// Parse a BPMN 2.0 document, demand-registering extension features
///
/// Every foreign attribute and element encountered is demanded into
/// `features`, so the caller can enumerate which extension features the
/// document used. The parsed document is validated before it is returned.
pub fn parse_document_with_features(
    xml: &str,
    features: &mut FeatureRegistry,
) -> Result<Definitions> {
    // Check for DTD declarations before parsing for security.
    // DTD declarations can lead to XXE (XML External Entity) attacks.
    let check_len = xml.len().min(2000);
    if xml[..check_len].to_lowercase().contains("<!doctype") {
        return Err(Error::InvalidXml(
            "DTD declarations are not allowed in BPMN 2.0 files for security reasons".to_string(),
        ));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    let mut scopes = NamespaceScopes::new();

    let mut definitions: Option<Definitions> = None;
    let mut definitions_closed = false;
    let mut current_process: Option<Process> = None;
    let mut current_lane_set: Option<LaneSet> = None;
    let mut current_lane: Option<Lane> = None;
    let mut current_flow_node_ref: Option<String> = None;
    let mut current_extension_entries: Option<(ExtensionOwner, Vec<ExtensionElement>)> = None;

    loop {
        let event = reader.read_event_into(&mut buf);
        let is_empty = matches!(&event, Ok(Event::Empty(_)));
        match event {
            Ok(Event::Decl(_)) | Ok(Event::Comment(_)) => {}
            Ok(Event::DocType(_)) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed in BPMN 2.0 files for security reasons"
                        .to_string(),
                ));
            }
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let raw_name = std::str::from_utf8(e.name().as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?
                    .to_string();
                let attributes = collect_attributes(e)?;
                let declarations = extract_declarations(&attributes);
                let namespace = resolve_element_namespace(&raw_name, &declarations, &scopes)?;
                let local_name = get_local_name(&raw_name);

                if definitions.is_none() {
                    if (local_name == "definitions" || local_name == "Definitions")
                        && namespace == BPMN_NAMESPACE
                    {
                        definitions = Some(parse_definitions(&attributes, &declarations, &scopes)?);
                        if is_empty {
                            definitions_closed = true;
                        } else {
                            scopes.push(declarations);
                        }
                    } else {
                        return Err(Error::InvalidFormat(format!(
                            "Root element '<{}>' is not a BPMN 2.0 definitions element",
                            raw_name
                        )));
                    }
                } else if definitions_closed {
                    return Err(Error::InvalidFormat(
                        "Multiple root elements in document".to_string(),
                    ));
                } else if namespace == BPMN_NAMESPACE {
                    match local_name {
                        "definitions" | "Definitions" => {
                            return Err(Error::InvalidFormat(
                                "Nested definitions element".to_string(),
                            ));
                        }
                        "process" => {
                            if current_process.is_some() {
                                return Err(Error::invalid_xml_element(
                                    "process",
                                    "Nested process elements are not allowed",
                                ));
                            }
                            let process =
                                parse_process(&attributes, &declarations, &scopes, features)?;
                            if is_empty {
                                if let Some(ref mut d) = definitions {
                                    d.root_elements.push(RootElement::Process(process));
                                }
                            } else {
                                current_process = Some(process);
                                scopes.push(declarations);
                            }
                        }
                        "laneSet" => {
                            if current_process.is_none() || current_lane_set.is_some() {
                                return Err(Error::invalid_xml_element(
                                    "laneSet",
                                    "Only allowed directly inside a process",
                                ));
                            }
                            let lane_set = parse_lane_set(&attributes, &declarations, &scopes)?;
                            if is_empty {
                                if let Some(ref mut p) = current_process {
                                    p.lane_sets.push(lane_set);
                                }
                            } else {
                                current_lane_set = Some(lane_set);
                                scopes.push(declarations);
                            }
                        }
                        "lane" => {
                            if current_lane_set.is_none() || current_lane.is_some() {
                                return Err(Error::invalid_xml_element(
                                    "lane",
                                    "Only allowed directly inside a laneSet",
                                ));
                            }
                            let lane = parse_lane(&attributes, &declarations, &scopes, features)?;
                            if is_empty {
                                if let Some(ref mut ls) = current_lane_set {
                                    ls.lanes.push(lane);
                                }
                            } else {
                                current_lane = Some(lane);
                                scopes.push(declarations);
                            }
                        }
                        "flowNodeRef" => {
                            if current_lane.is_none() {
                                return Err(Error::invalid_xml_element(
                                    "flowNodeRef",
                                    "Only allowed inside a lane",
                                ));
                            }
                            if !is_empty {
                                current_flow_node_ref = Some(String::new());
                                scopes.push(declarations);
                            }
                        }
                        "extensionElements" => {
                            let owner = if current_lane.is_some() {
                                ExtensionOwner::Lane
                            } else if current_lane_set.is_some() {
                                return Err(Error::invalid_xml_element(
                                    "extensionElements",
                                    "Not allowed inside a laneSet",
                                ));
                            } else if current_process.is_some() {
                                ExtensionOwner::Process
                            } else {
                                return Err(Error::invalid_xml_element(
                                    "extensionElements",
                                    "Only allowed inside a process or lane",
                                ));
                            };
                            let already_present = match owner {
                                ExtensionOwner::Lane => current_lane
                                    .as_ref()
                                    .is_some_and(|l| !l.extension_values.is_empty()),
                                ExtensionOwner::Process => current_process
                                    .as_ref()
                                    .is_some_and(|p| !p.extension_values.is_empty()),
                            };
                            if already_present {
                                return Err(Error::invalid_xml_element(
                                    "extensionElements",
                                    "At most one extensionElements wrapper is allowed per element",
                                ));
                            }
                            if is_empty {
                                let group = ExtensionValue::new();
                                match owner {
                                    ExtensionOwner::Lane => {
                                        if let Some(ref mut l) = current_lane {
                                            l.extension_values.push(group);
                                        }
                                    }
                                    ExtensionOwner::Process => {
                                        if let Some(ref mut p) = current_process {
                                            p.extension_values.push(group);
                                        }
                                    }
                                }
                            } else {
                                current_extension_entries = Some((owner, Vec::new()));
                                scopes.push(declarations);
                            }
                        }
                        _ => {
                            // Unknown BPMN element: skip the whole subtree.
                            if !is_empty {
                                let name_owned = raw_name.as_bytes().to_vec();
                                let mut skip_buf = Vec::new();
                                reader.read_to_end_into(
                                    quick_xml::name::QName(&name_owned),
                                    &mut skip_buf,
                                )?;
                            }
                        }
                    }
                } else if let Some((_, ref mut entries)) = current_extension_entries {
                    let entry = read_extension_element(
                        &mut reader,
                        &raw_name,
                        attributes,
                        declarations,
                        is_empty,
                        &mut scopes,
                        features,
                    )?;
                    entries.push(entry);
                } else if current_process.is_none()
                    && current_lane_set.is_none()
                    && current_lane.is_none()
                {
                    // Foreign element directly under definitions: a typed
                    // extension root, exposed generically.
                    let element = read_extension_element(
                        &mut reader,
                        &raw_name,
                        attributes,
                        declarations,
                        is_empty,
                        &mut scopes,
                        features,
                    )?;
                    if let Some(ref mut d) = definitions {
                        d.root_elements.push(RootElement::Extension(element));
                    }
                } else {
                    // Foreign element outside an extension context: skip it.
                    if !is_empty {
                        let name_owned = raw_name.as_bytes().to_vec();
                        let mut skip_buf = Vec::new();
                        reader
                            .read_to_end_into(quick_xml::name::QName(&name_owned), &mut skip_buf)?;
                    }
                }
            }
            Ok(Event::Text(ref t)) => {
                if let Some(ref mut flow_node_ref) = current_flow_node_ref {
                    let decoded = t.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
                    let text = quick_xml::escape::unescape(&decoded)
                        .map_err(|e| Error::InvalidXml(e.to_string()))?;
                    flow_node_ref.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let raw_name = std::str::from_utf8(e.name().as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?
                    .to_string();
                match get_local_name(&raw_name) {
                    "definitions" | "Definitions" => {
                        definitions_closed = true;
                    }
                    "process" => {
                        if let Some(process) = current_process.take() {
                            if let Some(ref mut d) = definitions {
                                d.root_elements.push(RootElement::Process(process));
                            }
                        }
                    }
                    "laneSet" => {
                        if let Some(lane_set) = current_lane_set.take() {
                            if let Some(ref mut p) = current_process {
                                p.lane_sets.push(lane_set);
                            }
                        }
                    }
                    "lane" => {
                        if let Some(lane) = current_lane.take() {
                            if let Some(ref mut ls) = current_lane_set {
                                ls.lanes.push(lane);
                            }
                        }
                    }
                    "flowNodeRef" => {
                        if let Some(flow_node_ref) = current_flow_node_ref.take() {
                            if let Some(ref mut l) = current_lane {
                                l.flow_node_refs.push(flow_node_ref);
                            }
                        }
                    }
                    "extensionElements" => {
                        if let Some((owner, entries)) = current_extension_entries.take() {
                            let group = ExtensionValue { entries };
                            match owner {
                                ExtensionOwner::Lane => {
                                    if let Some(ref mut l) = current_lane {
                                        l.extension_values.push(group);
                                    }
                                }
                                ExtensionOwner::Process => {
                                    if let Some(ref mut p) = current_process {
                                        p.extension_values.push(group);
                                    }
                                }
                            }
                        }
                    }
                    _ => {}
                }
                scopes.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }
        buf.clear();
    }

    let document = definitions.ok_or_else(|| {
        Error::InvalidFormat("Document contains no definitions root element".to_string())
    })?;
    validator::validate_document(&document)?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn2:definitions xmlns:bpmn2="http://www.omg.org/spec/BPMN/20100524/MODEL"
    id="d1" targetNamespace="urn:tns1">
  <bpmn2:process id="p1" processType="None" isExecutable="false"/>
</bpmn2:definitions>"#;

    #[test]
    fn test_parse_minimal_document() {
        let document = parse_document(MINIMAL).unwrap();
        assert_eq!(document.id.as_deref(), Some("d1"));
        assert_eq!(document.target_namespace.as_deref(), Some("urn:tns1"));
        assert_eq!(document.root_elements.len(), 1);
        let process = document.root_elements[0].as_process().unwrap();
        assert_eq!(process.id, "p1");
        assert_eq!(process.process_type, ProcessType::None);
        assert!(!process.is_executable);
    }

    #[test]
    fn test_parse_default_namespace_document() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL" id="d1">
  <process id="p1"/>
</definitions>"#;
        let document = parse_document(xml).unwrap();
        assert_eq!(document.root_elements.len(), 1);
    }

    #[test]
    fn test_parse_extension_attribute_preserves_namespace() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn2:definitions xmlns:bpmn2="http://www.omg.org/spec/BPMN/20100524/MODEL"
    xmlns:ext="http://example.org" id="d1">
  <bpmn2:process id="p1" ext:packageName="myPackage"/>
</bpmn2:definitions>"#;
        let mut features = FeatureRegistry::new();
        let document = parse_document_with_features(xml, &mut features).unwrap();
        let process = document.root_elements[0].as_process().unwrap();
        assert_eq!(process.any_attributes.len(), 1);
        assert_eq!(process.any_attributes[0].namespace, "http://example.org");
        assert_eq!(process.any_attributes[0].local_name, "packageName");
        assert_eq!(process.any_attributes[0].value, "myPackage");
        assert!(
            features
                .get("http://example.org", "packageName", FeatureKind::Attribute)
                .is_some()
        );
    }

    #[test]
    fn test_parse_extension_element_with_text() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn2:definitions xmlns:bpmn2="http://www.omg.org/spec/BPMN/20100524/MODEL"
    xmlns:ext="http://example.org" id="d1">
  <bpmn2:process id="p1">
    <bpmn2:extensionElements>
      <ext:foo>bar</ext:foo>
    </bpmn2:extensionElements>
  </bpmn2:process>
</bpmn2:definitions>"#;
        let document = parse_document(xml).unwrap();
        let process = document.root_elements[0].as_process().unwrap();
        assert_eq!(process.extension_values.len(), 1);
        let entries = &process.extension_values[0].entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].local_name, "foo");
        assert_eq!(entries[0].namespace, "http://example.org");
        assert_eq!(entries[0].text.as_deref(), Some("bar"));
    }

    #[test]
    fn test_nested_namespace_declaration_resolves() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL" id="d1">
  <process id="p1">
    <extensionElements>
      <meta:entry xmlns:meta="http://example.org/meta" key="a"/>
    </extensionElements>
  </process>
</definitions>"#;
        let document = parse_document(xml).unwrap();
        let process = document.root_elements[0].as_process().unwrap();
        let entry = &process.extension_values[0].entries[0];
        assert_eq!(entry.namespace, "http://example.org/meta");
        assert_eq!(entry.attribute("key"), Some("a"));
    }

    #[test]
    fn test_undeclared_prefix_is_an_error() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn2:definitions xmlns:bpmn2="http://www.omg.org/spec/BPMN/20100524/MODEL" id="d1">
  <bpmn2:process id="p1" ext:packageName="myPackage"/>
</bpmn2:definitions>"#;
        let result = parse_document(xml);
        assert!(matches!(result, Err(Error::InvalidXml(_))));
    }

    #[test]
    fn test_root_element_must_be_definitions() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn2:process xmlns:bpmn2="http://www.omg.org/spec/BPMN/20100524/MODEL" id="p1"/>"#;
        assert!(matches!(
            parse_document(xml),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_doctype_is_rejected() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE definitions [<!ENTITY x "y">]>
<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL" id="d1"/>"#;
        assert!(matches!(parse_document(xml), Err(Error::InvalidXml(_))));
    }

    #[test]
    fn test_duplicate_extension_wrapper_is_an_error() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL" id="d1">
  <process id="p1">
    <extensionElements/>
    <extensionElements/>
  </process>
</definitions>"#;
        assert!(matches!(parse_document(xml), Err(Error::InvalidXml(_))));
    }

    #[test]
    fn test_xmi_identifier_form_is_accepted() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn2:Definitions xmlns:bpmn2="http://www.omg.org/spec/BPMN/20100524/MODEL"
    xmlns:xmi="http://www.omg.org/XMI" xmi:version="2.0" xmi:id="d1">
  <bpmn2:process xmi:id="p1"/>
</bpmn2:Definitions>"#;
        let document = parse_document(xml).unwrap();
        assert_eq!(document.id.as_deref(), Some("d1"));
        assert_eq!(document.root_elements[0].id(), Some("p1"));
    }

    #[test]
    fn test_lane_lookup_in_parsed_document() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL" id="d1">
  <process id="p1">
    <laneSet id="ls1">
      <lane id="lane1" name="Clerk">
        <flowNodeRef>task1</flowNodeRef>
      </lane>
    </laneSet>
  </process>
</definitions>"#;
        let document = parse_document(xml).unwrap();
        let lane = match document.element_by_id("lane1") {
            Some(Element::Lane(lane)) => lane,
            other => panic!("expected lane, got {:?}", other),
        };
        assert_eq!(lane.name.as_deref(), Some("Clerk"));
        assert_eq!(lane.flow_node_refs, vec!["task1".to_string()]);
    }
}
