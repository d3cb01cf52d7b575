//! XML writing for BPMN 2.0 document files
//!
//! Serializes a [`Definitions`] document to BPMN 2.0 XML. Foreign namespaces
//! used by extension data are collected in document order and declared as
//! `xmlns:ns0`, `xmlns:ns1`, … on the root element. At most one
//! `<extensionElements>` wrapper is written per element: all in-memory
//! extension groups are merged into it.

use std::collections::HashMap;
use std::io::Write as IoWrite;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Error, Result};
use crate::model::{
    BPMN_NAMESPACE, Definitions, ExtensionAttribute, ExtensionElement, ExtensionValue, Lane,
    LaneSet, Process, RootElement, XMI_NAMESPACE, XSI_NAMESPACE,
};

/// The XML dialect a document is serialized in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlDialect {
    /// The native BPMN 2.0 XML interchange format (`.bpmn2`)
    #[default]
    Native,
    /// An XMI-flavored variant carrying `xmi:version` and `xmi:id` (`.bpmn2xmi`)
    Xmi,
}

impl XmlDialect {
    fn root_name(&self) -> &'static str {
        match self {
            XmlDialect::Native => "bpmn2:definitions",
            XmlDialect::Xmi => "bpmn2:Definitions",
        }
    }

    fn id_attribute(&self) -> &'static str {
        match self {
            XmlDialect::Native => "id",
            XmlDialect::Xmi => "xmi:id",
        }
    }
}

/// Namespace-to-prefix assignments for one serialization run
type PrefixMap = HashMap<String, String>;

/// Write a document as BPMN 2.0 XML
pub fn write_document<W: IoWrite>(
    document: &Definitions,
    writer: W,
    dialect: XmlDialect,
) -> Result<()> {
    let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);

    xml_writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::xml_write(format!("Failed to write XML declaration: {}", e)))?;

    let mut root = BytesStart::new(dialect.root_name());
    root.push_attribute(("xmlns:bpmn2", BPMN_NAMESPACE));
    if dialect == XmlDialect::Xmi {
        root.push_attribute(("xmlns:xmi", XMI_NAMESPACE));
    }

    let namespaces = collect_foreign_namespaces(document);
    let mut prefixes = PrefixMap::new();
    for (index, namespace) in namespaces.iter().enumerate() {
        let prefix = format!("ns{}", index);
        root.push_attribute((format!("xmlns:{}", prefix).as_str(), namespace.as_str()));
        prefixes.insert(namespace.clone(), prefix);
    }

    if !document.schema_locations.is_empty() {
        root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
    }
    if dialect == XmlDialect::Xmi {
        root.push_attribute(("xmi:version", "2.0"));
    }
    if let Some(ref id) = document.id {
        root.push_attribute((dialect.id_attribute(), id.as_str()));
    }
    if let Some(ref name) = document.name {
        root.push_attribute(("name", name.as_str()));
    }
    if let Some(ref target_namespace) = document.target_namespace {
        root.push_attribute(("targetNamespace", target_namespace.as_str()));
    }
    if !document.schema_locations.is_empty() {
        let joined = document
            .schema_locations
            .iter()
            .map(|l| format!("{} {}", l.namespace, l.location))
            .collect::<Vec<_>>()
            .join(" ");
        root.push_attribute(("xsi:schemaLocation", joined.as_str()));
    }

    if document.root_elements.is_empty() {
        xml_writer
            .write_event(Event::Empty(root))
            .map_err(|e| Error::xml_write(format!("Failed to write definitions element: {}", e)))?;
        return Ok(());
    }

    xml_writer
        .write_event(Event::Start(root))
        .map_err(|e| Error::xml_write(format!("Failed to write definitions element: {}", e)))?;

    for root_element in &document.root_elements {
        match root_element {
            RootElement::Process(process) => {
                write_process(&mut xml_writer, process, &prefixes, dialect)?;
            }
            RootElement::Extension(element) => {
                write_extension_element(&mut xml_writer, element, &prefixes)?;
            }
        }
    }

    xml_writer
        .write_event(Event::End(BytesEnd::new(dialect.root_name())))
        .map_err(|e| Error::xml_write(format!("Failed to close definitions element: {}", e)))?;
    Ok(())
}

/// Collect every foreign namespace used by extension data, in document order
fn collect_foreign_namespaces(document: &Definitions) -> Vec<String> {
    let mut namespaces = Vec::new();
    for root_element in &document.root_elements {
        match root_element {
            RootElement::Process(process) => {
                add_attribute_namespaces(&mut namespaces, &process.any_attributes);
                add_value_namespaces(&mut namespaces, &process.extension_values);
                for lane_set in &process.lane_sets {
                    for lane in &lane_set.lanes {
                        add_attribute_namespaces(&mut namespaces, &lane.any_attributes);
                        add_value_namespaces(&mut namespaces, &lane.extension_values);
                    }
                }
            }
            RootElement::Extension(element) => {
                add_element_namespaces(&mut namespaces, element);
            }
        }
    }
    namespaces
}

fn add_namespace(namespaces: &mut Vec<String>, namespace: &str) {
    if !namespace.is_empty() && !namespaces.iter().any(|n| n == namespace) {
        namespaces.push(namespace.to_string());
    }
}

fn add_attribute_namespaces(namespaces: &mut Vec<String>, attributes: &[ExtensionAttribute]) {
    for attribute in attributes {
        add_namespace(namespaces, &attribute.namespace);
    }
}

fn add_value_namespaces(namespaces: &mut Vec<String>, values: &[ExtensionValue]) {
    for value in values {
        for entry in &value.entries {
            add_element_namespaces(namespaces, entry);
        }
    }
}

fn add_element_namespaces(namespaces: &mut Vec<String>, element: &ExtensionElement) {
    add_namespace(namespaces, &element.namespace);
    add_attribute_namespaces(namespaces, &element.attributes);
    for child in &element.children {
        add_element_namespaces(namespaces, child);
    }
}

/// Push extension attributes onto an element, using the assigned prefixes
fn push_extension_attributes(
    element: &mut BytesStart,
    attributes: &[ExtensionAttribute],
    prefixes: &PrefixMap,
) -> Result<()> {
    for attribute in attributes {
        if attribute.namespace.is_empty() {
            element.push_attribute((attribute.local_name.as_str(), attribute.value.as_str()));
        } else {
            let prefix = prefixes.get(&attribute.namespace).ok_or_else(|| {
                Error::xml_write(format!(
                    "No prefix assigned for namespace '{}'",
                    attribute.namespace
                ))
            })?;
            let key = format!("{}:{}", prefix, attribute.local_name);
            element.push_attribute((key.as_str(), attribute.value.as_str()));
        }
    }
    Ok(())
}

fn write_process<W: IoWrite>(
    xml_writer: &mut Writer<W>,
    process: &Process,
    prefixes: &PrefixMap,
    dialect: XmlDialect,
) -> Result<()> {
    let mut element = BytesStart::new("bpmn2:process");
    element.push_attribute((dialect.id_attribute(), process.id.as_str()));
    if let Some(ref name) = process.name {
        element.push_attribute(("name", name.as_str()));
    }
    element.push_attribute(("processType", process.process_type.as_str()));
    element.push_attribute(("isExecutable", bool_literal(process.is_executable)));
    push_extension_attributes(&mut element, &process.any_attributes, prefixes)?;

    if process.extension_values.is_empty() && process.lane_sets.is_empty() {
        xml_writer
            .write_event(Event::Empty(element))
            .map_err(|e| Error::xml_write(format!("Failed to write process element: {}", e)))?;
        return Ok(());
    }

    xml_writer
        .write_event(Event::Start(element))
        .map_err(|e| Error::xml_write(format!("Failed to write process element: {}", e)))?;
    write_extension_values(xml_writer, &process.extension_values, prefixes)?;
    for lane_set in &process.lane_sets {
        write_lane_set(xml_writer, lane_set, prefixes, dialect)?;
    }
    xml_writer
        .write_event(Event::End(BytesEnd::new("bpmn2:process")))
        .map_err(|e| Error::xml_write(format!("Failed to close process element: {}", e)))?;
    Ok(())
}

fn write_lane_set<W: IoWrite>(
    xml_writer: &mut Writer<W>,
    lane_set: &LaneSet,
    prefixes: &PrefixMap,
    dialect: XmlDialect,
) -> Result<()> {
    let mut element = BytesStart::new("bpmn2:laneSet");
    element.push_attribute((dialect.id_attribute(), lane_set.id.as_str()));
    if let Some(ref name) = lane_set.name {
        element.push_attribute(("name", name.as_str()));
    }

    if lane_set.lanes.is_empty() {
        xml_writer
            .write_event(Event::Empty(element))
            .map_err(|e| Error::xml_write(format!("Failed to write laneSet element: {}", e)))?;
        return Ok(());
    }

    xml_writer
        .write_event(Event::Start(element))
        .map_err(|e| Error::xml_write(format!("Failed to write laneSet element: {}", e)))?;
    for lane in &lane_set.lanes {
        write_lane(xml_writer, lane, prefixes, dialect)?;
    }
    xml_writer
        .write_event(Event::End(BytesEnd::new("bpmn2:laneSet")))
        .map_err(|e| Error::xml_write(format!("Failed to close laneSet element: {}", e)))?;
    Ok(())
}

fn write_lane<W: IoWrite>(
    xml_writer: &mut Writer<W>,
    lane: &Lane,
    prefixes: &PrefixMap,
    dialect: XmlDialect,
) -> Result<()> {
    let mut element = BytesStart::new("bpmn2:lane");
    element.push_attribute((dialect.id_attribute(), lane.id.as_str()));
    if let Some(ref name) = lane.name {
        element.push_attribute(("name", name.as_str()));
    }
    push_extension_attributes(&mut element, &lane.any_attributes, prefixes)?;

    if lane.extension_values.is_empty() && lane.flow_node_refs.is_empty() {
        xml_writer
            .write_event(Event::Empty(element))
            .map_err(|e| Error::xml_write(format!("Failed to write lane element: {}", e)))?;
        return Ok(());
    }

    xml_writer
        .write_event(Event::Start(element))
        .map_err(|e| Error::xml_write(format!("Failed to write lane element: {}", e)))?;
    write_extension_values(xml_writer, &lane.extension_values, prefixes)?;
    for flow_node_ref in &lane.flow_node_refs {
        xml_writer
            .write_event(Event::Start(BytesStart::new("bpmn2:flowNodeRef")))
            .map_err(|e| Error::xml_write(format!("Failed to write flowNodeRef: {}", e)))?;
        xml_writer
            .write_event(Event::Text(BytesText::new(flow_node_ref)))
            .map_err(|e| Error::xml_write(format!("Failed to write flowNodeRef: {}", e)))?;
        xml_writer
            .write_event(Event::End(BytesEnd::new("bpmn2:flowNodeRef")))
            .map_err(|e| Error::xml_write(format!("Failed to write flowNodeRef: {}", e)))?;
    }
    xml_writer
        .write_event(Event::End(BytesEnd::new("bpmn2:lane")))
        .map_err(|e| Error::xml_write(format!("Failed to close lane element: {}", e)))?;
    Ok(())
}

/// Write all extension groups of an element into one wrapper
///
/// The wire format allows at most one `<extensionElements>` element, while
/// the model allows any number of groups, so the groups are merged here.
fn write_extension_values<W: IoWrite>(
    xml_writer: &mut Writer<W>,
    values: &[ExtensionValue],
    prefixes: &PrefixMap,
) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }

    let has_entries = values.iter().any(|value| !value.entries.is_empty());
    if !has_entries {
        xml_writer
            .write_event(Event::Empty(BytesStart::new("bpmn2:extensionElements")))
            .map_err(|e| Error::xml_write(format!("Failed to write extensionElements: {}", e)))?;
        return Ok(());
    }

    xml_writer
        .write_event(Event::Start(BytesStart::new("bpmn2:extensionElements")))
        .map_err(|e| Error::xml_write(format!("Failed to write extensionElements: {}", e)))?;
    for value in values {
        for entry in &value.entries {
            write_extension_element(xml_writer, entry, prefixes)?;
        }
    }
    xml_writer
        .write_event(Event::End(BytesEnd::new("bpmn2:extensionElements")))
        .map_err(|e| Error::xml_write(format!("Failed to close extensionElements: {}", e)))?;
    Ok(())
}

fn write_extension_element<W: IoWrite>(
    xml_writer: &mut Writer<W>,
    element: &ExtensionElement,
    prefixes: &PrefixMap,
) -> Result<()> {
    let name = if element.namespace.is_empty() {
        element.local_name.clone()
    } else {
        let prefix = prefixes.get(&element.namespace).ok_or_else(|| {
            Error::xml_write(format!(
                "No prefix assigned for namespace '{}'",
                element.namespace
            ))
        })?;
        format!("{}:{}", prefix, element.local_name)
    };

    let mut start = BytesStart::new(name.as_str());
    push_extension_attributes(&mut start, &element.attributes, prefixes)?;

    if element.text.is_none() && element.children.is_empty() {
        xml_writer
            .write_event(Event::Empty(start))
            .map_err(|e| Error::xml_write(format!("Failed to write extension element: {}", e)))?;
        return Ok(());
    }

    xml_writer
        .write_event(Event::Start(start))
        .map_err(|e| Error::xml_write(format!("Failed to write extension element: {}", e)))?;
    if let Some(ref text) = element.text {
        xml_writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| Error::xml_write(format!("Failed to write extension text: {}", e)))?;
    }
    for child in &element.children {
        write_extension_element(xml_writer, child, prefixes)?;
    }
    xml_writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(|e| Error::xml_write(format!("Failed to close extension element: {}", e)))?;
    Ok(())
}

fn bool_literal(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
