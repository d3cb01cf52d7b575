//! Namespaced extension data attached outside the BPMN schema

use crate::metadata::FeatureDescriptor;

use super::XMI_NAMESPACE;

/// A namespaced attribute attached to an element outside its native schema
///
/// The `(namespace, local_name)` pair identifies the attribute's meaning; the
/// value is an opaque string. Attributes without a namespace (unprefixed
/// attributes on foreign elements) carry an empty namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionAttribute {
    /// The namespace URI, or empty for attributes without a namespace
    pub namespace: String,
    /// The attribute name without a namespace prefix
    pub local_name: String,
    /// The attribute value
    pub value: String,
}

impl ExtensionAttribute {
    /// Create an extension attribute
    pub fn new(
        namespace: impl Into<String>,
        local_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
            value: value.into(),
        }
    }

    /// Create an extension attribute from a demanded feature descriptor
    pub fn from_feature(feature: &FeatureDescriptor, value: impl Into<String>) -> Self {
        Self::new(feature.namespace.clone(), feature.local_name.clone(), value)
    }
}

/// A namespaced child element attached outside an element's native schema
///
/// Holds arbitrary foreign XML element data: attributes in written order,
/// optional text content and nested child elements.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionElement {
    /// The namespace URI
    pub namespace: String,
    /// The element name without a namespace prefix
    pub local_name: String,
    /// Element attributes in written order
    pub attributes: Vec<ExtensionAttribute>,
    /// Text content, if the element has simple content
    pub text: Option<String>,
    /// Nested child elements in document order
    pub children: Vec<ExtensionElement>,
}

impl ExtensionElement {
    /// Create an extension element
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Create an extension element from a demanded feature descriptor
    pub fn from_feature(feature: &FeatureDescriptor) -> Self {
        Self::new(feature.namespace.clone(), feature.local_name.clone())
    }

    /// Create an extension element with simple text content
    pub fn with_text(
        namespace: impl Into<String>,
        local_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let mut element = Self::new(namespace, local_name);
        element.text = Some(text.into());
        element
    }

    /// Look up an attribute value by local name, regardless of namespace
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.local_name == local_name)
            .map(|attribute| attribute.value.as_str())
    }

    /// The identifier of this element, if it carries one
    ///
    /// Accepts a plain `id` attribute or an `xmi:id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| {
                attribute.local_name == "id"
                    && (attribute.namespace.is_empty() || attribute.namespace == XMI_NAMESPACE)
            })
            .map(|attribute| attribute.value.as_str())
    }
}

/// One group of extension entries, as attached to an extensible element
///
/// Mirrors the wire format's `<extensionElements>` wrapper. The metamodel
/// allows many groups per element while the wire format allows at most one
/// wrapper; see [`crate::model::Process::extension_values`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtensionValue {
    /// The namespaced entries of this group, in document order
    pub entries: Vec<ExtensionElement>,
}

impl ExtensionValue {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group holding a single entry
    pub fn with_entry(entry: ExtensionElement) -> Self {
        Self {
            entries: vec![entry],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FeatureKind, FeatureRegistry};

    #[test]
    fn test_attribute_from_feature() {
        let mut registry = FeatureRegistry::new();
        let feature =
            registry.demand_feature("http://example.org", "packageName", FeatureKind::Attribute);
        let attribute = ExtensionAttribute::from_feature(&feature, "myPackage");
        assert_eq!(attribute.namespace, "http://example.org");
        assert_eq!(attribute.local_name, "packageName");
        assert_eq!(attribute.value, "myPackage");
    }

    #[test]
    fn test_element_id_accepts_plain_and_xmi_ids() {
        let mut element = ExtensionElement::new("http://example.org", "sample");
        assert_eq!(element.id(), None);

        element
            .attributes
            .push(ExtensionAttribute::new("", "id", "ID_1"));
        assert_eq!(element.id(), Some("ID_1"));

        let mut xmi_element = ExtensionElement::new("http://example.org", "sample");
        xmi_element
            .attributes
            .push(ExtensionAttribute::new(XMI_NAMESPACE, "id", "ID_2"));
        assert_eq!(xmi_element.id(), Some("ID_2"));
    }
}
