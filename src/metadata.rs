//! Demand-created extension feature descriptors
//!
//! BPMN 2.0 tooling attaches vendor data to elements through features that
//! are not part of the BPMN schema. This module keeps an explicit registry of
//! such features, keyed by `(namespace, local name, kind)`: a feature is
//! created the first time it is demanded and interned thereafter, so the same
//! triple always yields the same descriptor.

use std::collections::HashMap;
use std::sync::Arc;

/// Whether a demanded feature is serialized as an attribute or an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// A namespaced attribute on the host element
    Attribute,
    /// A namespaced child element
    Element,
}

/// A descriptor for one extension feature
///
/// Demanding the same local name once as an attribute and once as an element
/// yields two distinct descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDescriptor {
    /// The namespace URI governing the feature
    pub namespace: String,
    /// The feature name without a namespace prefix
    pub local_name: String,
    /// Attribute or element
    pub kind: FeatureKind,
}

/// Registry of demand-created extension features
///
/// The registry is an owned value: readers populate the one they are given,
/// and tests construct their own. There is no process-global instance.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: HashMap<(String, String, FeatureKind), Arc<FeatureDescriptor>>,
}

impl FeatureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the descriptor for a feature, creating it on first use
    ///
    /// Subsequent demands for the same `(namespace, local name, kind)` triple
    /// return the same shared descriptor.
    pub fn demand_feature(
        &mut self,
        namespace: impl Into<String>,
        local_name: impl Into<String>,
        kind: FeatureKind,
    ) -> Arc<FeatureDescriptor> {
        let namespace = namespace.into();
        let local_name = local_name.into();
        self.features
            .entry((namespace.clone(), local_name.clone(), kind))
            .or_insert_with(|| {
                Arc::new(FeatureDescriptor {
                    namespace,
                    local_name,
                    kind,
                })
            })
            .clone()
    }

    /// Look up a feature without creating it
    pub fn get(
        &self,
        namespace: &str,
        local_name: &str,
        kind: FeatureKind,
    ) -> Option<Arc<FeatureDescriptor>> {
        self.features
            .get(&(namespace.to_string(), local_name.to_string(), kind))
            .cloned()
    }

    /// Number of distinct features demanded so far
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether no feature has been demanded yet
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_feature_interns() {
        let mut registry = FeatureRegistry::new();
        let first = registry.demand_feature("http://example.org", "foo", FeatureKind::Element);
        let second = registry.demand_feature("http://example.org", "foo", FeatureKind::Element);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_attribute_and_element_kinds_are_distinct() {
        let mut registry = FeatureRegistry::new();
        let attribute =
            registry.demand_feature("http://example.org", "foo", FeatureKind::Attribute);
        let element = registry.demand_feature("http://example.org", "foo", FeatureKind::Element);
        assert!(!Arc::ptr_eq(&attribute, &element));
        assert_eq!(registry.len(), 2);
        assert!(
            registry
                .get("http://example.org", "foo", FeatureKind::Attribute)
                .is_some()
        );
        assert!(
            registry
                .get("http://example.org", "bar", FeatureKind::Attribute)
                .is_none()
        );
    }
}
