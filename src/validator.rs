//! Structural validation for BPMN 2.0 documents

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::model::{Definitions, RootElement};

/// Validate a document after parsing
///
/// Checks that element identifiers are unique within the document. Foreign
/// root elements participate through their `id` attribute; identifiers nested
/// inside extension payloads are opaque data and are not checked.
pub fn validate_document(document: &Definitions) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();

    if let Some(ref id) = document.id {
        check_unique(&mut seen, id)?;
    }
    for root_element in &document.root_elements {
        match root_element {
            RootElement::Process(process) => {
                check_unique(&mut seen, &process.id)?;
                for lane_set in &process.lane_sets {
                    check_unique(&mut seen, &lane_set.id)?;
                    for lane in &lane_set.lanes {
                        check_unique(&mut seen, &lane.id)?;
                    }
                }
            }
            RootElement::Extension(element) => {
                if let Some(id) = element.id() {
                    check_unique(&mut seen, id)?;
                }
            }
        }
    }
    Ok(())
}

fn check_unique<'a>(seen: &mut HashSet<&'a str>, id: &'a str) -> Result<()> {
    if !seen.insert(id) {
        return Err(Error::InvalidModel(format!(
            "Duplicate element id '{}'. Identifiers must be unique within a document",
            id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Lane, LaneSet, Process};

    #[test]
    fn test_unique_ids_pass() {
        let mut lane_set = LaneSet::new("ls1");
        lane_set.lanes.push(Lane::new("lane1"));
        let mut process = Process::new("p1");
        process.lane_sets.push(lane_set);
        let mut document = Definitions::new();
        document.id = Some("d1".to_string());
        document.root_elements.push(RootElement::Process(process));

        assert!(validate_document(&document).is_ok());
    }

    #[test]
    fn test_duplicate_ids_fail() {
        let mut document = Definitions::new();
        document
            .root_elements
            .push(RootElement::Process(Process::new("p1")));
        document
            .root_elements
            .push(RootElement::Process(Process::new("p1")));

        assert!(matches!(
            validate_document(&document),
            Err(Error::InvalidModel(_))
        ));
    }
}
