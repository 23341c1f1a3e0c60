//! Allowed-area injection into WFS query and transaction filters.

use tracing::debug;

use ows_common::{Geometry, OwsError, OwsResult};
use ows_xml::{NodeId, XmlDocument};

use crate::filter::{new_element, FilterDialect, SpatialFilter};
use crate::namespaces::{WFS_1, WFS_20};

/// Restrict the `Filter` of `target` (a `wfs:Query`, `wfs:Update` or
/// `wfs:Delete`) to features whose `value_reference` lies within `area`.
///
/// * no filter: a `Filter` holding the new condition is created (before
///   `SortBy`, if present)
/// * root condition `And`: the new condition is appended to it
/// * any other root condition: it is replaced by an `And` holding a copy of
///   the original condition followed by the new one
///
/// Coordinates are written as given; axis order is the caller's concern.
pub fn secure_spatial(
    doc: &mut XmlDocument,
    target: NodeId,
    value_reference: &str,
    area: &Geometry,
) -> OwsResult<()> {
    if !doc.is_element(target) {
        return Err(OwsError::InvalidXml(format!("node {} is not an element", target)));
    }
    let dialect = dialect_of(doc, target);
    let condition = SpatialFilter::within_area(value_reference, area)?;
    let ns = dialect.filter_namespace();
    let prefix = dialect.filter_prefix();

    let Some(filter) = doc.find_child(target, Some(ns), "Filter") else {
        let filter = new_element(doc, target, ns, prefix, "Filter")?;
        match doc.find_child(target, Some(ns), "SortBy") {
            Some(sort_by) => doc.insert_before(sort_by, filter),
            None => doc.append_child(target, filter),
        }
        condition.write_into(doc, filter, dialect)?;
        debug!(
            element = doc.name(target).unwrap_or_default(),
            conditions = condition.within_count(),
            "Created spatial filter"
        );
        return Ok(());
    };

    let existing: Vec<NodeId> = doc.child_elements(filter).collect();
    match existing.as_slice() {
        [] => {
            condition.write_into(doc, filter, dialect)?;
        }
        [single] if doc.matches(*single, Some(ns), "And") => {
            condition.write_into(doc, *single, dialect)?;
            debug!("Appended spatial condition to existing And");
        }
        [first, rest @ ..] => {
            let and = new_element(doc, filter, ns, prefix, "And")?;
            let copies: Vec<NodeId> = existing.iter().map(|&c| doc.deep_copy(c)).collect();
            doc.replace_node(*first, and);
            for &other in rest {
                doc.detach(other);
            }
            for copy in copies {
                doc.append_child(and, copy);
            }
            condition.write_into(doc, and, dialect)?;
            debug!(wrapped = existing.len(), "Wrapped existing filter in And");
        }
    }
    Ok(())
}

/// FES 2.0 for WFS 2.0 documents, OGC filter 1.1 otherwise.
fn dialect_of(doc: &XmlDocument, node: NodeId) -> FilterDialect {
    match doc.namespace_uri(node) {
        Some(WFS_20) => FilterDialect::Fes20,
        Some(WFS_1) => FilterDialect::Ogc11,
        _ => doc
            .root_element()
            .and_then(|root| doc.attribute(root, "version"))
            .map(FilterDialect::for_wfs_version)
            .unwrap_or(FilterDialect::Fes20),
    }
}
