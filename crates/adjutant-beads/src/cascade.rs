//! Auto-complete cascade: after closing a bead, walk the dependency graph
//! and close any epic ancestor whose direct children are all closed.
//!
//! Split out from the gateway so the traversal can be unit-tested against
//! synthetic graphs without spawning the `bd` CLI.

use std::collections::HashMap;

use adjutant_core::types::{BeadStatus, BeadType};

use crate::graph::BeadGraph;

/// A minimal view of a bead's cascade-relevant fields.
#[derive(Debug, Clone, Copy)]
pub struct CascadeNode {
    pub bead_type: BeadType,
    pub status: BeadStatus,
}

/// Given the dependency graph, a lookup of every bead's type/status, and
/// the id that was just closed, return the ids of every epic that should
/// now also be closed (in the order they should be closed, so closing one
/// can unlock its own parent in the same call).
pub fn epics_to_close(
    graph: &BeadGraph,
    beads: &HashMap<String, CascadeNode>,
    closed_id: &str,
) -> Vec<String> {
    let mut closed_now: HashMap<String, BeadStatus> = HashMap::new();
    let mut to_close = Vec::new();
    let mut frontier = vec![closed_id.to_string()];

    while let Some(current) = frontier.pop() {
        for epic_id in graph.parents_of(&current) {
            let Some(epic) = beads.get(&epic_id) else { continue };
            if epic.bead_type != BeadType::Epic || epic.status.is_closed() {
                continue;
            }
            if closed_now.contains_key(&epic_id) {
                continue;
            }

            let children = graph.children_of(&epic_id);
            if children.is_empty() {
                continue;
            }
            let all_closed = children.iter().all(|child_id| {
                if child_id == &current {
                    true
                } else if closed_now.contains_key(child_id) {
                    true
                } else {
                    beads.get(child_id).map(|c| c.status.is_closed()).unwrap_or(false)
                }
            });

            if all_closed {
                closed_now.insert(epic_id.clone(), BeadStatus::Closed);
                to_close.push(epic_id.clone());
                frontier.push(epic_id);
            }
        }
    }

    to_close
}
