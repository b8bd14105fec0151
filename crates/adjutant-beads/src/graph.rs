use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: String,
}

/// Dependency graph returned by `bd graph --json`. Nodes are bead ids;
/// edges carry a `kind` (`"depends_on"` or `"parent"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeadGraph {
    pub nodes: Vec<String>,
    pub edges: Vec<GraphEdge>,
}

impl BeadGraph {
    pub fn dedup(mut self) -> Self {
        let mut seen_nodes = std::collections::HashSet::new();
        self.nodes.retain(|n| seen_nodes.insert(n.clone()));

        let mut seen_edges = std::collections::HashSet::new();
        self.edges
            .retain(|e| seen_edges.insert((e.from.clone(), e.to.clone(), e.kind.clone())));
        self
    }

    /// Direct children of `epic_id` via `"parent"` edges (child --parent--> epic).
    pub fn children_of(&self, epic_id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|e| e.kind == "parent" && e.to == epic_id)
            .map(|e| e.from.clone())
            .collect()
    }

    /// The epic(s) `bead_id` is a direct child of.
    pub fn parents_of(&self, bead_id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|e| e.kind == "parent" && e.from == bead_id)
            .map(|e| e.to.clone())
            .collect()
    }
}
