//! The set of entities an export covers.

use crate::model::{Node, Relationship};
use crate::storage::StorageBackend;
use crate::tx::TxMode;
use crate::Result;

/// Entity source for one export: the nodes and relationships to scan,
/// plus the label and relationship-type names they use.
pub trait SubGraph {
    fn nodes(&self) -> Box<dyn Iterator<Item = &Node> + '_>;

    fn relationships(&self) -> Box<dyn Iterator<Item = &Relationship> + '_>;

    /// Distinct labels carried by the nodes of this subgraph.
    fn labels_in_use(&self) -> Vec<String>;

    /// Distinct relationship types carried by the relationships of this subgraph.
    fn relationship_types_in_use(&self) -> Vec<String>;
}

/// An owned, point-in-time set of nodes and relationships.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, relationships: Vec<Relationship>) -> Self {
        Self { nodes, relationships }
    }

    /// Load the whole graph held by `backend` in one read-only transaction.
    pub async fn from_backend<B: StorageBackend>(backend: &B) -> Result<Self> {
        let tx = backend.begin_tx(TxMode::ReadOnly).await?;
        let nodes = backend.all_nodes(&tx).await?;
        let relationships = backend.all_relationships(&tx).await?;
        backend.commit_tx(tx).await?;

        tracing::debug!(
            nodes = nodes.len(),
            relationships = relationships.len(),
            "loaded graph snapshot"
        );
        Ok(Self { nodes, relationships })
    }
}

impl SubGraph for GraphSnapshot {
    fn nodes(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        Box::new(self.nodes.iter())
    }

    fn relationships(&self) -> Box<dyn Iterator<Item = &Relationship> + '_> {
        Box::new(self.relationships.iter())
    }

    fn labels_in_use(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.nodes.iter()
            .flat_map(|n| n.labels.iter().cloned())
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }

    fn relationship_types_in_use(&self) -> Vec<String> {
        let mut types: Vec<String> = self.relationships.iter()
            .map(|r| r.rel_type.clone())
            .collect();
        types.sort();
        types.dedup();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, RelId};

    #[test]
    fn test_names_in_use_are_distinct() {
        let a = Node::new(NodeId(1)).with_labels(["Person", "Employee"]);
        let b = Node::new(NodeId(2)).with_labels(["Person"]);
        let r1 = Relationship::new(RelId(1), NodeId(1), NodeId(2), "KNOWS");
        let r2 = Relationship::new(RelId(2), NodeId(2), NodeId(1), "KNOWS");
        let graph = GraphSnapshot::new(vec![a, b], vec![r1, r2]);

        assert_eq!(graph.labels_in_use(), vec!["Employee", "Person"]);
        assert_eq!(graph.relationship_types_in_use(), vec!["KNOWS"]);
        assert_eq!(graph.nodes().count(), 2);
    }
}
