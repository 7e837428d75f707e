//! # Storage Backend Trait
//!
//! The contract between the export engine and any storage engine: enough
//! CRUD to populate a graph, full scans for exhaustive type collection,
//! and the procedure escape hatch used for sampling-based schema discovery.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | In-memory for testing/embedding |

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use crate::model::*;
use crate::tx::{Transaction, TxMode};
use crate::{Error, Result};

pub use memory::MemoryBackend;

// ============================================================================
// Procedure result
// ============================================================================

/// Result of a procedure call.
///
/// This lightweight type lives in the storage layer so that `call_procedure()`
/// can return structured rows without depending on any query engine.
#[derive(Debug, Clone, Default)]
pub struct ProcedureResult {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, Value>>,
}

// ============================================================================
// StorageBackend Trait
// ============================================================================

/// The universal storage contract.
///
/// Backends should return `Error::ExecutionError("not supported")` for
/// operations they can't handle rather than having a hundred optional methods.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// The transaction type for this backend.
    type Tx: Transaction;

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Begin a new transaction.
    async fn begin_tx(&self, mode: TxMode) -> Result<Self::Tx>;

    /// Commit a transaction.
    async fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    /// Roll back a transaction.
    async fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Node CRUD
    // ========================================================================

    /// Create a node with the given labels and properties.
    async fn create_node(
        &self,
        tx: &mut Self::Tx,
        labels: &[&str],
        props: PropertyMap,
    ) -> Result<NodeId>;

    /// Get a node by ID. Returns None if not found.
    async fn get_node(&self, tx: &Self::Tx, id: NodeId) -> Result<Option<Node>>;

    /// Set a property on a node (upsert). Setting `Value::Null` removes it.
    async fn set_node_property(
        &self,
        tx: &mut Self::Tx,
        id: NodeId,
        key: &str,
        val: Value,
    ) -> Result<()>;

    // ========================================================================
    // Relationship CRUD
    // ========================================================================

    /// Create a relationship between two nodes.
    async fn create_relationship(
        &self,
        tx: &mut Self::Tx,
        src: NodeId,
        dst: NodeId,
        rel_type: &str,
        props: PropertyMap,
    ) -> Result<RelId>;

    /// Get a relationship by ID.
    async fn get_relationship(&self, tx: &Self::Tx, id: RelId) -> Result<Option<Relationship>>;

    // ========================================================================
    // Schema introspection
    // ========================================================================

    /// All distinct labels currently carried by at least one node.
    async fn labels(&self, tx: &Self::Tx) -> Result<Vec<String>>;

    /// All distinct relationship types currently in use.
    async fn relationship_types(&self, tx: &Self::Tx) -> Result<Vec<String>>;

    // ========================================================================
    // Scan
    // ========================================================================

    /// Return all nodes (no label filter).
    async fn all_nodes(&self, tx: &Self::Tx) -> Result<Vec<Node>>;

    /// Return all relationships (no type filter).
    async fn all_relationships(&self, tx: &Self::Tx) -> Result<Vec<Relationship>>;

    /// Find all nodes with a given label.
    ///
    /// Default: filters `all_nodes`.
    async fn nodes_by_label(&self, tx: &Self::Tx, label: &str) -> Result<Vec<Node>> {
        let mut nodes = self.all_nodes(tx).await?;
        nodes.retain(|n| n.has_label(label));
        Ok(nodes)
    }

    /// Find all relationships of a given type.
    ///
    /// Default: filters `all_relationships`.
    async fn relationships_by_type(
        &self,
        tx: &Self::Tx,
        rel_type: &str,
    ) -> Result<Vec<Relationship>> {
        let mut rels = self.all_relationships(tx).await?;
        rels.retain(|r| r.rel_type == rel_type);
        Ok(rels)
    }

    // ========================================================================
    // Escape hatch
    // ========================================================================

    /// Call a registered procedure. Neo4j: `CALL name(args) YIELD cols`.
    ///
    /// Schema sampling (`apoc.meta.nodeTypeProperties`,
    /// `apoc.meta.relTypeProperties`) goes through here.
    async fn call_procedure(
        &self,
        _tx: &Self::Tx,
        name: &str,
        _args: Vec<Value>,
    ) -> Result<ProcedureResult> {
        Err(Error::ExecutionError(format!("procedure {name} not supported")))
    }
}
