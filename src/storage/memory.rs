//! In-memory storage backend.
//!
//! This is the reference implementation of `StorageBackend`.
//! It uses simple HashMaps protected by RwLock.
//!
//! ## Limitations
//!
//! - **No real transactions**: `commit_tx()` and `rollback_tx()` are no-ops.
//!   Writes are applied immediately. Rollback does NOT undo mutations.
//! - **Single-writer only**: Per-collection locks mean multi-step mutations
//!   are NOT atomic. Safe for single-threaded or read-heavy use only.
//!
//! ## Procedures
//!
//! The backend serves the two schema-sampling procedures the export engine
//! delegates to when sampling is enabled:
//!
//! | Procedure | Config keys |
//! |-----------|-------------|
//! | `apoc.meta.nodeTypeProperties` | `includeLabels`, `sample` |
//! | `apoc.meta.relTypeProperties` | `includeRels`, `sample` |
//!
//! Each yields one row per (label or type, property) with the candidate
//! type names ordered by how often they were observed.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::RwLock;
use async_trait::async_trait;

use crate::export::types::{PropertyType, SamplingVocabulary};
use crate::model::*;
use crate::tx::{Transaction, TxMode, TxId};
use crate::{Error, Result};
use super::{ProcedureResult, StorageBackend};

pub const NODE_TYPE_PROPERTIES: &str = "apoc.meta.nodeTypeProperties";
pub const REL_TYPE_PROPERTIES: &str = "apoc.meta.relTypeProperties";

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory property graph storage.
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    nodes: RwLock<HashMap<NodeId, Node>>,
    relationships: RwLock<HashMap<RelId, Relationship>>,
    /// label → node IDs in creation order (poor man's label index)
    label_index: RwLock<HashMap<String, Vec<NodeId>>>,
    next_node_id: AtomicU64,
    next_rel_id: AtomicU64,
    next_tx_id: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                nodes: RwLock::new(HashMap::new()),
                relationships: RwLock::new(HashMap::new()),
                label_index: RwLock::new(HashMap::new()),
                next_node_id: AtomicU64::new(1),
                next_rel_id: AtomicU64::new(1),
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

/// In-memory transaction (currently just a marker, no real MVCC).
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode { self.mode }
    fn id(&self) -> TxId { self.id }
}

// ============================================================================
// StorageBackend impl
// ============================================================================

#[async_trait]
impl StorageBackend for MemoryBackend {
    type Tx = MemoryTx;

    async fn begin_tx(&self, mode: TxMode) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(MemoryTx { id, mode })
    }

    /// No-op: memory backend applies writes immediately, not on commit.
    async fn commit_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    /// WARNING: No-op. Memory backend has no write-ahead log.
    /// Mutations applied during this transaction are NOT reverted.
    async fn rollback_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    // ========================================================================
    // Node CRUD
    // ========================================================================

    async fn create_node(
        &self,
        tx: &mut MemoryTx,
        labels: &[&str],
        mut props: PropertyMap,
    ) -> Result<NodeId> {
        ensure_writable(tx)?;
        // Neo4j never stores null properties
        props.retain(|_, v| !v.is_null());

        let id = NodeId(self.inner.next_node_id.fetch_add(1, Ordering::Relaxed));
        let mut node = Node::new(id);
        for label in labels {
            if !node.has_label(label) {
                node.labels.push(label.to_string());
            }
        }
        node.properties = props;

        {
            let mut idx = self.inner.label_index.write();
            for label in &node.labels {
                idx.entry(label.clone()).or_default().push(id);
            }
        }

        self.inner.nodes.write().insert(id, node);
        Ok(id)
    }

    async fn get_node(&self, _tx: &MemoryTx, id: NodeId) -> Result<Option<Node>> {
        Ok(self.inner.nodes.read().get(&id).cloned())
    }

    async fn set_node_property(
        &self,
        tx: &mut MemoryTx,
        id: NodeId,
        key: &str,
        val: Value,
    ) -> Result<()> {
        ensure_writable(tx)?;
        let mut nodes = self.inner.nodes.write();
        let node = nodes.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
        if val.is_null() {
            node.properties.remove(key);
        } else {
            node.properties.insert(key.to_string(), val);
        }
        Ok(())
    }

    // ========================================================================
    // Relationship CRUD
    // ========================================================================

    async fn create_relationship(
        &self,
        tx: &mut MemoryTx,
        src: NodeId,
        dst: NodeId,
        rel_type: &str,
        mut props: PropertyMap,
    ) -> Result<RelId> {
        ensure_writable(tx)?;
        {
            let nodes = self.inner.nodes.read();
            if !nodes.contains_key(&src) {
                return Err(Error::NotFound(format!("Source node {src}")));
            }
            if !nodes.contains_key(&dst) {
                return Err(Error::NotFound(format!("Target node {dst}")));
            }
        }
        props.retain(|_, v| !v.is_null());

        let id = RelId(self.inner.next_rel_id.fetch_add(1, Ordering::Relaxed));
        let mut rel = Relationship::new(id, src, dst, rel_type);
        rel.properties = props;

        self.inner.relationships.write().insert(id, rel);
        Ok(id)
    }

    async fn get_relationship(&self, _tx: &MemoryTx, id: RelId) -> Result<Option<Relationship>> {
        Ok(self.inner.relationships.read().get(&id).cloned())
    }

    // ========================================================================
    // Schema introspection
    // ========================================================================

    async fn labels(&self, _tx: &MemoryTx) -> Result<Vec<String>> {
        let idx = self.inner.label_index.read();
        let mut labels: Vec<String> = idx.iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(label, _)| label.clone())
            .collect();
        labels.sort();
        Ok(labels)
    }

    async fn relationship_types(&self, _tx: &MemoryTx) -> Result<Vec<String>> {
        let rels = self.inner.relationships.read();
        let mut types: Vec<String> = rels.values().map(|r| r.rel_type.clone()).collect();
        types.sort();
        types.dedup();
        Ok(types)
    }

    // ========================================================================
    // Scan
    // ========================================================================

    /// Nodes in id order.
    async fn all_nodes(&self, _tx: &MemoryTx) -> Result<Vec<Node>> {
        let mut nodes: Vec<Node> = self.inner.nodes.read().values().cloned().collect();
        nodes.sort_by_key(|n| n.id.0);
        Ok(nodes)
    }

    /// Relationships in id order.
    async fn all_relationships(&self, _tx: &MemoryTx) -> Result<Vec<Relationship>> {
        let mut rels: Vec<Relationship> =
            self.inner.relationships.read().values().cloned().collect();
        rels.sort_by_key(|r| r.id.0);
        Ok(rels)
    }

    async fn nodes_by_label(&self, _tx: &MemoryTx, label: &str) -> Result<Vec<Node>> {
        let idx = self.inner.label_index.read();
        let nodes = self.inner.nodes.read();

        let ids = idx.get(label).cloned().unwrap_or_default();
        Ok(ids.iter().filter_map(|id| nodes.get(id).cloned()).collect())
    }

    // ========================================================================
    // Procedures
    // ========================================================================

    async fn call_procedure(
        &self,
        tx: &MemoryTx,
        name: &str,
        args: Vec<Value>,
    ) -> Result<ProcedureResult> {
        match name {
            NODE_TYPE_PROPERTIES => {
                let conf = procedure_config(args)?;
                let sample = sample_limit(&conf)?;
                let labels = match string_list(&conf, "includeLabels")? {
                    Some(labels) if !labels.is_empty() => labels,
                    _ => self.labels(tx).await?,
                };
                let mut rows = Vec::new();
                for label in labels {
                    let nodes = self.nodes_by_label(tx, &label).await?;
                    if nodes.is_empty() {
                        continue;
                    }
                    let sampled = &nodes[..sample.unwrap_or(nodes.len()).min(nodes.len())];
                    for summary in summarize(sampled)? {
                        let mut row = summary.into_row();
                        row.insert("nodeType".into(), Value::from(format!(":`{label}`")));
                        row.insert("nodeLabels".into(), Value::from(vec![label.clone()]));
                        rows.push(row);
                    }
                }
                Ok(ProcedureResult {
                    columns: vec![
                        "nodeType".into(), "nodeLabels".into(), "propertyName".into(),
                        "propertyTypes".into(), "mandatory".into(),
                    ],
                    rows,
                })
            }
            REL_TYPE_PROPERTIES => {
                let conf = procedure_config(args)?;
                let sample = sample_limit(&conf)?;
                let types = match string_list(&conf, "includeRels")? {
                    Some(types) if !types.is_empty() => types,
                    _ => self.relationship_types(tx).await?,
                };
                let mut rows = Vec::new();
                for rel_type in types {
                    let rels = self.relationships_by_type(tx, &rel_type).await?;
                    if rels.is_empty() {
                        continue;
                    }
                    let sampled = &rels[..sample.unwrap_or(rels.len()).min(rels.len())];
                    for summary in summarize(sampled)? {
                        let mut row = summary.into_row();
                        row.insert("relType".into(), Value::from(format!(":`{rel_type}`")));
                        rows.push(row);
                    }
                }
                Ok(ProcedureResult {
                    columns: vec![
                        "relType".into(), "propertyName".into(),
                        "propertyTypes".into(), "mandatory".into(),
                    ],
                    rows,
                })
            }
            _ => Err(Error::ExecutionError(format!("procedure {name} not supported"))),
        }
    }
}

// ============================================================================
// Sampling helpers
// ============================================================================

fn ensure_writable(tx: &MemoryTx) -> Result<()> {
    if tx.is_read_only() {
        return Err(Error::TxError(format!("transaction {} is read-only", tx.id().0)));
    }
    Ok(())
}

/// Pull out the single config-map argument of a sampling procedure.
fn procedure_config(args: Vec<Value>) -> Result<HashMap<String, Value>> {
    match args.into_iter().next() {
        None | Some(Value::Null) => Ok(HashMap::new()),
        Some(Value::Map(conf)) => Ok(conf),
        Some(other) => Err(Error::TypeError {
            expected: "MAP".into(),
            got: other.type_name().into(),
        }),
    }
}

fn sample_limit(conf: &HashMap<String, Value>) -> Result<Option<usize>> {
    match conf.get("sample") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Int(n)) if *n > 0 => Ok(Some(*n as usize)),
        // non-positive means "scan everything"
        Some(Value::Int(_)) => Ok(None),
        Some(other) => Err(Error::TypeError {
            expected: "INTEGER".into(),
            got: other.type_name().into(),
        }),
    }
}

fn string_list(conf: &HashMap<String, Value>, key: &str) -> Result<Option<Vec<String>>> {
    match conf.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::List(items)) => items.iter()
            .map(|item| item.as_str().map(str::to_owned).ok_or_else(|| Error::TypeError {
                expected: "STRING".into(),
                got: item.type_name().into(),
            }))
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(other) => Err(Error::TypeError {
            expected: "LIST OF STRING".into(),
            got: other.type_name().into(),
        }),
    }
}

/// Observed type names for one property key within one label or type.
struct PropertySummary {
    name: Option<String>,
    types: Vec<String>,
    mandatory: bool,
}

impl PropertySummary {
    fn into_row(self) -> HashMap<String, Value> {
        let mut row = HashMap::new();
        row.insert("propertyName".into(), Value::from(self.name));
        row.insert(
            "propertyTypes".into(),
            Value::List(self.types.into_iter().map(Value::String).collect()),
        );
        row.insert("mandatory".into(), Value::Bool(self.mandatory));
        row
    }
}

/// Summarize the property types seen across `entities`, keyed by property
/// name in sorted order. A group without any property yields a single
/// summary with no name, like the real procedures do.
fn summarize<E: Entity>(entities: &[E]) -> Result<Vec<PropertySummary>> {
    let vocabulary = SamplingVocabulary::standard();
    let mut seen: BTreeMap<String, HashMap<&'static str, usize>> = BTreeMap::new();

    for entity in entities {
        for key in entity.property_keys() {
            let Some(value) = entity.property(key).filter(|v| !v.is_null()) else {
                continue;
            };
            let observed = PropertyType::of(value);
            let name = vocabulary.service_name(&observed).ok_or_else(|| {
                Error::ExecutionError(format!("no sampling type name for {observed}"))
            })?;
            *seen.entry(key.to_owned()).or_default().entry(name).or_default() += 1;
        }
    }

    if seen.is_empty() {
        return Ok(vec![PropertySummary { name: None, types: Vec::new(), mandatory: false }]);
    }

    Ok(seen.into_iter()
        .map(|(name, counts)| {
            let total: usize = counts.values().sum();
            let mut ranked: Vec<(&'static str, usize)> = counts.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            PropertySummary {
                name: Some(name),
                types: ranked.into_iter().map(|(t, _)| t.to_owned()).collect(),
                mandatory: total == entities.len(),
            }
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: Vec<(&str, Value)>) -> PropertyMap {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn conf(pairs: Vec<(&str, Value)>) -> Vec<Value> {
        vec![Value::Map(props(pairs))]
    }

    #[tokio::test]
    async fn test_create_and_get_node() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let id = db.create_node(&mut tx, &["Person"], props(vec![("name", Value::from("Ada"))]))
            .await.unwrap();
        let node = db.get_node(&tx, id).await.unwrap().unwrap();

        assert_eq!(node.labels, vec!["Person"]);
        assert_eq!(node.get("name"), Some(&Value::from("Ada")));
    }

    #[tokio::test]
    async fn test_null_property_is_not_stored() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let id = db.create_node(&mut tx, &[], props(vec![
            ("name", Value::from("Ada")),
            ("nickname", Value::Null),
        ])).await.unwrap();
        db.set_node_property(&mut tx, id, "name", Value::Null).await.unwrap();

        let node = db.get_node(&tx, id).await.unwrap().unwrap();
        assert!(node.properties.is_empty());
    }

    #[tokio::test]
    async fn test_read_only_tx_rejects_writes() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();
        let result = db.create_node(&mut tx, &["Person"], PropertyMap::new()).await;
        assert!(matches!(result, Err(Error::TxError(_))));
    }

    #[tokio::test]
    async fn test_create_relationship_requires_endpoints() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let a = db.create_node(&mut tx, &["Person"], PropertyMap::new()).await.unwrap();
        let b = db.create_node(&mut tx, &["Person"], PropertyMap::new()).await.unwrap();

        let rel_id = db.create_relationship(&mut tx, a, b, "KNOWS", PropertyMap::new()).await.unwrap();
        let rel = db.get_relationship(&tx, rel_id).await.unwrap().unwrap();
        assert_eq!((rel.src, rel.dst, rel.rel_type.as_str()), (a, b, "KNOWS"));

        let missing = db.create_relationship(&mut tx, a, NodeId(99), "KNOWS", PropertyMap::new()).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_labels_and_types_in_use() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let a = db.create_node(&mut tx, &["Person", "Employee"], PropertyMap::new()).await.unwrap();
        let b = db.create_node(&mut tx, &["Company"], PropertyMap::new()).await.unwrap();
        db.create_relationship(&mut tx, a, b, "WORKS_AT", PropertyMap::new()).await.unwrap();
        db.create_relationship(&mut tx, a, a, "KNOWS", PropertyMap::new()).await.unwrap();

        assert_eq!(db.labels(&tx).await.unwrap(), vec!["Company", "Employee", "Person"]);
        assert_eq!(db.relationship_types(&tx).await.unwrap(), vec!["KNOWS", "WORKS_AT"]);
        assert_eq!(db.relationships_by_type(&tx, "KNOWS").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_node_type_properties_ranks_candidates() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        db.create_node(&mut tx, &["Person"], props(vec![("age", Value::Int(30))])).await.unwrap();
        db.create_node(&mut tx, &["Person"], props(vec![("age", Value::Int(31))])).await.unwrap();
        db.create_node(&mut tx, &["Person"], props(vec![("age", Value::from("old"))])).await.unwrap();

        let result = db.call_procedure(&tx, NODE_TYPE_PROPERTIES, vec![]).await.unwrap();
        assert_eq!(result.rows.len(), 1);
        let row = &result.rows[0];
        assert_eq!(row["propertyName"], Value::from("age"));
        assert_eq!(row["propertyTypes"], Value::from(vec!["Long", "String"]));
        assert_eq!(row["mandatory"], Value::Bool(true));
        assert_eq!(row["nodeLabels"], Value::from(vec!["Person"]));
    }

    #[tokio::test]
    async fn test_node_type_properties_respects_scope_and_sample() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        db.create_node(&mut tx, &["Person"], props(vec![("age", Value::Int(30))])).await.unwrap();
        db.create_node(&mut tx, &["Person"], props(vec![("age", Value::Float(30.5))])).await.unwrap();
        db.create_node(&mut tx, &["Company"], props(vec![("name", Value::from("Acme"))])).await.unwrap();

        let result = db.call_procedure(&tx, NODE_TYPE_PROPERTIES, conf(vec![
            ("includeLabels", Value::from(vec!["Person"])),
            ("sample", Value::Int(1)),
        ])).await.unwrap();

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["propertyTypes"], Value::from(vec!["Long"]));
    }

    #[tokio::test]
    async fn test_label_without_properties_yields_nameless_row() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
        db.create_node(&mut tx, &["Marker"], PropertyMap::new()).await.unwrap();

        let result = db.call_procedure(&tx, NODE_TYPE_PROPERTIES, vec![]).await.unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["propertyName"], Value::Null);
    }

    #[tokio::test]
    async fn test_rel_type_properties() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();

        let a = db.create_node(&mut tx, &["Person"], PropertyMap::new()).await.unwrap();
        let b = db.create_node(&mut tx, &["Person"], PropertyMap::new()).await.unwrap();
        db.create_relationship(&mut tx, a, b, "KNOWS", props(vec![
            ("since", Value::Int(2020)),
            ("tags", Value::from(vec!["work", "school"])),
        ])).await.unwrap();
        db.create_relationship(&mut tx, b, a, "KNOWS", props(vec![("since", Value::Int(2021))]))
            .await.unwrap();

        let result = db.call_procedure(&tx, REL_TYPE_PROPERTIES, conf(vec![
            ("includeRels", Value::from(vec!["KNOWS"])),
        ])).await.unwrap();

        assert_eq!(result.rows.len(), 2);
        let since = &result.rows[0];
        assert_eq!(since["propertyName"], Value::from("since"));
        assert_eq!(since["mandatory"], Value::Bool(true));
        let tags = &result.rows[1];
        assert_eq!(tags["propertyTypes"], Value::from(vec!["StringArray"]));
        assert_eq!(tags["mandatory"], Value::Bool(false));
    }

    #[tokio::test]
    async fn test_unknown_procedure_and_bad_config() {
        let db = MemoryBackend::new();
        let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();

        let unknown = db.call_procedure(&tx, "apoc.help", vec![]).await;
        assert!(matches!(unknown, Err(Error::ExecutionError(_))));

        let bad = db.call_procedure(&tx, NODE_TYPE_PROPERTIES, vec![Value::Int(1)]).await;
        assert!(matches!(bad, Err(Error::TypeError { .. })));

        let bad_labels = db.call_procedure(&tx, NODE_TYPE_PROPERTIES, conf(vec![
            ("includeLabels", Value::from("Person")),
        ])).await;
        assert!(matches!(bad_labels, Err(Error::TypeError { .. })));
    }
}
