//! # neo4j-export-meta: property types for graph exports
//!
//! Works out which type each node and relationship property should be
//! declared with when a property graph is exported to CSV or GraphML.
//!
//! Property keys are not declared by any schema, so the same key may hold
//! different types on different entities. Collection settles on one type
//! per key, or marks the key ambiguous; formatting maps that type onto the
//! vocabulary of the target format.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neo4j_export_meta::export::{
//!     collect_export_types, csv_header, BackendSchemaDiscovery, ExportConfig,
//!     ExportVocabulary, GraphSnapshot,
//! };
//! use neo4j_export_meta::storage::MemoryBackend;
//!
//! # async fn example() -> neo4j_export_meta::Result<()> {
//! let backend = MemoryBackend::new();
//! let graph = GraphSnapshot::from_backend(&backend).await?;
//! let discovery = BackendSchemaDiscovery::new(&backend);
//!
//! let types = collect_export_types(&graph, &discovery, &ExportConfig::default()).await?;
//! for column in csv_header(&types.nodes, &ExportVocabulary::Unconstrained) {
//!     println!("{column}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Collection modes
//!
//! | Mode | Config | Source |
//! |------|--------|--------|
//! | Exhaustive | (default) | every entity of the `SubGraph` |
//! | Sampling | `sampling: true` | a `SchemaDiscovery` provider |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod storage;
pub mod tx;
pub mod export;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Node, Relationship, Value, PropertyMap, Entity,
    NodeId, RelId,
};

// ============================================================================
// Re-exports: Storage
// ============================================================================

pub use storage::{StorageBackend, ProcedureResult, MemoryBackend};

// ============================================================================
// Re-exports: Transactions
// ============================================================================

pub use tx::{Transaction, TxMode, TxId};

// ============================================================================
// Re-exports: Export metadata
// ============================================================================

pub use export::{
    ExportConfig, ExportTypes, ExportVocabulary, PropertyType, PropertyTypeMap,
    ScalarType, TypeDescriptor,
};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Transaction error: {0}")]
    TxError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Schema discovery error: {0}")]
    SchemaDiscovery(String),

    /// The sampling service reported a type name the engine cannot map back.
    #[error("Unknown sampled type {type_name:?} for property {property:?}")]
    VocabularyMismatch { property: String, type_name: String },

    #[error("Invalid type vocabulary: {0}")]
    InvalidVocabulary(String),
}

pub type Result<T> = std::result::Result<T, Error>;
