//! # Export type metadata
//!
//! Works out, per property key, which type an export header should declare.
//!
//! ```text
//! SubGraph ──collect_export_types──▶ PropertyTypeMap ──type_for(vocabulary)──▶ "long" | omit
//!     └─ sampling: SchemaDiscovery rows ──SamplingVocabulary──┘
//! ```
//!
//! The maps are rebuilt for every export and never cached.

pub mod types;
pub mod meta;
pub mod format;
pub mod discovery;
pub mod config;
pub mod header;
pub mod subgraph;

pub use types::{PropertyType, ScalarType, TypeCategory, TypeDescriptor, SamplingVocabulary};
pub use meta::{
    PropertyTypeMap, ExportTypes, update_key_types, collect_key_types, types_from_rows,
    collect_prop_types_for_nodes, collect_prop_types_for_relationships, collect_export_types,
};
pub use format::{
    ExportVocabulary, GRAPHML_ALLOWED, type_for, is_array, join_labels, labels_string, caption_for,
};
pub use discovery::{PropertyTypeRow, SchemaDiscovery, BackendSchemaDiscovery};
pub use config::{ExportConfig, SamplingConfig};
pub use header::{csv_header, graphml_keys, GraphMlKey, KeyTarget};
pub use subgraph::{SubGraph, GraphSnapshot};
