//! Schema-discovery providers for sampling-based type collection.
//!
//! A provider answers "which types do the properties of these labels (or
//! relationship types) hold?" with one row per property, each carrying the
//! candidate type names most-likely first. The collector only reads the
//! rows; where they come from is up to the provider.

use async_trait::async_trait;
use smallvec::SmallVec;

use crate::model::Value;
use crate::storage::memory::{NODE_TYPE_PROPERTIES, REL_TYPE_PROPERTIES};
use crate::storage::{ProcedureResult, StorageBackend};
use crate::tx::TxMode;
use crate::{Error, Result};

use super::config::SamplingConfig;

/// One property as reported by schema discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTypeRow {
    /// `None` for rows describing a label or type without properties.
    pub property_name: Option<String>,
    /// Candidate type names in the sampling vocabulary, most likely first.
    pub property_types: SmallVec<[String; 2]>,
}

impl PropertyTypeRow {
    pub fn new<I, S>(property_name: Option<&str>, property_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            property_name: property_name.map(str::to_owned),
            property_types: property_types.into_iter().map(Into::into).collect(),
        }
    }

    /// Read a row from a procedure result row (`propertyName`, `propertyTypes`).
    pub fn from_procedure_row(row: &std::collections::HashMap<String, Value>) -> Result<Self> {
        let property_name = match row.get("propertyName") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(Error::SchemaDiscovery(format!(
                    "propertyName must be STRING, got {}",
                    other.type_name()
                )));
            }
        };

        let property_types = match row.get("propertyTypes") {
            None | Some(Value::Null) => SmallVec::new(),
            Some(Value::List(items)) => items.iter()
                .map(|item| {
                    item.as_str().map(str::to_owned).ok_or_else(|| {
                        Error::SchemaDiscovery(format!(
                            "propertyTypes must hold STRING, got {}",
                            item.type_name()
                        ))
                    })
                })
                .collect::<Result<_>>()?,
            Some(other) => {
                return Err(Error::SchemaDiscovery(format!(
                    "propertyTypes must be LIST, got {}",
                    other.type_name()
                )));
            }
        };

        Ok(Self { property_name, property_types })
    }
}

/// Pluggable schema-sampling service.
///
/// Each call is one full round-trip: implementations return the complete
/// result set, never a partial stream.
#[async_trait]
pub trait SchemaDiscovery: Send + Sync {
    /// Property types of nodes, scoped by `includeLabels`.
    async fn node_type_properties(&self, conf: &SamplingConfig) -> Result<Vec<PropertyTypeRow>>;

    /// Property types of relationships, scoped by `includeRels`.
    async fn rel_type_properties(&self, conf: &SamplingConfig) -> Result<Vec<PropertyTypeRow>>;
}

/// Discovery through a backend's `apoc.meta.*TypeProperties` procedures.
pub struct BackendSchemaDiscovery<'a, B: StorageBackend> {
    backend: &'a B,
}

impl<'a, B: StorageBackend> BackendSchemaDiscovery<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    async fn call(&self, procedure: &str, conf: &SamplingConfig) -> Result<Vec<PropertyTypeRow>> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let result = self.backend.call_procedure(&tx, procedure, vec![conf.to_value()]).await;
        let result: ProcedureResult = match result {
            Ok(result) => {
                self.backend.commit_tx(tx).await?;
                result
            }
            Err(e) => {
                if let Err(rollback) = self.backend.rollback_tx(tx).await {
                    tracing::warn!(procedure, error = %rollback, "rollback after failed discovery");
                }
                return Err(e);
            }
        };

        tracing::debug!(procedure, rows = result.rows.len(), "schema discovery finished");
        result.rows.iter().map(PropertyTypeRow::from_procedure_row).collect()
    }
}

#[async_trait]
impl<'a, B: StorageBackend> SchemaDiscovery for BackendSchemaDiscovery<'a, B> {
    async fn node_type_properties(&self, conf: &SamplingConfig) -> Result<Vec<PropertyTypeRow>> {
        self.call(NODE_TYPE_PROPERTIES, conf).await
    }

    async fn rel_type_properties(&self, conf: &SamplingConfig) -> Result<Vec<PropertyTypeRow>> {
        self.call(REL_TYPE_PROPERTIES, conf).await
    }
}
