//! Property-type collection for export headers.
//!
//! Nodes and relationships are collected in two independent passes, each
//! into its own [`PropertyTypeMap`]. A pass either scans every entity
//! (exhaustive) or asks a [`SchemaDiscovery`] provider (sampling), as
//! selected by [`ExportConfig::sampling`].

use hashbrown::HashMap;
use hashbrown::hash_map::{Entry, EntryRef};

use crate::model::{Entity, Value};
use crate::{Error, Result};

use super::config::{ExportConfig, SamplingConfig};
use super::discovery::{PropertyTypeRow, SchemaDiscovery};
use super::subgraph::SubGraph;
use super::types::{PropertyType, SamplingVocabulary, TypeDescriptor};

/// Property key → inferred type, for one entity class of one export.
pub type PropertyTypeMap = HashMap<String, TypeDescriptor>;

/// Both maps an export needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTypes {
    pub nodes: PropertyTypeMap,
    pub relationships: PropertyTypeMap,
}

/// Fold the properties of one entity into `key_types`.
///
/// Keys already ambiguous are skipped without inspecting the value. Null
/// values count as absent.
pub fn update_key_types<E: Entity + ?Sized>(key_types: &mut PropertyTypeMap, entity: &E) {
    for key in entity.property_keys() {
        let Some(value) = entity.property(key) else { continue };
        if value.is_null() {
            continue;
        }
        match key_types.entry_ref(key) {
            EntryRef::Vacant(slot) => {
                slot.insert(TypeDescriptor::Concrete(PropertyType::of(value)));
            }
            EntryRef::Occupied(mut slot) => {
                let current = *slot.get();
                if current.is_ambiguous() {
                    continue;
                }
                let next = current.merge(PropertyType::of(value));
                if next.is_ambiguous() {
                    tracing::debug!(key, was = ?current, "property type collapsed to ambiguous");
                }
                slot.insert(next);
            }
        }
    }
}

/// Exhaustive collection over any sequence of entities.
pub fn collect_key_types<'e, E, I>(entities: I) -> PropertyTypeMap
where
    E: Entity + 'e,
    I: IntoIterator<Item = &'e E>,
{
    let mut key_types = PropertyTypeMap::new();
    for entity in entities {
        update_key_types(&mut key_types, entity);
    }
    key_types
}

/// Collect the property types of every node in `graph`.
///
/// With sampling enabled, `includeLabels` defaults to the labels in use
/// by `graph` and the rows of `discovery` replace the scan.
pub async fn collect_prop_types_for_nodes<G, D>(
    graph: &G,
    discovery: &D,
    config: &ExportConfig,
) -> Result<PropertyTypeMap>
where
    G: SubGraph + ?Sized,
    D: SchemaDiscovery + ?Sized,
{
    if !config.sampling {
        let key_types = collect_key_types(graph.nodes());
        tracing::debug!(keys = key_types.len(), "collected node property types");
        return Ok(key_types);
    }

    let mut conf = config.sampling_config.clone();
    inject_scope(&mut conf, "includeLabels", || graph.labels_in_use());
    let rows = discovery.node_type_properties(&conf).await?;
    let key_types = types_from_rows(rows, SamplingVocabulary::standard())?;
    tracing::debug!(keys = key_types.len(), "sampled node property types");
    Ok(key_types)
}

/// Collect the property types of every relationship in `graph`.
///
/// With sampling enabled, `includeRels` defaults to the relationship
/// types in use by `graph`.
pub async fn collect_prop_types_for_relationships<G, D>(
    graph: &G,
    discovery: &D,
    config: &ExportConfig,
) -> Result<PropertyTypeMap>
where
    G: SubGraph + ?Sized,
    D: SchemaDiscovery + ?Sized,
{
    if !config.sampling {
        let key_types = collect_key_types(graph.relationships());
        tracing::debug!(keys = key_types.len(), "collected relationship property types");
        return Ok(key_types);
    }

    let mut conf = config.sampling_config.clone();
    inject_scope(&mut conf, "includeRels", || graph.relationship_types_in_use());
    let rows = discovery.rel_type_properties(&conf).await?;
    let key_types = types_from_rows(rows, SamplingVocabulary::standard())?;
    tracing::debug!(keys = key_types.len(), "sampled relationship property types");
    Ok(key_types)
}

/// Run the node pass, then the relationship pass.
pub async fn collect_export_types<G, D>(
    graph: &G,
    discovery: &D,
    config: &ExportConfig,
) -> Result<ExportTypes>
where
    G: SubGraph + ?Sized,
    D: SchemaDiscovery + ?Sized,
{
    let nodes = collect_prop_types_for_nodes(graph, discovery, config).await?;
    let relationships = collect_prop_types_for_relationships(graph, discovery, config).await?;
    Ok(ExportTypes { nodes, relationships })
}

fn inject_scope(conf: &mut SamplingConfig, key: &str, names: impl FnOnce() -> Vec<String>) {
    let injected = conf.put_if_absent(key, || {
        Value::List(names().into_iter().map(Value::String).collect())
    });
    if injected {
        tracing::debug!(key, "scoped sampling to names in use");
    }
}

/// Translate discovery rows into a type map.
///
/// Rows without a property name are dropped. Only the first candidate of
/// each row is used. The same name reported twice (e.g. by two labels)
/// follows the exhaustive collapse rule.
pub fn types_from_rows<I>(rows: I, vocabulary: &SamplingVocabulary) -> Result<PropertyTypeMap>
where
    I: IntoIterator<Item = PropertyTypeRow>,
{
    let mut key_types = PropertyTypeMap::new();

    for row in rows {
        let Some(name) = row.property_name else { continue };
        let Some(first) = row.property_types.first() else {
            return Err(Error::SchemaDiscovery(format!(
                "no candidate types reported for property {name}"
            )));
        };
        let Some(observed) = vocabulary.engine_type(first) else {
            tracing::error!(property = %name, type_name = %first, "unknown sampling type name");
            return Err(Error::VocabularyMismatch {
                property: name,
                type_name: first.clone(),
            });
        };

        match key_types.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(TypeDescriptor::Concrete(observed));
            }
            Entry::Occupied(mut slot) => {
                let next = slot.get().merge(observed);
                slot.insert(next);
            }
        }
    }

    Ok(key_types)
}
