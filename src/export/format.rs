//! Type-name formatting for export headers, plus label and caption rendering.
//!
//! | Vocabulary | Used by | Unknown types |
//! |------------|---------|---------------|
//! | `Unconstrained` | CSV (neo4j-admin import headers) | `"string"` |
//! | `Constrained(set)` | GraphML | `"string"`, numerics fall back to `"int"` |

use hashbrown::HashSet;

use crate::model::Node;

use super::types::{PropertyType, ScalarType, TypeCategory, TypeDescriptor};

/// Type names accepted by GraphML `attr.type`.
pub const GRAPHML_ALLOWED: [&str; 6] = ["boolean", "int", "long", "float", "double", "string"];

/// The type-name vocabulary of one export format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportVocabulary {
    Unconstrained,
    Constrained(HashSet<String>),
}

impl ExportVocabulary {
    pub fn graphml() -> Self {
        Self::constrained(GRAPHML_ALLOWED)
    }

    pub fn constrained<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Constrained(allowed.into_iter().map(Into::into).collect())
    }
}

/// Header type name for `descriptor`, or `None` when the property must be
/// written untyped.
///
/// Array-ness is not part of the name; ask [`is_array`] for it.
pub fn type_for(descriptor: &TypeDescriptor, vocabulary: &ExportVocabulary) -> Option<&'static str> {
    let PropertyType { scalar, .. } = descriptor.concrete()?;

    let allowed = match vocabulary {
        ExportVocabulary::Unconstrained => return Some(csv_type_name(scalar).unwrap_or("string")),
        ExportVocabulary::Constrained(allowed) => allowed,
    };

    let name = scalar.simple_name();
    let is_allowed = allowed.contains(name);
    match scalar.category() {
        TypeCategory::Null => None,
        TypeCategory::Integer | TypeCategory::Float => {
            Some(if name == "integer" || !is_allowed { "int" } else { name })
        }
        // everything else can be written as a string
        TypeCategory::Other => Some(if is_allowed { name } else { "string" }),
    }
}

/// Whether the inferred type is an array. Ambiguous keys are not.
pub fn is_array(descriptor: &TypeDescriptor) -> bool {
    descriptor.concrete().is_some_and(|t| t.array)
}

/// neo4j-admin import header types.
fn csv_type_name(scalar: ScalarType) -> Option<&'static str> {
    let name = match scalar {
        ScalarType::Boolean => "boolean",
        ScalarType::Byte => "byte",
        ScalarType::Short => "short",
        ScalarType::Integer => "int",
        ScalarType::Long => "long",
        ScalarType::Float => "float",
        ScalarType::Double => "double",
        ScalarType::Char => "char",
        ScalarType::Date => "date",
        ScalarType::Time => "time",
        ScalarType::LocalTime => "localtime",
        ScalarType::DateTime => "datetime",
        ScalarType::LocalDateTime => "localdatetime",
        ScalarType::Duration => "duration",
        ScalarType::Point => "point",
        ScalarType::String | ScalarType::Map | ScalarType::Object | ScalarType::Null => return None,
    };
    Some(name)
}

// ============================================================================
// Labels and captions
// ============================================================================

/// Join a node's labels with `delimiter`, in the node's own label order.
pub fn join_labels(node: &Node, delimiter: &str) -> String {
    node.labels.join(delimiter)
}

/// `":A:B"` for a node labelled A and B, `""` for an unlabelled node.
pub fn labels_string(node: &Node) -> String {
    if node.labels.is_empty() {
        return String::new();
    }
    let delimiter = ":";
    format!("{delimiter}{}", join_labels(node, delimiter))
}

/// Gephi caption: the first caption key the node carries, tried exactly
/// and then case-insensitively, else its labels, else its id.
pub fn caption_for(node: &Node, caption: &[String]) -> String {
    let exact = caption.iter().find_map(|key| node.get(key));
    let fuzzy = || {
        caption.iter().find_map(|key| {
            node.properties.iter()
                .filter(|(k, v)| k.eq_ignore_ascii_case(key) && !v.is_null())
                .map(|(_, v)| v)
                .next()
        })
    };

    match exact.filter(|v| !v.is_null()).or_else(fuzzy) {
        Some(value) => value.to_string(),
        None if !node.labels.is_empty() => labels_string(node),
        None => node.id.to_string(),
    }
}
