//! Internal property-type vocabulary and its mapping onto the type names
//! spoken by the schema-sampling procedures.
//!
//! ```text
//! Value ──PropertyType::of──▶ PropertyType ◀──SamplingVocabulary──▶ "Long", "StringArray", ...
//! ```

use std::fmt;
use std::sync::LazyLock;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::model::Value;
use crate::{Error, Result};

// ============================================================================
// ScalarType
// ============================================================================

/// Element type of a property value. Arrays are expressed by
/// [`PropertyType::array`], never by a distinct scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScalarType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Char,
    String,
    Date,
    Time,
    LocalTime,
    DateTime,
    LocalDateTime,
    Duration,
    Point,
    Map,
    /// Element type of lists that are empty, mixed, or nested.
    Object,
    Null,
}

/// Coarse classification used by constrained formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Null,
    Integer,
    Float,
    Other,
}

impl ScalarType {
    pub const ALL: [ScalarType; 19] = [
        ScalarType::Boolean,
        ScalarType::Byte,
        ScalarType::Short,
        ScalarType::Integer,
        ScalarType::Long,
        ScalarType::Float,
        ScalarType::Double,
        ScalarType::Char,
        ScalarType::String,
        ScalarType::Date,
        ScalarType::Time,
        ScalarType::LocalTime,
        ScalarType::DateTime,
        ScalarType::LocalDateTime,
        ScalarType::Duration,
        ScalarType::Point,
        ScalarType::Map,
        ScalarType::Object,
        ScalarType::Null,
    ];

    /// Lowercase simple name, e.g. `"integer"`, `"localdatetime"`.
    pub fn simple_name(self) -> &'static str {
        match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Byte => "byte",
            ScalarType::Short => "short",
            ScalarType::Integer => "integer",
            ScalarType::Long => "long",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
            ScalarType::Char => "char",
            ScalarType::String => "string",
            ScalarType::Date => "date",
            ScalarType::Time => "time",
            ScalarType::LocalTime => "localtime",
            ScalarType::DateTime => "datetime",
            ScalarType::LocalDateTime => "localdatetime",
            ScalarType::Duration => "duration",
            ScalarType::Point => "point",
            ScalarType::Map => "map",
            ScalarType::Object => "object",
            ScalarType::Null => "null",
        }
    }

    pub fn category(self) -> TypeCategory {
        match self {
            ScalarType::Null => TypeCategory::Null,
            ScalarType::Byte | ScalarType::Short | ScalarType::Integer | ScalarType::Long => {
                TypeCategory::Integer
            }
            ScalarType::Float | ScalarType::Double => TypeCategory::Float,
            _ => TypeCategory::Other,
        }
    }

    /// Scalar type of a non-list value.
    fn of_scalar(value: &Value) -> ScalarType {
        match value {
            Value::Null => ScalarType::Null,
            Value::Bool(_) => ScalarType::Boolean,
            Value::Int(_) => ScalarType::Long,
            Value::Float(_) => ScalarType::Double,
            Value::String(_) => ScalarType::String,
            Value::Date(_) => ScalarType::Date,
            Value::Time { .. } => ScalarType::Time,
            Value::LocalTime(_) => ScalarType::LocalTime,
            Value::DateTime(_) => ScalarType::DateTime,
            Value::LocalDateTime(_) => ScalarType::LocalDateTime,
            Value::Duration(_) => ScalarType::Duration,
            Value::Point2D { .. } | Value::Point3D { .. } => ScalarType::Point,
            Value::Map(_) | Value::Node(_) | Value::Relationship(_) => ScalarType::Map,
            Value::Bytes(_) => ScalarType::Byte,
            Value::List(_) => ScalarType::Object,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.simple_name())
    }
}

// ============================================================================
// PropertyType
// ============================================================================

/// Concrete runtime type of one property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyType {
    pub scalar: ScalarType,
    pub array: bool,
}

impl PropertyType {
    pub const fn scalar(scalar: ScalarType) -> Self {
        Self { scalar, array: false }
    }

    pub const fn array_of(scalar: ScalarType) -> Self {
        Self { scalar, array: true }
    }

    /// Observe the runtime type of a value.
    ///
    /// `Int` is a long and `Float` a double. Byte strings are byte arrays.
    /// A list whose elements all share one scalar type is an array of it;
    /// anything else is an array of `Object`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bytes(_) => Self::array_of(ScalarType::Byte),
            Value::List(items) => {
                let mut element = None;
                for item in items {
                    if matches!(item, Value::List(_) | Value::Bytes(_) | Value::Null) {
                        return Self::array_of(ScalarType::Object);
                    }
                    let scalar = ScalarType::of_scalar(item);
                    match element {
                        None => element = Some(scalar),
                        Some(seen) if seen == scalar => {}
                        Some(_) => return Self::array_of(ScalarType::Object),
                    }
                }
                Self::array_of(element.unwrap_or(ScalarType::Object))
            }
            other => Self::scalar(ScalarType::of_scalar(other)),
        }
    }

    /// Engine-side type name: the simple name, suffixed `[]` for arrays.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.array {
            write!(f, "{}[]", self.scalar)
        } else {
            write!(f, "{}", self.scalar)
        }
    }
}

// ============================================================================
// TypeDescriptor
// ============================================================================

/// Inferred type of a property key across every observed instance.
///
/// A key with no observation has no descriptor at all; the first
/// observation yields `Concrete`, and any disagreement collapses to
/// `Ambiguous`, which is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDescriptor {
    Concrete(PropertyType),
    Ambiguous,
}

impl TypeDescriptor {
    /// Fold one more observation into this descriptor.
    pub fn merge(self, observed: PropertyType) -> Self {
        match self {
            TypeDescriptor::Concrete(current) if current == observed => self,
            _ => TypeDescriptor::Ambiguous,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, TypeDescriptor::Ambiguous)
    }

    pub fn concrete(&self) -> Option<PropertyType> {
        match self {
            TypeDescriptor::Concrete(t) => Some(*t),
            TypeDescriptor::Ambiguous => None,
        }
    }
}

impl From<PropertyType> for TypeDescriptor {
    fn from(t: PropertyType) -> Self {
        TypeDescriptor::Concrete(t)
    }
}

// ============================================================================
// SamplingVocabulary
// ============================================================================

/// Bijection between engine property types and the type names reported by
/// the schema-sampling procedures.
#[derive(Debug, Clone)]
pub struct SamplingVocabulary {
    to_service: HashMap<PropertyType, &'static str>,
    from_service: HashMap<&'static str, PropertyType>,
}

static STANDARD: LazyLock<SamplingVocabulary> = LazyLock::new(|| {
    SamplingVocabulary::new(standard_pairs())
        .unwrap_or_else(|e| panic!("built-in sampling vocabulary: {e}"))
});

impl SamplingVocabulary {
    /// Build a vocabulary, rejecting any pair that would break invertibility.
    pub fn new<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (PropertyType, &'static str)>,
    {
        let mut to_service = HashMap::new();
        let mut from_service = HashMap::new();
        for (engine, service) in pairs {
            if let Some(prev) = to_service.insert(engine, service) {
                return Err(Error::InvalidVocabulary(format!(
                    "{engine} maps to both {prev} and {service}"
                )));
            }
            if let Some(prev) = from_service.insert(service, engine) {
                return Err(Error::InvalidVocabulary(format!(
                    "{service} maps back to both {prev} and {engine}"
                )));
            }
        }
        Ok(Self { to_service, from_service })
    }

    /// The process-wide table shared with the built-in sampling procedures.
    pub fn standard() -> &'static SamplingVocabulary {
        &STANDARD
    }

    pub fn service_name(&self, engine: &PropertyType) -> Option<&'static str> {
        self.to_service.get(engine).copied()
    }

    pub fn engine_type(&self, service_name: &str) -> Option<PropertyType> {
        self.from_service.get(service_name).copied()
    }

    pub fn len(&self) -> usize {
        self.to_service.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_service.is_empty()
    }
}

fn standard_pairs() -> Vec<(PropertyType, &'static str)> {
    ScalarType::ALL
        .iter()
        .flat_map(|&scalar| {
            let (single, array) = service_names(scalar);
            [
                (PropertyType::scalar(scalar), single),
                (PropertyType::array_of(scalar), array),
            ]
        })
        .collect()
}

fn service_names(scalar: ScalarType) -> (&'static str, &'static str) {
    match scalar {
        ScalarType::Boolean => ("Boolean", "BooleanArray"),
        ScalarType::Byte => ("Byte", "ByteArray"),
        ScalarType::Short => ("Short", "ShortArray"),
        ScalarType::Integer => ("Integer", "IntegerArray"),
        ScalarType::Long => ("Long", "LongArray"),
        ScalarType::Float => ("Float", "FloatArray"),
        ScalarType::Double => ("Double", "DoubleArray"),
        ScalarType::Char => ("Char", "CharArray"),
        ScalarType::String => ("String", "StringArray"),
        ScalarType::Date => ("Date", "DateArray"),
        ScalarType::Time => ("Time", "TimeArray"),
        ScalarType::LocalTime => ("LocalTime", "LocalTimeArray"),
        ScalarType::DateTime => ("DateTime", "DateTimeArray"),
        ScalarType::LocalDateTime => ("LocalDateTime", "LocalDateTimeArray"),
        ScalarType::Duration => ("Duration", "DurationArray"),
        ScalarType::Point => ("Point", "PointArray"),
        ScalarType::Map => ("Map", "MapArray"),
        ScalarType::Object => ("Any", "List"),
        ScalarType::Null => ("Null", "NullArray"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_observed_scalars() {
        assert_eq!(PropertyType::of(&Value::Int(1)), PropertyType::scalar(ScalarType::Long));
        assert_eq!(PropertyType::of(&Value::Float(1.5)), PropertyType::scalar(ScalarType::Double));
        assert_eq!(PropertyType::of(&Value::from("x")), PropertyType::scalar(ScalarType::String));
        assert_eq!(PropertyType::of(&Value::Null), PropertyType::scalar(ScalarType::Null));
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(PropertyType::of(&Value::from(date)), PropertyType::scalar(ScalarType::Date));
    }

    #[test]
    fn test_observed_arrays() {
        assert_eq!(
            PropertyType::of(&Value::from(vec![1i64, 2, 3])),
            PropertyType::array_of(ScalarType::Long)
        );
        assert_eq!(
            PropertyType::of(&Value::Bytes(vec![0, 1])),
            PropertyType::array_of(ScalarType::Byte)
        );
        assert_eq!(
            PropertyType::of(&Value::List(vec![Value::Int(1), Value::from("a")])),
            PropertyType::array_of(ScalarType::Object)
        );
        assert_eq!(
            PropertyType::of(&Value::List(vec![])),
            PropertyType::array_of(ScalarType::Object)
        );
    }

    #[test]
    fn test_names() {
        assert_eq!(PropertyType::scalar(ScalarType::Integer).name(), "integer");
        assert_eq!(PropertyType::array_of(ScalarType::String).name(), "string[]");
    }

    #[test]
    fn test_categories() {
        assert_eq!(ScalarType::Integer.category(), TypeCategory::Integer);
        assert_eq!(ScalarType::Long.category(), TypeCategory::Integer);
        assert_eq!(ScalarType::Double.category(), TypeCategory::Float);
        assert_eq!(ScalarType::String.category(), TypeCategory::Other);
        assert_eq!(ScalarType::Null.category(), TypeCategory::Null);
    }

    #[test]
    fn test_merge_collapses_and_never_reverts() {
        let long = PropertyType::scalar(ScalarType::Long);
        let string = PropertyType::scalar(ScalarType::String);

        let d = TypeDescriptor::from(long).merge(long);
        assert_eq!(d, TypeDescriptor::Concrete(long));

        let d = d.merge(string);
        assert!(d.is_ambiguous());
        assert!(d.merge(long).is_ambiguous());
    }

    #[test]
    fn test_standard_vocabulary_is_total_and_invertible() {
        let vocabulary = SamplingVocabulary::standard();
        assert_eq!(vocabulary.len(), ScalarType::ALL.len() * 2);
        for scalar in ScalarType::ALL {
            for engine in [PropertyType::scalar(scalar), PropertyType::array_of(scalar)] {
                let service = vocabulary.service_name(&engine).unwrap();
                assert_eq!(vocabulary.engine_type(service), Some(engine));
            }
        }
        assert_eq!(
            vocabulary.engine_type("Long"),
            Some(PropertyType::scalar(ScalarType::Long))
        );
        assert_eq!(vocabulary.engine_type("Quaternion"), None);
    }

    #[test]
    fn test_non_bijective_vocabulary_is_rejected() {
        let long = PropertyType::scalar(ScalarType::Long);
        let int = PropertyType::scalar(ScalarType::Integer);

        let shared_name = SamplingVocabulary::new([(long, "Long"), (int, "Long")]);
        assert!(matches!(shared_name, Err(Error::InvalidVocabulary(_))));

        let shared_type = SamplingVocabulary::new([(long, "Long"), (long, "Integer")]);
        assert!(matches!(shared_type, Err(Error::InvalidVocabulary(_))));
    }
}
