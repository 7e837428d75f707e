//! Header fragments for the writers: CSV column headers and GraphML
//! `<key>` declarations, built from a collected [`PropertyTypeMap`].

use std::borrow::Cow;
use std::fmt;

use super::format::{is_array, type_for, ExportVocabulary};
use super::meta::PropertyTypeMap;

/// CSV column headers in neo4j-admin import form, keys sorted.
///
/// `age:long`, `tags:string[]`, and a bare `misc` for untyped keys.
pub fn csv_header(key_types: &PropertyTypeMap, vocabulary: &ExportVocabulary) -> Vec<String> {
    let mut keys: Vec<&String> = key_types.keys().collect();
    keys.sort();
    keys.into_iter()
        .map(|key| {
            let descriptor = &key_types[key];
            match type_for(descriptor, vocabulary) {
                Some(name) if is_array(descriptor) => format!("{key}:{name}[]"),
                Some(name) => format!("{key}:{name}"),
                None => key.clone(),
            }
        })
        .collect()
}

/// Element a GraphML key applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTarget {
    Node,
    Edge,
}

impl KeyTarget {
    fn as_str(self) -> &'static str {
        match self {
            KeyTarget::Node => "node",
            KeyTarget::Edge => "edge",
        }
    }
}

/// One GraphML `<key>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphMlKey {
    pub id: String,
    pub target: KeyTarget,
    /// `None` leaves `attr.type` out.
    pub attr_type: Option<&'static str>,
    /// Element type of array-valued keys.
    pub attr_list: Option<&'static str>,
}

impl fmt::Display for GraphMlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<key id="{id}" for="{target}" attr.name="{id}""#,
            id = escape_attr(&self.id),
            target = self.target.as_str()
        )?;
        if let Some(attr_type) = self.attr_type {
            write!(f, r#" attr.type="{attr_type}""#)?;
        }
        if let Some(attr_list) = self.attr_list {
            write!(f, r#" attr.list="{attr_list}""#)?;
        }
        write!(f, "/>")
    }
}

/// Escape an XML attribute value.
fn escape_attr(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(raw);
    }
    let mut escaped = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// GraphML key declarations, keys sorted. Arrays are declared as strings
/// with their element type in `attr.list`.
pub fn graphml_keys(key_types: &PropertyTypeMap, target: KeyTarget) -> Vec<GraphMlKey> {
    let vocabulary = ExportVocabulary::graphml();
    let mut keys: Vec<&String> = key_types.keys().collect();
    keys.sort();
    keys.into_iter()
        .map(|key| {
            let descriptor = &key_types[key];
            let name = type_for(descriptor, &vocabulary);
            let (attr_type, attr_list) = if is_array(descriptor) {
                (Some("string"), name)
            } else {
                (name, None)
            };
            GraphMlKey { id: key.clone(), target, attr_type, attr_list }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::types::{PropertyType, ScalarType, TypeDescriptor};
    use pretty_assertions::assert_eq;

    fn sample_map() -> PropertyTypeMap {
        let mut key_types = PropertyTypeMap::new();
        key_types.insert("age".into(), PropertyType::scalar(ScalarType::Long).into());
        key_types.insert("tags".into(), PropertyType::array_of(ScalarType::String).into());
        key_types.insert("misc".into(), TypeDescriptor::Ambiguous);
        key_types.insert("born".into(), PropertyType::scalar(ScalarType::Date).into());
        key_types
    }

    #[test]
    fn test_csv_header() {
        let header = csv_header(&sample_map(), &ExportVocabulary::Unconstrained);
        assert_eq!(header, vec!["age:long", "born:date", "misc", "tags:string[]"]);
    }

    #[test]
    fn test_graphml_keys() {
        let keys: Vec<String> = graphml_keys(&sample_map(), KeyTarget::Node)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec![
            r#"<key id="age" for="node" attr.name="age" attr.type="long"/>"#,
            r#"<key id="born" for="node" attr.name="born" attr.type="string"/>"#,
            r#"<key id="misc" for="node" attr.name="misc"/>"#,
            r#"<key id="tags" for="node" attr.name="tags" attr.type="string" attr.list="string"/>"#,
        ]);
    }

    #[test]
    fn test_graphml_key_escapes_markup() {
        let mut key_types = PropertyTypeMap::new();
        key_types.insert(r#"a"b<c"#.into(), PropertyType::scalar(ScalarType::Long).into());
        key_types.insert("R&D's".into(), PropertyType::scalar(ScalarType::String).into());

        let keys: Vec<String> = graphml_keys(&key_types, KeyTarget::Edge)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec![
            r#"<key id="R&amp;D&apos;s" for="edge" attr.name="R&amp;D&apos;s" attr.type="string"/>"#,
            r#"<key id="a&quot;b&lt;c" for="edge" attr.name="a&quot;b&lt;c" attr.type="long"/>"#,
        ]);
    }

    #[test]
    fn test_plain_key_is_borrowed() {
        assert!(matches!(escape_attr("since"), Cow::Borrowed("since")));
        assert_eq!(escape_attr("x>y"), "x&gt;y");
    }
}
