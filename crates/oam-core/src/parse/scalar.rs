//! Text fields that YAML may type as numbers.
//!
//! `200:` as a response key or `openapi: 3.0` are plain scalars that a YAML
//! loader resolves to integers or floats. Objects with flattened catch-all
//! maps are buffered before they reach their fields, and the buffer keeps
//! that resolved type, so these fields accept numbers and store them as text.

use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, Visitor};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ScalarText(String);

struct ScalarTextVisitor;

impl Visitor<'_> for ScalarTextVisitor {
    type Value = ScalarText;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ScalarText, E> {
        Ok(ScalarText(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<ScalarText, E> {
        Ok(ScalarText(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ScalarText, E> {
        Ok(ScalarText(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ScalarText, E> {
        Ok(ScalarText(v.to_string()))
    }

    // Debug keeps the fraction: `3.0` stays "3.0".
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ScalarText, E> {
        Ok(ScalarText(format!("{v:?}")))
    }
}

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarTextVisitor)
    }
}

pub(crate) fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    ScalarText::deserialize(deserializer).map(|t| t.0)
}

pub(crate) fn optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<ScalarText>::deserialize(deserializer).map(|t| t.map(|t| t.0))
}

/// A map whose keys may be written as bare numbers, such as response codes.
pub(crate) fn text_keyed<'de, D, V>(deserializer: D) -> Result<IndexMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw = IndexMap::<ScalarText, V>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k.0, v)).collect())
}

#[cfg(test)]
mod tests {
    use crate::parse::{SourceFormat, fragment};

    #[test]
    fn test_numeric_scalars_read_as_text() {
        let yaml = r#"
openapi: 3.0
info: {title: t, version: 2}
x-owner: platform
paths:
  /pets:
    get:
      x-audit: true
      responses:
        200: {description: ok}
        '404': {description: missing}
"#;
        let spec = fragment(yaml, SourceFormat::Yaml).unwrap();
        assert_eq!(spec.openapi.as_deref(), Some("3.0"));
        assert_eq!(spec.info.unwrap().version, "2");
        let op = spec.paths["/pets"].get.as_ref().unwrap();
        let codes: Vec<&str> = op.responses.keys().map(String::as_str).collect();
        assert_eq!(codes, ["200", "404"]);
    }
}
