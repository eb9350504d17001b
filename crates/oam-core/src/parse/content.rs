//! Request bodies, responses and the media types they carry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::SchemaOrRef;

/// Media type name to its payload description.
pub type Content = IndexMap<String, MediaType>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,

    /// Schema of each item of a streamed sequence.
    #[serde(rename = "itemSchema", skip_serializing_if = "Option::is_none")]
    pub item_schema: Option<SchemaOrRef>,

    /// `example`, `examples`, `encoding` and extensions.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub content: Content,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBodyOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    RequestBody(RequestBody),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: Content,

    /// Headers and links are carried through merges unchanged.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Response {
    pub fn has_body(&self) -> bool {
        !self.content.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Response(Response),
}

/// `application/json` when offered, then any `+json` type, then the first
/// declared one.
pub fn preferred_media(content: &Content) -> Option<(&str, &MediaType)> {
    content
        .get_key_value("application/json")
        .or_else(|| content.iter().find(|(ct, _)| ct.ends_with("+json")))
        .or_else(|| content.first())
        .map(|(ct, media)| (ct.as_str(), media))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(yaml: &str) -> Content {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn test_json_is_preferred() {
        let c = content("text/plain: {}\napplication/json: {}\n");
        assert_eq!(preferred_media(&c).map(|(ct, _)| ct), Some("application/json"));

        let c = content("text/plain: {}\napplication/problem+json: {}\n");
        assert_eq!(preferred_media(&c).map(|(ct, _)| ct), Some("application/problem+json"));

        let c = content("text/csv: {}\ntext/plain: {}\n");
        assert_eq!(preferred_media(&c).map(|(ct, _)| ct), Some("text/csv"));

        assert!(preferred_media(&Content::new()).is_none());
    }

    #[test]
    fn test_response_keeps_headers() {
        let yaml = "description: ok\nheaders:\n  X-Rate-Remaining:\n    schema: {type: integer}\n";
        let response: Response = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(!response.has_body());
        assert!(response.extra.contains_key("headers"));
    }
}
