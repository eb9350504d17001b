use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::parameter::{Parameter, ParameterOrRef};
use super::ref_resolve::{ComponentSection, parse_ref};
use super::content::{RequestBody, RequestBodyOrRef, Response, ResponseOrRef};
use super::schema::SchemaOrRef;
use super::security::SecurityScheme;

/// Components object holding reusable definitions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, SchemaOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, ResponseOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, ParameterOrRef>,

    #[serde(
        rename = "requestBodies",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub request_bodies: IndexMap<String, RequestBodyOrRef>,

    #[serde(
        rename = "securitySchemes",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub security_schemes: IndexMap<String, SecurityScheme>,

    /// Sections kept as written: they hold no types but may be referenced.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub callbacks: IndexMap<String, Value>,

    #[serde(rename = "pathItems", default, skip_serializing_if = "IndexMap::is_empty")]
    pub path_items: IndexMap<String, Value>,

    /// `x-*` keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Longest `$ref` chain followed before giving up.
const MAX_REF_HOPS: usize = 16;

impl Components {
    /// Entry names of one section.
    pub fn names(&self, section: ComponentSection) -> Vec<&str> {
        fn keys<T>(map: &IndexMap<String, T>) -> Vec<&str> {
            map.keys().map(String::as_str).collect()
        }
        match section {
            ComponentSection::Schemas => keys(&self.schemas),
            ComponentSection::Responses => keys(&self.responses),
            ComponentSection::Parameters => keys(&self.parameters),
            ComponentSection::RequestBodies => keys(&self.request_bodies),
            ComponentSection::SecuritySchemes => keys(&self.security_schemes),
            ComponentSection::Headers => keys(&self.headers),
            ComponentSection::Examples => keys(&self.examples),
            ComponentSection::Links => keys(&self.links),
            ComponentSection::Callbacks => keys(&self.callbacks),
            ComponentSection::PathItems => keys(&self.path_items),
        }
    }

    /// Follow a parameter reference (and any chain behind it) to its definition.
    pub fn parameter<'a>(&'a self, item: &'a ParameterOrRef) -> Option<&'a Parameter> {
        let mut current = item;
        for _ in 0..MAX_REF_HOPS {
            match current {
                ParameterOrRef::Parameter(p) => return Some(p),
                ParameterOrRef::Ref { ref_path } => {
                    current = self.parameters.get(&local_name(ref_path, ComponentSection::Parameters)?)?;
                }
            }
        }
        None
    }

    pub fn request_body<'a>(&'a self, item: &'a RequestBodyOrRef) -> Option<&'a RequestBody> {
        let mut current = item;
        for _ in 0..MAX_REF_HOPS {
            match current {
                RequestBodyOrRef::RequestBody(b) => return Some(b),
                RequestBodyOrRef::Ref { ref_path } => {
                    current = self
                        .request_bodies
                        .get(&local_name(ref_path, ComponentSection::RequestBodies)?)?;
                }
            }
        }
        None
    }

    pub fn response<'a>(&'a self, item: &'a ResponseOrRef) -> Option<&'a Response> {
        let mut current = item;
        for _ in 0..MAX_REF_HOPS {
            match current {
                ResponseOrRef::Response(r) => return Some(r),
                ResponseOrRef::Ref { ref_path } => {
                    current = self.responses.get(&local_name(ref_path, ComponentSection::Responses)?)?;
                }
            }
        }
        None
    }
}

fn local_name(ref_path: &str, section: ComponentSection) -> Option<String> {
    let target = parse_ref(ref_path).ok()?;
    (target.document.is_none() && target.section == section).then_some(target.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untyped_sections_survive_round_trip() {
        let yaml = r#"
headers:
  XRate: {schema: {type: integer}}
examples:
  Ex: {value: 1}
pathItems:
  Ping: {get: {responses: {'200': {description: ok}}}}
x-owner: platform
"#;
        let components: Components = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(components.names(ComponentSection::Headers), vec!["XRate"]);
        assert_eq!(components.names(ComponentSection::PathItems), vec!["Ping"]);
        assert_eq!(components.extra["x-owner"], Value::from("platform"));

        let back: Components =
            serde_yaml_ng::from_str(&serde_yaml_ng::to_string(&components).unwrap()).unwrap();
        assert_eq!(back, components);
    }
}
