use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A declared scheme. Only its `type` is interpreted; the remaining fields
/// (flows, bearer format, key location) pass through merges as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(flatten)]
    pub details: IndexMap<String, Value>,
}

/// Scheme name to the scopes it needs. `{}` means anonymous access.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Whether any alternative actually asks for credentials.
pub fn requires_credentials(requirements: &[SecurityRequirement]) -> bool {
    requirements.iter().any(|req| !req.is_empty())
}

/// Every scheme name mentioned, in order, repeats included.
pub fn referenced_schemes(requirements: &[SecurityRequirement]) -> impl Iterator<Item = &str> {
    requirements.iter().flat_map(|req| req.keys().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_requirement_is_anonymous() {
        let reqs: Vec<SecurityRequirement> = serde_yaml_ng::from_str("- {}\n").unwrap();
        assert!(!requires_credentials(&reqs));

        let reqs: Vec<SecurityRequirement> =
            serde_yaml_ng::from_str("- {}\n- oauth: [read]\n  apiKey: []\n").unwrap();
        assert!(requires_credentials(&reqs));
        assert_eq!(referenced_schemes(&reqs).collect::<Vec<_>>(), ["oauth", "apiKey"]);
    }

    #[test]
    fn test_scheme_details_round_trip() {
        let yaml = "type: oauth2\nflows:\n  clientCredentials:\n    tokenUrl: https://auth.example.com/token\n    scopes: {}\n";
        let scheme: SecurityScheme = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(scheme.kind, "oauth2");
        assert!(scheme.details.contains_key("flows"));
    }
}
