use heck::{
    ToKebabCase, ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase,
};

use crate::config::CasingPolicy;
use crate::ir::NormalizedName;
use crate::parse::operation::HttpMethod;

/// Compute every casing variant of an arbitrary name.
pub fn normalize_name(name: &str) -> NormalizedName {
    let sanitized = sanitize_identifier(name);
    NormalizedName {
        original: name.to_string(),
        pascal_case: sanitized.to_pascal_case(),
        camel_case: sanitized.to_lower_camel_case(),
        snake_case: sanitized.to_snake_case(),
        kebab_case: sanitized.to_kebab_case(),
        screaming_snake: sanitized.to_shouty_snake_case(),
    }
}

/// Rewrite `name` in the casing a policy asks for. `Any` leaves it untouched.
pub fn to_casing(name: &str, policy: CasingPolicy) -> String {
    match policy {
        CasingPolicy::CamelCase => name.to_lower_camel_case(),
        CasingPolicy::PascalCase => name.to_pascal_case(),
        CasingPolicy::SnakeCase => name.to_snake_case(),
        CasingPolicy::KebabCase => name.to_kebab_case(),
        CasingPolicy::ScreamingSnakeCase => name.to_shouty_snake_case(),
        CasingPolicy::Any => name.to_string(),
    }
}

/// A name follows a policy when converting it is a no-op.
pub fn follows_casing(name: &str, policy: CasingPolicy) -> bool {
    to_casing(name, policy) == name
}

/// Suggest a camelCase operation id from method and path.
///
/// `GET /users` gives `listUsers`, `GET /users/{id}` gives `getUser`.
pub fn route_to_name(method: HttpMethod, path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let is_param = |s: &str| s.starts_with('{') && s.ends_with('}');
    let targets_item = segments.last().is_some_and(|s| is_param(s));

    let verb = match method {
        HttpMethod::Get if targets_item => "get",
        HttpMethod::Get => "list",
        HttpMethod::Post => "create",
        HttpMethod::Put => "update",
        HttpMethod::Patch => "patch",
        HttpMethod::Delete => "delete",
        HttpMethod::Options => "options",
        HttpMethod::Head => "head",
        HttpMethod::Trace => "trace",
    };

    let resources: Vec<&str> = segments.into_iter().filter(|s| !is_param(s)).collect();
    let mut name = verb.to_string();
    for (i, resource) in resources.iter().enumerate() {
        let word = if targets_item && i + 1 == resources.len() {
            singularize(resource)
        } else {
            resource.to_string()
        };
        name.push_str(&word.to_pascal_case());
    }
    name
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies").filter(|s| !s.is_empty()) {
        return format!("{stem}y");
    }
    for suffix in ["ses", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() && !stem.ends_with('s') => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Replace runs of non-alphanumeric characters with a single `_`.
fn sanitize_identifier(name: &str) -> String {
    let words: Vec<&str> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        "unnamed".to_string()
    } else {
        words.join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        let n = normalize_name("listModels");
        assert_eq!(n.pascal_case, "ListModels");
        assert_eq!(n.camel_case, "listModels");
        assert_eq!(n.snake_case, "list_models");
        assert_eq!(n.kebab_case, "list-models");
        assert_eq!(n.screaming_snake, "LIST_MODELS");
    }

    #[test]
    fn test_special_chars() {
        assert_eq!(normalize_name("application/json").pascal_case, "ApplicationJson");
        assert_eq!(normalize_name("///").original, "///");
        assert_eq!(normalize_name("///").pascal_case, "Unnamed");
    }

    #[test]
    fn test_follows_casing() {
        assert!(follows_casing("listPets", CasingPolicy::CamelCase));
        assert!(!follows_casing("ListPets", CasingPolicy::CamelCase));
        assert!(!follows_casing("list_pets", CasingPolicy::CamelCase));
        assert!(follows_casing("PetOwner", CasingPolicy::PascalCase));
        assert!(follows_casing("pet_owner", CasingPolicy::SnakeCase));
        assert!(follows_casing("pet-owner", CasingPolicy::KebabCase));
        assert!(follows_casing("PET_OWNER", CasingPolicy::ScreamingSnakeCase));
        assert!(follows_casing("whatever Goes", CasingPolicy::Any));
    }

    #[test]
    fn test_route_to_name() {
        assert_eq!(route_to_name(HttpMethod::Get, "/users"), "listUsers");
        assert_eq!(route_to_name(HttpMethod::Post, "/users"), "createUsers");
        assert_eq!(route_to_name(HttpMethod::Get, "/users/{userId}"), "getUser");
        assert_eq!(route_to_name(HttpMethod::Delete, "/users/{userId}"), "deleteUser");
        assert_eq!(
            route_to_name(HttpMethod::Get, "/users/{userId}/messages/{messageId}"),
            "getUsersMessage"
        );
        assert_eq!(route_to_name(HttpMethod::Get, "/categories/{id}"), "getCategory");
        assert_eq!(route_to_name(HttpMethod::Get, "/"), "list");
    }
}
