//! Finds the part files that belong to a base document.
//!
//! A part of `api.yaml` is any `api_<part>.yaml` next to it. Discovery works
//! on file names only; listing the directory is left to the caller.

use std::path::Path;

fn base_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// Split `api.yaml` into `("api", "yaml")`.
fn stem_and_ext(file_name: &str) -> Option<(&str, &str)> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some((stem, ext))
}

/// Whether `candidate` is a part file of `base`.
pub fn is_part_of(base: &str, candidate: &str) -> bool {
    let Some((stem, ext)) = stem_and_ext(base_name(base)) else {
        return false;
    };
    let Some((cand_stem, cand_ext)) = stem_and_ext(base_name(candidate)) else {
        return false;
    };
    cand_ext == ext
        && cand_stem
            .strip_prefix(stem)
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|part| !part.is_empty())
}

/// Select the part files of `base` among `candidates`, sorted by file name.
pub fn discover_parts<S: AsRef<str>>(base: &str, candidates: &[S]) -> Vec<String> {
    let mut parts: Vec<String> = candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|c| is_part_of(base, c))
        .map(str::to_string)
        .collect();
    parts.sort_by(|a, b| base_name(a).cmp(base_name(b)).then_with(|| a.cmp(b)));
    parts.dedup();
    log::debug!("discovered {} part(s) for {base}", parts.len());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovers_and_sorts_parts() {
        let files = [
            "specs/api_users.yaml",
            "specs/api.yaml",
            "specs/api_orders.yaml",
            "specs/api_users.json",
            "specs/other_users.yaml",
            "specs/api_.yaml",
            "specs/README.md",
        ];
        assert_eq!(
            discover_parts("specs/api.yaml", &files),
            vec!["specs/api_orders.yaml", "specs/api_users.yaml"]
        );
    }

    #[test]
    fn test_base_without_extension_has_no_parts() {
        assert!(discover_parts("api", &["api_users"]).is_empty());
    }

    #[test]
    fn test_is_part_of() {
        assert!(is_part_of("petstore.yaml", "petstore_pets.yaml"));
        assert!(!is_part_of("petstore.yaml", "petstore.yaml"));
        assert!(!is_part_of("petstore.yaml", "petstorepets.yaml"));
    }
}
