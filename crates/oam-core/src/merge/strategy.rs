use std::fmt;

use serde::{Deserialize, Serialize};

/// What to do when two inputs define the same path or component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Report every duplicate as an error and drop the entity.
    #[default]
    ErrorOnDuplicate,
    /// Keep one copy when all definitions are structurally equal.
    MergeIfIdentical,
    /// Keep the first definition and note each dropped one.
    AppendUnique,
    FirstWins,
    LastWins,
}

impl MergeStrategy {
    pub const ALL: [MergeStrategy; 5] = [
        MergeStrategy::ErrorOnDuplicate,
        MergeStrategy::MergeIfIdentical,
        MergeStrategy::AppendUnique,
        MergeStrategy::FirstWins,
        MergeStrategy::LastWins,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::ErrorOnDuplicate => "error_on_duplicate",
            MergeStrategy::MergeIfIdentical => "merge_if_identical",
            MergeStrategy::AppendUnique => "append_unique",
            MergeStrategy::FirstWins => "first_wins",
            MergeStrategy::LastWins => "last_wins",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MergeStrategy::ALL
            .into_iter()
            .find(|m| m.as_str() == s || m.as_str().replace('_', "-") == s)
            .ok_or_else(|| format!("unknown merge strategy '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_error_on_duplicate() {
        assert_eq!(MergeStrategy::default(), MergeStrategy::ErrorOnDuplicate);
    }

    #[test]
    fn test_from_str_accepts_both_spellings() {
        assert_eq!("last_wins".parse(), Ok(MergeStrategy::LastWins));
        assert_eq!("merge-if-identical".parse(), Ok(MergeStrategy::MergeIfIdentical));
        assert!("newest".parse::<MergeStrategy>().is_err());
    }
}
