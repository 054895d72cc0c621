//! Stage names that are never counted or pruned.

use std::collections::BTreeSet;
use std::fmt;

/// Stages Secrets Manager uses to mark the current, previous and pending
/// versions of a secret.
pub const RESERVED_STAGES: [&str; 3] = ["AWSCURRENT", "AWSPREVIOUS", "AWSPENDING"];

/// Set of stage names that must never be selected for removal.
///
/// Excluded stages still count toward the total label count of a run but
/// never toward the manageable count. Matching is exact and case-sensitive,
/// as stage labels are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    stages: BTreeSet<String>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::reserved()
    }
}

impl ExclusionSet {
    /// Creates the default set of reserved service stages.
    #[must_use]
    pub fn reserved() -> Self {
        RESERVED_STAGES.into_iter().collect()
    }

    /// Creates an empty set. Every stage becomes manageable.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            stages: BTreeSet::new(),
        }
    }

    /// Parses a comma-separated list such as `AWSCURRENT, AWSPREVIOUS`.
    ///
    /// Whitespace around names is ignored and empty items are dropped, so an
    /// empty string yields an empty set.
    #[must_use]
    pub fn parse_csv(list: &str) -> Self {
        list.split(',')
            .map(str::trim)
            .filter(|stage| !stage.is_empty())
            .collect()
    }

    /// Adds a stage to the set.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stages.insert(stage.into());
        self
    }

    /// Returns `true` if the stage is excluded.
    #[must_use]
    pub fn contains(&self, stage: &str) -> bool {
        self.stages.contains(stage)
    }

    /// Number of excluded stage names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Iterates the excluded names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            stages: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for ExclusionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_is_reserved_stages() {
        let set = ExclusionSet::default();
        assert_eq!(set.len(), 3);
        assert!(set.contains("AWSCURRENT"));
        assert!(set.contains("AWSPREVIOUS"));
        assert!(set.contains("AWSPENDING"));
        assert!(!set.contains("release-1"));
    }

    #[test_case("AWSCURRENT,AWSPREVIOUS,AWSPENDING", 3 ; "reserved list")]
    #[test_case(" keep-me , AWSCURRENT ", 2 ; "whitespace trimmed")]
    #[test_case("a,,b,", 2 ; "empty items dropped")]
    #[test_case("", 0 ; "empty string")]
    #[test_case("dup,dup", 1 ; "duplicates collapse")]
    fn test_parse_csv(input: &str, expected_len: usize) {
        assert_eq!(ExclusionSet::parse_csv(input).len(), expected_len);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let set = ExclusionSet::reserved();
        assert!(!set.contains("awscurrent"));
    }

    #[test]
    fn test_display_is_sorted_csv() {
        let set = ExclusionSet::empty().with_stage("zeta").with_stage("alpha");
        assert_eq!(set.to_string(), "alpha,zeta");
        assert_eq!(ExclusionSet::parse_csv(&set.to_string()), set);
    }
}
