//! Policy mode controlling same-user violation flagging.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Configured policy mode.
///
/// - `A`: every categorized pair is reported, never as a violation.
/// - `B`: every categorized pair is reported; pairs sharing an account are violations.
///
/// Any other tag is kept as `Unrecognized` and produces no categorized output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PolicyMode {
    A,
    B,
    Unrecognized(String),
}

impl PolicyMode {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "A" => Self::A,
            "B" => Self::B,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::Unrecognized(tag) => tag,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl Default for PolicyMode {
    fn default() -> Self {
        Self::A
    }
}

impl From<String> for PolicyMode {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<PolicyMode> for String {
    fn from(mode: PolicyMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_case_sensitive() {
        assert_eq!(PolicyMode::from_tag("A"), PolicyMode::A);
        assert_eq!(PolicyMode::from_tag("B"), PolicyMode::B);
        assert_eq!(
            PolicyMode::from_tag("a"),
            PolicyMode::Unrecognized("a".to_string())
        );
        assert!(!PolicyMode::from_tag("C").is_recognized());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let mode: PolicyMode = serde_json::from_str("\"B\"").unwrap();
        assert_eq!(mode, PolicyMode::B);

        let mode: PolicyMode = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(mode.as_str(), "strict");
        assert_eq!(serde_json::to_string(&mode).unwrap(), "\"strict\"");
    }
}
