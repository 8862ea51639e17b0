//! Wire models for the Sentry issue API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Severity of a monitored error event.
///
/// Ordered fatal > critical > error > warning > info; anything the API adds
/// later lands in `Unknown` instead of failing the whole listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Fatal,
    Critical,
    Error,
    Warning,
    Info,
    #[serde(other)]
    Unknown,
}

impl Level {
    /// Whether this level warrants filing a hosting-side issue.
    #[must_use]
    pub fn is_critical(self) -> bool {
        matches!(self, Self::Fatal | Self::Critical)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Fatal => "fatal",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// An issue as returned by the project issue listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentryIssue {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub culprit: Option<String>,
    pub level: Level,
    /// Occurrence count. The live API serializes this as a JSON string.
    #[serde(deserialize_with = "string_or_u64")]
    pub count: u64,
    #[serde(default, deserialize_with = "string_or_u64")]
    pub user_count: u64,
    #[serde(default)]
    pub project: Option<ProjectRef>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

/// The project an issue belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRef {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Accepts both `42` and `"42"`.
fn string_or_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_accepts_string_and_number() {
        let from_string: SentryIssue = serde_json::from_value(serde_json::json!({
            "id": "1",
            "title": "TypeError in checkout",
            "level": "error",
            "count": "42",
            "userCount": 7,
        }))
        .unwrap();
        assert_eq!(from_string.count, 42);
        assert_eq!(from_string.user_count, 7);

        let from_number: SentryIssue = serde_json::from_value(serde_json::json!({
            "id": "2",
            "title": "Panic in worker",
            "level": "fatal",
            "count": 3,
        }))
        .unwrap();
        assert_eq!(from_number.count, 3);
        assert_eq!(from_number.user_count, 0);
    }

    #[test]
    fn test_unknown_level_does_not_fail_listing() {
        let issue: SentryIssue = serde_json::from_value(serde_json::json!({
            "id": "3",
            "title": "Noise",
            "level": "debug",
            "count": "1",
        }))
        .unwrap();
        assert_eq!(issue.level, Level::Unknown);
        assert!(!issue.level.is_critical());
    }

    #[test]
    fn test_critical_levels() {
        assert!(Level::Fatal.is_critical());
        assert!(Level::Critical.is_critical());
        assert!(!Level::Error.is_critical());
        assert!(!Level::Warning.is_critical());
        assert!(!Level::Info.is_critical());
    }

    #[test]
    fn test_level_display_is_lowercase() {
        assert_eq!(Level::Critical.to_string(), "critical");
        assert_eq!(Level::Fatal.to_string(), "fatal");
    }
}
