//! Recent vs all-time message filter.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::records::MessageRecord;

/// How far back the `recent` filter reaches
pub const RECENT_WINDOW: Duration = Duration::days(7);

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TimeFilter {
    #[default]
    Recent,
    All,
}

impl TimeFilter {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "recent" => Ok(Self::Recent),
            "all" => Ok(Self::All),
            _ => bail!("invalid filter: must be recent or all"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeFilter::Recent => "recent",
            TimeFilter::All => "all",
        }
    }

    /// Button label in the filter bar
    pub fn label(self) -> &'static str {
        match self {
            TimeFilter::Recent => "Recent (Last 7 days)",
            TimeFilter::All => "All Time",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TimeFilter::Recent => TimeFilter::All,
            TimeFilter::All => TimeFilter::Recent,
        }
    }

    /// Whether a single message passes. The cutoff is inclusive; undated
    /// messages never count as recent.
    pub fn includes(self, record: &MessageRecord, now: OffsetDateTime) -> bool {
        match self {
            TimeFilter::All => true,
            TimeFilter::Recent => record
                .created_at()
                .is_some_and(|ts| ts >= now - RECENT_WINDOW),
        }
    }

    /// Keep the messages that pass, preserving order
    pub fn apply<'a>(
        self,
        messages: &'a [MessageRecord],
        now: OffsetDateTime,
    ) -> Vec<&'a MessageRecord> {
        messages
            .iter()
            .filter(|record| self.includes(record, now))
            .collect()
    }
}

impl std::fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn dated(date: &str) -> MessageRecord {
        MessageRecord::new(json!({"CHAT ID": "1", "CREATED DATE": date}))
    }

    #[test]
    fn eight_days_old_only_in_all() {
        let now = datetime!(2024-06-15 12:00 UTC);
        let old = dated("2024-06-07T12:00:00Z");
        assert!(!TimeFilter::Recent.includes(&old, now));
        assert!(TimeFilter::All.includes(&old, now));
    }

    #[test]
    fn boundary_is_inclusive() {
        let now = datetime!(2024-06-15 12:00 UTC);
        let edge = dated("2024-06-08T12:00:00Z");
        assert!(TimeFilter::Recent.includes(&edge, now));
        let just_past = dated("2024-06-08T11:59:59Z");
        assert!(!TimeFilter::Recent.includes(&just_past, now));
    }

    #[test]
    fn undated_messages_only_in_all() {
        let now = datetime!(2024-06-15 12:00 UTC);
        let undated = MessageRecord::new(json!({"CHAT ID": "1", "CREATED DATE": "soon"}));
        assert!(!TimeFilter::Recent.includes(&undated, now));
        assert!(TimeFilter::All.includes(&undated, now));
    }

    #[test]
    fn apply_preserves_order() {
        let now = datetime!(2024-06-15 12:00 UTC);
        let messages = vec![
            dated("2024-06-14T00:00:00Z"),
            dated("2024-01-01T00:00:00Z"),
            dated("2024-06-10T00:00:00Z"),
        ];
        let recent = TimeFilter::Recent.apply(&messages, now);
        assert_eq!(recent, vec![&messages[0], &messages[2]]);
        assert_eq!(TimeFilter::All.apply(&messages, now).len(), 3);
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(TimeFilter::parse("Recent").unwrap(), TimeFilter::Recent);
        assert_eq!(TimeFilter::parse(" all ").unwrap(), TimeFilter::All);
        assert!(TimeFilter::parse("week").is_err());
        assert_eq!(TimeFilter::All.to_string(), "all");
        assert_eq!(TimeFilter::default(), TimeFilter::Recent);
        assert_eq!(TimeFilter::Recent.toggled(), TimeFilter::All);
    }
}
