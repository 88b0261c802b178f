//! Core record model: the persisted log entry and its closed taxonomies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Severity taxonomy for a stored log entry
///
/// Raw strings exist only at the API/CLI boundary; inside the runtime the
/// level is always one of these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Info,
    Success,
    Error,
    Debug,
    Warning,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
            LogLevel::Warning => "WARNING",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(input: &str) -> Result<LogLevel, Self::Err> {
        match input.to_uppercase().as_str() {
            "INFO" => Ok(LogLevel::Info),
            "SUCCESS" => Ok(LogLevel::Success),
            "ERROR" => Ok(LogLevel::Error),
            "DEBUG" => Ok(LogLevel::Debug),
            "WARNING" => Ok(LogLevel::Warning),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workflow state taxonomy for a stored log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    New,
    Onhold,
    Active,
    Blocked,
    Complete,
    Closed,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::New => "new",
            LogStatus::Onhold => "onhold",
            LogStatus::Active => "active",
            LogStatus::Blocked => "blocked",
            LogStatus::Complete => "complete",
            LogStatus::Closed => "closed",
        }
    }
}

impl FromStr for LogStatus {
    type Err = ();

    fn from_str(input: &str) -> Result<LogStatus, Self::Err> {
        match input.to_lowercase().as_str() {
            "new" => Ok(LogStatus::New),
            "onhold" => Ok(LogStatus::Onhold),
            "active" => Ok(LogStatus::Active),
            "blocked" => Ok(LogStatus::Blocked),
            "complete" => Ok(LogStatus::Complete),
            "closed" => Ok(LogStatus::Closed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a delete reaches the stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Set the tombstone flag, keep the row addressable for elevated reads.
    Soft,
    /// Remove the row and its index entry permanently.
    Hard,
}

/// The persisted unit: one log entry
///
/// `sequence_id` and `uuid` are assigned once at creation and never change;
/// `created_at` is immutable; `updated_at` stays absent until the first
/// update. `deleted` is the soft-delete tombstone, distinct from hard
/// removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub sequence_id: u64,
    pub uuid: Uuid,
    pub notes: String,
    pub source: String,
    pub level: LogLevel,
    pub status: LogStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub misc: Option<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
}

/// Raw input for create and update, exactly as received from the API or CLI
///
/// Every field is optional so that "missing" stays representable and
/// validation can name all offending fields at once instead of failing on
/// the first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordDraft {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub misc: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_round_trip() {
        for raw in ["INFO", "SUCCESS", "ERROR", "DEBUG", "WARNING", "CRITICAL"] {
            let level: LogLevel = raw.parse().unwrap();
            assert_eq!(level.to_string(), raw);
        }
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert!("FATAL".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for raw in ["new", "onhold", "active", "blocked", "complete", "closed"] {
            let status: LogStatus = raw.parse().unwrap();
            assert_eq!(status.to_string(), raw);
        }
        assert_eq!("Onhold".parse::<LogStatus>(), Ok(LogStatus::Onhold));
        assert!("resolved".parse::<LogStatus>().is_err());
    }

    #[test]
    fn test_record_serde_shape() {
        let record = LogRecord {
            sequence_id: 1,
            uuid: Uuid::new_v4(),
            notes: "disk full".to_string(),
            source: "svc-a".to_string(),
            level: LogLevel::Error,
            status: LogStatus::New,
            misc: None,
            created_at: Utc::now(),
            updated_at: None,
            deleted: false,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["status"], "new");
        assert!(value.get("updated_at").is_none());
        assert!(value.get("misc").is_none());

        let back: LogRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.sequence_id, 1);
        assert!(!back.deleted);
    }
}
