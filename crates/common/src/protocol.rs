//! The stored-record envelope and the types exchanged with storage backends.
//!
//! [`StoredRecord`] is the only wire format: it is serialised as JSON
//! (`{"value":..,"time":..,"expire":..}`) and optionally cipher-wrapped before
//! being written. Field names must not change, or previously written records
//! become unreadable.

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Envelope persisted for every key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// The caller's payload; `null` for absent or empty input.
    pub value: serde_json::Value,
    /// Epoch milliseconds at which the record was written.
    pub time: i64,
    /// Milliseconds after which the record is stale. `0` never expires.
    ///
    /// Older writers stored `seconds * 1000` unrounded; a fractional value is
    /// read back rounded up so a nonzero expiry never turns into `0`.
    #[serde(deserialize_with = "expire_millis")]
    pub expire: u64,
}

impl StoredRecord {
    /// Build a record written at `time` that expires after `expire` ms.
    pub fn new(value: serde_json::Value, time: i64, expire: u64) -> Self {
        Self {
            value,
            time,
            expire,
        }
    }

    /// Returns `true` if the record carries an expiry at all.
    pub fn expires(&self) -> bool {
        self.expire != 0
    }

    /// Milliseconds elapsed between the write and `now`.
    pub fn age_at(&self, now: i64) -> i64 {
        now - self.time
    }
}

fn expire_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(ms) = number.as_u64() {
        return Ok(ms);
    }
    match number.as_f64() {
        Some(ms) if ms.is_finite() && ms >= 0.0 && ms < u64::MAX as f64 => Ok(ms.ceil() as u64),
        _ => Err(de::Error::custom(format!(
            "expire must be a non-negative number of milliseconds, got {number}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

/// Raw key/value pair as reported by a backend enumeration.
///
/// Both halves are optional because the native interface may report a missing
/// key for an index or a missing value for a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Key at this position, exactly as stored (prefix included).
    pub key: Option<String>,
    /// Still-encoded stored text.
    pub value: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

/// Which of the two storage facilities an operation targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Persistent storage (`localStorage`).
    #[default]
    #[serde(rename = "localStorage", alias = "local")]
    Local,
    /// Session-scoped storage (`sessionStorage`).
    #[serde(rename = "sessionStorage", alias = "session")]
    Session,
}

impl BackendKind {
    /// The native name of this storage facility.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "localStorage",
            BackendKind::Session => "sessionStorage",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "localStorage" | "local" => Ok(BackendKind::Local),
            "sessionStorage" | "session" => Ok(BackendKind::Session),
            other => Err(format!("unknown storage type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_serialises_with_legacy_field_names() {
        let record = StoredRecord::new(json!({"id": 42}), 1_700_000_000_000, 60_000);
        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(
            text,
            r#"{"value":{"id":42},"time":1700000000000,"expire":60000}"#
        );
    }

    #[test]
    fn record_parses_previously_written_envelope() {
        let record: StoredRecord =
            serde_json::from_str(r#"{"value":null,"time":1,"expire":0}"#).unwrap();
        assert_eq!(record.value, serde_json::Value::Null);
        assert!(!record.expires());
        assert_eq!(record.age_at(11), 10);
    }

    #[test]
    fn fractional_expire_rounds_up() {
        let record: StoredRecord =
            serde_json::from_str(r#"{"value":1,"time":1,"expire":1500.5}"#).unwrap();
        assert_eq!(record.expire, 1501);

        let record: StoredRecord =
            serde_json::from_str(r#"{"value":1,"time":1,"expire":0.4}"#).unwrap();
        assert_eq!(record.expire, 1);
        assert!(record.expires());
    }

    #[test]
    fn negative_expire_is_rejected() {
        let parsed = serde_json::from_str::<StoredRecord>(r#"{"value":1,"time":1,"expire":-5}"#);
        assert!(parsed.is_err());
        let parsed = serde_json::from_str::<StoredRecord>(r#"{"value":1,"time":1,"expire":"60"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn backend_kind_names() {
        assert_eq!(BackendKind::default(), BackendKind::Local);
        assert_eq!("sessionStorage".parse::<BackendKind>(), Ok(BackendKind::Session));
        assert_eq!("local".parse::<BackendKind>(), Ok(BackendKind::Local));
        assert!("cookies".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Session.to_string(), "sessionStorage");
    }

    #[test]
    fn backend_kind_serde_uses_native_names() {
        let text = serde_json::to_string(&BackendKind::Local).unwrap();
        assert_eq!(text, r#""localStorage""#);
        let kind: BackendKind = serde_json::from_str(r#""session""#).unwrap();
        assert_eq!(kind, BackendKind::Session);
    }
}
