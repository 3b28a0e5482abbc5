use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "aluno")]
    pub student: String,
    #[serde(rename = "serie")]
    pub grade: String,
    #[serde(rename = "presencas")]
    pub attended_lessons: i64,
    #[serde(rename = "aulas")]
    pub total_lessons: i64,
    #[serde(rename = "frequencia")]
    pub attendance_percent: f64,
    #[serde(rename = "dataRegistro")]
    pub recorded_at: DateTime<Utc>,
}

/// Who created an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    /// Raised by the attendance recorder.
    System,
    /// Posted directly by a client.
    Manual,
}

impl AlertSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSource::System => "system",
            AlertSource::Manual => "manual",
        }
    }
}

impl fmt::Display for AlertSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(AlertSource::System),
            "manual" => Ok(AlertSource::Manual),
            other => Err(format!("unknown alert source `{other}`")),
        }
    }
}

/// An active-search alert. The document is freeform; the id, provenance and
/// timestamp are owned by the server and flattened next to it on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub document: Map<String, Value>,
    pub source: AlertSource,
    #[serde(rename = "dataRegistro")]
    pub recorded_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.document.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct GradeSummary {
    pub grade: String,
    pub record_count: usize,
    pub avg_percent: f64,
    pub below_threshold: usize,
}
