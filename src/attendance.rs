//! Attendance recording and the low-attendance alert rule.
//!
//! Every recorded attendance derives its percentage from the two lesson
//! counts at write time. A percentage under [`ATTENDANCE_THRESHOLD`] raises a
//! system alert that is committed in the same store transaction as the
//! attendance record.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AlertRecord, AlertSource, AttendanceRecord};
use crate::store::Store;

pub const ATTENDANCE_THRESHOLD: f64 = 80.0;

/// Contact type and responsible party stamped on system alerts.
pub const SYSTEM_RESPONSIBLE: &str = "Sistema Frequência";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("field `{field}` must be an integer")]
    NotAnInteger { field: &'static str },

    #[error("field `{field}` must not be negative")]
    Negative { field: &'static str },

    #[error("total lessons must be greater than zero")]
    ZeroTotalLessons,
}

/// A lesson count as clients send it: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LessonCount {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl LessonCount {
    pub fn coerce(&self, field: &'static str) -> Result<i64, RecordError> {
        let value = match self {
            LessonCount::Integer(value) => *value,
            LessonCount::Decimal(value) => {
                if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
                    return Err(RecordError::NotAnInteger { field });
                }
                *value as i64
            }
            LessonCount::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| RecordError::NotAnInteger { field })?,
        };

        if value < 0 {
            return Err(RecordError::Negative { field });
        }

        Ok(value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceInput {
    #[serde(rename = "aluno")]
    pub student: String,
    #[serde(rename = "serie")]
    pub grade: String,
    #[serde(rename = "presencas")]
    pub attended_lessons: LessonCount,
    #[serde(rename = "aulas")]
    pub total_lessons: LessonCount,
}

/// What one recording produced.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub record: AttendanceRecord,
    pub alert: Option<AlertRecord>,
}

/// `attended / total * 100`, rounded to two decimal places.
///
/// Rounding works on the exact binary value with ties to even, so
/// 1 of 32 lessons (3.125%) yields 3.12.
pub fn attendance_percent(attended: i64, total: i64) -> Result<f64, RecordError> {
    if total == 0 {
        return Err(RecordError::ZeroTotalLessons);
    }

    let ratio = attended as f64 / total as f64 * 100.0;
    Ok(format!("{ratio:.2}").parse().unwrap_or(ratio))
}

pub fn is_below_threshold(percent: f64) -> bool {
    percent < ATTENDANCE_THRESHOLD
}

pub fn alert_message(percent: f64) -> String {
    format!("Frequência abaixo de {ATTENDANCE_THRESHOLD}% ({percent}%)")
}

fn system_alert(record: &AttendanceRecord) -> AlertRecord {
    let mut document = Map::new();
    document.insert("aluno".to_string(), Value::from(record.student.clone()));
    document.insert("serie".to_string(), Value::from(record.grade.clone()));
    document.insert(
        "dataFalta".to_string(),
        Value::from(record.recorded_at.format("%Y-%m-%d").to_string()),
    );
    document.insert("tipoContato".to_string(), Value::from(SYSTEM_RESPONSIBLE));
    document.insert("responsavel".to_string(), Value::from(SYSTEM_RESPONSIBLE));
    document.insert(
        "resultado".to_string(),
        Value::from(alert_message(record.attendance_percent)),
    );
    document.insert("observacoes".to_string(), Value::from(""));

    AlertRecord {
        id: Uuid::new_v4(),
        document,
        source: AlertSource::System,
        recorded_at: record.recorded_at,
    }
}

/// Builds the attendance record and, when attendance is low, its alert.
/// Performs no I/O.
pub fn derive_record(
    input: &AttendanceInput,
    now: DateTime<Utc>,
) -> Result<Recorded, RecordError> {
    let attended = input.attended_lessons.coerce("presencas")?;
    let total = input.total_lessons.coerce("aulas")?;
    let percent = attendance_percent(attended, total)?;

    let record = AttendanceRecord {
        id: Uuid::new_v4(),
        student: input.student.clone(),
        grade: input.grade.clone(),
        attended_lessons: attended,
        total_lessons: total,
        attendance_percent: percent,
        recorded_at: now,
    };

    let alert = is_below_threshold(percent).then(|| system_alert(&record));

    Ok(Recorded { record, alert })
}

pub async fn record_attendance(
    store: &dyn Store,
    input: &AttendanceInput,
) -> Result<Recorded, AppError> {
    let recorded = derive_record(input, Utc::now())?;
    store
        .insert_attendance(&recorded.record, recorded.alert.as_ref())
        .await?;

    if recorded.alert.is_some() {
        info!(
            student = %recorded.record.student,
            grade = %recorded.record.grade,
            percent = recorded.record.attendance_percent,
            "attendance below threshold, alert raised"
        );
    }

    Ok(recorded)
}
