use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use crate::attendance::is_below_threshold;
use crate::models::{AlertRecord, AttendanceRecord, GradeSummary};

/// Most recent record per (student, grade). Input is expected newest first.
pub fn latest_per_student(records: &[AttendanceRecord]) -> Vec<&AttendanceRecord> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| seen.insert((record.student.as_str(), record.grade.as_str())))
        .collect()
}

pub fn summarize_by_grade(records: &[AttendanceRecord]) -> Vec<GradeSummary> {
    let mut map: HashMap<String, (usize, f64, usize)> = HashMap::new();

    for record in latest_per_student(records) {
        let entry = map.entry(record.grade.clone()).or_insert((0, 0.0, 0));
        entry.0 += 1;
        entry.1 += record.attendance_percent;
        if is_below_threshold(record.attendance_percent) {
            entry.2 += 1;
        }
    }

    let mut summaries: Vec<GradeSummary> = map
        .into_iter()
        .map(|(grade, (count, total_percent, below))| GradeSummary {
            grade,
            record_count: count,
            avg_percent: if count == 0 {
                0.0
            } else {
                total_percent / count as f64
            },
            below_threshold: below,
        })
        .collect();

    summaries.sort_by(|a, b| a.grade.cmp(&b.grade));
    summaries
}

pub fn build_report(
    grade: Option<&str>,
    records: &[AttendanceRecord],
    alerts: &[AlertRecord],
) -> String {
    let records: Vec<AttendanceRecord> = records
        .iter()
        .filter(|record| grade.map_or(true, |g| record.grade == g))
        .cloned()
        .collect();
    let alerts: Vec<&AlertRecord> = alerts
        .iter()
        .filter(|alert| grade.map_or(true, |g| alert.field("serie") == Some(g)))
        .collect();

    let summaries = summarize_by_grade(&records);
    let mut output = String::new();
    let grade_label = grade.unwrap_or("all grades");

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(output, "Generated for {grade_label}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Grades");

    if summaries.is_empty() {
        let _ = writeln!(output, "No attendance recorded.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} students, average attendance {:.2}%, {} below threshold",
                summary.grade, summary.record_count, summary.avg_percent, summary.below_threshold
            );
        }
    }

    let mut at_risk: Vec<&AttendanceRecord> = latest_per_student(&records)
        .into_iter()
        .filter(|record| is_below_threshold(record.attendance_percent))
        .collect();
    at_risk.sort_by(|a, b| {
        a.attendance_percent
            .partial_cmp(&b.attendance_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students Below Threshold");

    if at_risk.is_empty() {
        let _ = writeln!(output, "No students below threshold.");
    } else {
        for record in at_risk.iter() {
            let _ = writeln!(
                output,
                "- {} ({}) {:.2}% ({} of {} lessons, recorded {})",
                record.student,
                record.grade,
                record.attendance_percent,
                record.attended_lessons,
                record.total_lessons,
                record.recorded_at.format("%Y-%m-%d")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Alerts");

    if alerts.is_empty() {
        let _ = writeln!(output, "No alerts recorded.");
    } else {
        for alert in alerts.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}, {}) on {}: {}",
                alert.field("aluno").unwrap_or("unknown student"),
                alert.field("serie").unwrap_or("no grade"),
                alert.source,
                alert.recorded_at.format("%Y-%m-%d"),
                alert.field("resultado").unwrap_or("")
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertSource;
    use chrono::{Duration, Utc};
    use serde_json::{Map, Value};
    use uuid::Uuid;

    fn record(student: &str, grade: &str, percent: f64, days_ago: i64) -> AttendanceRecord {
        AttendanceRecord {
            id: Uuid::new_v4(),
            student: student.to_string(),
            grade: grade.to_string(),
            attended_lessons: percent as i64,
            total_lessons: 100,
            attendance_percent: percent,
            recorded_at: Utc::now() - Duration::days(days_ago),
        }
    }

    fn alert(student: &str, grade: &str) -> AlertRecord {
        let mut document = Map::new();
        document.insert("aluno".to_string(), Value::from(student));
        document.insert("serie".to_string(), Value::from(grade));
        document.insert("resultado".to_string(), Value::from("Frequência abaixo de 80% (70%)"));
        AlertRecord {
            id: Uuid::new_v4(),
            document,
            source: AlertSource::System,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn only_latest_record_per_student_counts() {
        let records = vec![
            record("Ana", "5A", 85.0, 1),
            record("Ana", "5A", 60.0, 10),
            record("Bea", "5A", 70.0, 2),
        ];

        let summaries = summarize_by_grade(&records);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].record_count, 2);
        assert_eq!(summaries[0].below_threshold, 1);
        assert!((summaries[0].avg_percent - 77.5).abs() < 0.001);
    }

    #[test]
    fn report_lists_students_below_threshold_lowest_first() {
        let records = vec![
            record("Ana", "5A", 75.0, 1),
            record("Caio", "6B", 40.0, 1),
            record("Bea", "5A", 95.0, 1),
        ];
        let report = build_report(None, &records, &[alert("Ana", "5A")]);

        let caio = report.find("- Caio (6B) 40.00%").expect("Caio listed");
        let ana = report.find("- Ana (5A) 75.00%").expect("Ana listed");
        assert!(caio < ana);
        assert!(!report.contains("- Bea (5A)"));
        assert!(report.contains("- Ana (5A, system) on"));
    }

    #[test]
    fn grade_filter_narrows_report() {
        let records = vec![record("Ana", "5A", 75.0, 1), record("Caio", "6B", 40.0, 1)];
        let report = build_report(Some("6B"), &records, &[alert("Ana", "5A")]);

        assert!(report.contains("Generated for 6B"));
        assert!(report.contains("- 6B: 1 students"));
        assert!(!report.contains("Ana"));
        assert!(report.contains("No alerts recorded."));
    }

    #[test]
    fn empty_report_says_so() {
        let report = build_report(None, &[], &[]);
        assert!(report.contains("No attendance recorded."));
        assert!(report.contains("No students below threshold."));
    }
}
