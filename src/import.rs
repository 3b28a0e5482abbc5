use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::attendance::{record_attendance, AttendanceInput, LessonCount};
use crate::store::Store;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub recorded: usize,
    pub alerts: usize,
}

#[derive(Deserialize)]
struct CsvRow {
    aluno: String,
    serie: String,
    presencas: String,
    aulas: String,
}

/// Records every row of a `aluno,serie,presencas,aulas` CSV file. Stops at
/// the first invalid row; rows before it stay recorded.
pub async fn import_csv(store: &dyn Store, csv_path: &Path) -> anyhow::Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut summary = ImportSummary::default();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let line = index + 2;
        let row = result.with_context(|| format!("line {line}: unreadable row"))?;
        let input = AttendanceInput {
            student: row.aluno,
            grade: row.serie,
            attended_lessons: LessonCount::Text(row.presencas),
            total_lessons: LessonCount::Text(row.aulas),
        };

        let recorded = record_attendance(store, &input)
            .await
            .with_context(|| format!("line {line}: attendance not recorded"))?;

        summary.recorded += 1;
        if recorded.alert.is_some() {
            summary.alerts += 1;
        }
    }

    Ok(summary)
}
