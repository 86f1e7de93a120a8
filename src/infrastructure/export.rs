use crate::domain::models::{Language, SessionRecord, format_duration};
use crate::infrastructure::error::InfraError;
use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn headers(language: Language) -> [&'static str; 5] {
    match language {
        Language::En => [
            "Date",
            "Session Name",
            "Duration (s)",
            "Duration (Formatted)",
            "Rating",
        ],
        Language::Ko => ["날짜", "세션 이름", "시간(초)", "시간(포맷)", "평점"],
    }
}

pub fn export_filename(username: Option<&str>, date: NaiveDate) -> String {
    format!(
        "Focus_History_{}_{}.csv",
        username.unwrap_or("Guest"),
        date.format("%Y-%m-%d")
    )
}

pub fn write_history_csv<W: Write>(
    writer: &mut W,
    records: &[SessionRecord],
    language: Language,
) -> Result<(), InfraError> {
    writeln!(writer, "{}", csv_line(headers(language).map(str::to_string)))?;
    for record in records {
        let row = [
            record.date.clone(),
            record.name.clone(),
            record.duration_seconds.to_string(),
            format_duration(record.duration_seconds),
            record.rating.to_string(),
        ];
        writeln!(writer, "{}", csv_line(row))?;
    }
    Ok(())
}

/// Writes the export file into `dir`. Returns `None` when there is nothing to export.
pub fn export_history(
    dir: &Path,
    records: &[SessionRecord],
    username: Option<&str>,
    date: NaiveDate,
    language: Language,
) -> Result<Option<PathBuf>, InfraError> {
    if records.is_empty() {
        return Ok(None);
    }
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(username, date));
    let mut writer = BufWriter::new(File::create(&path)?);
    write_history_csv(&mut writer, records, language)?;
    writer.flush()?;
    Ok(Some(path))
}

fn csv_line<const N: usize>(fields: [String; N]) -> String {
    fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
