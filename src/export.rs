//! Report export
//!
//! Appointment and prescription listings are flattened into a [`Report`] with
//! names already resolved, then written as TXT, CSV or JSON.

use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::Writer;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::booking::slot_label;
use crate::error::Result;
use crate::models::{Appointment, OutputFormat, Prescription};
use crate::records::names_by_id;
use crate::repository::DataClient;
use crate::schema::{doctors, patients};

/// Rows of text under a fixed set of column headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub name: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

const APPOINTMENT_HEADERS: &[&str] = &["Date", "Time", "Patient", "Doctor", "Reason", "Status"];
const PRESCRIPTION_HEADERS: &[&str] = &["Date", "Patient", "Doctor", "Medications", "Instructions", "Valid Until"];

fn name_or(names: &HashMap<Uuid, String>, id: Uuid, fallback: &str) -> String {
    names.get(&id).cloned().unwrap_or_else(|| fallback.to_string())
}

impl Report {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appointment listing with patient and doctor names
    pub async fn appointments(client: &dyn DataClient, appointments: &[Appointment]) -> Result<Self> {
        let patient_names = names_by_id(client, patients::TABLE, appointments.iter().map(|a| a.patient_id)).await?;
        let doctor_names = names_by_id(client, doctors::TABLE, appointments.iter().map(|a| a.doctor_id)).await?;

        let rows = appointments
            .iter()
            .map(|a| {
                vec![
                    a.appointment_date.format("%Y-%m-%d").to_string(),
                    slot_label(a.appointment_time),
                    name_or(&patient_names, a.patient_id, "Unknown patient"),
                    name_or(&doctor_names, a.doctor_id, "Unknown doctor"),
                    a.reason.clone().unwrap_or_default(),
                    a.status.label().to_string(),
                ]
            })
            .collect();

        Ok(Self { name: "appointments", headers: APPOINTMENT_HEADERS, rows })
    }

    /// Prescription listing; medications are joined into one cell
    pub async fn prescriptions(client: &dyn DataClient, prescriptions: &[Prescription]) -> Result<Self> {
        let patient_names = names_by_id(client, patients::TABLE, prescriptions.iter().map(|p| p.patient_id)).await?;
        let doctor_names = names_by_id(client, doctors::TABLE, prescriptions.iter().map(|p| p.doctor_id)).await?;

        let rows = prescriptions
            .iter()
            .map(|p| {
                let medications: Vec<String> = p
                    .medications
                    .iter()
                    .map(|m| format!("{} {} {} for {}", m.name, m.dosage, m.frequency, m.duration))
                    .collect();
                vec![
                    p.prescription_date.format("%Y-%m-%d").to_string(),
                    name_or(&patient_names, p.patient_id, "Unknown patient"),
                    name_or(&doctor_names, p.doctor_id, "Unknown doctor"),
                    medications.join("; "),
                    p.instructions.clone().unwrap_or_default(),
                    p.valid_until.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                ]
            })
            .collect();

        Ok(Self { name: "prescriptions", headers: PRESCRIPTION_HEADERS, rows })
    }
}

/// Write `report` under `output_dir` as `<name>_<stamp>.<ext>`
pub fn write_report_to_dir(report: &Report, format: OutputFormat, output_dir: &Path, stamp: &str) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    let file_path = output_dir.join(format!("{}_{stamp}.{}", report.name, format.extension()));
    write_report_to_file(report, format, &file_path)?;
    Ok(file_path)
}

/// Write `report` to `file_path` in `format`
pub fn write_report_to_file(report: &Report, format: OutputFormat, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    match format {
        OutputFormat::Txt => write_txt_file(report, file_path)?,
        OutputFormat::Csv => write_csv_file(report, file_path)?,
        OutputFormat::Json => write_json_file(report, file_path)?,
    }
    info!(report = report.name, rows = report.rows.len(), path = %file_path.display(), "Report written");
    Ok(())
}

/// One `Header: value` line per column, blank line between entries
fn write_txt_file(report: &Report, file_path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(file_path)?);

    for row in &report.rows {
        for (header, value) in report.headers.iter().zip(row) {
            writeln!(writer, "{header}: {value}")?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_csv_file(report: &Report, file_path: &Path) -> Result<()> {
    let mut writer = Writer::from_writer(File::create(file_path)?);

    writer.write_record(report.headers)?;
    for row in &report.rows {
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(())
}

/// JSON array of objects keyed by snake_case header
fn write_json_file(report: &Report, file_path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(file_path)?);

    let entries: Vec<Value> = report
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = report
                .headers
                .iter()
                .zip(row)
                .map(|(header, value)| (json_key(header), Value::String(value.clone())))
                .collect();
            Value::Object(object)
        })
        .collect();

    serde_json::to_writer_pretty(writer, &entries)?;
    Ok(())
}

fn json_key(header: &str) -> String {
    header.to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_key() {
        assert_eq!(json_key("Valid Until"), "valid_until");
        assert_eq!(json_key("Date"), "date");
    }
}
