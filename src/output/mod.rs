use serde::Serialize;

use crate::models::{MedicalRecord, Medication, Patient, Role, Statistics, Treatment, User};
use crate::routes::{Area, Screen};
use crate::table::{FilterSet, Page};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn format_kv_line(label: &str, value: &str) -> String {
    format!(":: {:<10}: {}", label, value)
}

/// A record that can be shown as one row of a text table.
pub trait TableRow {
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn id_cell(id: Option<u64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

impl TableRow for User {
    const COLUMNS: &'static [&'static str] = &["ID", "USERNAME", "ROLE"];

    fn cells(&self) -> Vec<String> {
        vec![
            id_cell(self.id),
            self.username.clone(),
            self.role_label().to_string(),
        ]
    }
}

impl TableRow for Patient {
    const COLUMNS: &'static [&'static str] = &["ID", "NAME", "BIRTH DATE", "PHONE", "EMAIL"];

    fn cells(&self) -> Vec<String> {
        vec![
            id_cell(self.id),
            self.full_name(),
            self.birth_date.format("%Y-%m-%d").to_string(),
            self.phone.clone(),
            self.email.clone(),
        ]
    }
}

impl TableRow for Medication {
    const COLUMNS: &'static [&'static str] = &["ID", "NAME", "DESCRIPTION", "DOSAGE"];

    fn cells(&self) -> Vec<String> {
        vec![
            id_cell(self.id),
            self.name.clone(),
            self.description.clone(),
            self.recommended_dosage.clone(),
        ]
    }
}

impl TableRow for MedicalRecord {
    const COLUMNS: &'static [&'static str] = &["ID", "PATIENT", "LAST UPDATED", "TREATMENTS"];

    fn cells(&self) -> Vec<String> {
        vec![
            id_cell(self.id),
            self.patient.full_name(),
            self.last_updated.format("%Y-%m-%d").to_string(),
            self.treatments.len().to_string(),
        ]
    }
}

impl TableRow for Treatment {
    const COLUMNS: &'static [&'static str] =
        &["ID", "RECORD", "START", "END", "PHYSICIAN", "MEDICATIONS", "INSTRUCTIONS"];

    fn cells(&self) -> Vec<String> {
        let meds: Vec<&str> = self.medications.iter().map(|m| m.name.as_str()).collect();
        vec![
            id_cell(self.id),
            id_cell(self.record.as_ref().map(|r| r.id)),
            self.start_date.format("%Y-%m-%d").to_string(),
            self.end_date.format("%Y-%m-%d").to_string(),
            self.physician
                .as_ref()
                .map(|p| p.username.clone())
                .unwrap_or_else(|| "-".to_string()),
            meds.join(", "),
            self.instructions.clone(),
        ]
    }
}

impl TableRow for Screen {
    const COLUMNS: &'static [&'static str] = &["PATH", "ROLE", "AREA", "ACCESS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.path().to_string(),
            self.role().label().to_string(),
            self.area().label().to_string(),
            if self.is_editable() { "edit" } else { "read" }.to_string(),
        ]
    }
}

fn render_rows(columns: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    out.push_str(&pad_line(columns.iter().copied(), &widths));
    out.push('\n');
    for row in rows {
        out.push_str(&pad_line(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

fn pad_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths.iter())
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// Aligned table for one page, followed by the pager line when there is more
/// than one page.
pub fn render_page_text<T: TableRow>(page: &Page<'_, T>, filters: &FilterSet) -> String {
    let mut out = String::new();
    if let Some(summary) = filters.summary() {
        out.push_str(&format_kv_line("Filters", &summary));
        out.push('\n');
    }

    if page.is_empty() {
        out.push_str("No records found.\n");
        return out;
    }

    let rows: Vec<Vec<String>> = page.items.iter().map(|r| r.cells()).collect();
    out.push_str(&render_rows(T::COLUMNS, &rows));

    if page.shows_pager() {
        out.push_str(&format_kv_line(
            "Page",
            &format!(
                "{}/{} ({} records)",
                page.page, page.total_pages, page.filtered_count
            ),
        ));
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct PageDocument<'a, T: Serialize> {
    page: usize,
    page_size: usize,
    total_pages: usize,
    filtered_count: usize,
    filters: Vec<(&'a str, &'a str)>,
    items: Vec<&'a T>,
}

pub fn render_page_json<T: Serialize>(page: &Page<'_, T>, filters: &FilterSet) -> String {
    let doc = PageDocument {
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
        filtered_count: page.filtered_count,
        filters: filters
            .active()
            .map(|f| (f.field.as_str(), f.value.as_str()))
            .collect(),
        items: page.items.clone(),
    };
    to_json(&doc)
}

pub fn render_record_json<T: Serialize>(record: &T) -> String {
    to_json(record)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    let mut out = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    out.push('\n');
    out
}

/// Key/value block for a single record: one `:: label : value` line per
/// column.
pub fn render_record_text<T: TableRow>(record: &T) -> String {
    let mut out = String::new();
    for (label, value) in T::COLUMNS.iter().zip(record.cells()) {
        out.push_str(&format_kv_line(&title_case(label), &value));
        out.push('\n');
    }
    out
}

pub fn render_medical_record_text(record: &MedicalRecord) -> String {
    let mut out = render_record_text(record);
    out.push_str(&format_kv_line("Notes", &record.notes));
    out.push('\n');
    for t in &record.treatments {
        let physician = t
            .physician
            .as_ref()
            .map(|p| p.username.as_str())
            .unwrap_or("-");
        let meds: Vec<&str> = t.medications.iter().map(|m| m.name.as_str()).collect();
        out.push_str(&format_kv_line(
            "Treatment",
            &format!(
                "{} {}..{} by {} [{}] {}",
                id_cell(t.id),
                t.start_date.format("%Y-%m-%d"),
                t.end_date.format("%Y-%m-%d"),
                physician,
                meds.join(", "),
                t.instructions
            ),
        ));
        out.push('\n');
    }
    out
}

pub fn render_statistics_text(stats: &Statistics) -> String {
    [
        ("Users", stats.total_users),
        ("Patients", stats.total_patients),
        ("Appts", stats.total_scheduled_appointments),
        ("Meds", stats.total_medications),
    ]
    .iter()
    .map(|(label, value)| format!("{}\n", format_kv_line(label, &value.to_string())))
    .collect()
}

#[derive(Serialize)]
struct ScreenEntry {
    path: &'static str,
    role: Role,
    area: Area,
    editable: bool,
}

pub fn render_screens(screens: &[Screen], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = screens.iter().map(TableRow::cells).collect();
            render_rows(Screen::COLUMNS, &rows)
        }
        OutputFormat::Json => {
            let entries: Vec<ScreenEntry> = screens
                .iter()
                .map(|s| ScreenEntry {
                    path: s.path(),
                    role: s.role(),
                    area: s.area(),
                    editable: s.is_editable(),
                })
                .collect();
            to_json(&entries)
        }
    }
}

/// Confirmation for operations the backend answers without a body.
pub fn render_ack(format: OutputFormat, action: &str, subject: &str, id: u64) -> String {
    match format {
        OutputFormat::Text => format!(
            "{}\n",
            format_kv_line(&title_case(action), &format!("{subject} {id}"))
        ),
        OutputFormat::Json => to_json(&serde_json::json!({
            "status": action,
            "subject": subject,
            "id": id,
        })),
    }
}

fn title_case(label: &str) -> String {
    let lower = label.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
