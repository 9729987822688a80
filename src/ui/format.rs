//! Label formatting for lists and detail screens

use chrono::{NaiveDate, NaiveDateTime};
use colored::Colorize;

use crate::core::departments::DepartmentNames;
use crate::core::history::{EntryKind, HistoryEntry};
use crate::types::{Derivation, Medication, WarehouseRequest};

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_datetime(at: NaiveDateTime) -> String {
    at.format("%d/%m/%Y %H:%M").to_string()
}

/// Parse a `dd/mm/yyyy` or ISO `yyyy-mm-dd` date
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(input, "%Y-%m-%d"))
        .ok()
}

pub fn history_line(entry: &HistoryEntry) -> String {
    let kind = format!("{:<12}", entry.kind.to_string());
    let kind = match entry.kind {
        EntryKind::Consultation => kind.cyan(),
        EntryKind::Derivation => kind.magenta(),
        EntryKind::Referral => kind.blue(),
        EntryKind::CareEvent => kind.red(),
    };
    format!("{} {} {}", format_date(entry.date).dimmed(), kind, entry.summary)
}

pub fn derivation_line(derivation: &Derivation, names: &DepartmentNames) -> String {
    format!(
        "#{} {} {}",
        derivation.id,
        format_date(derivation.date).dimmed(),
        names.route(derivation.department_from, derivation.department_to)
    )
}

pub fn request_lines(request: &WarehouseRequest, names: &DepartmentNames, medications: &[Medication]) -> Vec<String> {
    let mut lines = vec![format!(
        "Request #{} from {} ({}) - {}",
        request.id,
        names.name(request.department_id),
        format_datetime(request.created_at),
        request.status.label().yellow()
    )];
    if let Some(destination) = request.destination_id {
        lines.push(format!("  destination: {}", names.name(destination)));
    }
    for line in &request.lines {
        let name = medications
            .iter()
            .find(|m| m.id == line.medication_id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| format!("#{}", line.medication_id));
        lines.push(format!("  {} x{}", name, line.quantity));
    }
    lines
}
