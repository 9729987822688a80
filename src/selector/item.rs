//! Capability trait for anything a selector can list

use std::fmt::Debug;
use std::hash::Hash;

use colored::Colorize;

use crate::types::{Department, Derivation, Id, Medication, Patient, Referral, Staff, WarehouseRequest};

/// How a selector shows, searches and identifies its items.
pub trait SelectItem {
    type Id: Clone + Eq + Hash + Debug;

    /// Identity used to highlight the selected row and to deduplicate
    fn id(&self) -> Self::Id;

    /// Label shown in the closed state
    fn display_text(&self) -> String;

    /// Text the search box matches against. May include fields that are
    /// never displayed, such as an identification number.
    fn searchable_text(&self) -> String;

    /// One row of the open list
    fn render(&self, is_selected: bool) -> String;
}

fn marker(is_selected: bool) -> &'static str {
    if is_selected { "●" } else { " " }
}

impl SelectItem for Patient {
    type Id = Id;

    fn id(&self) -> Id {
        self.id
    }

    fn display_text(&self) -> String {
        self.full_name()
    }

    fn searchable_text(&self) -> String {
        format!("{} {}", self.full_name(), self.identification)
    }

    fn render(&self, is_selected: bool) -> String {
        format!(
            "{} {} {}",
            marker(is_selected),
            self.full_name(),
            format!("[{}]", self.identification).dimmed()
        )
    }
}

impl SelectItem for Department {
    type Id = Id;

    fn id(&self) -> Id {
        self.id
    }

    fn display_text(&self) -> String {
        self.name.clone()
    }

    fn searchable_text(&self) -> String {
        self.name.clone()
    }

    fn render(&self, is_selected: bool) -> String {
        format!("{} {}", marker(is_selected), self.name)
    }
}

impl SelectItem for Staff {
    type Id = Id;

    fn id(&self) -> Id {
        self.id
    }

    fn display_text(&self) -> String {
        self.name.clone()
    }

    fn searchable_text(&self) -> String {
        format!("{} {} {}", self.name, self.username, self.role)
    }

    fn render(&self, is_selected: bool) -> String {
        format!("{} {} - {}", marker(is_selected), self.name, self.role.cyan())
    }
}

impl SelectItem for Medication {
    type Id = Id;

    fn id(&self) -> Id {
        self.id
    }

    fn display_text(&self) -> String {
        self.name.clone()
    }

    fn searchable_text(&self) -> String {
        self.name.clone()
    }

    fn render(&self, is_selected: bool) -> String {
        let stock = format!("{} {}", self.stock, self.unit);
        let stock = if self.stock > 0 { stock.green() } else { stock.red() };
        format!("{} {} ({})", marker(is_selected), self.name, stock)
    }
}

impl SelectItem for Derivation {
    type Id = Id;

    fn id(&self) -> Id {
        self.id
    }

    fn display_text(&self) -> String {
        format!("Derivation #{} ({})", self.id, self.date.format("%d/%m/%Y"))
    }

    fn searchable_text(&self) -> String {
        format!("{} {} {}", self.id, self.date.format("%d/%m/%Y"), self.reason)
    }

    fn render(&self, is_selected: bool) -> String {
        format!(
            "{} #{} {} {}",
            marker(is_selected),
            self.id,
            self.date.format("%d/%m/%Y"),
            self.reason.dimmed()
        )
    }
}

impl SelectItem for Referral {
    type Id = Id;

    fn id(&self) -> Id {
        self.id
    }

    fn display_text(&self) -> String {
        format!("{} ({})", self.external_facility, self.date.format("%d/%m/%Y"))
    }

    fn searchable_text(&self) -> String {
        format!("{} {}", self.external_facility, self.reason)
    }

    fn render(&self, is_selected: bool) -> String {
        format!(
            "{} {} {}",
            marker(is_selected),
            self.external_facility,
            self.date.format("%d/%m/%Y").to_string().dimmed()
        )
    }
}

impl SelectItem for WarehouseRequest {
    type Id = Id;

    fn id(&self) -> Id {
        self.id
    }

    fn display_text(&self) -> String {
        format!("Request #{}", self.id)
    }

    fn searchable_text(&self) -> String {
        format!("{} {}", self.id, self.status.label())
    }

    fn render(&self, is_selected: bool) -> String {
        format!(
            "{} #{} {} - {} line(s)",
            marker(is_selected),
            self.id,
            self.status.label().yellow(),
            self.lines.len()
        )
    }
}
