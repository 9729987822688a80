//! Type definitions for polyclinic
//!
//! Wire shapes of the backend entities plus the client's own config and
//! screen state.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Backend identifier type
pub type Id = i64;

// ============================================
// Wire Envelope
// ============================================

/// Standard response envelope returned by every backend endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error_code: Option<String>,
}

// ============================================
// Clinical Types
// ============================================

/// A patient registered at the polyclinic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    /// National identification number
    pub identification: String,
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub phone: String,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A clinic department (Cardiología, Pediatría, Emergencias, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: Id,
    pub name: String,
    /// Staff member with approval authority over the department's requests
    pub head_id: Option<Id>,
}

/// A user of the system: doctors, nurses, department heads, warehouse staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: Id,
    pub name: String,
    pub username: String,
    pub role: String,
    pub department_id: Option<Id>,
}

/// Internal referral moving a patient between two clinic departments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Derivation {
    pub id: Id,
    pub patient_id: Id,
    pub department_from: Id,
    pub department_to: Id,
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

/// Referral of a patient from an external facility into a department
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: Id,
    pub patient_id: Id,
    pub external_facility: String,
    pub department_to: Id,
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: Id,
    pub patient_id: Id,
    pub doctor_id: Id,
    pub department_id: Id,
    pub date: NaiveDate,
    #[serde(default)]
    pub diagnosis: String,
}

/// Emergency-room guard shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardShift {
    pub id: Id,
    pub department_id: Id,
    pub doctor_id: Id,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
}

/// Care event recorded during a guard shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareEvent {
    pub id: Id,
    pub guard_shift_id: Id,
    pub patient_id: Id,
    pub occurred_at: NaiveDateTime,
    #[serde(default)]
    pub description: String,
}

// ============================================
// Stock Types
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: Id,
    pub name: String,
    /// Units currently in the central warehouse
    pub stock: i64,
    #[serde(default)]
    pub unit: String,
}

/// One medication line of a warehouse request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLine {
    pub medication_id: Id,
    pub quantity: i64,
}

/// Approval stage of a warehouse request, decided server-side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    /// Approved by the head of the requesting department
    OriginApproved,
    /// Approved by the warehouse
    WarehouseApproved,
    Delivered,
    Rejected,
}

impl RequestStatus {
    /// No further approvals can happen
    pub fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::OriginApproved => "Aprobada por jefe",
            Self::WarehouseApproved => "Aprobada por almacén",
            Self::Delivered => "Entregada",
            Self::Rejected => "Rechazada",
        }
    }
}

/// Staged request to move stock from the central warehouse to a department
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseRequest {
    pub id: Id,
    pub department_id: Id,
    /// Department that will receive the stock, when it differs from the requester
    pub destination_id: Option<Id>,
    pub lines: Vec<RequestLine>,
    pub status: RequestStatus,
    pub created_at: NaiveDateTime,
}

// ============================================
// Config Types
// ============================================

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL, e.g. "http://localhost:8080/api"
    pub api_url: String,
    /// Per-request timeout in seconds (default: 15)
    pub request_timeout_secs: u64,
    /// Seconds an inline notice stays visible (default: 4)
    pub notice_seconds: u64,
    /// Log level written to the log file (default: "info")
    pub log_level: String,
    /// Editor command (default: "nvim")
    pub editor: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".into(),
            request_timeout_secs: 15,
            notice_seconds: 4,
            log_level: "info".into(),
            editor: "nvim".into(),
        }
    }
}

// ============================================
// Selector Types
// ============================================

/// Item displayed in a static menu
#[derive(Debug, Clone)]
pub struct MenuItem<T> {
    /// Display text
    pub label: String,
    /// Underlying value
    pub value: T,
}

// ============================================
// State Machine Types
// ============================================

/// Screen currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Main menu
    Init,
    /// Credential prompt, entered on startup without a token or after a 401
    Login,
    /// Pick a patient, then show their history
    Patients,
    /// Derivations between departments
    Derivations,
    /// Medication stock
    Medications,
    /// Warehouse replenishment requests
    Warehouse,
    /// Exit application
    Exit,
}
