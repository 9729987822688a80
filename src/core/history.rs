//! Patient history aggregated from several collections

use std::fmt;

use chrono::NaiveDate;
use log::info;

use super::departments::DepartmentNames;
use super::http::ApiClient;
use super::resource::Resource;
use crate::error::{PolyclinicError, Result};
use crate::types::{
    CareEvent, Consultation, Department, Derivation, Id, Patient, Referral,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Consultation,
    Derivation,
    Referral,
    CareEvent,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Consultation => "Consultation",
            Self::Derivation => "Derivation",
            Self::Referral => "Referral",
            Self::CareEvent => "Care event",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub kind: EntryKind,
    pub date: NaiveDate,
    pub summary: String,
}

/// Inclusive date range, either end may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(PolyclinicError::validation(format!(
                    "Start date {} is after end date {}",
                    from.format("%d/%m/%Y"),
                    to.format("%d/%m/%Y")
                )));
            }
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Everything recorded about one patient, newest first
#[derive(Debug, Clone)]
pub struct PatientHistory {
    pub patient: Patient,
    pub entries: Vec<HistoryEntry>,
}

impl PatientHistory {
    /// Fetch the patient and each related collection in turn
    pub async fn load(client: &ApiClient, patient_id: Id) -> Result<Self> {
        let patient = Resource::<Patient>::new(client.clone()).get_by_id(patient_id).await?;
        let departments = Resource::<Department>::new(client.clone()).get_all().await?;
        let consultations = Resource::<Consultation>::new(client.clone())
            .filter_by("patient", patient_id)
            .await?;
        let derivations = Resource::<Derivation>::new(client.clone())
            .filter_by("patient", patient_id)
            .await?;
        let referrals = Resource::<Referral>::new(client.clone())
            .filter_by("patient", patient_id)
            .await?;
        let care_events = Resource::<CareEvent>::new(client.clone())
            .filter_by("patient", patient_id)
            .await?;

        let history = Self::from_parts(
            patient,
            &DepartmentNames::new(&departments),
            consultations,
            derivations,
            referrals,
            care_events,
        );
        info!(
            "loaded history of patient #{}: {} entries",
            patient_id,
            history.entries.len()
        );
        Ok(history)
    }

    pub fn from_parts(
        patient: Patient,
        names: &DepartmentNames,
        consultations: Vec<Consultation>,
        derivations: Vec<Derivation>,
        referrals: Vec<Referral>,
        care_events: Vec<CareEvent>,
    ) -> Self {
        let mut entries: Vec<HistoryEntry> = consultations
            .into_iter()
            .map(|c| HistoryEntry {
                kind: EntryKind::Consultation,
                date: c.date,
                summary: format!("{}: {}", names.name(c.department_id), c.diagnosis),
            })
            .chain(derivations.into_iter().map(|d| HistoryEntry {
                kind: EntryKind::Derivation,
                date: d.date,
                summary: names.route(d.department_from, d.department_to),
            }))
            .chain(referrals.into_iter().map(|r| HistoryEntry {
                kind: EntryKind::Referral,
                date: r.date,
                summary: format!("{} → {}", r.external_facility, names.name(r.department_to)),
            }))
            .chain(care_events.into_iter().map(|e| HistoryEntry {
                kind: EntryKind::CareEvent,
                date: e.occurred_at.date(),
                summary: e.description,
            }))
            .collect();

        // Stable: same-day entries keep the order above
        entries.sort_by(|a, b| b.date.cmp(&a.date));

        Self { patient, entries }
    }

    pub fn within(&self, range: &DateRange) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|entry| range.contains(entry.date))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history() -> PatientHistory {
        let patient = Patient {
            id: 1,
            first_name: "Ana".into(),
            last_name: "Pérez".into(),
            identification: "0912345678".into(),
            birth_date: None,
            phone: String::new(),
        };
        let names = DepartmentNames::new(&[
            Department { id: 1, name: "Emergencias".into(), head_id: None },
            Department { id: 2, name: "Cardiología".into(), head_id: None },
        ]);
        PatientHistory::from_parts(
            patient,
            &names,
            vec![Consultation {
                id: 10,
                patient_id: 1,
                doctor_id: 5,
                department_id: 2,
                date: date(2024, 2, 10),
                diagnosis: "Arritmia".into(),
            }],
            vec![Derivation {
                id: 20,
                patient_id: 1,
                department_from: 1,
                department_to: 2,
                date: date(2024, 1, 20),
                reason: String::new(),
            }],
            vec![Referral {
                id: 30,
                patient_id: 1,
                external_facility: "Hospital Central".into(),
                department_to: 1,
                date: date(2023, 12, 1),
                reason: String::new(),
            }],
            vec![CareEvent {
                id: 40,
                guard_shift_id: 3,
                patient_id: 1,
                occurred_at: date(2024, 1, 19).and_hms_opt(23, 15, 0).unwrap(),
                description: "Dolor torácico".into(),
            }],
        )
    }

    #[test]
    fn test_entries_sorted_newest_first() {
        let h = history();
        let kinds: Vec<EntryKind> = h.entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::Consultation,
                EntryKind::Derivation,
                EntryKind::CareEvent,
                EntryKind::Referral
            ]
        );
        assert_eq!(h.entries[1].summary, "Emergencias → Cardiología");
    }

    #[test]
    fn test_within_is_inclusive_and_open_ended() {
        let h = history();
        let range = DateRange::new(Some(date(2024, 1, 19)), Some(date(2024, 1, 20))).unwrap();
        assert_eq!(h.within(&range).len(), 2);

        let since = DateRange::new(Some(date(2024, 1, 1)), None).unwrap();
        assert_eq!(h.within(&since).len(), 3);

        assert_eq!(h.within(&DateRange::default()).len(), 4);
    }

    #[test]
    fn test_mismatched_range_is_validation_error() {
        let err = DateRange::new(Some(date(2024, 3, 1)), Some(date(2024, 2, 1))).unwrap_err();
        assert!(err.is_client_side());
    }
}
