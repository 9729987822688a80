//! Department name lookup for list display

use std::collections::HashMap;

use crate::types::{Department, Id};

/// Id → name map built from one `GET /departments`
#[derive(Debug, Clone, Default)]
pub struct DepartmentNames {
    names: HashMap<Id, String>,
}

impl DepartmentNames {
    pub fn new(departments: &[Department]) -> Self {
        Self {
            names: departments
                .iter()
                .map(|d| (d.id, d.name.clone()))
                .collect(),
        }
    }

    /// Department name, or `#id` when the department is unknown
    pub fn name(&self, id: Id) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{}", id))
    }

    /// "Origin → Destination"
    pub fn route(&self, from: Id, to: Id) -> String {
        format!("{} → {}", self.name(from), self.name(to))
    }
}

impl From<&[Department]> for DepartmentNames {
    fn from(departments: &[Department]) -> Self {
        Self::new(departments)
    }
}
