//! Best-effort sequential batches
//!
//! Some screens "update" a set of records by deleting the old ones and
//! creating the replacements, one call at a time. There is no transaction:
//! the first failing call stops the batch and the steps already done stay
//! done. [`BatchError`] says exactly how far it got.

use std::fmt;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use super::resource::{Entity, Resource};
use crate::error::PolyclinicError;
use crate::types::Id;

/// The call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStep {
    Delete(Id),
    /// Index into the payload slice
    Create(usize),
}

impl fmt::Display for BatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete(id) => write!(f, "delete #{}", id),
            Self::Create(index) => write!(f, "create item {}", index + 1),
        }
    }
}

#[derive(Debug, Error)]
#[error("{step} failed after {completed} completed step(s): {source}")]
pub struct BatchError {
    /// Steps that succeeded before the failure; they are not rolled back
    pub completed: usize,
    pub step: BatchStep,
    #[source]
    pub source: PolyclinicError,
}

/// Delete every id in `existing`, then create every payload, in order.
/// Returns the created entities.
pub async fn replace_all<E, P>(
    resource: &Resource<E>,
    existing: &[Id],
    payloads: &[P],
) -> Result<Vec<E>, BatchError>
where
    E: Entity,
    P: Serialize + Sync,
{
    let mut completed = 0;

    for &id in existing {
        resource.delete(id).await.map_err(|source| {
            warn!("{}: batch stopped at delete #{}: {}", E::PATH, id, source);
            BatchError {
                completed,
                step: BatchStep::Delete(id),
                source,
            }
        })?;
        completed += 1;
    }

    let mut created = Vec::with_capacity(payloads.len());
    for (index, payload) in payloads.iter().enumerate() {
        let entity = resource.create(payload).await.map_err(|source| {
            warn!("{}: batch stopped at create {}: {}", E::PATH, index, source);
            BatchError {
                completed,
                step: BatchStep::Create(index),
                source,
            }
        })?;
        created.push(entity);
        completed += 1;
    }

    info!(
        "{}: replaced {} record(s) with {}",
        E::PATH,
        existing.len(),
        created.len()
    );
    Ok(created)
}
