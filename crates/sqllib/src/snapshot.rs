//! Persistent form of a percentile estimator.
//!
//! A snapshot is the ascending list of live observations, duplicates
//! repeated. It carries no backend-specific layout, so a snapshot taken
//! from one multiset backend restores into any other.

use crate::error::SnapshotError;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use size_of::SizeOf;

#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    SizeOf,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct PercentileSnapshot {
    values: Vec<f64>,
}

impl PercentileSnapshot {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encode as an rkyv archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let bytes = rkyv::to_bytes::<_, 256>(self)
            .map_err(|error| SnapshotError::Encode(error.to_string()))?;
        Ok(bytes.into_vec())
    }

    /// Decode an archive produced by [`to_bytes`](Self::to_bytes), validating
    /// it first.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let mut aligned = rkyv::AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);

        let archived = rkyv::check_archived_root::<Self>(&aligned)
            .map_err(|error| SnapshotError::Corrupted(error.to_string()))?;
        let snapshot: Self = archived
            .deserialize(&mut rkyv::Infallible)
            .map_err(|_| SnapshotError::Corrupted("deserialization failed".to_string()))?;
        Ok(snapshot)
    }

    /// Encode as JSON. JSON has no representation for NaN or the
    /// infinities, so a snapshot holding one is rejected; use
    /// [`to_bytes`](Self::to_bytes) for those.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        if let Some(value) = self.values.iter().find(|value| !value.is_finite()) {
            return Err(SnapshotError::Encode(format!(
                "{value} cannot be represented in JSON"
            )));
        }
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<Vec<f64>> for PercentileSnapshot {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}
