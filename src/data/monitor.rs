//! The monitored subset and its running cholesterol statistics.
//!
//! Statistics are maintained incrementally: every add and remove adjusts the
//! running total and unmeasured count by the member's own contribution, and
//! the set is never re-summed. A member whose cholesterol is unavailable
//! counts towards `unmeasured` and is excluded from both the numerator and the
//! denominator of the average.

use serde::Serialize;
use vitalwatch_types::{Patient, PatientId};

use super::patient_list::{OrderedIds, PatientList};

/// Totals at or below this are treated as zero after a removal.
///
/// Chained additions and subtractions of `f64` leave residue such as
/// `5.7e-14` where the exact answer is zero.
pub const NOISE_FLOOR: f64 = 1e-6;

/// Running cholesterol aggregates over the monitored members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CholesterolStats {
    /// Sum of known cholesterol values.
    pub total: f64,
    /// Members with a known cholesterol value.
    pub measured: usize,
    /// Members whose cholesterol is unavailable.
    pub unmeasured: usize,
    /// `total / measured`, or 0 when nothing is measured.
    pub average: f64,
}

impl CholesterolStats {
    fn include(&mut self, value: Option<f64>) {
        match value {
            Some(value) => {
                self.total += value;
                self.measured += 1;
                self.recompute_average();
            }
            None => self.unmeasured += 1,
        }
    }

    fn exclude(&mut self, value: Option<f64>) {
        match value {
            Some(value) => {
                self.total -= value;
                self.measured = self.measured.saturating_sub(1);
                if self.total <= NOISE_FLOOR || self.measured == 0 {
                    self.total = 0.0;
                    self.average = 0.0;
                } else {
                    self.recompute_average();
                }
            }
            None => self.unmeasured = self.unmeasured.saturating_sub(1),
        }
    }

    fn recompute_average(&mut self) {
        self.average = if self.measured == 0 {
            0.0
        } else {
            self.total / self.measured as f64
        };
    }
}

/// Patients under active surveillance.
#[derive(Debug, Clone, Default)]
pub struct MonitorSet {
    ids: OrderedIds,
    stats: CholesterolStats,
}

impl MonitorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CholesterolStats {
        self.stats
    }

    /// Current average cholesterol of measured members, 0 if there are none.
    pub fn average_cholesterol(&self) -> f64 {
        self.stats.average
    }

    /// Swap a member's contribution from `old` to `new`.
    ///
    /// Called whenever a member's cholesterol reading is replaced. Returns
    /// `false` without touching the statistics if `id` is not a member.
    pub fn resync(&mut self, id: &PatientId, old: Option<f64>, new: Option<f64>) -> bool {
        if !self.ids.contains(id) {
            return false;
        }
        self.stats.exclude(old);
        self.stats.include(new);
        true
    }
}

impl PatientList for MonitorSet {
    fn len(&self) -> usize {
        self.ids.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<&PatientId> {
        self.ids.as_slice().get(index)
    }

    fn append(&mut self, patient: &Patient) -> bool {
        if !self.ids.insert(&patient.id) {
            return false;
        }
        self.stats.include(patient.cholesterol_value());
        true
    }

    fn remove(&mut self, patient: &Patient) -> bool {
        if !self.ids.remove(&patient.id) {
            return false;
        }
        self.stats.exclude(patient.cholesterol_value());
        true
    }

    fn index_of(&self, id: &PatientId) -> Option<usize> {
        self.ids.index_of(id)
    }

    fn contains(&self, id: &PatientId) -> bool {
        self.ids.contains(id)
    }

    fn ids(&self) -> &[PatientId] {
        self.ids.as_slice()
    }
}
