//! Ordered, id-deduplicated patient lists.
//!
//! Lists hold [`PatientId`]s only. The patients themselves live in a single
//! store owned by the session, so a reading replaced through the store is
//! visible through every list that references the patient.

use std::collections::HashSet;

use vitalwatch_types::{Patient, PatientId};

/// Capabilities shared by the directory and the monitor set.
pub trait PatientList {
    /// Number of patients in the list.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Id at `index`, in list order.
    fn get(&self, index: usize) -> Option<&PatientId>;

    /// Append a patient at the end.
    ///
    /// Returns `false`, leaving the list untouched, if the id is already present.
    fn append(&mut self, patient: &Patient) -> bool;

    /// Remove a patient.
    ///
    /// Returns `false`, leaving the list untouched, if the id is absent.
    fn remove(&mut self, patient: &Patient) -> bool;

    /// Position of the id in the list.
    fn index_of(&self, id: &PatientId) -> Option<usize>;

    fn contains(&self, id: &PatientId) -> bool;

    /// All ids, in list order.
    fn ids(&self) -> &[PatientId];

    fn iter(&self) -> std::slice::Iter<'_, PatientId> {
        self.ids().iter()
    }
}

/// Insertion-ordered set of ids backing both list kinds.
#[derive(Debug, Clone, Default)]
pub(crate) struct OrderedIds {
    order: Vec<PatientId>,
    members: HashSet<PatientId>,
}

impl OrderedIds {
    pub(crate) fn insert(&mut self, id: &PatientId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push(id.clone());
        true
    }

    pub(crate) fn remove(&mut self, id: &PatientId) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|member| member != id);
        true
    }

    pub(crate) fn contains(&self, id: &PatientId) -> bool {
        self.members.contains(id)
    }

    pub(crate) fn index_of(&self, id: &PatientId) -> Option<usize> {
        if !self.contains(id) {
            return None;
        }
        self.order.iter().position(|member| member == id)
    }

    pub(crate) fn as_slice(&self) -> &[PatientId] {
        &self.order
    }
}
