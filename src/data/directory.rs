//! The practitioner's full patient directory.

use vitalwatch_types::{Patient, PatientId};

use super::patient_list::{OrderedIds, PatientList};

/// Every patient associated with a practitioner, in the order the data
/// source listed them.
///
/// Built once at login. Duplicate ids are dropped on append, so the first
/// encounter with a patient fixes their position.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    ids: OrderedIds,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from ids, keeping the first occurrence of each.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = PatientId>,
    {
        let mut directory = Self::new();
        for id in ids {
            directory.ids.insert(&id);
        }
        directory
    }
}

impl PatientList for Directory {
    fn len(&self) -> usize {
        self.ids.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<&PatientId> {
        self.ids.as_slice().get(index)
    }

    fn append(&mut self, patient: &Patient) -> bool {
        self.ids.insert(&patient.id)
    }

    fn remove(&mut self, patient: &Patient) -> bool {
        self.ids.remove(&patient.id)
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
