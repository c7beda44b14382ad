use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Longest entry a vocabulary list accepts.
pub const MAX_ITEM_LEN: usize = 30;

/// Which of the three admin-editable lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VocabularyKind {
    Designations,
    Machines,
    WorkAreas,
}

impl VocabularyKind {
    /// The field name the remote store uses for this list.
    pub fn wire_name(&self) -> &'static str {
        match self {
            VocabularyKind::Designations => "designations",
            VocabularyKind::Machines => "machines",
            VocabularyKind::WorkAreas => "workAreas",
        }
    }
}

/// The three selection-input lists. Entries are insertion-ordered and unique
/// by exact case-sensitive match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default)]
    pub designations: Vec<String>,
    #[serde(default)]
    pub machines: Vec<String>,
    #[serde(default, rename = "workAreas")]
    pub work_areas: Vec<String>,
}

impl Vocabulary {
    /// The built-in lists used when the remote store has none to offer.
    pub fn defaults() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Vocabulary {
            designations: owned(&[
                "Project Manager",
                "Planning Manager",
                "Survey Manager",
                "Procurement",
                "Plant Incharge",
                "Incharge",
                "Accountant",
                "Store Incharge",
                "Store Assistant",
                "Supervisor",
                "Sr Engineer",
                "Mech Engineer",
                "Sr Engineer (Mech)",
                "Civil Engineer",
                "Gr Engineer Trainee",
                "QC Engineer",
                "Jr Engineer",
                "Surveyor",
                "Mechanical Engineer",
                "Electrician",
                "Driver",
                "B Plant Operator",
                "Mess Supervisor",
                "Office Boy",
                "Foreman",
                "Supervisor (B Plant)",
                "Diesel Supervisor",
            ]),
            machines: owned(&[
                "Excavator-01",
                "Bulldozer-02",
                "Crane-03",
                "Dump Truck-04",
                "Concrete Mixer-05",
                "Loader-06",
                "Grader-07",
            ]),
            work_areas: owned(&[
                "ch154 - ch159 - RamBabu",
                "ch159 - ch165 - Shyam",
                "ch165 - ch170 - Narayana",
                "ch170 - ch177 - Nagaraju",
                "ch177 - ch187 - SudharshanBala",
                "Reach 0-2km",
                "Reach 2-4km",
                "Tunnel Zone-1",
                "Tunnel Zone-2",
                "Office Area",
                "Storage Yard",
                "Equipment Yard",
            ]),
        }
    }

    pub fn list(&self, kind: VocabularyKind) -> &[String] {
        match kind {
            VocabularyKind::Designations => &self.designations,
            VocabularyKind::Machines => &self.machines,
            VocabularyKind::WorkAreas => &self.work_areas,
        }
    }

    fn list_mut(&mut self, kind: VocabularyKind) -> &mut Vec<String> {
        match kind {
            VocabularyKind::Designations => &mut self.designations,
            VocabularyKind::Machines => &mut self.machines,
            VocabularyKind::WorkAreas => &mut self.work_areas,
        }
    }

    /// Checks an add without performing it, so the remote write can be
    /// confirmed before the local list changes.
    pub fn validate_add(&self, kind: VocabularyKind, value: &str) -> Result<(), ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::EmptyValue);
        }
        if value.chars().count() > MAX_ITEM_LEN {
            return Err(ValidationError::ValueTooLong);
        }
        if self.list(kind).iter().any(|item| item == value) {
            return Err(ValidationError::DuplicateItem);
        }
        Ok(())
    }

    /// Appends a previously validated entry.
    pub fn apply_add(&mut self, kind: VocabularyKind, value: String) {
        self.list_mut(kind).push(value);
    }

    /// Checks a remove-by-position without performing it.
    pub fn validate_remove(&self, kind: VocabularyKind, index: usize) -> Result<(), ValidationError> {
        if index >= self.list(kind).len() {
            return Err(ValidationError::IndexOutOfRange(index));
        }
        Ok(())
    }

    /// Deletes by position, returning the removed entry.
    pub fn apply_remove(&mut self, kind: VocabularyKind, index: usize) -> String {
        self.list_mut(kind).remove(index)
    }

    /// Extends the work-area list with names discovered elsewhere (saved
    /// assignments), keeping explicit entries first and each discovered name
    /// in order of first appearance.
    pub fn merge_work_areas<'a>(&mut self, discovered: impl Iterator<Item = &'a str>) {
        for area in discovered {
            if !area.is_empty() && !self.work_areas.iter().any(|known| known == area) {
                self.work_areas.push(area.to_string());
            }
        }
    }
}
