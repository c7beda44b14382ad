use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::DatasetCache;
use crate::data::assignment::Assignment;
use crate::data::employee::{EmpId, Employee};
use crate::remote::adapter::{AdapterError, Transport};
use crate::remote::gateway::Gateway;
use crate::remote::{envelope, Action, Payload};

#[derive(Debug, Error)]
pub enum SaveError {
    /// The drag-and-drop source and the board state have desynced; the board
    /// must not be persisted in this shape.
    #[error("employee {0} is placed in more than one work area")]
    DuplicateAssignment(EmpId),
    #[error(transparent)]
    Remote(#[from] AdapterError),
}

/// One day's placement of employees into work areas while the user is editing
/// it. This is the authoritative state between `load` and `save`; drag moves
/// mutate it immediately and nothing is persisted until an explicit save.
///
/// Every employee the cache knows but no bucket holds is implicitly in the
/// unassigned pool.
#[derive(Debug, Default)]
pub struct BoardState {
    /// The date the buckets reflect. `None` until a board has been loaded.
    date: Option<NaiveDate>,
    /// Work-area name → employees placed there, in placement order. An
    /// employee appears in at most one bucket.
    buckets: BTreeMap<String, Vec<EmpId>>,
}

impl BoardState {
    pub fn new() -> Self {
        BoardState::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.date.is_some()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn bucket(&self, work_area: &str) -> &[EmpId] {
        self.buckets.get(work_area).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[EmpId])> {
        self.buckets.iter().map(|(area, bucket)| (area.as_str(), bucket.as_slice()))
    }

    /// The bucket currently holding `emp_id`, if any.
    pub fn work_area_of(&self, emp_id: &EmpId) -> Option<&str> {
        self.buckets
            .iter()
            .find(|(_, bucket)| bucket.contains(emp_id))
            .map(|(area, _)| area.as_str())
    }

    /// Everyone the cache knows who is not placed in any bucket.
    pub fn unassigned<'a>(&self, cache: &'a DatasetCache) -> Vec<&'a Employee> {
        cache
            .employees()
            .iter()
            .filter(|emp| self.work_area_of(&emp.emp_id).is_none())
            .collect()
    }

    pub fn placed_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Fetches the persisted assignments for `date` and rebuilds the buckets
    /// from them. A day with nothing saved is a valid, fully-unassigned board,
    /// not an error. Each placed employee's `current_work_area` is brought up
    /// to date.
    pub async fn load<T: Transport>(
        &mut self,
        date: NaiveDate,
        gateway: &Gateway<T>,
        cache: &mut DatasetCache,
    ) {
        let mut payload = Payload::new();
        payload.insert("date".to_string(), Value::String(date.to_string()));
        let records: Vec<Assignment> =
            match gateway.call(Action::GetAssignments, payload, cache).await {
                Ok(data) => envelope::rows(data),
                Err(err) => {
                    debug!(%date, %err, "no saved assignments for date");
                    Vec::new()
                }
            };

        self.rebuild(date, &records);
        for record in &records {
            if let Some(employee) = cache.employee_mut(&record.emp_id) {
                employee.current_work_area = Some(record.work_area.clone());
            }
        }
    }

    /// Rebuilds the buckets from a date's persisted records, dropping
    /// anything that would place an employee twice.
    pub fn rebuild(&mut self, date: NaiveDate, records: &[Assignment]) {
        self.date = Some(date);
        self.buckets.clear();
        for record in records {
            self.apply_move(&record.emp_id, None, Some(&record.work_area));
        }
    }

    /// The board's only mutation primitive. Each drag gesture arrives as one
    /// call: `None` is the unassigned pool. Removing is a no-op when the
    /// employee is not in `from`; placing strips the employee from every
    /// other bucket first, so even an event stream missing a remove cannot
    /// duplicate a card.
    pub fn apply_move(&mut self, emp_id: &EmpId, from: Option<&str>, to: Option<&str>) {
        if let Some(from) = from {
            if let Some(bucket) = self.buckets.get_mut(from) {
                bucket.retain(|id| id != emp_id);
            }
        }
        if let Some(to) = to {
            for (area, bucket) in self.buckets.iter_mut() {
                if area != to {
                    bucket.retain(|id| id != emp_id);
                }
            }
            let bucket = self.buckets.entry(to.to_string()).or_default();
            if !bucket.contains(emp_id) {
                bucket.push(emp_id.clone());
            }
        }
    }

    /// Flattens the buckets into the records that would be persisted for
    /// `date`. Fails without side effects when an employee is found in two
    /// buckets. Placed ids with no cached employee are skipped.
    pub fn snapshot(
        &self,
        date: NaiveDate,
        cache: &DatasetCache,
    ) -> Result<Vec<Assignment>, SaveError> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for (work_area, bucket) in &self.buckets {
            for emp_id in bucket {
                if !seen.insert(emp_id.clone()) {
                    return Err(SaveError::DuplicateAssignment(emp_id.clone()));
                }
                if let Some(employee) = cache.employee(emp_id) {
                    records.push(Assignment::snapshot(date, work_area, employee));
                }
            }
        }
        Ok(records)
    }

    /// Persists the whole board for `date` as one flat list, replacing
    /// whatever the store held for that date. Only after the remote write is
    /// confirmed are the cached assignments and each placed employee's
    /// `current_work_area` updated. Returns how many records were saved.
    pub async fn save<T: Transport>(
        &mut self,
        date: NaiveDate,
        gateway: &Gateway<T>,
        cache: &mut DatasetCache,
    ) -> Result<usize, SaveError> {
        let records = self.snapshot(date, cache)?;

        let mut payload = Payload::new();
        payload.insert(
            "assignments".to_string(),
            serde_json::to_value(&records).expect("assignment records should serialize"),
        );
        gateway.call(Action::SaveAssignments, payload, cache).await?;

        for record in &records {
            if let Some(employee) = cache.employee_mut(&record.emp_id) {
                employee.current_work_area = Some(record.work_area.clone());
            }
        }
        let count = records.len();
        cache.replace_date(date, records);
        self.date = Some(date);
        info!(%date, count, "assignments saved");
        Ok(count)
    }

    /// Persists an empty list for `date` (the same whole-date replace
    /// contract as `save`), then resets the local buckets.
    pub async fn clear<T: Transport>(
        &mut self,
        date: NaiveDate,
        gateway: &Gateway<T>,
        cache: &mut DatasetCache,
    ) -> Result<(), SaveError> {
        let mut payload = Payload::new();
        payload.insert("assignments".to_string(), Value::Array(Vec::new()));
        gateway.call(Action::SaveAssignments, payload, cache).await?;

        self.buckets.clear();
        self.date = Some(date);
        cache.replace_date(date, Vec::new());
        info!(%date, "assignments cleared");
        Ok(())
    }
}
