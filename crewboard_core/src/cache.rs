use chrono::{Days, Local, NaiveDate};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::data::assignment::Assignment;
use crate::data::employee::{EmpId, Employee};
use crate::data::vocabulary::{Vocabulary, VocabularyKind};
use crate::data::ValidationError;
use crate::remote::adapter::{AdapterError, Transport};
use crate::remote::gateway::Gateway;
use crate::remote::{envelope, Action, Payload};

/// A confirmed-write operation failed, either on a local constraint or on the
/// remote store. Local state is unchanged in both cases.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] AdapterError),
}

/// The process-wide store of employees, the trailing window of assignment
/// history, and the dropdown vocabulary. Owned by the coordinator and passed
/// explicitly to whatever needs it; all writes go through `&mut self`.
pub struct DatasetCache {
    employees: Vec<Employee>,
    assignments: Vec<Assignment>,
    vocabulary: Vocabulary,
}

impl DatasetCache {
    pub fn new() -> Self {
        DatasetCache {
            employees: Vec::new(),
            assignments: Vec::new(),
            vocabulary: Vocabulary::default(),
        }
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn employee(&self, emp_id: &EmpId) -> Option<&Employee> {
        self.employees.iter().find(|emp| &emp.emp_id == emp_id)
    }

    pub fn employee_mut(&mut self, emp_id: &EmpId) -> Option<&mut Employee> {
        self.employees.iter_mut().find(|emp| &emp.emp_id == emp_id)
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn set_employees(&mut self, employees: Vec<Employee>) {
        self.employees = employees;
    }

    pub fn set_assignments(&mut self, assignments: Vec<Assignment>) {
        self.assignments = assignments;
        self.recompute_work_areas();
    }

    pub fn remove_employee(&mut self, emp_id: &EmpId) {
        self.employees.retain(|emp| &emp.emp_id != emp_id);
    }

    /// Swaps out everything stored for `date`. Assignment records are only
    /// ever replaced wholesale per date.
    pub fn replace_date(&mut self, date: NaiveDate, records: Vec<Assignment>) {
        self.assignments.retain(|a| a.date != date);
        self.assignments.extend(records);
    }

    /// Repopulates employees and the trailing assignment window. Each
    /// sub-resource loads independently; a failed one resets to empty instead
    /// of raising.
    pub async fn refresh<T: Transport>(&mut self, gateway: &Gateway<T>, config: &Config) {
        let employees = gateway.call(Action::GetEmployees, Payload::new(), self).await;
        self.employees = match employees {
            Ok(data) => envelope::rows(data),
            Err(err) => {
                warn!(%err, "employee load failed, cache reset");
                Vec::new()
            }
        };

        let today = Local::now().date_naive();
        let start = today - Days::new(u64::from(config.assignment_window_days));
        let mut payload = Payload::new();
        payload.insert("filters".to_string(), json!({ "startDate": start, "endDate": today }));
        let history = gateway.call(Action::GetReport, payload, self).await;
        self.assignments = match history {
            Ok(data) => envelope::rows(data),
            Err(err) => {
                warn!(%err, "assignment history load failed, cache reset");
                Vec::new()
            }
        };

        self.recompute_work_areas();
        info!(
            employees = self.employees.len(),
            assignments = self.assignments.len(),
            work_areas = self.vocabulary.work_areas.len(),
            "cache refreshed"
        );
    }

    /// Fetches the vocabulary, falling back to the built-in defaults when the
    /// store has nothing usable, then folds in work areas already seen in
    /// assignment history.
    pub async fn load_vocabulary<T: Transport>(&mut self, gateway: &Gateway<T>) {
        let dropdowns = gateway.call(Action::GetDropdowns, Payload::new(), self).await;
        self.vocabulary = match dropdowns {
            Ok(data) => match serde_json::from_value::<Vocabulary>(data) {
                Ok(vocab) if !vocab.designations.is_empty() => vocab,
                _ => Vocabulary::defaults(),
            },
            Err(_) => Vocabulary::defaults(),
        };
        self.recompute_work_areas();
    }

    /// Persists a new vocabulary entry, appending locally only once the
    /// remote write is confirmed.
    pub async fn add_item<T: Transport>(
        &mut self,
        gateway: &Gateway<T>,
        kind: VocabularyKind,
        value: &str,
    ) -> Result<(), WriteError> {
        self.vocabulary.validate_add(kind, value)?;
        let mut payload = Payload::new();
        payload.insert("type".to_string(), Value::String(kind.wire_name().to_string()));
        payload.insert("value".to_string(), Value::String(value.to_string()));
        gateway.call(Action::AddDropdownItem, payload, self).await?;
        self.vocabulary.apply_add(kind, value.to_string());
        Ok(())
    }

    /// Persists a remove-by-position, deleting locally only once the remote
    /// write is confirmed. Returns the removed entry.
    pub async fn remove_item<T: Transport>(
        &mut self,
        gateway: &Gateway<T>,
        kind: VocabularyKind,
        index: usize,
    ) -> Result<String, WriteError> {
        self.vocabulary.validate_remove(kind, index)?;
        let mut payload = Payload::new();
        payload.insert("type".to_string(), Value::String(kind.wire_name().to_string()));
        payload.insert("index".to_string(), json!(index));
        gateway.call(Action::RemoveDropdownItem, payload, self).await?;
        Ok(self.vocabulary.apply_remove(kind, index))
    }

    /// Sweeps the whole assignment history for work-area names that predate
    /// the current vocabulary and merges them in. Returns how many new names
    /// were discovered.
    pub async fn sync_work_areas<T: Transport>(&mut self, gateway: &Gateway<T>) -> usize {
        let mut payload = Payload::new();
        payload.insert(
            "filters".to_string(),
            json!({ "startDate": "2020-01-01", "endDate": "2030-12-31" }),
        );
        let swept: Vec<Assignment> = match gateway.call(Action::GetReport, payload, self).await {
            Ok(data) => envelope::rows(data),
            Err(err) => {
                warn!(%err, "work-area sweep failed");
                Vec::new()
            }
        };

        let before = self.vocabulary.work_areas.len();
        self.vocabulary.merge_work_areas(swept.iter().map(|a| a.work_area.as_str()));
        self.recompute_work_areas();
        self.vocabulary.work_areas.len() - before
    }

    fn recompute_work_areas(&mut self) {
        self.vocabulary.merge_work_areas(self.assignments.iter().map(|a| a.work_area.as_str()));
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        DatasetCache::new()
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use crate::data::employee::EmploymentType;
    use crate::remote::adapter::TransportFailure;
    use crate::remote::testutil::{ok_envelope, test_config, FakeTransport};

    use super::*;

    fn gen_employee_value(emp_id: &str) -> Value {
        json!({
            "empId": emp_id,
            "name": "Worker",
            "designation": "Foreman",
            "type": "Own Company",
            "phone": "1234567890",
        })
    }

    fn gen_assignment_value(emp_id: &str, date: &str, work_area: &str) -> Value {
        json!({
            "date": date,
            "workArea": work_area,
            "empId": emp_id,
            "name": "Worker",
            "designation": "Foreman",
            "type": "Own Company",
            "machine": "",
            "phone": "1234567890",
        })
    }

    fn gen_gateway(transport: FakeTransport) -> Gateway<FakeTransport> {
        Gateway::new(transport, &test_config())
    }

    #[tokio::test]
    async fn refresh_accepts_bare_and_enveloped_row_shapes() {
        // employees arrive bare, the report arrives nested under `data`
        let transport = FakeTransport::new(|request| match request.action {
            "getEmployees" => Ok(ok_envelope(json!([gen_employee_value("EMP001")]))),
            "getReport" => Ok(ok_envelope(json!({
                "data": [gen_assignment_value("EMP001", "2024-01-10", "Tunnel Zone-1")]
            }))),
            _ => Ok(ok_envelope(json!([]))),
        });
        let gateway = gen_gateway(transport);
        let mut cache = DatasetCache::new();
        cache.refresh(&gateway, &test_config()).await;
        assert_eq!(cache.employees().len(), 1);
        assert_eq!(cache.assignments().len(), 1);
    }

    #[tokio::test]
    async fn refresh_discovers_work_areas_from_assignments() {
        let transport = FakeTransport::new(|request| match request.action {
            "getReport" => Ok(ok_envelope(json!([
                gen_assignment_value("EMP001", "2024-01-10", "Cut & Cover East"),
                gen_assignment_value("EMP002", "2024-01-10", "Cut & Cover East"),
            ]))),
            _ => Ok(ok_envelope(json!([]))),
        });
        let gateway = gen_gateway(transport);
        let mut cache = DatasetCache::new();
        cache.load_vocabulary(&gateway).await;
        cache.refresh(&gateway, &test_config()).await;

        // defaults first, then the discovered name exactly once
        let work_areas = &cache.vocabulary().work_areas;
        assert_eq!(work_areas[..12], Vocabulary::defaults().work_areas[..]);
        assert_eq!(work_areas[12], "Cut & Cover East");
        assert_eq!(work_areas.len(), 13);
    }

    #[tokio::test]
    async fn empty_dropdowns_fall_back_to_the_defaults() {
        let gateway = gen_gateway(FakeTransport::always_ok(json!({
            "designations": [], "machines": [], "workAreas": []
        })));
        let mut cache = DatasetCache::new();
        cache.load_vocabulary(&gateway).await;
        assert_eq!(cache.vocabulary(), &Vocabulary::defaults());
    }

    #[tokio::test]
    async fn add_item_appends_only_after_the_remote_write_succeeds() {
        let gateway = gen_gateway(FakeTransport::always_ok(json!({})));
        let mut cache = DatasetCache::new();
        cache.add_item(&gateway, VocabularyKind::WorkAreas, "Zone-9").await.unwrap();
        assert_eq!(cache.vocabulary().work_areas, vec!["Zone-9".to_string()]);
    }

    #[tokio::test]
    async fn add_item_rejects_duplicates_without_a_remote_call() {
        let transport = FakeTransport::always_ok(json!({}));
        let gateway = gen_gateway(transport);
        let mut cache = DatasetCache::new();
        cache.add_item(&gateway, VocabularyKind::WorkAreas, "Zone-9").await.unwrap();

        let err = cache.add_item(&gateway, VocabularyKind::WorkAreas, "Zone-9").await.unwrap_err();
        assert!(matches!(err, WriteError::Validation(ValidationError::DuplicateItem)));
        assert_eq!(cache.vocabulary().work_areas, vec!["Zone-9".to_string()]);
    }

    #[tokio::test]
    async fn failed_remote_add_leaves_the_vocabulary_unchanged() {
        let transport = FakeTransport::new(|_| {
            Err(TransportFailure("connection refused".to_string()))
        });
        let gateway = gen_gateway(transport);
        let mut cache = DatasetCache::new();
        let err = cache.add_item(&gateway, VocabularyKind::Machines, "Crane-03").await.unwrap_err();
        assert!(matches!(err, WriteError::Remote(_)));
        assert!(cache.vocabulary().machines.is_empty());
    }

    #[tokio::test]
    async fn remove_item_out_of_range_is_rejected_locally() {
        let transport = FakeTransport::always_ok(json!({}));
        let log = transport.log();
        let gateway = gen_gateway(transport);
        let mut cache = DatasetCache::new();
        cache.add_item(&gateway, VocabularyKind::Machines, "Crane-03").await.unwrap();
        let calls_before = log.count();

        let err = cache.remove_item(&gateway, VocabularyKind::Machines, 5).await.unwrap_err();
        assert!(matches!(
            err,
            WriteError::Validation(ValidationError::IndexOutOfRange(5))
        ));
        assert_eq!(log.count(), calls_before);
        assert_eq!(cache.vocabulary().machines, vec!["Crane-03".to_string()]);
    }

    #[tokio::test]
    async fn remove_item_deletes_by_position_after_remote_confirmation() {
        let gateway = gen_gateway(FakeTransport::always_ok(json!({})));
        let mut cache = DatasetCache::new();
        cache.add_item(&gateway, VocabularyKind::Designations, "Foreman").await.unwrap();
        cache.add_item(&gateway, VocabularyKind::Designations, "Driver").await.unwrap();
        let removed =
            cache.remove_item(&gateway, VocabularyKind::Designations, 0).await.unwrap();
        assert_eq!(removed, "Foreman");
        assert_eq!(cache.vocabulary().designations, vec!["Driver".to_string()]);
    }

    #[tokio::test]
    async fn sync_work_areas_merges_historical_names() {
        let transport = FakeTransport::new(|request| match request.action {
            "getReport" => Ok(ok_envelope(json!([
                gen_assignment_value("EMP001", "2021-06-01", "Old Camp"),
            ]))),
            _ => Ok(ok_envelope(json!([]))),
        });
        let gateway = gen_gateway(transport);
        let mut cache = DatasetCache::new();
        let added = cache.sync_work_areas(&gateway).await;
        assert_eq!(added, 1);
        assert!(cache.vocabulary().work_areas.contains(&"Old Camp".to_string()));
    }

    #[tokio::test]
    async fn replace_date_swaps_a_single_day() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let other = NaiveDate::from_ymd_opt(2024, 1, 11).unwrap();
        let mut cache = DatasetCache::new();
        let employee = Employee {
            emp_id: EmpId::new("EMP001"),
            name: "Worker".to_string(),
            designation: "Foreman".to_string(),
            employment_type: EmploymentType::OwnCompany,
            machine: None,
            phone: "1234567890".to_string(),
            notes: None,
            work_area: None,
            current_work_area: None,
        };
        cache.set_assignments(vec![
            Assignment::snapshot(date, "Office Area", &employee),
            Assignment::snapshot(other, "Storage Yard", &employee),
        ]);

        cache.replace_date(date, vec![Assignment::snapshot(date, "Tunnel Zone-1", &employee)]);
        assert_eq!(cache.assignments().len(), 2);
        let on_date: Vec<_> = cache.assignments().iter().filter(|a| a.date == date).collect();
        assert_eq!(on_date.len(), 1);
        assert_eq!(on_date[0].work_area, "Tunnel Zone-1");
    }
}
