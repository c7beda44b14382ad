use chrono::NaiveDate;
use serde_json::Value;
use tracing::info;

use crate::board::{BoardState, SaveError};
use crate::cache::{DatasetCache, WriteError};
use crate::config::Config;
use crate::data::employee::{EmpId, EmployeeUpdate, NewEmployee};
use crate::data::vocabulary::VocabularyKind;
use crate::data::ValidationError;
use crate::remote::adapter::{AdapterError, Transport};
use crate::remote::gateway::Gateway;
use crate::remote::{Action, Payload};
use crate::report::{self, DateRange, Report, ReportFilters, ReportKind};

/// The owning coordinator: one explicit context holding the gateway, the
/// dataset cache, the board, and the handful of session flags. Every mutation
/// goes through `&mut self`, which is the only mutual exclusion there is; the
/// tool is single-user and user-paced.
pub struct Site<T: Transport> {
    config: Config,
    gateway: Gateway<T>,
    cache: DatasetCache,
    board: BoardState,
    admin_authenticated: bool,
    /// The one persisted preference: the last board date the user viewed.
    /// Durable storage of this single value is the embedder's concern.
    last_board_date: Option<NaiveDate>,
}

impl<T: Transport> Site<T> {
    pub fn new(transport: T, config: Config) -> Self {
        Site {
            gateway: Gateway::new(transport, &config),
            config,
            cache: DatasetCache::new(),
            board: BoardState::new(),
            admin_authenticated: false,
            last_board_date: None,
        }
    }

    /// Probes the store, loads the vocabulary, and fills the cache. Returns
    /// whether the store answered the probe; either way the site is usable
    /// afterwards (reads degrade to demo data).
    pub async fn init(&mut self) -> bool {
        let connected = self.gateway.ping().await;
        self.cache.load_vocabulary(&self.gateway).await;
        self.cache.refresh(&self.gateway, &self.config).await;
        info!(connected, "site initialized");
        connected
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn demo_mode(&self) -> bool {
        self.gateway.demo_mode()
    }

    pub fn is_admin(&self) -> bool {
        self.admin_authenticated
    }

    pub fn last_board_date(&self) -> Option<NaiveDate> {
        self.last_board_date
    }

    pub async fn refresh(&mut self) {
        self.cache.refresh(&self.gateway, &self.config).await;
    }

    /// Registers an employee: local validation, a remote duplicate check on
    /// (name, phone), then the insert. Returns the store-assigned id.
    pub async fn register_employee(&mut self, employee: NewEmployee) -> Result<EmpId, WriteError> {
        employee.validate()?;

        let mut payload = Payload::new();
        payload.insert("name".to_string(), Value::String(employee.name.clone()));
        payload.insert("phone".to_string(), Value::String(employee.phone.clone()));
        let check = self.gateway.call(Action::CheckDuplicate, payload, &self.cache).await?;
        if check.get("isDuplicate").and_then(Value::as_bool).unwrap_or(false) {
            return Err(ValidationError::DuplicateEmployee.into());
        }

        let mut payload = Payload::new();
        payload.insert(
            "employee".to_string(),
            serde_json::to_value(&employee).expect("registration input should serialize"),
        );
        let created = self.gateway.call(Action::AddEmployee, payload, &self.cache).await?;
        let emp_id = created
            .get("empId")
            .and_then(Value::as_str)
            .map(EmpId::new)
            .ok_or_else(|| AdapterError::Remote("insert response carried no empId".to_string()))?;

        info!(%emp_id, "employee registered");
        self.cache.refresh(&self.gateway, &self.config).await;
        Ok(emp_id)
    }

    /// Pushes an edit to the store and, once confirmed, writes it into the
    /// cached employee.
    pub async fn update_employee(
        &mut self,
        emp_id: &EmpId,
        update: EmployeeUpdate,
    ) -> Result<(), WriteError> {
        update.validate()?;

        let mut payload = Payload::new();
        payload.insert("empId".to_string(), Value::String(emp_id.to_string()));
        payload.insert(
            "employee".to_string(),
            serde_json::to_value(&update).expect("employee update should serialize"),
        );
        self.gateway.call(Action::UpdateEmployee, payload, &self.cache).await?;

        if let Some(employee) = self.cache.employee_mut(emp_id) {
            update.apply_to(employee);
        }
        Ok(())
    }

    /// Deletes on the store first, then locally.
    pub async fn delete_employee(&mut self, emp_id: &EmpId) -> Result<(), WriteError> {
        let mut payload = Payload::new();
        payload.insert("empId".to_string(), Value::String(emp_id.to_string()));
        self.gateway.call(Action::DeleteEmployee, payload, &self.cache).await?;
        self.cache.remove_employee(emp_id);
        info!(%emp_id, "employee deleted");
        Ok(())
    }

    /// Checks the shared PIN against the store. A positive answer unlocks the
    /// admin-only vocabulary management in the embedding UI.
    pub async fn authenticate_admin(&mut self, pin: &str) -> Result<bool, AdapterError> {
        let mut payload = Payload::new();
        payload.insert("pin".to_string(), Value::String(pin.to_string()));
        let result = self.gateway.call(Action::AuthenticateAdmin, payload, &self.cache).await?;
        let valid = result.get("isValid").and_then(Value::as_bool).unwrap_or(false);
        self.admin_authenticated = valid;
        Ok(valid)
    }

    pub async fn add_vocabulary_item(
        &mut self,
        kind: VocabularyKind,
        value: &str,
    ) -> Result<(), WriteError> {
        self.cache.add_item(&self.gateway, kind, value).await
    }

    pub async fn remove_vocabulary_item(
        &mut self,
        kind: VocabularyKind,
        index: usize,
    ) -> Result<String, WriteError> {
        self.cache.remove_item(&self.gateway, kind, index).await
    }

    pub async fn sync_work_areas(&mut self) -> usize {
        self.cache.sync_work_areas(&self.gateway).await
    }

    /// Loads the board for `date` and remembers the date as the last one
    /// viewed.
    pub async fn load_board(&mut self, date: NaiveDate) {
        self.board.load(date, &self.gateway, &mut self.cache).await;
        self.last_board_date = Some(date);
    }

    /// Forwards one drag gesture to the board.
    pub fn apply_move(&mut self, emp_id: &EmpId, from: Option<&str>, to: Option<&str>) {
        self.board.apply_move(emp_id, from, to);
    }

    pub async fn save_board(&mut self, date: NaiveDate) -> Result<usize, SaveError> {
        self.board.save(date, &self.gateway, &mut self.cache).await
    }

    pub async fn clear_board(&mut self, date: NaiveDate) -> Result<(), SaveError> {
        self.board.clear(date, &self.gateway, &mut self.cache).await
    }

    pub async fn generate_report(
        &self,
        kind: ReportKind,
        start: NaiveDate,
        end: NaiveDate,
        filters: &ReportFilters,
    ) -> Result<Report, ValidationError> {
        let range = DateRange::new(start, end)?;
        Ok(report::generate(kind, range, filters, &self.gateway, &self.cache).await)
    }
}
