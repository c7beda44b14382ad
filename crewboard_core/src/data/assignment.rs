use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::employee::{EmpId, Employee, EmploymentType};

/// One employee placed in one work area on one date, with the employee's
/// fields denormalized at the moment the board was saved. At most one record
/// exists per (date, employee) pair; a date's records are only ever replaced
/// wholesale, never edited field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub date: NaiveDate,
    pub work_area: String,
    pub emp_id: EmpId,
    pub name: String,
    pub designation: String,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub machine: String,
    pub phone: String,
}

impl Assignment {
    /// Snapshots an employee into a record for `work_area` on `date`.
    pub fn snapshot(date: NaiveDate, work_area: &str, employee: &Employee) -> Self {
        Assignment {
            date,
            work_area: work_area.to_string(),
            emp_id: employee.emp_id.clone(),
            name: employee.name.clone(),
            designation: employee.designation.clone(),
            employment_type: employee.employment_type,
            machine: employee.machine.clone().unwrap_or_default(),
            phone: employee.phone.clone(),
        }
    }
}
