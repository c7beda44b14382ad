use std::fmt;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// An opaque identifier assigned by the remote store when an employee is
/// registered. Never changes for the lifetime of the employee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmpId(String);

impl EmpId {
    pub fn new(id: impl Into<String>) -> Self {
        EmpId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an employee is on the company's own payroll or hired with rented
/// equipment. The serialized names are the exact strings the remote store
/// keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "Own Company")]
    OwnCompany,
    #[serde(rename = "Rental")]
    Rental,
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmploymentType::OwnCompany => f.write_str("Own Company"),
            EmploymentType::Rental => f.write_str("Rental"),
        }
    }
}

/// A registered employee as held in the dataset cache and on the remote
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub emp_id: EmpId,
    pub name: String,
    pub designation: String,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub machine: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// The work area chosen on the registration form, before any board has
    /// placed the employee anywhere.
    #[serde(default)]
    pub work_area: Option<String>,
    /// The work area of the most recently loaded or saved board placement.
    #[serde(default)]
    pub current_work_area: Option<String>,
}

/// Registration input. No `emp_id` yet; the remote store assigns one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub name: String,
    pub designation: String,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    pub machine: Option<String>,
    pub work_area: Option<String>,
    pub phone: String,
    pub notes: Option<String>,
}

/// The fields an edit may change. `emp_id` is immutable and `notes` is only
/// set at registration time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    pub name: String,
    pub designation: String,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    pub machine: Option<String>,
    pub phone: String,
}

impl NewEmployee {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_phone(&self.phone)?;
        if let Some(notes) = &self.notes {
            if notes.chars().count() > 500 {
                return Err(ValidationError::NotesTooLong);
            }
        }
        Ok(())
    }
}

impl EmployeeUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_phone(&self.phone)
    }

    /// Writes the update into a cached employee. Called only after the remote
    /// store has confirmed the same update.
    pub fn apply_to(&self, employee: &mut Employee) {
        employee.name = self.name.clone();
        employee.designation = self.designation.clone();
        employee.employment_type = self.employment_type;
        employee.machine = self.machine.clone();
        employee.phone = self.phone.clone();
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if !(2..=50).contains(&len) {
        return Err(ValidationError::NameLength);
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() != 10 || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(())
}
