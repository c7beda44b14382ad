pub mod adapter;
pub mod envelope;
pub mod gateway;
pub mod simulator;

/// The fixed set of actions the remote endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Ping,
    GetDropdowns,
    GetEmployees,
    GetAssignments,
    GetReport,
    CheckDuplicate,
    AddEmployee,
    UpdateEmployee,
    DeleteEmployee,
    SaveAssignments,
    AuthenticateAdmin,
    AddDropdownItem,
    RemoveDropdownItem,
}

impl Action {
    /// The action name as the endpoint expects it in the query string.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Action::Ping => "ping",
            Action::GetDropdowns => "getDropdowns",
            Action::GetEmployees => "getEmployees",
            Action::GetAssignments => "getAssignments",
            Action::GetReport => "getReport",
            Action::CheckDuplicate => "checkDuplicate",
            Action::AddEmployee => "addEmployee",
            Action::UpdateEmployee => "updateEmployee",
            Action::DeleteEmployee => "deleteEmployee",
            Action::SaveAssignments => "saveAssignments",
            Action::AuthenticateAdmin => "authenticateAdmin",
            Action::AddDropdownItem => "addDropdownItem",
            Action::RemoveDropdownItem => "removeDropdownItem",
        }
    }

    /// Read-style actions fall back to the in-memory simulator when the
    /// remote store is unreachable; everything else propagates the failure.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Action::GetDropdowns | Action::GetEmployees | Action::GetAssignments | Action::GetReport
        )
    }
}

/// Payload fields for one remote call, keyed the way the endpoint expects
/// them. Values are plain JSON; the adapter flattens them into query
/// parameters at the boundary.
pub type Payload = serde_json::Map<String, serde_json::Value>;
