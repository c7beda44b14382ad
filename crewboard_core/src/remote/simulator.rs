use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::DatasetCache;
use crate::config::Config;
use crate::data::employee::{EmpId, Employee, EmploymentType};
use crate::data::vocabulary::Vocabulary;

use super::{Action, Payload};

/// Pure in-memory responder that mimics the remote read contract using only
/// data already resident in the cache. Never fabricates writes; actions it
/// does not recognize resolve to an empty result.
pub struct Simulator {
    latency: Duration,
}

impl Simulator {
    pub fn new(config: &Config) -> Self {
        Simulator { latency: config.simulator_latency }
    }

    pub async fn simulate(&self, action: Action, payload: &Payload, cache: &DatasetCache) -> Value {
        tokio::time::sleep(self.latency).await;
        debug!(action = action.wire_name(), "answering from demo data");

        match action {
            Action::GetDropdowns => to_json(&Vocabulary::defaults()),
            Action::GetEmployees => {
                if cache.employees().is_empty() {
                    to_json(&seed_employees())
                } else {
                    to_json(cache.employees())
                }
            }
            Action::GetAssignments => {
                let date = payload
                    .get("date")
                    .and_then(Value::as_str)
                    .and_then(|text| text.parse().ok());
                match date {
                    Some(date) => {
                        let matching: Vec<_> =
                            cache.assignments().iter().filter(|a| a.date == date).collect();
                        to_json(&matching)
                    }
                    None => Value::Array(Vec::new()),
                }
            }
            Action::GetReport => {
                let filters = payload.get("filters").and_then(Value::as_object);
                let start = filters
                    .and_then(|f| f.get("startDate"))
                    .and_then(Value::as_str)
                    .and_then(|text| text.parse::<chrono::NaiveDate>().ok());
                let end = filters
                    .and_then(|f| f.get("endDate"))
                    .and_then(Value::as_str)
                    .and_then(|text| text.parse::<chrono::NaiveDate>().ok());
                match (start, end) {
                    (Some(start), Some(end)) => {
                        let matching: Vec<_> = cache
                            .assignments()
                            .iter()
                            .filter(|a| start <= a.date && a.date <= end)
                            .collect();
                        to_json(&matching)
                    }
                    _ => to_json(cache.assignments()),
                }
            }
            _ => Value::Array(Vec::new()),
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(data: &T) -> Value {
    serde_json::to_value(data).expect("in-memory data should serialize")
}

/// Two example employees shown when nothing at all has been loaded, so an
/// offline first run still has cards to drag around.
fn seed_employees() -> Vec<Employee> {
    vec![
        Employee {
            emp_id: EmpId::new("EMP001"),
            name: "Bala Sai".to_string(),
            designation: "Mech Engineer".to_string(),
            employment_type: EmploymentType::OwnCompany,
            machine: None,
            phone: "8367617012".to_string(),
            notes: Some("Sample employee".to_string()),
            work_area: Some("ch154 - ch159 - RamBabu".to_string()),
            current_work_area: None,
        },
        Employee {
            emp_id: EmpId::new("EMP002"),
            name: "John Doe".to_string(),
            designation: "Supervisor".to_string(),
            employment_type: EmploymentType::Rental,
            machine: Some("Excavator-01".to_string()),
            phone: "9876543211".to_string(),
            notes: Some("Sample employee".to_string()),
            work_area: Some("ch159 - ch165 - Shyam".to_string()),
            current_work_area: None,
        },
    ]
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::data::assignment::Assignment;
    use crate::remote::envelope;
    use crate::remote::testutil::test_config;

    use super::*;

    fn gen_simulator() -> Simulator {
        Simulator::new(&test_config())
    }

    fn gen_employee(emp_id: &str) -> Employee {
        Employee {
            emp_id: EmpId::new(emp_id),
            name: "Worker".to_string(),
            designation: "Foreman".to_string(),
            employment_type: EmploymentType::OwnCompany,
            machine: None,
            phone: "1234567890".to_string(),
            notes: None,
            work_area: None,
            current_work_area: None,
        }
    }

    fn gen_assignment(emp_id: &str, date: NaiveDate, work_area: &str) -> Assignment {
        Assignment::snapshot(date, work_area, &gen_employee(emp_id))
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[tokio::test]
    async fn empty_cache_yields_the_seeded_examples() {
        let cache = DatasetCache::new();
        let data = gen_simulator().simulate(Action::GetEmployees, &Payload::new(), &cache).await;
        let employees: Vec<Employee> = envelope::rows(data);
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[0].emp_id, EmpId::new("EMP001"));
        assert_eq!(employees[1].emp_id, EmpId::new("EMP002"));
    }

    #[tokio::test]
    async fn populated_cache_is_returned_as_is() {
        let mut cache = DatasetCache::new();
        cache.set_employees(vec![gen_employee("EMP042")]);
        let data = gen_simulator().simulate(Action::GetEmployees, &Payload::new(), &cache).await;
        let employees: Vec<Employee> = envelope::rows(data);
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].emp_id, EmpId::new("EMP042"));
    }

    #[tokio::test]
    async fn assignments_filter_by_exact_date() {
        let mut cache = DatasetCache::new();
        cache.set_assignments(vec![
            gen_assignment("EMP001", date(10), "Tunnel Zone-1"),
            gen_assignment("EMP002", date(11), "Tunnel Zone-2"),
        ]);
        let mut payload = Payload::new();
        payload.insert("date".to_string(), json!("2024-01-10"));
        let data = gen_simulator().simulate(Action::GetAssignments, &payload, &cache).await;
        let rows: Vec<Assignment> = envelope::rows(data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(10));
    }

    #[tokio::test]
    async fn report_filters_by_inclusive_range() {
        let mut cache = DatasetCache::new();
        cache.set_assignments(vec![
            gen_assignment("EMP001", date(1), "Office Area"),
            gen_assignment("EMP001", date(15), "Office Area"),
            gen_assignment("EMP001", date(31), "Office Area"),
        ]);
        let mut payload = Payload::new();
        payload.insert(
            "filters".to_string(),
            json!({ "startDate": "2024-01-01", "endDate": "2024-01-15" }),
        );
        let data = gen_simulator().simulate(Action::GetReport, &payload, &cache).await;
        let rows: Vec<Assignment> = envelope::rows(data);
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn dropdowns_are_the_builtin_defaults() {
        let cache = DatasetCache::new();
        let data = gen_simulator().simulate(Action::GetDropdowns, &Payload::new(), &cache).await;
        let vocab: Vocabulary = serde_json::from_value(data).unwrap();
        assert_eq!(vocab, Vocabulary::defaults());
    }

    #[tokio::test]
    async fn write_style_actions_resolve_to_an_empty_result() {
        let cache = DatasetCache::new();
        let data = gen_simulator().simulate(Action::SaveAssignments, &Payload::new(), &cache).await;
        assert_eq!(data, json!([]));
    }
}
