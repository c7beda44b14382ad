use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::cache::DatasetCache;
use crate::data::assignment::Assignment;
use crate::data::employee::{EmpId, EmploymentType};
use crate::data::ValidationError;
use crate::remote::adapter::Transport;
use crate::remote::gateway::Gateway;
use crate::remote::{envelope, Action, Payload};

/// Shown wherever an employee has no assignment history and no stored area.
pub const NOT_ASSIGNED: &str = "Not Assigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// One row per assignment record in range.
    Assignment,
    /// One row per known employee with a resolved current work area.
    Employee,
    /// One row per known employee with in-range totals.
    Summary,
}

/// An inclusive calendar-date range, valid by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedDateRange);
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Filter predicates applied to every row, in order. An unset filter imposes
/// no constraint.
#[derive(Debug, Clone, Default)]
pub struct ReportFilters {
    pub work_area: Option<String>,
    pub designation: Option<String>,
    pub employment_type: Option<EmploymentType>,
}

impl ReportFilters {
    fn passes(&self, work_area: &str, designation: &str, employment_type: EmploymentType) -> bool {
        if let Some(filter) = &self.work_area {
            if !flexible_area_match(work_area, filter) {
                return false;
            }
        }
        if let Some(filter) = &self.designation {
            if designation != filter {
                return false;
            }
        }
        if let Some(filter) = self.employment_type {
            if employment_type != filter {
                return false;
            }
        }
        true
    }
}

/// Historical records name the same zone inconsistently ("Tunnel Zone-1" vs
/// "tunnel"), so the work-area filter accepts an exact match or a
/// case-insensitive containment in either direction.
fn flexible_area_match(stored: &str, filter: &str) -> bool {
    if stored == filter {
        return true;
    }
    let stored = stored.to_lowercase();
    let filter = filter.to_lowercase();
    stored.contains(&filter) || filter.contains(&stored)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRow {
    pub emp_id: EmpId,
    pub name: String,
    pub designation: String,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    pub machine: Option<String>,
    pub work_area: String,
    pub phone: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub emp_id: EmpId,
    pub name: String,
    pub designation: String,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    pub machine: Option<String>,
    /// Most recent area on record, or the joined list of in-range areas.
    pub work_area: String,
    pub phone: String,
    pub total_days_worked: usize,
    pub work_areas_count: usize,
}

/// An ordered row sequence of one of the three kinds. This is the only input
/// contract the export layers consume.
#[derive(Debug, PartialEq)]
pub enum Report {
    Assignment(Vec<Assignment>),
    Employee(Vec<EmployeeRow>),
    Summary(Vec<SummaryRow>),
}

impl Report {
    pub fn len(&self) -> usize {
        match self {
            Report::Assignment(rows) => rows.len(),
            Report::Employee(rows) => rows.len(),
            Report::Summary(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregates for the stat cards: total rows, distinct employees, and
    /// per-work-area / per-employment-type breakdowns in first-appearance
    /// order.
    pub fn stats(&self) -> ReportStats {
        let mut stats = ReportStats { total_rows: self.len(), ..ReportStats::default() };
        let mut seen = std::collections::HashSet::new();
        let mut tally = |emp_id: &EmpId, work_area: &str, employment_type: EmploymentType| {
            if seen.insert(emp_id.clone()) {
                stats.distinct_employees += 1;
            }
            bump(&mut stats.by_work_area, work_area);
            bump(&mut stats.by_employment_type, &employment_type.to_string());
        };
        match self {
            Report::Assignment(rows) => {
                for row in rows {
                    tally(&row.emp_id, &row.work_area, row.employment_type);
                }
            }
            Report::Employee(rows) => {
                for row in rows {
                    tally(&row.emp_id, &row.work_area, row.employment_type);
                }
            }
            Report::Summary(rows) => {
                for row in rows {
                    tally(&row.emp_id, &row.work_area, row.employment_type);
                }
            }
        }
        stats
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub total_rows: usize,
    pub distinct_employees: usize,
    pub by_work_area: Vec<(String, usize)>,
    pub by_employment_type: Vec<(String, usize)>,
}

fn bump(counts: &mut Vec<(String, usize)>, key: &str) {
    match counts.iter_mut().find(|(existing, _)| existing == key) {
        Some((_, count)) => *count += 1,
        None => counts.push((key.to_string(), 1)),
    }
}

/// Derives the requested rows from the cache and the remote store. Only the
/// assignment kind consults the store, and it degrades to cached data rather
/// than failing.
pub async fn generate<T: Transport>(
    kind: ReportKind,
    range: DateRange,
    filters: &ReportFilters,
    gateway: &Gateway<T>,
    cache: &DatasetCache,
) -> Report {
    match kind {
        ReportKind::Assignment => {
            Report::Assignment(assignment_rows(range, filters, gateway, cache).await)
        }
        ReportKind::Employee => Report::Employee(employee_rows(filters, cache)),
        ReportKind::Summary => Report::Summary(summary_rows(range, filters, cache)),
    }
}

async fn assignment_rows<T: Transport>(
    range: DateRange,
    filters: &ReportFilters,
    gateway: &Gateway<T>,
    cache: &DatasetCache,
) -> Vec<Assignment> {
    let mut remote_filters = json!({ "startDate": range.start, "endDate": range.end });
    if let Some(area) = &filters.work_area {
        remote_filters["workArea"] = json!(area);
    }
    if let Some(designation) = &filters.designation {
        remote_filters["designation"] = json!(designation);
    }
    if let Some(employment_type) = filters.employment_type {
        remote_filters["type"] = json!(employment_type);
    }
    let mut payload = Payload::new();
    payload.insert("filters".to_string(), remote_filters);

    let mut rows: Vec<Assignment> = match gateway.call(Action::GetReport, payload, cache).await {
        Ok(data) => envelope::rows(data),
        Err(err) => {
            warn!(%err, "report read failed, using cached assignments");
            Vec::new()
        }
    };
    if rows.is_empty() {
        rows = cache.assignments().iter().filter(|a| range.contains(a.date)).cloned().collect();
    }
    rows.retain(|a| filters.passes(&a.work_area, &a.designation, a.employment_type));
    rows
}

/// The most recent assignment's work area for an employee, across everything
/// cached. Same-date ties resolve to the lexicographically least area name so
/// the result does not depend on load order.
fn latest_work_area<'a>(cache: &'a DatasetCache, emp_id: &EmpId) -> Option<&'a str> {
    let mut best: Option<&Assignment> = None;
    for assignment in cache.assignments().iter().filter(|a| &a.emp_id == emp_id) {
        let better = match best {
            None => true,
            Some(current) => {
                assignment.date > current.date
                    || (assignment.date == current.date && assignment.work_area < current.work_area)
            }
        };
        if better {
            best = Some(assignment);
        }
    }
    best.map(|a| a.work_area.as_str())
}

fn employee_rows(filters: &ReportFilters, cache: &DatasetCache) -> Vec<EmployeeRow> {
    cache
        .employees()
        .iter()
        .map(|emp| {
            let work_area = latest_work_area(cache, &emp.emp_id)
                .map(str::to_string)
                .or_else(|| emp.current_work_area.clone())
                .or_else(|| emp.work_area.clone())
                .unwrap_or_else(|| NOT_ASSIGNED.to_string());
            EmployeeRow {
                emp_id: emp.emp_id.clone(),
                name: emp.name.clone(),
                designation: emp.designation.clone(),
                employment_type: emp.employment_type,
                machine: emp.machine.clone(),
                work_area,
                phone: emp.phone.clone(),
                notes: emp.notes.clone(),
            }
        })
        .filter(|row| filters.passes(&row.work_area, &row.designation, row.employment_type))
        .collect()
}

fn summary_rows(
    range: DateRange,
    filters: &ReportFilters,
    cache: &DatasetCache,
) -> Vec<SummaryRow> {
    cache
        .employees()
        .iter()
        .map(|emp| {
            let in_range: Vec<&Assignment> = cache
                .assignments()
                .iter()
                .filter(|a| a.emp_id == emp.emp_id && range.contains(a.date))
                .collect();
            let mut distinct_areas: Vec<&str> = Vec::new();
            for assignment in &in_range {
                if !distinct_areas.contains(&assignment.work_area.as_str()) {
                    distinct_areas.push(assignment.work_area.as_str());
                }
            }
            let work_area = latest_work_area(cache, &emp.emp_id)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if distinct_areas.is_empty() {
                        NOT_ASSIGNED.to_string()
                    } else {
                        distinct_areas.join(", ")
                    }
                });
            SummaryRow {
                emp_id: emp.emp_id.clone(),
                name: emp.name.clone(),
                designation: emp.designation.clone(),
                employment_type: emp.employment_type,
                machine: emp.machine.clone(),
                work_area,
                phone: emp.phone.clone(),
                total_days_worked: in_range.len(),
                work_areas_count: distinct_areas.len(),
            }
        })
        .filter(|row| filters.passes(&row.work_area, &row.designation, row.employment_type))
        .collect()
}
