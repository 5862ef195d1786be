//! Employees, work time, shift schedules and violation history.

use serde::{Deserialize, Serialize};

use super::{segment, EmployeeStatus, ShiftType, ViolationType};
use crate::client::RequestDescriptor;
use crate::error::ApiError;

const EMPLOYEES: &str = "/api/staff/employees";
const WORK_TIME: &str = "/api/staff/work-time";
const SHIFTS: &str = "/api/staff/shifts";
const VIOLATION_HISTORY: &str = "/api/staff/violation-history";

/// Employee as returned by the backend. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Employee {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub contact_info: Option<String>,
}

impl Employee {
    /// "Last First Middle", skipping blanks; the id when no name is known.
    pub fn display_name(&self) -> String {
        let name = [&self.last_name, &self.first_name, &self.middle_name]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.id.clone()
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EmployeeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
}

pub fn create_employee(employee: &NewEmployee) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(EMPLOYEES).json(employee)
}

pub fn list_employees() -> RequestDescriptor {
    RequestDescriptor::get(EMPLOYEES)
}

pub fn get_employee(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", EMPLOYEES, segment(id)))
}

pub fn employees_by_department(department: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/department/{}", EMPLOYEES, segment(department)))
}

pub fn update_employee_status(id: &str, status: EmployeeStatus) -> RequestDescriptor {
    RequestDescriptor::patch(format!("{}/{}/status", EMPLOYEES, segment(id))).param("status", status)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClockIn {
    pub employee_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClockOut {
    pub employee_id: String,
}

pub fn clock_in(request: &ClockIn) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(format!("{}/clock-in", WORK_TIME)).json(request)
}

pub fn clock_out(request: &ClockOut) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(format!("{}/clock-out", WORK_TIME)).json(request)
}

pub fn work_time_for(employee_id: &str, start: Option<&str>, end: Option<&str>) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/employee/{}", WORK_TIME, segment(employee_id)))
        .param_opt("startDate", start)
        .param_opt("endDate", end)
}

pub fn get_work_time(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", WORK_TIME, segment(id)))
}

pub fn check_missing_clock_outs() -> RequestDescriptor {
    RequestDescriptor::post(format!("{}/check-missing-clock-outs", WORK_TIME))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewShift {
    pub employee_id: String,
    /// `YYYY-MM-DD`
    pub shift_date: String,
    pub planned_start_time: String,
    pub planned_end_time: String,
    pub shift_type: ShiftType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub fn create_shift(shift: &NewShift) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(SHIFTS).json(shift)
}

/// Shifts between two dates (`YYYY-MM-DD`, both required by the backend).
pub fn shifts_between(start_date: &str, end_date: &str) -> RequestDescriptor {
    RequestDescriptor::get(SHIFTS)
        .param("startDate", start_date.trim())
        .param("endDate", end_date.trim())
}

pub fn shifts_for(employee_id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/employee/{}", SHIFTS, segment(employee_id)))
}

pub fn get_shift(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", SHIFTS, segment(id)))
}

pub fn availability(start_date: &str, end_date: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/availability", SHIFTS))
        .param("startDate", start_date.trim())
        .param("endDate", end_date.trim())
}

pub fn publish_shift(id: &str) -> RequestDescriptor {
    RequestDescriptor::post(format!("{}/{}/publish", SHIFTS, segment(id)))
}

pub fn confirm_shift(id: &str, confirmed_by: &str) -> RequestDescriptor {
    RequestDescriptor::post(format!("{}/{}/confirm", SHIFTS, segment(id))).param("confirmedBy", confirmed_by.trim())
}

pub fn reassign_shift(id: &str, new_employee_id: &str) -> RequestDescriptor {
    RequestDescriptor::post(format!("{}/{}/reassign", SHIFTS, segment(id)))
        .param("newEmployeeId", new_employee_id.trim())
}

/// Every filter is optional; an empty search covers all employees.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViolationHistorySearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation_type: Option<ViolationType>,
}

pub fn search_violation_history(search: &ViolationHistorySearch) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(format!("{}/search", VIOLATION_HISTORY)).json(search)
}

pub fn violation_history_for(employee_id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/employee/{}", VIOLATION_HISTORY, segment(employee_id)))
}

pub fn violation_history_by_department(department: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/department/{}", VIOLATION_HISTORY, segment(department)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_joins_present_parts() {
        let employee: Employee = serde_json::from_value(json!({
            "id": "e1",
            "firstName": "Иван",
            "lastName": "Петров",
            "middleName": null,
            "hireDate": "2023-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(employee.display_name(), "Петров Иван");

        let nameless = Employee {
            id: "e2".to_string(),
            first_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(nameless.display_name(), "e2");
    }

    #[test]
    fn test_employee_status_deserializes() {
        let employee: Employee = serde_json::from_value(json!({"id": "e", "status": "SICK_LEAVE"})).unwrap();
        assert_eq!(employee.status, Some(EmployeeStatus::SickLeave));
    }

    #[test]
    fn test_shift_queries() {
        assert_eq!(
            shifts_between("2024-03-01", "2024-03-07").target(),
            "/api/staff/shifts?startDate=2024-03-01&endDate=2024-03-07"
        );
        assert_eq!(
            reassign_shift("s1", "e9").target(),
            "/api/staff/shifts/s1/reassign?newEmployeeId=e9"
        );
        assert_eq!(work_time_for("e1", None, None).target(), "/api/staff/work-time/employee/e1");
    }

    #[test]
    fn test_violation_search_empty_body() {
        let request = search_violation_history(&ViolationHistorySearch::default()).unwrap();
        assert_eq!(request.body, Some(json!({})));
        assert_eq!(
            violation_history_by_department("Охрана").path,
            "/api/staff/violation-history/department/%D0%9E%D1%85%D1%80%D0%B0%D0%BD%D0%B0"
        );
    }
}
