//! Incidents, complaints, staff violations, suspicious activities and incident reports.

use serde::Serialize;
use serde_json::Value;

use super::{segment, ActivityRisk, ComplaintCategory, ComplaintSource, ComplaintStatus, IncidentType, ReportType, ViolationType};
use crate::client::RequestDescriptor;
use crate::error::ApiError;

const INCIDENTS: &str = "/api/incident/incidents";
const COMPLAINTS: &str = "/api/incident/complaints";
const VIOLATIONS: &str = "/api/incident/violations";
const SUSPICIOUS: &str = "/api/incident/suspicious-activities";
const REPORTS: &str = "/api/incident/reports";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncident {
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub location: String,
    pub description: String,
    pub participants: Vec<String>,
    pub attachment_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentFilter {
    pub start: Option<String>,
    pub end: Option<String>,
    pub incident_type: Option<IncidentType>,
}

pub fn create_incident(incident: &CreateIncident) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(INCIDENTS).json(incident)
}

pub fn list_incidents(filter: &IncidentFilter) -> RequestDescriptor {
    RequestDescriptor::get(INCIDENTS)
        .param_opt("start", filter.start.as_deref())
        .param_opt("end", filter.end.as_deref())
        .param_opt("type", filter.incident_type)
}

pub fn get_incident(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", INCIDENTS, segment(id)))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplaint {
    pub category: ComplaintCategory,
    pub source: ComplaintSource,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_incident_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplaintFilter {
    pub start: Option<String>,
    pub end: Option<String>,
    pub category: Option<ComplaintCategory>,
    pub source: Option<ComplaintSource>,
}

pub fn create_complaint(complaint: &CreateComplaint) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(COMPLAINTS).json(complaint)
}

pub fn list_complaints(filter: &ComplaintFilter) -> RequestDescriptor {
    RequestDescriptor::get(COMPLAINTS)
        .param_opt("start", filter.start.as_deref())
        .param_opt("end", filter.end.as_deref())
        .param_opt("category", filter.category)
        .param_opt("source", filter.source)
}

pub fn get_complaint(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", COMPLAINTS, segment(id)))
}

pub fn update_complaint_status(id: &str, status: ComplaintStatus) -> RequestDescriptor {
    RequestDescriptor::patch(format!("{}/{}/status", COMPLAINTS, segment(id))).param("status", status)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateViolation {
    pub employee_id: String,
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub description: String,
    pub attachment_urls: Vec<String>,
}

pub fn create_violation(violation: &CreateViolation) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(VIOLATIONS).json(violation)
}

pub fn list_violations() -> RequestDescriptor {
    RequestDescriptor::get(VIOLATIONS)
}

pub fn get_violation(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", VIOLATIONS, segment(id)))
}

pub fn violations_by_employee(employee_id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/employee/{}", VIOLATIONS, segment(employee_id)))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateSuspiciousActivity {
    pub short_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub risk: ActivityRisk,
    pub participants: Vec<String>,
}

pub fn create_suspicious_activity(activity: &CreateSuspiciousActivity) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(SUSPICIOUS).json(activity)
}

pub fn list_suspicious_activities() -> RequestDescriptor {
    RequestDescriptor::get(SUSPICIOUS)
}

pub fn get_suspicious_activity(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", SUSPICIOUS, segment(id)))
}

/// Reporting period shared by the management and regulatory reports.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub period_start: String,
    pub period_end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncidentReportRequest {
    #[serde(flatten)]
    pub period: ReportPeriod,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub incident_types: Vec<IncidentType>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepeatedViolationsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<String>,
    /// Minimum number of violations; sent as a number when it parses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Value>,
}

pub fn generate_incident_report(request: &IncidentReportRequest) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(format!("{}/incidents", REPORTS)).json(request)
}

pub fn generate_management_report(period: &ReportPeriod) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(format!("{}/management", REPORTS)).json(period)
}

pub fn generate_regulatory_report(period: &ReportPeriod) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(format!("{}/regulatory", REPORTS)).json(period)
}

pub fn repeated_violations(request: &RepeatedViolationsRequest) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(format!("{}/repeated-violations", REPORTS)).json(request)
}

pub fn list_reports(report_type: Option<ReportType>) -> RequestDescriptor {
    RequestDescriptor::get(REPORTS).param_opt("type", report_type)
}

pub fn get_report(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", REPORTS, segment(id)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Excel,
}

impl ExportFormat {
    pub fn path_segment(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "excel",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
        }
    }
}

/// Binary export of a generated report; fetch it with `ApiClient::download`.
pub fn export_report(id: &str, format: ExportFormat) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}/export/{}", REPORTS, segment(id), format.path_segment()))
}
