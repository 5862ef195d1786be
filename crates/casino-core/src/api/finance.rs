//! Cash operations, reconciliation, anomaly detection, game analysis and financial reports.

use serde::Serialize;
use serde_json::Value;

use super::{segment, AnomalyStatus, OperationType, ReconciliationStatus, RiskLevel};
use crate::client::RequestDescriptor;
use crate::error::ApiError;

const OPERATIONS: &str = "/api/finance/operations";
const RECONCILIATION: &str = "/api/finance/reconciliation";
const ANOMALIES: &str = "/api/finance/anomalies";
const GAME_ANALYSIS: &str = "/api/finance/game-analysis";
const REPORTS: &str = "/api/finance/reports";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashOperation {
    pub cash_desk_id: String,
    pub amount: Value,
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    pub currency: String,
}

pub fn create_operation(operation: &CashOperation) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(OPERATIONS).json(operation)
}

pub fn list_operations() -> RequestDescriptor {
    RequestDescriptor::get(OPERATIONS)
}

pub fn get_operation(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", OPERATIONS, segment(id)))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub cash_desk_id: String,
    pub shift_start: String,
    pub shift_end: String,
    pub actual_balance: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub fn reconcile(reconciliation: &Reconciliation) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(RECONCILIATION).json(reconciliation)
}

pub fn get_reconciliation(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", RECONCILIATION, segment(id)))
}

pub fn reconciliations_by_cash_desk(cash_desk_id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/cashdesk/{}", RECONCILIATION, segment(cash_desk_id)))
}

pub fn update_reconciliation_status(id: &str, status: ReconciliationStatus) -> RequestDescriptor {
    RequestDescriptor::patch(format!("{}/{}/status", RECONCILIATION, segment(id))).param("status", status)
}

/// Detection window. Thresholds left out use the backend defaults.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyDetection {
    pub period_start: String,
    pub period_end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_amount_threshold: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_threshold: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window_minutes: Option<Value>,
}

pub fn detect_anomalies(detection: &AnomalyDetection) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(format!("{}/detect", ANOMALIES)).json(detection)
}

pub fn list_anomalies(status: Option<AnomalyStatus>, risk_level: Option<RiskLevel>) -> RequestDescriptor {
    RequestDescriptor::get(ANOMALIES)
        .param_opt("status", status)
        .param_opt("riskLevel", risk_level)
}

pub fn get_anomaly(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", ANOMALIES, segment(id)))
}

pub fn review_anomaly(id: &str, status: AnomalyStatus, reviewer_id: &str, notes: Option<&str>) -> RequestDescriptor {
    RequestDescriptor::post(format!("{}/{}/review", ANOMALIES, segment(id)))
        .param("status", status)
        .param("reviewerId", reviewer_id.trim())
        .param_opt("notes", notes)
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameAnalysis {
    pub period_start: String,
    pub period_end: String,
    /// All tables when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_rtp: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_win_threshold: Option<Value>,
}

pub fn analyze_games(analysis: &GameAnalysis) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(GAME_ANALYSIS).json(analysis)
}

pub fn get_game_analysis(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", GAME_ANALYSIS, segment(id)))
}

pub fn game_analyses_by_table(game_table_id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/table/{}", GAME_ANALYSIS, segment(game_table_id)))
}

/// Financial report period as plain dates (`YYYY-MM-DD`).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    pub period_start: String,
    pub period_end: String,
}

pub fn generate_report(report: &FinancialReport) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(REPORTS).json(report)
}

pub fn download_report(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}/download", REPORTS, segment(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::numeric;
    use serde_json::json;

    #[test]
    fn test_cash_operation_amount_is_numeric() {
        let request = create_operation(&CashOperation {
            cash_desk_id: "d1".to_string(),
            amount: numeric("1500.50"),
            operation_type: OperationType::Withdrawal,
            currency: "RUB".to_string(),
        })
        .unwrap();
        assert_eq!(
            request.body,
            Some(json!({"cashDeskId": "d1", "amount": 1500.5, "type": "WITHDRAWAL", "currency": "RUB"}))
        );
    }

    #[test]
    fn test_anomaly_filters_and_review() {
        assert_eq!(list_anomalies(None, None).target(), "/api/finance/anomalies");
        assert_eq!(
            list_anomalies(Some(AnomalyStatus::Detected), Some(RiskLevel::Critical)).target(),
            "/api/finance/anomalies?status=DETECTED&riskLevel=CRITICAL"
        );
        assert_eq!(
            review_anomaly("a1", AnomalyStatus::Confirmed, "u1", None).target(),
            "/api/finance/anomalies/a1/review?status=CONFIRMED&reviewerId=u1"
        );
    }

    #[test]
    fn test_detection_defaults_are_left_to_backend() {
        let request = detect_anomalies(&AnomalyDetection {
            period_start: "s".to_string(),
            period_end: "e".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(request.body, Some(json!({"periodStart": "s", "periodEnd": "e"})));
    }

    #[test]
    fn test_reconciliation_paths() {
        assert_eq!(reconciliations_by_cash_desk("d 1").path, "/api/finance/reconciliation/cashdesk/d%201");
        assert_eq!(
            update_reconciliation_status("r", ReconciliationStatus::DiscrepancyFound).target(),
            "/api/finance/reconciliation/r/status?status=DISCREPANCY_FOUND"
        );
        assert_eq!(download_report("f9").path, "/api/finance/reports/f9/download");
    }
}
