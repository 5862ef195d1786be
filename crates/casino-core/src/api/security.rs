//! Hall monitoring, contact tracking, fraud checks and notifications.

use serde::Serialize;

use super::{segment, FraudStatus, FraudType, NotificationPriority, NotificationType};
use crate::client::RequestDescriptor;
use crate::error::ApiError;

const MONITORING: &str = "/api/security/monitoring";
const CONTACTS: &str = "/api/security/contacts";
const FRAUD_CHECK: &str = "/api/security/fraud-check";
const FRAUD_DATABASE: &str = "/api/security/fraud-database";
const NOTIFICATIONS: &str = "/api/security/notifications";

/// Current hall statistics. Also used as the login probe.
pub fn monitoring_status() -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/status", MONITORING))
}

pub fn start_monitoring(security_officer_id: &str) -> RequestDescriptor {
    RequestDescriptor::post(format!("{}/start", MONITORING)).param("securityOfficerId", security_officer_id.trim())
}

pub fn end_monitoring(id: &str) -> RequestDescriptor {
    RequestDescriptor::post(format!("{}/{}/end", MONITORING, segment(id)))
}

pub fn get_monitoring(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", MONITORING, segment(id)))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactEvent {
    pub person_id1: String,
    pub person_id2: String,
    pub contact_start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

pub fn register_contact(event: &ContactEvent) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(CONTACTS).json(event)
}

pub fn suspicious_contacts() -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/suspicious", CONTACTS))
}

/// Ask the backend to evaluate how often two persons met. Answers with no content.
pub fn check_contact_frequency(person_id1: &str, person_id2: &str) -> RequestDescriptor {
    RequestDescriptor::post(format!("{}/check-frequency", CONTACTS))
        .param("personId1", person_id1.trim())
        .param("personId2", person_id2.trim())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FraudCheck {
    pub person_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_by_activity_id: Option<String>,
}

pub fn check_person(check: &FraudCheck) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(FRAUD_CHECK).json(check)
}

pub fn quick_check(person_id: &str, activity_id: Option<&str>) -> RequestDescriptor {
    RequestDescriptor::post(format!("{}/quick", FRAUD_CHECK))
        .param("personId", person_id.trim())
        .param_opt("activityId", activity_id.map(str::trim))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FraudRecord {
    pub person_id: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub fraud_type: FraudType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
}

pub fn create_fraud_record(record: &FraudRecord) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(FRAUD_DATABASE).json(record)
}

pub fn list_fraud_records() -> RequestDescriptor {
    RequestDescriptor::get(FRAUD_DATABASE)
}

pub fn get_fraud_record(id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/{}", FRAUD_DATABASE, segment(id)))
}

pub fn search_fraud_records(query: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/search", FRAUD_DATABASE)).param("q", query.trim())
}

pub fn fraud_records_by_type(fraud_type: FraudType) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/type/{}", FRAUD_DATABASE, fraud_type))
}

pub fn update_fraud_status(id: &str, status: FraudStatus) -> RequestDescriptor {
    RequestDescriptor::patch(format!("{}/{}/status", FRAUD_DATABASE, segment(id))).param("status", status)
}

pub fn delete_fraud_record(id: &str) -> RequestDescriptor {
    RequestDescriptor::delete(format!("{}/{}", FRAUD_DATABASE, segment(id)))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub recipient_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<String>,
}

pub fn create_notification(notification: &NewNotification) -> Result<RequestDescriptor, ApiError> {
    RequestDescriptor::post(NOTIFICATIONS).json(notification)
}

pub fn notifications_for(recipient_id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/recipient/{}", NOTIFICATIONS, segment(recipient_id)))
}

pub fn unread_notifications(recipient_id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/recipient/{}/unread", NOTIFICATIONS, segment(recipient_id)))
}

pub fn unread_count(recipient_id: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("{}/recipient/{}/unread-count", NOTIFICATIONS, segment(recipient_id)))
}

pub fn mark_notification_read(id: &str) -> RequestDescriptor {
    RequestDescriptor::post(format!("{}/{}/read", NOTIFICATIONS, segment(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::json;

    #[test]
    fn test_monitoring_paths() {
        assert_eq!(monitoring_status().target(), crate::auth::LOGIN_PROBE_PATH);
        assert_eq!(
            start_monitoring(" 7f1c ").target(),
            "/api/security/monitoring/start?securityOfficerId=7f1c"
        );
        assert_eq!(end_monitoring("m1").method, Method::POST);
    }

    #[test]
    fn test_quick_check_optional_activity() {
        assert_eq!(quick_check("p1", None).target(), "/api/security/fraud-check/quick?personId=p1");
        assert_eq!(
            quick_check("p1", Some("a9")).target(),
            "/api/security/fraud-check/quick?personId=p1&activityId=a9"
        );
        // Blank optional ids are dropped by the query builder.
        assert_eq!(quick_check("p1", Some("  ")).target(), "/api/security/fraud-check/quick?personId=p1");
    }

    #[test]
    fn test_fraud_record_omits_absent_fields() {
        let request = create_fraud_record(&FraudRecord {
            person_id: "P-1".to_string(),
            full_name: "Иванов И.".to_string(),
            description: None,
            photo_url: None,
            fraud_type: FraudType::Banned,
            added_by: None,
        })
        .unwrap();
        assert_eq!(
            request.body,
            Some(json!({"personId": "P-1", "fullName": "Иванов И.", "fraudType": "BANNED"}))
        );
    }

    #[test]
    fn test_fraud_database_routes() {
        assert_eq!(search_fraud_records("ivan ov").target(), "/api/security/fraud-database/search?q=ivan+ov");
        assert_eq!(fraud_records_by_type(FraudType::Theft).path, "/api/security/fraud-database/type/THEFT");
        assert_eq!(delete_fraud_record("x").method, Method::DELETE);
        assert_eq!(
            update_fraud_status("x", FraudStatus::Archived).target(),
            "/api/security/fraud-database/x/status?status=ARCHIVED"
        );
    }

    #[test]
    fn test_contact_bodies() {
        let request = register_contact(&ContactEvent {
            person_id1: "a".to_string(),
            person_id2: "b".to_string(),
            contact_start_time: "2024-01-01T10:00:00+00:00".to_string(),
            contact_end_time: None,
            location: Some("VIP".to_string()),
        })
        .unwrap();
        assert_eq!(
            request.body,
            Some(json!({
                "personId1": "a",
                "personId2": "b",
                "contactStartTime": "2024-01-01T10:00:00+00:00",
                "location": "VIP"
            }))
        );
        assert_eq!(
            check_contact_frequency("a", "b").target(),
            "/api/security/contacts/check-frequency?personId1=a&personId2=b"
        );
    }

    #[test]
    fn test_notification_routes() {
        assert_eq!(unread_count("r1").path, "/api/security/notifications/recipient/r1/unread-count");
        let request = create_notification(&NewNotification {
            recipient_id: "r1".to_string(),
            notification_type: NotificationType::SystemAlert,
            title: "t".to_string(),
            message: "m".to_string(),
            priority: NotificationPriority::High,
            related_entity_type: None,
            related_entity_id: None,
        })
        .unwrap();
        assert_eq!(
            request.body,
            Some(json!({"recipientId": "r1", "type": "SYSTEM_ALERT", "title": "t", "message": "m", "priority": "HIGH"}))
        );
    }
}
