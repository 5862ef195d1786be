//! Typed catalog of the MIS backend endpoints.
//!
//! Each function returns a [`RequestDescriptor`](crate::client::RequestDescriptor);
//! the caller decides whether to `request`, `execute` or `download` it.
//! Request bodies serialize to camelCase and omit absent optionals.

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Closed set of values the backend accepts for a field, with their wire names.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const VALUES: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($name), other)),
                }
            }
        }
    };
}

pub mod finance;
pub mod incident;
pub mod reference;
pub mod security;
pub mod staff;

/// Percent-encode one path segment (ids, department names).
pub(crate) fn segment(value: &str) -> String {
    let value = value.trim();
    // Only the path of this placeholder URL is kept.
    let mut url = match Url::parse("http://segment.invalid/") {
        Ok(url) => url,
        Err(_) => return value.to_string(),
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(value);
    }
    url.path().trim_start_matches('/').to_string()
}

wire_enum!(IncidentType {
    Theft => "THEFT",
    Fight => "FIGHT",
    Drunkenness => "DRUNKENNESS",
    Cheating => "CHEATING",
    Other => "OTHER",
});

wire_enum!(ComplaintCategory {
    ServiceQuality => "SERVICE_QUALITY",
    StaffBehavior => "STAFF_BEHAVIOR",
    GameIssues => "GAME_ISSUES",
    Safety => "SAFETY",
    Other => "OTHER",
});

wire_enum!(ComplaintSource {
    Visitor => "VISITOR",
    Employee => "EMPLOYEE",
    System => "SYSTEM",
    Terminal => "TERMINAL",
});

wire_enum!(ComplaintStatus {
    Open => "OPEN",
    InProgress => "IN_PROGRESS",
    Resolved => "RESOLVED",
    Closed => "CLOSED",
});

wire_enum!(ViolationType {
    Late => "LATE",
    OutOfZone => "OUT_OF_ZONE",
    Conflict => "CONFLICT",
    Other => "OTHER",
});

wire_enum!(
    /// Risk of a suspicious activity; the backend falls back to `MEDIUM`.
    ActivityRisk {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
    }
);

wire_enum!(FraudType {
    Cheating => "CHEATING",
    Theft => "THEFT",
    Fraud => "FRAUD",
    Banned => "BANNED",
    Other => "OTHER",
});

wire_enum!(FraudStatus {
    Active => "ACTIVE",
    Archived => "ARCHIVED",
});

wire_enum!(NotificationType {
    SuspiciousActivity => "SUSPICIOUS_ACTIVITY",
    FraudMatch => "FRAUD_MATCH",
    LongContact => "LONG_CONTACT",
    FrequentInteraction => "FREQUENT_INTERACTION",
    SystemAlert => "SYSTEM_ALERT",
    Other => "OTHER",
});

wire_enum!(NotificationPriority {
    Low => "LOW",
    Normal => "NORMAL",
    High => "HIGH",
    Critical => "CRITICAL",
});

wire_enum!(EmployeeStatus {
    Active => "ACTIVE",
    OnLeave => "ON_LEAVE",
    SickLeave => "SICK_LEAVE",
    Terminated => "TERMINATED",
});

wire_enum!(ShiftType {
    Day => "DAY",
    Evening => "EVENING",
    Night => "NIGHT",
});

wire_enum!(OperationType {
    Deposit => "DEPOSIT",
    Withdrawal => "WITHDRAWAL",
});

wire_enum!(ReconciliationStatus {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    DiscrepancyFound => "DISCREPANCY_FOUND",
    Resolved => "RESOLVED",
});

wire_enum!(AnomalyStatus {
    Detected => "DETECTED",
    Confirmed => "CONFIRMED",
    Rejected => "REJECTED",
    Resolved => "RESOLVED",
});

wire_enum!(RiskLevel {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Critical => "CRITICAL",
});

wire_enum!(ReportType {
    Incidents => "INCIDENTS",
    Management => "MANAGEMENT",
    Regulatory => "REGULATORY",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for kind in ComplaintCategory::ALL {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<ComplaintCategory>().unwrap(), *kind);
        }
        assert_eq!(ReconciliationStatus::DiscrepancyFound.to_string(), "DISCREPANCY_FOUND");
        assert!("nope".parse::<ShiftType>().is_err());
    }

    #[test]
    fn test_values_match_variants() {
        assert_eq!(EmployeeStatus::VALUES.len(), EmployeeStatus::ALL.len());
        assert_eq!(IncidentType::VALUES, &["THEFT", "FIGHT", "DRUNKENNESS", "CHEATING", "OTHER"]);
    }

    #[test]
    fn test_segment_escapes_reserved_characters() {
        assert_eq!(segment(" 42 "), "42");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
        assert_eq!(segment("Охрана"), "%D0%9E%D1%85%D1%80%D0%B0%D0%BD%D0%B0");
    }
}
