//! Routes of the console and the navigation gate in front of them.

use std::fmt;

use crate::session::Session;

/// Sidebar groups of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Security,
    Incidents,
    Finance,
    Staff,
    Reports,
    Console,
}

impl Section {
    pub fn all() -> Vec<Section> {
        vec![
            Section::Security,
            Section::Incidents,
            Section::Finance,
            Section::Staff,
            Section::Reports,
            Section::Console,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Section::Security => "Безопасность",
            Section::Incidents => "Инциденты",
            Section::Finance => "Финансы",
            Section::Staff => "Персонал",
            Section::Reports => "Отчёты",
            Section::Console => "Консоль",
        }
    }

    /// Pages listed in the sidebar for this section. Hidden pages stay routable.
    pub fn links(&self) -> Vec<PageId> {
        match self {
            Section::Security => vec![
                PageId::SecurityOverview,
                PageId::HallMonitoring,
                PageId::SuspiciousActivity,
                PageId::ContactDuration,
                PageId::ContactFrequency,
                PageId::FraudCheck,
            ],
            Section::Incidents => vec![
                PageId::Incidents,
                PageId::Complaints,
                PageId::RepeatedViolations,
            ],
            Section::Finance => vec![
                PageId::FinanceOverview,
                PageId::FinanceAnalysis,
                PageId::Operations,
                PageId::CashControl,
                PageId::Anomalies,
                PageId::GameAnalysis,
            ],
            Section::Staff => vec![
                PageId::WorkTime,
                PageId::StaffManagement,
                PageId::Shifts,
            ],
            Section::Reports => vec![
                PageId::AllReports,
                PageId::IncidentReports,
                PageId::ManagementReports,
                PageId::RegulatoryReports,
            ],
            Section::Console => vec![PageId::RawConsole],
        }
    }
}

/// Every protected page of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageId {
    SecurityOverview,
    HallMonitoring,
    SuspiciousActivity,
    ContactDuration,
    ContactFrequency,
    FraudCheck,
    Notifications,

    Incidents,
    IncidentRegistration,
    Complaints,
    RepeatedViolations,

    AllReports,
    IncidentReports,
    ManagementReports,
    RegulatoryReports,
    ExportReports,

    FinanceOverview,
    FinanceAnalysis,
    Operations,
    CashControl,
    Anomalies,
    GameAnalysis,

    WorkTime,
    StaffManagement,
    Discipline,
    ViolationHistory,
    Shifts,

    RawConsole,
}

impl PageId {
    pub const ALL: [PageId; 28] = [
        PageId::SecurityOverview,
        PageId::HallMonitoring,
        PageId::SuspiciousActivity,
        PageId::ContactDuration,
        PageId::ContactFrequency,
        PageId::FraudCheck,
        PageId::Notifications,
        PageId::Incidents,
        PageId::IncidentRegistration,
        PageId::Complaints,
        PageId::RepeatedViolations,
        PageId::AllReports,
        PageId::IncidentReports,
        PageId::ManagementReports,
        PageId::RegulatoryReports,
        PageId::ExportReports,
        PageId::FinanceOverview,
        PageId::FinanceAnalysis,
        PageId::Operations,
        PageId::CashControl,
        PageId::Anomalies,
        PageId::GameAnalysis,
        PageId::WorkTime,
        PageId::StaffManagement,
        PageId::Discipline,
        PageId::ViolationHistory,
        PageId::Shifts,
        PageId::RawConsole,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            PageId::SecurityOverview => "/security",
            PageId::HallMonitoring => "/security/hall-monitoring",
            PageId::SuspiciousActivity => "/security/suspicious-activity",
            PageId::ContactDuration => "/security/contact-duration",
            PageId::ContactFrequency => "/security/contact-frequency",
            PageId::FraudCheck => "/security/fraud-check",
            PageId::Notifications => "/security/notifications",
            PageId::Incidents => "/incidents",
            PageId::IncidentRegistration => "/incidents/register",
            PageId::Complaints => "/incidents/complaints",
            PageId::RepeatedViolations => "/incidents/repeated-violations",
            PageId::AllReports => "/reports/all",
            PageId::IncidentReports => "/reports/incidents",
            PageId::ManagementReports => "/reports/management",
            PageId::RegulatoryReports => "/reports/regulatory",
            PageId::ExportReports => "/reports/export",
            PageId::FinanceOverview => "/finance",
            PageId::FinanceAnalysis => "/finance/analysis",
            PageId::Operations => "/finance/operations",
            PageId::CashControl => "/finance/cash-control",
            PageId::Anomalies => "/finance/anomalies",
            PageId::GameAnalysis => "/finance/game-analysis",
            PageId::WorkTime => "/staff/time-tracking",
            PageId::StaffManagement => "/staff/management",
            PageId::Discipline => "/staff/discipline",
            PageId::ViolationHistory => "/staff/violation-history",
            PageId::Shifts => "/staff/shifts",
            PageId::RawConsole => "/console",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PageId::SecurityOverview | PageId::FinanceOverview => "Обзор",
            PageId::HallMonitoring => "Мониторинг зала",
            PageId::SuspiciousActivity => "Подозрительная активность",
            PageId::ContactDuration => "Контакты",
            PageId::ContactFrequency => "Частота контактов",
            PageId::FraudCheck => "Фрод-проверка",
            PageId::Notifications => "Уведомления",
            PageId::Incidents => "Инциденты",
            PageId::IncidentRegistration => "Регистрация",
            PageId::Complaints => "Жалобы",
            PageId::RepeatedViolations => "Повторные нарушения",
            PageId::AllReports => "Все отчёты",
            PageId::IncidentReports => "Отчёты по инцидентам",
            PageId::ManagementReports => "Управленческие отчёты",
            PageId::RegulatoryReports => "Регуляторные отчёты",
            PageId::ExportReports => "Экспорт отчётов",
            PageId::FinanceAnalysis => "Аналитика",
            PageId::Operations => "Операции",
            PageId::CashControl => "Кассовый контроль",
            PageId::Anomalies => "Аномалии",
            PageId::GameAnalysis => "Анализ игр",
            PageId::WorkTime => "Учёт времени",
            PageId::StaffManagement => "Управление персоналом",
            PageId::Discipline => "Дисциплина",
            PageId::ViolationHistory => "История нарушений",
            PageId::Shifts => "Смены",
            PageId::RawConsole => "Произвольный запрос",
        }
    }

    pub fn section(&self) -> Section {
        match self {
            PageId::SecurityOverview
            | PageId::HallMonitoring
            | PageId::SuspiciousActivity
            | PageId::ContactDuration
            | PageId::ContactFrequency
            | PageId::FraudCheck
            | PageId::Notifications => Section::Security,
            PageId::Incidents
            | PageId::IncidentRegistration
            | PageId::Complaints
            | PageId::RepeatedViolations => Section::Incidents,
            PageId::AllReports
            | PageId::IncidentReports
            | PageId::ManagementReports
            | PageId::RegulatoryReports
            | PageId::ExportReports => Section::Reports,
            PageId::FinanceOverview
            | PageId::FinanceAnalysis
            | PageId::Operations
            | PageId::CashControl
            | PageId::Anomalies
            | PageId::GameAnalysis => Section::Finance,
            PageId::WorkTime
            | PageId::StaffManagement
            | PageId::Discipline
            | PageId::ViolationHistory
            | PageId::Shifts => Section::Staff,
            PageId::RawConsole => Section::Console,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Page(PageId),
}

pub const LOGIN_PATH: &str = "/login";
pub const DEFAULT_PATH: &str = "/security";
pub const POST_LOGIN_PATH: &str = "/incidents";

/// Old locations that forward to their current page.
const REDIRECTS: [(&str, &str); 6] = [
    ("/", DEFAULT_PATH),
    ("/incidents/reports", "/reports/incidents"),
    ("/incidents/management-reports", "/reports/management"),
    ("/incidents/regulatory-reports", "/reports/regulatory"),
    ("/reports", "/reports/all"),
    ("/staff/violations", "/staff/discipline"),
];

impl Route {
    /// Resolve a location, following redirects. Unknown paths land on the default page.
    pub fn parse(location: &str) -> Route {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        if path == LOGIN_PATH {
            return Route::Login;
        }

        let path = REDIRECTS
            .iter()
            .find(|(from, _)| *from == path)
            .map(|(_, to)| *to)
            .unwrap_or(path);

        PageId::ALL
            .iter()
            .find(|page| page.path() == path)
            .map(|page| Route::Page(*page))
            .unwrap_or(Route::Page(PageId::SecurityOverview))
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => LOGIN_PATH,
            Route::Page(page) => page.path(),
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Page(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Render(Route),
    /// Send the user to `to`, remembering where they wanted to go.
    Redirect { to: Route, from: Route },
}

/// Decide whether `requested` may be shown for the current session.
pub fn guard(session: &Session, requested: Route) -> GateDecision {
    if requested.is_protected() && !session.is_authenticated() {
        GateDecision::Redirect {
            to: Route::Login,
            from: requested,
        }
    } else {
        GateDecision::Render(requested)
    }
}

/// Where to go after a successful login.
pub fn post_login_target(from: Option<Route>) -> Route {
    match from {
        Some(route @ Route::Page(_)) => route,
        _ => Route::parse(POST_LOGIN_PATH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in() -> Session {
        Session {
            token: Some("Basic YWRtaW46YWRtaW4=".to_string()),
            username: Some("admin".to_string()),
            base_url: String::new(),
        }
    }

    #[test]
    fn test_every_page_path_parses_back() {
        for page in PageId::ALL {
            assert_eq!(Route::parse(page.path()), Route::Page(page), "{}", page.path());
        }
    }

    #[test]
    fn test_redirects() {
        assert_eq!(Route::parse("/"), Route::Page(PageId::SecurityOverview));
        assert_eq!(Route::parse("/incidents/reports"), Route::Page(PageId::IncidentReports));
        assert_eq!(Route::parse("/reports/"), Route::Page(PageId::AllReports));
        assert_eq!(Route::parse("/staff/violations"), Route::Page(PageId::Discipline));
        assert_eq!(Route::parse("/staff"), Route::Page(PageId::SecurityOverview));
        assert_eq!(Route::parse("/nowhere"), Route::Page(PageId::SecurityOverview));
        assert_eq!(Route::parse("/finance/operations?id=1"), Route::Page(PageId::Operations));
        assert_eq!(Route::parse("/login"), Route::Login);
    }

    #[test]
    fn test_logged_out_access_redirects_to_login() {
        let requested = Route::parse("/finance/cash-control");
        assert_eq!(
            guard(&Session::default(), requested),
            GateDecision::Redirect {
                to: Route::Login,
                from: requested
            }
        );
    }

    #[test]
    fn test_login_page_is_public() {
        assert_eq!(guard(&Session::default(), Route::Login), GateDecision::Render(Route::Login));
    }

    #[test]
    fn test_admin_can_open_incidents() {
        let requested = Route::parse("/incidents");
        assert_eq!(guard(&logged_in(), requested), GateDecision::Render(requested));
    }

    #[test]
    fn test_logged_out_session_keeps_base_url_but_is_gated() {
        let session = Session {
            token: None,
            username: None,
            base_url: "http://mis".to_string(),
        };
        assert!(matches!(
            guard(&session, Route::Page(PageId::Incidents)),
            GateDecision::Redirect { .. }
        ));
    }

    #[test]
    fn test_post_login_target() {
        assert_eq!(post_login_target(None), Route::Page(PageId::Incidents));
        assert_eq!(
            post_login_target(Some(Route::Page(PageId::Shifts))),
            Route::Page(PageId::Shifts)
        );
        assert_eq!(post_login_target(Some(Route::Login)), Route::Page(PageId::Incidents));
    }

    #[test]
    fn test_sidebar_links_belong_to_their_section() {
        for section in Section::all() {
            for page in section.links() {
                assert_eq!(page.section(), section);
            }
        }
    }
}
