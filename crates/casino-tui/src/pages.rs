//! What each console page offers: a list of actions, each one a form that
//! turns into a single backend call.

use anyhow::{bail, Result};
use casino_core::api::{
    finance, incident, security, staff, ActivityRisk, AnomalyStatus, ComplaintCategory,
    ComplaintSource, ComplaintStatus, EmployeeStatus, FraudStatus, FraudType, IncidentType, NotificationPriority,
    NotificationType, OperationType, ReconciliationStatus, ReportType, RiskLevel, ShiftType, ViolationType,
};
use casino_core::api::incident::ExportFormat;
use casino_core::client::RequestDescriptor;
use casino_core::PageId;
use reqwest::Method;
use serde_json::Value;

use crate::form::{FieldKind, FieldSpec, FormValues, Lookup};

/// What submitting an action does.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// Show the response in the result pane.
    Execute(RequestDescriptor),
    /// Save the response body under `file_name` in the download directory.
    Download { request: RequestDescriptor, file_name: String },
    /// Reload the cash desk and game table directories.
    LoadReference,
}

pub struct ActionSpec {
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
    pub build: fn(&FormValues) -> Result<Call>,
}

impl ActionSpec {
    pub fn build(&self, values: &FormValues) -> Result<Call> {
        (self.build)(values)
    }
}

fn action(title: &'static str, fields: Vec<FieldSpec>, build: fn(&FormValues) -> Result<Call>) -> ActionSpec {
    ActionSpec { title, fields, build }
}

fn text(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::new(key, label, FieldKind::Text)
}

fn datetime(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::new(key, label, FieldKind::DateTime)
}

fn date(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::new(key, label, FieldKind::Date)
}

fn number(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::new(key, label, FieldKind::Number)
}

fn list(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::new(key, label, FieldKind::List)
}

fn choice(key: &'static str, label: &'static str, options: &'static [&'static str]) -> FieldSpec {
    FieldSpec::new(key, label, FieldKind::Choice(options))
}

fn lookup(key: &'static str, label: &'static str, kind: Lookup) -> FieldSpec {
    FieldSpec::new(key, label, FieldKind::Lookup(kind))
}

fn id(label: &'static str) -> FieldSpec {
    text("id", label).required()
}

fn exec(request: RequestDescriptor) -> Result<Call> {
    Ok(Call::Execute(request))
}

/// Fields of the login screen.
pub fn login_fields() -> Vec<FieldSpec> {
    vec![
        text("username", "Логин").required().default_value("admin"),
        FieldSpec::new("password", "Пароль", FieldKind::Secret).required().default_value("admin"),
        text("base_url", "Базовый URL API"),
    ]
}

const CONSOLE_METHODS: &[&str] = &["GET", "POST", "PATCH", "PUT", "DELETE"];

pub fn actions(page: PageId) -> Vec<ActionSpec> {
    match page {
        PageId::SecurityOverview => vec![
            action("Статус зала", vec![], |_| exec(security::monitoring_status())),
            action("Подозрительные контакты", vec![], |_| exec(security::suspicious_contacts())),
            action("Подозрительная активность", vec![], |_| exec(incident::list_suspicious_activities())),
            action("Справочники касс и столов", vec![], |_| Ok(Call::LoadReference)),
        ],
        PageId::HallMonitoring => vec![
            action("Текущий статус", vec![], |_| exec(security::monitoring_status())),
            action(
                "Начать мониторинг",
                vec![lookup("officer", "Сотрудник охраны", Lookup::Employee).required()],
                |v| exec(security::start_monitoring(&v.text("officer"))),
            ),
            action("Завершить мониторинг", vec![id("ID сессии")], |v| {
                exec(security::end_monitoring(&v.text("id")))
            }),
            action("Сессия по ID", vec![id("ID сессии")], |v| exec(security::get_monitoring(&v.text("id")))),
        ],
        PageId::SuspiciousActivity => vec![
            action(
                "Зафиксировать активность",
                vec![
                    text("description", "Краткое описание").required(),
                    text("location", "Локация"),
                    choice("risk", "Уровень риска", ActivityRisk::VALUES).required().default_value("MEDIUM"),
                    list("participants", "Участники"),
                ],
                |v| {
                    let request = incident::create_suspicious_activity(&incident::CreateSuspiciousActivity {
                        short_description: v.text("description"),
                        location: v.opt("location"),
                        risk: v.choice("risk")?,
                        participants: v.list("participants"),
                    })?;
                    exec(request)
                },
            ),
            action("Список активностей", vec![], |_| exec(incident::list_suspicious_activities())),
            action("Активность по ID", vec![id("ID активности")], |v| {
                exec(incident::get_suspicious_activity(&v.text("id")))
            }),
        ],
        PageId::ContactDuration => vec![
            action(
                "Зарегистрировать контакт",
                vec![
                    text("person1", "Персона 1").required(),
                    text("person2", "Персона 2").required(),
                    datetime("start", "Начало контакта").required(),
                    datetime("end", "Окончание контакта"),
                    text("location", "Локация"),
                ],
                |v| {
                    let request = security::register_contact(&security::ContactEvent {
                        person_id1: v.text("person1"),
                        person_id2: v.text("person2"),
                        contact_start_time: v.iso("start"),
                        contact_end_time: v.opt_iso("end"),
                        location: v.opt("location"),
                    })?;
                    exec(request)
                },
            ),
            action("Подозрительные контакты", vec![], |_| exec(security::suspicious_contacts())),
        ],
        PageId::ContactFrequency => vec![
            action(
                "Проверить частоту контактов",
                vec![text("person1", "Персона 1").required(), text("person2", "Персона 2").required()],
                |v| exec(security::check_contact_frequency(&v.text("person1"), &v.text("person2"))),
            ),
            action("Подозрительные контакты", vec![], |_| exec(security::suspicious_contacts())),
        ],
        PageId::FraudCheck => vec![
            action(
                "Полная проверка",
                vec![
                    text("person", "ID персоны").required(),
                    text("photo", "URL фото"),
                    text("activity", "ID активности"),
                ],
                |v| {
                    let request = security::check_person(&security::FraudCheck {
                        person_id: v.text("person"),
                        photo_url: v.opt("photo"),
                        triggered_by_activity_id: v.opt("activity"),
                    })?;
                    exec(request)
                },
            ),
            action(
                "Быстрая проверка",
                vec![text("person", "ID персоны").required(), text("activity", "ID активности")],
                |v| exec(security::quick_check(&v.text("person"), v.opt("activity").as_deref())),
            ),
            action(
                "Добавить в базу мошенников",
                vec![
                    text("person", "ID персоны").required(),
                    text("name", "ФИО").required(),
                    choice("type", "Тип", FraudType::VALUES).required(),
                    text("description", "Описание"),
                    text("photo", "URL фото"),
                    lookup("added_by", "Добавил", Lookup::Employee),
                ],
                |v| {
                    let request = security::create_fraud_record(&security::FraudRecord {
                        person_id: v.text("person"),
                        full_name: v.text("name"),
                        description: v.opt("description"),
                        photo_url: v.opt("photo"),
                        fraud_type: v.choice("type")?,
                        added_by: v.opt("added_by"),
                    })?;
                    exec(request)
                },
            ),
            action("База мошенников", vec![], |_| exec(security::list_fraud_records())),
            action("Поиск в базе", vec![text("q", "Запрос").required()], |v| {
                exec(security::search_fraud_records(&v.text("q")))
            }),
            action(
                "Записи по типу",
                vec![choice("type", "Тип", FraudType::VALUES).required()],
                |v| exec(security::fraud_records_by_type(v.choice::<FraudType>("type")?)),
            ),
            action("Запись по ID", vec![id("ID записи")], |v| exec(security::get_fraud_record(&v.text("id")))),
            action(
                "Изменить статус записи",
                vec![id("ID записи"), choice("status", "Статус", FraudStatus::VALUES).required()],
                |v| exec(security::update_fraud_status(&v.text("id"), v.choice("status")?)),
            ),
            action("Удалить запись", vec![id("ID записи")], |v| {
                exec(security::delete_fraud_record(&v.text("id")))
            }),
        ],
        PageId::Notifications => vec![
            action(
                "Уведомления получателя",
                vec![lookup("recipient", "Получатель", Lookup::Employee).required()],
                |v| exec(security::notifications_for(&v.text("recipient"))),
            ),
            action(
                "Непрочитанные",
                vec![lookup("recipient", "Получатель", Lookup::Employee).required()],
                |v| exec(security::unread_notifications(&v.text("recipient"))),
            ),
            action(
                "Количество непрочитанных",
                vec![lookup("recipient", "Получатель", Lookup::Employee).required()],
                |v| exec(security::unread_count(&v.text("recipient"))),
            ),
            action("Отметить прочитанным", vec![id("ID уведомления")], |v| {
                exec(security::mark_notification_read(&v.text("id")))
            }),
            action(
                "Создать уведомление",
                vec![
                    lookup("recipient", "Получатель", Lookup::Employee).required(),
                    choice("type", "Тип", NotificationType::VALUES).required(),
                    text("title", "Заголовок").required(),
                    text("message", "Сообщение").required(),
                    choice("priority", "Приоритет", NotificationPriority::VALUES)
                        .required()
                        .default_value("NORMAL"),
                ],
                |v| {
                    let request = security::create_notification(&security::NewNotification {
                        recipient_id: v.text("recipient"),
                        notification_type: v.choice("type")?,
                        title: v.text("title"),
                        message: v.text("message"),
                        priority: v.choice("priority")?,
                        related_entity_type: None,
                        related_entity_id: None,
                    })?;
                    exec(request)
                },
            ),
        ],

        PageId::Incidents => vec![
            action(
                "Журнал инцидентов",
                vec![
                    datetime("start", "С"),
                    datetime("end", "По"),
                    choice("type", "Тип", IncidentType::VALUES),
                ],
                |v| {
                    exec(incident::list_incidents(&incident::IncidentFilter {
                        start: v.opt_iso("start"),
                        end: v.opt_iso("end"),
                        incident_type: v.opt_choice("type")?,
                    }))
                },
            ),
            register_incident(),
            action("Инцидент по ID", vec![id("ID инцидента")], |v| exec(incident::get_incident(&v.text("id")))),
        ],
        PageId::IncidentRegistration => vec![register_incident()],
        PageId::Complaints => vec![
            action(
                "Зарегистрировать жалобу",
                vec![
                    choice("category", "Категория", ComplaintCategory::VALUES).required(),
                    choice("source", "Источник", ComplaintSource::VALUES).required(),
                    text("description", "Описание").required(),
                    text("reporter", "Заявитель"),
                    text("incident", "Связанный инцидент"),
                ],
                |v| {
                    let request = incident::create_complaint(&incident::CreateComplaint {
                        category: v.choice("category")?,
                        source: v.choice("source")?,
                        description: v.text("description"),
                        reporter_name: v.opt("reporter"),
                        related_incident_id: v.opt("incident"),
                    })?;
                    exec(request)
                },
            ),
            action(
                "Журнал жалоб",
                vec![
                    datetime("start", "С"),
                    datetime("end", "По"),
                    choice("category", "Категория", ComplaintCategory::VALUES),
                    choice("source", "Источник", ComplaintSource::VALUES),
                ],
                |v| {
                    exec(incident::list_complaints(&incident::ComplaintFilter {
                        start: v.opt_iso("start"),
                        end: v.opt_iso("end"),
                        category: v.opt_choice("category")?,
                        source: v.opt_choice("source")?,
                    }))
                },
            ),
            action("Жалоба по ID", vec![id("ID жалобы")], |v| exec(incident::get_complaint(&v.text("id")))),
            action(
                "Изменить статус жалобы",
                vec![id("ID жалобы"), choice("status", "Статус", ComplaintStatus::VALUES).required()],
                |v| exec(incident::update_complaint_status(&v.text("id"), v.choice("status")?)),
            ),
        ],
        PageId::RepeatedViolations => vec![action(
            "Повторные нарушения",
            vec![
                number("threshold", "Порог нарушений").required().default_value("3"),
                datetime("start", "С"),
                datetime("end", "По"),
            ],
            |v| {
                let request = incident::repeated_violations(&incident::RepeatedViolationsRequest {
                    period_start: v.opt_iso("start"),
                    period_end: v.opt_iso("end"),
                    threshold: v.opt_number("threshold"),
                })?;
                exec(request)
            },
        )],

        PageId::AllReports => vec![
            action(
                "Список отчётов",
                vec![choice("type", "Тип", ReportType::VALUES)],
                |v| exec(incident::list_reports(v.opt_choice("type")?)),
            ),
            action("Отчёт по ID", vec![id("ID отчёта")], |v| exec(incident::get_report(&v.text("id")))),
        ],
        PageId::IncidentReports => vec![
            action(
                "Сформировать отчёт по инцидентам",
                vec![
                    datetime("start", "Начало периода").required(),
                    datetime("end", "Конец периода").required(),
                    list("types", "Типы инцидентов"),
                    lookup("generated_by", "Автор", Lookup::Employee),
                ],
                |v| {
                    let incident_types = v
                        .list("types")
                        .iter()
                        .map(|t| t.to_uppercase().parse::<IncidentType>())
                        .collect::<std::result::Result<Vec<_>, _>>()
                        .map_err(anyhow::Error::msg)?;
                    let request = incident::generate_incident_report(&incident::IncidentReportRequest {
                        period: report_period(v),
                        incident_types,
                    })?;
                    exec(request)
                },
            ),
            action("Отчёты по инцидентам", vec![], |_| {
                exec(incident::list_reports(Some(ReportType::Incidents)))
            }),
        ],
        PageId::ManagementReports => vec![
            action("Сформировать управленческий отчёт", period_fields(), |v| {
                exec(incident::generate_management_report(&report_period(v))?)
            }),
            action("Управленческие отчёты", vec![], |_| {
                exec(incident::list_reports(Some(ReportType::Management)))
            }),
        ],
        PageId::RegulatoryReports => vec![
            action("Сформировать регуляторный отчёт", period_fields(), |v| {
                exec(incident::generate_regulatory_report(&report_period(v))?)
            }),
            action("Регуляторные отчёты", vec![], |_| {
                exec(incident::list_reports(Some(ReportType::Regulatory)))
            }),
        ],
        PageId::ExportReports => vec![
            action(
                "Выгрузить отчёт",
                vec![id("ID отчёта"), choice("format", "Формат", &["PDF", "EXCEL"]).required()],
                |v| {
                    let format = match v.text("format").as_str() {
                        "EXCEL" => ExportFormat::Excel,
                        _ => ExportFormat::Pdf,
                    };
                    let report_id = v.text("id");
                    Ok(Call::Download {
                        request: incident::export_report(&report_id, format),
                        file_name: format!("report-{}.{}", report_id, format.extension()),
                    })
                },
            ),
            action("Выгрузить финансовый отчёт", vec![id("ID отчёта")], |v| {
                let report_id = v.text("id");
                Ok(Call::Download {
                    request: finance::download_report(&report_id),
                    file_name: format!("financial-report-{}", report_id),
                })
            }),
        ],

        PageId::FinanceOverview => vec![
            action("Кассовые операции", vec![], |_| exec(finance::list_operations())),
            action("Аномалии", vec![], |_| exec(finance::list_anomalies(None, None))),
            action("Справочники касс и столов", vec![], |_| Ok(Call::LoadReference)),
        ],
        PageId::FinanceAnalysis => vec![
            action(
                "Сформировать финансовый отчёт",
                vec![date("start", "Начало периода").required(), date("end", "Конец периода").required()],
                |v| {
                    let request = finance::generate_report(&finance::FinancialReport {
                        period_start: v.text("start"),
                        period_end: v.text("end"),
                    })?;
                    exec(request)
                },
            ),
            action("Скачать финансовый отчёт", vec![id("ID отчёта")], |v| {
                let report_id = v.text("id");
                Ok(Call::Download {
                    request: finance::download_report(&report_id),
                    file_name: format!("financial-report-{}", report_id),
                })
            }),
        ],
        PageId::Operations => vec![
            action(
                "Провести операцию",
                vec![
                    lookup("desk", "Касса", Lookup::CashDesk).required(),
                    number("amount", "Сумма").required(),
                    choice("type", "Тип", OperationType::VALUES).required(),
                    text("currency", "Валюта").required().default_value("RUB"),
                ],
                |v| {
                    let request = finance::create_operation(&finance::CashOperation {
                        cash_desk_id: v.text("desk"),
                        amount: v.number("amount"),
                        operation_type: v.choice("type")?,
                        currency: v.text("currency"),
                    })?;
                    exec(request)
                },
            ),
            action("Журнал операций", vec![], |_| exec(finance::list_operations())),
            action("Операция по ID", vec![id("ID операции")], |v| exec(finance::get_operation(&v.text("id")))),
        ],
        PageId::CashControl => vec![
            action(
                "Сверка кассы",
                vec![
                    lookup("desk", "Касса", Lookup::CashDesk).required(),
                    datetime("start", "Начало смены").required(),
                    datetime("end", "Конец смены").required(),
                    number("balance", "Фактический остаток").required(),
                    text("notes", "Примечание"),
                ],
                |v| {
                    let request = finance::reconcile(&finance::Reconciliation {
                        cash_desk_id: v.text("desk"),
                        shift_start: v.iso("start"),
                        shift_end: v.iso("end"),
                        actual_balance: v.number("balance"),
                        notes: v.opt("notes"),
                    })?;
                    exec(request)
                },
            ),
            action("Сверка по ID", vec![id("ID сверки")], |v| exec(finance::get_reconciliation(&v.text("id")))),
            action(
                "Сверки по кассе",
                vec![lookup("desk", "Касса", Lookup::CashDesk).required()],
                |v| exec(finance::reconciliations_by_cash_desk(&v.text("desk"))),
            ),
            action(
                "Изменить статус сверки",
                vec![id("ID сверки"), choice("status", "Статус", ReconciliationStatus::VALUES).required()],
                |v| exec(finance::update_reconciliation_status(&v.text("id"), v.choice("status")?)),
            ),
        ],
        PageId::Anomalies => vec![
            action(
                "Найти аномалии",
                vec![
                    datetime("start", "Начало периода").required(),
                    datetime("end", "Конец периода").required(),
                    number("amount", "Порог крупной суммы"),
                    number("frequency", "Порог частоты"),
                    number("window", "Окно, минут"),
                ],
                |v| {
                    let request = finance::detect_anomalies(&finance::AnomalyDetection {
                        period_start: v.iso("start"),
                        period_end: v.iso("end"),
                        large_amount_threshold: v.opt_number("amount"),
                        frequency_threshold: v.opt_number("frequency"),
                        time_window_minutes: v.opt_number("window"),
                    })?;
                    exec(request)
                },
            ),
            action(
                "Список аномалий",
                vec![
                    choice("status", "Статус", AnomalyStatus::VALUES),
                    choice("risk", "Риск", RiskLevel::VALUES),
                ],
                |v| exec(finance::list_anomalies(v.opt_choice("status")?, v.opt_choice("risk")?)),
            ),
            action("Аномалия по ID", vec![id("ID аномалии")], |v| exec(finance::get_anomaly(&v.text("id")))),
            action(
                "Рассмотреть аномалию",
                vec![
                    id("ID аномалии"),
                    choice("status", "Решение", AnomalyStatus::VALUES).required(),
                    lookup("reviewer", "Проверяющий", Lookup::Employee).required(),
                    text("notes", "Примечание"),
                ],
                |v| {
                    exec(finance::review_anomaly(
                        &v.text("id"),
                        v.choice("status")?,
                        &v.text("reviewer"),
                        v.opt("notes").as_deref(),
                    ))
                },
            ),
        ],
        PageId::GameAnalysis => vec![
            action(
                "Анализ игр",
                vec![
                    datetime("start", "Начало периода").required(),
                    datetime("end", "Конец периода").required(),
                    lookup("table", "Игровой стол", Lookup::GameTable),
                    number("rtp", "Ожидаемый RTP, %"),
                    number("win", "Порог крупного выигрыша"),
                ],
                |v| {
                    let request = finance::analyze_games(&finance::GameAnalysis {
                        period_start: v.iso("start"),
                        period_end: v.iso("end"),
                        game_table_id: v.opt("table"),
                        expected_rtp: v.opt_number("rtp"),
                        large_win_threshold: v.opt_number("win"),
                    })?;
                    exec(request)
                },
            ),
            action("Анализ по ID", vec![id("ID анализа")], |v| exec(finance::get_game_analysis(&v.text("id")))),
            action(
                "Анализы по столу",
                vec![lookup("table", "Игровой стол", Lookup::GameTable).required()],
                |v| exec(finance::game_analyses_by_table(&v.text("table"))),
            ),
        ],

        PageId::WorkTime => vec![
            action(
                "Отметить приход",
                vec![lookup("employee", "Сотрудник", Lookup::Employee).required(), text("device", "Терминал")],
                |v| {
                    exec(staff::clock_in(&staff::ClockIn {
                        employee_id: v.text("employee"),
                        device_id: v.opt("device"),
                    })?)
                },
            ),
            action(
                "Отметить уход",
                vec![lookup("employee", "Сотрудник", Lookup::Employee).required()],
                |v| exec(staff::clock_out(&staff::ClockOut { employee_id: v.text("employee") })?),
            ),
            action(
                "Табель сотрудника",
                vec![
                    lookup("employee", "Сотрудник", Lookup::Employee).required(),
                    datetime("start", "С"),
                    datetime("end", "По"),
                ],
                |v| {
                    exec(staff::work_time_for(
                        &v.text("employee"),
                        v.opt_iso("start").as_deref(),
                        v.opt_iso("end").as_deref(),
                    ))
                },
            ),
            action("Запись по ID", vec![id("ID записи")], |v| exec(staff::get_work_time(&v.text("id")))),
            action("Проверить незакрытые смены", vec![], |_| exec(staff::check_missing_clock_outs())),
        ],
        PageId::StaffManagement => vec![
            action("Список сотрудников", vec![], |_| exec(staff::list_employees())),
            action(
                "Принять сотрудника",
                vec![
                    text("last", "Фамилия").required(),
                    text("first", "Имя").required(),
                    text("middle", "Отчество"),
                    text("position", "Должность").required(),
                    text("department", "Подразделение"),
                    choice("status", "Статус", EmployeeStatus::VALUES),
                    text("contact", "Контакты"),
                ],
                |v| {
                    let request = staff::create_employee(&staff::NewEmployee {
                        first_name: v.text("first"),
                        last_name: v.text("last"),
                        middle_name: v.opt("middle"),
                        position: v.text("position"),
                        department: v.opt("department"),
                        status: v.opt_choice("status")?,
                        contact_info: v.opt("contact"),
                    })?;
                    exec(request)
                },
            ),
            action(
                "Сотрудник по ID",
                vec![lookup("employee", "Сотрудник", Lookup::Employee).required()],
                |v| exec(staff::get_employee(&v.text("employee"))),
            ),
            action(
                "Сотрудники подразделения",
                vec![text("department", "Подразделение").required()],
                |v| exec(staff::employees_by_department(&v.text("department"))),
            ),
            action(
                "Изменить статус сотрудника",
                vec![
                    lookup("employee", "Сотрудник", Lookup::Employee).required(),
                    choice("status", "Статус", EmployeeStatus::VALUES).required(),
                ],
                |v| exec(staff::update_employee_status(&v.text("employee"), v.choice("status")?)),
            ),
        ],
        PageId::Discipline => vec![
            action(
                "Зафиксировать нарушение",
                vec![
                    lookup("employee", "Сотрудник", Lookup::Employee).required(),
                    choice("type", "Тип", ViolationType::VALUES).required(),
                    text("description", "Описание").required(),
                    list("attachments", "Вложения (URL)"),
                ],
                |v| {
                    let request = incident::create_violation(&incident::CreateViolation {
                        employee_id: v.text("employee"),
                        violation_type: v.choice("type")?,
                        description: v.text("description"),
                        attachment_urls: v.list("attachments"),
                    })?;
                    exec(request)
                },
            ),
            action("Журнал нарушений", vec![], |_| exec(incident::list_violations())),
            action("Нарушение по ID", vec![id("ID нарушения")], |v| exec(incident::get_violation(&v.text("id")))),
            action(
                "Нарушения сотрудника",
                vec![lookup("employee", "Сотрудник", Lookup::Employee).required()],
                |v| exec(incident::violations_by_employee(&v.text("employee"))),
            ),
        ],
        PageId::ViolationHistory => vec![
            action(
                "Поиск по истории",
                vec![
                    lookup("employee", "Сотрудник", Lookup::Employee),
                    text("department", "Подразделение"),
                    datetime("start", "С"),
                    datetime("end", "По"),
                    choice("type", "Тип", ViolationType::VALUES),
                ],
                |v| {
                    let request = staff::search_violation_history(&staff::ViolationHistorySearch {
                        employee_id: v.opt("employee"),
                        department: v.opt("department"),
                        start_date: v.opt_iso("start"),
                        end_date: v.opt_iso("end"),
                        violation_type: v.opt_choice("type")?,
                    })?;
                    exec(request)
                },
            ),
            action(
                "История сотрудника",
                vec![lookup("employee", "Сотрудник", Lookup::Employee).required()],
                |v| exec(staff::violation_history_for(&v.text("employee"))),
            ),
            action(
                "История подразделения",
                vec![text("department", "Подразделение").required()],
                |v| exec(staff::violation_history_by_department(&v.text("department"))),
            ),
        ],
        PageId::Shifts => vec![
            action(
                "Запланировать смену",
                vec![
                    lookup("employee", "Сотрудник", Lookup::Employee).required(),
                    date("date", "Дата").required(),
                    datetime("start", "Начало").required(),
                    datetime("end", "Окончание").required(),
                    choice("type", "Тип смены", ShiftType::VALUES).required(),
                    text("location", "Локация"),
                    lookup("created_by", "Составил", Lookup::Employee),
                    text("notes", "Примечание"),
                ],
                |v| {
                    let request = staff::create_shift(&staff::NewShift {
                        employee_id: v.text("employee"),
                        shift_date: v.text("date"),
                        planned_start_time: v.iso("start"),
                        planned_end_time: v.iso("end"),
                        shift_type: v.choice::<ShiftType>("type")?,
                        location: v.opt("location"),
                        created_by: v.opt("created_by"),
                        notes: v.opt("notes"),
                    })?;
                    exec(request)
                },
            ),
            action(
                "График за период",
                vec![date("start", "С").required(), date("end", "По").required()],
                |v| exec(staff::shifts_between(&v.text("start"), &v.text("end"))),
            ),
            action(
                "Смены сотрудника",
                vec![lookup("employee", "Сотрудник", Lookup::Employee).required()],
                |v| exec(staff::shifts_for(&v.text("employee"))),
            ),
            action("Смена по ID", vec![id("ID смены")], |v| exec(staff::get_shift(&v.text("id")))),
            action(
                "Доступность персонала",
                vec![date("start", "С").required(), date("end", "По").required()],
                |v| exec(staff::availability(&v.text("start"), &v.text("end"))),
            ),
            action("Опубликовать смену", vec![id("ID смены")], |v| exec(staff::publish_shift(&v.text("id")))),
            action(
                "Подтвердить смену",
                vec![id("ID смены"), lookup("by", "Подтвердил", Lookup::Employee).required()],
                |v| exec(staff::confirm_shift(&v.text("id"), &v.text("by"))),
            ),
            action(
                "Переназначить смену",
                vec![id("ID смены"), lookup("employee", "Новый сотрудник", Lookup::Employee).required()],
                |v| exec(staff::reassign_shift(&v.text("id"), &v.text("employee"))),
            ),
        ],

        PageId::RawConsole => vec![action(
            "Произвольный запрос",
            vec![
                choice("method", "Метод", CONSOLE_METHODS).required(),
                text("path", "Путь").required().default_value("/api/security/monitoring/status"),
                text("query", "Параметры (k=v&k2=v2)"),
                text("body", "Тело (JSON)"),
            ],
            build_raw_request,
        )],
    }
}

fn register_incident() -> ActionSpec {
    action(
        "Зарегистрировать инцидент",
        vec![
            choice("type", "Тип", IncidentType::VALUES).required(),
            text("location", "Локация").required(),
            text("description", "Описание").required(),
            list("participants", "Участники"),
            list("attachments", "Вложения (URL)"),
            lookup("reported_by", "Сообщил", Lookup::Employee),
        ],
        |v| {
            let request = incident::create_incident(&incident::CreateIncident {
                incident_type: v.choice("type")?,
                location: v.text("location"),
                description: v.text("description"),
                participants: v.list("participants"),
                attachment_urls: v.list("attachments"),
                reported_by: v.opt("reported_by"),
            })?;
            exec(request)
        },
    )
}

fn period_fields() -> Vec<FieldSpec> {
    vec![
        datetime("start", "Начало периода").required(),
        datetime("end", "Конец периода").required(),
        lookup("generated_by", "Автор", Lookup::Employee),
    ]
}

fn report_period(v: &FormValues) -> incident::ReportPeriod {
    incident::ReportPeriod {
        period_start: v.iso("start"),
        period_end: v.iso("end"),
        generated_by: v.opt("generated_by"),
    }
}

pub fn build_raw_request(v: &FormValues) -> Result<Call> {
    let method = Method::from_bytes(v.text("method").as_bytes())?;
    let mut request = RequestDescriptor::new(method, v.text("path"));

    for pair in v.text("query").split('&').filter(|p| !p.trim().is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        request = request.param(key.trim(), value.trim());
    }

    if let Some(body) = v.opt("body") {
        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(e) => bail!("Тело запроса не является JSON: {}", e),
        };
        request = request.body(value);
    }

    exec(request)
}
