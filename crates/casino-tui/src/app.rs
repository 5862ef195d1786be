use casino_core::api::reference::ReferenceData;
use casino_core::api::staff::Employee;
use casino_core::{guard, post_login_target, probe_login, ApiClient, Config, GateDecision, LoginError, PageId, Route, Section, SessionStore};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::call::{self, CallContext, CallOutcome};
use crate::form::{FieldKind, FormState, Lookup, LookupOption};
use crate::pages::{self, ActionSpec, Call};

pub const LOGIN_REJECTED: &str = "Неверный логин/пароль или доступ запрещен.";
pub const LOGIN_NETWORK: &str = "Ошибка сети. Проверьте базовый URL API или прокси.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Pages,
    Actions,
    Form,
    Result,
}

/// A request in flight for one page. Only the newest one per app is kept.
pub struct PendingCall {
    pub page: PageId,
    pub generation: u64,
    pub title: &'static str,
    pub handle: JoinHandle<CallOutcome>,
}

#[derive(Debug, Clone)]
pub struct ResultView {
    pub title: &'static str,
    pub outcome: CallOutcome,
}

struct LoginAttempt {
    username: String,
    base_url: String,
    handle: JoinHandle<Result<String, LoginError>>,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub route: Route,
    /// Protected route the user asked for before being sent to login.
    pub redirect_from: Option<Route>,

    // Navigation state
    pub section: Section,
    pub page_state: ListState,
    pub action_state: ListState,
    pub actions: Vec<ActionSpec>,

    // Form and result state
    pub form: Option<FormState>,
    pub form_error: Option<String>,
    pub result: Option<ResultView>,
    pub result_scroll: u16,
    pub result_height: u16,
    pub result_lines: u16,
    pub pending: Option<PendingCall>,
    generation: u64,

    // Go-to prompt
    pub show_goto: bool,
    pub goto_input: String,

    // Login state
    pub login_form: FormState,
    pub login_message: Option<String>,
    login_attempt: Option<LoginAttempt>,

    // Directories for lookup fields
    pub cash_desks: Vec<LookupOption>,
    pub game_tables: Vec<LookupOption>,
    pub employees: Vec<LookupOption>,
    reference_task: Option<JoinHandle<ReferenceData>>,
    employee_task: Option<JoinHandle<Vec<Employee>>>,

    /// One-line notice shown in the footer until the next action.
    pub banner: Option<String>,
    pub animation_frame: u8,

    // Panel areas for mouse hit-testing (updated during render)
    pub pages_area: Option<Rect>,
    pub result_area: Option<Rect>,

    // Data
    pub store: SessionStore,
    pub client: ApiClient,
    pub config: Config,
}

impl App {
    pub fn new(config: Config, store: SessionStore, client: ApiClient) -> Self {
        let mut login_form = FormState::new(&pages::login_fields());
        let base_url = match store.session().base_url.as_str() {
            "" => config.default_base_url.clone(),
            persisted => persisted.to_string(),
        };
        login_form.set_value("base_url", &base_url);
        if let Some(username) = &store.session().username {
            login_form.set_value("username", username);
        }

        Self {
            should_quit: false,
            screen: Screen::Login,
            input_mode: InputMode::Normal,
            focus: FocusPane::Pages,
            route: Route::Login,
            redirect_from: None,

            section: Section::Security,
            page_state: ListState::default(),
            action_state: ListState::default(),
            actions: Vec::new(),

            form: None,
            form_error: None,
            result: None,
            result_scroll: 0,
            result_height: 0,
            result_lines: 0,
            pending: None,
            generation: 0,

            show_goto: false,
            goto_input: String::new(),

            login_form,
            login_message: None,
            login_attempt: None,

            cash_desks: Vec::new(),
            game_tables: Vec::new(),
            employees: Vec::new(),
            reference_task: None,
            employee_task: None,

            banner: None,
            animation_frame: 0,

            pages_area: None,
            result_area: None,

            store,
            client,
            config,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    fn context(&self) -> CallContext {
        let session = self.store.session();
        CallContext {
            client: self.client.clone(),
            base_url: session.base_url.clone(),
            token: session.token.clone(),
            download_dir: self.config.download_dir(),
        }
    }

    // Routing

    /// Go to `requested`, sending anonymous users to login first.
    pub fn navigate(&mut self, requested: Route) {
        match guard(self.store.session(), requested) {
            GateDecision::Render(Route::Login) => self.show_login(None),
            GateDecision::Render(Route::Page(page)) => self.open_page(page),
            GateDecision::Redirect { from, .. } => {
                debug!(from = %from, "not logged in, redirecting to login");
                self.show_login(Some(from));
            }
        }
    }

    pub fn navigate_to(&mut self, location: &str) {
        self.navigate(Route::parse(location));
    }

    fn show_login(&mut self, from: Option<Route>) {
        self.cancel_pending();
        if from.is_some() {
            self.redirect_from = from;
        }
        self.route = Route::Login;
        self.screen = Screen::Login;
        self.input_mode = InputMode::Editing;
        self.result = None;
        self.form = None;
    }

    fn open_page(&mut self, page: PageId) {
        if self.route != Route::Page(page) {
            self.cancel_pending();
            self.result = None;
            self.result_scroll = 0;
        }
        self.route = Route::Page(page);
        self.screen = Screen::Page;
        self.input_mode = InputMode::Normal;
        self.section = page.section();
        self.page_state
            .select(self.section.links().iter().position(|p| *p == page));

        self.actions = pages::actions(page);
        self.action_state.select(if self.actions.is_empty() { None } else { Some(0) });
        self.reset_form();
        info!(route = %self.route, "page opened");
    }

    pub fn current_page(&self) -> Option<PageId> {
        match self.route {
            Route::Page(page) => Some(page),
            Route::Login => None,
        }
    }

    // Sidebar

    pub fn page_links(&self) -> Vec<PageId> {
        self.section.links()
    }

    pub fn pages_down(&mut self) {
        let len = self.page_links().len();
        if len > 0 {
            let i = self.page_state.selected().map(|i| (i + 1).min(len - 1)).unwrap_or(0);
            self.page_state.select(Some(i));
        }
    }

    pub fn pages_up(&mut self) {
        let i = self.page_state.selected().unwrap_or(0);
        self.page_state.select(Some(i.saturating_sub(1)));
    }

    pub fn open_selected_page(&mut self) {
        let links = self.page_links();
        if let Some(page) = self.page_state.selected().and_then(|i| links.get(i)).copied() {
            self.navigate(Route::Page(page));
        }
    }

    /// Move to the neighbouring section and open its first page.
    pub fn switch_section(&mut self, forward: bool) {
        let sections = Section::all();
        let current = sections.iter().position(|s| *s == self.section).unwrap_or(0);
        let len = sections.len();
        let next = if forward { (current + 1) % len } else { (current + len - 1) % len };
        if let Some(page) = sections[next].links().first().copied() {
            self.navigate(Route::Page(page));
        }
    }

    // Actions and forms

    pub fn selected_action(&self) -> Option<&ActionSpec> {
        self.action_state.selected().and_then(|i| self.actions.get(i))
    }

    fn reset_form(&mut self) {
        self.form = self.selected_action().map(|spec| FormState::new(&spec.fields));
        self.form_error = None;
    }

    pub fn actions_down(&mut self) {
        let len = self.actions.len();
        if len > 0 {
            let i = self.action_state.selected().map(|i| (i + 1).min(len - 1)).unwrap_or(0);
            self.action_state.select(Some(i));
            self.reset_form();
        }
    }

    pub fn actions_up(&mut self) {
        let i = self.action_state.selected().unwrap_or(0);
        self.action_state.select(Some(i.saturating_sub(1)));
        self.reset_form();
    }

    pub fn lookup_options(&self, lookup: Lookup) -> &[LookupOption] {
        match lookup {
            Lookup::CashDesk => &self.cash_desks,
            Lookup::GameTable => &self.game_tables,
            Lookup::Employee => &self.employees,
        }
    }

    /// Step the focused choice or lookup field of the page form.
    pub fn cycle_field(&mut self, forward: bool) {
        let lookup = match self.form.as_ref().and_then(FormState::focused_field).map(|f| f.kind) {
            Some(FieldKind::Lookup(lookup)) => Some(lookup),
            _ => None,
        };
        let options = lookup.map(|l| self.lookup_options(l).to_vec()).unwrap_or_default();
        if let Some(form) = self.form.as_mut() {
            form.cycle(forward, &options);
        }
    }

    /// Validate the form, build the call and start it. The previous request is abandoned.
    pub fn submit_action(&mut self) {
        let Some(page) = self.current_page() else {
            return;
        };
        let Some(index) = self.action_state.selected() else {
            return;
        };
        let (Some(spec), Some(form)) = (self.actions.get(index), self.form.as_mut()) else {
            return;
        };

        let values = match form.validate() {
            Ok(values) => values,
            Err(missing) => {
                self.form_error = Some(format!("Заполните обязательные поля: {}", missing.join(", ")));
                return;
            }
        };
        let title = spec.title;
        let call = match spec.build(&values) {
            Ok(call) => call,
            Err(e) => {
                self.form_error = Some(e.to_string());
                return;
            }
        };

        self.form_error = None;
        self.start_call(page, title, call);
    }

    fn start_call(&mut self, page: PageId, title: &'static str, call: Call) {
        self.cancel_pending();
        self.generation += 1;
        self.banner = None;
        let ctx = self.context();
        info!(page = %page.path(), action = title, "request started");
        self.pending = Some(PendingCall {
            page,
            generation: self.generation,
            title,
            handle: tokio::spawn(call::run(ctx, call)),
        });
    }

    /// Abandon the request in flight, if any. Its result will never be shown.
    pub fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.handle.abort();
                debug!(page = %pending.page.path(), action = pending.title, "request abandoned");
                true
            }
            None => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some() || self.login_attempt.is_some()
    }

    /// Show a finished call if it still belongs to the visible page. Returns whether it was shown.
    pub fn accept_result(&mut self, page: PageId, generation: u64, title: &'static str, outcome: CallOutcome) -> bool {
        if self.route != Route::Page(page) || generation != self.generation {
            debug!(page = %page.path(), generation, "dropping stale result");
            return false;
        }
        if let CallOutcome::Reference(data) = &outcome {
            self.apply_reference(data.clone());
        }
        self.result = Some(ResultView { title, outcome });
        self.result_scroll = 0;
        true
    }

    // Login

    pub fn submit_login(&mut self) {
        if self.login_attempt.is_some() {
            return;
        }
        let values = match self.login_form.validate() {
            Ok(values) => values,
            Err(missing) => {
                self.login_message = Some(format!("Заполните обязательные поля: {}", missing.join(", ")));
                return;
            }
        };

        let username = values.text("username");
        let password = values.text("password");
        let base_url = values.text("base_url");
        let client = self.client.clone();
        let probe_base = base_url.clone();
        let probe_user = username.clone();
        self.login_message = None;
        self.login_attempt = Some(LoginAttempt {
            username,
            base_url,
            handle: tokio::spawn(async move { probe_login(&client, &probe_base, &probe_user, &password).await }),
        });
    }

    fn finish_login(&mut self, username: String, base_url: String, result: Result<String, LoginError>) {
        let token = match result {
            Ok(token) => token,
            Err(LoginError::Rejected { status }) => {
                warn!(status, "login rejected");
                self.login_message = Some(LOGIN_REJECTED.to_string());
                return;
            }
            Err(LoginError::Network(e)) => {
                warn!(error = %e, "login probe failed");
                self.login_message = Some(LOGIN_NETWORK.to_string());
                return;
            }
        };

        if let Err(e) = self.store.login(&username, &token, &base_url) {
            warn!(error = %e, "could not persist session");
            self.login_message = Some(format!("Не удалось сохранить сессию: {}", e));
            return;
        }

        self.login_form.set_value("password", "");
        let target = post_login_target(self.redirect_from.take());
        self.navigate(target);
        self.start_lookups();
    }

    pub fn logout(&mut self) {
        self.cancel_pending();
        if let Some(attempt) = self.login_attempt.take() {
            attempt.handle.abort();
        }
        if let Some(task) = self.reference_task.take() {
            task.abort();
        }
        if let Some(task) = self.employee_task.take() {
            task.abort();
        }
        if let Err(e) = self.store.logout() {
            warn!(error = %e, "could not clear persisted session");
        }
        self.cash_desks.clear();
        self.game_tables.clear();
        self.employees.clear();
        self.redirect_from = None;
        self.login_message = None;
        self.navigate(Route::Login);
    }

    // Directories

    pub fn start_lookups(&mut self) {
        if !self.is_authenticated() {
            return;
        }
        let ctx = self.context();
        self.reference_task = Some(tokio::spawn({
            let ctx = ctx.clone();
            async move {
                casino_core::api::reference::load_reference_data(&ctx.client, &ctx.base_url, ctx.token.as_deref()).await
            }
        }));
        self.employee_task = Some(tokio::spawn(call::load_employees(ctx)));
    }

    fn apply_reference(&mut self, data: ReferenceData) {
        self.cash_desks = data
            .cash_desks
            .iter()
            .map(|d| LookupOption { id: d.id.clone(), label: d.label() })
            .collect();
        self.game_tables = data
            .game_tables
            .iter()
            .map(|t| LookupOption { id: t.id.clone(), label: t.label() })
            .collect();
        if data.error.is_some() {
            self.banner = data.error;
        }
    }

    fn apply_employees(&mut self, employees: Vec<Employee>) {
        self.employees = employees
            .iter()
            .map(|e| LookupOption { id: e.id.clone(), label: e.display_name() })
            .collect();
    }

    // Background tasks

    /// Collect every finished background task. Called on each tick.
    pub async fn poll_tasks(&mut self) {
        if self.login_attempt.as_ref().is_some_and(|a| a.handle.is_finished()) {
            if let Some(attempt) = self.login_attempt.take() {
                match attempt.handle.await {
                    Ok(result) => self.finish_login(attempt.username, attempt.base_url, result),
                    Err(e) => warn!(error = %e, "login task failed"),
                }
            }
        }

        if self.pending.as_ref().is_some_and(|p| p.handle.is_finished()) {
            if let Some(pending) = self.pending.take() {
                match pending.handle.await {
                    Ok(outcome) => {
                        self.accept_result(pending.page, pending.generation, pending.title, outcome);
                    }
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => warn!(error = %e, "request task failed"),
                }
            }
        }

        if self.reference_task.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(task) = self.reference_task.take() {
                if let Ok(data) = task.await {
                    self.apply_reference(data);
                }
            }
        }

        if self.employee_task.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(task) = self.employee_task.take() {
                if let Ok(employees) = task.await {
                    self.apply_employees(employees);
                }
            }
        }
    }

    // Result pane

    pub fn scroll_down(&mut self) {
        if self.result_scroll < self.result_lines.saturating_sub(self.result_height) {
            self.result_scroll = self.result_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.result_scroll = self.result_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.result_height / 2;
        let max_scroll = self.result_lines.saturating_sub(self.result_height);
        self.result_scroll = (self.result_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.result_height / 2;
        self.result_scroll = self.result_scroll.saturating_sub(half_page);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casino_core::client::TransportResponse;
    use casino_core::testing::RecordingTransport;
    use casino_core::MemoryStorage;
    use std::sync::Arc;
    use std::time::Duration;

    fn app_with(transport: &Arc<RecordingTransport>, storage: MemoryStorage) -> App {
        let client = ApiClient::with_transport(transport.clone(), "http://proxy");
        App::new(Config::new(), SessionStore::load(Box::new(storage)), client)
    }

    fn logged_in_app(transport: &Arc<RecordingTransport>) -> App {
        let mut store = SessionStore::load(Box::new(MemoryStorage::new()));
        store.login("admin", "Basic YWRtaW46YWRtaW4=", "http://mis").unwrap();
        let client = ApiClient::with_transport(transport.clone(), "http://proxy");
        App::new(Config::new(), store, client)
    }

    async fn settle(app: &mut App) {
        for _ in 0..50 {
            app.poll_tasks().await;
            if !app.is_loading() && app.reference_task.is_none() && app.employee_task.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_anonymous_user_is_sent_to_login_and_back() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(200, "{}"));
        let mut app = app_with(&transport, MemoryStorage::new());

        app.navigate_to("/finance/anomalies");
        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.redirect_from, Some(Route::Page(PageId::Anomalies)));

        app.submit_login();
        settle(&mut app).await;
        assert!(app.is_authenticated());
        assert_eq!(app.route, Route::Page(PageId::Anomalies));
        assert_eq!(app.redirect_from, None);
        assert_eq!(app.login_form.value("password"), "");
    }

    #[tokio::test]
    async fn test_direct_login_lands_on_incidents() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(200, "{}"));
        let mut app = app_with(&transport, MemoryStorage::new());

        app.navigate_to("/login");
        app.submit_login();
        settle(&mut app).await;
        assert_eq!(app.route, Route::Page(PageId::Incidents));
        assert_eq!(app.section, Section::Incidents);
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_user_on_login() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(401, ""));
        let mut app = app_with(&transport, MemoryStorage::new());

        app.navigate_to("/security");
        app.submit_login();
        settle(&mut app).await;
        assert!(!app.is_authenticated());
        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.login_message.as_deref(), Some(LOGIN_REJECTED));
    }

    #[tokio::test]
    async fn test_network_error_message_differs() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push_error(casino_core::ApiError::Network("refused".to_string()));
        let mut app = app_with(&transport, MemoryStorage::new());

        app.submit_login();
        settle(&mut app).await;
        assert_eq!(app.login_message.as_deref(), Some(LOGIN_NETWORK));
    }

    #[tokio::test]
    async fn test_login_requires_username_and_password() {
        let transport = Arc::new(RecordingTransport::new());
        let mut app = app_with(&transport, MemoryStorage::new());

        app.login_form.set_value("password", "");
        app.submit_login();
        assert!(app.login_message.as_deref().unwrap().contains("Пароль"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_stale_result_is_dropped_after_leaving_page() {
        let transport = Arc::new(RecordingTransport::new());
        let mut app = logged_in_app(&transport);
        app.navigate(Route::Page(PageId::Operations));
        let generation = app.generation;

        app.navigate(Route::Page(PageId::Shifts));
        let outcome = CallOutcome::Failed {
            request_line: "GET /x".to_string(),
            status: None,
            error: "late".to_string(),
        };
        assert!(!app.accept_result(PageId::Operations, generation, "x", outcome.clone()));
        assert!(app.result.is_none());

        assert!(app.accept_result(PageId::Shifts, app.generation, "x", outcome));
        assert!(app.result.is_some());
    }

    #[tokio::test]
    async fn test_newer_request_wins() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(200, "[]"));
        transport.push(TransportResponse::new(200, r#"[{"id":"op-2"}]"#));
        let mut app = logged_in_app(&transport);
        app.navigate(Route::Page(PageId::Operations));
        app.action_state.select(Some(1));
        app.reset_form();

        app.submit_action();
        let first = app.generation;
        app.submit_action();
        assert_eq!(app.generation, first + 1);

        settle(&mut app).await;
        let result = app.result.as_ref().unwrap();
        assert_eq!(result.title, "Журнал операций");
        assert!(result.outcome.is_ok());
    }

    #[tokio::test]
    async fn test_missing_required_field_blocks_the_request() {
        let transport = Arc::new(RecordingTransport::new());
        let mut app = logged_in_app(&transport);
        app.navigate(Route::Page(PageId::Operations));

        app.submit_action();
        assert!(app.pending.is_none());
        assert!(app.form_error.as_deref().unwrap().contains("Касса"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_logout_returns_to_login_and_keeps_base() {
        let transport = Arc::new(RecordingTransport::new());
        let mut app = logged_in_app(&transport);
        app.navigate_to("/staff/shifts");
        assert_eq!(app.route, Route::Page(PageId::Shifts));

        app.logout();
        assert_eq!(app.screen, Screen::Login);
        assert!(!app.is_authenticated());
        assert_eq!(app.store.session().base_url, "http://mis");

        app.navigate_to("/staff/shifts");
        assert_eq!(app.screen, Screen::Login);
    }

    #[tokio::test]
    async fn test_legacy_locations_redirect() {
        let transport = Arc::new(RecordingTransport::new());
        let mut app = logged_in_app(&transport);

        app.navigate_to("/staff/violations");
        assert_eq!(app.route, Route::Page(PageId::Discipline));
        app.navigate_to("/staff");
        assert_eq!(app.route, Route::Page(PageId::SecurityOverview));
        app.navigate_to("/nowhere");
        assert_eq!(app.route, Route::Page(PageId::SecurityOverview));
    }

    #[tokio::test]
    async fn test_lookups_fill_from_directories() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(200, r#"[{"id":"d1","name":"Касса 1"}]"#));
        transport.push(TransportResponse::new(200, r#"[]"#));
        transport.push(TransportResponse::new(200, r#"[{"id":"e1","lastName":"Петров"}]"#));
        let mut app = logged_in_app(&transport);

        // Reference data first so the recording transport answers in a known order.
        app.start_lookups();
        settle(&mut app).await;
        assert_eq!(app.cash_desks, vec![LookupOption { id: "d1".to_string(), label: "Касса 1".to_string() }]);
        assert_eq!(app.lookup_options(Lookup::Employee).len(), 1);
    }
}
