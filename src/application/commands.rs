use crate::application::bootstrap::bootstrap_workspace;
use crate::application::ticker::{TICK_PERIOD, Ticker, runtime_handle};
use crate::domain::models::{
    Mode, Plan, PomodoroSettings, SessionRecord, Status, TodoItem, User, format_clock, next_id,
    parse_weekday,
};
use crate::domain::planner::{Planner, TodoList};
use crate::domain::session::{SessionMachine, SessionObserver, StartRequest};
use crate::infrastructure::account_store::AccountStore;
use crate::infrastructure::config::AppSettings;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::export::export_history;
use crate::infrastructure::history_store::{HistoryOwner, HistoryStore};
use crate::infrastructure::storage::SqliteKeyValueStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

pub type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct AppState {
    logs_dir: PathBuf,
    exports_dir: PathBuf,
    settings: AppSettings,
    session: Arc<Mutex<SessionMachine>>,
    runtime: Mutex<RuntimeState>,
    ticker: Ticker,
    now_provider: NowProvider,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let settings = bootstrap.settings;
        let store = Arc::new(SqliteKeyValueStore::new(&bootstrap.database_path));

        let accounts = AccountStore::open(Arc::clone(&store))?;
        let owner = history_owner(accounts.current_user());
        let history = HistoryStore::load(Arc::clone(&store), owner)?;
        let session = SessionMachine::new(settings.rating_policy, settings.pomodoro);
        info!(
            app = %settings.app_name,
            workspace = %bootstrap.workspace_root.display(),
            "workspace opened"
        );

        Ok(Self {
            logs_dir: bootstrap.logs_dir,
            exports_dir: bootstrap.exports_dir,
            ticker: Ticker::new(TICK_PERIOD, settings.completion_delay),
            settings,
            session: Arc::new(Mutex::new(session)),
            runtime: Mutex::new(RuntimeState {
                store,
                accounts,
                history,
                planner: Planner::default(),
                todos: TodoList::default(),
            }),
            now_provider: Arc::new(Utc::now),
            log_guard: Mutex::new(()),
        })
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Registers a presentation-layer observer. Observers run while the
    /// session lock is held and must not call back into `AppState`.
    pub fn subscribe(&self, observer: impl SessionObserver + 'static) -> Result<(), InfraError> {
        lock_session(self)?.subscribe(observer);
        Ok(())
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

struct RuntimeState {
    store: Arc<SqliteKeyValueStore>,
    accounts: AccountStore<SqliteKeyValueStore>,
    history: HistoryStore<SqliteKeyValueStore>,
    planner: Planner,
    todos: TodoList,
}

impl RuntimeState {
    fn reload_history(&mut self) -> Result<(), InfraError> {
        let owner = history_owner(self.accounts.current_user());
        self.history = HistoryStore::load(Arc::clone(&self.store), owner)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionStateResponse {
    pub mode: String,
    pub status: String,
    pub display: String,
    pub duration_seconds: u64,
    pub remaining_seconds: u64,
    pub elapsed_seconds: u64,
    pub phase: String,
    pub round: u32,
    pub max_rounds: u32,
}

pub fn register_impl(
    state: &AppState,
    username: String,
    password: String,
) -> Result<User, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let user = runtime.accounts.register(&username, &password)?;
    runtime.reload_history()?;
    drop(runtime);

    state.log_info("register", &format!("registered user_id={}", user.id));
    Ok(user)
}

pub fn login_impl(
    state: &AppState,
    username: String,
    password: String,
) -> Result<User, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let user = runtime.accounts.login(&username, &password)?;
    runtime.reload_history()?;
    drop(runtime);

    state.log_info("login", &format!("logged in user_id={}", user.id));
    Ok(user)
}

pub fn logout_impl(state: &AppState) -> Result<(), InfraError> {
    let mut runtime = lock_runtime(state)?;
    runtime.accounts.logout()?;
    runtime.reload_history()?;
    drop(runtime);

    state.log_info("logout", "cleared current user");
    Ok(())
}

pub fn current_user_impl(state: &AppState) -> Result<Option<User>, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(runtime.accounts.current_user().cloned())
}

pub fn get_session_state_impl(state: &AppState) -> Result<SessionStateResponse, InfraError> {
    let session = lock_session(state)?;
    Ok(to_session_state_response(&session))
}

pub fn set_mode_impl(state: &AppState, mode: String) -> Result<SessionStateResponse, InfraError> {
    let mode = mode.parse::<Mode>().map_err(InfraError::InvalidInput)?;
    let mut session = lock_session(state)?;
    if session.set_mode(mode)? {
        state.log_info("set_mode", &format!("switched to mode={mode}"));
    }
    Ok(to_session_state_response(&session))
}

pub fn update_pomodoro_settings_impl(
    state: &AppState,
    settings: PomodoroSettings,
) -> Result<SessionStateResponse, InfraError> {
    let mut session = lock_session(state)?;
    session.set_pomodoro_settings(settings)?;
    state.log_info(
        "update_pomodoro_settings",
        &format!("max_rounds={}", session.pomodoro().max_rounds),
    );
    Ok(to_session_state_response(&session))
}

pub fn start_session_impl(
    state: &AppState,
    request: StartRequest,
) -> Result<SessionStateResponse, InfraError> {
    runtime_handle()?;
    let mut session = lock_session(state)?;
    session.start(request)?;
    if let Err(error) = state.ticker.subscribe(&state.session, session.epoch()) {
        session.reset();
        return Err(error);
    }

    state.log_info(
        "start_session",
        &format!(
            "started mode={} duration={}",
            session.mode(),
            session.duration_seconds()
        ),
    );
    Ok(to_session_state_response(&session))
}

pub fn toggle_pause_impl(state: &AppState) -> Result<SessionStateResponse, InfraError> {
    let mut session = lock_session(state)?;
    if session.status() == Status::Paused {
        runtime_handle()?;
    }
    let status = session.toggle_pause()?;
    if status == Status::Running {
        if let Err(error) = state.ticker.subscribe(&state.session, session.epoch()) {
            session.toggle_pause()?;
            return Err(error);
        }
    } else {
        state.ticker.cancel()?;
    }

    state.log_info("toggle_pause", &format!("status={}", status.as_str()));
    Ok(to_session_state_response(&session))
}

pub fn reset_session_impl(state: &AppState) -> Result<SessionStateResponse, InfraError> {
    let mut session = lock_session(state)?;
    state.ticker.cancel()?;
    session.reset();

    state.log_info("reset_session", &format!("reset mode={}", session.mode()));
    Ok(to_session_state_response(&session))
}

pub fn save_session_impl(
    state: &AppState,
    name: String,
    rating: u8,
) -> Result<SessionRecord, InfraError> {
    let mut session = lock_session(state)?;
    let draft = session.prepare_save(&name, rating)?;

    let language = state.settings.language;
    let now = (state.now_provider)().with_timezone(&state.settings.timezone);
    let record = SessionRecord {
        id: next_id(),
        date: language.format_date(now.date_naive()),
        name: if draft.name.is_empty() {
            language.default_session_name().to_string()
        } else {
            draft.name
        },
        duration_seconds: draft.duration_seconds,
        rating: draft.rating,
    };

    {
        let mut runtime = lock_runtime(state)?;
        runtime.history.append(record.clone())?;
    }
    session.commit_save(&record)?;
    state.ticker.cancel()?;

    state.log_info(
        "save_session",
        &format!("saved record_id={} rating={}", record.id, record.rating),
    );
    Ok(record)
}

pub fn list_history_impl(state: &AppState) -> Result<Vec<SessionRecord>, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(runtime.history.records().to_vec())
}

pub fn delete_history_impl(state: &AppState, record_id: i64) -> Result<bool, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let deleted = runtime.history.delete(record_id)?;
    drop(runtime);

    if deleted {
        state.log_info("delete_history", &format!("deleted record_id={record_id}"));
    }
    Ok(deleted)
}

pub fn export_history_impl(
    state: &AppState,
    dir: Option<PathBuf>,
) -> Result<Option<PathBuf>, InfraError> {
    let (records, username) = {
        let runtime = lock_runtime(state)?;
        (
            runtime.history.records().to_vec(),
            runtime
                .accounts
                .current_user()
                .map(|user| user.username.clone()),
        )
    };
    let dir = dir.unwrap_or_else(|| state.exports_dir.clone());
    let today = (state.now_provider)()
        .with_timezone(&state.settings.timezone)
        .date_naive();

    let exported = export_history(
        &dir,
        &records,
        username.as_deref(),
        today,
        state.settings.language,
    )?;
    match exported.as_ref() {
        Some(path) => state.log_info("export_history", &format!("exported {}", path.display())),
        None => state.log_info("export_history", "no history to export"),
    }
    Ok(exported)
}

pub fn add_plan_impl(
    state: &AppState,
    subject: String,
    day: String,
    time: String,
) -> Result<Plan, InfraError> {
    let day = parse_weekday(&day)?;
    let mut runtime = lock_runtime(state)?;
    let plan = runtime.planner.add_plan(&subject, day, &time)?;
    drop(runtime);

    state.log_info("add_plan", &format!("created plan_id={}", plan.id));
    Ok(plan)
}

pub fn delete_plan_impl(state: &AppState, plan_id: i64) -> Result<bool, InfraError> {
    let mut runtime = lock_runtime(state)?;
    Ok(runtime.planner.delete_plan(plan_id))
}

pub fn list_plans_impl(state: &AppState, day: Option<String>) -> Result<Vec<Plan>, InfraError> {
    let day = day
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(parse_weekday)
        .transpose()?;
    let runtime = lock_runtime(state)?;
    Ok(match day {
        Some(day) => runtime.planner.plans_for_day(day),
        None => runtime.planner.plans(),
    })
}

pub fn add_todo_impl(state: &AppState, text: String) -> Result<TodoItem, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let item = runtime.todos.add_todo(&text)?;
    drop(runtime);

    state.log_info("add_todo", &format!("created todo_id={}", item.id));
    Ok(item)
}

pub fn toggle_todo_impl(state: &AppState, todo_id: i64) -> Result<Option<TodoItem>, InfraError> {
    let mut runtime = lock_runtime(state)?;
    Ok(runtime.todos.toggle(todo_id))
}

pub fn delete_todo_impl(state: &AppState, todo_id: i64) -> Result<bool, InfraError> {
    let mut runtime = lock_runtime(state)?;
    Ok(runtime.todos.delete(todo_id))
}

pub fn list_todos_impl(state: &AppState) -> Result<Vec<TodoItem>, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(runtime.todos.items().to_vec())
}

fn history_owner(user: Option<&User>) -> HistoryOwner {
    user.map(|user| HistoryOwner::User(user.id))
        .unwrap_or(HistoryOwner::Guest)
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|error| InfraError::Runtime(format!("runtime lock poisoned: {error}")))
}

fn lock_session(state: &AppState) -> Result<MutexGuard<'_, SessionMachine>, InfraError> {
    state
        .session
        .lock()
        .map_err(|error| InfraError::Runtime(format!("session lock poisoned: {error}")))
}

fn to_session_state_response(session: &SessionMachine) -> SessionStateResponse {
    let pomodoro = session.pomodoro();
    SessionStateResponse {
        mode: session.mode().as_str().to_string(),
        status: session.status().as_str().to_string(),
        display: format_clock(session.display_seconds()),
        duration_seconds: session.duration_seconds(),
        remaining_seconds: session.remaining_seconds(),
        elapsed_seconds: session.elapsed_seconds(),
        phase: pomodoro.phase.as_str().to_string(),
        round: pomodoro.round,
        max_rounds: pomodoro.max_rounds,
    }
}
