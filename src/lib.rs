pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

use application::commands::{
    AppState, add_plan_impl, add_todo_impl, current_user_impl, delete_history_impl,
    export_history_impl, get_session_state_impl, list_history_impl, list_plans_impl,
    list_todos_impl, login_impl, logout_impl, register_impl, reset_session_impl,
    save_session_impl, start_session_impl, toggle_todo_impl,
};
use cli::{Cli, Commands, HistoryCommands, RecordArgs};
use domain::models::{PomodoroSettings, Status, format_clock, weekday_name};
use domain::session::{SessionEvent, StartRequest};
use infrastructure::error::InfraError;
use serde::Serialize;
use std::io::Write;
use tokio::sync::mpsc;

pub async fn run(cli: Cli) -> Result<(), InfraError> {
    let workspace_root = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let state = AppState::new(workspace_root)?;
    let command = command_name(&cli.command);

    dispatch(&state, cli.command).await.map_err(|error| {
        state.log_error(command, &error.to_string());
        error
    })
}

async fn dispatch(state: &AppState, command: Commands) -> Result<(), InfraError> {
    match command {
        Commands::Register { username, password } => {
            let user = register_impl(state, username, password)?;
            println!("Registered and logged in as {}", user.username);
            Ok(())
        }
        Commands::Login { username, password } => {
            let user = login_impl(state, username, password)?;
            println!("Logged in as {}", user.username);
            Ok(())
        }
        Commands::Logout => {
            logout_impl(state)?;
            println!("Logged out");
            Ok(())
        }
        Commands::Whoami => {
            match current_user_impl(state)? {
                Some(user) => println!("{}", user.username),
                None => println!("Guest"),
            }
            Ok(())
        }
        Commands::History { command } => {
            handle_history(state, command.unwrap_or(HistoryCommands::List))
        }
        Commands::Timer {
            hours,
            minutes,
            seconds,
            record,
        } => {
            let request = StartRequest::Timer {
                hours,
                minutes,
                seconds,
            };
            handle_timer(state, request, record).await
        }
        Commands::Stopwatch { seconds } => handle_stopwatch(state, seconds).await,
        Commands::Pomodoro {
            focus,
            short_break,
            long_break,
            rounds,
            phases,
        } => {
            let defaults = state.settings().pomodoro;
            let settings = PomodoroSettings {
                focus_minutes: focus.unwrap_or(defaults.focus_minutes),
                short_break_minutes: short_break.unwrap_or(defaults.short_break_minutes),
                long_break_minutes: long_break.unwrap_or(defaults.long_break_minutes),
                rounds_per_cycle: rounds.unwrap_or(defaults.rounds_per_cycle),
            };
            handle_pomodoro(state, settings, phases.max(1)).await
        }
        Commands::Plan { entries, day } => {
            for entry in entries {
                let mut parts = entry.trim().splitn(3, char::is_whitespace);
                let day = parts.next().unwrap_or_default().to_string();
                let time = parts.next().unwrap_or_default().to_string();
                let subject = parts.next().unwrap_or_default().to_string();
                add_plan_impl(state, subject, day, time)?;
            }
            for plan in list_plans_impl(state, day)? {
                println!("{:<9} {}  {}", weekday_name(plan.day), plan.time, plan.subject);
            }
            Ok(())
        }
        Commands::Todo { items, done } => {
            for text in items {
                add_todo_impl(state, text)?;
            }
            let listed = list_todos_impl(state)?;
            for position in done {
                if let Some(item) = position.checked_sub(1).and_then(|index| listed.get(index)) {
                    toggle_todo_impl(state, item.id)?;
                }
            }
            print_json(&list_todos_impl(state)?)
        }
    }
}

fn handle_history(state: &AppState, command: HistoryCommands) -> Result<(), InfraError> {
    match command {
        HistoryCommands::List => {
            let records = list_history_impl(state)?;
            if records.is_empty() {
                println!("No sessions recorded yet");
            }
            for record in records {
                println!(
                    "{}  {}  {}  {}  {}",
                    record.id,
                    record.date,
                    record.name,
                    record.formatted_duration(),
                    "★".repeat(usize::from(record.rating))
                );
            }
            Ok(())
        }
        HistoryCommands::Delete { id } => {
            if delete_history_impl(state, id)? {
                println!("Deleted session {id}");
            } else {
                println!("No session with id {id}");
            }
            Ok(())
        }
        HistoryCommands::Export { dir } => {
            match export_history_impl(state, dir)? {
                Some(path) => println!("Exported {}", path.display()),
                None => println!("No sessions to export"),
            }
            Ok(())
        }
    }
}

async fn handle_timer(
    state: &AppState,
    request: StartRequest,
    record: RecordArgs,
) -> Result<(), InfraError> {
    let mut events = subscribe_events(state)?;
    start_session_impl(state, request)?;

    while let Some(event) = events.recv().await {
        render_event(&event);
        match event {
            SessionEvent::StatusChanged(Status::AwaitingRating) => break,
            SessionEvent::StatusChanged(Status::Idle) => return Ok(()),
            _ => {}
        }
    }

    if get_session_state_impl(state)?.status != Status::AwaitingRating.as_str() {
        return Ok(());
    }
    match record.rating {
        Some(rating) => {
            let saved = save_session_impl(state, record.name, rating)?;
            println!("Saved {} ({})", saved.name, saved.formatted_duration());
        }
        None => {
            reset_session_impl(state)?;
            println!("Session finished without a rating; nothing was saved");
        }
    }
    Ok(())
}

async fn handle_stopwatch(state: &AppState, seconds: u64) -> Result<(), InfraError> {
    let mut events = subscribe_events(state)?;
    start_session_impl(state, StartRequest::Stopwatch)?;

    while seconds > 0 {
        let Some(event) = events.recv().await else {
            break;
        };
        render_event(&event);
        if matches!(event, SessionEvent::Tick { seconds: elapsed, .. } if elapsed >= seconds) {
            break;
        }
    }

    let elapsed = get_session_state_impl(state)?.elapsed_seconds;
    reset_session_impl(state)?;
    println!("Stopped at {}", format_clock(elapsed));
    Ok(())
}

async fn handle_pomodoro(
    state: &AppState,
    settings: PomodoroSettings,
    phases: u32,
) -> Result<(), InfraError> {
    let mut events = subscribe_events(state)?;
    start_session_impl(state, StartRequest::Pomodoro(settings))?;

    let mut completed = 0;
    while let Some(event) = events.recv().await {
        render_event(&event);
        if matches!(event, SessionEvent::Completed(_)) {
            completed += 1;
            if completed >= phases {
                break;
            }
        }
    }

    reset_session_impl(state)?;
    println!("Stopped after {completed} phase(s)");
    Ok(())
}

fn subscribe_events(state: &AppState) -> Result<mpsc::UnboundedReceiver<SessionEvent>, InfraError> {
    let (sender, receiver) = mpsc::unbounded_channel();
    state.subscribe(move |event: &SessionEvent| {
        let _ = sender.send(event.clone());
    })?;
    Ok(receiver)
}

fn render_event(event: &SessionEvent) {
    match event {
        SessionEvent::Tick { mode, seconds } => {
            print!("\r{mode} {}   ", format_clock(*seconds));
            let _ = std::io::stdout().flush();
        }
        SessionEvent::PhaseChanged { phase, round } => {
            println!("\nround {round}: {}", phase.as_str());
        }
        SessionEvent::Completed(mode) => println!("\n{mode} complete"),
        _ => {}
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), InfraError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Register { .. } => "register",
        Commands::Login { .. } => "login",
        Commands::Logout => "logout",
        Commands::Whoami => "whoami",
        Commands::History { .. } => "history",
        Commands::Timer { .. } => "timer",
        Commands::Stopwatch { .. } => "stopwatch",
        Commands::Pomodoro { .. } => "pomodoro",
        Commands::Plan { .. } => "plan",
        Commands::Todo { .. } => "todo",
    }
}
