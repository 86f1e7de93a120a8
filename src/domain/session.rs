//! Session state machine shared by the timer, stopwatch and Pomodoro modes.
//!
//! The machine never owns a clock. A tick source subscribes by reading
//! [`SessionMachine::epoch`] and passes that value back with every tick;
//! any transition that starts or stops ticking moves the epoch forward,
//! so ticks and deferred completions from an older subscription are
//! dropped instead of being applied twice.

use crate::domain::error::DomainError;
use crate::domain::models::{
    MAX_RATING, Mode, PomodoroPhase, PomodoroSettings, SessionRecord, Status,
};
use serde::Serialize;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Tick { mode: Mode, seconds: u64 },
    ModeChanged(Mode),
    PhaseChanged { phase: PomodoroPhase, round: u32 },
    StatusChanged(Status),
    Completed(Mode),
    SessionSaved(SessionRecord),
}

pub trait SessionObserver: Send {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F> SessionObserver for F
where
    F: FnMut(&SessionEvent) + Send,
{
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRequest {
    Timer { hours: u32, minutes: u32, seconds: u32 },
    Stopwatch,
    Pomodoro(PomodoroSettings),
}

impl StartRequest {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Timer { .. } => Mode::Timer,
            Self::Stopwatch => Mode::Stopwatch,
            Self::Pomodoro(_) => Mode::Pomodoro,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingPolicy {
    /// Refuse to save a session whose rating was left at 0.
    pub require_rating: bool,
    /// Ask for a rating when a timer completes; otherwise go straight back to idle.
    pub rating_prompt: bool,
}

impl Default for RatingPolicy {
    fn default() -> Self {
        Self {
            require_rating: true,
            rating_prompt: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Ignored,
    Advanced,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Pomodoro chained into its next phase and is running again.
    PhaseAdvanced { phase: PomodoroPhase, round: u32 },
    AwaitingRating,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PomodoroState {
    pub round: u32,
    pub max_rounds: u32,
    pub phase: PomodoroPhase,
    pub settings: PomodoroSettings,
}

impl PomodoroState {
    pub fn new(settings: PomodoroSettings) -> Self {
        let settings = settings.normalized();
        Self {
            round: 1,
            max_rounds: settings.rounds_per_cycle,
            phase: PomodoroPhase::Focus,
            settings,
        }
    }

    /// Focus alternates with a break; the break after the last round of a
    /// cycle is the long one, and finishing it starts a fresh cycle.
    pub fn advance(&mut self) {
        match self.phase {
            PomodoroPhase::Focus => {
                self.phase = if self.round >= self.max_rounds {
                    PomodoroPhase::LongBreak
                } else {
                    PomodoroPhase::ShortBreak
                };
            }
            PomodoroPhase::ShortBreak | PomodoroPhase::LongBreak => {
                if self.phase == PomodoroPhase::LongBreak {
                    self.round = 1;
                } else {
                    self.round += 1;
                }
                self.phase = PomodoroPhase::Focus;
            }
        }
    }

    pub fn phase_seconds(&self) -> u64 {
        self.settings.phase_seconds(self.phase)
    }

    fn restart_cycle(&mut self) {
        self.round = 1;
        self.phase = PomodoroPhase::Focus;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub mode: Mode,
    pub status: Status,
    pub duration_seconds: u64,
    pub remaining_seconds: u64,
    pub elapsed_seconds: u64,
    pub pomodoro: PomodoroState,
    pub epoch: u64,
}

/// Everything needed to build a history entry once the caller has minted
/// an id and a date for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    pub name: String,
    pub duration_seconds: u64,
    pub rating: u8,
}

pub struct SessionMachine {
    mode: Mode,
    status: Status,
    duration_seconds: u64,
    remaining_seconds: u64,
    elapsed_seconds: u64,
    pomodoro: PomodoroState,
    policy: RatingPolicy,
    epoch: u64,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl fmt::Debug for SessionMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionMachine")
            .field("mode", &self.mode)
            .field("status", &self.status)
            .field("duration_seconds", &self.duration_seconds)
            .field("remaining_seconds", &self.remaining_seconds)
            .field("elapsed_seconds", &self.elapsed_seconds)
            .field("pomodoro", &self.pomodoro)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new(RatingPolicy::default(), PomodoroSettings::default())
    }
}

impl SessionMachine {
    pub fn new(policy: RatingPolicy, pomodoro_settings: PomodoroSettings) -> Self {
        Self {
            mode: Mode::Timer,
            status: Status::Idle,
            duration_seconds: 0,
            remaining_seconds: 0,
            elapsed_seconds: 0,
            pomodoro: PomodoroState::new(pomodoro_settings),
            policy,
            epoch: 0,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl SessionObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn pomodoro(&self) -> &PomodoroState {
        &self.pomodoro
    }

    /// The counter the current mode shows: remaining for countdowns, elapsed otherwise.
    pub fn display_seconds(&self) -> u64 {
        if self.mode.counts_down() {
            self.remaining_seconds
        } else {
            self.elapsed_seconds
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            status: self.status,
            duration_seconds: self.duration_seconds,
            remaining_seconds: self.remaining_seconds,
            elapsed_seconds: self.elapsed_seconds,
            pomodoro: self.pomodoro,
            epoch: self.epoch,
        }
    }

    /// Returns `Ok(false)` when `mode` is already selected.
    pub fn set_mode(&mut self, mode: Mode) -> Result<bool, DomainError> {
        if mode == self.mode {
            return Ok(false);
        }
        if self.status.is_active() {
            return Err(DomainError::ModeLocked(self.mode));
        }

        debug!(from = %self.mode, to = %mode, "session mode changed");
        self.mode = mode;
        self.emit(SessionEvent::ModeChanged(mode));
        Ok(true)
    }

    /// Updates the Pomodoro settings shown on the setup screen.
    pub fn set_pomodoro_settings(&mut self, settings: PomodoroSettings) -> Result<(), DomainError> {
        if self.status.is_active() {
            return Err(DomainError::AlreadyActive);
        }
        self.pomodoro = PomodoroState::new(settings);
        Ok(())
    }

    pub fn start(&mut self, request: StartRequest) -> Result<(), DomainError> {
        if self.status.is_active() {
            return Err(DomainError::AlreadyActive);
        }

        let total_seconds = match request {
            StartRequest::Timer {
                hours,
                minutes,
                seconds,
            } => {
                let total = u64::from(hours) * 3600 + u64::from(minutes) * 60 + u64::from(seconds);
                if total == 0 {
                    return Err(DomainError::InvalidDuration);
                }
                Some(total)
            }
            StartRequest::Stopwatch | StartRequest::Pomodoro(_) => None,
        };

        self.set_mode(request.mode())?;
        match request {
            StartRequest::Timer { .. } => {
                let total = total_seconds.unwrap_or_default();
                self.duration_seconds = total;
                self.remaining_seconds = total;
            }
            StartRequest::Stopwatch => {
                self.elapsed_seconds = 0;
                self.duration_seconds = 0;
            }
            StartRequest::Pomodoro(settings) => {
                self.pomodoro = PomodoroState::new(settings);
                self.load_pomodoro_phase();
            }
        }

        debug!(mode = %self.mode, duration = self.duration_seconds, "session started");
        self.begin_running();
        Ok(())
    }

    /// Flips between running and paused, returning the new status.
    pub fn toggle_pause(&mut self) -> Result<Status, DomainError> {
        match self.status {
            Status::Running => {
                self.epoch += 1;
                self.set_status(Status::Paused);
            }
            Status::Paused => {
                self.epoch += 1;
                self.set_status(Status::Running);
            }
            _ => return Err(DomainError::NotActive),
        }
        debug!(status = self.status.as_str(), "session pause toggled");
        Ok(self.status)
    }

    pub fn reset(&mut self) {
        self.epoch += 1;
        self.duration_seconds = 0;
        self.remaining_seconds = 0;
        self.elapsed_seconds = 0;
        if self.mode == Mode::Pomodoro {
            self.pomodoro.restart_cycle();
            self.emit(SessionEvent::PhaseChanged {
                phase: self.pomodoro.phase,
                round: self.pomodoro.round,
            });
        }
        debug!(mode = %self.mode, "session reset");
        self.set_status(Status::Idle);
        self.emit(SessionEvent::Tick {
            mode: self.mode,
            seconds: 0,
        });
    }

    pub fn tick(&mut self, epoch: u64) -> TickOutcome {
        if epoch != self.epoch || self.status != Status::Running {
            return TickOutcome::Ignored;
        }

        if self.mode.counts_down() {
            self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
            self.emit(SessionEvent::Tick {
                mode: self.mode,
                seconds: self.remaining_seconds,
            });
            if self.remaining_seconds == 0 {
                self.epoch += 1;
                self.set_status(Status::Expired);
                return TickOutcome::Expired;
            }
        } else {
            self.elapsed_seconds += 1;
            self.emit(SessionEvent::Tick {
                mode: self.mode,
                seconds: self.elapsed_seconds,
            });
        }
        TickOutcome::Advanced
    }

    /// The deferred transition that follows an expiry. `None` when the
    /// expiry it was scheduled for has since been reset.
    pub fn complete(&mut self, epoch: u64) -> Option<Completion> {
        if epoch != self.epoch || self.status != Status::Expired {
            return None;
        }

        self.emit(SessionEvent::Completed(self.mode));
        match self.mode {
            Mode::Pomodoro => {
                self.pomodoro.advance();
                self.load_pomodoro_phase();
                debug!(
                    phase = self.pomodoro.phase.as_str(),
                    round = self.pomodoro.round,
                    "pomodoro phase advanced"
                );
                self.begin_running();
                Some(Completion::PhaseAdvanced {
                    phase: self.pomodoro.phase,
                    round: self.pomodoro.round,
                })
            }
            _ if self.policy.rating_prompt => {
                self.set_status(Status::AwaitingRating);
                Some(Completion::AwaitingRating)
            }
            _ => {
                self.reset();
                Some(Completion::Finished)
            }
        }
    }

    /// Checks a rating against the policy without changing any state.
    pub fn prepare_save(&self, name: &str, rating: u8) -> Result<SessionDraft, DomainError> {
        if self.status != Status::AwaitingRating {
            return Err(DomainError::NotAwaitingRating);
        }
        if rating > MAX_RATING || (rating == 0 && self.policy.require_rating) {
            return Err(DomainError::InvalidRating(rating));
        }
        Ok(SessionDraft {
            name: name.trim().to_string(),
            duration_seconds: self.duration_seconds,
            rating,
        })
    }

    /// Announces a persisted record and returns to the setup screen.
    pub fn commit_save(&mut self, record: &SessionRecord) -> Result<(), DomainError> {
        if self.status != Status::AwaitingRating {
            return Err(DomainError::NotAwaitingRating);
        }
        self.emit(SessionEvent::SessionSaved(record.clone()));
        self.reset();
        Ok(())
    }

    fn load_pomodoro_phase(&mut self) {
        self.duration_seconds = self.pomodoro.phase_seconds();
        self.remaining_seconds = self.duration_seconds;
        self.emit(SessionEvent::PhaseChanged {
            phase: self.pomodoro.phase,
            round: self.pomodoro.round,
        });
    }

    fn begin_running(&mut self) {
        self.epoch += 1;
        self.set_status(Status::Running);
        self.emit(SessionEvent::Tick {
            mode: self.mode,
            seconds: self.display_seconds(),
        });
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
        self.emit(SessionEvent::StatusChanged(status));
    }

    fn emit(&mut self, event: SessionEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    fn timer(hours: u32, minutes: u32, seconds: u32) -> StartRequest {
        StartRequest::Timer {
            hours,
            minutes,
            seconds,
        }
    }

    fn one_minute_pomodoro(rounds: u32) -> PomodoroSettings {
        PomodoroSettings {
            focus_minutes: 1,
            short_break_minutes: 1,
            long_break_minutes: 1,
            rounds_per_cycle: rounds,
        }
    }

    fn recorder(machine: &mut SessionMachine) -> Arc<Mutex<Vec<SessionEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        machine.subscribe(move |event: &SessionEvent| {
            sink.lock().expect("events lock").push(event.clone());
        });
        events
    }

    fn run_until_expired(machine: &mut SessionMachine) -> u64 {
        let mut ticks = 0;
        loop {
            let epoch = machine.epoch();
            ticks += 1;
            match machine.tick(epoch) {
                TickOutcome::Expired => return ticks,
                TickOutcome::Advanced => {}
                TickOutcome::Ignored => panic!("machine stopped ticking"),
            }
        }
    }

    fn sample_record(duration_seconds: u64, rating: u8) -> SessionRecord {
        SessionRecord {
            id: 1,
            date: "2/16/2026".to_string(),
            name: "Focus Session".to_string(),
            duration_seconds,
            rating,
        }
    }

    #[test]
    fn timer_start_loads_total_seconds() {
        let mut machine = SessionMachine::default();
        machine.start(timer(1, 2, 3)).expect("start timer");

        assert_eq!(machine.status(), Status::Running);
        assert_eq!(machine.remaining_seconds(), 3_723);
        assert_eq!(machine.duration_seconds(), 3_723);

        let epoch = machine.epoch();
        assert_eq!(machine.tick(epoch), TickOutcome::Advanced);
        assert_eq!(machine.remaining_seconds(), 3_722);
    }

    #[test]
    fn timer_start_with_zero_duration_is_refused() {
        let mut machine = SessionMachine::default();
        machine.set_mode(Mode::Stopwatch).expect("select stopwatch");
        let before = machine.snapshot();

        assert_eq!(machine.start(timer(0, 0, 0)), Err(DomainError::InvalidDuration));
        assert_eq!(machine.snapshot(), before);
        assert_eq!(machine.status(), Status::Idle);
    }

    #[test]
    fn start_while_running_is_refused_without_resubscribing() {
        let mut machine = SessionMachine::default();
        machine.start(timer(0, 0, 10)).expect("start timer");
        let epoch = machine.epoch();

        assert_eq!(machine.start(timer(0, 0, 5)), Err(DomainError::AlreadyActive));
        assert_eq!(machine.epoch(), epoch);
        assert_eq!(machine.remaining_seconds(), 10);
    }

    #[test]
    fn stale_epoch_ticks_are_ignored_after_pause() {
        let mut machine = SessionMachine::default();
        machine.start(StartRequest::Stopwatch).expect("start stopwatch");
        let first = machine.epoch();
        machine.tick(first);

        assert_eq!(machine.toggle_pause(), Ok(Status::Paused));
        assert_eq!(machine.tick(first), TickOutcome::Ignored);
        assert_eq!(machine.toggle_pause(), Ok(Status::Running));
        assert_eq!(machine.tick(first), TickOutcome::Ignored);

        let second = machine.epoch();
        assert_ne!(first, second);
        assert_eq!(machine.tick(second), TickOutcome::Advanced);
        assert_eq!(machine.elapsed_seconds(), 2);
    }

    #[test]
    fn toggle_pause_requires_an_active_run() {
        let mut machine = SessionMachine::default();
        assert_eq!(machine.toggle_pause(), Err(DomainError::NotActive));
    }

    #[test]
    fn reset_zeroes_counters_and_restarts_pomodoro_cycle() {
        let mut machine = SessionMachine::default();
        machine
            .start(StartRequest::Pomodoro(one_minute_pomodoro(4)))
            .expect("start pomodoro");
        run_until_expired(&mut machine);
        let epoch = machine.epoch();
        machine.complete(epoch).expect("phase advance");
        assert_eq!(machine.pomodoro().phase, PomodoroPhase::ShortBreak);

        machine.reset();
        assert_eq!(machine.status(), Status::Idle);
        assert_eq!(machine.remaining_seconds(), 0);
        assert_eq!(machine.duration_seconds(), 0);
        assert_eq!(machine.pomodoro().round, 1);
        assert_eq!(machine.pomodoro().phase, PomodoroPhase::Focus);
    }

    #[test]
    fn reset_cancels_pending_completion() {
        let mut machine = SessionMachine::default();
        machine.start(timer(0, 0, 2)).expect("start timer");
        run_until_expired(&mut machine);
        assert_eq!(machine.status(), Status::Expired);
        let expired_epoch = machine.epoch();

        machine.reset();
        assert_eq!(machine.complete(expired_epoch), None);
        assert_eq!(machine.status(), Status::Idle);
    }

    #[test]
    fn timer_completion_waits_for_rating_and_saves_configured_duration() {
        let mut machine = SessionMachine::default();
        let events = recorder(&mut machine);
        machine.start(timer(0, 0, 3)).expect("start timer");
        assert_eq!(run_until_expired(&mut machine), 3);
        let epoch = machine.epoch();
        assert_eq!(machine.complete(epoch), Some(Completion::AwaitingRating));

        assert_eq!(
            machine.prepare_save("Reading", 0),
            Err(DomainError::InvalidRating(0))
        );
        assert_eq!(
            machine.prepare_save("Reading", 6),
            Err(DomainError::InvalidRating(6))
        );
        assert_eq!(machine.status(), Status::AwaitingRating);

        let draft = machine.prepare_save("  Reading ", 3).expect("valid rating");
        assert_eq!(draft.name, "Reading");
        assert_eq!(draft.duration_seconds, 3);
        assert_eq!(machine.remaining_seconds(), 0);

        let record = sample_record(draft.duration_seconds, draft.rating);
        machine.commit_save(&record).expect("commit save");
        assert_eq!(machine.status(), Status::Idle);

        let events = events.lock().expect("events lock");
        assert!(events.contains(&SessionEvent::Completed(Mode::Timer)));
        assert!(events.contains(&SessionEvent::SessionSaved(record)));
    }

    #[test]
    fn optional_rating_policy_accepts_zero() {
        let policy = RatingPolicy {
            require_rating: false,
            rating_prompt: true,
        };
        let mut machine = SessionMachine::new(policy, PomodoroSettings::default());
        machine.start(timer(0, 0, 1)).expect("start timer");
        run_until_expired(&mut machine);
        let epoch = machine.epoch();
        machine.complete(epoch);

        let draft = machine.prepare_save("", 0).expect("zero rating allowed");
        assert_eq!(draft.rating, 0);
    }

    #[test]
    fn timer_without_rating_prompt_returns_to_idle() {
        let policy = RatingPolicy {
            require_rating: true,
            rating_prompt: false,
        };
        let mut machine = SessionMachine::new(policy, PomodoroSettings::default());
        machine.start(timer(0, 0, 1)).expect("start timer");
        run_until_expired(&mut machine);
        let epoch = machine.epoch();

        assert_eq!(machine.complete(epoch), Some(Completion::Finished));
        assert_eq!(machine.status(), Status::Idle);
    }

    #[test]
    fn save_outside_rating_state_is_refused() {
        let mut machine = SessionMachine::default();
        assert_eq!(
            machine.prepare_save("x", 3),
            Err(DomainError::NotAwaitingRating)
        );
        assert_eq!(
            machine.commit_save(&sample_record(1, 3)),
            Err(DomainError::NotAwaitingRating)
        );
    }

    #[test]
    fn mode_is_locked_while_a_session_is_active() {
        let mut machine = SessionMachine::default();
        let events = recorder(&mut machine);
        assert_eq!(machine.set_mode(Mode::Timer), Ok(false));
        assert_eq!(machine.set_mode(Mode::Planner), Ok(true));
        assert_eq!(machine.set_mode(Mode::Timer), Ok(true));

        machine.start(timer(0, 1, 0)).expect("start timer");
        assert_eq!(
            machine.set_mode(Mode::Stopwatch),
            Err(DomainError::ModeLocked(Mode::Timer))
        );
        machine.toggle_pause().expect("pause");
        assert_eq!(
            machine.set_mode(Mode::Todo),
            Err(DomainError::ModeLocked(Mode::Timer))
        );
        machine.reset();
        assert_eq!(machine.set_mode(Mode::Todo), Ok(true));

        let events = events.lock().expect("events lock");
        let mode_changes = events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::ModeChanged(mode) => Some(*mode),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(mode_changes, vec![Mode::Planner, Mode::Timer, Mode::Todo]);
    }

    #[test]
    fn start_switches_mode_from_setup_screen() {
        let mut machine = SessionMachine::default();
        machine.start(StartRequest::Stopwatch).expect("start stopwatch");
        assert_eq!(machine.mode(), Mode::Stopwatch);
        assert_eq!(machine.display_seconds(), 0);

        let epoch = machine.epoch();
        for _ in 0..5 {
            machine.tick(epoch);
        }
        assert_eq!(machine.display_seconds(), 5);
        assert_eq!(machine.remaining_seconds(), 0);
    }

    #[test]
    fn pomodoro_four_rounds_phase_sequence() {
        let mut machine = SessionMachine::default();
        let events = recorder(&mut machine);
        machine
            .start(StartRequest::Pomodoro(one_minute_pomodoro(4)))
            .expect("start pomodoro");

        let mut phases = vec![(machine.pomodoro().phase, machine.pomodoro().round)];
        for _ in 0..8 {
            assert_eq!(run_until_expired(&mut machine), 60);
            let epoch = machine.epoch();
            match machine.complete(epoch) {
                Some(Completion::PhaseAdvanced { phase, round }) => phases.push((phase, round)),
                other => panic!("unexpected completion: {other:?}"),
            }
            assert_eq!(machine.status(), Status::Running);
            assert_eq!(machine.remaining_seconds(), 60);
        }

        use PomodoroPhase::{Focus, LongBreak, ShortBreak};
        assert_eq!(
            phases,
            vec![
                (Focus, 1),
                (ShortBreak, 1),
                (Focus, 2),
                (ShortBreak, 2),
                (Focus, 3),
                (ShortBreak, 3),
                (Focus, 4),
                (LongBreak, 4),
                (Focus, 1),
            ]
        );

        let events = events.lock().expect("events lock");
        let completions = events
            .iter()
            .filter(|event| **event == SessionEvent::Completed(Mode::Pomodoro))
            .count();
        assert_eq!(completions, 8);
    }

    #[test]
    fn pomodoro_single_round_goes_straight_to_long_break() {
        let mut state = PomodoroState::new(one_minute_pomodoro(1));
        state.advance();
        assert_eq!(state.phase, PomodoroPhase::LongBreak);
        state.advance();
        assert_eq!((state.phase, state.round), (PomodoroPhase::Focus, 1));
    }

    #[test]
    fn pomodoro_settings_change_refused_while_running() {
        let mut machine = SessionMachine::default();
        machine.set_pomodoro_settings(one_minute_pomodoro(2)).expect("idle update");
        assert_eq!(machine.pomodoro().max_rounds, 2);

        machine.start(StartRequest::Stopwatch).expect("start");
        assert_eq!(
            machine.set_pomodoro_settings(one_minute_pomodoro(6)),
            Err(DomainError::AlreadyActive)
        );
    }

    proptest! {
        #[test]
        fn pause_resume_never_changes_active_tick_count(
            segments in proptest::collection::vec(0u64..20u64, 1..12),
            stray_ticks in 0u64..5u64
        ) {
            let mut machine = SessionMachine::default();
            machine.start(StartRequest::Stopwatch).expect("start stopwatch");

            let mut active = 0u64;
            for (index, segment) in segments.iter().enumerate() {
                let epoch = machine.epoch();
                for _ in 0..*segment {
                    machine.tick(epoch);
                }
                active += segment;

                machine.toggle_pause().expect("pause");
                for _ in 0..stray_ticks {
                    prop_assert_eq!(machine.tick(epoch), TickOutcome::Ignored);
                }
                if index + 1 < segments.len() {
                    machine.toggle_pause().expect("resume");
                }
            }

            prop_assert_eq!(machine.elapsed_seconds(), active);
        }

        #[test]
        fn pomodoro_round_stays_within_cycle(rounds in 1u32..8u32, steps in 0usize..64usize) {
            let mut state = PomodoroState::new(one_minute_pomodoro(rounds));
            for _ in 0..steps {
                let before = state;
                state.advance();
                prop_assert_ne!(
                    before.phase == PomodoroPhase::Focus,
                    state.phase == PomodoroPhase::Focus
                );
                if state.phase == PomodoroPhase::LongBreak {
                    prop_assert_eq!(state.round, rounds);
                }
                prop_assert!(state.round >= 1 && state.round <= rounds);
            }
        }
    }
}
