//! Focus timer commands for CLI.
//!
//! `start` and `attach` run the countdown in the foreground on the async
//! store worker and print events as JSON lines until the run ends. The
//! timer only advances while a foreground process is attached.
//!
//! The attached process holds the snapshot lease: other `focusquest`
//! invocations queue their commands, and the follower applies them between
//! ticks. A queued `timer stop` ends the follow; Ctrl-C detaches and leaves
//! the countdown to a later `timer attach`.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;
use focusquest_core::timer::cadence;
use focusquest_core::{
    apply_with, AppState, Command, Event, Lease, SessionType, StorageError, Store, StoreHandle,
    SystemClock, TimerState,
};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::{
    new_id, not_found, print_events, print_json, require_minutes, streak_update, CliResult,
    Session,
};

const STATUS_EVERY: Duration = Duration::from_secs(60);
/// How often the follower renews its lease and reads queued commands.
const INBOX_POLL: Duration = Duration::from_millis(250);

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a countdown and follow it until it ends
    Start {
        /// focus, short-break or long-break
        #[arg(long = "type", default_value = "focus")]
        session_type: SessionType,
        /// Length in minutes (default: from settings)
        #[arg(long)]
        minutes: Option<u32>,
        /// Task the session counts toward
        #[arg(long)]
        task_id: Option<String>,
    },
    /// Follow a running countdown again
    Attach,
    /// Pause the countdown; nothing is logged
    Stop,
    /// Log a countdown that already reached zero
    Complete,
    /// Print current timer state as JSON
    Status,
    /// Suggest the next session
    Next,
}

pub fn run(action: TimerAction) -> CliResult {
    let mut session = Session::open()?;

    match action {
        TimerAction::Start {
            session_type,
            minutes,
            task_id,
        } => {
            let minutes = match minutes {
                Some(m) => require_minutes("minutes", m)?,
                None => session.state().settings.duration_for(session_type),
            };
            if let Some(id) = &task_id {
                session.state().task(id).ok_or_else(|| not_found("task", id))?;
            }
            follow(
                session,
                Some(Command::StartTimer {
                    session_type,
                    duration_minutes: minutes,
                    task_id,
                }),
            )?;
        }
        TimerAction::Attach => match session.state().timer.state() {
            TimerState::Idle => return Err("no countdown is running".into()),
            TimerState::Expired => {
                let events = session.apply(Command::CompleteTimer);
                session.save()?;
                print_events(&events)?;
            }
            TimerState::Running => follow(session, None)?,
        },
        TimerAction::Stop => {
            let events = session.apply(Command::StopTimer);
            session.save()?;
            print_events(&events)?;
            print_status(session.state())?;
        }
        TimerAction::Complete => {
            let events = session.apply(Command::CompleteTimer);
            session.save()?;
            if events.is_empty() {
                eprintln!("nothing to complete");
            }
            print_events(&events)?;
        }
        TimerAction::Status => print_status(session.state())?,
        TimerAction::Next => {
            let (session_type, minutes) = suggest_next(session.state());
            print_json(&json!({
                "session_type": session_type,
                "label": session_type.label(),
                "minutes": minutes,
            }))?;
        }
    }
    Ok(())
}

fn print_status(state: &AppState) -> CliResult {
    let timer = &state.timer;
    print_json(&json!({
        "state": match timer.state() {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Expired => "expired",
        },
        "session_type": timer.session_type(),
        "task_id": timer.task_id(),
        "time_left": timer.time_left(),
        "remaining": timer.format_time_left(),
    }))
}

/// After a focus run, a break chosen by the daily cadence; after anything
/// else, focus.
fn suggest_next(state: &AppState) -> (SessionType, u32) {
    let next = match state.timer_sessions.last() {
        Some(last) if last.session_type == SessionType::Focus => {
            cadence::next_break(&state.timer_sessions, Utc::now().date_naive())
        }
        _ => SessionType::Focus,
    };
    (next, state.settings.duration_for(next))
}

fn follow(session: Session, start: Option<Command>) -> CliResult {
    let tick = session.config.tick_interval();
    let suggest = session.config.runtime.suggest_next_session;
    let shared = session.shared().clone();
    drop(session);

    let owner = format!("{}-{}", std::process::id(), new_id());
    let lease = shared.acquire(&owner, Utc::now())?.ok_or(
        "another focusquest process is already following the timer; \
         stop it there or wait for it to finish",
    )?;
    let lease = Arc::new(lease);
    debug!(owner = lease.owner(), "took the timer lease");

    // Loaded after the lease, so every earlier save is in it.
    let state = shared.load().state;

    let runtime = tokio::runtime::Runtime::new()?;
    let (result, last) = runtime.block_on(async {
        let store = Store::spawn(state, shared.snapshots(), tick, Arc::new(SystemClock));
        let result = follow_store(&store, &lease, start, suggest).await;
        let last = store.snapshot().await;
        shutdown(&store).await;
        (result, last)
    });

    let last = match last {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "store closed early, releasing the last saved state");
            shared.load().state
        }
    };
    release(&lease, last)?;
    result
}

async fn shutdown(store: &StoreHandle) {
    if let Err(e) = store.shutdown().await {
        warn!(error = %e, "store did not shut down cleanly");
    }
}

/// Hand the snapshot back to plain saves, first applying anything queued
/// after the follower stopped reading its inbox.
fn release(lease: &Lease, mut state: AppState) -> CliResult {
    loop {
        let pending = lease.release(&state)?;
        if pending.is_empty() {
            return Ok(());
        }
        for command in pending {
            let applied = apply_with(state, command, &SystemClock);
            print_events(&applied.events)?;
            state = applied.state;
        }
    }
}

/// Renew the lease and feed queued commands to the store. Returns `false`
/// once another follower has taken over.
async fn drain_inbox(store: &StoreHandle, lease: &Arc<Lease>) -> Result<bool, Box<dyn Error>> {
    let lease = Arc::clone(lease);
    let polled = tokio::task::spawn_blocking(move || -> Result<_, StorageError> {
        if !lease.renew(Utc::now())? {
            return Ok(None);
        }
        lease.take_inbox().map(Some)
    })
    .await?;

    match polled {
        Ok(Some(commands)) => {
            for command in commands {
                debug!(command = command.name(), "applying queued command");
                // Events reach the subscriber like any other.
                store.dispatch(command).await?;
            }
            Ok(true)
        }
        Ok(None) => {
            warn!("another process took over the timer");
            Ok(false)
        }
        Err(e) => {
            warn!(error = %e, "could not read queued commands");
            Ok(true)
        }
    }
}

async fn follow_store(
    store: &StoreHandle,
    lease: &Arc<Lease>,
    start: Option<Command>,
    suggest: bool,
) -> CliResult {
    let mut events = store.subscribe();
    if let Some(command) = start {
        // Its events arrive through the subscription as well.
        store.dispatch(command).await?;
    }
    let state = store.snapshot().await?;
    if !state.timer.is_running() {
        return Ok(());
    }
    eprintln!(
        "{} running, {} left",
        state.timer.session_type().label(),
        state.timer.format_time_left()
    );

    let first = tokio::time::Instant::now() + STATUS_EVERY;
    let mut status = tokio::time::interval_at(first, STATUS_EVERY);
    let mut inbox = tokio::time::interval(INBOX_POLL);
    inbox.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = status.tick() => {
                let state = store.snapshot().await?;
                eprintln!("{} left", state.timer.format_time_left());
            }
            _ = inbox.tick() => {
                if !drain_inbox(store, lease).await? {
                    return Ok(());
                }
            }
            signal = &mut ctrl_c => {
                signal?;
                eprintln!("Detached. The countdown waits for `focusquest timer attach`");
                return Ok(());
            }
            received = events.recv() => match received {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    match event {
                        Event::SessionCompleted { .. } => {
                            finish(store, &mut events, event, suggest).await?;
                            return Ok(());
                        }
                        Event::TimerStopped { .. } => return Ok(()),
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }
}

/// Print the rest of the completing batch, count the day toward the
/// streak, and point at the next session.
async fn finish(
    store: &StoreHandle,
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    completed: Event,
    suggest: bool,
) -> CliResult {
    // Replies are ordered after the batch, so the whole batch is buffered now.
    let state = store.snapshot().await?;
    while let Ok(event) = events.try_recv() {
        println!("{}", serde_json::to_string(&event)?);
    }

    if let Some(update) = streak_update(&state, std::slice::from_ref(&completed)) {
        debug!("counting today toward the streak");
        print_events(&store.dispatch(update).await?)?;
    }

    if suggest {
        let state = store.snapshot().await?;
        let (next, minutes) = suggest_next(&state);
        eprintln!(
            "Next up: {} ({minutes} min). Run `focusquest timer start --type {next}`",
            next.label()
        );
    }
    Ok(())
}
