//! Single-writer store worker.
//!
//! [`Store::spawn`] moves the [`AppState`] into a tokio task. Callers talk to
//! it through a cloneable [`StoreHandle`]; every message carries a oneshot
//! reply. While the timer is running the worker also owns a ticker that
//! feeds itself `Command::Tick` once per period. Snapshots go to a separate
//! writer task through a `watch` channel, so a slow disk never blocks
//! command handling and only the newest state is ever written.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::command::Command;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::processor::apply_with;
use crate::state::AppState;
use crate::storage::SnapshotStore;
use crate::timer::TimerState;

const EVENT_BUFFER: usize = 64;

enum StoreMsg {
    Dispatch {
        command: Command,
        resp: oneshot::Sender<Vec<Event>>,
    },
    Snapshot {
        resp: oneshot::Sender<AppState>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Cloneable client of a running store worker.
#[derive(Clone)]
pub struct StoreHandle {
    sender: mpsc::UnboundedSender<StoreMsg>,
    events: broadcast::Sender<Event>,
}

pub struct Store;

impl Store {
    /// Start the worker with `state` as the current aggregate.
    ///
    /// A timer that was running when `state` was saved resumes ticking; one
    /// that had already reached zero is resolved immediately. Must be called
    /// from within a tokio runtime.
    pub fn spawn(
        state: AppState,
        persistence: SnapshotStore,
        tick_period: Duration,
        clock: Arc<dyn Clock>,
    ) -> StoreHandle {
        let (sender, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (persist_tx, persist_rx) = watch::channel(state.clone());
        let persister = tokio::spawn(persist_loop(persistence, persist_rx));

        let worker = Worker {
            state,
            clock,
            tick_period,
            persist_tx,
            events: events.clone(),
        };
        tokio::spawn(worker.run(rx, persister));

        StoreHandle { sender, events }
    }
}

impl StoreHandle {
    /// Apply `command` and return the events it produced.
    pub async fn dispatch(&self, command: Command) -> Result<Vec<Event>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(StoreMsg::Dispatch { command, resp: tx })
            .map_err(|_| CoreError::StoreClosed)?;
        rx.await.map_err(|_| CoreError::StoreClosed)
    }

    pub async fn snapshot(&self) -> Result<AppState> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(StoreMsg::Snapshot { resp: tx })
            .map_err(|_| CoreError::StoreClosed)?;
        rx.await.map_err(|_| CoreError::StoreClosed)
    }

    /// Every event the worker produces from now on, including ones caused
    /// by its own ticker.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Stop the worker. Returns once the last snapshot has been written.
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(StoreMsg::Shutdown { resp: tx })
            .map_err(|_| CoreError::StoreClosed)?;
        rx.await.map_err(|_| CoreError::StoreClosed)
    }
}

struct Worker {
    state: AppState,
    clock: Arc<dyn Clock>,
    tick_period: Duration,
    persist_tx: watch::Sender<AppState>,
    events: broadcast::Sender<Event>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<StoreMsg>, persister: JoinHandle<()>) {
        if self.state.timer.state() == TimerState::Expired {
            info!("resolving timer that expired while stopped");
            self.apply(Command::CompleteTimer);
        }
        let mut ticker = self.state.timer.is_running().then(|| self.new_ticker());
        let mut shutdown_resp = None;

        loop {
            tokio::select! {
                _ = next_tick(&mut ticker) => {
                    self.apply(Command::Tick);
                }
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        break;
                    };
                    match msg {
                        StoreMsg::Dispatch { command, resp } => {
                            let touches_timer = command.touches_timer();
                            let restarts = matches!(command, Command::StartTimer { .. });
                            let events = self.apply(command);
                            let resumed = touches_timer && ticker.is_none();
                            if (restarts || resumed) && self.state.timer.is_running() {
                                ticker = Some(self.new_ticker());
                            }
                            resp.send(events).ok();
                        }
                        StoreMsg::Snapshot { resp } => {
                            resp.send(self.state.clone()).ok();
                        }
                        StoreMsg::Shutdown { resp } => {
                            shutdown_resp = Some(resp);
                            break;
                        }
                    }
                }
            }
            if !self.state.timer.is_running() {
                ticker = None;
            }
        }

        debug!("store worker stopping");
        drop(self.persist_tx);
        if let Err(e) = persister.await {
            warn!(error = %e, "snapshot writer task failed");
        }
        if let Some(resp) = shutdown_resp {
            resp.send(()).ok();
        }
    }

    fn apply(&mut self, command: Command) -> Vec<Event> {
        let applied = apply_with(self.state.clone(), command, self.clock.as_ref());
        let changed = applied.state != self.state;
        self.state = applied.state;
        if changed {
            self.persist_tx.send_replace(self.state.clone());
        }
        for event in &applied.events {
            debug!(event = event.kind(), "event");
            // No subscribers is fine.
            let _ = self.events.send(event.clone());
        }
        applied.events
    }

    /// First tick lands one full period after the start.
    fn new_ticker(&self) -> Interval {
        interval_at(Instant::now() + self.tick_period, self.tick_period)
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn persist_loop(persistence: SnapshotStore, mut rx: watch::Receiver<AppState>) {
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        let store = persistence.clone();
        match tokio::task::spawn_blocking(move || store.save(&snapshot)).await {
            Ok(Ok(())) => debug!(key = persistence.key(), "snapshot saved"),
            Ok(Err(e)) => warn!(key = persistence.key(), error = %e, "failed to save snapshot"),
            Err(e) => warn!(error = %e, "snapshot save task panicked"),
        }
    }
}
