//! Session runtime executor

use super::{AssistantEvent, Command, Outcome, SessionHandle};
use crate::message::MessageDraft;
use crate::session::{Applied, Input, PendingWork, Session, SessionSnapshot};
use crate::state_machine::{SessionContext, TransitionError};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Owns one session and processes its commands in arrival order
pub struct SessionRuntime {
    session: Session,
    command_rx: mpsc::Receiver<Command>,
    /// Cloned into timer tasks so they can feed delayed work back in
    command_tx: mpsc::Sender<Command>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    event_tx: broadcast::Sender<AssistantEvent>,
    /// Cancels every timer of the current generation
    timers: CancellationToken,
    /// Stop after this long without input while nobody is subscribed
    idle_ttl: Duration,
}

impl SessionRuntime {
    pub fn new(id: String, context: SessionContext, idle_ttl: Duration) -> (SessionHandle, Self) {
        let session = Session::new(id.clone(), context);
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, _) = broadcast::channel(128);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

        let handle = SessionHandle {
            id,
            command_tx: command_tx.clone(),
            snapshot_rx,
            event_tx: event_tx.clone(),
        };
        let runtime = Self {
            session,
            command_rx,
            command_tx,
            snapshot_tx,
            event_tx,
            timers: CancellationToken::new(),
            idle_ttl,
        };
        (handle, runtime)
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session.id(), "Starting session runtime");

        // The runtime holds a sender itself, so the loop ends on Shutdown or
        // once the session has sat idle for the whole TTL
        let mut idle_deadline = Instant::now() + self.idle_ttl;
        loop {
            let command = tokio::select! {
                command = self.command_rx.recv() => command,
                () = tokio::time::sleep_until(idle_deadline) => {
                    if self.event_tx.receiver_count() > 0 {
                        idle_deadline = Instant::now() + self.idle_ttl;
                        continue;
                    }
                    tracing::info!(session_id = %self.session.id(), "Session idle, stopping");
                    break;
                }
            };

            match command {
                Some(Command::Dispatch { input, reply }) => {
                    idle_deadline = Instant::now() + self.idle_ttl;
                    let outcome = self.dispatch(input);
                    let _ = reply.send(outcome);
                }
                Some(Command::Deliver {
                    generation,
                    draft,
                    delay,
                }) => self.deliver(generation, draft, delay),
                Some(Command::ClearLog { generation }) => self.clear_log(generation),
                Some(Command::Shutdown) | None => break,
            }
        }

        self.timers.cancel();
        tracing::info!(session_id = %self.session.id(), "Session runtime stopped");
    }

    fn dispatch(&mut self, input: Input) -> Outcome {
        let label = match &input {
            Input::Action(action) => action.kind(),
            Input::Text(_) => "TEXT",
        };

        match self.session.handle(input) {
            Ok(applied) => {
                tracing::info!(
                    session_id = %self.session.id(),
                    action = label,
                    from = applied.previous_state.name(),
                    state = self.session.state().name(),
                    generation = self.session.generation(),
                    "Applied action"
                );
                self.execute(applied);
                Outcome {
                    accepted: true,
                    snapshot: self.publish(),
                }
            }
            Err(TransitionError::Closed) => {
                tracing::debug!(session_id = %self.session.id(), action = label, "Ignored input while closed");
                let _ = self.event_tx.send(AssistantEvent::Error {
                    message: TransitionError::Closed.to_string(),
                });
                Outcome {
                    accepted: false,
                    snapshot: self.session.snapshot(),
                }
            }
            Err(e) => {
                tracing::debug!(
                    session_id = %self.session.id(),
                    action = label,
                    state = self.session.state().name(),
                    error = %e,
                    "Ignored out-of-state action"
                );
                Outcome {
                    accepted: false,
                    snapshot: self.session.snapshot(),
                }
            }
        }
    }

    /// Broadcast what an input changed and start timers for the rest
    fn execute(&mut self, applied: Applied) {
        if applied.generation_bumped {
            self.timers.cancel();
            self.timers = CancellationToken::new();
        }

        if applied.log_cleared {
            let _ = self.event_tx.send(AssistantEvent::LogCleared);
        }
        for message in applied.appended {
            let _ = self
                .event_tx
                .send(AssistantEvent::MessageAppended { message });
        }

        if applied.state_changed {
            let state = *self.session.state();
            self.send_state();
            match (applied.previous_state.is_open(), state.is_open()) {
                (false, true) => {
                    let _ = self.event_tx.send(AssistantEvent::Opened);
                }
                (true, false) => {
                    let _ = self.event_tx.send(AssistantEvent::Closed);
                }
                _ => {}
            }
        }

        self.schedule(applied.pending);
    }

    /// One timer task per batch: it sleeps through the messages in order,
    /// so a later message can never overtake an earlier one.
    fn schedule(&self, pending: PendingWork) {
        if pending.is_empty() {
            return;
        }

        let PendingWork {
            generation,
            messages,
            clear_after,
        } = pending;
        let token = self.timers.clone();
        let command_tx = self.command_tx.clone();
        let start = Instant::now();

        tokio::spawn(async move {
            for (delay, draft) in messages {
                tokio::select! {
                    biased;
                    () = token.cancelled() => return,
                    () = tokio::time::sleep_until(start + delay) => {}
                }
                let command = Command::Deliver {
                    generation,
                    draft,
                    delay,
                };
                if command_tx.send(command).await.is_err() {
                    return;
                }
            }

            if let Some(clear_after) = clear_after {
                tokio::select! {
                    biased;
                    () = token.cancelled() => return,
                    () = tokio::time::sleep_until(start + clear_after) => {}
                }
                let _ = command_tx.send(Command::ClearLog { generation }).await;
            }
        });
    }

    fn deliver(&mut self, generation: u64, draft: MessageDraft, delay: Duration) {
        let chips = self.session.chips();
        if let Some(message) = self.session.deliver(generation, draft, delay) {
            let _ = self
                .event_tx
                .send(AssistantEvent::MessageAppended { message });
            if self.session.chips() != chips {
                self.send_state();
            }
            self.publish();
        }
    }

    fn send_state(&self) {
        let state = *self.session.state();
        let _ = self.event_tx.send(AssistantEvent::StateChanged {
            state,
            chips: self.session.chips(),
            contact: state.contact(),
        });
    }

    fn clear_log(&mut self, generation: u64) {
        if self.session.clear_log(generation) {
            tracing::debug!(session_id = %self.session.id(), "Cleared log after close");
            let _ = self.event_tx.send(AssistantEvent::LogCleared);
            self.publish();
        }
    }

    fn publish(&self) -> SessionSnapshot {
        let snapshot = self.session.snapshot();
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }
}
