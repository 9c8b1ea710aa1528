//! Runtime for live assistant sessions
//!
//! Each session runs in its own tokio task that owns the `Session` and the
//! timers for its delayed messages. Callers talk to it through a cloneable
//! `SessionHandle`.

mod executor;

pub use executor::SessionRuntime;

use crate::message::{Message, MessageDraft};
use crate::session::{Input, SessionSnapshot};
use crate::state_machine::{
    Action, ActionError, AssistantState, Chip, ContactLink, SessionContext,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// How long a session may go without input before its runtime stops
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// How often the manager drops handles of stopped runtimes
pub const REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Errors surfaced to callers of the runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session runtime has stopped")]
    Stopped,
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Events sent to subscribers of a session
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    /// New state, or new chips for the same state
    StateChanged {
        state: AssistantState,
        chips: Vec<Chip>,
        #[serde(skip_serializing_if = "Option::is_none")]
        contact: Option<ContactLink>,
    },
    MessageAppended {
        message: Message,
    },
    LogCleared,
    /// The widget went from closed to open
    Opened,
    /// The widget went from open to closed
    Closed,
    Error {
        message: String,
    },
}

impl AssistantEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            AssistantEvent::StateChanged { .. } => "state_changed",
            AssistantEvent::MessageAppended { .. } => "message_appended",
            AssistantEvent::LogCleared => "log_cleared",
            AssistantEvent::Opened => "opened",
            AssistantEvent::Closed => "closed",
            AssistantEvent::Error { .. } => "error",
        }
    }
}

/// Commands processed by a session runtime, one at a time
#[derive(Debug)]
pub(crate) enum Command {
    Dispatch {
        input: Input,
        reply: oneshot::Sender<Outcome>,
    },
    /// A delayed message whose timer has fired
    Deliver {
        generation: u64,
        draft: MessageDraft,
        delay: Duration,
    },
    /// The exit delay after a close has elapsed
    ClearLog { generation: u64 },
    Shutdown,
}

/// Result of dispatching one input
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// False when the input was not valid in the current state
    pub accepted: bool,
    /// Snapshot right after the immediate effects were applied
    pub snapshot: SessionSnapshot,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    event_tx: broadcast::Sender<AssistantEvent>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn open(&self) -> Result<Outcome, RuntimeError> {
        self.dispatch_action(Action::Open).await
    }

    pub async fn close(&self) -> Result<Outcome, RuntimeError> {
        self.dispatch_action(Action::Close).await
    }

    pub async fn reset(&self) -> Result<Outcome, RuntimeError> {
        self.dispatch_action(Action::Reset).await
    }

    pub async fn dispatch_action(&self, action: Action) -> Result<Outcome, RuntimeError> {
        self.dispatch(Input::Action(action)).await
    }

    /// Parse a wire action and dispatch it. Malformed actions fail here and
    /// never reach the session.
    pub async fn dispatch_raw(
        &self,
        kind: &str,
        payload: Option<&Value>,
    ) -> Result<Outcome, RuntimeError> {
        let action = Action::parse(kind, payload)?;
        self.dispatch_action(action).await
    }

    pub async fn dispatch_text(&self, text: impl Into<String>) -> Result<Outcome, RuntimeError> {
        self.dispatch(Input::Text(text.into())).await
    }

    async fn dispatch(&self, input: Input) -> Result<Outcome, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(Command::Dispatch { input, reply })
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        rx.await.map_err(|_| RuntimeError::Stopped)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AssistantEvent> {
        self.event_tx.subscribe()
    }

    /// Ask the runtime to stop. Pending timers are cancelled.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(Command::Shutdown).await;
    }

    /// The runtime has exited and will take no more commands
    pub fn is_stopped(&self) -> bool {
        self.command_tx.is_closed()
    }
}

/// Manager for all session runtimes
pub struct SessionManager {
    context: SessionContext,
    idle_ttl: Duration,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            idle_ttl: DEFAULT_IDLE_TTL,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Start a new session runtime in the `Idle` state
    pub async fn create(&self) -> SessionHandle {
        let id = uuid::Uuid::new_v4().to_string();
        let (handle, runtime) =
            SessionRuntime::new(id.clone(), self.context.clone(), self.idle_ttl);

        tokio::spawn(runtime.run());
        let mut sessions = self.sessions.write().await;
        sessions.insert(id.clone(), handle.clone());

        tracing::info!(session_id = %id, active = sessions.len(), "Created session");
        handle
    }

    pub async fn get(&self, id: &str) -> Result<SessionHandle, RuntimeError> {
        self.sessions
            .read()
            .await
            .get(id)
            .filter(|handle| !handle.is_stopped())
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))
    }

    /// Stop a session runtime and forget it
    pub async fn remove(&self, id: &str) -> Result<(), RuntimeError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))?;
        handle.shutdown().await;
        tracing::info!(session_id = %id, "Removed session");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Forget sessions whose runtime has stopped. Returns how many went.
    pub async fn reap(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| !handle.is_stopped());
        let reaped = before - sessions.len();
        if reaped > 0 {
            tracing::info!(reaped, active = sessions.len(), "Reaped idle sessions");
        }
        reaped
    }

    /// Periodically reap stopped sessions for as long as the manager lives
    pub fn spawn_reaper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.reap().await;
            }
        })
    }
}
