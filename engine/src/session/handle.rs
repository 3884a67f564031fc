use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use super::actor::{run_session_actor, SessionCommand};
use super::handshake::{perform_handshake, EngineIdentity};
use super::{LineSink, SessionError, SessionOptions, SessionState};
use crate::EngineHandle;

/// A queued request whose dispatch can be awaited separately from its output.
/// `dispatched` resolves with an error if the session ends first.
#[derive(Debug)]
pub struct TrackedRequest {
    pub lines: mpsc::UnboundedReceiver<String>,
    pub dispatched: oneshot::Receiver<()>,
}

/// Cheap, cloneable handle to an engine session actor.
#[derive(Clone)]
pub struct EngineSession {
    label: Arc<str>,
    identity: Arc<EngineIdentity>,
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    state_rx: watch::Receiver<SessionState>,
}

impl EngineSession {
    /// Run the UCI handshake on `engine` and spawn the session actor.
    #[tracing::instrument(level = "info", skip(engine, options))]
    pub async fn start(
        label: &str,
        mut engine: EngineHandle,
        options: &SessionOptions,
    ) -> Result<Self, SessionError> {
        let (state_tx, state_rx) = watch::channel(SessionState::Initializing);

        let identity = match perform_handshake(&mut engine, options).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::error!("Engine handshake failed: {}", e);
                let _ = state_tx.send(SessionState::Terminated);
                return Err(e);
            }
        };

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_session_actor(
            label.to_string(),
            engine,
            cmd_rx,
            state_tx,
        ));

        Ok(Self {
            label: Arc::from(label),
            identity: Arc::new(identity),
            cmd_tx,
            state_rx,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn identity(&self) -> &EngineIdentity {
        &self.identity
    }

    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.state() == SessionState::Terminated
    }

    /// Queue a command. With a sink, every engine line up to and including
    /// the next `bestmove` is forwarded to it.
    pub fn submit(
        &self,
        command: impl Into<String>,
        on_line: Option<LineSink>,
    ) -> Result<(), SessionError> {
        self.enqueue(command.into(), on_line, None)
    }

    fn enqueue(
        &self,
        command: String,
        on_line: Option<LineSink>,
        dispatched: Option<oneshot::Sender<()>>,
    ) -> Result<(), SessionError> {
        if self.is_terminated() {
            return Err(SessionError::Terminated);
        }
        self.cmd_tx
            .send(SessionCommand::Submit {
                command,
                on_line,
                dispatched,
            })
            .map_err(|_| SessionError::Terminated)
    }

    /// Queue a command and return the receiving end of its line sink.
    pub fn request(
        &self,
        command: impl Into<String>,
    ) -> Result<mpsc::UnboundedReceiver<String>, SessionError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.submit(command, Some(tx))?;
        Ok(rx)
    }

    /// Like [`request`](Self::request), but also reports when the command
    /// leaves the queue and is written to the engine.
    pub fn request_tracked(
        &self,
        command: impl Into<String>,
    ) -> Result<TrackedRequest, SessionError> {
        let (tx, lines) = mpsc::unbounded_channel();
        let (dispatched_tx, dispatched) = oneshot::channel();
        self.enqueue(command.into(), Some(tx), Some(dispatched_tx))?;
        Ok(TrackedRequest { lines, dispatched })
    }

    /// Send `quit` and stop the actor. Queued commands are dropped.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown);
    }

    /// Wait until the actor has stopped.
    pub async fn terminated(&self) {
        let mut rx = self.state_rx.clone();
        let _ = rx.wait_for(|s| *s == SessionState::Terminated).await;
    }
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("label", &self.label)
            .field("state", &self.state())
            .finish()
    }
}
