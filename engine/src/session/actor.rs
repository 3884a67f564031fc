use std::collections::VecDeque;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::Instrument;

use super::{LineSink, SessionState};
use crate::EngineHandle;

pub(super) enum SessionCommand {
    Submit {
        command: String,
        on_line: Option<LineSink>,
        /// Fired once the command has been written to the engine.
        dispatched: Option<oneshot::Sender<()>>,
    },
    Shutdown,
}

struct Pending {
    command: String,
    on_line: Option<LineSink>,
    dispatched: Option<oneshot::Sender<()>>,
}

/// Mutable state owned by the actor task.
struct ActorState {
    engine: EngineHandle,
    queue: VecDeque<Pending>,
    /// Sink of the command currently in flight, if it expects output.
    active: Option<LineSink>,
    state_tx: watch::Sender<SessionState>,
}

impl ActorState {
    fn set_state(&self, state: SessionState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                tracing::debug!(from = ?current, to = ?state, "Session state changed");
                *current = state;
                true
            }
        });
    }

    /// Send queued commands until one needs to wait for `bestmove`.
    /// Returns `false` if the engine stopped accepting input.
    async fn dispatch(&mut self) -> bool {
        while self.active.is_none() {
            let Some(next) = self.queue.pop_front() else {
                self.set_state(SessionState::Ready);
                return true;
            };

            tracing::trace!("UCI >> {}", next.command);
            if self.engine.tx.send(next.command).await.is_err() {
                tracing::warn!("Engine input closed while dispatching");
                return false;
            }
            if let Some(dispatched) = next.dispatched {
                let _ = dispatched.send(());
            }

            if let Some(sink) = next.on_line {
                self.active = Some(sink);
                self.set_state(SessionState::Busy);
            }
        }
        true
    }

    /// Forward a line to the active sink. Returns `true` when the line
    /// finished the active command.
    fn route_line(&mut self, line: String) -> bool {
        let finished = line.starts_with("bestmove");
        match &self.active {
            Some(sink) => {
                // A dropped receiver means the caller gave up; keep draining.
                let _ = sink.send(line);
            }
            None => tracing::trace!("Discarding unsolicited engine line: {}", line),
        }
        if finished && self.active.take().is_some() {
            return true;
        }
        false
    }

    /// State flips before the sinks close, so a caller that sees its sink
    /// close also sees `Terminated`.
    fn terminate(&mut self) {
        self.set_state(SessionState::Terminated);
        self.active = None;
        let dropped = self.queue.len();
        self.queue.clear();
        if dropped > 0 {
            tracing::warn!(dropped, "Dropping queued engine commands");
        }
    }
}

pub(super) async fn run_session_actor(
    label: String,
    engine: EngineHandle,
    cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    state_tx: watch::Sender<SessionState>,
) {
    let state = ActorState {
        engine,
        queue: VecDeque::new(),
        active: None,
        state_tx,
    };
    run_session_actor_inner(state, cmd_rx)
        .instrument(tracing::info_span!("engine_session", label = %label))
        .await;
}

async fn run_session_actor_inner(
    mut state: ActorState,
    mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
) {
    tracing::debug!("Session actor started");
    state.set_state(SessionState::Ready);

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => match cmd {
                Some(SessionCommand::Submit { command, on_line, dispatched }) => {
                    state.queue.push_back(Pending { command, on_line, dispatched });
                    if !state.dispatch().await {
                        break;
                    }
                }
                Some(SessionCommand::Shutdown) | None => {
                    tracing::info!("Session shutting down");
                    tracing::trace!("UCI >> quit");
                    let _ = state.engine.tx.send("quit".to_string()).await;
                    break;
                }
            },

            line = state.engine.rx.recv() => match line {
                Some(line) => {
                    if state.route_line(line) && !state.dispatch().await {
                        break;
                    }
                }
                None => {
                    tracing::warn!("Engine output closed");
                    break;
                }
            },
        }
    }

    state.terminate();
    tracing::debug!("Session actor exited");
}
