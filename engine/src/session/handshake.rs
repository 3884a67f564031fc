use tokio::time;

use super::{SessionError, SessionOptions};
use crate::uci::{parse_uci_message, UciMessage};
use crate::EngineHandle;

/// What the engine told us about itself during `uci`.
#[derive(Debug, Clone, Default)]
pub struct EngineIdentity {
    pub name: Option<String>,
    pub author: Option<String>,
    pub options: Vec<String>,
}

impl EngineIdentity {
    pub fn supports_option(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.eq_ignore_ascii_case(name))
    }
}

/// `uci` → `uciok`, option setup, `isready` → `readyok`.
pub(super) async fn perform_handshake(
    engine: &mut EngineHandle,
    options: &SessionOptions,
) -> Result<EngineIdentity, SessionError> {
    send(engine, "uci").await?;

    let identity = time::timeout(options.handshake_timeout, read_identity(engine))
        .await
        .map_err(|_| SessionError::HandshakeTimeout("uciok"))??;

    tracing::info!(
        name = identity.name.as_deref().unwrap_or("unknown"),
        options = identity.options.len(),
        "Engine identified"
    );

    for command in option_commands(&identity, options) {
        tracing::debug!("Configuring engine: {}", command);
        send(engine, &command).await?;
    }

    send(engine, "isready").await?;
    time::timeout(options.handshake_timeout, wait_ready(engine))
        .await
        .map_err(|_| SessionError::HandshakeTimeout("readyok"))??;

    Ok(identity)
}

fn option_commands(identity: &EngineIdentity, options: &SessionOptions) -> Vec<String> {
    let mut commands = Vec::new();
    if let Some(overhead) = options.move_overhead_ms {
        commands.push(format!("setoption name Move Overhead value {}", overhead));
    }
    if let Some(level) = options.skill_level {
        commands.push(format!("setoption name Skill Level value {}", level.min(20)));
    }
    commands.push(format!(
        "setoption name MultiPV value {}",
        options.multipv.max(1)
    ));
    if identity.supports_option("Threads") {
        commands.push(format!(
            "setoption name Threads value {}",
            options.threads.max(1)
        ));
    }
    if let Some(hash_mb) = options.hash_mb {
        commands.push(format!("setoption name Hash value {}", hash_mb.clamp(1, 2048)));
    }
    commands
}

async fn read_identity(engine: &mut EngineHandle) -> Result<EngineIdentity, SessionError> {
    let mut identity = EngineIdentity::default();
    while let Some(line) = engine.rx.recv().await {
        tracing::trace!("UCI << {}", line.trim());
        match parse_uci_message(&line) {
            Ok(UciMessage::UciOk) => return Ok(identity),
            Ok(UciMessage::Id { name, value }) => match name.as_str() {
                "name" => identity.name = Some(value),
                "author" => identity.author = Some(value),
                _ => {}
            },
            Ok(UciMessage::Option { name }) => identity.options.push(name),
            _ => {}
        }
    }
    Err(SessionError::HandshakeClosed)
}

async fn wait_ready(engine: &mut EngineHandle) -> Result<(), SessionError> {
    while let Some(line) = engine.rx.recv().await {
        tracing::trace!("UCI << {}", line.trim());
        if matches!(parse_uci_message(&line), Ok(UciMessage::ReadyOk)) {
            return Ok(());
        }
    }
    Err(SessionError::HandshakeClosed)
}

async fn send(engine: &EngineHandle, command: &str) -> Result<(), SessionError> {
    tracing::trace!("UCI >> {}", command);
    engine
        .tx
        .send(command.to_string())
        .await
        .map_err(|_| SessionError::HandshakeClosed)
}
