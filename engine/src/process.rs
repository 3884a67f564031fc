//! Bridge between a UCI engine process and an [`EngineHandle`] line channel.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::session::SessionError;
use crate::EngineHandle;

const LINE_BUFFER: usize = 256;
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Spawn the engine at `path` and return the session end of its line channel.
///
/// The child is killed when the bridge tasks finish. Closing the returned
/// handle's `tx` makes the writer send `quit` and close stdin; stdout EOF
/// closes the handle's `rx`.
#[tracing::instrument(level = "info")]
pub fn spawn_engine_process(path: &Path) -> Result<EngineHandle, SessionError> {
    let mut child = tokio::process::Command::new(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            tracing::error!("Failed to spawn engine: {}", e);
            SessionError::Spawn(e)
        })?;

    let missing_pipe = |name: &str| {
        SessionError::Spawn(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            format!("engine {} not captured", name),
        ))
    };
    let mut stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
    let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;

    let (session_end, worker_end) = EngineHandle::duplex(LINE_BUFFER);
    let mut command_rx = worker_end.rx;
    let line_tx = worker_end.tx;

    // Reader: stdout lines → session.
    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    tracing::debug!("Engine stdout EOF");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    tracing::trace!("UCI << {}", trimmed);
                    if line_tx.send(trimmed.to_string()).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Error reading engine stdout: {}", e);
                    break;
                }
            }
        }
    });

    // Writer: session commands → stdin. Owns the child so it lives as long
    // as someone can still talk to it.
    tokio::spawn(async move {
        while let Some(cmd) = command_rx.recv().await {
            if let Err(e) = write_line(&mut stdin, &cmd).await {
                tracing::error!("Failed to write to engine stdin: {}", e);
                break;
            }
        }
        let _ = write_line(&mut stdin, "quit").await;
        drop(stdin);
        match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(%status, "Engine process exited"),
            Ok(Err(e)) => tracing::warn!("Failed to wait for engine process: {}", e),
            Err(_) => {
                tracing::warn!("Engine ignored quit, killing it");
                let _ = child.kill().await;
            }
        }
    });

    Ok(session_end)
}

async fn write_line(
    stdin: &mut tokio::process::ChildStdin,
    line: &str,
) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

/// Look for a Stockfish binary in the usual install locations.
pub fn find_stockfish_path() -> Option<PathBuf> {
    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
    ];

    if let Some(found) = paths.iter().map(Path::new).find(|p| p.is_file()) {
        return Some(found.to_path_buf());
    }

    // Fall back to PATH.
    std::env::var_os("PATH").and_then(|path| {
        std::env::split_paths(&path)
            .map(|dir| dir.join("stockfish"))
            .find(|candidate| candidate.is_file())
    })
}
