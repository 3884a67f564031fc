//! Scripted stand-in for a UCI engine, spoken to over `EngineHandle` channels.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use engine::{EngineHandle, EngineSession, SessionOptions};

/// What the fake does after `go` for a given position.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Wait, print the lines, then `bestmove` for the first pv move.
    Search { delay: Duration, lines: Vec<String> },
    /// Print each line after `gap`, then `bestmove` for the last pv move.
    Paced { gap: Duration, lines: Vec<String> },
    /// Print the lines and never finish.
    Stall { lines: Vec<String> },
    /// Exit without answering.
    Crash,
}

impl Reply {
    pub fn cp(cp: i32, mv: &str) -> Self {
        Self::Search {
            delay: Duration::ZERO,
            lines: vec![format!("info depth 12 seldepth 16 multipv 1 score cp {cp} pv {mv}")],
        }
    }

    pub fn delayed(self, by: Duration) -> Self {
        match self {
            Self::Search { lines, .. } => Self::Search { delay: by, lines },
            other => other,
        }
    }
}

/// Shared script plus a log of positions each fake finished, in order.
#[derive(Clone, Default)]
pub struct Script {
    replies: Arc<HashMap<String, Reply>>,
    pub finished: Arc<Mutex<Vec<String>>>,
    pub searched: Arc<Mutex<Vec<String>>>,
}

impl Script {
    pub fn new(replies: HashMap<String, Reply>) -> Self {
        Self {
            replies: Arc::new(replies),
            ..Default::default()
        }
    }

    fn reply_for(&self, fen: &str) -> Reply {
        self.replies
            .get(fen)
            .cloned()
            .unwrap_or_else(|| Reply::cp(0, "a2a3"))
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    pub fn searched(&self) -> Vec<String> {
        self.searched.lock().unwrap().clone()
    }
}

fn best_of(lines: &[String]) -> String {
    lines
        .last()
        .and_then(|l| l.split(" pv ").nth(1))
        .and_then(|pv| pv.split_whitespace().next())
        .unwrap_or("(none)")
        .to_string()
}

async fn run_fake(mut worker: EngineHandle, script: Script) {
    let mut fen = String::new();
    while let Some(cmd) = worker.rx.recv().await {
        let mut out: Vec<String> = Vec::new();
        if cmd == "uci" {
            out.push("id name FakeFish".into());
            out.push("option name Threads type spin default 1 min 1 max 8".into());
            out.push("uciok".into());
        } else if cmd == "isready" {
            out.push("readyok".into());
        } else if cmd == "quit" {
            return;
        } else if let Some(rest) = cmd.strip_prefix("position fen ") {
            fen = rest.to_string();
        } else if cmd.starts_with("go") {
            script.searched.lock().unwrap().push(fen.clone());
            match script.reply_for(&fen) {
                Reply::Search { delay, lines } => {
                    tokio::time::sleep(delay).await;
                    let best = best_of(&lines);
                    out.extend(lines);
                    out.push(format!("bestmove {best}"));
                    script.finished.lock().unwrap().push(fen.clone());
                }
                Reply::Paced { gap, lines } => {
                    let best = best_of(&lines);
                    for line in lines {
                        tokio::time::sleep(gap).await;
                        if worker.tx.send(line).await.is_err() {
                            return;
                        }
                    }
                    out.push(format!("bestmove {best}"));
                    script.finished.lock().unwrap().push(fen.clone());
                }
                Reply::Stall { lines } => out.extend(lines),
                Reply::Crash => return,
            }
        }
        for line in out {
            if worker.tx.send(line).await.is_err() {
                return;
            }
        }
    }
}

pub async fn fake_session(label: &str, script: &Script) -> EngineSession {
    let (session_end, worker_end) = EngineHandle::duplex(64);
    tokio::spawn(run_fake(worker_end, script.clone()));
    EngineSession::start(label, session_end, &SessionOptions::default())
        .await
        .unwrap()
}

pub async fn fake_sessions(count: usize, script: &Script) -> Vec<EngineSession> {
    let mut sessions = Vec::new();
    for i in 0..count {
        sessions.push(fake_session(&format!("fake-{i}"), script).await);
    }
    sessions
}
