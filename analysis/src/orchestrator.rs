//! Move evaluation orchestrator.
//!
//! Positions go into a shared job queue drained by one worker task per
//! engine session. Each position is searched exactly once; results are put
//! back at their original index whatever order they finish in.

use std::sync::Arc;

use chess::{Game, PieceColor};
use engine::{decode, EngineLine, EngineSession, EvaluationRecord, TrackedRequest};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};

use crate::classifier::classify;
use crate::context::AnalysisContext;
use crate::error::AnalysisError;
use crate::model::{
    Analysis, AnalysisRequest, AnalyzedMove, GameHeaders, PlyInput, Progress, SearchSettings,
};

/// How a single position search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The engine printed `bestmove`.
    BestMove,
    /// No new record within the idle timeout; partial data kept.
    TimedOut,
    /// The session went away before `bestmove`; records discarded.
    Failed,
}

#[derive(Debug, Clone)]
pub struct PositionEvaluation {
    pub records: Vec<EvaluationRecord>,
    pub completion: Completion,
}

impl PositionEvaluation {
    fn failed() -> Self {
        Self {
            records: vec![],
            completion: Completion::Failed,
        }
    }
}

/// Keeps the latest record per candidate move.
#[derive(Debug, Default)]
struct RecordCollector {
    /// (arrival sequence, record)
    latest: Vec<(usize, EvaluationRecord)>,
    received: usize,
}

impl RecordCollector {
    fn push(&mut self, record: EvaluationRecord) {
        self.received += 1;
        let seq = self.received;
        let candidate = record.best_move.as_ref().map(|m| m.uci.clone());
        match self
            .latest
            .iter_mut()
            .find(|(_, r)| r.best_move.as_ref().map(|m| &m.uci) == candidate.as_ref())
        {
            Some(slot) => *slot = (seq, record),
            None => self.latest.push((seq, record)),
        }
    }

    /// Deepest first, then best rank, then newest.
    fn finish(mut self) -> Vec<EvaluationRecord> {
        self.latest.sort_by(|(seq_a, a), (seq_b, b)| {
            b.depth
                .cmp(&a.depth)
                .then(a.rank().cmp(&b.rank()))
                .then(seq_b.cmp(seq_a))
        });
        self.latest.into_iter().map(|(_, r)| r).collect()
    }
}

/// Search one position on `session` and collect what the engine reports.
pub async fn evaluate_position(
    session: &EngineSession,
    fen: &str,
    settings: &SearchSettings,
) -> PositionEvaluation {
    let white_to_move = chess::side_to_move(fen).map_or(true, PieceColor::is_white);

    if let Err(e) = session.submit(format!("position fen {}", fen), None) {
        tracing::warn!(session = session.label(), "Cannot set position: {}", e);
        return PositionEvaluation::failed();
    }
    let TrackedRequest {
        mut lines,
        dispatched,
    } = match session.request_tracked(settings.go_command()) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(session = session.label(), "Cannot start search: {}", e);
            return PositionEvaluation::failed();
        }
    };

    // The session may still be finishing an earlier search. The idle clock
    // only runs once our `go` has reached the engine.
    if dispatched.await.is_err() {
        tracing::warn!(
            session = session.label(),
            fen,
            "Engine session ended before search started"
        );
        return PositionEvaluation::failed();
    }

    let idle = settings.idle_timeout();
    let mut deadline = Instant::now() + idle;
    let mut collector = RecordCollector::default();

    let completion = loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => match decode(&line, white_to_move) {
                    EngineLine::Info(record) => {
                        collector.push(record);
                        deadline = Instant::now() + idle;
                    }
                    EngineLine::BestMove(_) => break Completion::BestMove,
                    EngineLine::Ignored => {}
                },
                None => break Completion::Failed,
            },
            _ = sleep_until(deadline) => break Completion::TimedOut,
        }
    };

    match completion {
        Completion::Failed => {
            tracing::warn!(session = session.label(), fen, "Engine session failed mid-search");
            PositionEvaluation::failed()
        }
        Completion::TimedOut => {
            tracing::debug!(
                session = session.label(),
                records = collector.received,
                "Search idle, finalizing partial result"
            );
            PositionEvaluation {
                records: collector.finish(),
                completion,
            }
        }
        Completion::BestMove => PositionEvaluation {
            records: collector.finish(),
            completion,
        },
    }
}

struct Job {
    index: usize,
    fen: String,
}

struct JobResult {
    index: usize,
    evaluation: PositionEvaluation,
}

/// Evaluate every position, spreading work across `sessions`.
///
/// The output has one entry per input, in input order. Positions whose
/// session failed, or that no live session was left to take, come back with
/// no records. `progress` is called once per finished position.
pub async fn evaluate_moves<F>(
    sessions: Vec<EngineSession>,
    plies: Vec<PlyInput>,
    settings: &SearchSettings,
    mut progress: F,
) -> Vec<AnalyzedMove>
where
    F: FnMut(Progress),
{
    let total = plies.len();
    let mut slots: Vec<Option<Vec<EvaluationRecord>>> = vec![None; total];

    if total > 0 {
        let (job_tx, job_rx) = mpsc::channel::<Job>(total);
        for (index, ply) in plies.iter().enumerate() {
            // Capacity equals the job count, so this never waits.
            let _ = job_tx
                .send(Job {
                    index,
                    fen: ply.fen.clone(),
                })
                .await;
        }
        drop(job_tx);

        let shared_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<JobResult>();
        let settings = Arc::new(settings.clone());

        tracing::info!(
            positions = total,
            workers = sessions.len(),
            go = %settings.go_command(),
            "Starting move evaluation"
        );

        // Dropping the set aborts the workers if this future is abandoned.
        let mut workers = JoinSet::new();
        for (worker_id, session) in sessions.into_iter().enumerate() {
            workers.spawn(run_worker(
                worker_id,
                session,
                shared_rx.clone(),
                settings.clone(),
                result_tx.clone(),
            ));
        }
        drop(result_tx);

        let mut completed = 0;
        while let Some(result) = result_rx.recv().await {
            if let Some(slot) = slots.get_mut(result.index) {
                *slot = Some(result.evaluation.records);
                completed += 1;
                progress(Progress { completed, total });
            }
        }
        while workers.join_next().await.is_some() {}

        let stranded = total - completed;
        if stranded > 0 {
            tracing::warn!(stranded, "No engine session left; positions left unevaluated");
            for slot in slots.iter_mut().filter(|s| s.is_none()) {
                *slot = Some(vec![]);
                completed += 1;
                progress(Progress { completed, total });
            }
        }
    }

    plies
        .into_iter()
        .zip(slots)
        .map(|(ply, records)| AnalyzedMove::new(ply, records.unwrap_or_default()))
        .collect()
}

/// A long-lived worker. Pulls positions from the shared queue until it is
/// empty or the session dies.
async fn run_worker(
    worker_id: usize,
    session: EngineSession,
    job_rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    settings: Arc<SearchSettings>,
    result_tx: mpsc::UnboundedSender<JobResult>,
) {
    tracing::debug!(worker_id, session = session.label(), "Evaluation worker started");
    configure_session(&session, &settings);

    loop {
        let job = {
            let mut rx = job_rx.lock().await;
            match rx.recv().await {
                Some(job) => job,
                None => break,
            }
        };

        let evaluation = evaluate_position(&session, &job.fen, &settings).await;
        let failed = evaluation.completion == Completion::Failed;
        tracing::debug!(
            worker_id,
            index = job.index,
            completion = ?evaluation.completion,
            records = evaluation.records.len(),
            "Position evaluated"
        );

        if result_tx
            .send(JobResult {
                index: job.index,
                evaluation,
            })
            .is_err()
        {
            break;
        }
        if failed && session.is_terminated() {
            tracing::warn!(worker_id, session = session.label(), "Session terminated, worker exiting");
            break;
        }
    }

    tracing::debug!(worker_id, "Evaluation worker exiting");
}

/// Align the session with the requested search width.
fn configure_session(session: &EngineSession, settings: &SearchSettings) {
    let mut commands = vec![format!(
        "setoption name MultiPV value {}",
        settings.variants.max(1)
    )];
    if session.identity().supports_option("Threads") {
        commands.push(format!(
            "setoption name Threads value {}",
            settings.threads.max(1)
        ));
    }
    for command in commands {
        if let Err(e) = session.submit(command, None) {
            tracing::warn!(session = session.label(), "Cannot configure session: {}", e);
            return;
        }
    }
}

/// Parse and replay `pgn`, evaluate every position, classify the moves and
/// make the result the context's current analysis.
#[tracing::instrument(level = "info", skip_all, fields(sessions = sessions.len()))]
pub async fn analyze_game<F>(
    ctx: &mut AnalysisContext,
    pgn: &str,
    request: &AnalysisRequest,
    sessions: Vec<EngineSession>,
    progress: F,
) -> Result<Analysis, AnalysisError>
where
    F: FnMut(Progress),
{
    let game = Game::from_pgn(pgn).map_err(|e| {
        tracing::warn!("Rejecting game: {}", e);
        AnalysisError::Game(e)
    })?;
    if sessions.is_empty() {
        return Err(AnalysisError::NoSessions);
    }

    let headers = GameHeaders::from_tags(game.headers());
    let plies = PlyInput::from_game(&game);
    tracing::info!(plies = plies.len(), game = %headers.title(), "Analyzing game");

    let moves = evaluate_moves(sessions, plies, &request.search, progress).await;
    let moves = classify(moves);

    let analysis = Analysis::new(pgn.to_string(), headers, request.search.clone(), moves);
    tracing::info!(
        id = %analysis.id,
        missing = analysis.missing_evaluations(),
        "Analysis complete"
    );
    ctx.replace(analysis.clone());
    Ok(analysis)
}
