//! movegrade: grade every move of a recorded chess game with a UCI engine.
//!
//! `analyze` replays a PGN, evaluates the position before each move on a pool
//! of engine processes, labels the moves and saves the analysis as JSON.
//! `history` browses saved analyses; `cache` inspects the engine binary cache.

use std::io::Write;
use std::path::{Path, PathBuf};

use analysis::{
    analyze_game, AnalysisContext, AnalysisRequest, AnalysisStore, Progress, SearchSettings,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use engine::{
    find_stockfish_path, spawn_engine_process, EngineCache, EngineSession, SessionError,
    SessionOptions,
};

mod config;
mod report;

#[derive(Parser)]
#[command(name = "movegrade", about = "Chess game analysis with a UCI engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a PGN game.
    Analyze(AnalyzeArgs),
    /// Browse saved analyses.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Inspect the engine binary cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(clap::Args)]
struct AnalyzeArgs {
    /// PGN file to analyze; `-` reads standard input.
    pgn: PathBuf,
    /// Search depth per position.
    #[arg(long, conflicts_with = "movetime")]
    depth: Option<u32>,
    /// Search time per position in milliseconds.
    #[arg(long)]
    movetime: Option<u64>,
    /// Candidate lines per position.
    #[arg(long, default_value_t = 1)]
    variants: u32,
    /// Number of engine processes to run in parallel.
    #[arg(long, default_value_t = 1)]
    workers: usize,
    /// Search threads per engine process.
    #[arg(long, default_value_t = 1)]
    threads: u32,
    /// Engine hash table size in MB. Left at the engine default when omitted.
    #[arg(long)]
    hash: Option<u32>,
    /// Engine binary. Defaults to `MOVEGRADE_ENGINE_PATH`, then a local Stockfish.
    #[arg(long)]
    engine: Option<PathBuf>,
    /// Use the cached engine downloaded from this URL.
    #[arg(long, conflicts_with = "engine")]
    engine_url: Option<String>,
    /// Print the analysis as JSON instead of a table.
    #[arg(long)]
    json: bool,
    /// Do not save the analysis.
    #[arg(long)]
    no_save: bool,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List saved analyses, newest first.
    List,
    /// Show one saved analysis.
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved analysis.
    Delete { id: String },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached engines, or check a single URL.
    Status { url: Option<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => run_analyze(args).await,
        Commands::History { action } => run_history(action),
        Commands::Cache { action } => run_cache(action),
    }
}

fn read_pgn(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut pgn = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut pgn)
            .context("Failed to read PGN from stdin")?;
        return Ok(pgn);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn resolve_engine(args: &AnalyzeArgs) -> Result<PathBuf> {
    if let Some(url) = &args.engine_url {
        let cache = EngineCache::new(config::get_engine_cache_dir());
        return cache
            .locate(url)
            .with_context(|| format!("Engine for {} is not cached in {}", url, cache.dir().display()));
    }
    if let Some(path) = args.engine.clone().or_else(config::get_engine_path) {
        return Ok(path);
    }
    find_stockfish_path()
        .ok_or(SessionError::EngineNotFound)
        .context("Pass --engine or set MOVEGRADE_ENGINE_PATH")
}

fn session_options(args: &AnalyzeArgs) -> SessionOptions {
    SessionOptions {
        multipv: args.variants.max(1),
        threads: args.threads.max(1),
        hash_mb: args.hash,
        ..Default::default()
    }
}

async fn start_sessions(args: &AnalyzeArgs, path: &Path) -> Result<Vec<EngineSession>> {
    let options = session_options(args);
    let mut sessions = Vec::new();
    for worker in 0..args.workers.max(1) {
        let handle = spawn_engine_process(path)
            .with_context(|| format!("Failed to start engine {}", path.display()))?;
        let session = EngineSession::start(&format!("engine-{}", worker), handle, &options).await?;
        sessions.push(session);
    }
    Ok(sessions)
}

async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let pgn = read_pgn(&args.pgn)?;
    let engine_path = resolve_engine(&args)?;
    tracing::info!(engine = %engine_path.display(), workers = args.workers, "Using engine");

    let sessions = start_sessions(&args, &engine_path).await?;
    let request = AnalysisRequest {
        search: SearchSettings {
            depth: match (args.depth, args.movetime) {
                (None, Some(_)) => None,
                (depth, _) => depth.or(SearchSettings::default().depth),
            },
            movetime_ms: args.movetime,
            variants: args.variants.max(1),
            threads: args.threads.max(1),
            idle_timeout_ms: config::get_idle_timeout_ms(),
        },
    };

    let mut ctx = AnalysisContext::new();
    let result = analyze_game(
        &mut ctx,
        &pgn,
        &request,
        sessions.clone(),
        |p: Progress| {
            eprint!("\rAnalyzing {}/{} ({}%)", p.completed, p.total, p.percent());
            let _ = std::io::stderr().flush();
        },
    )
    .await;
    eprintln!();
    for session in &sessions {
        session.shutdown();
    }
    let analysis = result?;

    if !args.no_save {
        let store = AnalysisStore::new(config::get_analyses_dir());
        let id = store.save(&analysis)?;
        tracing::info!(id = %id, dir = %store.dir().display(), "Analysis saved");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", report::format_moves(&analysis));
        println!();
        print!("{}", report::format_summary(&analysis));
        println!("id: {}", analysis.id);
    }
    Ok(())
}

fn run_history(action: HistoryAction) -> Result<()> {
    let store = AnalysisStore::new(config::get_analyses_dir());
    print!("{}", history_output(&store, action)?);
    Ok(())
}

fn history_output(store: &AnalysisStore, action: HistoryAction) -> Result<String> {
    match action {
        HistoryAction::List => Ok(report::format_history(&store.list()?)),
        HistoryAction::Show { id, json } => {
            let Some(analysis) = store.load(&id)? else {
                bail!("No analysis with id {}", id);
            };
            if json {
                return Ok(format!("{}\n", serde_json::to_string_pretty(&analysis)?));
            }
            Ok(format!(
                "{}\n{}",
                report::format_moves(&analysis),
                report::format_summary(&analysis)
            ))
        }
        HistoryAction::Delete { id } => {
            if !store.delete(&id)? {
                bail!("No analysis with id {}", id);
            }
            Ok(format!("Deleted {}\n", id))
        }
    }
}

fn run_cache(action: CacheAction) -> Result<()> {
    let cache = EngineCache::new(config::get_engine_cache_dir());
    match action {
        CacheAction::Status { url: Some(url) } => match cache.locate(&url) {
            Some(path) => println!("cached: {}", path.display()),
            None => println!("not cached: {}", url),
        },
        CacheAction::Status { url: None } => {
            let entries = cache.entries()?;
            if entries.is_empty() {
                println!("No cached engines in {}", cache.dir().display());
            }
            for entry in entries {
                println!("{:>10}  {}", entry.size, entry.key);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "movegrade", "analyze", "game.pgn", "--depth", "12", "--workers", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.depth, Some(12));
                assert_eq!(args.workers, 3);
                assert_eq!(args.variants, 1);
                assert!(!args.json);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_depth_conflicts_with_movetime() {
        assert!(Cli::try_parse_from([
            "movegrade", "analyze", "game.pgn", "--depth", "12", "--movetime", "100",
        ])
        .is_err());
    }

    #[test]
    fn test_hash_flag_reaches_session_options() {
        let cli = Cli::try_parse_from([
            "movegrade", "analyze", "game.pgn", "--hash", "256", "--variants", "3",
        ])
        .unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let options = session_options(&args);
        assert_eq!(options.hash_mb, Some(256));
        assert_eq!(options.multipv, 3);

        let cli = Cli::try_parse_from(["movegrade", "analyze", "game.pgn"]).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(session_options(&args).hash_mb, None);
    }

    fn saved_analysis(store: &AnalysisStore) -> String {
        let game = chess::Game::from_pgn("[White \"Ann\"]\n[Black \"Ben\"]\n\n1. e4 e5 *").unwrap();
        let moves = analysis::PlyInput::from_game(&game)
            .into_iter()
            .map(|input| analysis::AnalyzedMove::new(input, vec![]))
            .collect();
        let analysis = analysis::Analysis::new(
            String::new(),
            analysis::GameHeaders::from_tags(game.headers()),
            SearchSettings::default(),
            moves,
        );
        store.save(&analysis).unwrap()
    }

    #[test]
    fn test_history_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::new(dir.path().to_path_buf());
        let id = saved_analysis(&store);

        let listed = history_output(&store, HistoryAction::List).unwrap();
        assert!(listed.contains(&id));
        assert!(listed.contains("Ann vs Ben"));

        let shown = history_output(
            &store,
            HistoryAction::Show {
                id: id.clone(),
                json: false,
            },
        )
        .unwrap();
        assert!(shown.contains("1. e4"));
        assert!(shown.contains("2 position(s) without engine data"));

        let json = history_output(
            &store,
            HistoryAction::Show {
                id: id.clone(),
                json: true,
            },
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["id"], id.as_str());

        assert_eq!(
            history_output(&store, HistoryAction::Delete { id: id.clone() }).unwrap(),
            format!("Deleted {}\n", id)
        );
        assert!(history_output(&store, HistoryAction::Delete { id }).is_err());
        assert_eq!(
            history_output(&store, HistoryAction::List).unwrap(),
            "No saved analyses\n"
        );
    }

    #[test]
    fn test_parse_history_show() {
        let cli = Cli::try_parse_from(["movegrade", "history", "show", "abc", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::History {
                action: HistoryAction::Show { json: true, .. }
            }
        ));
    }
}
