//! Drives a real child process: a tiny shell script that speaks just enough
//! UCI, installed through the engine cache.
#![cfg(unix)]

use std::time::Duration;

use engine::{decode, EngineCache, EngineLine, EngineSession, SessionOptions, Score};

const SCRIPT: &str = r#"#!/bin/sh
while read -r line; do
  case "$line" in
    uci) echo "id name ScriptFish"; echo "option name Threads type spin default 1 min 1 max 8"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) echo "info depth 4 score cp 25 pv e2e4 e7e5"; echo "bestmove e2e4 ponder e7e5" ;;
    quit) exit 0 ;;
  esac
done
"#;

#[tokio::test]
async fn test_cached_script_engine_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let cache = EngineCache::new(dir.path().to_path_buf());
    let url = "https://engines.example/scriptfish";
    cache.insert(url, SCRIPT.as_bytes()).unwrap();

    let handle = cache.spawn(url).unwrap();
    let session = EngineSession::start("script", handle, &SessionOptions::default())
        .await
        .unwrap();
    assert_eq!(session.identity().name.as_deref(), Some("ScriptFish"));

    session
        .submit(
            "position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            None,
        )
        .unwrap();
    let mut lines = session.request("go depth 4").unwrap();

    let mut decoded = Vec::new();
    while let Some(line) = tokio::time::timeout(Duration::from_secs(5), lines.recv())
        .await
        .unwrap()
    {
        decoded.push(decode(&line, true));
    }

    assert_eq!(decoded.len(), 2);
    match &decoded[0] {
        EngineLine::Info(record) => {
            assert_eq!(record.depth, 4);
            assert_eq!(record.score, Score::Centipawns(25));
            assert_eq!(record.best_move.as_ref().unwrap().uci, "e2e4");
        }
        other => panic!("expected info, got {other:?}"),
    }
    assert!(matches!(decoded[1], EngineLine::BestMove(_)));

    session.shutdown();
    session.terminated().await;
}
