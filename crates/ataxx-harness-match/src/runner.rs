//! Running a parsed test file end-to-end: spawning one or two workers,
//! waiting on their shared termination channel under the match deadline,
//! and classifying the result.

use std::time::Duration;

use ataxx_harness_core::limits::{CLEANUP_BUDGET_SECS, TERMINATION_CHANNEL_CAPACITY};
use ataxx_harness_core::{Outcome, Script, TerminationMessage};
use ataxx_harness_proc::force_kill;
use ataxx_harness_worker::{connect, Worker, WorkerReport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::parse::{parse_test_file, Sections};

/// The outcome of a whole match: its classification, an optional detail
/// string, and (in verbose mode) each worker's transcript.
pub struct MatchResult {
    pub outcome: Outcome,
    pub detail: Option<String>,
    pub logs: Vec<(String, Vec<String>)>,
}

/// Parses `text` and runs the resulting one- or two-worker match to
/// completion, honoring the match deadline and the post-first-termination
/// cleanup budget.
pub async fn run_match(text: &str, verbose: bool) -> MatchResult {
    let parsed = parse_test_file(text);

    let (term_tx, term_rx) = mpsc::channel::<WorkerReport>(TERMINATION_CHANNEL_CAPACITY);
    let mut pids: Vec<u32> = Vec::new();
    let mut handles: Vec<JoinHandle<()>> = Vec::new();
    let expected_workers;

    match parsed.sections {
        Sections::One(lines) => {
            expected_workers = 1;
            let script = Script::new(lines, 0);
            let worker = Worker::new("Prog1", script, verbose).await;
            launch(worker, &term_tx, &mut pids, &mut handles).await;
        }
        Sections::Two { first, second, second_start_offset } => {
            expected_workers = 2;
            let w1 = Worker::new("Prog1", Script::new(first, 0), verbose).await;
            let w2 = Worker::new("Prog2", Script::new(second, second_start_offset), verbose).await;
            match (w1, w2) {
                (Ok(mut a), Ok(mut b)) => {
                    connect(&mut a, &mut b);
                    launch(Ok(a), &term_tx, &mut pids, &mut handles).await;
                    launch(Ok(b), &term_tx, &mut pids, &mut handles).await;
                }
                (a, b) => {
                    launch(a, &term_tx, &mut pids, &mut handles).await;
                    launch(b, &term_tx, &mut pids, &mut handles).await;
                }
            }
        }
    }
    drop(term_tx);

    collect(term_rx, expected_workers, parsed.total_time, pids, handles).await
}

/// Either spawns the worker's interpreter task (tracking its pid for a
/// deadline force-kill) or, if construction already failed, posts its
/// termination message directly to the shared channel — the two paths
/// converge before the channel is ever read.
async fn launch(
    worker: Result<Worker, TerminationMessage>,
    term_tx: &mpsc::Sender<WorkerReport>,
    pids: &mut Vec<u32>,
    handles: &mut Vec<JoinHandle<()>>,
) {
    match worker {
        Ok(worker) => {
            if let Some(pid) = worker.pid() {
                pids.push(pid);
            }
            let tx = term_tx.clone();
            handles.push(tokio::spawn(async move { worker.run(tx).await }));
        }
        Err(message) => {
            let _ = term_tx.send(WorkerReport { message, log: None }).await;
        }
    }
}

async fn collect(
    mut term_rx: mpsc::Receiver<WorkerReport>,
    expected_workers: usize,
    total_time: Duration,
    pids: Vec<u32>,
    handles: Vec<JoinHandle<()>>,
) -> MatchResult {
    let mut reports: Vec<WorkerReport> = Vec::new();
    let mut early: Option<(Outcome, Option<String>)> = None;

    match tokio::time::timeout(total_time, term_rx.recv()).await {
        Ok(Some(report)) => reports.push(report),
        Ok(None) => early = Some((Outcome::Error, Some("no worker reported a termination".to_string()))),
        Err(_) => {
            tracing::warn!(secs = total_time.as_secs(), "match deadline exceeded, killing workers");
            for pid in &pids {
                force_kill(*pid);
            }
            early = Some((
                Outcome::Error,
                Some(format!("test time exceeded {} seconds", total_time.as_secs())),
            ));
        }
    }

    if early.is_none() && expected_workers == 2 && reports.len() < expected_workers {
        match tokio::time::timeout(Duration::from_secs(CLEANUP_BUDGET_SECS), term_rx.recv()).await {
            Ok(Some(report)) => reports.push(report),
            _ => {
                tracing::warn!("peer failed to finish within the cleanup budget, killing survivors");
                for pid in &pids {
                    force_kill(*pid);
                }
                early = Some((Outcome::Error, Some("other program fails to finish".to_string())));
            }
        }
    }

    for handle in handles {
        let _ = handle.await;
    }

    let logs: Vec<(String, Vec<String>)> = reports
        .iter()
        .filter_map(|r| r.log.clone().map(|log| (r.message.title.clone(), log)))
        .collect();

    if let Some((outcome, detail)) = early {
        return MatchResult { outcome, detail, logs };
    }

    let mut messages: Vec<TerminationMessage> = reports.into_iter().map(|r| r.message).collect();
    messages.sort_by(|a, b| a.title.cmp(&b.title));
    classify(messages, logs)
}

fn classify(messages: Vec<TerminationMessage>, logs: Vec<(String, Vec<String>)>) -> MatchResult {
    let any_fail = messages.iter().any(|m| m.outcome == Outcome::Fail);
    let all_ok = messages.iter().all(|m| m.outcome == Outcome::Ok);

    if all_ok {
        return MatchResult { outcome: Outcome::Ok, detail: None, logs };
    }

    let detail = messages
        .iter()
        .filter(|m| m.outcome != Outcome::Ok)
        .map(|m| m.describe())
        .collect::<Vec<_>>()
        .join("/");

    let outcome = if any_fail { Outcome::Fail } else { Outcome::Error };
    MatchResult { outcome, detail: Some(detail), logs }
}
