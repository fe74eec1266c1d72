//! The `Worker`: one subprocess, its two Line Pumps, its Script, an
//! optional peer link, and the low-level queue operations the
//! interpreter (`interpreter.rs`) builds the protocol handlers on top of.

use std::time::Duration;

use ataxx_harness_core::limits::{DEFAULT_OP_LIMIT_SECS, PEER_QUEUE_CAPACITY};
use ataxx_harness_core::{HarnessError, Item, Outcome, Script, TerminationMessage};
use ataxx_harness_proc::{spawn_player, spawn_reader_pump, spawn_writer_pump};
use tokio::process::Child;
use tokio::sync::mpsc;

/// A worker's verbose transcript plus its final termination message; the
/// two travel together because the log can only be drained once, before
/// the worker is dropped.
pub struct WorkerReport {
    pub message: TerminationMessage,
    pub log: Option<Vec<String>>,
}

pub struct Worker {
    pub title: String,
    pub(crate) script: Script,
    child: Child,
    stdin_tx: mpsc::Sender<Item<String>>,
    stdout_rx: mpsc::Receiver<Item<String>>,
    pub(crate) peer_tx: Option<mpsc::Sender<Item<String>>>,
    pub(crate) peer_rx: Option<mpsc::Receiver<Item<String>>>,
    pub(crate) op_limit: Duration,
    eof: bool,
    log: Option<Vec<String>>,
}

impl Worker {
    /// Builds a worker from its script, consuming the script's first
    /// command as the subprocess argv. Returns the empty-script
    /// termination message directly (as `Err`) rather than constructing a
    /// worker with nothing to run.
    pub async fn new(
        title: impl Into<String>,
        mut script: Script,
        verbose: bool,
    ) -> Result<Worker, TerminationMessage> {
        let title = title.into();
        let Some(first) = script.next_command() else {
            return Err(TerminationMessage {
                title,
                outcome: Outcome::Fail,
                detail: Some("No command found".to_string()),
                line: Some(script.current_line_number()),
            });
        };
        let argv: Vec<String> = first.split_whitespace().map(str::to_string).collect();

        let mut child = spawn_player(&argv).await.map_err(|e| TerminationMessage {
            title: title.clone(),
            outcome: Outcome::Error,
            detail: Some(e.to_string()),
            line: Some(script.current_line_number()),
        })?;

        let stdin = child.stdin.take().expect("stdin was piped at spawn");
        let stdout = child.stdout.take().expect("stdout was piped at spawn");
        let stderr = child.stderr.take();

        Ok(Worker {
            title,
            script,
            child,
            stdin_tx: spawn_writer_pump(stdin),
            stdout_rx: spawn_reader_pump(stdout, stderr),
            peer_tx: None,
            peer_rx: None,
            op_limit: Duration::from_secs_f64(DEFAULT_OP_LIMIT_SECS),
            eof: false,
            log: verbose.then(Vec::new),
        })
    }

    pub(crate) fn log(&mut self, msg: impl Into<String>) {
        if let Some(buf) = &mut self.log {
            buf.push(msg.into());
        }
    }

    pub fn take_log(&mut self) -> Option<Vec<String>> {
        self.log.take()
    }

    /// Reads the next line from this worker's own output queue, bounded by
    /// `op_limit`. `None` means timeout; `Some(Item::Eof)` means the
    /// program's output genuinely ended.
    pub(crate) async fn get(&mut self) -> Option<Item<String>> {
        if self.eof {
            return Some(Item::Eof);
        }
        match tokio::time::timeout(self.op_limit, self.stdout_rx.recv()).await {
            Ok(Some(item)) => {
                if item.is_eof() {
                    self.eof = true;
                }
                self.log(format!(
                    "< {}",
                    match &item {
                        Item::Eof => "<EOF>".to_string(),
                        Item::Line(l) => l.clone(),
                    }
                ));
                Some(item)
            }
            Ok(None) => {
                self.eof = true;
                Some(Item::Eof)
            }
            Err(_) => None,
        }
    }

    /// Reads the next line forwarded by the peer, bounded by `op_limit`.
    pub(crate) async fn get_other(&mut self) -> Option<Item<String>> {
        let rx = self.peer_rx.as_mut()?;
        match tokio::time::timeout(self.op_limit, rx.recv()).await {
            Ok(Some(Item::Eof)) => {
                self.peer_rx = None;
                self.log("R< <EOF>");
                Some(Item::Eof)
            }
            Ok(Some(Item::Line(l))) => {
                self.log(format!("R< {l}"));
                Some(Item::Line(l))
            }
            Ok(None) => {
                self.peer_rx = None;
                Some(Item::Eof)
            }
            Err(_) => None,
        }
    }

    /// Non-blocking forward to the peer's receive queue. Returns
    /// "other program blocked" unless `ignore` is set, whether the queue
    /// was full or there simply is no peer.
    pub(crate) fn send_other(&mut self, item: Item<String>, ignore: bool) -> Result<(), HarnessError> {
        self.log(format!(
            "R> {}",
            match &item {
                Item::Eof => "<EOF>".to_string(),
                Item::Line(l) => l.clone(),
            }
        ));
        let sent = match &self.peer_tx {
            Some(tx) => tx.try_send(item).is_ok(),
            None => false,
        };
        if sent || ignore {
            Ok(())
        } else {
            Err(HarnessError::error("other program blocked"))
        }
    }

    /// Blocking send to this worker's own subprocess stdin.
    pub(crate) async fn send_to_child(&mut self, item: Item<String>) -> Result<(), HarnessError> {
        self.log(format!(
            "> {}",
            match &item {
                Item::Eof => "<EOF>".to_string(),
                Item::Line(l) => l.clone(),
            }
        ));
        self.stdin_tx
            .send(item)
            .await
            .map_err(|_| HarnessError::error("program did not terminate properly"))
    }

    /// The subprocess's OS pid, for a deadline-timeout force-kill issued
    /// from outside the task that owns this `Worker` (the match runner
    /// only has a `JoinHandle`, not the `Worker` itself, once `run` is
    /// spawned).
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub(crate) async fn kill(&mut self) {
        tracing::debug!(title = %self.title, "killing worker subprocess after interpreter error");
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }

    pub(crate) async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }
}

/// Idempotently cross-links two workers: each gets the other's
/// peer-receive queue as its send target, and its own receive queue gets
/// created fresh if this is the first `connect` for either side.
pub fn connect(a: &mut Worker, b: &mut Worker) {
    if a.peer_tx.is_some() {
        return;
    }
    let (tx_a_to_b, rx_b_from_a) = mpsc::channel(PEER_QUEUE_CAPACITY);
    let (tx_b_to_a, rx_a_from_b) = mpsc::channel(PEER_QUEUE_CAPACITY);
    a.peer_tx = Some(tx_a_to_b);
    a.peer_rx = Some(rx_a_from_b);
    b.peer_tx = Some(tx_b_to_a);
    b.peer_rx = Some(rx_b_from_a);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ataxx_harness_core::script::breakup;

    fn script(lines: &[&str]) -> Script {
        Script::new(lines.iter().map(|s| s.to_string()).collect(), 1)
    }

    #[tokio::test]
    async fn empty_script_fails_fast() {
        let err = Worker::new("Prog1", script(&[]), false).await.unwrap_err();
        assert_eq!(err.outcome, Outcome::Fail);
        assert_eq!(err.detail.as_deref(), Some("No command found"));
    }

    #[tokio::test]
    async fn comment_only_script_fails_fast() {
        let err = Worker::new("Prog1", script(&["# nothing", "   "]), false)
            .await
            .unwrap_err();
        assert_eq!(err.detail.as_deref(), Some("No command found"));
    }

    #[tokio::test]
    async fn connect_is_idempotent_and_symmetric() {
        let mut a = Worker::new("Prog1", script(&["/bin/cat"]), false).await.unwrap();
        let mut b = Worker::new("Prog2", script(&["/bin/cat"]), false).await.unwrap();
        connect(&mut a, &mut b);
        connect(&mut b, &mut a);
        assert!(a.peer_tx.is_some() && a.peer_rx.is_some());
        assert!(b.peer_tx.is_some() && b.peer_rx.is_some());
        a.kill().await;
        b.kill().await;
    }

    #[test]
    fn breakup_is_reexported_for_section_splitting() {
        assert_eq!(breakup("a\nb"), vec!["a", "b"]);
    }
}
