//! The script interpreter: reads commands from a `Worker`'s script one at
//! a time, dispatches them, and reduces everything to exactly one
//! [`WorkerReport`] posted to the match's termination channel.

use ataxx_harness_core::moves::check_move;
use ataxx_harness_core::{Color, HarnessError, Item, MoveKind};
use regex::Regex;
use tokio::sync::mpsc;

use crate::dispatch::{parse_command, Command, EndPattern};
use crate::worker::{Worker, WorkerReport};

impl Worker {
    /// Runs the interpreter to completion and posts exactly one
    /// [`WorkerReport`] to `term_tx`, killing the subprocess first if the
    /// script ended in `FAIL`/`ERROR`.
    pub async fn run(mut self, term_tx: mpsc::Sender<WorkerReport>) {
        let result = self.interpret().await;
        let message = match result {
            Ok(()) => ataxx_harness_core::TerminationMessage::ok(self.title.clone()),
            Err(err) => {
                self.kill().await;
                let line = self.script.current_line_number();
                tracing::debug!(title = %self.title, %err, line, "worker interpreter unwound with an error");
                ataxx_harness_core::TerminationMessage::from_error(self.title.clone(), &err, line)
            }
        };
        let log = self.take_log();
        let _ = term_tx.send(WorkerReport { message, log }).await;
    }

    async fn interpret(&mut self) -> Result<(), HarnessError> {
        loop {
            let Some(line) = self.script.next_command() else {
                break;
            };
            let cmd = parse_command(&line);
            self.dispatch(cmd).await?;
        }
        self.finish().await
    }

    async fn dispatch(&mut self, cmd: Command) -> Result<(), HarnessError> {
        match cmd {
            Command::SetTime(raw) => {
                let secs: f64 = raw.parse().map_err(|_| HarnessError::fail("bad number"))?;
                self.op_limit = std::time::Duration::from_secs_f64(secs.max(0.0));
                Ok(())
            }
            Command::TotalTime(_) => Ok(()),
            Command::ExpectLiteral(lit) => self.check_output(OutputCheck::Literal(lit)).await,
            Command::ExpectRegex(pat) => self.check_output(OutputCheck::Regex(pat)).await,
            Command::SelfPlay { start, end_pattern } => self.play_self(start, end_pattern).await,
            Command::SendMoves { first_mover, end_pattern } => {
                self.send_recv(true, first_mover, end_pattern).await
            }
            Command::RecvMoves { first_mover, end_pattern } => {
                self.send_recv(false, first_mover, end_pattern).await
            }
            Command::BadDirective => Err(HarnessError::fail("bad command in script")),
            Command::Raw(line) => self.send_to_child(Item::Line(line)).await,
        }
    }

    async fn get_move(&mut self, who: Color) -> Result<ataxx_harness_core::ParsedMove, HarnessError> {
        match self.get().await {
            None => Err(HarnessError::error(format!(
                "timed out waiting for my {} move",
                who.as_str().to_lowercase()
            ))),
            Some(Item::Eof) => Err(HarnessError::error("game output truncated")),
            Some(Item::Line(line)) => check_move(who, &line),
        }
    }

    async fn get_other_move(&mut self, who: Color) -> Result<ataxx_harness_core::ParsedMove, HarnessError> {
        if self.peer_rx.is_none() {
            return Err(HarnessError::error("no other program"));
        }
        match self.get_other().await {
            None => Err(HarnessError::error(format!(
                "timed out waiting for other's {} move",
                who.as_str().to_lowercase()
            ))),
            Some(Item::Eof) => Err(HarnessError::error("game output truncated")),
            Some(Item::Line(line)) => check_move(who, &line),
        }
    }

    async fn check_output(&mut self, check: OutputCheck) -> Result<(), HarnessError> {
        let item = self
            .get()
            .await
            .ok_or_else(|| HarnessError::error("timed out waiting for output"))?;
        let line = match item {
            Item::Eof => return Err(HarnessError::error("premature end of output")),
            Item::Line(l) => l,
        };
        if line.contains("Exception") {
            return Err(HarnessError::error(format!(
                "uncaught exception occurred: {}",
                line.trim_end()
            )));
        }
        let normalized = ataxx_harness_core::normalize::normalize_output_line(&line);
        let matched = match &check {
            OutputCheck::Literal(lit) => &normalized == lit,
            OutputCheck::Regex(pat) => anchored_match(
                &Regex::new(pat).map_err(|_| HarnessError::fail(format!("bad test pattern: {pat}")))?,
                &normalized,
            ),
        };
        if matched {
            Ok(())
        } else {
            Err(HarnessError::error(format!(
                "output mismatch ({normalized} / {})",
                check.pattern_str()
            )))
        }
    }

    async fn play_self(&mut self, start: Color, end_pattern: EndPattern) -> Result<(), HarnessError> {
        let end_re = compile_end_pattern(end_pattern)?;
        let mut to_move = start;
        let mut last_raw = String::new();
        loop {
            let mv = self.get_move(to_move).await?;
            last_raw = mv.raw;
            if mv.kind == MoveKind::Terminal {
                break;
            }
            to_move = to_move.opposite();
        }
        require_end_pattern_match(&end_re, &last_raw)
    }

    async fn send_recv(
        &mut self,
        send_first: bool,
        first_mover: Color,
        end_pattern: EndPattern,
    ) -> Result<(), HarnessError> {
        let end_re = compile_end_pattern(end_pattern)?;
        let second_mover = first_mover.opposite();
        let (mut send, send_mover, recv_mover) = if send_first {
            (true, first_mover, second_mover)
        } else {
            (false, second_mover, first_mover)
        };

        let final_raw;
        loop {
            if send {
                let mv = self.get_move(send_mover).await?;
                self.send_other(Item::Line(mv.raw.clone()), false)?;
                if mv.kind == MoveKind::Terminal {
                    let other = self.get_other_move(recv_mover).await?;
                    if mv.raw != other.raw {
                        return Err(HarnessError::error("game outcomes don't agree"));
                    }
                    final_raw = mv.raw;
                    break;
                }
            }
            send = true;
            let other = self.get_other_move(recv_mover).await?;
            if other.kind == MoveKind::Terminal {
                let mv = self.get_move(send_mover).await?;
                self.send_other(Item::Line(mv.raw.clone()), false)?;
                if mv.raw != other.raw {
                    return Err(HarnessError::error("game outcomes don't agree"));
                }
                final_raw = other.raw;
                break;
            }
            self.send_to_child(Item::Line(other.raw)).await?;
        }
        require_end_pattern_match(&end_re, &final_raw)
    }

    async fn finish(&mut self) -> Result<(), HarnessError> {
        self.send_to_child(Item::Eof).await?;
        self.send_other(Item::Eof, true)?;

        match self.get().await {
            None => return Err(HarnessError::error("program did not terminate properly")),
            Some(Item::Eof) => {}
            Some(Item::Line(_)) => return Err(HarnessError::error("program produced extra output")),
        }

        match tokio::time::timeout(self.op_limit, self.wait()).await {
            Err(_) => Err(HarnessError::error("program did not terminate properly")),
            Ok(Err(_)) => Err(HarnessError::error("program did not terminate properly")),
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(_)) => Err(HarnessError::error("program terminated with error exit")),
        }
    }
}

enum OutputCheck {
    Literal(String),
    Regex(String),
}

impl OutputCheck {
    fn pattern_str(&self) -> &str {
        match self {
            OutputCheck::Literal(s) | OutputCheck::Regex(s) => s,
        }
    }
}

fn compile_end_pattern(pattern: EndPattern) -> Result<Option<Regex>, HarnessError> {
    match pattern {
        None => Ok(None),
        Some(s) => Regex::new(&s)
            .map(Some)
            .map_err(|_| HarnessError::fail(format!("bad test pattern: {s}"))),
    }
}

/// `Regex::is_match` searches anywhere in the string (Python `re.search`);
/// the commands this backs (`check_output`, `play_self`, `send_recv`) all
/// mirror `re.match`'s start-anchored semantics, so a pattern must match
/// beginning at offset 0, not merely somewhere inside the line.
fn anchored_match(re: &Regex, text: &str) -> bool {
    re.find(text).is_some_and(|m| m.start() == 0)
}

fn require_end_pattern_match(end_re: &Option<Regex>, line: &str) -> Result<(), HarnessError> {
    match end_re {
        Some(re) if !anchored_match(re, line) => Err(HarnessError::error("outcome does not match end pattern")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ataxx_harness_core::Script;

    fn script(lines: &[&str]) -> Script {
        Script::new(lines.iter().map(|s| s.to_string()).collect(), 1)
    }

    #[tokio::test]
    async fn literal_check_passes_for_matching_output() {
        let worker = Worker::new("Prog1", script(&["/bin/echo hello", "@< hello"]), false)
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        worker.run(tx).await;
        let report = rx.recv().await.unwrap();
        assert_eq!(report.message.outcome, ataxx_harness_core::Outcome::Ok);
    }

    #[tokio::test]
    async fn regex_check_passes_for_matching_output() {
        let worker = Worker::new("Prog1", script(&["/bin/echo foo123", r"@? foo\d+"]), false)
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        worker.run(tx).await;
        let report = rx.recv().await.unwrap();
        assert_eq!(report.message.outcome, ataxx_harness_core::Outcome::Ok);
    }

    #[tokio::test]
    async fn regex_check_does_not_match_mid_line() {
        let worker = Worker::new("Prog1", script(&["/bin/echo xfoo123", r"@? foo\d+"]), false)
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        worker.run(tx).await;
        let report = rx.recv().await.unwrap();
        assert_eq!(report.message.outcome, ataxx_harness_core::Outcome::Error);
        assert!(report.message.detail.unwrap().starts_with("output mismatch"));
    }

    #[tokio::test]
    async fn output_mismatch_is_an_error() {
        let worker = Worker::new("Prog1", script(&["/bin/echo hello", "@< goodbye"]), false)
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        worker.run(tx).await;
        let report = rx.recv().await.unwrap();
        assert_eq!(report.message.outcome, ataxx_harness_core::Outcome::Error);
        assert!(report.message.detail.unwrap().starts_with("output mismatch"));
    }

    #[tokio::test]
    async fn bad_directive_is_a_fail() {
        let worker = Worker::new("Prog1", script(&["/bin/echo hi", "@nonsense"]), false)
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        worker.run(tx).await;
        let report = rx.recv().await.unwrap();
        assert_eq!(report.message.outcome, ataxx_harness_core::Outcome::Fail);
        assert_eq!(report.message.detail.as_deref(), Some("bad command in script"));
    }

    #[tokio::test]
    async fn timeout_waiting_for_output_is_an_error() {
        let worker = Worker::new(
            "Prog1",
            script(&["/bin/sleep 2", "@time 0.2", "@< nothing"]),
            false,
        )
        .await
        .unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        worker.run(tx).await;
        let report = rx.recv().await.unwrap();
        assert_eq!(report.message.outcome, ataxx_harness_core::Outcome::Error);
        assert_eq!(
            report.message.detail.as_deref(),
            Some("timed out waiting for output")
        );
    }
}
