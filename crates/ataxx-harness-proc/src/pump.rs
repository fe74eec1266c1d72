//! Line Pump: merges a child's stdout and stderr into one bounded queue of
//! normalized lines, and drains a bounded queue of lines onto its stdin.

use ataxx_harness_core::limits::STDIO_QUEUE_CAPACITY;
use ataxx_harness_core::normalize::{is_fence_marker, is_interesting, normalize_output_line, strip_prefix_annotation};
use ataxx_harness_core::Item;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStderr, ChildStdin, ChildStdout};
use tokio::sync::mpsc;

/// Spawns the reader pump: a task that reads `stdout` and `stderr`
/// concurrently, normalizes and filters each line, and forwards the
/// survivors (in per-stream order) to the returned receiver. Writes
/// exactly one [`Item::Eof`] once both streams have closed, then exits.
pub fn spawn_reader_pump(
    stdout: ChildStdout,
    stderr: Option<ChildStderr>,
) -> mpsc::Receiver<Item<String>> {
    let (tx, rx) = mpsc::channel(STDIO_QUEUE_CAPACITY);
    tokio::spawn(async move {
        let mut out_lines = BufReader::new(stdout).lines();
        let mut err_lines = stderr.map(|s| BufReader::new(s).lines());
        let mut out_done = false;
        let mut err_done = err_lines.is_none();
        let mut in_fence = false;

        while !out_done || !err_done {
            tokio::select! {
                line = out_lines.next_line(), if !out_done => {
                    match line {
                        Ok(Some(raw)) => {
                            if forward_line(&raw, &mut in_fence, &tx).await.is_err() {
                                return;
                            }
                        }
                        _ => out_done = true,
                    }
                }
                line = async {
                    match err_lines.as_mut() {
                        Some(l) => l.next_line().await,
                        None => std::future::pending().await,
                    }
                }, if !err_done => {
                    match line {
                        Ok(Some(raw)) => {
                            if forward_line(&raw, &mut in_fence, &tx).await.is_err() {
                                return;
                            }
                        }
                        _ => err_done = true,
                    }
                }
            }
        }
        let _ = tx.send(Item::Eof).await;
    });
    rx
}

async fn forward_line(
    raw: &str,
    in_fence: &mut bool,
    tx: &mpsc::Sender<Item<String>>,
) -> Result<(), mpsc::error::SendError<Item<String>>> {
    // Inside a fenced block, lines pass through verbatim (no prefix-strip,
    // no space collapsing) so multi-line engine dumps survive untouched;
    // only the closing marker ends the passthrough.
    if *in_fence {
        tx.send(Item::Line(raw.to_string())).await?;
        if is_fence_marker(raw) {
            *in_fence = false;
        }
        return Ok(());
    }

    let stripped = strip_prefix_annotation(raw);
    let normalized = normalize_output_line(&stripped);

    if is_fence_marker(&normalized) {
        *in_fence = true;
        tx.send(Item::Line(normalized)).await?;
    } else if is_interesting(&normalized) {
        tx.send(Item::Line(normalized)).await?;
    }
    Ok(())
}

/// Spawns the writer pump: a task that drains lines from the returned
/// sender's channel onto `stdin`, flushing after each write, and closes
/// the stream on [`Item::Eof`].
pub fn spawn_writer_pump(mut stdin: ChildStdin) -> mpsc::Sender<Item<String>> {
    let (tx, mut rx) = mpsc::channel(STDIO_QUEUE_CAPACITY);
    tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            match item {
                Item::Line(line) => {
                    if stdin.write_all(line.as_bytes()).await.is_err() {
                        return;
                    }
                    if stdin.write_all(b"\n").await.is_err() {
                        return;
                    }
                    if stdin.flush().await.is_err() {
                        return;
                    }
                }
                Item::Eof => {
                    let _ = stdin.shutdown().await;
                    return;
                }
            }
        }
    });
    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    #[tokio::test]
    async fn reader_pump_forwards_interesting_lines_and_drops_the_rest() {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("echo 'Red moves b2-c3.'; echo 'debug: noise'; echo 'Blue wins.'")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let stdout = child.stdout.take().unwrap();
        let mut rx = spawn_reader_pump(stdout, None);

        let mut lines = Vec::new();
        while let Some(item) = rx.recv().await {
            match item {
                Item::Line(l) => lines.push(l),
                Item::Eof => break,
            }
        }
        assert_eq!(lines, vec!["Red moves b2-c3.", "Blue wins."]);
    }

    #[tokio::test]
    async fn reader_pump_passes_fenced_blocks_verbatim() {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("printf '===\\nnoise here\\nmore noise\\n===\\n'")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let stdout = child.stdout.take().unwrap();
        let mut rx = spawn_reader_pump(stdout, None);

        let mut lines = Vec::new();
        while let Some(item) = rx.recv().await {
            match item {
                Item::Line(l) => lines.push(l),
                Item::Eof => break,
            }
        }
        assert_eq!(lines, vec!["===", "noise here", "more noise", "==="]);
    }

    #[tokio::test]
    async fn writer_pump_writes_lines_then_closes_on_eof() {
        let mut child = Command::new("cat")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let stdin = child.stdin.take().unwrap();
        let tx = spawn_writer_pump(stdin);
        tx.send(Item::Line("hello".to_string())).await.unwrap();
        tx.send(Item::Eof).await.unwrap();

        let output = child.wait_with_output().await.unwrap();
        assert_eq!(String::from_utf8(output.stdout).unwrap(), "hello\n");
    }
}
