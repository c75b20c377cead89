//! Streaming the output of an external query command.

use std::{process::Stdio, time::Instant};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};
use tracing::{debug, warn};

use crate::pipeline::{ResultStream, ScanResult, channel};

/// Run `program` with `args` and stream each non-empty stdout line as a path.
///
/// Lines are forwarded as soon as they are read. A non-zero exit status is
/// logged once the output has been consumed; results already streamed are
/// kept.
///
/// # Errors
///
/// Returns an error if the process cannot be started.
pub fn line_command(source: &'static str, program: &str, args: &[String]) -> Result<ResultStream> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to start {program:?}"))?;

    let stdout = child
        .stdout
        .take()
        .with_context(|| format!("no stdout for {program:?}"))?;

    let (tx, rx) = channel();

    tokio::spawn(async move {
        let start = Instant::now();
        let mut lines = BufReader::new(stdout).lines();
        let mut count = 0usize;

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    if tx.send(ScanResult::new(line, source)).await.is_err() {
                        let _ = child.start_kill();
                        break;
                    }
                    count += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("[{source}] couldn't read output: {e}");
                    break;
                }
            }
        }

        match child.wait().await {
            Ok(status) if !status.success() => warn!("[{source}] command exited with {status}"),
            Err(e) => warn!("[{source}] command failed: {e}"),
            Ok(_) => {}
        }

        debug!("[{source}] {count} result(s) in {:.2?}", start.elapsed());
    });

    Ok(rx)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::pipeline::collect;

    #[tokio::test]
    async fn test_line_command_streams_lines() {
        let args = vec!["-c".to_string(), "printf '/a/x.proj\\n\\n/b/y.proj\\n'".to_string()];
        let stream = line_command("test", "sh", &args).unwrap();

        let paths: Vec<_> = collect(stream)
            .await
            .into_iter()
            .map(|r| r.path.display().to_string())
            .collect();
        assert_eq!(paths, vec!["/a/x.proj", "/b/y.proj"]);
    }

    #[tokio::test]
    async fn test_line_command_failure_keeps_output() {
        let args = vec!["-c".to_string(), "echo /a/x.proj; exit 3".to_string()];
        let stream = line_command("test", "sh", &args).unwrap();

        assert_eq!(collect(stream).await.len(), 1);
    }

    #[tokio::test]
    async fn test_line_command_missing_program() {
        assert!(line_command("test", "/no/such/program", &[]).is_err());
    }
}
