use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use dockwatch_core::runtime::{
    LogStream, LogTailer, RuntimeError, TailEvent, TailEventKind, TailHandle,
};

/// Follows container logs with `<binary> logs -f <id>`
pub struct DockerTailer {
    binary: String,
    events: mpsc::UnboundedSender<TailEvent>,
}

impl DockerTailer {
    pub fn new(binary: impl Into<String>, events: mpsc::UnboundedSender<TailEvent>) -> Self {
        Self {
            binary: binary.into(),
            events,
        }
    }
}

impl LogTailer for DockerTailer {
    fn tail(&mut self, id: &str, generation: u64) -> Result<Box<dyn TailHandle>, RuntimeError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["logs", "-f", id])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so termination reaches everything the tail spawned
        #[cfg(unix)]
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|e| RuntimeError::Tail {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        let pgid = child.id().map(|pid| pid as i32).unwrap_or(-1);

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, LogStream::Stdout, generation, &self.events));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, LogStream::Stderr, generation, &self.events));
        }

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let events = self.events.clone();
        let entity = id.to_string();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    // drain buffered output before reporting the exit
                    for reader in readers {
                        let _ = reader.await;
                    }
                    let code = status.ok().and_then(|s| s.code());
                    debug!(%entity, generation, ?code, "tail process exited");
                    let _ = events.send(TailEvent {
                        generation,
                        kind: TailEventKind::Ended { code },
                    });
                }
                _ = stop_rx => {
                    for reader in &readers {
                        reader.abort();
                    }
                    let _ = child.kill().await;
                    debug!(%entity, generation, "tail process reaped");
                }
            }
        });

        Ok(Box::new(DockerTailHandle {
            pgid,
            stop: Some(stop_tx),
        }))
    }
}

fn spawn_reader<R>(
    pipe: R,
    stream: LogStream,
    generation: u64,
    events: &mpsc::UnboundedSender<TailEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let events = events.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let event = TailEvent {
                generation,
                kind: TailEventKind::Line {
                    stream,
                    text: line.trim_end_matches('\r').to_string(),
                },
            };
            if events.send(event).is_err() {
                break;
            }
        }
    })
}

struct DockerTailHandle {
    pgid: i32,
    /// Dropping this tells the waiter task to kill and reap the child
    stop: Option<oneshot::Sender<()>>,
}

impl TailHandle for DockerTailHandle {
    fn terminate(&mut self) {
        let Some(stop) = self.stop.take() else {
            return;
        };
        #[cfg(unix)]
        if self.pgid > 0 {
            unsafe {
                libc::killpg(self.pgid, libc::SIGTERM);
            }
        }
        drop(stop);
    }
}

impl Drop for DockerTailHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_lines_then_end() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tailer = DockerTailer::new("echo", tx);
        let _handle = tailer.tail("web", 7).unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(
            first,
            TailEvent {
                generation: 7,
                kind: TailEventKind::Line {
                    stream: LogStream::Stdout,
                    text: "logs -f web".into(),
                },
            }
        );
        let last = rx.recv().await.unwrap();
        assert_eq!(last.kind, TailEventKind::Ended { code: Some(0) });
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut tailer = DockerTailer::new("/nonexistent/dockwatch-docker", tx);
        let result = tailer.tail("web", 1);
        assert!(matches!(result, Err(RuntimeError::Tail { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut tailer = DockerTailer::new("echo", tx);
        let mut handle = tailer.tail("web", 1).unwrap();
        handle.terminate();
        handle.terminate();
    }
}
