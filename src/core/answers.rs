use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Lines typed by the user, produced by a single background reader.
///
/// The channel holds at most one line, so the reader never runs far ahead of
/// the problem currently on screen.
pub struct AnswerFeed {
    rx: mpsc::Receiver<String>,
    task: Option<JoinHandle<()>>,
}

impl AnswerFeed {
    /// Spawns a tokio task that owns `reader` until it reaches end of input.
    pub fn spawn<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!("Answer input reached end of stream");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read answer input: {}", e);
                        break;
                    }
                }
            }
        });

        Self {
            rx,
            task: Some(task),
        }
    }

    /// Reads process stdin on a dedicated thread.
    ///
    /// Blocking stdin reads cannot be cancelled, so they stay off the runtime's
    /// blocking pool where they would hold up shutdown.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(1);
        std::thread::spawn(move || {
            use std::io::BufRead;

            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read answer input: {}", e);
                        return;
                    }
                }
            }
            tracing::debug!("Answer input reached end of stream");
        });

        Self { rx, task: None }
    }

    /// Next submitted line, or `None` once the input is closed.
    pub async fn next_answer(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl Drop for AnswerFeed {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
