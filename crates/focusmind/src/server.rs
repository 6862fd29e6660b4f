//! Stdio server
//!
//! One JSON request per line in, one JSON response per line out. Each
//! request runs on its own task, so responses may come back out of order;
//! a `requestId` on the request is copied onto its response. Messages the
//! browser sends to tabs share the output stream.
//!
//! A line that is not UTF-8 or not JSON gets a `Parse error` response and
//! serving continues; only an I/O error on the input ends the loop.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::command::CommandResult;
use crate::router::CommandRouter;

const REQUEST_ID: &str = "requestId";

pub struct Server {
    router: Arc<CommandRouter>,
    outbox: mpsc::UnboundedSender<Value>,
    lines: mpsc::UnboundedReceiver<Value>,
}

impl Server {
    /// `outbox` and `lines` are the two ends of the output channel; hand
    /// clones of `outbox` to anything else that writes output lines.
    pub fn new(
        router: Arc<CommandRouter>,
        outbox: mpsc::UnboundedSender<Value>,
        lines: mpsc::UnboundedReceiver<Value>,
    ) -> Self {
        Self { router, outbox, lines }
    }

    /// Serve stdin/stdout until stdin closes
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.run_with(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve `reader` until EOF, then finish in-flight requests
    pub async fn run_with<R, W>(&mut self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut input = BufReader::new(reader);
        // Partial reads stay in `buf` across select iterations
        let mut buf = Vec::new();
        let mut tasks = JoinSet::new();
        let mut reading = true;

        loop {
            tokio::select! {
                read = input.read_until(b'\n', &mut buf), if reading => {
                    if read? == 0 {
                        info!("Input closed");
                        reading = false;
                    } else {
                        match String::from_utf8(std::mem::take(&mut buf)) {
                            Ok(line) => {
                                let line = line.trim();
                                if !line.is_empty() {
                                    debug!("Received: {}", line);
                                    tasks.spawn(handle_line(self.router.clone(), self.outbox.clone(), line.to_string()));
                                }
                            }
                            Err(e) => {
                                error!("Failed to decode request: {}", e);
                                let _ = self.outbox.send(json!({ "error": format!("Parse error: {}", e) }));
                            }
                        }
                    }
                }
                Some(joined) = tasks.join_next() => {
                    if let Err(e) = joined {
                        error!("Request task failed: {}", e);
                    }
                }
                Some(value) = self.lines.recv() => write_line(&mut writer, &value).await?,
            }

            if !reading && tasks.is_empty() {
                break;
            }
        }

        while let Ok(value) = self.lines.try_recv() {
            write_line(&mut writer, &value).await?;
        }
        Ok(())
    }
}

/// Parse and dispatch one line, queueing its response
async fn handle_line(router: Arc<CommandRouter>, outbox: mpsc::UnboundedSender<Value>, line: String) {
    let response = match serde_json::from_str::<Value>(&line) {
        Ok(request) => {
            let request_id = request.get(REQUEST_ID).cloned();

            // A panicking handler becomes an error response, not a lost request
            let dispatched = tokio::spawn(async move { router.dispatch(&request).await }).await;
            let result = dispatched.unwrap_or_else(|e| {
                error!("Handler panicked: {}", e);
                CommandResult::error("Internal error")
            });

            let mut response = result.into_value();
            if let (Some(id), Value::Object(fields)) = (request_id, &mut response) {
                fields.insert(REQUEST_ID.to_string(), id);
            }
            response
        }
        Err(e) => {
            error!("Failed to parse request: {}", e);
            json!({ "error": format!("Parse error: {}", e) })
        }
    };

    if outbox.send(response).is_err() {
        error!("Output closed before response was written");
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, value: &Value) -> anyhow::Result<()> {
    let line = serde_json::to_string(value)?;
    debug!("Sending: {}", line);
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
