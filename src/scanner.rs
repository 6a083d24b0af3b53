//! Code scanning sessions.
//!
//! A scanner is activated for one decode at a time. [`ScanSession`] runs the
//! scanner on a background task that publishes at most one decoded text on a
//! single-consumer channel, so a second frame decoded while the first is
//! still being processed can never trigger a second check-in.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::checkin::{CheckInOutcome, CheckInService};
use crate::error::GymResult;

/// A source of decoded code text, such as a camera or a barcode reader.
#[async_trait]
pub trait CodeScanner: Send + 'static {
    /// Waits for the next decoded code.
    ///
    /// Returns `None` once the source is exhausted. Implementations must be
    /// cancel-safe: dropping the future must not lose a decoded code.
    async fn next_decode(&mut self) -> Option<String>;
}

/// Reads one code per line from an async reader.
///
/// Keyboard-wedge barcode readers type each decoded code followed by a
/// newline, so standard input works as a scanner. Blank lines are skipped.
pub struct LineScanner<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> LineScanner<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R> CodeScanner for LineScanner<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn next_decode(&mut self) -> Option<String> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(line),
                Ok(None) => return None,
                Err(e) => {
                    warn!(error = %e, "Scanner input failed");
                    return None;
                }
            }
        }
    }
}

/// One activation of a scanner.
pub struct ScanSession<S> {
    decoded: mpsc::Receiver<String>,
    cancel: CancellationToken,
    task: JoinHandle<S>,
}

impl<S: CodeScanner> ScanSession<S> {
    /// Starts scanning on a background task.
    pub fn start(scanner: S) -> Self {
        Self::start_with_token(scanner, CancellationToken::new())
    }

    /// Starts scanning; cancelling `cancel` stops the session.
    pub fn start_with_token(mut scanner: S, cancel: CancellationToken) -> Self {
        let (sender, decoded) = mpsc::channel(1);
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => debug!("Scan session cancelled"),
                text = scanner.next_decode() => match text {
                    Some(text) => {
                        // The receiver may already be gone if the session was stopped.
                        let _ = sender.send(text).await;
                    }
                    None => debug!("Scanner exhausted"),
                },
            }
            scanner
        });

        Self {
            decoded,
            cancel,
            task,
        }
    }

    /// Waits for the decoded text.
    ///
    /// Returns `None` if the session ends without a decode.
    pub async fn decoded(&mut self) -> Option<String> {
        self.decoded.recv().await
    }

    /// Stops the session and hands the scanner back.
    ///
    /// Returns `None` only if the scanning task panicked.
    pub async fn stop(self) -> Option<S> {
        self.cancel.cancel();
        drop(self.decoded);
        match self.task.await {
            Ok(scanner) => Some(scanner),
            Err(e) => {
                warn!(error = %e, "Scan task failed");
                None
            }
        }
    }
}

/// The result of one scan-and-check-in round.
pub struct ScanRound<S> {
    /// The scanner, ready for the next activation.
    pub scanner: Option<S>,
    /// The check-in result, or `None` if nothing was decoded.
    pub result: Option<GymResult<CheckInOutcome>>,
}

/// Activates `scanner` once and checks in whoever it decodes.
///
/// The scanner is stopped before the decoded text is processed. Cancelling
/// `stop` before a decode ends the round with no result and no writes.
pub async fn scan_and_check_in<S: CodeScanner>(
    service: &CheckInService,
    scanner: S,
    stop: &CancellationToken,
) -> ScanRound<S> {
    let mut session = ScanSession::start_with_token(scanner, stop.child_token());
    let decoded = session.decoded().await;
    let scanner = session.stop().await;

    let result = match decoded {
        Some(text) => Some(service.check_in_scanned(&text).await),
        None => None,
    };

    ScanRound { scanner, result }
}
