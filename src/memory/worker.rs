//! Background execution of scan sessions
//!
//! The session lives on a blocking task; callers talk to it through a
//! command channel and receive results as [`ScanEvent`]s, so a display
//! layer never blocks on a scan.

use super::cancel::CancelFlag;
use super::scanner::ScanSession;
use crate::core::types::{
    Address, DataType, MemoryError, MemoryResult, ResultRow, ScanValue, VerifiedValue,
};
use crate::process::ProcessMemory;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Requests accepted by a [`ScanWorker`]
#[derive(Debug, Clone, PartialEq)]
pub enum ScanCommand {
    FirstScan(ScanValue),
    NextScan(ScanValue),
    Modify { address: Address, value: ScanValue },
    SetDataType(DataType),
    Reset,
}

/// Which kind of round produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundKind {
    First,
    Next,
}

/// Outcomes reported back by a [`ScanWorker`]
#[derive(Debug)]
pub enum ScanEvent {
    /// A round finished; `rows` holds at most the worker's row limit
    Scanned {
        round: RoundKind,
        count: usize,
        rows: Vec<ResultRow>,
    },
    Modified(VerifiedValue),
    Reset { data_type: DataType },
    Cancelled,
    Failed(MemoryError),
    Closed,
}

/// Handle to a session running on a background task
pub struct ScanWorker {
    commands: mpsc::UnboundedSender<ScanCommand>,
    cancel: CancelFlag,
    busy: Arc<AtomicBool>,
    stopping: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ScanWorker {
    /// Move `session` onto a blocking task.
    ///
    /// Must be called from within a tokio runtime. At most `row_limit` rows
    /// are attached to each `Scanned` event.
    pub fn spawn<H>(
        session: ScanSession<H>,
        row_limit: usize,
    ) -> (Self, mpsc::UnboundedReceiver<ScanEvent>)
    where
        H: ProcessMemory + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let cancel = CancelFlag::new();
        let busy = Arc::new(AtomicBool::new(false));
        let stopping = Arc::new(AtomicBool::new(false));
        let context = RunContext {
            cancel: cancel.clone(),
            busy: Arc::clone(&busy),
            stopping: Arc::clone(&stopping),
            row_limit,
        };

        let task = tokio::task::spawn_blocking(move || {
            run(session, command_rx, event_tx, context);
        });

        (
            ScanWorker {
                commands: command_tx,
                cancel,
                busy,
                stopping,
                task,
            },
            event_rx,
        )
    }

    /// Queue a command
    pub fn send(&self, command: ScanCommand) -> MemoryResult<()> {
        self.commands
            .send(command)
            .map_err(|_| MemoryError::WorkerStopped)
    }

    /// Abort the command that is currently running, if any
    pub fn cancel(&self) {
        if self.is_busy() {
            self.cancel.cancel();
        }
    }

    /// Whether a command is being executed right now
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Stop accepting commands, finish queued ones and close the session
    pub async fn shutdown(self) -> MemoryResult<()> {
        drop(self.commands);
        self.task.await.map_err(|_| MemoryError::WorkerStopped)
    }

    /// Abort the running command, drop queued ones and close the session
    pub async fn close(self) -> MemoryResult<()> {
        self.stopping.store(true, Ordering::SeqCst);
        self.cancel.cancel();
        self.shutdown().await
    }
}

struct RunContext {
    cancel: CancelFlag,
    busy: Arc<AtomicBool>,
    stopping: Arc<AtomicBool>,
    row_limit: usize,
}

fn run<H: ProcessMemory>(
    mut session: ScanSession<H>,
    mut commands: mpsc::UnboundedReceiver<ScanCommand>,
    events: mpsc::UnboundedSender<ScanEvent>,
    context: RunContext,
) {
    let RunContext {
        cancel,
        busy,
        stopping,
        row_limit,
    } = context;

    while let Some(command) = commands.blocking_recv() {
        if stopping.load(Ordering::SeqCst) {
            debug!(?command, "worker closing, dropping queued command");
            continue;
        }
        debug!(?command, "worker received command");
        cancel.reset();
        busy.store(true, Ordering::SeqCst);
        // close() may have raised the cancel flag before the reset
        if stopping.load(Ordering::SeqCst) {
            busy.store(false, Ordering::SeqCst);
            debug!(?command, "worker closing, dropping queued command");
            continue;
        }

        let event = match command {
            ScanCommand::FirstScan(value) => {
                let result = session.first_scan_with_cancel(value, &cancel);
                round_event(&session, RoundKind::First, result, row_limit)
            }
            ScanCommand::NextScan(value) => {
                let result = session.next_scan_with_cancel(value, &cancel);
                round_event(&session, RoundKind::Next, result, row_limit)
            }
            ScanCommand::Modify { address, value } => match session.modify(address, value) {
                Ok(verified) => ScanEvent::Modified(verified),
                Err(e) => ScanEvent::Failed(e),
            },
            ScanCommand::SetDataType(data_type) => {
                session.set_data_type(data_type);
                session.reset();
                ScanEvent::Reset { data_type }
            }
            ScanCommand::Reset => {
                session.reset();
                ScanEvent::Reset {
                    data_type: session.data_type(),
                }
            }
        };
        busy.store(false, Ordering::SeqCst);

        if events.send(event).is_err() {
            debug!("event receiver dropped, stopping worker");
            break;
        }
    }

    session.close();
    let _ = events.send(ScanEvent::Closed);
}

fn round_event<H: ProcessMemory>(
    session: &ScanSession<H>,
    round: RoundKind,
    result: MemoryResult<usize>,
    row_limit: usize,
) -> ScanEvent {
    match result {
        Ok(count) => ScanEvent::Scanned {
            round,
            count,
            rows: session
                .candidates()
                .iter()
                .take(row_limit)
                .map(|c| c.to_row())
                .collect(),
        },
        Err(MemoryError::Cancelled) => ScanEvent::Cancelled,
        Err(e) => ScanEvent::Failed(e),
    }
}
