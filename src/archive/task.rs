//! Running an export on a worker thread.

use log::{info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::thread;

use super::{write_archive, ArchiveOptions};
use crate::record::ImageRecord;

/// Progress reported by a running export.
#[derive(Clone, Debug, PartialEq)]
pub enum ExportEvent {
    /// One more record was added to the archive.
    Progress {
        done: usize,
        total: usize,
        path: String,
    },
    /// Every record and the manifest were written.
    Completed {
        archived: usize,
        destination: PathBuf,
    },
    Failed {
        message: String,
    },
    /// Stopped on request between two records.
    Cancelled {
        archived: usize,
    },
}

impl ExportEvent {
    /// True for the last event an export sends.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExportEvent::Progress { .. })
    }
}

/// Handle to an export running on its own thread.
///
/// The worker owns a snapshot of the records, so the caller's collection
/// may change while the export runs. Cancellation is checked between
/// records; the record being written always completes.
pub struct ExportHandle {
    events: mpsc::Receiver<ExportEvent>,
    cancel: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    finished: bool,
}

impl ExportHandle {
    /// Starts writing `records` to `destination`.
    pub fn spawn(records: Vec<ImageRecord>, destination: PathBuf, options: ArchiveOptions) -> Self {
        let (event_tx, events) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_flag = Arc::clone(&cancel);

        let worker = thread::spawn(move || {
            let event = run_export(records, destination, options, &cancel_flag, &event_tx);
            let _ = event_tx.send(event);
        });

        Self {
            events,
            cancel,
            worker: Some(worker),
            finished: false,
        }
    }

    /// Asks the worker to stop before the next record.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// True once the terminal event has been received.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the next event without blocking.
    ///
    /// A worker that went away without a terminal event is reported as
    /// [`ExportEvent::Failed`].
    pub fn try_recv(&mut self) -> Option<ExportEvent> {
        if self.finished {
            return None;
        }
        let event = match self.events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => worker_lost(),
        };
        self.observe(&event);
        Some(event)
    }

    /// Blocks until the next event. Returns `None` once the terminal event
    /// has been delivered.
    pub fn recv(&mut self) -> Option<ExportEvent> {
        if self.finished {
            return None;
        }
        let event = self.events.recv().unwrap_or_else(|_| worker_lost());
        self.observe(&event);
        Some(event)
    }

    /// Blocks until the export ends and returns its terminal event.
    pub fn wait(mut self) -> Option<ExportEvent> {
        let mut last = None;
        while let Some(event) = self.recv() {
            if event.is_terminal() {
                last = Some(event);
                break;
            }
        }
        self.join();
        last
    }

    fn observe(&mut self, event: &ExportEvent) {
        if event.is_terminal() {
            self.finished = true;
            self.join();
        }
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Export worker panicked");
            }
        }
    }
}

#[cfg(test)]
impl ExportHandle {
    /// A handle whose worker panics before sending anything.
    pub(crate) fn panicking() -> Self {
        let (event_tx, events) = mpsc::channel::<ExportEvent>();
        let worker = thread::spawn(move || {
            let _sender = event_tx;
            panic!("export worker crashed");
        });
        Self {
            events,
            cancel: Arc::new(AtomicBool::new(false)),
            worker: Some(worker),
            finished: false,
        }
    }
}

impl Drop for ExportHandle {
    fn drop(&mut self) {
        if !self.finished {
            self.cancel();
        }
    }
}

fn worker_lost() -> ExportEvent {
    warn!("Export worker exited without reporting a result");
    ExportEvent::Failed {
        message: "export worker exited unexpectedly".to_string(),
    }
}

fn run_export(
    records: Vec<ImageRecord>,
    destination: PathBuf,
    options: ArchiveOptions,
    cancel: &AtomicBool,
    event_tx: &mpsc::Sender<ExportEvent>,
) -> ExportEvent {
    let mut writer = match write_archive(&destination, records, options) {
        Ok(writer) => writer,
        Err(err) => {
            warn!("Export to {} failed: {}", destination.display(), err);
            return ExportEvent::Failed {
                message: err.to_string(),
            };
        }
    };
    let total = writer.total();
    let mut done = 0;

    loop {
        if cancel.load(Ordering::SeqCst) {
            info!(
                "Export to {} cancelled after {} of {} image(s)",
                destination.display(),
                done,
                total
            );
            return ExportEvent::Cancelled { archived: done };
        }

        match writer.next() {
            Some(Ok(record)) => {
                done += 1;
                let _ = event_tx.send(ExportEvent::Progress {
                    done,
                    total,
                    path: record.path,
                });
            }
            Some(Err(err)) => {
                warn!("Export to {} failed: {}", destination.display(), err);
                return ExportEvent::Failed {
                    message: err.to_string(),
                };
            }
            None => {
                return ExportEvent::Completed {
                    archived: done,
                    destination,
                };
            }
        }
    }
}
