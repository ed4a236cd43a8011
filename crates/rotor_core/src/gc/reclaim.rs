//! Finalization of reclaimed objects' weak-reference registries.
//!
//! The collector detaches the [`WeakRefs`] of every object it frees and hands
//! it to the [`Reclaimer`]. In [`ReclaimMode::Inline`] the registry is
//! finalized on the spot; in [`ReclaimMode::Worker`] it is sent to a
//! dedicated `rotor-reclaim` thread, so weak-collection storage sees removals
//! concurrently with the realm's own accesses.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::config::ReclaimMode;
use crate::weak::registry::WeakRefs;

enum Job {
    Finalize(Box<WeakRefs>),
    /// Acknowledged once every job queued before it has run.
    Flush(mpsc::SyncSender<()>),
}

enum Backend {
    Inline,
    Worker {
        sender: Option<mpsc::Sender<Job>>,
        handle: Option<JoinHandle<()>>,
    },
}

/// Runs registry cleanup for reclaimed objects.
pub struct Reclaimer {
    backend: Backend,
    finalized: Arc<AtomicUsize>,
}

fn finalize(mut refs: Box<WeakRefs>, finalized: &AtomicUsize) {
    debug!(token = refs.token().get(), collections = refs.len(), "finalizing weak refs");
    refs.finalize();
    finalized.fetch_add(1, Ordering::Release);
}

impl Reclaimer {
    /// Starts a reclaimer in `mode`.
    ///
    /// If the worker thread cannot be spawned the reclaimer logs a warning
    /// and finalizes inline instead.
    pub fn new(mode: ReclaimMode) -> Self {
        let finalized = Arc::new(AtomicUsize::new(0));
        let backend = match mode {
            ReclaimMode::Inline => Backend::Inline,
            ReclaimMode::Worker => Self::spawn_worker(&finalized),
        };
        Self { backend, finalized }
    }

    fn spawn_worker(finalized: &Arc<AtomicUsize>) -> Backend {
        let (sender, receiver) = mpsc::channel::<Job>();
        let counter = Arc::clone(finalized);
        let spawned = thread::Builder::new()
            .name("rotor-reclaim".to_string())
            .spawn(move || {
                debug!("reclamation worker started");
                while let Ok(job) = receiver.recv() {
                    match job {
                        Job::Finalize(refs) => finalize(refs, &counter),
                        Job::Flush(ack) => {
                            let _ = ack.send(());
                        }
                    }
                }
                debug!("reclamation worker stopped");
            });
        match spawned {
            Ok(handle) => Backend::Worker {
                sender: Some(sender),
                handle: Some(handle),
            },
            Err(err) => {
                warn!(%err, "cannot spawn reclamation worker, finalizing inline");
                Backend::Inline
            }
        }
    }

    /// The mode actually in effect.
    pub fn mode(&self) -> ReclaimMode {
        match self.backend {
            Backend::Inline => ReclaimMode::Inline,
            Backend::Worker { .. } => ReclaimMode::Worker,
        }
    }

    /// Schedules `refs` for finalization. Each registry must be dispatched
    /// at most once.
    pub fn dispatch(&self, refs: Box<WeakRefs>) {
        match &self.backend {
            Backend::Inline => finalize(refs, &self.finalized),
            Backend::Worker { sender, .. } => {
                let Some(sender) = sender else {
                    finalize(refs, &self.finalized);
                    return;
                };
                if let Err(mpsc::SendError(job)) = sender.send(Job::Finalize(refs)) {
                    warn!("reclamation worker gone, finalizing inline");
                    if let Job::Finalize(refs) = job {
                        finalize(refs, &self.finalized);
                    }
                }
            }
        }
    }

    /// Blocks until every registry dispatched before this call is finalized.
    pub fn flush(&self) {
        if let Backend::Worker {
            sender: Some(sender),
            ..
        } = &self.backend
        {
            let (ack_tx, ack_rx) = mpsc::sync_channel(1);
            if sender.send(Job::Flush(ack_tx)).is_ok() {
                let _ = ack_rx.recv();
            }
        }
    }

    /// Total number of registries finalized so far.
    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::Acquire)
    }
}

impl Drop for Reclaimer {
    fn drop(&mut self) {
        if let Backend::Worker { sender, handle } = &mut self.backend {
            // Closing the channel lets the worker drain its queue and exit.
            drop(sender.take());
            if let Some(handle) = handle.take()
                && handle.join().is_err()
            {
                warn!("reclamation worker panicked");
            }
        }
    }
}
