//! Background cart writer.
//!
//! Mutations hand a snapshot to the writer and return immediately. The writer
//! task coalesces queued snapshots (only the newest one is written) and runs
//! the storage call on the blocking pool. A failed write is logged; the next
//! mutation queues a fresh snapshot, which retries it.

use std::sync::Arc;

use bistro_core::CartState;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::storage::CartStorage;

enum WriteCommand {
    Save(CartState),
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task. The task exits once every handle is dropped.
#[derive(Debug, Clone)]
pub(crate) struct CartWriter {
    tx: mpsc::UnboundedSender<WriteCommand>,
}

impl CartWriter {
    /// Spawn the writer task on the current tokio runtime.
    pub(crate) fn spawn<S: CartStorage>(storage: Arc<S>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(storage, rx));
        Self { tx }
    }

    /// Queue a snapshot for writing. Never blocks.
    pub(crate) fn save(&self, cart: CartState) {
        if self.tx.send(WriteCommand::Save(cart)).is_err() {
            warn!("Cart writer has stopped; snapshot not persisted");
        }
    }

    /// Wait until every snapshot queued before this call has been handled.
    pub(crate) async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run<S: CartStorage>(storage: Arc<S>, mut rx: mpsc::UnboundedReceiver<WriteCommand>) {
    let mut acks = Vec::new();

    while let Some(command) = rx.recv().await {
        let mut latest = None;
        let mut absorb = |command: WriteCommand| match command {
            WriteCommand::Save(cart) => latest = Some(cart),
            WriteCommand::Flush(ack) => acks.push(ack),
        };

        absorb(command);
        while let Ok(queued) = rx.try_recv() {
            absorb(queued);
        }

        if let Some(cart) = latest {
            write(Arc::clone(&storage), cart).await;
        }

        for ack in acks.drain(..) {
            let _ = ack.send(());
        }
    }

    debug!("Cart writer stopped");
}

async fn write<S: CartStorage>(storage: Arc<S>, cart: CartState) {
    let lines = cart.len();
    match tokio::task::spawn_blocking(move || storage.save(&cart)).await {
        Ok(Ok(())) => debug!(lines, "Cart persisted"),
        Ok(Err(e)) => warn!(error = %e, "Failed to persist cart; will retry on next change"),
        Err(e) => warn!(error = %e, "Cart persistence task failed"),
    }
}
