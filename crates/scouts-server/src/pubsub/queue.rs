use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

/// A FIFO queue with unbounded capacity between a bounded input endpoint and
/// a bounded output endpoint.
///
/// A background mover forwards items from the input to the output, spilling
/// into an overflow list whenever the consumer is not ready, so pushes
/// return promptly no matter how slow the consumer is. Items arrive on the
/// output in exact push order.
pub struct ConcurrentQueue<T> {
    id: u64,
    in_tx: Mutex<Option<mpsc::Sender<T>>>,
    mover: Mutex<Option<MoverParts<T>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    quit: CancellationToken,
}

struct MoverParts<T> {
    in_rx: mpsc::Receiver<T>,
    out_tx: mpsc::Sender<T>,
}

impl<T: Send + 'static> ConcurrentQueue<T> {
    /// Create a queue and its output endpoint.
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<T>) {
        let (in_tx, in_rx) = mpsc::channel(1);
        let (out_tx, out_rx) = mpsc::channel(1);
        let queue = Self {
            id: NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed),
            in_tx: Mutex::new(Some(in_tx)),
            mover: Mutex::new(Some(MoverParts { in_rx, out_tx })),
            task: Mutex::new(None),
            quit: CancellationToken::new(),
        };
        (queue, out_rx)
    }

    /// Identity of this queue, used to key subscriber registries.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Launch the background mover. Idempotent; must be called before the
    /// queue is used.
    pub fn start(&self) {
        let Some(parts) = self.mover.lock().take() else {
            return;
        };
        let quit = self.quit.clone();
        let handle = tokio::spawn(run_mover(parts.in_rx, parts.out_tx, quit));
        *self.task.lock() = Some(handle);
    }

    /// Push an item. Returns false if the queue has been closed or stopped.
    pub async fn push(&self, item: T) -> bool {
        let tx = self.in_tx.lock().clone();
        match tx {
            Some(tx) => tx.send(item).await.is_ok(),
            None => false,
        }
    }

    /// Close the input. The mover drains buffered items to the output, then
    /// closes the output.
    pub fn close(&self) {
        self.in_tx.lock().take();
    }

    /// Interrupt the mover immediately, dropping buffered items, and wait
    /// for it to exit.
    pub async fn stop(&self) {
        self.quit.cancel();
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

async fn run_mover<T>(
    mut in_rx: mpsc::Receiver<T>,
    out_tx: mpsc::Sender<T>,
    quit: CancellationToken,
) {
    let mut overflow: VecDeque<T> = VecDeque::new();

    loop {
        if overflow.is_empty() {
            tokio::select! {
                _ = quit.cancelled() => return,
                item = in_rx.recv() => match item {
                    None => break,
                    // Forward directly when the output has room, otherwise
                    // spill into the overflow list.
                    Some(item) => match out_tx.try_send(item) {
                        Ok(()) => {}
                        Err(TrySendError::Full(item)) => overflow.push_back(item),
                        Err(TrySendError::Closed(_)) => return,
                    },
                }
            }
        } else {
            // New arrivals go to the back to preserve order while the head
            // of the overflow races to reach the output.
            tokio::select! {
                _ = quit.cancelled() => return,
                item = in_rx.recv() => match item {
                    None => break,
                    Some(item) => overflow.push_back(item),
                },
                permit = out_tx.reserve() => match permit {
                    Ok(permit) => {
                        if let Some(item) = overflow.pop_front() {
                            permit.send(item);
                        }
                    }
                    Err(_) => return,
                }
            }
        }
    }

    // Input closed: drain the overflow, then drop the output sender so the
    // consumer sees the end of the stream.
    while !overflow.is_empty() {
        tokio::select! {
            _ = quit.cancelled() => return,
            permit = out_tx.reserve() => match permit {
                Ok(permit) => {
                    if let Some(item) = overflow.pop_front() {
                        permit.send(item);
                    }
                }
                Err(_) => return,
            }
        }
    }
}
