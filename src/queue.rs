//! The bounded queue connecting the Reader thread to the Processor's
//! dispatcher pool.
//!
//! Backed by `crossbeam_channel::bounded`, which gives us exactly the
//! blocking put/take semantics the pipeline wants: the Reader blocks once
//! the queue is full instead of racing ahead of the dispatcher pool, and
//! workers block on an empty queue instead of busy-polling.

use crate::vcf::Batch;

/// Producing half of the batch queue. Dropping the last `BatchSender` closes
/// the channel, which is how consumers learn the stream has ended.
#[derive(Clone)]
pub struct BatchSender {
    inner: crossbeam_channel::Sender<Batch>,
}

impl BatchSender {
    /// Block until there is room, then enqueue a batch.
    ///
    /// Returns `Err` only if every receiver has already been dropped, which
    /// does not happen during normal operation (the processor section holds
    /// receivers open for the whole run).
    pub fn put(&self, batch: Batch) -> Result<(), Batch> {
        self.inner.send(batch).map_err(|e| e.into_inner())
    }
}

/// Consuming half of the batch queue, cloned once per dispatcher worker.
#[derive(Clone)]
pub struct BatchReceiver {
    inner: crossbeam_channel::Receiver<Batch>,
}

impl BatchReceiver {
    /// Block until a batch is available, or return `None` once the queue is
    /// both empty and closed (every `BatchSender` dropped): end of stream.
    pub fn take(&self) -> Option<Batch> {
        self.inner.recv().ok()
    }
}

/// Create a batch queue bounded to hold at most `capacity` batches at once.
///
/// `capacity` bounds how far the Reader can run ahead of the dispatcher
/// pool, which in turn bounds peak memory use.
pub fn channel(capacity: usize) -> (BatchSender, BatchReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (BatchSender { inner: tx }, BatchReceiver { inner: rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcf::VcfRecord;

    fn dummy_batch(n: usize) -> Batch {
        (0..n)
            .map(|i| VcfRecord {
                chromosome: "1".to_string(),
                position: i as u64,
                id: ".".to_string(),
                reference: "A".to_string(),
                alternate: "G".to_string(),
                quality: None,
                filter: ".".to_string(),
                info: ".".to_string(),
                raw_line: String::new(),
            })
            .collect()
    }

    #[test]
    fn put_then_take_round_trips() {
        let (tx, rx) = channel(2);
        tx.put(dummy_batch(3)).unwrap();
        let batch = rx.take().unwrap();
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn take_returns_none_after_all_senders_dropped() {
        let (tx, rx) = channel(1);
        drop(tx);
        assert!(rx.take().is_none());
    }

    #[test]
    fn multiple_receivers_share_the_work() {
        let (tx, rx) = channel(4);
        for i in 0..4 {
            tx.put(dummy_batch(i + 1)).unwrap();
        }
        drop(tx);

        let rx2 = rx.clone();
        let mut total = 0;
        while let Some(batch) = rx.take() {
            total += batch.len();
        }
        while let Some(batch) = rx2.take() {
            total += batch.len();
        }
        assert_eq!(total, 1 + 2 + 3 + 4);
    }
}
