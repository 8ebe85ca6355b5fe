//! Change notification over crossbeam channels.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Subscriber list. Each subscriber gets its own channel; subscribers whose
/// receiver has been dropped are pruned on the next publish.
pub struct Observers<T> {
    senders: Vec<Sender<T>>,
}

impl<T: Clone> Observers<T> {
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = unbounded();
        self.senders.push(tx);
        rx
    }

    /// Send `value` to every live subscriber. Never blocks.
    pub fn publish(&mut self, value: T) {
        self.senders.retain(|tx| tx.send(value.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl<T: Clone> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.senders.len())
            .finish()
    }
}
