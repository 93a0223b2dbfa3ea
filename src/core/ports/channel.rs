use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::core::types::{Cycle, Latency};

/// A value in flight on a channel, stamped with the cycle it was written at
#[derive(Debug, Clone, PartialEq)]
pub struct Token<T> {
    pub value: T,
    pub cycle: Cycle,
}

/// Pending-token FIFO shared by exactly one write port and one read port.
///
/// The registry keeps the channel alive for the whole run; ports only hold
/// a reference to it.
#[derive(Debug)]
pub struct Channel<T> {
    key: String,
    tokens: RefCell<VecDeque<Token<T>>>,
    connected: Cell<bool>,
}

impl<T> Channel<T> {
    pub(crate) fn new(key: String) -> Self {
        Self {
            key,
            tokens: RefCell::new(VecDeque::new()),
            connected: Cell::new(false),
        }
    }

    /// Name under which the channel is registered
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the registry has been finalized with this channel matched
    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub(crate) fn push(&self, value: T, cycle: Cycle) {
        self.tokens.borrow_mut().push_back(Token { value, cycle });
    }

    /// True iff the head token is at least `latency` cycles old at `cycle`
    pub(crate) fn head_ready(&self, cycle: Cycle, latency: Latency) -> bool {
        self.tokens
            .borrow()
            .front()
            .and_then(|head| cycle.checked_sub(head.cycle))
            .map_or(false, |age| age >= latency)
    }

    pub(crate) fn pop_ready(&self, cycle: Cycle, latency: Latency) -> Option<Token<T>> {
        if self.head_ready(cycle, latency) {
            self.tokens.borrow_mut().pop_front()
        } else {
            None
        }
    }

    /// Tokens queued, whether or not they are ready
    pub fn pending(&self) -> usize {
        self.tokens.borrow().len()
    }
}

/// Type-erased view of a channel used by the registry
pub(crate) trait ChannelState {
    fn connect(&self);
    fn pending(&self) -> usize;
}

impl<T: 'static> ChannelState for Channel<T> {
    fn connect(&self) {
        self.connected.set(true);
    }

    fn pending(&self) -> usize {
        Channel::pending(self)
    }
}
