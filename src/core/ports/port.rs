use std::rc::Rc;

use log::trace;

use super::channel::Channel;
use crate::core::errors::SimulationError;
use crate::core::types::{Bandwidth, Cycle, Latency};

/// Producer end of a channel.
///
/// Enforces the per-cycle bandwidth. The port keeps no clock of its own; it
/// only counts writes issued at the most recent cycle it was given.
#[derive(Debug)]
pub struct WritePort<T> {
    channel: Rc<Channel<T>>,
    bandwidth: Bandwidth,
    last_cycle: Option<Cycle>,
    writes_in_cycle: Bandwidth,
}

impl<T> WritePort<T> {
    pub(crate) fn new(channel: Rc<Channel<T>>, bandwidth: Bandwidth) -> Self {
        Self {
            channel,
            bandwidth,
            last_cycle: None,
            writes_in_cycle: 0,
        }
    }

    /// Key of the channel this port feeds
    pub fn key(&self) -> &str {
        self.channel.key()
    }

    /// Maximum number of writes accepted within one cycle
    pub fn bandwidth(&self) -> Bandwidth {
        self.bandwidth
    }

    /// Writes still accepted at `cycle`.
    ///
    /// # Arguments
    /// * `cycle` - Cycle the caller intends to write at
    ///
    /// # Returns
    /// The unused part of the bandwidth at `cycle`, or 0 when `cycle` is
    /// earlier than the last accepted write, since `write` would reject it
    pub fn remaining_bandwidth(&self, cycle: Cycle) -> Bandwidth {
        match self.last_cycle {
            Some(last) if cycle < last => 0,
            _ => self.bandwidth.saturating_sub(self.used_at(cycle)),
        }
    }

    fn used_at(&self, cycle: Cycle) -> Bandwidth {
        if self.last_cycle == Some(cycle) {
            self.writes_in_cycle
        } else {
            0
        }
    }

    /// Enqueue `value` stamped with `cycle`.
    ///
    /// # Arguments
    /// * `value` - Payload handed to the reader
    /// * `cycle` - Current cycle; must not precede the last accepted write
    ///
    /// # Returns
    /// `NotFinalized`, `NonMonotonicCycle` or `BandwidthExceeded`. On error
    /// nothing is enqueued and the per-cycle counter is untouched.
    pub fn write(&mut self, value: T, cycle: Cycle) -> Result<(), SimulationError> {
        if !self.channel.is_connected() {
            return Err(SimulationError::NotFinalized {
                key: self.key().to_string(),
            });
        }
        if let Some(last) = self.last_cycle {
            if cycle < last {
                return Err(SimulationError::NonMonotonicCycle {
                    key: self.key().to_string(),
                    cycle,
                    last,
                });
            }
        }

        let used = self.used_at(cycle);
        if used >= self.bandwidth {
            return Err(SimulationError::BandwidthExceeded {
                key: self.key().to_string(),
                cycle,
                bandwidth: self.bandwidth,
                attempted: used.saturating_add(1),
            });
        }

        self.channel.push(value, cycle);
        self.last_cycle = Some(cycle);
        self.writes_in_cycle = used.saturating_add(1);
        trace!("[{}] write at cycle {} ({}/{})", self.key(), cycle, self.writes_in_cycle, self.bandwidth);
        Ok(())
    }
}

/// Consumer end of a channel.
///
/// Tokens become visible `latency` cycles after they were written and are
/// always served in write order.
#[derive(Debug)]
pub struct ReadPort<T> {
    channel: Rc<Channel<T>>,
    latency: Latency,
    last_cycle: Option<Cycle>,
}

impl<T> ReadPort<T> {
    pub(crate) fn new(channel: Rc<Channel<T>>, latency: Latency) -> Self {
        Self {
            channel,
            latency,
            last_cycle: None,
        }
    }

    /// Key of the channel this port drains
    pub fn key(&self) -> &str {
        self.channel.key()
    }

    /// Cycles a token waits between its write and its earliest read
    pub fn latency(&self) -> Latency {
        self.latency
    }

    /// Tokens written but not yet consumed, ready or not
    pub fn pending(&self) -> usize {
        self.channel.pending()
    }

    /// Whether the head token may be read at `cycle`. Never mutates.
    pub fn has_ready(&self, cycle: Cycle) -> bool {
        self.channel.head_ready(cycle, self.latency)
    }

    /// Remove and return the head token's value.
    ///
    /// Fails with `NotReady` when the queue is empty or its head was written
    /// less than `latency` cycles before `cycle`; the queue is left as is.
    pub fn read(&mut self, cycle: Cycle) -> Result<T, SimulationError> {
        if !self.channel.is_connected() {
            return Err(SimulationError::NotFinalized {
                key: self.key().to_string(),
            });
        }
        if let Some(last) = self.last_cycle {
            if cycle < last {
                return Err(SimulationError::NonMonotonicCycle {
                    key: self.key().to_string(),
                    cycle,
                    last,
                });
            }
        }
        self.last_cycle = Some(cycle);

        match self.channel.pop_ready(cycle, self.latency) {
            Some(token) => {
                trace!("[{}] read at cycle {} (written at {})", self.key(), cycle, token.cycle);
                Ok(token.value)
            }
            None => Err(SimulationError::NotReady {
                key: self.key().to_string(),
                cycle,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ports::channel::ChannelState;

    fn connected_pair(bandwidth: Bandwidth, latency: Latency) -> (WritePort<char>, ReadPort<char>) {
        let channel = Rc::new(Channel::new("A".to_string()));
        channel.connect();
        (
            WritePort::new(Rc::clone(&channel), bandwidth),
            ReadPort::new(channel, latency),
        )
    }

    #[test]
    fn test_bandwidth_and_latency_scenario() {
        let (mut writer, mut reader) = connected_pair(2, 3);

        assert!(writer.write('x', 5).is_ok());
        assert!(writer.write('y', 5).is_ok());
        assert!(matches!(
            writer.write('z', 5),
            Err(SimulationError::BandwidthExceeded { cycle: 5, attempted: 3, .. })
        ));
        assert_eq!(reader.pending(), 2);

        assert!(!reader.has_ready(6));
        assert!(!reader.has_ready(7));
        assert!(reader.has_ready(8));

        assert_eq!(reader.read(8), Ok('x'));
        assert_eq!(reader.read(8), Ok('y'));
        assert!(matches!(reader.read(8), Err(SimulationError::NotReady { cycle: 8, .. })));
    }

    #[test]
    fn test_counter_resets_on_new_cycle() {
        let (mut writer, _reader) = connected_pair(1, 1);
        assert!(writer.write('a', 1).is_ok());
        assert_eq!(writer.remaining_bandwidth(1), 0);
        assert_eq!(writer.remaining_bandwidth(2), 1);
        assert!(writer.write('b', 2).is_ok());
        assert!(writer.write('c', 2).is_err());
    }

    #[test]
    fn test_rejected_write_leaves_queue_untouched() {
        let (mut writer, reader) = connected_pair(1, 0);
        writer.write('a', 3).unwrap();
        assert!(writer.write('b', 3).is_err());
        assert_eq!(reader.pending(), 1);
    }

    #[test]
    fn test_write_before_earlier_cycle_is_rejected() {
        let (mut writer, reader) = connected_pair(4, 0);
        writer.write('a', 10).unwrap();
        assert_eq!(
            writer.write('b', 9),
            Err(SimulationError::NonMonotonicCycle {
                key: "A".to_string(),
                cycle: 9,
                last: 10,
            })
        );
        assert_eq!(reader.pending(), 1);
    }

    #[test]
    fn test_remaining_bandwidth_before_last_write_is_zero() {
        let (mut writer, _reader) = connected_pair(3, 0);
        writer.write('a', 10).unwrap();
        assert_eq!(writer.remaining_bandwidth(9), 0);
        assert_eq!(writer.remaining_bandwidth(10), 2);
        assert_eq!(writer.remaining_bandwidth(11), 3);
        assert!(writer.write('b', 9).is_err());
    }

    #[test]
    fn test_maximum_bandwidth_counts_without_overflow() {
        let (mut writer, reader) = connected_pair(Bandwidth::MAX, 0);
        writer.write('a', 0).unwrap();
        writer.write('b', 0).unwrap();
        assert_eq!(writer.remaining_bandwidth(0), Bandwidth::MAX - 2);
        assert_eq!(reader.pending(), 2);

        writer.writes_in_cycle = Bandwidth::MAX;
        assert_eq!(writer.remaining_bandwidth(0), 0);
        assert!(matches!(
            writer.write('c', 0),
            Err(SimulationError::BandwidthExceeded { attempted: Bandwidth::MAX, .. })
        ));
    }

    #[test]
    fn test_has_ready_is_pure() {
        let (mut writer, reader) = connected_pair(1, 2);
        writer.write('a', 0).unwrap();
        for _ in 0..3 {
            assert!(reader.has_ready(2));
        }
        assert_eq!(reader.pending(), 1);
    }

    #[test]
    fn test_unconnected_channel_rejects_io() {
        let channel = Rc::new(Channel::new("B".to_string()));
        let mut writer = WritePort::new(Rc::clone(&channel), 1);
        let mut reader = ReadPort::new(channel, 0);
        assert!(matches!(writer.write(1u8, 0), Err(SimulationError::NotFinalized { .. })));
        assert!(matches!(reader.read(0), Err(SimulationError::NotFinalized { .. })));
    }
}
