use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, info, warn};
use serde::Serialize;

use super::channel::{Channel, ChannelState};
use super::port::{ReadPort, WritePort};
use crate::core::errors::SimulationError;
use crate::core::types::{Bandwidth, Latency};

/// Writer side of a channel as registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriterConfig {
    pub owner: String,
    pub bandwidth: Bandwidth,
}

/// Reader side of a channel as registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReaderConfig {
    pub owner: String,
    pub latency: Latency,
}

/// One row of the channel table, as exported in topology dumps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    pub key: String,
    pub payload: &'static str,
    pub writer: Option<WriterConfig>,
    pub reader: Option<ReaderConfig>,
}

struct ChannelEntry {
    payload: &'static str,
    writer: Option<WriterConfig>,
    reader: Option<ReaderConfig>,
    channel: Rc<dyn Any>,
    state: Rc<dyn ChannelState>,
}

impl ChannelEntry {
    fn new<T: 'static>(key: &str) -> Self {
        let channel = Rc::new(Channel::<T>::new(key.to_string()));
        Self {
            payload: type_name::<T>(),
            writer: None,
            reader: None,
            channel: channel.clone(),
            state: channel,
        }
    }

    fn typed<T: 'static>(&self, key: &str) -> Result<Rc<Channel<T>>, SimulationError> {
        Rc::clone(&self.channel)
            .downcast::<Channel<T>>()
            .map_err(|_| SimulationError::TypeMismatch {
                key: key.to_string(),
                expected: self.payload,
                found: type_name::<T>(),
            })
    }
}

/// Run-wide table matching producers to consumers by key.
///
/// Channels are created lazily by whichever side registers first and are
/// never removed. Completeness is only checked by [`finalize`](Self::finalize).
pub struct ChannelRegistry {
    channels: BTreeMap<String, ChannelEntry>,
    finalized: bool,
}

impl ChannelRegistry {
    /// Empty, unfinalized registry
    pub fn new() -> Self {
        Self {
            channels: BTreeMap::new(),
            finalized: false,
        }
    }

    fn entry<T: 'static>(&mut self, key: &str) -> Result<&mut ChannelEntry, SimulationError> {
        if self.finalized {
            return Err(SimulationError::AlreadyFinalized);
        }
        let entry = self.channels.entry(key.to_string()).or_insert_with(|| {
            debug!("Created channel '{}' carrying {}", key, type_name::<T>());
            ChannelEntry::new::<T>(key)
        });
        Ok(entry)
    }

    /// Register the single producer of `key`.
    ///
    /// # Arguments
    /// * `key` - Channel name shared with the reader
    /// * `bandwidth` - Writes accepted per cycle, at least 1
    /// * `owner` - Name of the module creating the port, kept for diagnostics
    ///
    /// # Returns
    /// The write port, or `ZeroBandwidth`, `AlreadyFinalized`,
    /// `DuplicateWriter` or `TypeMismatch`
    pub fn register_writer<T: 'static>(
        &mut self,
        key: &str,
        bandwidth: Bandwidth,
        owner: &str,
    ) -> Result<WritePort<T>, SimulationError> {
        if bandwidth == 0 {
            return Err(SimulationError::ZeroBandwidth { key: key.to_string() });
        }
        let entry = self.entry::<T>(key)?;
        if entry.writer.is_some() {
            return Err(SimulationError::DuplicateWriter { key: key.to_string() });
        }
        let channel = entry.typed::<T>(key)?;
        entry.writer = Some(WriterConfig {
            owner: owner.to_string(),
            bandwidth,
        });
        debug!("Registered writer '{}' on '{}' (bandwidth {})", owner, key, bandwidth);
        Ok(WritePort::new(channel, bandwidth))
    }

    /// Register the single consumer of `key`; mirrors
    /// [`register_writer`](Self::register_writer) with a latency instead of a
    /// bandwidth
    pub fn register_reader<T: 'static>(
        &mut self,
        key: &str,
        latency: Latency,
        owner: &str,
    ) -> Result<ReadPort<T>, SimulationError> {
        let entry = self.entry::<T>(key)?;
        if entry.reader.is_some() {
            return Err(SimulationError::DuplicateReader { key: key.to_string() });
        }
        let channel = entry.typed::<T>(key)?;
        entry.reader = Some(ReaderConfig {
            owner: owner.to_string(),
            latency,
        });
        debug!("Registered reader '{}' on '{}' (latency {})", owner, key, latency);
        Ok(ReadPort::new(channel, latency))
    }

    /// Check that every key has exactly one writer and one reader, then
    /// open all channels for traffic. Must be called exactly once.
    pub fn finalize(&mut self) -> Result<(), SimulationError> {
        if self.finalized {
            return Err(SimulationError::AlreadyFinalized);
        }

        let mut unmatched = Vec::new();
        for (key, entry) in &self.channels {
            match (&entry.writer, &entry.reader) {
                (Some(_), Some(_)) => {}
                (Some(writer), None) => {
                    warn!("Channel '{}' written by '{}' has no reader", key, writer.owner);
                    unmatched.push(key.clone());
                }
                (None, Some(reader)) => {
                    warn!("Channel '{}' read by '{}' has no writer", key, reader.owner);
                    unmatched.push(key.clone());
                }
                (None, None) => unmatched.push(key.clone()),
            }
        }
        if !unmatched.is_empty() {
            return Err(SimulationError::UnmatchedChannel { keys: unmatched });
        }

        for entry in self.channels.values() {
            entry.state.connect();
        }
        self.finalized = true;
        info!("Channel registry finalized with {} channels", self.channels.len());
        Ok(())
    }

    /// Whether [`finalize`](Self::finalize) has succeeded
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of registered channel keys
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Backlog of tokens on `key`, if the key exists
    pub fn pending_tokens(&self, key: &str) -> Option<usize> {
        self.channels.get(key).map(|entry| entry.state.pending())
    }

    /// Channel table in ascending key order
    pub fn summaries(&self) -> Vec<ChannelSummary> {
        self.channels
            .iter()
            .map(|(key, entry)| ChannelSummary {
                key: key.clone(),
                payload: entry.payload,
                writer: entry.writer.clone(),
                reader: entry.reader.clone(),
            })
            .collect()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
