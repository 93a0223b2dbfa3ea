use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::str::FromStr;

use log::{debug, info};
use serde::Serialize;

use crate::core::errors::{ExportError, SimulationError};
use crate::core::types::{Cycle, SequenceId};

/// The closed set of pipeline phases a trace event may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Fetch,
    Decode,
    Execute,
    Memory,
    Writeback,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Fetch,
        Stage::Decode,
        Stage::Execute,
        Stage::Memory,
        Stage::Writeback,
    ];

    /// Position of the stage in the pipeline, starting at 0 for `Fetch`
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// Name as written in trace files and accepted by `record`
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Fetch => "Fetch",
            Stage::Decode => "Decode",
            Stage::Execute => "Execute",
            Stage::Memory => "Memory",
            Stage::Writeback => "Writeback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| format!("unknown stage '{}'", s))
    }
}

/// One stage visit of a unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageEvent {
    pub ordinal: u8,
    pub name: &'static str,
    pub cycle: Cycle,
}

impl StageEvent {
    fn new(stage: Stage, cycle: Cycle) -> Self {
        Self {
            ordinal: stage.ordinal(),
            name: stage.name(),
            cycle,
        }
    }
}

/// Execution history of one sequence id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRecord {
    pub id: SequenceId,
    pub label: String,
    pub stages: Vec<StageEvent>,
}

/// Run-scoped table of stage events keyed by sequence id.
///
/// Created at run start and handed to whichever modules trace their work;
/// nothing here is global.
#[derive(Debug, Default)]
pub struct EventTraceRecorder {
    records: BTreeMap<SequenceId, TraceRecord>,
}

impl EventTraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `stage` at `cycle` to the history of `seq_id`.
    ///
    /// # Arguments
    /// * `seq_id` - Unit of work, usually an instruction sequence number
    /// * `label` - Human-readable description, kept from the first event only
    /// * `stage` - Stage name, one of `Fetch`, `Decode`, `Execute`, `Memory`
    ///   or `Writeback`
    /// * `cycle` - Cycle of the visit
    ///
    /// # Returns
    /// `UnknownStage` for any other stage name; nothing is recorded then
    pub fn record(
        &mut self,
        seq_id: SequenceId,
        label: &str,
        stage: &str,
        cycle: Cycle,
    ) -> Result<(), SimulationError> {
        let stage = stage.parse::<Stage>().map_err(|_| SimulationError::UnknownStage {
            seq_id,
            stage: stage.to_string(),
        })?;
        self.record_stage(seq_id, label, stage, cycle);
        Ok(())
    }

    /// Typed form of [`record`](Self::record), which cannot fail
    pub fn record_stage(&mut self, seq_id: SequenceId, label: &str, stage: Stage, cycle: Cycle) {
        let record = self.records.entry(seq_id).or_insert_with(|| TraceRecord {
            id: seq_id,
            label: label.to_string(),
            stages: Vec::new(),
        });
        record.stages.push(StageEvent::new(stage, cycle));
        debug!("Trace {} '{}': {} at cycle {}", seq_id, record.label, stage, cycle);
    }

    /// All records in ascending id order, events in recorded order
    pub fn export(&self) -> Vec<TraceRecord> {
        self.records.values().cloned().collect()
    }

    /// History of `seq_id`, if any event was recorded for it
    pub fn get(&self, seq_id: SequenceId) -> Option<&TraceRecord> {
        self.records.get(&seq_id)
    }

    /// Number of distinct sequence ids recorded
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the exported records as JSON; an empty destination is a no-op
    pub fn write_file(&self, destination: &str) -> Result<(), ExportError> {
        if destination.is_empty() {
            return Ok(());
        }
        let writer = BufWriter::new(File::create(destination)?);
        serde_json::to_writer(writer, &self.export())?;
        info!("Trace of {} records written to {}", self.records.len(), destination);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordinals() {
        let ordinals: Vec<u8> = Stage::ALL.iter().map(Stage::ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
        assert_eq!("Memory".parse::<Stage>(), Ok(Stage::Memory));
        assert!("memory".parse::<Stage>().is_err());
    }

    #[test]
    fn test_label_is_captured_once() {
        let mut recorder = EventTraceRecorder::new();
        recorder.record(7, "add $t0, $t1, $t2", "Fetch", 1).unwrap();
        recorder.record(7, "something else", "Decode", 2).unwrap();

        let record = recorder.get(7).unwrap();
        assert_eq!(record.label, "add $t0, $t1, $t2");
        assert_eq!(record.stages.len(), 2);
    }

    #[test]
    fn test_unknown_stage_is_fatal() {
        let mut recorder = EventTraceRecorder::new();
        assert_eq!(
            recorder.record(3, "nop", "Retire", 9),
            Err(SimulationError::UnknownStage { seq_id: 3, stage: "Retire".to_string() })
        );
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_export_orders_ids_and_keeps_events() {
        let mut recorder = EventTraceRecorder::new();
        recorder.record_stage(20, "b", Stage::Fetch, 2);
        recorder.record_stage(10, "a", Stage::Fetch, 1);
        recorder.record_stage(10, "a", Stage::Execute, 4);
        recorder.record_stage(10, "a", Stage::Decode, 3);
        recorder.record_stage(10, "a", Stage::Decode, 3);

        let records = recorder.export();
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![10, 20]);
        let stages: Vec<&str> = records[0].stages.iter().map(|e| e.name).collect();
        assert_eq!(stages, vec!["Fetch", "Execute", "Decode", "Decode"]);

        // export is pure
        assert_eq!(recorder.export(), records);
    }

    #[test]
    fn test_export_json_schema() {
        let mut recorder = EventTraceRecorder::new();
        recorder.record_stage(1, "lw", Stage::Writeback, 12);
        let value = serde_json::to_value(recorder.export()).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["label"], "lw");
        assert_eq!(value[0]["stages"][0]["ordinal"], 4);
        assert_eq!(value[0]["stages"][0]["name"], "Writeback");
        assert_eq!(value[0]["stages"][0]["cycle"], 12);
    }

    #[test]
    fn test_empty_destination_is_noop() {
        let recorder = EventTraceRecorder::new();
        assert!(recorder.write_file("").is_ok());
    }
}
