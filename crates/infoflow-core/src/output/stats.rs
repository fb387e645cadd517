//! Statistics Output
//!
//! Records per-step metrics and optional citizen snapshots, and writes them
//! out as JSON lines.

use bevy_ecs::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use infoflow_events::{CitizenSnapshot, StepMetrics};

use crate::components::citizen::ReceiveOutcome;

/// Resource: What the metrics collector measures besides the basics.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct MetricsSettings {
    pub opinion_cluster_threshold: f64,
    pub ground_truth: Option<f64>,
    pub track_agents: bool,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            opinion_cluster_threshold: 0.1,
            ground_truth: None,
            track_agents: false,
        }
    }
}

/// Resource: Content flow counters for the step in progress.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepTally {
    pub accepted: u32,
    pub rejected: u32,
    pub duplicates: u32,
    /// Citizens that reshared an item to at least one neighbor
    pub shares: u32,
}

impl StepTally {
    pub fn record(&mut self, outcome: &ReceiveOutcome) {
        match outcome {
            ReceiveOutcome::Accepted { .. } => self.accepted += 1,
            ReceiveOutcome::Rejected => self.rejected += 1,
            ReceiveOutcome::Duplicate => self.duplicates += 1,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Resource: Every recorded step, starting with the initial state at step 0.
#[derive(Resource, Debug, Default)]
pub struct MetricsHistory {
    steps: Vec<StepMetrics>,
    snapshots: Vec<CitizenSnapshot>,
}

impl MetricsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, metrics: StepMetrics) {
        self.steps.push(metrics);
    }

    pub fn record_snapshots(&mut self, snapshots: impl IntoIterator<Item = CitizenSnapshot>) {
        self.snapshots.extend(snapshots);
    }

    pub fn steps(&self) -> &[StepMetrics] {
        &self.steps
    }

    pub fn latest(&self) -> Option<&StepMetrics> {
        self.steps.last()
    }

    pub fn first(&self) -> Option<&StepMetrics> {
        self.steps.first()
    }

    /// Tracked citizen snapshots in step, then id, order.
    pub fn snapshots(&self) -> &[CitizenSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of accepted deliveries over all recorded steps.
    pub fn total_accepted(&self) -> u64 {
        self.steps.iter().map(|m| u64::from(m.accepted)).sum()
    }

    /// Sum of published items over all recorded steps.
    pub fn total_published(&self) -> u64 {
        self.steps.iter().map(|m| u64::from(m.total_published())).sum()
    }
}

/// Write metrics as one JSON object per line.
pub fn write_metrics_jsonl<W: Write>(metrics: &[StepMetrics], writer: W) -> std::io::Result<()> {
    let mut writer = BufWriter::new(writer);
    for record in metrics {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Write metrics to a JSON lines file, replacing any existing file.
pub fn write_metrics_file(metrics: &[StepMetrics], path: impl AsRef<Path>) -> std::io::Result<()> {
    let file = File::create(path)?;
    write_metrics_jsonl(metrics, file)
}

/// Write citizen snapshots to a JSON lines file.
pub fn write_snapshots_file(
    snapshots: &[CitizenSnapshot],
    path: impl AsRef<Path>,
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for snapshot in snapshots {
        serde_json::to_writer(&mut writer, snapshot)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_records_outcomes() {
        let mut tally = StepTally::default();
        tally.record(&ReceiveOutcome::Rejected);
        tally.record(&ReceiveOutcome::Duplicate);
        tally.record(&ReceiveOutcome::Accepted {
            perceived_accuracy: 0.8,
            belief_delta: 0.05,
        });
        tally.record(&ReceiveOutcome::Accepted {
            perceived_accuracy: 0.6,
            belief_delta: 0.01,
        });
        assert_eq!(tally.accepted, 2);
        assert_eq!(tally.rejected, 1);
        assert_eq!(tally.duplicates, 1);

        tally.reset();
        assert_eq!(tally, StepTally::default());
    }

    #[test]
    fn test_history_totals() {
        let mut history = MetricsHistory::new();
        assert!(history.is_empty());

        let mut a = StepMetrics::empty(0);
        a.accepted = 3;
        let mut b = StepMetrics::empty(1);
        b.accepted = 4;
        b.content_published.insert(infoflow_events::SourceType::Corporate, 2);
        history.record(a);
        history.record(b);

        assert_eq!(history.len(), 2);
        assert_eq!(history.total_accepted(), 7);
        assert_eq!(history.total_published(), 2);
        assert_eq!(history.latest().map(|m| m.step), Some(1));
        assert_eq!(history.first().map(|m| m.step), Some(0));
    }

    #[test]
    fn test_jsonl_has_one_record_per_line() {
        let metrics = vec![StepMetrics::empty(0), StepMetrics::empty(1)];
        let mut buffer = Vec::new();
        write_metrics_jsonl(&metrics, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: StepMetrics = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.step, 1);
    }

    #[test]
    fn test_metrics_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        write_metrics_file(&[StepMetrics::empty(0)], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(r#"{"step":0"#));
    }
}
