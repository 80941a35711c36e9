//! Append-only record of timers that actually ran.
//!
//! Each entry keeps both what was planned and what happened. Natural
//! completions always have `actual_elapsed_ms >= planned_duration_ms`;
//! only cancellations can come in under plan.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::timer::{elapsed_ms, TimerSpec};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub label: String,
    pub planned_duration_ms: u64,
    pub actual_elapsed_ms: u64,
    #[serde(with = "rfc3339_millis")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "rfc3339_millis")]
    pub ended_at: DateTime<Utc>,
    pub outcome: RunOutcome,
}

impl RunLogEntry {
    /// Build an entry for `spec`, deriving the actual elapsed time from the
    /// two timestamps. The stored timestamps keep millisecond precision.
    pub fn new(
        spec: &TimerSpec,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        outcome: RunOutcome,
    ) -> Self {
        Self {
            label: spec.label().to_string(),
            planned_duration_ms: spec.planned_duration_ms(),
            actual_elapsed_ms: elapsed_ms(started_at, ended_at),
            started_at: started_at.trunc_subsecs(3),
            ended_at: ended_at.trunc_subsecs(3),
            outcome,
        }
    }

    /// Ran at least as long as planned.
    pub fn ran_to_plan(&self) -> bool {
        self.actual_elapsed_ms >= self.planned_duration_ms
    }
}

/// Aggregate numbers over the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLogSummary {
    pub total_runs: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub total_planned_ms: u64,
    pub total_actual_ms: u64,
}

#[derive(Serialize, Deserialize)]
struct LogExport {
    #[serde(with = "rfc3339_millis")]
    exported_at: DateTime<Utc>,
    entries: Vec<RunLogEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunLog {
    entries: Vec<RunLogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: RunLogEntry) {
        self.entries.push(entry);
    }

    /// Discard every entry. Irreversible.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[RunLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> RunLogSummary {
        self.entries
            .iter()
            .fold(RunLogSummary::default(), |mut acc, entry| {
                acc.total_runs += 1;
                match entry.outcome {
                    RunOutcome::Completed => acc.completed += 1,
                    RunOutcome::Cancelled => acc.cancelled += 1,
                }
                acc.total_planned_ms = acc.total_planned_ms.saturating_add(entry.planned_duration_ms);
                acc.total_actual_ms = acc.total_actual_ms.saturating_add(entry.actual_elapsed_ms);
                acc
            })
    }

    /// Export document stamped with the current time.
    pub fn serialize(&self) -> Result<String> {
        self.serialize_at(Utc::now())
    }

    /// Export document as pretty JSON. Every entry is included in order,
    /// with RFC 3339 timestamps.
    pub fn serialize_at(&self, exported_at: DateTime<Utc>) -> Result<String> {
        let doc = LogExport {
            exported_at,
            entries: self.entries.clone(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Read the entries back out of an export document.
    pub fn parse(text: &str) -> Result<Vec<RunLogEntry>> {
        let doc: LogExport = serde_json::from_str(text)?;
        Ok(doc.entries)
    }

    /// Download name for an export made at `now`.
    pub fn export_file_name(now: DateTime<Utc>) -> String {
        format!("timer-log-{}.json", now.format("%Y%m%d-%H%M%S"))
    }
}

/// RFC 3339 in UTC with exactly three fractional digits, e.g.
/// `2026-03-01T09:00:01.250Z`.
mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry(label: &str, planned: u64, actual: i64, outcome: RunOutcome) -> RunLogEntry {
        let spec = TimerSpec::new(label, planned).unwrap();
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        RunLogEntry::new(&spec, start, start + Duration::milliseconds(actual), outcome)
    }

    #[test]
    fn actual_elapsed_comes_from_timestamps() {
        let e = entry("tea", 60_000, 10_250, RunOutcome::Cancelled);
        assert_eq!(e.actual_elapsed_ms, 10_250);
        assert!(!e.ran_to_plan());
    }

    #[test]
    fn serialize_round_trips_and_does_not_mutate() {
        let mut log = RunLog::new();
        log.append(entry("a", 1_000, 1_020, RunOutcome::Completed));
        log.append(entry("b", 60_000, 9_000, RunOutcome::Cancelled));

        let text = log.serialize().unwrap();
        let parsed = RunLog::parse(&text).unwrap();

        assert_eq!(parsed, log.entries());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn serialized_timestamps_are_rfc3339() {
        let mut log = RunLog::new();
        log.append(entry("a", 1_000, 1_000, RunOutcome::Completed));
        let json: serde_json::Value = serde_json::from_str(&log.serialize().unwrap()).unwrap();
        let started = json["entries"][0]["started_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(started).is_ok());
        assert_eq!(json["entries"][0]["outcome"], "completed");
    }

    #[test]
    fn timestamps_are_written_to_the_millisecond() {
        let spec = TimerSpec::new("a", 1_000).unwrap();
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
            + Duration::nanoseconds(250_999_999);
        let e = RunLogEntry::new(&spec, start, start + Duration::milliseconds(1_500), RunOutcome::Completed);
        assert_eq!(e.actual_elapsed_ms, 1_500);

        let mut log = RunLog::new();
        log.append(e.clone());
        let text = log.serialize_at(start).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["exported_at"], "2026-03-01T09:00:00.250Z");
        assert_eq!(json["entries"][0]["started_at"], "2026-03-01T09:00:00.250Z");
        assert_eq!(json["entries"][0]["ended_at"], "2026-03-01T09:00:01.750Z");
        assert_eq!(RunLog::parse(&text).unwrap(), vec![e]);
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut log = RunLog::new();
        log.append(entry("a", 1_000, 1_100, RunOutcome::Completed));
        log.append(entry("b", 2_000, 500, RunOutcome::Cancelled));
        let summary = log.summary();
        assert_eq!(summary.total_runs, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.total_planned_ms, 3_000);
        assert_eq!(summary.total_actual_ms, 1_600);
    }

    #[test]
    fn clear_empties_log() {
        let mut log = RunLog::new();
        log.append(entry("a", 1_000, 1_000, RunOutcome::Completed));
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn export_file_name_uses_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 8, 5, 9).unwrap();
        assert_eq!(RunLog::export_file_name(at), "timer-log-20261016-080509.json");
    }
}
