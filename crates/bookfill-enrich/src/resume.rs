//! Manual follow-up of quarantined records.
//!
//! Each quarantined key is resolved to a corrected search key (from a
//! corrections table or an operator prompt), re-enriched, and written back
//! over its row in the full output. Output and quarantine are persisted after
//! every attempt, so an interrupted session loses nothing already resolved.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use bookfill_core::{EnrichedRecord, Record, SearchKey};
use tracing::{info, warn};

use crate::{CheckpointSink, EnrichError, Worker};

/// What to do with one quarantined record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Look the record up again with this key.
    Corrected(SearchKey),
    /// Look it up again with its usual key.
    Retry,
    /// Leave it quarantined.
    Skip,
    /// End the session.
    Stop,
}

/// Decides a [`Resolution`] per quarantined record.
pub trait KeyResolver {
    fn resolve(&mut self, record: &Record) -> Resolution;
}

/// Interpret an operator-supplied correction: `0` or blank skips, `exit` stops.
pub fn parse_correction(input: &str) -> Resolution {
    match input.trim() {
        "" | "0" => Resolution::Skip,
        "exit" => Resolution::Stop,
        other => SearchKey::parse(other).map_or(Resolution::Skip, Resolution::Corrected),
    }
}

/// Resolutions from a prepared key → corrected key table.
#[derive(Debug, Clone, Default)]
pub struct CorrectionTable {
    corrections: HashMap<String, String>,
    retry_unmapped: bool,
}

impl CorrectionTable {
    pub fn new(corrections: HashMap<String, String>) -> Self {
        Self {
            corrections,
            retry_unmapped: false,
        }
    }

    /// Retry records without a correction using their usual key.
    pub fn retry_unmapped(mut self, retry: bool) -> Self {
        self.retry_unmapped = retry;
        self
    }

    pub fn len(&self) -> usize {
        self.corrections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }
}

impl KeyResolver for CorrectionTable {
    fn resolve(&mut self, record: &Record) -> Resolution {
        match self.corrections.get(record.key()) {
            // "exit" only means something at a prompt.
            Some(correction) => match parse_correction(correction) {
                Resolution::Stop => Resolution::Skip,
                other => other,
            },
            None if self.retry_unmapped => Resolution::Retry,
            None => Resolution::Skip,
        }
    }
}

/// Asks an operator for each record's corrected key.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> KeyResolver for Prompt<R, W> {
    fn resolve(&mut self, record: &Record) -> Resolution {
        let asked = writeln!(self.output, "{}", record.key())
            .and_then(|_| write!(self.output, "corrected key (0 = skip, exit = stop): "))
            .and_then(|_| self.output.flush());
        if let Err(e) = asked {
            warn!(error = %e, "cannot write prompt");
            return Resolution::Stop;
        }
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Resolution::Stop,
            Ok(_) => parse_correction(&line),
            Err(e) => {
                warn!(error = %e, "cannot read correction");
                Resolution::Stop
            }
        }
    }
}

/// Counts for one resume session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeSummary {
    pub resolved: usize,
    pub still_failing: usize,
    pub skipped: usize,
    /// Quarantined keys with no row in the dataset.
    pub unknown: usize,
    pub stopped: bool,
}

/// Re-runs the quarantined subset and reconciles it into the full output.
pub struct ResumeController<'a> {
    worker: Worker<'a>,
    sink: &'a dyn CheckpointSink,
}

impl<'a> ResumeController<'a> {
    /// `worker` must share the quarantine loaded from the previous run.
    pub fn new(worker: Worker<'a>, sink: &'a dyn CheckpointSink) -> Self {
        Self { worker, sink }
    }

    /// Walk the quarantine in order. Resolved entries replace their output row
    /// (or are appended when the output lacks one) and leave the quarantine.
    pub async fn run(
        &self,
        dataset: &[Record],
        output: &mut Vec<EnrichedRecord>,
        resolver: &mut dyn KeyResolver,
    ) -> Result<ResumeSummary, EnrichError> {
        let quarantine = self.worker.quarantine();
        let by_key: HashMap<&str, &Record> = dataset.iter().map(|r| (r.key(), r)).collect();
        let mut summary = ResumeSummary::default();
        info!(entries = quarantine.len(), "resuming quarantined records");

        for key in quarantine.snapshot() {
            let Some(record) = by_key.get(key.as_str()) else {
                warn!(key = %key, "quarantined key not in dataset");
                summary.unknown += 1;
                continue;
            };

            let enriched = match resolver.resolve(record) {
                Resolution::Corrected(search_key) => {
                    self.worker.enrich_with_key(record, &search_key).await
                }
                Resolution::Retry => self.worker.enrich(record).await,
                Resolution::Skip => {
                    summary.skipped += 1;
                    continue;
                }
                Resolution::Stop => {
                    summary.stopped = true;
                    break;
                }
            };

            if enriched.is_defaulted() {
                summary.still_failing += 1;
            } else {
                quarantine.remove(&key);
                summary.resolved += 1;
                info!(key = %key, "resolved");
            }
            match output.iter_mut().find(|row| row.key == key) {
                Some(row) => *row = enriched,
                None => output.push(enriched),
            }

            self.sink.save_final(output)?;
            self.sink.save_quarantine(&quarantine.snapshot())?;
        }

        info!(
            resolved = summary.resolved,
            still_failing = summary.still_failing,
            skipped = summary.skipped,
            remaining = quarantine.len(),
            "resume finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLookup, RecordingSink, record};
    use crate::{EnrichmentProfile, Quarantine};
    use bookfill_core::{Outcome, kakao, with_defaults};
    use std::io::Cursor;

    fn profile() -> EnrichmentProfile {
        EnrichmentProfile::new("자료명").with_lookup_columns(["ISBN"])
    }

    fn defaulted(key: &str) -> EnrichedRecord {
        EnrichedRecord {
            key: key.into(),
            fields: with_defaults(&record(key), &kakao::SCHEMA),
            outcome: Outcome::Restored,
        }
    }

    fn corrections(pairs: &[(&str, &str)]) -> CorrectionTable {
        CorrectionTable::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn correction_parsing() {
        assert_eq!(parse_correction("0"), Resolution::Skip);
        assert_eq!(parse_correction("  \n"), Resolution::Skip);
        assert_eq!(parse_correction("exit\n"), Resolution::Stop);
        assert_eq!(
            parse_correction("데미안\n"),
            Resolution::Corrected(SearchKey::Text("데미안".into()))
        );
        assert_eq!(
            parse_correction("978-89-374-6044-9"),
            Resolution::Corrected(SearchKey::Numeric("9788937460449".into()))
        );
    }

    #[test]
    fn table_skips_unmapped_unless_retrying() {
        let mut table = corrections(&[("Book B", "데미안"), ("Book C", "0")]);
        assert!(matches!(table.resolve(&record("Book B")), Resolution::Corrected(_)));
        assert_eq!(table.resolve(&record("Book C")), Resolution::Skip);
        assert_eq!(table.resolve(&record("Book D")), Resolution::Skip);

        let mut table = table.retry_unmapped(true);
        assert_eq!(table.resolve(&record("Book D")), Resolution::Retry);
    }

    #[test]
    fn prompt_reads_one_line_per_record() {
        let input = Cursor::new("데미안\n0\nexit\n");
        let mut out = Vec::new();
        let mut prompt = Prompt::new(input, &mut out);

        assert!(matches!(prompt.resolve(&record("Book B")), Resolution::Corrected(_)));
        assert_eq!(prompt.resolve(&record("Book C")), Resolution::Skip);
        assert_eq!(prompt.resolve(&record("Book D")), Resolution::Stop);
        assert_eq!(prompt.resolve(&record("Book E")), Resolution::Stop);

        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("Book B"));
        assert!(shown.contains("0 = skip"));
    }

    #[tokio::test]
    async fn corrected_entry_replaces_row_and_leaves_quarantine() {
        let dataset = vec![record("Book A"), record("Book B"), record("Book C")];
        let mut output = vec![defaulted("Book A"), defaulted("Book B"), defaulted("Book C")];
        let quarantine = Quarantine::from_keys(["Book B".to_string(), "Book C".into()]);

        let lookup = FakeLookup::new().found("데미안");
        let (profile, sink) = (profile(), RecordingSink::default());
        let worker = Worker::new(&lookup, &profile, &quarantine);
        let controller = ResumeController::new(worker, &sink);
        let mut table = corrections(&[("Book B", "데미안"), ("Book C", "없는 책")]);

        let summary = controller
            .run(&dataset, &mut output, &mut table)
            .await
            .unwrap();

        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.still_failing, 1);
        assert_eq!(quarantine.snapshot(), ["Book C"]);

        assert_eq!(output.len(), 3);
        assert_eq!(output[1].key, "Book B");
        assert_eq!(output[1].outcome, Outcome::Merged);
        assert_eq!(output[1].fields.get(kakao::TITLE), Some("데미안 제목"));
        assert!(output[2].is_defaulted());

        // Persisted after each attempt.
        assert_eq!(sink.final_writes().len(), 2);
        assert_eq!(
            sink.quarantine_writes(),
            [vec!["Book C"], vec!["Book C"]]
        );
    }

    #[tokio::test]
    async fn stop_ends_session_and_persists_nothing_more() {
        let dataset = vec![record("Book B"), record("Book C")];
        let mut output = vec![defaulted("Book B"), defaulted("Book C")];
        let quarantine = Quarantine::from_keys(["Book B".to_string(), "Book C".into()]);

        let lookup = FakeLookup::new().found("Book C");
        let (profile, sink) = (profile(), RecordingSink::default());
        let worker = Worker::new(&lookup, &profile, &quarantine);
        let controller = ResumeController::new(worker, &sink);
        let mut prompt = Prompt::new(Cursor::new("exit\n"), std::io::sink());

        let summary = controller
            .run(&dataset, &mut output, &mut prompt)
            .await
            .unwrap();

        assert!(summary.stopped);
        assert_eq!(quarantine.len(), 2);
        assert!(sink.final_writes().is_empty());
        assert!(lookup.queries().is_empty());
    }

    #[tokio::test]
    async fn retry_unmapped_uses_usual_key_and_unknown_keys_are_counted() {
        let dataset = vec![record("Book C")];
        let mut output = Vec::new();
        let quarantine = Quarantine::from_keys(["Ghost".to_string(), "Book C".into()]);

        let lookup = FakeLookup::new().found("Book C");
        let (profile, sink) = (profile(), RecordingSink::default());
        let worker = Worker::new(&lookup, &profile, &quarantine);
        let controller = ResumeController::new(worker, &sink);
        let mut table = CorrectionTable::default().retry_unmapped(true);

        let summary = controller
            .run(&dataset, &mut output, &mut table)
            .await
            .unwrap();

        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.resolved, 1);
        assert_eq!(quarantine.snapshot(), ["Ghost"]);
        // A row missing from the output is appended.
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].key, "Book C");
    }
}
