// ============================================================
// Layer 6 — Batch Statistics Logger
// ============================================================
// Summarises each split's batch stream and appends one CSV row
// per split to out/batch_stats.csv.
//
// Columns:
//   split      train / val / test
//   batches    batches produced
//   sequences  rows across all batches
//   tokens     real (non-PAD) input tokens
//   padding    PAD slots added to input rows
//   max_len    widest batch seen
//
// Example:
//   split,batches,sequences,tokens,padding,max_len
//   train,1186,18976,251904,40213,61
//   val,78,1240,16422,2510,44
//
// A high padding/tokens ratio means batches mix very different
// definition lengths.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::data::batcher::EncodedBatch;

const HEADER: &str = "split,batches,sequences,tokens,padding,max_len";

/// Running totals over one split's batches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub split:     String,
    pub batches:   usize,
    pub sequences: usize,
    pub tokens:    usize,
    pub padding:   usize,
    pub max_len:   usize,
}

impl BatchStats {
    pub fn new(split: impl Into<String>) -> Self {
        Self { split: split.into(), ..Self::default() }
    }

    pub fn record<B: EncodedBatch>(&mut self, batch: &B) {
        self.batches   += 1;
        self.sequences += batch.len();
        self.tokens    += batch.token_count();
        self.padding   += batch.pad_count();
        self.max_len    = self.max_len.max(batch.max_len());
    }

    /// Mean rows per batch, 0 for an empty split
    pub fn mean_batch_size(&self) -> f64 {
        if self.batches == 0 {
            0.0
        } else {
            self.sequences as f64 / self.batches as f64
        }
    }
}

/// Appends split summaries to a CSV file.
pub struct StatsLogger {
    csv_path: PathBuf,
}

impl StatsLogger {
    /// Writes the header if the file doesn't exist yet
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("batch_stats.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created batch stats CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, s: &BatchStats) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        writeln!(
            f,
            "{},{},{},{},{},{}",
            s.split, s.batches, s.sequences, s.tokens, s.padding, s.max_len,
        )?;

        tracing::debug!(
            "Logged {} stats: {} batches, {} sequences",
            s.split,
            s.batches,
            s.sequences,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::LmBatch;

    fn lm_batch(lengths: Vec<usize>, width: usize) -> LmBatch {
        LmBatch {
            inputs:  lengths.iter().map(|_| vec![4; width]).collect(),
            targets: lengths.iter().map(|_| vec![4; width]).collect(),
            lengths,
        }
    }

    #[test]
    fn test_stats_accumulate() {
        let mut stats = BatchStats::new("train");
        stats.record(&lm_batch(vec![3, 2], 3));
        stats.record(&lm_batch(vec![5], 5));

        assert_eq!(stats.batches, 2);
        assert_eq!(stats.sequences, 3);
        assert_eq!(stats.tokens, 10);
        assert_eq!(stats.padding, 1);
        assert_eq!(stats.max_len, 5);
        assert!((stats.mean_batch_size() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_csv_rows_are_appended_under_one_header() {
        let dir = tempfile::tempdir().unwrap();

        let mut train = BatchStats::new("train");
        train.record(&lm_batch(vec![2, 2], 2));
        StatsLogger::new(dir.path()).unwrap().log(&train).unwrap();

        // a second logger on the same directory keeps the existing header
        let logger = StatsLogger::new(dir.path()).unwrap();
        logger.log(&BatchStats::new("val")).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![HEADER, "train,1,2,4,0,2", "val,0,0,0,0,0"]);
    }
}
