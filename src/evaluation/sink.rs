//! Where evaluation results go. A sink only ever receives appends; the
//! evaluator never reads results back.
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use uuid::Uuid;

use super::{MetricRow, SummaryRow};

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serde")]
    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait MetricSink {
    /// Called once for every computed (seed, episode) row, in order.
    fn insert_metric_row(&mut self, run_id: &Uuid, row: &MetricRow) -> Result<(), SinkError>;

    /// Called once after all the metric rows.
    fn insert_summary_row(&mut self, run_id: &Uuid, row: &SummaryRow) -> Result<(), SinkError>;
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MetricSink for NullSink {
    fn insert_metric_row(&mut self, _run_id: &Uuid, _row: &MetricRow) -> Result<(), SinkError> {
        Ok(())
    }

    fn insert_summary_row(&mut self, _run_id: &Uuid, _row: &SummaryRow) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Rows recorded by a `VecSink`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SinkStorage {
    pub metric_rows: Vec<(Uuid, MetricRow)>,
    pub summary_rows: Vec<(Uuid, SummaryRow)>,
}

/// Appends into storage shared with the caller.
#[derive(Debug, Clone)]
pub struct VecSink {
    storage: Arc<Mutex<SinkStorage>>,
}

impl VecSink {
    pub fn new_storage() -> Arc<Mutex<SinkStorage>> {
        Arc::new(Mutex::new(SinkStorage::default()))
    }

    pub fn new(storage: Arc<Mutex<SinkStorage>>) -> Self {
        Self { storage }
    }
}

impl MetricSink for VecSink {
    fn insert_metric_row(&mut self, run_id: &Uuid, row: &MetricRow) -> Result<(), SinkError> {
        self.storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .metric_rows
            .push((*run_id, row.clone()));
        Ok(())
    }

    fn insert_summary_row(&mut self, run_id: &Uuid, row: &SummaryRow) -> Result<(), SinkError> {
        self.storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .summary_rows
            .push((*run_id, row.clone()));
        Ok(())
    }
}

#[cfg(feature = "serde")]
pub use self::json_lines::{JsonLinesSink, SinkRecord};

#[cfg(feature = "serde")]
mod json_lines {
    use std::{
        fs::{File, OpenOptions},
        io::{BufWriter, Write},
        path::{Path, PathBuf},
    };

    use uuid::Uuid;

    use super::{MetricSink, SinkError};
    use crate::evaluation::{MetricRow, SummaryRow};

    /// One line of a `<run_id>.jsonl` file.
    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    #[serde(tag = "kind", rename_all = "camelCase")]
    pub enum SinkRecord {
        Metric(MetricRow),
        Summary(SummaryRow),
    }

    /// Writes each run to `<base_path>/<run_id>.jsonl`, one JSON record
    /// per line.
    #[derive(Debug)]
    pub struct JsonLinesSink {
        base_path: PathBuf,
        open: Option<(Uuid, BufWriter<File>)>,
    }

    impl JsonLinesSink {
        pub fn new(base_path: impl Into<PathBuf>) -> Self {
            Self {
                base_path: base_path.into(),
                open: None,
            }
        }

        pub fn base_path(&self) -> &Path {
            &self.base_path
        }

        pub fn path_for(&self, run_id: &Uuid) -> PathBuf {
            self.base_path.join(run_id.to_string()).with_extension("jsonl")
        }

        fn writer(&mut self, run_id: &Uuid) -> Result<&mut BufWriter<File>, SinkError> {
            let (_, writer) = match self.open.take() {
                Some((id, writer)) if id == *run_id => self.open.insert((id, writer)),
                previous => {
                    if let Some((_, mut previous)) = previous {
                        previous.flush()?;
                    }
                    if !self.base_path.exists() {
                        std::fs::create_dir_all(&self.base_path)?;
                    }
                    let file = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(self.path_for(run_id))?;
                    self.open.insert((*run_id, BufWriter::new(file)))
                }
            };
            Ok(writer)
        }

        fn append(&mut self, run_id: &Uuid, record: &SinkRecord) -> Result<(), SinkError> {
            let writer = self.writer(run_id)?;
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            Ok(())
        }
    }

    impl MetricSink for JsonLinesSink {
        fn insert_metric_row(&mut self, run_id: &Uuid, row: &MetricRow) -> Result<(), SinkError> {
            self.append(run_id, &SinkRecord::Metric(row.clone()))
        }

        fn insert_summary_row(
            &mut self,
            run_id: &Uuid,
            row: &SummaryRow,
        ) -> Result<(), SinkError> {
            self.append(run_id, &SinkRecord::Summary(row.clone()))?;
            // The summary is the last record of a run.
            if let Some((_, writer)) = self.open.as_mut() {
                writer.flush()?;
            }
            Ok(())
        }
    }

    impl Drop for JsonLinesSink {
        fn drop(&mut self) {
            if let Some((_, writer)) = self.open.as_mut() {
                let _ = writer.flush();
            }
        }
    }
}
