//! Append-only CSV store for new farm records

use super::record::FarmRecord;
use super::{PredictError, PredictResult, Predictions};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Which sustainability index is written with a saved record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SaveChoice {
    Tree,
    Mlp,
    Boosting,
    /// One row per model
    All,
    /// Keep the index typed by the user
    UserValue,
}

impl FromStr for SaveChoice {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tree" | "decision-tree" => Ok(Self::Tree),
            "mlp" => Ok(Self::Mlp),
            "boosting" | "xgboost" => Ok(Self::Boosting),
            "all" => Ok(Self::All),
            "user" | "user-value" => Ok(Self::UserValue),
            other => Err(PredictError::invalid_record(format!(
                "unknown save choice '{}', expected tree, mlp, boosting, all or user",
                other
            ))),
        }
    }
}

pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append rows, writing the header first when the file is new or empty
    pub fn append(&self, records: &[FarmRecord]) -> PredictResult<()> {
        for record in records {
            record.validate()?;
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(needs_header).from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        info!("Appended {} record(s) to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Save `record` with the index selected by `choice`; returns the rows written
    pub fn save(
        &self,
        record: &FarmRecord,
        predictions: &Predictions,
        choice: SaveChoice,
    ) -> PredictResult<Vec<FarmRecord>> {
        let rows = match choice {
            SaveChoice::Tree => vec![record.with_index(predictions.tree)],
            SaveChoice::Mlp => vec![record.with_index(predictions.mlp)],
            SaveChoice::Boosting => vec![record.with_index(predictions.boosting)],
            SaveChoice::All => vec![
                record.with_index(predictions.tree),
                record.with_index(predictions.mlp),
                record.with_index(predictions.boosting),
            ],
            SaveChoice::UserValue => vec![record.clone()],
        };
        self.append(&rows)?;
        Ok(rows)
    }

    pub fn load(&self) -> PredictResult<Vec<FarmRecord>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        Ok(reader.deserialize().collect::<Result<Vec<FarmRecord>, _>>()?)
    }
}
