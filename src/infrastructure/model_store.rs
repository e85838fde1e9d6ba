use crate::application::ml::model::TrainedModel;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Single-file JSON store for the trained pipeline.
pub struct ModelStore {
    file_path: PathBuf,
}

impl ModelStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// `Ok(None)` when no artifact exists yet. Never writes.
    pub fn load(&self) -> Result<Option<TrainedModel>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open model file {:?}", self.file_path))?;
        let model: TrainedModel = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse model file {:?}", self.file_path))?;
        model
            .check_contract()
            .context("Stored model is incompatible with the request schema")?;

        info!("Loaded model from {:?}", self.file_path);
        Ok(Some(model))
    }

    /// Writes a sibling temp file and renames it over the target, so readers
    /// never observe a partial artifact.
    pub fn save(&self, model: &TrainedModel) -> Result<PathBuf> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create model directory {:?}", parent))?;
        }

        let temp_path = self.file_path.with_extension("tmp");
        let result = write_temp(&temp_path, model).and_then(|()| {
            fs::rename(&temp_path, &self.file_path).context("Failed to rename model file")
        });
        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        info!("Saved model to {:?}", self.file_path);
        Ok(self.file_path.clone())
    }
}

fn write_temp(temp_path: &Path, model: &TrainedModel) -> Result<()> {
    let file = File::create(temp_path).context("Failed to create temp model file")?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, model).context("Failed to serialize model")?;
    writer.flush().context("Failed to flush temp model file")?;
    writer
        .get_ref()
        .sync_all()
        .context("Failed to sync temp model file")?;
    Ok(())
}
