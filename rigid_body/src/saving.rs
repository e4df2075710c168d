use csv::Writer;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};
use thiserror::Error;

use crate::{simulation::Frame, state::BodyMode};

#[derive(Debug, Error)]
pub enum SavingErrors {
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type FileWriter = FrameWriter<BufWriter<File>>;

/// Writes one CSV row per frame: time, the state vector and the energies.
pub struct FrameWriter<W: Write> {
    writer: Writer<W>,
    mode: BodyMode,
}

impl FrameWriter<BufWriter<File>> {
    /// Creates the file, and its parent directory if missing, and writes the header.
    pub fn create(path: &Path, mode: BodyMode) -> Result<Self, SavingErrors> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Self::from_writer(BufWriter::new(file), mode)
    }
}

impl<W: Write> FrameWriter<W> {
    pub fn from_writer(w: W, mode: BodyMode) -> Result<Self, SavingErrors> {
        let mut writer = Writer::from_writer(w);
        writer.write_record(Self::headers(mode))?;
        Ok(Self { writer, mode })
    }

    pub fn headers(mode: BodyMode) -> Vec<&'static str> {
        let mut headers = vec!["t"];
        headers.extend_from_slice(mode.labels());
        headers.extend_from_slice(&["ke", "pe", "te"]);
        headers
    }

    pub fn write(&mut self, frame: &Frame) -> Result<(), SavingErrors> {
        let x = frame.state.to_vector(self.mode);
        let energy = &frame.outputs.energy;

        let mut record = Vec::with_capacity(x.len() + 4);
        record.push(frame.t.to_string());
        record.extend(x.iter().map(|v| v.to_string()));
        record.extend([energy.kinetic, energy.potential, energy.total].map(|v| v.to_string()));
        self.writer.write_record(&record)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SavingErrors> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and hands back the underlying writer.
    pub fn into_inner(self) -> Result<W, SavingErrors> {
        self.writer
            .into_inner()
            .map_err(|e| SavingErrors::Io(e.into_error()))
    }
}
