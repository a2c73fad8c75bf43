//! Output writers for simulation results.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::metrics::{CsvSummaryRow, GameMetrics};
use crate::types::OutputFormat;

type BoxError = Box<dyn std::error::Error>;

pub struct OutputWriter {
    format: OutputFormat,
    detail_writer: Box<dyn Write + Send>,
    buffered: Vec<GameMetrics>,
    csv_writer: csv::Writer<BufWriter<File>>,
    detail_path: PathBuf,
    csv_path: PathBuf,
}

impl OutputWriter {
    pub fn new(output_dir: &str, format: &OutputFormat, compress: bool) -> Result<Self, BoxError> {
        let dir = Path::new(output_dir);
        std::fs::create_dir_all(dir)?;

        let timestamp = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Iso8601::DEFAULT)
            .unwrap_or_else(|_| "unknown".to_string())
            .replace(':', "-");

        let extension = match format {
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Json => "json",
        };
        let mut detail_path = dir.join(format!("simulation_{timestamp}.{extension}"));
        let detail_writer: Box<dyn Write + Send> = if compress {
            detail_path.set_extension(format!("{extension}.gz"));
            Box::new(BufWriter::new(GzEncoder::new(
                File::create(&detail_path)?,
                Compression::default(),
            )))
        } else {
            Box::new(BufWriter::new(create_truncated(&detail_path)?))
        };

        let csv_path = dir.join(format!("simulation_{timestamp}_summary.csv"));
        let csv_writer = csv::Writer::from_writer(BufWriter::new(create_truncated(&csv_path)?));

        Ok(Self {
            format: format.clone(),
            detail_writer,
            buffered: Vec::new(),
            csv_writer,
            detail_path,
            csv_path,
        })
    }

    pub fn write_game(&mut self, metrics: &GameMetrics) -> Result<(), BoxError> {
        match self.format {
            OutputFormat::Jsonl => {
                let json = serde_json::to_string(metrics)?;
                writeln!(self.detail_writer, "{json}")?;
                self.detail_writer.flush()?;
            }
            OutputFormat::Json => self.buffered.push(metrics.clone()),
        }

        // Header comes from the row's field names on the first call.
        self.csv_writer.serialize(CsvSummaryRow::from(metrics))?;
        self.csv_writer.flush()?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), BoxError> {
        if matches!(self.format, OutputFormat::Json) {
            serde_json::to_writer_pretty(&mut self.detail_writer, &self.buffered)?;
        }
        self.detail_writer.flush()?;
        self.csv_writer.flush()?;
        // Dropping the boxed writer finishes the gzip stream.
        drop(self.detail_writer);
        Ok(())
    }

    pub fn output_paths(&self) -> (&Path, &Path) {
        (&self.detail_path, &self.csv_path)
    }
}

fn create_truncated(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}
