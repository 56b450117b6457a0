//! FileSink - writes records to a CSV or JSON Lines file
//!
//! One file per session, named after the insole side and the local start
//! time, e.g. `sensor_left_2024-05-01-14-03-59.csv`.

use contracts::{ContractError, DataSink, SensorRecord, Side};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, info, instrument};

/// Output encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileFormat {
    /// `sequence,timestamp_ns,ch1..chN`
    #[default]
    Csv,
    /// One serialized `SensorRecord` per line
    JsonLines,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::JsonLines => "jsonl",
        }
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "jsonl" | "json_lines" | "ndjson" => Ok(FileFormat::JsonLines),
            other => Err(format!("unknown file format '{other}'")),
        }
    }
}

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory
    pub base_path: PathBuf,
    /// Output encoding
    pub format: FileFormat,
    /// Insole side, part of the file name
    pub side: Side,
    /// Fixed file stem instead of `<dataset>_<timestamp>`
    pub file_stem: Option<String>,
    /// Flush to disk every N records, 0 = only on flush/close
    pub flush_every: u64,
}

/// 默认每条记录落盘一次
pub const DEFAULT_FLUSH_EVERY: u64 = 1;

impl FileSinkConfig {
    /// Create config from params map
    ///
    /// Keys: `base_path` (default `./output`), `format` (`csv` | `jsonl`),
    /// `file_name` (stem override), `flush_every` (records per flush,
    /// default 1, 0 disables periodic flushing).
    pub fn from_params(params: &HashMap<String, String>, side: Side) -> std::io::Result<Self> {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        let format = match params.get("format") {
            Some(value) => value.parse().map_err(|e: String| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
            })?,
            None => FileFormat::default(),
        };

        let flush_every = match params.get("flush_every") {
            Some(value) => value.parse().map_err(|e| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid flush_every '{value}': {e}"),
                )
            })?,
            None => DEFAULT_FLUSH_EVERY,
        };

        Ok(Self {
            base_path,
            format,
            side,
            file_stem: params.get("file_name").cloned(),
            flush_every,
        })
    }

    /// Full output path for a session starting now
    pub fn output_path(&self) -> PathBuf {
        let stem = self.file_stem.clone().unwrap_or_else(|| {
            format!(
                "{}_{}",
                self.side.dataset_name(),
                chrono::Local::now().format("%Y-%m-%d-%H-%M-%S")
            )
        });
        self.base_path
            .join(format!("{}.{}", stem, self.format.extension()))
    }
}

/// Sink that appends records to a file
pub struct FileSink {
    name: String,
    format: FileFormat,
    path: PathBuf,
    writer: BufWriter<File>,
    header_written: bool,
    records: u64,
    flush_every: u64,
}

impl FileSink {
    /// Create the output file
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;
        let path = config.output_path();
        let file = File::create(&path)?;

        let name = name.into();
        info!(
            sink = %name,
            path = %path.display(),
            format = ?config.format,
            flush_every = config.flush_every,
            "FileSink opened"
        );

        Ok(Self {
            name,
            format: config.format,
            path,
            writer: BufWriter::new(file),
            header_written: false,
            records: 0,
            flush_every: config.flush_every,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
        side: Side,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params, side)?;
        Self::new(name, config)
    }

    /// Path of the output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_record_to_disk(&mut self, record: &SensorRecord) -> std::io::Result<()> {
        match self.format {
            FileFormat::Csv => {
                if !self.header_written {
                    write!(self.writer, "sequence,timestamp_ns")?;
                    for i in 1..=record.channels.len() {
                        write!(self.writer, ",ch{}", i)?;
                    }
                    writeln!(self.writer)?;
                    self.header_written = true;
                }

                write!(self.writer, "{},{}", record.sequence, record.timestamp_ns)?;
                for value in &record.channels {
                    write!(self.writer, ",{}", value)?;
                }
                writeln!(self.writer)?;
            }
            FileFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, record)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                writeln!(self.writer)?;
            }
        }
        self.records += 1;
        if self.flush_every > 0 && self.records % self.flush_every == 0 {
            self.writer.flush()?;
        }
        Ok(())
    }

    fn persist_record(&mut self, record: &SensorRecord) -> Result<(), ContractError> {
        self.write_record_to_disk(record).map_err(|e| {
            error!(sink = %self.name, sequence = record.sequence, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, record),
        fields(sink = %self.name, sequence = record.sequence)
    )]
    async fn write(&mut self, record: &SensorRecord) -> Result<(), ContractError> {
        self.persist_record(record)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        debug!(
            sink = %self.name,
            path = %self.path.display(),
            records = self.records,
            "FileSink closed"
        );
        Ok(())
    }
}
