//! Line-delimited JSON output sink.
//!
//! A [`RecordSink`] owns the write handle of one output file for the duration
//! of one work item. Each record is serialized onto its own line.
//!
//! Appending to a file whose last line has no trailing newline first
//! terminates that line, but only once a record is actually written.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufWriter};

/// How an output file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the file, discarding anything already in it.
    Truncate,
    /// Create the file if needed and keep existing records.
    Append,
}

#[derive(Debug)]
pub struct RecordSink {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
    pending_newline: bool,
}

impl RecordSink {
    pub async fn open(path: &Path, mode: OpenMode) -> io::Result<Self> {
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            OpenMode::Truncate => options.write(true).truncate(true),
            OpenMode::Append => options.read(true).append(true),
        };

        let mut file = options.open(path).await?;
        let pending_newline = match mode {
            OpenMode::Truncate => false,
            OpenMode::Append => last_line_unterminated(&mut file).await?,
        };

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
            pending_newline,
        })
    }

    /// Serialize one record and write it followed by a newline.
    pub async fn write_record<R: Serialize + ?Sized>(&mut self, record: &R) -> io::Result<()> {
        let mut line = Vec::new();
        if self.pending_newline {
            line.push(b'\n');
        }
        serde_json::to_writer(&mut line, record).map_err(io::Error::from)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.pending_newline = false;
        self.written += 1;
        Ok(())
    }

    /// Write a batch of records in order.
    pub async fn write_all<R: Serialize>(&mut self, records: &[R]) -> io::Result<()> {
        for record in records {
            self.write_record(record).await?;
        }
        Ok(())
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().await
    }

    /// Records written through this sink, not counting earlier contents.
    pub fn records_written(&self) -> u64 {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// True when the file is non-empty and its last byte is not a newline.
async fn last_line_unterminated(file: &mut File) -> io::Result<bool> {
    if file.metadata().await?.len() == 0 {
        return Ok(false);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1)).await?;
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}
