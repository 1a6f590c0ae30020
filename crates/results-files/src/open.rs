use crate::Tally;
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

pub const PLAINTEXT_LIST: &str = "http-get-plaintext.txt";
pub const REDIRECT_LIST: &str = "http-get-redirecting.txt";
pub const ERROR_LOG: &str = "http-get-errorlog.txt";
pub const WARNINGS_LOG: &str = "http-get-warnings.txt";
pub const CSV_LOG: &str = "http-get-log.csv";

/// The five output sinks of one run. Files are truncated when opened and
/// only ever appended to afterwards.
pub struct ReportFiles {
    pub(crate) plaintext: BufWriter<File>,
    pub(crate) redirecting: BufWriter<File>,
    pub(crate) errors: BufWriter<File>,
    pub(crate) warnings: BufWriter<File>,
    pub(crate) log: csv::Writer<File>,
    pub(crate) tally: Tally,
}

impl ReportFiles {
    pub fn open_or_create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output directory {}", dir.display()))?;
        let log = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(create(dir, CSV_LOG)?);
        Ok(ReportFiles {
            plaintext: BufWriter::new(create(dir, PLAINTEXT_LIST)?),
            redirecting: BufWriter::new(create(dir, REDIRECT_LIST)?),
            errors: BufWriter::new(create(dir, ERROR_LOG)?),
            warnings: BufWriter::new(create(dir, WARNINGS_LOG)?),
            log,
            tally: Tally::default(),
        })
    }
}

fn create(dir: &Path, name: &str) -> Result<File> {
    let path = dir.join(name);
    OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&path)
        .with_context(|| format!("cannot open {}", path.display()))
}
