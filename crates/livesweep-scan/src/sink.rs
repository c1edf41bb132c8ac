//! Result persistence: write live entries to a tab-delimited listing and a
//! CSV table.
//!
//! Both files are rewritten from scratch on every call, through a sibling
//! `.tmp` file that is renamed into place.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use livesweep_core::LiveEntry;

use crate::error::{Result, ScanError};

/// Destination for the live entries of a scan.
pub trait ResultSink: Send + Sync {
    /// Replace any previously persisted results with `entries`.
    fn persist(&self, entries: &[LiveEntry]) -> Result<()>;
}

/// Writes `address<TAB>range` lines and an `ip,source_range` CSV.
#[derive(Debug, Clone)]
pub struct FileSink {
    txt_path: PathBuf,
    csv_path: PathBuf,
}

impl FileSink {
    pub fn new(txt_path: impl Into<PathBuf>, csv_path: impl Into<PathBuf>) -> Self {
        Self {
            txt_path: txt_path.into(),
            csv_path: csv_path.into(),
        }
    }

    pub fn txt_path(&self) -> &Path {
        &self.txt_path
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl ResultSink for FileSink {
    fn persist(&self, entries: &[LiveEntry]) -> Result<()> {
        write_atomic(&self.txt_path, |w| write_txt(w, entries))?;
        write_atomic(&self.csv_path, |w| write_csv(w, entries))?;

        tracing::debug!(
            entries = entries.len(),
            txt = %self.txt_path.display(),
            csv = %self.csv_path.display(),
            "Results persisted"
        );
        Ok(())
    }
}

fn write_txt(w: &mut dyn Write, entries: &[LiveEntry]) -> std::io::Result<()> {
    for entry in entries {
        writeln!(w, "{}\t{}", entry.address, entry.source_label())?;
    }
    Ok(())
}

fn write_csv(w: &mut dyn Write, entries: &[LiveEntry]) -> std::io::Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(["ip", "source_range"])?;
    for entry in entries {
        wtr.write_record([entry.address.to_string(), entry.source_label()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write through `<path>.tmp` and rename over `path`.
fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let persist_err = |source| ScanError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(persist_err)?;
    }

    let tmp = tmp_path(path);
    let result = File::create(&tmp).and_then(|f| {
        let mut w = BufWriter::new(f);
        fill(&mut w)?;
        w.flush()?;
        w.get_ref().sync_all()
    });

    if let Err(e) = result.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(persist_err(e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
