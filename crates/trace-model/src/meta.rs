//! Case metadata file (`SIMMETA.txt`).
//!
//! One line per processed case, appended by the preprocessing batch:
//!
//! ```text
//! <source_dir>;<source_file>;<case_id>;<dest_dir>;
//! ```
//!
//! Reports group cases by the last three characters of the source
//! directory (after its final `//`), which encode the exercise variant.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::TraceError;

/// Default metadata file name.
pub const META_FILE: &str = "SIMMETA.txt";

/// One processed case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaRecord {
    pub source_dir: String,
    pub filename: String,
    pub case_id: String,
    pub dest_dir: String,
}

impl MetaRecord {
    /// Render as a metadata line, without the newline.
    pub fn to_line(&self) -> String {
        format!(
            "{};{};{};{};",
            self.source_dir, self.filename, self.case_id, self.dest_dir
        )
    }
}

/// Extract the case id (third field) from a metadata line.
///
/// Returns `None` for lines with fewer than three `;` fields.
pub fn process_line(line: &str) -> Option<&str> {
    let mut parts = line.trim().split(';');
    let (_, _, id) = (parts.next()?, parts.next()?, parts.next()?);
    Some(id)
}

/// Grouping key of a metadata line: last three characters of the source
/// directory after its final `//`.
pub fn case_key(line: &str) -> Option<String> {
    let source = line.trim().split(';').next()?;
    let tail = source.rsplit("//").next().unwrap_or(source);
    let chars: Vec<char> = tail.chars().collect();
    let key: String = chars[chars.len().saturating_sub(3)..].iter().collect();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Case ids grouped by key, keys in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseGroups {
    groups: Vec<(String, Vec<String>)>,
}

impl CaseGroups {
    /// Group every usable line of metadata text.
    pub fn parse(content: &str) -> Self {
        let mut groups = Self::default();
        for line in content.lines() {
            let (Some(key), Some(id)) = (case_key(line), process_line(line)) else {
                continue;
            };
            if id.is_empty() {
                continue;
            }
            groups.push(key, id.to_string());
        }
        groups
    }

    /// Read and group a metadata file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TraceError::io(path, e))?;
        Ok(Self::parse(&content))
    }

    pub fn push(&mut self, key: String, id: String) {
        match self.groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, ids)) => ids.push(id),
            None => self.groups.push((key, vec![id])),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(k, ids)| (k.as_str(), ids.as_slice()))
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, ids)| ids.as_slice())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Appends case lines to a metadata file.
pub struct MetaWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    records_written: u64,
}

impl MetaWriter {
    /// Open `path` for appending, creating it if needed.
    pub fn append(path: impl Into<PathBuf>) -> Result<Self, TraceError> {
        Self::open(path.into(), false)
    }

    /// Truncate `path` and start a fresh file.
    pub fn reset(path: impl Into<PathBuf>) -> Result<Self, TraceError> {
        Self::open(path.into(), true)
    }

    fn open(path: PathBuf, truncate: bool) -> Result<Self, TraceError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TraceError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!truncate)
            .truncate(truncate)
            .open(&path)
            .map_err(|e| TraceError::io(&path, e))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            records_written: 0,
        })
    }

    /// Append one record and flush so the line survives an aborted batch.
    pub fn write_record(&mut self, record: &MetaRecord) -> Result<(), TraceError> {
        writeln!(self.writer, "{}", record.to_line())
            .and_then(|_| self.writer.flush())
            .map_err(|e| TraceError::io(&self.path, e))?;
        self.records_written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
