//! Batch preprocessing: raw sensor exports to processed case directories.
//!
//! ```text
//! <input>/**/<*sensor*.csv>  ──►  <output>/<case_id>/
//!         LogFile.txt                X.txt Y.txt Z.txt T.txt
//!                                    LogFile.txt
//!                                    animation.mp4 | frames/
//! ```
//!
//! Every processed case is appended to the metadata file as
//! `source_dir;filename;case_id;dest_dir;`.

use std::path::{Path, PathBuf};

use rand::distr::Alphanumeric;
use rand::Rng;

use scopetrace_common::config::PreprocessConfig;
use scopetrace_common::error::{ScopetraceError, ScopetraceResult};
use scopetrace_processing_core::preprocess::{
    coils_to_series, preprocess_sensor_file, CoilTrajectory,
};
use scopetrace_trace_model::event_log::RAW_LOG_FILE;
use scopetrace_trace_model::meta::{MetaRecord, MetaWriter};
use scopetrace_trace_model::series::CoordinateSeries;

use crate::animation::{AnimationBackend, AnimationMode};

/// Length of generated case ids.
pub const CASE_ID_LEN: usize = 12;

/// One batch preprocessing run.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub meta_path: PathBuf,
    pub config: PreprocessConfig,
    pub animation: AnimationMode,
    /// Truncate the metadata file and recreate the output directory first.
    pub clean: bool,
}

/// A case written by the batch.
#[derive(Debug, Clone)]
pub struct BatchCase {
    pub source: PathBuf,
    pub case_id: String,
    pub dest_dir: PathBuf,
    pub samples: usize,
    pub coils: usize,
    pub log_copied: bool,
    pub animation: Option<PathBuf>,
}

/// Outcome of [`run_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub cases: Vec<BatchCase>,
    /// Source files that failed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

/// Random alphanumeric case id.
pub fn generate_case_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CASE_ID_LEN)
        .map(char::from)
        .collect()
}

/// Every `*.csv` file with `sensor` in its name under `dir`, in sorted order.
pub fn find_sensor_files(dir: &Path) -> ScopetraceResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    collect_sensor_files(dir, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect_sensor_files(dir: &Path, found: &mut Vec<PathBuf>) -> ScopetraceResult<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_sensor_files(&path, found)?;
        } else if is_sensor_file(&path) {
            found.push(path);
        }
    }
    Ok(())
}

fn is_sensor_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".csv") && name.contains("sensor")
}

/// Preprocess every sensor file under the job's input directory.
///
/// A file that fails is logged and recorded in the summary; the batch
/// continues with the next file. Setup failures (missing input, metadata
/// file, unavailable encoder) abort the batch.
pub fn run_batch(job: &BatchJob) -> ScopetraceResult<BatchSummary> {
    if !job.input_dir.is_dir() {
        return Err(ScopetraceError::FileNotFound {
            path: job.input_dir.clone(),
        });
    }
    if job.config.layout.coil_count == 0 {
        return Err(ScopetraceError::config("coil_count must be at least 1"));
    }

    let mut backend = job.animation.backend();
    if let Some(backend) = &backend {
        if !backend.is_available() {
            return Err(ScopetraceError::render(format!(
                "animation backend '{}' is not available",
                backend.name()
            )));
        }
    }

    if job.clean {
        if job.output_dir.exists() {
            std::fs::remove_dir_all(&job.output_dir)?;
        }
        tracing::info!(output = %job.output_dir.display(), meta = %job.meta_path.display(), "Cleaned batch output");
    }
    std::fs::create_dir_all(&job.output_dir)?;

    let mut meta = if job.clean {
        MetaWriter::reset(&job.meta_path)?
    } else {
        MetaWriter::append(&job.meta_path)?
    };

    let sources = find_sensor_files(&job.input_dir)?;
    tracing::info!(
        input = %job.input_dir.display(),
        files = sources.len(),
        animation = ?job.animation,
        "Starting batch preprocessing"
    );

    let mut summary = BatchSummary::default();
    for source in sources {
        let case_id = generate_case_id();
        match process_case(job, &source, &case_id, backend.as_deref_mut()) {
            Ok(case) => {
                let record = MetaRecord {
                    source_dir: parent_string(&source),
                    filename: file_name_string(&source),
                    case_id: case.case_id.clone(),
                    dest_dir: dir_string(&case.dest_dir),
                };
                if let Err(e) = meta.write_record(&record) {
                    remove_partial_case(&case.dest_dir);
                    return Err(e.into());
                }
                tracing::info!(
                    case = %case.case_id,
                    source = %source.display(),
                    samples = case.samples,
                    coils = case.coils,
                    "Processed case"
                );
                summary.cases.push(case);
            }
            Err(e) => {
                tracing::warn!(source = %source.display(), error = %e, "Skipping sensor file");
                summary.failed.push((source, e.to_string()));
            }
        }
    }

    tracing::info!(
        processed = summary.cases.len(),
        failed = summary.failed.len(),
        meta_records = meta.records_written(),
        "Batch preprocessing finished"
    );
    Ok(summary)
}

fn process_case(
    job: &BatchJob,
    source: &Path,
    case_id: &str,
    backend: Option<&mut (dyn AnimationBackend + 'static)>,
) -> ScopetraceResult<BatchCase> {
    let processed = preprocess_sensor_file(source, &job.config)?;
    let series = coils_to_series(&processed.averaged);
    if series.is_empty() {
        return Err(ScopetraceError::empty_series(format!(
            "no tip samples in {}",
            source.display()
        )));
    }

    let dest_dir = job.output_dir.join(case_id);
    std::fs::create_dir(&dest_dir)?;
    let (log_copied, animation) =
        match write_case_files(job, source, &series, &processed.averaged, &dest_dir, backend) {
            Ok(written) => written,
            Err(e) => {
                remove_partial_case(&dest_dir);
                return Err(e);
            }
        };

    Ok(BatchCase {
        source: source.to_path_buf(),
        case_id: case_id.to_string(),
        dest_dir,
        samples: series.len(),
        coils: processed.averaged.iter().filter(|c| !c.is_empty()).count(),
        log_copied,
        animation,
    })
}

/// A case without a metadata line must not leave a directory behind.
fn remove_partial_case(dest_dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(dest_dir) {
        tracing::warn!(
            dir = %dest_dir.display(),
            error = %e,
            "Could not remove partial case directory"
        );
    }
}

/// Series, raw log and animation into an existing case directory.
fn write_case_files(
    job: &BatchJob,
    source: &Path,
    series: &CoordinateSeries,
    coils: &[CoilTrajectory],
    dest_dir: &Path,
    backend: Option<&mut (dyn AnimationBackend + 'static)>,
) -> ScopetraceResult<(bool, Option<PathBuf>)> {
    series.save(dest_dir)?;

    let log_source = source
        .parent()
        .map(|p| p.join(RAW_LOG_FILE))
        .filter(|p| p.exists());
    let log_copied = match log_source {
        Some(log) => {
            std::fs::copy(&log, dest_dir.join(RAW_LOG_FILE))?;
            true
        }
        None => {
            tracing::warn!(source = %source.display(), "No {RAW_LOG_FILE} next to sensor file");
            false
        }
    };

    let animation = match (backend, job.animation.output_path(dest_dir)) {
        (Some(backend), Some(output)) => {
            backend.encode(coils, &job.config.animation, &output)?;
            Some(output)
        }
        _ => None,
    };

    Ok((log_copied, animation))
}

fn parent_string(path: &Path) -> String {
    path.parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Directory path with a trailing separator.
fn dir_string(path: &Path) -> String {
    let mut s = path.display().to_string();
    if !s.ends_with(std::path::MAIN_SEPARATOR) {
        s.push(std::path::MAIN_SEPARATOR);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_id_shape() {
        let id = generate_case_id();
        assert_eq!(id.len(), CASE_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, generate_case_id());
    }

    #[test]
    fn test_sensor_file_filter() {
        assert!(is_sensor_file(Path::new("a/sensor_data.csv")));
        assert!(is_sensor_file(Path::new("a/my-sensor.csv")));
        assert!(!is_sensor_file(Path::new("a/sensor_data.txt")));
        assert!(!is_sensor_file(Path::new("a/data.csv")));
    }

    #[test]
    fn test_find_sensor_files_recursive_sorted() {
        let dir = std::env::temp_dir().join("scopetrace_test_find_sensor");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("b")).unwrap();
        std::fs::create_dir_all(dir.join("a").join("deep")).unwrap();
        std::fs::write(dir.join("b").join("sensor.csv"), "").unwrap();
        std::fs::write(dir.join("a").join("deep").join("sensor_1.csv"), "").unwrap();
        std::fs::write(dir.join("a").join("notes.csv"), "").unwrap();

        let found = find_sensor_files(&dir).unwrap();
        assert_eq!(
            found,
            vec![
                dir.join("a").join("deep").join("sensor_1.csv"),
                dir.join("b").join("sensor.csv"),
            ]
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    struct FailingBackend;

    impl AnimationBackend for FailingBackend {
        fn encode(
            &mut self,
            _coils: &[CoilTrajectory],
            _config: &scopetrace_common::config::AnimationConfig,
            _output: &Path,
        ) -> ScopetraceResult<u64> {
            Err(ScopetraceError::render("encoder exited early"))
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_failed_case_leaves_no_directory() {
        let work = std::env::temp_dir().join("scopetrace_test_batch_partial_case");
        let _ = std::fs::remove_dir_all(&work);
        std::fs::create_dir_all(&work).unwrap();
        let source = work.join("sensor_data.csv");
        std::fs::write(
            &source,
            "Time,x1,y1,z1,\n\
             10:00:00:000000,1.0,2.0,3.0,\n\
             10:00:00:100000,1.5,2.5,3.5,\n",
        )
        .unwrap();

        let job = BatchJob {
            input_dir: work.clone(),
            output_dir: work.join("processed"),
            meta_path: work.join("SIMMETA.txt"),
            config: PreprocessConfig::default(),
            animation: AnimationMode::Frames,
            clean: false,
        };
        std::fs::create_dir_all(&job.output_dir).unwrap();

        let mut backend = FailingBackend;
        let result = process_case(
            &job,
            &source,
            "partialcase1",
            Some(&mut backend as &mut dyn AnimationBackend),
        );
        assert!(result.is_err());
        assert!(!job.output_dir.join("partialcase1").exists());
        let _ = std::fs::remove_dir_all(&work);
    }

    #[test]
    fn test_dir_string_trailing_separator() {
        let s = dir_string(Path::new("out/abc"));
        assert!(s.ends_with(std::path::MAIN_SEPARATOR));
        assert_eq!(dir_string(Path::new(&s)), s);
    }
}
