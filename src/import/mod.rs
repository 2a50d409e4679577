use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{ImportError, ParseError};
use crate::pipeline::{self, FileFormat};
use crate::storage::{mapper, ActivityStore};
use crate::types::record::Record;
use crate::types::result::ImportResult;

/// Single-file or whole-folder import. Construction is where unusable
/// paths and unknown extensions fail; once a run starts, per-file errors
/// are folded into the [`ImportResult`] instead.
#[derive(Debug)]
pub struct Importer {
    path: PathBuf,
    files: Vec<PathBuf>,
    config: Config,
}

impl Importer {
    pub fn make(path: &Path, config: Config) -> Result<Importer, ImportError> {
        if path.is_dir() {
            let files = enumerate_folder(path)?;
            tracing::info!(folder = %path.display(), files = files.len(), "folder import prepared");
            Ok(Importer {
                path: path.to_path_buf(),
                files,
                config,
            })
        } else if path.is_file() {
            let filename = path.file_name().map(|n| n.to_string_lossy().into_owned());
            let Some(filename) = filename else {
                return Err(ImportError::InvalidPath(path.display().to_string()));
            };
            if FileFormat::from_filename(&filename).is_none() {
                return Err(ParseError::UnknownExtension(filename).into());
            }
            Ok(Importer {
                path: path.to_path_buf(),
                files: vec![path.to_path_buf()],
                config,
            })
        } else {
            Err(ImportError::InvalidPath(path.display().to_string()))
        }
    }

    /// Files this run will process, known before it starts.
    pub fn files_to_import(&self) -> usize {
        self.files.len()
    }

    /// Starts the run. The returned iterator is finite, pull-driven and
    /// non-restartable; it yields one accumulated snapshot per processed
    /// file. Dropping it cancels the remaining files, the snapshots
    /// already yielded stay valid.
    pub fn run<S: ActivityStore>(self, store: &mut S) -> ImportRun<'_, S> {
        let result = ImportResult::new(self.path.display().to_string(), self.files.len());
        ImportRun {
            files: self.files,
            next: 0,
            result,
            config: self.config,
            store,
        }
    }
}

/// Immediate `*.gpx`/`*.fit` children only; no recursive descent. Sorted
/// by name so progress sequences are reproducible.
fn enumerate_folder(path: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let entries =
        std::fs::read_dir(path).map_err(|_| ImportError::InvalidPath(path.display().to_string()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("gpx") | Some("fit")
                )
        })
        .collect();
    files.sort();
    Ok(files)
}

/// One in-flight import run. A single [`ImportResult`] accumulator is
/// threaded through every step and re-yielded as a snapshot, so a caller
/// observing the sequence sees monotonically increasing progress.
pub struct ImportRun<'a, S: ActivityStore> {
    files: Vec<PathBuf>,
    next: usize,
    result: ImportResult,
    config: Config,
    store: &'a mut S,
}

impl<S: ActivityStore> Iterator for ImportRun<'_, S> {
    type Item = ImportResult;

    fn next(&mut self) -> Option<ImportResult> {
        let file = self.files.get(self.next)?.clone();
        self.next += 1;

        match import_one(&file, self.store, &self.config) {
            Ok(()) => {
                tracing::info!(file = %file.display(), "imported");
                self.result.imported += 1;
            }
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "import failed");
                // Every recorded message names the file it came from.
                self.result.errors.push(format!("{}: {e}", file.display()));
            }
        }
        Some(self.result.clone())
    }
}

fn import_one<S: ActivityStore>(
    path: &Path,
    store: &mut S,
    config: &Config,
) -> Result<(), ImportError> {
    let record = pipeline::parse_file(path, config)?;
    insert_record(&record, store)
}

fn insert_record<S: ActivityStore>(
    record: &Record,
    store: &mut S,
) -> Result<(), ImportError> {
    let activity = mapper::to_activity(record);

    if store.activity_exists(&activity) {
        return Err(ImportError::DuplicateActivity);
    }

    match record {
        Record::Track { segments, .. } => {
            store
                .insert_track_activity(&activity, segments)
                .ok_or(ImportError::PersistenceFailure)?;
        }
        Record::Sets { sets, .. } => {
            store
                .insert_set_activity(&activity, sets)
                .ok_or(ImportError::PersistenceFailure)?;
        }
        Record::Multi { children, .. } => {
            let parent_id = store
                .insert_multi_activity(&activity)
                .ok_or(ImportError::PersistenceFailure)?;
            for child in children {
                let mut child_activity = mapper::to_activity(child);
                child_activity.parent_id = Some(parent_id);
                // Child insert failures are not surfaced individually;
                // the parent import already counted.
                match child {
                    Record::Track { segments, .. } => {
                        let _ = store.insert_track_activity(&child_activity, segments);
                    }
                    Record::Sets { sets, .. } => {
                        let _ = store.insert_set_activity(&child_activity, sets);
                    }
                    Record::Transition { .. } | Record::Multi { .. } => {}
                }
            }
        }
        Record::Transition { .. } => {
            return Err(ImportError::UnsupportedRecordVariant(record.kind()));
        }
    }
    Ok(())
}
