//! The synchronizer: one full mirroring pass from a source tree to a replica

use crate::copy::replace_file;
use crate::fingerprint::fingerprint;
use crate::sink::NoopSink;
use ferromirror_config::Config;
use ferromirror_types::{
    ChunkSize, Error, EventSink, Operation, Result, SyncEvent, SyncReport,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::fs::FileType;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tracing::debug;

/// Synchronization options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Read chunk size used when fingerprinting files
    pub chunk_size: ChunkSize,
    /// Carry source access and modification times over to copied files
    pub preserve_timestamps: bool,
}

impl SyncOptions {
    /// Create options from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.sync.chunk_size,
            preserve_timestamps: config.sync.preserve_timestamps,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSize::default(),
            preserve_timestamps: true,
        }
    }
}

/// Converges a replica directory onto a source directory
///
/// Holds no state between calls: every decision is recomputed from the two
/// trees, so a pass interrupted half way is repaired by the next one.
#[derive(Clone)]
pub struct Synchronizer {
    options: SyncOptions,
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new(SyncOptions::default())
    }
}

impl Synchronizer {
    /// Create a synchronizer that reports to no sink
    pub fn new(options: SyncOptions) -> Self {
        Self {
            options,
            sink: Arc::new(NoopSink),
        }
    }

    /// Create a synchronizer from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(SyncOptions::from_config(config))
    }

    /// Report events to the given sink as they happen
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Options in use
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Run one pass, making `replica` an exact copy of `source`
    ///
    /// Precondition failures are returned before the replica is touched.
    /// Failures on individual entries are recorded in the report and the pass
    /// carries on; only failures at the roots end the pass early.
    pub async fn synchronize<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        replica: Q,
    ) -> Result<SyncReport> {
        let source = source.as_ref();
        let replica = replica.as_ref();
        let start_time = Instant::now();

        check_roots(source, replica).await?;

        let mut pass = Pass {
            source,
            replica,
            options: &self.options,
            sink: self.sink.as_ref(),
            report: SyncReport::new(source, replica),
        };

        pass.ensure_replica_root().await?;
        pass.mirror_tree().await?;
        pass.sweep_empty_dirs().await;

        let mut report = pass.report;
        report.stats.duration = start_time.elapsed();
        debug!(
            "Pass over '{}' finished with {} change(s) and {} error(s)",
            replica.display(),
            report.stats.changes(),
            report.stats.errors
        );
        Ok(report)
    }
}

/// Reject missing or non-directory roots and roots that overlap
async fn check_roots(source: &Path, replica: &Path) -> Result<()> {
    match fs::metadata(source).await {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(Error::NotADirectory {
                path: source.to_path_buf(),
            })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::SourceNotFound {
                path: source.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(Error::io(format!(
                "Failed to inspect source '{}': {}",
                source.display(),
                e
            )))
        }
    }

    match fs::metadata(replica).await {
        Ok(metadata) if !metadata.is_dir() => {
            return Err(Error::NotADirectory {
                path: replica.to_path_buf(),
            })
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(Error::io(format!(
                "Failed to inspect replica '{}': {}",
                replica.display(),
                e
            )))
        }
    }

    let source_root = resolve(source).await?;
    let replica_root = resolve(replica).await?;
    if replica_root.starts_with(&source_root) || source_root.starts_with(&replica_root) {
        return Err(Error::OverlappingRoots {
            source_root,
            replica_root,
        });
    }

    Ok(())
}

/// Canonicalize a path that may not exist yet
///
/// The deepest existing ancestor is canonicalized and the missing components
/// are appended unchanged.
async fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        match fs::canonicalize(existing).await {
            Ok(mut resolved) => {
                resolved.extend(missing.iter().rev());
                return Ok(resolved);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let (Some(name), Some(parent)) = (existing.file_name(), existing.parent()) else {
                    return Err(e);
                };
                missing.push(name.to_os_string());
                existing = parent;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Kind of a source entry, as seen without following links
enum SourceEntry {
    File,
    Directory,
    Unsupported(&'static str),
    Unreadable,
}

/// State of one synchronization pass
struct Pass<'a> {
    source: &'a Path,
    replica: &'a Path,
    options: &'a SyncOptions,
    sink: &'a dyn EventSink,
    report: SyncReport,
}

impl Pass<'_> {
    fn emit(&mut self, event: SyncEvent) {
        self.sink.on_event(&event);
        self.report.record(event);
    }

    fn entry_failed(&mut self, error: Error) {
        let event = match error {
            Error::Entry {
                operation,
                path,
                message,
            } => SyncEvent::EntryFailed {
                operation,
                path,
                message,
            },
            Error::UnsupportedEntry { path, kind } => SyncEvent::EntryFailed {
                operation: Operation::Inspect,
                path,
                message: format!("unsupported entry type ({})", kind),
            },
            other => SyncEvent::EntryFailed {
                operation: Operation::Inspect,
                path: self.replica.to_path_buf(),
                message: other.to_string(),
            },
        };
        self.emit(event);
    }

    async fn ensure_replica_root(&mut self) -> Result<()> {
        if fs::metadata(self.replica).await.is_ok() {
            return Ok(());
        }

        fs::create_dir_all(self.replica).await.map_err(|e| {
            Error::io(format!(
                "Failed to create replica directory '{}': {}",
                self.replica.display(),
                e
            ))
        })?;
        self.emit(SyncEvent::DirectoryCreated {
            path: self.replica.to_path_buf(),
        });
        Ok(())
    }

    /// Top-down pass over the source tree
    async fn mirror_tree(&mut self) -> Result<()> {
        let mut pending = vec![PathBuf::new()];

        while let Some(relative) = pending.pop() {
            match self.mirror_directory(&relative).await {
                Ok(subdirs) => pending.extend(subdirs.into_iter().rev()),
                Err(e) if relative.as_os_str().is_empty() => {
                    return Err(Error::io(e.to_string()));
                }
                Err(e) => self.entry_failed(e),
            }
        }

        Ok(())
    }

    /// Mirror the entries of one source directory, returning the
    /// subdirectories that are ready to be descended into
    ///
    /// Fails only when the source directory itself cannot be listed, in which
    /// case its replica counterpart is left untouched.
    async fn mirror_directory(&mut self, relative: &Path) -> Result<Vec<PathBuf>> {
        let source_dir = self.source.join(relative);
        let replica_dir = self.replica.join(relative);
        debug!("Mirroring directory: {}", source_dir.display());

        let entries = self.list_source(&source_dir).await?;

        let mut names = HashSet::with_capacity(entries.len());
        let mut subdirs = Vec::new();
        for (name, kind) in entries {
            let entry = relative.join(&name);
            match kind {
                SourceEntry::File => self.reconcile_file(&entry).await,
                SourceEntry::Directory => {
                    if self.ensure_directory(&entry).await {
                        subdirs.push(entry);
                    }
                }
                SourceEntry::Unsupported(kind) => {
                    self.entry_failed(Error::unsupported(source_dir.join(&name), kind));
                }
                SourceEntry::Unreadable => {}
            }
            names.insert(name);
        }

        self.prune_directory(&replica_dir, &names).await;
        Ok(subdirs)
    }

    async fn list_source(&mut self, dir: &Path) -> Result<Vec<(OsString, SourceEntry)>> {
        let mut reader = fs::read_dir(dir)
            .await
            .map_err(|e| Error::entry(Operation::ReadDirectory, dir, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| Error::entry(Operation::ReadDirectory, dir, e))?
        {
            let kind = match entry.file_type().await {
                Ok(file_type) if file_type.is_dir() => SourceEntry::Directory,
                Ok(file_type) if file_type.is_file() => SourceEntry::File,
                Ok(file_type) if file_type.is_symlink() => {
                    SourceEntry::Unsupported("symbolic link")
                }
                Ok(_) => SourceEntry::Unsupported("special file"),
                Err(e) => {
                    self.entry_failed(Error::entry(Operation::Inspect, entry.path(), e));
                    SourceEntry::Unreadable
                }
            };
            entries.push((entry.file_name(), kind));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    /// Copy a source file unless the replica already holds identical content
    async fn reconcile_file(&mut self, relative: &Path) {
        let source_file = self.source.join(relative);
        let replica_file = self.replica.join(relative);

        match fs::symlink_metadata(&replica_file).await {
            Ok(metadata) if metadata.is_file() => {
                match self
                    .contents_match(&source_file, &replica_file, metadata.len())
                    .await
                {
                    Ok(true) => {
                        debug!("Unchanged: {}", replica_file.display());
                        self.report.record_unchanged();
                        return;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        self.entry_failed(e);
                        return;
                    }
                }
            }
            Ok(metadata) if metadata.is_dir() => {
                if !self.remove_tree(&replica_file).await {
                    return;
                }
            }
            // Links and special files are replaced by the rename, never written through
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                self.entry_failed(Error::entry(Operation::Inspect, &replica_file, e));
                return;
            }
        }

        match replace_file(&source_file, &replica_file, self.options.preserve_timestamps).await {
            Ok(bytes) => self.emit(SyncEvent::FileCopied {
                source: source_file,
                destination: replica_file,
                bytes,
            }),
            Err(e) => self.entry_failed(Error::entry(Operation::CopyFile, &source_file, e)),
        }
    }

    /// Compare by length first; equal lengths fall back to fingerprints
    async fn contents_match(
        &self,
        source_file: &Path,
        replica_file: &Path,
        replica_len: u64,
    ) -> Result<bool> {
        let source_len = fs::metadata(source_file)
            .await
            .map_err(|e| Error::entry(Operation::Inspect, source_file, e))?
            .len();
        if source_len != replica_len {
            return Ok(false);
        }

        let chunk_size = self.options.chunk_size;
        let source_print = fingerprint(source_file, chunk_size)
            .await
            .map_err(|e| Error::entry(Operation::Fingerprint, source_file, e))?;
        let replica_print = fingerprint(replica_file, chunk_size)
            .await
            .map_err(|e| Error::entry(Operation::Fingerprint, replica_file, e))?;

        Ok(source_print == replica_print)
    }

    /// Make sure the replica has a real directory at `relative`
    async fn ensure_directory(&mut self, relative: &Path) -> bool {
        let dir = self.replica.join(relative);

        match fs::symlink_metadata(&dir).await {
            Ok(metadata) if metadata.is_dir() => return true,
            Ok(_) => {
                if !self.remove_file(&dir).await {
                    return false;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                self.entry_failed(Error::entry(Operation::Inspect, &dir, e));
                return false;
            }
        }

        match fs::create_dir_all(&dir).await {
            Ok(()) => {
                self.emit(SyncEvent::DirectoryCreated { path: dir });
                true
            }
            Err(e) => {
                self.entry_failed(Error::entry(Operation::CreateDirectory, &dir, e));
                false
            }
        }
    }

    /// Remove replica entries of `dir` that have no namesake in the source
    async fn prune_directory(&mut self, dir: &Path, keep: &HashSet<OsString>) {
        let Some(entries) = self.list_replica(dir).await else {
            return;
        };

        for (name, file_type) in entries {
            if keep.contains(&name) {
                continue;
            }
            let path = dir.join(&name);
            if file_type.is_dir() {
                self.remove_tree(&path).await;
            } else {
                self.remove_file(&path).await;
            }
        }
    }

    /// Remove a replica subtree children-first, reporting every entry
    ///
    /// Returns whether the whole subtree is gone.
    async fn remove_tree(&mut self, root: &Path) -> bool {
        let mut complete = true;
        let mut pending = vec![(root.to_path_buf(), false)];

        while let Some((dir, emptied)) = pending.pop() {
            if emptied {
                match fs::remove_dir(&dir).await {
                    Ok(()) => self.emit(SyncEvent::DirectoryRemoved { path: dir }),
                    Err(e) => {
                        self.entry_failed(Error::entry(Operation::RemoveDirectory, &dir, e));
                        complete = false;
                    }
                }
                continue;
            }

            let Some(entries) = self.list_replica(&dir).await else {
                complete = false;
                continue;
            };
            pending.push((dir.clone(), true));

            let mut subdirs = Vec::new();
            for (name, file_type) in entries {
                let path = dir.join(name);
                if file_type.is_dir() {
                    subdirs.push((path, false));
                } else if !self.remove_file(&path).await {
                    complete = false;
                }
            }
            pending.extend(subdirs.into_iter().rev());
        }

        complete
    }

    async fn remove_file(&mut self, path: &Path) -> bool {
        match fs::remove_file(path).await {
            Ok(()) => {
                self.emit(SyncEvent::FileRemoved {
                    path: path.to_path_buf(),
                });
                true
            }
            Err(e) => {
                self.entry_failed(Error::entry(Operation::RemoveFile, path, e));
                false
            }
        }
    }

    /// List a replica directory without following links, sorted by name
    async fn list_replica(&mut self, dir: &Path) -> Option<Vec<(OsString, FileType)>> {
        match read_entries(dir).await {
            Ok(entries) => Some(entries),
            Err(e) => {
                self.entry_failed(Error::entry(Operation::ReadDirectory, dir, e));
                None
            }
        }
    }

    /// Bottom-up sweep removing empty replica directories the source lacks
    ///
    /// Directories that exist in the source are kept even when empty.
    async fn sweep_empty_dirs(&mut self) {
        let mut visited = Vec::new();
        let mut pending = vec![self.replica.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let Some(entries) = self.list_replica(&dir).await else {
                continue;
            };
            for (name, file_type) in entries {
                if file_type.is_dir() {
                    pending.push(dir.join(name));
                }
            }
            visited.push(dir);
        }

        // Reverse pre-order visits every directory after all of its descendants
        for dir in visited.into_iter().skip(1).rev() {
            if !is_empty_dir(&dir).await {
                continue;
            }
            let Ok(relative) = dir.strip_prefix(self.replica) else {
                continue;
            };
            let counterpart = self.source.join(relative);
            match SweepVerdict::of(fs::metadata(&counterpart).await) {
                SweepVerdict::Keep => continue,
                SweepVerdict::Unknown(e) => {
                    self.entry_failed(Error::entry(Operation::Inspect, &counterpart, e));
                    continue;
                }
                SweepVerdict::Remove => {}
            }

            match fs::remove_dir(&dir).await {
                Ok(()) => self.emit(SyncEvent::DirectoryRemoved { path: dir }),
                Err(e) => self.entry_failed(Error::entry(Operation::RemoveDirectory, &dir, e)),
            }
        }
    }
}

/// What the sweep does with an empty replica directory, given the lookup of
/// its source counterpart
#[derive(Debug)]
enum SweepVerdict {
    Keep,
    Remove,
    /// Unknown source state never causes a deletion
    Unknown(io::Error),
}

impl SweepVerdict {
    fn of(lookup: io::Result<std::fs::Metadata>) -> Self {
        match lookup {
            Ok(metadata) if metadata.is_dir() => Self::Keep,
            Ok(_) => Self::Remove,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::Remove,
            Err(e) => Self::Unknown(e),
        }
    }
}

async fn read_entries(dir: &Path) -> io::Result<Vec<(OsString, FileType)>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        entries.push((entry.file_name(), entry.file_type().await?));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

async fn is_empty_dir(dir: &Path) -> bool {
    match fs::read_dir(dir).await {
        Ok(mut reader) => matches!(reader.next_entry().await, Ok(None)),
        Err(_) => false,
    }
}
