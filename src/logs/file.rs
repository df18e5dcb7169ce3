use crate::error::{DblogError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// File name of the bounded log, also used as the download file name
pub const LOG_FILE_NAME: &str = "dblog-file.log";

/// Result of a bounded append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Oldest lines dropped to make room
    pub dropped: usize,
    /// Line count after the append
    pub lines: usize,
}

/// The single backing file of the sink, kept at or below a maximum line count
///
/// Trim and append run as one critical section: an in-process mutex shared by
/// every sink holding this `LogFile`, plus an exclusive `flock` on unix so
/// other processes writing the same path are serialized too.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    guard: Mutex<()>,
}

impl LogFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            guard: Mutex::new(()),
        }
    }

    /// Get the path to the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Number of lines currently in the file; a missing file has none
    pub fn line_count(&self) -> Result<usize> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(split_lines(&bytes).len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(DblogError::LogFileError(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Append `line` after dropping the oldest lines so that the file never
    /// holds more than `max_lines` lines afterwards.
    ///
    /// `line` must be a single newline-terminated line. A missing file is
    /// created (with its parent directory) and nothing is trimmed.
    pub fn append_bounded(&self, line: &str, max_lines: usize) -> Result<AppendOutcome> {
        let max_lines = max_lines.max(1);
        let _local = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    DblogError::LogFileError(format!("Failed to create log directory: {}", e))
                })?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| {
                DblogError::LogFileError(format!("Failed to open {}: {}", self.path.display(), e))
            })?;
        let mut file = lock_exclusive(file)?;

        let mut existing = Vec::new();
        file.read_to_end(&mut existing)
            .map_err(|e| DblogError::LogError(format!("Failed to read log: {}", e)))?;
        let lines = split_lines(&existing);

        let outcome = if lines.len() >= max_lines {
            let dropped = lines.len() - max_lines + 1;
            let kept = &lines[dropped..];

            let mut rewritten = Vec::with_capacity(existing.len() + line.len());
            for kept_line in kept {
                rewritten.extend_from_slice(kept_line);
                rewritten.push(b'\n');
            }
            rewritten.extend_from_slice(line.as_bytes());

            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&rewritten)
                .map_err(|e| DblogError::LogError(format!("Failed to rewrite log: {}", e)))?;

            AppendOutcome {
                dropped,
                lines: kept.len() + 1,
            }
        } else {
            file.seek(SeekFrom::End(0))?;
            if !existing.is_empty() && !existing.ends_with(b"\n") {
                file.write_all(b"\n")?;
            }
            file.write_all(line.as_bytes())
                .map_err(|e| DblogError::LogError(format!("Failed to write to log: {}", e)))?;

            AppendOutcome {
                dropped: 0,
                lines: lines.len() + 1,
            }
        };

        file.flush()
            .map_err(|e| DblogError::LogError(format!("Failed to flush log: {}", e)))?;

        Ok(outcome)
    }
}

/// Read the whole file under a shared lock, so a concurrent trim is never
/// observed half way through its rewrite
pub(crate) fn read_shared(path: &Path) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut file = lock_shared(file)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Split file content into lines without their terminators
fn split_lines(bytes: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    if bytes.is_empty() || bytes.ends_with(b"\n") {
        lines.pop();
    }
    lines
}

#[cfg(unix)]
fn lock_exclusive(file: File) -> Result<nix::fcntl::Flock<File>> {
    nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusive)
        .map_err(|(_, errno)| DblogError::LockError(errno.to_string()))
}

#[cfg(not(unix))]
fn lock_exclusive(file: File) -> Result<File> {
    Ok(file)
}

#[cfg(unix)]
fn lock_shared(file: File) -> io::Result<nix::fcntl::Flock<File>> {
    nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockShared)
        .map_err(|(_, errno)| io::Error::from(errno))
}

#[cfg(not(unix))]
fn lock_shared(file: File) -> io::Result<File> {
    Ok(file)
}
