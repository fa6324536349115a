//! Size-based log file rotation.
//!
//! Rotation, backup counting and gzip are done by `file-rotate`. Once the
//! active file has passed [`RotationPolicy::max_size`], the next write first
//! moves it aside to a backup stamped with the local rotation time:
//!
//! ```text
//! core.log                         active
//! core.log.2026-10-19T08-30-00.gz  backup
//! ```
//!
//! On top of that, backups older than `max_age` are swept on open and after
//! every rotation. The sweep is best-effort: a failure is reported on
//! standard error and never costs the record being written.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, TimeDelta};
use file_rotate::compression::Compression;
use file_rotate::suffix::{AppendTimestamp, DateFrom, FileLimit};
use file_rotate::{ContentLimit, FileRotate};

const MEGABYTE: usize = 1024 * 1024;

pub const DEFAULT_MAX_SIZE_MB: usize = 100;
pub const DEFAULT_MAX_BACKUPS: usize = 10;
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;
pub const DEFAULT_COMPRESS: bool = true;

// No dots: `file-rotate` may append `.N` to a stamp and `.gz` after that.
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// When and how log files are rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size of the active file, in bytes, past which it is rotated.
    pub max_size: usize,
    /// Number of backups kept.
    pub max_backups: usize,
    /// Backups older than this are deleted. `None` keeps them regardless of age.
    pub max_age: Option<TimeDelta>,
    /// Gzip backups on rotation.
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE_MB * MEGABYTE,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age: Some(TimeDelta::days(DEFAULT_MAX_AGE_DAYS)),
            compress: DEFAULT_COMPRESS,
        }
    }
}

/// An append-only log file that rotates itself by size.
pub struct RotatingFile {
    inner: FileRotate<AppendTimestamp>,
    path: PathBuf,
    policy: RotationPolicy,
    backups: Vec<PathBuf>,
}

impl RotatingFile {
    /// Open (or create) the active file, creating parent directories.
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        // `FileRotate::new` swallows open errors, so surface them here.
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&path)?;

        let mut inner = build(&path, &policy);
        let backups = inner.log_paths();
        let mut file = Self {
            inner,
            path,
            policy,
            backups,
        };
        file.sweep();
        Ok(file)
    }

    /// Delete backups stamped before `now - max_age`. Every candidate is
    /// tried; the first failure is returned. Returns how many were removed.
    fn remove_expired(&self, now: NaiveDateTime) -> io::Result<usize> {
        let Some(max_age) = self.policy.max_age else {
            return Ok(0);
        };
        let cutoff = now - max_age;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let Some(name) = self.path.file_name().map(|n| n.to_string_lossy()) else {
            return Ok(0);
        };
        let prefix = format!("{name}.");

        let mut removed = 0;
        let mut first_err = None;
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(stamp) = file_name
                .to_str()
                .and_then(|n| n.strip_prefix(&prefix))
                .and_then(|rest| rest.split('.').next())
            else {
                continue;
            };
            let Ok(at) = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT) else {
                continue;
            };
            if at >= cutoff {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(removed),
        }
    }

    /// Best-effort age sweep. Rebuilds the rotator after deleting backups so
    /// its own backup count matches the directory again.
    fn sweep(&mut self) {
        let rescan = match self.remove_expired(Local::now().naive_local()) {
            Ok(removed) => removed > 0,
            Err(e) => {
                eprintln!("ztat: failed to remove expired log backups: {e}");
                true
            }
        };
        if rescan {
            self.inner = build(&self.path, &self.policy);
        }
        self.backups = self.inner.log_paths();
    }
}

fn build(path: &Path, policy: &RotationPolicy) -> FileRotate<AppendTimestamp> {
    let compression = if policy.compress {
        Compression::OnRotate(0)
    } else {
        Compression::None
    };
    FileRotate::new(
        path,
        AppendTimestamp::with_format(
            BACKUP_TIME_FORMAT,
            FileLimit::MaxFiles(policy.max_backups),
            DateFrom::Now,
        ),
        ContentLimit::BytesSurpassed(policy.max_size),
        compression,
        #[cfg(unix)]
        None,
    )
}

impl fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingFile")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        if self.inner.log_paths() != self.backups {
            self.sweep();
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn policy(max_size: usize) -> RotationPolicy {
        RotationPolicy {
            max_size,
            max_backups: 10,
            max_age: Some(TimeDelta::days(30)),
            compress: false,
        }
    }

    fn backups(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("core.log."))
            })
            .collect();
        found.sort();
        found
    }

    fn stamp(days_ago: i64) -> String {
        (Local::now().naive_local() - TimeDelta::days(days_ago))
            .format(BACKUP_TIME_FORMAT)
            .to_string()
    }

    #[test]
    fn default_policy_constants() {
        let policy = RotationPolicy::default();
        assert_eq!(policy.max_size, 100 * 1024 * 1024);
        assert_eq!(policy.max_backups, 10);
        assert_eq!(policy.max_age, Some(TimeDelta::days(30)));
        assert!(policy.compress);
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs/nested/core.log");
        let mut file = RotatingFile::open(&path, policy(1024)).unwrap();
        file.write_all(b"hello\n").unwrap();
        file.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("core.log");
        fs::write(&path, "old\n").unwrap();
        let mut file = RotatingFile::open(&path, policy(1024)).unwrap();
        file.write_all(b"new\n").unwrap();
        file.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn unopenable_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        assert!(RotatingFile::open(blocker.join("core.log"), policy(1024)).is_err());
        assert!(RotatingFile::open(dir.path(), policy(1024)).is_err());
    }

    #[test]
    fn rotates_past_the_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("core.log");
        let mut file = RotatingFile::open(&path, policy(8)).unwrap();
        file.write_all(b"12345678\n").unwrap();
        file.write_all(b"abc\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "abc\n");
        let backups = backups(dir.path());
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), "12345678\n");
    }

    #[test]
    fn backups_are_compressed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("core.log");
        let mut file = RotatingFile::open(
            &path,
            RotationPolicy {
                compress: true,
                ..policy(8)
            },
        )
        .unwrap();
        file.write_all(b"12345678\n").unwrap();
        file.write_all(b"abc\n").unwrap();
        file.flush().unwrap();

        let backups = backups(dir.path());
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].extension().and_then(|e| e.to_str()), Some("gz"));
        let mut body = String::new();
        GzDecoder::new(fs::File::open(&backups[0]).unwrap())
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "12345678\n");
    }

    #[test]
    fn expired_backups_removed_on_open() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join(format!("core.log.{}", stamp(45)));
        let old_gz = dir.path().join(format!("core.log.{}.gz", stamp(40)));
        let recent = dir.path().join(format!("core.log.{}", stamp(2)));
        for path in [&old, &old_gz, &recent] {
            fs::write(path, "x\n").unwrap();
        }

        RotatingFile::open(dir.path().join("core.log"), policy(1024)).unwrap();
        assert!(!old.exists());
        assert!(!old_gz.exists());
        assert!(recent.exists());
    }

    #[test]
    fn unrelated_files_are_untouched() {
        let dir = TempDir::new().unwrap();
        let others = [
            dir.path().join("core.log.bak"),
            dir.path().join("other.log.2000-01-01T00-00-00"),
            dir.path().join("notes.txt"),
        ];
        for path in &others {
            fs::write(path, "x\n").unwrap();
        }
        RotatingFile::open(dir.path().join("core.log"), policy(1024)).unwrap();
        assert!(others.iter().all(|p| p.exists()));
    }

    #[test]
    fn no_max_age_keeps_old_backups() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join(format!("core.log.{}", stamp(400)));
        fs::write(&old, "x\n").unwrap();
        RotatingFile::open(
            dir.path().join("core.log"),
            RotationPolicy {
                max_age: None,
                ..policy(1024)
            },
        )
        .unwrap();
        assert!(old.exists());
    }

    #[test]
    fn failed_sweep_keeps_the_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("core.log");
        let mut file = RotatingFile::open(&path, policy(8)).unwrap();

        // An expired name that cannot be removed as a file.
        let stuck = dir.path().join(format!("core.log.{}", stamp(60)));
        fs::create_dir(&stuck).unwrap();
        let old = dir.path().join(format!("core.log.{}", stamp(50)));
        fs::write(&old, "x\n").unwrap();

        file.write_all(b"12345678\n").unwrap();
        file.write_all(b"record\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "record\n");
        assert!(stuck.is_dir());
        assert!(!old.exists());
    }
}
