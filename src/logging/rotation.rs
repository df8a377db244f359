//! A log file that rolls over at UTC midnight.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};


/// First UTC midnight strictly after `after`.
fn next_midnight(after: DateTime<Utc>) -> DateTime<Utc> {
    after
        .date_naive()
        .succ_opt()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}


/// Append-only log file with daily, midnight-aligned rotation.
///
/// On rollover the live file is renamed to `YYYYMMDD.<name>` (or `<name>.YYYY-MM-DD`
/// without date prefixing), a fresh live file is opened in its place and archives
/// beyond the retention count are deleted, oldest first.
#[derive(Debug)]
pub struct TimedRotatingFile {
    path: PathBuf,
    file: Option<File>,
    rollover_at: DateTime<Utc>,
    date_prefix: bool,
    retention_days: u32,
}

impl TimedRotatingFile {
    /// Opens (or creates) `path` for appending. The parent directory must exist.
    ///
    /// An existing file schedules its rollover from its modification time,
    /// so a file left over from an earlier day is archived on the first write.
    pub fn open<P>(path: P, date_prefix: bool, retention_days: u32) -> io::Result<Self>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();

        let last_written = match fs::metadata(&path).and_then(|metadata| metadata.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(_) => Utc::now(),
        };

        let file = Self::open_append(&path)?;

        Ok(Self {
            path,
            file: Some(file),
            rollover_at: next_midnight(last_written),
            date_prefix,
            retention_days,
        })
    }

    fn open_append(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The instant at which the next write triggers a rollover.
    pub fn rollover_at(&self) -> DateTime<Utc> {
        self.rollover_at
    }

    pub fn date_prefix(&self) -> bool {
        self.date_prefix
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.write_line_at(Utc::now(), line)
    }

    /// Writes `line` as if the current time was `now`, rolling over first if due.
    pub fn write_line_at(&mut self, now: DateTime<Utc>, line: &str) -> io::Result<()> {
        if now >= self.rollover_at {
            self.roll_over(now)?;
        }

        let mut file = match self.file.take() {
            Some(file) => file,
            None => Self::open_append(&self.path)?,
        };

        let mut buffer = String::with_capacity(line.len() + 1);
        buffer.push_str(line);
        buffer.push('\n');

        let written = file.write_all(buffer.as_bytes()).and_then(|_| file.flush());
        self.file = Some(file);

        written
    }

    /// Rolls the live file over immediately. Returns the archive path.
    pub fn force_rollover(&mut self) -> io::Result<PathBuf> {
        self.roll_over(Utc::now())
    }

    fn roll_over(&mut self, now: DateTime<Utc>) -> io::Result<PathBuf> {
        // The archive is named after the day the live file covered.
        let covered_day = self
            .rollover_at
            .date_naive()
            .pred_opt()
            .unwrap_or_else(|| self.rollover_at.date_naive());

        let archive_path = self.path.with_file_name(self.archive_name(covered_day));

        // Close the live handle before renaming it.
        drop(self.file.take());

        if archive_path.exists() {
            fs::remove_file(&archive_path)?;
        }

        if self.path.exists() {
            fs::rename(&self.path, &archive_path)?;
        }

        self.file = Some(Self::open_append(&self.path)?);
        self.rollover_at = next_midnight(now);

        self.prune_archives()?;

        Ok(archive_path)
    }

    fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    fn archive_name(&self, day: NaiveDate) -> String {
        let base_name = self.base_name();

        if self.date_prefix {
            format!("{}.{}", day.format("%Y%m%d"), base_name)
        } else {
            format!("{}.{}", base_name, day.format("%Y-%m-%d"))
        }
    }

    fn is_archive_name(&self, file_name: &str) -> bool {
        let base_name = self.base_name();

        if self.date_prefix {
            file_name
                .strip_suffix(base_name.as_str())
                .and_then(|prefix| prefix.strip_suffix('.'))
                .map(|date| date.len() == 8 && date.bytes().all(|byte| byte.is_ascii_digit()))
                .unwrap_or(false)
        } else {
            file_name
                .strip_prefix(base_name.as_str())
                .and_then(|suffix| suffix.strip_prefix('.'))
                .map(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() && date.len() == 10)
                .unwrap_or(false)
        }
    }

    /// Archives of this file, oldest first.
    pub fn archives(&self) -> io::Result<Vec<PathBuf>> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut archives = Vec::new();
        for entry in fs::read_dir(&directory)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();

            if self.is_archive_name(&file_name) {
                archives.push(entry.path());
            }
        }

        // Both naming schemes sort chronologically by name.
        archives.sort();
        Ok(archives)
    }

    fn prune_archives(&self) -> io::Result<()> {
        if self.retention_days == 0 {
            return Ok(());
        }

        let archives = self.archives()?;
        let keep = self.retention_days as usize;

        if archives.len() > keep {
            for stale_archive in &archives[..archives.len() - keep] {
                fs::remove_file(stale_archive)?;
            }
        }

        Ok(())
    }
}
