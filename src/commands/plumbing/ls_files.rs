use crate::areas::repository::Repository;
use crate::artifacts::index::VERSION;

fn format_time(seconds: u32, nanoseconds: u32) -> String {
    chrono::DateTime::from_timestamp(seconds as i64, nanoseconds)
        .map(|time| time.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true))
        .unwrap_or_else(|| format!("{seconds}.{nanoseconds:09}"))
}

impl Repository {
    pub fn ls_files(&self, verbose: bool) -> anyhow::Result<()> {
        let mut index = self.index();
        index.rehydrate()?;

        let mut writer = self.writer();

        if verbose {
            writeln!(
                writer,
                "Index file format v{VERSION}, containing {} entries.",
                index.len()
            )?;
        }

        for entry in index.entries() {
            writeln!(writer, "{}", entry.name)?;

            if verbose {
                let metadata = &entry.metadata;
                writeln!(
                    writer,
                    "  {} with perms: {:04o}",
                    metadata.mode.mode_type.as_str(),
                    metadata.mode.permissions
                )?;
                writeln!(writer, "  on blob: {}", entry.oid)?;
                writeln!(
                    writer,
                    "  created: {}, modified: {}",
                    format_time(metadata.ctime, metadata.ctime_nsec),
                    format_time(metadata.mtime, metadata.mtime_nsec)
                )?;
                writeln!(writer, "  device: {}, inode: {}", metadata.dev, metadata.ino)?;
                writeln!(writer, "  user: {}  group: {}", metadata.uid, metadata.gid)?;
                writeln!(
                    writer,
                    "  flags: stage={} assume_valid={}",
                    entry.stage, entry.assume_valid
                )?;
            }
        }

        Ok(())
    }
}
