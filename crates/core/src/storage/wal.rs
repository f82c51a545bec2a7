//! Write-Ahead Log (WAL) for review appends.
//!
//! Every new review is appended to the WAL before it becomes visible in
//! memory. Each entry is framed as `[u32 length BE][u32 CRC32 BE][bincode payload]`
//! and durably flushed with `fsync`. Compaction folds the WAL into the CSV
//! snapshot and truncates it.

use crate::config;
use crate::review::Review;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

/// A single mutation entry in the write-ahead log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalEntry {
    /// Append one review to the collection.
    AppendReview { review: Review },
}

/// Diagnostic statistics from a WAL replay.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of entries successfully deserialized.
    pub success: usize,
    /// Number of entries skipped due to deserialization errors (CRC was valid).
    pub skipped: usize,
    /// Number of CRC mismatches encountered (replay stopped).
    pub crc_errors: usize,
    /// Number of frame headers with an impossible length: over
    /// [`MAX_WAL_FRAME_BYTES`](crate::config::MAX_WAL_FRAME_BYTES), or running
    /// past EOF over complete entries (replay stopped).
    pub bad_frames: usize,
    /// Whether replay was terminated by a truncated entry.
    pub truncated: bool,
}

impl ReplayStats {
    /// CRC mismatches, bad frame lengths, or undecodable entries. A truncated
    /// tail alone is the expected signature of a crash mid-append and does
    /// not count.
    pub fn has_corruption(&self) -> bool {
        self.crc_errors > 0 || self.bad_frames > 0 || self.skipped > 0
    }
}

/// Synchronous append-only write-ahead log with CRC32 integrity checks.
///
/// Thread-safe via `parking_lot::Mutex`. Each [`append`](SyncWriteAheadLog::append)
/// call writes and fsyncs the framed entry before returning; a failed append
/// truncates the file back to its previous length.
pub struct SyncWriteAheadLog {
    file: Mutex<File>,
    path: PathBuf,
    #[cfg(test)]
    fail_appends: AtomicBool,
}

impl SyncWriteAheadLog {
    /// Open or create `wal.bin` in `data_dir` in append mode.
    pub fn new(data_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(config::WAL_FILE);
        let file = open_append(&path)?;

        Ok(Self {
            file: Mutex::new(file),
            path,
            #[cfg(test)]
            fail_appends: AtomicBool::new(false),
        })
    }

    /// Append a WAL entry synchronously.
    ///
    /// Serializes the entry, writes, and fsyncs to disk before returning.
    pub fn append(&self, entry: &WalEntry) -> io::Result<()> {
        let framed = serialize_and_frame(entry)?;

        let mut file = self.file.lock();
        let start = file.metadata()?.len();
        let result = self.write_frame(&mut file, &framed);
        if let Err(ref e) = result {
            tracing::error!("WAL append failed, rolling back to {} bytes: {}", start, e);
            if let Err(rollback) = file.set_len(start) {
                tracing::error!("WAL rollback failed: {}", rollback);
            }
        }
        result
    }

    fn write_frame(&self, file: &mut File, framed: &[u8]) -> io::Result<()> {
        #[cfg(test)]
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(io::Error::other("injected WAL write failure"));
        }
        file.write_all(framed)?;
        file.sync_data()
    }

    /// Read all entries from the WAL file sequentially, verifying CRC32 checksums.
    ///
    /// Returns the successfully deserialized entries and diagnostic statistics.
    pub fn replay(&self) -> io::Result<(Vec<WalEntry>, ReplayStats)> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();
        let mut stats = ReplayStats::default();
        let mut header_buf = [0u8; 8];

        loop {
            match read_full(&mut reader, &mut header_buf)? {
                0 => break,
                n if n < header_buf.len() => {
                    tracing::warn!("WAL truncated mid-header, stopping replay");
                    stats.truncated = true;
                    break;
                }
                _ => {}
            }
            let len =
                u32::from_be_bytes([header_buf[0], header_buf[1], header_buf[2], header_buf[3]])
                    as usize;
            let stored_crc =
                u32::from_be_bytes([header_buf[4], header_buf[5], header_buf[6], header_buf[7]]);
            if len > config::MAX_WAL_FRAME_BYTES {
                tracing::warn!(len, "WAL frame length exceeds maximum, stopping replay");
                stats.bad_frames += 1;
                break;
            }
            let mut data = Vec::with_capacity(len);
            (&mut reader).take(len as u64).read_to_end(&mut data)?;
            if data.len() < len {
                // A torn append leaves a prefix of one frame; complete frames
                // after the header mean the length itself is damaged.
                if holds_complete_frame(&data) {
                    tracing::warn!(len, "WAL frame length overruns later entries, stopping replay");
                    stats.bad_frames += 1;
                } else {
                    tracing::warn!("WAL truncated mid-entry, stopping replay");
                    stats.truncated = true;
                }
                break;
            }
            let computed_crc = crc32fast::hash(&data);
            if computed_crc != stored_crc {
                tracing::warn!("WAL entry CRC mismatch, stopping replay");
                stats.crc_errors += 1;
                break;
            }
            match bincode::deserialize::<WalEntry>(&data) {
                Ok(entry) => {
                    entries.push(entry);
                    stats.success += 1;
                }
                Err(e) => {
                    tracing::warn!("WAL entry deserialization failed, skipping: {}", e);
                    stats.skipped += 1;
                }
            }
        }

        Ok((entries, stats))
    }

    /// Truncate the WAL file, fsync, and reopen in append mode.
    pub fn truncate(&self) -> io::Result<()> {
        let mut file = self.file.lock();
        let truncated = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        truncated.sync_all()?;
        *file = open_append(&self.path)?;
        Ok(())
    }

    /// Current WAL size in bytes (0 if the file is missing).
    pub fn size_bytes(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Path of the WAL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    opts.open(path)
}

/// Like `read_exact`, but returns the number of bytes read when EOF comes first.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Returns `true` if a non-empty, CRC-valid frame starts anywhere in `buf`.
fn holds_complete_frame(buf: &[u8]) -> bool {
    (0..buf.len().saturating_sub(8)).any(|off| {
        let len = u32::from_be_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]) as usize;
        if len == 0 || len > config::MAX_WAL_FRAME_BYTES || off + 8 + len > buf.len() {
            return false;
        }
        let crc = u32::from_be_bytes([buf[off + 4], buf[off + 5], buf[off + 6], buf[off + 7]]);
        crc32fast::hash(&buf[off + 8..off + 8 + len]) == crc
    })
}

/// Serialize a WAL entry into its on-disk frame format:
/// `[u32 len BE][u32 crc32 BE][bincode payload]`.
fn serialize_and_frame(entry: &WalEntry) -> io::Result<Vec<u8>> {
    let bytes = bincode::serialize(entry).map_err(|e| io::Error::other(e.to_string()))?;
    let len = bytes.len() as u32;
    let crc = crc32fast::hash(&bytes);

    let mut framed = Vec::with_capacity(8 + bytes.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(&crc.to_be_bytes());
    framed.extend_from_slice(&bytes);
    Ok(framed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(body: &str) -> WalEntry {
        WalEntry::AppendReview {
            review: Review::new("NY".into(), body.into(), "2024-01-01 10:00:00".into()),
        }
    }

    #[test]
    fn test_append_and_replay() {
        let dir = TempDir::new().unwrap();
        let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
        let first = entry("great");
        wal.append(&first).unwrap();
        wal.append(&entry("awful")).unwrap();

        let (entries, stats) = wal.replay().unwrap();
        assert_eq!(stats.success, 2);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.crc_errors, 0);
        assert!(!stats.truncated);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], first);
    }

    #[test]
    fn test_replay_empty() {
        let dir = TempDir::new().unwrap();
        let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
        let (entries, stats) = wal.replay().unwrap();
        assert!(entries.is_empty());
        assert_eq!(stats, ReplayStats::default());
    }

    #[test]
    fn test_truncate_clears_wal() {
        let dir = TempDir::new().unwrap();
        let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
        wal.append(&entry("x")).unwrap();
        assert!(wal.size_bytes() > 0);
        wal.truncate().unwrap();
        assert_eq!(wal.size_bytes(), 0);
        let (entries, _) = wal.replay().unwrap();
        assert!(entries.is_empty(), "WAL should be empty after truncate");

        wal.append(&entry("y")).unwrap();
        let (entries, _) = wal.replay().unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_truncated_tail_keeps_complete_entries() {
        let dir = TempDir::new().unwrap();
        let path;
        {
            let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
            wal.append(&entry("one")).unwrap();
            wal.append(&entry("two")).unwrap();
            path = wal.path().to_path_buf();
        }
        let data = std::fs::read(&path).unwrap();
        std::fs::write(&path, &data[..data.len() - 3]).unwrap();

        let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
        let (entries, stats) = wal.replay().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(stats.truncated);
        assert!(!stats.has_corruption());
    }

    #[test]
    fn test_partial_header_is_truncation() {
        let dir = TempDir::new().unwrap();
        let path;
        {
            let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
            wal.append(&entry("one")).unwrap();
            path = wal.path().to_path_buf();
        }
        let mut data = std::fs::read(&path).unwrap();
        data.extend_from_slice(&[0, 0, 1]);
        std::fs::write(&path, &data).unwrap();

        let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
        let (entries, stats) = wal.replay().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(stats.truncated);
    }

    #[test]
    fn test_oversized_frame_length_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path;
        {
            let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
            wal.append(&entry("one")).unwrap();
            wal.append(&entry("two")).unwrap();
            path = wal.path().to_path_buf();
        }
        let mut data = std::fs::read(&path).unwrap();
        data[0] ^= 0x01;
        std::fs::write(&path, &data).unwrap();

        let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
        let (entries, stats) = wal.replay().unwrap();
        assert!(entries.is_empty());
        assert_eq!(stats.bad_frames, 1);
        assert!(!stats.truncated);
        assert!(stats.has_corruption());
    }

    #[test]
    fn test_length_overrunning_later_entries_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path;
        {
            let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
            for body in ["one", "two", "three"] {
                wal.append(&entry(body)).unwrap();
            }
            path = wal.path().to_path_buf();
        }
        let mut data = std::fs::read(&path).unwrap();
        // +256 bytes: still under the cap, but past EOF.
        data[2] ^= 0x01;
        std::fs::write(&path, &data).unwrap();

        let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
        let (entries, stats) = wal.replay().unwrap();
        assert!(entries.is_empty());
        assert_eq!(stats.bad_frames, 1);
        assert!(!stats.truncated);
        assert!(stats.has_corruption());
    }

    #[test]
    fn test_crc_corruption_detected() {
        let dir = TempDir::new().unwrap();
        let path;
        {
            let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
            wal.append(&entry("a")).unwrap();
            path = wal.path().to_path_buf();
        }
        // Corrupt one byte in the payload
        let mut data = std::fs::read(&path).unwrap();
        data[10] ^= 0xFF;
        std::fs::write(&path, &data).unwrap();

        let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
        let (entries, stats) = wal.replay().unwrap();
        assert!(entries.is_empty());
        assert!(stats.has_corruption(), "corruption should be detected");
    }

    #[test]
    fn test_failed_append_leaves_log_unchanged() {
        let dir = TempDir::new().unwrap();
        let wal = SyncWriteAheadLog::new(dir.path()).unwrap();
        wal.append(&entry("kept")).unwrap();
        let size = wal.size_bytes();

        wal.set_fail_appends(true);
        assert!(wal.append(&entry("lost")).is_err());
        wal.set_fail_appends(false);

        assert_eq!(wal.size_bytes(), size);
        let (entries, _) = wal.replay().unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_serialize_and_frame_format() {
        let framed = serialize_and_frame(&entry("test")).unwrap();
        // First 4 bytes = length (BE), next 4 = CRC32 (BE)
        let len = u32::from_be_bytes([framed[0], framed[1], framed[2], framed[3]]) as usize;
        let stored_crc = u32::from_be_bytes([framed[4], framed[5], framed[6], framed[7]]);
        let payload = &framed[8..];
        assert_eq!(payload.len(), len);
        assert_eq!(crc32fast::hash(payload), stored_crc);
    }
}
