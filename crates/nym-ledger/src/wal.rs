use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::LedgerError;
use crate::records::NymTxn;

/// Flush/sync strategy for the WAL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every write (safest, highest latency).
    #[default]
    EveryWrite,
    /// Flush to the OS page cache only.
    OsDefault,
}

/// Configuration for the Write-Ahead Log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalConfig {
    /// When appended frames are forced to stable storage.
    pub sync_mode: SyncMode,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Result of scanning a WAL file.
#[derive(Debug)]
pub struct Recovery {
    /// Transactions of the valid prefix, in file order.
    pub entries: Vec<NymTxn>,
    /// Length of the prefix made of complete, well-framed entries.
    pub valid_len: u64,
    /// Offset of a bad frame that has valid frames after it. Such a file
    /// lost data in the middle and must not be truncated.
    pub damaged: Option<u64>,
}

struct WalWriter {
    file: File,
    offset: u64,
}

/// Crash-recoverable storage for committed transactions.
///
/// On-disk format, one frame per transaction:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized NymTxn)]
/// ```
/// Recovery stops at the first bad frame. If nothing valid follows it the
/// frame is a torn tail and may be truncated; otherwise the file is damaged.
pub struct WriteAheadLog {
    path: PathBuf,
    writer: Mutex<WalWriter>,
    config: WalConfig,
}

impl WriteAheadLog {
    /// Open (or create) a WAL file at the given path.
    pub fn open(path: &Path, config: WalConfig) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(WalWriter { file, offset }),
            config,
        })
    }

    /// Append one transaction. Returns the byte offset of its frame.
    ///
    /// A failed write is rolled back to the frame start and reported as
    /// `Io`. If the rollback fails too the file holds a partial frame and the
    /// error is an `IntegrityViolation`.
    pub fn append(&self, txn: &NymTxn) -> Result<u64, LedgerError> {
        let payload =
            bincode::serialize(txn).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        frame.extend_from_slice(&payload);

        let mut w = self.lock()?;
        let entry_offset = w.offset;

        let written = w.file.write_all(&frame).and_then(|()| match self.config.sync_mode {
            SyncMode::EveryWrite => w.file.sync_data(),
            SyncMode::OsDefault => Ok(()),
        });
        if let Err(e) = written {
            return match w.file.set_len(entry_offset) {
                Ok(()) => {
                    warn!(offset = entry_offset, seq_no = txn.seq_no, error = %e, "WAL write failed; rolled back");
                    Err(e.into())
                }
                Err(rollback) => {
                    error!(offset = entry_offset, seq_no = txn.seq_no, error = %e, %rollback, "WAL rollback failed");
                    Err(LedgerError::IntegrityViolation {
                        seq_no: txn.seq_no,
                        reason: format!("WAL write failed ({e}) and could not be rolled back ({rollback})"),
                    })
                }
            };
        }

        w.offset += frame.len() as u64;

        debug!(offset = entry_offset, len = payload.len(), seq_no = txn.seq_no, "WAL append");
        Ok(entry_offset)
    }

    /// Read every valid frame from the start of the file.
    pub fn recover(&self) -> Result<Recovery, LedgerError> {
        let data = fs::read(&self.path)?;
        let mut entries = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            match decode_frame(&data, offset) {
                Some((txn, next)) => {
                    entries.push(txn);
                    offset = next;
                }
                None => {
                    warn!(offset, file_len = data.len(), "bad WAL frame; stopping recovery");
                    break;
                }
            }
        }

        let damaged = (offset < data.len()
            && (offset + 1..data.len()).any(|o| decode_frame(&data, o).is_some()))
        .then_some(offset as u64);
        if let Some(at) = damaged {
            error!(offset = at, "valid WAL frames follow a bad frame");
        }

        debug!(recovered = entries.len(), valid_len = offset, "WAL recovery complete");
        Ok(Recovery {
            entries,
            valid_len: offset as u64,
            damaged,
        })
    }

    /// Cut the file back to `len` bytes, discarding a torn tail.
    pub fn truncate_to(&self, len: u64) -> Result<(), LedgerError> {
        let mut w = self.lock()?;
        w.file.set_len(len)?;
        w.file.sync_all()?;
        w.offset = len;
        debug!(len, "WAL truncated");
        Ok(())
    }

    /// Fsync everything written so far.
    pub fn sync(&self) -> Result<(), LedgerError> {
        self.lock()?.file.sync_all()?;
        Ok(())
    }

    /// Current write offset.
    pub fn offset(&self) -> u64 {
        self.writer.lock().map(|w| w.offset).unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, WalWriter>, LedgerError> {
        self.writer
            .lock()
            .map_err(|_| LedgerError::Io("WAL mutex poisoned".into()))
    }
}

/// Decode the frame starting at `offset`, returning it with the offset of
/// the next frame. `None` unless the frame is complete, matches its CRC and
/// decodes.
fn decode_frame(data: &[u8], offset: usize) -> Option<(NymTxn, usize)> {
    let header = data.get(offset..offset.checked_add(HEADER_SIZE)?)?;
    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if length == 0 {
        return None;
    }

    let start = offset + HEADER_SIZE;
    let payload = data.get(start..start.checked_add(length)?)?;
    if crc32fast::hash(payload) != expected_crc {
        return None;
    }
    let txn = bincode::deserialize::<NymTxn>(payload).ok()?;
    Some((txn, start + length))
}
