//! Versioned on-disk storage of sync state.
//!
//! The state file is laid out as a 4-byte little-endian header length, a
//! bincode-encoded [`StateHeader`], then the bincode-encoded payload. The
//! header identifies the format and carries a checksum of the payload bytes.

use std::io::Write;
use std::path::{Path, PathBuf};

use bsync_common::ContentHash;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Magic bytes identifying a bsync state file.
const STATE_MAGIC: [u8; 4] = *b"BSYN";

/// Layout version of the persisted payload. Bump whenever any persisted
/// type changes shape; older files are then ignored.
pub const STATE_SCHEMA_VERSION: u32 = 1;

/// File name of the state file inside the state directory.
pub const STATE_FILE_NAME: &str = "sync_state.bin";

/// Header written in front of every state payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHeader {
    /// Must be `b"BSYN"`.
    pub magic: [u8; 4],
    /// Payload layout version.
    pub schema_version: u32,
    /// Version of the tool that wrote the file.
    pub tool_version: String,
    /// Hash of the payload bytes.
    pub checksum: ContentHash,
}

/// Reads and writes the state file in one directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
    tool_version: String,
}

impl StateStore {
    /// Creates a store rooted at `dir`, tagging writes with `tool_version`.
    pub fn new(dir: &Path, tool_version: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            tool_version: tool_version.to_string(),
        }
    }

    /// Path of the state file.
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE_NAME)
    }

    /// Loads the stored state.
    ///
    /// Returns `None` if the file is missing, truncated, has the wrong magic
    /// or schema version, fails its checksum, or does not decode as `T`.
    /// A miss means the next sync starts from scratch.
    pub fn load<T: DeserializeOwned>(&self) -> Option<T> {
        let path = self.state_path();
        let raw = std::fs::read(&path).ok()?;
        let (header, payload) = split_header(&raw)?;

        if header.magic != STATE_MAGIC || header.schema_version != STATE_SCHEMA_VERSION {
            tracing::info!(
                target: "bsync.cache",
                found = header.schema_version,
                expected = STATE_SCHEMA_VERSION,
                "ignoring state file with a different layout"
            );
            return None;
        }
        if ContentHash::from_bytes(payload) != header.checksum {
            tracing::warn!(target: "bsync.cache", path = %path.display(), "state checksum mismatch");
            return None;
        }

        let (value, _) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard()).ok()?;
        tracing::debug!(
            target: "bsync.cache",
            written_by = %header.tool_version,
            bytes = payload.len(),
            "loaded sync state"
        );
        Some(value)
    }

    /// Persists `state`, replacing the previous file atomically.
    ///
    /// The bytes go to a temporary file in the same directory which is then
    /// renamed over the state file, so readers see either the old or the new
    /// state in full.
    pub fn save<T: Serialize>(&self, state: &T) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let payload = encode(state)?;
        let header = StateHeader {
            magic: STATE_MAGIC,
            schema_version: STATE_SCHEMA_VERSION,
            tool_version: self.tool_version.clone(),
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = encode(&header)?;

        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        let tmp = self.dir.join(format!("{STATE_FILE_NAME}.tmp"));
        write_synced(&tmp, &output).map_err(|e| CacheError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        let path = self.state_path();
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Deletes the state file. Returns `true` if one existed.
    pub fn clear(&self) -> Result<bool, CacheError> {
        let path = self.state_path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CacheError> {
    bincode::serde::encode_to_vec(value, bincode::config::standard()).map_err(|e| {
        CacheError::Serialization {
            reason: e.to_string(),
        }
    })
}

fn split_header(raw: &[u8]) -> Option<(StateHeader, &[u8])> {
    if raw.len() < 4 {
        return None;
    }
    let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
    let body = raw.get(4..)?;
    if body.len() < header_len {
        return None;
    }
    let (header, _) =
        bincode::serde::decode_from_slice(&body[..header_len], bincode::config::standard())
            .ok()?;
    Some((header, &body[header_len..]))
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
