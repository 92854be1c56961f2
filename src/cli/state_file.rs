//! Ledger state file (CBOR)
//!
//! Wraps the ledger snapshot together with the in-memory custodian's pooled
//! balance, which the ledger itself does not own.

use custody::custodian::Amount;
use custody::ledger::LedgerSnapshot;
use custody::serialization::{from_cbor, to_cbor};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub ledger: LedgerSnapshot,

    /// Pooled balance held by the custodian when the file was written
    #[serde(default)]
    pub pool_balance: Amount,
}

impl StateFile {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = fs::read(path)
            .map_err(|e| format!("Failed to read state file '{}': {}", path.display(), e))?;
        let state = from_cbor(&bytes)
            .map_err(|e| format!("Failed to decode state file '{}': {}", path.display(), e))?;
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let bytes = to_cbor(self)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create state directory: {}", e))?;
            }
        }

        // Write beside the target, then rename, so a crash never leaves a
        // truncated state file behind.
        let tmp = temp_path(path);
        fs::write(&tmp, bytes)
            .map_err(|e| format!("Failed to write state file '{}': {}", tmp.display(), e))?;
        fs::rename(&tmp, path)
            .map_err(|e| format!("Failed to replace state file '{}': {}", path.display(), e))?;

        Ok(())
    }
}

/// `<file name>.tmp` beside `path`, never equal to `path` itself.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
