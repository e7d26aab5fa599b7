//! Identity key read / write / provision commands.
//!
//! Exit codes:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Bad command line or nothing to write |
//! | 2 | Device could not be opened |
//! | 3 | Read failed or key truncated |
//! | 4 | Write failed |
//! | 5 | Not a valid identity key |

use std::path::Path;

use thiserror::Error;

use crate::error::{KeyFileError, KeyFileOp};
use crate::keyfile::{read_key_file, write_key_file};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CMDLINE: i32 = 1;
pub const EXIT_FILEOPEN: i32 = 2;
pub const EXIT_FILEREAD: i32 = 3;
pub const EXIT_FILEWRITE: i32 = 4;
pub const EXIT_INVALID: i32 = 5;

/// A failed key command: exit code and message for stderr.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct KeyToolError {
    pub exit_code: i32,
    pub message: String,
}

impl From<KeyFileError> for KeyToolError {
    fn from(err: KeyFileError) -> Self {
        Self {
            exit_code: exit_code_for(&err),
            message: err.user_message(),
        }
    }
}

/// Process exit code for a key file failure.
pub fn exit_code_for(err: &KeyFileError) -> i32 {
    match err {
        KeyFileError::EmptyPayload => EXIT_CMDLINE,
        KeyFileError::BadMagic { .. } | KeyFileError::EmptyKey => EXIT_INVALID,
        KeyFileError::TruncatedRead { .. } => EXIT_FILEREAD,
        KeyFileError::Io {
            operation: KeyFileOp::Open,
            ..
        } => EXIT_FILEOPEN,
        KeyFileError::Io { operation, .. } if operation.is_read() => EXIT_FILEREAD,
        KeyFileError::Io { .. } => EXIT_FILEWRITE,
    }
}

/// Read the key on `device` and return its payload as text.
pub fn read_command(device: &Path) -> Result<String, KeyToolError> {
    let key = read_key_file(device)?;
    Ok(key.payload_lossy())
}

/// Write `data` as the payload of a new key on `device`.
pub fn write_command(device: &Path, data: &str) -> Result<(), KeyToolError> {
    write_key_file(device, data.as_bytes())?;
    Ok(())
}

/// Write a key with a fresh random uuid to `device` and return the uuid.
pub fn provision_command(device: &Path) -> Result<String, KeyToolError> {
    let uuid = uuid::Uuid::new_v4().to_string();
    let payload = serde_json::json!({ "uuid": uuid }).to_string();
    write_key_file(device, payload.as_bytes())?;
    tracing::info!("Provisioned key {} on {}", uuid, device.display());
    Ok(uuid)
}

/// Print the outcome of a key command and return the exit code.
pub fn report<T: std::fmt::Display>(result: Result<T, KeyToolError>) -> i32 {
    match result {
        Ok(output) => {
            let output = output.to_string();
            if !output.is_empty() {
                println!("{}", output);
            }
            EXIT_SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            err.exit_code
        }
    }
}
