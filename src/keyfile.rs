//! Identity key file codec.
//!
//! An identity key is a raw block device (or a regular file, for testing)
//! holding a fixed header followed by an opaque payload:
//!
//! ```text
//! +--------+----------------+-----------------+
//! | "IDKY" | size: u64 (LE) | payload[size]   |
//! +--------+----------------+-----------------+
//! ```
//!
//! There is no checksum and no version field. The payload is normally UTF-8
//! JSON with a `uuid` member; the codec itself never looks inside it.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use crate::error::{AuthError, KeyFileError, KeyFileOp};

/// Magic tag at offset 0 of every identity key.
pub const MAGIC: [u8; 4] = *b"IDKY";

/// Header length: magic plus the 64-bit size field.
pub const HEADER_LEN: usize = MAGIC.len() + std::mem::size_of::<u64>();

/// Decoded contents of an identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFile {
    pub magic: [u8; 4],
    pub size: u64,
    pub payload: Vec<u8>,
}

impl KeyFile {
    /// Payload as text, replacing invalid UTF-8.
    pub fn payload_lossy(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// Parse the payload as a JSON object and return its `uuid` field.
    ///
    /// A numeric `uuid` is accepted in its JSON text form. Any other
    /// non-string value counts as missing.
    pub fn uuid(&self) -> Result<String, AuthError> {
        let value: serde_json::Value =
            serde_json::from_slice(&self.payload).map_err(|e| AuthError::BadPayload {
                message: e.to_string(),
            })?;

        let object = value.as_object().ok_or_else(|| AuthError::BadPayload {
            message: "payload is not a JSON object".to_string(),
        })?;

        match object.get("uuid") {
            Some(serde_json::Value::String(uuid)) if !uuid.is_empty() => Ok(uuid.clone()),
            Some(serde_json::Value::Number(number)) => Ok(number.to_string()),
            _ => Err(AuthError::MissingUuid),
        }
    }
}

/// Write the header and `payload` to `writer`.
pub fn encode<W: Write>(mut writer: W, payload: &[u8]) -> Result<(), KeyFileError> {
    if payload.is_empty() {
        return Err(KeyFileError::EmptyPayload);
    }

    let mut header = [0u8; HEADER_LEN];
    header[..MAGIC.len()].copy_from_slice(&MAGIC);
    header[MAGIC.len()..].copy_from_slice(&(payload.len() as u64).to_le_bytes());

    writer
        .write_all(&header)
        .map_err(|e| KeyFileError::io(KeyFileOp::WriteHeader, None, e))?;
    writer
        .write_all(payload)
        .map_err(|e| KeyFileError::io(KeyFileOp::WriteData, None, e))?;
    writer
        .flush()
        .map_err(|e| KeyFileError::io(KeyFileOp::Flush, None, e))
}

/// Read one identity key from `reader`.
///
/// The magic is checked before the size field is used for anything, and the
/// payload buffer grows with the bytes actually read rather than the size
/// the header claims. A header declaring zero bytes is rejected.
pub fn decode<R: Read>(mut reader: R) -> Result<KeyFile, KeyFileError> {
    let mut header = [0u8; HEADER_LEN];
    let got = read_full(&mut reader, &mut header)?;
    if got < HEADER_LEN {
        return Err(KeyFileError::TruncatedRead {
            expected: HEADER_LEN as u64,
            actual: got as u64,
        });
    }

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&header[..MAGIC.len()]);
    if magic != MAGIC {
        return Err(KeyFileError::BadMagic { found: magic });
    }

    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&header[MAGIC.len()..]);
    let size = u64::from_le_bytes(size_bytes);

    if size == 0 {
        return Err(KeyFileError::EmptyKey);
    }

    let mut payload = Vec::new();
    reader
        .by_ref()
        .take(size)
        .read_to_end(&mut payload)
        .map_err(|e| KeyFileError::io(KeyFileOp::ReadData, None, e))?;

    if (payload.len() as u64) < size {
        return Err(KeyFileError::TruncatedRead {
            expected: size,
            actual: payload.len() as u64,
        });
    }

    Ok(KeyFile {
        magic,
        size,
        payload,
    })
}

/// Write an identity key to the device or file at `path`.
///
/// Fails with [`KeyFileError::EmptyPayload`] before opening anything.
pub fn write_key_file(path: &Path, payload: &[u8]) -> Result<(), KeyFileError> {
    if payload.is_empty() {
        return Err(KeyFileError::EmptyPayload);
    }

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .map_err(|e| KeyFileError::io(KeyFileOp::Open, Some(path.to_path_buf()), e))?;

    encode(&file, payload).map_err(|err| with_path(err, path))?;
    file.sync_all()
        .map_err(|e| KeyFileError::io(KeyFileOp::Sync, Some(path.to_path_buf()), e))?;

    tracing::debug!("Wrote identity key ({} bytes) to {}", payload.len(), path.display());
    Ok(())
}

/// Read the identity key stored on the device or file at `path`.
pub fn read_key_file(path: &Path) -> Result<KeyFile, KeyFileError> {
    let file = File::open(path)
        .map_err(|e| KeyFileError::io(KeyFileOp::Open, Some(path.to_path_buf()), e))?;
    let key = decode(file).map_err(|err| with_path(err, path))?;
    tracing::trace!("Read identity key ({} bytes) from {}", key.size, path.display());
    Ok(key)
}

fn with_path(err: KeyFileError, path: &Path) -> KeyFileError {
    match err {
        KeyFileError::Io {
            operation,
            path: None,
            message,
        } => KeyFileError::Io {
            operation,
            path: Some(path.to_path_buf()),
            message,
        },
        other => other,
    }
}

/// Fill `buf` as far as the reader allows; returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, KeyFileError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(KeyFileError::io(KeyFileOp::ReadHeader, None, e)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn encoded(payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        encode(&mut buf, payload).unwrap();
        buf
    }

    #[test]
    fn test_header_layout() {
        let buf = encoded(b"{\"uuid\":\"abc\"}");
        assert_eq!(&buf[..4], b"IDKY");
        assert_eq!(&buf[4..12], &14u64.to_le_bytes());
        assert_eq!(&buf[12..], b"{\"uuid\":\"abc\"}");
        assert_eq!(HEADER_LEN, 12);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sdx");
        let payload = br#"{"uuid":"abc-123"}"#;

        write_key_file(&path, payload).unwrap();
        let key = read_key_file(&path).unwrap();

        assert_eq!(key.magic, MAGIC);
        assert_eq!(key.size, payload.len() as u64);
        assert_eq!(key.payload, payload.to_vec());
    }

    #[test]
    fn test_empty_payload_rejected_before_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never-created");

        assert_eq!(write_key_file(&path, b""), Err(KeyFileError::EmptyPayload));
        assert!(!path.exists());
    }

    #[test]
    fn test_bad_magic() {
        let mut buf = encoded(b"data");
        buf[..4].copy_from_slice(b"XDKY");
        assert_eq!(
            decode(Cursor::new(buf)),
            Err(KeyFileError::BadMagic { found: *b"XDKY" })
        );
    }

    #[test]
    fn test_bad_magic_wins_over_huge_size() {
        let mut buf = b"NOPE".to_vec();
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            decode(Cursor::new(buf)),
            Err(KeyFileError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let mut buf = encoded(b"0123456789");
        buf.truncate(HEADER_LEN + 4);
        assert_eq!(
            decode(Cursor::new(buf)),
            Err(KeyFileError::TruncatedRead {
                expected: 10,
                actual: 4
            })
        );
    }

    #[test]
    fn test_truncated_header() {
        assert_eq!(
            decode(Cursor::new(b"IDKY\x01".to_vec())),
            Err(KeyFileError::TruncatedRead {
                expected: 12,
                actual: 5
            })
        );
    }

    #[test]
    fn test_large_payload_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sdx");
        let payload = vec![b'a'; 70_000];

        write_key_file(&path, &payload).unwrap();
        let key = read_key_file(&path).unwrap();

        assert_eq!(key.size, 70_000);
        assert_eq!(key.payload, payload);
    }

    #[test]
    fn test_large_declared_size_with_few_bytes() {
        let mut buf = MAGIC.to_vec();
        buf.extend_from_slice(&100_000u64.to_le_bytes());
        buf.extend_from_slice(b"short");
        assert_eq!(
            decode(Cursor::new(buf)),
            Err(KeyFileError::TruncatedRead {
                expected: 100_000,
                actual: 5
            })
        );
    }

    #[test]
    fn test_huge_declared_size_does_not_allocate() {
        let mut buf = MAGIC.to_vec();
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        assert_eq!(
            decode(Cursor::new(buf)),
            Err(KeyFileError::TruncatedRead {
                expected: u64::MAX,
                actual: 0
            })
        );
    }

    #[test]
    fn test_zero_declared_size() {
        let mut buf = MAGIC.to_vec();
        buf.extend_from_slice(&0u64.to_le_bytes());
        buf.extend_from_slice(b"ignored");
        assert_eq!(decode(Cursor::new(buf)), Err(KeyFileError::EmptyKey));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        // A block device keeps whatever follows the payload.
        let mut buf = encoded(b"abc");
        buf.extend_from_slice(&[0u8; 512]);
        let key = decode(Cursor::new(buf)).unwrap();
        assert_eq!(key.payload, b"abc".to_vec());
    }

    #[test]
    fn test_missing_file_is_io_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent");
        match read_key_file(&path) {
            Err(KeyFileError::Io { path: Some(p), .. }) => assert_eq!(p, path),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_uuid_extraction() {
        let key = decode(Cursor::new(encoded(br#"{"uuid":"abc-123","name":"x"}"#))).unwrap();
        assert_eq!(key.uuid().unwrap(), "abc-123");
    }

    #[test]
    fn test_uuid_errors() {
        let key = decode(Cursor::new(encoded(b"not json"))).unwrap();
        assert!(matches!(key.uuid(), Err(AuthError::BadPayload { .. })));

        let key = decode(Cursor::new(encoded(b"[1,2]"))).unwrap();
        assert!(matches!(key.uuid(), Err(AuthError::BadPayload { .. })));

        let key = decode(Cursor::new(encoded(br#"{"id":"abc"}"#))).unwrap();
        assert_eq!(key.uuid(), Err(AuthError::MissingUuid));

        let key = decode(Cursor::new(encoded(br#"{"uuid":null}"#))).unwrap();
        assert_eq!(key.uuid(), Err(AuthError::MissingUuid));

        let key = decode(Cursor::new(encoded(br#"{"uuid":""}"#))).unwrap();
        assert_eq!(key.uuid(), Err(AuthError::MissingUuid));
    }

    #[test]
    fn test_numeric_uuid() {
        let key = decode(Cursor::new(encoded(br#"{"uuid":12345}"#))).unwrap();
        assert_eq!(key.uuid().unwrap(), "12345");
    }
}
