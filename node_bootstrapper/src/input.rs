//! Contract file loading

use crate::error::ProvisionError;
use nbc_compiler::config::compile_time::input::MAX_CONTRACT_BYTES;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Read a contract document, enforcing the size limit and UTF-8
pub fn read_contract(path: &Path) -> Result<Vec<u8>, ProvisionError> {
    read_contract_with_limit(path, MAX_CONTRACT_BYTES)
}

pub fn read_contract_with_limit(path: &Path, limit: u64) -> Result<Vec<u8>, ProvisionError> {
    let file = fs::File::open(path).map_err(|e| ProvisionError::read(path, e))?;
    let size = file
        .metadata()
        .map_err(|e| ProvisionError::read(path, e))?
        .len();
    if size > limit {
        return Err(ProvisionError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }

    // The file can grow between stat and read
    let mut bytes = Vec::with_capacity(size as usize);
    file.take(limit + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| ProvisionError::read(path, e))?;
    if bytes.len() as u64 > limit {
        return Err(ProvisionError::TooLarge {
            path: path.to_path_buf(),
            size: bytes.len() as u64,
            limit,
        });
    }

    if std::str::from_utf8(&bytes).is_err() {
        return Err(ProvisionError::Encoding {
            path: path.to_path_buf(),
        });
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reads_document() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"version":"v0"}"#).unwrap();

        let bytes = read_contract(file.path()).unwrap();
        assert_eq!(bytes, br#"{"version":"v0"}"#);
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[b' '; 64]).unwrap();

        assert_matches!(
            read_contract_with_limit(file.path(), 16),
            Err(ProvisionError::TooLarge {
                size: 64,
                limit: 16,
                ..
            })
        );
        assert!(read_contract_with_limit(file.path(), 64).is_ok());
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[b'{', 0xff, 0xfe, b'}']).unwrap();

        assert_matches!(
            read_contract(file.path()),
            Err(ProvisionError::Encoding { .. })
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            read_contract(&dir.path().join("absent.json")),
            Err(ProvisionError::Read { .. })
        );
    }
}
