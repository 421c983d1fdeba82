//! Table artifact header.
//!
//! Every artifact starts with an [`ArtifactHeader`] describing the payload
//! that follows it:
//! - magic bytes and format version
//! - CRC32 checksum of the payload
//! - payload length, so truncation is detected before decoding

use crate::common::config::{ARTIFACT_MAGIC, ARTIFACT_VERSION};

/// Metadata stored at the beginning of every table artifact.
///
/// # Layout (17 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     magic (b"ARBT")
/// 4       1     version
/// 5       4     checksum (CRC32 of payload, little-endian)
/// 9       8     payload_len (little-endian)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactHeader {
    /// Format version the payload was written with.
    pub version: u8,
    /// CRC32 checksum of the payload bytes.
    pub checksum: u32,
    /// Number of payload bytes following the header.
    pub payload_len: u64,
}

impl ArtifactHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 17;

    /// Offset of each field within the header.
    pub const OFFSET_MAGIC: usize = 0;
    pub const OFFSET_VERSION: usize = 4;
    pub const OFFSET_CHECKSUM: usize = 5;
    pub const OFFSET_PAYLOAD_LEN: usize = 9;

    /// Build the header for `payload` at the current format version.
    pub fn for_payload(payload: &[u8]) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            checksum: Self::compute_checksum(payload),
            payload_len: payload.len() as u64,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// Returns `None` if the slice is too short or the magic bytes differ.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        if data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4] != ARTIFACT_MAGIC {
            return None;
        }

        let version = data[Self::OFFSET_VERSION];

        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]);

        let mut payload_len = [0u8; 8];
        payload_len.copy_from_slice(&data[Self::OFFSET_PAYLOAD_LEN..Self::OFFSET_PAYLOAD_LEN + 8]);

        Some(Self {
            version,
            checksum: u32::from_le_bytes(checksum),
            payload_len: u64::from_le_bytes(payload_len),
        })
    }

    /// Serialize this header.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut data = [0u8; Self::SIZE];
        data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4].copy_from_slice(&ARTIFACT_MAGIC);
        data[Self::OFFSET_VERSION] = self.version;
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&self.checksum.to_le_bytes());
        data[Self::OFFSET_PAYLOAD_LEN..Self::OFFSET_PAYLOAD_LEN + 8]
            .copy_from_slice(&self.payload_len.to_le_bytes());
        data
    }

    /// Compute the CRC32 checksum of a payload.
    pub fn compute_checksum(payload: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(payload);
        hasher.finalize()
    }

    /// Verify that the stored checksum matches the computed checksum.
    pub fn verify_checksum(&self, payload: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let original = ArtifactHeader {
            version: ARTIFACT_VERSION,
            checksum: 0xDEADBEEF,
            payload_len: 0x0102_0304_0506,
        };

        let bytes = original.to_bytes();
        assert_eq!(ArtifactHeader::from_bytes(&bytes), Some(original));
    }

    #[test]
    fn test_header_byte_layout() {
        let header = ArtifactHeader {
            version: 1,
            checksum: 0x04030201,   // Little-endian: 01 02 03 04
            payload_len: 0x0807060504030201,
        };

        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"ARBT");
        assert_eq!(bytes[4], 1);
        assert_eq!(bytes[5], 0x01); // checksum byte 0 (LSB)
        assert_eq!(bytes[8], 0x04); // checksum byte 3 (MSB)
        assert_eq!(bytes[9], 0x01); // payload_len byte 0 (LSB)
        assert_eq!(bytes[16], 0x08); // payload_len byte 7 (MSB)
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = ArtifactHeader::for_payload(b"{}").to_bytes();
        bytes[0] = b'X';
        assert_eq!(ArtifactHeader::from_bytes(&bytes), None);
    }

    #[test]
    fn test_short_buffer_rejected() {
        assert_eq!(ArtifactHeader::from_bytes(b"ARBT"), None);
    }

    #[test]
    fn test_checksum_verify() {
        let payload = br#"{"name":"t"}"#.to_vec();
        let header = ArtifactHeader::for_payload(&payload);
        assert!(header.verify_checksum(&payload));
        assert_eq!(header.payload_len, payload.len() as u64);

        let mut corrupted = payload;
        corrupted[3] ^= 0xFF;
        assert!(!header.verify_checksum(&corrupted));
    }
}
