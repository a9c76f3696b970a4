//! File header and kind definitions.
//!
//! Every persisted file starts with a [`FileHeader`] containing metadata:
//! - [`FileKind`] discriminator
//! - CRC32 checksum of the payload
//! - magic bytes and payload length

use crate::common::config::FILE_MAGIC;

/// Kind of structure stored in a file.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Unknown or corrupted file.
    #[default]
    Invalid = 0,
    /// Table root: schema, page list, max-key cache and index metadata.
    Table = 1,
    /// A page of rows.
    Page = 2,
    /// An index bucket of row references.
    Bucket = 3,
}

impl FileKind {
    /// Convert from u8, returning Invalid for unknown values.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FileKind::Table,
            2 => FileKind::Page,
            3 => FileKind::Bucket,
            _ => FileKind::Invalid,
        }
    }
}

/// Metadata stored at the beginning of every file.
///
/// # Layout (13 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     kind (FileKind as u8)
/// 1       4     checksum (CRC32 of the payload, little-endian)
/// 5       4     magic (b"GTDB")
/// 9       4     payload_len (little-endian)
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub kind: FileKind,
    pub checksum: u32,
    pub magic: [u8; 4],
    pub payload_len: u32,
}

impl FileHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 13;

    /// Offset of each field within the header.
    pub const OFFSET_KIND: usize = 0;
    pub const OFFSET_CHECKSUM: usize = 1;
    pub const OFFSET_MAGIC: usize = 5;
    pub const OFFSET_PAYLOAD_LEN: usize = 9;

    /// Create a header describing `payload`.
    pub fn new(kind: FileKind, payload: &[u8]) -> Self {
        Self {
            kind,
            checksum: Self::compute_checksum(payload),
            magic: FILE_MAGIC,
            payload_len: payload.len() as u32,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < FileHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for FileHeader");

        let kind = FileKind::from_u8(data[Self::OFFSET_KIND]);

        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]);

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4]);

        let mut payload_len = [0u8; 4];
        payload_len.copy_from_slice(&data[Self::OFFSET_PAYLOAD_LEN..Self::OFFSET_PAYLOAD_LEN + 4]);

        Self {
            kind,
            checksum: u32::from_le_bytes(checksum),
            magic,
            payload_len: u32::from_le_bytes(payload_len),
        }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < FileHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for FileHeader");

        data[Self::OFFSET_KIND] = self.kind as u8;
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&self.checksum.to_le_bytes());
        data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4].copy_from_slice(&self.magic);
        data[Self::OFFSET_PAYLOAD_LEN..Self::OFFSET_PAYLOAD_LEN + 4]
            .copy_from_slice(&self.payload_len.to_le_bytes());
    }

    /// Compute the CRC32 checksum of a payload.
    pub fn compute_checksum(payload: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(payload);
        hasher.finalize()
    }

    /// Verify that the stored checksum matches the payload.
    pub fn verify_checksum(&self, payload: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(payload)
    }

    /// Whether the magic bytes identify a gridtabledb file.
    #[inline]
    pub fn has_valid_magic(&self) -> bool {
        self.magic == FILE_MAGIC
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // --- FileKind tests ---

    #[test]
    fn test_file_kind_from_u8() {
        assert_eq!(FileKind::from_u8(0), FileKind::Invalid);
        assert_eq!(FileKind::from_u8(1), FileKind::Table);
        assert_eq!(FileKind::from_u8(2), FileKind::Page);
        assert_eq!(FileKind::from_u8(3), FileKind::Bucket);
        assert_eq!(FileKind::from_u8(255), FileKind::Invalid);
    }

    // --- FileHeader tests ---

    #[test]
    fn test_file_header_new() {
        let header = FileHeader::new(FileKind::Page, b"{}");
        assert_eq!(header.kind, FileKind::Page);
        assert_eq!(header.payload_len, 2);
        assert!(header.has_valid_magic());
        assert!(header.verify_checksum(b"{}"));
    }

    #[test]
    fn test_file_header_roundtrip() {
        let original = FileHeader {
            kind: FileKind::Bucket,
            checksum: 0xDEADBEEF,
            magic: FILE_MAGIC,
            payload_len: 4096,
        };

        let mut buffer = [0u8; FileHeader::SIZE];
        original.write_to(&mut buffer);

        let recovered = FileHeader::from_bytes(&buffer);
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_file_header_byte_layout() {
        let header = FileHeader {
            kind: FileKind::Table,
            checksum: 0x04030201, // Little-endian: 01 02 03 04
            magic: FILE_MAGIC,
            payload_len: 0x0A,
        };

        let mut buffer = [0u8; FileHeader::SIZE];
        header.write_to(&mut buffer);

        assert_eq!(buffer[0], 1); // FileKind::Table
        assert_eq!(buffer[1], 0x01); // checksum byte 0 (LSB)
        assert_eq!(buffer[4], 0x04); // checksum byte 3 (MSB)
        assert_eq!(&buffer[5..9], b"GTDB");
        assert_eq!(buffer[9], 0x0A);
        assert_eq!(buffer[12], 0x00);
    }

    // --- Checksum tests ---

    #[test]
    fn test_checksum_deterministic() {
        let payload = br#"{"rows":[1,2,3]}"#;
        let checksum1 = FileHeader::compute_checksum(payload);
        let checksum2 = FileHeader::compute_checksum(payload);

        assert_eq!(checksum1, checksum2);
        assert_ne!(checksum1, 0);
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut payload = br#"{"rows":[1,2,3]}"#.to_vec();
        let header = FileHeader::new(FileKind::Page, &payload);
        assert!(header.verify_checksum(&payload));

        payload[9] = b'9';
        assert!(!header.verify_checksum(&payload));
    }

    #[test]
    fn test_bad_magic() {
        let mut header = FileHeader::new(FileKind::Page, b"x");
        header.magic = *b"NOPE";
        assert!(!header.has_valid_magic());
    }
}
