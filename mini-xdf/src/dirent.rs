use crate::date::PackedDateTime;
use crate::fat::Cluster;
use chrono::NaiveDateTime;
use encoding_rs::SHIFT_JIS;
use std::fmt;

pub mod attributes {
    pub const READ_ONLY: u8 = 0x01;
    pub const HIDDEN: u8 = 0x02;
    pub const SYSTEM: u8 = 0x04;
    pub const VOLUME_ID: u8 = 0x08;
    pub const DIRECTORY: u8 = 0x10;
    pub const ARCHIVE: u8 = 0x20;
}

pub const DIRECTORY_ENTRY_BYTES: usize = 32;
pub const DELETED_ENTRY_PREFIX: u8 = 0xE5;
pub const END_OF_DIRECTORY_PREFIX: u8 = 0;
/// Stands in for a genuine leading 0xE5 byte in a stored name.
const ESCAPED_DELETED_PREFIX: u8 = 0x05;

const MAIN_NAME_BYTES: usize = 8;
const EXTENSION_BYTES: usize = 3;
const OVERFLOW_NAME_BYTES: usize = 10;
const SPACE: u8 = b' ';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    VolumeLabel,
}

/// One 32-byte directory record.
///
/// Layout: name[8], ext[3], attributes, name overflow[10], time, date,
/// first cluster, file size. The name overflow field extends the 8-byte main
/// name to 18 bytes of Shift_JIS.
#[derive(Debug, Clone)]
pub struct DirEntry {
    name: String,
    attributes: u8,
    first_cluster: Cluster,
    file_size: u32,
    modified: NaiveDateTime,
    // index into the owning image's subdirectory registry; never stored on disk
    subdirectory: Option<usize>,
}

impl PartialEq for DirEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.attributes == other.attributes
            && self.first_cluster == other.first_cluster
            && self.file_size == other.file_size
            && self.modified == other.modified
    }
}

impl Eq for DirEntry {}

impl DirEntry {
    pub fn new(
        name: impl Into<String>,
        attributes: u8,
        first_cluster: Cluster,
        modified: NaiveDateTime,
    ) -> Self {
        Self {
            name: name.into(),
            attributes,
            first_cluster,
            file_size: 0,
            modified,
            subdirectory: None,
        }
    }

    pub fn with_file_size(self, file_size: u32) -> Self {
        Self { file_size, ..self }
    }

    pub(crate) fn with_subdirectory(self, index: usize) -> Self {
        Self {
            subdirectory: Some(index),
            ..self
        }
    }

    pub fn decode(raw: &[u8; DIRECTORY_ENTRY_BYTES]) -> Self {
        let name = decode_name(&raw[0..8], &raw[8..11], &raw[12..22]);
        let attributes = raw[11];
        let modified = PackedDateTime {
            time: u16::from_le_bytes(raw[22..24].try_into().unwrap()),
            date: u16::from_le_bytes(raw[24..26].try_into().unwrap()),
        }
        .unpack();
        let first_cluster = u16::from_le_bytes(raw[26..28].try_into().unwrap());
        let file_size = u32::from_le_bytes(raw[28..32].try_into().unwrap());
        Self {
            name,
            attributes,
            first_cluster,
            file_size,
            modified,
            subdirectory: None,
        }
    }

    pub fn encode(&self) -> [u8; DIRECTORY_ENTRY_BYTES] {
        let (main, extension, overflow) = encode_name(&self.name);
        let packed = PackedDateTime::pack(&self.modified);
        let mut raw = [0; DIRECTORY_ENTRY_BYTES];
        raw[0..8].copy_from_slice(&main);
        raw[8..11].copy_from_slice(&extension);
        raw[11] = self.attributes;
        raw[12..22].copy_from_slice(&overflow);
        raw[22..24].copy_from_slice(&packed.time.to_le_bytes());
        raw[24..26].copy_from_slice(&packed.date.to_le_bytes());
        raw[26..28].copy_from_slice(&self.first_cluster.to_le_bytes());
        raw[28..32].copy_from_slice(&self.file_size.to_le_bytes());
        raw
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> u8 {
        self.attributes
    }

    pub fn first_cluster(&self) -> Cluster {
        self.first_cluster
    }

    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    pub fn modified(&self) -> NaiveDateTime {
        self.modified
    }

    pub(crate) fn subdirectory(&self) -> Option<usize> {
        self.subdirectory
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & attributes::DIRECTORY != 0
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes & attributes::VOLUME_ID != 0
    }

    /// True for the `.` and `..` links inside a subdirectory.
    pub fn is_dot(&self) -> bool {
        self.name == "." || self.name == ".."
    }

    pub fn kind(&self) -> EntryKind {
        if self.is_directory() {
            EntryKind::Directory
        } else if self.is_volume_label() {
            EntryKind::VolumeLabel
        } else {
            EntryKind::File
        }
    }
}

impl fmt::Display for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind() {
            EntryKind::Directory => write!(f, "  <dir>   ")?,
            EntryKind::VolumeLabel => write!(f, "  <vol>   ")?,
            EntryKind::File => write!(f, "{:8}  ", self.file_size)?,
        }
        write!(
            f,
            "{}  {}",
            self.modified.format("%Y-%m-%d %_H:%M:%S"),
            self.name
        )
    }
}

fn trim_trailing_spaces(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != SPACE)
        .map_or(0, |index| index + 1);
    &bytes[..end]
}

fn decode_name(main: &[u8], extension: &[u8], overflow: &[u8]) -> String {
    let mut name = main.to_vec();
    if overflow[0] != 0 {
        name.extend(overflow.iter().map(|&b| if b == 0 { SPACE } else { b }));
    }
    let trimmed = trim_trailing_spaces(&name).len();
    name.truncate(trimmed);
    if name.first() == Some(&ESCAPED_DELETED_PREFIX) {
        name[0] = DELETED_ENTRY_PREFIX;
    }
    if extension.iter().any(|&b| b != SPACE) {
        name.push(b'.');
        name.extend_from_slice(trim_trailing_spaces(extension));
    }
    let (decoded, _) = SHIFT_JIS.decode_without_bom_handling(&name);
    decoded.into_owned()
}

fn encode_name(
    name: &str,
) -> (
    [u8; MAIN_NAME_BYTES],
    [u8; EXTENSION_BYTES],
    [u8; OVERFLOW_NAME_BYTES],
) {
    let (encoded, _, unmappable) = SHIFT_JIS.encode(name);
    if unmappable {
        log::warn!("'{}' has characters with no Shift_JIS encoding", name);
    }
    let mut bytes = encoded.into_owned();
    if bytes.first() == Some(&DELETED_ENTRY_PREFIX) {
        bytes[0] = ESCAPED_DELETED_PREFIX;
    }
    let (stem, extension) = match bytes.iter().rposition(|&b| b == b'.') {
        Some(dot) if name != "." && name != ".." && dot > 0 && bytes.len() - dot <= 4 => {
            (&bytes[..dot], &bytes[dot + 1..])
        }
        _ => (&bytes[..], &[][..]),
    };
    if stem.len() > MAIN_NAME_BYTES + OVERFLOW_NAME_BYTES {
        log::warn!("'{}' is truncated to {} bytes", name, MAIN_NAME_BYTES + OVERFLOW_NAME_BYTES);
    }
    let mut main = [SPACE; MAIN_NAME_BYTES];
    for (dst, &src) in main.iter_mut().zip(stem.iter()) {
        *dst = src;
    }
    let mut overflow = [0; OVERFLOW_NAME_BYTES];
    if stem.len() > MAIN_NAME_BYTES {
        let rest = &stem[MAIN_NAME_BYTES..stem.len().min(MAIN_NAME_BYTES + OVERFLOW_NAME_BYTES)];
        let rest = trim_trailing_spaces(rest);
        overflow[..rest.len()].copy_from_slice(rest);
    }
    let mut ext = [SPACE; EXTENSION_BYTES];
    for (dst, &src) in ext.iter_mut().zip(extension.iter()) {
        *dst = src;
    }
    (main, ext, overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date;

    fn round_trip(name: &str) -> String {
        let (main, extension, overflow) = encode_name(name);
        decode_name(&main, &extension, &overflow)
    }

    #[test]
    fn short_names() {
        assert_eq!(round_trip("A.TXT"), "A.TXT");
        assert_eq!(round_trip("README"), "README");
        assert_eq!(round_trip("COMMAND.X"), "COMMAND.X");
        assert_eq!(round_trip("."), ".");
        assert_eq!(round_trip(".."), "..");
    }

    #[test]
    fn name_field_layout() {
        let (main, extension, overflow) = encode_name("HUMAN.SYS");
        assert_eq!(&main, b"HUMAN   ");
        assert_eq!(&extension, b"SYS");
        assert_eq!(overflow, [0; 10]);
    }

    #[test]
    fn long_names_use_overflow_field() {
        let (main, extension, overflow) = encode_name("LONGFILENAME.DOC");
        assert_eq!(&main, b"LONGFILE");
        assert_eq!(&extension, b"DOC");
        assert_eq!(&overflow, b"NAME\0\0\0\0\0\0");
        assert_eq!(round_trip("LONGFILENAME.DOC"), "LONGFILENAME.DOC");
        assert_eq!(round_trip("EIGHTEEN_BYTES_ABC"), "EIGHTEEN_BYTES_ABC");
    }

    #[test]
    fn long_extension_stays_in_name() {
        assert_eq!(round_trip("notes.text"), "notes.text");
        let (_, extension, _) = encode_name("notes.text");
        assert_eq!(&extension, b"   ");
    }

    #[test]
    fn leading_dot_is_not_an_extension() {
        let (main, extension, _) = encode_name(".rc");
        assert_eq!(&main, b".rc     ");
        assert_eq!(&extension, b"   ");
    }

    #[test]
    fn shift_jis_names() {
        assert_eq!(round_trip("漢字.TXT"), "漢字.TXT");
        let (main, _, _) = encode_name("漢字.TXT");
        assert_eq!(&main[0..4], &[0x8A, 0xBF, 0x8E, 0x9A]);
    }

    #[test]
    fn deleted_marker_is_escaped() {
        // 乕 encodes as E5 68
        let (main, _, _) = encode_name("乕.DAT");
        assert_eq!(main[0], ESCAPED_DELETED_PREFIX);
        assert_eq!(main[1], 0x68);
        assert_eq!(round_trip("乕.DAT"), "乕.DAT");
    }

    #[test]
    fn record_round_trip() {
        let modified = date::earliest();
        let entry = DirEntry::new("A.TXT", attributes::ARCHIVE, 2, modified).with_file_size(10);
        let raw = entry.encode();
        assert_eq!(raw[11], attributes::ARCHIVE);
        assert_eq!(&raw[26..28], &[2, 0]);
        assert_eq!(&raw[28..32], &[10, 0, 0, 0]);
        let decoded = DirEntry::decode(&raw);
        assert_eq!(decoded, entry);
        assert_eq!(decoded.kind(), EntryKind::File);
    }

    #[test]
    fn kinds() {
        let modified = date::earliest();
        let directory = DirEntry::new("D", attributes::DIRECTORY, 5, modified);
        assert!(directory.is_directory());
        assert_eq!(directory.kind(), EntryKind::Directory);
        let label = DirEntry::new("VOLUME", attributes::VOLUME_ID, 0, modified);
        assert!(label.is_volume_label());
        assert_eq!(label.kind(), EntryKind::VolumeLabel);
    }

    #[test]
    fn listing_line() {
        let modified = chrono::NaiveDate::from_ymd_opt(2023, 4, 5)
            .unwrap()
            .and_hms_opt(9, 8, 6)
            .unwrap();
        let file = DirEntry::new("A.TXT", attributes::ARCHIVE, 2, modified).with_file_size(10);
        assert_eq!(file.to_string(), "      10  2023-04-05  9:08:06  A.TXT");
        let directory = DirEntry::new("D", attributes::DIRECTORY, 3, modified);
        assert_eq!(directory.to_string(), "  <dir>   2023-04-05  9:08:06  D");
    }
}
