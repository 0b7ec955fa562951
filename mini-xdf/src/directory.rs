use crate::dirent::{
    DirEntry, DELETED_ENTRY_PREFIX, DIRECTORY_ENTRY_BYTES, END_OF_DIRECTORY_PREFIX,
};
use crate::fat::{Cluster, FatTable};
use crate::Error;
use std::fmt;

/// Where a directory's records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryLocation {
    /// The fixed root directory region between the FATs and the data area.
    Root,
    /// A cluster chain in the data area, named by its first cluster.
    Chain(Cluster),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    location: DirectoryLocation,
    entries: Vec<DirEntry>,
    capacity: usize,
}

impl Directory {
    /// An empty directory able to hold `capacity` entries before it must grow.
    pub fn new(location: DirectoryLocation, capacity: usize) -> Self {
        Self {
            location,
            entries: Vec::new(),
            capacity,
        }
    }

    fn entries_from_contiguous<'a>(raw: &'a [u8]) -> impl 'a + Iterator<Item = DirEntry> {
        raw.chunks_exact(DIRECTORY_ENTRY_BYTES)
            .filter_map(|raw_entry| <&[u8; DIRECTORY_ENTRY_BYTES]>::try_from(raw_entry).ok())
            .take_while(|raw_entry| raw_entry[0] != END_OF_DIRECTORY_PREFIX)
            .filter(|raw_entry| raw_entry[0] != DELETED_ENTRY_PREFIX)
            .map(DirEntry::decode)
    }

    /// Decodes records up to the first one starting with a zero byte,
    /// skipping deleted records.
    pub fn decode(location: DirectoryLocation, raw: &[u8]) -> Self {
        Self {
            location,
            entries: Self::entries_from_contiguous(raw).collect(),
            capacity: raw.len() / DIRECTORY_ENTRY_BYTES,
        }
    }

    /// Live records in order. The end of the directory is implied by the
    /// zero bytes already present after them.
    pub fn encode(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.entries.len() * DIRECTORY_ENTRY_BYTES);
        for entry in &self.entries {
            raw.extend_from_slice(&entry.encode());
        }
        raw
    }

    /// Appends an entry, growing a subdirectory's chain by one cluster when
    /// it is already full. The root directory cannot grow.
    pub fn add_entry(&mut self, entry: DirEntry, fat: &mut FatTable) -> Result<(), Error> {
        if self.entries.len() >= self.capacity {
            match self.location {
                DirectoryLocation::Root => return Err(Error::RootDirFull),
                DirectoryLocation::Chain(cluster) => {
                    fat.extend(cluster)?;
                    self.capacity += fat.bytes_per_cluster() as usize / DIRECTORY_ENTRY_BYTES;
                }
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn location(&self) -> DirectoryLocation {
        self.location
    }

    /// First cluster of the directory, or 0 for the root, matching what a
    /// `..` entry stores for it.
    pub fn cluster(&self) -> Cluster {
        match self.location {
            DirectoryLocation::Root => 0,
            DirectoryLocation::Chain(cluster) => cluster,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn find_entry(&self, name: &str) -> Option<&DirEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date;
    use crate::dirent::attributes;
    use crate::geometry::{Format, Geometry};

    fn geometry() -> Geometry {
        Geometry::from_format(Format::TwoHd).unwrap()
    }

    fn file(name: &str, cluster: Cluster, size: u32) -> DirEntry {
        DirEntry::new(name, attributes::ARCHIVE, cluster, date::earliest()).with_file_size(size)
    }

    #[test]
    fn encode_decode() {
        let geometry = geometry();
        let mut fat = FatTable::new(&geometry);
        let mut directory = Directory::new(DirectoryLocation::Root, geometry.root_entry_count());
        directory.add_entry(file("A.TXT", 2, 10), &mut fat).unwrap();
        directory.add_entry(file("LONGFILENAME.DOC", 3, 2000), &mut fat).unwrap();
        directory
            .add_entry(
                DirEntry::new("SUB", attributes::DIRECTORY, 5, date::earliest()),
                &mut fat,
            )
            .unwrap();
        let mut raw = directory.encode();
        assert_eq!(raw.len(), 3 * DIRECTORY_ENTRY_BYTES);
        raw.resize(geometry.root_directory_bytes(), 0);
        let decoded = Directory::decode(DirectoryLocation::Root, &raw);
        assert_eq!(decoded.entries(), directory.entries());
        assert_eq!(decoded.capacity(), 192);
    }

    #[test]
    fn decode_stops_at_terminator_and_skips_deleted() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&file("A", 2, 1).encode());
        let mut deleted = file("B", 3, 1).encode();
        deleted[0] = DELETED_ENTRY_PREFIX;
        raw.extend_from_slice(&deleted);
        raw.extend_from_slice(&file("C", 4, 1).encode());
        raw.extend_from_slice(&[0; DIRECTORY_ENTRY_BYTES]);
        raw.extend_from_slice(&file("D", 5, 1).encode());
        let directory = Directory::decode(DirectoryLocation::Chain(9), &raw);
        let names = directory
            .entries()
            .iter()
            .map(|entry| entry.name())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn trailing_partial_record_is_ignored() {
        let mut raw = file("A", 2, 1).encode().to_vec();
        raw.extend_from_slice(&file("B", 3, 1).encode()[..20]);
        let directory = Directory::decode(DirectoryLocation::Chain(9), &raw);
        assert_eq!(directory.entries().len(), 1);
        assert_eq!(directory.entries()[0].name(), "A");
    }

    #[test]
    fn root_directory_is_fixed() {
        let geometry = geometry();
        let mut fat = FatTable::new(&geometry);
        let mut directory = Directory::new(DirectoryLocation::Root, 2);
        directory.add_entry(file("A", 0, 0), &mut fat).unwrap();
        directory.add_entry(file("B", 0, 0), &mut fat).unwrap();
        assert!(matches!(
            directory.add_entry(file("C", 0, 0), &mut fat),
            Err(Error::RootDirFull)
        ));
        assert_eq!(directory.entries().len(), 2);
        assert_eq!(fat, FatTable::new(&geometry));
    }

    #[test]
    fn subdirectory_grows_by_one_cluster() {
        let geometry = geometry();
        let mut fat = FatTable::new(&geometry);
        let cluster = fat.allocate(0).unwrap();
        let per_cluster = geometry.bytes_per_cluster() as usize / DIRECTORY_ENTRY_BYTES;
        let mut directory = Directory::new(DirectoryLocation::Chain(cluster), per_cluster);
        for i in 0..per_cluster {
            directory
                .add_entry(file(&format!("F{}", i), 0, 0), &mut fat)
                .unwrap();
        }
        assert_eq!(fat.chain_of(cluster).unwrap().len(), 1);
        directory.add_entry(file("ONEMORE", 0, 0), &mut fat).unwrap();
        assert_eq!(fat.chain_of(cluster).unwrap(), vec![2, 3]);
        assert_eq!(directory.capacity(), 2 * per_cluster);
        assert_eq!(directory.cluster(), 2);
    }
}
