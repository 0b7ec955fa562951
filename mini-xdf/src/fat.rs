use crate::geometry::Geometry;
use crate::Error;
use std::fmt;

pub type Cluster = u16;

pub const FREE_CLUSTER: Cluster = 0;
pub const END_OF_CHAIN: Cluster = 0xFFF;
const DEFECTIVE_CLUSTER: Cluster = 0xFF7;
const FIRST_END_OF_CHAIN: Cluster = 0xFF8;
const FIRST_DATA_CLUSTER: Cluster = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatLookupError {
    FreeCluster,
    ReservedEntry,
    DefectiveCluster,
    OutOfRange,
    Cycle,
}

enum ChainLink {
    Next(Cluster),
    EndOfChain,
}

fn classify_fat_entry(entry: Cluster, cluster_count: usize) -> Result<ChainLink, FatLookupError> {
    match entry {
        FREE_CLUSTER => Err(FatLookupError::FreeCluster),
        1 => Err(FatLookupError::ReservedEntry),
        entry => {
            if (entry as usize) < cluster_count {
                Ok(ChainLink::Next(entry))
            } else if entry < DEFECTIVE_CLUSTER {
                Err(FatLookupError::ReservedEntry)
            } else if entry == DEFECTIVE_CLUSTER {
                Err(FatLookupError::DefectiveCluster)
            } else {
                debug_assert!(entry >= FIRST_END_OF_CHAIN);
                Ok(ChainLink::EndOfChain)
            }
        }
    }
}

/// In-memory copy of the cluster allocation table.
///
/// Entry `n` holds the cluster following `n` in its chain, [`FREE_CLUSTER`]
/// or [`END_OF_CHAIN`]. Entries 0 and 1 are reserved and always hold
/// [`END_OF_CHAIN`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatTable {
    entries: Vec<Cluster>,
    media: u8,
    region_bytes: usize,
    bytes_per_cluster: u32,
}

impl FatTable {
    /// A table with every data cluster free.
    pub fn new(geometry: &Geometry) -> Self {
        let mut entries = vec![FREE_CLUSTER; geometry.cluster_count() as usize];
        entries[0] = END_OF_CHAIN;
        entries[1] = END_OF_CHAIN;
        Self {
            entries,
            media: geometry.media(),
            region_bytes: geometry.fat_bytes(),
            bytes_per_cluster: geometry.bytes_per_cluster(),
        }
    }

    /// Unpacks two 12-bit entries from every three bytes. Entry 0 overlaps
    /// the media byte and is reset to the sentinel.
    pub fn decode(geometry: &Geometry, raw: &[u8]) -> Self {
        let mut table = Self::new(geometry);
        let byte = |i: usize| raw.get(i).copied().unwrap_or(0) as Cluster;
        for (pair_index, pair) in table.entries.chunks_mut(2).enumerate() {
            let i = pair_index * 3;
            pair[0] = byte(i) | ((byte(i + 1) & 0x0F) << 8);
            if let Some(second) = pair.get_mut(1) {
                *second = ((byte(i + 1) & 0xF0) >> 4) | (byte(i + 2) << 4);
            }
        }
        table.entries[0] = END_OF_CHAIN;
        table
    }

    /// Packs the table into a full FAT region. The first byte is the media
    /// descriptor.
    pub fn encode(&self) -> Vec<u8> {
        let mut raw = vec![0; self.region_bytes];
        for (pair_index, pair) in self.entries.chunks(2).enumerate() {
            let i = pair_index * 3;
            let low = pair[0] as u32;
            let high = pair.get(1).copied().unwrap_or(0) as u32;
            let packed = (low | (high << 12)).to_le_bytes();
            raw[i..(i + 3)].copy_from_slice(&packed[0..3]);
        }
        raw[0] = self.media;
        raw
    }

    pub fn entries(&self) -> &[Cluster] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bytes_per_cluster(&self) -> u32 {
        self.bytes_per_cluster
    }

    pub fn free_count(&self) -> usize {
        self.entries[FIRST_DATA_CLUSTER as usize..]
            .iter()
            .filter(|&&entry| entry == FREE_CLUSTER)
            .count()
    }

    fn lookup_error(cluster: Cluster, error: FatLookupError) -> Error {
        Error::FatLookup { cluster, error }
    }

    /// Every cluster of the chain starting at `cluster`, in order. Cluster 0
    /// denotes an empty chain.
    pub fn chain_of(&self, cluster: Cluster) -> Result<Vec<Cluster>, Error> {
        let mut chain = Vec::new();
        if cluster == FREE_CLUSTER {
            return Ok(chain);
        }
        let mut current = cluster;
        loop {
            if current < FIRST_DATA_CLUSTER || current as usize >= self.entries.len() {
                return Err(Self::lookup_error(current, FatLookupError::OutOfRange));
            }
            if chain.len() >= self.entries.len() {
                return Err(Self::lookup_error(cluster, FatLookupError::Cycle));
            }
            chain.push(current);
            match classify_fat_entry(self.entries[current as usize], self.entries.len())
                .map_err(|error| Self::lookup_error(current, error))?
            {
                ChainLink::EndOfChain => break Ok(chain),
                ChainLink::Next(next) => current = next,
            }
        }
    }

    /// First free cluster numbered `from` or above.
    fn find_free(&self, from: usize) -> Option<Cluster> {
        let from = from.max(FIRST_DATA_CLUSTER as usize);
        self.entries
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, &entry)| entry == FREE_CLUSTER)
            .map(|(index, _)| index as Cluster)
    }

    /// Allocates a chain for `size` bytes and returns its first cluster.
    ///
    /// Always allocates `size / bytes_per_cluster + 1` clusters, so even an
    /// empty file owns one cluster. Free clusters are taken in ascending
    /// order. The table is untouched if there are not enough of them.
    pub fn allocate(&mut self, size: u32) -> Result<Cluster, Error> {
        let count = (size / self.bytes_per_cluster) as usize + 1;
        let mut chain = Vec::with_capacity(count);
        let mut from = 0;
        for _ in 0..count {
            let cluster = self.find_free(from).ok_or(Error::DiskFull)?;
            chain.push(cluster);
            from = cluster as usize + 1;
        }
        for link in chain.windows(2) {
            self.entries[link[0] as usize] = link[1];
        }
        let (&first, &last) = match (chain.first(), chain.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(Error::DiskFull),
        };
        self.entries[last as usize] = END_OF_CHAIN;
        log::debug!(
            "allocated {} cluster(s) for {} bytes starting at {}",
            count,
            size,
            first
        );
        Ok(first)
    }

    /// Appends one free cluster, from anywhere in the table, to the chain
    /// starting at `cluster`. Returns the new last cluster.
    pub fn extend(&mut self, cluster: Cluster) -> Result<Cluster, Error> {
        let chain = self.chain_of(cluster)?;
        let last = *chain
            .last()
            .ok_or(Self::lookup_error(cluster, FatLookupError::FreeCluster))?;
        let next = self.find_free(0).ok_or(Error::DiskFull)?;
        self.entries[last as usize] = next;
        self.entries[next as usize] = END_OF_CHAIN;
        log::debug!("extended chain {} with cluster {}", cluster, next);
        Ok(next)
    }
}

impl fmt::Display for FatTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        mini_hex_dump::display_cells(&self.entries, 16, 3, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Format;

    fn table() -> FatTable {
        FatTable::new(&Geometry::from_format(Format::TwoHd).unwrap())
    }

    #[test]
    fn new_table_reserves_first_two_entries() {
        let table = table();
        assert_eq!(table.len(), 1223);
        assert_eq!(&table.entries()[0..3], &[END_OF_CHAIN, END_OF_CHAIN, FREE_CLUSTER]);
        assert_eq!(table.free_count(), 1221);
    }

    #[test]
    fn packing() {
        let mut table = table();
        table.entries[2] = 0x123;
        table.entries[3] = 0x456;
        let raw = table.encode();
        assert_eq!(raw.len(), 2048);
        assert_eq!(&raw[0..6], &[0xFE, 0xFF, 0xFF, 0x23, 0x61, 0x45]);
    }

    #[test]
    fn decode_inverts_encode() {
        let geometry = Geometry::from_format(Format::TwoHd).unwrap();
        let mut table = FatTable::new(&geometry);
        table.allocate(5000).unwrap();
        table.allocate(0).unwrap();
        let first = table.allocate(1024).unwrap();
        table.extend(first).unwrap();
        // odd-length tables keep their final unmatched entry
        let last = table.len() - 1;
        table.entries[last] = END_OF_CHAIN;
        assert_eq!(FatTable::decode(&geometry, &table.encode()), table);
    }

    #[test]
    fn allocation_length() {
        let mut table = table();
        for (size, clusters) in &[(0, 1), (1, 1), (1023, 1), (1024, 2), (3000, 3)] {
            let first = table.allocate(*size).unwrap();
            let chain = table.chain_of(first).unwrap();
            assert_eq!(chain.len(), *clusters);
            assert_eq!(table.entries()[*chain.last().unwrap() as usize], END_OF_CHAIN);
        }
    }

    #[test]
    fn allocations_are_disjoint_and_ascending() {
        let mut table = table();
        let first_a = table.allocate(2048).unwrap();
        let a = table.chain_of(first_a).unwrap();
        let first_b = table.allocate(2048).unwrap();
        let b = table.chain_of(first_b).unwrap();
        assert_eq!(a, vec![2, 3, 4]);
        assert_eq!(b, vec![5, 6, 7]);
    }

    #[test]
    fn allocation_skips_used_cells() {
        let mut table = table();
        table.entries[3] = END_OF_CHAIN;
        table.entries[5] = END_OF_CHAIN;
        let first = table.allocate(2048).unwrap();
        let chain = table.chain_of(first).unwrap();
        assert_eq!(chain, vec![2, 4, 6]);
    }

    #[test]
    fn extend_takes_first_free_cell() {
        let mut table = table();
        let first = table.allocate(0).unwrap();
        table.allocate(0).unwrap();
        assert_eq!(table.extend(first).unwrap(), 4);
        assert_eq!(table.chain_of(first).unwrap(), vec![2, 4]);
    }

    #[test]
    fn empty_chain() {
        assert_eq!(table().chain_of(0).unwrap(), Vec::<Cluster>::new());
    }

    #[test]
    fn disk_full_leaves_table_untouched() {
        let mut table = table();
        let too_big = 1221 * 1024;
        let before = table.clone();
        assert!(matches!(table.allocate(too_big), Err(Error::DiskFull)));
        assert_eq!(table, before);
        table.allocate(too_big - 1).unwrap();
        assert_eq!(table.free_count(), 0);
        assert!(matches!(table.allocate(0), Err(Error::DiskFull)));
        assert!(matches!(table.extend(2), Err(Error::DiskFull)));
    }

    #[test]
    fn broken_chains_are_reported() {
        let mut table = table();
        table.entries[2] = 3;
        table.entries[3] = 2;
        assert!(matches!(
            table.chain_of(2),
            Err(Error::FatLookup {
                error: FatLookupError::Cycle,
                ..
            })
        ));
        table.entries[3] = FREE_CLUSTER;
        assert!(matches!(
            table.chain_of(2),
            Err(Error::FatLookup {
                cluster: 3,
                error: FatLookupError::FreeCluster,
            })
        ));
        assert!(matches!(
            table.chain_of(5000),
            Err(Error::FatLookup {
                error: FatLookupError::OutOfRange,
                ..
            })
        ));
    }
}
