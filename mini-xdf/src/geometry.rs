use crate::dirent::DIRECTORY_ENTRY_BYTES;
use crate::{handle_read, Error};
use std::fmt;
use std::io;

/// Byte offset of the parameter block within the boot sector.
pub const BPB_OFFSET: usize = 0x0B;
/// Length of the parameter block.
pub const BPB_SIZE: usize = 17;
/// Media descriptors below this value do not describe a known floppy format.
pub const MIN_MEDIA: u8 = 0xF0;

/// Largest cluster count a 12-bit table can address below the reserved values.
const MAX_FAT12_CLUSTERS: u32 = 0xFF7;

/// The packed parameter block, stored little-endian at [`BPB_OFFSET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bpb {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub fat_start_sector: u16,
    pub num_fats: u8,
    pub root_entry_count: u16,
    pub total_sectors: u16,
    pub media: u8,
    pub fat_size: u16,
    pub sectors_per_track: u16,
    pub num_heads: u16,
}

impl Bpb {
    pub fn parse(raw: &[u8]) -> Result<Self, Error> {
        if raw.len() < BPB_SIZE {
            return Err(Error::InvalidGeometry("parameter block is truncated"));
        }
        let media = raw[10];
        if media < MIN_MEDIA {
            return Err(Error::UnrecognizedMedia(media));
        }
        Ok(Self {
            bytes_per_sector: u16::from_le_bytes(raw[0..2].try_into().unwrap()),
            sectors_per_cluster: raw[2],
            fat_start_sector: u16::from_le_bytes(raw[3..5].try_into().unwrap()),
            num_fats: raw[5],
            root_entry_count: u16::from_le_bytes(raw[6..8].try_into().unwrap()),
            total_sectors: u16::from_le_bytes(raw[8..10].try_into().unwrap()),
            media,
            fat_size: u16::from_le_bytes(raw[11..13].try_into().unwrap()),
            sectors_per_track: u16::from_le_bytes(raw[13..15].try_into().unwrap()),
            num_heads: u16::from_le_bytes(raw[15..17].try_into().unwrap()),
        })
    }

    pub fn to_bytes(&self) -> [u8; BPB_SIZE] {
        let mut raw = [0; BPB_SIZE];
        raw[0..2].copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        raw[2] = self.sectors_per_cluster;
        raw[3..5].copy_from_slice(&self.fat_start_sector.to_le_bytes());
        raw[5] = self.num_fats;
        raw[6..8].copy_from_slice(&self.root_entry_count.to_le_bytes());
        raw[8..10].copy_from_slice(&self.total_sectors.to_le_bytes());
        raw[10] = self.media;
        raw[11..13].copy_from_slice(&self.fat_size.to_le_bytes());
        raw[13..15].copy_from_slice(&self.sectors_per_track.to_le_bytes());
        raw[15..17].copy_from_slice(&self.num_heads.to_le_bytes());
        raw
    }
}

/// The floppy formats an image can be created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// 1232KB, 1024-byte sectors. The native X68000 format.
    #[default]
    TwoHd,
    /// 1200KB PC-compatible high density.
    TwoHc,
    /// 640KB double density.
    TwoDd640,
    /// 720KB double density.
    TwoDd720,
    /// 1440KB PC-compatible high density.
    TwoHq,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::TwoHd,
        Format::TwoHc,
        Format::TwoDd640,
        Format::TwoDd720,
        Format::TwoHq,
    ];

    /// Accepts both the format names and the historical `/N` switches.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "" | "2hd" => Some(Format::TwoHd),
            "/5" | "2hc" => Some(Format::TwoHc),
            "/8" | "2dd640" => Some(Format::TwoDd640),
            "/9" | "2dd720" => Some(Format::TwoDd720),
            "/4" | "2hq" => Some(Format::TwoHq),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Format::TwoHd => "2hd",
            Format::TwoHc => "2hc",
            Format::TwoDd640 => "2dd640",
            Format::TwoDd720 => "2dd720",
            Format::TwoHq => "2hq",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Format::TwoHd => "2HD (1232KB)",
            Format::TwoHc => "2HC (1200KB)",
            Format::TwoDd640 => "2DD (640KB)",
            Format::TwoDd720 => "2DD (720KB)",
            Format::TwoHq => "2HQ (1440KB)",
        }
    }

    pub fn bpb(self) -> Bpb {
        let (
            bytes_per_sector,
            sectors_per_cluster,
            root_entry_count,
            total_sectors,
            media,
            fat_size,
            sectors_per_track,
        ) = match self {
            Format::TwoHd => (1024, 1, 192, 1232, 0xFE, 2, 8),
            Format::TwoHc => (512, 1, 224, 2400, 0xF9, 7, 15),
            Format::TwoDd640 => (512, 2, 112, 1280, 0xFB, 2, 8),
            Format::TwoDd720 => (512, 2, 112, 1440, 0xF9, 3, 9),
            Format::TwoHq => (512, 1, 224, 2880, 0xF0, 9, 18),
        };
        Bpb {
            bytes_per_sector,
            sectors_per_cluster,
            fat_start_sector: 1,
            num_fats: 2,
            root_entry_count,
            total_sectors,
            media,
            fat_size,
            sectors_per_track,
            num_heads: 2,
        }
    }
}

/// Layout of an image, derived once from its parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    bpb: Bpb,
    bytes_per_cluster: u32,
    root_directory_sector: u32,
    data_sector: u32,
    cluster_count: u32,
}

impl Geometry {
    pub fn new(bpb: Bpb) -> Result<Self, Error> {
        if bpb.bytes_per_sector == 0 {
            return Err(Error::InvalidGeometry("sector size is zero"));
        }
        if bpb.sectors_per_cluster == 0 {
            return Err(Error::InvalidGeometry("cluster size is zero"));
        }
        if bpb.fat_start_sector == 0 {
            return Err(Error::InvalidGeometry("FAT overlaps the boot sector"));
        }
        if bpb.num_fats == 0 || bpb.fat_size == 0 {
            return Err(Error::InvalidGeometry("no FAT region"));
        }
        let bytes_per_sector = bpb.bytes_per_sector as u32;
        let bytes_per_cluster = bytes_per_sector * bpb.sectors_per_cluster as u32;
        let root_directory_sector =
            bpb.fat_start_sector as u32 + bpb.num_fats as u32 * bpb.fat_size as u32;
        let root_directory_sectors = (bpb.root_entry_count as u32 * DIRECTORY_ENTRY_BYTES as u32
            + (bytes_per_sector - 1))
            / bytes_per_sector;
        let data_sector = root_directory_sector + root_directory_sectors;
        if data_sector >= bpb.total_sectors as u32 {
            return Err(Error::InvalidGeometry("no data region"));
        }
        let cluster_count =
            (bpb.total_sectors as u32 - data_sector) / bpb.sectors_per_cluster as u32 + 2;
        if cluster_count > MAX_FAT12_CLUSTERS {
            return Err(Error::InvalidGeometry("too many clusters for FAT12"));
        }
        let fat_bytes = bpb.fat_size as u32 * bytes_per_sector;
        if (cluster_count + 1) / 2 * 3 > fat_bytes {
            return Err(Error::InvalidGeometry("FAT too small for cluster count"));
        }
        let geometry = Self {
            bpb,
            bytes_per_cluster,
            root_directory_sector,
            data_sector,
            cluster_count,
        };
        log::debug!("derived geometry {:?}", geometry);
        Ok(geometry)
    }

    pub fn from_format(format: Format) -> Result<Self, Error> {
        Self::new(format.bpb())
    }

    /// Reads the parameter block from the boot sector of an existing image.
    pub fn read<H>(handle: &mut H, buf: &mut Vec<u8>) -> Result<Self, Error>
    where
        H: io::Seek + io::Read,
    {
        handle_read(handle, BPB_OFFSET as u64, BPB_SIZE, buf)?;
        Self::new(Bpb::parse(buf)?)
    }

    pub fn bpb(&self) -> &Bpb {
        &self.bpb
    }

    pub fn bytes_per_sector(&self) -> u32 {
        self.bpb.bytes_per_sector as u32
    }

    pub fn bytes_per_cluster(&self) -> u32 {
        self.bytes_per_cluster
    }

    pub fn media(&self) -> u8 {
        self.bpb.media
    }

    pub fn num_fats(&self) -> u8 {
        self.bpb.num_fats
    }

    pub fn root_entry_count(&self) -> usize {
        self.bpb.root_entry_count as usize
    }

    pub fn fat_sector(&self) -> u32 {
        self.bpb.fat_start_sector as u32
    }

    pub fn root_directory_sector(&self) -> u32 {
        self.root_directory_sector
    }

    pub fn data_sector(&self) -> u32 {
        self.data_sector
    }

    /// One past the highest cluster number. Clusters 0 and 1 are reserved.
    pub fn cluster_count(&self) -> u32 {
        self.cluster_count
    }

    pub fn total_bytes(&self) -> u64 {
        self.sector_offset(self.bpb.total_sectors as u32)
    }

    pub fn sector_offset(&self, sector: u32) -> u64 {
        sector as u64 * self.bytes_per_sector() as u64
    }

    pub fn fat_bytes(&self) -> usize {
        self.bpb.fat_size as usize * self.bytes_per_sector() as usize
    }

    pub fn fat_offset(&self, copy: u8) -> u64 {
        self.sector_offset(self.fat_sector()) + copy as u64 * self.fat_bytes() as u64
    }

    pub fn root_directory_bytes(&self) -> usize {
        self.root_entry_count() * DIRECTORY_ENTRY_BYTES
    }

    pub fn root_directory_offset(&self) -> u64 {
        self.sector_offset(self.root_directory_sector)
    }

    pub fn cluster_offset(&self, cluster: u16) -> u64 {
        debug_assert!(cluster >= 2);
        self.sector_offset(self.data_sector)
            + (cluster as u64 - 2) * self.bytes_per_cluster as u64
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Bytes Per Sector: {}", self.bpb.bytes_per_sector)?;
        writeln!(f, "Sectors Per Cluster: {}", self.bpb.sectors_per_cluster)?;
        writeln!(f, "FAT Start Sector: {}", self.bpb.fat_start_sector)?;
        writeln!(f, "Num FATs: {}", self.bpb.num_fats)?;
        writeln!(f, "Sectors Per FAT: {}", self.bpb.fat_size)?;
        writeln!(f, "Root Entries: {}", self.bpb.root_entry_count)?;
        writeln!(f, "Total Sectors: {}", self.bpb.total_sectors)?;
        writeln!(f, "Media: {:#04X}", self.bpb.media)?;
        writeln!(f, "Sectors Per Track: {}", self.bpb.sectors_per_track)?;
        writeln!(f, "Heads: {}", self.bpb.num_heads)?;
        writeln!(f, "Bytes Per Cluster: {}", self.bytes_per_cluster)?;
        writeln!(f, "Root Directory Sector: {}", self.root_directory_sector)?;
        writeln!(f, "Data Sector: {}", self.data_sector)?;
        writeln!(f, "Num Clusters: {}", self.cluster_count - 2)?;
        Ok(())
    }
}
