//! Reading and writing X68000 XDF floppy disk images.
//!
//! An XDF image is a raw dump of a FAT12 floppy. The whole image is addressed
//! by absolute byte offsets derived once from the parameter block, so every
//! structure is read in full when an image is opened and written in full when
//! a new image is flushed.

use std::io;
use std::path::PathBuf;

mod boot_sector;
pub mod date;
pub mod dirent;
pub mod directory;
pub mod disk;
pub mod fat;
pub mod geometry;
pub mod host;

pub use dirent::{DirEntry, EntryKind};
pub use directory::{Directory, DirectoryLocation};
pub use disk::{DirectoryId, DiskImage};
pub use fat::{Cluster, FatLookupError, FatTable};
pub use geometry::{Bpb, Format, Geometry};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Disk image full")]
    DiskFull,
    #[error("Root directory full")]
    RootDirFull,
    #[error("No such file or directory: '{}'", .0.display())]
    FileNotFound(PathBuf),
    #[error("'{0}' already exists and is not a directory")]
    NotADirectory(String),
    #[error("'{0}' is not a plain file name")]
    UnsafeName(String),
    #[error("unrecognized media descriptor {0:#04X}")]
    UnrecognizedMedia(u8),
    #[error("invalid disk geometry: {0}")]
    InvalidGeometry(&'static str),
    #[error("broken cluster chain at cluster {cluster}: {error:?}")]
    FatLookup {
        cluster: Cluster,
        error: FatLookupError,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub(crate) fn handle_read<H>(
    handle: &mut H,
    offset: u64,
    size: usize,
    buf: &mut Vec<u8>,
) -> Result<(), Error>
where
    H: io::Seek + io::Read,
{
    buf.resize(size, 0);
    handle
        .seek(io::SeekFrom::Start(offset))
        .map_err(Error::Io)?;
    handle.read_exact(buf).map_err(Error::Io)?;
    Ok(())
}

pub(crate) fn handle_write<H>(handle: &mut H, offset: u64, data: &[u8]) -> Result<(), Error>
where
    H: io::Seek + io::Write,
{
    handle
        .seek(io::SeekFrom::Start(offset))
        .map_err(Error::Io)?;
    handle.write_all(data).map_err(Error::Io)?;
    Ok(())
}
