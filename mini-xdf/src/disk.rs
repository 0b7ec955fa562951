use crate::boot_sector::{BOOT_SECTOR, JUMP_2HQ};
use crate::dirent::{attributes, DirEntry, DIRECTORY_ENTRY_BYTES};
use crate::directory::{Directory, DirectoryLocation};
use crate::fat::{Cluster, FatTable};
use crate::geometry::{Format, Geometry, BPB_OFFSET};
use crate::{date, handle_read, handle_write, Error};
use chrono::NaiveDateTime;
use std::io;

/// Names a directory of an image being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryId {
    Root,
    /// Index into the image's subdirectory registry.
    Subdirectory(usize),
}

/// An XDF image.
///
/// Opening an image reads its geometry, FAT and root directory up front.
/// Creating an image writes the boot sector immediately and file contents as
/// they are added; the FAT and every directory are written by [`flush`].
///
/// [`flush`]: DiskImage::flush
pub struct DiskImage<H> {
    handle: H,
    geometry: Geometry,
    fat: FatTable,
    root: Directory,
    subdirectories: Vec<Directory>,
}

impl<H> DiskImage<H> {
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn fat(&self) -> &FatTable {
        &self.fat
    }

    pub fn root(&self) -> &Directory {
        &self.root
    }

    pub fn directory(&self, id: DirectoryId) -> &Directory {
        match id {
            DirectoryId::Root => &self.root,
            DirectoryId::Subdirectory(index) => &self.subdirectories[index],
        }
    }

    pub fn into_inner(self) -> H {
        self.handle
    }
}

impl<H> DiskImage<H>
where
    H: io::Seek + io::Read,
{
    pub fn open(mut handle: H) -> Result<Self, Error> {
        let mut buf = Vec::new();
        let geometry = Geometry::read(&mut handle, &mut buf)?;
        handle_read(&mut handle, geometry.fat_offset(0), geometry.fat_bytes(), &mut buf)?;
        let fat = FatTable::decode(&geometry, &buf);
        handle_read(
            &mut handle,
            geometry.root_directory_offset(),
            geometry.root_directory_bytes(),
            &mut buf,
        )?;
        let root = Directory::decode(DirectoryLocation::Root, &buf);
        log::debug!(
            "opened image with {} root entries and {} free clusters",
            root.entries().len(),
            fat.free_count()
        );
        Ok(Self {
            handle,
            geometry,
            fat,
            root,
            subdirectories: Vec::new(),
        })
    }

    /// Reads the directory whose chain starts at `cluster`. Cluster 0 is the
    /// root directory, as stored in the `..` entry of its children.
    pub fn resolve_directory(&mut self, cluster: Cluster) -> Result<Directory, Error> {
        if cluster == 0 {
            return Ok(self.root.clone());
        }
        let bytes_per_cluster = self.geometry.bytes_per_cluster() as usize;
        let mut buf = Vec::new();
        let mut raw = Vec::new();
        for c in self.fat.chain_of(cluster)? {
            handle_read(
                &mut self.handle,
                self.geometry.cluster_offset(c),
                bytes_per_cluster,
                &mut buf,
            )?;
            raw.extend_from_slice(&buf);
        }
        Ok(Directory::decode(DirectoryLocation::Chain(cluster), &raw))
    }

    /// Copies the contents of a file entry to `output`.
    pub fn read_file<O>(&mut self, entry: &DirEntry, output: &mut O) -> Result<(), Error>
    where
        O: io::Write,
    {
        let bytes_per_cluster = self.geometry.bytes_per_cluster() as usize;
        let mut remaining = entry.file_size() as usize;
        let mut buf = Vec::new();
        for cluster in self.fat.chain_of(entry.first_cluster())? {
            let size = remaining.min(bytes_per_cluster);
            if size == 0 {
                break;
            }
            handle_read(
                &mut self.handle,
                self.geometry.cluster_offset(cluster),
                size,
                &mut buf,
            )?;
            output.write_all(&buf).map_err(Error::Io)?;
            remaining -= size;
        }
        Ok(())
    }
}

impl<H> DiskImage<H>
where
    H: io::Seek + io::Write,
{
    /// Writes a blank, formatted image of the given format to `handle`.
    pub fn create(mut handle: H, format: Format) -> Result<Self, Error> {
        let geometry = Geometry::from_format(format)?;
        let blank_sector = vec![0; geometry.bytes_per_sector() as usize];
        handle.seek(io::SeekFrom::Start(0)).map_err(Error::Io)?;
        for _ in 0..geometry.bpb().total_sectors {
            handle.write_all(&blank_sector).map_err(Error::Io)?;
        }
        handle_write(&mut handle, 0, &BOOT_SECTOR)?;
        handle_write(&mut handle, BPB_OFFSET as u64, &geometry.bpb().to_bytes())?;
        if format == Format::TwoHq {
            handle_write(&mut handle, 0, &JUMP_2HQ)?;
        }
        log::debug!(
            "created {} image of {} bytes",
            format.description(),
            geometry.total_bytes()
        );
        Ok(Self {
            handle,
            fat: FatTable::new(&geometry),
            root: Directory::new(DirectoryLocation::Root, geometry.root_entry_count()),
            subdirectories: Vec::new(),
            geometry,
        })
    }

    fn add_entry(&mut self, parent: DirectoryId, entry: DirEntry) -> Result<(), Error> {
        let Self {
            fat,
            root,
            subdirectories,
            ..
        } = self;
        let directory = match parent {
            DirectoryId::Root => root,
            DirectoryId::Subdirectory(index) => &mut subdirectories[index],
        };
        directory.add_entry(entry, fat)
    }

    /// Returns the subdirectory `name` of `parent`, creating it with its `.`
    /// and `..` entries if it does not exist yet.
    pub fn make_subdirectory(
        &mut self,
        parent: DirectoryId,
        name: &str,
    ) -> Result<DirectoryId, Error> {
        if let Some(existing) = self.directory(parent).find_entry(name) {
            return existing
                .subdirectory()
                .map(DirectoryId::Subdirectory)
                .ok_or_else(|| Error::NotADirectory(name.to_string()));
        }
        let cluster = self.fat.allocate(0)?;
        let parent_cluster = self.directory(parent).cluster();
        let now = date::now();
        let mut directory = Directory::new(
            DirectoryLocation::Chain(cluster),
            self.geometry.bytes_per_cluster() as usize / DIRECTORY_ENTRY_BYTES,
        );
        directory.add_entry(
            DirEntry::new(".", attributes::DIRECTORY, cluster, now),
            &mut self.fat,
        )?;
        directory.add_entry(
            DirEntry::new("..", attributes::DIRECTORY, parent_cluster, now),
            &mut self.fat,
        )?;
        let index = self.subdirectories.len();
        self.add_entry(
            parent,
            DirEntry::new(name, attributes::DIRECTORY, cluster, now).with_subdirectory(index),
        )?;
        self.subdirectories.push(directory);
        log::debug!("made directory '{}' at cluster {}", name, cluster);
        Ok(DirectoryId::Subdirectory(index))
    }

    /// Allocates a chain for `size` bytes, fills it from `contents` and adds
    /// an archive entry for it to `parent`.
    pub fn write_file<R>(
        &mut self,
        parent: DirectoryId,
        name: &str,
        size: u32,
        modified: NaiveDateTime,
        contents: &mut R,
    ) -> Result<(), Error>
    where
        R: io::Read,
    {
        let first_cluster = self.fat.allocate(size)?;
        let bytes_per_cluster = self.geometry.bytes_per_cluster() as usize;
        let mut buf = vec![0; bytes_per_cluster];
        let mut remaining = size as usize;
        for cluster in self.fat.chain_of(first_cluster)? {
            let chunk = remaining.min(bytes_per_cluster);
            if chunk == 0 {
                break;
            }
            contents.read_exact(&mut buf[..chunk]).map_err(Error::Io)?;
            handle_write(
                &mut self.handle,
                self.geometry.cluster_offset(cluster),
                &buf[..chunk],
            )?;
            remaining -= chunk;
        }
        let entry = DirEntry::new(name, attributes::ARCHIVE, first_cluster, modified)
            .with_file_size(size);
        self.add_entry(parent, entry)
    }

    /// Writes the FAT to every FAT copy, then the root directory, then every
    /// subdirectory along its chain.
    pub fn flush(&mut self) -> Result<(), Error> {
        let fat = self.fat.encode();
        for copy in 0..self.geometry.num_fats() {
            handle_write(&mut self.handle, self.geometry.fat_offset(copy), &fat)?;
        }
        handle_write(
            &mut self.handle,
            self.geometry.root_directory_offset(),
            &self.root.encode(),
        )?;
        let bytes_per_cluster = self.geometry.bytes_per_cluster() as usize;
        for directory in &self.subdirectories {
            let raw = directory.encode();
            let chain = self.fat.chain_of(directory.cluster())?;
            for (&cluster, chunk) in chain.iter().zip(raw.chunks(bytes_per_cluster)) {
                handle_write(
                    &mut self.handle,
                    self.geometry.cluster_offset(cluster),
                    chunk,
                )?;
            }
        }
        self.handle.flush().map_err(Error::Io)?;
        log::debug!(
            "flushed FAT and {} subdirectories",
            self.subdirectories.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirent::EntryKind;
    use std::io::Cursor;

    fn create(format: Format) -> DiskImage<Cursor<Vec<u8>>> {
        DiskImage::create(Cursor::new(Vec::new()), format).unwrap()
    }

    #[test]
    fn blank_image_layout() {
        let mut disk = create(Format::TwoHd);
        disk.flush().unwrap();
        let raw = disk.into_inner().into_inner();
        assert_eq!(raw.len(), 1232 * 1024);
        assert_eq!(&raw[0..3], &[0x60, 0x3C, 0x90]);
        assert_eq!(&raw[3..11], b"X68IPL30");
        // both FAT copies start with the media byte and the reserved entries
        assert_eq!(&raw[1024..1027], &[0xFE, 0xFF, 0xFF]);
        assert_eq!(&raw[3072..3075], &[0xFE, 0xFF, 0xFF]);
        assert!(raw[5 * 1024..].iter().all(|&b| b == 0));
    }

    #[test]
    fn two_hq_gets_its_own_jump() {
        let raw = create(Format::TwoHq).into_inner().into_inner();
        assert_eq!(raw.len(), 2880 * 512);
        assert_eq!(&raw[0..3], &JUMP_2HQ);
        assert_eq!(raw[0x0B + 10], 0xF0);
    }

    #[test]
    fn parameter_block_matches_format() {
        for format in Format::ALL.iter().cloned() {
            let raw = create(format).into_inner().into_inner();
            let disk = DiskImage::open(Cursor::new(raw)).unwrap();
            assert_eq!(disk.geometry().bpb(), &format.bpb());
        }
    }

    #[test]
    fn subdirectory_links() {
        let mut disk = create(Format::TwoHd);
        let d = disk.make_subdirectory(DirectoryId::Root, "D").unwrap();
        let e = disk.make_subdirectory(d, "E").unwrap();
        assert_eq!(disk.make_subdirectory(DirectoryId::Root, "D").unwrap(), d);
        let d_dir = disk.directory(d);
        assert_eq!(d_dir.cluster(), 2);
        assert_eq!(d_dir.entries()[0].name(), ".");
        assert_eq!(d_dir.entries()[0].first_cluster(), 2);
        assert_eq!(d_dir.entries()[1].name(), "..");
        assert_eq!(d_dir.entries()[1].first_cluster(), 0);
        assert_eq!(d_dir.entries()[2].name(), "E");
        assert_eq!(d_dir.entries()[2].kind(), EntryKind::Directory);
        let e_dir = disk.directory(e);
        assert_eq!(e_dir.entries()[0].first_cluster(), 3);
        assert_eq!(e_dir.entries()[1].first_cluster(), 2);
    }

    #[test]
    fn file_name_clash_with_directory() {
        let mut disk = create(Format::TwoHd);
        disk.write_file(DirectoryId::Root, "X", 0, date::earliest(), &mut io::empty())
            .unwrap();
        assert!(matches!(
            disk.make_subdirectory(DirectoryId::Root, "X"),
            Err(Error::NotADirectory(_))
        ));
    }

    #[test]
    fn root_directory_full() {
        let mut disk = create(Format::TwoDd640);
        for i in 0..112 {
            disk.write_file(
                DirectoryId::Root,
                &format!("F{}", i),
                0,
                date::earliest(),
                &mut io::empty(),
            )
            .unwrap();
        }
        assert!(matches!(
            disk.write_file(DirectoryId::Root, "LAST", 0, date::earliest(), &mut io::empty()),
            Err(Error::RootDirFull)
        ));
    }

    #[test]
    fn subdirectory_rejected_by_full_root_is_not_registered() {
        let mut disk = create(Format::TwoDd640);
        for i in 0..112 {
            disk.write_file(
                DirectoryId::Root,
                &format!("F{}", i),
                0,
                date::earliest(),
                &mut io::empty(),
            )
            .unwrap();
        }
        assert!(matches!(
            disk.make_subdirectory(DirectoryId::Root, "LATE"),
            Err(Error::RootDirFull)
        ));
        assert!(disk.subdirectories.is_empty());
        assert!(disk.root().find_entry("LATE").is_none());
    }

    #[test]
    fn disk_full() {
        let mut disk = create(Format::TwoDd640);
        let free = disk.fat().free_count() as u32;
        let size = free * disk.geometry().bytes_per_cluster();
        let mut contents = io::repeat(0x55);
        assert!(matches!(
            disk.write_file(DirectoryId::Root, "BIG", size, date::earliest(), &mut contents),
            Err(Error::DiskFull)
        ));
    }

    #[test]
    fn unrecognized_media_on_open() {
        let mut raw = create(Format::TwoHd).into_inner().into_inner();
        raw[0x0B + 10] = 0x00;
        assert!(matches!(
            DiskImage::open(Cursor::new(raw)),
            Err(Error::UnrecognizedMedia(0))
        ));
    }
}
