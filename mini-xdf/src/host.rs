//! Moving files between an image and the host filesystem.

use crate::dirent::{DirEntry, EntryKind};
use crate::directory::Directory;
use crate::disk::{DirectoryId, DiskImage};
use crate::fat::{Cluster, FatLookupError};
use crate::Error;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path};
use std::time::SystemTime;

fn to_system_time(datetime: &NaiveDateTime) -> Option<SystemTime> {
    Local
        .from_local_datetime(datetime)
        .earliest()
        .map(SystemTime::from)
}

fn to_local(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

fn not_found(path: &Path, error: io::Error) -> Error {
    if error.kind() == io::ErrorKind::NotFound {
        Error::FileNotFound(path.to_path_buf())
    } else {
        Error::Io(error)
    }
}

/// The name of an image entry as a single host path component.
fn host_name(name: &str) -> Result<&str, Error> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(name),
        _ => Err(Error::UnsafeName(name.to_string())),
    }
}

/// Fails if entering `entry` would revisit the root or a directory already
/// on the path from the root.
fn check_not_ancestor(entry: &DirEntry, ancestors: &[Cluster]) -> Result<(), Error> {
    let cluster = entry.first_cluster();
    if ancestors.contains(&cluster) {
        return Err(Error::FatLookup {
            cluster,
            error: FatLookupError::Cycle,
        });
    }
    Ok(())
}

/// Writes a listing of every directory in the image, depth first, starting
/// with the root as `.`.
pub fn list<H, W>(disk: &mut DiskImage<H>, output: &mut W) -> Result<(), Error>
where
    H: io::Seek + io::Read,
    W: io::Write,
{
    let root = disk.root().clone();
    list_directory(disk, &root, ".", &mut vec![root.cluster()], output)
}

fn list_directory<H, W>(
    disk: &mut DiskImage<H>,
    directory: &Directory,
    path: &str,
    ancestors: &mut Vec<Cluster>,
    output: &mut W,
) -> Result<(), Error>
where
    H: io::Seek + io::Read,
    W: io::Write,
{
    writeln!(output, "{}:", path)?;
    write!(output, "{}", directory)?;
    for entry in directory.entries() {
        if entry.is_dot() || entry.kind() != EntryKind::Directory {
            continue;
        }
        writeln!(output)?;
        check_not_ancestor(entry, ancestors)?;
        let subdirectory = disk.resolve_directory(entry.first_cluster())?;
        ancestors.push(subdirectory.cluster());
        list_directory(
            disk,
            &subdirectory,
            &format!("{}/{}", path, entry.name()),
            ancestors,
            output,
        )?;
        ancestors.pop();
    }
    Ok(())
}

/// Extracts files into `destination`.
///
/// With no filters everything is extracted. A filter naming a directory
/// (with or without a trailing `/`) extracts all of it; a filter naming a
/// file extracts just that file. Each extracted path is written to
/// `progress`. Entries whose names are not a single plain path component,
/// or directories that lead back to an ancestor, are errors.
pub fn extract<H, W>(
    disk: &mut DiskImage<H>,
    destination: &Path,
    filters: &[String],
    progress: &mut W,
) -> Result<(), Error>
where
    H: io::Seek + io::Read,
    W: io::Write,
{
    let root = disk.root().clone();
    let mut ancestors = vec![root.cluster()];
    extract_directory(disk, &root, destination, "", filters, &mut ancestors, progress)
}

fn extract_directory<H, W>(
    disk: &mut DiskImage<H>,
    directory: &Directory,
    destination: &Path,
    prefix: &str,
    filters: &[String],
    ancestors: &mut Vec<Cluster>,
    progress: &mut W,
) -> Result<(), Error>
where
    H: io::Seek + io::Read,
    W: io::Write,
{
    for entry in directory.entries() {
        if entry.is_dot() {
            continue;
        }
        let image_path = format!("{}{}", prefix, entry.name());
        match entry.kind() {
            EntryKind::Directory => {
                let whole = format!("{}/", image_path);
                let sub_filters: &[String] = if filters.is_empty()
                    || filters.iter().any(|f| *f == image_path || *f == whole)
                {
                    &[][..]
                } else if filters.iter().any(|f| f.starts_with(&whole)) {
                    filters
                } else {
                    continue;
                };
                check_not_ancestor(entry, ancestors)?;
                let host_path = destination.join(host_name(entry.name())?);
                match fs::create_dir(&host_path) {
                    Err(e) if e.kind() != io::ErrorKind::AlreadyExists => return Err(Error::Io(e)),
                    _ => (),
                }
                let subdirectory = disk.resolve_directory(entry.first_cluster())?;
                ancestors.push(subdirectory.cluster());
                extract_directory(
                    disk,
                    &subdirectory,
                    &host_path,
                    &whole,
                    sub_filters,
                    ancestors,
                    progress,
                )?;
                ancestors.pop();
            }
            EntryKind::File => {
                if filters.is_empty() || filters.contains(&image_path) {
                    let host_path = destination.join(host_name(entry.name())?);
                    writeln!(progress, "{}", image_path)?;
                    extract_file(disk, entry, &host_path)?;
                }
            }
            EntryKind::VolumeLabel => (),
        }
    }
    Ok(())
}

fn extract_file<H>(disk: &mut DiskImage<H>, entry: &DirEntry, host_path: &Path) -> Result<(), Error>
where
    H: io::Seek + io::Read,
{
    let mut file = File::create(host_path)?;
    disk.read_file(entry, &mut file)?;
    match to_system_time(&entry.modified()) {
        Some(time) => file.set_times(fs::FileTimes::new().set_accessed(time).set_modified(time))?,
        None => log::debug!("{} has no local time; leaving it unset", entry.modified()),
    }
    Ok(())
}

/// Adds host files under `source` to the root of the image.
///
/// With no paths (or a single empty path) everything in `source` is added.
/// A path containing `/` adds only the named file or directory below the
/// leading directories. Each added file path is written to `progress`.
///
/// `image_path` names the host file the image itself is being written to,
/// if any. That file is never added to the image.
pub fn create<H, W>(
    disk: &mut DiskImage<H>,
    source: &Path,
    paths: &[String],
    image_path: Option<&Path>,
    progress: &mut W,
) -> Result<(), Error>
where
    H: io::Seek + io::Write,
    W: io::Write,
{
    let image_path = image_path.and_then(|path| fs::canonicalize(path).ok());
    add_paths(
        disk,
        DirectoryId::Root,
        source,
        "",
        paths,
        image_path.as_deref(),
        progress,
    )
}

fn is_same_file(host_path: &Path, image_path: Option<&Path>) -> bool {
    match image_path {
        Some(image_path) => fs::canonicalize(host_path)
            .map(|canonical| canonical == image_path)
            .unwrap_or(false),
        None => false,
    }
}

fn host_directory_names(path: &Path) -> Result<Vec<String>, Error> {
    let mut names = Vec::new();
    for dir_entry in fs::read_dir(path).map_err(|e| not_found(path, e))? {
        names.push(dir_entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

fn add_paths<H, W>(
    disk: &mut DiskImage<H>,
    parent: DirectoryId,
    host_directory: &Path,
    prefix: &str,
    paths: &[String],
    image_path: Option<&Path>,
    progress: &mut W,
) -> Result<(), Error>
where
    H: io::Seek + io::Write,
    W: io::Write,
{
    let listing;
    let paths = if paths.is_empty() || (paths.len() == 1 && paths[0].is_empty()) {
        listing = host_directory_names(host_directory)?;
        &listing[..]
    } else {
        paths
    };
    for path in paths {
        if path == "." || path == ".." {
            continue;
        }
        if let Some((head, rest)) = path.split_once('/') {
            let subdirectory = disk.make_subdirectory(parent, head)?;
            add_paths(
                disk,
                subdirectory,
                &host_directory.join(head),
                &format!("{}{}/", prefix, head),
                &[rest.to_string()],
                image_path,
                progress,
            )?;
            continue;
        }
        let host_path = host_directory.join(path);
        let metadata = fs::metadata(&host_path).map_err(|e| not_found(&host_path, e))?;
        if metadata.is_dir() {
            let subdirectory = disk.make_subdirectory(parent, path)?;
            add_paths(
                disk,
                subdirectory,
                &host_path,
                &format!("{}{}/", prefix, path),
                &[],
                image_path,
                progress,
            )?;
        } else if is_same_file(&host_path, image_path) {
            log::info!("skipping '{}', the image being written", host_path.display());
        } else {
            writeln!(progress, "{}{}", prefix, path)?;
            let size = u32::try_from(metadata.len()).map_err(|_| Error::DiskFull)?;
            let modified = to_local(metadata.modified()?);
            let mut file = File::open(&host_path).map_err(|e| not_found(&host_path, e))?;
            disk.write_file(parent, path, size, modified, &mut file)?;
        }
    }
    Ok(())
}
