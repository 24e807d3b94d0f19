use crate::error::{Error, ExtractionError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zip::result::ZipError;

/// Every regular archive starts with a local file header
const LOCAL_FILE_HEADER_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

/// An archive with no entries starts directly with the end-of-central-directory record
const END_OF_CENTRAL_DIRECTORY_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];

/// Reported by the stream reader for entries whose sizes follow the data (flag bit 3)
const SIZES_IN_DATA_DESCRIPTOR: &str = "file length is not available in the local header";

/// What a finished walk wrote to disk
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Regular files written, in archive order
    pub files: Vec<PathBuf>,
    /// Directories created for directory entries
    pub directories: Vec<PathBuf>,
    /// Entry names skipped because they would escape the target directory
    pub skipped: Vec<String>,
}

/// Archive extractor for ZIP files
///
/// Entries are read straight from the local file headers, so they come out in the order they
/// are stored in the file and a truncated tail only affects the entries it cuts into.
/// Archives the stream reader cannot walk (sizes stored after the data, leading stub bytes)
/// are read through their central directory instead.
pub struct ZipExtractor;

impl ZipExtractor {
    /// Extract `archive_path` into `target_dir`, copying entry data in `chunk_size` blocks
    ///
    /// Blocking; run it on a blocking thread. Stops at the first faulty entry and leaves
    /// whatever was already written on disk. The target directory is only created once the
    /// file is known to be a ZIP archive.
    pub fn extract(
        archive_path: &Path,
        target_dir: &Path,
        chunk_size: usize,
        cancel: &CancellationToken,
    ) -> Result<ExtractionSummary> {
        debug!(?archive_path, ?target_dir, "opening ZIP archive");

        let file = File::open(archive_path)
            .map_err(|e| open_failed(archive_path, format!("failed to open archive: {}", e)))?;
        let mut reader = BufReader::new(file);
        let mut buf = vec![0u8; chunk_size];

        let summary = match Self::leading_signature(&mut reader, archive_path)? {
            Some(END_OF_CENTRAL_DIRECTORY_SIGNATURE) => {
                create_target_dir(target_dir)?;
                info!(?archive_path, "ZIP archive has no entries");
                return Ok(ExtractionSummary::default());
            }
            Some(LOCAL_FILE_HEADER_SIGNATURE) => {
                create_target_dir(target_dir)?;
                let streamed = Self::extract_streamed(
                    &mut reader,
                    archive_path,
                    target_dir,
                    &mut buf,
                    cancel,
                )?;
                match streamed {
                    Some(summary) => summary,
                    None => {
                        debug!(
                            ?archive_path,
                            "entry sizes follow the data, using the central directory"
                        );
                        let mut archive = Self::open_indexed(archive_path)?;
                        Self::extract_indexed(
                            &mut archive,
                            archive_path,
                            target_dir,
                            &mut buf,
                            cancel,
                        )?
                    }
                }
            }
            _ => {
                let mut archive = Self::open_indexed(archive_path)?;
                create_target_dir(target_dir)?;
                Self::extract_indexed(&mut archive, archive_path, target_dir, &mut buf, cancel)?
            }
        };

        info!(
            ?archive_path,
            files = summary.files.len(),
            directories = summary.directories.len(),
            skipped = summary.skipped.len(),
            "ZIP extraction successful"
        );
        Ok(summary)
    }

    fn leading_signature(
        reader: &mut BufReader<File>,
        archive_path: &Path,
    ) -> Result<Option<[u8; 4]>> {
        let head = reader
            .fill_buf()
            .map_err(|e| open_failed(archive_path, format!("failed to read archive: {}", e)))?;
        Ok(head.get(..4).and_then(|sig| sig.try_into().ok()))
    }

    /// Walk the local headers in stored order
    ///
    /// Returns `None` when an entry keeps its sizes in a trailing data descriptor; the stream
    /// reader cannot find the end of such an entry.
    fn extract_streamed(
        reader: &mut BufReader<File>,
        archive_path: &Path,
        target_dir: &Path,
        buf: &mut [u8],
        cancel: &CancellationToken,
    ) -> Result<Option<ExtractionSummary>> {
        let mut summary = ExtractionSummary::default();
        let mut position = 0usize;
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let mut entry = match zip::read::read_zipfile_from_stream(&mut *reader) {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(ZipError::UnsupportedArchive(msg))
                    if msg.contains(SIZES_IN_DATA_DESCRIPTOR) =>
                {
                    return Ok(None);
                }
                Err(e) if position == 0 => {
                    return Err(open_failed(
                        archive_path,
                        format!("not a ZIP archive: {}", e),
                    ));
                }
                Err(e) => {
                    return Err(ExtractionError::EntryFailed {
                        archive: archive_path.to_path_buf(),
                        entry: format!("#{}", position + 1),
                        reason: e.to_string(),
                    }
                    .into());
                }
            };
            position += 1;

            Self::extract_entry(&mut entry, archive_path, target_dir, buf, &mut summary)?;
        }
        Ok(Some(summary))
    }

    fn open_indexed(archive_path: &Path) -> Result<zip::ZipArchive<BufReader<File>>> {
        let file = File::open(archive_path)
            .map_err(|e| open_failed(archive_path, format!("failed to open archive: {}", e)))?;
        zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| open_failed(archive_path, format!("not a ZIP archive: {}", e)))
    }

    /// Walk the entries in central directory order
    fn extract_indexed(
        archive: &mut zip::ZipArchive<BufReader<File>>,
        archive_path: &Path,
        target_dir: &Path,
        buf: &mut [u8],
        cancel: &CancellationToken,
    ) -> Result<ExtractionSummary> {
        let mut summary = ExtractionSummary::default();
        for index in 0..archive.len() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let mut entry = archive.by_index(index).map_err(|e| ExtractionError::EntryFailed {
                archive: archive_path.to_path_buf(),
                entry: format!("#{}", index + 1),
                reason: e.to_string(),
            })?;
            Self::extract_entry(&mut entry, archive_path, target_dir, buf, &mut summary)?;
        }
        Ok(summary)
    }

    /// Write a single entry to disk, creating directories as needed
    fn extract_entry(
        entry: &mut zip::read::ZipFile<'_>,
        archive_path: &Path,
        target_dir: &Path,
        buf: &mut [u8],
        summary: &mut ExtractionSummary,
    ) -> Result<()> {
        let name = entry.name().to_string();
        let out_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                warn!(entry = %name, "skipping entry with unsafe path");
                summary.skipped.push(name);
                return Ok(());
            }
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| write_failed(&out_path, e))?;
            summary.directories.push(out_path);
            return Ok(());
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_failed(parent, e))?;
        }

        let mut outfile = File::create(&out_path).map_err(|e| write_failed(&out_path, e))?;
        let mut written = 0u64;
        loop {
            let n = match entry.read(buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(ExtractionError::EntryFailed {
                        archive: archive_path.to_path_buf(),
                        entry: name,
                        reason: e.to_string(),
                    }
                    .into());
                }
            };
            outfile
                .write_all(&buf[..n])
                .map_err(|e| write_failed(&out_path, e))?;
            written += n as u64;
        }
        outfile.flush().map_err(|e| write_failed(&out_path, e))?;

        debug!(entry = %name, bytes = written, "extracted entry");
        summary.files.push(out_path);
        Ok(())
    }
}

/// Create the target directory; an existing directory is reused and its files overwritten
fn create_target_dir(target_dir: &Path) -> Result<()> {
    match std::fs::create_dir(target_dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && target_dir.is_dir() => {
            debug!(?target_dir, "target directory exists, overwriting entries");
            Ok(())
        }
        Err(e) => Err(write_failed(target_dir, e)),
    }
}

fn open_failed(archive_path: &Path, reason: String) -> Error {
    ExtractionError::OpenFailed {
        archive: archive_path.to_path_buf(),
        reason,
    }
    .into()
}

fn write_failed(path: &Path, e: std::io::Error) -> Error {
    ExtractionError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
    .into()
}
