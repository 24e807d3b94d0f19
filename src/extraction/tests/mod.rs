use crate::config::Config;
use crate::error::{Error, ExtractionError};
use crate::extraction::*;
use crate::notify;
use crate::types::{Event, Outcome};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const CHUNK: usize = 2048;

fn stored() -> ::zip::write::FileOptions {
    ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored)
}

/// Build a ZIP in memory from `(name, content)` pairs; names ending in `/` become directories
fn zip_bytes(entries: &[(&str, &[u8])], options: ::zip::write::FileOptions) -> Vec<u8> {
    let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xffff_ffffu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ 0xedb8_8320
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

/// Stored ZIP as written by a streaming writer: every local header has flag bit 3 set and
/// zero sizes, the real CRC and sizes follow each entry's data in a data descriptor
fn data_descriptor_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();
    for (name, content) in entries {
        let offset = out.len() as u32;
        let crc = crc32(content);
        let size = content.len() as u32;

        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes()); // version needed
        out.extend_from_slice(&0x0008u16.to_le_bytes()); // flags: data descriptor
        out.extend_from_slice(&0u16.to_le_bytes()); // stored
        out.extend_from_slice(&0u16.to_le_bytes()); // time
        out.extend_from_slice(&0x0021u16.to_le_bytes()); // date 1980-01-01
        out.extend_from_slice(&[0u8; 12]); // crc and sizes unknown here
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(content);
        out.extend_from_slice(&0x0807_4b50u32.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());

        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes()); // version made by
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&0x0008u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0x0021u16.to_le_bytes());
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&[0u8; 12]); // extra, comment, disk, attributes
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let central_offset = out.len() as u32;
    out.extend_from_slice(&central);
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&[0u8; 4]); // disk numbers
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(central.len() as u32).to_le_bytes());
    out.extend_from_slice(&central_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

fn write_archive(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn extract(archive: &Path) -> crate::error::Result<ExtractionSummary> {
    let target = crate::utils::target_dir_for(archive);
    ZipExtractor::extract(archive, &target, CHUNK, &CancellationToken::new())
}

fn failure_code(outcome: &Outcome) -> &str {
    match outcome {
        Outcome::Failure { code, .. } => code,
        Outcome::Success { .. } => panic!("expected failure, got {outcome:?}"),
    }
}

#[test]
fn test_extract_directory_and_file() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "a.zip",
        &zip_bytes(&[("dir/", b""), ("dir/file.txt", b"hello world\n")], stored()),
    );

    let summary = extract(&archive).unwrap();

    let extracted = temp.path().join("a/dir/file.txt");
    assert_eq!(std::fs::read(&extracted).unwrap(), b"hello world\n");
    assert_eq!(summary.files, vec![extracted]);
    assert_eq!(summary.directories, vec![temp.path().join("a/dir/")]);
    assert!(summary.skipped.is_empty());
}

#[test]
fn test_truncated_entry_keeps_earlier_files() {
    let temp = TempDir::new().unwrap();
    let payload: &[u8] = b"THIRD-ENTRY-PAYLOAD-THAT-GETS-CUT";
    let mut bytes = zip_bytes(
        &[
            ("one.txt", b"first file"),
            ("two.txt", b"second file"),
            ("three.txt", payload),
        ],
        stored(),
    );
    let cut = bytes
        .windows(payload.len())
        .position(|w| w == payload)
        .expect("payload stored uncompressed");
    bytes.truncate(cut + 5);
    let archive = write_archive(temp.path(), "cut.zip", &bytes);

    match extract(&archive) {
        Err(Error::Extraction(ExtractionError::EntryFailed { entry, .. })) => {
            assert_eq!(entry, "three.txt")
        }
        other => panic!("expected EntryFailed, got {other:?}"),
    }
    assert_eq!(
        std::fs::read(temp.path().join("cut/one.txt")).unwrap(),
        b"first file"
    );
    assert_eq!(
        std::fs::read(temp.path().join("cut/two.txt")).unwrap(),
        b"second file"
    );
}

#[test]
fn test_not_a_zip_fails_to_open() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(temp.path(), "fake.zip", b"this is not a zip archive at all");

    match extract(&archive) {
        Err(Error::Extraction(ExtractionError::OpenFailed { archive: path, .. })) => {
            assert_eq!(path, archive)
        }
        other => panic!("expected OpenFailed, got {other:?}"),
    }
    assert!(!temp.path().join("fake").exists());
}

#[test]
fn test_error_page_saved_as_zip_leaves_no_target() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "page.zip",
        b"<!DOCTYPE html><html><body>502 Bad Gateway</body></html>",
    );

    assert!(matches!(
        extract(&archive),
        Err(Error::Extraction(ExtractionError::OpenFailed { .. }))
    ));
    assert!(!temp.path().join("page").exists());
}

#[test]
fn test_missing_archive_fails_without_creating_target() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("missing.zip");

    assert!(matches!(
        extract(&archive),
        Err(Error::Extraction(ExtractionError::OpenFailed { .. }))
    ));
    assert!(!temp.path().join("missing").exists());
}

#[test]
fn test_empty_archive_succeeds() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(temp.path(), "empty.zip", &zip_bytes(&[], stored()));

    let summary = extract(&archive).unwrap();
    assert!(summary.files.is_empty());
    assert!(temp.path().join("empty").is_dir());
}

#[test]
fn test_rerun_overwrites_existing_target() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "again.zip",
        &zip_bytes(&[("x.txt", b"fresh")], stored()),
    );
    std::fs::create_dir(temp.path().join("again")).unwrap();
    std::fs::write(temp.path().join("again/x.txt"), b"stale content that is longer").unwrap();

    extract(&archive).unwrap();
    let second = extract(&archive).unwrap();

    assert_eq!(second.files.len(), 1);
    assert_eq!(
        std::fs::read(temp.path().join("again/x.txt")).unwrap(),
        b"fresh"
    );
}

#[test]
fn test_file_without_directory_entry_gets_parents() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "nested.zip",
        &zip_bytes(&[("a/b/c.txt", b"deep")], stored()),
    );

    extract(&archive).unwrap();
    assert_eq!(
        std::fs::read(temp.path().join("nested/a/b/c.txt")).unwrap(),
        b"deep"
    );
}

#[test]
fn test_deflated_entry_larger_than_chunk() {
    let temp = TempDir::new().unwrap();
    let content: Vec<u8> = (0..(CHUNK * 5 + 17)).map(|i| (i % 7) as u8).collect();
    let deflated =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Deflated);
    let archive = write_archive(
        temp.path(),
        "big.zip",
        &zip_bytes(&[("big.bin", &content)], deflated),
    );

    extract(&archive).unwrap();
    assert_eq!(std::fs::read(temp.path().join("big/big.bin")).unwrap(), content);
}

#[test]
fn test_sizes_after_data_are_extracted() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "streamed.zip",
        &data_descriptor_zip(&[("dir/", b""), ("dir/file.txt", b"hello world\n")]),
    );

    let summary = extract(&archive).unwrap();

    let extracted = temp.path().join("streamed/dir/file.txt");
    assert_eq!(std::fs::read(&extracted).unwrap(), b"hello world\n");
    assert_eq!(summary.files, vec![extracted]);
    assert_eq!(summary.directories.len(), 1);
}

#[tokio::test]
async fn test_sizes_after_data_report_success() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "jar.zip",
        &data_descriptor_zip(&[("a.txt", b"alpha"), ("b/c.txt", b"gamma")]),
    );

    let result = extract_archive(archive, CHUNK, CancellationToken::new()).await;
    assert_eq!(result.outcome, Outcome::Success { files: 2 });
    assert_eq!(
        std::fs::read(temp.path().join("jar/b/c.txt")).unwrap(),
        b"gamma"
    );
}

#[test]
fn test_leading_stub_bytes_use_central_directory() {
    let temp = TempDir::new().unwrap();
    let mut bytes = b"#!/bin/sh\nexit 0\n".to_vec();
    bytes.extend(zip_bytes(&[("payload.txt", b"inside")], stored()));
    let archive = write_archive(temp.path(), "sfx.zip", &bytes);

    let summary = extract(&archive).unwrap();
    assert_eq!(summary.files.len(), 1);
    assert_eq!(
        std::fs::read(temp.path().join("sfx/payload.txt")).unwrap(),
        b"inside"
    );
}

#[test]
fn test_entries_extracted_in_archive_order() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "order.zip",
        &zip_bytes(&[("z.txt", b"z"), ("a.txt", b"a"), ("m.txt", b"m")], stored()),
    );

    let summary = extract(&archive).unwrap();
    let names: Vec<_> = summary
        .files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["z.txt", "a.txt", "m.txt"]);
}

#[test]
fn test_unsafe_entry_is_skipped() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "evil.zip",
        &zip_bytes(&[("../escape.txt", b"nope"), ("ok.txt", b"fine")], stored()),
    );

    let summary = extract(&archive).unwrap();
    assert_eq!(summary.skipped, vec!["../escape.txt".to_string()]);
    assert!(!temp.path().join("escape.txt").exists());
    assert_eq!(std::fs::read(temp.path().join("evil/ok.txt")).unwrap(), b"fine");

    let extracted: Vec<_> = walkdir::WalkDir::new(temp.path().join("evil"))
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .collect();
    assert_eq!(extracted.len(), 1);
}

#[tokio::test]
async fn test_cancelled_extraction_reports_failure() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "c.zip",
        &zip_bytes(&[("x.txt", b"x")], stored()),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = extract_archive(archive, CHUNK, cancel).await;
    assert_eq!(failure_code(&result.outcome), "cancelled");
    assert!(!temp.path().join("c/x.txt").exists());
}

#[tokio::test]
async fn test_extract_archive_describes_target() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "tools.zip",
        &zip_bytes(&[("bin/", b""), ("bin/tool", b"#!/bin/sh\n")], stored()),
    );

    let result = extract_archive(archive.clone(), CHUNK, CancellationToken::new()).await;
    assert_eq!(result.archive_path, archive);
    assert_eq!(result.target_dir, temp.path().join("tools"));
    assert_eq!(result.outcome, Outcome::Success { files: 1 });
}

#[tokio::test]
async fn test_extractor_emits_exactly_one_result() {
    let temp = TempDir::new().unwrap();
    let good = write_archive(
        temp.path(),
        "good.zip",
        &zip_bytes(&[("f.txt", b"data")], stored()),
    );
    let bad = write_archive(temp.path(), "bad.zip", b"garbage");

    let (notifier, mut notifications) = notify::channel();
    let extractor = Extractor::new(Arc::new(Config::default()), notifier);

    extractor.start(&good).join().await.unwrap();
    extractor.start(&bad).join().await.unwrap();
    drop(extractor);

    let events = notifications.drain();
    assert_eq!(events.len(), 2);
    match (&events[0], &events[1]) {
        (Event::Extraction(first), Event::Extraction(second)) => {
            assert_eq!(first.outcome, Outcome::Success { files: 1 });
            assert_eq!(failure_code(&second.outcome), "archive_open_failed");
        }
        other => panic!("unexpected events: {other:?}"),
    }
}
