//! Zip fixtures and test configuration

use downunzip::Config;
use std::io::{Cursor, Write};
use std::path::Path;

/// Build a stored (uncompressed) ZIP in memory; names ending in `/` become directories
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
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

/// A ZIP of three files whose last entry is cut off five bytes into its data
pub fn truncated_zip() -> Vec<u8> {
    let payload: &[u8] = b"THIRD-ENTRY-PAYLOAD-THAT-GETS-CUT";
    let mut bytes = zip_bytes(&[
        ("one.txt", b"first file"),
        ("two.txt", b"second file"),
        ("three.txt", payload),
    ]);
    let start = bytes
        .windows(payload.len())
        .position(|w| w == payload)
        .unwrap();
    bytes.truncate(start + 5);
    bytes
}

/// Default config writing into `dir/downloads`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.download.download_dir = dir.join("downloads");
    config
}
