//! ZIP bundling of output documents

use std::io::{Cursor, Write};

use veil_core::Result;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::package::zip_error;

/// Build a deflated ZIP archive from `(name, bytes)` pairs, in order
pub fn create_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, bytes) in files {
        writer.start_file(name.as_str(), options).map_err(zip_error)?;
        writer.write_all(bytes)?;
    }

    let cursor = writer.finish().map_err(zip_error)?;
    tracing::debug!("Created archive with {} files", files.len());
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_archive_contents() {
        let files = vec![
            ("anonymized_a.docx".to_string(), b"first".to_vec()),
            ("anonymized_b.docx".to_string(), b"second".to_vec()),
        ];
        let bytes = create_zip(&files).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut entry = archive.by_name("anonymized_b.docx").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "second");
    }

    #[test]
    fn test_empty_archive() {
        let bytes = create_zip(&[]).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
