//! Concatenation of per-day CSV files that share one header.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::Result;

/// Concatenate `inputs` into `output`, keeping only the first file's header.
///
/// Returns the number of files that contributed content.
#[tracing::instrument(level = "debug", skip(inputs))]
pub fn concat_with_single_header(inputs: &[PathBuf], output: &Path) -> Result<usize> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(fs::File::create(output)?);
    let mut first = true;
    let mut contributed = 0;

    for input in inputs {
        let bytes = fs::read(input)?;
        let text = String::from_utf8_lossy(&bytes);
        if text.is_empty() {
            debug!("Skipping empty file {}", input.display());
            continue;
        }

        let mut lines = text.split_inclusive('\n');
        if !first {
            lines.next();
        }
        for line in lines {
            writer.write_all(line.as_bytes())?;
            if !line.ends_with('\n') {
                writer.write_all(b"\n")?;
            }
        }
        first = false;
        contributed += 1;
    }

    writer.flush()?;
    info!("Merged {} files into {}", contributed, output.display());
    Ok(contributed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_header_kept_once() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.csv", b"id,delay\n1,3\n2,0\n");
        let b = write(&dir, "b.csv", b"id,delay\n3,7\n");
        let out = dir.path().join("merged.csv");

        let count = concat_with_single_header(&[a, b], &out).unwrap();
        assert_eq!(count, 2);
        assert_eq!(fs::read_to_string(&out).unwrap(), "id,delay\n1,3\n2,0\n3,7\n");
    }

    #[test]
    fn test_empty_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let empty = write(&dir, "empty.csv", b"");
        let a = write(&dir, "a.csv", b"id,delay\n1,3\n");
        let b = write(&dir, "b.csv", b"id,delay\n2,4\n");
        let out = dir.path().join("merged.csv");

        let count = concat_with_single_header(&[empty, a, b], &out).unwrap();
        assert_eq!(count, 2);
        assert_eq!(fs::read_to_string(&out).unwrap(), "id,delay\n1,3\n2,4\n");
    }

    #[test]
    fn test_missing_trailing_newline_and_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.csv", b"id,name\n1,Read\xffing");
        let b = write(&dir, "b.csv", b"id,name\r\n2,Didcot\r\n");
        let out = dir.path().join("nested").join("merged.csv");

        concat_with_single_header(&[a, b], &out).unwrap();
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "id,name\n1,Read\u{fffd}ing\n2,Didcot\r\n"
        );
    }
}
