//! JSON document reading and writing.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sky_common::SkyImage;
use tracing::debug;

/// Deserialize a JSON document from `path`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read document");
    Ok(value)
}

/// Read an image document and check its header against its pixels.
pub fn read_image(path: &Path) -> Result<SkyImage> {
    let raw: SkyImage = read_json(path)?;
    let image = SkyImage::new(raw.header, raw.pixels)
        .with_context(|| format!("invalid image in {}", path.display()))?;
    Ok(image)
}

/// Serialize `value` to `path`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(path: Option<&Path>, value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };

    match path {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("failed to write {}", path.display()))?;
            debug!(path = %path.display(), bytes = json.len(), "Wrote document");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&json)?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Write raw bytes (a PNG) to `path`.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_names_path() {
        let err = read_json::<serde_json::Value>(Path::new("/nonexistent/image.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/image.json"));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.json");
        write_json(Some(&path), &vec![1, 2, 3], false).unwrap();
        let back: Vec<i32> = read_json(&path).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
