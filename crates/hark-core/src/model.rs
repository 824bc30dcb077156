//! Pretrained model store for the neural-inference engine.
//!
//! The acoustic model is fixed; it is cached under the local data directory
//! and fetched once on first use. Downloads stage to a `.part` file and
//! rename on success, so a crashed or failed fetch never leaves a partial
//! model behind where the cache lookup would find it.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Identifier of the fixed pretrained acoustic model.
pub const MODEL_NAME: &str = "wav2vec2-base-960h";

/// Published ONNX export of the model.
const MODEL_URL: &str =
    "https://huggingface.co/onnx-community/wav2vec2-base-960h/resolve/main/onnx/model.onnx";

/// Download timeout; the model is a few hundred megabytes.
const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Default directory for cached models.
pub fn default_models_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hark")
        .join("models")
}

/// Path the model resolves to inside `models_dir`.
pub fn model_path(models_dir: &Path) -> PathBuf {
    models_dir.join(format!("{MODEL_NAME}.onnx"))
}

/// Ensure the model is present in `models_dir`, downloading it if missing.
pub fn ensure_model(models_dir: &Path) -> Result<PathBuf> {
    let path = model_path(models_dir);
    if path.is_file() {
        debug!(path = %path.display(), "model already cached");
        return Ok(path);
    }

    fs::create_dir_all(models_dir)
        .map_err(|e| Error::ModelLoad(format!("failed to create model cache directory: {e}")))?;

    info!(url = MODEL_URL, dest = %path.display(), "downloading model '{MODEL_NAME}'");
    download(MODEL_URL, &path)?;
    info!("model download complete");

    Ok(path)
}

/// Download `url` to `dest` atomically.
fn download(url: &str, dest: &Path) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .build()
        .map_err(|e| Error::ModelLoad(format!("failed to create HTTP client: {e}")))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| Error::ModelLoad(format!("download failed: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::ModelLoad(format!(
            "download failed: HTTP {}",
            response.status()
        )));
    }

    let part = dest.with_extension("onnx.part");
    match write_body(response, &part) {
        Ok(bytes) => {
            fs::rename(&part, dest)
                .map_err(|e| Error::ModelLoad(format!("failed to finalize download: {e}")))?;
            debug!(bytes, "model fetched");
            Ok(())
        }
        Err(err) => {
            let _ = fs::remove_file(&part);
            Err(err)
        }
    }
}

fn write_body(mut response: reqwest::blocking::Response, part: &Path) -> Result<u64> {
    let total = response.content_length().unwrap_or(0);
    let mut file = fs::File::create(part)
        .map_err(|e| Error::ModelLoad(format!("failed to create staging file: {e}")))?;

    let mut buffer = [0u8; 8192];
    let mut downloaded: u64 = 0;
    let mut last_logged: u64 = 0;

    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| Error::ModelLoad(format!("download interrupted: {e}")))?;
        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .map_err(|e| Error::ModelLoad(format!("failed to write model data: {e}")))?;
        downloaded += bytes_read as u64;

        // Log roughly every 10 MB so long fetches show signs of life.
        if downloaded - last_logged >= 10_000_000 {
            debug!(downloaded, total, "model download progress");
            last_logged = downloaded;
        }
    }

    file.flush()
        .map_err(|e| Error::ModelLoad(format!("failed to flush model data: {e}")))?;

    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_path_uses_the_fixed_identifier() {
        let path = model_path(Path::new("/tmp/models"));
        assert_eq!(
            path,
            Path::new("/tmp/models").join("wav2vec2-base-960h.onnx")
        );
    }

    #[test]
    fn cached_model_resolves_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let cached = model_path(dir.path());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(&cached, b"weights").unwrap();

        let resolved = ensure_model(dir.path()).unwrap();
        assert_eq!(resolved, cached);
    }

    #[test]
    fn failed_download_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.onnx");

        let result = download("http://invalid.nonexistent.example.com/model.onnx", &dest);
        assert!(matches!(result, Err(Error::ModelLoad(_))));
        assert!(!dest.exists());
        assert!(!dest.with_extension("onnx.part").exists());
    }
}
