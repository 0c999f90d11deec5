//! Kraken runner - segmentation and transcription of page images
//!
//! Turns a directory of scanned pages into ALTO files before the conversion
//! proper. The `kraken` binary and its recognition model are located the way
//! the user expects from the command line: explicit flags first, then `PATH`
//! and the user's data directory.

use altotei_core::AltoTeiError;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Image extensions handed to kraken
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "tif", "tiff"];

/// Directory receiving the generated ALTO files
pub const OUTPUT_DIR: &str = "temp_alto";

pub struct KrakenRunner {
    binary: PathBuf,
    model: PathBuf,
}

impl KrakenRunner {
    /// Resolve binary and model, failing early when either is missing
    pub fn new(binary: Option<&str>, model: Option<&str>) -> Result<Self> {
        let binary = match binary {
            Some(path) => PathBuf::from(path),
            None => Self::find_on_path("kraken").ok_or_else(|| {
                anyhow!(AltoTeiError::ExternalTool(
                    "kraken not found on PATH (use --kraken-bin)".to_string()
                ))
            })?,
        };

        let model = match model {
            Some(path) => PathBuf::from(path),
            None => Self::default_model_path()?,
        };
        if !model.exists() {
            return Err(AltoTeiError::ExternalTool(format!(
                "recognition model not found at {}",
                model.display()
            ))
            .into());
        }

        Ok(Self { binary, model })
    }

    /// `<data dir>/altotei/models/default.mlmodel`
    pub fn default_model_path() -> Result<PathBuf> {
        let base = dirs::data_dir().ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(base.join("altotei").join("models").join("default.mlmodel"))
    }

    fn find_on_path(name: &str) -> Option<PathBuf> {
        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths)
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Page images of `dir`, in name order
    pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut images = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let path = entry?.path();
            let is_image = path.extension().is_some_and(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                IMAGE_EXTENSIONS.contains(&ext.as_str())
            });
            let hidden = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with('.'));
            if path.is_file() && is_image && !hidden {
                images.push(path);
            }
        }
        images.sort();
        Ok(images)
    }

    /// Transcribe every image of `source_dir` into `<output_root>/temp_alto/`
    ///
    /// Returns the directory holding the ALTO files.
    pub fn transcribe_dir(&self, source_dir: &Path, output_root: &Path) -> Result<PathBuf> {
        let images = Self::list_images(source_dir)?;
        if images.is_empty() {
            return Err(AltoTeiError::ExternalTool(format!(
                "no page images (png, jpg, tif) in {}",
                source_dir.display()
            ))
            .into());
        }

        let output_dir = output_root.join(OUTPUT_DIR);
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        tracing::info!(
            "🔠 Segmenting and transcribing {} image(s) with {}",
            images.len(),
            self.binary.display()
        );
        for image in &images {
            let stem = image
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let alto = output_dir.join(format!("{stem}.xml"));
            self.transcribe(image, &alto)?;
            tracing::info!("   ✅ {}", alto.display());
        }

        Ok(output_dir)
    }

    fn transcribe(&self, image: &Path, alto: &Path) -> Result<()> {
        let output = Command::new(&self.binary)
            .arg("-a")
            .arg("-i")
            .arg(image)
            .arg(alto)
            .args(["segment", "-bl", "ocr", "-m"])
            .arg(&self.model)
            .output()
            .map_err(|err| {
                AltoTeiError::ExternalTool(format!(
                    "could not run {}: {err}",
                    self.binary.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AltoTeiError::ExternalTool(format!(
                "kraken failed on {} ({}): {}",
                image.display(),
                output.status,
                stderr.trim()
            ))
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_are_filtered_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["p2.TIF", "p1.png", "notes.txt", ".p0.jpg", "p3.xml"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let names: Vec<_> = KrakenRunner::list_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["p1.png", "p2.TIF"]);
    }

    #[test]
    fn missing_model_is_an_external_tool_error() {
        let err = KrakenRunner::new(Some("kraken"), Some("/nonexistent/model.mlmodel"))
            .err()
            .unwrap();
        let err = err.downcast::<AltoTeiError>().unwrap();
        assert!(matches!(err, AltoTeiError::ExternalTool(_)));
    }
}
