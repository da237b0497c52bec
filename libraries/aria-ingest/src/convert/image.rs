//! Image to JPEG normalization

use aria_core::plugin::{ConversionPlugin, Plugin};
use aria_core::types::{DirectoryInfo, FileInfo, OperationResult};
use aria_core::IngestConfig;
use async_trait::async_trait;
use image::ImageFormat;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Extensions the image converter claims; JPEG files are already in the
/// normalized format and pass through untouched
const CONVERTIBLE_EXTENSIONS: &[&str] = &["png", "gif", "bmp", "webp", "tiff"];

/// Conversion plugin that re-encodes images as JPEG alongside the
/// original
pub struct ImageConvertPlugin;

impl Plugin for ImageConvertPlugin {
    fn id(&self) -> &str {
        "image-convert"
    }

    fn display_name(&self) -> &str {
        "Image to JPEG"
    }

    fn sort_order(&self) -> i32 {
        10
    }
}

#[async_trait]
impl ConversionPlugin for ImageConvertPlugin {
    fn does_handle_file(&self, _directory: &DirectoryInfo, file: &FileInfo) -> bool {
        file.extension()
            .map(|ext| CONVERTIBLE_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    async fn process_file(
        &self,
        directory: &DirectoryInfo,
        file: &FileInfo,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> OperationResult<FileInfo> {
        if cancel.is_cancelled() {
            return OperationResult::error("image conversion cancelled");
        }

        let source = file.full_name(directory);
        let target = source.with_extension("jpg");

        // decode/encode is CPU bound, keep it off the async workers
        let encode_source = source.clone();
        let encode_target = target.clone();
        let encoded = tokio::task::spawn_blocking(move || -> std::result::Result<(), String> {
            let img = image::open(&encode_source).map_err(|e| e.to_string())?;
            // JPEG has no alpha channel
            img.to_rgb8()
                .save_with_format(&encode_target, ImageFormat::Jpeg)
                .map_err(|e| e.to_string())
        })
        .await;

        match encoded {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return OperationResult::error(format!(
                    "could not convert {} to JPEG: {e}",
                    source.display()
                ));
            }
            Err(e) => {
                return OperationResult::error(format!("image conversion task failed: {e}"));
            }
        }

        if config.delete_originals {
            if let Err(e) = tokio::fs::remove_file(&source).await {
                tracing::warn!("Could not delete original {}: {e}", source.display());
            }
        }

        let size = tokio::fs::metadata(&target).await.map_or(0, |m| m.len());
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .map_or_else(|| target.display().to_string(), ToString::to_string);
        tracing::debug!("Converted {} -> {name}", file.name);
        OperationResult::ok(FileInfo::new(name, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn dir_for(temp: &TempDir) -> DirectoryInfo {
        DirectoryInfo {
            id: 0,
            parent_id: None,
            name: "release".to_string(),
            path: temp.path().to_path_buf(),
            file_count: 1,
            image_count: 1,
            media_count: 0,
            metadata_count: 0,
        }
    }

    fn write_png(temp: &TempDir, name: &str) -> FileInfo {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(8, 8, |x, y| Rgb([x as u8 * 8, y as u8 * 8, 128]));
        let path = temp.path().join(name);
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        FileInfo::new(name, std::fs::metadata(&path).unwrap().len())
    }

    #[test]
    fn handles_only_convertible_extensions() {
        let temp = TempDir::new().unwrap();
        let dir = dir_for(&temp);
        let plugin = ImageConvertPlugin;
        assert!(plugin.does_handle_file(&dir, &FileInfo::new("cover.png", 10)));
        assert!(plugin.does_handle_file(&dir, &FileInfo::new("cover.WEBP", 10)));
        assert!(!plugin.does_handle_file(&dir, &FileInfo::new("cover.jpg", 10)));
        assert!(!plugin.does_handle_file(&dir, &FileInfo::new("song.mp3", 10)));
    }

    #[tokio::test]
    async fn converts_png_and_keeps_original_by_default() {
        let temp = TempDir::new().unwrap();
        let dir = dir_for(&temp);
        let file = write_png(&temp, "cover.png");

        let result = ImageConvertPlugin
            .process_file(&dir, &file, &IngestConfig::default(), &CancellationToken::new())
            .await;
        assert!(result.is_success(), "{:?}", result.errors);
        assert_eq!(result.data.as_ref().unwrap().name, "cover.jpg");
        assert!(temp.path().join("cover.jpg").exists());
        assert!(temp.path().join("cover.png").exists());

        // the produced file really is a JPEG
        let reopened = image::open(temp.path().join("cover.jpg")).unwrap();
        assert_eq!(reopened.width(), 8);
    }

    #[tokio::test]
    async fn deletes_original_when_configured() {
        let temp = TempDir::new().unwrap();
        let dir = dir_for(&temp);
        let file = write_png(&temp, "cover.png");

        let config = IngestConfig {
            delete_originals: true,
            ..IngestConfig::default()
        };
        let result = ImageConvertPlugin
            .process_file(&dir, &file, &config, &CancellationToken::new())
            .await;
        assert!(result.is_success());
        assert!(temp.path().join("cover.jpg").exists());
        assert!(!temp.path().join("cover.png").exists());
    }

    #[tokio::test]
    async fn unreadable_image_is_a_per_file_error() {
        let temp = TempDir::new().unwrap();
        let dir = dir_for(&temp);
        std::fs::write(temp.path().join("broken.png"), b"not a png").unwrap();
        let file = FileInfo::new("broken.png", 9);

        let result = ImageConvertPlugin
            .process_file(&dir, &file, &IngestConfig::default(), &CancellationToken::new())
            .await;
        assert!(!result.is_success());
        assert!(result.data.is_none());
    }
}
