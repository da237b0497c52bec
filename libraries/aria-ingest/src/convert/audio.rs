//! Audio container to MP3 normalization
//!
//! Inspects the actual audio stream before converting: MPEG-family
//! streams are already MP3-compatible and skipped, except anything in
//! an MP4-family container, which is always converted. Transcoding is
//! delegated to an external binary; a transcode whose output fails MP3
//! verification is a hard failure for that file.

use crate::IngestError;
use aria_core::plugin::{ConversionPlugin, Plugin};
use aria_core::types::{DirectoryInfo, FileInfo, OperationResult};
use aria_core::IngestConfig;
use async_trait::async_trait;
use lofty::{FileType, TaggedFileExt};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Container extensions the audio converter claims
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "wav", "aac", "m4a", "mp4", "opus", "wma", "ape",
];

/// Suffix appended to originals kept after conversion
const ORIGINAL_SUFFIX: &str = ".original";

/// Conversion plugin that normalizes audio files to MP3
pub struct AudioConvertPlugin;

impl Plugin for AudioConvertPlugin {
    fn id(&self) -> &str {
        "audio-convert"
    }

    fn display_name(&self) -> &str {
        "Audio to MP3"
    }

    fn sort_order(&self) -> i32 {
        20
    }
}

impl AudioConvertPlugin {
    fn sniff_file_type(path: &Path) -> Option<FileType> {
        lofty::read_from_path(path).ok().map(|f| f.file_type())
    }

    /// Whether the stream can be kept as-is: an MPEG-family stream
    /// outside an MP4-family container
    fn is_mp3_compatible(path: &Path) -> bool {
        let is_mp4_container = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_lowercase().as_str(), "m4a" | "mp4"))
            .unwrap_or(false);
        if is_mp4_container {
            return false;
        }
        matches!(Self::sniff_file_type(path), Some(FileType::Mpeg))
    }

    async fn run_transcoder(
        source: &Path,
        target: &Path,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> crate::Result<()> {
        let mut command = Command::new(&config.transcoder_path);
        command
            .arg("-i")
            .arg(source)
            .arg("-vn")
            .arg("-ar")
            .arg(config.convert_sample_rate.to_string());
        if config.convert_vbr {
            command.arg("-q:a").arg("0");
        } else {
            command
                .arg("-b:a")
                .arg(format!("{}k", config.convert_bitrate));
        }
        command
            .arg("-y")
            .arg(target)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            IngestError::Process(format!(
                "could not spawn transcoder {:?}: {e}",
                config.transcoder_path
            ))
        })?;

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = child.kill().await;
                Err(IngestError::Cancelled)
            }
            status = child.wait() => match status {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(IngestError::Process(format!("transcoder exited with {status}"))),
                Err(e) => Err(IngestError::Process(format!("transcoder wait failed: {e}"))),
            },
        }
    }
}

#[async_trait]
impl ConversionPlugin for AudioConvertPlugin {
    fn does_handle_file(&self, _directory: &DirectoryInfo, file: &FileInfo) -> bool {
        file.extension()
            .map(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    async fn process_file(
        &self,
        directory: &DirectoryInfo,
        file: &FileInfo,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> OperationResult<FileInfo> {
        let source = file.full_name(directory);

        if Self::is_mp3_compatible(&source) {
            tracing::debug!("{} is already MP3-compatible, skipping", file.name);
            return OperationResult::ok(file.clone());
        }

        let mut transcode_source = source.clone();
        let target = source.with_extension("mp3");
        if target == source {
            // an .mp3 container holding a non-MPEG stream: move the
            // original aside first so the target name is free
            let renamed: PathBuf =
                PathBuf::from(format!("{}{ORIGINAL_SUFFIX}", source.display()));
            if let Err(e) = tokio::fs::rename(&source, &renamed).await {
                return OperationResult::error(format!(
                    "could not move {} aside: {e}",
                    source.display()
                ));
            }
            transcode_source = renamed;
        }

        if let Err(e) = Self::run_transcoder(&transcode_source, &target, config, cancel).await {
            return OperationResult::error(format!("transcode of {} failed: {e}", file.name));
        }

        // verify the transcoder actually produced an MPEG stream
        if !matches!(Self::sniff_file_type(&target), Some(FileType::Mpeg)) {
            return OperationResult::error(format!(
                "transcoded output {} failed MP3 verification",
                target.display()
            ));
        }

        // the original is deleted or kept with a suffix, per configuration
        if transcode_source == source {
            if config.delete_originals {
                if let Err(e) = tokio::fs::remove_file(&source).await {
                    tracing::warn!("Could not delete original {}: {e}", source.display());
                }
            } else {
                let renamed = format!("{}{ORIGINAL_SUFFIX}", source.display());
                if let Err(e) = tokio::fs::rename(&source, &renamed).await {
                    tracing::warn!("Could not rename original {}: {e}", source.display());
                }
            }
        } else if config.delete_originals {
            if let Err(e) = tokio::fs::remove_file(&transcode_source).await {
                tracing::warn!(
                    "Could not delete original {}: {e}",
                    transcode_source.display()
                );
            }
        }

        let size = tokio::fs::metadata(&target).await.map_or(0, |m| m.len());
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .map_or_else(|| target.display().to_string(), ToString::to_string);
        OperationResult::ok(FileInfo::new(name, size))
    }
}
