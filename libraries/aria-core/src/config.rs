//! Ingestion configuration
//!
//! A single explicit struct threaded through every call. There is no
//! ambient/global configuration state anywhere in the pipeline; missing
//! values take the documented defaults below.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Configuration for one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestConfig {
    /// Target bitrate in kbit/s for audio conversion
    pub convert_bitrate: u32,

    /// Target sample rate in Hz for audio conversion
    pub convert_sample_rate: u32,

    /// Whether to use variable bitrate encoding
    pub convert_vbr: bool,

    /// Continue with the next directory after a directory-level error
    /// instead of aborting the batch
    pub do_continue_on_directory_processing_errors: bool,

    /// Maximum number of directories taken from a scan in one pass
    pub max_processing_count: usize,

    /// Delete original files after successful conversion / NFO handling.
    /// Destructive; off by default.
    pub delete_originals: bool,

    /// Interpreter used to run script hooks
    pub script_interpreter: String,

    /// Pre-discovery script hook, skipped when unset
    pub pre_discovery_script: Option<PathBuf>,

    /// Post-discovery script hook, skipped when unset
    pub post_discovery_script: Option<PathBuf>,

    /// Treat a pre-script failure as fatal for the directory instead of
    /// a warning
    pub script_failure_is_fatal: bool,

    /// External transcoder binary used for audio conversion
    pub transcoder_path: PathBuf,

    /// Per-plugin enabled overrides keyed by plugin id; plugins default
    /// to enabled when absent
    pub plugin_enabled: HashMap<String, bool>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            convert_bitrate: 320,
            convert_sample_rate: 44_100,
            convert_vbr: false,
            do_continue_on_directory_processing_errors: false,
            max_processing_count: 500,
            delete_originals: false,
            script_interpreter: "/bin/sh".to_string(),
            pre_discovery_script: None,
            post_discovery_script: None,
            script_failure_is_fatal: false,
            transcoder_path: PathBuf::from("ffmpeg"),
            plugin_enabled: HashMap::new(),
        }
    }
}

impl IngestConfig {
    /// Whether the plugin with this id should run; unknown ids are enabled
    pub fn is_plugin_enabled(&self, plugin_id: &str) -> bool {
        self.plugin_enabled.get(plugin_id).copied().unwrap_or(true)
    }
}
