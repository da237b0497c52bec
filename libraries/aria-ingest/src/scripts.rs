//! External script hook plugins
//!
//! Scripts are invoked as `<interpreter> <script-path> -d "<directory>"
//! -r <0|1>` where `-r` encodes whether originals should be deleted.
//! Only the exit status takes part in the contract; failure is reported
//! in the result envelope, never raised. The child process is killed on
//! cancellation and its handle released on every exit path.

use aria_core::plugin::{Plugin, ScriptPlugin};
use aria_core::types::{DirectoryInfo, OperationResult};
use aria_core::IngestConfig;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Which hook point a script plugin serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptHook {
    PreDiscovery,
    PostDiscovery,
}

/// Script plugin bound to one hook point. When no script is configured
/// for the hook, the plugin behaves as a no-op.
pub struct ExternalScriptPlugin {
    hook: ScriptHook,
}

impl ExternalScriptPlugin {
    pub fn new(hook: ScriptHook) -> Self {
        Self { hook }
    }

    fn script_path<'a>(&self, config: &'a IngestConfig) -> Option<&'a PathBuf> {
        match self.hook {
            ScriptHook::PreDiscovery => config.pre_discovery_script.as_ref(),
            ScriptHook::PostDiscovery => config.post_discovery_script.as_ref(),
        }
    }
}

impl Plugin for ExternalScriptPlugin {
    fn id(&self) -> &str {
        match self.hook {
            ScriptHook::PreDiscovery => "script-pre",
            ScriptHook::PostDiscovery => "script-post",
        }
    }

    fn display_name(&self) -> &str {
        match self.hook {
            ScriptHook::PreDiscovery => "Pre-discovery Script",
            ScriptHook::PostDiscovery => "Post-discovery Script",
        }
    }
}

#[async_trait]
impl ScriptPlugin for ExternalScriptPlugin {
    async fn process(
        &self,
        directory: &DirectoryInfo,
        config: &IngestConfig,
        cancel: &CancellationToken,
    ) -> OperationResult<bool> {
        let Some(script) = self.script_path(config) else {
            return OperationResult::ok(true);
        };

        let mut child = match Command::new(&config.script_interpreter)
            .arg(script)
            .arg("-d")
            .arg(&directory.path)
            .arg("-r")
            .arg(if config.delete_originals { "1" } else { "0" })
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return OperationResult::error(format!(
                    "could not spawn script {}: {e}",
                    script.display()
                ));
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = child.kill().await;
                OperationResult::error(format!("script {} cancelled", self.id()))
            }
            status = child.wait() => match status {
                Ok(status) if status.success() => OperationResult::ok(true),
                Ok(status) => {
                    let mut result = OperationResult {
                        data: Some(false),
                        errors: Vec::new(),
                    };
                    result.push_error(format!(
                        "script {} exited with {status} for {}",
                        script.display(),
                        directory.path.display()
                    ));
                    result
                }
                Err(e) => OperationResult::error(format!("script wait failed: {e}")),
            },
        }
    }
}
