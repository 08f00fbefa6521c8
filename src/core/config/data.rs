use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::core::commands::{find_mode_by_label, ModeSetting};

pub const DEFAULT_PERSONA: &str = "luna";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8899/v1";
pub const DEFAULT_API_KEY: &str = "lm-studio";
pub const DEFAULT_CONSOLE_LINES: u16 = 100;
pub const DEFAULT_CONSOLE_COLS: u16 = 80;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TOP_K: u32 = 200;
pub const DEFAULT_THREADS: u32 = 16;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_LMS_COMMAND: &str = "lms";
pub const DEFAULT_GPU_RATIO: f32 = 0.225;

/// On-disk configuration. Every field is optional; [`Config::resolve`]
/// fills in defaults.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Persona whose asset directory is loaded (e.g., "luna")
    pub persona: Option<String>,
    /// Verbose diagnostics on the console and debug-level logging
    pub debug: Option<bool>,
    pub clear_console: Option<bool>,
    pub console_lines: Option<u16>,
    pub console_cols: Option<u16>,
    /// Leave the terminal size alone at startup
    pub no_resize: Option<bool>,
    /// Directory holding one sub-directory of text assets per persona
    pub assets_dir: Option<PathBuf>,
    /// Model identifier; takes precedence over the persona's `model-id` file
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub top_k: Option<u32>,
    pub threads: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    /// Label of the mode active at startup (e.g., "factual")
    pub default_mode: Option<String>,
    /// Start the LM Studio server and load the model at startup
    pub manage_server: Option<bool>,
    pub lms_command: Option<String>,
    /// Fraction of GPU offload passed to `lms load --gpu`
    pub gpu_ratio: Option<f32>,
    pub stop_server_on_exit: Option<bool>,
}

/// Settings given on the command line; `Some` wins over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub persona: Option<String>,
    pub debug: bool,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub no_server: bool,
}

/// Resolved, read-only preferences for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub persona: String,
    pub debug: bool,
    pub clear_console: bool,
    pub console_lines: u16,
    pub console_cols: u16,
    pub no_resize: bool,
    pub assets_dir: PathBuf,
    pub model: Option<String>,
    pub base_url: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub top_k: u32,
    pub threads: u32,
    pub request_timeout: Duration,
    pub default_mode: ModeSetting,
    pub manage_server: bool,
    pub lms_command: String,
    pub gpu_ratio: f32,
    pub stop_server_on_exit: bool,
}

impl Config {
    /// Merge file values, command-line overrides and defaults.
    /// `config_dir` anchors the default assets directory.
    pub fn resolve(&self, overrides: &Overrides, config_dir: &Path) -> Preferences {
        let persona = overrides
            .persona
            .clone()
            .or_else(|| self.persona.clone())
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .filter(|p| {
                let valid = is_valid_persona_name(p);
                if !valid {
                    warn!(persona = %p, "persona names cannot contain path components; using default");
                }
                valid
            })
            .unwrap_or_else(|| DEFAULT_PERSONA.to_string());

        let default_mode = match self.default_mode.as_deref() {
            Some(label) => find_mode_by_label(label).unwrap_or_else(|| {
                warn!(label, "unknown default_mode; using standard");
                ModeSetting::default()
            }),
            None => ModeSetting::default(),
        };

        let gpu_ratio = self
            .gpu_ratio
            .filter(|ratio| (0.0..=1.0).contains(ratio))
            .unwrap_or(DEFAULT_GPU_RATIO);

        Preferences {
            persona,
            debug: overrides.debug || self.debug.unwrap_or(false),
            clear_console: self.clear_console.unwrap_or(false),
            console_lines: self.console_lines.unwrap_or(DEFAULT_CONSOLE_LINES),
            console_cols: self.console_cols.unwrap_or(DEFAULT_CONSOLE_COLS),
            no_resize: self.no_resize.unwrap_or(false),
            assets_dir: self
                .assets_dir
                .clone()
                .unwrap_or_else(|| config_dir.join("personas")),
            model: overrides.model.clone().or_else(|| self.model.clone()),
            base_url: overrides
                .base_url
                .clone()
                .or_else(|| self.base_url.clone())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: self
                .api_key
                .clone()
                .unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            top_k: self.top_k.unwrap_or(DEFAULT_TOP_K),
            threads: self.threads.unwrap_or(DEFAULT_THREADS),
            request_timeout: Duration::from_secs(
                self.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            default_mode,
            manage_server: !overrides.no_server && self.manage_server.unwrap_or(true),
            lms_command: self
                .lms_command
                .clone()
                .unwrap_or_else(|| DEFAULT_LMS_COMMAND.to_string()),
            gpu_ratio,
            stop_server_on_exit: self.stop_server_on_exit.unwrap_or(false),
        }
    }

    /// The configuration written by `luna init`.
    pub fn starter() -> Self {
        Config {
            persona: Some(DEFAULT_PERSONA.to_string()),
            debug: Some(false),
            clear_console: Some(false),
            console_lines: Some(DEFAULT_CONSOLE_LINES),
            console_cols: Some(DEFAULT_CONSOLE_COLS),
            no_resize: Some(true),
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            default_mode: Some(ModeSetting::default().label.to_string()),
            manage_server: Some(true),
            ..Default::default()
        }
    }
}

/// A persona name is a single directory name under the assets directory.
pub fn is_valid_persona_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && name != "." && !name.contains("..")
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
