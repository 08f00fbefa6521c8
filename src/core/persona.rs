//! Persona-scoped static text assets.
//!
//! Each persona owns a directory of plain text files. Everything except the
//! model identifier has a built-in fallback, and every asset is rendered
//! through [`crate::core::template`] before use.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::config::data::path_display;
use crate::core::template::{render, TemplateContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    ModelId,
    SystemPrompt,
    UserInit,
    UserReset,
    InitModMessage,
    AppHeader,
}

impl AssetKind {
    pub const ALL: [AssetKind; 6] = [
        AssetKind::ModelId,
        AssetKind::SystemPrompt,
        AssetKind::UserInit,
        AssetKind::UserReset,
        AssetKind::InitModMessage,
        AssetKind::AppHeader,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            AssetKind::ModelId => "model-id",
            AssetKind::SystemPrompt => "system-short",
            AssetKind::UserInit => "user-init",
            AssetKind::UserReset => "user-reset",
            AssetKind::InitModMessage => "init-mod-message",
            AssetKind::AppHeader => "app-header",
        }
    }

    pub fn default_text(self) -> Option<&'static str> {
        match self {
            AssetKind::ModelId => None,
            AssetKind::SystemPrompt => Some(DEFAULT_SYSTEM_PROMPT),
            AssetKind::UserInit => Some(DEFAULT_USER_INIT),
            AssetKind::UserReset => Some(DEFAULT_USER_RESET),
            AssetKind::InitModMessage => Some(DEFAULT_INIT_MOD_MESSAGE),
            AssetKind::AppHeader => Some(DEFAULT_APP_HEADER),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are {Persona}, an AI assistant running on a terminal client.";
const DEFAULT_USER_INIT: &str =
    "Briefly explain who you are to a user opening this application for the first time.";
const DEFAULT_USER_RESET: &str =
    "The user started a new chat. Your chat history has been cleared. Say hello!";
const DEFAULT_INIT_MOD_MESSAGE: &str = "You are running on a console window on a user's computer. Keep your message to 20 words or less.\n*** (This message was generated by the moderator. The user cannot read it) ***";
const DEFAULT_APP_HEADER: &str =
    "{color.cyan}{bold}{Persona}{reset}{color.yellow} - AI Terminal Application!{reset}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaAssets {
    pub persona: String,
    pub model_id: String,
    pub system_prompt: String,
    pub user_init: String,
    pub user_reset: String,
    pub init_mod_message: String,
    pub header: String,
}

/// Loaded assets plus the assets that fell back to built-in text.
#[derive(Debug)]
pub struct PersonaLoad {
    pub assets: PersonaAssets,
    pub fallbacks: Vec<AssetKind>,
}

#[derive(Debug)]
pub enum PersonaError {
    /// No `model-id` file and no model configured.
    MissingModelId { path: PathBuf },
    /// An asset exists but could not be read.
    Read { path: PathBuf, source: io::Error },
}

impl fmt::Display for PersonaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonaError::MissingModelId { path } => write!(
                f,
                "Model identifier not found at {} (set `model` in config.toml or create the file)",
                path_display(path)
            ),
            PersonaError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path_display(path), source)
            }
        }
    }
}

impl std::error::Error for PersonaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersonaError::MissingModelId { .. } => None,
            PersonaError::Read { source, .. } => Some(source),
        }
    }
}

pub fn persona_dir(assets_dir: &Path, persona: &str) -> PathBuf {
    assets_dir.join(persona)
}

fn read_asset(dir: &Path, kind: AssetKind) -> Result<Option<String>, PersonaError> {
    let path = dir.join(kind.file_name());
    match fs::read_to_string(&path) {
        Ok(contents) => {
            let contents = contents
                .strip_suffix('\n')
                .map(|s| s.strip_suffix('\r').unwrap_or(s))
                .unwrap_or(contents.as_str());
            Ok(Some(contents.to_string()))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PersonaError::Read { path, source }),
    }
}

impl PersonaAssets {
    /// Load the assets for `persona` from `assets_dir/<persona>/`.
    ///
    /// `model_override` takes precedence over the `model-id` file.
    pub fn load(
        assets_dir: &Path,
        persona: &str,
        model_override: Option<&str>,
    ) -> Result<PersonaLoad, PersonaError> {
        let dir = persona_dir(assets_dir, persona);
        debug!(dir = %dir.display(), "loading persona assets");

        let mut fallbacks = Vec::new();

        let model_id = match model_override {
            Some(model) => model.trim().to_string(),
            None => match read_asset(&dir, AssetKind::ModelId)? {
                Some(id) if !id.trim().is_empty() => id.trim().to_string(),
                _ => {
                    return Err(PersonaError::MissingModelId {
                        path: dir.join(AssetKind::ModelId.file_name()),
                    })
                }
            },
        };

        let context = TemplateContext::new(persona, model_id.clone());
        let mut text = |kind: AssetKind| -> Result<String, PersonaError> {
            let raw = match read_asset(&dir, kind)? {
                Some(contents) => contents,
                None => {
                    warn!(asset = kind.file_name(), "persona asset missing; using default");
                    fallbacks.push(kind);
                    kind.default_text().unwrap_or_default().to_string()
                }
            };
            Ok(render(&raw, &context))
        };

        let system_prompt = text(AssetKind::SystemPrompt)?;
        let user_init = text(AssetKind::UserInit)?;
        let user_reset = text(AssetKind::UserReset)?;
        let init_mod_message = text(AssetKind::InitModMessage)?;
        let header = text(AssetKind::AppHeader)?;

        Ok(PersonaLoad {
            assets: PersonaAssets {
                persona: persona.to_string(),
                model_id,
                system_prompt,
                user_init,
                user_reset,
                init_mod_message,
                header,
            },
            fallbacks,
        })
    }
}

/// Write the built-in assets for `persona`. Existing files are kept unless
/// `force` is set, and `model-id` is only written when a model is given.
/// Returns the files written.
pub fn write_default_assets(
    assets_dir: &Path,
    persona: &str,
    model_id: Option<&str>,
    force: bool,
) -> io::Result<Vec<PathBuf>> {
    let dir = persona_dir(assets_dir, persona);
    fs::create_dir_all(&dir)?;

    let mut written = Vec::new();
    for kind in AssetKind::ALL {
        let path = dir.join(kind.file_name());
        if path.exists() && !force {
            continue;
        }
        let Some(contents) = kind.default_text().or(model_id) else {
            continue;
        };
        fs::write(&path, format!("{contents}\n"))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, kind: AssetKind, contents: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(kind.file_name()), contents).unwrap();
    }

    #[test]
    fn loads_all_assets_and_renders_placeholders() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("luna");
        write(&dir, AssetKind::ModelId, "luna-7b-q4\n");
        write(&dir, AssetKind::SystemPrompt, "You are {Persona}.\n");
        write(&dir, AssetKind::UserInit, "Introduce yourself.\n");
        write(&dir, AssetKind::UserReset, "New chat.\n");
        write(&dir, AssetKind::InitModMessage, "Model is {model}.\n");
        write(&dir, AssetKind::AppHeader, "== {persona} ==\n");

        let load = PersonaAssets::load(temp.path(), "luna", None).unwrap();
        assert!(load.fallbacks.is_empty());
        let assets = load.assets;
        assert_eq!(assets.model_id, "luna-7b-q4");
        assert_eq!(assets.system_prompt, "You are Luna.");
        assert_eq!(assets.user_init, "Introduce yourself.");
        assert_eq!(assets.user_reset, "New chat.");
        assert_eq!(assets.init_mod_message, "Model is luna-7b-q4.");
        assert_eq!(assets.header, "== luna ==");
    }

    #[test]
    fn missing_text_assets_fall_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("luna"), AssetKind::ModelId, "m");

        let load = PersonaAssets::load(temp.path(), "luna", None).unwrap();
        assert_eq!(load.fallbacks.len(), 5);
        assert_eq!(
            load.assets.system_prompt,
            "You are Luna, an AI assistant running on a terminal client."
        );
        assert_eq!(load.assets.user_reset, DEFAULT_USER_RESET);
    }

    #[test]
    fn missing_model_id_is_fatal_without_override() {
        let temp = TempDir::new().unwrap();
        let err = PersonaAssets::load(temp.path(), "luna", None).unwrap_err();
        assert!(matches!(err, PersonaError::MissingModelId { .. }));

        let load = PersonaAssets::load(temp.path(), "luna", Some("configured")).unwrap();
        assert_eq!(load.assets.model_id, "configured");
    }

    #[test]
    fn blank_model_id_file_counts_as_missing() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("luna"), AssetKind::ModelId, "  \n");
        assert!(PersonaAssets::load(temp.path(), "luna", None).is_err());
    }

    #[test]
    fn multi_line_assets_keep_inner_newlines() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("luna");
        write(&dir, AssetKind::ModelId, "m");
        write(&dir, AssetKind::InitModMessage, "line one\nline two\n");

        let load = PersonaAssets::load(temp.path(), "luna", None).unwrap();
        assert_eq!(load.assets.init_mod_message, "line one\nline two");
    }

    #[test]
    fn default_assets_round_trip_through_loader() {
        let temp = TempDir::new().unwrap();
        let written = write_default_assets(temp.path(), "nova", Some("nova-3b"), false).unwrap();
        assert_eq!(written.len(), AssetKind::ALL.len());

        let load = PersonaAssets::load(temp.path(), "nova", None).unwrap();
        assert!(load.fallbacks.is_empty());
        assert_eq!(load.assets.model_id, "nova-3b");
        assert!(load.assets.header.contains("Nova"));

        let rewritten = write_default_assets(temp.path(), "nova", Some("other"), false).unwrap();
        assert!(rewritten.is_empty());
    }

    #[test]
    fn default_assets_without_model_skip_model_id() {
        let temp = TempDir::new().unwrap();
        let written = write_default_assets(temp.path(), "luna", None, false).unwrap();
        assert_eq!(written.len(), AssetKind::ALL.len() - 1);
        assert!(!temp.path().join("luna").join("model-id").exists());

        let forced = write_default_assets(temp.path(), "luna", None, true).unwrap();
        assert_eq!(forced.len(), AssetKind::ALL.len() - 1);
    }
}
