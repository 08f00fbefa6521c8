use ratatui::crossterm::style::Color;
use tracing::{debug, warn};

use super::{App, AppError};
use crate::core::config::Preferences;
use crate::core::persona::{PersonaAssets, PersonaError};
use crate::core::state::SessionState;
use crate::core::template::title_case;
use crate::ui::console::Console;

/// Load the configured persona, noting any asset that fell back to its
/// built-in text.
pub fn load_persona(
    prefs: &Preferences,
    console: &mut Console,
) -> Result<PersonaAssets, PersonaError> {
    let _ = console.status(
        Color::Yellow,
        &format!("Using persona: \"{}\"!", title_case(&prefs.persona)),
    );

    let load = PersonaAssets::load(&prefs.assets_dir, &prefs.persona, prefs.model.as_deref())?;
    for kind in &load.fallbacks {
        let _ = console.debug_note(&format!(
            "No `{}` asset for this persona; using the built-in text.",
            kind.file_name()
        ));
    }
    Ok(load.assets)
}

impl App {
    /// Seed the conversation, bring up the model server, prepare the console
    /// and enter `Normal`.
    pub async fn initialize(&mut self) -> Result<(), AppError> {
        self.session.seed_history();
        debug!(messages = self.session.history.len(), "history seeded");

        if let Err(err) = self.server.start_server().await {
            warn!(error = %err, "failed to start local server");
            self.console.warning(&format!(
                "Could not start the local server ({err}); assuming it is already running."
            ))?;
        }

        let model = self.session.assets.model_id.clone();
        self.console
            .status(Color::DarkMagenta, &format!("Loading data for \"{model}\"..."))?;
        if let Err(err) = self.server.load_model(&model).await {
            warn!(error = %err, model = %model, "failed to load model");
            self.console.warning(&format!(
                "Model loading failed ({err}). Check if the model ID is correct."
            ))?;
        }

        self.console.clear(self.prefs.clear_console)?;
        self.console.resize(
            !self.prefs.no_resize,
            self.prefs.console_cols,
            self.prefs.console_lines,
        )?;

        self.session.state.transition(SessionState::Normal);
        let header = self.session.assets.header.clone();
        self.console.header(&header)?;
        Ok(())
    }
}
