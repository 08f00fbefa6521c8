use std::error::Error;

use ratatui::crossterm::style::Color;

use crate::core::app::{load_persona, App, SessionContext};
use crate::core::chat_stream::ChatStreamService;
use crate::core::config::Preferences;
use crate::core::server::{LmsCli, ServerControl, UnmanagedServer};
use crate::ui::console::{Console, StdinInput};

pub async fn run_chat(prefs: Preferences) -> Result<(), Box<dyn Error>> {
    let mut console = Console::stdout(prefs.debug);
    console.status(Color::Yellow, "Loading preferences...")?;
    console.debug_note("*** Debug mode is on. Expect verbose console output. ***")?;

    let assets = load_persona(&prefs, &mut console)?;

    let client = reqwest::Client::builder()
        .timeout(prefs.request_timeout)
        .build()?;
    let gateway = ChatStreamService::new(client, prefs.base_url.clone(), prefs.api_key.clone());

    let server: Box<dyn ServerControl> = if prefs.manage_server {
        Box::new(LmsCli::new(prefs.lms_command.clone(), prefs.gpu_ratio))
    } else {
        Box::new(UnmanagedServer)
    };

    let session = SessionContext::new(assets, prefs.default_mode);
    let mut app = App::new(
        prefs,
        session,
        console,
        Box::new(gateway),
        server,
        Box::new(StdinInput::new()),
    );
    app.run().await?;
    Ok(())
}
