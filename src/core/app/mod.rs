//! The chat session: one explicitly built context that owns the preferences,
//! the conversation and every collaborator, driven phase by phase until the
//! session quits.

use std::fmt;
use std::io;

use tracing::{debug, warn};

use crate::core::chat_stream::{ChatGateway, GatewayError};
use crate::core::config::Preferences;
use crate::core::server::ServerControl;
use crate::ui::console::{Console, InputSource};

pub mod init;
pub mod session;
pub mod turn;

pub use init::load_persona;
pub use session::SessionContext;
pub use turn::TurnOutcome;

/// Unrecoverable session failures.
#[derive(Debug)]
pub enum AppError {
    /// The model server failed twice in a row for the same request.
    Gateway(GatewayError),
    /// Console output or input failed.
    Io(io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Gateway(err) => write!(f, "{err}"),
            AppError::Io(err) => write!(f, "Console I/O failed: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Gateway(err) => Some(err),
            AppError::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Io(err)
    }
}

pub struct App {
    pub prefs: Preferences,
    pub session: SessionContext,
    pub console: Console,
    gateway: Box<dyn ChatGateway>,
    server: Box<dyn ServerControl>,
    input: Box<dyn InputSource>,
}

impl App {
    pub fn new(
        prefs: Preferences,
        session: SessionContext,
        console: Console,
        gateway: Box<dyn ChatGateway>,
        server: Box<dyn ServerControl>,
        input: Box<dyn InputSource>,
    ) -> Self {
        Self {
            prefs,
            session,
            console,
            gateway,
            server,
            input,
        }
    }

    /// Drive the session to completion: initialize, then run turns until the
    /// quitting round has finished.
    pub async fn run(&mut self) -> Result<(), AppError> {
        loop {
            let step = if self.session.state.current().requests_completion() {
                self.run_turn().await
            } else {
                self.initialize().await.map(|()| TurnOutcome::Continue)
            };

            match step {
                Ok(TurnOutcome::Continue) => {}
                Ok(TurnOutcome::Finished) => {
                    debug!("session finished");
                    return Ok(());
                }
                Err(err) => {
                    self.release_server().await;
                    return Err(err);
                }
            }
        }
    }

    /// Unload the model and, when configured, stop the server. Failures are
    /// only reported.
    pub(crate) async fn release_server(&mut self) {
        let model = self.session.assets.model_id.clone();
        if let Err(err) = self.server.unload_model(&model).await {
            warn!(error = %err, "failed to unload model");
            let _ = self.console.warning(&format!("Model unload failed: {err}"));
        }

        if self.prefs.stop_server_on_exit {
            if let Err(err) = self.server.stop_server().await {
                warn!(error = %err, "failed to stop server");
                let _ = self.console.warning(&format!("Server stop failed: {err}"));
            }
        }
    }
}

#[cfg(test)]
mod tests;
