use tracing::{debug, warn};

use super::{App, AppError};
use crate::core::chat_stream::{CompletionRequest, GatewayError, StreamMessage};
use crate::core::commands::{classify, InputCommand};
use crate::core::state::SessionState;

const EXIT_NOTE: &str = "The user has chosen to exit the terminal application.";
const EXIT_REPLY: &str = "Goodbye.";
const CONTINUE_PROMPT: &str = "(The user sent a blank message, indicating they would like you to continue your current thought.)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Finished,
}

impl App {
    /// One completion round. In `Quitting` this is the last round and no
    /// input is read afterwards.
    pub async fn run_turn(&mut self) -> Result<TurnOutcome, AppError> {
        let request = self.session.completion_request(&self.prefs);
        let reply = self.complete(request).await?;
        self.session.history.push_assistant(reply);

        if self.session.state.is(SessionState::Quitting) {
            self.release_server().await;
            self.console.farewell()?;
            return Ok(TurnOutcome::Finished);
        }

        self.console.prompt()?;
        let line = self.input.read_line().await?;
        self.console.end_input()?;

        match line {
            Some(line) => {
                let command = classify(&line, &self.session.assets.persona);
                self.apply_command(command, &line)?;
            }
            None => {
                debug!("end of input; treating as exit");
                self.console.end_reply()?;
                self.apply_command(InputCommand::ExitRequested, "")?;
            }
        }
        Ok(TurnOutcome::Continue)
    }

    /// Stream a reply, retrying the identical request once on failure.
    /// Nothing from a failed attempt reaches the history.
    async fn complete(&mut self, request: CompletionRequest) -> Result<String, AppError> {
        match self.stream_reply(request.clone()).await {
            Err(AppError::Gateway(first)) => {
                warn!(error = %first, fault = %first.fault(), "completion failed; retrying once");
                self.console.error(&format!("Error: {first}"))?;
                self.console.debug_note("Retrying the request...")?;
                self.stream_reply(request).await
            }
            other => other,
        }
    }

    async fn stream_reply(&mut self, request: CompletionRequest) -> Result<String, AppError> {
        debug!(
            messages = request.messages.len(),
            temperature = request.temperature,
            "requesting completion"
        );
        let mut rx = self.gateway.open_stream(request);
        let mut reply = String::new();
        let mut failure = None;
        let mut ended = false;

        while let Some(message) = rx.recv().await {
            match message {
                StreamMessage::Chunk(text) => {
                    self.console.assistant_chunk(&text)?;
                    reply.push_str(&text);
                }
                StreamMessage::Error(err) => {
                    failure.get_or_insert(err);
                }
                StreamMessage::End => {
                    ended = true;
                    break;
                }
            }
        }
        self.console.end_reply()?;

        if !ended && failure.is_none() {
            failure = Some(GatewayError::Stream("stream closed before completion".to_string()));
        }
        match failure {
            Some(err) => Err(AppError::Gateway(err)),
            None => Ok(reply),
        }
    }

    /// Apply a classified input line to the session. `typed` is the raw line
    /// and is only used for the command echo.
    pub fn apply_command(&mut self, command: InputCommand, typed: &str) -> Result<(), AppError> {
        match command {
            InputCommand::ExitRequested => {
                let typed = typed.trim().to_lowercase();
                if !typed.is_empty() {
                    self.console
                        .echo(&format!(" << Command \"{typed}\" received!"))?;
                }
                self.session.history.push_assistant(EXIT_NOTE);
                self.session.history.push_user(EXIT_REPLY);
                self.session.state.transition(SessionState::Quitting);
            }
            InputCommand::ModeChange(setting) => {
                self.console
                    .echo(&format!(" << Command \"{}\" received", setting.label))?;
                self.session.history.push_assistant(format!(
                    "The user requested `{}` mode. The AI Temperature setting has changed to {:.2}.",
                    setting.label, setting.temperature
                ));
                self.session.history.push_user(format!(
                    "Explain your `{}` mode to me in 12 words or less.",
                    setting.label
                ));
                debug!(mode = setting.label, temperature = setting.temperature, "mode changed");
                self.session.mode = setting;
            }
            InputCommand::ContinuationRequest => {
                self.session.history.push_user(CONTINUE_PROMPT);
            }
            InputCommand::PlainMessage(text) => {
                self.session.history.push_user(text);
            }
        }
        Ok(())
    }
}
