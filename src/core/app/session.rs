use tracing::debug;

use crate::core::chat_stream::CompletionRequest;
use crate::core::commands::ModeSetting;
use crate::core::config::Preferences;
use crate::core::history::ConversationHistory;
use crate::core::persona::PersonaAssets;
use crate::core::state::StateMachine;

/// Everything one chat session mutates between turns.
pub struct SessionContext {
    pub assets: PersonaAssets,
    pub history: ConversationHistory,
    pub state: StateMachine,
    pub mode: ModeSetting,
}

impl SessionContext {
    /// A session in `Init` with an empty history.
    pub fn new(assets: PersonaAssets, mode: ModeSetting) -> Self {
        Self {
            assets,
            history: ConversationHistory::new(),
            state: StateMachine::new(),
            mode,
        }
    }

    pub fn seed_history(&mut self) {
        self.history.seed(&self.assets);
    }

    /// Start a new chat: the history is replaced by the reset seed. The
    /// active mode and the session state are left alone.
    pub fn reset_history(&mut self) {
        debug!(discarded = self.history.len(), "resetting conversation history");
        self.history.reset(&self.assets);
    }

    pub fn completion_request(&self, prefs: &Preferences) -> CompletionRequest {
        CompletionRequest {
            model: self.assets.model_id.clone(),
            messages: self.history.to_api_messages(),
            temperature: self.mode.temperature,
            max_tokens: prefs.max_tokens,
            top_k: prefs.top_k,
            n_threads: prefs.threads,
        }
    }
}
