//! Conversation controller
//!
//! Owns the rules for how a session moves from the topic menu to free-form
//! chat, and when the completion provider gets called:
//!
//! 1. `initialize` seeds the greeting (once per session)
//! 2. `select_topic` is only valid while the menu is open, and closes it
//! 3. `submit_free_text` accepts any non-blank text, and also closes the menu
//! 4. every accepted input ends in exactly one appended assistant message,
//!    whether the provider answered, failed, or was never configured

use std::sync::Arc;

use crate::config::{ConfigError, Locale, PersonaMap};
use crate::conversation::{ConversationState, Message, Topic};
use crate::providers::{CompletionProvider, CompletionRequest, ProviderError};

/// Sampling temperature for every completion
pub const TEMPERATURE: f32 = 0.7;

/// A discrete user action applied to a session
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Initialize,
    SelectTopic(Topic),
    SubmitFreeText(String),
}

/// Rejected actions. State is untouched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("Topic options are no longer available in this session")]
    OptionsClosed,

    #[error("Message text must not be empty")]
    EmptyInput,
}

/// Why a completion produced no reply text
#[derive(Debug, thiserror::Error)]
enum CompletionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub struct ConversationController {
    locale: Locale,
    personas: PersonaMap,
    provider: Result<Arc<dyn CompletionProvider>, ConfigError>,
}

impl ConversationController {
    /// Create a controller. Pass `Err(ConfigError)` as the provider when no
    /// credential is configured; sessions still work but every completion
    /// answers with the "not configured" notice.
    pub fn new(
        locale: Locale,
        personas: PersonaMap,
        provider: Result<Arc<dyn CompletionProvider>, ConfigError>,
    ) -> Self {
        Self {
            locale,
            personas,
            provider,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_ok()
    }

    /// Create the session state if it doesn't exist yet
    pub fn initialize<'a>(&self, slot: &'a mut Option<ConversationState>) -> &'a mut ConversationState {
        slot.get_or_insert_with(|| {
            tracing::debug!("Seeding new conversation");
            ConversationState::new(self.locale.greeting())
        })
    }

    /// Apply one action to a session, initializing it first if needed
    pub async fn dispatch<'a>(
        &self,
        slot: &'a mut Option<ConversationState>,
        action: Action,
    ) -> Result<&'a ConversationState, ControllerError> {
        let state = self.initialize(slot);

        match action {
            Action::Initialize => {}
            Action::SelectTopic(topic) => self.select_topic(state, topic).await?,
            Action::SubmitFreeText(text) => self.submit_free_text(state, &text).await?,
        }

        Ok(state)
    }

    pub async fn select_topic(
        &self,
        state: &mut ConversationState,
        topic: Topic,
    ) -> Result<(), ControllerError> {
        if !state.show_options() {
            return Err(ControllerError::OptionsClosed);
        }

        state.push(Message::user(self.locale.topic_request(topic)));
        state.choose_topic(topic);
        self.request_completion(state).await;
        Ok(())
    }

    pub async fn submit_free_text(
        &self,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<(), ControllerError> {
        if text.trim().is_empty() {
            return Err(ControllerError::EmptyInput);
        }

        state.push(Message::user(text));
        state.close_options();
        self.request_completion(state).await;
        Ok(())
    }

    /// Ask the provider for the next reply and append it.
    ///
    /// Always appends exactly one assistant message.
    pub async fn request_completion(&self, state: &mut ConversationState) {
        let topic = state.selected_topic();
        let history_len = state.messages().len();

        let reply = match self.complete(state).await {
            Ok(text) => {
                tracing::info!(?topic, history_len, "Completion succeeded");
                text
            }
            Err(CompletionError::Config(e)) => {
                tracing::warn!(?topic, "Skipping completion: {}", e);
                self.locale.credential_missing().to_string()
            }
            Err(CompletionError::Provider(e)) => {
                tracing::warn!(?topic, history_len, "Completion failed: {}", e);
                self.locale.provider_failure(&e.to_string())
            }
        };

        state.push(Message::assistant(reply));
    }

    async fn complete(&self, state: &ConversationState) -> Result<String, CompletionError> {
        let provider = self.provider.as_ref().map_err(|e| e.clone())?;

        let request = CompletionRequest {
            system: self.personas.resolve(state.selected_topic()).to_string(),
            messages: state.messages().to_vec(),
            temperature: TEMPERATURE,
        };

        Ok(provider.complete(&request).await?)
    }
}
