use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::prompts::{self, Prompt};
use super::provider::{ChatProvider, OpenRouterProvider, ServiceFailure};
use super::TextTransform;
use crate::config::TransformConfig;
use crate::context::{Language, Tone};
use crate::error::{GrammaryError, Result};
use crate::keys::{self, KeyStore};

/// Operations that need a credential, by the name users see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Translate,
    CorrectGrammar,
    Summarize,
    AdjustTone,
}

impl Operation {
    fn display_name(self) -> &'static str {
        match self {
            Operation::Translate => "Translation",
            Operation::CorrectGrammar => "Grammar correction",
            Operation::Summarize => "Summarization",
            Operation::AdjustTone => "Tone adjustment",
        }
    }
}

/// Fixed text returned instead of calling the backend when no key is set.
pub fn needs_configuration_message(operation: Operation) -> String {
    GrammaryError::Configuration {
        operation: operation.display_name(),
    }
    .user_message()
}

/// The four transform operations over a chat provider and a key store.
pub struct TransformService {
    provider: Arc<dyn ChatProvider>,
    keys: Arc<dyn KeyStore>,
    summary_language: String,
}

impl TransformService {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        keys: Arc<dyn KeyStore>,
        summary_language: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            keys,
            summary_language: summary_language.into(),
        }
    }

    /// OpenRouter provider configured from `config`.
    pub fn from_config(config: &TransformConfig, keys: Arc<dyn KeyStore>) -> Self {
        Self::new(
            Arc::new(OpenRouterProvider::new(config)),
            keys,
            config.summary_language.clone(),
        )
    }

    pub fn key_store(&self) -> &Arc<dyn KeyStore> {
        &self.keys
    }

    fn run(&self, operation: Operation, prompt: Prompt) -> Result<String> {
        let Some(api_key) = keys::resolve_key(self.keys.as_ref(), keys::OPENROUTER) else {
            info!(
                operation = operation.display_name(),
                "No API key configured, returning instructions"
            );
            return Ok(needs_configuration_message(operation));
        };

        self.provider
            .complete(&prompt.into_messages(), &api_key)
            .map_err(|e| {
                warn!(
                    operation = operation.display_name(),
                    provider = self.provider.provider_id(),
                    error = %format!("{:#}", e),
                    "Transform failed"
                );
                service_error(e)
            })
    }
}

fn service_error(error: anyhow::Error) -> GrammaryError {
    match error.downcast_ref::<ServiceFailure>() {
        Some(failure) => GrammaryError::Service {
            message: failure.message.clone(),
            status: failure.status,
        },
        None => GrammaryError::service(format!("{:#}", error)),
    }
}

impl TextTransform for TransformService {
    #[instrument(skip_all, fields(target = target.code(), tone = %tone))]
    fn translate(&self, text: &str, target: Language, tone: Tone) -> Result<String> {
        self.run(Operation::Translate, prompts::translate(text, target, tone))
    }

    #[instrument(skip_all)]
    fn correct_grammar(&self, text: &str) -> Result<String> {
        self.run(Operation::CorrectGrammar, prompts::correct_grammar(text))
    }

    #[instrument(skip_all)]
    fn summarize(&self, text: &str) -> Result<String> {
        self.run(
            Operation::Summarize,
            prompts::summarize(text, &self.summary_language),
        )
    }

    #[instrument(skip_all, fields(tone = %tone))]
    fn adjust_tone(&self, text: &str, tone: Tone) -> Result<String> {
        self.run(Operation::AdjustTone, prompts::adjust_tone(text, tone))
    }

    fn is_configured(&self) -> bool {
        keys::resolve_key(self.keys.as_ref(), keys::OPENROUTER).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyMap, MemoryKeyStore};
    use crate::transform::ChatMessage;
    use parking_lot::Mutex;

    /// Records every call and answers with a canned reply.
    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<(Vec<ChatMessage>, String)>>,
        fail_with: Option<u16>,
    }

    impl ChatProvider for RecordingProvider {
        fn provider_id(&self) -> &str {
            "recording"
        }

        fn complete(&self, messages: &[ChatMessage], api_key: &str) -> anyhow::Result<String> {
            self.calls
                .lock()
                .push((messages.to_vec(), api_key.to_string()));
            match self.fail_with {
                Some(status) => Err(ServiceFailure {
                    status: Some(status),
                    message: "upstream refused".into(),
                }
                .into()),
                None => Ok("transformed".into()),
            }
        }
    }

    fn service_with(keys: KeyMap, provider: Arc<RecordingProvider>) -> TransformService {
        TransformService::new(provider, Arc::new(MemoryKeyStore::with_keys(keys)), "fa")
    }

    fn with_key() -> KeyMap {
        [(keys::OPENROUTER.to_string(), "sk-test".to_string())]
            .into_iter()
            .collect()
    }

    #[test]
    fn missing_key_returns_instructions_without_calling_the_backend() {
        // Only meaningful when the environment does not supply a key either
        if std::env::var(keys::env_var_name(keys::OPENROUTER)).is_ok() {
            return;
        }
        let provider = Arc::new(RecordingProvider::default());
        let service = service_with(KeyMap::new(), provider.clone());

        assert_eq!(
            service
                .translate("hello", Language::Persian, Tone::Formal)
                .unwrap(),
            "Translation requires an API key. Please add your OpenRouter API key in settings."
        );
        assert_eq!(
            service.correct_grammar("hello").unwrap(),
            "Grammar correction requires an API key. Please add your OpenRouter API key in settings."
        );
        assert_eq!(
            service.summarize("hello").unwrap(),
            "Summarization requires an API key. Please add your OpenRouter API key in settings."
        );
        assert_eq!(
            service.adjust_tone("hello", Tone::Friendly).unwrap(),
            "Tone adjustment requires an API key. Please add your OpenRouter API key in settings."
        );
        assert!(provider.calls.lock().is_empty());
        assert!(!service.is_configured());
    }

    #[test]
    fn stored_key_makes_the_service_configured() {
        let service = service_with(with_key(), Arc::new(RecordingProvider::default()));
        assert!(service.is_configured());
    }

    #[test]
    fn configured_key_is_passed_to_the_provider() {
        let provider = Arc::new(RecordingProvider::default());
        let service = service_with(with_key(), provider.clone());

        assert_eq!(service.summarize("article").unwrap(), "transformed");
        let calls = provider.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "sk-test");
        assert!(calls[0].0[1].content.contains("in Persian"));
    }

    #[test]
    fn backend_failure_becomes_service_error() {
        let provider = Arc::new(RecordingProvider {
            fail_with: Some(401),
            ..Default::default()
        });
        let service = service_with(with_key(), provider);

        match service.correct_grammar("text") {
            Err(GrammaryError::Service { message, status }) => {
                assert_eq!(message, "upstream refused");
                assert_eq!(status, Some(401));
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }
}
