//! Text transforms backed by an external text-generation service.
//!
//! ```text
//! src/transform/
//! ├── mod.rs      - TextTransform trait and exports
//! ├── prompts.rs  - system/user prompt construction per operation
//! ├── provider.rs - ChatProvider trait and the OpenRouter implementation
//! └── service.rs  - TransformService: key gating + the four operations
//! ```
//!
//! The four operations are what the surfaces call. A missing API key is not
//! an error at this level: each operation returns a fixed instructive string
//! as its successful result and never touches the network.

pub mod prompts;
pub mod provider;
pub mod service;

pub use provider::{ChatMessage, ChatProvider, OpenRouterProvider};
pub use service::{needs_configuration_message, TransformService};

use crate::context::{Language, Tone};
use crate::error::Result;

/// The text-transform capability.
///
/// Implementations must be callable from a background thread.
pub trait TextTransform: Send + Sync {
    fn translate(&self, text: &str, target: Language, tone: Tone) -> Result<String>;

    fn correct_grammar(&self, text: &str) -> Result<String>;

    fn summarize(&self, text: &str) -> Result<String>;

    fn adjust_tone(&self, text: &str, tone: Tone) -> Result<String>;

    /// False while every operation would only return its "needs
    /// configuration" text.
    fn is_configured(&self) -> bool {
        true
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::error::GrammaryError;
    use parking_lot::Mutex;

    /// Answers `"<op>:<text>"`, fails every call when `failing` is set, and
    /// answers with setup instructions when `unconfigured` is set.
    #[derive(Default)]
    pub struct EchoTransform {
        pub failing: bool,
        pub unconfigured: bool,
        pub calls: Mutex<Vec<String>>,
    }

    impl EchoTransform {
        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Default::default()
            }
        }

        pub fn unconfigured() -> Self {
            Self {
                unconfigured: true,
                ..Default::default()
            }
        }

        fn answer(&self, op: String, text: &str) -> Result<String> {
            self.calls.lock().push(op.clone());
            if self.unconfigured {
                Ok(format!("{} needs an API key", op))
            } else if self.failing {
                Err(GrammaryError::service("backend unavailable"))
            } else {
                Ok(format!("{}:{}", op, text))
            }
        }
    }

    impl TextTransform for EchoTransform {
        fn translate(&self, text: &str, target: Language, tone: Tone) -> Result<String> {
            self.answer(format!("translate-{}-{}", target.code(), tone), text)
        }

        fn correct_grammar(&self, text: &str) -> Result<String> {
            self.answer("grammar".into(), text)
        }

        fn summarize(&self, text: &str) -> Result<String> {
            self.answer("summary".into(), text)
        }

        fn adjust_tone(&self, text: &str, tone: Tone) -> Result<String> {
            self.answer(format!("tone-{}", tone), text)
        }

        fn is_configured(&self) -> bool {
            !self.unconfigured
        }
    }
}
