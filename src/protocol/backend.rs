use std::sync::Arc;

use tracing::{debug, warn};

use super::message::{Message, Response};
use crate::context::{Language, Tone};
use crate::keys::KeyStore;
use crate::transform::TextTransform;

/// Answers `transform:*` and `keys:*` requests from any surface.
pub struct Backend {
    transform: Arc<dyn TextTransform>,
    keys: Arc<dyn KeyStore>,
    default_tone: Tone,
}

impl Backend {
    pub fn new(transform: Arc<dyn TextTransform>, keys: Arc<dyn KeyStore>, default_tone: Tone) -> Self {
        Self {
            transform,
            keys,
            default_tone,
        }
    }

    fn tone(&self, requested: Option<&str>) -> Tone {
        requested.and_then(Tone::parse).unwrap_or(self.default_tone)
    }

    /// `None` for messages that are not backend requests.
    pub fn handle(&self, message: &Message) -> Option<Response> {
        debug!(channel = message.channel(), "Backend request");
        let outcome = match message {
            Message::Translate { text, params } => {
                let target =
                    Language::from_code(&params.target_language).unwrap_or(Language::English);
                self.transform
                    .translate(text, target, self.tone(params.tone.as_deref()))
            }
            Message::CorrectGrammar { text } => self.transform.correct_grammar(text),
            Message::Summarize { text } => self.transform.summarize(text),
            Message::AdjustTone { text, params } => self
                .transform
                .adjust_tone(text, self.tone(params.tone.as_deref())),
            Message::SaveKeys { keys } => {
                debug!(names = ?keys.keys().collect::<Vec<_>>(), "Saving keys");
                return Some(match self.keys.save_keys(keys) {
                    Ok(ok) => Response::Ack { ok },
                    Err(e) => {
                        warn!(error = %format!("{:#}", e), "Saving keys failed");
                        Response::Ack { ok: false }
                    }
                });
            }
            Message::GetKeys => {
                return Some(Response::Keys {
                    keys: self.keys.get_keys(),
                })
            }
            Message::WindowMinimize
            | Message::WindowMaximize
            | Message::WindowClose
            | Message::SelectionPushed(_) => return None,
        };

        Some(match outcome {
            Ok(text) => Response::Text { text },
            Err(e) => Response::Error {
                message: e.user_message(),
            },
        })
    }
}
