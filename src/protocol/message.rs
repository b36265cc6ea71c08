use serde::{Deserialize, Serialize};

use crate::context::Script;
use crate::keys::KeyMap;
use crate::selection::Selection;

/// Captured selection pushed into a popup once it is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPayload {
    pub text: String,
    pub editable: bool,
    pub script: Script,
}

impl From<&Selection> for SelectionPayload {
    fn from(selection: &Selection) -> Self {
        Self {
            text: selection.text.clone(),
            editable: selection.editable,
            script: selection.script,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateParams {
    /// Language code ("en", "fa", ...). Required.
    pub target_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToneParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

/// Every message on every channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel")]
pub enum Message {
    // ============================================================
    // Window chrome (surface -> host)
    // ============================================================
    #[serde(rename = "window:minimize")]
    WindowMinimize,

    #[serde(rename = "window:maximize")]
    WindowMaximize,

    #[serde(rename = "window:close")]
    WindowClose,

    // ============================================================
    // Selection handoff (host -> popup)
    // ============================================================
    #[serde(rename = "selection:pushed")]
    SelectionPushed(SelectionPayload),

    // ============================================================
    // Transforms (surface -> backend, request/response)
    // ============================================================
    #[serde(rename = "transform:translate")]
    Translate {
        text: String,
        params: TranslateParams,
    },

    #[serde(rename = "transform:correctGrammar")]
    CorrectGrammar { text: String },

    #[serde(rename = "transform:summarize")]
    Summarize { text: String },

    #[serde(rename = "transform:adjustTone")]
    AdjustTone {
        text: String,
        #[serde(default)]
        params: ToneParams,
    },

    // ============================================================
    // Credentials (surface -> backend)
    // ============================================================
    #[serde(rename = "keys:save")]
    SaveKeys { keys: KeyMap },

    #[serde(rename = "keys:get")]
    GetKeys,
}

impl Message {
    pub fn channel(&self) -> &'static str {
        match self {
            Message::WindowMinimize => "window:minimize",
            Message::WindowMaximize => "window:maximize",
            Message::WindowClose => "window:close",
            Message::SelectionPushed(_) => "selection:pushed",
            Message::Translate { .. } => "transform:translate",
            Message::CorrectGrammar { .. } => "transform:correctGrammar",
            Message::Summarize { .. } => "transform:summarize",
            Message::AdjustTone { .. } => "transform:adjustTone",
            Message::SaveKeys { .. } => "keys:save",
            Message::GetKeys => "keys:get",
        }
    }

    /// Requests answered by the backend.
    pub fn is_backend_request(&self) -> bool {
        self.channel().starts_with("transform:") || self.channel().starts_with("keys:")
    }
}

/// Backend reply to a request message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    Text { text: String },
    Ack { ok: bool },
    Keys { keys: KeyMap },
    Error { message: String },
}
