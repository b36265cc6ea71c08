#![allow(unexpected_cfgs)]

//! Grammary - a selection-anchored text-transform assistant.
//!
//! Select text, get a small menu next to it (or, system-wide, a popup at the
//! pointer after the capture hotkey), and translate, correct, summarize or
//! re-tone it through a text-generation backend.
//!
//! The core (`selection`, `context`, `positioner`, `menu`, `dispatcher`,
//! `apply`, `surface`, `popup::lifecycle`, `popup::session`) is
//! framework-free. gpui, the OS selection APIs, the tray and the global
//! hotkey sit at the edges.

pub mod geometry;

// Selection -> classification -> menu -> dispatch -> apply
pub mod apply;
pub mod context;
pub mod dispatcher;
pub mod menu;
pub mod positioner;
pub mod selection;
pub mod surface;

// Text-generation backend and credentials
pub mod keys;
pub mod protocol;
pub mod transform;

// System-wide capture
pub mod hotkeys;
pub mod platform;
pub mod popup;
pub mod selected_text;
pub mod tray;

// Main window: scratch surface, API key, recent activity
pub mod workspace;

pub mod config;
pub mod error;
pub mod logging;
