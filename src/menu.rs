//! The floating menu of one surface.
//!
//! [`MenuController`] is the only writer of the surface's [`MenuState`]. A new
//! activation replaces the previous menu (there is never more than one), and
//! every transition goes through a method here: show, reposition, click,
//! submenu choice, settle, dismiss.

use std::time::Instant;

use crate::config::MenuConfig;
use crate::context::{ActionKind, ActionSet, Classification, Language, MenuAction, Tone};
use crate::dispatcher::{ActionDispatcher, ActionRequest, DispatchTicket, Settlement};
use crate::geometry::{Size, Viewport};
use crate::positioner::{place_menu, Appearance, MenuTransition, Placement};
use crate::selection::Selection;

/// View-model of the visible menu.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuState {
    pub selection: Selection,
    pub placement: Placement,
    pub actions: ActionSet,
    pub tone_submenu_visible: bool,
    pub language_picker_visible: bool,
    pub busy_action: Option<ActionKind>,
}

impl MenuState {
    /// Controls are disabled (not just dimmed) while an action is in flight.
    pub fn is_enabled(&self, kind: ActionKind) -> bool {
        self.busy_action.is_none() && self.actions.contains_kind(kind)
    }

    /// Loading affordance goes on the clicked control only.
    pub fn is_loading(&self, kind: ActionKind) -> bool {
        self.busy_action == Some(kind)
    }
}

/// What a click or submenu choice led to.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuCommand {
    /// Nothing happened (busy, no menu, action not offered).
    Ignored,
    /// A submenu was opened or closed.
    SubmenuToggled,
    /// Start this request with this ticket.
    Dispatch(ActionRequest, DispatchTicket),
}

#[derive(Debug)]
pub struct MenuController {
    state: Option<MenuState>,
    dispatcher: ActionDispatcher,
    transition: MenuTransition,
    edge_margin: f64,
}

impl MenuController {
    pub fn new(config: &MenuConfig) -> Self {
        Self {
            state: None,
            dispatcher: ActionDispatcher::new(),
            transition: MenuTransition::new(config.hide_animation()),
            edge_margin: config.edge_margin,
        }
    }

    pub fn state(&self) -> Option<&MenuState> {
        self.state.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    pub fn transition(&self) -> &MenuTransition {
        &self.transition
    }

    pub fn appearance(&self, now: Instant) -> Appearance {
        self.transition.appearance(now)
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    /// Replace whatever menu is open with one for `selection`.
    pub fn show(
        &mut self,
        selection: Selection,
        classification: Classification,
        viewport: Viewport,
        menu_size: Size,
    ) {
        // The previous menu's in-flight action must not land anywhere
        self.dispatcher.cancel();
        self.dispatcher = ActionDispatcher::new();

        let placement = place_menu(selection.anchor_rect, menu_size, viewport, self.edge_margin);
        self.state = Some(MenuState {
            selection,
            placement,
            actions: classification.actions,
            tone_submenu_visible: false,
            language_picker_visible: false,
            busy_action: None,
        });
        self.transition.show();
    }

    /// The renderer laid the menu out; start the reveal animation.
    pub fn layout_done(&mut self, now: Instant) {
        self.transition.layout_done(now);
    }

    /// Same selection, new geometry (scroll settled or resize).
    pub fn reposition(&mut self, selection: Selection, viewport: Viewport, menu_size: Size) {
        let margin = self.edge_margin;
        if let Some(state) = self.state.as_mut() {
            state.placement = place_menu(selection.anchor_rect, menu_size, viewport, margin);
            state.selection = selection;
            self.transition.show();
        }
    }

    /// Hide while the surface scrolls; the state stays for the reposition.
    pub fn suspend(&mut self, now: Instant) {
        self.transition.hide(now);
    }

    /// Close the menu. Any in-flight action loses its UI follow-through.
    pub fn dismiss(&mut self, now: Instant) {
        if self.state.take().is_some() {
            self.dispatcher.cancel();
            self.transition.hide(now);
        }
    }

    /// Pointer pressed somewhere. Outside the menu with nothing selected closes it.
    pub fn pointer_down(&mut self, inside_menu: bool, has_selection: bool, now: Instant) {
        if !inside_menu && !has_selection {
            self.dismiss(now);
        }
    }

    /// Advance hide timers. True when the element was just removed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.transition.tick(now)
    }

    /// A top-level menu entry was clicked.
    pub fn click(&mut self, kind: ActionKind) -> MenuCommand {
        let Some(state) = self.state.as_mut() else {
            return MenuCommand::Ignored;
        };
        if self.dispatcher.is_busy() {
            return MenuCommand::Ignored;
        }
        let Some(action) = state.actions.get(kind).copied() else {
            return MenuCommand::Ignored;
        };

        if action.opens_submenu() {
            match action {
                MenuAction::AdjustTone => {
                    state.tone_submenu_visible = !state.tone_submenu_visible;
                    state.language_picker_visible = false;
                }
                _ => {
                    state.language_picker_visible = !state.language_picker_visible;
                    state.tone_submenu_visible = false;
                }
            }
            return MenuCommand::SubmenuToggled;
        }

        match ActionRequest::for_action(&action, &state.selection.text) {
            Some(request) => self.begin(request),
            None => MenuCommand::Ignored,
        }
    }

    /// A tone was chosen: close the submenu, then issue exactly one AdjustTone.
    pub fn choose_tone(&mut self, tone: Tone) -> MenuCommand {
        let Some(state) = self.state.as_mut() else {
            return MenuCommand::Ignored;
        };
        if self.dispatcher.is_busy() || !state.tone_submenu_visible {
            return MenuCommand::Ignored;
        }
        state.tone_submenu_visible = false;
        let request = ActionRequest::adjust_tone(state.selection.text.clone(), tone);
        self.begin(request)
    }

    /// A target language was chosen from the picker.
    pub fn choose_language(&mut self, language: Language) -> MenuCommand {
        let Some(state) = self.state.as_mut() else {
            return MenuCommand::Ignored;
        };
        if self.dispatcher.is_busy() || !state.language_picker_visible {
            return MenuCommand::Ignored;
        }
        state.language_picker_visible = false;
        let request = ActionRequest::translate(state.selection.text.clone(), language);
        self.begin(request)
    }

    fn begin(&mut self, request: ActionRequest) -> MenuCommand {
        match self.dispatcher.begin(&request) {
            Some(ticket) => {
                if let Some(state) = self.state.as_mut() {
                    state.busy_action = Some(request.kind);
                }
                MenuCommand::Dispatch(request, ticket)
            }
            None => MenuCommand::Ignored,
        }
    }

    /// A dispatch finished. Returns the settlement with the selection it was
    /// for when it belongs to this menu; the menu is dismissed either way.
    /// Stale settlements return `None` and change nothing.
    pub fn settle(&mut self, settlement: Settlement, now: Instant) -> Option<(Settlement, Selection)> {
        if !self
            .dispatcher
            .settle(&settlement.ticket, settlement.result.is_success())
        {
            return None;
        }
        let state = self.state.take()?;
        self.transition.hide(now);
        Some((settlement, state.selection))
    }
}

#[cfg(test)]
#[path = "menu_tests.rs"]
mod tests;
