// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Query, ViewMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Load,
    Search,
}

impl InputField {
    pub const ALL: [Self; 2] = [Self::Load, Self::Search];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Load => "% load",
            Self::Search => "pump search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub query: Query,
    pub focus: InputField,
    pub view_mode: ViewMode,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            query: Query::default(),
            focus: InputField::Load,
            view_mode: ViewMode::Wrapped,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    InsertChar(char),
    Backspace,
    ClearField,
    ClearQuery,
    FocusNext,
    FocusPrev,
    SetLoad(String),
    SetSearch(String),
    ToggleViewMode,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    QueryChanged(Query),
    FocusChanged(InputField),
    ViewModeChanged(ViewMode),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::InsertChar(ch) => {
                self.focused_text_mut().push(ch);
                self.query_changed()
            }
            AppCommand::Backspace => {
                if self.focused_text_mut().pop().is_none() {
                    return Vec::new();
                }
                self.query_changed()
            }
            AppCommand::ClearField => {
                let text = self.focused_text_mut();
                if text.is_empty() {
                    return Vec::new();
                }
                text.clear();
                self.query_changed()
            }
            AppCommand::ClearQuery => {
                if self.query == Query::default() {
                    return Vec::new();
                }
                self.query = Query::default();
                self.query_changed()
            }
            AppCommand::FocusNext => self.rotate_focus(1),
            AppCommand::FocusPrev => self.rotate_focus(-1),
            AppCommand::SetLoad(value) => {
                self.query.load = value;
                self.query_changed()
            }
            AppCommand::SetSearch(value) => {
                self.query.search = value;
                self.query_changed()
            }
            AppCommand::ToggleViewMode => {
                self.view_mode = self.view_mode.toggle();
                let label = format!("view {}", self.view_mode.as_str());
                vec![
                    AppEvent::ViewModeChanged(self.view_mode),
                    self.set_status(&label),
                ]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn focused_text(&self) -> &str {
        match self.focus {
            InputField::Load => &self.query.load,
            InputField::Search => &self.query.search,
        }
    }

    fn focused_text_mut(&mut self) -> &mut String {
        match self.focus {
            InputField::Load => &mut self.query.load,
            InputField::Search => &mut self.query.search,
        }
    }

    fn query_changed(&self) -> Vec<AppEvent> {
        vec![AppEvent::QueryChanged(self.query.clone())]
    }

    fn rotate_focus(&mut self, delta: isize) -> Vec<AppEvent> {
        let fields = InputField::ALL;
        let current = fields
            .iter()
            .position(|field| *field == self.focus)
            .unwrap_or(0) as isize;
        let len = fields.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.focus = fields[next];
        vec![AppEvent::FocusChanged(self.focus)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, InputField};
    use crate::{Query, ViewMode};

    #[test]
    fn typing_edits_focused_field() {
        let mut state = AppState::default();

        state.dispatch(AppCommand::InsertChar('7'));
        let events = state.dispatch(AppCommand::InsertChar('5'));
        assert_eq!(state.query.load, "75");
        assert_eq!(events, vec![AppEvent::QueryChanged(Query::new("75", ""))]);

        state.dispatch(AppCommand::FocusNext);
        state.dispatch(AppCommand::InsertChar('p'));
        assert_eq!(state.query, Query::new("75", "p"));
        assert_eq!(state.focused_text(), "p");
    }

    #[test]
    fn focus_rotation_wraps() {
        let mut state = AppState {
            focus: InputField::Search,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::FocusNext);
        assert_eq!(state.focus, InputField::Load);
        assert_eq!(events, vec![AppEvent::FocusChanged(InputField::Load)]);

        state.dispatch(AppCommand::FocusPrev);
        assert_eq!(state.focus, InputField::Search);
    }

    #[test]
    fn backspace_on_empty_field_is_a_no_op() {
        let mut state = AppState::default();
        assert!(state.dispatch(AppCommand::Backspace).is_empty());
        assert!(state.dispatch(AppCommand::ClearField).is_empty());
        assert!(state.dispatch(AppCommand::ClearQuery).is_empty());
    }

    #[test]
    fn clear_query_resets_both_fields() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SetLoad("40".to_owned()));
        state.dispatch(AppCommand::SetSearch("pump".to_owned()));

        let events = state.dispatch(AppCommand::ClearQuery);
        assert_eq!(state.query, Query::default());
        assert_eq!(events, vec![AppEvent::QueryChanged(Query::default())]);
    }

    #[test]
    fn toggle_view_mode_updates_status() {
        let mut state = AppState::default();

        let events = state.dispatch(AppCommand::ToggleViewMode);
        assert_eq!(state.view_mode, ViewMode::Scrollable);
        assert_eq!(
            events,
            vec![
                AppEvent::ViewModeChanged(ViewMode::Scrollable),
                AppEvent::StatusUpdated("view scrollable".to_owned()),
            ],
        );
    }

    #[test]
    fn status_set_and_clear() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SetStatus("loaded".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("loaded"));

        let events = state.dispatch(AppCommand::ClearStatus);
        assert_eq!(state.status_line, None);
        assert_eq!(events, vec![AppEvent::StatusCleared]);
    }
}
