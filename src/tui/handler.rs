use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::PanelView;

#[derive(Debug, Clone)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    // Selection view
    ToggleSelect,
    SelectAll,
    ClearSelection,
    Generate,
    // Streaming view
    CancelGeneration,
    // Results view
    Copy,
    Save,
    SaveAll,
    Regenerate,
    GenerateMore,
    Back,
    StartOver,
    // General
    ShowHelp,
    HideHelp,
}

pub fn handle_key_event(key: KeyEvent, view: PanelView, show_help: bool) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    // Global bindings
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => return Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Some(AppAction::Quit),
        (KeyCode::Char('?'), _) => return Some(AppAction::ShowHelp),
        _ => {}
    }

    match view {
        PanelView::Selection => match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(AppAction::MoveDown),
            KeyCode::Char('k') | KeyCode::Up => Some(AppAction::MoveUp),
            KeyCode::Char(' ') => Some(AppAction::ToggleSelect),
            KeyCode::Char('a') => Some(AppAction::SelectAll),
            KeyCode::Char('x') => Some(AppAction::ClearSelection),
            KeyCode::Enter => Some(AppAction::Generate),
            KeyCode::Esc => Some(AppAction::Back),
            _ => None,
        },

        PanelView::Streaming => match key.code {
            KeyCode::Esc | KeyCode::Char('C') => Some(AppAction::CancelGeneration),
            _ => None,
        },

        PanelView::Results => match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(AppAction::MoveDown),
            KeyCode::Char('k') | KeyCode::Up => Some(AppAction::MoveUp),
            KeyCode::Char('c') => Some(AppAction::Copy),
            KeyCode::Char('s') => Some(AppAction::Save),
            KeyCode::Char('S') => Some(AppAction::SaveAll),
            KeyCode::Char('g') => Some(AppAction::Regenerate),
            KeyCode::Char('n') => Some(AppAction::GenerateMore),
            KeyCode::Char('R') => Some(AppAction::StartOver),
            _ => None,
        },

        PanelView::QuotaExhausted | PanelView::NoApiKey => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn any_key_closes_help() {
        let action = handle_key_event(key(KeyCode::Char('j')), PanelView::Results, true);
        assert!(matches!(action, Some(AppAction::HideHelp)));
    }

    #[test]
    fn space_toggles_in_selection_view() {
        let action = handle_key_event(key(KeyCode::Char(' ')), PanelView::Selection, false);
        assert!(matches!(action, Some(AppAction::ToggleSelect)));
    }

    #[test]
    fn escape_cancels_while_streaming() {
        let action = handle_key_event(key(KeyCode::Esc), PanelView::Streaming, false);
        assert!(matches!(action, Some(AppAction::CancelGeneration)));
    }

    #[test]
    fn streaming_view_has_no_navigation_bindings() {
        for code in [KeyCode::Char('j'), KeyCode::Char('k'), KeyCode::Down, KeyCode::Up] {
            assert!(handle_key_event(key(code), PanelView::Streaming, false).is_none());
        }
    }

    #[test]
    fn limit_views_only_accept_global_keys() {
        assert!(handle_key_event(key(KeyCode::Enter), PanelView::QuotaExhausted, false).is_none());
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('q')), PanelView::QuotaExhausted, false),
            Some(AppAction::Quit)
        ));
    }
}
