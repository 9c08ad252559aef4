use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Down,
    Up,
    PageDown,
    PageUp,
    Top,
    Bottom,
    Expand,
    Collapse,
    Activate,
    Reload,
    ToggleFocus,
    NextDetailTab,
    PrevDetailTab,
    CloseDetailTab,
    SwitchView(u8),
    ToggleHelp,
    StartCommand,
    Dismiss,
    SubmitInput,
    CancelInput,
    Backspace,
    InputChar(char),
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Command => map_input_mode_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char(c @ '1'..='9') if key.modifiers.is_empty() => {
            map_view_number(c).map(Action::SwitchView)
        }
        KeyCode::Char(c @ '1'..='9') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            map_view_number(c).map(Action::SwitchView)
        }
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Char('l') if key.modifiers.is_empty() => Some(Action::Expand),
        KeyCode::Right => Some(Action::Expand),
        KeyCode::Char('h') if key.modifiers.is_empty() => Some(Action::Collapse),
        KeyCode::Left => Some(Action::Collapse),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::Char('R') | KeyCode::F(5) => Some(Action::Reload),
        KeyCode::Char(']') => Some(Action::NextDetailTab),
        KeyCode::Char('[') => Some(Action::PrevDetailTab),
        KeyCode::Char('x') => Some(Action::CloseDetailTab),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char(':') => Some(Action::StartCommand),
        KeyCode::Char(';') if key.modifiers.contains(KeyModifiers::SHIFT) => {
            Some(Action::StartCommand)
        }
        KeyCode::Tab => Some(Action::ToggleFocus),
        KeyCode::Enter => Some(Action::Activate),
        KeyCode::Char('m') | KeyCode::Char('j')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(Action::Activate)
        }
        KeyCode::Esc => Some(Action::Dismiss),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::PageDown)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageUp),
        _ => None,
    }
}

fn map_view_number(c: char) -> Option<u8> {
    c.to_digit(10).and_then(|digit| u8::try_from(digit).ok())
}

fn map_input_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Char('m') | KeyCode::Char('j')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(Action::SubmitInput)
        }
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, map_key};
    use crate::app::InputMode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn command_mode_maps_ctrl_m_and_ctrl_j_to_submit() {
        let ctrl_m = KeyEvent::new(KeyCode::Char('m'), KeyModifiers::CONTROL);
        let ctrl_j = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL);
        assert_eq!(
            map_key(InputMode::Command, ctrl_m),
            Some(Action::SubmitInput)
        );
        assert_eq!(
            map_key(InputMode::Command, ctrl_j),
            Some(Action::SubmitInput)
        );
    }

    #[test]
    fn normal_mode_maps_ctrl_m_and_ctrl_j_to_activate() {
        let ctrl_m = KeyEvent::new(KeyCode::Char('m'), KeyModifiers::CONTROL);
        let ctrl_j = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Normal, ctrl_m), Some(Action::Activate));
        assert_eq!(map_key(InputMode::Normal, ctrl_j), Some(Action::Activate));
    }

    #[test]
    fn normal_mode_maps_tree_navigation() {
        let cases = [
            (KeyCode::Char('j'), Action::Down),
            (KeyCode::Char('k'), Action::Up),
            (KeyCode::Char('l'), Action::Expand),
            (KeyCode::Right, Action::Expand),
            (KeyCode::Char('h'), Action::Collapse),
            (KeyCode::Left, Action::Collapse),
            (KeyCode::Enter, Action::Activate),
        ];
        for (code, expected) in cases {
            let key = KeyEvent::new(code, KeyModifiers::NONE);
            assert_eq!(map_key(InputMode::Normal, key), Some(expected));
        }
    }

    #[test]
    fn normal_mode_maps_uppercase_r_to_reload() {
        let key = KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Reload));
    }

    #[test]
    fn normal_mode_maps_brackets_to_detail_tabs() {
        let next = KeyEvent::new(KeyCode::Char(']'), KeyModifiers::NONE);
        let prev = KeyEvent::new(KeyCode::Char('['), KeyModifiers::NONE);
        let close = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, next), Some(Action::NextDetailTab));
        assert_eq!(map_key(InputMode::Normal, prev), Some(Action::PrevDetailTab));
        assert_eq!(map_key(InputMode::Normal, close), Some(Action::CloseDetailTab));
    }

    #[test]
    fn normal_mode_maps_plain_digit_to_view_switch() {
        let key = KeyEvent::new(KeyCode::Char('6'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::SwitchView(6)));
        let zero = KeyEvent::new(KeyCode::Char('0'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, zero), None);
    }

    #[test]
    fn normal_mode_maps_ctrl_digit_to_view_switch() {
        let key = KeyEvent::new(KeyCode::Char('3'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::SwitchView(3)));
    }

    #[test]
    fn normal_mode_maps_shift_semicolon_to_command() {
        let key = KeyEvent::new(KeyCode::Char(';'), KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::StartCommand));
    }

    #[test]
    fn command_mode_passes_text_through() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(
            map_key(InputMode::Command, key),
            Some(Action::InputChar('q'))
        );
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Command, esc), Some(Action::CancelInput));
    }
}
