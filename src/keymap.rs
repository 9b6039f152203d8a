use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Cancel,
    ToggleOutput,
    Help,
    Quit,
    Up,
    Down,
    PageUp,
    PageDown,
    Yes,
    No,
    Filter,
    Refresh,
    Select,
    SelectAll,
    DeselectAll,
    PlanHighlighted,
    PlanSelected,
    ValidateHighlighted,
    ValidateSelected,
    ApplyHighlighted,
    ApplySelected,
}

pub fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Esc => Action::Cancel,
        KeyCode::Tab => Action::ToggleOutput,
        KeyCode::Up => Action::Up,
        KeyCode::Down => Action::Down,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Enter => Action::Select,
        KeyCode::Char(c) => match c {
            '?' => Action::Help,
            'q' => Action::Quit,
            'k' => Action::Up,
            'j' => Action::Down,
            'y' => Action::Yes,
            'n' => Action::No,
            '/' => Action::Filter,
            'r' => Action::Refresh,
            ' ' => Action::Select,
            's' => Action::SelectAll,
            'd' => Action::DeselectAll,
            'p' => Action::PlanHighlighted,
            'P' => Action::PlanSelected,
            'v' => Action::ValidateHighlighted,
            'V' => Action::ValidateSelected,
            'a' => Action::ApplyHighlighted,
            'A' => Action::ApplySelected,
            _ => return None,
        },
        _ => return None,
    };

    Some(action)
}

pub type HelpEntry = (&'static str, &'static str);

pub const SHORT_HELP: &[HelpEntry] = &[
    ("v", "validate"),
    ("p", "plan"),
    ("a", "apply"),
    ("k/↑", "up"),
    ("j/↓", "down"),
    ("?", "help"),
    ("q", "quit"),
];

pub const FULL_HELP: &[&[HelpEntry]] = &[
    &[("v", "validate"), ("p", "plan"), ("a", "apply")],
    &[("V", "validate: selected"), ("P", "plan: selected"), ("A", "apply: selected")],
    &[("space", "select"), ("s", "select all"), ("d", "deselect all")],
    &[("tab", "toggle output"), ("r", "refresh projects"), ("/", "filter")],
    &[("?", "help"), ("q", "quit")],
];

pub fn help_line(entries: &[HelpEntry]) -> String {
    entries
        .iter()
        .map(|(key, desc)| format!("{key} {desc}"))
        .collect::<Vec<_>>()
        .join(" • ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shifted_letters_select_batch_actions() {
        let key = KeyEvent::new(KeyCode::Char('P'), KeyModifiers::SHIFT);
        assert_eq!(action_for(&key), Some(Action::PlanSelected));
        assert_eq!(action_for(&KeyEvent::from(KeyCode::Char('p'))), Some(Action::PlanHighlighted));
    }

    #[test]
    fn test_ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(action_for(&key), Some(Action::Quit));
    }

    #[test]
    fn test_unbound_key() {
        assert_eq!(action_for(&KeyEvent::from(KeyCode::Char('z'))), None);
        assert_eq!(action_for(&KeyEvent::from(KeyCode::F(1))), None);
    }

    #[test]
    fn test_help_line() {
        assert_eq!(help_line(&[("q", "quit"), ("?", "help")]), "q quit • ? help");
    }
}
