use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    No,
}

/// Yes/no prompt shown before an apply. Arrow keys move between the two
/// answers and `Enter` reports the highlighted one.
#[derive(Debug)]
pub struct ConfirmPrompt {
    question: String,
    choice: Decision,
}

impl ConfirmPrompt {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            choice: Decision::No,
        }
    }

    pub fn reset(&mut self) {
        self.choice = Decision::No;
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn choice(&self) -> Decision {
        self.choice
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> Option<Decision> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.choice = Decision::Yes,
            KeyCode::Right | KeyCode::Char('l') => self.choice = Decision::No,
            KeyCode::Tab | KeyCode::BackTab => {
                self.choice = match self.choice {
                    Decision::Yes => Decision::No,
                    Decision::No => Decision::Yes,
                };
            }
            KeyCode::Enter => return Some(self.choice),
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no() {
        let mut prompt = ConfirmPrompt::new("Are you sure?");
        assert_eq!(prompt.handle_key(&KeyEvent::from(KeyCode::Enter)), Some(Decision::No));
    }

    #[test]
    fn test_moving_to_yes() {
        let mut prompt = ConfirmPrompt::new("Are you sure?");
        assert_eq!(prompt.handle_key(&KeyEvent::from(KeyCode::Left)), None);
        assert_eq!(prompt.choice(), Decision::Yes);
        assert_eq!(prompt.handle_key(&KeyEvent::from(KeyCode::Enter)), Some(Decision::Yes));

        prompt.reset();
        assert_eq!(prompt.choice(), Decision::No);
    }
}
