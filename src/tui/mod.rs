pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::{QuizApp, QuizOutcome};
pub use theme::{resolve_theme, Theme, ThemeColors};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler};
use std::time::Duration;

/// Run the questionnaire until the user submits, saves or aborts.
pub async fn run_quiz(mut app: QuizApp) -> anyhow::Result<QuizOutcome> {
    // Buffer stderr while TUI is active to prevent output corrupting the display
    crate::stderr_buffer::activate();

    // Init terminal (sets up panic hooks automatically)
    let mut terminal = ratatui::init();
    let mut events = EventHandler::new(Duration::from_millis(250));

    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::draw(frame, &app)) {
            break Err(e.into());
        }

        match events.next().await {
            Event::Key(key) => handle_key_event(&mut app, key),
            Event::Tick => app.update_flash(),
            Event::Resize => {}
            // Input is gone: save what was entered
            Event::InputClosed => app.save_and_quit(),
        }

        if app.should_quit {
            break Ok(());
        }
    };

    ratatui::restore();

    // Flush buffered stderr messages now that the terminal is restored
    for msg in crate::stderr_buffer::drain() {
        eprintln!("{}", msg);
    }

    result.map(|()| app.into_outcome())
}

fn handle_key_event(app: &mut QuizApp, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.abort();
        return;
    }

    match app.input_mode {
        app::InputMode::Answering => match key.code {
            KeyCode::Char('q') => app.save_and_quit(),

            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let Some(value) = c.to_digit(10) {
                    app.select_value(value as i32);
                }
            }

            KeyCode::Char('j') | KeyCode::Down => app.cursor_down(),
            KeyCode::Char('k') | KeyCode::Up => app.cursor_up(),
            KeyCode::Enter | KeyCode::Char(' ') => app.choose_highlighted(),

            KeyCode::Char('n') | KeyCode::Right | KeyCode::Tab => app.next_question(),
            KeyCode::Char('p') | KeyCode::Left | KeyCode::BackTab => app.previous_question(),

            KeyCode::Char('s') => app.request_submit(),
            KeyCode::Char('?') => app.show_help(),
            _ => {}
        },
        app::InputMode::ConfirmSubmit => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm_submit(),
            KeyCode::Char('n') | KeyCode::Esc => app.cancel_submit(),
            _ => {}
        },
        app::InputMode::Help => {
            // Any key exits help
            app.dismiss_help();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{load_catalog, AnswerScale, AnswerSet};

    fn press(app: &mut QuizApp, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_keys_drive_full_questionnaire() {
        let catalog = load_catalog(None).unwrap();
        let mut app = QuizApp::new(
            "test".to_string(),
            &catalog,
            AnswerScale::default(),
            AnswerSet::new(),
            ThemeColors::dark(),
        );

        for _ in 0..catalog.len() {
            press(&mut app, KeyCode::Char('3'));
        }
        assert!(app.is_complete());

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.input_mode, app::InputMode::ConfirmSubmit);
        press(&mut app, KeyCode::Char('y'));
        assert!(app.should_quit);

        match app.into_outcome() {
            QuizOutcome::Submitted(answers) => {
                assert_eq!(answers.len(), catalog.len());
                assert!(answers.iter().all(|(_, v)| v == 3));
            }
            other => panic!("expected submission, got {:?}", other),
        }
    }

    #[test]
    fn test_ctrl_c_aborts_from_any_mode() {
        let catalog = load_catalog(None).unwrap();
        let mut app = QuizApp::new(
            "test".to_string(),
            &catalog,
            AnswerScale::default(),
            AnswerSet::new(),
            ThemeColors::dark(),
        );
        press(&mut app, KeyCode::Char('?'));
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(app.into_outcome(), QuizOutcome::Aborted);
    }

    #[test]
    fn test_digit_outside_scale_ignored() {
        let catalog = load_catalog(None).unwrap();
        let mut app = QuizApp::new(
            "test".to_string(),
            &catalog,
            AnswerScale::default(),
            AnswerSet::new(),
            ThemeColors::dark(),
        );
        press(&mut app, KeyCode::Char('9'));
        press(&mut app, KeyCode::Char('0'));
        assert_eq!(app.answered_count(), 0);
    }
}
