use crate::quiz::{AnswerScale, AnswerSet, Question, QuestionCatalog};
use crate::tui::theme::ThemeColors;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Answering,
    Help,
    ConfirmSubmit,
}

/// How the questionnaire ended
#[derive(Debug, Clone, PartialEq)]
pub enum QuizOutcome {
    /// Keep the answers, don't submit yet
    Saved(AnswerSet),
    /// Keep the answers and mark them final
    Submitted(AnswerSet),
    /// Throw away everything entered in this run
    Aborted,
}

pub struct QuizApp {
    pub title: String,
    pub questions: Vec<Question>,
    pub scale: AnswerScale,
    pub answers: AnswerSet,
    /// Index into `questions`
    pub current: usize,
    /// Highlighted choice for the current question
    pub cursor: i32,
    pub input_mode: InputMode,
    pub flash_message: Option<(String, Instant)>,
    pub should_quit: bool,
    pub outcome: Option<QuizOutcome>,
    pub theme: ThemeColors,
}

impl QuizApp {
    /// Start at the first unanswered question, with earlier answers filled in
    pub fn new(
        title: String,
        catalog: &QuestionCatalog,
        scale: AnswerScale,
        existing: AnswerSet,
        theme: ThemeColors,
    ) -> Self {
        let questions: Vec<Question> = catalog.iter().cloned().collect();
        let current = questions
            .iter()
            .position(|q| !existing.contains(&q.id))
            .unwrap_or(0);

        let mut app = Self {
            title,
            questions,
            scale,
            answers: existing,
            current,
            cursor: scale.min,
            input_mode: InputMode::Answering,
            flash_message: None,
            should_quit: false,
            outcome: None,
            theme,
        };
        app.sync_cursor();
        app
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn current_answer(&self) -> Option<i32> {
        self.current_question()
            .and_then(|q| self.answers.get(&q.id))
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Answered questions that belong to this questionnaire
    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.answers.contains(&q.id))
            .count()
    }

    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.answered_count() as f64 / self.total() as f64
    }

    pub fn is_complete(&self) -> bool {
        self.answered_count() == self.total()
    }

    /// Scale values reachable with a single digit key, as an inclusive range
    pub fn digit_range(&self) -> Option<(i32, i32)> {
        let low = self.scale.min.max(0);
        let high = self.scale.max.min(9);
        (low <= high).then_some((low, high))
    }

    /// Whether some answers can only be picked with the cursor
    pub fn needs_cursor_keys(&self) -> bool {
        self.scale.min < 0 || self.scale.max > 9
    }

    fn sync_cursor(&mut self) {
        self.cursor = self.current_answer().unwrap_or(self.scale.min);
    }

    pub fn next_question(&mut self) {
        if self.questions.is_empty() {
            return;
        }
        self.current = if self.current + 1 >= self.questions.len() {
            0
        } else {
            self.current + 1
        };
        self.sync_cursor();
    }

    pub fn previous_question(&mut self) {
        if self.questions.is_empty() {
            return;
        }
        self.current = if self.current == 0 {
            self.questions.len() - 1
        } else {
            self.current - 1
        };
        self.sync_cursor();
    }

    pub fn cursor_down(&mut self) {
        self.cursor = if self.cursor >= self.scale.max {
            self.scale.min
        } else {
            self.cursor + 1
        };
    }

    pub fn cursor_up(&mut self) {
        self.cursor = if self.cursor <= self.scale.min {
            self.scale.max
        } else {
            self.cursor - 1
        };
    }

    /// Record `value` for the current question and move on to the next
    /// unanswered one. Values outside the scale are ignored.
    pub fn select_value(&mut self, value: i32) {
        if !self.scale.contains(value) {
            return;
        }
        let Some(question) = self.current_question() else {
            return;
        };
        let id = question.id.clone();
        self.answers.insert(id, value);
        self.advance_to_unanswered();
    }

    pub fn choose_highlighted(&mut self) {
        self.select_value(self.cursor);
    }

    fn advance_to_unanswered(&mut self) {
        let len = self.questions.len();
        let next = (1..=len)
            .map(|step| (self.current + step) % len)
            .find(|&i| !self.answers.contains(&self.questions[i].id));

        match next {
            Some(i) => self.current = i,
            None => {
                if self.current + 1 < len {
                    self.current += 1;
                }
                self.show_flash("All questions answered. Press s to submit.".to_string());
            }
        }
        self.sync_cursor();
    }

    pub fn request_submit(&mut self) {
        if self.is_complete() {
            self.input_mode = InputMode::ConfirmSubmit;
        } else {
            let missing = self.total() - self.answered_count();
            self.show_flash(format!("Error: {} questions still unanswered", missing));
        }
    }

    pub fn confirm_submit(&mut self) {
        self.input_mode = InputMode::Answering;
        self.outcome = Some(QuizOutcome::Submitted(self.answers.clone()));
        self.should_quit = true;
    }

    pub fn cancel_submit(&mut self) {
        self.input_mode = InputMode::Answering;
    }

    pub fn save_and_quit(&mut self) {
        self.outcome = Some(QuizOutcome::Saved(self.answers.clone()));
        self.should_quit = true;
    }

    pub fn abort(&mut self) {
        self.outcome = Some(QuizOutcome::Aborted);
        self.should_quit = true;
    }

    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn dismiss_help(&mut self) {
        self.input_mode = InputMode::Answering;
    }

    pub fn update_flash(&mut self) {
        if let Some((_, timestamp)) = self.flash_message {
            if timestamp.elapsed().as_secs() >= 3 {
                self.flash_message = None;
            }
        }
    }

    pub fn show_flash(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now()));
    }

    pub fn into_outcome(self) -> QuizOutcome {
        self.outcome.unwrap_or(QuizOutcome::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Category;

    fn catalog() -> QuestionCatalog {
        let questions = (1..=3)
            .map(|i| Question {
                id: format!("q{}", i),
                category: if i < 3 { Category::Spending } else { Category::Goals },
                text: format!("Question {}", i),
                order: i,
            })
            .collect();
        QuestionCatalog::from_questions(questions)
    }

    fn app_with(existing: AnswerSet) -> QuizApp {
        QuizApp::new(
            "Session".to_string(),
            &catalog(),
            AnswerScale::default(),
            existing,
            ThemeColors::dark(),
        )
    }

    #[test]
    fn test_starts_at_first_unanswered() {
        let app = app_with([("q1", 2)].into_iter().collect());
        assert_eq!(app.current_question().unwrap().id, "q2");
        assert_eq!(app.answered_count(), 1);
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn test_select_value_records_and_advances() {
        let mut app = app_with(AnswerSet::new());
        app.select_value(3);
        assert_eq!(app.answers.get("q1"), Some(3));
        assert_eq!(app.current_question().unwrap().id, "q2");
        assert!((app.progress() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_select_value_outside_scale_ignored() {
        let mut app = app_with(AnswerSet::new());
        app.select_value(7);
        assert!(app.answers.is_empty());
        assert_eq!(app.current, 0);
    }

    #[test]
    fn test_navigation_wraps_and_tracks_cursor() {
        let mut app = app_with([("q3", 4)].into_iter().collect());
        app.previous_question();
        assert_eq!(app.current_question().unwrap().id, "q3");
        assert_eq!(app.cursor, 4);
        app.next_question();
        assert_eq!(app.current_question().unwrap().id, "q1");
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn test_cursor_wraps_within_scale() {
        let mut app = app_with(AnswerSet::new());
        app.cursor_up();
        assert_eq!(app.cursor, 4);
        app.cursor_down();
        assert_eq!(app.cursor, 1);
        app.cursor_down();
        app.choose_highlighted();
        assert_eq!(app.answers.get("q1"), Some(2));
    }

    #[test]
    fn test_submit_requires_every_answer() {
        let mut app = app_with([("q1", 1)].into_iter().collect());
        app.request_submit();
        assert_eq!(app.input_mode, InputMode::Answering);
        assert!(app.flash_message.as_ref().unwrap().0.contains("2 questions"));

        app.select_value(2);
        app.select_value(3);
        assert!(app.is_complete());
        app.request_submit();
        assert_eq!(app.input_mode, InputMode::ConfirmSubmit);
        app.confirm_submit();
        assert!(app.should_quit);

        let expected: AnswerSet = [("q1", 1), ("q2", 2), ("q3", 3)].into_iter().collect();
        assert_eq!(app.into_outcome(), QuizOutcome::Submitted(expected));
    }

    #[test]
    fn test_wide_scale_falls_back_to_cursor_keys() {
        let app = app_with(AnswerSet::new());
        assert_eq!(app.digit_range(), Some((1, 4)));
        assert!(!app.needs_cursor_keys());

        let mut app = QuizApp::new(
            "Session".to_string(),
            &catalog(),
            AnswerScale { min: 1, max: 12 },
            AnswerSet::new(),
            ThemeColors::dark(),
        );
        assert_eq!(app.digit_range(), Some((1, 9)));
        assert!(app.needs_cursor_keys());

        // 12 is out of reach for a digit key but not for the cursor
        app.cursor_up();
        assert_eq!(app.cursor, 12);
        app.choose_highlighted();
        assert_eq!(app.answers.get("q1"), Some(12));

        let app = QuizApp::new(
            "Session".to_string(),
            &catalog(),
            AnswerScale { min: 10, max: 20 },
            AnswerSet::new(),
            ThemeColors::dark(),
        );
        assert_eq!(app.digit_range(), None);
    }

    #[test]
    fn test_quit_saves_and_abort_discards() {
        let mut app = app_with(AnswerSet::new());
        app.select_value(4);
        app.save_and_quit();
        assert_eq!(
            app.into_outcome(),
            QuizOutcome::Saved([("q1", 4)].into_iter().collect())
        );

        let mut app = app_with(AnswerSet::new());
        app.select_value(4);
        app.abort();
        assert_eq!(app.into_outcome(), QuizOutcome::Aborted);
    }
}
