//! Wizard controller: session state and the stage state machine.
//!
//! The controller owns the current stage, the selected workflow, and the
//! per-step captured responses, and mutates them in response to discrete
//! events from the main loop. It is never re-entered while handling an event.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, LoadOutcome, Step, Workflow};

/// Placeholder shown in the input field before a step primes its own hint.
pub const DEFAULT_PLACEHOLDER: &str = "Document your response";

/// Top-level controller mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Selecting,
    Capturing,
    Summarizing,
}

/// Single-line free-text input with a placeholder hint.
#[derive(Debug)]
pub struct InputField {
    pub value: String,
    pub placeholder: String,
}

impl InputField {
    fn new() -> Self {
        Self {
            value: String::new(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    /// Clear the buffer and show a new placeholder hint.
    fn prime(&mut self, placeholder: &str) {
        self.value.clear();
        self.placeholder = placeholder.to_string();
    }

    fn insert_char(&mut self, c: char) {
        self.value.push(c);
    }

    fn delete_char_before(&mut self) {
        self.value.pop();
    }

    /// Take the trimmed buffer contents, leaving the field empty.
    fn take_trimmed(&mut self) -> String {
        let value = std::mem::take(&mut self.value);
        value.trim().to_string()
    }
}

/// Main application state.
pub struct App {
    pub stage: Stage,
    /// Catalog contents, read-only once loaded.
    pub workflows: Vec<Workflow>,
    /// Highlight position in the selection list.
    pub list_index: usize,
    pub selected: Option<Workflow>,
    /// Index of the step currently being captured. Equal to the step count
    /// only while summarizing.
    pub current_step: usize,
    /// Captured responses keyed by step index, trimmed at capture time.
    pub responses: BTreeMap<usize, String>,
    pub input: InputField,
    pub load_error: Option<CatalogError>,
    pub should_quit: bool,
    /// Frame counter driving the loading spinner.
    pub frame_count: u64,
}

impl App {
    pub fn new() -> Self {
        Self {
            stage: Stage::Loading,
            workflows: Vec::new(),
            list_index: 0,
            selected: None,
            current_step: 0,
            responses: BTreeMap::new(),
            input: InputField::new(),
            load_error: None,
            should_quit: false,
            frame_count: 0,
        }
    }

    /// One-time handoff from the catalog loader thread.
    pub fn on_catalog_loaded(&mut self, outcome: LoadOutcome) {
        match outcome {
            Ok(workflows) => {
                info!(count = workflows.len(), "workflows_loaded");
                let empty = workflows.is_empty();
                self.workflows = workflows;
                self.stage = if empty {
                    Stage::Summarizing
                } else {
                    Stage::Selecting
                };
            }
            Err(e) => {
                warn!(error = %e, "workflows_load_failed");
                self.load_error = Some(e);
                self.stage = Stage::Summarizing;
            }
        }
    }

    /// Confirm event (enter key).
    pub fn confirm(&mut self) {
        match self.stage {
            Stage::Loading => {}
            Stage::Selecting => self.open_selected(),
            Stage::Capturing => self.capture_step(),
            Stage::Summarizing => self.return_to_selection(),
        }
    }

    /// Cancel event (esc key). Abandons the current workflow, if any.
    pub fn cancel(&mut self) {
        if matches!(self.stage, Stage::Capturing | Stage::Summarizing) {
            self.return_to_selection();
        }
    }

    fn open_selected(&mut self) {
        let Some(workflow) = self.workflows.get(self.list_index).cloned() else {
            return;
        };
        info!(workflow = %workflow.title, "workflow_opened");
        self.current_step = 0;
        self.responses.clear();
        match workflow.steps.first() {
            Some(first) => {
                self.input.prime(&first.placeholder);
                self.stage = Stage::Capturing;
            }
            // Nothing to capture, go straight to the summary.
            None => self.stage = Stage::Summarizing,
        }
        self.selected = Some(workflow);
    }

    fn capture_step(&mut self) {
        let Some(workflow) = &self.selected else {
            return;
        };
        let response = self.input.take_trimmed();
        debug!(step = self.current_step, "response_captured");
        self.responses.insert(self.current_step, response);
        self.current_step += 1;
        match workflow.steps.get(self.current_step) {
            Some(next) => self.input.prime(&next.placeholder),
            None => self.stage = Stage::Summarizing,
        }
    }

    fn return_to_selection(&mut self) {
        self.selected = None;
        self.responses.clear();
        self.current_step = 0;
        self.input.prime(DEFAULT_PLACEHOLDER);
        self.stage = Stage::Selecting;
    }

    /// Navigate-up event. Only meaningful in the selection list.
    pub fn select_prev(&mut self) {
        if self.stage == Stage::Selecting {
            self.list_index = self.list_index.saturating_sub(1);
        }
    }

    /// Navigate-down event, clamped to the list bounds.
    pub fn select_next(&mut self) {
        if self.stage == Stage::Selecting && self.list_index + 1 < self.workflows.len() {
            self.list_index += 1;
        }
    }

    /// Plain character key: j/k navigation in the selection list, text while
    /// capturing, ignored elsewhere.
    pub fn key_char(&mut self, c: char) {
        match self.stage {
            Stage::Selecting => match c {
                'k' => self.select_prev(),
                'j' => self.select_next(),
                _ => {}
            },
            Stage::Capturing => self.input.insert_char(c),
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        if self.stage == Stage::Capturing {
            self.input.delete_char_before();
        }
    }

    pub fn quit(&mut self) {
        info!("quit_requested");
        self.should_quit = true;
    }

    /// The step currently being captured, when there is one.
    pub fn current_step_def(&self) -> Option<&Step> {
        self.selected.as_ref()?.steps.get(self.current_step)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_workflows;

    fn loaded_app() -> App {
        let mut app = App::new();
        app.on_catalog_loaded(Ok(builtin_workflows()));
        app
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.key_char(c);
        }
    }

    #[test]
    fn test_starts_in_loading_stage() {
        let app = App::new();
        assert_eq!(app.stage, Stage::Loading);
        assert!(app.selected.is_none());
        assert!(app.responses.is_empty());
    }

    #[test]
    fn test_load_success_moves_to_selecting() {
        let app = loaded_app();
        assert_eq!(app.stage, Stage::Selecting);
        assert_eq!(app.workflows.len(), 3);
        assert!(app.load_error.is_none());
    }

    #[test]
    fn test_load_empty_catalog_moves_to_summary_without_error() {
        let mut app = App::new();
        app.on_catalog_loaded(Ok(Vec::new()));
        assert_eq!(app.stage, Stage::Summarizing);
        assert!(app.selected.is_none());
        assert!(app.load_error.is_none());
    }

    #[test]
    fn test_load_failure_moves_to_summary_with_error() {
        let mut app = App::new();
        app.on_catalog_loaded(Err(CatalogError::Cancelled));
        assert_eq!(app.stage, Stage::Summarizing);
        assert_eq!(app.load_error, Some(CatalogError::Cancelled));
    }

    #[test]
    fn test_confirm_opens_selected_workflow() {
        let mut app = loaded_app();
        app.select_next();
        app.confirm();
        assert_eq!(app.stage, Stage::Capturing);
        let selected = app.selected.as_ref().expect("workflow selected");
        assert_eq!(selected.title, "Phishing Investigation");
        assert_eq!(app.current_step, 0);
        assert!(app.responses.is_empty());
        // Input primed with the first step's placeholder.
        assert_eq!(app.input.placeholder, "Jane Doe via email");
        assert!(app.input.value.is_empty());
    }

    #[test]
    fn test_phishing_walkthrough_captures_responses() {
        let mut app = loaded_app();
        app.select_next();
        app.confirm();

        type_str(&mut app, "Jane Doe");
        app.confirm();
        assert_eq!(app.stage, Stage::Capturing);
        assert_eq!(app.input.placeholder, "Distribution list");

        type_str(&mut app, "  ");
        app.confirm();

        type_str(&mut app, "Blocked sender");
        app.confirm();

        assert_eq!(app.stage, Stage::Summarizing);
        assert_eq!(app.responses.get(&0), Some(&"Jane Doe".to_string()));
        // Whitespace-only input is stored empty; the summary substitutes the
        // marker at render time.
        assert_eq!(app.responses.get(&1), Some(&String::new()));
        assert_eq!(app.responses.get(&2), Some(&"Blocked sender".to_string()));
    }

    #[test]
    fn test_n_confirms_reach_summary_with_all_indices() {
        let mut app = loaded_app();
        app.confirm();
        let step_count = app.selected.as_ref().unwrap().steps.len();
        for _ in 0..step_count {
            app.confirm();
        }
        assert_eq!(app.stage, Stage::Summarizing);
        assert_eq!(app.current_step, step_count);
        let keys: Vec<usize> = app.responses.keys().copied().collect();
        assert_eq!(keys, (0..step_count).collect::<Vec<_>>());
    }

    #[test]
    fn test_captured_text_is_trimmed() {
        let mut app = loaded_app();
        app.confirm();
        type_str(&mut app, "  host1, host2  ");
        app.confirm();
        assert_eq!(app.responses.get(&0), Some(&"host1, host2".to_string()));
    }

    #[test]
    fn test_cancel_from_capturing_returns_to_selection() {
        let mut app = loaded_app();
        app.confirm();
        type_str(&mut app, "partial answer");
        app.confirm();
        app.cancel();
        assert_eq!(app.stage, Stage::Selecting);
        assert!(app.selected.is_none());
        assert!(app.responses.is_empty());
        assert_eq!(app.current_step, 0);
        assert_eq!(app.input.placeholder, DEFAULT_PLACEHOLDER);
    }

    #[test]
    fn test_cancel_from_summary_returns_to_selection() {
        let mut app = loaded_app();
        app.confirm();
        for _ in 0..3 {
            app.confirm();
        }
        assert_eq!(app.stage, Stage::Summarizing);
        app.cancel();
        assert_eq!(app.stage, Stage::Selecting);
        assert!(app.responses.is_empty());
        assert_eq!(app.current_step, 0);
    }

    #[test]
    fn test_confirm_from_summary_returns_to_selection() {
        let mut app = loaded_app();
        app.confirm();
        for _ in 0..3 {
            app.confirm();
        }
        app.confirm();
        assert_eq!(app.stage, Stage::Selecting);
        assert!(app.selected.is_none());
    }

    #[test]
    fn test_navigation_clamps_to_list_bounds() {
        let mut app = loaded_app();
        app.select_prev();
        assert_eq!(app.list_index, 0);
        for _ in 0..10 {
            app.select_next();
        }
        assert_eq!(app.list_index, app.workflows.len() - 1);
    }

    #[test]
    fn test_jk_navigate_in_selection_only() {
        let mut app = loaded_app();
        app.key_char('j');
        assert_eq!(app.list_index, 1);
        app.key_char('k');
        assert_eq!(app.list_index, 0);

        app.confirm();
        app.key_char('j');
        assert_eq!(app.input.value, "j");
    }

    #[test]
    fn test_typing_ignored_outside_capturing() {
        let mut app = App::new();
        app.key_char('x');
        app.backspace();
        assert!(app.input.value.is_empty());
    }

    #[test]
    fn test_backspace_edits_input() {
        let mut app = loaded_app();
        app.confirm();
        type_str(&mut app, "abc");
        app.backspace();
        assert_eq!(app.input.value, "ab");
    }

    #[test]
    fn test_workflow_without_steps_goes_straight_to_summary() {
        let mut app = App::new();
        app.on_catalog_loaded(Ok(vec![Workflow {
            title: "Empty Drill".to_string(),
            description: "No steps defined.".to_string(),
            steps: Vec::new(),
        }]));
        app.confirm();
        assert_eq!(app.stage, Stage::Summarizing);
        assert_eq!(app.current_step, 0);
        assert!(app.responses.is_empty());
    }

    #[test]
    fn test_reselection_starts_with_cleared_responses() {
        let mut app = loaded_app();
        app.confirm();
        type_str(&mut app, "first pass");
        app.confirm();
        app.cancel();
        app.confirm();
        assert_eq!(app.stage, Stage::Capturing);
        assert!(app.responses.is_empty());
        assert!(app.input.value.is_empty());
    }

    #[test]
    fn test_quit_sets_flag() {
        let mut app = App::new();
        app.quit();
        assert!(app.should_quit);
    }
}
