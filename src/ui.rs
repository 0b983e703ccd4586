//! UI rendering functions.
//!
//! One draw function per stage, plus pure formatting helpers that can be
//! unit tested without a terminal.

use std::collections::BTreeMap;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph, Wrap};

use crate::app::{App, Stage};
use crate::catalog::CatalogError;

/// Marker substituted at render time for steps with no captured text.
pub const NO_RESPONSE_MARKER: &str = "(no response recorded)";

/// Prompt shown in the summary stage after a successful load found no
/// workflows. Distinguishes the empty catalog from a load failure.
pub const EMPTY_SUMMARY_PROMPT: &str =
    "Press enter to return to the workflows list or q to quit.";

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn title_style() -> Style {
    Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD)
}

fn subtitle_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn section_style() -> Style {
    Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::BOLD)
}

fn error_style() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}

fn help_style() -> Style {
    Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::ITALIC)
}

/// Spinner frame for the given render frame count. Advances every third
/// frame so the spinner stays readable at the 50ms poll cadence.
pub fn spinner_frame(frame_count: u64) -> &'static str {
    SPINNER_FRAMES[(frame_count / 3) as usize % SPINNER_FRAMES.len()]
}

/// Formats the "Step X of Y" progress indicator. `current` is zero-based.
pub fn step_progress(current: usize, total: usize) -> String {
    format!("Step {} of {}", current + 1, total)
}

/// Render-time substitution for the summary: steps with no captured text
/// show the fixed marker instead.
pub fn summary_response(responses: &BTreeMap<usize, String>, index: usize) -> &str {
    match responses.get(&index) {
        Some(response) if !response.is_empty() => response.as_str(),
        _ => NO_RESPONSE_MARKER,
    }
}

/// Message rendered in the summary stage when the catalog load failed.
pub fn load_failure_message(error: &CatalogError) -> String {
    format!("Error loading workflows: {}", error)
}

/// Draw the current stage.
pub fn draw(f: &mut Frame, app: &mut App) {
    app.frame_count = app.frame_count.wrapping_add(1);

    let area = f.area().inner(Margin {
        horizontal: 2,
        vertical: 1,
    });

    match app.stage {
        Stage::Loading => draw_loading(f, app, area),
        Stage::Selecting => draw_selecting(f, app, area),
        Stage::Capturing => draw_capturing(f, app, area),
        Stage::Summarizing => draw_summary(f, app, area),
    }
}

fn draw_loading(f: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(spinner_frame(app.frame_count), subtitle_style()),
        Span::raw(" Loading incident workflows..."),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_selecting(f: &mut Frame, app: &App, area: Rect) {
    if app.workflows.is_empty() {
        let notice = Paragraph::new("No workflows available. Press q to quit.")
            .wrap(Wrap { trim: false });
        f.render_widget(notice, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(2), // Subtitle
            Constraint::Min(1),    // Workflow list
            Constraint::Length(1), // Key help
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(Line::styled("firedrill", title_style())),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(Line::styled(
            "Select a workflow to begin guided response.",
            subtitle_style(),
        )),
        chunks[1],
    );

    let items: Vec<ListItem> = app
        .workflows
        .iter()
        .map(|workflow| {
            ListItem::new(vec![
                Line::styled(
                    workflow.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Line::styled(workflow.description.clone(), subtitle_style()),
                Line::raw(""),
            ])
        })
        .collect();
    let list = List::new(items)
        .highlight_symbol("> ")
        .highlight_style(title_style());
    let mut state = ListState::default().with_selected(Some(app.list_index));
    f.render_stateful_widget(list, chunks[2], &mut state);

    f.render_widget(
        Paragraph::new(Line::styled(
            "↑/↓ to navigate • enter to open • q to quit",
            help_style(),
        )),
        chunks[3],
    );
}

fn draw_capturing(f: &mut Frame, app: &App, area: Rect) {
    let (Some(workflow), Some(step)) = (&app.selected, app.current_step_def()) else {
        return;
    };

    let progress = step_progress(app.current_step, workflow.steps.len());

    let input_line = if app.input.value.is_empty() {
        Line::from(vec![
            Span::raw("> "),
            Span::styled(app.input.placeholder.clone(), help_style()),
        ])
    } else {
        Line::from(vec![Span::raw("> "), Span::raw(app.input.value.clone())])
    };

    let lines = vec![
        Line::styled(workflow.title.clone(), title_style()),
        Line::styled(workflow.description.clone(), subtitle_style()),
        Line::raw(""),
        Line::styled(format!("{}: {}", progress, step.title), section_style()),
        Line::styled(step.prompt.clone(), subtitle_style()),
        Line::raw(""),
        input_line,
        Line::raw(""),
        Line::styled("enter to continue • esc to cancel • q to quit", help_style()),
    ];

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_summary(f: &mut Frame, app: &App, area: Rect) {
    if let Some(error) = &app.load_error {
        let message = Paragraph::new(Line::styled(load_failure_message(error), error_style()))
            .wrap(Wrap { trim: false });
        f.render_widget(message, area);
        return;
    }

    let Some(workflow) = &app.selected else {
        let lines = vec![
            Line::styled("firedrill", title_style()),
            Line::raw(""),
            Line::styled(EMPTY_SUMMARY_PROMPT, subtitle_style()),
        ];
        f.render_widget(Paragraph::new(lines), area);
        return;
    };

    let mut lines = vec![
        Line::styled(workflow.title.clone(), title_style()),
        Line::styled("Captured responses:", subtitle_style()),
        Line::raw(""),
    ];
    for (index, step) in workflow.steps.iter().enumerate() {
        lines.push(Line::styled(step.title.clone(), section_style()));
        lines.push(Line::raw(
            summary_response(&app.responses, index).to_string(),
        ));
        lines.push(Line::raw(""));
    }
    lines.push(Line::styled(
        "enter to return • esc to cancel • q to quit",
        help_style(),
    ));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}
