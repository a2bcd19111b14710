use crate::state::{Renderer, FAILURE_NOTICE};
use crate::types::{Step, StepId, StepState};
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};
use std::fmt::Display;
use std::io::{self, IsTerminal, Stdout, Write};

/// Line-oriented renderer. On a real terminal the status notice is erased in
/// place when retired; elsewhere it is left in the output.
pub struct TerminalRenderer<W: Write> {
    out: W,
    interactive: bool,
    status_on_last_line: bool,
    steps: Vec<(StepId, String)>,
}

impl TerminalRenderer<Stdout> {
    pub fn stdout() -> Self {
        let out = io::stdout();
        let interactive = out.is_terminal();
        Self::with_mode(out, interactive)
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self::with_mode(out, false)
    }

    fn with_mode(out: W, interactive: bool) -> Self {
        Self {
            out,
            interactive,
            status_on_last_line: false,
            steps: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Out-of-band line from the front end, e.g. a rejected submit.
    pub fn notice(&mut self, text: &str) {
        self.write_line(format!("[{text}]").dark_grey());
    }

    fn write_line(&mut self, line: impl Display) {
        self.status_on_last_line = false;
        let result = queue!(self.out, Print(line), Print("\n")).and_then(|()| self.out.flush());
        if let Err(error) = result {
            tracing::debug!(%error, "terminal write failed");
        }
    }

    fn step_description(&self, id: &StepId) -> Option<&str> {
        self.steps
            .iter()
            .find(|(step_id, _)| step_id == id)
            .map(|(_, description)| description.as_str())
    }
}

fn step_marker(state: StepState) -> &'static str {
    match state {
        StepState::Pending => "[ ]",
        StepState::Running => "[~]",
        StepState::Done => "[x]",
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn show_user_message(&mut self, text: &str) {
        self.write_line(format!("> {text}").bold());
    }

    fn show_status(&mut self, text: &str) {
        self.write_line(format!("... {text}").italic().dark_grey());
        self.status_on_last_line = true;
    }

    fn clear_status(&mut self) {
        if !(self.interactive && self.status_on_last_line) {
            return;
        }
        self.status_on_last_line = false;
        let result = queue!(
            self.out,
            cursor::MoveToPreviousLine(1),
            Clear(ClearType::CurrentLine)
        )
        .and_then(|()| self.out.flush());
        if let Err(error) = result {
            tracing::debug!(%error, "cannot erase status line");
        }
    }

    fn show_plan(&mut self, intent: &str, steps: &[Step]) {
        self.steps = steps
            .iter()
            .map(|step| (step.id.clone(), step.description.clone()))
            .collect();
        self.write_line(format!("Plan: {intent}").cyan().bold());
        for step in steps {
            self.write_line(format!(
                "  {} {}. {}",
                step_marker(step.state),
                step.id,
                step.description
            ));
        }
    }

    fn update_step(&mut self, id: &StepId, state: StepState) {
        let description = self.step_description(id).unwrap_or_default().to_string();
        let line = format!("  {} {id}. {description}", step_marker(state));
        match state {
            StepState::Done => self.write_line(line.green()),
            StepState::Running => self.write_line(line.yellow()),
            StepState::Pending => self.write_line(line),
        }
    }

    fn show_assistant_message(&mut self, text: &str) {
        self.write_line(text);
    }

    fn show_failure_notice(&mut self) {
        self.write_line(FAILURE_NOTICE.red());
    }

    fn clear_plan(&mut self) {
        self.steps.clear();
    }

    fn turn_finished(&mut self) {
        self.write_line("");
    }
}
