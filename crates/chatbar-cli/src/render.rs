//! Plain-text rendering of the two display surfaces.

use std::fmt;

use chatbar_core::{Step, StepId, StepKind, StepStatus, ToolDetails};
use chatbar_engine::{detail_projection, is_visible_in_primary, primary_projection};

/// Which surface to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Surface {
    /// The chat view.
    #[default]
    Primary,
    /// The inspector view, every step unfiltered.
    Detail,
}

/// A step list formatted for one surface.
#[derive(Debug, Clone, Copy)]
pub struct Transcript<'a> {
    steps: &'a [Step],
    surface: Surface,
    highlighted: Option<StepId>,
}

impl<'a> Transcript<'a> {
    /// Render `steps` on `surface`.
    #[must_use]
    pub const fn new(steps: &'a [Step], surface: Surface) -> Self {
        Self {
            steps,
            surface,
            highlighted: None,
        }
    }

    /// Mark a step as highlighted.
    #[must_use]
    pub fn highlight(mut self, step: Option<StepId>) -> Self {
        self.highlighted = step;
        self
    }

    fn write_step(&self, f: &mut fmt::Formatter<'_>, step: &Step) -> fmt::Result {
        let marker = if self.highlighted == Some(step.id) { '>' } else { ' ' };
        let indent = if step.is_indented { "    " } else { " " };
        let prefix = format!("{marker}{indent}[{}] ", label(step));
        f.write_str(&prefix)?;

        match &step.tool {
            Some(tool) => write_tool(f, tool, step.status)?,
            None => write_text(f, &step.text, prefix.chars().count())?,
        }

        if self.surface == Surface::Detail {
            let origin = step.origin.prefix().trim_end_matches('-');
            let status = step.status.as_str().to_lowercase();
            write!(f, "  ({origin}, {status}")?;
            if !is_visible_in_primary(step) {
                f.write_str(", hidden")?;
            }
            f.write_str(")")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for Transcript<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps = match self.surface {
            Surface::Primary => primary_projection(self.steps),
            Surface::Detail => detail_projection(self.steps),
        };
        for step in steps {
            self.write_step(f, step)?;
        }
        Ok(())
    }
}

const fn label(step: &Step) -> &'static str {
    match step.kind {
        StepKind::UserMessage => "you",
        StepKind::Thought => "thought",
        StepKind::ToolInvocation => "tool",
        StepKind::Response => "assistant",
    }
}

/// Continuation lines are aligned under the first line's text.
fn write_text(f: &mut fmt::Formatter<'_>, text: &str, width: usize) -> fmt::Result {
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            write!(f, "\n{:width$}", "")?;
        }
        f.write_str(line)?;
    }
    Ok(())
}

fn write_tool(f: &mut fmt::Formatter<'_>, tool: &ToolDetails, status: StepStatus) -> fmt::Result {
    f.write_str(&tool.name)?;
    f.write_str("(")?;
    for (i, (key, value)) in tool.parameters.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{key}={value}")?;
    }
    f.write_str(")")?;

    match status {
        StepStatus::Active => f.write_str(" …"),
        StepStatus::Completed => match &tool.result {
            Some(result) if !result.is_empty() => write!(f, " -> {}", first_line(result)),
            _ => f.write_str(" -> ok"),
        },
        StepStatus::Failed => {
            let error = tool.error_message.as_deref().unwrap_or("failed");
            write!(f, " !! {}", first_line(error))
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
