use std::fmt::Write;

use crate::events::StatePayload;
use crate::models::{OpenSection, Task};
use crate::reorder::{DragGesture, Shift};

const TITLE: &str = "tinytasks.io";
const TAGLINE: &str = "Task management made simple.";

pub fn render_state(
    state: &StatePayload,
    gesture: Option<&DragGesture>,
    header: Option<&str>,
) -> String {
    let mut out = String::new();
    match header {
        Some(header) => {
            let _ = writeln!(out, "{TITLE}    {header}");
        }
        None => {
            let _ = writeln!(out, "{TITLE}");
        }
    }
    let _ = writeln!(out, "{TAGLINE}");
    let _ = writeln!(out);

    let _ = writeln!(out, "Tasks ({})", state.tasks.len());
    for (index, task) in state.tasks.iter().enumerate() {
        let marker = match gesture.map(|g| g.feedback(index)) {
            Some(feedback) if feedback.dragging => "*",
            Some(feedback) if feedback.drop_marker => ">",
            Some(feedback) => match feedback.shift {
                Some(Shift::Up) => "^",
                Some(Shift::Down) => "v",
                None => " ",
            },
            None => " ",
        };
        render_task(&mut out, marker, index + 1, task);
    }

    let _ = writeln!(out);
    render_section(
        &mut out,
        "Completed",
        &state.completed_tasks,
        state.open_section == Some(OpenSection::Completed),
    );
    if !state.archived_tasks.is_empty() {
        render_section(
            &mut out,
            "Archived",
            &state.archived_tasks,
            state.open_section == Some(OpenSection::Archived),
        );
    }
    if !state.deleted_tasks.is_empty() {
        render_section(
            &mut out,
            "Deleted",
            &state.deleted_tasks,
            state.open_section == Some(OpenSection::Deleted),
        );
    }
    out
}

fn render_section(out: &mut String, title: &str, tasks: &[Task], expanded: bool) {
    let arrow = if expanded { "v" } else { ">" };
    let _ = writeln!(out, "{arrow} {title} ({})", tasks.len());
    if expanded {
        for (index, task) in tasks.iter().enumerate() {
            render_task(out, " ", index + 1, task);
        }
    }
}

fn render_task(out: &mut String, marker: &str, position: usize, task: &Task) {
    let check = if task.completed { "x" } else { " " };
    let _ = writeln!(
        out,
        "{marker}{position:>3}. [{check}] {}",
        task_line(task)
    );
    if let Some(description) = &task.description {
        for line in description.lines() {
            let _ = writeln!(out, "           {line}");
        }
    }
}

pub fn task_line(task: &Task) -> String {
    let mut line = task.text.clone();
    if let Some(link_text) = &task.link_text {
        let url = task.link_url.as_deref().unwrap_or("#");
        let _ = write!(line, " {link_text} <{url}>");
        if let Some(after) = &task.text_after_link {
            let _ = write!(line, " {after}");
        }
    }
    line
}
