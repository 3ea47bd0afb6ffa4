//! Chat text rendering and keyboards for task messages.

use crate::store::{TaskStatus, TaskSummary};
use crate::telegram::{inline_keyboard, InlineButton};

/// Render a task into chat text: requester header, `#<id>` line, verbatim
/// content, and optionally a blank line plus one status line. The same
/// formatter serves the initial announcement and every subsequent edit.
pub fn format_task_message(
    task_id: i64,
    manager_username: &str,
    content: &str,
    status_line: Option<&str>,
) -> String {
    let mut lines = Vec::new();
    if manager_username.is_empty() {
        lines.push("🛠 New task from a manager".to_string());
    } else {
        lines.push(format!("🛠 New task from @{}", manager_username));
    }
    lines.push(format!("#{}", task_id));
    lines.push(content.to_string());
    if let Some(status_line) = status_line {
        lines.push(String::new());
        lines.push(status_line.to_string());
    }
    lines.join("\n")
}

/// Keyboard on a fresh announcement: the single claim action.
pub fn claim_keyboard(task_id: i64) -> serde_json::Value {
    inline_keyboard(vec![vec![InlineButton::new(
        "🔏 Claim task",
        &format!("take:{}", task_id),
    )]])
}

/// Keyboard after a claim: the three terminal actions.
pub fn resolve_keyboard(task_id: i64) -> serde_json::Value {
    inline_keyboard(vec![vec![
        InlineButton::new("🟢 Done", &format!("done:{}", task_id)),
        InlineButton::new("🟡 On hold", &format!("hold:{}", task_id)),
        InlineButton::new("🔴 Cancel", &format!("cancel:{}", task_id)),
    ]])
}

/// Human-readable status label for listings.
pub fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::New => "🟦 New",
        TaskStatus::InProgress => "🟧 In progress",
        TaskStatus::Done => "🟢 Done",
        TaskStatus::OnHold => "🟡 On hold",
        TaskStatus::Cancelled => "🔴 Cancelled",
    }
}

/// Status line added to the announcement when a technician claims the task.
pub fn claimed_line(tech_username: &str) -> String {
    format!("👤 Claimed by @{}", tech_username)
}

/// Render a manager's task list, one block per task, newest first as given.
pub fn format_task_list(tasks: &[TaskSummary]) -> String {
    let blocks: Vec<String> = tasks
        .iter()
        .map(|t| {
            let tech_part = t
                .tech_username
                .as_deref()
                .map(|u| format!(" — @{}", u))
                .unwrap_or_default();
            format!("#{} {}{}\n{}", t.id, status_label(t.status), tech_part, t.content)
        })
        .collect();
    blocks.join("\n\n")
}
