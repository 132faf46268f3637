use colored::Colorize;

use crate::features::forms::{Fallback, Feedback, Submission};
use crate::features::outbox::{DrainReport, DrainState, QueuedRequest, RequestBody};

/// Format the queued requests as a numbered list
pub fn format_queue_pretty(queue: &[QueuedRequest]) -> String {
    if queue.is_empty() {
        return "Outbox (0 queued)\n  Nothing waiting to be sent".to_string();
    }

    let mut output = format!("Outbox ({} queued)\n", queue.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for (position, request) in queue.iter().enumerate() {
        let body = match &request.body {
            Some(RequestBody::Form(pairs)) => format!("form, {} fields", pairs.len()),
            Some(RequestBody::Json(_)) => "json".to_string(),
            Some(RequestBody::Text(text)) => format!("text, {} bytes", text.len()),
            None => "no body".to_string(),
        };
        output.push_str(&format!(
            "{:>3}  {} {}  {}\n",
            position.to_string().dimmed(),
            request.method.bold(),
            request.url,
            body.dimmed()
        ));
    }

    output
}

/// Format the outbox status block
pub fn format_status_pretty(pending: usize, state: &DrainState, online: bool, key: &str) -> String {
    let mut lines = Vec::new();

    lines.push("Outbox Status".bold().to_string());
    lines.push("─".repeat(40));

    lines.push(format!(
        "  Connection: {}",
        if online {
            "online".green()
        } else {
            "offline".yellow()
        }
    ));
    lines.push(format!(
        "  Pending:    {} {}",
        pending,
        if pending > 0 {
            "requests waiting".dimmed()
        } else {
            "".dimmed()
        }
    ));
    let state_str = match state {
        DrainState::Blocked(_) => state.to_string().red(),
        DrainState::Idle | DrainState::Draining => state.to_string().normal(),
    };
    lines.push(format!("  Drain:      {state_str}"));
    lines.push(format!("  Key:        {}", key.dimmed()));

    if pending > 0 {
        lines.push(String::new());
        lines.push(
            "Run 'vetbox drain' to send pending requests"
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

/// Format the result of a drain pass
pub fn format_report_pretty(report: &DrainReport) -> String {
    if report.skipped {
        return format!(
            "{} A drain is already running ({} queued)",
            "…".dimmed(),
            report.remaining
        );
    }

    let mut lines = vec![
        "Drain".bold().to_string(),
        "─".repeat(40),
        format!("  Delivered:  {}", report.delivered.to_string().green()),
        format!("  Dropped:    {}", report.dropped),
        format!("  Remaining:  {}", report.remaining),
    ];

    if let Some(reason) = &report.blocked_by {
        lines.push(String::new());
        lines.push(format!("{} Stopped: {}", "✗".red(), reason));
    } else if report.remaining == 0 {
        lines.push(String::new());
        lines.push(format!("{} Outbox is empty", "✓".green()));
    }

    lines.join("\n")
}

/// Format a single feedback line
pub fn format_feedback_pretty(feedback: &Feedback) -> String {
    let icon = match feedback {
        Feedback::Loading => return format!("{} Sending…", "…".dimmed()),
        Feedback::Success(_) => "✓".green(),
        Feedback::Error(_) => "✗".red(),
        Feedback::Queued(_) => "⏸".yellow(),
    };
    format!("{icon} {}", feedback.message())
}

/// Format a finished submission
pub fn format_submission_pretty(submission: &Submission) -> String {
    let mut lines = vec![format_feedback_pretty(&submission.feedback)];

    if let Some(response) = submission.event.as_ref().and_then(|e| e.response.as_ref()) {
        lines.push(format!("  {}", format!("HTTP {}", response.status).dimmed()));
    }

    match &submission.fallback {
        Fallback::None => {}
        Fallback::Reload => lines.push(format!("  {}", "reload".dimmed())),
        Fallback::ReplaceTarget { selector, html } => {
            lines.push(format!("  {} {}", "replace".dimmed(), selector.cyan()));
            lines.push(html.clone());
        }
    }

    lines.join("\n")
}
