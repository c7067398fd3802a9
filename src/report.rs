//! Plain-text rendering of reconciliation output.

use std::fmt::Write;

use crate::reconcile::ReconciliationResult;

pub const EMPTY_REPORT: &str = "No comments found for any user";

/// Renders users and tickets in sorted order.
pub fn render_report(result: &ReconciliationResult) -> String {
    if result.is_empty() {
        return format!("{EMPTY_REPORT}\n");
    }

    let mut out = String::new();
    let mut current_user: Option<String> = None;
    for entry in result.entries() {
        if current_user.as_deref() != Some(entry.user_identity.as_str()) {
            if current_user.is_some() {
                let _ = writeln!(out, "{}", "=".repeat(60));
            }
            let _ = writeln!(out, "\nLast comments by {}:", entry.user_identity);
            let _ = writeln!(out, "{}", "-".repeat(40));
            current_user = Some(entry.user_identity.clone());
        }
        if entry.summary.is_empty() {
            let _ = writeln!(out, "\nTicket: {}", entry.ticket_id);
        } else {
            let _ = writeln!(out, "\nTicket: {} ({})", entry.ticket_id, entry.summary);
        }
        let _ = writeln!(out, "Last comment: {}", entry.comment);
    }
    let _ = writeln!(out, "{}", "=".repeat(60));
    out
}

/// Numbered list of one user's comment bodies on a ticket.
pub fn render_ticket_comments(ticket_id: &str, user: &str, bodies: &[String]) -> String {
    if bodies.is_empty() {
        return format!("No comments by {user} on {ticket_id}\n");
    }
    let mut out = format!("Comments by {user} on {ticket_id}:\n");
    for (n, body) in bodies.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", n + 1, body);
    }
    out
}
