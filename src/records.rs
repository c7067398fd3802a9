//! Canonical record shapes the reconciliation works on.
//!
//! Source adapters convert raw Sayori and Jira payloads into these types so
//! the core never sees wire formats.

use chrono::{DateTime, Utc};

/// A ticket assigned to a user, as reported by the assignment source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub ticket_id: String,
    pub link: String,
    pub assigned_user_id: String,
    pub assigned_display_name: String,
}

/// One ticket's comment history, fetched fresh per run.
#[derive(Debug, Clone)]
pub struct IssueDetail {
    pub ticket_id: String,
    /// Issue title; empty when the tracker has none.
    pub summary: String,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Author display name; matched exactly against `assigned_display_name`.
    pub author_identity: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// The unit handed to a persistence sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTicketComment {
    pub user_identity: String,
    pub ticket_id: String,
    pub summary: String,
    pub comment: String,
}
