//! Source seams consumed by the reconciler, and their Sayori/Jira adapters.

use async_trait::async_trait;
use ticket_api::{FetchError, JiraClient, JiraIssue, SayoriClient, SayoriTicket};

use crate::records::{AssignmentRecord, Comment, IssueDetail};

#[async_trait]
pub trait AssignmentSource: Send + Sync {
    async fn list_assignments(&self) -> Result<Vec<AssignmentRecord>, FetchError>;
}

#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn get_issue(&self, ticket_id: &str) -> Result<IssueDetail, FetchError>;
}

#[async_trait]
impl AssignmentSource for SayoriClient {
    async fn list_assignments(&self) -> Result<Vec<AssignmentRecord>, FetchError> {
        let tickets = self.list_tickets().await?;
        Ok(tickets.iter().map(assignment_from_ticket).collect())
    }
}

#[async_trait]
impl IssueSource for JiraClient {
    async fn get_issue(&self, ticket_id: &str) -> Result<IssueDetail, FetchError> {
        let issue = JiraClient::get_issue(self, ticket_id).await?;
        Ok(issue_detail_from_jira(ticket_id, &issue))
    }
}

/// Maps one Sayori ticket onto the canonical assignment record.
pub fn assignment_from_ticket(ticket: &SayoriTicket) -> AssignmentRecord {
    AssignmentRecord {
        ticket_id: ticket.ticket_id.clone(),
        link: ticket.link.clone(),
        assigned_user_id: ticket.bot_user_id.clone(),
        assigned_display_name: ticket.bot_user.display_name.clone(),
    }
}

/// Keeps Jira comment order; the author identity is the display name, never the login.
///
/// Comments without an author display name (anonymous or deleted users) are dropped.
pub fn issue_detail_from_jira(ticket_id: &str, issue: &JiraIssue) -> IssueDetail {
    IssueDetail {
        ticket_id: ticket_id.to_string(),
        summary: issue.fields.summary.clone().unwrap_or_default(),
        comments: issue
            .comments()
            .iter()
            .filter(|comment| !comment.author.display_name.is_empty())
            .map(|comment| Comment {
                author_identity: comment.author.display_name.clone(),
                body: comment.body.clone(),
                created_at: comment.created,
            })
            .collect(),
    }
}
