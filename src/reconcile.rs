//! Last-comment reconciliation across Sayori assignments and Jira issues.
//!
//! Assignments are grouped by display name, filtered to Jira links, and each
//! admitted ticket is fetched and reduced to the latest comment its assignee
//! wrote. Ticket fetches run concurrently up to a fixed limit; a failed fetch
//! only drops that ticket.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use thiserror::Error;
use ticket_api::FetchError;

use crate::records::{AssignmentRecord, Comment, UserTicketComment};
use crate::sources::{AssignmentSource, IssueSource};

pub const ISSUE_TRACKER_LINK_PREFIX: &str = "https://jira.";
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

/// Display name → Sayori bot user id.
pub type IdentityIndex = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to get tickets from Sayori")]
    Assignments(#[source] FetchError),
    #[error("failed to get ticket {ticket_id} from Jira")]
    Issue {
        ticket_id: String,
        #[source]
        source: FetchError,
    },
}

/// User → ticket → latest comment body. Users without any comment are absent.
///
/// Issue summaries are kept alongside, keyed by ticket id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    users: HashMap<String, HashMap<String, String>>,
    summaries: HashMap<String, String>,
}

impl ReconciliationResult {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Ticket id → latest comment for one user.
    pub fn tickets_for(&self, user: &str) -> Option<&HashMap<String, String>> {
        self.users.get(user)
    }

    pub fn comment(&self, user: &str, ticket_id: &str) -> Option<&str> {
        self.users
            .get(user)
            .and_then(|tickets| tickets.get(ticket_id))
            .map(String::as_str)
    }

    /// All entries ordered by user, then ticket id.
    pub fn entries(&self) -> Vec<UserTicketComment> {
        let mut entries: Vec<UserTicketComment> = self
            .users
            .iter()
            .flat_map(|(user, tickets)| {
                tickets.iter().map(move |(ticket_id, comment)| UserTicketComment {
                    user_identity: user.clone(),
                    ticket_id: ticket_id.clone(),
                    summary: self.summaries.get(ticket_id).cloned().unwrap_or_default(),
                    comment: comment.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            a.user_identity
                .cmp(&b.user_identity)
                .then_with(|| a.ticket_id.cmp(&b.ticket_id))
        });
        entries
    }

    fn insert(&mut self, entry: UserTicketComment) {
        self.summaries.insert(entry.ticket_id.clone(), entry.summary);
        self.users
            .entry(entry.user_identity)
            .or_default()
            .insert(entry.ticket_id, entry.comment);
    }
}

impl FromIterator<UserTicketComment> for ReconciliationResult {
    fn from_iter<T: IntoIterator<Item = UserTicketComment>>(iter: T) -> Self {
        let mut result = ReconciliationResult::default();
        for entry in iter {
            result.insert(entry);
        }
        result
    }
}

/// Partitions assignments by display name, keeping each user's input order.
pub fn group_by_user(records: Vec<AssignmentRecord>) -> HashMap<String, Vec<AssignmentRecord>> {
    let mut grouped: HashMap<String, Vec<AssignmentRecord>> = HashMap::new();
    for record in records {
        grouped
            .entry(record.assigned_display_name.clone())
            .or_default()
            .push(record);
    }
    grouped
}

/// First bot user id seen for each display name.
pub fn identity_index(records: &[AssignmentRecord]) -> IdentityIndex {
    let mut index = IdentityIndex::new();
    for record in records {
        index
            .entry(record.assigned_display_name.clone())
            .or_insert_with(|| record.assigned_user_id.clone());
    }
    index
}

/// Byte-wise prefix check; links shorter than the prefix never match.
pub fn is_issue_tracker_link(link: &str) -> bool {
    link.as_bytes().starts_with(ISSUE_TRACKER_LINK_PREFIX.as_bytes())
}

/// Latest comment written by `identity`; on equal timestamps the earlier one in `comments` wins.
pub fn latest_comment_by<'a>(comments: &'a [Comment], identity: &str) -> Option<&'a Comment> {
    comments
        .iter()
        .filter(|comment| comment.author_identity == identity)
        .fold(None, |latest: Option<&Comment>, comment| match latest {
            Some(current) if comment.created_at > current.created_at => Some(comment),
            Some(current) => Some(current),
            None => Some(comment),
        })
}

/// Drives one reconciliation over an assignment source and an issue source.
pub struct Reconciler<A, I> {
    assignments: A,
    issues: I,
    max_concurrent_fetches: usize,
}

impl<A, I> Reconciler<A, I>
where
    A: AssignmentSource,
    I: IssueSource,
{
    /// Reconciler with the default fetch concurrency.
    pub fn new(assignments: A, issues: I) -> Self {
        Self {
            assignments,
            issues,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    /// Caps outstanding Jira requests; zero is treated as one.
    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit.max(1);
        self
    }

    pub fn assignments(&self) -> &A {
        &self.assignments
    }

    /// Resolves the latest comment per user per assigned Jira ticket.
    ///
    /// Fails only when the assignment listing cannot be fetched.
    pub async fn reconcile(&self) -> Result<(ReconciliationResult, IdentityIndex), ReconcileError> {
        info!("Fetching all tickets from Sayori");
        let records = self
            .assignments
            .list_assignments()
            .await
            .map_err(ReconcileError::Assignments)?;

        let index = identity_index(&records);
        let grouped = group_by_user(records);
        for (user, tickets) in &grouped {
            info!("User: {}, Tickets: {}", user, tickets.len());
            for ticket in tickets {
                debug!("Ticket ID: {}, Link: {}", ticket.ticket_id, ticket.link);
            }
        }

        let admitted: Vec<(String, AssignmentRecord)> = grouped
            .into_iter()
            .flat_map(|(user, tickets)| {
                tickets
                    .into_iter()
                    .filter(admit)
                    .map(move |ticket| (user.clone(), ticket))
            })
            .collect();
        info!(
            "Getting last comment for {} tickets (at most {} in flight)",
            admitted.len(),
            self.max_concurrent_fetches
        );

        let result: ReconciliationResult = stream::iter(admitted)
            .map(|(user, record)| self.resolve_ticket(user, record))
            .buffer_unordered(self.max_concurrent_fetches)
            .filter_map(|outcome| async move { outcome })
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect();

        info!("Resolved comments for {} users", result.user_count());
        Ok((result, index))
    }

    /// Every comment body `user_identity` left on `ticket_id`, in ticket order.
    pub async fn reconcile_single_ticket(
        &self,
        ticket_id: &str,
        user_identity: &str,
    ) -> Result<Vec<String>, ReconcileError> {
        info!("Fetching ticket {} from Jira", ticket_id);
        let detail =
            self.issues
                .get_issue(ticket_id)
                .await
                .map_err(|source| ReconcileError::Issue {
                    ticket_id: ticket_id.to_string(),
                    source,
                })?;

        let bodies: Vec<String> = detail
            .comments
            .into_iter()
            .filter(|comment| comment.author_identity == user_identity)
            .map(|comment| comment.body)
            .collect();
        info!("Found {} comments by user {}", bodies.len(), user_identity);
        Ok(bodies)
    }

    async fn resolve_ticket(
        &self,
        user: String,
        record: AssignmentRecord,
    ) -> Option<UserTicketComment> {
        info!(
            "Fetching ticket {} from Jira for user {}",
            record.ticket_id, user
        );
        let detail = match self.issues.get_issue(&record.ticket_id).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!("Failed to get ticket {} from Jira: {}", record.ticket_id, err);
                return None;
            }
        };

        let Some(latest) = latest_comment_by(&detail.comments, &user) else {
            debug!("No comments found by user {} on {}", user, record.ticket_id);
            return None;
        };
        debug!(
            "Found last comment by user {} on {} created at {}",
            user, record.ticket_id, latest.created_at
        );
        Some(UserTicketComment {
            comment: latest.body.clone(),
            user_identity: user,
            ticket_id: record.ticket_id,
            summary: detail.summary,
        })
    }
}

fn admit(record: &AssignmentRecord) -> bool {
    if is_issue_tracker_link(&record.link) {
        return true;
    }
    info!(
        "Skipping ticket {} as link does not start with '{}'",
        record.ticket_id, ISSUE_TRACKER_LINK_PREFIX
    );
    false
}
