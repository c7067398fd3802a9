mod jira;
mod sayori;

use serde::{Deserialize, Deserializer};

pub use jira::{JiraComment, JiraCommentPage, JiraIssue, JiraIssueFields, JiraUser};
pub use sayori::{find_ticket, BotUser, SayoriTicket, SayoriTicketPage};

/// Decodes JSON `null` as `T::default()`; pair with `#[serde(default)]` for absent keys.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
