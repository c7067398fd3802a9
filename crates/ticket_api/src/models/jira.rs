//! Issue payloads returned by the Jira REST API (`/rest/api/2/issue`).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::null_as_default;
use crate::timestamp::{deserialize_optional_timestamp, deserialize_timestamp};

#[derive(Debug, Deserialize, Clone)]
pub struct JiraIssue {
    #[serde(default)]
    pub key: Option<String>,
    pub fields: JiraIssueFields,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JiraIssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: JiraCommentPage,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct JiraCommentPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<JiraComment>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JiraComment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub updated: Option<DateTime<Utc>>,
    /// Empty for anonymous or deleted authors.
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: JiraUser,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    /// Login name. Decoded for diagnostics only.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active: bool,
}

impl JiraIssue {
    /// Comment history in the order Jira returned it.
    pub fn comments(&self) -> &[JiraComment] {
        &self.fields.comment.comments
    }
}

#[cfg(test)]
mod tests {
    use super::JiraIssue;
    use chrono::Timelike;

    #[test]
    fn decodes_issue_with_comment_history() {
        let payload = r#"{
            "key": "A-1",
            "fields": {
                "summary": "Gateway timeout",
                "comment": {
                    "comments": [
                        {
                            "id": "10",
                            "body": "looking into it",
                            "created": "2023-05-10T14:22:01.123+0000",
                            "updated": "2023-05-10T14:22:01.123+0000",
                            "author": {"displayName": "alice", "name": "asmith", "active": true}
                        }
                    ]
                }
            }
        }"#;

        let issue: JiraIssue = serde_json::from_str(payload).unwrap();
        assert_eq!(issue.key.as_deref(), Some("A-1"));
        assert_eq!(issue.comments().len(), 1);
        let comment = &issue.comments()[0];
        assert_eq!(comment.author.display_name, "alice");
        assert_eq!(comment.author.name.as_deref(), Some("asmith"));
        assert_eq!(comment.created.minute(), 22);
        assert!(comment.updated.is_some());
    }

    #[test]
    fn missing_comment_block_decodes_as_empty() {
        let issue: JiraIssue = serde_json::from_str(r#"{"fields": {"summary": "x"}}"#).unwrap();
        assert!(issue.comments().is_empty());
    }

    #[test]
    fn comments_without_author_still_decode() {
        let payload = r#"{"fields": {"comment": {"comments": [
            {"body": "anonymous", "created": "2023-05-10T10:00:00.000+0000"},
            {"body": null, "created": "2023-05-10T10:30:00.000+0000", "author": null},
            {"body": "mine", "created": "2023-05-10T11:00:00.000+0000",
             "author": {"displayName": "alice", "active": null}}
        ]}}}"#;

        let issue: JiraIssue = serde_json::from_str(payload).unwrap();
        let authors: Vec<_> = issue
            .comments()
            .iter()
            .map(|c| c.author.display_name.as_str())
            .collect();
        assert_eq!(authors, vec!["", "", "alice"]);
        assert_eq!(issue.comments()[1].body, "");
        assert!(!issue.comments()[2].author.active);
    }

    #[test]
    fn null_comment_block_decodes_as_empty() {
        let issue: JiraIssue =
            serde_json::from_str(r#"{"fields": {"summary": null, "comment": null}}"#).unwrap();
        assert!(issue.comments().is_empty());
        assert!(issue.fields.summary.is_none());
    }

    #[test]
    fn unparsable_comment_timestamp_fails_decode() {
        let payload = r#"{"fields": {"comment": {"comments": [
            {"body": "b", "created": "10/05/2023 14:22", "author": {"displayName": "alice"}}
        ]}}}"#;
        let err = serde_json::from_str::<JiraIssue>(payload).unwrap_err();
        assert!(err.to_string().contains("10/05/2023 14:22"));
    }
}
