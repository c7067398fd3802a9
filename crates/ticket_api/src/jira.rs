//! Jira issue client.

use crate::client::ApiClient;
use crate::config::{AuthScheme, ClientConfig};
use crate::error::Result;
use crate::models::JiraIssue;
use tracing::{debug, info};

/// Read-only access to Jira issues.
#[derive(Clone)]
pub struct JiraClient {
    api: ApiClient,
}

impl JiraClient {
    /// Builds a client authenticating with `Authorization: Basic <token>`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = config.with_auth_scheme(AuthScheme::Basic);
        Ok(Self {
            api: ApiClient::new(config)?,
        })
    }

    /// Fetches one issue including its comment history.
    pub async fn get_issue(&self, ticket_id: &str) -> Result<JiraIssue> {
        let path = format!("rest/api/2/issue/{ticket_id}");
        info!(ticket_id, "fetching issue from Jira");
        let issue: JiraIssue = self.api.get_json(&path, &[("expand", "comments")]).await?;
        debug!(ticket_id, comments = issue.comments().len(), "issue decoded");
        Ok(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::JiraClient;
    use crate::config::ClientConfig;
    use crate::error::FetchError;
    use mockito::Matcher;

    const ISSUE: &str = r#"{
        "key": "A-1",
        "fields": {"comment": {"comments": [
            {"id": "1", "body": "first", "created": "2023-05-10T10:00:00.000+0000",
             "author": {"displayName": "alice", "name": "asmith"}},
            {"id": "2", "body": "from bob", "created": "2023-05-10T11:00:00.000+0000",
             "author": {"displayName": "bob"}},
            {"id": "3", "body": "second", "created": "2023-05-10T12:00:00.000+0000",
             "author": {"displayName": "alice"}}
        ]}}
    }"#;

    #[tokio::test]
    async fn get_issue_sends_basic_auth_and_expands_comments() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/2/issue/A-1")
            .match_query(Matcher::UrlEncoded("expand".into(), "comments".into()))
            .match_header("authorization", "Basic dG9rZW4=")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ISSUE)
            .create_async()
            .await;

        let client = JiraClient::new(ClientConfig::new(server.url()).with_token("dG9rZW4=")).unwrap();
        let issue = client.get_issue("A-1").await.unwrap();

        mock.assert_async().await;
        let bodies: Vec<_> = issue
            .comments()
            .iter()
            .map(|comment| comment.body.as_str())
            .collect();
        assert_eq!(bodies, vec!["first", "from bob", "second"]);
    }

    #[tokio::test]
    async fn missing_issue_surfaces_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/2/issue/NOPE-1")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"errorMessages":["Issue Does Not Exist"]}"#)
            .create_async()
            .await;

        let client = JiraClient::new(ClientConfig::new(server.url()).with_token("t")).unwrap();
        let err = client.get_issue("NOPE-1").await.unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }));
    }
}
