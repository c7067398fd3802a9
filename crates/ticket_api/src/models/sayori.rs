//! Assignment payloads returned by the Sayori ticket API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::null_as_default;
use crate::timestamp::deserialize_optional_timestamp;

/// Envelope around `GET /api/v1/tickets/{project}`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SayoriTicketPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<SayoriTicket>,
}

/// One ticket assigned to a bot user.
///
/// Every field except the ticket id tolerates being absent or `null`.
#[derive(Debug, Deserialize, Clone)]
pub struct SayoriTicket {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub estimate: f64,
    // The API spells it this way.
    #[serde(default, rename = "dificulty", deserialize_with = "null_as_default")]
    pub difficulty: i64,
    #[serde(rename = "ticket")]
    pub ticket_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bot_user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ticket_type: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_project: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: String,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub ticket_date: Option<DateTime<Utc>>,
    #[serde(rename = "BotUser", default, deserialize_with = "null_as_default")]
    pub bot_user: BotUser,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BotUser {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub picture: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
}

/// Finds the ticket with the given id in an already fetched listing.
pub fn find_ticket<'a>(tickets: &'a [SayoriTicket], ticket_id: &str) -> Option<&'a SayoriTicket> {
    tickets.iter().find(|ticket| ticket.ticket_id == ticket_id)
}

#[cfg(test)]
mod tests {
    use super::{find_ticket, SayoriTicketPage};

    const PAGE: &str = r#"{
        "data": [
            {
                "id": 7,
                "link": "https://jira.example.com/browse/A-1",
                "estimate": 1.5,
                "dificulty": 3,
                "ticket": "A-1",
                "bot_user_id": "U123",
                "ticket_type": 1,
                "current_project": "APIGEE",
                "comments": "",
                "create_date": "2023-05-10T14:22:01.123456Z",
                "ticket_date": "2023-05-09T08:00:00Z",
                "BotUser": {"user_id": "U123", "user_name": "alice.s", "display_name": "alice"}
            },
            {"ticket": "B-2", "link": "https://other.example.com/B-2", "bot_user_id": "U9",
             "BotUser": {"display_name": "bob"}}
        ]
    }"#;

    #[test]
    fn decodes_page_and_misspelled_difficulty() {
        let page: SayoriTicketPage = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.data.len(), 2);
        let first = &page.data[0];
        assert_eq!(first.difficulty, 3);
        assert_eq!(first.bot_user.display_name, "alice");
        assert!(first.create_date.is_some());
        assert!(page.data[1].create_date.is_none());
    }

    #[test]
    fn find_ticket_matches_exact_id() {
        let page: SayoriTicketPage = serde_json::from_str(PAGE).unwrap();
        assert_eq!(
            find_ticket(&page.data, "B-2").map(|t| t.bot_user_id.as_str()),
            Some("U9")
        );
        assert!(find_ticket(&page.data, "b-2").is_none());
    }

    #[test]
    fn null_fields_decode_as_empty_values() {
        let payload = r#"{"data": [
            {"id": null, "link": "https://jira.example.com/browse/A-1", "estimate": null,
             "dificulty": null, "ticket": "A-1", "bot_user_id": "U1", "comments": null,
             "create_date": null,
             "BotUser": {"user_id": "U1", "picture": null, "display_name": "alice"}},
            {"ticket": "B-2", "bot_user_id": null, "BotUser": null}
        ]}"#;

        let page: SayoriTicketPage = serde_json::from_str(payload).unwrap();
        assert_eq!(page.data.len(), 2);
        let first = &page.data[0];
        assert_eq!(first.comments, "");
        assert_eq!(first.estimate, 0.0);
        assert_eq!(first.difficulty, 0);
        assert_eq!(first.bot_user.picture, "");
        assert_eq!(first.bot_user.display_name, "alice");
        assert!(first.create_date.is_none());
        let second = &page.data[1];
        assert_eq!(second.bot_user_id, "");
        assert_eq!(second.bot_user.display_name, "");
    }

    #[test]
    fn null_data_is_an_empty_listing() {
        let page: SayoriTicketPage = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(page.data.is_empty());
    }
}
