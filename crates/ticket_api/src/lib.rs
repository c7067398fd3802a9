//! Typed clients for the Sayori assignment API and the Jira issue API.

pub mod client;
pub mod config;
pub mod error;
pub mod jira;
pub mod models;
pub mod rate_limiter;
pub mod sayori;
pub mod timestamp;

pub use client::ApiClient;
pub use config::{AuthScheme, ClientConfig};
pub use error::{FetchError, Result};
pub use jira::JiraClient;
pub use models::{
    find_ticket, BotUser, JiraComment, JiraCommentPage, JiraIssue, JiraIssueFields, JiraUser,
    SayoriTicket, SayoriTicketPage,
};
pub use sayori::{SayoriClient, DEFAULT_PROJECT};
pub use timestamp::{parse_timestamp, TimestampLayout, TimestampParseError};
