//! Persistence of reconciled comments.
//!
//! Sinks receive already-namespaced ticket keys; [`persist_result`] is the
//! caller-side loop that builds them.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use thiserror::Error;

use crate::config::AppConfig;
use crate::reconcile::{IdentityIndex, ReconciliationResult};

pub const TICKET_KEY_PREFIX: &str = "#TICKET#";
pub const PARTITION_KEY: &str = "pk";
pub const SORT_KEY: &str = "sk";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dynamodb error: {0}")]
    Dynamo(String),
    #[error("table provisioning is only available in local mode (IS_LOCAL=True)")]
    NotLocal,
}

/// Destination for reconciled comments, one item per (user id, ticket key).
#[async_trait]
pub trait CommentSink: Send + Sync {
    async fn store(
        &self,
        user_id: &str,
        ticket_key: &str,
        summary: &str,
        comment: &str,
    ) -> Result<(), StoreError>;
}

/// Sort key for a ticket item: the ticket id behind the `#TICKET#` namespace.
pub fn ticket_sort_key(ticket_id: &str) -> String {
    format!("{TICKET_KEY_PREFIX}{ticket_id}")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub stored: usize,
    pub failed: usize,
}

/// Writes every entry of `result`, keyed by the user's Sayori id when known.
///
/// A failed write is logged and counted; remaining entries are still written.
pub async fn persist_result<S>(
    result: &ReconciliationResult,
    index: &IdentityIndex,
    sink: &S,
) -> PersistSummary
where
    S: CommentSink + ?Sized,
{
    let mut summary = PersistSummary::default();
    for entry in result.entries() {
        let user_id = match index.get(&entry.user_identity) {
            Some(id) if !id.is_empty() => id.as_str(),
            _ => {
                warn!(
                    "No Sayori id for user {}, storing under display name",
                    entry.user_identity
                );
                entry.user_identity.as_str()
            }
        };
        let ticket_key = ticket_sort_key(&entry.ticket_id);
        match sink
            .store(user_id, &ticket_key, &entry.summary, &entry.comment)
            .await
        {
            Ok(()) => summary.stored += 1,
            Err(err) => {
                warn!(
                    "Failed to store comment for {} on {}: {}",
                    entry.user_identity, entry.ticket_id, err
                );
                summary.failed += 1;
            }
        }
    }
    info!(
        "Persisted {} comments ({} failed)",
        summary.stored, summary.failed
    );
    summary
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created,
    AlreadyExists,
}

#[derive(Clone)]
pub struct DynamoSink {
    client: DynamoClient,
    table_name: String,
    is_local: bool,
}

impl DynamoSink {
    /// Loads AWS settings for the configured region, using the explicit endpoint when set.
    pub async fn connect(config: &AppConfig) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&shared);
        if let Some(endpoint) = &config.dynamodb_endpoint {
            info!("Using DynamoDB endpoint {}", endpoint);
            builder = builder.endpoint_url(endpoint.clone());
        }
        Self {
            client: DynamoClient::from_conf(builder.build()),
            table_name: config.settings.table_name.clone(),
            is_local: config.is_local,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Creates the comments table with string `pk`/`sk` keys unless it already exists.
    ///
    /// Only permitted against a local endpoint.
    pub async fn provision_table(&self) -> Result<ProvisionOutcome, StoreError> {
        if !self.is_local {
            return Err(StoreError::NotLocal);
        }

        match self
            .client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
        {
            Ok(_) => {
                info!("Table {} already exists", self.table_name);
                return Ok(ProvisionOutcome::AlreadyExists);
            }
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .map(|service| service.is_resource_not_found_exception())
                    .unwrap_or(false);
                if !missing {
                    return Err(StoreError::Dynamo(DisplayErrorContext(&err).to_string()));
                }
            }
        }

        self.client
            .create_table()
            .table_name(&self.table_name)
            .key_schema(key_element(PARTITION_KEY, KeyType::Hash)?)
            .key_schema(key_element(SORT_KEY, KeyType::Range)?)
            .attribute_definitions(string_attribute(PARTITION_KEY)?)
            .attribute_definitions(string_attribute(SORT_KEY)?)
            .provisioned_throughput(
                ProvisionedThroughput::builder()
                    .read_capacity_units(5)
                    .write_capacity_units(5)
                    .build()
                    .map_err(|err| StoreError::Dynamo(err.to_string()))?,
            )
            .send()
            .await
            .map_err(|err| StoreError::Dynamo(DisplayErrorContext(&err).to_string()))?;

        info!("Created table {}", self.table_name);
        Ok(ProvisionOutcome::Created)
    }
}

#[async_trait]
impl CommentSink for DynamoSink {
    async fn store(
        &self,
        user_id: &str,
        ticket_key: &str,
        summary: &str,
        comment: &str,
    ) -> Result<(), StoreError> {
        let item = comment_item(user_id, ticket_key, summary, comment, Utc::now());
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| StoreError::Dynamo(DisplayErrorContext(&err).to_string()))?;
        Ok(())
    }
}

/// Item written per comment. `summary` is always present, empty when unknown.
pub fn comment_item(
    user_id: &str,
    ticket_key: &str,
    summary: &str,
    comment: &str,
    now: DateTime<Utc>,
) -> HashMap<String, AttributeValue> {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    HashMap::from([
        (PARTITION_KEY.to_string(), AttributeValue::S(user_id.to_string())),
        (SORT_KEY.to_string(), AttributeValue::S(ticket_key.to_string())),
        ("summary".to_string(), AttributeValue::S(summary.to_string())),
        ("comments".to_string(), AttributeValue::S(comment.to_string())),
        ("created_at".to_string(), AttributeValue::S(stamp.clone())),
        ("updated_at".to_string(), AttributeValue::S(stamp)),
    ])
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement, StoreError> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|err| StoreError::Dynamo(err.to_string()))
}

fn string_attribute(name: &str) -> Result<AttributeDefinition, StoreError> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|err| StoreError::Dynamo(err.to_string()))
}
