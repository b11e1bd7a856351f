use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, DeleteRequest, KeySchemaElement, KeyType,
    PutRequest, ScalarAttributeType, TableStatus, WriteRequest,
};
use aws_sdk_dynamodb::Client;
use path_matrix_core::contract::{
    DistanceRow, RowKey, DESTINATION_ATTRIBUTE, DISTANCE_ATTRIBUTE, SOURCE_ATTRIBUTE,
};
use path_matrix_core::store::{DistanceTableStore, StoreError, TableHandle, TableProvision};

type Item = HashMap<String, AttributeValue>;

const TABLE_POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_BATCH_WRITE_ATTEMPTS: u32 = 5;
const UNPROCESSED_BACKOFF_BASE: Duration = Duration::from_millis(50);

/// [`DistanceTableStore`] backed by a DynamoDB table with `source` as the
/// partition key and `destination` as the sort key.
///
/// The trait is synchronous; SDK calls are driven on the ambient tokio
/// runtime, which therefore has to be multi-threaded.
#[derive(Debug, Clone)]
pub struct DynamoDbTableStore {
    client: Client,
    table_ready_timeout: Duration,
}

impl DynamoDbTableStore {
    pub fn new(client: Client, table_ready_timeout: Duration) -> Self {
        Self {
            client,
            table_ready_timeout,
        }
    }

    async fn create_table(&self, name: &str) -> Result<TableProvision, StoreError> {
        let unavailable = |message: String| StoreError::Unavailable {
            table: name.to_string(),
            message,
        };

        let partition_key = KeySchemaElement::builder()
            .attribute_name(SOURCE_ATTRIBUTE)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|error| unavailable(error.to_string()))?;
        let sort_key = KeySchemaElement::builder()
            .attribute_name(DESTINATION_ATTRIBUTE)
            .key_type(KeyType::Range)
            .build()
            .map_err(|error| unavailable(error.to_string()))?;
        let source_definition = AttributeDefinition::builder()
            .attribute_name(SOURCE_ATTRIBUTE)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|error| unavailable(error.to_string()))?;
        let destination_definition = AttributeDefinition::builder()
            .attribute_name(DESTINATION_ATTRIBUTE)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|error| unavailable(error.to_string()))?;

        let result = self
            .client
            .create_table()
            .table_name(name)
            .key_schema(partition_key)
            .key_schema(sort_key)
            .attribute_definitions(source_definition)
            .attribute_definitions(destination_definition)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;

        let handle = TableHandle::new(name);
        let provision = match result {
            Ok(_) => TableProvision::Created(handle),
            Err(error)
                if error
                    .as_service_error()
                    .map(|service_error| service_error.is_resource_in_use_exception())
                    .unwrap_or(false) =>
            {
                TableProvision::AlreadyExists(handle)
            }
            Err(error) => return Err(unavailable(DisplayErrorContext(&error).to_string())),
        };

        // A racing creator may still be in CREATING; wait in both cases.
        self.wait_until_active(name).await?;
        Ok(provision)
    }

    async fn wait_until_active(&self, name: &str) -> Result<(), StoreError> {
        let deadline = tokio::time::Instant::now() + self.table_ready_timeout;
        loop {
            let output = self
                .client
                .describe_table()
                .table_name(name)
                .send()
                .await
                .map_err(|error| StoreError::Unavailable {
                    table: name.to_string(),
                    message: DisplayErrorContext(&error).to_string(),
                })?;

            let status = output.table().and_then(|table| table.table_status());
            if status == Some(&TableStatus::Active) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(StoreError::TableNotReady {
                    table: name.to_string(),
                    waited_secs: self.table_ready_timeout.as_secs(),
                });
            }
            tokio::time::sleep(TABLE_POLL_INTERVAL).await;
        }
    }

    async fn scan_rows(&self, name: &str) -> Result<Vec<DistanceRow>, StoreError> {
        let mut rows = Vec::new();
        let mut exclusive_start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(name)
                .consistent_read(true)
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await
                .map_err(|error| StoreError::Request {
                    table: name.to_string(),
                    operation: "scan",
                    message: DisplayErrorContext(&error).to_string(),
                })?;

            for item in output.items() {
                rows.push(decode_row(name, item)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key.clone()),
                _ => return Ok(rows),
            }
        }
    }

    /// Sends one `BatchWriteItem`, resending unprocessed items with a short
    /// backoff until they drain or the attempts run out.
    async fn batch_write(
        &self,
        name: &str,
        operation: &'static str,
        requests: Vec<WriteRequest>,
    ) -> Result<(), StoreError> {
        let mut pending = requests;

        for attempt in 0..MAX_BATCH_WRITE_ATTEMPTS {
            if pending.is_empty() {
                return Ok(());
            }
            if attempt > 0 {
                tokio::time::sleep(UNPROCESSED_BACKOFF_BASE * 2u32.pow(attempt - 1)).await;
            }

            let output = self
                .client
                .batch_write_item()
                .request_items(name, std::mem::take(&mut pending))
                .send()
                .await
                .map_err(|error| StoreError::Request {
                    table: name.to_string(),
                    operation,
                    message: DisplayErrorContext(&error).to_string(),
                })?;

            pending = output
                .unprocessed_items()
                .and_then(|unprocessed| unprocessed.get(name))
                .cloned()
                .unwrap_or_default();
        }

        if pending.is_empty() {
            return Ok(());
        }
        Err(StoreError::PartialWrite {
            table: name.to_string(),
            operation,
            unprocessed: pending.len(),
        })
    }
}

impl DistanceTableStore for DynamoDbTableStore {
    fn ensure_table(&self, name: &str) -> Result<TableProvision, StoreError> {
        block_on(self.create_table(name))
    }

    fn scan_all(&self, table: &TableHandle) -> Result<Vec<DistanceRow>, StoreError> {
        block_on(self.scan_rows(table.name()))
    }

    fn batch_delete(&self, table: &TableHandle, keys: &[RowKey]) -> Result<(), StoreError> {
        let requests = keys
            .iter()
            .map(|key| {
                DeleteRequest::builder()
                    .set_key(Some(encode_key(key)))
                    .build()
                    .map(|delete| WriteRequest::builder().delete_request(delete).build())
                    .map_err(|error| StoreError::Request {
                        table: table.name().to_string(),
                        operation: "batch_delete",
                        message: error.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        block_on(self.batch_write(table.name(), "batch_delete", requests))
    }

    fn batch_put(&self, table: &TableHandle, rows: &[DistanceRow]) -> Result<(), StoreError> {
        let requests = rows
            .iter()
            .map(|row| {
                PutRequest::builder()
                    .set_item(Some(encode_row(row)))
                    .build()
                    .map(|put| WriteRequest::builder().put_request(put).build())
                    .map_err(|error| StoreError::Request {
                        table: table.name().to_string(),
                        operation: "batch_put",
                        message: error.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        block_on(self.batch_write(table.name(), "batch_put", requests))
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

fn encode_key(key: &RowKey) -> Item {
    HashMap::from([
        (
            SOURCE_ATTRIBUTE.to_string(),
            AttributeValue::S(key.source.clone()),
        ),
        (
            DESTINATION_ATTRIBUTE.to_string(),
            AttributeValue::S(key.destination.clone()),
        ),
    ])
}

fn encode_row(row: &DistanceRow) -> Item {
    let mut item = encode_key(&row.key());
    item.insert(
        DISTANCE_ATTRIBUTE.to_string(),
        AttributeValue::N(row.distance.to_string()),
    );
    item
}

fn decode_row(table: &str, item: &Item) -> Result<DistanceRow, StoreError> {
    let decode_error = |message: String| StoreError::Decode {
        table: table.to_string(),
        message,
    };
    let string_attribute = |name: &str| {
        item.get(name)
            .and_then(|value| value.as_s().ok())
            .cloned()
            .ok_or_else(|| decode_error(format!("missing string attribute '{name}'")))
    };

    let source = string_attribute(SOURCE_ATTRIBUTE)?;
    let destination = string_attribute(DESTINATION_ATTRIBUTE)?;
    let distance = item
        .get(DISTANCE_ATTRIBUTE)
        .and_then(|value| value.as_n().ok())
        .ok_or_else(|| decode_error(format!("missing number attribute '{DISTANCE_ATTRIBUTE}'")))?
        .parse::<i64>()
        .map_err(|error| decode_error(format!("invalid '{DISTANCE_ATTRIBUTE}': {error}")))?;

    Ok(DistanceRow {
        source,
        destination,
        distance,
    })
}
