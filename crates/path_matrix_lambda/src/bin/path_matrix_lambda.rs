use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use path_matrix_core::contract::RefreshResponse;
use path_matrix_lambda::adapters::dynamodb::DynamoDbTableStore;
use path_matrix_lambda::config::HandlerConfig;
use path_matrix_lambda::handlers::refresh::{handle_refresh_event, PathTableRefresher};
use path_matrix_lambda::logging::init_logging;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let config = HandlerConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoDbTableStore::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        config.table_ready_timeout,
    );
    let refresher = Arc::new(PathTableRefresher::new(store, config));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let refresher = Arc::clone(&refresher);
        async move {
            Ok::<RefreshResponse, Error>(handle_refresh_event(event.payload, &*refresher))
        }
    }))
    .await
}
