use aws_config::BehaviorVersion;
use aws_lambda_events::event::s3::S3Event;
use cqrs_es::AggregateError;
use domain::medications::{self, cqrs::Framework};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::collections::HashMap;
use ulid::Ulid;

const PHOTOS_PREFIX: &str = "medications";

/// Extracts the medication id from `medications/{medication_id}/{photo_id}`.
fn medication_id_from_key(key: &str) -> Option<&str> {
    let mut parts = key.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(PHOTOS_PREFIX), Some(id), Some(photo)) if !id.is_empty() && !photo.is_empty() => {
            Some(id)
        }
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&config);

    let medications_repo = medications::cqrs::init_repo(dynamodb_client.clone());
    let medications_cqrs = medications::cqrs::init(dynamodb_client, medications_repo);

    lambda_runtime::run(service_fn(|event: LambdaEvent<S3Event>| async {
        handle(event, &medications_cqrs).await
    }))
    .await
}

async fn handle(event: LambdaEvent<S3Event>, cqrs: &Framework) -> Result<(), Error> {
    tracing::info!("Processing {} S3 records", event.payload.records.len());

    for record in event.payload.records {
        let bucket = record.s3.bucket.name.ok_or("Missing bucket name")?;
        let key = record.s3.object.key.ok_or("Missing object key")?;

        tracing::info!("New file uploaded: s3://{}/{}", bucket, key);

        let Some(medication_id) = medication_id_from_key(&key) else {
            tracing::warn!("Invalid S3 key format: {}", key);
            continue;
        };

        let mut metadata = HashMap::new();
        metadata.insert("command_id".to_string(), Ulid::new().to_string());

        let command = medications::Command::AttachPhoto {
            photo_url: format!("s3://{}/{}", bucket, key),
        };

        match cqrs
            .execute_with_metadata(medication_id, command, metadata)
            .await
        {
            Ok(()) => tracing::info!("Photo attached to {}", medication_id),
            // Deleted or unknown medications will never accept the photo, retrying is pointless
            Err(AggregateError::UserError(err)) => {
                tracing::warn!("Photo for {} rejected: {}", medication_id, err)
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
