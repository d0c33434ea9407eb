use std::{env, sync::Arc};
use cqrs_es::{persist::PersistedEventStore, CqrsFramework};
use dynamo_es::{DynamoEventRepository, DynamoViewRepository};
use super::{view::Repository, Medication, Query, Services};

pub type Framework =
    CqrsFramework<Medication, PersistedEventStore<DynamoEventRepository, Medication>>;

pub fn init(client: aws_sdk_dynamodb::Client, repo: Repository) -> Arc<Framework> {
    let event_log_table = env::var("DYNAMODB_EVENT_LOG_TABLE")
        .unwrap_or("medireminder-event-log".to_string());

    let event_snapshots_table = env::var("DYNAMODB_EVENT_SNAPSHOTS_TABLE")
        .unwrap_or("medireminder-event-snapshots".to_string());

    let store: PersistedEventStore<DynamoEventRepository, Medication> =
        PersistedEventStore::new_snapshot_store(
            DynamoEventRepository::new(client)
                .with_tables(&event_log_table, &event_snapshots_table),
            5,
        );

    let query = Box::new(Query::new(repo));

    Arc::new(CqrsFramework::new(store, vec![query], Services::default()))
}

pub fn init_repo(client: aws_sdk_dynamodb::Client) -> Repository {
    let view_table = env::var("DYNAMODB_MEDICATIONS_VIEW_TABLE")
        .unwrap_or("medireminder-medications-view".to_string());

    Arc::new(Box::new(DynamoViewRepository::new(&view_table, client)))
}
