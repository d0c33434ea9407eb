use aws_config::BehaviorVersion;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use cqrs_es::AggregateError;
use domain::{
    medications::{self, MedicationIndex},
    schedule::{MedicationDueQuery, ReportScope},
};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use ulid::Ulid;

/// Set by the upstream authorizer to the authenticated user's id.
const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
struct AppState {
    medications_repo: medications::view::Repository,
    medications_cqrs: Arc<medications::cqrs::Framework>,
    medications_index: MedicationIndex,
    s3_client: aws_sdk_s3::Client,
}

type ApiError = (StatusCode, String);

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&config);
    let s3_client = aws_sdk_s3::Client::new(&config);

    let medications_repo = medications::cqrs::init_repo(dynamodb_client.clone());
    let medications_cqrs =
        medications::cqrs::init(dynamodb_client.clone(), medications_repo.clone());
    let medications_index = MedicationIndex::init(dynamodb_client);

    let state = AppState {
        medications_repo,
        medications_cqrs,
        medications_index,
        s3_client,
    };

    let app = Router::new()
        .route("/medications", post(create_medication).get(list_medications))
        .route("/medications/filter", get(list_due_medications))
        .route(
            "/medications/:id",
            get(get_medication)
                .put(update_medication)
                .delete(delete_medication),
        )
        .route("/medications/:id/photo/upload-url", post(get_photo_upload_url))
        .with_state(state);

    let app = tower::ServiceBuilder::new()
        .layer(axum_aws_lambda::LambdaLayer::default())
        .service(app);

    lambda_http::run(app).await?;
    Ok(())
}

/// Authenticated caller, read from the authorizer header
struct CurrentUser(String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| CurrentUser(value.to_string()))
            .ok_or((StatusCode::UNAUTHORIZED, "User not authenticated".to_string()))
    }
}

fn domain_error(err: domain::Error) -> ApiError {
    let status = match &err {
        domain::Error::Validation { .. } => StatusCode::BAD_REQUEST,
        domain::Error::NotFound { .. } => StatusCode::NOT_FOUND,
        domain::Error::Forbidden => StatusCode::FORBIDDEN,
        domain::Error::Uniqueness { .. } => StatusCode::CONFLICT,
        domain::Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn command_error(err: AggregateError<domain::Error>) -> ApiError {
    match err {
        AggregateError::UserError(err) => domain_error(err),
        err => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

async fn execute(
    state: &AppState,
    id: &str,
    command: medications::Command,
) -> Result<(), ApiError> {
    let mut metadata = HashMap::new();
    metadata.insert("command_id".to_string(), Ulid::new().to_string());

    state
        .medications_cqrs
        .execute_with_metadata(id, command, metadata)
        .await
        .map_err(command_error)
}

async fn load_view(state: &AppState, id: &str) -> Result<medications::View, ApiError> {
    state
        .medications_repo
        .load(id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .filter(|view| !view.medication.deleted)
        .ok_or((StatusCode::NOT_FOUND, "Medication not found".to_string()))
}

/// Loads the medication and checks the caller owns it.
async fn load_owned(
    state: &AppState,
    id: &str,
    user_id: &str,
) -> Result<medications::View, ApiError> {
    let view = load_view(state, id).await?;
    if !view.medication.is_owned_by(user_id) {
        return Err((
            StatusCode::FORBIDDEN,
            "You are not authorized to access this medication".to_string(),
        ));
    }
    Ok(view)
}

// Create medication
async fn create_medication(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<medications::inputs::CreateMedicationInput>,
) -> Result<impl IntoResponse, ApiError> {
    let aggregate_id = Ulid::new().to_string();

    let command = medications::Command::CreateMedication {
        id: aggregate_id.clone(),
        user_id: Some(user_id),
        details: input.into(),
    };

    execute(&state, &aggregate_id, command).await?;

    let view = load_view(&state, &aggregate_id).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

// List the caller's medications
async fn list_medications(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let medications = state
        .medications_index
        .list_for_user(&user_id)
        .await
        .map_err(domain_error)?;

    Ok(Json(medications))
}

#[derive(Debug, Deserialize)]
struct DueFilter {
    filter: Option<String>,
}

// List medications due now within today / this week / this month
async fn list_due_medications(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<DueFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = parse_scope(params.filter.as_deref()).map_err(domain_error)?;

    let due = MedicationDueQuery::new(state.medications_index.clone())
        .run(&user_id, scope, &chrono::Local::now())
        .await
        .map_err(domain_error)?;

    Ok(Json(due))
}

/// An absent filter means today; anything unrecognised is rejected.
fn parse_scope(filter: Option<&str>) -> Result<ReportScope, domain::Error> {
    filter
        .map(str::parse::<ReportScope>)
        .transpose()
        .map(Option::unwrap_or_default)
}

// Get medication
async fn get_medication(
    Path(id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let view = load_owned(&state, &id, &user_id).await?;

    Ok(Json(view))
}

// Update medication
async fn update_medication(
    Path(id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<medications::inputs::UpdateMedicationInput>,
) -> Result<impl IntoResponse, ApiError> {
    load_owned(&state, &id, &user_id).await?;

    let command = medications::Command::UpdateMedication {
        changes: input.into(),
    };

    execute(&state, &id, command).await?;

    let view = load_view(&state, &id).await?;

    Ok(Json(view))
}

// Delete medication
async fn delete_medication(
    Path(id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    load_owned(&state, &id, &user_id).await?;

    execute(&state, &id, medications::Command::DeleteMedication).await?;

    Ok(StatusCode::NO_CONTENT)
}

// Get S3 presigned URL for a medication photo
async fn get_photo_upload_url(
    Path(id): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<medications::inputs::UploadPhotoInput>,
) -> Result<impl IntoResponse, ApiError> {
    load_owned(&state, &id, &user_id).await?;

    let bucket = std::env::var("MEDICATION_PHOTOS_BUCKET")
        .unwrap_or("medireminder-medication-photos".to_string());

    let photo_id = Ulid::new().to_string();
    let key = format!("medications/{}/{}", id, photo_id);

    let presigning_config =
        aws_sdk_s3::presigning::PresigningConfig::expires_in(std::time::Duration::from_secs(3600))
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let presigned = state
        .s3_client
        .put_object()
        .bucket(&bucket)
        .key(&key)
        .content_type(&input.content_type)
        .presigned(presigning_config)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(serde_json::json!({
        "upload_url": presigned.uri(),
        "photo_id": photo_id,
        "key": key,
    })))
}
