use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use tracing::info;

use authbook_shared::asset_user::{
    AssetUser, AssetUserAuthInfo, AssetUserExport, AssetUserPushRequest, CreateAssetUserRequest,
    OneOrMany, UpdateConnectivityBody,
};
use authbook_shared::validation::FieldErrors;

use crate::models::asset_user::{ValidateRequest, ValidatedAssetUser, asset_does_not_exist};
use crate::models::auth_book::{AuthBookDoc, AuthBookFilter};
use crate::response::{
    ResponsePagination, ServerAppResult, ServerError, ServerResponse, ServerResult,
};
use crate::util::app_state::AppState;
use crate::util::json::{decode_body, decode_object, extract_json};
use crate::util::org::OrgScope;
use crate::util::pagination::RequestPagination;

pub fn create_route() -> Router<AppState> {
    Router::new()
        .route("/", get(get_asset_users).post(create_asset_users))
        .route("/export", get(export_asset_users))
        .route("/push", post(push_asset_user))
        .route("/{id}", get(get_asset_user).delete(delete_asset_user))
        .route("/{id}/auth-info", get(get_auth_info))
        .route("/{id}/history", get(get_history))
        .route("/{id}/connectivity", post(update_connectivity))
}

fn parse_id(id: &str) -> Result<ObjectId, ServerError> {
    ObjectId::parse_str(id).map_err(|_| ServerError::bad_request("Invalid ObjectId"))
}

async fn get_asset_users(
    State(state): State<AppState>,
    org: OrgScope,
    pagination: RequestPagination,
    Query(filter): Query<AuthBookFilter>,
) -> ServerAppResult<Vec<AssetUser>> {
    let (books, total_count) = state
        .manager
        .list(org.as_str(), &filter, &pagination)
        .await?;

    Ok(ServerResponse::builder()
        .body(AuthBookDoc::to_asset_users(books))
        .ok()
        .pagination(ResponsePagination {
            count: total_count,
            offset: pagination.offset,
            limit: pagination.limit,
        })
        .build())
}

async fn export_asset_users(
    State(state): State<AppState>,
    org: OrgScope,
    pagination: RequestPagination,
    Query(filter): Query<AuthBookFilter>,
) -> ServerAppResult<Vec<AssetUserExport>> {
    let (books, total_count) = state
        .manager
        .list(org.as_str(), &filter, &pagination)
        .await?;
    info!("Exporting {} credentials", books.len());

    Ok(ServerResponse::builder()
        .body(books.iter().map(|b| b.to_export()).collect())
        .ok()
        .pagination(ResponsePagination {
            count: total_count,
            offset: pagination.offset,
            limit: pagination.limit,
        })
        .build())
}

/// Accepts one payload or a list. A list is validated as a whole, asset
/// lookups included, before anything is written; its errors come back in
/// request order.
async fn create_asset_users(
    State(state): State<AppState>,
    org: OrgScope,
    body: Result<Json<OneOrMany<Value>>, JsonRejection>,
) -> ServerAppResult<OneOrMany<AssetUser>> {
    let payload = extract_json(body)?;
    let many = payload.is_many();
    let items = payload.into_vec();

    let mut validated = Vec::with_capacity(items.len());
    let mut errors = Vec::with_capacity(items.len());
    for item in items {
        match check_create(&state, org.as_str(), item).await? {
            Ok(user) => {
                validated.push(user);
                errors.push(FieldErrors::new());
            }
            Err(e) => errors.push(e),
        }
    }
    if errors.iter().any(|e| !e.is_empty()) {
        return Err(match many {
            true => ServerError::BulkValidation(errors),
            false => ServerError::Validation(errors.pop().unwrap_or_default()),
        });
    }

    let mut created = Vec::with_capacity(validated.len());
    for user in validated {
        let book = state.manager.create(user.into_create(org.as_str())).await?;
        created.push(book.to_asset_user());
    }

    let body = match many {
        true => OneOrMany::Many(created),
        false => match created.pop() {
            Some(user) => OneOrMany::One(user),
            None => return Err(ServerError::internal_error("No credential created")),
        },
    };

    Ok(ServerResponse::builder().body(body).created().build())
}

/// Field checks for one create item, then the asset lookup. Store failures
/// abort the request; everything else lands in the item's errors.
async fn check_create(
    state: &AppState,
    org_id: &str,
    item: Value,
) -> ServerResult<Result<ValidatedAssetUser, FieldErrors>> {
    let user = match decode_object::<CreateAssetUserRequest>(item).and_then(|r| r.validate()) {
        Ok(user) => user,
        Err(errors) => return Ok(Err(errors)),
    };
    match state.manager.find_asset(org_id, &user.asset).await? {
        Some(_) => Ok(Ok(user)),
        None => Ok(Err(FieldErrors::single(
            "asset",
            asset_does_not_exist(&user.asset),
        ))),
    }
}

async fn get_asset_user(
    State(state): State<AppState>,
    org: OrgScope,
    Path(id): Path<String>,
) -> ServerAppResult<AssetUser> {
    let book = state.manager.get(org.as_str(), &parse_id(&id)?).await?;
    Ok(ServerResponse::builder()
        .body(book.to_asset_user())
        .ok()
        .build())
}

async fn delete_asset_user(
    State(state): State<AppState>,
    org: OrgScope,
    Path(id): Path<String>,
) -> ServerAppResult<()> {
    state.manager.delete(org.as_str(), &parse_id(&id)?).await?;
    Ok(ServerResponse::builder().no_content().build())
}

async fn get_auth_info(
    State(state): State<AppState>,
    org: OrgScope,
    Path(id): Path<String>,
) -> ServerAppResult<AssetUserAuthInfo> {
    let info = state
        .manager
        .auth_info(org.as_str(), &parse_id(&id)?)
        .await?;
    Ok(ServerResponse::builder().body(info).ok().build())
}

async fn get_history(
    State(state): State<AppState>,
    org: OrgScope,
    Path(id): Path<String>,
) -> ServerAppResult<Vec<AssetUser>> {
    let books = state.manager.history(org.as_str(), &parse_id(&id)?).await?;
    Ok(ServerResponse::builder()
        .body(AuthBookDoc::to_asset_users(books))
        .ok()
        .build())
}

async fn update_connectivity(
    State(state): State<AppState>,
    org: OrgScope,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ServerAppResult<AssetUser> {
    let payload: UpdateConnectivityBody = decode_body(body)?;
    let book = state
        .manager
        .set_connectivity(org.as_str(), &parse_id(&id)?, payload.connectivity)
        .await?;
    Ok(ServerResponse::builder()
        .body(book.to_asset_user())
        .ok()
        .build())
}

/// Validates a push request and acknowledges it with 202. Nothing is sent
/// to the host.
async fn push_asset_user(
    State(state): State<AppState>,
    org: OrgScope,
    body: Result<Json<Value>, JsonRejection>,
) -> ServerAppResult<AssetUserPushRequest> {
    let payload: AssetUserPushRequest = decode_body(body)?;
    let push = payload.validate()?;
    let asset = state.manager.require_asset(org.as_str(), &push.asset).await?;
    info!("Accepted push of {} to {}", push.username, asset.hostname);

    Ok(ServerResponse::builder()
        .body(AssetUserPushRequest {
            asset: Some(push.asset.to_hex()),
            username: Some(push.username),
        })
        .accepted()
        .build())
}
