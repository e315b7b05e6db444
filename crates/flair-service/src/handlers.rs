//! Framework-free route handlers.
//!
//! Each handler takes the caller's external identity (as supplied by the auth
//! layer) plus any path or body input and returns a status code with a JSON body.
//! Reads fail open to an empty list; writes report failures as `{"error": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use flair_core::error::FlairError;
use flair_core::models::collection::{CollectionId, CollectionPatch, NewCollection};
use flair_core::models::product::Product;
use flair_core::models::profile::ProfileId;

use crate::service::FlairService;

/// Status code and JSON body handed back to the web layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
}

impl HandlerResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn unauthorized() -> Self {
        Self::error(401, "unauthorized")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<FlairError> for HandlerResponse {
    fn from(err: FlairError) -> Self {
        let status = match &err {
            FlairError::Validation { .. } => 400,
            FlairError::NotFound { .. } => 404,
            FlairError::StoreUnavailable { .. } => 503,
            _ => 500,
        };
        Self::error(status, err.to_string())
    }
}

/// Body of `POST /collections`, discriminated by `action`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CollectionAction {
    Create(NewCollection),
    AddItem(ItemRef),
    RemoveItem(ItemRef),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub item_id: String,
    pub collection_id: String,
}

/// Resolve the caller or bail out with the right response.
macro_rules! caller {
    ($service:expr, $external_id:expr) => {
        match authenticate($service, $external_id).await {
            Ok(id) => id,
            Err(resp) => return resp,
        }
    };
}

/// The trimmed caller identity, if one was supplied.
fn identity(external_id: Option<&str>) -> Option<&str> {
    external_id.map(str::trim).filter(|id| !id.is_empty())
}

async fn authenticate(
    service: &FlairService,
    external_id: Option<&str>,
) -> Result<ProfileId, HandlerResponse> {
    let external_id = identity(external_id).ok_or_else(HandlerResponse::unauthorized)?;
    service
        .resolve_profile_id(external_id)
        .await
        .map_err(HandlerResponse::from)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, HandlerResponse> {
    serde_json::to_value(value)
        .map_err(|e| HandlerResponse::from(FlairError::Serialization(e.to_string())))
}

fn respond<T: Serialize>(status: u16, result: Result<T, FlairError>) -> HandlerResponse {
    match result.map_err(HandlerResponse::from).and_then(|v| to_json(&v)) {
        Ok(body) => HandlerResponse { status, body },
        Err(resp) => resp,
    }
}

fn parse_collection_id(raw: &str) -> Result<CollectionId, HandlerResponse> {
    raw.trim()
        .parse()
        .map_err(|e: String| HandlerResponse::error(400, e))
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, HandlerResponse> {
    serde_json::from_value(body)
        .map_err(|e| HandlerResponse::error(400, format!("invalid request body: {e}")))
}

/// Read that degrades to an empty list.
fn fail_open<T: Serialize>(what: &'static str, result: Result<Vec<T>, FlairError>) -> HandlerResponse {
    match result {
        Ok(items) => respond(200, Ok::<_, FlairError>(items)),
        Err(e) => {
            warn!(error = %e, "failed to load {what}, returning empty list");
            HandlerResponse::ok(json!([]))
        }
    }
}

/// `GET /collections`
pub async fn get_collections(service: &FlairService, external_id: Option<&str>) -> HandlerResponse {
    let Some(external_id) = identity(external_id) else {
        return HandlerResponse::unauthorized();
    };
    let result = match service.resolve_profile_id(external_id).await {
        Ok(profile_id) => service.list_collections(&profile_id).await,
        Err(e) => Err(e),
    };
    fail_open("collections", result)
}

/// `POST /collections`
pub async fn post_collections(
    service: &FlairService,
    external_id: Option<&str>,
    body: Value,
) -> HandlerResponse {
    let profile_id = caller!(service, external_id);
    let action: CollectionAction = match parse_body(body) {
        Ok(action) => action,
        Err(resp) => return resp,
    };

    match action {
        CollectionAction::Create(new) => match service.create_collection(&profile_id, new).await {
            Ok(collection) => match to_json(&collection) {
                Ok(body) => HandlerResponse::created(body),
                Err(resp) => resp,
            },
            Err(e) => e.into(),
        },
        CollectionAction::AddItem(item) => {
            let collection_id = match parse_collection_id(&item.collection_id) {
                Ok(id) => id,
                Err(resp) => return resp,
            };
            respond(
                200,
                service
                    .add_item_to_collection(&profile_id, &item.item_id, &collection_id)
                    .await,
            )
        }
        CollectionAction::RemoveItem(item) => {
            let collection_id = match parse_collection_id(&item.collection_id) {
                Ok(id) => id,
                Err(resp) => return resp,
            };
            respond(
                200,
                service
                    .remove_item_from_collection(&profile_id, &item.item_id, &collection_id)
                    .await,
            )
        }
    }
}

/// `PATCH /collections/{id}`
pub async fn patch_collection(
    service: &FlairService,
    external_id: Option<&str>,
    collection_id: &str,
    body: Value,
) -> HandlerResponse {
    let profile_id = caller!(service, external_id);
    let collection_id = match parse_collection_id(collection_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let patch: CollectionPatch = match parse_body(body) {
        Ok(patch) => patch,
        Err(resp) => return resp,
    };
    respond(
        200,
        service.update_collection(&profile_id, &collection_id, patch).await,
    )
}

/// `DELETE /collections/{id}`
pub async fn delete_collection(
    service: &FlairService,
    external_id: Option<&str>,
    collection_id: &str,
) -> HandlerResponse {
    let profile_id = caller!(service, external_id);
    let collection_id = match parse_collection_id(collection_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match service.delete_collection(&profile_id, &collection_id).await {
        Ok(()) => HandlerResponse::ok(json!({ "success": true })),
        Err(e) => e.into(),
    }
}

/// `GET /saved-items`
pub async fn get_saved_items(service: &FlairService, external_id: Option<&str>) -> HandlerResponse {
    let Some(external_id) = identity(external_id) else {
        return HandlerResponse::unauthorized();
    };
    let result = match service.resolve_profile_id(external_id).await {
        Ok(profile_id) => service.list_saved_items(&profile_id).await,
        Err(e) => Err(e),
    };
    fail_open("saved items", result)
}

/// `POST /saved-items`, body is the product snapshot.
pub async fn post_saved_item(
    service: &FlairService,
    external_id: Option<&str>,
    body: Value,
) -> HandlerResponse {
    let profile_id = caller!(service, external_id);
    let product: Product = match parse_body(body) {
        Ok(product) => product,
        Err(resp) => return resp,
    };
    match service.add_saved_item(&profile_id, product).await {
        Ok(true) => HandlerResponse::created(json!({ "success": true, "created": true })),
        Ok(false) => HandlerResponse::ok(json!({ "success": true, "created": false })),
        Err(e) => e.into(),
    }
}

/// `DELETE /saved-items/{productId}`
pub async fn delete_saved_item(
    service: &FlairService,
    external_id: Option<&str>,
    product_id: &str,
) -> HandlerResponse {
    let profile_id = caller!(service, external_id);
    match service.remove_saved_item(&profile_id, product_id).await {
        Ok(removed) => HandlerResponse::ok(json!({ "success": true, "removed": removed })),
        Err(e) => e.into(),
    }
}

/// `GET /community/posts?limit=N`. The feed is public and needs no identity.
pub async fn get_community_posts(service: &FlairService, limit: Option<u32>) -> HandlerResponse {
    let limit = limit.unwrap_or(20);
    if limit == 0 {
        return HandlerResponse::error(400, "limit must be positive");
    }
    fail_open("community posts", service.list_community_posts(limit).await)
}
