//! Catalog, search and inventory endpoints.
//!
//! ```text
//! GET    /api/sweets               list (public)
//! POST   /api/sweets               create (admin)
//! GET    /api/sweets/search        search (public)
//! GET    /api/sweets/:id           get (public)
//! PUT    /api/sweets/:id           update (admin)
//! DELETE /api/sweets/:id           delete (admin)
//! POST   /api/sweets/:id/purchase  purchase (authenticated)
//! POST   /api/sweets/:id/restock   restock (admin)
//! ```

use crate::error::AppError;
use crate::extractors::{AdminCaller, Caller};
use crate::WebResult;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use sweet_shop_core::{
    Catalog, CatalogError, Quantity, SearchParams, SearchResults, Sweet, SweetDraft, SweetId,
};

/// `{ message, sweet }`
#[derive(Debug, Serialize)]
pub struct SweetMessage {
    /// What happened.
    pub message: &'static str,
    /// The record after the change.
    pub sweet: Sweet,
}

/// `{ sweet }`
#[derive(Debug, Serialize)]
pub struct SweetBody {
    /// The record.
    pub sweet: Sweet,
}

/// `{ sweets }`
#[derive(Debug, Serialize)]
pub struct SweetList {
    /// Every record, in creation order.
    pub sweets: Vec<Sweet>,
}

/// `{ message }`
#[derive(Debug, Serialize)]
pub struct MessageBody {
    /// What happened.
    pub message: &'static str,
}

/// Path IDs that do not parse cannot name a record.
fn parse_id(raw: &str) -> WebResult<SweetId> {
    raw.parse()
        .map_err(|_| AppError::not_found("Sweet not found"))
}

/// `POST /api/sweets`
///
/// # Errors
///
/// 400 on validation failure, 401/403 for non-admins.
pub async fn create_sweet(
    State(catalog): State<Arc<Catalog>>,
    AdminCaller(admin): AdminCaller,
    payload: Result<Json<SweetDraft>, JsonRejection>,
) -> WebResult<(StatusCode, Json<SweetMessage>)> {
    let Json(draft) = payload?;
    let sweet = catalog.create(&admin, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(SweetMessage {
            message: "Sweet created",
            sweet,
        }),
    ))
}

/// `GET /api/sweets`
///
/// # Errors
///
/// 500 on store failure.
pub async fn list_sweets(State(catalog): State<Arc<Catalog>>) -> WebResult<Json<SweetList>> {
    let sweets = catalog.list().await?;
    Ok(Json(SweetList { sweets }))
}

/// `GET /api/sweets/:id`
///
/// # Errors
///
/// 404 when the record does not exist.
pub async fn get_sweet(
    State(catalog): State<Arc<Catalog>>,
    Path(id): Path<String>,
) -> WebResult<Json<SweetBody>> {
    let sweet = catalog.get(parse_id(&id)?).await?;
    Ok(Json(SweetBody { sweet }))
}

/// `PUT /api/sweets/:id`
///
/// # Errors
///
/// 400 on validation failure, 404 for unknown IDs, 401/403 for non-admins.
pub async fn update_sweet(
    State(catalog): State<Arc<Catalog>>,
    AdminCaller(admin): AdminCaller,
    Path(id): Path<String>,
    payload: Result<Json<SweetDraft>, JsonRejection>,
) -> WebResult<Json<SweetMessage>> {
    let Json(draft) = payload?;
    let id = parse_id(&id)?;
    let sweet = catalog.update(&admin, id, draft).await?;
    Ok(Json(SweetMessage {
        message: "Sweet updated",
        sweet,
    }))
}

/// `DELETE /api/sweets/:id`
///
/// # Errors
///
/// 404 for unknown IDs, 401/403 for non-admins.
pub async fn delete_sweet(
    State(catalog): State<Arc<Catalog>>,
    AdminCaller(admin): AdminCaller,
    Path(id): Path<String>,
) -> WebResult<Json<MessageBody>> {
    catalog.delete(&admin, parse_id(&id)?).await?;
    Ok(Json(MessageBody {
        message: "Sweet deleted",
    }))
}

/// `GET /api/sweets/search`
///
/// # Errors
///
/// 400 when no usable filter is given or a price bound is malformed.
pub async fn search_sweets(
    State(catalog): State<Arc<Catalog>>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> WebResult<Json<SearchResults>> {
    let Query(pairs) = pairs?;
    let params = SearchParams::from_pairs(pairs);
    Ok(Json(catalog.search(&params).await?))
}

/// `POST /api/sweets/:id/purchase`
///
/// The body is optional. Without one, or without a `quantity` field, one
/// unit is bought.
///
/// # Errors
///
/// 400 for an invalid quantity, and 400 "insufficient stock or sweet not
/// found" when the purchase cannot be applied.
pub async fn purchase_sweet(
    State(catalog): State<Arc<Catalog>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> WebResult<Json<SweetMessage>> {
    let quantity = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| AppError::bad_request(format!("Invalid JSON body: {e}")))?;
        Quantity::from_optional_json(value.get("quantity"))?
    };

    let id: SweetId = id
        .parse()
        .map_err(|_| AppError::from(CatalogError::InsufficientStockOrNotFound))?;

    let sweet = catalog.purchase(&caller, id, quantity).await?;
    Ok(Json(SweetMessage {
        message: "Purchase successful",
        sweet,
    }))
}

/// `POST /api/sweets/:id/restock`
///
/// # Errors
///
/// 400 when `quantity` is missing or not a positive integer, 404 for
/// unknown IDs, 401/403 for non-admins.
pub async fn restock_sweet(
    State(catalog): State<Arc<Catalog>>,
    AdminCaller(admin): AdminCaller,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> WebResult<Json<SweetMessage>> {
    let Json(body) = payload?;
    let quantity = Quantity::from_json(body.get("quantity").unwrap_or(&Value::Null))?;
    let sweet = catalog.restock(&admin, parse_id(&id)?, quantity).await?;
    Ok(Json(SweetMessage {
        message: "Restock successful",
        sweet,
    }))
}
