//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to application use cases.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
    response::IntoResponse,
    routing::{get, post},
};

use crate::application::dto::{
    AllocateRequestDto, AllocateResponseDto, PickListDto, PurchaseOrderDto, RelocateRequestDto,
    RelocateResponseDto, StorageLocationDto, StorageStockDto,
};
use crate::application::ports::{AllocationLogPort, InventoryPort};
use crate::application::use_cases::{
    AllocateItemsUseCase, ListStorageStockUseCase, LookupPurchaseOrderUseCase,
    RelocateStockUseCase, RoutingConfig, StockPickListUseCase,
};
use crate::domain::shared::StorageDeviceId;
use crate::error::AllocationError;
use crate::resilience::PollPolicy;

use super::request::RequestContext;
use super::response::HealthResponse;

/// Application state shared across handlers.
pub struct AppState<P, L>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    /// Use case for allocating PO lines.
    pub allocate_items: Arc<AllocateItemsUseCase<P, L>>,
    /// Use case for looking up a PO.
    pub lookup_purchase_order: Arc<LookupPurchaseOrderUseCase<P>>,
    /// Use case for listing device stock.
    pub list_storage_stock: Arc<ListStorageStockUseCase<P>>,
    /// Use case for moving stock between devices.
    pub relocate_stock: Arc<RelocateStockUseCase<P, L>>,
    /// Use case for the stock pick list.
    pub stock_pick_list: Arc<StockPickListUseCase<P>>,
    /// Storage devices offered to staff.
    pub storage_locations: Arc<Vec<StorageLocationDto>>,
    /// Application version.
    pub version: String,
}

impl<P, L> AppState<P, L>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    /// Wire every use case around one inventory and one log.
    pub fn new(
        inventory: Arc<P>,
        log: Arc<L>,
        stock_poll: PollPolicy,
        routing: RoutingConfig,
        version: impl Into<String>,
    ) -> Self {
        Self {
            allocate_items: Arc::new(AllocateItemsUseCase::new(
                Arc::clone(&inventory),
                Arc::clone(&log),
                stock_poll.clone(),
                routing,
            )),
            lookup_purchase_order: Arc::new(LookupPurchaseOrderUseCase::new(Arc::clone(
                &inventory,
            ))),
            list_storage_stock: Arc::new(ListStorageStockUseCase::new(Arc::clone(&inventory))),
            relocate_stock: Arc::new(RelocateStockUseCase::new(
                Arc::clone(&inventory),
                log,
                stock_poll,
            )),
            stock_pick_list: Arc::new(StockPickListUseCase::new(inventory)),
            storage_locations: Arc::new(Vec::new()),
            version: version.into(),
        }
    }

    /// Set the storage devices offered to staff.
    #[must_use]
    pub fn with_storage_locations(mut self, locations: Vec<StorageLocationDto>) -> Self {
        self.storage_locations = Arc::new(locations);
        self
    }
}

impl<P, L> Clone for AppState<P, L>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    fn clone(&self) -> Self {
        Self {
            allocate_items: Arc::clone(&self.allocate_items),
            lookup_purchase_order: Arc::clone(&self.lookup_purchase_order),
            list_storage_stock: Arc::clone(&self.list_storage_stock),
            relocate_stock: Arc::clone(&self.relocate_stock),
            stock_pick_list: Arc::clone(&self.stock_pick_list),
            storage_locations: Arc::clone(&self.storage_locations),
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router<P, L>(state: AppState<P, L>) -> Router
where
    P: InventoryPort + 'static,
    L: AllocationLogPort + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/allocate", post(allocate))
        .route("/api/po/{po_number}", get(lookup_purchase_order))
        .route("/api/storage/{storage_id}/stock", get(storage_stock))
        .route("/api/storage-locations", get(storage_locations))
        .route("/api/relocate", post(relocate))
        .route("/api/stock-pick-list", get(stock_pick_list))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check<P, L>(State(state): State<AppState<P, L>>) -> impl IntoResponse
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// Allocate endpoint.
///
/// Always answers 200 once the request is routed, even when no line
/// succeeded; `success` and `error` in the body say how it went.
async fn allocate<P, L>(
    State(state): State<AppState<P, L>>,
    ctx: RequestContext,
    body: Result<Json<AllocateRequestDto>, JsonRejection>,
) -> Result<Json<AllocateResponseDto>, AllocationError>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    let Json(request) = body.map_err(|e| AllocationError::validation(e.body_text()))?;
    tracing::info!(
        request_id = %ctx.request_id,
        staff = %ctx.staff.display_name,
        po_id = %request.po_id,
        storage_device_id = %request.storage_device_id,
        items = request.items.len(),
        "Allocation requested"
    );

    let allocated_by = ctx.staff.display_name.clone();
    let command = request.to_command(ctx.staff);
    let outcome = state.allocate_items.execute(command).await?;

    Ok(Json(AllocateResponseDto::from_outcome(outcome, allocated_by)))
}

/// Purchase order lookup endpoint.
async fn lookup_purchase_order<P, L>(
    State(state): State<AppState<P, L>>,
    Path(po_number): Path<String>,
) -> Result<Json<PurchaseOrderDto>, AllocationError>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    let dto = state.lookup_purchase_order.execute(&po_number).await?;
    Ok(Json(dto))
}

/// Storage device stock endpoint.
async fn storage_stock<P, L>(
    State(state): State<AppState<P, L>>,
    storage_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<StorageStockDto>, AllocationError>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    let Path(storage_id) = storage_id.map_err(|e| AllocationError::validation(e.body_text()))?;
    let dto = state
        .list_storage_stock
        .execute(StorageDeviceId::new(storage_id))
        .await?;
    Ok(Json(dto))
}

/// Configured storage devices.
async fn storage_locations<P, L>(
    State(state): State<AppState<P, L>>,
) -> Json<Vec<StorageLocationDto>>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    Json(state.storage_locations.as_ref().clone())
}

/// Relocate endpoint.
///
/// Like allocate, answers 200 once the transfer ran even if nothing moved.
async fn relocate<P, L>(
    State(state): State<AppState<P, L>>,
    ctx: RequestContext,
    body: Result<Json<RelocateRequestDto>, JsonRejection>,
) -> Result<Json<RelocateResponseDto>, AllocationError>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    let Json(request) = body.map_err(|e| AllocationError::validation(e.body_text()))?;
    tracing::info!(
        request_id = %ctx.request_id,
        staff = %ctx.staff.display_name,
        source = %request.source_id,
        destination = %request.dest_id,
        items = request.items.len(),
        "Relocation requested"
    );

    let relocated_by = ctx.staff.display_name.clone();
    let command = request.to_command(ctx.staff);
    let source_name = command.source.storage_device_name.clone();
    let dest_name = command.destination.storage_device_name.clone();
    let outcome = state.relocate_stock.execute(command).await?;

    Ok(Json(RelocateResponseDto::from_outcome(
        outcome,
        &source_name,
        &dest_name,
        relocated_by,
    )))
}

/// Stock pick list endpoint.
async fn stock_pick_list<P, L>(
    State(state): State<AppState<P, L>>,
) -> Result<Json<PickListDto>, AllocationError>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    let dto = state.stock_pick_list.execute().await?;
    Ok(Json(dto))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::{CatalogId, StorageDeviceId};
    use crate::infrastructure::inventory::MockInventory;
    use crate::infrastructure::persistence::InMemoryAllocationLog;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    fn create_test_state(
        mock: &Arc<MockInventory>,
    ) -> AppState<MockInventory, InMemoryAllocationLog> {
        AppState::new(
            Arc::clone(mock),
            Arc::new(InMemoryAllocationLog::new()),
            PollPolicy::immediate(0),
            RoutingConfig::new(StorageDeviceId::new(3), 42).with_settle_delay(Duration::ZERO),
            "1.0.0-test",
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let mock = Arc::new(MockInventory::new());
        let app = create_router(create_test_state(&mock));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_allocate_body_is_bad_request() {
        let mock = Arc::new(MockInventory::new());
        let app = create_router(create_test_state(&mock));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/allocate")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"items\": []}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION");
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn storage_stock_lists_lines() {
        let mock = Arc::new(MockInventory::new());
        mock.put_stock(StorageDeviceId::new(3), CatalogId::new(5), 2);
        let app = create_router(create_test_state(&mock));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/storage/3/stock")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["storageId"], 3);
        assert_eq!(json["items"][0]["catalogId"], 5);
    }

    #[tokio::test]
    async fn storage_locations_come_from_state() {
        let mock = Arc::new(MockInventory::new());
        let state = create_test_state(&mock).with_storage_locations(vec![StorageLocationDto {
            id: StorageDeviceId::new(12),
            name: "Shelf B2".to_string(),
        }]);
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/storage-locations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json, serde_json::json!([{"id": 12, "name": "Shelf B2"}]));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn relocate_without_destination_is_bad_request() {
        let mock = Arc::new(MockInventory::new());
        let app = create_router(create_test_state(&mock));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/relocate")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"sourceId\": 4, \"items\": []}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn non_numeric_storage_id_is_bad_request() {
        let mock = Arc::new(MockInventory::new());
        let app = create_router(create_test_state(&mock));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/storage/shelf/stock")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
