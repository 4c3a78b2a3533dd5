//! REST API for the packing service.
//!
//! The cart/shipping collaborator posts line items and the tenant's box
//! catalog and receives packages ready for the rate request.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, PackerConfig};
use crate::error::InvalidInputError;
use crate::input::{BoxTypeInput, LineItemInput, parse_box_types, parse_line_items};
use crate::model::{BoxType, Item};
use crate::packer::{
    PackingConfig, PackingResult, UnpackedReason, pack_with_config, pack_with_progress,
};
use crate::shipment::{PackageDimensions, PackageWeight, ShipmentPackage};

/// Shared state of the HTTP handlers.
#[derive(Clone, Debug, Default)]
pub struct ApiState {
    packer_config: PackerConfig,
}

impl ApiState {
    pub fn new(packer_config: PackerConfig) -> Self {
        Self { packer_config }
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>shipment_packer API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the packing endpoints.
///
/// `items` are cart lines (expanded by `quantity`), `box_types` the tenant's
/// package catalog. An empty catalog is allowed and leaves every item unpacked.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "items": [
            { "id": "mug", "length_cm": 20.0, "width_cm": 10.0, "height_cm": 5.0, "weight_oz": 8.0, "quantity": 2 },
            { "id": "vase", "length_cm": 15.0, "width_cm": 15.0, "height_cm": 30.0, "weight_oz": 40.0, "ship_alone": true }
        ],
        "box_types": [
            { "id": "small", "length_cm": 30.0, "width_cm": 20.0, "height_cm": 10.0, "weight_oz": 4.0 },
            { "id": "large", "length_cm": 40.0, "width_cm": 40.0, "height_cm": 40.0, "weight_oz": 12.0, "max_weight_oz": 800.0 }
        ]
    })
)]
pub struct PackRequest {
    #[serde(default)]
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub box_types: Vec<BoxTypeInput>,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    items: Vec<Item>,
    box_types: Vec<BoxType>,
}

impl PackRequest {
    fn into_validated(self) -> Result<ValidatedPackRequest, InvalidInputError> {
        Ok(ValidatedPackRequest {
            items: parse_line_items(self.items)?,
            box_types: parse_box_types(self.box_types)?,
        })
    }
}

/// Response with packed boxes, leftovers and rate-request packages.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub packed: Vec<PackedBoxResponse>,
    pub unpacked: Vec<UnpackedItemResponse>,
    pub packages: Vec<ShipmentPackage>,
    pub is_complete: bool,
    pub summary: PackingSummary,
}

/// One opened box and its contents.
#[derive(Serialize, ToSchema)]
pub struct PackedBoxResponse {
    #[serde(rename = "box")]
    pub box_type: BoxType,
    pub products: Vec<Item>,
    pub contents_weight_oz: f64,
    pub gross_weight_oz: f64,
    pub contents_volume_cm3: f64,
    pub utilization_percent: f64,
    /// Whether the box holds a single ship-alone item.
    pub ship_alone: bool,
}

/// An item that fits no box type, with the reason.
#[derive(Serialize, ToSchema)]
pub struct UnpackedItemResponse {
    #[serde(flatten)]
    pub item: Item,
    pub reason_code: UnpackedReason,
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
pub struct PackingSummary {
    pub box_count: usize,
    pub packed_item_count: usize,
    pub unpacked_count: usize,
    pub total_gross_weight_oz: f64,
    pub average_utilization_percent: f64,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>, code: Option<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
            code,
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
    code: Option<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details, code))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.body_text(),
        None,
    )
}

fn invalid_input_error(err: &InvalidInputError) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        err.to_string(),
        Some(err.code().to_string()),
    )
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Result<ValidatedPackRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    payload.into_validated().map_err(|err| {
        warn!("⚠️ Rejected pack request: {}", err);
        invalid_input_error(&err)
    })
}

impl PackResponse {
    /// Creates a PackResponse from a PackingResult.
    pub fn from_packing_result(result: PackingResult) -> Self {
        let packages = result.shipment_packages();
        let summary = PackingSummary {
            box_count: result.box_count(),
            packed_item_count: result.packed_item_count(),
            unpacked_count: result.unpacked_count(),
            total_gross_weight_oz: result.total_gross_weight_oz(),
            average_utilization_percent: result.average_utilization(),
        };
        let is_complete = result.is_complete();

        let PackingResult { packed, unpacked } = result;

        Self {
            packed: packed
                .into_iter()
                .map(|packed_box| {
                    let contents_weight_oz = packed_box.contents_weight_oz();
                    let gross_weight_oz = packed_box.gross_weight_oz();
                    let contents_volume_cm3 = packed_box.contents_volume_cm3();
                    let utilization_percent = packed_box.utilization_percent();
                    let ship_alone = packed_box.is_exclusive();
                    let (box_type, products) = packed_box.into_parts();
                    PackedBoxResponse {
                        box_type,
                        products,
                        contents_weight_oz,
                        gross_weight_oz,
                        contents_volume_cm3,
                        utilization_percent,
                        ship_alone,
                    }
                })
                .collect(),
            unpacked: unpacked
                .into_iter()
                .map(|entry| UnpackedItemResponse {
                    reason: entry.reason.to_string(),
                    reason_code: entry.reason,
                    item: entry.item,
                })
                .collect(),
            packages,
            is_complete,
            summary,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream, handle_health),
    components(
        schemas(
            PackRequest,
            LineItemInput,
            BoxTypeInput,
            PackResponse,
            PackedBoxResponse,
            UnpackedItemResponse,
            UnpackedReason,
            PackingSummary,
            ShipmentPackage,
            PackageWeight,
            PackageDimensions,
            ErrorResponse,
            Item,
            BoxType
        )
    ),
    tags((name = "packing", description = "Endpoints for shipment packing"))
)]
struct ApiDoc;

/// Builds the application router.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        .route("/health", get(handle_health))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(config: ApiConfig, packer_config: PackerConfig) -> std::io::Result<()> {
    let app = router(ApiState::new(packer_config));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let display_host = config.display_host().to_string();
    info!("🚀 Server running on http://{}:{}", display_host, config.port());
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📦 API endpoints: POST /pack, POST /pack_stream, GET /health");
    info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for POST /pack.
///
/// Packs the cart's items into the tenant's box types.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Packing finished; check `is_complete`", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Malformed JSON or invalid measurements",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let request = match parse_pack_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let ValidatedPackRequest { items, box_types } = request;
    info!(
        "📥 New pack request: {} items, {} box types",
        items.len(),
        box_types.len()
    );

    let packing_result =
        match pack_with_config(items, box_types, state.packer_config.packing_config()) {
            Ok(result) => result,
            Err(err) => return invalid_input_error(&err),
        };

    info!(
        "📦 Result: {} boxes, {} unpacked items",
        packing_result.box_count(),
        packing_result.unpacked_count()
    );
    if !packing_result.is_complete() {
        warn!(
            "⚠️ {} item(s) fit no configured box type; rates cannot cover the whole cart",
            packing_result.unpacked_count()
        );
    }

    let response = PackResponse::from_packing_result(packing_result);
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /pack_stream (SSE).
///
/// Streams packing events as Server-Sent Events (text/event-stream).
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams pack events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Malformed JSON or invalid measurements",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let request = match parse_pack_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let ValidatedPackRequest { items, box_types } = request;
    let packing_config = state.packer_config.packing_config();
    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        stream_pack_run(items, box_types, packing_config, &tx);
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Runs the packer and forwards every event as JSON.
///
/// A failed run ends the stream with an `Error` event instead of `Finished`.
fn stream_pack_run(
    items: Vec<Item>,
    box_types: Vec<BoxType>,
    packing_config: PackingConfig,
    tx: &mpsc::Sender<String>,
) {
    let outcome = pack_with_progress(items, box_types, packing_config, |evt| {
        if let Ok(json) = serde_json::to_string(evt) {
            // A closed receiver means the client went away; remaining events are discarded.
            let _ = tx.blocking_send(json);
        }
    });
    if let Err(err) = outcome {
        warn!("⚠️ Streaming pack run failed: {}", err);
        let event = json!({
            "type": "Error",
            "code": err.code(),
            "message": err.to_string(),
        });
        let _ = tx.blocking_send(event.to_string());
    }
}

/// Handler for GET /health.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "packing"
)]
async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "service": env!("CARGO_PKG_NAME") }))
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
