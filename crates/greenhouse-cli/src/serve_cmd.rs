use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use greenhouse_core::query::parse_range;
use greenhouse_core::{NewPlant, Plant, PlantError, PlantPatch, PlantStore};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

/// Unknown ids are 404 on every route; bad input is 400.
impl From<PlantError> for AppError {
    fn from(err: PlantError) -> Self {
        let status = match &err {
            PlantError::NotFound(_) => StatusCode::NOT_FOUND,
            PlantError::Validation(_) | PlantError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            PlantError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection.body_text(), "rejected request body");
        Self::bad_request(format!("invalid plant data: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedingWaterResponse {
    pub plants_needing_water: Vec<Plant>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(store: PlantStore) -> Router {
    Router::new()
        .route("/plants", get(list_plants).post(create_plant))
        .route("/plants/need-watering", get(plants_needing_water))
        .route("/plants/date-range", get(plants_by_date_range))
        .route("/plants/species/{species}", get(plants_by_species))
        .route(
            "/plants/{id}",
            get(get_plant).put(update_plant).delete(delete_plant),
        )
        .route("/plants/{id}/water", put(water_plant))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(store: PlantStore, bind: &str, port: u16) -> Result<()> {
    let app = build_router(store);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("greenhouse serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("greenhouse serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// A path segment that is not a UUID cannot name a stored plant.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(format!("plant {raw} not found")))
}

async fn create_plant(
    State(store): State<PlantStore>,
    payload: Result<Json<NewPlant>, JsonRejection>,
) -> Result<Json<Plant>, AppError> {
    let Json(new) = payload?;
    Ok(Json(store.create(new).await?))
}

async fn list_plants(State(store): State<PlantStore>) -> Result<Json<Vec<Plant>>, AppError> {
    Ok(Json(store.get_all().await?))
}

async fn plants_needing_water(
    State(store): State<PlantStore>,
) -> Result<Json<NeedingWaterResponse>, AppError> {
    Ok(Json(NeedingWaterResponse {
        plants_needing_water: store.needing_water().await?,
    }))
}

/// `GET /plants/date-range?start=&end=`.
///
/// Query strings are form-decoded, so a bare `+` in an offset arrives as a
/// space. Clients send `Z` or percent-encode the sign (`%2B02:00`).
async fn plants_by_date_range(
    State(store): State<PlantStore>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<Vec<Plant>>, AppError> {
    let (start, end) = parse_range(params.start.as_deref(), params.end.as_deref())?;
    Ok(Json(store.created_between(start, end).await?))
}

async fn plants_by_species(
    State(store): State<PlantStore>,
    Path(species): Path<String>,
) -> Result<Json<Vec<Plant>>, AppError> {
    Ok(Json(store.by_species(&species).await?))
}

async fn get_plant(
    State(store): State<PlantStore>,
    Path(id): Path<String>,
) -> Result<Json<Plant>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(store.get(id).await?))
}

async fn update_plant(
    State(store): State<PlantStore>,
    Path(id): Path<String>,
    payload: Result<Json<PlantPatch>, JsonRejection>,
) -> Result<Json<Plant>, AppError> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    Ok(Json(store.update(id, patch).await?))
}

async fn water_plant(
    State(store): State<PlantStore>,
    Path(id): Path<String>,
) -> Result<Json<Plant>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(store.water(id).await?))
}

async fn delete_plant(
    State(store): State<PlantStore>,
    Path(id): Path<String>,
) -> Result<Json<Plant>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(store.delete(id).await?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use greenhouse_core::store::MemoryPlantRepository;
    use greenhouse_core::{ManualClock, NewPlant, PlantStore};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()
    }

    fn test_store() -> (PlantStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = PlantStore::new(Arc::new(MemoryPlantRepository::new()), clock.clone());
        (store, clock)
    }

    async fn send(
        store: &PlantStore,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let app = super::build_router(store.clone());
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_and_get() {
        let (store, _clock) = test_store();

        let resp = send(
            &store,
            "POST",
            "/plants",
            Some(json!({"name": "Boston", "species": "Fern", "waterFrequencyDays": 5})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let created = body_json(resp).await;
        assert_eq!(created["name"], "Boston");
        assert_eq!(created["notes"], "");
        assert_eq!(created["createdAt"], created["lastWatered"]);
        assert!(created["updatedAt"].is_null());

        let id = created["id"].as_str().unwrap();
        let resp = send(&store, "GET", &format!("/plants/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, created);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_data() {
        let (store, _clock) = test_store();

        let wrong_type = json!({"name": "Boston", "species": "Fern", "waterFrequencyDays": "5"});
        let resp = send(&store, "POST", "/plants", Some(wrong_type)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].is_string());

        let missing = json!({"name": "Boston", "waterFrequencyDays": 5});
        let resp = send(&store, "POST", "/plants", Some(missing)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let negative = json!({"name": "Boston", "species": "Fern", "waterFrequencyDays": -1});
        let resp = send(&store, "POST", "/plants", Some(negative)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(&store, "POST", "/plants", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_plants() {
        let (store, _clock) = test_store();

        let resp = send(&store, "GET", "/plants", None).await;
        assert_eq!(body_json(resp).await, json!([]));

        store.create(NewPlant::new("A", "Fern", 5.0)).await.unwrap();
        store.create(NewPlant::new("B", "Cactus", 21.0)).await.unwrap();

        let resp = send(&store, "GET", "/plants", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_need_watering_and_water() {
        let (store, clock) = test_store();
        let fern = store.create(NewPlant::new("A", "Fern", 5.0)).await.unwrap();

        let resp = send(&store, "GET", "/plants/need-watering", None).await;
        assert_eq!(body_json(resp).await, json!({"plantsNeedingWater": []}));

        clock.advance(Duration::days(5));
        let resp = send(&store, "GET", "/plants/need-watering", None).await;
        let json = body_json(resp).await;
        let due = json["plantsNeedingWater"].as_array().unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0]["id"], fern.id.to_string());

        let resp = send(&store, "PUT", &format!("/plants/{}/water", fern.id), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let watered = body_json(resp).await;
        assert_eq!(watered["lastWatered"], watered["updatedAt"]);

        let resp = send(&store, "GET", "/plants/need-watering", None).await;
        assert_eq!(body_json(resp).await, json!({"plantsNeedingWater": []}));
    }

    #[tokio::test]
    async fn test_update_partial() {
        let (store, _clock) = test_store();
        let fern = store.create(NewPlant::new("A", "Fern", 5.0)).await.unwrap();

        let resp = send(
            &store,
            "PUT",
            &format!("/plants/{}", fern.id),
            Some(json!({"notes": "x", "id": "ignored"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["notes"], "x");
        assert_eq!(json["name"], "A");
        assert_eq!(json["id"], fern.id.to_string());
        assert!(json["updatedAt"].is_string());

        let resp = send(
            &store,
            "PUT",
            &format!("/plants/{}", fern.id),
            Some(json!({"name": ""})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.get(fern.id).await.unwrap().name, "A");
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _clock) = test_store();
        let fern = store.create(NewPlant::new("A", "Fern", 5.0)).await.unwrap();

        let resp = send(&store, "DELETE", &format!("/plants/{}", fern.id), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["id"], fern.id.to_string());

        let resp = send(&store, "DELETE", &format!("/plants/{}", fern.id), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (store, _clock) = test_store();
        let random_id = uuid::Uuid::new_v4();

        for (method, uri, body) in [
            ("GET", format!("/plants/{random_id}"), None),
            ("PUT", format!("/plants/{random_id}/water"), None),
            ("PUT", format!("/plants/{random_id}"), Some(json!({"notes": "x"}))),
            ("DELETE", format!("/plants/{random_id}"), None),
            ("GET", "/plants/not-a-uuid".to_string(), None),
        ] {
            let resp = send(&store, method, &uri, body).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_by_species() {
        let (store, _clock) = test_store();
        store.create(NewPlant::new("A", "fern", 5.0)).await.unwrap();
        store.create(NewPlant::new("B", "Cactus", 21.0)).await.unwrap();

        let resp = send(&store, "GET", "/plants/species/FERN", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let found = json.as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["name"], "A");
    }

    #[tokio::test]
    async fn test_date_range() {
        let (store, clock) = test_store();
        store.create(NewPlant::new("early", "Fern", 5.0)).await.unwrap();
        clock.advance(Duration::days(10));
        store.create(NewPlant::new("late", "Fern", 5.0)).await.unwrap();

        let resp = send(
            &store,
            "GET",
            "/plants/date-range?start=2024-09-01&end=2024-09-02",
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let found = json.as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["name"], "early");

        let resp = send(
            &store,
            "GET",
            "/plants/date-range?start=2024-09-30&end=2024-09-01",
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!([]));
    }

    #[tokio::test]
    async fn test_date_range_requires_bounds() {
        let (store, _clock) = test_store();

        for uri in [
            "/plants/date-range",
            "/plants/date-range?start=2024-09-01",
            "/plants/date-range?start=soon&end=2024-09-01",
        ] {
            let resp = send(&store, "GET", uri, None).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_date_range_offsets_must_be_percent_encoded() {
        let (store, _clock) = test_store();
        store.create(NewPlant::new("early", "Fern", 5.0)).await.unwrap();

        for uri in [
            "/plants/date-range?start=2024-09-01T07:00:00Z&end=2024-09-01T08:30:00Z",
            "/plants/date-range?start=2024-09-01T09:00:00%2B02:00&end=2024-09-01T10:30:00%2B02:00",
        ] {
            let resp = send(&store, "GET", uri, None).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            let json = body_json(resp).await;
            assert_eq!(json.as_array().unwrap().len(), 1, "{uri}");
        }

        let resp = send(
            &store,
            "GET",
            "/plants/date-range?start=2024-09-01T09:00:00+02:00&end=2024-09-01T10:30:00+02:00",
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
