pub mod registry;
pub mod scenarios;

use axum::{
    Router,
    extract::{Json, Path, RawQuery, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::CalcError;
use scenarios::{NewScenario, ScenarioError, ScenarioStore};

#[derive(Clone, Default)]
pub struct AppState {
    pub scenarios: ScenarioStore,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/calculators", get(list_calculators_handler))
        .route(
            "/api/calculators/:id",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .route(
            "/api/scenarios",
            get(list_scenarios_handler).post(save_scenario_handler),
        )
        .route(
            "/api/scenarios/:id",
            get(get_scenario_handler).delete(delete_scenario_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let app = build_router(AppState::default());
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "calcdeck HTTP API listening");
    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn list_calculators_handler() -> Response {
    json_response(StatusCode::OK, registry::catalog())
}

async fn calculate_get_handler(Path(id): Path<String>, RawQuery(query): RawQuery) -> Response {
    let span = tracing::info_span!("calculate", calculator = %id, source = "query");
    span.in_scope(|| {
        let outcome = registry::find(&id)
            .and_then(|calculator| calculator.evaluate_query(query.as_deref().unwrap_or("")));
        calculation_response(outcome)
    })
}

async fn calculate_post_handler(
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let span = tracing::info_span!("calculate", calculator = %id, source = "json");
    span.in_scope(|| {
        let Json(input) = match body {
            Ok(body) => body,
            Err(rejection) => {
                tracing::warn!(error = %rejection.body_text(), "rejected request body");
                return error_response(StatusCode::BAD_REQUEST, &rejection.body_text());
            }
        };
        let outcome = registry::find(&id).and_then(|calculator| calculator.evaluate(input));
        calculation_response(outcome)
    })
}

fn calculation_response(outcome: Result<Value, CalcError>) -> Response {
    match outcome {
        Ok(result) => {
            tracing::info!("calculation completed");
            json_response(StatusCode::OK, result)
        }
        Err(err) => {
            tracing::warn!(error = %err, "calculation rejected");
            calc_error_response(&err)
        }
    }
}

async fn list_scenarios_handler(State(state): State<AppState>) -> Response {
    json_response(StatusCode::OK, state.scenarios.list().await)
}

async fn save_scenario_handler(
    State(state): State<AppState>,
    body: Result<Json<NewScenario>, JsonRejection>,
) -> Response {
    let Json(new) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    let span = tracing::info_span!("save_scenario", calculator = %new.calculator);
    match state.scenarios.save(new).instrument(span.clone()).await {
        Ok(scenario) => {
            span.in_scope(|| tracing::info!(scenario_id = %scenario.id, "scenario saved"));
            json_response(StatusCode::CREATED, scenario)
        }
        Err(err) => {
            span.in_scope(|| tracing::warn!(error = %err, "scenario rejected"));
            scenario_error_response(&err)
        }
    }
}

async fn get_scenario_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_scenario_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.scenarios.get(id).await {
        Ok(scenario) => json_response(StatusCode::OK, scenario),
        Err(err) => scenario_error_response(&err),
    }
}

async fn delete_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_scenario_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.scenarios.delete(id).await {
        Ok(()) => {
            tracing::info!(scenario_id = %id, "scenario deleted");
            json_response(StatusCode::OK, serde_json::json!({ "deleted": id }))
        }
        Err(err) => scenario_error_response(&err),
    }
}

// Unparseable ids cannot name a stored scenario.
fn parse_scenario_id(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| {
        error_response(
            StatusCode::NOT_FOUND,
            &format!("scenario '{raw}' not found"),
        )
    })
}

fn status_for(err: &CalcError) -> StatusCode {
    match err {
        CalcError::Invalid { .. } | CalcError::Payload(_) => StatusCode::BAD_REQUEST,
        CalcError::NonAmortizing { .. } | CalcError::HorizonExceeded { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CalcError::UnknownCalculator(_) => StatusCode::NOT_FOUND,
    }
}

fn calc_error_response(err: &CalcError) -> Response {
    json_response(
        status_for(err),
        ErrorResponse {
            error: err.to_string(),
            field: err.field(),
        },
    )
}

fn scenario_error_response(err: &ScenarioError) -> Response {
    match err {
        ScenarioError::Calc(calc) => calc_error_response(calc),
        ScenarioError::InvalidName(_) => json_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse {
                error: err.to_string(),
                field: Some("name"),
            },
        ),
        ScenarioError::NotFound(_) => error_response(StatusCode::NOT_FOUND, &err.to_string()),
        ScenarioError::Timestamp(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            field: None,
        },
    )
}
