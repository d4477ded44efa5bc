/// HTTP front-end: one HTML query page and one JSON form endpoint.
///
/// # Endpoints
///
/// | Method | Path | Description |
/// |--------|------|-------------|
/// | `GET`  | `/` | Query page (HTML form, renders the report client-side) |
/// | `POST` | `/soil-info` | Resolve `{"address": …}` to a soil record |
///
/// Pipeline failures answer HTTP 200 with `{"success": false, "message"}`;
/// malformed request bodies answer HTTP 422 with a validation shape distinct
/// from pipeline errors.
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::model::{Resolution, SoilRecord};
use crate::pipeline::SoilInfoPipeline;

/// Message returned when the pipeline finds no record to report.
pub const NOT_FOUND_MESSAGE: &str = "토양 정보를 찾을 수 없습니다.";

const VALIDATION_ERROR: &str = "요청 데이터 검증 실패";

#[derive(Debug, Deserialize)]
pub struct SoilInfoRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
struct SuccessResponse {
    success: bool,
    data: SoilRecord,
    exact_match: bool,
    matched_address: String,
}

#[derive(Debug, Serialize)]
struct FailureResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidationErrorResponse {
    error: &'static str,
    detail: String,
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<SoilInfoPipeline>,
}

pub fn router(pipeline: Arc<SoilInfoPipeline>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/soil-info", post(soil_info))
        .with_state(AppState { pipeline })
}

/// Bind the configured address and serve until the process terminates.
pub async fn serve(pipeline: Arc<SoilInfoPipeline>, bind_addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "HTTP front-end listening");
    axum::serve(listener, router(pipeline)).await?;
    Ok(())
}

async fn home() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

async fn soil_info(
    State(state): State<AppState>,
    payload: Result<Json<SoilInfoRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationErrorResponse {
                    error: VALIDATION_ERROR,
                    detail: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };

    match state.pipeline.resolve(&request.address).await {
        Ok(Resolution::Found {
            record,
            exact_match,
            matched_address,
        }) => Json(SuccessResponse {
            success: true,
            data: record,
            exact_match,
            matched_address,
        })
        .into_response(),
        Ok(Resolution::NotFound) => Json(FailureResponse {
            success: false,
            message: NOT_FOUND_MESSAGE.to_string(),
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "resolution failed");
            Json(FailureResponse {
                success: false,
                message: e.to_string(),
            })
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_deserializes() {
        let request: SoilInfoRequest =
            serde_json::from_str(r#"{"address": "전남 해남군 산이면 덕송리 292-17"}"#)
                .expect("valid body");
        assert_eq!(request.address, "전남 해남군 산이면 덕송리 292-17");
    }

    #[test]
    fn success_response_shape() {
        let response = SuccessResponse {
            success: true,
            data: SoilRecord::default(),
            exact_match: false,
            matched_address: "전남 해남군 산이면 덕송리 292-20".to_string(),
        };
        let value = serde_json::to_value(&response).expect("serializable");
        assert_eq!(value["success"], true);
        assert_eq!(value["exact_match"], false);
        assert!(value["data"].is_object());
        assert_eq!(value["matched_address"], "전남 해남군 산이면 덕송리 292-20");
    }

    #[test]
    fn failure_response_shape() {
        let response = FailureResponse {
            success: false,
            message: NOT_FOUND_MESSAGE.to_string(),
        };
        let value = serde_json::to_value(&response).expect("serializable");
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], NOT_FOUND_MESSAGE);
    }
}
