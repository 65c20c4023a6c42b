use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

pub fn ok(body: Value) -> StandardResponse {
    Ok(SuccessResponse::Success(Json(body)))
}

pub fn created(body: Value) -> StandardResponse {
    Ok(SuccessResponse::Created(Json(body)))
}

pub fn err_not_found() -> StandardResponse {
    Err(FailureResponse::NotFound(()))
}

pub fn bad_request(msg: impl Into<String>) -> StandardResponse {
    Err(FailureResponse::BadRequest(msg.into()))
}

pub fn forbidden() -> StandardResponse {
    Err(FailureResponse::Forbidden(()))
}

pub fn conflict(msg: impl Into<String>) -> StandardResponse {
    Err(FailureResponse::Conflict(msg.into()))
}

pub fn server_error(msg: impl Into<String>) -> StandardResponse {
    Err(FailureResponse::ServerError(msg.into()))
}

pub type StandardResponse = Result<SuccessResponse, FailureResponse>;

pub enum SuccessResponse {
    Success(Json<Value>),
    Created(Json<Value>),
}

impl IntoResponse for SuccessResponse {
    fn into_response(self) -> Response {
        match self {
            SuccessResponse::Success(body) => body.into_response(),
            SuccessResponse::Created(body) => {
                (StatusCode::CREATED, body).into_response()
            }
        }
    }
}

#[derive(Debug)]
pub enum FailureResponse {
    BadRequest(String),
    NotFound(()),
    Forbidden(()),
    Conflict(String),
    ServerError(String),
}

impl IntoResponse for FailureResponse {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            FailureResponse::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            FailureResponse::NotFound(()) => {
                (StatusCode::NOT_FOUND, "not found".to_string())
            }
            FailureResponse::Forbidden(()) => {
                (StatusCode::FORBIDDEN, "forbidden".to_string())
            }
            FailureResponse::Conflict(msg) => (StatusCode::CONFLICT, msg),
            FailureResponse::ServerError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

impl From<diesel::result::Error> for FailureResponse {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => FailureResponse::NotFound(()),
            err => {
                tracing::error!(?err, "database error");
                FailureResponse::ServerError("database error".to_string())
            }
        }
    }
}
