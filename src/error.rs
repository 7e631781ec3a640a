use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::Debug;

#[derive(Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!(error = %err, "serialization failed");
        unexpected_error()
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self.code {
            1..=99 => StatusCode::INTERNAL_SERVER_ERROR,
            104 | 105 => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self.code {
            1..=99 => "Internal Server Error",
            _ => self.message.as_str(),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn missing_field_error(field: &str) -> Error {
    Error {
        code: 101,
        message: format!("missing required field: {field}"),
    }
}

pub fn not_found_error() -> Error {
    Error {
        code: 104,
        message: "place not found".into(),
    }
}

pub fn no_match_error() -> Error {
    Error {
        code: 105,
        message: "no matching place found".into(),
    }
}

pub fn env_var_error(err: env::VarError) -> Error {
    tracing::error!(error = %err, "environment variable error");
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn database_error<T: Debug>(err: T) -> Error {
    tracing::error!(error = ?err, "database error");
    Error {
        code: 2,
        message: "database error".into(),
    }
}

pub fn config_error(name: &str) -> Error {
    Error {
        code: 3,
        message: format!("invalid configuration value for {name}"),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

#[test]
fn internal_errors_hide_details() {
    let response = database_error("disk I/O error").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = config_error("MELLMAP_ADDR").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn client_errors_map_to_4xx() {
    assert_eq!(missing_field_error("name").status(), StatusCode::BAD_REQUEST);
    assert_eq!(not_found_error().status(), StatusCode::NOT_FOUND);
    assert_eq!(no_match_error().status(), StatusCode::NOT_FOUND);
    assert_eq!(
        missing_field_error("price").message,
        "missing required field: price"
    );
}
