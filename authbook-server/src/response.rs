use authbook_shared::validation::FieldErrors;
use axum::{
    extract::rejection::JsonRejection,
    http::header::CONTENT_TYPE,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, IntoResponseParts, Response, ResponseParts},
};
use serde::Serialize;
use std::fmt::Display;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ServerResponse<T: Serialize> {
    pub body: Option<T>,
    pub headers: HeaderMap,
    pub status_code: StatusCode,
    pub pagination: Option<ResponsePagination>,
}

#[derive(Debug)]
pub struct ResponsePagination {
    pub count: u64,
    pub offset: u64,
    pub limit: u32,
}

impl IntoResponseParts for ResponsePagination {
    type Error = (StatusCode, String);

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.headers_mut()
            .insert("x-pagination-count", self.count.into());

        res.headers_mut()
            .insert("x-pagination-offset", self.offset.into());

        res.headers_mut()
            .insert("x-pagination-limit", self.limit.into());

        Ok(res)
    }
}

#[derive(Debug)]
pub struct ServerResponseBuilder<T: Serialize> {
    pub body: Option<T>,
    pub headers: Option<HeaderMap>,
    pub status_code: Option<StatusCode>,
    pub pagination: Option<ResponsePagination>,
}

impl<T> ServerResponseBuilder<T>
where
    T: Serialize,
{
    pub fn body(mut self, body: T) -> Self {
        self.body = Some(body);
        self
    }

    pub fn status_code(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn ok(mut self) -> Self {
        self.status_code = Some(StatusCode::OK);
        self
    }

    pub fn created(mut self) -> Self {
        self.status_code = Some(StatusCode::CREATED);
        self
    }

    pub fn accepted(mut self) -> Self {
        self.status_code = Some(StatusCode::ACCEPTED);
        self
    }

    pub fn no_content(mut self) -> Self {
        self.status_code = Some(StatusCode::NO_CONTENT);
        self
    }

    pub fn pagination(mut self, pagination: ResponsePagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn build(self) -> ServerResponse<T> {
        ServerResponse {
            body: self.body,
            headers: self.headers.unwrap_or_default(),
            status_code: self.status_code.unwrap_or(StatusCode::OK),
            pagination: self.pagination,
        }
    }

    pub fn new() -> Self {
        Self {
            body: None,
            headers: None,
            status_code: None,
            pagination: None,
        }
    }
}

impl<T: Serialize> ServerResponse<T> {
    pub fn builder() -> ServerResponseBuilder<T> {
        ServerResponseBuilder::new()
    }
}

impl<T: Serialize> IntoResponse for ServerResponse<T> {
    fn into_response(self) -> Response {
        let body = match self.body {
            Some(body) => body,
            None => return self.status_code.into_response(),
        };

        let bytes = match serde_json::to_vec(&body) {
            Ok(b) => b,
            Err(err) => {
                error!("Error serializing response body: {:?}", err);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let mut headers = self.headers;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match self.pagination {
            Some(p) => (self.status_code, p, headers, bytes).into_response(),
            None => (self.status_code, headers, bytes).into_response(),
        }
    }
}

#[derive(Debug)]
pub enum ServerError {
    InternalError(String),
    BadRequest(String),
    NotFound(String),
    /// Field-level failures from payload validation
    Validation(FieldErrors),
    /// Per-item failures of a bulk write, in request order
    BulkValidation(Vec<FieldErrors>),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::InternalError(message) => write!(f, "Internal Error: {}", message),
            ServerError::BadRequest(message) => write!(f, "Bad Request: {}", message),
            ServerError::NotFound(message) => write!(f, "Not Found: {}", message),
            ServerError::Validation(errors) => write!(f, "Validation Error: {}", errors),
            ServerError::BulkValidation(errors) => {
                write!(f, "Validation Error: {} items", errors.len())
            }
        }
    }
}

impl std::error::Error for ServerError {}

impl From<mongodb::error::Error> for ServerError {
    fn from(error: mongodb::error::Error) -> Self {
        ServerError::InternalError(error.to_string())
    }
}

impl From<mongodb::bson::oid::Error> for ServerError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        ServerError::BadRequest(err.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::InternalError(err.to_string())
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<FieldErrors> for ServerError {
    fn from(errors: FieldErrors) -> Self {
        ServerError::Validation(errors)
    }
}

impl ServerError {
    pub fn internal_error(message: &str) -> Self {
        ServerError::InternalError(message.to_string())
    }

    pub fn bad_request(message: &str) -> Self {
        ServerError::BadRequest(message.to_string())
    }

    pub fn not_found(message: &str) -> Self {
        ServerError::NotFound(message.to_string())
    }

    pub fn field(field: &str, message: &str) -> Self {
        ServerError::Validation(FieldErrors::single(field, message))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let (status, message) = match self {
            ServerError::Validation(errors) => {
                warn!("Rejecting payload: {}", errors);
                return ServerResponse::builder()
                    .body(errors)
                    .status_code(StatusCode::BAD_REQUEST)
                    .build()
                    .into_response();
            }
            ServerError::BulkValidation(errors) => {
                warn!("Rejecting bulk payload with {} items", errors.len());
                return ServerResponse::builder()
                    .body(errors)
                    .status_code(StatusCode::BAD_REQUEST)
                    .build()
                    .into_response();
            }
            ServerError::InternalError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            ServerError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ServerError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        error!("Returning error response {} {}", status, message);

        ServerResponse::<ErrorResponse>::builder()
            .body(ErrorResponse { message })
            .status_code(status)
            .build()
            .into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
pub type ServerAppResult<T> = Result<ServerResponse<T>, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_headers() {
        let response = ServerResponse::builder()
            .body(vec![1, 2, 3])
            .ok()
            .pagination(ResponsePagination {
                count: 3,
                offset: 0,
                limit: 50,
            })
            .build()
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-pagination-count"], "3");
        assert_eq!(response.headers()["x-pagination-limit"], "50");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (ServerError::not_found("x"), StatusCode::NOT_FOUND),
            (ServerError::bad_request("x"), StatusCode::BAD_REQUEST),
            (ServerError::internal_error("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (ServerError::field("username", "required"), StatusCode::BAD_REQUEST),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_empty_body_is_bare_status() {
        let response = ServerResponse::<()>::builder().no_content().build().into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }
}
