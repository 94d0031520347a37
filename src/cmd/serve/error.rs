// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Json;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::RETRY_AFTER;
use axum::response::IntoResponse;
use axum::response::Response;
use lexicards_core::EngineError;
use serde::Serialize;

/// Sent as `Retry-After` on conflicts and store outages.
const RETRY_AFTER_SECONDS: &str = "1";

/// The JSON body of every error response.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// An error returned from a handler.
#[derive(Debug)]
pub enum ApiError {
    Engine(EngineError),
    /// The request could not be decoded at all.
    BadRequest(String),
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Engine(e) => match e {
                EngineError::InvalidCardData(_)
                | EngineError::InvalidRating(_)
                | EngineError::InvalidUser(_) => StatusCode::BAD_REQUEST,
                EngineError::CardNotFound(_) => StatusCode::NOT_FOUND,
                EngineError::ConcurrentUpdate(_) => StatusCode::CONFLICT,
                EngineError::CorruptCardState(_) => StatusCode::INTERNAL_SERVER_ERROR,
                EngineError::RepositoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Whether the same request may succeed if sent again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Engine(e) if e.is_retryable())
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Engine(e) => ErrorBody {
                error: e.kind(),
                message: e.to_string(),
            },
            ApiError::BadRequest(msg) => ErrorBody {
                error: "BadRequest",
                message: msg.clone(),
            },
            ApiError::NotFound => ErrorBody {
                error: "NotFound",
                message: "Not Found".to_string(),
            },
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Engine(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self.body().message);
        }
        let mut response = (status, Json(self.body())).into_response();
        if self.is_retryable() {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECONDS));
        }
        response
    }
}
