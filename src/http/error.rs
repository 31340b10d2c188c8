// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps [`crate::Error`] to HTTP status codes (spec §6, §7): malformed
//! input is 4xx, a `GetBlock` deadline is 408, everything else is 5xx.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::Error;

pub struct HttpError(pub Error);

impl From<Error> for HttpError {
    fn from(err: Error) -> Self {
        HttpError(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            Error::MalformedInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Error::Cancelled => (StatusCode::REQUEST_TIMEOUT, "request deadline exceeded".to_string()),
            Error::BadSequence => (StatusCode::CONFLICT, "bad sequence number".to_string()),
            Error::Transient(_) => (StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable, retry".to_string()),
            Error::Database(_) | Error::SideChainSubmission(_) | Error::PinGap { .. } | Error::TemplateResolution(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, body).into_response()
    }
}
