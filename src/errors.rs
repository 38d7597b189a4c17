// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Custom application error with conversions from common Rust and 3rd-party errors.

use actix::MailboxError;
use actix::dev::SendError;
use derive_more::Display;
use log::error;

#[derive(Debug, Display, PartialEq)]
pub enum ServiceError {
    #[display("Internal server error")]
    InternalServerError(String),

    #[display("Internal serialization error")]
    SerializationError(String),

    #[display("BadRequest: {_0}")]
    BadRequest(String),

    #[display("The connection is closed or closing")]
    NotConnected,

    #[display("Service unavailable: {_0}")]
    ServiceUnavailable(String),
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::InternalServerError(format!("{e:?}"))
    }
}

impl From<MailboxError> for ServiceError {
    fn from(e: MailboxError) -> Self {
        ServiceError::InternalServerError(format!("Internal message error: {e:?}"))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        error!("{e:?}");
        ServiceError::SerializationError(e.to_string())
    }
}

impl<T> From<SendError<T>> for ServiceError {
    fn from(e: SendError<T>) -> Self {
        ServiceError::InternalServerError(format!("Error sending internal message: {e:?}"))
    }
}

impl From<awc::error::SendRequestError> for ServiceError {
    fn from(e: awc::error::SendRequestError) -> Self {
        ServiceError::ServiceUnavailable(e.to_string())
    }
}

impl From<awc::error::JsonPayloadError> for ServiceError {
    fn from(e: awc::error::JsonPayloadError) -> Self {
        ServiceError::SerializationError(e.to_string())
    }
}

impl From<awc::error::WsClientError> for ServiceError {
    fn from(e: awc::error::WsClientError) -> Self {
        ServiceError::ServiceUnavailable(e.to_string())
    }
}

impl From<rustls::Error> for ServiceError {
    fn from(e: rustls::Error) -> Self {
        ServiceError::InternalServerError(format!("TLS setup error: {e}"))
    }
}
