use actix_rt::task::JoinError;
use actix_web::{
    error,
    http::{header, StatusCode},
    HttpResponse, HttpResponseBuilder,
};
use derive_more::Display;
use log::{debug, error};

use crate::ledger::error::LedgerError;

#[derive(Debug, Display)]
pub enum LedgerServerError {
    #[display(fmt = "internal error")]
    InternalError,

    #[display(fmt = "bad request: {}", _0)]
    BadClientData(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "{}", _0)]
    Unprocessable(String),
}

impl error::ResponseError for LedgerServerError {
    fn error_response(&self) -> HttpResponse {
        HttpResponseBuilder::new(self.status_code())
            .insert_header((header::CONTENT_TYPE, "text/plain; charset=utf-8"))
            .body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            LedgerServerError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerServerError::BadClientData(_) => StatusCode::BAD_REQUEST,
            LedgerServerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerServerError::Conflict(_) => StatusCode::CONFLICT,
            LedgerServerError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<LedgerError> for LedgerServerError {
    fn from(e: LedgerError) -> Self {
        if !matches!(e, LedgerError::Storage(_)) {
            debug!("Rejected ledger op - {}", e);
        }

        match e {
            LedgerError::MalformedInput { .. } => LedgerServerError::BadClientData(e.to_string()),
            LedgerError::NotFound { .. } => LedgerServerError::NotFound(e.to_string()),
            LedgerError::DuplicateKey { .. } => LedgerServerError::Conflict(e.to_string()),
            LedgerError::ForeignKeyViolation { .. } => {
                LedgerServerError::Unprocessable(e.to_string())
            }
            LedgerError::Storage(msg) => {
                error!("Error occurred while ledger op - {}", msg);
                LedgerServerError::InternalError
            }
        }
    }
}

impl From<JoinError> for LedgerServerError {
    fn from(e: JoinError) -> Self {
        error!("Error occurred while performing blocking task - {}", e);
        LedgerServerError::InternalError
    }
}
