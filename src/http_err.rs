use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, Ordering},
};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{
    envelope::Envelope,
    rate_limit::{RateLimitError, RateLimitResult},
    reports::DateError,
};

static EXPOSE_ERROR_DETAILS: AtomicBool = AtomicBool::new(false);

/// Include the text of unexpected errors in 500 responses.
///
/// Only intended for development servers.
pub fn expose_error_details(enabled: bool) {
    EXPOSE_ERROR_DETAILS.store(enabled, Ordering::Relaxed);
}

/// Validation messages keyed by the camelCase name of the offending field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key used for errors that apply to a whole request body.
pub const GENERAL_ERRORS_KEY: &str = "general";

#[derive(Debug)]
pub enum ApiError {
    /// The request was malformed in a way the client can fix.
    BadRequestReason(String),
    /// One or more fields in the request failed validation.
    Validation(FieldErrors),
    Unauthorized(String),
    /// The resource does not exist or is owned by a different user.
    NotFound(String),
    Conflict(String),
    TooManyRequests(RateLimitResult),
    InternalServerError,
    /// An error that should never happen during normal operation.
    Unexpected(anyhow::Error),
}

impl ApiError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{} not found.", resource))
    }

    /// A validation error for a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_owned(), vec![message.into()]);

        Self::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequestReason(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalServerError | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequestReason(message)
            | Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::Conflict(message) => Envelope::failure(message),
            Self::Validation(errors) => Envelope::invalid(errors),
            Self::TooManyRequests(result) => return result.into_response(),
            Self::InternalServerError => Envelope::failure("Internal server error."),
            Self::Unexpected(error) => {
                if EXPOSE_ERROR_DETAILS.load(Ordering::Relaxed) {
                    Envelope::failure(format!("Internal server error: {:#}", error))
                } else {
                    Envelope::failure("Internal server error.")
                }
            }
        };

        (status, body).into_response()
    }
}

impl From<RateLimitResult> for ApiError {
    fn from(result: RateLimitResult) -> Self {
        Self::TooManyRequests(result)
    }
}

impl From<RateLimitError> for ApiError {
    fn from(error: RateLimitError) -> Self {
        match error {
            RateLimitError::Limited(until) => {
                Self::TooManyRequests(RateLimitResult::LimitedUntil(until))
            }
            RateLimitError::Other(error) => {
                error!(?error, "Failed to query rate limiter.");

                Self::InternalServerError
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        error!(?error, "Received error.");

        Self::Unexpected(error)
    }
}

impl From<DateError> for ApiError {
    fn from(error: DateError) -> Self {
        Self::BadRequestReason(format!("{}.", error))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(flatten_validation_errors(&errors))
    }
}

/// Collapse validator's nested error structure into a flat map of messages.
pub fn flatten_validation_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut flattened = FieldErrors::new();
    collect_errors(&mut flattened, None, errors);

    flattened
}

fn collect_errors(into: &mut FieldErrors, prefix: Option<&str>, errors: &ValidationErrors) {
    for (field, kind) in errors.errors() {
        let name = if *field == "__all__" {
            prefix.unwrap_or(GENERAL_ERRORS_KEY).to_owned()
        } else {
            let field = camel_case(field);
            match prefix {
                Some(prefix) => format!("{}.{}", prefix, field),
                None => field,
            }
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = into.entry(name).or_default();
                for error in field_errors {
                    messages.push(match &error.message {
                        Some(message) => message.to_string(),
                        None => format!("Invalid value ({}).", error.code),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_errors(into, Some(&name), nested),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_errors(into, Some(&format!("{}[{}]", name, index)), nested);
                }
            }
        }
    }
}

fn camel_case(field: &str) -> String {
    let mut output = String::with_capacity(field.len());
    let mut capitalize = false;

    for c in field.chars() {
        if c == '_' {
            capitalize = true;
        } else if capitalize {
            output.extend(c.to_uppercase());
            capitalize = false;
        } else {
            output.push(c);
        }
    }

    output
}

pub type ApiResponse<T> = Result<T, ApiError>;
