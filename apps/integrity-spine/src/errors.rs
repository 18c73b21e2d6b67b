// [apps/integrity-spine/src/errors.rs]
/*!
 * =================================================================
 * APARATO: SPINE ERROR TAXONOMY (V1.0 - SPINE GENESIS)
 * CLASIFICACION: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: TRADUCCION UNICA DE FALLOS DE DOMINIO A HTTP
 *
 * Unico punto de conversion entre los catalogos de error internos
 * (DbError, LedgerError, PolicyError, LifecycleError) y el codigo de
 * estado HTTP que ve el cliente. Ningun handler construye una
 * respuesta de error a mano.
 * =================================================================
 */

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use spine_domain_lifecycle::LifecycleError;
use spine_domain_policy::PolicyError;
use spine_infra_db::errors::DbError;
use spine_infra_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpineError {
    #[error("validation_error: {0}")]
    Validation(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("permission_denied: {0}")]
    PermissionDenied(String),

    #[error("not_found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("precondition_required: {0}")]
    PreconditionRequired(String),

    #[error("resource_exhausted: {0}")]
    ResourceExhausted(String),

    #[error("internal: {0}")]
    Internal(String),

    #[error("service_unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("timeout: {0}")]
    Timeout(String),
}

impl SpineError {
    fn code(&self) -> StatusCode {
        match self {
            SpineError::Validation(_) => StatusCode::BAD_REQUEST,
            SpineError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            SpineError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            SpineError::NotFound(_) => StatusCode::NOT_FOUND,
            SpineError::Conflict(_) => StatusCode::CONFLICT,
            SpineError::PreconditionRequired(_) => StatusCode::PRECONDITION_REQUIRED,
            SpineError::ResourceExhausted(_) => StatusCode::TOO_MANY_REQUESTS,
            SpineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SpineError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SpineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn taxonomy(&self) -> &'static str {
        match self {
            SpineError::Validation(_) => "validation_error",
            SpineError::Unauthenticated(_) => "unauthenticated",
            SpineError::PermissionDenied(_) => "permission_denied",
            SpineError::NotFound(_) => "not_found",
            SpineError::Conflict(_) => "conflict",
            SpineError::PreconditionRequired(_) => "precondition_required",
            SpineError::ResourceExhausted(_) => "resource_exhausted",
            SpineError::Internal(_) => "internal",
            SpineError::ServiceUnavailable(_) => "service_unavailable",
            SpineError::Timeout(_) => "timeout",
        }
    }

    /// Solo los errores 5xx/timeout son candidatos a reintento por el llamador.
    pub fn retryable(&self) -> bool {
        matches!(self, SpineError::Internal(_) | SpineError::ServiceUnavailable(_) | SpineError::Timeout(_))
    }
}

impl IntoResponse for SpineError {
    fn into_response(self) -> axum::response::Response {
        let status = self.code();
        if status.is_server_error() {
            tracing::error!(error = %self, taxonomy = self.taxonomy(), "spine_request_failed");
        } else {
            tracing::warn!(error = %self, taxonomy = self.taxonomy(), "spine_request_rejected");
        }
        let body = Json(json!({
            "error": self.taxonomy(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<DbError> for SpineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UserNotFound | DbError::AssetNotFound | DbError::LifecycleEventNotFound | DbError::VerifierCacheMiss => {
                SpineError::NotFound(err.to_string())
            }
            DbError::ConsentPolicyNotFound => SpineError::NotFound(err.to_string()),
            DbError::MutationIdConflict(_) | DbError::ProvenanceSequenceViolation(_) => SpineError::Conflict(err.to_string()),
            DbError::AuditChainBroken(_) => SpineError::Internal(err.to_string()),
            DbError::BreakerOpen(_) => SpineError::ServiceUnavailable(err.to_string()),
            DbError::SessionPoolExhausted => SpineError::ResourceExhausted(err.to_string()),
            DbError::ConnectionError(_) | DbError::ConfigurationError(_) | DbError::QueryError(_) | DbError::MappingError(_) | DbError::TransactionError(_) => {
                SpineError::Internal(err.to_string())
            }
        }
    }
}

impl From<LedgerError> for SpineError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unreachable(_) => SpineError::ServiceUnavailable(err.to_string()),
            LedgerError::PermanentRejection(_) => SpineError::Validation(err.to_string()),
            LedgerError::DecodeError(_) => SpineError::Internal(err.to_string()),
        }
    }
}

impl From<PolicyError> for SpineError {
    fn from(err: PolicyError) -> Self {
        SpineError::Validation(err.to_string())
    }
}

impl From<LifecycleError> for SpineError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidTransition { .. } => SpineError::Conflict(err.to_string()),
            LifecycleError::DissolveAuthRequired | LifecycleError::BurnProofRequired => SpineError::PreconditionRequired(err.to_string()),
            LifecycleError::BurnProofInvalid => SpineError::PermissionDenied(err.to_string()),
        }
    }
}
