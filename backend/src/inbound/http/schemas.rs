//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror their serialized shape and are registered with
//! utoipa under the domain type's name.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// A concurrent change was detected or the resource already exists.
    #[schema(rename = "conflict")]
    Conflict,
    /// The resource is not in a state that permits the operation.
    #[schema(rename = "invalid_state")]
    InvalidState,
    /// A per-resource limit has been reached.
    #[schema(rename = "quota_exceeded")]
    QuotaExceeded,
    /// The payment provider failed.
    #[schema(rename = "gateway_failure")]
    GatewayFailure,
    /// A backing service is temporarily unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_state")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "quote is not open for acceptance")]
    message: String,
    /// Correlation identifier echoed in the `trace-id` response header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary details, e.g. `{"field":"quote_id","code":"invalid_uuid"}`.
    details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[test]
    fn schemas_use_domain_names() {
        // utoipa replaces :: with . in schema names
        assert_eq!(ErrorCodeSchema::name(), "crate.domain.ErrorCode");
        assert_eq!(ErrorSchema::name(), "crate.domain.Error");
    }

    #[rstest]
    #[case(crate::domain::ErrorCode::InvalidRequest)]
    #[case(crate::domain::ErrorCode::Unauthorized)]
    #[case(crate::domain::ErrorCode::Forbidden)]
    #[case(crate::domain::ErrorCode::NotFound)]
    #[case(crate::domain::ErrorCode::Conflict)]
    #[case(crate::domain::ErrorCode::InvalidState)]
    #[case(crate::domain::ErrorCode::QuotaExceeded)]
    #[case(crate::domain::ErrorCode::GatewayFailure)]
    #[case(crate::domain::ErrorCode::ServiceUnavailable)]
    #[case(crate::domain::ErrorCode::InternalError)]
    fn error_code_schema_lists_every_domain_code(#[case] code: crate::domain::ErrorCode) {
        let wire = serde_json::to_value(code).expect("code serialises");
        let wire = wire.as_str().expect("code is a string");
        assert!(
            schema_to_json::<ErrorCodeSchema>().contains(&format!("\"{wire}\"")),
            "missing {wire}"
        );
    }

    #[test]
    fn error_schema_matches_wire_casing() {
        let schema_json = schema_to_json::<ErrorSchema>();
        assert!(schema_json.contains("traceId"), "trace id is camelCase");
        assert!(schema_json.contains("details"));
    }
}
