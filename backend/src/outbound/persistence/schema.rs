//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes the schema, regenerate with `diesel print-schema` or
//! update by hand.

diesel::table! {
    /// Registered clients and lawyers. `email` is unique.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Text,
        name -> Varchar,
        /// `client` or `lawyer`.
        role -> Varchar,
        jurisdiction -> Nullable<Varchar>,
        bar_number -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Legal cases posted by clients.
    cases (id) {
        id -> Uuid,
        client_id -> Uuid,
        title -> Varchar,
        category -> Varchar,
        description -> Text,
        /// `open` or `engaged`.
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Lawyer quotes; one per lawyer per case, at most one accepted per case.
    quotes (id) {
        id -> Uuid,
        case_id -> Uuid,
        lawyer_id -> Uuid,
        amount -> Numeric,
        expected_days -> Int4,
        note -> Text,
        /// `proposed`, `accepted` or `rejected`.
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Payment attempts keyed by provider payment-link id.
    payments (id) {
        id -> Uuid,
        quote_id -> Uuid,
        payment_link_id -> Varchar,
        amount -> Numeric,
        /// `pending` or `succeeded`.
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Metadata for files uploaded to cases.
    case_files (id) {
        id -> Uuid,
        case_id -> Uuid,
        file_name -> Varchar,
        storage_path -> Text,
        file_size -> Int8,
        mime_type -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(cases -> users (client_id));
diesel::joinable!(quotes -> cases (case_id));
diesel::joinable!(payments -> quotes (quote_id));
diesel::joinable!(case_files -> cases (case_id));

diesel::allow_tables_to_appear_in_same_query!(users, cases, quotes, payments, case_files);
