//! Actix middleware shared by every route.
//!
//! [`Trace`] gives each request a trace id that handlers and error
//! responses echo back in the `trace-id` header.

pub mod trace;

pub use trace::Trace;
