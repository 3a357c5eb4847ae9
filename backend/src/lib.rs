//! Docket: a legal-services marketplace backend.
//!
//! Clients post cases, lawyers quote on them, and a client settles one quote
//! through the payment provider. The crate is arranged hexagonally: the
//! [`domain`] owns entities, services and ports, [`inbound`] adapts HTTP and
//! WebSocket traffic onto driving ports, and [`outbound`] implements the
//! driven ports (PostgreSQL, Stripe, storage, notifications).

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
