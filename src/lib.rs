// Module layout (Clean Architecture style)
// - bootstrap: configuration, wiring and router assembly
// - infrastructure: Postgres adapters
// - presentation: HTTP handlers, guards and middleware
// - application: ports, use cases, validation and rich-text policy
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
