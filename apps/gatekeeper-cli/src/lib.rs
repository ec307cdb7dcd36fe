//! Caller layer around the knowledge base: input routing for `--remember`
//! and the HTTP routes.

pub mod remember;
pub mod server;
