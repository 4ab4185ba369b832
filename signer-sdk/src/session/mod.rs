//! Identity sessions: binding a client to the login lifecycle.

pub(crate) mod core;
pub(crate) mod idle;
