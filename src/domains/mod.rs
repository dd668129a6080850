//! Domains module containing business logic organized by bounded contexts.
//!
//! The server exposes a single capability, tools, each of which forwards one
//! call to the Symphony REST API.

pub mod tools;
