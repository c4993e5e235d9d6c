//! HTTP API: server, routing, and request/response mapping for the merge wizard.

pub mod app;
