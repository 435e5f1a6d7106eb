//! The request-forwarding engine.
//!
//! Accepts HTTP/1.1 connections, matches each request against the latest
//! configuration snapshot, applies the matched rule's operations, selects
//! a healthy backend through the group's load balancer, and streams the
//! upstream exchange through without buffering.

pub mod body;
mod client;
mod error;
mod server;

pub use client::{BackendClient, HttpClient};
pub use error::{ProxyError, ProxyResult};
pub use server::Proxy;
