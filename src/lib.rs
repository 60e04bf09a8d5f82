//! shoot: a command-line HTTP client.
//!
//! A request goes through URL resolution (aliases and shorthands), header and
//! body assembly, optional SigV4 signing and a single traced send. The request
//! is written to the history log in the background while the response is
//! rendered.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
