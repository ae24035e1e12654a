//! Authenticated client for the catalogue REST API.
//!
//! The crate follows a hexagonal layout: [`domain`] owns the request client,
//! error normalisation, and the ports it drives; [`outbound`] provides the
//! reqwest transport and session stores; [`config`] loads runtime settings.

pub mod config;
pub mod domain;
pub mod outbound;
