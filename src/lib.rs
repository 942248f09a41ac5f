// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ledger Web Authentication Service
//!
//! This crate implements a stateless challenge-response authentication
//! protocol: a client proves control of a ledger account by signing a
//! server-issued, time-bounded challenge envelope, and the server verifies
//! the account's signer weights before minting a short-lived JWT.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `challenge` - Challenge building, encoding and verification
//! - `ledger` - Ledger account lookup client
//! - `token` - JWT issuance

pub mod api;
pub mod challenge;
pub mod config;
pub mod ledger;
pub mod state;
pub mod token;
