// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Assent Protocol — Core Primitives
//!
//! Assent is a multi-token ledger where nobody receives tokens they did not
//! ask for. A mint to an externally-controlled account needs that account's
//! own signature over the exact mint parameters; a mint to a programmable
//! account needs the account's callback to say yes.
//!
//! This crate holds the pieces both sides of that handshake share:
//!
//! - **types** — 20-byte addresses and 256-bit token ids / amounts.
//! - **crypto** — Keccak-256, secp256k1 keys, recoverable signatures.
//! - **config** — Protocol constants: digest domains, callback signatures,
//!   default ports.
//!
//! The ledger itself lives in `assent-contracts`; the node that serves it
//! lives in `assent-node`.

pub mod config;
pub mod crypto;
pub mod types;
