//! Filebridge - WhatsApp file assistant.
//!
//! This crate implements a conversational front-end for file storage,
//! conversion, and retrieval over WhatsApp. Inbound webhook events drive a
//! per-user state machine that stores files, lists previously stored files,
//! converts files between formats, or answers natural-language questions
//! about an uploaded PDF.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
