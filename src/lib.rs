//! Grid Traffic Simulation Library
//!
//! A tick-based road traffic simulation over a tokenized grid map that can
//! be driven headless or embedded behind a transport layer.

pub mod simulation;
