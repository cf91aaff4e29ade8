// src/core/scanner/mod.rs

// Public interface of the `scanner` module. Each sub-module wraps one
// external capability behind the same contract: execute once, return the
// structured result or a typed `ProbeError`. Timeouts are owned here, at
// the adapter level, never by the engine.

pub mod dns_scanner;
pub mod dork_scanner;
pub mod port_scanner;
pub mod whois_scanner;
