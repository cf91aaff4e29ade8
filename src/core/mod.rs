// src/core/mod.rs

// Root of the `core` module: the orchestration engine, its data models and
// the probe adapters it drives.

/// Data structures shared across the crate: probe outcomes, per-probe
/// result models, the scenario policy type and the composite `ScanReport`.
pub mod models;

/// Probe adapters, one per external reconnaissance capability.
pub mod scanner;

/// Pure text renderers mapping structured probe results to the blocks that
/// feed the narrative prompt.
pub mod format;

/// Deterministic narrative-prompt assembly.
pub mod prompt;

/// The chat-completion client that produces the narrative analysis.
pub mod narrative;

/// The orchestration engine: probe fan-out, failure folding and report
/// assembly.
pub mod orchestrator;
