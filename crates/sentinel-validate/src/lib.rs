//! Ordered 17-layer validation pipeline for generation candidates.
//!
//! The battery is a small dependency graph of independent check functions,
//! not an inheritance chain: each layer declares its index, its blocking
//! severity, and optionally the layer that must have passed before it can
//! run. Layers 1-4 (structure) run sequentially and short-circuit; the rest
//! run concurrently where independent, and results are always merged back
//! into canonical 1..17 order before the verdict is computed.

mod layers;
mod pipeline;

pub use layers::{standard_layers, CheckLayer, LayerInput, LayerOutcome};
pub use pipeline::ValidationPipeline;
