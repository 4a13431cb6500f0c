//! Quartz Engine - GPU dense linear algebra primitives
//!
//! This crate exposes a small set of GPU-accelerated numeric kernels
//! (matrix multiply, row-wise sum) dispatched through a reusable
//! [`EngineContext`]. The context owns every expensive-to-create GPU
//! resource (adapter binding, device, command queue, compiled compute
//! pipelines) exactly once; each operation borrows the context,
//! performs a single synchronous GPU submission and writes its result
//! into a caller-owned buffer.
//!
//! All operations return `Result` so that callers can fall back to a
//! CPU implementation when the GPU path is unavailable or fails.
//! Nothing in this crate panics on missing hardware: absence of a
//! compatible adapter is an expected, recoverable condition surfaced
//! as [`EngineError::NoAdapter`].
//!
//! Thread model: a single `EngineContext` does not add locking on top
//! of what wgpu's queue provides. Use one context per submitting
//! thread, or serialize calls externally. Distinct contexts are fully
//! independent and may be used concurrently.

pub use wgpu; // Re-export wgpu for downstream crates

mod context;
mod error;
mod kernels;
pub mod ops;

pub use context::EngineContext;
pub use error::EngineError;
