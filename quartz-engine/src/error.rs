//! Engine error type.
//!
//! Every fallible operation in this crate reports failure through
//! [`EngineError`]; no panic crosses a public API boundary. The FFI
//! crate flattens these variants into stable integer status codes.

/// Errors reported by context creation and kernel dispatch.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No compatible GPU adapter was found on this machine.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// An adapter exists but the device/queue request failed.
    #[error("failed to acquire GPU device: {0}")]
    DeviceRequest(String),

    /// Caller contract violation: undersized buffer, negative or
    /// overflowing dimensions.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Dimensions are valid but exceed what this device can bind or
    /// dispatch.
    #[error("unsupported dimensions: {0}")]
    Unsupported(String),

    /// Kernel submission, execution or readback failed.
    #[error("GPU dispatch failed: {0}")]
    Dispatch(String),
}
