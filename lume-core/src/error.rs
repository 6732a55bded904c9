use thiserror::Error;

/// One shared error enum covering every public operation. Distinguishes
/// caller-contract violations (`InvalidArgument`, `FeatureNotSupported`) from
/// runtime failures (`OutOfMemory`, `DeviceLost`, `SurfaceLost`, `OutOfDate`)
/// and backend-internal exceptions caught at the FFI boundary (`Unknown`).
/// Non-error outcomes (`Timeout`, `NotReady`) are not represented here; they
/// are returned as `Ok(Status::Timeout)` / `Ok(Status::NotReady)` so `?`
/// propagation never treats "not yet" as failure.
#[derive(Debug, Error)]
pub enum LumeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("handle not found in registry")]
    NotFound,
    #[error("out of memory")]
    OutOfMemory,
    #[error("device lost")]
    DeviceLost,
    #[error("surface lost")]
    SurfaceLost,
    #[error("swapchain out of date")]
    OutOfDate,
    #[error("backend not loaded")]
    BackendNotLoaded,
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),
    #[error("backend error: {0}")]
    Unknown(String),
}

pub type LumeResult<T> = Result<T, LumeError>;

impl LumeError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        LumeError::InvalidArgument(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        LumeError::Unknown(msg.into())
    }
}

/// Non-error outcomes a blocking wait may return. `wait(t)` returns
/// `Timeout` (positive, non-error) rather than `Err` when `t` elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Timeout,
    NotReady,
}
