//! Flat C-callable boundary for the quartz GPU engine.
//!
//! The exported surface is four functions: create/release an opaque
//! engine context, plus one entry point per kernel. Handles are single
//! pointer-sized values; all failure is communicated through integer
//! status codes and nothing ever unwinds across the boundary. See
//! `include/quartz_engine.h` for the C declarations.
//!
//! Ownership never transfers for numeric buffers: the caller allocates
//! and frees `a`, `b`, `c`, `x`, `y`, and the engine only reads or
//! writes within the declared bounds. The context handle is owned by
//! the caller between create and release; passing a released handle to
//! any operation is undefined behavior (null is detected and rejected).

use std::os::raw::c_int;
use std::panic::{catch_unwind, AssertUnwindSafe};

use quartz_engine::{ops, EngineContext, EngineError};

/// Operation completed and the output buffer is fully populated.
pub const QUARTZ_OK: c_int = 0;
/// Caller contract violation: null handle/pointer, negative dimension
/// or a dimension product that overflows.
pub const QUARTZ_ERR_INVALID_ARGUMENT: c_int = 1;
/// GPU submission, execution or readback failed; the context remains
/// valid and the caller should recompute on a CPU path.
pub const QUARTZ_ERR_DISPATCH: c_int = 2;
/// A panic was trapped at the boundary.
pub const QUARTZ_ERR_PANIC: c_int = 3;

fn status_of(err: &EngineError) -> c_int {
    match err {
        EngineError::InvalidArgument(_) => QUARTZ_ERR_INVALID_ARGUMENT,
        EngineError::NoAdapter
        | EngineError::DeviceRequest(_)
        | EngineError::Unsupported(_)
        | EngineError::Dispatch(_) => QUARTZ_ERR_DISPATCH,
    }
}

/// Create a new engine context. Returns null on failure (no compatible
/// GPU, device request failure); callers must then use a CPU path for
/// the engine's lifetime.
#[no_mangle]
pub extern "C" fn quartz_engine_create_context() -> *mut EngineContext {
    let result = catch_unwind(EngineContext::new);
    match result {
        Ok(Ok(ctx)) => Box::into_raw(Box::new(ctx)),
        Ok(Err(err)) => {
            log::warn!("engine context creation failed: {err}");
            std::ptr::null_mut()
        }
        Err(_) => std::ptr::null_mut(),
    }
}

/// Release a context previously returned by
/// [`quartz_engine_create_context`]. Null is a no-op; a handle must
/// not be used again after this call.
#[no_mangle]
pub extern "C" fn quartz_engine_release_context(ctx: *mut EngineContext) {
    if ctx.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // Safety: the caller guarantees this is a live handle from
        // quartz_engine_create_context that has not been released.
        drop(unsafe { Box::from_raw(ctx) });
    }));
}

/// Matrix multiply `c = a * b` with `a` m x k, `b` k x n, `c` m x n,
/// all row-major contiguous float32, caller-allocated.
///
/// Returns `QUARTZ_OK` only when `c` holds the complete product. On a
/// nonzero return the contents of `c` are unspecified. Null data
/// pointers are accepted only when the matching element count is zero.
#[no_mangle]
pub extern "C" fn quartz_matmul_f32(
    ctx: *const EngineContext,
    a: *const f32,
    b: *const f32,
    c: *mut f32,
    m: c_int,
    n: c_int,
    k: c_int,
) -> c_int {
    catch_unwind(AssertUnwindSafe(|| {
        let ctx = match unsafe { ctx.as_ref() } {
            Some(ctx) => ctx,
            None => return QUARTZ_ERR_INVALID_ARGUMENT,
        };
        let (m, n, k) = match (dim(m), dim(n), dim(k)) {
            (Some(m), Some(n), Some(k)) => (m, n, k),
            _ => return QUARTZ_ERR_INVALID_ARGUMENT,
        };
        let (Some(mk), Some(kn), Some(mn)) =
            (m.checked_mul(k), k.checked_mul(n), m.checked_mul(n))
        else {
            return QUARTZ_ERR_INVALID_ARGUMENT;
        };
        let (Some(a), Some(b), Some(c)) = (
            unsafe { slice_in(a, mk) },
            unsafe { slice_in(b, kn) },
            unsafe { slice_out(c, mn) },
        ) else {
            return QUARTZ_ERR_INVALID_ARGUMENT;
        };
        match ops::matmul(ctx, a, b, c, m, n, k) {
            Ok(()) => QUARTZ_OK,
            Err(err) => {
                log::warn!("matmul failed: {err}");
                status_of(&err)
            }
        }
    }))
    .unwrap_or(QUARTZ_ERR_PANIC)
}

/// Row-wise sum over a row-major rows x cols float32 matrix `x`,
/// writing per-row sums into `y` (length >= rows).
///
/// Returns `QUARTZ_OK` only when `y` holds all row sums. On a nonzero
/// return the contents of `y` are unspecified.
#[no_mangle]
pub extern "C" fn quartz_row_sum_f32(
    ctx: *const EngineContext,
    x: *const f32,
    y: *mut f32,
    rows: c_int,
    cols: c_int,
) -> c_int {
    catch_unwind(AssertUnwindSafe(|| {
        let ctx = match unsafe { ctx.as_ref() } {
            Some(ctx) => ctx,
            None => return QUARTZ_ERR_INVALID_ARGUMENT,
        };
        let (rows, cols) = match (dim(rows), dim(cols)) {
            (Some(rows), Some(cols)) => (rows, cols),
            _ => return QUARTZ_ERR_INVALID_ARGUMENT,
        };
        let Some(total) = rows.checked_mul(cols) else {
            return QUARTZ_ERR_INVALID_ARGUMENT;
        };
        let (Some(x), Some(y)) = (unsafe { slice_in(x, total) }, unsafe { slice_out(y, rows) })
        else {
            return QUARTZ_ERR_INVALID_ARGUMENT;
        };
        match ops::row_sum(ctx, x, y, rows, cols) {
            Ok(()) => QUARTZ_OK,
            Err(err) => {
                log::warn!("row_sum failed: {err}");
                status_of(&err)
            }
        }
    }))
    .unwrap_or(QUARTZ_ERR_PANIC)
}

fn dim(value: c_int) -> Option<usize> {
    usize::try_from(value).ok()
}

/// Safety: when `len > 0`, `ptr` must reference at least `len`
/// readable f32 values that stay valid and unaliased for the call.
unsafe fn slice_in<'a>(ptr: *const f32, len: usize) -> Option<&'a [f32]> {
    if len == 0 {
        return Some(&[]);
    }
    if ptr.is_null() {
        return None;
    }
    Some(std::slice::from_raw_parts(ptr, len))
}

/// Safety: when `len > 0`, `ptr` must reference at least `len`
/// writable f32 values that stay valid and unaliased for the call.
unsafe fn slice_out<'a>(ptr: *mut f32, len: usize) -> Option<&'a mut [f32]> {
    if len == 0 {
        return Some(&mut []);
    }
    if ptr.is_null() {
        return None;
    }
    Some(std::slice::from_raw_parts_mut(ptr, len))
}
