//! Kernel dispatch operations.
//!
//! Each operation here is stateless and single-shot: it validates the
//! caller's shapes, uploads the input slices, runs exactly one compute
//! submission on the context's queue, blocks until the readback
//! completes and copies the result into the caller-owned output slice.
//! No state persists between calls other than the borrowed
//! [`EngineContext`] resources.
//!
//! Zero-sized dimensions are a documented fast-success no-op: the
//! output region is zero-filled where it has nonzero extent (which is
//! the mathematically correct product for `k == 0`, and the correct
//! empty-row sum for `cols == 0`) and no GPU work is submitted.

use wgpu::util::DeviceExt;

use crate::context::EngineContext;
use crate::error::EngineError;

/// Uniform parameter block shared by all kernels (must match the WGSL
/// `vec4<u32>` layout).
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ShapeParams {
    x: u32,
    y: u32,
    z: u32,
    _pad: u32,
}

const TILE_SIZE: u32 = 16;
const ROW_SUM_WORKGROUP: u32 = 64;

/// Matrix multiply: writes `c = a * b` where `a` is `m x k`, `b` is
/// `k x n` and `c` is `m x n`, all row-major contiguous `f32`.
///
/// `a`, `b` and `c` must hold at least `m*k`, `k*n` and `m*n`
/// elements. On error the contents of `c` are unspecified and the
/// caller is expected to recompute on a CPU path. A failed dispatch
/// does not invalidate the context.
pub fn matmul(
    ctx: &EngineContext,
    a: &[f32],
    b: &[f32],
    c: &mut [f32],
    m: usize,
    n: usize,
    k: usize,
) -> Result<(), EngineError> {
    let mk = checked_len(m, k, "m * k")?;
    let kn = checked_len(k, n, "k * n")?;
    let mn = checked_len(m, n, "m * n")?;
    check_buffer("a", a.len(), mk)?;
    check_buffer("b", b.len(), kn)?;
    check_buffer("c", c.len(), mn)?;

    if m == 0 || n == 0 {
        return Ok(());
    }
    if k == 0 {
        c[..mn].fill(0.0);
        return Ok(());
    }

    let (m32, k32, n32) = (dim_u32(m)?, dim_u32(k)?, dim_u32(n)?);
    let params = ShapeParams {
        x: m32,
        y: k32,
        z: n32,
        _pad: 0,
    };
    let workgroups = (
        div_ceil(n32, TILE_SIZE),
        div_ceil(m32, TILE_SIZE),
        1,
    );

    let out = run_kernel(
        ctx,
        &ctx.kernels.matmul,
        &[&a[..mk], &b[..kn]],
        params,
        mn,
        workgroups,
    )?;
    c[..mn].copy_from_slice(&out);
    Ok(())
}

/// Row-wise sum: for a row-major `rows x cols` matrix `x`, writes
/// `y[i] = sum_j x[i, j]` for each of the `rows` rows.
///
/// `x` must hold at least `rows*cols` elements and `y` at least
/// `rows`. Accumulation is sequential within a row, so results are
/// deterministic for identical inputs on the same device.
pub fn row_sum(
    ctx: &EngineContext,
    x: &[f32],
    y: &mut [f32],
    rows: usize,
    cols: usize,
) -> Result<(), EngineError> {
    let total = checked_len(rows, cols, "rows * cols")?;
    check_buffer("x", x.len(), total)?;
    check_buffer("y", y.len(), rows)?;

    if rows == 0 {
        return Ok(());
    }
    if cols == 0 {
        y[..rows].fill(0.0);
        return Ok(());
    }

    let (rows32, cols32) = (dim_u32(rows)?, dim_u32(cols)?);
    let params = ShapeParams {
        x: rows32,
        y: cols32,
        z: 0,
        _pad: 0,
    };
    let workgroups = (div_ceil(rows32, ROW_SUM_WORKGROUP), 1, 1);

    let out = run_kernel(
        ctx,
        &ctx.kernels.row_sum,
        &[&x[..total]],
        params,
        rows,
        workgroups,
    )?;
    y[..rows].copy_from_slice(&out);
    Ok(())
}

// ----------------------------------------------------------------------------
// Shared dispatch / marshalling path
// ----------------------------------------------------------------------------

/// Upload inputs, run one compute pass and read the output back.
///
/// Bind group layout convention: input storage buffers occupy bindings
/// `0..inputs.len()`, the output storage buffer comes next, and the
/// uniform parameter block is last. The WGSL entry points follow the
/// same ordering.
fn run_kernel(
    ctx: &EngineContext,
    pipeline: &wgpu::ComputePipeline,
    inputs: &[&[f32]],
    params: ShapeParams,
    out_len: usize,
    workgroups: (u32, u32, u32),
) -> Result<Vec<f32>, EngineError> {
    let device = &ctx.device;
    let out_bytes = (out_len * std::mem::size_of::<f32>()) as u64;

    check_limits(ctx, inputs, out_bytes, workgroups)?;

    // Capture validation and OOM errors instead of letting them hit
    // the uncaptured-error handler, which would abort the process.
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

    let input_buffers: Vec<wgpu::Buffer> = inputs
        .iter()
        .map(|data| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Kernel Input"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE,
            })
        })
        .collect();

    let out_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Kernel Output"),
        size: out_bytes,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Kernel Params"),
        contents: bytemuck::bytes_of(&params),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let layout = pipeline.get_bind_group_layout(0);
    let mut entries = Vec::with_capacity(inputs.len() + 2);
    for (i, buffer) in input_buffers.iter().enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: i as u32,
            resource: buffer.as_entire_binding(),
        });
    }
    entries.push(wgpu::BindGroupEntry {
        binding: input_buffers.len() as u32,
        resource: out_buffer.as_entire_binding(),
    });
    entries.push(wgpu::BindGroupEntry {
        binding: input_buffers.len() as u32 + 1,
        resource: params_buffer.as_entire_binding(),
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: None,
        layout: &layout,
        entries: &entries,
    });

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Kernel Staging"),
        size: out_bytes,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor::default());
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(workgroups.0, workgroups.1, workgroups.2);
    }
    encoder.copy_buffer_to_buffer(&out_buffer, 0, &staging, 0, out_bytes);
    ctx.queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    let map_result = pollster::block_on(rx.receive());

    let oom = pollster::block_on(device.pop_error_scope());
    let validation = pollster::block_on(device.pop_error_scope());
    if let Some(err) = oom.or(validation) {
        log::warn!("kernel dispatch failed: {err}");
        return Err(EngineError::Dispatch(err.to_string()));
    }

    match map_result {
        Some(Ok(())) => {}
        Some(Err(err)) => return Err(EngineError::Dispatch(err.to_string())),
        None => {
            return Err(EngineError::Dispatch(
                "readback mapping was dropped before completion".into(),
            ))
        }
    }

    let data = slice.get_mapped_range();
    let out: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
    drop(data);
    staging.unmap();

    Ok(out)
}

// ----------------------------------------------------------------------------
// Validation helpers
// ----------------------------------------------------------------------------

fn checked_len(a: usize, b: usize, what: &str) -> Result<usize, EngineError> {
    a.checked_mul(b)
        .ok_or_else(|| EngineError::InvalidArgument(format!("{what} overflows usize")))
}

fn check_buffer(name: &str, have: usize, need: usize) -> Result<(), EngineError> {
    if have < need {
        return Err(EngineError::InvalidArgument(format!(
            "buffer `{name}` too small: have {have} elements, need {need}"
        )));
    }
    Ok(())
}

fn dim_u32(dim: usize) -> Result<u32, EngineError> {
    u32::try_from(dim)
        .map_err(|_| EngineError::Unsupported(format!("dimension {dim} exceeds u32 range")))
}

fn check_limits(
    ctx: &EngineContext,
    inputs: &[&[f32]],
    out_bytes: u64,
    workgroups: (u32, u32, u32),
) -> Result<(), EngineError> {
    let limits = ctx.device.limits();
    let max_binding = limits.max_storage_buffer_binding_size as u64;

    let largest_input = inputs
        .iter()
        .map(|data| (data.len() * std::mem::size_of::<f32>()) as u64)
        .max()
        .unwrap_or(0);
    let largest = largest_input.max(out_bytes);
    if largest > max_binding {
        return Err(EngineError::Unsupported(format!(
            "buffer of {largest} bytes exceeds device storage binding limit of {max_binding}"
        )));
    }

    let max_groups = limits.max_compute_workgroups_per_dimension;
    let (x, y, z) = workgroups;
    if x > max_groups || y > max_groups || z > max_groups {
        return Err(EngineError::Unsupported(format!(
            "dispatch of {x}x{y}x{z} workgroups exceeds device limit of {max_groups}"
        )));
    }
    Ok(())
}

fn div_ceil(value: u32, divisor: u32) -> u32 {
    (value + divisor - 1) / divisor
}
