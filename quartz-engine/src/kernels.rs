//! GPU Compute Kernels (WGSL)
//!
//! All compute shaders are defined here in WebGPU Shading Language and
//! compiled once per context. Entry point names are the only coupling
//! between this file and the dispatch layer.

pub(crate) const KERNELS_WGSL: &str = r#"
// ============================================================================
// QUARTZ ENGINE - GPU COMPUTE KERNELS
// ============================================================================
// Dense float32 linear algebra primitives. All matrices are row-major
// contiguous.
// ============================================================================

// --- Tiled Matrix Multiplication: C (m x n) = A (m x k) * B (k x n) ---
@group(0) @binding(0) var<storage, read> mm_a: array<f32>;
@group(0) @binding(1) var<storage, read> mm_b: array<f32>;
@group(0) @binding(2) var<storage, read_write> mm_out: array<f32>;
@group(0) @binding(3) var<uniform> mm_params: vec4<u32>; // m, k, n, padding

var<workgroup> tile_a: array<array<f32, 16>, 16>;
var<workgroup> tile_b: array<array<f32, 16>, 16>;

@compute @workgroup_size(16, 16, 1)
fn matmul(@builtin(global_invocation_id) global_id: vec3<u32>, @builtin(local_invocation_id) local_id: vec3<u32>) {
    let row = global_id.y;
    let col = global_id.x;
    let m = mm_params.x;
    let k = mm_params.y;
    let n = mm_params.z;

    var acc = 0.0;
    let num_tiles = (k + 15u) / 16u;

    for (var t = 0u; t < num_tiles; t = t + 1u) {
        let c_a = t * 16u + local_id.x;
        if (row < m && c_a < k) {
            tile_a[local_id.y][local_id.x] = mm_a[row * k + c_a];
        } else {
            tile_a[local_id.y][local_id.x] = 0.0;
        }

        let r_b = t * 16u + local_id.y;
        if (r_b < k && col < n) {
            tile_b[local_id.y][local_id.x] = mm_b[r_b * n + col];
        } else {
            tile_b[local_id.y][local_id.x] = 0.0;
        }

        workgroupBarrier();
        for (var i = 0u; i < 16u; i = i + 1u) {
            acc = acc + tile_a[local_id.y][i] * tile_b[i][local_id.x];
        }
        workgroupBarrier();
    }

    if (row < m && col < n) {
        mm_out[row * n + col] = acc;
    }
}

// --- Row-wise Sum: y[i] = sum_j X[i, j] for a row-major (rows x cols) X ---
// One invocation per row; the in-row accumulation is sequential so the
// result is deterministic for identical inputs on the same device.
@group(0) @binding(0) var<storage, read> rs_x: array<f32>;
@group(0) @binding(1) var<storage, read_write> rs_y: array<f32>;
@group(0) @binding(2) var<uniform> rs_params: vec4<u32>; // rows, cols, padding

@compute @workgroup_size(64)
fn row_sum(@builtin(global_invocation_id) global_id: vec3<u32>) {
    let row = global_id.x;
    let rows = rs_params.x;
    let cols = rs_params.y;
    if (row >= rows) { return; }

    var acc = 0.0;
    let base = row * cols;
    for (var j = 0u; j < cols; j = j + 1u) {
        acc = acc + rs_x[base + j];
    }
    rs_y[row] = acc;
}
"#;
