use quartz_engine::{ops, EngineContext, EngineError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn gpu_context() -> Option<EngineContext> {
    match EngineContext::new() {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}

/// Reference CPU per-row sum, sequential accumulation like the kernel.
fn cpu_row_sum(x: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    (0..rows)
        .map(|i| x[i * cols..(i + 1) * cols].iter().sum())
        .collect()
}

fn assert_approx_eq(got: &[f32], want: &[f32], tol: f32) {
    assert_eq!(got.len(), want.len());
    for (i, (g, w)) in got.iter().zip(want.iter()).enumerate() {
        assert!(
            (g - w).abs() <= tol,
            "row {i} differs: got {g}, want {w}"
        );
    }
}

#[test]
fn row_sum_known_2x3() {
    let Some(ctx) = gpu_context() else { return };

    let x = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
    let mut y = [0.0f32; 2];

    ops::row_sum(&ctx, &x, &mut y, 2, 3).unwrap();
    assert_approx_eq(&y, &[6.0, 15.0], 1e-5);
}

#[test]
fn row_sum_matches_cpu_reference() {
    let Some(ctx) = gpu_context() else { return };
    let mut rng = StdRng::seed_from_u64(99);

    for &(rows, cols) in &[(1usize, 1usize), (8, 16), (65, 3), (2, 257), (130, 130)] {
        let x: Vec<f32> = (0..rows * cols)
            .map(|_| rng.gen_range(-1.0f32..1.0))
            .collect();
        let mut y = vec![0.0f32; rows];

        ops::row_sum(&ctx, &x, &mut y, rows, cols).unwrap();
        let want = cpu_row_sum(&x, rows, cols);
        let tol = 1e-4 * (cols as f32).max(1.0);
        assert_approx_eq(&y, &want, tol);
    }
}

#[test]
fn row_sum_zero_dims_are_noop_success() {
    let Some(ctx) = gpu_context() else { return };

    // cols == 0: every row sum is the empty sum.
    let mut y = [3.0f32, 3.0, 3.0];
    ops::row_sum(&ctx, &[], &mut y, 3, 0).unwrap();
    assert_eq!(y, [0.0, 0.0, 0.0]);

    // rows == 0: nothing to write.
    let mut empty: Vec<f32> = Vec::new();
    ops::row_sum(&ctx, &[], &mut empty, 0, 5).unwrap();
}

#[test]
fn row_sum_rejects_undersized_buffers() {
    let Some(ctx) = gpu_context() else { return };

    let x = [1.0f32; 6];
    let mut y_short = [0.0f32; 1];
    let err = ops::row_sum(&ctx, &x, &mut y_short, 2, 3).unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    let mut y = [0.0f32; 2];
    let err = ops::row_sum(&ctx, &x[..5], &mut y, 2, 3).unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));
}

#[test]
fn row_sum_is_deterministic() {
    let Some(ctx) = gpu_context() else { return };
    let mut rng = StdRng::seed_from_u64(7);

    let (rows, cols) = (12usize, 48usize);
    let x: Vec<f32> = (0..rows * cols)
        .map(|_| rng.gen_range(-1.0f32..1.0))
        .collect();

    let mut first = vec![0.0f32; rows];
    let mut second = vec![0.0f32; rows];
    ops::row_sum(&ctx, &x, &mut first, rows, cols).unwrap();
    ops::row_sum(&ctx, &x, &mut second, rows, cols).unwrap();

    assert_eq!(first, second);
}
