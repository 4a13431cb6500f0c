use quartz_engine::{ops, EngineContext, EngineError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Creates an engine context, or returns None when no GPU adapter is
/// available (absence of hardware is an expected condition; the tests
/// that need a device skip themselves in that case).
fn gpu_context() -> Option<EngineContext> {
    match EngineContext::new() {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}

/// Reference CPU matrix product, row-major.
fn cpu_matmul(a: &[f32], b: &[f32], m: usize, n: usize, k: usize) -> Vec<f32> {
    let mut c = vec![0.0f32; m * n];
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0f32;
            for p in 0..k {
                acc += a[i * k + p] * b[p * n + j];
            }
            c[i * n + j] = acc;
        }
    }
    c
}

fn random_matrix(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

fn assert_approx_eq(got: &[f32], want: &[f32], tol: f32) {
    assert_eq!(got.len(), want.len());
    for (i, (g, w)) in got.iter().zip(want.iter()).enumerate() {
        assert!(
            (g - w).abs() <= tol,
            "element {i} differs: got {g}, want {w}"
        );
    }
}

#[test]
fn matmul_known_2x2() {
    let Some(ctx) = gpu_context() else { return };

    let a = [1.0f32, 2.0, 3.0, 4.0];
    let b = [5.0f32, 6.0, 7.0, 8.0];
    let mut c = [0.0f32; 4];

    ops::matmul(&ctx, &a, &b, &mut c, 2, 2, 2).unwrap();
    assert_approx_eq(&c, &[19.0, 22.0, 43.0, 50.0], 1e-5);
}

#[test]
fn matmul_matches_cpu_reference() {
    let Some(ctx) = gpu_context() else { return };
    let mut rng = StdRng::seed_from_u64(1);

    // Shapes straddling the 16x16 tile boundaries, plus degenerate-ish
    // small ones.
    for &(m, n, k) in &[
        (1usize, 1usize, 1usize),
        (4, 5, 3),
        (7, 9, 2),
        (16, 16, 16),
        (17, 33, 5),
        (31, 2, 64),
    ] {
        let a = random_matrix(&mut rng, m * k);
        let b = random_matrix(&mut rng, k * n);
        let mut c = vec![0.0f32; m * n];

        ops::matmul(&ctx, &a, &b, &mut c, m, n, k).unwrap();
        let want = cpu_matmul(&a, &b, m, n, k);
        // Tolerance scales with the reduction length.
        let tol = 1e-4 * (k as f32).max(1.0);
        assert_approx_eq(&c, &want, tol);
    }
}

#[test]
fn matmul_zero_dims_are_noop_success() {
    let Some(ctx) = gpu_context() else { return };

    // k == 0: mathematically the product is all zeros.
    let mut c = vec![7.0f32; 6];
    ops::matmul(&ctx, &[], &[], &mut c, 2, 3, 0).unwrap();
    assert_eq!(c, vec![0.0f32; 6]);

    // m == 0 and n == 0: nothing to write.
    let mut empty: Vec<f32> = Vec::new();
    ops::matmul(&ctx, &[], &[1.0, 2.0], &mut empty, 0, 2, 1).unwrap();
    ops::matmul(&ctx, &[1.0, 2.0], &[], &mut empty, 2, 0, 1).unwrap();
}

#[test]
fn matmul_rejects_undersized_buffers() {
    let Some(ctx) = gpu_context() else { return };

    let a = [1.0f32, 2.0, 3.0, 4.0];
    let b = [5.0f32, 6.0, 7.0, 8.0];
    let mut c_short = [0.0f32; 3];

    let err = ops::matmul(&ctx, &a, &b, &mut c_short, 2, 2, 2).unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    let mut c = [0.0f32; 4];
    let err = ops::matmul(&ctx, &a[..3], &b, &mut c, 2, 2, 2).unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));
}

#[test]
fn matmul_context_reuse_matches_fresh_contexts() {
    let Some(ctx) = gpu_context() else { return };
    let mut rng = StdRng::seed_from_u64(2);

    let shapes = [(3usize, 4usize, 5usize), (16, 16, 16), (9, 2, 21)];
    let cases: Vec<_> = shapes
        .iter()
        .map(|&(m, n, k)| {
            let a = random_matrix(&mut rng, m * k);
            let b = random_matrix(&mut rng, k * n);
            (m, n, k, a, b)
        })
        .collect();

    // Sequential calls of varying shapes on one long-lived context must
    // produce the same results as single-use contexts: no cross-call
    // state leakage.
    for (m, n, k, a, b) in &cases {
        let mut reused = vec![0.0f32; m * n];
        ops::matmul(&ctx, a, b, &mut reused, *m, *n, *k).unwrap();

        let fresh_ctx = EngineContext::new().unwrap();
        let mut fresh = vec![0.0f32; m * n];
        ops::matmul(&fresh_ctx, a, b, &mut fresh, *m, *n, *k).unwrap();

        assert_approx_eq(&reused, &fresh, 1e-5);
    }
}

#[test]
fn matmul_is_idempotent() {
    let Some(ctx) = gpu_context() else { return };
    let mut rng = StdRng::seed_from_u64(3);

    let (m, n, k) = (8usize, 6usize, 10usize);
    let a = random_matrix(&mut rng, m * k);
    let b = random_matrix(&mut rng, k * n);

    let mut first = vec![0.0f32; m * n];
    let mut second = vec![0.0f32; m * n];
    ops::matmul(&ctx, &a, &b, &mut first, m, n, k).unwrap();
    ops::matmul(&ctx, &a, &b, &mut second, m, n, k).unwrap();

    // Same context, same inputs: bitwise-identical outputs.
    assert_eq!(first, second);
}
