use quartz_engine::{ops, EngineContext};

fn main() {
    env_logger::init();
    let ctx = match EngineContext::new() {
        Ok(ctx) => ctx,
        Err(err) => {
            println!("No GPU engine available: {err}");
            return;
        }
    };
    println!("Running on {}", ctx.adapter_info());

    // C = A x B for two 2x2 matrices.
    let a = [1.0f32, 2.0, 3.0, 4.0];
    let b = [5.0f32, 6.0, 7.0, 8.0];
    let mut c = [0.0f32; 4];
    ops::matmul(&ctx, &a, &b, &mut c, 2, 2, 2).expect("matmul failed");
    println!("A x B = [[{}, {}], [{}, {}]]", c[0], c[1], c[2], c[3]);

    // Per-row sums of a 2x3 matrix.
    let x = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
    let mut y = [0.0f32; 2];
    ops::row_sum(&ctx, &x, &mut y, 2, 3).expect("row_sum failed");
    println!("row sums = [{}, {}]", y[0], y[1]);
}
