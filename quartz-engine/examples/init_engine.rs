use quartz_engine::EngineContext;

fn main() {
    env_logger::init();
    println!("Initializing engine context...");
    match EngineContext::new() {
        Ok(ctx) => println!("Engine context ready on {}", ctx.adapter_info()),
        Err(err) => println!("No GPU engine available: {err}"),
    }
}
