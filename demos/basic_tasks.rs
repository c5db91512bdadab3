//! Basic usage - spawn, read, fire-and-forget, drain

use std::time::Duration;
use strand::prelude::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Basic Tasks Example ===\n");

    let manager = TaskManager::new();

    let answer = manager.spawn(|| 21 * 2);
    println!("21 * 2 = {}", answer.get().unwrap());

    let failing = manager.spawn(|| -> u32 { panic!("boom") });
    match failing.get() {
        Ok(value) => println!("unexpected value {}", value),
        Err(err) => println!("task failed as expected: {}", err),
    }

    let parsed = manager.spawn_fallible(|| "x1".parse::<u8>());
    if let Err(err) = parsed.get() {
        println!("fallible task: {}", err);
    }

    // Fire and forget: dropping the handle does not wait.
    for i in 0..5u64 {
        let _ = manager.spawn(move || {
            std::thread::sleep(Duration::from_millis(20 * i));
        });
    }
    println!("\nlive tasks right after spawning: {}", manager.live_count());

    let cached = manager.spawn_with_result("from cache");
    println!("precomputed: {} ({:?})", cached.get().unwrap(), cached.wait().unwrap());

    manager.wait_all();
    println!("live tasks after wait_all: {}", manager.live_count());

    let metrics = manager.metrics();
    println!(
        "spawned {} / completed {} / panicked {} / failed {}",
        metrics.tasks_spawned, metrics.tasks_completed, metrics.tasks_panicked, metrics.tasks_failed
    );

    println!("\n=== Example Complete ===");
}
