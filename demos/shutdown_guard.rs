//! Process-wide manager - the teardown guard delays exit until tasks finish

use std::time::Duration;

fn main() {
    let _teardown = strand::teardown_guard();

    strand::init_global(
        strand::ManagerConfig::builder()
            .thread_name_prefix("background")
            .build()
            .expect("valid config"),
    )
    .expect("global manager not yet created");

    for i in 0..3u64 {
        let _ = strand::spawn(move || {
            std::thread::sleep(Duration::from_millis(100 * (i + 1)));
            println!("background task {} done", i);
        });
    }

    println!("main is returning; the guard waits for background tasks");
}
