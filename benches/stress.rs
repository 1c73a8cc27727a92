use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use ulid::Ulid;

use frontdesk::engine::Engine;

const ROOMS: u32 = 10;
const RESERVATIONS_PER_ROOM: u64 = 500;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

#[tokio::main]
async fn main() {
    let dir = std::env::temp_dir().join("frontdesk_bench");
    std::fs::create_dir_all(&dir).unwrap();
    let wal_path = dir.join(format!("stress_{}.wal", Ulid::new()));

    let engine = Arc::new(Engine::new(wal_path.clone()).unwrap());

    let mut room_ids = Vec::new();
    for n in 0..ROOMS {
        let room = engine
            .create_room(100 + n, "Standard".into(), 100.0)
            .await
            .unwrap();
        room_ids.push(room.id);
    }

    let base: NaiveDate = "2024-01-01".parse().unwrap();

    println!(
        "stress: {} rooms × {} one-night reservations each",
        ROOMS, RESERVATIONS_PER_ROOM
    );

    // Phase 1: creates — each later create scans a longer history
    let mut create_latencies = Vec::new();
    let mut reservation_ids = Vec::new();
    for k in 0..RESERVATIONS_PER_ROOM {
        for &room_id in &room_ids {
            let check_in = base.checked_add_days(Days::new(k)).unwrap();
            let check_out = base.checked_add_days(Days::new(k + 1)).unwrap();
            let start = Instant::now();
            let view = engine
                .create_reservation(room_id, "Bench Guest".into(), None, check_in, check_out)
                .await
                .unwrap();
            create_latencies.push(start.elapsed());
            reservation_ids.push(view.reservation.id);
        }
    }
    print_latency("create_reservation", &mut create_latencies);

    // Phase 2: conflicting creates — rejected by the availability scan
    let mut conflict_latencies = Vec::new();
    for &room_id in &room_ids {
        for k in 0..100u64 {
            let check_in = base.checked_add_days(Days::new(k * 3)).unwrap();
            let check_out = base.checked_add_days(Days::new(k * 3 + 2)).unwrap();
            let start = Instant::now();
            let result = engine
                .create_reservation(room_id, "Overlap".into(), None, check_in, check_out)
                .await;
            conflict_latencies.push(start.elapsed());
            assert!(result.is_err(), "overlap must be rejected");
        }
    }
    print_latency("create_reservation (conflict)", &mut conflict_latencies);

    // Phase 3: full lifecycle on a subset
    let mut lifecycle_latencies = Vec::new();
    for &id in reservation_ids.iter().take(1000) {
        let start = Instant::now();
        engine.check_in(id).await.unwrap();
        engine.check_out(id).await.unwrap();
        lifecycle_latencies.push(start.elapsed());
    }
    print_latency("check_in + check_out", &mut lifecycle_latencies);

    // Phase 4: cancel the rest
    let mut cancel_latencies = Vec::new();
    for &id in reservation_ids.iter().skip(1000) {
        let start = Instant::now();
        engine.cancel_reservation(id).await.unwrap();
        cancel_latencies.push(start.elapsed());
    }
    print_latency("cancel_reservation", &mut cancel_latencies);

    let start = Instant::now();
    engine.compact_wal().await.unwrap();
    println!(
        "  compact_wal: {:.2}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    let _ = std::fs::remove_file(&wal_path);
}
