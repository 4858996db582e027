//! Demo reconciliation daemon backed by the in-memory store.
//!
//! Seeds a handful of resources and sample bookings, then runs the
//! reconciliation scheduler until ctrl-c. Useful for watching the
//! status lifecycle play out with `RUST_LOG=roombook=debug`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use roombook_core::{NewBooking, TracingConfig, init_tracing};
use roombook_engine::{
    BookingService, EngineResult, MemoryStore, PassKind, Reconciler, Scheduler, SchedulerConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(TracingConfig::default())?;

    let store = Arc::new(MemoryStore::new());
    let service = BookingService::new(store.clone());
    seed(&service).await?;

    let reconciler = Arc::new(Reconciler::new(store));
    let scheduler = Scheduler::new(SchedulerConfig::default());
    let handle = scheduler.handle();

    let driver = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move {
            scheduler
                .run(move |kind| {
                    let reconciler = reconciler.clone();
                    async move { run_pass(&reconciler, kind).await }
                })
                .await;
        })
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.stop().await.ok();
    driver.await?;
    Ok(())
}

async fn run_pass(
    reconciler: &Reconciler<MemoryStore>,
    kind: PassKind,
) -> Result<usize, String> {
    let now = Utc::now();
    let mut applied = reconciler
        .run_pass(now)
        .await
        .map_err(|e| e.to_string())?
        .len();

    if kind == PassKind::Full {
        applied += reconciler
            .sweep_overdue(now)
            .await
            .map_err(|e| e.to_string())?
            .len();
        applied += reconciler
            .sweep_expired(now)
            .await
            .map_err(|e| e.to_string())?
            .len();

        match reconciler.statistics().await {
            Ok(stats) => info!(
                upcoming = stats.upcoming,
                ongoing = stats.ongoing,
                past = stats.past,
                cancelled = stats.cancelled,
                "Booking statistics"
            ),
            Err(err) => warn!(error = %err, "Failed to collect statistics"),
        }
    }

    Ok(applied)
}

async fn seed(service: &BookingService<MemoryStore>) -> EngineResult<()> {
    let now = Utc::now();
    let names = [
        "Conference Room A",
        "Conference Room B",
        "Projector Unit 1",
        "Laptop Cart",
        "Video Equipment Set",
    ];

    let mut resources = Vec::new();
    for name in names {
        let resource = service.create_resource(name, now).await?;
        info!(name = %resource.name, "Seeded resource");
        resources.push(resource);
    }

    // A few demo bookings in the near future so the scheduler has
    // transitions to apply while the daemon runs.
    let samples = [
        (0, 2, 62, "John Doe"),
        (0, 180, 240, "Jane Smith"),
        (1, 30, 90, "Mike Johnson"),
    ];
    for (idx, start_min, end_min, requested_by) in samples {
        let booking = service
            .create_booking(
                NewBooking {
                    resource_id: resources[idx].id,
                    start_time: now + Duration::minutes(start_min),
                    end_time: now + Duration::minutes(end_min),
                    requested_by: requested_by.to_string(),
                },
                now,
            )
            .await?;
        info!(
            booking_id = %booking.id,
            resource = %resources[idx].name,
            requested_by = %booking.requested_by,
            "Seeded booking"
        );
    }

    Ok(())
}
