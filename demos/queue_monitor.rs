use queue_realtime_rs::types::ENDPOINT_ENV_VAR;
use queue_realtime_rs::{FeedClientOptions, QueueApi, RealtimeFeedClient, demo_queue};
use tracing_subscriber::EnvFilter;

/// Prints the live queue of one department until Ctrl-C
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let department_id: i64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1);

    let base = std::env::var(ENDPOINT_ENV_VAR).unwrap_or_default();
    let client = RealtimeFeedClient::new(base.clone(), FeedClientOptions::default())?;

    // Seed the view from REST (or demo data) before the first push arrives
    let initial = if client.is_enabled() {
        QueueApi::from_ws_endpoint(&base)?
            .fetch_queue_or_demo(department_id)
            .await
    } else {
        demo_queue(department_id, 8)
    };
    println!(
        "Department {}: {} patient(s) in queue",
        department_id,
        initial.queue.len()
    );

    let subscription = client.subscribe_queue_updates(department_id, move |update| {
        println!(
            "Department {}: {} patient(s) in queue",
            update.department_id,
            update.queue.len()
        );
        for item in &update.queue {
            println!(
                "  {:<8} {:<20} {}",
                item.ticket_number.as_deref().unwrap_or("-"),
                item.patient_name.as_deref().unwrap_or("-"),
                item.status.as_deref().unwrap_or("-")
            );
        }
    });

    tracing::info!("Watching department {} as {:?}", department_id, subscription.id());

    if let Err(e) = client.connect().await {
        println!("Live updates unavailable: {}", e);
    }

    tokio::signal::ctrl_c().await?;

    subscription.unsubscribe();
    client.disconnect().await;
    println!("Disconnected!");

    Ok(())
}
