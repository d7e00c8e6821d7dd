use std::time::Duration;
use queue_realtime_rs::{FeedClientOptions, RealtimeFeedClient};

/// Test reconnection behavior against a running queue server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing to see logs
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let client = RealtimeFeedClient::from_env(FeedClientOptions::default())?;
    let Some(endpoint) = client.endpoint() else {
        return Err("QUEUE_WS_URL must be set in .env".into());
    };
    println!("Connecting to: {}\n", endpoint);

    // Test 1: Connect and verify
    println!("Test 1: Initial connection...");
    client.connect().await?;
    assert!(client.is_connected().await, "Should be connected");
    println!("Connected successfully!\n");

    tokio::time::sleep(Duration::from_secs(2)).await;

    // Test 2: Manual disconnect should NOT trigger reconnection
    println!("Test 2: Manual disconnect (should NOT auto-reconnect)...");
    client.disconnect().await;
    assert!(!client.is_connected().await, "Should be disconnected");

    println!("Waiting 5 seconds to verify no auto-reconnect...");
    tokio::time::sleep(Duration::from_secs(5)).await;
    if client.is_connected().await {
        return Err("Should NOT reconnect after manual disconnect".into());
    }
    println!("Correctly stayed disconnected after manual disconnect!\n");

    // Test 3: Subscribe reopens the feed and heals dropped connections
    println!("Test 3: Subscribing (opens the feed in the background)...");
    let subscription = client.subscribe(|payload| {
        println!("\nReceived: {}", payload);
    });

    println!("Interrupt the server or your network to watch the backoff in the logs.\n");
    let mut states = client.state_changes();
    for i in 1..=30 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let state = *states.borrow_and_update();
        print!("\rSecond {}/30 - Status: {:?}    ", i, state);
        std::io::Write::flush(&mut std::io::stdout())?;
    }
    println!("\n");

    // Test 4: Removing the last observer closes the feed
    println!("Test 4: Unsubscribing the last observer...");
    subscription.unsubscribe();
    tokio::time::sleep(Duration::from_millis(500)).await;
    println!("Final status: {:?}", client.state());

    Ok(())
}
