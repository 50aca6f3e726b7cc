//! Background sweeper tests
//!
//! The sweeper runs on real tokio time while entry expiry follows the
//! injected manual clock, so expired state can be staged instantly and
//! the sweep observed within a few ticks.

use std::time::Duration;

use nutrio::tasks::Sweeper;

use crate::common::TestApp;

#[tokio::test]
async fn test_sweeper_drops_expired_entries_and_windows() {
    let app = TestApp::spawn().await;

    app.state
        .caches
        .general
        .set_with_ttl("stale", &"v", Duration::from_secs(1))
        .unwrap();
    app.state.limiters.general.check("1.2.3.4");
    assert_eq!(app.state.caches.general.stats().size, 1);
    assert_eq!(app.state.limiters.general.window_count(), 1);

    // Everything is now expired from the sweeper's point of view.
    app.clock.advance(Duration::from_secs(3600));

    let sweeper = Sweeper::start(app.state.clone(), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(100)).await;
    sweeper.stop().await;

    assert_eq!(app.state.caches.general.stats().size, 0);
    assert_eq!(app.state.limiters.general.window_count(), 0);
}

#[tokio::test]
async fn test_sweeper_preserves_live_entries() {
    let app = TestApp::spawn().await;

    app.state.caches.general.set("live", &"v").unwrap();

    let sweeper = Sweeper::start(app.state.clone(), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(100)).await;
    sweeper.stop().await;

    assert!(app.state.caches.general.has("live"));
}

#[tokio::test]
async fn test_sweeper_stops_cleanly() {
    let app = TestApp::spawn().await;

    let sweeper = Sweeper::start(app.state.clone(), Duration::from_secs(3600));
    // stop() must return promptly even though the next tick is an hour out.
    sweeper.stop().await;
}
