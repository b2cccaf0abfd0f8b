//! Integration tests for the navigation guarantees of the shell
//!
//! All timing runs on tokio's paused clock, so loads, readiness polls and
//! reconciler ticks are deterministic.

mod common;

use common::{INIT_DELAY, harness, manifest, settle};
use phone_shell::config::ShellConfig;
use phone_shell::shell::testing::{StubApp, StubFetcher};
use phone_shell::shell::{
    BackOutcome, LiveView, OpenOutcome, PhoneShell, Screen, ShellError, ShellPhase,
    SubAppRegistry, ViewFrame,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_open_always_leaves_one_frame_for_the_target() {
    let (h, _apps) = harness(
        ShellConfig::default(),
        StubFetcher::new(),
        vec![StubApp::new("forum"), StubApp::new("feed"), StubApp::new("messages")],
    );

    for name in ["forum", "feed", "forum", "messages", "feed"] {
        let outcome = h.shell.open_app(name).await.unwrap();
        assert_eq!(outcome, OpenOutcome::Opened, "opening {}", name);

        let stack = h.shell.stack();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current().unwrap().app, name);
        assert_eq!(h.shell.active_app().as_deref(), Some(name));
        assert!(h.shell.is_showing(name));
        settle().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_back_reaches_home_within_subview_depth() {
    // No live view: root checks fall back to the stored frame
    let (h, _apps) = harness(
        ShellConfig::default(),
        StubFetcher::new(),
        vec![StubApp::new("forum")],
    );
    h.shell.open_app("forum").await.unwrap();

    assert!(h.shell.push_frame(ViewFrame::new("forum", "Thread", "detail").with_target("1")));
    assert!(h.shell.push_frame(ViewFrame::new("forum", "Reply", "compose").with_target("1")));
    assert_eq!(h.shell.stack().len(), 3);

    let mut presses = 0;
    while !h.shell.stack().is_empty() {
        settle().await;
        let outcome = h.shell.back();
        assert_ne!(outcome, BackOutcome::NoFrame);
        presses += 1;
        assert!(presses <= 2, "back did not terminate");
    }

    assert_eq!(presses, 2);
    assert!(h.shell.screen().is_home());
    assert!(h.shell.active_app().is_none());
    assert!(h.shell.header().is_none());

    settle().await;
    assert_eq!(h.shell.back(), BackOutcome::NoFrame);
}

#[tokio::test(start_paused = true)]
async fn test_double_open_within_window_is_one_transition() {
    let (h, apps) = harness(
        ShellConfig::default(),
        StubFetcher::new(),
        vec![StubApp::new("forum")],
    );

    let (first, second) = tokio::join!(h.shell.open_app("forum"), h.shell.open_app("forum"));
    let mut outcomes = vec![first.unwrap(), second.unwrap()];
    outcomes.sort_by_key(|o| format!("{:?}", o));
    assert_eq!(outcomes, vec![OpenOutcome::Debounced, OpenOutcome::Opened]);

    assert_eq!(apps[0].bind_calls(), 1);
    assert_eq!(h.shell.header_renders(), 1);
    assert_eq!(h.fetcher.fetch_count_for("forum"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_later_open_wins_over_slow_load() {
    let fetcher = StubFetcher::new().with_app_latency("feed", Duration::from_secs(3));
    let (h, _apps) = harness(
        ShellConfig::default(),
        fetcher,
        vec![StubApp::new("feed"), StubApp::new("messages")],
    );

    let slow = h.shell.clone();
    let feed = tokio::spawn(async move { slow.open_app("feed").await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.shell.screen(), Screen::Loading { app: "feed".to_string() });

    assert_eq!(h.shell.open_app("messages").await.unwrap(), OpenOutcome::Opened);
    assert_eq!(feed.await.unwrap().unwrap(), OpenOutcome::Stale);

    let stack = h.shell.stack();
    assert_eq!(stack.len(), 1);
    assert_eq!(stack.current().unwrap().app, "messages");
    assert!(h.shell.is_showing("messages"));
    assert!(h.shell.loader().is_loaded("feed"));
    assert_eq!(h.shell.loader().stats().stale_discarded, 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_loads_share_one_operation() {
    let fetcher = StubFetcher::new().with_latency(Duration::from_millis(100));
    let (h, _apps) = harness(ShellConfig::default(), fetcher, vec![StubApp::new("feed")]);
    let loader = h.shell.loader();

    let a = loader.begin("feed");
    let b = loader.begin("feed");
    assert_eq!(a.id, b.id);
    assert!(!a.deduplicated);
    assert!(b.deduplicated);

    let (ra, rb) = tokio::join!(a.wait(), b.wait());
    assert!(ra.is_ok() && rb.is_ok());
    assert_eq!(h.fetcher.fetch_count_for("feed"), 2);

    // Loaded once, never fetched again
    loader.load("feed").await.unwrap();
    assert_eq!(h.fetcher.fetch_count_for("feed"), 2);
    assert_eq!(loader.stats().started, 1);
    assert_eq!(loader.stats().deduplicated, 1);
}

#[tokio::test(start_paused = true)]
async fn test_module_that_never_registers_fails_then_retries_fresh() {
    let registry = Arc::new(SubAppRegistry::new());
    registry.add_manifest(manifest("live"));
    let fetcher = Arc::new(StubFetcher::new());
    let shell = PhoneShell::new(ShellConfig::default(), registry, fetcher.clone());
    shell.show();

    let started = tokio::time::Instant::now();
    let err = shell.open_app("live").await.unwrap_err();
    assert!(matches!(err, ShellError::NotInitialized { attempts: 10, .. }));
    assert!(started.elapsed() >= Duration::from_secs(5));

    // Stack untouched, retryable error in place of content
    assert!(shell.stack().is_empty());
    assert!(matches!(shell.screen(), Screen::Error { retryable: true, .. }));
    assert_eq!(shell.phase(), ShellPhase::Idle);
    assert!(!shell.loader().is_loading("live"));
    assert_eq!(fetcher.fetch_count_for("live"), 2);

    let retried = shell.retry().await;
    assert!(matches!(retried, Err(ShellError::NotInitialized { .. })));
    assert_eq!(fetcher.fetch_count_for("live"), 4);
    assert_eq!(shell.loader().stats().failed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_hung_fetch_hits_hard_timeout() {
    let fetcher = StubFetcher::new().with_app_latency("feed", Duration::from_secs(60));
    let (h, _apps) = harness(ShellConfig::default(), fetcher, vec![StubApp::new("feed")]);

    let started = tokio::time::Instant::now();
    let err = h.shell.open_app("feed").await.unwrap_err();
    assert!(matches!(err, ShellError::LoadTimeout { .. }));
    assert!(started.elapsed() >= Duration::from_secs(15));
    assert!(started.elapsed() < Duration::from_secs(16));
    assert_eq!(h.shell.loader().stats().timed_out, 1);
    assert!(h.shell.stack().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_quiet_ticks_never_rerender_header() {
    let (h, apps) = harness(
        ShellConfig::default(),
        StubFetcher::new(),
        vec![StubApp::new("forum").with_live_view()],
    );
    h.shell.open_app("forum").await.unwrap();
    assert_eq!(h.shell.header_renders(), 1);

    // Fast ticks and then slow ticks, nothing changes
    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(h.shell.header_renders(), 1);

    apps[0].navigate(LiveView::new("detail").with_target("3"));
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(h.shell.header_renders(), 2);
    assert_eq!(h.shell.current_frame().unwrap().view, "detail");
}

#[tokio::test(start_paused = true)]
async fn test_hidden_shell_does_not_reconcile() {
    let (h, apps) = harness(
        ShellConfig::default(),
        StubFetcher::new(),
        vec![StubApp::new("forum").with_live_view()],
    );
    h.shell.open_app("forum").await.unwrap();

    h.shell.hide();
    assert!(!h.shell.reconciler().is_running());
    apps[0].navigate(LiveView::new("detail").with_target("8"));
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(h.shell.current_frame().unwrap().view, "root");

    h.shell.show();
    assert!(h.shell.reconciler().is_running());
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(h.shell.current_frame().unwrap().target_id.as_deref(), Some("8"));
}

#[tokio::test(start_paused = true)]
async fn test_pushed_views_fold_without_polling() {
    let (h, apps) = harness(
        ShellConfig::default(),
        StubFetcher::new(),
        vec![StubApp::new("messages").pushing()],
    );
    h.shell.open_app("messages").await.unwrap();
    assert!(h.registry.pushes_updates("messages"));
    tokio::time::sleep(Duration::from_millis(1)).await;

    apps[0].navigate(LiveView::new("conversation").with_target("c1").with_counter(4));
    tokio::time::sleep(Duration::from_millis(5)).await;

    let frame = h.shell.current_frame().unwrap();
    assert_eq!(frame.view, "conversation");
    assert_eq!(frame.counter_value, Some(4));
    assert_eq!(h.shell.header().unwrap().title, "Messages (4)");
}

#[tokio::test(start_paused = true)]
async fn test_back_while_loading_abandons_the_load() {
    let fetcher = StubFetcher::new().with_app_latency("feed", Duration::from_secs(2));
    let (h, _apps) = harness(ShellConfig::default(), fetcher, vec![StubApp::new("feed")]);

    let slow = h.shell.clone();
    let feed = tokio::spawn(async move { slow.open_app("feed").await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(matches!(h.shell.phase(), ShellPhase::Loading { .. }));

    assert_eq!(h.shell.back(), BackOutcome::CancelledLoad);
    assert!(h.shell.screen().is_home());
    assert!(!h.shell.has_pending_intent());

    assert_eq!(feed.await.unwrap().unwrap(), OpenOutcome::Stale);
    assert!(h.shell.screen().is_home());
    assert!(h.shell.stack().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_go_home_clears_everything() {
    let (h, _apps) = harness(
        ShellConfig::default(),
        StubFetcher::new(),
        vec![StubApp::new("forum").with_live_view()],
    );
    h.shell.open_app("forum").await.unwrap();
    assert!(h.shell.reconciler().is_running());

    assert!(h.shell.go_home());
    assert!(h.shell.stack().is_empty());
    assert!(h.shell.active_app().is_none());
    assert!(h.shell.screen().is_home());
    assert!(!h.shell.reconciler().is_running());

    // Already home
    settle().await;
    assert!(!h.shell.go_home());
}

#[tokio::test(start_paused = true)]
async fn test_reopen_at_root_is_noop() {
    let (h, apps) = harness(
        ShellConfig::default(),
        StubFetcher::new(),
        vec![StubApp::new("forum")],
    );
    h.shell.open_app("forum").await.unwrap();
    tokio::time::sleep(INIT_DELAY + common::SETTLE).await;

    assert_eq!(h.shell.open_app("forum").await.unwrap(), OpenOutcome::AlreadyOpen);
    assert_eq!(apps[0].bind_calls(), 1);
    assert_eq!(h.shell.recent_apps(), vec!["forum".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_back_reaches_home_when_app_reports_subview_without_handler() {
    let (h, apps) = harness(
        ShellConfig::default(),
        StubFetcher::new(),
        vec![StubApp::new("feed").with_live_view()],
    );
    h.shell.open_app("feed").await.unwrap();

    apps[0].navigate(LiveView::new("post").with_target("7"));
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(h.shell.current_frame().unwrap().view, "post");

    let mut outcomes = Vec::new();
    while !h.shell.stack().is_empty() && outcomes.len() < 5 {
        settle().await;
        outcomes.push(h.shell.back());
    }

    assert_eq!(outcomes, vec![BackOutcome::WentHome]);
    assert!(h.shell.screen().is_home());
}

#[tokio::test(start_paused = true)]
async fn test_home_control_clears_failed_open_from_home() {
    let registry = Arc::new(SubAppRegistry::new());
    registry.add_manifest(manifest("feed"));
    let shell = PhoneShell::new(ShellConfig::default(), registry, Arc::new(StubFetcher::new()));
    shell.show();

    assert!(shell.open_app("feed").await.is_err());
    assert!(matches!(shell.screen(), Screen::Error { .. }));
    assert!(shell.stack().is_empty());

    assert!(shell.go_home());
    assert!(shell.screen().is_home());
    assert!(shell.header().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_back_clears_failed_open_from_home() {
    let registry = Arc::new(SubAppRegistry::new());
    registry.add_manifest(manifest("feed"));
    let shell = PhoneShell::new(ShellConfig::default(), registry, Arc::new(StubFetcher::new()));
    shell.show();

    assert!(shell.open_app("feed").await.is_err());
    assert_eq!(shell.back(), BackOutcome::WentHome);
    assert!(shell.screen().is_home());

    settle().await;
    assert_eq!(shell.back(), BackOutcome::NoFrame);
}

#[tokio::test(start_paused = true)]
async fn test_second_waiter_on_shared_load_does_not_reopen() {
    let fetcher = StubFetcher::new().with_latency(Duration::from_millis(800));
    let (h, apps) = harness(ShellConfig::default(), fetcher, vec![StubApp::new("forum")]);

    let early = h.shell.clone();
    let first = tokio::spawn(async move { early.open_app("forum").await });
    tokio::time::sleep(Duration::from_millis(400)).await;

    let second = h.shell.open_app("forum").await.unwrap();
    let first = first.await.unwrap().unwrap();
    let mut outcomes = vec![first, second];
    outcomes.sort_by_key(|o| format!("{:?}", o));
    assert_eq!(outcomes, vec![OpenOutcome::AlreadyOpen, OpenOutcome::Opened]);

    assert_eq!(apps[0].bind_calls(), 1);
    assert_eq!(h.shell.header_renders(), 1);
    assert_eq!(h.shell.loader().stats().deduplicated, 1);
    assert_eq!(h.shell.stack().len(), 1);
}
