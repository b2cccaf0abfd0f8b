//! End-to-end walkthroughs: stub applications first, then the bundled
//! applications behind the simulated host

mod common;

use common::{harness, settle};
use crossterm::event::KeyCode;
use phone_shell::apps::{self, DemoHost, live};
use phone_shell::config::ShellConfig;
use phone_shell::shell::testing::{StubApp, StubFetcher};
use phone_shell::shell::{BackOutcome, HeaderAction, LiveView, OpenOutcome, PhoneShell, Screen};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_forum_detail_and_back_twice() {
    let (h, apps) = harness(
        ShellConfig::default(),
        StubFetcher::new(),
        vec![StubApp::new("forum").with_live_view().with_root_handler()],
    );
    let forum = &apps[0];

    assert_eq!(h.shell.open_app("forum").await.unwrap(), OpenOutcome::Opened);
    let frames = h.shell.stack();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames.current().unwrap().app, "forum");
    assert_eq!(frames.current().unwrap().view, "root");

    // The user taps a thread inside the forum; the shell is not told
    forum.navigate(LiveView::new("detail").with_target("42"));
    tokio::time::sleep(Duration::from_millis(600)).await;

    let frame = h.shell.current_frame().unwrap();
    assert_eq!(frame.app, "forum");
    assert_eq!(frame.view, "detail");
    assert_eq!(frame.target_id.as_deref(), Some("42"));
    assert_eq!(h.shell.stack().len(), 1);

    assert_eq!(h.shell.back(), BackOutcome::ReturnedToRoot);
    assert_eq!(forum.root_resets(), 1);
    assert!(forum.current_view().is_root("root"));
    let frames = h.shell.stack();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames.current().unwrap().view, "root");
    assert!(frames.current().unwrap().target_id.is_none());

    settle().await;
    assert_eq!(h.shell.back(), BackOutcome::WentHome);
    assert!(h.shell.stack().is_empty());
    assert!(h.shell.screen().is_home());
}

#[tokio::test(start_paused = true)]
async fn test_slow_feed_then_messages() {
    let fetcher = StubFetcher::new().with_app_latency("feed", Duration::from_secs(4));
    let (h, _apps) = harness(
        ShellConfig::default(),
        fetcher,
        vec![StubApp::new("feed"), StubApp::new("messages")],
    );

    let slow = h.shell.clone();
    let feed = tokio::spawn(async move { slow.open_app("feed").await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    h.shell.open_app("messages").await.unwrap();
    assert_eq!(feed.await.unwrap().unwrap(), OpenOutcome::Stale);

    // Let anything still scheduled run out
    tokio::time::sleep(Duration::from_secs(2)).await;
    match h.shell.screen() {
        Screen::App { app, .. } => assert_eq!(app, "messages"),
        other => panic!("expected messages on screen, got {:?}", other),
    }
    assert_eq!(h.shell.active_app().as_deref(), Some("messages"));
    assert_eq!(h.shell.stack().len(), 1);
}

fn bundled_shell() -> PhoneShell {
    let registry = apps::bundled_registry();
    let host = DemoHost::new(registry.clone())
        .with_latency(Duration::from_millis(20), Duration::from_millis(80))
        .with_init_delay(Duration::from_millis(100));
    let shell = PhoneShell::new(ShellConfig::default(), registry, Arc::new(host));
    shell.show();
    shell
}

#[tokio::test(start_paused = true)]
async fn test_bundled_forum_through_header_controls() {
    let shell = bundled_shell();
    assert_eq!(shell.open_app("forum").await.unwrap(), OpenOutcome::Opened);

    let action = shell.press_key(KeyCode::Char('2')).unwrap();
    assert_eq!(action, Some(HeaderAction::App("open:102".to_string())));
    tokio::time::sleep(Duration::from_millis(600)).await;

    let frame = shell.current_frame().unwrap();
    assert_eq!(frame.view, "thread");
    assert_eq!(frame.target_id.as_deref(), Some("102"));
    assert_eq!(frame.counter_value, Some(1));

    // Thread controls replaced the list controls
    assert_eq!(shell.press_key(KeyCode::Char('2')).unwrap(), None);
    shell.press_control("next-page").unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(shell.current_frame().unwrap().counter_value, Some(2));

    assert_eq!(shell.press_key(KeyCode::Esc).unwrap(), Some(HeaderAction::Back));
    assert_eq!(shell.current_frame().unwrap().view, "root");

    settle().await;
    assert_eq!(shell.press_key(KeyCode::Home).unwrap(), Some(HeaderAction::Home));
    assert!(shell.screen().is_home());
}

#[tokio::test(start_paused = true)]
async fn test_bundled_live_uses_its_own_root_view() {
    let shell = bundled_shell();
    shell.open_app(live::NAME).await.unwrap();
    assert_eq!(shell.current_frame().unwrap().view, live::LOBBY_VIEW);

    shell.press_key(KeyCode::Char('1')).unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let frame = shell.current_frame().unwrap();
    assert_eq!(frame.view, "room");
    assert_eq!(shell.header().unwrap().title, "Speedrun marathon (1280)");

    assert_eq!(shell.back(), BackOutcome::ReturnedToRoot);
    settle().await;
    assert_eq!(shell.back(), BackOutcome::WentHome);
}

#[tokio::test(start_paused = true)]
async fn test_bundled_settings_needs_no_load() {
    let shell = bundled_shell();
    assert_eq!(shell.open_app("settings").await.unwrap(), OpenOutcome::Opened);
    assert_eq!(shell.loader().stats().started, 0);

    shell.press_key(KeyCode::Char('d')).unwrap();
    settle().await;
    assert_eq!(shell.open_app("settings").await.unwrap(), OpenOutcome::AlreadyOpen);

    let snapshot = shell.snapshot();
    assert_eq!(snapshot.active_app.as_deref(), Some("settings"));
    assert_eq!(snapshot.screen, "app settings");
    assert_eq!(snapshot.stack.len(), 1);
}
