mod support;

use std::sync::Arc;
use std::time::Duration;

use rotator_core::{
    ConfigError, DashboardId, FilePositionStore, NavigationError, PageMetrics,
    PositionStore, RotationPhase, RotationRuntime, ScrollSettings,
};
use support::{
    Page, RecordingSurface, ScriptedSource, SlowPositionStore, assert_near,
    dashboards, settings, settle,
};
use tokio::time::sleep;

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value)
}

#[tokio::test(start_paused = true)]
async fn flat_pages_rotate_on_dwell() {
    let surface = Arc::new(RecordingSurface::new());
    let source = Arc::new(ScriptedSource::always(&["a", "b"]));
    let handle =
        RotationRuntime::new(settings(), source.clone(), surface.clone())
            .spawn();

    sleep(secs(21.0)).await;

    assert_eq!(surface.loaded_ids(), ["a", "b", "a", "b", "a"]);
    for (idx, (_, at)) in surface.loads().into_iter().enumerate() {
        assert_near(at, secs(5.0 * idx as f64));
    }
    assert!(surface.scrolls().is_empty());
    // Each wraparound back to the first dashboard re-reads the configuration.
    assert_eq!(source.calls(), 3);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn dwell_includes_scroll_time() {
    let surface = Arc::new(
        RecordingSurface::new()
            .with_page("a", Page::Loads(PageMetrics::new(3_000.0, 1_000.0))),
    );
    let list = dashboards(&["a", "b"])
        .into_iter()
        .map(|d| d.with_dwell(secs(10.0)))
        .collect();
    let source = Arc::new(ScriptedSource::new(Ok(list)));
    let handle =
        RotationRuntime::new(settings(), source, surface.clone()).spawn();

    sleep(secs(11.0)).await;

    let loads = surface.loads();
    assert_eq!(loads[0].0, "a");
    assert_eq!(loads[1].0, "b");
    assert_near(loads[1].1, secs(10.0));

    let scrolls = surface.scrolls();
    assert_eq!(scrolls.len(), 40);
    let (last_offset, last_at) = scrolls[scrolls.len() - 1];
    assert_eq!(last_offset, 2_000.0);
    assert_near(last_at, secs(4.0));
    assert!(scrolls.windows(2).all(|pair| pair[0].0 <= pair[1].0));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn dwell_shorter_than_scroll_advances_when_scroll_ends() {
    let surface = Arc::new(
        RecordingSurface::new()
            .with_page("a", Page::Loads(PageMetrics::new(3_000.0, 1_000.0))),
    );
    let list = dashboards(&["a", "b"])
        .into_iter()
        .map(|d| d.with_dwell(secs(1.0)))
        .collect();
    let source = Arc::new(ScriptedSource::new(Ok(list)));
    let handle =
        RotationRuntime::new(settings(), source, surface.clone()).spawn();

    sleep(secs(4.5)).await;

    let loads = surface.loads();
    assert_eq!(loads.len(), 2);
    assert_near(loads[1].1, secs(4.0));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failing_dashboard_is_skipped_after_retry_limit() {
    let surface = Arc::new(RecordingSurface::new().with_page(
        "a",
        Page::Fails(NavigationError::NetworkFailure("refused".into())),
    ));
    let source = Arc::new(ScriptedSource::always(&["a", "b"]));
    let handle =
        RotationRuntime::new(settings(), source, surface.clone()).spawn();

    sleep(secs(26.0)).await;

    let loads = surface.loads();
    let ids: Vec<_> = loads.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids[..8], ["a", "a", "a", "b", "a", "a", "a", "b"]);
    let expected = [0.0, 5.0, 10.0, 10.0, 15.0, 20.0, 25.0, 25.0];
    for ((_, at), expected) in loads.iter().zip(expected) {
        assert_near(*at, secs(expected));
    }

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn hanging_load_times_out() {
    let surface =
        Arc::new(RecordingSurface::new().with_page("a", Page::Hangs));
    let mut config = settings();
    config.load_timeout = secs(2.0);
    config.backoff = secs(1.0);
    config.retry_limit = 2;
    let source = Arc::new(ScriptedSource::always(&["a", "b"]));
    let handle = RotationRuntime::new(config, source, surface.clone()).spawn();

    sleep(secs(2.5)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.phase, RotationPhase::Error);
    assert_eq!(snapshot.current_failures, 1);

    sleep(secs(3.0)).await;
    let loads = surface.loads();
    assert_eq!(surface.loaded_ids(), ["a", "a", "b"]);
    assert_near(loads[1].1, secs(3.0));
    assert_near(loads[2].1, secs(5.0));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unreachable_refresh_keeps_last_good_list() {
    let surface = Arc::new(RecordingSurface::new());
    let source = Arc::new(
        ScriptedSource::new(Err(ConfigError::Unreachable("timeout".into())))
            .then(Ok(dashboards(&["a", "b"]))),
    );
    let handle =
        RotationRuntime::new(settings(), source.clone(), surface.clone())
            .spawn();

    sleep(secs(21.0)).await;

    assert_eq!(surface.loaded_ids(), ["a", "b", "a", "b", "a"]);
    assert!(source.calls() >= 2);
    assert_eq!(handle.snapshot().len(), 2);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn manual_selection_interrupts_scrolling() {
    let surface = Arc::new(
        RecordingSurface::new()
            .with_page("a", Page::Loads(PageMetrics::new(5_000.0, 1_000.0))),
    );
    let mut config = settings();
    config.scroll = ScrollSettings {
        duration: secs(20.0),
        ..config.scroll
    };
    let source = Arc::new(ScriptedSource::always(&["a", "b", "c"]));
    let handle = RotationRuntime::new(config, source, surface.clone()).spawn();

    sleep(secs(2.0)).await;
    assert_eq!(handle.snapshot().phase, RotationPhase::Scrolling);
    handle.select("c").await.expect("select");
    settle().await;

    let loads = surface.loads();
    assert_eq!(surface.loaded_ids(), ["a", "c"]);
    let selected_at = loads[1].1;
    assert_near(selected_at, secs(2.0));

    sleep(secs(3.0)).await;
    assert!(
        surface.scrolls().iter().all(|(_, at)| *at <= selected_at),
        "scroll ticks of the previous dashboard leaked past the selection"
    );
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.current_id().map(DashboardId::as_str), Some("c"));
    assert_eq!(snapshot.phase, RotationPhase::Dwelling);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unknown_selection_is_ignored() {
    let surface = Arc::new(RecordingSurface::new());
    let source = Arc::new(ScriptedSource::always(&["a", "b"]));
    let handle =
        RotationRuntime::new(settings(), source, surface.clone()).spawn();

    sleep(secs(1.0)).await;
    handle.select("nope").await.expect("select");
    sleep(secs(1.0)).await;

    assert_eq!(surface.loaded_ids(), ["a"]);
    assert_eq!(handle.snapshot().phase, RotationPhase::Dwelling);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn refreshed_list_applies_after_current_dashboard() {
    let surface = Arc::new(
        RecordingSurface::new()
            .with_page("a", Page::Loads(PageMetrics::new(3_000.0, 1_000.0))),
    );
    let initial = dashboards(&["a", "b", "c"])
        .into_iter()
        .map(|d| d.with_dwell(secs(10.0)))
        .collect();
    let source = Arc::new(
        ScriptedSource::new(Ok(dashboards(&["x", "a", "c"]))).then(Ok(initial)),
    );
    let handle =
        RotationRuntime::new(settings(), source, surface.clone()).spawn();

    sleep(secs(1.0)).await;
    handle.refresh().await.expect("refresh");
    settle().await;

    let snapshot = handle.snapshot();
    let ids: Vec<_> =
        snapshot.descriptors.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_eq!(snapshot.phase, RotationPhase::Scrolling);

    sleep(secs(9.5)).await;

    assert_eq!(surface.loaded_ids(), ["a", "c"]);
    assert_near(surface.loads()[1].1, secs(10.0));
    let snapshot = handle.snapshot();
    let ids: Vec<_> =
        snapshot.descriptors.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["x", "a", "c"]);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn pause_holds_current_dashboard() {
    let surface = Arc::new(RecordingSurface::new());
    let source = Arc::new(ScriptedSource::always(&["a", "b"]));
    let handle =
        RotationRuntime::new(settings(), source, surface.clone()).spawn();

    sleep(secs(1.0)).await;
    handle.pause().await.expect("pause");
    sleep(secs(30.0)).await;

    assert_eq!(surface.loaded_ids(), ["a"]);
    assert_eq!(handle.snapshot().phase, RotationPhase::Paused);

    handle.resume().await.expect("resume");
    sleep(secs(5.5)).await;

    assert_eq!(surface.loaded_ids(), ["a", "a", "b"]);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shrinking_page_cuts_scroll_short() {
    let surface = Arc::new(
        RecordingSurface::new()
            .with_page("a", Page::Loads(PageMetrics::new(4_000.0, 0.0))),
    );
    let source = Arc::new(ScriptedSource::always(&["a", "b"]));
    let handle =
        RotationRuntime::new(settings(), source, surface.clone()).spawn();

    sleep(secs(2.05)).await;
    handle
        .report_resize(handle.current_ticket(), PageMetrics::new(1_000.0, 0.0))
        .await
        .expect("resize");
    settle().await;
    assert_eq!(handle.snapshot().phase, RotationPhase::Dwelling);
    let scrolled = surface.scrolls().len();

    sleep(secs(3.0)).await;

    assert_eq!(surface.scrolls().len(), scrolled);
    let loads = surface.loads();
    assert_eq!(surface.loaded_ids(), ["a", "b"]);
    assert_near(loads[1].1, secs(5.0));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn resize_of_replaced_page_is_ignored() {
    let tall = Page::Loads(PageMetrics::new(4_000.0, 0.0));
    let surface = Arc::new(
        RecordingSurface::new()
            .with_page("a", tall.clone())
            .with_page("c", tall),
    );
    let source = Arc::new(ScriptedSource::always(&["a", "c"]));
    let handle =
        RotationRuntime::new(settings(), source, surface.clone()).spawn();

    sleep(secs(1.0)).await;
    let first_page = handle.current_ticket();
    sleep(secs(1.0)).await;
    handle.select("c").await.expect("select");
    settle().await;
    assert_ne!(handle.current_ticket(), first_page);

    sleep(secs(2.0)).await;
    handle
        .report_resize(first_page, PageMetrics::new(100.0, 0.0))
        .await
        .expect("resize");
    settle().await;
    assert_eq!(handle.snapshot().phase, RotationPhase::Scrolling);

    sleep(secs(2.05)).await;

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.current_id().map(DashboardId::as_str), Some("c"));
    assert_eq!(snapshot.phase, RotationPhase::Dwelling);
    let scrolls = surface.scrolls();
    let (last_offset, last_at) = scrolls[scrolls.len() - 1];
    assert_eq!(last_offset, 4_000.0);
    assert_near(last_at, secs(6.0));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn slow_position_store_does_not_stall_rotation() {
    let store = Arc::new(SlowPositionStore::new(secs(30.0)));
    let surface = Arc::new(RecordingSurface::new());
    let source = Arc::new(ScriptedSource::always(&["a", "b"]));
    let handle = RotationRuntime::new(settings(), source, surface.clone())
        .with_position_store(store.clone())
        .spawn();

    sleep(secs(21.0)).await;

    assert_eq!(surface.loaded_ids(), ["a", "b", "a", "b", "a"]);
    for (idx, (_, at)) in surface.loads().into_iter().enumerate() {
        assert_near(at, secs(5.0 * idx as f64));
    }
    assert_eq!(store.saved(), [DashboardId::from("a")]);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn position_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store =
        Arc::new(FilePositionStore::new(dir.path().join("position.json")));
    store.save(&DashboardId::from("b")).await.expect("seed position");

    let surface = Arc::new(RecordingSurface::new());
    let source = Arc::new(ScriptedSource::always(&["a", "b", "c"]));
    let handle = RotationRuntime::new(settings(), source, surface.clone())
        .with_position_store(store.clone())
        .spawn();

    sleep(secs(6.0)).await;

    assert_eq!(surface.loaded_ids(), ["b", "c"]);
    assert_eq!(
        store.load().await.expect("load position"),
        Some(DashboardId::from("c"))
    );

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_rotation() {
    let surface = Arc::new(RecordingSurface::new());
    let source = Arc::new(ScriptedSource::always(&["a", "b"]));
    let handle =
        RotationRuntime::new(settings(), source, surface.clone()).spawn();
    let token = handle.shutdown_token();

    sleep(secs(1.0)).await;
    handle.shutdown().await;
    sleep(secs(30.0)).await;

    assert!(token.is_cancelled());
    assert_eq!(surface.loaded_ids(), ["a"]);
}
