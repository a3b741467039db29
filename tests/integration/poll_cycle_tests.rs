use super::*;
use catalog_sentinel::scheduler::CheckOutcome;
use tokio_test::assert_ok;

fn repeat(price: &'static str, n: usize) -> Vec<&'static str> {
    vec![price; n]
}

#[tokio::test]
async fn test_first_cycle_baselines_without_alert() -> anyhow::Result<()> {
    let fetcher = Arc::new(
        ScriptedFetcher::new().script(SNEAKERS, vec![Step::Page(catalog_page(&["999", "1,499"]))]),
    );
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = create_test_scheduler(&[SNEAKERS], fetcher, notifier.clone()).await?;

    let report = scheduler.run_cycle().await;

    assert_eq!(report.baselined(), 1);
    assert!(notifier.messages().is_empty());

    let baseline = scheduler.state().baselines().get(SNEAKERS).await;
    assert_eq!(baseline.and_then(|s| s.item_count()), Some(2));
    Ok(())
}

#[tokio::test]
async fn test_identical_pages_stay_quiet() -> anyhow::Result<()> {
    let page = catalog_page(&["999", "2,499"]);
    let fetcher = Arc::new(ScriptedFetcher::new().script(SNEAKERS, vec![Step::Page(page)]));
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = create_test_scheduler(&[SNEAKERS], fetcher, notifier.clone()).await?;

    scheduler.run_cycle().await;
    for _ in 0..3 {
        let report = scheduler.run_cycle().await;
        assert_eq!(report.unchanged(), 1);
    }

    assert!(notifier.messages().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_item_count_changes_report_signed_delta() -> anyhow::Result<()> {
    let mut grown = repeat("450", 12);
    grown.extend(repeat("1,299", 3));

    let fetcher = Arc::new(ScriptedFetcher::new().script(
        SNEAKERS,
        vec![
            Step::Page(catalog_page(&repeat("450", 12))),
            Step::Page(catalog_page(&grown)),
            Step::Page(catalog_page(&repeat("450", 9))),
        ],
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = create_test_scheduler(&[SNEAKERS], fetcher, notifier.clone()).await?;

    scheduler.run_cycle().await;
    assert_eq!(scheduler.run_cycle().await.alerts(), 1);
    assert_eq!(scheduler.run_cycle().await.alerts(), 1);

    let alerts = notifier.alerts();
    assert_eq!(alerts.len(), 2);

    assert!(alerts[0].contains(SNEAKERS));
    assert!(alerts[0].contains("Items: 12 → 15 (+3)"));
    assert!(alerts[0].contains("0-500: 12"));
    assert!(alerts[0].contains("1000-2000: 3"));

    // The new snapshot replaced the baseline, so the delta is against 15.
    assert!(alerts[1].contains("Items: 15 → 9 (-6)"));
    Ok(())
}

#[tokio::test]
async fn test_failing_resource_is_isolated() -> anyhow::Result<()> {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .script(SNEAKERS, vec![Step::Page(catalog_page(&["999"]))])
            .script(BAGS, vec![Step::Hang, Step::Page(catalog_page(&["3,200"]))])
            .script(WATCHES, vec![Step::Page(catalog_page(&["12,000", "8,500"]))]),
    );
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler =
        create_test_scheduler(&[SNEAKERS, BAGS, WATCHES], fetcher, notifier.clone()).await?;

    let report = scheduler.run_cycle().await;

    assert_eq!(report.checked(), 3);
    assert_eq!(report.baselined(), 2);
    assert_eq!(report.failures(), 1);
    assert!(matches!(
        report.result_for(BAGS).map(|r| &r.outcome),
        Some(CheckOutcome::Failed(_))
    ));

    let failures = notifier.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains(BAGS));
    assert!(notifier.alerts().is_empty());

    let state = scheduler.state();
    assert!(state.baselines().get(BAGS).await.is_none());
    assert!(state.baselines().get(SNEAKERS).await.is_some());

    // Next cycle the slow resource recovers and baselines silently.
    let report = scheduler.run_cycle().await;
    assert_eq!(report.baselined(), 1);
    assert_eq!(report.unchanged(), 2);
    assert_eq!(notifier.messages().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_cycle_leaves_baseline_untouched() -> anyhow::Result<()> {
    let page = catalog_page(&["999", "1,099"]);
    let fetcher = Arc::new(ScriptedFetcher::new().script(
        SNEAKERS,
        vec![
            Step::Page(page.clone()),
            Step::Fail("connection reset by peer"),
            Step::Page(page),
        ],
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = create_test_scheduler(&[SNEAKERS], fetcher, notifier.clone()).await?;

    scheduler.run_cycle().await;
    assert_eq!(scheduler.run_cycle().await.failures(), 1);
    assert_eq!(scheduler.run_cycle().await.unchanged(), 1);

    let failures = notifier.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("connection reset by peer"));
    assert!(notifier.alerts().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_removed_resource_discards_in_flight_result() -> anyhow::Result<()> {
    let fetcher = Arc::new(ScriptedFetcher::new().script(
        SNEAKERS,
        vec![
            Step::Page(catalog_page(&["999"])),
            Step::Gated(catalog_page(&["999", "1,999", "2,999"])),
        ],
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler =
        create_test_scheduler(&[SNEAKERS], fetcher.clone(), notifier.clone()).await?;
    let state = scheduler.state();

    scheduler.run_cycle().await;
    assert!(state.baselines().contains(SNEAKERS).await);

    let remove_mid_fetch = async {
        fetcher.started.notified().await;
        let removed = state.remove(SNEAKERS).await;
        fetcher.release.notify_one();
        removed
    };
    let (report, removed) = tokio::join!(scheduler.run_cycle(), remove_mid_fetch);

    assert!(removed.is_some());
    assert_eq!(
        report.result_for(SNEAKERS).map(|r| &r.outcome),
        Some(&CheckOutcome::Discarded)
    );
    assert!(notifier.messages().is_empty());
    assert!(!state.baselines().contains(SNEAKERS).await);
    assert!(!state.is_tracked(SNEAKERS).await);
    Ok(())
}

#[tokio::test]
async fn test_readded_resource_starts_from_scratch() -> anyhow::Result<()> {
    let fetcher = Arc::new(ScriptedFetcher::new().script(
        SNEAKERS,
        vec![
            Step::Page(catalog_page(&["999"])),
            Step::Page(catalog_page(&["999", "1,499", "2,499"])),
        ],
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = create_test_scheduler(&[SNEAKERS], fetcher, notifier.clone()).await?;
    let state = scheduler.state();

    scheduler.run_cycle().await;
    assert!(state.remove(SNEAKERS).await.is_some());
    assert!(assert_ok!(state.add(SNEAKERS).await));

    // The old baseline is gone, so the bigger page only baselines again.
    let report = scheduler.run_cycle().await;
    assert_eq!(report.baselined(), 1);
    assert!(notifier.messages().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_blank_page_has_absent_item_count() -> anyhow::Result<()> {
    let fetcher = Arc::new(ScriptedFetcher::new().script(
        SNEAKERS,
        vec![
            Step::Page("   ".to_string()),
            Step::Page(catalog_page(&["999", "1,499"])),
        ],
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = create_test_scheduler(&[SNEAKERS], fetcher, notifier.clone()).await?;

    scheduler.run_cycle().await;
    let baseline = scheduler.state().baselines().get(SNEAKERS).await;
    assert_eq!(baseline.map(|s| s.item_count()), Some(None));

    // Only the fingerprint moved; counts are not comparable.
    assert_eq!(scheduler.run_cycle().await.alerts(), 1);
    let alerts = notifier.alerts();
    assert!(alerts[0].contains("Items: n/a → 2 (n/a)"));
    assert!(alerts[0].contains("Changed: fingerprint"));
    Ok(())
}
