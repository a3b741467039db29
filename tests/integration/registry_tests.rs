use super::*;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_listing_follows_insertion_order() {
    let state = WatchState::new();
    assert_eq!(state.listing().await, "No resources tracked");

    for url in [SNEAKERS, BAGS, WATCHES] {
        assert!(assert_ok!(state.add(url).await));
    }

    assert_eq!(
        state.listing().await,
        format!("1. {}\n2. {}\n3. {}", SNEAKERS, BAGS, WATCHES)
    );
}

#[tokio::test]
async fn test_remove_by_position_drops_baseline() -> anyhow::Result<()> {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .script(SNEAKERS, vec![Step::Page(catalog_page(&["999"]))])
            .script(BAGS, vec![Step::Page(catalog_page(&["3,200"]))]),
    );
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = create_test_scheduler(&[SNEAKERS, BAGS], fetcher, notifier).await?;
    let state = scheduler.state();

    assert_eq!(scheduler.run_cycle().await.baselined(), 2);

    let removed = assert_ok!(state.remove_at(1).await);
    assert_eq!(removed.id, SNEAKERS);
    assert!(!state.baselines().contains(SNEAKERS).await);
    assert!(state.baselines().contains(BAGS).await);
    assert_eq!(state.listing().await, format!("1. {}", BAGS));

    // Later cycles only see what is still tracked.
    let report = scheduler.run_cycle().await;
    assert_eq!(report.checked(), 1);
    assert!(report.result_for(SNEAKERS).is_none());
    Ok(())
}

#[tokio::test]
async fn test_remove_out_of_range_is_not_found() {
    let state = WatchState::new();
    assert_ok!(state.add(SNEAKERS).await);

    assert_err!(state.remove_at(0).await);
    assert_err!(state.remove_at(2).await);
    assert_eq!(state.len().await, 1);
}

#[tokio::test]
async fn test_unknown_resource_removal_is_noop() {
    let state = WatchState::new();
    assert_ok!(state.add(SNEAKERS).await);

    assert!(state.remove(BAGS).await.is_none());
    assert!(state.is_tracked(SNEAKERS).await);
}
