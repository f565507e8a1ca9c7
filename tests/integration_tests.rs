//! Integration tests for the pairwise ranker
//!
//! These tests drive the ranking service end to end:
//! - Group generation, submission and reporting
//! - High-water-mark appends and paged loading
//! - Persistence through the JSON file repository
//! - Concurrent submissions

// Modules for organizing tests
mod fixtures;

use pairwise_ranker::comparisons::{
    ComparisonRepository, InMemoryComparisonRepository, JsonFileComparisonRepository,
    RepositoryLimits,
};
use pairwise_ranker::types::{ComparisonProperty, IssueState};
use pairwise_ranker::RankingError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use fixtures::{backlog, create_service, issue, order, RecordingRepository};

#[tokio::test]
async fn test_complete_ranking_workflow() {
    let service = create_service(Arc::new(InMemoryComparisonRepository::default()));
    let mut summaries = backlog(&["a", "b", "c", "d", "e", "f", "g"]);
    summaries.push(issue("shipped", IssueState::Completed));
    let mut rng = StdRng::seed_from_u64(2024);

    // Order a few groups on both axes, always preferring alphabetical order
    for property in ComparisonProperty::ALL {
        for _ in 0..4 {
            let group = service
                .create_group(property, &summaries, None, &mut rng)
                .await
                .unwrap();
            assert_eq!(group.entity_ids.len(), 5);
            assert!(!group.entity_ids.contains(&"shipped".to_string()));

            let mut ordering = group.entity_ids.clone();
            ordering.sort();
            let recorded = service
                .submit_group(group.id, &ordering, Some("tester".to_string()))
                .await
                .unwrap();
            assert_eq!(recorded.len(), 10);
        }
    }

    let effort = service
        .stats(ComparisonProperty::Effort, &summaries)
        .await
        .unwrap();
    let total: u32 = effort.values().map(|entry| entry.comparisons).sum();
    assert_eq!(total, 4 * 10 * 2);
    assert_eq!(effort["shipped"].comparisons, 0);

    let report = service.report(&summaries).await.unwrap();
    assert_eq!(
        report.out_of_date_estimates,
        report.rows.iter().filter(|row| row.estimate_out_of_date).count()
    );
    let rows = report.rows;
    assert_eq!(rows.len(), 7);
    assert!(rows.iter().all(|row| row.id != "shipped"));
    for pair in rows.windows(2) {
        assert!(pair[0].priority >= pair[1].priority);
    }
    for row in &rows {
        assert!([1.0, 2.0, 3.0, 5.0, 8.0, 13.0].contains(&row.recommended_estimate));
        assert!((0.0..=1.0).contains(&row.effort.scaled));
        assert!((0.0..=1.0).contains(&row.value.scaled));
    }
}

#[tokio::test]
async fn test_appends_carry_high_water_mark() {
    let repository = Arc::new(RecordingRepository::default());
    let service = create_service(repository.clone());
    let summaries = backlog(&["a", "b", "c"]);

    service
        .record_ordering(ComparisonProperty::Value, &order(&["a", "b", "c"]), &summaries, None)
        .await
        .unwrap();
    service
        .record_ordering(
            ComparisonProperty::Value,
            &order(&["c", "a"]),
            &summaries,
            Some("user-2".to_string()),
        )
        .await
        .unwrap();

    let calls = repository.append_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].pending, 3);
    assert!(calls[0].high_water_mark.is_none());
    assert_eq!(calls[1].pending, 1);
    assert_eq!(calls[1].user_id.as_deref(), Some("user-2"));

    let log = repository
        .load_all(ComparisonProperty::Value)
        .await
        .unwrap();
    assert_eq!(calls[1].high_water_mark.as_ref(), Some(&log[2].id));
}

#[tokio::test]
async fn test_full_log_is_loaded_page_by_page() {
    let limits = RepositoryLimits {
        page_size: 3,
        ..RepositoryLimits::default()
    };
    let repository = Arc::new(RecordingRepository::new(InMemoryComparisonRepository::new(limits)));
    let summaries = backlog(&["a", "b", "c", "d", "e"]);

    // 10 comparisons: pages of 3, 3, 3, 1
    repository
        .inner()
        .append(
            ComparisonProperty::Effort,
            pairwise_ranker::matchup::comparisons_from_ordering(&order(&["a", "b", "c", "d", "e"]))
                .unwrap(),
            None,
            None,
        )
        .await
        .unwrap();

    let service = create_service(repository.clone());
    let stats = service
        .stats(ComparisonProperty::Effort, &summaries)
        .await
        .unwrap();

    assert!(stats.values().all(|entry| entry.comparisons == 4));
    let pages = repository.page_calls();
    assert_eq!(pages.len(), 4);
    assert!(pages[0].is_none());
    assert!(pages[1..].iter().all(Option::is_some));
}

#[tokio::test]
async fn test_failed_append_keeps_group_pending() {
    let repository = Arc::new(RecordingRepository::default());
    let service = create_service(repository.clone());
    let summaries = backlog(&["a", "b", "c"]);
    let mut rng = StdRng::seed_from_u64(7);

    let group = service
        .create_group(ComparisonProperty::Effort, &summaries, None, &mut rng)
        .await
        .unwrap();

    repository.set_fail_appends(true);
    let err = service
        .submit_group(group.id, &group.entity_ids, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RankingError>(),
        Some(RankingError::Storage { .. })
    ));
    assert!(service.group(group.id).await.is_some());

    repository.set_fail_appends(false);
    let recorded = service
        .submit_group(group.id, &group.entity_ids, None)
        .await
        .unwrap();
    assert_eq!(recorded.len(), 3);
    assert_eq!(service.pending_groups().await, 0);
}

#[tokio::test]
async fn test_history_survives_restart_with_file_repository() {
    let dir = tempfile::tempdir().unwrap();
    let summaries = backlog(&["a", "b", "c", "d"]);

    let first_stats = {
        let repository = Arc::new(JsonFileComparisonRepository::new(
            dir.path(),
            RepositoryLimits::default(),
        ));
        let service = create_service(repository);
        service
            .record_ordering(
                ComparisonProperty::Effort,
                &order(&["d", "c", "b", "a"]),
                &summaries,
                Some("user-1".to_string()),
            )
            .await
            .unwrap()
    };

    let repository = Arc::new(JsonFileComparisonRepository::new(
        dir.path(),
        RepositoryLimits::default(),
    ));
    assert!(repository.log_path(ComparisonProperty::Effort).exists());
    assert!(!repository.log_path(ComparisonProperty::Value).exists());

    let service = create_service(repository);
    let reloaded = service
        .stats(ComparisonProperty::Effort, &summaries)
        .await
        .unwrap();
    assert_eq!(first_stats, reloaded);
    assert!(reloaded["d"].rating > reloaded["a"].rating);
}

#[tokio::test]
async fn test_deleted_issues_still_replay() {
    let repository = Arc::new(InMemoryComparisonRepository::default());
    let service = create_service(repository);

    service
        .record_ordering(
            ComparisonProperty::Value,
            &order(&["kept", "deleted"]),
            &backlog(&["kept", "deleted"]),
            None,
        )
        .await
        .unwrap();

    // "deleted" no longer comes from the tracker but stays in the log
    let stats = service
        .stats(ComparisonProperty::Value, &backlog(&["kept"]))
        .await
        .unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats["deleted"].comparisons, 1);

    let rows = service.report(&backlog(&["kept"])).await.unwrap().rows;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "kept");
}

#[tokio::test]
async fn test_concurrent_orderings_are_all_recorded() {
    let repository = Arc::new(InMemoryComparisonRepository::default());
    let service = Arc::new(create_service(repository.clone()));
    let ids = ["a", "b", "c", "d", "e", "f"];
    let summaries = Arc::new(backlog(&ids));

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let service = service.clone();
            let summaries = summaries.clone();
            let ordering = order(&[ids[i % 6], ids[(i + 1) % 6], ids[(i + 2) % 6]]);
            tokio::spawn(async move {
                service
                    .record_ordering(ComparisonProperty::Effort, &ordering, &summaries, None)
                    .await
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    assert_eq!(repository.len(ComparisonProperty::Effort).await, 12 * 3);

    let stats = service
        .stats(ComparisonProperty::Effort, &summaries)
        .await
        .unwrap();
    let total: u32 = stats.values().map(|entry| entry.comparisons).sum();
    assert_eq!(total, 12 * 3 * 2);
}

#[tokio::test]
async fn test_unknown_group_is_rejected() {
    let service = create_service(Arc::new(InMemoryComparisonRepository::default()));
    let err = service
        .submit_group(uuid::Uuid::new_v4(), &order(&["a", "b"]), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<RankingError>(),
        Some(RankingError::GroupNotFound { .. })
    ));
}
