use reviewdesk_core::db::open_db_in_memory;
use reviewdesk_core::{
    Caller, LocationDraft, LocationId, LocationRepository, RepoError, ReviewDraft,
    ReviewListQuery, ReviewRepository, ReviewSyncService, SqliteLocationRepository,
    SqliteReviewRepository, SyncError,
};
use rusqlite::Connection;
use uuid::Uuid;

fn location(conn: &Connection, place_id: &str) -> LocationId {
    SqliteLocationRepository::new(conn, Caller::Service)
        .create_location(&LocationDraft::new("Shop", place_id, "1"))
        .unwrap()
}

fn stored_reviews(conn: &Connection, location_id: LocationId) -> Vec<reviewdesk_core::Review> {
    SqliteReviewRepository::new(conn, Caller::Service)
        .list_reviews(&ReviewListQuery::for_location(location_id))
        .unwrap()
}

#[test]
fn sync_inserts_then_updates_by_external_id() {
    let conn = open_db_in_memory().unwrap();
    let location_id = location(&conn, "p-1");
    let sync = ReviewSyncService::new(&conn);

    let first = sync
        .sync_location(
            location_id,
            &[
                ReviewDraft::new("g-1", "Ana", 4, 1_000).with_text("Nice place"),
                ReviewDraft::new("g-2", "Ben", 2, 2_000),
            ],
        )
        .unwrap();
    assert_eq!((first.inserted, first.updated), (2, 0));

    let second = sync
        .sync_location(
            location_id,
            &[ReviewDraft::new("g-1", "Ana", 5, 1_000)
                .with_text("Even better now")
                .with_response("Thank you!", 3_000)],
        )
        .unwrap();
    assert_eq!((second.inserted, second.updated), (0, 1));

    let reviews = stored_reviews(&conn, location_id);
    assert_eq!(reviews.len(), 2);
    let ana = reviews.iter().find(|r| r.review_id == "g-1").unwrap();
    assert_eq!(ana.rating, 5);
    assert_eq!(ana.review_text.as_deref(), Some("Even better now"));
    assert!(ana.has_response());
    assert_eq!(ana.response_date, Some(3_000));
}

#[test]
fn sync_by_place_id_resolves_location() {
    let conn = open_db_in_memory().unwrap();
    let location_id = location(&conn, "ChIJ-place");
    let sync = ReviewSyncService::new(&conn);

    let report = sync
        .sync_place(" ChIJ-place ", &[ReviewDraft::new("g-1", "Ana", 4, 0)])
        .unwrap();
    assert_eq!(report.location_id, location_id);

    let err = sync.sync_place("unknown", &[]).unwrap_err();
    assert!(matches!(err, SyncError::UnknownPlace(ref place) if place == "unknown"));
}

#[test]
fn rating_outside_range_is_rejected_by_datastore_and_rolls_back_batch() {
    let conn = open_db_in_memory().unwrap();
    let location_id = location(&conn, "p-1");
    let sync = ReviewSyncService::new(&conn);

    for bad_rating in [0u8, 6, 9] {
        let err = sync
            .sync_location(
                location_id,
                &[
                    ReviewDraft::new("ok-1", "Ana", 5, 0),
                    ReviewDraft::new("bad", "Ben", bad_rating, 0),
                ],
            )
            .unwrap_err();
        match err {
            SyncError::Rejected { review_id, source } => {
                assert_eq!(review_id, "bad");
                assert!(matches!(source, RepoError::ConstraintViolation(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    assert!(stored_reviews(&conn, location_id).is_empty());
}

#[test]
fn rating_update_outside_range_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let location_id = location(&conn, "p-1");
    let repo = SqliteReviewRepository::new(&conn, Caller::Service);
    repo.upsert_review(location_id, &ReviewDraft::new("g-1", "Ana", 3, 0))
        .unwrap();

    let err = repo
        .upsert_review(location_id, &ReviewDraft::new("g-1", "Ana", 6, 0))
        .unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert_eq!(stored_reviews(&conn, location_id)[0].rating, 3);
}

#[test]
fn review_cannot_move_between_locations() {
    let conn = open_db_in_memory().unwrap();
    let first = location(&conn, "p-1");
    let second = location(&conn, "p-2");
    let repo = SqliteReviewRepository::new(&conn, Caller::Service);
    repo.upsert_review(first, &ReviewDraft::new("g-1", "Ana", 3, 0))
        .unwrap();

    let err = repo
        .upsert_review(second, &ReviewDraft::new("g-1", "Ana", 3, 0))
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn sync_into_missing_location_fails() {
    let conn = open_db_in_memory().unwrap();
    let missing = Uuid::new_v4();
    let err = ReviewSyncService::new(&conn)
        .sync_location(missing, &[ReviewDraft::new("g-1", "Ana", 3, 0)])
        .unwrap_err();
    assert!(matches!(err, SyncError::LocationNotFound(id) if id == missing));
}

#[test]
fn deleting_location_removes_its_reviews() {
    let conn = open_db_in_memory().unwrap();
    let doomed = location(&conn, "p-doomed");
    let kept = location(&conn, "p-kept");
    let sync = ReviewSyncService::new(&conn);
    sync.sync_location(
        doomed,
        &[
            ReviewDraft::new("d-1", "Ana", 1, 0),
            ReviewDraft::new("d-2", "Ben", 2, 0),
        ],
    )
    .unwrap();
    sync.sync_location(kept, &[ReviewDraft::new("k-1", "Cy", 5, 0)])
        .unwrap();

    SqliteLocationRepository::new(&conn, Caller::Admin(Uuid::new_v4()))
        .delete_location(doomed)
        .unwrap();

    let remaining: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reviews WHERE location_id = ?1;",
            [doomed.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 0);
    assert_eq!(stored_reviews(&conn, kept).len(), 1);
}

#[test]
fn service_caller_can_delete_single_review() {
    let conn = open_db_in_memory().unwrap();
    let location_id = location(&conn, "p-1");
    let repo = SqliteReviewRepository::new(&conn, Caller::Service);
    let id = repo
        .upsert_review(location_id, &ReviewDraft::new("g-1", "Ana", 3, 0))
        .unwrap()
        .id();

    repo.delete_review(id).unwrap();
    assert!(repo.get_review(id).unwrap().is_none());
    assert!(matches!(
        repo.delete_review(id),
        Err(RepoError::NotFound { entity: "review", .. })
    ));
}
