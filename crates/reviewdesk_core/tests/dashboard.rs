use reviewdesk_core::db::open_db_in_memory;
use reviewdesk_core::{
    AuthService, Caller, DashboardError, DashboardService, DashboardView, LocationDraft,
    LocationRepository, ReviewDraft, ReviewFilter, ReviewSyncService, Role,
    SqliteLocationRepository, SqliteReviewRepository, UNASSIGNED_GUIDANCE,
};
use rusqlite::Connection;

fn dashboard_for(
    conn: &Connection,
    caller: Caller,
) -> DashboardService<SqliteLocationRepository<'_>, SqliteReviewRepository<'_>> {
    DashboardService::new(
        SqliteLocationRepository::new(conn, caller),
        SqliteReviewRepository::new(conn, caller),
    )
}

#[test]
fn user_without_location_gets_unassigned_state() {
    let conn = open_db_in_memory().unwrap();
    let user = AuthService::new(&conn)
        .sign_up("new@example.com", "new-password", Role::User)
        .unwrap();

    let view = dashboard_for(&conn, Caller::User(user.id))
        .load_for_user(user.id, &ReviewFilter::default())
        .unwrap();
    assert_eq!(
        view,
        DashboardView::Unassigned {
            guidance: UNASSIGNED_GUIDANCE
        }
    );
}

#[test]
fn stats_cover_all_reviews_while_list_is_filtered() {
    let conn = open_db_in_memory().unwrap();
    let owner = AuthService::new(&conn)
        .sign_up("owner@example.com", "owner-password", Role::User)
        .unwrap();
    let location_id = SqliteLocationRepository::new(&conn, Caller::Service)
        .create_location(&LocationDraft::new("Cafe", "p-cafe", "1").with_owner(owner.id))
        .unwrap();
    ReviewSyncService::new(&conn)
        .sync_location(
            location_id,
            &[
                ReviewDraft::new("g-1", "Ana", 5, 3_000).with_text("Lovely coffee"),
                ReviewDraft::new("g-2", "Ben", 4, 2_000).with_text("Good COFFEE, slow wifi"),
                ReviewDraft::new("g-3", "Cy", 1, 1_000).with_text("Rude staff"),
            ],
        )
        .unwrap();

    let filter = ReviewFilter::new("coffee", Some(5));
    let view = dashboard_for(&conn, Caller::User(owner.id))
        .load_for_user(owner.id, &filter)
        .unwrap();

    let DashboardView::Assigned(dashboard) = view else {
        panic!("expected assigned dashboard");
    };
    assert_eq!(dashboard.location.id, location_id);
    assert_eq!(dashboard.stats.total, 3);
    assert!((dashboard.stats.average_rating - 10.0 / 3.0).abs() < 1e-9);
    assert_eq!(dashboard.stats.distribution.total(), 3);
    assert_eq!(dashboard.reviews.len(), 1);
    assert_eq!(dashboard.reviews[0].review_id, "g-1");
    assert_eq!(dashboard.filter, filter);
}

#[test]
fn admin_opens_any_location_but_user_cannot() {
    let conn = open_db_in_memory().unwrap();
    let (admin, stranger) = {
        let auth = AuthService::new(&conn);
        (
            auth.sign_up("admin@example.com", "admin-password", Role::Admin)
                .unwrap(),
            auth.sign_up("stranger@example.com", "stranger-password", Role::User)
                .unwrap(),
        )
    };
    let location_id = SqliteLocationRepository::new(&conn, Caller::Admin(admin.id))
        .create_location(&LocationDraft::new("Cafe", "p-cafe", "1"))
        .unwrap();

    let dashboard = dashboard_for(&conn, Caller::Admin(admin.id))
        .load_location(location_id, &ReviewFilter::default())
        .unwrap();
    assert_eq!(dashboard.stats.total, 0);
    assert_eq!(dashboard.stats.average_rating, 0.0);

    let err = dashboard_for(&conn, Caller::User(stranger.id))
        .load_location(location_id, &ReviewFilter::default())
        .unwrap_err();
    assert!(matches!(err, DashboardError::LocationNotFound(id) if id == location_id));
}
