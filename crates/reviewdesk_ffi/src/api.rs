//! FFI use-case API for the Flutter dashboard.
//!
//! # Responsibility
//! - Expose sign-in, the location user dashboard and the admin location
//!   screen as flat, use-case level calls.
//! - Turn every failure into an envelope with a displayable message.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Failures are logged in full; the UI only sees generic wording.
//! - Each call opens its own connection and drops it before returning.

use log::error;
use reviewdesk_core::db::open_db;
use reviewdesk_core::feedback::ACCESS_DENIED_MESSAGE;
use reviewdesk_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    report_failure, AuthService, Caller, DashboardService, DashboardView, DeskConfig, Location,
    LocationDashboard, LocationDraft, LocationService, Review, ReviewFilter, ReviewStats,
    SessionClaims, SqliteLocationRepository, SqliteReviewRepository, UserId,
    GENERIC_FAILURE_MESSAGE,
};
use rusqlite::Connection;
use std::sync::OnceLock;
use uuid::Uuid;

static DESK_CONFIG: OnceLock<DeskConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message on failure.
/// Safe to call repeatedly with the same `level + log_dir`.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Sign-in result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResponse {
    pub ok: bool,
    /// Bearer token for every later call.
    pub token: Option<String>,
    /// `admin|user`; the UI routes admins to the location screen.
    pub role: Option<String>,
    pub message: String,
}

/// Generic mutation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Affected record id, when one exists.
    pub id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationItem {
    pub id: String,
    pub name: String,
    pub place_id: String,
    pub telegram_chat_id: String,
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub id: String,
    pub reviewer_name: String,
    pub reviewer_profile_image: Option<String>,
    pub rating: u8,
    pub review_text: Option<String>,
    pub review_date_ms: i64,
    pub response_text: Option<String>,
    pub response_date_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsItem {
    pub total: u32,
    pub average_rating: f64,
    /// Review counts for 5, 4, 3, 2 and 1 stars, in that order.
    pub counts_desc: Vec<u32>,
    pub responded: u32,
}

/// Dashboard screen payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardResponse {
    /// `assigned|unassigned|error`.
    pub state: String,
    pub location: Option<LocationItem>,
    pub stats: Option<StatsItem>,
    /// Filtered reviews, newest first.
    pub reviews: Vec<ReviewItem>,
    pub message: String,
}

impl DashboardResponse {
    fn assigned(dashboard: LocationDashboard) -> Self {
        let message = if dashboard.reviews.is_empty() {
            "No reviews match the current filter.".to_string()
        } else {
            format!("Showing {} review(s).", dashboard.reviews.len())
        };
        Self {
            state: "assigned".to_string(),
            location: Some(to_location_item(&dashboard.location)),
            stats: Some(to_stats_item(&dashboard.stats)),
            reviews: dashboard.reviews.iter().map(to_review_item).collect(),
            message,
        }
    }

    fn unassigned(guidance: &str) -> Self {
        Self {
            state: "unassigned".to_string(),
            location: None,
            stats: None,
            reviews: Vec::new(),
            message: guidance.to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            state: "error".to_string(),
            location: None,
            stats: None,
            reviews: Vec::new(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationListResponse {
    pub ok: bool,
    pub items: Vec<LocationItem>,
    pub message: String,
}

/// Verifies credentials and opens a session.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_sign_in(email: String, password: String) -> SessionResponse {
    let result = with_connection("auth_sign_in", |conn| {
        auth_service(conn)
            .sign_in(email.as_str(), password.as_str())
            .map_err(|err| report_failure("auth_sign_in", &err))
    });
    match result {
        Ok(session) => SessionResponse {
            ok: true,
            token: Some(session.token),
            role: Some(session.claims.role.as_str().to_string()),
            message: "Signed in.".to_string(),
        },
        Err(message) => SessionResponse {
            ok: false,
            token: None,
            role: None,
            message,
        },
    }
}

/// Revokes the session. Signing out twice is not an error.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_sign_out(token: String) -> ActionResponse {
    let result = with_connection("auth_sign_out", |conn| {
        auth_service(conn)
            .sign_out(token.as_str())
            .map_err(|err| report_failure("auth_sign_out", &err))
    });
    match result {
        Ok(()) => ActionResponse::success("Signed out.", None),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Loads the signed-in user's location dashboard.
///
/// `rating` filters by exact star value; `query` matches reviewer name or
/// review text, case-insensitively.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_load(token: String, query: String, rating: Option<u8>) -> DashboardResponse {
    let filter = ReviewFilter::new(query, rating);
    let result = with_session("dashboard_load", &token, |conn, claims| {
        dashboard_service(conn, claims)
            .load_for_user(claims.sub, &filter)
            .map_err(|err| report_failure("dashboard_load", &err))
    });
    match result {
        Ok(DashboardView::Assigned(dashboard)) => DashboardResponse::assigned(*dashboard),
        Ok(DashboardView::Unassigned { guidance }) => DashboardResponse::unassigned(guidance),
        Err(message) => DashboardResponse::failure(message),
    }
}

/// Opens one location's dashboard from the admin screen.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_location_dashboard(
    token: String,
    location_id: String,
    query: String,
    rating: Option<u8>,
) -> DashboardResponse {
    let filter = ReviewFilter::new(query, rating);
    let result = with_admin_session("admin_location_dashboard", &token, |conn, claims| {
        let id = parse_location_id(&location_id)?;
        dashboard_service(conn, claims)
            .load_location(id, &filter)
            .map_err(|err| report_failure("admin_location_dashboard", &err))
    });
    match result {
        Ok(dashboard) => DashboardResponse::assigned(dashboard),
        Err(message) => DashboardResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn admin_list_locations(token: String) -> LocationListResponse {
    let result = with_admin_session("admin_list_locations", &token, |conn, claims| {
        location_service(conn, claims)
            .list_locations()
            .map_err(|err| report_failure("admin_list_locations", &err))
    });
    match result {
        Ok(locations) => LocationListResponse {
            ok: true,
            message: format!("{} location(s).", locations.len()),
            items: locations.iter().map(to_location_item).collect(),
        },
        Err(message) => LocationListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

/// Creates a location; `owner_email` optionally links an existing account.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_create_location(
    token: String,
    name: String,
    place_id: String,
    telegram_chat_id: String,
    owner_email: Option<String>,
) -> ActionResponse {
    let result = with_admin_session("admin_create_location", &token, |conn, claims| {
        let mut draft = LocationDraft::new(name, place_id, telegram_chat_id);
        draft.user_id = resolve_owner(conn, owner_email.as_deref())?;
        location_service(conn, claims)
            .create_location(&draft)
            .map_err(|err| report_failure("admin_create_location", &err))
    });
    match result {
        Ok(location) => ActionResponse::success("Location created.", Some(location.id.to_string())),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Replaces every field of a location, including its owner.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_update_location(
    token: String,
    location_id: String,
    name: String,
    place_id: String,
    telegram_chat_id: String,
    owner_email: Option<String>,
) -> ActionResponse {
    let result = with_admin_session("admin_update_location", &token, |conn, claims| {
        let id = parse_location_id(&location_id)?;
        let mut draft = LocationDraft::new(name, place_id, telegram_chat_id);
        draft.user_id = resolve_owner(conn, owner_email.as_deref())?;
        location_service(conn, claims)
            .update_location(id, &draft)
            .map_err(|err| report_failure("admin_update_location", &err))
    });
    match result {
        Ok(location) => ActionResponse::success("Location updated.", Some(location.id.to_string())),
        Err(message) => ActionResponse::failure(message),
    }
}

/// Deletes a location and every review synced for it.
///
/// The UI asks for confirmation before calling this.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_delete_location(token: String, location_id: String) -> ActionResponse {
    let result = with_admin_session("admin_delete_location", &token, |conn, claims| {
        let id = parse_location_id(&location_id)?;
        location_service(conn, claims)
            .delete_location(id)
            .map_err(|err| report_failure("admin_delete_location", &err))?;
        Ok(id)
    });
    match result {
        Ok(id) => ActionResponse::success("Location deleted.", Some(id.to_string())),
        Err(message) => ActionResponse::failure(message),
    }
}

fn desk_config() -> &'static DeskConfig {
    DESK_CONFIG.get_or_init(DeskConfig::from_env)
}

fn auth_service(conn: &Connection) -> AuthService<'_> {
    AuthService::new(conn).with_session_ttl(desk_config().session_ttl)
}

fn location_service<'conn>(
    conn: &'conn Connection,
    claims: &SessionClaims,
) -> LocationService<SqliteLocationRepository<'conn>> {
    LocationService::new(SqliteLocationRepository::new(
        conn,
        Caller::from_claims(claims),
    ))
}

fn dashboard_service<'conn>(
    conn: &'conn Connection,
    claims: &SessionClaims,
) -> DashboardService<SqliteLocationRepository<'conn>, SqliteReviewRepository<'conn>> {
    let caller = Caller::from_claims(claims);
    DashboardService::new(
        SqliteLocationRepository::new(conn, caller),
        SqliteReviewRepository::new(conn, caller),
    )
}

fn with_connection<T>(
    operation: &str,
    f: impl FnOnce(&Connection) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_db(&desk_config().db_path).map_err(|err| report_failure(operation, &err))?;
    f(&conn)
}

fn with_session<T>(
    operation: &str,
    token: &str,
    f: impl FnOnce(&Connection, &SessionClaims) -> Result<T, String>,
) -> Result<T, String> {
    with_connection(operation, |conn| {
        let claims = auth_service(conn)
            .resolve(token)
            .map_err(|err| report_failure(operation, &err))?;
        f(conn, &claims)
    })
}

fn with_admin_session<T>(
    operation: &str,
    token: &str,
    f: impl FnOnce(&Connection, &SessionClaims) -> Result<T, String>,
) -> Result<T, String> {
    with_session(operation, token, |conn, claims| {
        if !claims.is_admin() {
            error!(
                "event={operation} module=ffi status=error error_code=not_admin user_id={}",
                claims.sub
            );
            return Err(ACCESS_DENIED_MESSAGE.to_string());
        }
        f(conn, claims)
    })
}

fn resolve_owner(conn: &Connection, owner_email: Option<&str>) -> Result<Option<UserId>, String> {
    let Some(email) = owner_email.map(str::trim).filter(|email| !email.is_empty()) else {
        return Ok(None);
    };
    match auth_service(conn).find_user_by_email(email) {
        Ok(Some(user)) => Ok(Some(user.id)),
        Ok(None) => Err("No account found for this email.".to_string()),
        Err(err) => Err(report_failure("resolve_owner", &err)),
    }
}

fn parse_location_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        error!("event=parse_location_id module=ffi status=error error_code=invalid_uuid");
        GENERIC_FAILURE_MESSAGE.to_string()
    })
}

fn to_location_item(location: &Location) -> LocationItem {
    LocationItem {
        id: location.id.to_string(),
        name: location.name.clone(),
        place_id: location.place_id.clone(),
        telegram_chat_id: location.telegram_chat_id.clone(),
        owner_id: location.user_id.map(|id| id.to_string()),
    }
}

fn to_review_item(review: &Review) -> ReviewItem {
    ReviewItem {
        id: review.id.to_string(),
        reviewer_name: review.reviewer_name.clone(),
        reviewer_profile_image: review.reviewer_profile_image.clone(),
        rating: review.rating,
        review_text: review.review_text.clone(),
        review_date_ms: review.review_date,
        response_text: review.response_text.clone(),
        response_date_ms: review.response_date,
    }
}

fn to_stats_item(stats: &ReviewStats) -> StatsItem {
    StatsItem {
        total: saturating_u32(stats.total),
        average_rating: stats.average_rating,
        counts_desc: stats
            .distribution
            .iter_desc()
            .map(|(_, count)| saturating_u32(count))
            .collect(),
        responded: saturating_u32(stats.responded),
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
