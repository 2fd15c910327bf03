//! reviewdesk operator CLI.
//!
//! Runs with service privileges against the configured database:
//! - account provisioning (`user`)
//! - location administration (`location`)
//! - review batch import (`import`)
//! - dashboard preview for an owner or a location (`dashboard`)

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use reviewdesk_core::db::open_db;
use reviewdesk_core::{
    init_logging, AuthService, Caller, DashboardService, DashboardView, DeskConfig, Location,
    LocationDashboard, LocationDraft, LocationService, ReviewDraft, ReviewFilter,
    ReviewSyncService, Role, SqliteLocationRepository, SqliteReviewRepository, UserId,
};
use rusqlite::Connection;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "reviewdesk",
    author,
    version,
    about = "Operator tooling for the location review dashboard"
)]
struct Cli {
    /// SQLite database file (defaults to REVIEWDESK_DB_PATH or the temp dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files (defaults to REVIEWDESK_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check core linkage and database access
    Ping,
    /// Manage accounts
    User(UserArgs),
    /// Manage monitored locations
    Location(LocationArgs),
    /// Upsert a JSON array of reviews for one location
    Import(ImportArgs),
    /// Print the dashboard an owner (or a single location) would see
    Dashboard(DashboardArgs),
}

#[derive(Args, Debug)]
struct UserArgs {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register an account
    Add {
        #[arg(long)]
        email: String,
        #[arg(long, env = "REVIEWDESK_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
    },
    /// List accounts
    List,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Admin => Role::Admin,
            RoleArg::User => Role::User,
        }
    }
}

#[derive(Args, Debug)]
struct LocationArgs {
    #[command(subcommand)]
    command: LocationCommand,
}

#[derive(Args, Debug)]
struct LocationFields {
    #[arg(long)]
    name: String,
    /// Google place id
    #[arg(long)]
    place_id: String,
    /// Numeric chat id or @channel_name
    #[arg(long)]
    chat_id: String,
    /// Email of the owning account
    #[arg(long)]
    owner: Option<String>,
}

#[derive(Subcommand, Debug)]
enum LocationCommand {
    /// List every location
    List,
    /// Create a location
    Add(LocationFields),
    /// Replace all fields of a location
    Update {
        #[arg(long)]
        id: Uuid,
        #[command(flatten)]
        fields: LocationFields,
    },
    /// Link a location to an account, or unlink it when --owner is omitted
    Assign {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Delete a location and all of its reviews
    Remove {
        #[arg(long)]
        id: Uuid,
        /// Required; deletion cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// JSON file holding an array of reviews
    #[arg(long)]
    file: PathBuf,
    /// Target location by place id
    #[arg(long, conflicts_with = "location", required_unless_present = "location")]
    place: Option<String>,
    /// Target location by id
    #[arg(long)]
    location: Option<Uuid>,
}

#[derive(Args, Debug)]
struct DashboardArgs {
    /// Owner account email
    #[arg(long, conflicts_with = "location", required_unless_present = "location")]
    user: Option<String>,
    /// Location id
    #[arg(long)]
    location: Option<Uuid>,
    /// Case-insensitive match on reviewer name or text
    #[arg(long, default_value = "")]
    query: String,
    /// Exact star rating
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    rating: Option<u8>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = DeskConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = Some(log_dir);
    }
    if let Some(log_dir) = &config.log_dir {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| anyhow!("log directory must be valid UTF-8"))?;
        init_logging(&config.log_level, log_dir).context("failed to start logging")?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;

    match cli.command {
        Commands::Ping => {
            println!("reviewdesk_core ping={}", reviewdesk_core::ping());
            println!("reviewdesk_core version={}", reviewdesk_core::core_version());
            println!("database={}", config.db_path.display());
        }
        Commands::User(args) => run_user(&conn, args.command)?,
        Commands::Location(args) => run_location(&conn, args.command)?,
        Commands::Import(args) => run_import(&conn, args)?,
        Commands::Dashboard(args) => run_dashboard(&conn, args)?,
    }
    Ok(())
}

fn run_user(conn: &Connection, command: UserCommand) -> Result<()> {
    let auth = AuthService::new(conn);
    match command {
        UserCommand::Add {
            email,
            password,
            role,
        } => {
            let user = auth.sign_up(&email, &password, role.into())?;
            println!("created {} {} ({})", user.id, user.email, user.role.as_str());
        }
        UserCommand::List => {
            for user in auth.list_users()? {
                println!("{}\t{}\t{}", user.id, user.role.as_str(), user.email);
            }
        }
    }
    Ok(())
}

fn run_location(conn: &Connection, command: LocationCommand) -> Result<()> {
    let service = LocationService::new(SqliteLocationRepository::new(conn, Caller::Service));
    match command {
        LocationCommand::List => {
            for location in service.list_locations()? {
                print_location(&location);
            }
        }
        LocationCommand::Add(fields) => {
            let draft = location_draft(conn, fields)?;
            let location = service.create_location(&draft)?;
            print_location(&location);
        }
        LocationCommand::Update { id, fields } => {
            let draft = location_draft(conn, fields)?;
            let location = service.update_location(id, &draft)?;
            print_location(&location);
        }
        LocationCommand::Assign { id, owner } => {
            let owner = resolve_owner(conn, owner.as_deref())?;
            let location = service.assign_owner(id, owner)?;
            print_location(&location);
        }
        LocationCommand::Remove { id, yes } => {
            if !yes {
                bail!("refusing to delete location {id} and its reviews without --yes");
            }
            service.delete_location(id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn run_import(conn: &Connection, args: ImportArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let drafts: Vec<ReviewDraft> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of reviews", args.file.display()))?;

    let sync = ReviewSyncService::new(conn);
    let report = match (args.place, args.location) {
        (Some(place_id), _) => sync.sync_place(&place_id, &drafts)?,
        (None, Some(location_id)) => sync.sync_location(location_id, &drafts)?,
        (None, None) => bail!("either --place or --location is required"),
    };

    info!(
        "event=cli_import module=cli status=ok location_id={} inserted={} updated={}",
        report.location_id, report.inserted, report.updated
    );
    println!(
        "location {}: {} inserted, {} updated",
        report.location_id, report.inserted, report.updated
    );
    Ok(())
}

fn run_dashboard(conn: &Connection, args: DashboardArgs) -> Result<()> {
    let filter = ReviewFilter::new(args.query, args.rating);

    if let Some(email) = args.user {
        let user = AuthService::new(conn)
            .find_user_by_email(&email)?
            .ok_or_else(|| anyhow!("no account for {email}"))?;
        let caller = Caller::User(user.id);
        let service = DashboardService::new(
            SqliteLocationRepository::new(conn, caller),
            SqliteReviewRepository::new(conn, caller),
        );
        match service.load_for_user(user.id, &filter)? {
            DashboardView::Unassigned { guidance } => println!("{guidance}"),
            DashboardView::Assigned(dashboard) => print_dashboard(&dashboard),
        }
        return Ok(());
    }

    let location_id = args
        .location
        .ok_or_else(|| anyhow!("either --user or --location is required"))?;
    let service = DashboardService::new(
        SqliteLocationRepository::new(conn, Caller::Service),
        SqliteReviewRepository::new(conn, Caller::Service),
    );
    print_dashboard(&service.load_location(location_id, &filter)?);
    Ok(())
}

fn location_draft(conn: &Connection, fields: LocationFields) -> Result<LocationDraft> {
    let owner = resolve_owner(conn, fields.owner.as_deref())?;
    let draft = LocationDraft::new(fields.name, fields.place_id, fields.chat_id);
    Ok(match owner {
        Some(user_id) => draft.with_owner(user_id),
        None => draft,
    })
}

fn resolve_owner(conn: &Connection, email: Option<&str>) -> Result<Option<UserId>> {
    let Some(email) = email else {
        return Ok(None);
    };
    let user = AuthService::new(conn)
        .find_user_by_email(email)?
        .ok_or_else(|| anyhow!("no account for {email}"))?;
    Ok(Some(user.id))
}

fn print_location(location: &Location) {
    let owner = location
        .user_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}\t{}\t{}\t{}\towner={}",
        location.id, location.name, location.place_id, location.telegram_chat_id, owner
    );
}

fn print_dashboard(dashboard: &LocationDashboard) {
    let stats = &dashboard.stats;
    println!("{} ({})", dashboard.location.name, dashboard.location.place_id);
    println!(
        "total={} average={:.1} responded={}",
        stats.total, stats.average_rating, stats.responded
    );
    for (rating, count) in stats.distribution.iter_desc() {
        println!(
            "  {rating}* {count:>4} ({:.0}%)",
            stats.percentage(rating)
        );
    }

    if dashboard.reviews.is_empty() {
        println!("no reviews match the current filter");
        return;
    }
    for review in &dashboard.reviews {
        println!(
            "[{}*] {} @{}: {}",
            review.rating,
            review.reviewer_name,
            review.review_date,
            review.review_text.as_deref().unwrap_or("")
        );
        if review.has_response() {
            println!("    reply: {}", review.response_text.as_deref().unwrap_or(""));
        }
    }
}
