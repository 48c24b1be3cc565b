//! Domus: a local-first dormitory management CLI.
//!
//! All state lives in a single SQLite database under `.domus/`,
//! discovered by walking up from the working directory. Every mutation
//! routes through the store broker (serialized, transactional, audit
//! logged); the allocation engine in [`plugins::occupancy`] enforces the
//! two occupancy invariants (one assignment per resident, never above
//! room capacity) and the request lifecycle in [`plugins::requests`]
//! drives approvals into it.
//!
//! # Crate Structure
//!
//! - [`core`]: store plumbing (db, schema versioning, broker, config)
//! - [`plugins`]: domain subsystems (directory, occupancy, requests, export)

pub mod core;
pub mod plugins;

use crate::core::broker::DbBroker;
use crate::core::{config, db, error, migration, output, store::Store};
use crate::plugins::{
    directory,
    export::{self, ExportFormat},
    occupancy,
    requests::{self, Decision, Notification, RequestKind},
};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(
    name = "domus",
    version = env!("CARGO_PKG_VERSION"),
    about = "Dormitory buildings, rooms, residents, and the requests that move them"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a store in the current directory
    #[clap(name = "init")]
    Init(InitCli),

    /// Buildings and their rosters
    #[clap(name = "building", visible_alias = "b")]
    Building(BuildingCli),

    /// Rooms and their occupants
    #[clap(name = "room")]
    Room(RoomCli),

    /// Residents and their assignments
    #[clap(name = "resident", visible_alias = "r")]
    Resident(ResidentCli),

    /// Lifecycle requests: submit, list, resolve
    #[clap(name = "request", visible_alias = "q")]
    Request(RequestCli),

    /// Export the resident roster to interchange formats
    #[clap(name = "export")]
    Export(ExportCli),

    /// Credential checks for administrators and residents
    #[clap(name = "auth")]
    Auth(AuthCli),

    /// Show version information
    #[clap(name = "version")]
    Version,
}

#[derive(clap::Args, Debug)]
struct InitCli {
    /// Directory to initialize (defaults to current working directory).
    #[clap(short, long)]
    dir: Option<PathBuf>,
    /// Proceed even when a `.domus/` directory already exists.
    #[clap(long)]
    force: bool,
    /// Populate the fresh store with a demo campus.
    #[clap(long)]
    seed: bool,
}

#[derive(clap::Args, Debug)]
struct BuildingCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: BuildingCommand,
}

#[derive(Subcommand, Debug)]
enum BuildingCommand {
    /// List all buildings.
    List,
    /// List every resident housed in a building.
    Roster {
        #[clap(long)]
        id: i64,
    },
    /// List a building's rooms with occupancy.
    Rooms {
        #[clap(long)]
        id: i64,
    },
    /// Register a building.
    Add {
        #[clap(long)]
        number: i64,
        #[clap(long)]
        room_count: i64,
        /// Owning administrator id.
        #[clap(long)]
        admin: i64,
    },
}

#[derive(clap::Args, Debug)]
struct RoomCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: RoomCommand,
}

#[derive(Subcommand, Debug)]
enum RoomCommand {
    /// List rooms with free capacity.
    Free,
    /// List the residents currently in a room.
    Occupants {
        #[clap(long)]
        id: i64,
    },
    /// Register a room.
    Add {
        #[clap(long)]
        number: i64,
        #[clap(long)]
        capacity: i64,
        /// Owning building id.
        #[clap(long)]
        building: i64,
    },
}

#[derive(clap::Args, Debug)]
struct ResidentCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: ResidentCommand,
}

#[derive(Subcommand, Debug)]
enum ResidentCommand {
    /// List all residents.
    List,
    /// Show the room a resident currently holds.
    Room {
        #[clap(long)]
        id: i64,
    },
    /// Assign an unassigned resident to a room.
    Settle {
        #[clap(long)]
        id: i64,
        #[clap(long)]
        room: i64,
    },
    /// Remove a resident's current assignment.
    Evict {
        #[clap(long)]
        id: i64,
        /// Restrict the eviction to this administrator's building.
        #[clap(long)]
        admin: Option<i64>,
    },
    /// Move a resident to a different room.
    Transfer {
        #[clap(long)]
        id: i64,
        #[clap(long)]
        room: i64,
    },
    /// Register a resident.
    Add {
        #[clap(long)]
        given_name: String,
        #[clap(long)]
        family_name: String,
        #[clap(long)]
        ticket: i64,
        #[clap(long)]
        credential: String,
    },
}

#[derive(clap::Args, Debug)]
struct RequestCli {
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: RequestCommand,
}

#[derive(Subcommand, Debug)]
enum RequestCommand {
    /// Submit a new request on behalf of a resident.
    Submit {
        /// Request kind id: 1 settle, 2 evict, 3 transfer.
        #[clap(long)]
        kind: i64,
        #[clap(long)]
        name: String,
        /// ISO 8601 date (YYYY-MM-DD).
        #[clap(long)]
        date: String,
        #[clap(long)]
        resident: i64,
        #[clap(long, default_value = "")]
        text: String,
    },
    /// List pending requests, optionally for one resident.
    List {
        #[clap(long)]
        resident: Option<i64>,
    },
    /// Show one request.
    Show {
        #[clap(long)]
        id: i64,
    },
    /// Approve a pending request.
    Approve {
        #[clap(long)]
        id: i64,
        /// Target room id (required for settle and transfer requests).
        #[clap(long)]
        room: Option<i64>,
        /// Explanation included in the notification to the resident.
        #[clap(long, default_value = "")]
        note: String,
    },
    /// Reject a pending request.
    Reject {
        #[clap(long)]
        id: i64,
        /// Reason included in the notification to the resident.
        #[clap(long)]
        note: String,
    },
    /// List resolved requests (the audit trail).
    History,
}

#[derive(clap::Args, Debug)]
struct ExportCli {
    /// Output directory. Defaults to `export_dir` from config, then `out/`.
    #[clap(long)]
    out: Option<PathBuf>,
    /// Formats to write. Defaults to all four.
    #[clap(long, value_enum)]
    format: Vec<ExportFormat>,
}

#[derive(clap::Args, Debug)]
struct AuthCli {
    #[clap(subcommand)]
    command: AuthCommand,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Check an administrator credential.
    Admin {
        #[clap(long)]
        family_name: String,
        #[clap(long)]
        credential: String,
    },
    /// Check a resident credential.
    Resident {
        #[clap(long)]
        family_name: String,
        #[clap(long)]
        credential: String,
    },
}

fn find_domus_project_root(start_dir: &Path) -> Result<PathBuf, error::DomusError> {
    let mut current_dir = PathBuf::from(start_dir);
    loop {
        if current_dir.join(".domus").exists() {
            return Ok(current_dir);
        }
        if !current_dir.pop() {
            return Err(error::DomusError::NotFound(
                "'.domus' directory not found in current or parent directories. Run `domus init` first.".to_string(),
            ));
        }
    }
}

pub fn run() -> Result<(), error::DomusError> {
    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;

    match cli.command {
        Command::Version => {
            println!("v{}", migration::DOMUS_VERSION);
            Ok(())
        }
        Command::Init(init_cli) => run_init(init_cli, &current_dir),
        other => {
            let project_root = find_domus_project_root(&current_dir)?;
            let store_root = project_root.join(".domus");
            migration::check_and_migrate(&store_root)?;
            let store = Store::new(store_root);
            dispatch(other, &store)
        }
    }
}

fn run_init(init_cli: InitCli, current_dir: &Path) -> Result<(), error::DomusError> {
    let target_dir = match init_cli.dir {
        Some(d) => d,
        None => current_dir.to_path_buf(),
    };
    let target_dir = std::fs::canonicalize(&target_dir).map_err(error::DomusError::IoError)?;

    let store_root = target_dir.join(".domus");
    if store_root.exists() && !init_cli.force {
        println!(
            "{} store already initialized at {}",
            "⚠".bright_yellow(),
            store_root.display()
        );
        println!(
            "  {} use {} to initialize anyway",
            "▸".bright_yellow(),
            "--force".bright_cyan().bold()
        );
        return Ok(());
    }

    std::fs::create_dir_all(&store_root).map_err(error::DomusError::IoError)?;

    let broker = DbBroker::new(&store_root);
    let db_path = db::domus_db_path(&store_root);
    broker.with_txn(&db_path, "domus", "store.init", |conn| {
        db::ensure_schema(conn)?;
        if init_cli.seed {
            db::seed_demo_data(conn)?;
        }
        Ok(())
    })?;
    migration::write_version(&store_root)?;

    println!("{} {}", "●".bright_green(), "domus.db".bright_white());
    if init_cli.seed {
        println!(
            "{} {}",
            "●".bright_green(),
            "demo campus seeded".bright_white()
        );
    }
    println!(
        "{} store initialized at {}",
        "✓".bright_green(),
        store_root.display()
    );
    Ok(())
}

fn dispatch(command: Command, store: &Store) -> Result<(), error::DomusError> {
    match command {
        Command::Building(cli) => run_building_cli(store, cli),
        Command::Room(cli) => run_room_cli(store, cli),
        Command::Resident(cli) => run_resident_cli(store, cli),
        Command::Request(cli) => run_request_cli(store, cli),
        Command::Export(cli) => run_export_cli(store, cli),
        Command::Auth(cli) => run_auth_cli(store, cli),
        // Version and Init are handled before store discovery.
        _ => unreachable!(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), error::DomusError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn room_line(occ: &occupancy::RoomOccupancy) -> String {
    format!(
        "{}: room {} [{}] building {}",
        occ.room.id,
        occ.room.number,
        output::occupancy_cell(occ.occupied, occ.room.capacity),
        occ.room.building_id
    )
}

fn resident_line(resident: &directory::Resident) -> String {
    format!(
        "{}: {} (ticket {})",
        resident.id,
        resident.full_name(),
        resident.ticket
    )
}

fn request_line(request: &requests::RequestRecord) -> String {
    let kind = request
        .kind()
        .map(|k| k.label())
        .unwrap_or("unknown");
    format!(
        "{}: [{}] {} (resident {}, {}) {}",
        request.id,
        kind,
        request.name,
        request.resident_id,
        request.date,
        output::compact_line(&request.body, 60)
    )
}

fn run_building_cli(store: &Store, cli: BuildingCli) -> Result<(), error::DomusError> {
    match cli.command {
        BuildingCommand::List => {
            let buildings = occupancy::list_buildings(store)?;
            if cli.format == OutputFormat::Json {
                return print_json(&buildings);
            }
            if buildings.is_empty() {
                println!("No buildings registered.");
            }
            for b in buildings {
                println!(
                    "{}: building {} (rooms declared: {}, administrator {})",
                    b.id, b.number, b.room_count, b.admin_id
                );
            }
        }
        BuildingCommand::Roster { id } => {
            let roster = occupancy::building_roster(store, id)?;
            if cli.format == OutputFormat::Json {
                return print_json(&roster);
            }
            if roster.is_empty() {
                println!("No residents housed in building {}.", id);
            }
            for resident in roster {
                println!("{}", resident_line(&resident));
            }
        }
        BuildingCommand::Rooms { id } => {
            let rooms = occupancy::rooms_in_building(store, id)?;
            if cli.format == OutputFormat::Json {
                return print_json(&rooms);
            }
            if rooms.is_empty() {
                println!("No rooms in building {}.", id);
            }
            for occ in rooms {
                println!("{}", room_line(&occ));
            }
        }
        BuildingCommand::Add {
            number,
            room_count,
            admin,
        } => {
            let id = occupancy::add_building(store, number, room_count, admin)?;
            println!("{} building registered with id {}", "✓".bright_green(), id);
        }
    }
    Ok(())
}

fn run_room_cli(store: &Store, cli: RoomCli) -> Result<(), error::DomusError> {
    match cli.command {
        RoomCommand::Free => {
            let rooms = occupancy::free_rooms(store)?;
            if cli.format == OutputFormat::Json {
                return print_json(&rooms);
            }
            if rooms.is_empty() {
                println!("No rooms with free capacity.");
            }
            for occ in rooms {
                println!("{}", room_line(&occ));
            }
        }
        RoomCommand::Occupants { id } => {
            let occupants = occupancy::room_occupants(store, id)?;
            if cli.format == OutputFormat::Json {
                return print_json(&occupants);
            }
            if occupants.is_empty() {
                println!("Room {} has no occupants.", id);
            }
            for resident in occupants {
                println!("{}", resident_line(&resident));
            }
        }
        RoomCommand::Add {
            number,
            capacity,
            building,
        } => {
            let id = occupancy::add_room(store, number, capacity, building)?;
            println!("{} room registered with id {}", "✓".bright_green(), id);
        }
    }
    Ok(())
}

fn run_resident_cli(store: &Store, cli: ResidentCli) -> Result<(), error::DomusError> {
    match cli.command {
        ResidentCommand::List => {
            let residents = directory::list_residents(store)?;
            if cli.format == OutputFormat::Json {
                return print_json(&residents);
            }
            if residents.is_empty() {
                println!("No residents registered.");
            }
            for resident in residents {
                println!("{}", resident_line(&resident));
            }
        }
        ResidentCommand::Room { id } => {
            let room = occupancy::resident_room(store, id)?;
            if cli.format == OutputFormat::Json {
                return print_json(&room);
            }
            match room {
                Some(room) => println!(
                    "resident {} holds room {} (id {}, building {})",
                    id, room.number, room.id, room.building_id
                ),
                None => println!("resident {} is not assigned to a room", id),
            }
        }
        ResidentCommand::Settle { id, room } => {
            occupancy::settle(store, id, room)?;
            println!(
                "{} resident {} settled into room {}",
                "✓".bright_green(),
                id,
                room
            );
        }
        ResidentCommand::Evict { id, admin } => {
            match admin {
                Some(admin_id) => occupancy::evict_from_building(store, admin_id, id)?,
                None => occupancy::evict(store, id)?,
            }
            println!("{} resident {} evicted", "✓".bright_green(), id);
        }
        ResidentCommand::Transfer { id, room } => {
            occupancy::transfer(store, id, room)?;
            println!(
                "{} resident {} transferred to room {}",
                "✓".bright_green(),
                id,
                room
            );
        }
        ResidentCommand::Add {
            given_name,
            family_name,
            ticket,
            credential,
        } => {
            let id = directory::add_resident(store, &given_name, &family_name, ticket, &credential)?;
            println!("{} resident registered with id {}", "✓".bright_green(), id);
        }
    }
    Ok(())
}

fn run_request_cli(store: &Store, cli: RequestCli) -> Result<(), error::DomusError> {
    match cli.command {
        RequestCommand::Submit {
            kind,
            name,
            date,
            resident,
            text,
        } => {
            let id = requests::submit(store, kind, &name, &date, resident, &text)?;
            println!("{} request submitted with id {}", "✓".bright_green(), id);
        }
        RequestCommand::List { resident } => {
            let listed = match resident {
                Some(resident_id) => requests::list_for_resident(store, resident_id)?,
                None => requests::list_pending(store)?,
            };
            if cli.format == OutputFormat::Json {
                return print_json(&listed);
            }
            if listed.is_empty() {
                println!("No pending requests.");
            }
            for request in listed {
                println!("{}", request_line(&request));
            }
        }
        RequestCommand::Show { id } => {
            let request = requests::get_request(store, id)?;
            if cli.format == OutputFormat::Json {
                return print_json(&request);
            }
            println!("{}", request_line(&request));
            println!("  status: {}", request.status);
            if let Some(note) = &request.note {
                println!("  note: {}", note);
            }
        }
        RequestCommand::Approve { id, room, note } => {
            // UI affordance: surface the free-room list before the engine
            // rejects a target-less settle/transfer approval.
            let request = requests::get_request(store, id)?;
            let needs_room = matches!(
                request.kind()?,
                RequestKind::Settle | RequestKind::Transfer
            );
            if needs_room && room.is_none() {
                println!("Approving this request needs a target room. Rooms with capacity:");
                for occ in occupancy::free_rooms(store)? {
                    println!("  {}", room_line(&occ));
                }
                return Err(error::DomusError::ValidationError(
                    "pass --room <id> to approve a settle or transfer request".to_string(),
                ));
            }

            let notification = requests::resolve(store, id, Decision::Approve, room, &note)?;
            print_notification(&notification, cli.format)?;
        }
        RequestCommand::Reject { id, note } => {
            let notification = requests::resolve(store, id, Decision::Reject, None, &note)?;
            print_notification(&notification, cli.format)?;
        }
        RequestCommand::History => {
            let history = requests::list_history(store)?;
            if cli.format == OutputFormat::Json {
                return print_json(&history);
            }
            if history.is_empty() {
                println!("No resolved requests.");
            }
            for request in history {
                println!("{} [{}]", request_line(&request), request.status);
            }
        }
    }
    Ok(())
}

fn print_notification(
    notification: &Notification,
    format: OutputFormat,
) -> Result<(), error::DomusError> {
    if format == OutputFormat::Json {
        return print_json(notification);
    }
    let verdict = match notification.decision {
        Decision::Approve => "approved".bright_green(),
        Decision::Reject => "rejected".bright_yellow(),
    };
    println!(
        "{} request {} {}",
        "✓".bright_green(),
        notification.request_id,
        verdict
    );
    println!(
        "To: {} (resident {})",
        notification.resident.full_name(),
        notification.resident.id
    );
    println!(
        "Your request '{}' dated {} was {}.",
        notification.request_name,
        notification.request_date,
        notification.decision.status()
    );
    if !notification.note.is_empty() {
        println!("Note: {}", notification.note);
    }
    Ok(())
}

fn run_export_cli(store: &Store, cli: ExportCli) -> Result<(), error::DomusError> {
    let config = config::load_config(&store.root)?;
    let out_dir = cli.out.unwrap_or_else(|| config.export_dir());
    let formats: Vec<ExportFormat> = if cli.format.is_empty() {
        ExportFormat::ALL.to_vec()
    } else {
        cli.format
    };

    let written = export::export_residents(store, &out_dir, &formats)?;
    for path in written {
        println!("{} {}", "●".bright_green(), path.display());
    }
    println!("{} roster exported", "✓".bright_green());
    Ok(())
}

fn run_auth_cli(store: &Store, cli: AuthCli) -> Result<(), error::DomusError> {
    match cli.command {
        AuthCommand::Admin {
            family_name,
            credential,
        } => match directory::authenticate_administrator(store, &family_name, &credential)? {
            Some(admin) => println!(
                "{} authenticated: {} {} (administrator {})",
                "✓".bright_green(),
                admin.given_name,
                admin.family_name,
                admin.id
            ),
            None => println!("{} authentication failed", "✗".bright_yellow()),
        },
        AuthCommand::Resident {
            family_name,
            credential,
        } => match directory::authenticate_resident(store, &family_name, &credential)? {
            Some(resident) => println!(
                "{} authenticated: {} (resident {})",
                "✓".bright_green(),
                resident.full_name(),
                resident.id
            ),
            None => println!("{} authentication failed", "✗".bright_yellow()),
        },
    }
    Ok(())
}
