//! council - operator CLI for the role and scoring engine.
//!
//! Opens the configured database, runs one core operation and prints the
//! result as JSON. Members may be named by handle or UUID; departments and
//! groups by symbolic name (`sports_department`, `G1`) or UUID.

use clap::{Args, Parser, Subcommand};
use council_core::{
    core_version, init_logging, open_db, AssignRoleRequest, Connection, CoreConfig, DepartmentId,
    DirectoryService, GroupChangeOutcome, GroupId, GroupService, LeaderboardQuery,
    LeaderboardService, MemberId, MemberListQuery, NewScore, RankingMode, Role,
    RoleChangeOutcome, RoleService, ScorePatch, ScoreService, SqliteDirectoryRepository,
    SqliteGroupRepository, SqliteLeaderboardRepository, SqliteRoleRepository,
    SqliteScoreRepository,
};
use log::debug;
use serde_json::json;
use std::path::PathBuf;
use uuid::Uuid;

mod error;

use error::{CliError, CliResult};

/// Student council role and score administration
#[derive(Parser)]
#[command(name = "council")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// SQLite database file (falls back to COUNCIL_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute log directory (falls back to COUNCIL_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error (falls back to COUNCIL_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Db(DbCommands),

    /// Print core version
    Version,
}

#[derive(Subcommand)]
enum DbCommands {
    /// Create the president once; prints the existing one afterwards
    BootstrapPresident {
        handle: String,
        display_name: String,
    },

    /// Register a plain member
    Register {
        handle: String,
        display_name: String,
        /// Initial group (not counted as a change)
        #[arg(long)]
        group: Option<String>,
    },

    /// Assign a role after hierarchy checks
    AssignRole {
        member: String,
        #[arg(value_parser = parse_role)]
        role: Role,
        /// Department, required for department_head
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Demote to plain member and clear the department
    RemoveRole {
        member: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Show role change history, newest first
    History {
        #[arg(long)]
        member: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Self-service group selection (one change allowed)
    SetGroup { member: String, group: String },

    /// Administrative group reassignment outside the change limit
    OverrideGroup {
        member: String,
        group: String,
        #[arg(long)]
        actor: String,
    },

    /// Score ledger commands
    Score(ScoreArgs),

    /// Ranked leaderboard
    Leaderboard {
        /// Restrict to one group
        #[arg(long)]
        group: Option<String>,
        /// Keep only the first N rows
        #[arg(long)]
        limit: Option<u32>,
        /// Equal totals share a rank
        #[arg(long)]
        dense: bool,
    },

    /// List members, newest first
    Members {
        #[arg(long, value_parser = parse_role)]
        role: Option<Role>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// List departments
    Departments,

    /// List groups
    Groups,
}

#[derive(Args)]
struct ScoreArgs {
    #[command(subcommand)]
    command: ScoreCommands,
}

#[derive(Subcommand)]
enum ScoreCommands {
    /// Record a score; negative values are penalties
    Add {
        member: String,
        department: String,
        #[arg(allow_hyphen_values = true)]
        value: i64,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Change value and/or reason
    Update {
        id: Uuid,
        #[arg(long, allow_hyphen_values = true)]
        value: Option<i64>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Delete one score
    Delete { id: Uuid },
    /// Show one score
    Show { id: Uuid },
    /// List scores of a member or a department
    List {
        #[arg(long, conflicts_with = "department", required_unless_present = "department")]
        member: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            err.print();
            std::process::exit(err.exit_code());
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let command = match cli.command {
        Commands::Version => {
            println!("council {}", core_version());
            return Ok(());
        }
        Commands::Db(command) => command,
    };

    let env = CoreConfig::from_env();
    let config = CoreConfig {
        db_path: cli.db.or(env.db_path),
        log_level: cli.log_level.or(env.log_level),
        log_dir: cli.log_dir.or(env.log_dir),
    };
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level()?, log_dir, true)?;
    }
    let db_path = config.db_path.ok_or(CliError::MissingDatabasePath)?;
    let conn = open_db(&db_path)?;
    debug!("event=cli_start module=cli status=ok");

    execute(&conn, command)
}

fn execute(conn: &Connection, command: DbCommands) -> CliResult<()> {
    let directory = DirectoryService::new(SqliteDirectoryRepository::try_new(conn)?);

    match command {
        DbCommands::BootstrapPresident {
            handle,
            display_name,
        } => {
            let bootstrap = directory.bootstrap_president(&handle, &display_name)?;
            print_json(&json!({
                "created": bootstrap.created,
                "president": bootstrap.president,
            }))
        }
        DbCommands::Register {
            handle,
            display_name,
            group,
        } => {
            let group_id = group
                .map(|value| resolve_group(&directory, &value))
                .transpose()?;
            print_json(&directory.register_member(&handle, &display_name, group_id)?)
        }
        DbCommands::AssignRole {
            member,
            role,
            department,
            actor,
            reason,
        } => {
            let request = AssignRoleRequest {
                subject_id: resolve_member(&directory, &member)?,
                new_role: role,
                department_id: department
                    .map(|value| resolve_department(&directory, &value))
                    .transpose()?,
                actor_id: resolve_member(&directory, &actor)?,
                reason,
            };
            let roles = RoleService::new(SqliteRoleRepository::try_new(conn)?);
            print_json(&roles.assign_role(&request)?)
        }
        DbCommands::RemoveRole {
            member,
            actor,
            reason,
        } => {
            let subject_id = resolve_member(&directory, &member)?;
            let actor_id = resolve_member(&directory, &actor)?;
            let roles = RoleService::new(SqliteRoleRepository::try_new(conn)?);
            match roles.remove_role(subject_id, actor_id, reason.as_deref())? {
                RoleChangeOutcome::Changed(entry) => {
                    print_json(&json!({ "changed": true, "entry": entry }))
                }
                RoleChangeOutcome::Unchanged => print_json(&json!({ "changed": false })),
            }
        }
        DbCommands::History { member, limit } => {
            let member_id = member
                .map(|value| resolve_member(&directory, &value))
                .transpose()?;
            let roles = RoleService::new(SqliteRoleRepository::try_new(conn)?);
            print_json(&roles.role_history(member_id, limit)?)
        }
        DbCommands::SetGroup { member, group } => {
            let subject_id = resolve_member(&directory, &member)?;
            let group_id = resolve_group(&directory, &group)?;
            let groups = GroupService::new(SqliteGroupRepository::try_new(conn)?);
            print_group_outcome(&groups.set_group(subject_id, group_id)?)
        }
        DbCommands::OverrideGroup {
            member,
            group,
            actor,
        } => {
            let subject_id = resolve_member(&directory, &member)?;
            let group_id = resolve_group(&directory, &group)?;
            let actor_id = resolve_member(&directory, &actor)?;
            let groups = GroupService::new(SqliteGroupRepository::try_new(conn)?);
            print_group_outcome(&groups.override_group(subject_id, group_id, actor_id)?)
        }
        DbCommands::Score(args) => execute_score(conn, &directory, args.command),
        DbCommands::Leaderboard {
            group,
            limit,
            dense,
        } => {
            let query = LeaderboardQuery {
                group_id: group
                    .map(|value| resolve_group(&directory, &value))
                    .transpose()?,
                limit,
                mode: if dense {
                    RankingMode::Dense
                } else {
                    RankingMode::Sequential
                },
            };
            let board = LeaderboardService::new(SqliteLeaderboardRepository::try_new(conn)?);
            print_json(&board.compute_leaderboard(&query)?)
        }
        DbCommands::Members {
            role,
            group,
            department,
            limit,
            offset,
        } => {
            let query = MemberListQuery {
                role,
                group_id: group
                    .map(|value| resolve_group(&directory, &value))
                    .transpose()?,
                department_id: department
                    .map(|value| resolve_department(&directory, &value))
                    .transpose()?,
                limit,
                offset,
            };
            print_json(&directory.list_members(&query)?)
        }
        DbCommands::Departments => print_json(&directory.list_departments()?),
        DbCommands::Groups => print_json(&directory.list_groups()?),
    }
}

fn execute_score(
    conn: &Connection,
    directory: &DirectoryService<SqliteDirectoryRepository<'_>>,
    command: ScoreCommands,
) -> CliResult<()> {
    let scores = ScoreService::new(SqliteScoreRepository::try_new(conn)?);
    match command {
        ScoreCommands::Add {
            member,
            department,
            value,
            actor,
            reason,
        } => {
            let score = NewScore {
                member_id: resolve_member(directory, &member)?,
                department_id: resolve_department(directory, &department)?,
                value,
                actor_id: resolve_member(directory, &actor)?,
                reason,
            };
            print_json(&scores.create_score(&score)?)
        }
        ScoreCommands::Update { id, value, reason } => {
            print_json(&scores.update_score(id, &ScorePatch { value, reason })?)
        }
        ScoreCommands::Delete { id } => {
            scores.delete_score(id)?;
            print_json(&json!({ "deleted": id }))
        }
        ScoreCommands::Show { id } => print_json(&scores.get_score(id)?),
        ScoreCommands::List {
            member,
            department,
            limit,
        } => match (member, department) {
            (Some(member), _) => {
                let member_id = resolve_member(directory, &member)?;
                print_json(&scores.list_member_scores(member_id, limit)?)
            }
            (None, Some(department)) => {
                let department_id = resolve_department(directory, &department)?;
                print_json(&scores.list_department_scores(department_id, limit)?)
            }
            (None, None) => Err(CliError::UnknownReference {
                kind: "score filter",
                value: String::new(),
            }),
        },
    }
}

fn resolve_member(
    directory: &DirectoryService<SqliteDirectoryRepository<'_>>,
    value: &str,
) -> CliResult<MemberId> {
    if let Ok(id) = Uuid::parse_str(value) {
        return Ok(directory.get_member(id)?.id);
    }
    directory
        .find_member_by_handle(value)?
        .map(|member| member.id)
        .ok_or_else(|| unknown("member", value))
}

fn resolve_department(
    directory: &DirectoryService<SqliteDirectoryRepository<'_>>,
    value: &str,
) -> CliResult<DepartmentId> {
    if let Ok(id) = Uuid::parse_str(value) {
        return Ok(id);
    }
    directory
        .department_by_name(value)?
        .map(|department| department.id)
        .ok_or_else(|| unknown("department", value))
}

fn resolve_group(
    directory: &DirectoryService<SqliteDirectoryRepository<'_>>,
    value: &str,
) -> CliResult<GroupId> {
    if let Ok(id) = Uuid::parse_str(value) {
        return Ok(id);
    }
    directory
        .group_by_name(value)?
        .map(|group| group.id)
        .ok_or_else(|| unknown("group", value))
}

fn unknown(kind: &'static str, value: &str) -> CliError {
    CliError::UnknownReference {
        kind,
        value: value.to_string(),
    }
}

fn parse_role(value: &str) -> Result<Role, String> {
    Role::parse(value.trim()).ok_or_else(|| {
        format!("unknown role `{value}`; expected president|department_head|group_leader|member")
    })
}

fn print_group_outcome(outcome: &GroupChangeOutcome) -> CliResult<()> {
    print_json(&json!({
        "changed": matches!(outcome, GroupChangeOutcome::Changed(_)),
        "member": outcome.member(),
    }))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
