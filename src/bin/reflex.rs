//! Reflex CLI — runs analytic queries against an edit-history store and
//! prints the JSON response envelope.
//!
//! Usage:
//!   reflex edits --user Alice [--db path]
//!   reflex members --project WikiProject_Cats --sd 20090101 --ed 20100101

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::Level;

use reflex::api::params::{
    ActivePagesRequest, ActiveProjectsRequest, AnonCoordsRequest, EditsRequest,
    MembersRequest, ProjectPagesRequest, ProjectsRequest, RevertsRequest,
};
use reflex::api::ActiveProjectsResult;
use reflex::config::Config;
use reflex::{ApiResult, Envelope, OpenStore, ReflexApi, SqliteStore};

#[derive(Parser)]
#[command(
    name = "reflex",
    version,
    about = "Analytic query engine for wiki editing history"
)]
struct Cli {
    /// Path to the SQLite database file (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Most frequently edited pages for users, or most active users for pages
    Edits {
        /// Users to query, separated by "|"
        #[arg(long)]
        user: Option<String>,
        /// User ids to query, separated by "|"
        #[arg(long)]
        userid: Option<String>,
        /// Pages to query, separated by "|"
        #[arg(long)]
        page: Option<String>,
        /// Include subpages of the queried pages
        #[arg(long)]
        subpages: bool,
        /// Page ids to query, separated by "|"
        #[arg(long)]
        pageid: Option<String>,
        /// Compound page/week filter: "page1|210,211|page2|300"
        #[arg(long)]
        pageweek: Option<String>,
        /// Include article assessment information
        #[arg(long)]
        assessment: bool,
        /// Exclude users in the bot group
        #[arg(long)]
        exclude_bots: bool,
        /// Limit results to pages of one project
        #[arg(long)]
        projectid: Option<String>,
        /// Start date, YYYYMMDD
        #[arg(long)]
        sd: Option<String>,
        /// End date, YYYYMMDD
        #[arg(long)]
        ed: Option<String>,
        /// Start week (wins over --sd)
        #[arg(long)]
        sw: Option<String>,
        /// End week (wins over --ed)
        #[arg(long)]
        ew: Option<String>,
        /// Namespaces or namespace ids, separated by "|"
        #[arg(long)]
        namespace: Option<String>,
        /// Row cap; default 1000, non-positive for no limit
        #[arg(long)]
        limit: Option<String>,
        /// "count" (default) or "date"
        #[arg(long)]
        order: Option<String>,
        /// "asc" or "desc" (default)
        #[arg(long)]
        direction: Option<String>,
        /// Grouping dimensions from {user, page, date, assessment}
        #[arg(long)]
        group: Option<String>,
    },
    /// Reverted edits for a set of users
    Reverts {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        sd: Option<String>,
        #[arg(long)]
        ed: Option<String>,
        #[arg(long)]
        sw: Option<String>,
        #[arg(long)]
        ew: Option<String>,
        #[arg(long)]
        namespace: Option<String>,
        /// Default 20
        #[arg(long)]
        limit: Option<String>,
    },
    /// List projects, optionally filtered by title substring
    Projects {
        #[arg(long)]
        title: Option<String>,
    },
    /// Pages in the scope of one project
    ProjectPages {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        pageid: Option<String>,
    },
    /// Projects ranked by edits in the latest activity snapshot
    ActiveProjects {
        /// Grouping tokens from {project, namespace, title}
        #[arg(long)]
        group: Option<String>,
        /// "project" folds results into one matrix record per project
        #[arg(long)]
        compress: Option<String>,
    },
    /// Most active pages within one project
    ActivePages {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        project_id: Option<String>,
        /// Default 10
        #[arg(long)]
        limit: Option<String>,
    },
    /// Project members within a timeframe, from the link ledger
    Members {
        #[arg(long)]
        project: Option<String>,
        /// Project page ids, separated by "|"
        #[arg(long)]
        pageid: Option<String>,
        #[arg(long)]
        sd: Option<String>,
        #[arg(long)]
        ed: Option<String>,
    },
    /// Anonymous editors of a page with geolocated coordinates
    AnonCoords {
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        namespace: Option<String>,
        #[arg(long)]
        sd: Option<String>,
        #[arg(long)]
        ed: Option<String>,
    },
}

/// Flag arguments travel as the transport's "1"/absent convention.
fn flag_param(on: bool) -> Option<String> {
    on.then(|| "1".to_string())
}

/// Print the envelope for an API outcome; failure exits non-zero.
fn respond<T: Serialize>(
    result: ApiResult<T>,
    describe: impl FnOnce(&T) -> String,
) -> ExitCode {
    match result {
        Ok(payload) => {
            let envelope = Envelope::success(describe(&payload), payload);
            println!("{}", serde_json::to_string_pretty(&envelope).unwrap());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let envelope: Envelope<()> = Envelope::fail(err.to_string());
            println!("{}", serde_json::to_string_pretty(&envelope).unwrap());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.log);

    let db_path = cli.db.unwrap_or_else(|| config.db_path.clone());
    let store = match SqliteStore::open(&db_path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("Error: failed to open database: {err}");
            return ExitCode::FAILURE;
        }
    };
    let api = ReflexApi::new(Arc::new(store));

    match cli.command {
        Commands::Edits {
            user,
            userid,
            page,
            subpages,
            pageid,
            pageweek,
            assessment,
            exclude_bots,
            projectid,
            sd,
            ed,
            sw,
            ew,
            namespace,
            limit,
            order,
            direction,
            group,
        } => {
            let req = EditsRequest {
                user,
                user_id: userid,
                page,
                subpages: flag_param(subpages),
                page_id: pageid,
                page_week: pageweek,
                assessment: flag_param(assessment),
                exclude_bots: flag_param(exclude_bots),
                project_id: projectid,
                sd,
                ed,
                sw,
                ew,
                namespace,
                limit,
                order,
                direction,
                group,
            };
            respond(api.edits(&req).await, |rows| {
                format!("Fetched {} rows", rows.len())
            })
        }
        Commands::Reverts { user, sd, ed, sw, ew, namespace, limit } => {
            let req = RevertsRequest { user, sd, ed, sw, ew, namespace, limit };
            respond(api.reverts(&req).await, |rows| {
                format!("Fetched {} rows", rows.len())
            })
        }
        Commands::Projects { title } => {
            let req = ProjectsRequest { title };
            respond(api.projects(&req).await, |rows| {
                format!("Fetched {} rows", rows.len())
            })
        }
        Commands::ProjectPages { project, pageid } => {
            let req = ProjectPagesRequest { project, page_id: pageid };
            respond(api.project_pages(&req).await, |pages| {
                let total: usize = pages.values().map(Vec::len).sum();
                format!("Fetched {total} project pages.")
            })
        }
        Commands::ActiveProjects { group, compress } => {
            let req = ActiveProjectsRequest { group, compress };
            respond(api.active_projects(&req).await, |result| {
                let count = match result {
                    ActiveProjectsResult::Rows(rows) => rows.len(),
                    ActiveProjectsResult::Matrix(records) => records.len(),
                };
                format!("Fetched {count} projects")
            })
        }
        Commands::ActivePages { project, project_id, limit } => {
            let req = ActivePagesRequest { project, project_id, limit };
            respond(api.active_project_pages(&req).await, |rows| {
                format!("Fetched {} pages", rows.len())
            })
        }
        Commands::Members { project, pageid, sd, ed } => {
            let req = MembersRequest { project, page_id: pageid, sd, ed };
            respond(api.project_members(&req).await, |members| {
                format!("Fetched {} members", members.len())
            })
        }
        Commands::AnonCoords { page, namespace, sd, ed } => {
            let req = AnonCoordsRequest { page, namespace, sd, ed };
            respond(api.anon_coords(&req).await, |rows| {
                format!("Fetched {} anonymous editors", rows.len())
            })
        }
    }
}
