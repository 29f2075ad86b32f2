use clap::{ArgAction, Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use mantis_gateway::mantis::IssueFilter;
use mantis_gateway::payload;
use mantis_gateway::stats::{GroupBy, Period};
use mantis_gateway::{CachedMantisClient, Config};

#[derive(Parser, Debug)]
#[command(name = "mantis-gateway")]
#[command(about = "Query a Mantis bug tracker through a cached gateway")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/mantis-gateway/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List issues matching the given filters
  Issues {
    #[arg(long)]
    project: Option<u64>,
    #[arg(long)]
    status: Option<u64>,
    #[arg(long)]
    handler: Option<u64>,
    #[arg(long)]
    reporter: Option<u64>,
    #[arg(long)]
    priority: Option<u64>,
    #[arg(long)]
    severity: Option<u64>,
    /// Free-text search
    #[arg(long)]
    search: Option<String>,
    /// Page number, 1-based
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    page_size: Option<u32>,
    /// Restrict the upstream response to these fields (repeatable)
    #[arg(long = "field")]
    fields: Vec<String>,
  },
  /// Show a single issue
  Issue { id: u64 },
  /// Look up a user by id or login name; defaults to the authenticated user
  User {
    #[arg(long)]
    id: Option<u64>,
    #[arg(long)]
    username: Option<String>,
  },
  /// List projects
  Projects,
  /// Enumerate users by sequential id probing (one request per id; slow on
  /// large id spaces)
  DiscoverUsers,
  /// Grouped issue statistics
  Stats {
    #[arg(long)]
    project: Option<u64>,
    #[arg(long, value_enum)]
    group_by: GroupBy,
    #[arg(long, value_enum, default_value_t = Period::All)]
    period: Period,
  },
  /// Per-assignee workload report
  Assignments {
    #[arg(long)]
    project: Option<u64>,
    /// Append a synthetic entry for unassigned issues
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    include_unassigned: bool,
    /// Only count issues with these status ids (repeatable)
    #[arg(long = "status")]
    statuses: Vec<u64>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load and validate configuration before anything touches the network.
  let config = Config::load(args.config.as_deref())?;
  let _guard = init_tracing(&config);

  let client = CachedMantisClient::new(&config)?;

  match run(&client, args.command).await {
    Ok(text) => {
      println!("{}", text);
      Ok(())
    }
    Err(err) => {
      // Render the failure the way gateway callers consume it: a message
      // that carries the status code when one is known.
      let mut rendering = serde_json::json!({ "error": err.to_string() });
      if let Some(status) = err.status_code() {
        rendering["statusCode"] = status.into();
      }
      println!("{}", rendering);
      std::process::exit(1);
    }
  }
}

async fn run(client: &CachedMantisClient, command: Command) -> mantis_gateway::Result<String> {
  let encoded = match command {
    Command::Issues {
      project,
      status,
      handler,
      reporter,
      priority,
      severity,
      search,
      page,
      page_size,
      fields,
    } => {
      let filter = IssueFilter {
        project_id: project,
        status_id: status,
        handler_id: handler,
        reporter_id: reporter,
        priority,
        severity,
        search,
        page,
        page_size,
        select: if fields.is_empty() { None } else { Some(fields) },
      };
      payload::encode(&client.search_issues(&filter).await?)?
    }
    Command::Issue { id } => payload::encode(&client.get_issue(id).await?)?,
    Command::User { id, username } => {
      let user = match (id, username) {
        (Some(id), _) => client.get_user(id).await?,
        (None, Some(name)) => client.get_user_by_username(&name).await?,
        (None, None) => client.current_user().await?,
      };
      payload::encode(&user)?
    }
    Command::Projects => payload::encode(&client.get_projects().await?)?,
    Command::DiscoverUsers => payload::encode(&client.discover_users().await?)?,
    Command::Stats {
      project,
      group_by,
      period,
    } => payload::encode(&client.issue_statistics(project, group_by, period).await?)?,
    Command::Assignments {
      project,
      include_unassigned,
      statuses,
    } => payload::encode(
      &client
        .assignment_statistics(project, include_unassigned, &statuses)
        .await?,
    )?,
  };

  encoded.into_text()
}

/// Install the tracing subscriber. Logs go to rolling files when the config
/// names a directory, to stderr otherwise; stdout is reserved for payloads.
fn init_tracing(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  match &config.logging.dir {
    Some(dir) => {
      let appender = tracing_appender::rolling::daily(dir, "mantis-gateway.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
      Some(guard)
    }
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
      None
    }
  }
}
