mod config;
mod plan_cmds;
mod progress_cmd;
mod serve_cmd;

use clap::{Args, Parser, Subcommand};

use pathly_db::config::DbConfig;
use pathly_db::pool;

use config::PathlyConfig;

#[derive(Parser)]
#[command(name = "pathly", about = "Personalized learning plan generator")]
struct Cli {
    /// Database URL (overrides PATHLY_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a pathly config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// API key for the text generation service
        #[arg(long)]
        api_key: Option<String>,
        /// Model name to request from the text generation service
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the pathly database (requires config file or env vars)
    DbInit,
    /// Learning plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Show completion progress across active plans
    Progress,
    /// Start the HTTP API server
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
        /// Never call the text generation service; always use the offline plan
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate a learning plan for a skill
    Generate(GenerateArgs),
    /// Show plan details (or list all active plans)
    Show {
        /// Plan ID to show (omit to list all)
        plan_id: Option<String>,
        /// Also write the plan as TOML to this file
        #[arg(long)]
        output: Option<String>,
    },
    /// Archive a plan so it no longer counts toward progress
    Archive {
        /// Plan ID to archive
        plan_id: String,
    },
    /// Delete a plan with its modules and tasks
    Delete {
        /// Plan ID to delete
        plan_id: String,
    },
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Skill to learn (e.g. "Guitar")
    #[arg(long)]
    pub skill: String,
    /// Plan length in days
    #[arg(long)]
    pub duration: i64,
    /// Beginner, Intermediate or Expert (any case)
    #[arg(long, default_value = "Beginner")]
    pub difficulty: String,
    /// Minutes available per day (default: 60)
    #[arg(long)]
    pub daily_minutes: Option<i64>,
    /// Skip the text generation service and build the offline plan
    #[arg(long)]
    pub offline: bool,
    /// Store the plan in the database
    #[arg(long)]
    pub save: bool,
    /// Write the plan as TOML to this file
    #[arg(long)]
    pub output: Option<String>,
}

/// Execute the `pathly init` command: write config file.
fn cmd_init(
    db_url: &str,
    api_key: Option<String>,
    model: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        provider: config::ProviderSection {
            api_key,
            model,
            ..Default::default()
        },
    };

    let path = config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    if has_key {
        println!("  provider.api_key = (set)");
    } else {
        println!(
            "  provider.api_key not set; plans are generated offline unless {} is set",
            config::API_KEY_ENV
        );
    }
    if let Some(model) = &cfg.provider.model {
        println!("  provider.model = {model}");
    }
    println!();
    println!("Next: run `pathly db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `pathly db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = PathlyConfig::resolve(cli_db_url)?;

    println!("Initializing pathly database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    // 5. Clean shutdown.
    db_pool.close().await;

    println!("pathly db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            api_key,
            model,
            force,
        } => {
            cmd_init(&db_url, api_key, model, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Plan { command } => {
            let resolved = PathlyConfig::resolve(cli.database_url.as_deref())?;
            plan_cmds::run_plan_command(command, &resolved).await?;
        }
        Commands::Progress => {
            let resolved = PathlyConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = progress_cmd::run_progress(&db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve {
            bind,
            port,
            offline,
        } => {
            let resolved = PathlyConfig::resolve(cli.database_url.as_deref())?;
            let pipeline = resolved.pipeline(offline)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let state = serve_cmd::AppState {
                pool: db_pool.clone(),
                pipeline,
            };
            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_args_parse_with_defaults() {
        let cli = Cli::try_parse_from([
            "pathly", "plan", "generate", "--skill", "Guitar", "--duration", "30",
        ])
        .unwrap();
        match cli.command {
            Commands::Plan {
                command: PlanCommands::Generate(args),
            } => {
                assert_eq!(args.skill, "Guitar");
                assert_eq!(args.duration, 30);
                assert_eq!(args.difficulty, "Beginner");
                assert!(args.daily_minutes.is_none());
                assert!(!args.offline && !args.save);
            }
            _ => panic!("expected plan generate"),
        }
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["pathly", "serve"]).unwrap();
        match cli.command {
            Commands::Serve {
                bind,
                port,
                offline,
            } => {
                assert_eq!(bind, "127.0.0.1");
                assert_eq!(port, 3000);
                assert!(!offline);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn database_url_is_global() {
        let cli = Cli::try_parse_from([
            "pathly",
            "progress",
            "--database-url",
            "postgresql://h:5432/db",
        ])
        .unwrap();
        assert_eq!(cli.database_url.as_deref(), Some("postgresql://h:5432/db"));
    }
}
