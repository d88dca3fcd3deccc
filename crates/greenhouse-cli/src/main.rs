mod config;
mod plant_cmds;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};

use greenhouse_core::PlantStore;
use greenhouse_db::pool;

use config::GreenhouseConfig;

#[derive(Parser)]
#[command(name = "greenhouse", about = "Plant collection and watering schedule tracker")]
struct Cli {
    /// Database URL (overrides GREENHOUSE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a greenhouse config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/greenhouse")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database and apply migrations
    DbInit,
    /// Serve the plant API over HTTP
    Serve {
        /// Address to bind (overrides config and GREENHOUSE_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides config and GREENHOUSE_PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Keep plants in memory instead of PostgreSQL (lost on exit)
        #[arg(long)]
        in_memory: bool,
    },
    /// Plant management
    Plant {
        #[command(subcommand)]
        command: PlantCommands,
    },
}

#[derive(Subcommand)]
pub enum PlantCommands {
    /// Add a plant
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// Species, matched case-insensitively by `list --species`
        #[arg(long)]
        species: String,
        /// Days between waterings (fractions allowed)
        #[arg(long)]
        every: f64,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List plants
    List {
        /// Only plants that need water now
        #[arg(long, conflicts_with_all = ["species", "from", "to"])]
        due: bool,
        /// Only plants of this species
        #[arg(long, conflicts_with_all = ["from", "to"])]
        species: Option<String>,
        /// Created at or after (RFC 3339, YYYY-MM-DD or epoch millis)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Created at or before
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one plant
    Show {
        /// Plant ID
        id: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Record a watering now
    Water {
        /// Plant ID
        id: String,
    },
    /// Change some fields of a plant
    Update {
        /// Plant ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        species: Option<String>,
        /// Days between waterings
        #[arg(long)]
        every: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a plant
    Remove {
        /// Plant ID
        id: String,
    },
}

/// Execute the `greenhouse init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        server: config::ServerSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  server = {}:{}", cfg.server.bind, cfg.server.port);
    println!();
    println!("Next: run `greenhouse db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `greenhouse db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = GreenhouseConfig::resolve(cli_db_url)?;

    println!("Initializing greenhouse database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let status = pool::plant_db_status(&db_pool).await?;
    println!(
        "Database ready: {} migration(s) applied, {} plant(s) stored.",
        status.migrations, status.plants
    );

    db_pool.close().await;

    println!("greenhouse db-init complete.");
    Ok(())
}

async fn cmd_serve(
    cli_db_url: Option<&str>,
    bind: Option<String>,
    port: Option<u16>,
    in_memory: bool,
) -> anyhow::Result<()> {
    let resolved = GreenhouseConfig::resolve(cli_db_url)?;
    let bind = bind.unwrap_or(resolved.server.bind);
    let port = port.unwrap_or(resolved.server.port);

    if in_memory {
        tracing::warn!("serving from memory; plants will not survive a restart");
        return serve_cmd::run_serve(PlantStore::in_memory(), &bind, port).await;
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;
    let result = serve_cmd::run_serve(PlantStore::postgres(db_pool.clone()), &bind, port).await;
    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve {
            bind,
            port,
            in_memory,
        } => {
            cmd_serve(cli.database_url.as_deref(), bind, port, in_memory).await?;
        }
        Commands::Plant { command } => {
            let resolved = GreenhouseConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let store = PlantStore::postgres(db_pool.clone());
            let result = plant_cmds::run_plant_command(command, &store).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
