use clap::{Parser, Subcommand};
use sqlx::PgPool;
use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use std::env;

mod init;
mod company;
mod jobs;
mod scan;
mod util;
mod telemetry;

#[derive(Parser)]
#[command(name = "careerscan", about = "Internship career-page scanner")]
struct Cli {
    #[arg(global = true, short, long)]
    dsn: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Init,
    Company(company::CompanyCmd),
    Scan(scan::ScanCmd),
    Jobs(jobs::JobsCmd),
}

impl Commands {
    fn op(&self) -> &'static str {
        match self {
            Commands::Init => "init",
            Commands::Company(_) => "company",
            Commands::Scan(_) => "scan",
            Commands::Jobs(_) => "jobs",
        }
    }
}

async fn connect(dsn: Option<String>) -> Result<PgPool> {
    let dsn = dsn
        .or_else(|| env::var("DATABASE_URL").ok())
        .ok_or_else(|| anyhow!("Please provide --dsn or set DATABASE_URL in .env"))?;
    PgPool::connect(&dsn).await.context("connecting to database")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and CAREERSCAN_LOG_FORMAT
    telemetry::config::init_tracing();

    let pool = match connect(cli.dsn).await {
        Ok(pool) => pool,
        Err(e) => {
            if cli.json { telemetry::emit::print_error(cli.command.op(), &e)?; }
            return Err(e);
        }
    };

    match cli.command {
        Commands::Init => init::run(&pool).await?,
        Commands::Company(args) => company::run(&pool, args).await?,
        Commands::Scan(args) => scan::run(&pool, args).await?,
        Commands::Jobs(args) => jobs::run(&pool, args).await?,
    }

    Ok(())
}
