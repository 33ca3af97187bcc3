use clap::Parser;
use job_ledger::utils::{logger, validation::parse_date_bound, validation::Validate};
use job_ledger::{
    CliConfig, Command, ErrorKind, LedgerConfig, LedgerError, LedgerService, MemoryStore,
    ProfileIdResolver,
};
use serde::Serialize;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    let config = match LedgerConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config file '{}': {}", cli.config, e);
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            std::process::exit(2);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    tracing::info!(
        profiles = config.profiles.len(),
        contracts = config.contracts.len(),
        jobs = config.jobs.len(),
        "Ledger seeded"
    );

    let store = Arc::new(config.build_store());
    let resolver = ProfileIdResolver::new(store.clone());
    let service = LedgerService::new(store, resolver, &config.policy);

    if let Err(e) = run(&service, cli.command).await {
        match e.kind() {
            ErrorKind::Internal => tracing::error!("Operation failed: {}", e),
            _ => tracing::warn!("Operation rejected: {}", e),
        }
        let body = serde_json::to_string(&e.to_body())
            .unwrap_or_else(|_| r#"{"message":"Internal Server Error"}"#.to_string());
        eprintln!("{}", body);

        let exit_code = match e.kind() {
            ErrorKind::Internal => 3,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}

async fn run(
    service: &LedgerService<MemoryStore, ProfileIdResolver<MemoryStore>>,
    command: Command,
) -> Result<(), LedgerError> {
    match command {
        Command::Contract { profile, id } => print(&service.get_contract(&profile, id).await?),
        Command::Contracts { profile } => print(&service.list_contracts(&profile).await?),
        Command::UnpaidJobs { profile } => print(&service.list_unpaid_jobs(&profile).await?),
        Command::Pay { profile, job_id } => print(&service.pay_job(&profile, job_id).await?),
        Command::Deposit { profile, amount } => print(&service.deposit(&profile, amount).await?),
        Command::BestProfession { start, end } => {
            let start = parse_date_bound("start", &start, false)?;
            let end = parse_date_bound("end", &end, true)?;
            print(&service.best_profession(start, end).await?)
        }
        Command::BestClients { start, end, limit } => {
            let start = parse_date_bound("start", &start, false)?;
            let end = parse_date_bound("end", &end, true)?;
            print(&service.best_clients(start, end, limit).await?)
        }
    }
}

fn print<T: Serialize>(value: &T) -> Result<(), LedgerError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
