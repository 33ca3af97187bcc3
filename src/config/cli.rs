use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Parser)]
#[command(name = "job-ledger")]
#[command(about = "Contract and job payment ledger")]
pub struct CliConfig {
    /// Path to TOML configuration file (policy and seed records)
    #[arg(short, long, default_value = "ledger.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show one contract (visible to its contractor)
    Contract {
        #[arg(long)]
        profile: String,
        id: u64,
    },
    /// List the caller's non-terminated contracts
    Contracts {
        #[arg(long)]
        profile: String,
    },
    /// List unpaid jobs on the caller's in-progress contracts
    UnpaidJobs {
        #[arg(long)]
        profile: String,
    },
    /// Pay for a job as its client
    Pay {
        #[arg(long)]
        profile: String,
        job_id: u64,
    },
    /// Top up the caller's balance
    Deposit {
        #[arg(long)]
        profile: String,
        amount: Option<Decimal>,
    },
    /// Profession that earned the most in a date range
    BestProfession {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Clients that paid the most in a date range
    BestClients {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        limit: Option<usize>,
    },
}
