use std::{env, fs, process};

use anyhow::Context;
use log::{error, info};

use splitledger::{
    formatter::{format_amount, format_balances, format_settlement},
    parser::parse_snapshot,
    report::{balance_summary, category_totals, spending_totals},
    LedgerConfig,
};

fn main() {
    pretty_env_logger::init();

    if let Err(e) = run() {
        error!("Unable to compute settlement: {e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let Some(path) = env::args().nth(1) else {
        anyhow::bail!("Usage: splitledger <snapshot file>");
    };

    let config = LedgerConfig::from_env().context("invalid configuration")?;
    info!("Using {config:?}");

    let source =
        fs::read_to_string(&path).with_context(|| format!("cannot read snapshot '{path}'"))?;
    let snapshot = parse_snapshot(&source, config.minor_digits)
        .with_context(|| format!("cannot parse snapshot '{path}'"))?;

    let (balances, transfers) =
        splitledger::settle(&snapshot.roster, &snapshot.expenses, &config.planner())?;
    info!(
        "Settled {} balances with {} transfers",
        balances.len(),
        transfers.len()
    );

    let summary = balance_summary(&snapshot.roster, &balances);
    let spending = spending_totals(&snapshot.expenses)?;
    println!("Balances\n");
    println!("{}", format_balances(&summary, &spending, config.minor_digits));

    println!("Spending by category\n");
    for (category, total) in category_totals(&snapshot.expenses)? {
        println!("{category}: {}", format_amount(total, config.minor_digits));
    }

    println!("\nSettlement\n");
    println!(
        "{}",
        format_settlement(&transfers, &snapshot.roster, config.minor_digits)
    );

    Ok(())
}
