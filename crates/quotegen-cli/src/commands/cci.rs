//! CCI command - derive an interbank account code.

use clap::Args;
use tracing::warn;

use quotegen_core::extraction::{Bank, generate_cci};

/// Arguments for the cci command.
#[derive(Args)]
pub struct CciArgs {
    /// Bank name (BCP, Interbank, Scotiabank, "Banco de la Nación", BanBif, Otros)
    #[arg(short, long)]
    bank: String,

    /// Account number, hyphens allowed
    #[arg(short, long)]
    account: String,
}

pub fn run(args: CciArgs) -> anyhow::Result<()> {
    if Bank::from_name(&args.bank).is_none() {
        warn!("Unknown bank {:?}; no CCI can be derived", args.bank);
    }

    // Empty line when no CCI applies, so scripts can tell
    println!("{}", generate_cci(&args.bank, &args.account));
    Ok(())
}
