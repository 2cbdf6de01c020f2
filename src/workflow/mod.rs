//! Command implementations behind the CLI.
mod check;
mod context;
mod init;
mod ledger;
mod run;

pub(crate) use check::run_check;
pub(crate) use init::run_init;
pub(crate) use ledger::run_ledger;
pub(crate) use run::run_run;
