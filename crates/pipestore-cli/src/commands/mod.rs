// CLI subcommands

pub mod items;
pub mod transfer;
