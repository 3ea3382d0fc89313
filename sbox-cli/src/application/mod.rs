pub mod handlers;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::presentation::cli::{Cli, Commands};

pub fn run() -> sbox_core::Result<()> {
    let cli = Cli::parse();

    if !cli.silent {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    }

    match cli.command {
        Commands::Create {
            archive,
            inputs,
            no_compression,
            level,
            password,
        } => handlers::handle_create(archive, inputs, no_compression, level, password, cli.silent),
        Commands::Extract {
            archive,
            dest,
            password,
        } => handlers::handle_extract(archive, dest, password, cli.silent),
        Commands::List { archive, password } => handlers::handle_list(archive, password, cli.silent),
        Commands::Test { archive, password } => handlers::handle_test(archive, password, cli.silent),
    }
}
