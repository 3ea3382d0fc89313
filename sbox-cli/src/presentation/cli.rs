use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// `sbox`: a small tar + encryption + compression archiver.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Suppress progress lines.
    #[arg(short = 's', long, global = true)]
    pub silent: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new archive from the given paths.
    Create {
        archive: PathBuf,
        inputs: Vec<PathBuf>,

        /// Disable compression; overrides `--level`.
        #[arg(short = 'n', long)]
        no_compression: bool,

        /// Compression preset, 0..=9 ('b' on the original CLI means 9).
        #[arg(short, long, default_value_t = 6)]
        level: u8,

        /// Prompt for a password and encrypt the archive.
        #[arg(short = 'p', long)]
        password: bool,
    },

    /// Extract an archive's contents into a directory.
    Extract {
        archive: PathBuf,

        #[arg(default_value = ".")]
        dest: PathBuf,

        #[arg(short = 'p', long)]
        password: bool,
    },

    /// List an archive's contents without writing any files.
    List {
        archive: PathBuf,

        #[arg(short = 'p', long)]
        password: bool,
    },

    /// Verify an archive's integrity without writing any files.
    Test {
        archive: PathBuf,

        #[arg(short = 'p', long)]
        password: bool,
    },
}
