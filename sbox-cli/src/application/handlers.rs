use std::path::PathBuf;

use secrecy::SecretString;
use sbox_core::{pack, unpack, CompressionLevel, PackOptions, Progress, RunMode, UnpackOptions};

struct CliProgress {
    silent: bool,
}

impl Progress for CliProgress {
    fn line(&mut self, action: char, path: &str) {
        if !self.silent {
            println!(" {action} {path}");
        }
    }
}

fn prompt_password() -> sbox_core::Result<SecretString> {
    let raw = rpassword::prompt_password("password: ")?;
    Ok(SecretString::from(raw))
}

pub fn handle_create(
    archive: PathBuf,
    inputs: Vec<PathBuf>,
    no_compression: bool,
    level: u8,
    password: bool,
    silent: bool,
) -> sbox_core::Result<()> {
    let opts = PackOptions {
        compression: (!no_compression).then_some(CompressionLevel(level)),
        password: password.then(prompt_password).transpose()?,
    };
    let mut progress = CliProgress { silent };
    pack(&inputs, &archive, &opts, &mut progress)?;
    tracing::info!(archive = %archive.display(), files = inputs.len(), "archive created");
    Ok(())
}

pub fn handle_extract(
    archive: PathBuf,
    dest: PathBuf,
    password: bool,
    silent: bool,
) -> sbox_core::Result<()> {
    run_unpack(archive, dest, RunMode::Extract, password, silent)
}

pub fn handle_list(archive: PathBuf, password: bool, silent: bool) -> sbox_core::Result<()> {
    run_unpack(archive, PathBuf::new(), RunMode::List, password, silent)
}

pub fn handle_test(archive: PathBuf, password: bool, silent: bool) -> sbox_core::Result<()> {
    run_unpack(archive, PathBuf::new(), RunMode::Test, password, silent)
}

fn run_unpack(
    archive: PathBuf,
    dest: PathBuf,
    mode: RunMode,
    password: bool,
    silent: bool,
) -> sbox_core::Result<()> {
    let opts = UnpackOptions {
        mode,
        password: password.then(prompt_password).transpose()?,
    };
    let mut progress = CliProgress { silent };
    unpack(&archive, &dest, &opts, &mut progress)?;
    tracing::info!(archive = %archive.display(), "archive processed");
    Ok(())
}
