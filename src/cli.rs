use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{commands::Options, store::OpenOptions};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct BucketshCLI {
    /// The path to the store file
    pub path: PathBuf,

    /// Dump values as byte arrays instead of strings
    #[arg(short, long)]
    pub raw: bool,

    /// Create an empty store if the file does not exist
    #[arg(short, long)]
    pub create: bool,

    /// How long to wait for the store lock, in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    pub timeout: u64,

    /// Maximum level of log messages written to stderr
    #[arg(short, long, default_value_t = tracing::Level::WARN)]
    pub log_level: tracing::Level,
}

impl BucketshCLI {
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            timeout: Duration::from_millis(self.timeout),
            create: self.create,
        }
    }

    pub fn options(&self) -> Options {
        Options { raw: self.raw }
    }
}
