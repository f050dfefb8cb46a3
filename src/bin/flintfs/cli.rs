use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Минимальный CLI для flintfs-образов.
#[derive(Parser, Debug)]
#[command(name = "flintfs", version, about = "flintfs image CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create and format a fresh image
    Format {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value_t = 512)]
        block_size: u32,
        #[arg(long, default_value_t = 256)]
        block_count: u32,
        #[arg(long, default_value_t = 32)]
        prog_size: u32,
    },
    /// Read a value
    Get {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value_t = 512)]
        block_size: u32,
        #[arg(long, default_value_t = 32)]
        prog_size: u32,
        #[arg(long)]
        path: String,
        /// Optional file to write raw value into
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write a value (literal string or from a file)
    Set {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value_t = 512)]
        block_size: u32,
        #[arg(long, default_value_t = 32)]
        prog_size: u32,
        #[arg(long)]
        path: String,
        /// Value as a literal string (UTF-8). Ignored if --value-file is set.
        #[arg(long)]
        value: Option<String>,
        /// Read value bytes from a file
        #[arg(long)]
        value_file: Option<PathBuf>,
    },
    /// Delete a value (idempotent)
    Del {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value_t = 512)]
        block_size: u32,
        #[arg(long, default_value_t = 32)]
        prog_size: u32,
        #[arg(long)]
        path: String,
    },
    /// Create a dictionary (with intermediates)
    Mkdir {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value_t = 512)]
        block_size: u32,
        #[arg(long, default_value_t = 32)]
        prog_size: u32,
        #[arg(long)]
        path: String,
    },
    /// List a dictionary
    Ls {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value_t = 512)]
        block_size: u32,
        #[arg(long, default_value_t = 32)]
        prog_size: u32,
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Print superblock fields and usage counters
    Stat {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value_t = 512)]
        block_size: u32,
        #[arg(long, default_value_t = 32)]
        prog_size: u32,
    },
}
