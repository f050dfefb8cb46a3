use anyhow::Result;
use clap::Parser;

mod cli;
mod cmd_del;
mod cmd_format;
mod cmd_get;
mod cmd_ls;
mod cmd_mkdir;
mod cmd_set;
mod cmd_stat;
mod util;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Format {
            image,
            block_size,
            block_count,
            prog_size,
        } => cmd_format::exec(image, block_size, block_count, prog_size),

        cli::Cmd::Get {
            image,
            block_size,
            prog_size,
            path,
            out,
        } => cmd_get::exec(image, block_size, prog_size, path, out),

        cli::Cmd::Set {
            image,
            block_size,
            prog_size,
            path,
            value,
            value_file,
        } => cmd_set::exec(image, block_size, prog_size, path, value, value_file),

        cli::Cmd::Del {
            image,
            block_size,
            prog_size,
            path,
        } => cmd_del::exec(image, block_size, prog_size, path),

        cli::Cmd::Mkdir {
            image,
            block_size,
            prog_size,
            path,
        } => cmd_mkdir::exec(image, block_size, prog_size, path),

        cli::Cmd::Ls {
            image,
            block_size,
            prog_size,
            path,
        } => cmd_ls::exec(image, block_size, prog_size, path),

        cli::Cmd::Stat {
            image,
            block_size,
            prog_size,
        } => cmd_stat::exec(image, block_size, prog_size),
    }
}
