// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dd_procbridge::{ProcessMetadata, status};
use log::debug;

#[derive(Parser, Debug)]
#[command(name = "dd-procbridge")]
#[command(about = "Launch and stop processes through the procbridge supervisor", long_about = None)]
struct Args {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch COMMAND under SHELL and print its pid
    Run {
        /// Name used in log lines
        #[arg(long, default_value = "")]
        name: String,

        /// Shell executable, resolved through PATH
        #[arg(long, default_value = "/bin/sh")]
        shell: String,

        /// File receiving the child's stdout and stderr
        #[arg(long)]
        log_path: String,

        /// Command string, followed by its positional arguments
        #[arg(last = true, required = true, num_args = 1..)]
        command: Vec<String>,
    },
    /// Terminate PID and print the status code
    Stop {
        #[arg(allow_negative_numbers = true)]
        pid: i64,
    },
}

#[allow(clippy::print_stdout)]
fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let level = if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    simple_logger::init_with_level(level)?;
    debug!(
        "dd-procbridge starting (version {})",
        env!("CARGO_PKG_VERSION")
    );
    debug!("stop policy: {:?}", dd_procbridge::global().config().stop);

    let (value, ok) = match args.command {
        Command::Run {
            name,
            shell,
            log_path,
            command,
        } => {
            let mut parts = command.into_iter();
            let metadata = ProcessMetadata {
                name,
                shell,
                command: parts.next().unwrap_or_default(),
                log_path,
                args: parts.collect(),
            };
            let pid = dd_procbridge::run(metadata);
            (pid, pid > 0)
        }
        Command::Stop { pid } => {
            let code = dd_procbridge::stop(pid);
            (code, code == status::STOP_OK)
        }
    };

    println!("{value}");
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
