use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "diag-cli", about = "Submit diagnostics and poll for reports")]
pub struct Cli {
    /// Base URL of the diagnostic server.
    #[arg(long, env = "DIAG_API_URL", default_value = "http://localhost:3001")]
    pub base: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a diagnostic and print the task id.
    Submit(SubmitArgs),
    /// Show the current state of one task.
    Status { task_id: String },
    /// List recent tasks.
    Tasks {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Submit, then poll until the report is ready.
    Run {
        #[command(flatten)]
        submit: SubmitArgs,
        #[arg(long, default_value_t = 2000)]
        interval_ms: u64,
        #[arg(long, default_value_t = 60)]
        max_polls: u32,
    },
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Free-text description of the problem.
    #[arg(short, long)]
    pub problem: Option<String>,
    /// Captured output of the collection script, `-` for stdin.
    #[arg(long)]
    pub system_info_file: Option<PathBuf>,
    /// Attach OS and architecture details of this machine.
    #[arg(long)]
    pub basic_info: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_defaults() {
        let cli = Cli::try_parse_from(["diag-cli", "run", "-p", "slow boot", "--basic-info"]).unwrap();
        match cli.command {
            Command::Run {
                submit,
                interval_ms,
                max_polls,
            } => {
                assert_eq!(submit.problem.as_deref(), Some("slow boot"));
                assert!(submit.basic_info);
                assert_eq!(interval_ms, 2000);
                assert_eq!(max_polls, 60);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn status_requires_task_id() {
        assert!(Cli::try_parse_from(["diag-cli", "status"]).is_err());
        let cli = Cli::try_parse_from(["diag-cli", "--base", "http://x:1", "status", "task_1_1"]).unwrap();
        assert_eq!(cli.base, "http://x:1");
    }
}
