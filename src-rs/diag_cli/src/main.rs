mod cli;
mod client;
mod collector;
mod models;
mod render;

use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;

use cli::{Cli, Command, SubmitArgs};
use client::HTTPClient;
use collector::{collect_all, BasicCollector, Collector, FileCollector};
use models::{SubmitRequest, TaskView};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = HTTPClient::new(&cli.base)?;

    match cli.command {
        Command::Submit(args) => {
            let resp = client.submit(&build_request(&args)?)?;
            render::submitted(&resp.task_id, &resp.message);
        }
        Command::Status { task_id } => render::task(&client.status(&task_id)?),
        Command::Tasks { limit } => render::tasks(&client.list_tasks(limit)?),
        Command::Run {
            submit,
            interval_ms,
            max_polls,
        } => {
            let resp = client.submit(&build_request(&submit)?)?;
            render::submitted(&resp.task_id, &resp.message);
            let view = poll(&client, &resp.task_id, Duration::from_millis(interval_ms), max_polls)?;
            render::task(&view);
        }
    }
    Ok(())
}

fn build_request(args: &SubmitArgs) -> Result<SubmitRequest> {
    let mut collectors: Vec<Box<dyn Collector>> = Vec::new();
    if let Some(path) = &args.system_info_file {
        collectors.push(Box::new(FileCollector { path: path.clone() }));
    }
    if args.basic_info {
        collectors.push(Box::new(BasicCollector));
    }
    let raw_system_info = collect_all(&collectors)?;
    let problem_text = args.problem.clone().filter(|p| !p.trim().is_empty());
    if problem_text.is_none() && raw_system_info.is_none() {
        bail!("nothing to submit: pass --problem and/or --system-info-file / --basic-info");
    }
    Ok(SubmitRequest {
        problem_text,
        raw_system_info,
    })
}

/// Polls until the task reaches a terminal state or the budget runs out.
fn poll(client: &HTTPClient, task_id: &str, interval: Duration, max_polls: u32) -> Result<TaskView> {
    for attempt in 1..=max_polls {
        let view = client.status(task_id)?;
        if view.is_terminal() {
            return Ok(view);
        }
        render::waiting(&view, attempt);
        thread::sleep(interval);
    }
    bail!("task {} still running after {} polls", task_id, max_polls)
}
