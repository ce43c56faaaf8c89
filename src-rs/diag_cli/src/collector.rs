use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;

/// Produces an opaque machine description that the server passes through
/// to its analyzer unchanged.
pub trait Collector {
    fn collect(&self) -> Result<String>;
}

/// Reads the captured output of an external collection script. `-` reads
/// standard input.
pub struct FileCollector {
    pub path: PathBuf,
}

impl Collector for FileCollector {
    fn collect(&self) -> Result<String> {
        if self.path.as_os_str() == "-" {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading system info from stdin")?;
            return Ok(buf);
        }
        fs::read_to_string(&self.path)
            .with_context(|| format!("reading system info from {}", self.path.display()))
    }
}

/// Portable description built from what the process can learn without
/// shelling out: platform, CPU topology, host and user, plus the kernel
/// release and uptime where `/proc` exposes them.
pub struct BasicCollector;

impl Collector for BasicCollector {
    fn collect(&self) -> Result<String> {
        let info = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "platform": env::consts::OS,
            "family": env::consts::FAMILY,
            "arch": env::consts::ARCH,
            "hostname": first_env(&["COMPUTERNAME", "HOSTNAME"]).unwrap_or_else(|| "unknown".to_string()),
            "user": first_env(&["USERNAME", "USER"]),
            "cpuCount": num_cpus::get(),
            "physicalCores": num_cpus::get_physical(),
            "kernelRelease": read_trimmed("/proc/sys/kernel/osrelease"),
            "uptimeSecs": read_trimmed("/proc/uptime").as_deref().and_then(parse_uptime),
            "collectorVersion": env!("CARGO_PKG_VERSION"),
        });
        serde_json::to_string_pretty(&info).context("encoding basic system info")
    }
}

fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

fn read_trimmed(path: &str) -> Option<String> {
    fs::read_to_string(path).ok().map(|raw| raw.trim().to_string())
}

// first field of /proc/uptime, whole seconds
fn parse_uptime(raw: &str) -> Option<u64> {
    raw.split_whitespace()
        .next()
        .and_then(|secs| secs.parse::<f64>().ok())
        .map(|secs| secs as u64)
}

/// Runs every collector and joins the non-empty outputs.
pub fn collect_all(collectors: &[Box<dyn Collector>]) -> Result<Option<String>> {
    let mut parts = Vec::new();
    for collector in collectors {
        let blob = collector.collect()?;
        if !blob.trim().is_empty() {
            parts.push(blob);
        }
    }
    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join("\n\n")))
    }
}
