//! Host hardware readings used for session snapshots and tuning advice.

use crate::model::{SystemSnapshot, round2};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::thread;
use sysinfo::{Components, CpuRefreshKind, MINIMUM_CPU_UPDATE_INTERVAL, System};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const HIGH_CPU_PERCENT: f64 = 80.0;
const HIGH_MEMORY_PERCENT: f64 = 85.0;
const HIGH_TEMPERATURE_CELSIUS: f64 = 80.0;

#[derive(Debug, Clone, Serialize)]
pub struct SystemMetrics {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub total_memory_gb: f64,
    pub available_memory_gb: f64,
    pub cpu_temperature: Option<f64>,
    pub cpu_name: String,
    pub cpu_cores: usize,
}

impl SystemMetrics {
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            cpu_usage: Some(self.cpu_usage),
            memory_usage: Some(self.memory_usage),
            temperature: self.cpu_temperature,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub os_name: String,
    pub os_version: String,
    pub cpu_name: String,
    pub cpu_cores: usize,
    pub total_memory_gb: f64,
}

/// Samples CPU load, memory and temperature.
///
/// Blocks for the minimum CPU sampling interval; call it off the async runtime.
pub fn current_metrics() -> SystemMetrics {
    let mut sys = System::new();
    sys.refresh_cpu_specifics(CpuRefreshKind::everything());
    thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let total = sys.total_memory() as f64;
    let available = sys.available_memory() as f64;
    let memory_usage = if total > 0.0 {
        (total - available) / total * 100.0
    } else {
        0.0
    };

    SystemMetrics {
        cpu_usage: round2(f64::from(sys.global_cpu_usage())),
        memory_usage: round2(memory_usage),
        total_memory_gb: round2(total / BYTES_PER_GB),
        available_memory_gb: round2(available / BYTES_PER_GB),
        cpu_temperature: cpu_temperature(),
        cpu_name: cpu_name(&sys),
        cpu_cores: sys.cpus().len(),
    }
}

/// [`current_metrics`] on the blocking pool.
pub async fn sample_metrics() -> Result<SystemMetrics> {
    tokio::task::spawn_blocking(current_metrics)
        .await
        .context("System metrics task failed")
}

pub fn system_info() -> SystemInfo {
    let mut sys = System::new();
    sys.refresh_cpu_specifics(CpuRefreshKind::everything());
    sys.refresh_memory();

    SystemInfo {
        os_name: System::name().unwrap_or_else(|| "unknown".to_string()),
        os_version: System::os_version().unwrap_or_default(),
        cpu_name: cpu_name(&sys),
        cpu_cores: sys.cpus().len(),
        total_memory_gb: round2(sys.total_memory() as f64 / BYTES_PER_GB),
    }
}

/// Keyed tuning advice for the given readings, or a single `general` entry
/// when nothing is over its threshold.
pub fn optimization_recommendations(metrics: &SystemMetrics) -> BTreeMap<String, String> {
    let cpu = (metrics.cpu_usage > HIGH_CPU_PERCENT).then(|| {
        (
            "cpu",
            format!(
                "High CPU usage detected ({}%). Close unnecessary applications and consider lowering game settings.",
                metrics.cpu_usage
            ),
        )
    });
    let memory = (metrics.memory_usage > HIGH_MEMORY_PERCENT).then(|| {
        (
            "memory",
            format!(
                "High memory usage detected ({}%). Close background applications or consider adding more RAM.",
                metrics.memory_usage
            ),
        )
    });
    let temperature = metrics
        .cpu_temperature
        .filter(|celsius| *celsius > HIGH_TEMPERATURE_CELSIUS)
        .map(|celsius| {
            (
                "temperature",
                format!(
                    "High CPU temperature detected ({celsius}°C). Check cooling system and clean dust from fans."
                ),
            )
        });

    let advice = [cpu, memory, temperature]
        .into_iter()
        .flatten()
        .map(|(key, message)| (key.to_string(), message))
        .collect::<BTreeMap<_, _>>();

    if advice.is_empty() {
        BTreeMap::from([(
            "general".to_string(),
            "System performance looks good! Your setup is optimized for gaming.".to_string(),
        )])
    } else {
        advice
    }
}

fn cpu_name(sys: &System) -> String {
    sys.cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Hottest CPU sensor, or `None` when no sensor reports a positive reading.
fn cpu_temperature() -> Option<f64> {
    let components = Components::new_with_refreshed_list();

    components
        .list()
        .iter()
        .filter(|component| {
            let label = component.label().to_ascii_lowercase();
            ["cpu", "core", "package", "tctl", "tdie"]
                .iter()
                .any(|needle| label.contains(needle))
        })
        .map(|component| f64::from(component.temperature()))
        .filter(|celsius| celsius.is_finite() && *celsius > 0.0)
        .reduce(f64::max)
        .map(round2)
}
