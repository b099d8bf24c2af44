//! Local resource sampling for heartbeats.

use super::types::ResourceSample;
use crate::error::{CoordError, Result};

use sysinfo::System;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Source of local CPU/memory readings.
///
/// CPU usage has "since the previous call" semantics, so implementations keep state between
/// samples and take `&mut self`.
pub trait MetricsSampler: Send {
    fn sample(&mut self) -> Result<ResourceSample>;
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(value: f64) -> f64 {
    round1(value.clamp(0.0, 100.0))
}

/// Builds a publishable sample from raw readings, rejecting values that cannot be real.
pub fn normalize_sample(
    cpu_percent: f64,
    used_bytes: u64,
    total_bytes: u64,
) -> Result<ResourceSample> {
    if !cpu_percent.is_finite() {
        return Err(CoordError::Sampling(format!(
            "cpu reading is not finite: {}",
            cpu_percent
        )));
    }
    if total_bytes == 0 {
        return Err(CoordError::Sampling("total memory reported as 0".to_string()));
    }

    let used = used_bytes.min(total_bytes) as f64;
    let total = total_bytes as f64;

    Ok(ResourceSample {
        cpu_percent: percent(cpu_percent),
        memory_percent: percent(used / total * 100.0),
        memory_used_mb: round1(used / BYTES_PER_MB),
        memory_total_mb: round1(total / BYTES_PER_MB),
    })
}

/// Samples the host through `sysinfo`.
pub struct SystemSampler {
    system: System,
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        // Prime the CPU counters so the first tick has a baseline to diff against.
        system.refresh_cpu();
        system.refresh_memory();
        Self { system }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSampler for SystemSampler {
    fn sample(&mut self) -> Result<ResourceSample> {
        self.system.refresh_cpu();
        self.system.refresh_memory();

        let cpu = self.system.global_cpu_info().cpu_usage() as f64;
        normalize_sample(
            cpu,
            self.system.used_memory(),
            self.system.total_memory(),
        )
    }
}
