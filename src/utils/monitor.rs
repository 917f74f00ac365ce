#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

/// 某個步驟結束時的行程資源快照
#[cfg(feature = "cli")]
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSample {
    pub step: String,
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub elapsed: Duration,
}

/// 記憶體用量最高的快照；同值時取較早者
#[cfg(feature = "cli")]
pub fn peak_sample(samples: &[ResourceSample]) -> Option<&ResourceSample> {
    samples
        .iter()
        .rev()
        .max_by_key(|s| s.memory_mb)
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    started: Instant,
    samples: Mutex<Vec<ResourceSample>>,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        // 停用時不取 pid，所有方法直接略過
        let pid = enabled.then(sysinfo::get_current_pid).and_then(|r| r.ok());
        Self {
            system: Mutex::new(System::new()),
            pid,
            started: Instant::now(),
            samples: Mutex::new(Vec::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.pid.is_some()
    }

    pub fn sample(&self, step: &str) -> Option<ResourceSample> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let process = system.process(pid)?;

        let sample = ResourceSample {
            step: step.to_string(),
            cpu_usage: process.cpu_usage(),
            memory_mb: process.memory() / 1024 / 1024,
            elapsed: self.started.elapsed(),
        };
        self.samples.lock().ok()?.push(sample.clone());
        Some(sample)
    }

    pub fn samples(&self) -> Vec<ResourceSample> {
        self.samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// 目前各步驟快照中的記憶體峰值
    pub fn peak(&self) -> Option<ResourceSample> {
        peak_sample(&self.samples()).cloned()
    }

    pub fn log_stats(&self, step: &str) {
        if let Some(sample) = self.sample(step) {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Time: {:?}",
                sample.step,
                sample.cpu_usage,
                sample.memory_mb,
                sample.elapsed
            );
        }
    }

    /// 回報記憶體峰值出現在哪個階段步驟；序列結束後不再另外取樣
    pub fn log_final_stats(&self) {
        let samples = self.samples();
        if let Some(peak) = peak_sample(&samples) {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB during '{}' ({} samples)",
                self.started.elapsed(),
                peak.memory_mb,
                peak.step,
                samples.len()
            );
        }
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 環境的空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn log_stats(&self, _step: &str) {}

    pub fn log_final_stats(&self) {}
}
