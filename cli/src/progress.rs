use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use taskforge_core::api::PlanProgress;

/// Progress bars for a plan run: one overall bar plus a spinner per task in flight.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: HashMap<String, ProgressBar>,
    enabled: bool,
}

impl ProgressMonitor {
    /// `progress` seeds the overall bar so resumed runs start at the
    /// already-completed count.
    pub fn new(progress: PlanProgress, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                task_bars: HashMap::new(),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(progress.total as u64));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}")
        {
            overall.set_style(style.progress_chars("█▓▒░  "));
        }
        overall.set_position((progress.completed + progress.failed) as u64);
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            task_bars: HashMap::new(),
            enabled: true,
        }
    }

    pub fn start_task(&mut self, task_id: &str, role: &str) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        bar.set_message(format!("⏳ {task_id} [{role}]"));
        bar.enable_steady_tick(Duration::from_millis(100));

        self.task_bars.insert(task_id.to_string(), bar);
    }

    pub fn complete_task(&mut self, task_id: &str, success: bool, duration_ms: u64) {
        if !self.enabled {
            return;
        }

        if let Some(bar) = self.task_bars.remove(task_id) {
            let icon = if success { "✅" } else { "❌" };
            bar.finish_with_message(format!("{icon} {task_id} ({duration_ms}ms)"));
        }

        self.overall.inc(1);
    }

    pub fn set_message(&self, msg: &str) {
        if self.enabled {
            self.overall.set_message(msg.to_string());
        }
    }

    pub fn finish(&mut self, msg: &str) {
        if !self.enabled {
            return;
        }
        for (_, bar) in self.task_bars.drain() {
            bar.abandon();
        }
        self.overall.finish_with_message(msg.to_string());
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        if self.enabled && !self.overall.is_finished() {
            self.overall.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_is_inert() {
        let mut monitor = ProgressMonitor::new(PlanProgress::default(), false);
        monitor.start_task("a", "dev");
        monitor.complete_task("a", true, 5);
        monitor.set_message("x");
        monitor.finish("done");
        assert!(monitor.task_bars.is_empty());
    }

    #[test]
    fn test_enabled_monitor_counts_tasks() {
        let progress = PlanProgress {
            total: 3,
            completed: 1,
            pending: 2,
            ..PlanProgress::default()
        };
        let mut monitor = ProgressMonitor::new(progress, true);
        monitor.multi.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        assert_eq!(monitor.overall.position(), 1);

        monitor.start_task("b", "dev");
        assert_eq!(monitor.task_bars.len(), 1);
        monitor.complete_task("b", false, 10);
        assert!(monitor.task_bars.is_empty());
        assert_eq!(monitor.overall.position(), 2);
        monitor.finish("paused");
        assert!(monitor.overall.is_finished());
    }
}
