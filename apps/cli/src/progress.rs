//! Terminal progress and end-of-run report.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use filingcast_core::{
    BatchRunResult, ItemOutcome, ItemStatus, ProgressReporter, RunMode, StageState,
};
use filingcast_shared::{Item, Stage};

/// CLI progress reporter using an indicatif spinner.
pub(crate) struct CliProgress {
    spinner: ProgressBar,
    /// `[i/n] entity` of the item in flight.
    current: Mutex<String>,
}

impl CliProgress {
    pub(crate) fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self {
            spinner,
            current: Mutex::new(String::new()),
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_started(&self, item: &Item, index: usize, total: usize) {
        let label = format!("[{index}/{total}] {}", item.key);
        self.spinner.set_message(label.clone());
        if let Ok(mut current) = self.current.lock() {
            *current = label;
        }
    }

    fn stage_state(&self, _item: &Item, stage: Stage, state: StageState) {
        if state == StageState::Running {
            let label = self.current.lock().map(|c| c.clone()).unwrap_or_default();
            self.spinner.set_message(format!("{label}: {stage}"));
        }
    }

    fn item_finished(&self, outcome: &ItemOutcome) {
        let line = match &outcome.status {
            ItemStatus::Succeeded => format!("  ✓ {}", outcome.item_key),
            ItemStatus::Skipped { reason } => format!("  - {} skipped: {reason}", outcome.item_key),
            ItemStatus::Failed { stage, message } => {
                format!("  ✗ {} failed at {stage}: {message}", outcome.item_key)
            }
        };
        self.spinner.println(line);
    }

    fn done(&self, _result: &BatchRunResult) {
        self.spinner.finish_and_clear();
    }
}

/// Final tally. Printed for every run, including aborted ones.
pub(crate) fn print_summary(result: &BatchRunResult) {
    let mode = match result.mode {
        RunMode::Interactive => "interactive",
        RunMode::Automatic => "automatic",
    };

    println!();
    if let Some(reason) = &result.aborted {
        println!("  Run aborted: {reason}");
    }
    println!("  Run:       {} ({mode})", result.run_id);
    if result.unpacked > 0 {
        println!("  Unpacked:  {}", result.unpacked);
    }
    println!("  Attempted: {}", result.attempted);
    println!("  Succeeded: {}", result.succeeded);
    println!("  Skipped:   {}", result.skipped);
    println!("  Failed:    {}", result.failed);
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());

    if !result.failures.is_empty() {
        println!();
        println!("  Failures:");
        for failure in &result.failures {
            println!(
                "    {} ({}) at {}: {}",
                failure.entity_name, failure.item_key, failure.stage, failure.message
            );
        }
    }
    println!();
}
