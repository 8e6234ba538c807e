use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use sorbstat::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Bar state plus what the replay has reached so far.
struct ReplayDisplay {
    pb: ProgressBar,
    phase: &'static str,
    last_step: Option<u64>,
    /// Step at which the averages were last reset, if any.
    cleared_at: Option<u64>,
}

impl ReplayDisplay {
    fn status(&self) -> String {
        let mut status = match self.last_step {
            Some(step) => format!("{} | step {}", self.phase, step),
            None => self.phase.to_string(),
        };
        if let Some(step) = self.cleared_at {
            status.push_str(&format!(" | averaging since {}", step + 1));
        }
        status
    }

    fn begin_phase(&mut self, name: &'static str) {
        self.phase = name;
        self.pb.reset();
        self.pb.set_length(0);
        self.pb.set_style(spinner_style());
        self.pb
            .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        self.pb.set_message(self.status());
    }

    fn begin_steps(&mut self, total_steps: u64) {
        self.pb.disable_steady_tick();
        self.pb.reset();
        self.pb.set_length(total_steps);
        self.pb.set_style(bar_style());
        self.pb.set_message(self.status());
    }

    fn step_folded(&mut self, step: u64) {
        self.last_step = Some(step);
        self.pb.inc(1);
        self.pb.set_message(self.status());
    }

    fn finish_steps(&mut self) {
        if let Some(length) = self.pb.length() {
            self.pb.set_position(length);
        }
        self.pb.finish_with_message(self.status());
    }

    fn averages_cleared(&mut self, step: u64) {
        self.cleared_at = Some(step);
        self.pb
            .println(format!("  Equilibration ends at step {step}; root averages reset."));
        self.pb.set_message(self.status());
    }

    fn note(&self, msg: String) {
        if self.pb.is_finished() {
            self.pb.set_message(msg);
        } else {
            self.pb.println(format!("  {msg}"));
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .expect("Failed to create spinner style template")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} steps ({eta}) {msg}")
        .expect("Failed to create bar style template")
        .with_key(
            "eta",
            |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
            },
        )
        .progress_chars("##-")
}

/// Drives a stderr progress bar from replay events, showing the phase, the
/// last folded step and where the production averages start.
#[derive(Clone)]
pub struct CliProgressHandler {
    display: Arc<Mutex<ReplayDisplay>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
            .with_style(spinner_style());
        pb.finish_and_clear();

        Self {
            display: Arc::new(Mutex::new(ReplayDisplay {
                pb,
                phase: "Initializing",
                last_step: None,
                cleared_at: None,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let display = self.display.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut display) = display.lock() else {
                warn!("Progress display mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => display.begin_phase(name),
                Progress::PhaseFinish => {
                    display.pb.disable_steady_tick();
                    let status = display.status();
                    display.pb.finish_with_message(format!("✓ {status}"));
                }
                Progress::StepsStart { total_steps } => display.begin_steps(total_steps),
                Progress::StepFolded { step } => display.step_folded(step),
                Progress::StepsFinish => display.finish_steps(),
                Progress::AveragesCleared { step } => display.averages_cleared(step),
                Progress::Message(msg) => display.note(msg),
            }
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = CliProgressHandler::new();
        let display = handler.display.lock().unwrap();
        assert_eq!(display.pb.length(), Some(0));
        assert!(display.pb.is_finished());
        assert_eq!(display.last_step, None);
        assert_eq!(display.cleared_at, None);
    }

    #[test]
    fn bar_reports_last_folded_step_and_equilibration_boundary() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Aggregation",
        });
        callback(Progress::StepsStart { total_steps: 50 });
        {
            let display = handler.display.lock().unwrap();
            assert_eq!(display.pb.length(), Some(50));
            assert_eq!(display.pb.position(), 0);
            assert_eq!(display.pb.message(), "Aggregation");
        }

        callback(Progress::StepFolded { step: 10 });
        callback(Progress::StepFolded { step: 11 });
        callback(Progress::AveragesCleared { step: 11 });
        {
            let display = handler.display.lock().unwrap();
            assert_eq!(display.pb.position(), 2);
            assert_eq!(display.last_step, Some(11));
            assert_eq!(
                display.pb.message(),
                "Aggregation | step 11 | averaging since 12"
            );
        }

        callback(Progress::StepsFinish);
        {
            let display = handler.display.lock().unwrap();
            assert!(display.pb.is_finished());
            assert_eq!(display.pb.position(), 50);
        }

        callback(Progress::PhaseFinish);
        let display = handler.display.lock().unwrap();
        assert_eq!(
            display.pb.message(),
            "✓ Aggregation | step 11 | averaging since 12"
        );
    }

    #[test]
    fn message_after_finish_replaces_the_status() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();
        callback(Progress::Message("Resuming after step 4".to_string()));
        let display = handler.display.lock().unwrap();
        assert_eq!(display.pb.message(), "Resuming after step 4");
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart {
                name: "Preparation",
            });
            callback(Progress::StepFolded { step: 0 });
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        let display = handler.display.lock().unwrap();
        assert!(display.pb.is_finished());
        assert_eq!(display.pb.message(), "✓ Preparation | step 0");
    }
}
