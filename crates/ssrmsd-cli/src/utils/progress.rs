use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use ssrmsd::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Renders evaluation progress on stderr: a spinner during setup, then a bar over frames.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.disable_steady_tick();
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    /// A handler that never draws, for `--quiet` runs and non-interactive output.
    pub fn hidden() -> Self {
        let handler = Self::new();
        if let Ok(pb) = handler.pb.lock() {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        handler
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    pb_guard.reset();
                    pb_guard.set_length(0);
                    pb_guard.set_style(Self::spinner_style());
                    pb_guard.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    pb_guard.set_message(name.to_string());
                }
                Progress::PhaseFinish => {
                    pb_guard.disable_steady_tick();
                    pb_guard.finish_with_message("✓ Done");
                }
                Progress::FramesStart { total } => {
                    pb_guard.disable_steady_tick();
                    pb_guard.reset();
                    pb_guard.set_length(total);
                    pb_guard.set_position(0);
                    pb_guard.set_style(Self::bar_style());
                    pb_guard.set_message("Frames");
                }
                Progress::FrameEvaluated { frame } => {
                    pb_guard.set_position(frame as u64 + 1);
                }
                Progress::FramesFinish => {
                    let total = pb_guard.length().unwrap_or(0);
                    if pb_guard.position() < total {
                        pb_guard.set_position(total);
                    }
                    pb_guard.finish();
                }
                Progress::Message(msg) => {
                    if !pb_guard.is_finished() {
                        pb_guard.println(format!("  {}", msg));
                    } else {
                        pb_guard.set_message(msg);
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<12} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
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
        let pb = handler.pb.lock().unwrap();
        assert_eq!(pb.length(), Some(0));
        assert!(pb.is_finished());
    }

    #[test]
    fn callback_tracks_setup_and_frames() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Setup" });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.message(), "Setup");
            assert!(!pb.is_finished());
        }
        callback(Progress::PhaseFinish);
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.message(), "✓ Done");
        }

        callback(Progress::FramesStart { total: 4 });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.length(), Some(4));
            assert_eq!(pb.position(), 0);
        }

        callback(Progress::FrameEvaluated { frame: 0 });
        callback(Progress::FrameEvaluated { frame: 1 });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.position(), 2);
        }

        callback(Progress::FramesFinish);
        {
            let pb = handler.pb.lock().unwrap();
            assert!(pb.is_finished());
            assert_eq!(pb.position(), 4);
        }
    }

    #[test]
    fn messages_keep_the_running_phase_label() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Setup" });
        callback(Progress::Message("Template 'alpha-plus-cis' covers 3 window(s)".to_string()));
        assert_eq!(handler.pb.lock().unwrap().message(), "Setup");

        callback(Progress::PhaseFinish);
        callback(Progress::Message("no frames".to_string()));
        assert_eq!(handler.pb.lock().unwrap().message(), "no frames");
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Setup" });
            callback(Progress::Message("template resolved".to_string()));
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        let pb = handler.pb.lock().unwrap();
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "✓ Done");
    }
}
