//! Simulated upload progress that creeps toward a cap until the real response settles.

use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::debug;

use crate::view::{PageView, SharedPage};

/// Yields the next increment as a fraction of `max_step`, normally in `[0, 1)`.
pub type StepSource = Arc<dyn Fn() -> f64 + Send + Sync>;

pub fn random_steps() -> StepSource {
    Arc::new(rand::random::<f64>)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Running,
    Capped,
    Cancelled,
}

impl AnimationState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => AnimationState::Running,
            1 => AnimationState::Capped,
            _ => AnimationState::Cancelled,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            AnimationState::Running => 0,
            AnimationState::Capped => 1,
            AnimationState::Cancelled => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnimationConfig {
    pub interval: Duration,
    pub max_step: f64,
    pub cap: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            max_step: 10.0,
            cap: 95.0,
        }
    }
}

#[derive(Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn get(&self) -> AnimationState {
        AnimationState::from_u8(self.0.load(Ordering::SeqCst))
    }

    fn transition(&self, to: AnimationState) -> bool {
        self.0
            .compare_exchange(
                AnimationState::Running.as_u8(),
                to.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

pub struct ProgressAnimation {
    state: SharedState,
    task: JoinHandle<()>,
}

impl ProgressAnimation {
    pub fn start<P>(page: SharedPage<P>, config: AnimationConfig, steps: StepSource) -> Self
    where
        P: PageView + 'static,
    {
        let state = SharedState(Arc::new(AtomicU8::new(AnimationState::Running.as_u8())));
        let task_state = state.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; updates start one interval in.
            ticker.tick().await;

            let mut progress = 0.0_f64;
            loop {
                ticker.tick().await;

                let mut view = page.lock().await;
                // Checked under the page lock so a cancel can never be followed by an update.
                if task_state.get() != AnimationState::Running {
                    break;
                }

                let raw = steps() * config.max_step;
                let step = if raw.is_finite() {
                    raw.clamp(0.0, config.max_step)
                } else {
                    0.0
                };
                progress = (progress + step).min(config.cap);
                view.set_progress(progress);

                if progress >= config.cap {
                    task_state.transition(AnimationState::Capped);
                    debug!(cap = config.cap, "progress animation capped");
                    break;
                }
            }
        });

        Self { state, task }
    }

    pub fn state(&self) -> AnimationState {
        self.state.get()
    }

    /// Stops further updates. A capped animation keeps its `Capped` state.
    pub fn cancel(&self) {
        if self.state.transition(AnimationState::Cancelled) {
            debug!("progress animation cancelled");
        }
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ProgressAnimation {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{shared, MemoryPage};

    fn fixed(fraction: f64) -> StepSource {
        Arc::new(move || fraction)
    }

    #[tokio::test(start_paused = true)]
    async fn climbs_by_bounded_steps_and_caps() {
        let page = shared(MemoryPage::new());
        let animation =
            ProgressAnimation::start(Arc::clone(&page), AnimationConfig::default(), fixed(1.0));

        tokio::time::sleep(Duration::from_millis(1_010)).await;
        assert_eq!(page.lock().await.progress_history, vec![10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(animation.state(), AnimationState::Running);

        tokio::time::sleep(Duration::from_secs(5)).await;
        let history = page.lock().await.progress_history.clone();
        assert_eq!(history.last().copied(), Some(95.0));
        assert_eq!(history.len(), 10);
        assert!(history.iter().all(|value| *value <= 95.0));
        assert_eq!(animation.state(), AnimationState::Capped);
        assert!(animation.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_updates() {
        let page = shared(MemoryPage::new());
        let animation =
            ProgressAnimation::start(Arc::clone(&page), AnimationConfig::default(), fixed(0.5));

        tokio::time::sleep(Duration::from_millis(450)).await;
        animation.cancel();
        let seen = page.lock().await.progress_history.len();
        assert_eq!(seen, 2);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(page.lock().await.progress_history.len(), seen);
        assert_eq!(animation.state(), AnimationState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_steps_are_clamped() {
        let page = shared(MemoryPage::new());
        let _animation =
            ProgressAnimation::start(Arc::clone(&page), AnimationConfig::default(), fixed(7.0));

        tokio::time::sleep(Duration::from_millis(410)).await;
        assert_eq!(page.lock().await.progress_history, vec![10.0, 20.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn random_steps_never_exceed_cap() {
        let page = shared(MemoryPage::new());
        let _animation =
            ProgressAnimation::start(Arc::clone(&page), AnimationConfig::default(), random_steps());

        tokio::time::sleep(Duration::from_secs(30)).await;
        let history = page.lock().await.progress_history.clone();
        assert!(history.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(history.iter().all(|value| *value <= 95.0));
    }
}
