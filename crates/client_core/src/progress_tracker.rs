use shared::domain::{StepState, WorkflowStage};
use tracing::debug;

use crate::view::PageView;

/// Redraws every step indicator for `target`. Calling it again with the same stage is a no-op.
pub fn set_stage<P: PageView + ?Sized>(page: &mut P, target: WorkflowStage) {
    debug!(stage = %target, "progress tracker stage");
    for step in WorkflowStage::ALL {
        let state = StepState::for_stage(step, target);
        page.set_step(step, state, state == StepState::Active);
    }
}
