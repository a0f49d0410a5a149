mod batch;
mod engine;

pub use batch::{BatchError, BatchItem, BatchOutcome, BatchPromotionDriver};
pub use engine::{TransitionAction, TransitionEngine, TransitionError, TransitionOutcome};
