// Checkpoint model, persistence seam and file store

pub mod checkpoint;
pub mod recorder;
pub mod store;

pub use checkpoint::{
    Checkpoint, CheckpointDetail, CheckpointPhase, ResumeState, CANCEL_USER_REQUESTED,
    PAUSE_PAGE_LIMIT_REACHED, PAUSE_USER_REQUESTED, PAUSE_USER_REQUESTED_MID_PAGE,
};
pub use recorder::{CheckpointRecorder, CheckpointSink, MemoryCheckpointSink};
pub use store::FileCheckpointStore;
