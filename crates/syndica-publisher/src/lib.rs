pub mod batch;
pub mod format;
pub mod gate;
pub mod gateway;

pub use batch::{DEFAULT_BATCH_CAP, DEFAULT_PUBLISH_DELAY, Pipeline, PipelineOpts};
pub use format::format_article;
pub use gate::{DEFAULT_RUN_JOB, GateDecision, RunGate, RunWindow};
pub use gateway::{
    BloggerGateway, PostGateway, PublishError, TOKEN_PROVIDER, build_labels, build_title,
};
