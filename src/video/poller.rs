use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::api::{GenerativeBackend, VideoRequest};
use crate::cancel::CancelToken;
use crate::error::{Result, StudioError};

/// How a submitted job is waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until the job finishes, however long that takes.
    pub max_polls: Option<u32>,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
    pub const DEFAULT_MAX_POLLS: u32 = 90;

    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_polls: None,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_polls: Some(Self::DEFAULT_MAX_POLLS),
        }
    }
}

/// Submits one video job and waits for it.
///
/// `on_tick` receives the elapsed wait before every poll. Returns the first
/// generated media record of the finished job.
pub async fn run_job(
    backend: &dyn GenerativeBackend,
    request: &VideoRequest,
    policy: PollPolicy,
    cancel: &CancelToken,
    on_tick: &mut (dyn FnMut(Duration) + Send),
) -> Result<Value> {
    let mut operation = backend.start_video(request).await?;
    let mut polls: u32 = 0;

    while !operation.done {
        if cancel.is_cancelled() {
            info!("Stop requested while waiting on {}", operation.name);
            return Err(StudioError::Cancelled);
        }
        if policy.max_polls.is_some_and(|max| polls >= max) {
            return Err(StudioError::PollTimeout { polls });
        }

        polls += 1;
        on_tick(policy.interval * polls);
        tokio::time::sleep(policy.interval).await;

        if cancel.is_cancelled() {
            info!("Stop requested while waiting on {}", operation.name);
            return Err(StudioError::Cancelled);
        }
        operation = backend.poll_video(&operation).await?;
        debug!("Operation {} done={} (poll {})", operation.name, operation.done, polls);
    }

    if let Some(error) = &operation.error {
        return Err(StudioError::Remote(format!(
            "operation {} failed: {}",
            operation.name, error.message
        )));
    }

    operation.first_result().cloned().ok_or_else(|| {
        StudioError::Remote(format!(
            "operation {} finished without generated videos",
            operation.name
        ))
    })
}
