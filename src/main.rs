use anyhow::Result;
use dsutil::tracker::run_time_tracker;
use tracing::error;

fn main() -> Result<()> {
    run_time_tracker().inspect_err(|e| {
        error!("Error running time tracker {e:?}");
    })?;
    Ok(())
}
