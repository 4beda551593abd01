use anyhow::Result;
use dsutil::clipper::run_clipper;
use tracing::error;

fn main() -> Result<()> {
    run_clipper().inspect_err(|e| {
        error!("Error running clipper {e:?}");
    })?;
    Ok(())
}
