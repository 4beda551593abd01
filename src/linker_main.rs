use anyhow::Result;
use dsutil::linker::run_linker;
use tracing::error;

fn main() -> Result<()> {
    run_linker().inspect_err(|e| {
        error!("Error running linker {e:?}");
    })?;
    Ok(())
}
