use anyhow::Result;
use dsutil::shortcut::run_shortcut;
use tracing::error;

fn main() -> Result<()> {
    run_shortcut().inspect_err(|e| {
        error!("Error running shortcut {e:?}");
    })?;
    Ok(())
}
