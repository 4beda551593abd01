use anyhow::Result;
use dsutil::ast::run_ast_explorer;
use tracing::error;

fn main() -> Result<()> {
    run_ast_explorer().inspect_err(|e| {
        error!("Error running ast explorer {e:?}");
    })?;
    Ok(())
}
