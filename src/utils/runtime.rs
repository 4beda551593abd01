use anyhow::Result;

/// Every tool is single threaded. The time tracker only needs a runtime for its timers and file
/// writes.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
