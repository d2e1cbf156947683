use anyhow::Result;

/// Interactive sessions are driven by one thread so every event runs to completion before the
/// next one is looked at.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
