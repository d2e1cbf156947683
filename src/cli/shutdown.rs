use tokio::select;
use tokio_util::sync::CancellationToken;

/// Cancels the session on Ctrl-C. Returns early if the session is cancelled some other way.
pub async fn detect_shutdown(cancellation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancellation.cancel();
        },
        _ = cancellation.cancelled() => {},
    };
}
