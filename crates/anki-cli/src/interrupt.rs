//! Ctrl-C handling

use std::thread;

use anki_core::CancellationToken;

/// Cancel `token` on the first Ctrl-C.
///
/// Runs a single-threaded tokio runtime on a detached thread that only waits
/// for the signal. Remote calls already in flight finish normally.
pub fn cancel_on_interrupt(token: CancellationToken) {
    let spawned = thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::warn!(error = %e, "Interrupt handling unavailable");
                    return;
                }
            };

            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tracing::warn!("Interrupted; waiting for in-flight requests to finish");
                        token.cancel();
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to listen for Ctrl-C"),
                }
            });
        });

    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Interrupt handling unavailable");
    }
}
