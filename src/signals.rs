use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

/// Set once SIGINT (or SIGTERM on unix) arrives. The window frontend turns it
/// into an abort keypress so the session unwinds through the results guard.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true at most once per raise.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Watches for termination signals on a background thread. The first signal
/// raises `interrupt`; a second one exits immediately.
pub fn install(interrupt: Interrupt) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            runtime.block_on(async move {
                match next_signal().await {
                    Ok(name) => {
                        warn!(signal = name, "interrupted, aborting session");
                        interrupt.raise();
                    }
                    Err(e) => {
                        error!("signal handler failed: {e}");
                        return;
                    }
                }
                if let Ok(name) = next_signal().await {
                    error!(signal = name, "interrupted again, exiting without cleanup");
                    std::process::exit(130);
                }
            })
        })?;
    Ok(())
}

#[cfg(unix)]
async fn next_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut term = signal(SignalKind::terminate())?;
    tokio::select! {
        r = tokio::signal::ctrl_c() => r.map(|_| "SIGINT"),
        _ = term.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn next_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "Ctrl-C")
}
