//! Runtime utilities that wrap tokio's executor so downstream crates never
//! depend on it directly.

pub use tokio::runtime::{Builder, Handle, Runtime};

fn current_thread_runtime(start_paused: bool) -> Runtime {
    let mut builder = Builder::new_current_thread();
    builder.enable_all();
    if start_paused {
        builder.start_paused(true);
    }
    match builder.build() {
        Ok(runtime) => runtime,
        Err(err) => panic!("core_async::runtime: failed to build Tokio runtime: {err}"),
    }
}

/// Runs the provided future to completion on a fresh current-thread runtime.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    current_thread_runtime(false).block_on(future)
}

/// Same as [`block_on`] but with the clock paused.
///
/// Timers auto-advance whenever the runtime is idle, so a five second pause
/// resolves immediately while still being observed in order.
pub fn block_on_paused<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    current_thread_runtime(true).block_on(future)
}
