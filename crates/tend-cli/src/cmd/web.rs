use std::path::Path;

use anyhow::Context;
use tend_core::lock;

pub fn run(
    root: &Path,
    port: u16,
    no_open: bool,
    no_watch: bool,
    force: bool,
) -> anyhow::Result<()> {
    // Single dashboard per working tree; the lock dies with this process.
    let guard = lock::acquire(root, "web", "tend web", force)
        .context("another dashboard may be running (re-run with --force to take over)")?;

    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();

    let result = rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!("tend dashboard → http://localhost:{actual_port}  (Ctrl-C to stop)");

        tokio::select! {
            res = tend_server::serve_on(root_buf, listener, !no_open, !no_watch) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    });

    // Release even when the server errored, so a retry isn't falsely blocked.
    guard.release();
    println!("Server stopped");
    result
}
