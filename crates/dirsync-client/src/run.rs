//! Client main loop

use std::path::Path;

use tokio::sync::mpsc;

use dirsync_core::{ClientConfig, DirectoryWatcher, ScanOptions};

use crate::{ClientStore, Error, HttpRemote, Result, SyncDispatcher, SyncRemote};

/// Watch `root` and push every change to the configured server.
///
/// The watcher starts from the records persisted in the client store, so
/// anything changed while the client was down is picked up on the first
/// scan. Runs `iterations` scans, or until ctrl-c when `None`.
pub async fn run_client(
    root: &Path,
    config: &ClientConfig,
    iterations: Option<usize>,
) -> Result<()> {
    let store = ClientStore::open(&config.store_path(root))?;
    let remote = HttpRemote::new(&config.server_url);
    tracing::info!(root = %root.display(), server = %config.server_url, "Starting client");
    run_with(root, config, SyncDispatcher::new(root, remote, store), iterations).await
}

/// [`run_client`] with a caller-supplied dispatcher.
pub async fn run_with<R: SyncRemote>(
    root: &Path,
    config: &ClientConfig,
    dispatcher: SyncDispatcher<R>,
    iterations: Option<usize>,
) -> Result<()> {
    let options = ScanOptions {
        ignore: vec![config.state_dir.clone()],
    };
    let watcher = DirectoryWatcher::new(root)
        .with_interval(config.interval())
        .with_options(options)
        .with_baseline(dispatcher.store().baseline(root)?);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let watch = tokio::spawn(watcher.watch(iterations, tx));

    let dispatch = async {
        while let Some(batch) = rx.recv().await {
            for event in batch {
                match dispatcher.handle(&event).await {
                    Ok(_) => {}
                    Err(e) if !e.is_fatal() => {
                        tracing::warn!(error = %e, "Continuing after rejected change");
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    };

    let interrupted = tokio::select! {
        result = dispatch => {
            if let Err(e) = result {
                watch.abort();
                return Err(e);
            }
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    if interrupted {
        tracing::info!("Interrupted, stopping client");
        watch.abort();
        return Ok(());
    }

    // The dispatch loop only ends once the watcher dropped its sender.
    match watch.await {
        Ok(scan_result) => Ok(scan_result?),
        Err(e) => Err(Error::Task(e.to_string())),
    }
}
