//! Interval-polling change detection
//!
//! Each cycle walks the whole tree into a [`Snapshot`] and diffs it against
//! the previous one. The previous snapshot is an explicit value (owned by a
//! [`DirectoryWatcher`] or passed to [`scan`]), never global state.
//!
//! Known blind spots: a path created and deleted within one interval is never
//! seen, and a content change that leaves the mtime untouched is not reported.

mod snapshot;

pub use snapshot::{ScanOptions, Snapshot};

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::{ChangeEvent, Error, Result};

/// Default pause between two scans.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Compute the events that turn `before` into `after`.
///
/// Order: deleted folders, created folders, deleted files, created files,
/// modified files. Each group is in ascending path order.
pub fn diff(before: &Snapshot, after: &Snapshot) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    events.extend(
        before
            .folders
            .difference(&after.folders)
            .cloned()
            .map(ChangeEvent::DeletedFolder),
    );
    events.extend(
        after
            .folders
            .difference(&before.folders)
            .cloned()
            .map(ChangeEvent::CreatedFolder),
    );

    events.extend(
        before
            .files
            .keys()
            .filter(|p| !after.files.contains_key(*p))
            .cloned()
            .map(ChangeEvent::DeletedFile),
    );
    events.extend(
        after
            .files
            .keys()
            .filter(|p| !before.files.contains_key(*p))
            .cloned()
            .map(ChangeEvent::CreatedFile),
    );

    // Created paths are absent from `before`, so they never reach here.
    for (path, modified) in &after.files {
        if let Some(previous) = before.files.get(path)
            && previous != modified
        {
            events.push(ChangeEvent::ModifiedFile(path.clone()));
        }
    }

    events
}

/// Scan `root` once.
///
/// With no previous snapshot (a cold start) nothing is reported; the result
/// only establishes the baseline.
pub fn scan(
    root: &Path,
    previous: Option<&Snapshot>,
    options: &ScanOptions,
) -> Result<(Vec<ChangeEvent>, Snapshot)> {
    let after = Snapshot::capture(root, options)?;
    let events = previous.map(|before| diff(before, &after)).unwrap_or_default();
    Ok((events, after))
}

/// Polls one root directory on a fixed interval.
#[derive(Debug, Clone)]
pub struct DirectoryWatcher {
    root: PathBuf,
    options: ScanOptions,
    interval: Duration,
    baseline: Option<Snapshot>,
}

impl DirectoryWatcher {
    /// A watcher with no baseline: the first scan reports nothing.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: ScanOptions::default(),
            interval: DEFAULT_INTERVAL,
            baseline: None,
        }
    }

    /// Start from a persisted baseline instead of a cold start.
    ///
    /// Entries on disk but missing from `baseline` are reported as created on
    /// the first scan.
    pub fn with_baseline(mut self, baseline: Snapshot) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn baseline(&self) -> Option<&Snapshot> {
        self.baseline.as_ref()
    }

    /// Run one scan cycle and adopt its snapshot as the new baseline.
    pub fn poll(&mut self) -> Result<Vec<ChangeEvent>> {
        let (events, snapshot) = scan(&self.root, self.baseline.as_ref(), &self.options)?;
        self.baseline = Some(snapshot);
        if !events.is_empty() {
            tracing::debug!(root = %self.root.display(), count = events.len(), "Detected changes");
        }
        Ok(events)
    }

    /// Blocking loop: scan, hand every event to `on_change`, sleep.
    ///
    /// Runs `iterations` cycles, or forever when `None`. No sleep follows the
    /// final bounded cycle.
    pub fn run<F>(&mut self, iterations: Option<usize>, mut on_change: F) -> Result<()>
    where
        F: FnMut(ChangeEvent),
    {
        let mut remaining = iterations;
        loop {
            for event in self.poll()? {
                on_change(event);
            }

            if let Some(n) = remaining.as_mut() {
                *n = n.saturating_sub(1);
                if *n == 0 {
                    return Ok(());
                }
            }
            std::thread::sleep(self.interval);
        }
    }

    /// Async loop: each non-empty batch of events is sent on `events`.
    ///
    /// Scans run on the blocking pool. Stops after `iterations` cycles, or
    /// when the receiving side is dropped.
    pub async fn watch(
        mut self,
        iterations: Option<usize>,
        events: UnboundedSender<Vec<ChangeEvent>>,
    ) -> Result<()> {
        tracing::info!(
            root = %self.root.display(),
            interval = ?self.interval,
            "Watching directory"
        );

        let mut remaining = iterations;
        loop {
            let root = self.root.clone();
            let options = self.options.clone();
            let previous = self.baseline.take();

            let (batch, snapshot) = tokio::task::spawn_blocking(move || {
                scan(&root, previous.as_ref(), &options)
            })
            .await
            .map_err(|e| Error::Task(e.to_string()))??;
            self.baseline = Some(snapshot);

            if !batch.is_empty() && events.send(batch).is_err() {
                tracing::debug!("Event receiver dropped, stopping watcher");
                return Ok(());
            }

            if let Some(n) = remaining.as_mut() {
                *n = n.saturating_sub(1);
                if *n == 0 {
                    return Ok(());
                }
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
