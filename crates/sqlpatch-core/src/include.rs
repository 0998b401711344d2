//! Breadth-first association loading.
//!
//! [`include`] walks relationships one depth level at a time. Each pass
//! hands every pending batch of records to the loader; whatever the loader
//! discovers becomes the next pass's input. The walk stops when a pass
//! discovers nothing or the depth limit is reached, which bounds cyclic
//! relationship graphs.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::cache::ScopeCache;
use crate::cancel::Cancel;
use crate::error::Result;
use crate::schema::Entity;

/// A boxed future for async loader operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default depth limit of an include traversal.
pub const DEFAULT_MAX_INCLUDE_DEPTH: i32 = 10;

/// Batches of records discovered during one pass.
#[derive(Default)]
pub struct IncludeBuffer {
    batches: Vec<Vec<Arc<dyn Entity>>>,
}

impl IncludeBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a batch of records for the next pass. Empty batches are
    /// ignored.
    pub fn add_records(&mut self, records: Vec<Arc<dyn Entity>>) {
        if !records.is_empty() {
            self.batches.push(records);
        }
    }

    /// Returns the number of queued batches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Returns true when nothing was queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Returns the total number of queued records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    /// Returns the queued batches.
    #[must_use]
    pub fn into_batches(self) -> Vec<Vec<Arc<dyn Entity>>> {
        self.batches
    }
}

impl fmt::Debug for IncludeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncludeBuffer")
            .field("batches", &self.len())
            .field("records", &self.record_count())
            .finish()
    }
}

/// Loads the associations of a batch of records.
///
/// A loader inspects `records`, fetches related rows, stores them in the
/// cache, wires them into the records' relation fields and queues them in
/// `later` so that their own associations are loaded on the next pass.
///
/// # Example
///
/// ```rust
/// use sqlpatch_core::include::{BoxFuture, IncludeBuffer, IncludeLoader};
/// use sqlpatch_core::schema::Entity;
/// use sqlpatch_core::{Result, ScopeCache};
/// use std::sync::Arc;
///
/// struct Noop;
///
/// impl IncludeLoader for Noop {
///     fn load<'a>(
///         &'a self,
///         _later: &'a mut IncludeBuffer,
///         _sc: &'a ScopeCache,
///         _records: &'a [Arc<dyn Entity>],
///     ) -> BoxFuture<'a, Result<()>> {
///         Box::pin(async move { Ok(()) })
///     }
/// }
/// ```
pub trait IncludeLoader: Send + Sync {
    /// Loads associations of `records`, queueing discoveries in `later`.
    fn load<'a>(
        &'a self,
        later: &'a mut IncludeBuffer,
        sc: &'a ScopeCache,
        records: &'a [Arc<dyn Entity>],
    ) -> BoxFuture<'a, Result<()>>;
}

impl<L: IncludeLoader + ?Sized> IncludeLoader for Box<L> {
    fn load<'a>(
        &'a self,
        later: &'a mut IncludeBuffer,
        sc: &'a ScopeCache,
        records: &'a [Arc<dyn Entity>],
    ) -> BoxFuture<'a, Result<()>> {
        (**self).load(later, sc, records)
    }
}

impl<L: IncludeLoader + ?Sized> IncludeLoader for Arc<L> {
    fn load<'a>(
        &'a self,
        later: &'a mut IncludeBuffer,
        sc: &'a ScopeCache,
        records: &'a [Arc<dyn Entity>],
    ) -> BoxFuture<'a, Result<()>> {
        (**self).load(later, sc, records)
    }
}

/// Adapts a closure into an [`IncludeLoader`].
pub struct IncludeLoaderFn<F>(F);

impl<F> IncludeLoaderFn<F>
where
    F: for<'a> Fn(
            &'a mut IncludeBuffer,
            &'a ScopeCache,
            &'a [Arc<dyn Entity>],
        ) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync,
{
    /// Wraps `f`.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> IncludeLoader for IncludeLoaderFn<F>
where
    F: for<'a> Fn(
            &'a mut IncludeBuffer,
            &'a ScopeCache,
            &'a [Arc<dyn Entity>],
        ) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync,
{
    fn load<'a>(
        &'a self,
        later: &'a mut IncludeBuffer,
        sc: &'a ScopeCache,
        records: &'a [Arc<dyn Entity>],
    ) -> BoxFuture<'a, Result<()>> {
        (self.0)(later, sc, records)
    }
}

impl<F> fmt::Debug for IncludeLoaderFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IncludeLoaderFn")
    }
}

/// Runs several loaders in order, stopping at the first error.
#[derive(Default)]
pub struct IncludeLoaderList {
    loaders: Vec<Box<dyn IncludeLoader>>,
}

impl IncludeLoaderList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a loader.
    pub fn push(&mut self, loader: impl IncludeLoader + 'static) {
        self.loaders.push(Box::new(loader));
    }

    /// Appends a loader, builder style.
    #[must_use]
    pub fn with(mut self, loader: impl IncludeLoader + 'static) -> Self {
        self.push(loader);
        self
    }

    /// Returns the number of loaders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Returns true when the list holds no loader.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl IncludeLoader for IncludeLoaderList {
    fn load<'a>(
        &'a self,
        later: &'a mut IncludeBuffer,
        sc: &'a ScopeCache,
        records: &'a [Arc<dyn Entity>],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for loader in &self.loaders {
                loader.load(later, sc, records).await?;
            }
            Ok(())
        })
    }
}

impl fmt::Debug for IncludeLoaderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncludeLoaderList")
            .field("loaders", &self.len())
            .finish()
    }
}

/// Loads the associations of `records`, breadth first.
///
/// Every pass calls `loader` once per pending batch. The walk stops when a
/// pass queues nothing or after `max_depth` passes; `0` performs no pass
/// and a negative depth never stops on depth. `cancel` is checked before
/// each loader call.
///
/// Returns the number of passes performed.
///
/// # Errors
///
/// Returns the first loader error unchanged, or [`Error::Cancelled`]. The
/// cache keeps whatever was stored before the failure.
///
/// [`Error::Cancelled`]: crate::Error::Cancelled
pub async fn include(
    records: Vec<Arc<dyn Entity>>,
    sc: &ScopeCache,
    loader: &dyn IncludeLoader,
    max_depth: i32,
    cancel: Option<&Cancel>,
) -> Result<usize> {
    let limit = usize::try_from(max_depth).ok();
    let mut pending = if records.is_empty() {
        vec![]
    } else {
        vec![records]
    };
    let mut depth = 0;

    while !pending.is_empty() && limit.is_none_or(|limit| depth < limit) {
        let mut next = IncludeBuffer::new();
        for records in &pending {
            if let Some(cancel) = cancel {
                cancel.check()?;
            }
            loader.load(&mut next, sc, records).await?;
        }
        depth += 1;
        trace!(
            depth,
            batches = next.len(),
            records = next.record_count(),
            "include pass finished"
        );
        pending = next.into_batches();
    }

    if pending.is_empty() {
        debug!(passes = depth, "include finished");
    } else {
        debug!(passes = depth, max_depth, "include stopped at depth limit");
    }
    Ok(depth)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::builder::SqlValue;
    use crate::schema::{EntityDescriptor, MetaSchema};

    struct Item;

    impl Entity for Item {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::of::<Self>("item")
        }

        fn column_value(&self, _column: &str) -> Option<SqlValue> {
            None
        }
    }

    fn cache() -> ScopeCache {
        ScopeCache::new(Arc::new(MetaSchema::new()))
    }

    fn root() -> Vec<Arc<dyn Entity>> {
        vec![Arc::new(Item)]
    }

    /// Queues one new record per record seen, forever.
    struct Endless {
        calls: AtomicUsize,
    }

    impl IncludeLoader for Endless {
        fn load<'a>(
            &'a self,
            later: &'a mut IncludeBuffer,
            _sc: &'a ScopeCache,
            records: &'a [Arc<dyn Entity>],
        ) -> BoxFuture<'a, Result<()>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                later.add_records(records.to_vec());
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let loader = Endless {
            calls: AtomicUsize::new(0),
        };
        let passes = include(root(), &cache(), &loader, 3, None).await.unwrap();
        assert_eq!(passes, 3);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_depth_never_traverses() {
        let loader = Endless {
            calls: AtomicUsize::new(0),
        };
        let passes = include(root(), &cache(), &loader, 0, None).await.unwrap();
        assert_eq!(passes, 0);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stops_when_nothing_is_discovered() {
        let loader = IncludeLoaderFn::new(|later, _sc, _records| {
            Box::pin(async move {
                later.add_records(vec![]);
                Ok(())
            })
        });
        let passes = include(root(), &cache(), &loader, -1, None).await.unwrap();
        assert_eq!(passes, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_pass() {
        let cancel = Cancel::new();
        cancel.cancel();
        let loader = Endless {
            calls: AtomicUsize::new(0),
        };

        let err = include(root(), &cache(), &loader, 10, Some(&cancel))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Cancelled));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_buffer_ignores_empty_batches() {
        let mut buffer = IncludeBuffer::new();
        buffer.add_records(vec![]);
        assert!(buffer.is_empty());

        buffer.add_records(root());
        buffer.add_records(root());
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.record_count(), 2);
    }
}
