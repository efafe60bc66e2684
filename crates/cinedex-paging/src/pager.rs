//! `Pager` - drives a mediator for one list and exposes the cached rows.

use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, watch};
use tracing::instrument;

use crate::cache::LocalCache;
use crate::error::{CacheError, FetchErrorKind};
use crate::fetcher::NetworkFetcher;
use crate::mediator::{InitializeAction, LoadType, MediatorResult, PagingState, RemoteMediator};

/// Progress of one load direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Idle.
    NotLoading {
        /// No further pages exist in this direction.
        end_of_pagination_reached: bool,
    },
    /// A load is in flight.
    Loading,
    /// The last load failed; the consumer may retry.
    Error {
        /// Fetch classification, `None` for cache failures.
        kind: Option<FetchErrorKind>,
        /// Rendered error.
        message: String,
    },
}

impl Default for LoadState {
    fn default() -> Self {
        Self::NotLoading {
            end_of_pagination_reached: false,
        }
    }
}

/// Load progress of every direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStates {
    /// Refresh progress. An error here means nothing could be shown.
    pub refresh: LoadState,
    /// Prepend progress.
    pub prepend: LoadState,
    /// Append progress. An error here leaves loaded pages in place.
    pub append: LoadState,
}

impl LoadStates {
    const fn get_mut(&mut self, load_type: LoadType) -> &mut LoadState {
        match load_type {
            LoadType::Refresh => &mut self.refresh,
            LoadType::Prepend => &mut self.prepend,
            LoadType::Append => &mut self.append,
        }
    }
}

impl From<&MediatorResult> for LoadState {
    fn from(result: &MediatorResult) -> Self {
        match result {
            MediatorResult::Success {
                end_of_pagination_reached,
            } => Self::NotLoading {
                end_of_pagination_reached: *end_of_pagination_reached,
            },
            MediatorResult::Error(err) => Self::Error {
                kind: err.fetch_kind(),
                message: err.to_string(),
            },
        }
    }
}

/// Puts the previous state back if a load future is dropped mid-flight.
struct RestoreOnDrop<'a> {
    states: &'a watch::Sender<LoadStates>,
    load_type: LoadType,
    previous: Option<LoadState>,
}

impl RestoreOnDrop<'_> {
    fn finish(mut self, state: LoadState) {
        self.previous = None;
        self.states
            .send_modify(|states| *states.get_mut(self.load_type) = state);
    }
}

impl Drop for RestoreOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            tracing::debug!(load_type = ?self.load_type, "load cancelled");
            self.states
                .send_modify(|states| *states.get_mut(self.load_type) = previous);
        }
    }
}

/// Paged view over one scope.
///
/// Loads are serialized: at most one is in flight at a time. The paging
/// state has its own lock so the anchor can move during a load.
#[derive(Debug)]
pub struct Pager<F, C> {
    mediator: RemoteMediator<F, C>,
    gate: Mutex<()>,
    paging: Mutex<PagingState>,
    states: watch::Sender<LoadStates>,
}

impl<F, C> Pager<F, C>
where
    F: NetworkFetcher,
    F::Item: Send,
    C: LocalCache + 'static,
    C::Row: From<F::Item>,
{
    /// Wraps a mediator.
    pub fn new(mediator: RemoteMediator<F, C>) -> Self {
        let (states, _) = watch::channel(LoadStates::default());
        Self {
            mediator,
            gate: Mutex::new(()),
            paging: Mutex::new(PagingState::default()),
            states,
        }
    }

    /// The wrapped mediator.
    pub const fn mediator(&self) -> &RemoteMediator<F, C> {
        &self.mediator
    }

    /// Runs the startup check and refreshes when it asks for it.
    ///
    /// Returns `None` when the cached rows were fresh enough to skip the network.
    #[instrument(skip_all, fields(scope = %self.mediator.scope()))]
    pub async fn start(&self) -> Option<MediatorResult> {
        match self.mediator.initialize().await {
            InitializeAction::LaunchInitialRefresh => Some(self.refresh().await),
            InitializeAction::SkipInitialRefresh => None,
        }
    }

    /// Reloads from the first page.
    pub async fn refresh(&self) -> MediatorResult {
        self.run(LoadType::Refresh).await
    }

    /// Loads the next page.
    pub async fn append(&self) -> MediatorResult {
        self.run(LoadType::Append).await
    }

    /// Loads the previous page. Always ends immediately.
    pub async fn prepend(&self) -> MediatorResult {
        self.run(LoadType::Prepend).await
    }

    /// Records the consumer's position for the next load.
    ///
    /// Does not wait for an in-flight load; that load keeps the state it
    /// started with.
    pub async fn set_anchor(&self, position: usize) {
        self.paging.lock().await.anchor_position = Some(position);
    }

    /// Observes load progress.
    pub fn load_states(&self) -> watch::Receiver<LoadStates> {
        self.states.subscribe()
    }

    /// Current rows of the scope.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache cannot be read.
    pub async fn snapshot(&self) -> Result<Vec<C::Row>, CacheError> {
        self.mediator.cache().load_rows(self.mediator.scope()).await
    }

    /// Rows of the scope now and after every committed change to it.
    ///
    /// The stream holds the cache, so it never ends on its own. Drop it to
    /// stop observing.
    pub fn stream(&self) -> impl Stream<Item = Result<Vec<C::Row>, CacheError>> + Send + 'static {
        let cache = std::sync::Arc::clone(self.mediator.cache());
        let scope = self.mediator.scope().clone();
        let changes = cache.subscribe();

        futures::stream::unfold(
            (cache, scope, changes, true),
            |(cache, scope, mut changes, first)| async move {
                if !first {
                    let key = scope.key();
                    loop {
                        match changes.recv().await {
                            Ok(changed) if changed == key => break,
                            Ok(_) => {}
                            Err(RecvError::Lagged(skipped)) => {
                                tracing::debug!(skipped, "change feed lagged, re-reading");
                                break;
                            }
                            Err(RecvError::Closed) => return None,
                        }
                    }
                }
                let rows = cache.load_rows(&scope).await;
                Some((rows, (cache, scope, changes, false)))
            },
        )
    }

    async fn run(&self, load_type: LoadType) -> MediatorResult {
        let _serialized = self.gate.lock().await;
        let state = *self.paging.lock().await;

        let previous = {
            let mut previous = LoadState::Loading;
            self.states.send_modify(|states| {
                std::mem::swap(states.get_mut(load_type), &mut previous);
            });
            previous
        };
        let guard = RestoreOnDrop {
            states: &self.states,
            load_type,
            previous: Some(previous),
        };

        let result = self.mediator.load(load_type, &state).await;
        guard.finish(LoadState::from(&result));
        result
    }
}
