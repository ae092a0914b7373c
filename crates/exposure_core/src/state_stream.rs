use shared::domain::ExposureState;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Destination for recomputed exposure states.
pub trait ExposureStateSink: Send + Sync {
    fn update(&self, state: ExposureState);
}

/// Last-write-wins exposure state shared with any number of subscribers.
///
/// Holds a single slot. Subscribers that fall behind only see the newest
/// state, never a backlog.
#[derive(Debug)]
pub struct ExposureStateStream {
    tx: watch::Sender<Option<ExposureState>>,
}

impl ExposureStateStream {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<ExposureState> {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ExposureState>> {
        self.tx.subscribe()
    }

    /// Stream of published states, starting with the current one if any.
    pub fn updates(&self) -> impl futures::Stream<Item = ExposureState> {
        use futures::StreamExt;

        WatchStream::new(self.tx.subscribe()).filter_map(|state| async move { state })
    }
}

impl Default for ExposureStateStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ExposureStateSink for ExposureStateStream {
    fn update(&self, state: ExposureState) {
        // send_replace marks the value changed even when it is equal to the old one.
        self.tx.send_replace(Some(state));
    }
}
