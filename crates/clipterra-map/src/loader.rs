use crate::core::glam::UVec2;
use crate::core::units::TileUnits;
use crate::core::SmallKeyHashMap;
use crate::{AssetStore, ClipmapLayout, FetchError, FetchResult, LoaderConfig, TileAddress};

use crossbeam_channel::{Receiver, Sender};

/// A tile fetch destined for one slot of a clip level.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TileRequest {
    pub address: TileAddress,
    /// Destination slot in the level's toroidal window.
    pub slot: TileUnits<UVec2>,
    /// The slot generation this request was issued under.
    pub generation: u32,
    /// Zero for the first fetch, incremented by each retry.
    pub attempt: u32,
}

impl TileRequest {
    pub fn retry(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..*self
        }
    }
}

#[derive(Debug)]
pub struct Completion {
    pub request: TileRequest,
    pub result: FetchResult,
}

type RequestId = u64;

struct InFlight {
    request: TileRequest,
    issued_frame: u64,
}

struct ScheduledRetry {
    request: TileRequest,
    due_frame: u64,
}

/// Issues asynchronous tile fetches and collects their results on the frame thread.
///
/// The asset store's callbacks only push onto a channel. Everything else (timeouts, retries, bookkeeping) happens in
/// [`drain`](Self::drain) and [`take_due_retries`](Self::take_due_retries), which are called once per frame.
pub struct TileLoader<S> {
    store: S,
    texture_root: String,
    layout: ClipmapLayout,
    config: LoaderConfig,

    completions_tx: Sender<(RequestId, FetchResult)>,
    completions_rx: Receiver<(RequestId, FetchResult)>,

    in_flight: SmallKeyHashMap<RequestId, InFlight>,
    retries: Vec<ScheduledRetry>,
    next_id: RequestId,
    frame: u64,
    late_completions: u64,
}

impl<S: AssetStore> TileLoader<S> {
    pub fn new(store: S, texture_root: String, layout: ClipmapLayout, config: LoaderConfig) -> Self {
        let (completions_tx, completions_rx) = crossbeam_channel::unbounded();
        Self {
            store,
            texture_root,
            layout,
            config,
            completions_tx,
            completions_rx,
            in_flight: Default::default(),
            retries: Vec::new(),
            next_id: 0,
            frame: 0,
            late_completions: 0,
        }
    }

    /// Fire and forget. The result shows up in a later [`drain`](Self::drain).
    pub fn load_async(&mut self, request: TileRequest) {
        let id = self.next_id;
        self.next_id += 1;

        let locator = request
            .address
            .locator(&self.texture_root, self.layout.grid_size(request.address.level));
        self.in_flight.insert(
            id,
            InFlight {
                request,
                issued_frame: self.frame,
            },
        );

        let tx = self.completions_tx.clone();
        self.store.fetch_async(
            locator,
            Box::new(move |result| {
                // The receiver only disappears with the loader, at which point nobody wants the tile.
                let _ = tx.send((id, result));
            }),
        );
    }

    /// Advances the loader's frame clock, which drives timeouts and retry backoff.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    /// Collects every completion that arrived since the last drain, followed by a [`FetchError::TimedOut`] completion for
    /// each request that has been outstanding for too long. Completions of timed-out requests that arrive later are
    /// discarded.
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        for (id, result) in self.completions_rx.try_iter() {
            if let Some(InFlight { request, .. }) = self.in_flight.remove(&id) {
                completions.push(Completion { request, result });
            } else {
                self.late_completions += 1;
                log::debug!("Ignoring completion of abandoned request {}", id);
            }
        }

        let timeout = self.config.request_timeout_frames;
        if timeout > 0 {
            let frame = self.frame;
            let mut expired: Vec<RequestId> = self
                .in_flight
                .iter()
                .filter(|(_, f)| frame - f.issued_frame >= u64::from(timeout))
                .map(|(id, _)| *id)
                .collect();
            expired.sort_unstable();
            for id in expired {
                if let Some(InFlight { request, .. }) = self.in_flight.remove(&id) {
                    completions.push(Completion {
                        request,
                        result: Err(FetchError::TimedOut { frames: timeout }),
                    });
                }
            }
        }

        completions
    }

    /// Schedules `request` to be fetched again after an exponential backoff. Returns `false` if it has used up all of its
    /// retries.
    pub fn schedule_retry(&mut self, request: TileRequest) -> bool {
        if request.attempt >= self.config.max_retries {
            return false;
        }
        let delay = 1u32
            .checked_shl(request.attempt)
            .map_or(u32::MAX, |factor| self.config.retry_backoff_frames.saturating_mul(factor));
        self.retries.push(ScheduledRetry {
            request: request.retry(),
            due_frame: self.frame + u64::from(delay),
        });
        true
    }

    /// Removes and returns the retries whose backoff has elapsed.
    pub fn take_due_retries(&mut self) -> Vec<TileRequest> {
        let frame = self.frame;
        let mut due = Vec::new();
        self.retries.retain(|r| {
            if r.due_frame <= frame {
                due.push(r.request);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn pending_retry_len(&self) -> usize {
        self.retries.len()
    }

    /// Completions that arrived after their request had already timed out.
    pub fn late_completions(&self) -> u64 {
        self.late_completions
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;
    use crate::{FetchCallback, TexelFormat, TileImage};

    use std::cell::RefCell;
    use std::rc::Rc;

    /// Holds callbacks until the test decides to complete them.
    #[derive(Clone, Default)]
    struct HeldStore(Rc<RefCell<Vec<(String, FetchCallback)>>>);

    impl HeldStore {
        fn complete_all(&self, make_result: impl Fn(&str) -> FetchResult) {
            for (locator, callback) in self.0.borrow_mut().drain(..) {
                callback(make_result(&locator));
            }
        }
    }

    impl AssetStore for HeldStore {
        fn fetch_blocking(&self, locator: &str) -> FetchResult {
            Err(FetchError::NotFound(locator.to_owned()))
        }

        fn fetch_async(&self, locator: String, on_complete: FetchCallback) {
            self.0.borrow_mut().push((locator, on_complete));
        }
    }

    fn loader(config: LoaderConfig) -> (HeldStore, TileLoader<HeldStore>) {
        let store = HeldStore::default();
        let layout = ClipmapLayout::new(1024, 256, 128).unwrap();
        let loader = TileLoader::new(store.clone(), "root".into(), layout, config);
        (store, loader)
    }

    fn request(level: u32, x: u32, y: u32) -> TileRequest {
        TileRequest {
            address: TileAddress::new(level, x, y),
            slot: TileUnits(UVec2::new(x % 2, y % 2)),
            generation: 1,
            attempt: 0,
        }
    }

    fn tile(_locator: &str) -> FetchResult {
        Ok(TileImage::filled(128, 128, TexelFormat::R8Unorm, 0))
    }

    #[test]
    fn completions_are_matched_to_requests() {
        let (store, mut loader) = loader(LoaderConfig::default());
        loader.load_async(request(0, 3, 4));
        loader.load_async(request(1, 1, 2));
        assert_eq!(loader.in_flight_len(), 2);

        let locators: Vec<String> = store.0.borrow().iter().map(|(l, _)| l.clone()).collect();
        assert_eq!(
            locators,
            vec!["root/Mip_0/tile_0_3_3.png", "root/Mip_1/tile_1_1_1.png"]
        );

        assert!(loader.drain().is_empty());
        store.complete_all(tile);
        let completions = loader.drain();
        assert_eq!(completions.len(), 2);
        assert!(completions.iter().all(|c| c.result.is_ok()));
        assert_eq!(loader.in_flight_len(), 0);
    }

    #[test]
    fn retries_back_off_exponentially_and_run_out() {
        let config = LoaderConfig {
            max_retries: 2,
            retry_backoff_frames: 3,
            request_timeout_frames: 0,
        };
        let (_store, mut loader) = loader(config);

        let first = request(0, 0, 0);
        assert!(loader.schedule_retry(first));
        for _ in 0..2 {
            loader.begin_frame();
            assert!(loader.take_due_retries().is_empty());
        }
        loader.begin_frame();
        let due = loader.take_due_retries();
        assert_eq!(due, vec![first.retry()]);

        // Second retry waits twice as long.
        assert!(loader.schedule_retry(due[0]));
        for _ in 0..5 {
            loader.begin_frame();
            assert!(loader.take_due_retries().is_empty());
        }
        loader.begin_frame();
        let due = loader.take_due_retries();
        assert_eq!(due[0].attempt, 2);

        assert!(!loader.schedule_retry(due[0]));
        assert_eq!(loader.pending_retry_len(), 0);
    }

    #[test]
    fn timed_out_requests_ignore_late_completions() {
        let config = LoaderConfig {
            max_retries: 0,
            retry_backoff_frames: 1,
            request_timeout_frames: 2,
        };
        let (store, mut loader) = loader(config);
        loader.load_async(request(0, 1, 1));

        loader.begin_frame();
        assert!(loader.drain().is_empty());
        loader.begin_frame();
        let completions = loader.drain();
        assert_eq!(completions.len(), 1);
        assert_eq!(
            completions[0].result,
            Err(FetchError::TimedOut { frames: 2 })
        );

        store.complete_all(tile);
        assert!(loader.drain().is_empty());
        assert_eq!(loader.late_completions(), 1);
    }

    #[test]
    fn timed_out_request_can_be_retried() {
        let config = LoaderConfig {
            max_retries: 2,
            retry_backoff_frames: 1,
            request_timeout_frames: 1,
        };
        let (store, mut loader) = loader(config);
        loader.load_async(request(0, 2, 5));

        loader.begin_frame();
        let timed_out = loader.drain();
        assert_eq!(timed_out[0].result, Err(FetchError::TimedOut { frames: 1 }));
        assert!(loader.schedule_retry(timed_out[0].request));

        loader.begin_frame();
        let due = loader.take_due_retries();
        assert_eq!(due.len(), 1);
        loader.load_async(due[0]);

        let locators: Vec<String> = store.0.borrow().iter().map(|(l, _)| l.clone()).collect();
        assert_eq!(locators[0], locators[1]);

        store.complete_all(tile);
        let completions = loader.drain();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].request.attempt, 1);
        assert!(completions[0].result.is_ok());
        assert_eq!(loader.late_completions(), 1);
    }

    #[test]
    fn synchronous_callbacks_are_queued() {
        struct ImmediateStore;

        impl AssetStore for ImmediateStore {
            fn fetch_blocking(&self, locator: &str) -> FetchResult {
                tile(locator)
            }

            fn fetch_async(&self, locator: String, on_complete: FetchCallback) {
                on_complete(tile(&locator));
            }
        }

        let layout = ClipmapLayout::new(1024, 256, 128).unwrap();
        let mut loader = TileLoader::new(ImmediateStore, String::new(), layout, LoaderConfig::default());
        loader.load_async(request(0, 0, 0));
        assert_eq!(loader.drain().len(), 1);
    }
}
