use super::{AssetStore, FetchCallback, FetchError, FetchResult, TileSource};

use crossbeam_channel::{SendError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

struct FetchJob {
    locator: String,
    on_complete: FetchCallback,
}

/// Runs a blocking [`TileSource`] on a pool of worker threads.
///
/// Jobs are started in submission order, but with more than one worker they may finish in any order. Dropping the store
/// lets the workers finish their queued jobs and then joins them.
pub struct ThreadedAssetStore<S> {
    source: Arc<S>,
    jobs: Option<Sender<FetchJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl<S: TileSource> ThreadedAssetStore<S> {
    pub fn new(source: S, num_workers: usize) -> std::io::Result<Self> {
        let source = Arc::new(source);
        let (jobs_tx, jobs_rx) = crossbeam_channel::unbounded::<FetchJob>();

        let mut workers = Vec::with_capacity(num_workers.max(1));
        for i in 0..num_workers.max(1) {
            let source = source.clone();
            let jobs_rx = jobs_rx.clone();
            let worker = thread::Builder::new()
                .name(format!("clipterra-fetch-{}", i))
                .spawn(move || {
                    for FetchJob {
                        locator,
                        on_complete,
                    } in jobs_rx.iter()
                    {
                        on_complete(source.read(&locator));
                    }
                })?;
            workers.push(worker);
        }

        Ok(Self {
            source,
            jobs: Some(jobs_tx),
            workers,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }
}

impl<S: TileSource> AssetStore for ThreadedAssetStore<S> {
    fn fetch_blocking(&self, locator: &str) -> FetchResult {
        self.source.read(locator)
    }

    fn fetch_async(&self, locator: String, on_complete: FetchCallback) {
        let job = FetchJob {
            locator,
            on_complete,
        };
        let result = match self.jobs.as_ref() {
            Some(jobs) => jobs.send(job),
            None => Err(SendError(job)),
        };
        if let Err(SendError(job)) = result {
            (job.on_complete)(Err(FetchError::Disconnected));
        }
    }
}

impl<S> Drop for ThreadedAssetStore<S> {
    fn drop(&mut self) {
        // Closing the channel ends each worker's loop.
        self.jobs.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::warn!("Tile fetch worker panicked");
            }
        }
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
    use crate::{TexelFormat, TileImage};

    use std::time::Duration;

    struct EchoSource;

    impl TileSource for EchoSource {
        fn read(&self, locator: &str) -> FetchResult {
            if locator.starts_with("missing") {
                return Err(FetchError::NotFound(locator.to_owned()));
            }
            Ok(TileImage::filled(
                2,
                2,
                TexelFormat::R8Unorm,
                locator.len() as u8,
            ))
        }
    }

    #[test]
    fn completions_arrive_from_workers() {
        let store = ThreadedAssetStore::new(EchoSource, 3).unwrap();
        assert_eq!(store.num_workers(), 3);

        let (tx, rx) = crossbeam_channel::unbounded();
        for locator in ["a", "bb", "ccc", "missing"] {
            let tx = tx.clone();
            store.fetch_async(
                locator.to_owned(),
                Box::new(move |result| {
                    tx.send((locator, result)).unwrap();
                }),
            );
        }

        let mut results: Vec<_> = (0..4)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        results.sort_by_key(|(locator, _)| *locator);

        assert_eq!(results[0].1.as_ref().unwrap().texels[0], 1);
        assert_eq!(results[1].1.as_ref().unwrap().texels[0], 2);
        assert_eq!(results[2].1.as_ref().unwrap().texels[0], 3);
        assert_eq!(
            results[3].1,
            Err(FetchError::NotFound("missing".to_owned()))
        );
    }

    #[test]
    fn blocking_fetch_bypasses_workers() {
        let store = ThreadedAssetStore::new(EchoSource, 1).unwrap();
        let tile = store.fetch_blocking("abcd").unwrap();
        assert_eq!(tile.texels, vec![4; 4]);
    }

    #[test]
    fn drop_drains_queued_jobs() {
        let (tx, rx) = crossbeam_channel::unbounded();
        {
            let store = ThreadedAssetStore::new(EchoSource, 1).unwrap();
            for _ in 0..16 {
                let tx = tx.clone();
                store.fetch_async(
                    "x".to_owned(),
                    Box::new(move |result| {
                        tx.send(result.is_ok()).unwrap();
                    }),
                );
            }
        }
        assert_eq!(rx.try_iter().filter(|ok| *ok).count(), 16);
    }
}
