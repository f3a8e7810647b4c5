//! Runs the fetcher over a list of domains.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::fetcher::Fetch;
use crate::observer::{FetchObserver, LogObserver};
use crate::outcome::CertificateOutcome;

/// Drives a [`Fetch`] implementation over an ordered list of domains.
///
/// With `concurrency` of 1 (the default) domains are handled strictly one
/// after another. Larger values spread the work over that many scoped
/// threads; the result is put back in input order before it is returned.
pub struct BatchRunner<F: Fetch> {
    fetcher: F,
    concurrency: usize,
    observer: Arc<dyn FetchObserver>,
}

impl<F: Fetch> BatchRunner<F> {
    pub fn new(fetcher: F) -> Self {
        BatchRunner {
            fetcher,
            concurrency: 1,
            observer: Arc::new(LogObserver),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns one outcome per domain, `outcomes[i].domain() == domains[i]`.
    pub fn run<S: AsRef<str> + Sync>(&self, domains: &[S]) -> Vec<CertificateOutcome> {
        if domains.is_empty() {
            return Vec::new();
        }

        let outcomes = if self.concurrency == 1 || domains.len() == 1 {
            domains
                .iter()
                .map(|domain| self.fetcher.fetch(domain.as_ref()))
                .collect()
        } else {
            self.run_pooled(domains)
        };

        self.observer.on_batch_complete(&outcomes);
        outcomes
    }

    fn run_pooled<S: AsRef<str> + Sync>(&self, domains: &[S]) -> Vec<CertificateOutcome> {
        let workers = self.concurrency.min(domains.len());
        let next = AtomicUsize::new(0);
        let (sender, receiver) = mpsc::channel::<(usize, CertificateOutcome)>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let sender = sender.clone();
                let next = &next;
                scope.spawn(move || loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(domain) = domains.get(index) else {
                        break;
                    };
                    let outcome = self.fetcher.fetch(domain.as_ref());
                    if sender.send((index, outcome)).is_err() {
                        break;
                    }
                });
            }
        });
        // Every worker has joined; dropping the last sender ends the receiver.
        drop(sender);

        let mut slots: Vec<Option<CertificateOutcome>> = vec![None; domains.len()];
        for (index, outcome) in receiver {
            slots[index] = Some(outcome);
        }
        slots.into_iter().flatten().collect()
    }
}
