//! 進捗通知とキャンセル

use mimizuku_core::model::{ClassExpression, Individual};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Listener notified while a taxonomy is built.
///
/// Every method has a no-op default. `is_canceled` is polled before each
/// concept and each individual; returning `true` aborts the build.
pub trait ProgressMonitor {
    fn classification_started(&mut self, _classes: usize) {}

    fn realization_started(&mut self, _individuals: usize) {}

    fn start_class(&mut self, _class: &ClassExpression) {}

    fn start_individual(&mut self, _individual: &Individual) {}

    fn is_canceled(&self) -> bool {
        false
    }

    fn task_finished(&mut self) {}
}

impl<P: ProgressMonitor + ?Sized> ProgressMonitor for &mut P {
    fn classification_started(&mut self, classes: usize) {
        (**self).classification_started(classes)
    }

    fn realization_started(&mut self, individuals: usize) {
        (**self).realization_started(individuals)
    }

    fn start_class(&mut self, class: &ClassExpression) {
        (**self).start_class(class)
    }

    fn start_individual(&mut self, individual: &Individual) {
        (**self).start_individual(individual)
    }

    fn is_canceled(&self) -> bool {
        (**self).is_canceled()
    }

    fn task_finished(&mut self) {
        (**self).task_finished()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressMonitor for NoopProgress {}

/// Reports progress through `tracing`, one event every `interval` items
#[derive(Debug, Clone)]
pub struct LoggingProgress {
    task: &'static str,
    total: usize,
    done: usize,
    interval: usize,
}

impl LoggingProgress {
    pub fn new(interval: usize) -> Self {
        Self {
            task: "idle",
            total: 0,
            done: 0,
            interval: interval.max(1),
        }
    }

    pub fn done(&self) -> usize {
        self.done
    }

    fn start(&mut self, task: &'static str, total: usize) {
        self.task = task;
        self.total = total;
        self.done = 0;
        info!("{} started: {} items", task, total);
    }

    fn step(&mut self, item: &dyn std::fmt::Display) {
        self.done += 1;
        if self.done % self.interval == 0 || self.done == self.total {
            info!("{} {}/{}: {}", self.task, self.done, self.total, item);
        }
    }
}

impl Default for LoggingProgress {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ProgressMonitor for LoggingProgress {
    fn classification_started(&mut self, classes: usize) {
        self.start("classification", classes);
    }

    fn realization_started(&mut self, individuals: usize) {
        self.start("realization", individuals);
    }

    fn start_class(&mut self, class: &ClassExpression) {
        self.step(class);
    }

    fn start_individual(&mut self, individual: &Individual) {
        self.step(individual);
    }

    fn task_finished(&mut self) {
        info!("{} finished: {}/{} items", self.task, self.done, self.total);
    }
}

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Wraps a monitor so that a [`CancelHandle`] can abort the build
#[derive(Debug, Clone)]
pub struct CancellableProgress<P> {
    inner: P,
    handle: CancelHandle,
}

impl<P: ProgressMonitor> CancellableProgress<P> {
    pub fn new(inner: P, handle: CancelHandle) -> Self {
        Self { inner, handle }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: ProgressMonitor> ProgressMonitor for CancellableProgress<P> {
    fn classification_started(&mut self, classes: usize) {
        self.inner.classification_started(classes)
    }

    fn realization_started(&mut self, individuals: usize) {
        self.inner.realization_started(individuals)
    }

    fn start_class(&mut self, class: &ClassExpression) {
        self.inner.start_class(class)
    }

    fn start_individual(&mut self, individual: &Individual) {
        self.inner.start_individual(individual)
    }

    fn is_canceled(&self) -> bool {
        self.handle.is_canceled() || self.inner.is_canceled()
    }

    fn task_finished(&mut self) {
        self.inner.task_finished()
    }
}
