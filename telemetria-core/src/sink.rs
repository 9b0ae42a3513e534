// Telemetria
// Copyright (c) 2026 The Project Telemetria Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `sink` module defines the output sink trait and the bounded output queue.
//!
//! The decode pipeline never blocks: records cross into the output domain through
//! [`OutputHub`], which either prints synchronously (direct mode, for tests and file runs) or
//! hands records to a bounded queue drained by one output thread (queued mode, for sinks that
//! may block on network IO). When the queue is full the oldest queued record is dropped and a
//! drop counter incremented; back-pressure never reaches the decoder.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use bitflags::bitflags;
use log::{debug, warn};

use crate::record::{DataRecord, DataValue, FormatHint};

bitflags! {
    /// The event kinds a sink registers for.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct EventKind: u32 {
        /// Decoded data records.
        const DATA = 1 << 0;
        /// Raw pulse dumps.
        const PULSE = 1 << 1;
        /// Log events.
        const LOG = 1 << 2;
    }
}

/// An output sink. Serialisation is visitor-style: `print_record` drives the traversal in
/// field insertion order, delegating to the value-level methods. Resources are released on
/// drop.
pub trait RecordSink: Send {
    /// The event kinds this sink wants. Defaults to decoded data only.
    fn kinds(&self) -> EventKind {
        EventKind::DATA
    }

    fn print_record(&mut self, record: &DataRecord);

    fn print_array(&mut self, values: &[DataValue]);

    fn print_string(&mut self, value: &str);

    fn print_double(&mut self, value: f64, hint: Option<FormatHint>);

    fn print_int(&mut self, value: i64, hint: Option<FormatHint>);

    /// Flushes buffered output. Called at shutdown and after file runs.
    fn flush(&mut self) {}
}

/// An in-memory sink collecting records into a shared vector. Used by tests and dry runs.
pub struct CollectSink {
    records: Arc<Mutex<Vec<DataRecord>>>,
}

impl CollectSink {
    pub fn new(records: Arc<Mutex<Vec<DataRecord>>>) -> CollectSink {
        CollectSink { records }
    }
}

impl RecordSink for CollectSink {
    fn print_record(&mut self, record: &DataRecord) {
        self.records.lock().unwrap().push(record.clone());
    }

    fn print_array(&mut self, _values: &[DataValue]) {}

    fn print_string(&mut self, _value: &str) {}

    fn print_double(&mut self, _value: f64, _hint: Option<FormatHint>) {}

    fn print_int(&mut self, _value: i64, _hint: Option<FormatHint>) {}
}

struct QueueInner {
    queue: Mutex<VecDeque<DataRecord>>,
    available: Condvar,
    shutdown: AtomicBool,
    dropped: AtomicU64,
    capacity: usize,
}

/// The bounded output queue and its worker thread.
struct OutputQueue {
    inner: Arc<QueueInner>,
    worker: Option<JoinHandle<()>>,
}

impl OutputQueue {
    fn spawn(mut sinks: Vec<Box<dyn RecordSink>>, capacity: usize) -> OutputQueue {
        let inner = Arc::new(QueueInner {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            shutdown: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            capacity: capacity.max(1),
        });

        let worker_inner = inner.clone();
        let worker = std::thread::Builder::new()
            .name("telemetria-output".to_string())
            .spawn(move || {
                loop {
                    let record = {
                        let mut queue = worker_inner.queue.lock().unwrap();
                        loop {
                            if let Some(record) = queue.pop_front() {
                                break Some(record);
                            }
                            if worker_inner.shutdown.load(Ordering::Acquire) {
                                break None;
                            }
                            queue = worker_inner.available.wait(queue).unwrap();
                        }
                    };

                    match record {
                        Some(record) => {
                            for sink in sinks.iter_mut() {
                                if sink.kinds().contains(EventKind::DATA) {
                                    sink.print_record(&record);
                                }
                            }
                        }
                        None => {
                            for sink in sinks.iter_mut() {
                                sink.flush();
                            }
                            return;
                        }
                    }
                }
            })
            .expect("failed to spawn output thread");

        OutputQueue { inner, worker: Some(worker) }
    }

    fn send(&self, record: DataRecord) {
        let mut queue = self.inner.queue.lock().unwrap();
        if queue.len() >= self.inner.capacity {
            queue.pop_front();
            let dropped = self.inner.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped.is_power_of_two() {
                warn!("output queue full, dropped {} records so far", dropped);
            }
        }
        queue.push_back(record);
        drop(queue);
        self.inner.available.notify_one();
    }

    fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    fn shutdown(&mut self) {
        self.inner.shutdown.store(true, Ordering::Release);
        self.inner.available.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            debug!("output thread joined");
        }
    }
}

impl Drop for OutputQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

enum HubInner {
    Direct(Mutex<Vec<Box<dyn RecordSink>>>),
    Queued(OutputQueue),
}

/// The output hub owned by a receiver context. Decoded records enter here; sinks print them.
pub struct OutputHub {
    inner: HubInner,
}

impl OutputHub {
    /// A hub printing synchronously on the calling thread.
    pub fn direct(sinks: Vec<Box<dyn RecordSink>>) -> OutputHub {
        OutputHub { inner: HubInner::Direct(Mutex::new(sinks)) }
    }

    /// A hub with a bounded queue drained by a dedicated output thread. The oldest queued
    /// record is dropped when the queue is full.
    pub fn queued(sinks: Vec<Box<dyn RecordSink>>, capacity: usize) -> OutputHub {
        OutputHub { inner: HubInner::Queued(OutputQueue::spawn(sinks, capacity)) }
    }

    /// Forwards one record. Never blocks on sink IO in queued mode.
    pub fn send(&self, record: DataRecord) {
        match &self.inner {
            HubInner::Direct(sinks) => {
                let mut sinks = sinks.lock().unwrap();
                for sink in sinks.iter_mut() {
                    if sink.kinds().contains(EventKind::DATA) {
                        sink.print_record(&record);
                    }
                }
            }
            HubInner::Queued(queue) => queue.send(record),
        }
    }

    /// The number of records dropped to back-pressure so far.
    pub fn dropped(&self) -> u64 {
        match &self.inner {
            HubInner::Direct(_) => 0,
            HubInner::Queued(queue) => queue.dropped(),
        }
    }

    /// Flushes all sinks; in queued mode drains the queue and joins the output thread.
    pub fn shutdown(&mut self) {
        match &mut self.inner {
            HubInner::Direct(sinks) => {
                for sink in sinks.lock().unwrap().iter_mut() {
                    sink.flush();
                }
            }
            HubInner::Queued(queue) => queue.shutdown(),
        }
    }
}
