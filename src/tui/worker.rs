//! Background worker for blocking network calls.
//!
//! Each request runs on its own thread and reports back over a channel that
//! the TUI main loop polls, so the interface stays responsive while the
//! server answers.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::domain::{Credential, DoctorProfile, PredictionResponse};
use crate::ports::{AuthError, PredictError};

/// Result delivered by a finished worker.
#[derive(Debug)]
pub enum WorkerEvent {
    Login(Result<Credential, AuthError>),
    Register(Result<String, AuthError>),
    Profile {
        /// Session generation the lookup was made for.
        generation: u64,
        outcome: Result<DoctorProfile, AuthError>,
    },
    Prediction {
        ticket: u64,
        outcome: Result<PredictionResponse, PredictError>,
    },
}

/// State of a worker as seen from the UI thread.
#[derive(Debug)]
pub enum WorkerPoll<T> {
    /// Still running.
    Pending,
    /// Finished with a value.
    Ready(T),
    /// Thread ended without reporting (it panicked).
    Lost,
}

/// Handle to a running worker.
pub struct WorkerHandle<T> {
    rx: Receiver<T>,
    _handle: JoinHandle<()>,
}

impl<T> WorkerHandle<T> {
    /// Check for the result without blocking.
    #[must_use]
    pub fn poll(&self) -> WorkerPoll<T> {
        match self.rx.try_recv() {
            Ok(value) => WorkerPoll::Ready(value),
            Err(TryRecvError::Empty) => WorkerPoll::Pending,
            Err(TryRecvError::Disconnected) => WorkerPoll::Lost,
        }
    }
}

/// Spawns one-shot background tasks.
pub struct Worker;

impl Worker {
    /// Run `task` on a new thread.
    pub fn spawn<T, F>(task: F) -> WorkerHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            // UI may have gone away; nothing to report to.
            let _ = tx.send(task());
        });

        WorkerHandle {
            rx,
            _handle: handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait<T>(handle: &WorkerHandle<T>) -> WorkerPoll<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match handle.poll() {
                WorkerPoll::Pending if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(5));
                }
                other => return other,
            }
        }
    }

    #[test]
    fn test_worker_delivers_result() {
        let handle = Worker::spawn(|| WorkerEvent::Register(Ok("Registration successful".into())));
        match wait(&handle) {
            WorkerPoll::Ready(WorkerEvent::Register(Ok(msg))) => {
                assert_eq!(msg, "Registration successful");
            }
            other => panic!("unexpected poll result: {other:?}"),
        }
    }

    #[test]
    fn test_worker_pending_until_done() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let handle = Worker::spawn(move || {
            let _ = gate_rx.recv();
            7u8
        });
        assert!(matches!(handle.poll(), WorkerPoll::Pending));
        gate_tx.send(()).unwrap();
        assert!(matches!(wait(&handle), WorkerPoll::Ready(7)));
    }

    #[test]
    fn test_panicking_worker_is_lost() {
        let handle: WorkerHandle<u8> = Worker::spawn(|| panic!("boom"));
        assert!(matches!(wait(&handle), WorkerPoll::Lost));
    }
}
