// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A resettable cross-thread signal.

use std::sync::{Condvar, Mutex};

/// A one-shot event that threads can block on until it is triggered.
///
/// Once triggered it stays triggered until [`reset`](Self::reset) is called.
/// Resetting a signal another thread is currently waiting on is a logic error
/// in the caller.
#[derive(Debug, Default)]
pub struct ThreadSignal {
    triggered: Mutex<bool>,
    condvar: Condvar,
}

impl ThreadSignal {
    /// Creates a new, untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers the signal and wakes every waiting thread.
    pub fn trigger(&self) {
        let mut triggered = self.triggered.lock().unwrap_or_else(|e| e.into_inner());
        *triggered = true;
        self.condvar.notify_all();
    }

    /// Blocks the calling thread until the signal is triggered.
    pub fn wait(&self) {
        let mut triggered = self.triggered.lock().unwrap_or_else(|e| e.into_inner());
        while !*triggered {
            triggered = self
                .condvar
                .wait(triggered)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Returns `true` if the signal has been triggered since the last reset.
    pub fn is_triggered(&self) -> bool {
        *self.triggered.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the signal to the untriggered state.
    pub fn reset(&self) {
        *self.triggered.lock().unwrap_or_else(|e| e.into_inner()) = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_wait_returns_after_trigger_from_other_thread() {
        let signal = Arc::new(ThreadSignal::new());
        let waiter = {
            let signal = signal.clone();
            thread::spawn(move || {
                signal.wait();
                signal.is_triggered()
            })
        };
        signal.trigger();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_reset_clears_state() {
        let signal = ThreadSignal::new();
        assert!(!signal.is_triggered());
        signal.trigger();
        signal.wait();
        assert!(signal.is_triggered());
        signal.reset();
        assert!(!signal.is_triggered());
    }
}
