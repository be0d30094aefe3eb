#![allow(dead_code)]

use std::fmt;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use tcpsh::{Level, Logger};

/// Logger double that keeps every line.
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(Level, String, String)>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<(Level, String, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(l, _, message)| *l == level && message.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: Level, tag: &str, message: fmt::Arguments<'_>) {
        self.lines
            .lock()
            .unwrap()
            .push((level, tag.to_string(), message.to_string()));
    }
}

/// Polls `condition` until it yields a value, panicking after five seconds.
pub fn wait_for<T>(mut condition: impl FnMut() -> Option<T>) -> T {
    let deadline = Instant::now() + Duration::from_secs(5);

    loop {
        if let Some(value) = condition() {
            return value;
        }

        assert!(Instant::now() < deadline, "timed out waiting for condition");
        thread::sleep(Duration::from_millis(5));
    }
}
