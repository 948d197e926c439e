// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live build status channel.
//!
//! A pub/sub "live tail" of human-readable build lines keyed by plugin id.
//! Publishing never blocks and never fails: subscribers that are not
//! connected, or that fall behind, simply miss lines.

use pf_core::{BuildProfile, PluginId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Lines buffered per subscriber before it starts lagging.
pub const DEFAULT_CAPACITY: usize = 1024;

/// One published status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    pub channel: PluginId,
    pub profile: BuildProfile,
    #[serde(default)]
    pub error: bool,
    pub text: String,
}

impl StatusLine {
    /// Text as shown to a user, e.g. `[BUILD] Compiling` or
    /// `ERROR - [RELEASE] build failed`.
    pub fn render(&self) -> String {
        if self.error {
            format!("ERROR - [{}] {}", self.profile.tag(), self.text)
        } else {
            format!("[{}] {}", self.profile.tag(), self.text)
        }
    }
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

pub trait StatusChannel: Send + Sync {
    fn publish(&self, channel: &PluginId, profile: BuildProfile, line: &str);

    fn publish_error(&self, channel: &PluginId, profile: BuildProfile, line: &str);

    /// Receive every line published from now on, across all channels.
    fn subscribe(&self) -> broadcast::Receiver<StatusLine>;
}

/// Status channel backed by a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastStatusChannel {
    tx: broadcast::Sender<StatusLine>,
}

impl BroadcastStatusChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    fn send(&self, line: StatusLine) {
        tracing::trace!(channel = %line.channel, "{}", line.render());
        // No receivers is not an error for a live tail
        let _ = self.tx.send(line);
    }
}

impl Default for BroadcastStatusChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl StatusChannel for BroadcastStatusChannel {
    fn publish(&self, channel: &PluginId, profile: BuildProfile, line: &str) {
        self.send(StatusLine { channel: channel.clone(), profile, error: false, text: line.into() });
    }

    fn publish_error(&self, channel: &PluginId, profile: BuildProfile, line: &str) {
        self.send(StatusLine { channel: channel.clone(), profile, error: true, text: line.into() });
    }

    fn subscribe(&self) -> broadcast::Receiver<StatusLine> {
        self.tx.subscribe()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{BroadcastStatusChannel, StatusChannel, StatusLine};
    use parking_lot::Mutex;
    use pf_core::{BuildProfile, PluginId};
    use std::sync::Arc;
    use tokio::sync::broadcast;

    /// Status channel that keeps every line for later inspection
    #[derive(Clone, Default)]
    pub struct FakeStatusChannel {
        lines: Arc<Mutex<Vec<StatusLine>>>,
        live: BroadcastStatusChannel,
    }

    impl FakeStatusChannel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn lines(&self) -> Vec<StatusLine> {
            self.lines.lock().clone()
        }

        /// Rendered lines published on `channel`.
        pub fn rendered(&self, channel: &str) -> Vec<String> {
            self.lines
                .lock()
                .iter()
                .filter(|l| l.channel == channel)
                .map(StatusLine::render)
                .collect()
        }

        pub fn errors(&self, channel: &str) -> Vec<StatusLine> {
            self.lines.lock().iter().filter(|l| l.error && l.channel == channel).cloned().collect()
        }

        fn record(&self, line: StatusLine) {
            self.lines.lock().push(line.clone());
            if line.error {
                self.live.publish_error(&line.channel, line.profile, &line.text);
            } else {
                self.live.publish(&line.channel, line.profile, &line.text);
            }
        }
    }

    impl StatusChannel for FakeStatusChannel {
        fn publish(&self, channel: &PluginId, profile: BuildProfile, line: &str) {
            self.record(StatusLine {
                channel: channel.clone(),
                profile,
                error: false,
                text: line.to_string(),
            });
        }

        fn publish_error(&self, channel: &PluginId, profile: BuildProfile, line: &str) {
            self.record(StatusLine {
                channel: channel.clone(),
                profile,
                error: true,
                text: line.to_string(),
            });
        }

        fn subscribe(&self) -> broadcast::Receiver<StatusLine> {
            self.live.subscribe()
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStatusChannel;

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
