use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::platform::{Platform, ALL_PLATFORMS};

/// Per-platform generation state. A platform holds exactly one of these at a
/// time; starting idle, entering `Streaming` when a request covering it is
/// issued, and settling in `Completed` or `Errored`. Regeneration re-enters
/// `Streaming` for that platform only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlatformState {
    #[default]
    Idle,
    Streaming,
    Completed,
    Errored(String),
}

/// Transition notifications the store pushes to its owner. `Completed` is the
/// per-platform completion signal quota accounting hangs off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Started(Platform),
    Completed(Platform),
    Errored(Platform),
}

/// Generation state for one session, tied to one content target.
///
/// Committed content lives in `content`; text still streaming in accumulates
/// in `buffers` and is only committed on completion. Cancellation discards
/// buffers, never committed content.
pub struct GenerationStore {
    states: BTreeMap<Platform, PlatformState>,
    content: BTreeMap<Platform, String>,
    buffers: BTreeMap<Platform, String>,
    generated_at: BTreeMap<Platform, DateTime<Utc>>,
    events_tx: mpsc::UnboundedSender<StoreEvent>,
}

impl GenerationStore {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StoreEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let store = Self {
            states: BTreeMap::new(),
            content: BTreeMap::new(),
            buffers: BTreeMap::new(),
            generated_at: BTreeMap::new(),
            events_tx,
        };
        (store, events_rx)
    }

    pub fn state(&self, platform: Platform) -> PlatformState {
        self.states.get(&platform).cloned().unwrap_or_default()
    }

    /// Committed text for a platform, if it has completed at least once.
    pub fn content(&self, platform: Platform) -> Option<&str> {
        self.content.get(&platform).map(String::as_str)
    }

    /// Partial text accumulated while a platform is streaming.
    pub fn partial(&self, platform: Platform) -> Option<&str> {
        self.buffers.get(&platform).map(String::as_str)
    }

    /// When a platform's current content was committed.
    pub fn generated_at(&self, platform: Platform) -> Option<DateTime<Utc>> {
        self.generated_at.get(&platform).copied()
    }

    pub fn error_message(&self, platform: Platform) -> Option<String> {
        match self.state(platform) {
            PlatformState::Errored(message) => Some(message),
            _ => None,
        }
    }

    /// Platforms with committed content, in registry order.
    pub fn completed_platforms(&self) -> Vec<Platform> {
        ALL_PLATFORMS
            .into_iter()
            .filter(|p| self.content.contains_key(p))
            .collect()
    }

    pub fn is_streaming(&self, platform: Platform) -> bool {
        self.state(platform) == PlatformState::Streaming
    }

    pub fn any_streaming(&self) -> bool {
        self.states
            .values()
            .any(|s| *s == PlatformState::Streaming)
    }

    /// Marks every platform in the set as streaming and emits a Started event
    /// per platform. An empty set is a no-op; selection validation happens
    /// upstream. Regeneration keeps the previously committed content until a
    /// new completion replaces it.
    pub fn start_request(&mut self, platforms: &HashSet<Platform>, is_regeneration: bool) {
        if platforms.is_empty() {
            return;
        }
        for &platform in platforms {
            if is_regeneration {
                tracing::debug!("Regenerating {platform}");
            }
            self.buffers.insert(platform, String::new());
            self.states.insert(platform, PlatformState::Streaming);
            let _ = self.events_tx.send(StoreEvent::Started(platform));
        }
    }

    /// Appends a streamed fragment. Fragments for platforms not currently
    /// streaming are dropped; they can only be stragglers from an aborted
    /// request.
    pub fn apply_chunk(&mut self, platform: Platform, fragment: &str) {
        if !self.is_streaming(platform) {
            tracing::debug!("Dropping stray chunk for {platform}");
            return;
        }
        self.buffers.entry(platform).or_default().push_str(fragment);
    }

    /// Moves a streaming platform to completed and commits its text. The
    /// terminal event may carry the full content; when it does not, the
    /// accumulated buffer is committed instead.
    pub fn complete(&mut self, platform: Platform, final_text: Option<String>) {
        if !self.is_streaming(platform) {
            tracing::debug!("Dropping stray completion for {platform}");
            return;
        }
        let text = match final_text {
            Some(text) => text,
            None => self.buffers.remove(&platform).unwrap_or_default(),
        };
        self.buffers.remove(&platform);
        self.content.insert(platform, text);
        self.generated_at.insert(platform, Utc::now());
        self.states.insert(platform, PlatformState::Completed);
        let _ = self.events_tx.send(StoreEvent::Completed(platform));
    }

    /// Moves a streaming platform to errored. Sibling platforms are untouched.
    pub fn error(&mut self, platform: Platform, message: String) {
        if !self.is_streaming(platform) {
            tracing::debug!("Dropping stray error for {platform}");
            return;
        }
        self.buffers.remove(&platform);
        self.states.insert(platform, PlatformState::Errored(message));
        let _ = self.events_tx.send(StoreEvent::Errored(platform));
    }

    /// Request-level cancellation: every streaming platform drops its partial
    /// text and reverts to its last committed state.
    pub fn cancel_in_flight(&mut self) {
        let streaming: Vec<Platform> = self
            .states
            .iter()
            .filter(|(_, s)| **s == PlatformState::Streaming)
            .map(|(p, _)| *p)
            .collect();

        for platform in streaming {
            self.buffers.remove(&platform);
            if self.content.contains_key(&platform) {
                self.states.insert(platform, PlatformState::Completed);
            } else {
                self.states.remove(&platform);
            }
        }
    }

    /// Start over: clears all state and content.
    pub fn reset(&mut self) {
        self.states.clear();
        self.content.clear();
        self.buffers.clear();
        self.generated_at.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(platforms: &[Platform]) -> HashSet<Platform> {
        platforms.iter().copied().collect()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<StoreEvent>) -> Vec<StoreEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn platform_is_in_exactly_one_state_through_a_full_run() {
        let (mut store, _rx) = GenerationStore::new();

        assert_eq!(store.state(Platform::Twitter), PlatformState::Idle);

        store.start_request(&set(&[Platform::Twitter]), false);
        assert_eq!(store.state(Platform::Twitter), PlatformState::Streaming);

        store.apply_chunk(Platform::Twitter, "Big news ");
        store.apply_chunk(Platform::Twitter, "today!");
        assert_eq!(store.partial(Platform::Twitter), Some("Big news today!"));

        store.complete(Platform::Twitter, None);
        assert_eq!(store.state(Platform::Twitter), PlatformState::Completed);
        assert_eq!(store.content(Platform::Twitter), Some("Big news today!"));
        assert_eq!(store.partial(Platform::Twitter), None);
        assert!(store.generated_at(Platform::Twitter).is_some());
    }

    #[test]
    fn empty_request_is_a_noop() {
        let (mut store, mut rx) = GenerationStore::new();
        store.start_request(&set(&[]), false);
        assert!(drain(&mut rx).is_empty());
        assert!(!store.any_streaming());
    }

    #[test]
    fn final_text_from_terminal_event_wins_over_buffer() {
        let (mut store, _rx) = GenerationStore::new();
        store.start_request(&set(&[Platform::Facebook]), false);
        store.apply_chunk(Platform::Facebook, "partial");
        store.complete(Platform::Facebook, Some("final copy".to_string()));
        assert_eq!(store.content(Platform::Facebook), Some("final copy"));
    }

    #[test]
    fn error_is_isolated_to_one_platform() {
        let (mut store, mut rx) = GenerationStore::new();
        store.start_request(&set(&[Platform::Instagram, Platform::Facebook]), false);
        store.error(Platform::Instagram, "model overloaded".to_string());

        assert_eq!(
            store.state(Platform::Instagram),
            PlatformState::Errored("model overloaded".to_string())
        );
        assert_eq!(
            store.error_message(Platform::Instagram).as_deref(),
            Some("model overloaded")
        );
        assert_eq!(store.state(Platform::Facebook), PlatformState::Streaming);

        let events = drain(&mut rx);
        assert!(events.contains(&StoreEvent::Errored(Platform::Instagram)));
        assert!(!events.contains(&StoreEvent::Errored(Platform::Facebook)));
    }

    #[test]
    fn regeneration_reenters_streaming_and_keeps_old_content_until_completion() {
        let (mut store, _rx) = GenerationStore::new();
        store.start_request(&set(&[Platform::LinkedIn]), false);
        store.complete(Platform::LinkedIn, Some("v1".to_string()));

        store.start_request(&set(&[Platform::LinkedIn]), true);
        assert_eq!(store.state(Platform::LinkedIn), PlatformState::Streaming);
        assert_eq!(store.content(Platform::LinkedIn), Some("v1"));

        store.complete(Platform::LinkedIn, Some("v2".to_string()));
        assert_eq!(store.content(Platform::LinkedIn), Some("v2"));
    }

    #[test]
    fn regeneration_clears_a_prior_error() {
        let (mut store, _rx) = GenerationStore::new();
        store.start_request(&set(&[Platform::Twitter]), false);
        store.error(Platform::Twitter, "timeout".to_string());

        store.start_request(&set(&[Platform::Twitter]), true);
        assert_eq!(store.state(Platform::Twitter), PlatformState::Streaming);
        assert_eq!(store.error_message(Platform::Twitter), None);
    }

    #[test]
    fn cancel_keeps_completed_content_and_discards_partials() {
        let (mut store, _rx) = GenerationStore::new();
        store.start_request(&set(&[Platform::Facebook, Platform::Twitter]), false);
        store.complete(Platform::Facebook, Some("done".to_string()));
        store.apply_chunk(Platform::Twitter, "half a tw");

        store.cancel_in_flight();

        assert_eq!(store.state(Platform::Facebook), PlatformState::Completed);
        assert_eq!(store.content(Platform::Facebook), Some("done"));
        assert_eq!(store.state(Platform::Twitter), PlatformState::Idle);
        assert_eq!(store.content(Platform::Twitter), None);
        assert_eq!(store.partial(Platform::Twitter), None);
    }

    #[test]
    fn cancel_mid_regeneration_reverts_to_committed_content() {
        let (mut store, _rx) = GenerationStore::new();
        store.start_request(&set(&[Platform::Instagram]), false);
        store.complete(Platform::Instagram, Some("v1".to_string()));

        store.start_request(&set(&[Platform::Instagram]), true);
        store.apply_chunk(Platform::Instagram, "v2 in prog");
        store.cancel_in_flight();

        assert_eq!(store.state(Platform::Instagram), PlatformState::Completed);
        assert_eq!(store.content(Platform::Instagram), Some("v1"));
    }

    #[test]
    fn stray_events_after_cancel_are_dropped() {
        let (mut store, mut rx) = GenerationStore::new();
        store.start_request(&set(&[Platform::Twitter]), false);
        store.cancel_in_flight();
        drain(&mut rx);

        store.apply_chunk(Platform::Twitter, "late");
        store.complete(Platform::Twitter, Some("late".to_string()));
        store.error(Platform::Twitter, "late".to_string());

        assert_eq!(store.state(Platform::Twitter), PlatformState::Idle);
        assert_eq!(store.content(Platform::Twitter), None);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let (mut store, _rx) = GenerationStore::new();
        store.start_request(&set(&[Platform::Facebook]), false);
        store.complete(Platform::Facebook, Some("post".to_string()));

        store.reset();

        assert_eq!(store.state(Platform::Facebook), PlatformState::Idle);
        assert!(store.completed_platforms().is_empty());
    }

    #[test]
    fn completion_emits_one_event_per_platform() {
        let (mut store, mut rx) = GenerationStore::new();
        store.start_request(&set(&[Platform::Facebook, Platform::Twitter]), false);
        store.complete(Platform::Facebook, Some("a".to_string()));
        store.complete(Platform::Twitter, Some("b".to_string()));

        let completed: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, StoreEvent::Completed(_)))
            .collect();
        assert_eq!(completed.len(), 2);
    }
}
