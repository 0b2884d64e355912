use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ai::{GenerationClient, GenerationEvent, GenerationRequest};
use crate::config::Config;
use crate::error::Result;
use crate::generation::{GenerationStore, PlatformSelection, StoreEvent};
use crate::platform::{Platform, ALL_PLATFORMS};
use crate::services::{Clipboard, SaveClient};
use crate::tui::AppAction;

const COPIED_INDICATOR_TTL: Duration = Duration::from_secs(2);
const NOTICE_TTL: Duration = Duration::from_secs(4);
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Which sub-view the panel shows, derived from current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelView {
    NoApiKey,
    QuotaExhausted,
    Selection,
    Streaming,
    Results,
}

pub struct Notice {
    pub text: String,
    pub is_error: bool,
    shown_at: Instant,
}

impl Notice {
    fn info(text: String) -> Self {
        Self {
            text,
            is_error: false,
            shown_at: Instant::now(),
        }
    }

    fn error(text: String) -> Self {
        Self {
            text,
            is_error: true,
            shown_at: Instant::now(),
        }
    }
}

// Message for one settled save attempt
pub struct SaveOutcome {
    pub platform: Platform,
    pub result: std::result::Result<(), String>,
}

struct InFlightRequest {
    platforms: HashSet<Platform>,
    handle: JoinHandle<()>,
}

pub struct App {
    // Target
    pub target_id: String,
    has_api_key: bool,

    // Generation state
    pub store: GenerationStore,
    pub selection: PlatformSelection,
    pub remaining_generations: u32,
    pub add_more: bool,
    saved: HashSet<Platform>,
    saving: HashSet<Platform>,
    in_flight: Option<InFlightRequest>,

    // UI state
    pub results_cursor: usize,
    pub show_help: bool,
    notice: Option<Notice>,
    copied: Option<(Platform, Instant)>,
    spinner_frame: usize,

    // Async plumbing
    store_rx: mpsc::UnboundedReceiver<StoreEvent>,
    event_rx: mpsc::Receiver<GenerationEvent>,
    event_tx: mpsc::Sender<GenerationEvent>,
    save_rx: mpsc::Receiver<SaveOutcome>,
    save_tx: mpsc::Sender<SaveOutcome>,

    // Services
    generator: Option<Arc<GenerationClient>>,
    saver: Option<Arc<SaveClient>>,
}

impl App {
    pub fn new(config: &Config, target_id: String) -> Result<Self> {
        let generator = config
            .api_key
            .as_ref()
            .map(|key| {
                GenerationClient::new(config.api_base_url.clone(), key.clone()).map(Arc::new)
            })
            .transpose()?;
        let saver = config
            .api_key
            .as_ref()
            .map(|key| SaveClient::new(config.api_base_url.clone(), key.clone()).map(Arc::new))
            .transpose()?;

        let (store, store_rx) = GenerationStore::new();
        let (event_tx, event_rx) = mpsc::channel(64);
        let (save_tx, save_rx) = mpsc::channel(8);

        Ok(Self {
            target_id,
            has_api_key: config.api_key.is_some(),
            store,
            selection: PlatformSelection::new(),
            remaining_generations: 0,
            add_more: false,
            saved: HashSet::new(),
            saving: HashSet::new(),
            in_flight: None,
            results_cursor: 0,
            show_help: false,
            notice: None,
            copied: None,
            spinner_frame: 0,
            store_rx,
            event_rx,
            event_tx,
            save_rx,
            save_tx,
            generator,
            saver,
        })
    }

    /// Seeds the remaining-generation count: a config/CLI override wins,
    /// otherwise the usage endpoint is asked once.
    pub async fn seed_quota(&mut self, override_quota: Option<u32>) -> Result<()> {
        self.remaining_generations = match (override_quota, &self.generator) {
            (Some(quota), _) => quota,
            (None, Some(generator)) => generator.fetch_usage().await?,
            (None, None) => 0,
        };
        self.refresh_selection_gate();
        Ok(())
    }

    pub fn view(&self) -> PanelView {
        if !self.has_api_key {
            return PanelView::NoApiKey;
        }
        if self.in_flight.is_some() {
            return PanelView::Streaming;
        }
        let has_content = !self.store.completed_platforms().is_empty();
        if self.remaining_generations == 0 && !has_content {
            return PanelView::QuotaExhausted;
        }
        if !has_content || self.add_more {
            return PanelView::Selection;
        }
        PanelView::Results
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    /// Platform the results cursor points at.
    pub fn selected_result(&self) -> Option<Platform> {
        self.store
            .completed_platforms()
            .get(self.results_cursor)
            .copied()
    }

    pub fn is_saved(&self, platform: Platform) -> bool {
        self.saved.contains(&platform)
    }

    pub fn is_saving(&self, platform: Platform) -> bool {
        self.saving.contains(&platform)
    }

    pub fn is_copied(&self, platform: Platform) -> bool {
        matches!(self.copied, Some((p, at)) if p == platform && at.elapsed() < COPIED_INDICATOR_TTL)
    }

    /// True once every platform with content has been saved.
    pub fn all_saved(&self) -> bool {
        let completed = self.store.completed_platforms();
        !completed.is_empty() && completed.iter().all(|p| self.saved.contains(p))
    }

    pub fn can_save_all(&self) -> bool {
        self.store
            .completed_platforms()
            .iter()
            .any(|p| !self.saved.contains(p) && !self.saving.contains(p))
    }

    pub fn can_generate(&self) -> bool {
        self.in_flight.is_none()
            && !self.selection.is_empty()
            && self.remaining_generations > 0
            && self.selection.selected_count() <= self.remaining_generations as usize
    }

    pub fn can_generate_more(&self) -> bool {
        self.in_flight.is_none()
            && self.remaining_generations > 0
            && self.store.completed_platforms().len() < ALL_PLATFORMS.len()
    }

    /// Platforms covered by the in-flight request, in registry order.
    pub fn in_flight_platforms(&self) -> Vec<Platform> {
        match &self.in_flight {
            Some(request) => ALL_PLATFORMS
                .into_iter()
                .filter(|p| request.platforms.contains(p))
                .collect(),
            None => Vec::new(),
        }
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => match self.view() {
                PanelView::Selection => self.selection.move_up(),
                PanelView::Results => {
                    if self.results_cursor > 0 {
                        self.results_cursor -= 1;
                    }
                }
                _ => {}
            },

            AppAction::MoveDown => match self.view() {
                PanelView::Selection => self.selection.move_down(),
                PanelView::Results => {
                    let len = self.store.completed_platforms().len();
                    if len > 0 && self.results_cursor < len - 1 {
                        self.results_cursor += 1;
                    }
                }
                _ => {}
            },

            AppAction::ToggleSelect => self.selection.toggle_under_cursor(),

            AppAction::SelectAll => self.selection.select_all(),

            AppAction::ClearSelection => self.selection.clear(),

            AppAction::Generate => {
                if self.view() == PanelView::Selection {
                    self.submit_selection();
                }
            }

            AppAction::CancelGeneration => self.cancel_generation(),

            AppAction::Copy => {
                if let Some(platform) = self.selected_result() {
                    self.copy_platform(platform);
                }
            }

            AppAction::Save => {
                if let Some(platform) = self.selected_result() {
                    self.save_platform(platform);
                }
            }

            AppAction::SaveAll => self.save_all(),

            AppAction::Regenerate => {
                if let Some(platform) = self.selected_result() {
                    self.regenerate_platform(platform);
                }
            }

            AppAction::GenerateMore => {
                if self.view() == PanelView::Results && self.can_generate_more() {
                    self.selection
                        .set_excluded(self.store.completed_platforms().into_iter().collect());
                    self.add_more = true;
                }
            }

            AppAction::Back => {
                if self.add_more {
                    self.add_more = false;
                    self.selection.set_excluded(HashSet::new());
                    self.selection.reset();
                }
            }

            AppAction::StartOver => self.start_over(),

            AppAction::ShowHelp => self.show_help = true,

            AppAction::HideHelp => self.show_help = false,
        }

        Ok(false)
    }

    /// Re-validates the current selection and, if it passes, issues the
    /// request. The Generate control is already gated by `can_generate`; this
    /// repeats the checks with user-visible messages.
    fn submit_selection(&mut self) {
        let platforms = self.selection.selected().clone();

        if platforms.is_empty() {
            self.notice = Some(Notice::error("Select at least one platform".to_string()));
            return;
        }
        if self.remaining_generations == 0 {
            self.notice = Some(Notice::error(
                "No generations remaining. Upgrade to continue".to_string(),
            ));
            return;
        }
        if platforms.len() > self.remaining_generations as usize {
            self.notice = Some(Notice::error(format!(
                "Only {} generation(s) remaining, {} platforms selected",
                self.remaining_generations,
                platforms.len()
            )));
            return;
        }

        self.start_request(platforms, false);
    }

    fn regenerate_platform(&mut self, platform: Platform) {
        // Serialized against save for the same platform
        if self.in_flight.is_some() || self.saving.contains(&platform) {
            return;
        }
        if self.remaining_generations == 0 {
            self.notice = Some(Notice::error(
                "No generations remaining. Upgrade to continue".to_string(),
            ));
            return;
        }
        self.saved.remove(&platform);
        self.start_request([platform].into_iter().collect(), true);
    }

    fn start_request(&mut self, platforms: HashSet<Platform>, regenerate: bool) {
        self.store.start_request(&platforms, regenerate);

        let request = GenerationRequest {
            content_target_id: self.target_id.clone(),
            platforms: ALL_PLATFORMS
                .into_iter()
                .filter(|p| platforms.contains(p))
                .collect(),
            regenerate,
        };

        let tx = self.event_tx.clone();
        let handle = match &self.generator {
            Some(generator) => {
                let client = Arc::clone(generator);
                tokio::spawn(async move {
                    client.stream_generation(request, tx).await;
                })
            }
            // No client configured; events can only come from elsewhere
            None => tokio::spawn(async {}),
        };

        self.in_flight = Some(InFlightRequest { platforms, handle });
        self.selection.reset();
        self.refresh_selection_gate();
    }

    fn cancel_generation(&mut self) {
        if let Some(request) = self.in_flight.take() {
            request.handle.abort();
            self.store.cancel_in_flight();
            self.clamp_results_cursor();
            self.refresh_selection_gate();
            self.notice = Some(Notice::info("Generation cancelled".to_string()));
        }
    }

    fn start_over(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        self.store.reset();
        self.saved.clear();
        self.add_more = false;
        self.results_cursor = 0;
        self.selection.set_excluded(HashSet::new());
        self.selection.reset();
        self.refresh_selection_gate();
    }

    fn copy_platform(&mut self, platform: Platform) {
        let Some(content) = self.store.content(platform) else {
            return;
        };
        match Clipboard::copy(content) {
            Ok(()) => self.copied = Some((platform, Instant::now())),
            Err(e) => {
                tracing::warn!("Clipboard write failed: {e}");
                self.notice = Some(Notice::error(e.to_string()));
            }
        }
    }

    fn save_platform(&mut self, platform: Platform) {
        if self.saving.contains(&platform) || self.store.is_streaming(platform) {
            return;
        }
        let Some(content) = self.store.content(platform) else {
            return;
        };
        let Some(saver) = &self.saver else {
            self.notice = Some(Notice::error("Save unavailable: no API key".to_string()));
            return;
        };

        let saver = Arc::clone(saver);
        let tx = self.save_tx.clone();
        let target_id = self.target_id.clone();
        let content = content.to_string();

        self.saving.insert(platform);
        tokio::spawn(async move {
            let result = saver
                .save_generation(&target_id, platform, &content)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(SaveOutcome { platform, result }).await;
        });
    }

    /// Attempts every unsaved platform independently; one failure does not
    /// abort the rest, and each outcome is reported on its own.
    fn save_all(&mut self) {
        let pending: Vec<(Platform, String)> = self
            .store
            .completed_platforms()
            .into_iter()
            .filter(|p| !self.saved.contains(p) && !self.saving.contains(p))
            .filter_map(|p| self.store.content(p).map(|c| (p, c.to_string())))
            .collect();

        if pending.is_empty() {
            return;
        }
        let Some(saver) = &self.saver else {
            self.notice = Some(Notice::error("Save unavailable: no API key".to_string()));
            return;
        };

        let saver = Arc::clone(saver);
        let tx = self.save_tx.clone();
        let target_id = self.target_id.clone();

        for (platform, _) in &pending {
            self.saving.insert(*platform);
        }
        tokio::spawn(async move {
            for (platform, content) in pending {
                let result = saver
                    .save_generation(&target_id, platform, &content)
                    .await
                    .map_err(|e| e.to_string());
                let _ = tx.send(SaveOutcome { platform, result }).await;
            }
        });
    }

    /// Poll for stream events from the in-flight request (non-blocking)
    pub fn poll_generation_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                GenerationEvent::Started(platform) => {
                    tracing::debug!("Stream started for {platform}");
                }
                GenerationEvent::Chunk { platform, delta } => {
                    self.store.apply_chunk(platform, &delta);
                }
                GenerationEvent::Completed { platform, content } => {
                    self.store.complete(platform, content);
                }
                GenerationEvent::Failed { platform, message } => {
                    tracing::warn!("Generation failed for {platform}: {message}");
                    self.store.error(platform, message);
                }
                GenerationEvent::Finished => self.finish_request(),
                GenerationEvent::RequestFailed(message) => {
                    tracing::error!("Generation request failed: {message}");
                    if let Some(request) = self.in_flight.take() {
                        request.handle.abort();
                    }
                    self.store.cancel_in_flight();
                    self.clamp_results_cursor();
                    self.refresh_selection_gate();
                    self.notice = Some(Notice::error(message));
                }
            }
        }
        self.drain_store_events();
    }

    /// Poll for settled save attempts (non-blocking)
    pub fn poll_save_results(&mut self) {
        while let Ok(outcome) = self.save_rx.try_recv() {
            self.saving.remove(&outcome.platform);
            match outcome.result {
                // The content may have been cleared by a start-over while the
                // save was in flight; only then is the saved mark skipped.
                Ok(()) if self.store.content(outcome.platform).is_some() => {
                    self.saved.insert(outcome.platform);
                    self.notice = Some(Notice::info(format!("{} saved", outcome.platform)));
                }
                Ok(()) => {}
                Err(message) => {
                    self.notice = Some(Notice::error(format!(
                        "Save failed for {}: {message}",
                        outcome.platform
                    )));
                }
            }
        }
    }

    /// Advance the spinner and expire transient indicators.
    pub fn tick(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        if matches!(self.copied, Some((_, at)) if at.elapsed() >= COPIED_INDICATOR_TTL) {
            self.copied = None;
        }
        if matches!(&self.notice, Some(n) if n.shown_at.elapsed() >= NOTICE_TTL) {
            self.notice = None;
        }
    }

    fn finish_request(&mut self) {
        if let Some(request) = self.in_flight.take() {
            drop(request.handle);
        }
        // Platforms the stream never settled revert like a cancellation
        self.store.cancel_in_flight();
        self.add_more = false;
        self.selection.set_excluded(HashSet::new());
        self.selection.reset();
        self.clamp_results_cursor();
        self.refresh_selection_gate();

        let completed = self.store.completed_platforms();
        tracing::info!(platforms = completed.len(), "Content generated");
    }

    fn drain_store_events(&mut self) {
        while let Ok(event) = self.store_rx.try_recv() {
            match event {
                StoreEvent::Completed(platform) => {
                    // Quota counts down per platform, not per request
                    self.remaining_generations = self.remaining_generations.saturating_sub(1);
                    tracing::info!("Generation complete for {platform}");
                }
                StoreEvent::Started(_) | StoreEvent::Errored(_) => {}
            }
        }
        self.refresh_selection_gate();
    }

    fn refresh_selection_gate(&mut self) {
        self.selection
            .set_disabled(self.in_flight.is_some() || self.remaining_generations == 0);
    }

    fn clamp_results_cursor(&mut self) {
        let len = self.store.completed_platforms().len();
        if len == 0 {
            self.results_cursor = 0;
        } else if self.results_cursor >= len {
            self.results_cursor = len - 1;
        }
    }
}
