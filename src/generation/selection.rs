use std::collections::HashSet;

use crate::platform::{Platform, ALL_PLATFORMS};

/// Tracks which platforms the user has picked for the next request.
///
/// Platforms in the exclusion set (already generated, in "generate more"
/// mode) are hidden entirely. While disabled, every mutation is a no-op.
#[derive(Default)]
pub struct PlatformSelection {
    selected: HashSet<Platform>,
    excluded: HashSet<Platform>,
    cursor: usize,
    disabled: bool,
}

impl PlatformSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Platforms currently offered, in registry order.
    pub fn visible(&self) -> Vec<Platform> {
        ALL_PLATFORMS
            .into_iter()
            .filter(|p| !self.excluded.contains(p))
            .collect()
    }

    pub fn selected(&self) -> &HashSet<Platform> {
        &self.selected
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_selected(&self, platform: Platform) -> bool {
        self.selected.contains(&platform)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn platform_under_cursor(&self) -> Option<Platform> {
        self.visible().get(self.cursor).copied()
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Replaces the exclusion set, dropping any selection or cursor position
    /// that no longer points at a visible platform.
    pub fn set_excluded(&mut self, excluded: HashSet<Platform>) {
        self.selected.retain(|p| !excluded.contains(p));
        self.excluded = excluded;
        let len = self.visible().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_down(&mut self) {
        let len = self.visible().len();
        if len > 0 && self.cursor < len - 1 {
            self.cursor += 1;
        }
    }

    pub fn toggle(&mut self, platform: Platform) {
        if self.disabled || self.excluded.contains(&platform) {
            return;
        }
        if !self.selected.remove(&platform) {
            self.selected.insert(platform);
        }
    }

    pub fn toggle_under_cursor(&mut self) {
        if let Some(platform) = self.platform_under_cursor() {
            self.toggle(platform);
        }
    }

    /// Selects every visible platform.
    pub fn select_all(&mut self) {
        if self.disabled {
            return;
        }
        self.selected = self.visible().into_iter().collect();
    }

    pub fn clear(&mut self) {
        if self.disabled {
            return;
        }
        self.selected.clear();
    }

    /// Unconditional reset, used after a request has been issued.
    pub fn reset(&mut self) {
        self.selected.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_selects_and_deselects() {
        let mut selection = PlatformSelection::new();
        selection.toggle(Platform::Twitter);
        assert!(selection.is_selected(Platform::Twitter));
        selection.toggle(Platform::Twitter);
        assert!(!selection.is_selected(Platform::Twitter));
    }

    #[test]
    fn excluded_platforms_are_hidden_and_unselectable() {
        let mut selection = PlatformSelection::new();
        selection.set_excluded([Platform::Facebook, Platform::Twitter].into_iter().collect());

        assert_eq!(
            selection.visible(),
            vec![Platform::Instagram, Platform::LinkedIn]
        );
        selection.toggle(Platform::Facebook);
        assert!(!selection.is_selected(Platform::Facebook));
    }

    #[test]
    fn select_all_covers_only_visible_platforms() {
        let mut selection = PlatformSelection::new();
        selection.set_excluded([Platform::LinkedIn].into_iter().collect());
        selection.select_all();

        assert_eq!(selection.selected_count(), 3);
        assert!(!selection.is_selected(Platform::LinkedIn));
    }

    #[test]
    fn excluding_a_selected_platform_drops_it() {
        let mut selection = PlatformSelection::new();
        selection.toggle(Platform::Instagram);
        selection.set_excluded([Platform::Instagram].into_iter().collect());
        assert!(selection.is_empty());
    }

    #[test]
    fn disabled_mode_makes_all_mutations_noops() {
        let mut selection = PlatformSelection::new();
        selection.toggle(Platform::Twitter);
        selection.set_disabled(true);

        selection.toggle(Platform::Facebook);
        selection.select_all();
        assert_eq!(selection.selected_count(), 1);

        selection.clear();
        assert!(selection.is_selected(Platform::Twitter));
    }

    #[test]
    fn cursor_stays_within_visible_range() {
        let mut selection = PlatformSelection::new();
        selection.move_down();
        selection.move_down();
        selection.move_down();
        selection.move_down();
        assert_eq!(selection.cursor(), 3);

        selection.set_excluded(
            [Platform::Instagram, Platform::LinkedIn].into_iter().collect(),
        );
        assert_eq!(selection.cursor(), 1);
        assert_eq!(selection.platform_under_cursor(), Some(Platform::Twitter));
    }
}
