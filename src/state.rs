use std::collections::VecDeque;

use crate::error::Result;
use crate::extract::ColorSwatch;
use crate::sample::SampledColor;

/// How many picked colors are remembered.
pub const MAX_PICKED: usize = 4;

/// Per-image UI state: the palette, the color under the pointer and the
/// colors the user clicked. Extraction and sampling never touch it; the shell
/// feeds their results in.
#[derive(Clone, Debug, Default)]
pub struct InspectorState {
    palette: Vec<ColorSwatch>,
    hover: Option<SampledColor>,
    picked: VecDeque<SampledColor>,
}

impl InspectorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn palette(&self) -> &[ColorSwatch] {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Vec<ColorSwatch>) {
        self.palette = palette;
    }

    pub fn hover_color(&self) -> Option<&SampledColor> {
        self.hover.as_ref()
    }

    /// Newest first.
    pub fn picked(&self) -> impl Iterator<Item = &SampledColor> {
        self.picked.iter()
    }

    pub fn latest_pick(&self) -> Option<&SampledColor> {
        self.picked.front()
    }

    /// Apply a hover sample. The latest successful sample wins; any error leaves
    /// the state as it was. Returns whether the state changed.
    pub fn hover(&mut self, sample: Result<SampledColor>) -> bool {
        match sample {
            Ok(color) => {
                self.hover = Some(color);
                true
            }
            Err(_) => false,
        }
    }

    /// Record a picked color. A hex already in the list moves to the front
    /// instead of being duplicated; the oldest entry falls off past `MAX_PICKED`.
    pub fn pick(&mut self, sample: Result<SampledColor>) -> bool {
        let Ok(color) = sample else {
            return false;
        };
        if let Some(pos) = self.picked.iter().position(|c| c.hex == color.hex) {
            self.picked.remove(pos);
        }
        self.picked.push_front(color);
        self.picked.truncate(MAX_PICKED);
        true
    }

    /// Forget everything, e.g. when a new image is loaded.
    pub fn reset(&mut self) {
        self.palette.clear();
        self.hover = None;
        self.picked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InspectError;

    fn color(hex: &str) -> Result<SampledColor> {
        SampledColor::from_hex(hex)
    }

    fn oob() -> Result<SampledColor> {
        Err(InspectError::OutOfBounds {
            x: -1,
            y: 0,
            width: 1,
            height: 1,
        })
    }

    fn picked_hexes(state: &InspectorState) -> Vec<String> {
        state.picked().map(|c| c.hex.clone()).collect()
    }

    #[test]
    fn hover_is_last_write_wins_and_ignores_errors() {
        let mut state = InspectorState::new();
        assert!(state.hover(color("#111111")));
        assert!(state.hover(color("#222222")));
        assert!(!state.hover(oob()));
        assert_eq!(state.hover_color().unwrap().hex, "#222222");
    }

    #[test]
    fn picks_are_bounded_and_newest_first() {
        let mut state = InspectorState::new();
        for hex in ["#000001", "#000002", "#000003", "#000004", "#000005"] {
            assert!(state.pick(color(hex)));
        }
        assert_eq!(
            picked_hexes(&state),
            ["#000005", "#000004", "#000003", "#000002"]
        );
    }

    #[test]
    fn repeated_pick_moves_to_front() {
        let mut state = InspectorState::new();
        state.pick(color("#AA0000"));
        state.pick(color("#00AA00"));
        state.pick(color("#aa0000"));
        assert_eq!(picked_hexes(&state), ["#AA0000", "#00AA00"]);
        assert_eq!(state.latest_pick().unwrap().hex, "#AA0000");
    }

    #[test]
    fn failed_pick_changes_nothing() {
        let mut state = InspectorState::new();
        state.pick(color("#123456"));
        assert!(!state.pick(oob()));
        assert_eq!(picked_hexes(&state), ["#123456"]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = InspectorState::new();
        state.set_palette(vec![]);
        state.hover(color("#010203"));
        state.pick(color("#010203"));
        state.reset();
        assert!(state.palette().is_empty());
        assert!(state.hover_color().is_none());
        assert!(state.latest_pick().is_none());
    }
}
