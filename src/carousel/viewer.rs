/// Media viewer state machine
///
/// Owns the carousel state for one open viewer. Created by `open`, thrown
/// away by `close`; reopening always starts from a fresh state.
///
/// The current index only changes when a swipe commits or through
/// previous/next/keyboard navigation. The drag offset returns to zero at
/// the end of every gesture: immediately on cancel, or on the next
/// animation frame after a commit (the offset is first seeded so that the
/// strip does not move at the moment of release).
use std::time::Instant;

use super::gesture::{self, GestureTracker};
use super::media::{MediaItem, Playback};
use crate::config::ViewerConfig;

/// Keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    Escape,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResponse {
    /// The caller should close the viewer (and restore its chrome)
    Close,
    Navigated,
    Ignored,
}

/// Result of releasing a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// Moved to the given index
    Committed(usize),
    /// Snapped back to the current index
    Cancelled,
    /// No gesture was in progress
    Ignored,
}

#[derive(Debug, Clone)]
struct CarouselState {
    items: Vec<MediaItem>,
    current_index: usize,
    drag_offset: f32,
    is_dragging: bool,
    allow_animated_transition: bool,
    /// A committed swipe left a seeded offset that settles on the next frame
    pending_settle: bool,
    gesture: GestureTracker,
    /// One entry per item, `None` for photos
    playback: Vec<Option<Playback>>,
}

impl CarouselState {
    fn new(items: Vec<MediaItem>, initial_index: usize) -> Self {
        let mut state = Self {
            playback: vec![None; items.len()],
            items,
            current_index: initial_index,
            drag_offset: 0.0,
            is_dragging: false,
            allow_animated_transition: false,
            pending_settle: false,
            gesture: GestureTracker::default(),
        };
        state.sync_playback();
        state
    }

    fn set_index(&mut self, index: usize) {
        self.current_index = index;
        self.sync_playback();
    }

    /// Pause every video that is not on screen, autoplay the current one
    fn sync_playback(&mut self) {
        let current = self.current_index;
        for (i, (item, playback)) in self.items.iter().zip(self.playback.iter_mut()).enumerate() {
            *playback = item.is_video().then(|| {
                if i == current {
                    Playback::Playing
                } else {
                    Playback::Paused
                }
            });
        }
    }

    fn end_gesture(&mut self) {
        self.is_dragging = false;
        self.gesture.reset();
    }
}

#[derive(Debug, Clone)]
pub struct MediaViewer {
    config: ViewerConfig,
    state: Option<CarouselState>,
    /// Bumped on every open so a late `enable_transitions` from a previous
    /// session cannot apply to the new one
    generation: u64,
    viewport_width: f32,
}

impl MediaViewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            state: None,
            generation: 0,
            viewport_width: 0.0,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Show `items` starting at `initial_index`.
    ///
    /// Returns false (and stays closed) for an empty list or an index out
    /// of range. Transitions start disabled; the caller re-enables them
    /// with `enable_transitions(self.generation())` after a short delay.
    pub fn open(&mut self, items: Vec<MediaItem>, initial_index: usize) -> bool {
        if initial_index >= items.len() {
            tracing::warn!(
                len = items.len(),
                initial_index,
                "declining to open viewer"
            );
            self.state = None;
            return false;
        }
        self.generation += 1;
        tracing::debug!(len = items.len(), initial_index, generation = self.generation, "viewer opened");
        self.state = Some(CarouselState::new(items, initial_index));
        true
    }

    pub fn close(&mut self) -> bool {
        self.state.take().is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn enable_transitions(&mut self, generation: u64) {
        if generation != self.generation {
            return;
        }
        if let Some(state) = self.state.as_mut() {
            state.allow_animated_transition = true;
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    pub fn items(&self) -> &[MediaItem] {
        self.state.as_ref().map(|s| s.items.as_slice()).unwrap_or(&[])
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.current_index)
    }

    pub fn drag_offset(&self) -> f32 {
        self.state.as_ref().map_or(0.0, |s| s.drag_offset)
    }

    pub fn is_dragging(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.is_dragging)
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width.max(0.0);
    }

    fn stride(&self) -> f32 {
        self.viewport_width + self.config.page_gap
    }

    pub fn go_to_previous(&mut self) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if state.is_dragging {
            return false;
        }
        let len = state.items.len();
        let index = if state.current_index == 0 { len - 1 } else { state.current_index - 1 };
        state.allow_animated_transition = true;
        state.drag_offset = 0.0;
        state.pending_settle = false;
        state.set_index(index);
        true
    }

    pub fn go_to_next(&mut self) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if state.is_dragging {
            return false;
        }
        let index = (state.current_index + 1) % state.items.len();
        state.allow_animated_transition = true;
        state.drag_offset = 0.0;
        state.pending_settle = false;
        state.set_index(index);
        true
    }

    pub fn handle_key(&mut self, key: ViewerKey) -> KeyResponse {
        if !self.is_open() {
            return KeyResponse::Ignored;
        }
        let navigated = match key {
            ViewerKey::Escape => return KeyResponse::Close,
            ViewerKey::ArrowLeft => self.go_to_previous(),
            ViewerKey::ArrowRight => self.go_to_next(),
        };
        if navigated {
            KeyResponse::Navigated
        } else {
            KeyResponse::Ignored
        }
    }

    pub fn touch_start(&mut self, x: f32, at: Instant) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.drag_offset = 0.0;
        state.pending_settle = false;
        state.is_dragging = true;
        state.gesture.begin(x, at);
    }

    pub fn touch_move(&mut self, x: f32, at: Instant) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if !state.is_dragging {
            return;
        }
        if let Some(offset) = state.gesture.track(x, at) {
            state.drag_offset = offset;
        }
    }

    pub fn touch_end(&mut self) -> SwipeOutcome {
        let stride = self.stride();
        let viewport_width = self.viewport_width;
        let config = self.config;
        let Some(state) = self.state.as_mut() else {
            return SwipeOutcome::Ignored;
        };
        if !state.is_dragging {
            return SwipeOutcome::Ignored;
        }

        let offset = state.drag_offset;
        let velocity = state.gesture.velocity();
        let last = state.items.len() - 1;

        let target = if gesture::should_commit(offset, viewport_width, velocity, &config) {
            if offset < 0.0 && state.current_index < last {
                Some((state.current_index + 1, stride + offset))
            } else if offset > 0.0 && state.current_index > 0 {
                Some((state.current_index - 1, -stride + offset))
            } else {
                None
            }
        } else {
            None
        };

        state.end_gesture();
        match target {
            Some((index, seeded)) => {
                tracing::debug!(from = state.current_index, to = index, velocity, "swipe committed");
                state.set_index(index);
                state.drag_offset = seeded;
                state.pending_settle = true;
                SwipeOutcome::Committed(index)
            }
            None => {
                state.drag_offset = 0.0;
                SwipeOutcome::Cancelled
            }
        }
    }

    /// The touch was taken away (system gesture, window lost focus)
    pub fn touch_cancel(&mut self) {
        if let Some(state) = self.state.as_mut() {
            if state.is_dragging {
                state.drag_offset = 0.0;
                state.end_gesture();
            }
        }
    }

    /// Let a seeded offset ease back to zero. Returns true if anything changed.
    pub fn animation_frame(&mut self) -> bool {
        match self.state.as_mut() {
            Some(state) if state.pending_settle => {
                state.pending_settle = false;
                state.drag_offset = 0.0;
                true
            }
            _ => false,
        }
    }

    pub fn needs_frame(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.pending_settle)
    }

    /// Horizontal translation of the page strip
    pub fn transform(&self) -> f32 {
        let Some(state) = self.state.as_ref() else {
            return 0.0;
        };
        -(state.current_index as f32 * self.stride()) + state.drag_offset
    }

    /// Whether changes of the transform should ease rather than jump
    pub fn animates(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.allow_animated_transition && !s.is_dragging)
    }

    /// "i / N", only for more than one item
    pub fn counter_label(&self) -> Option<String> {
        let state = self.state.as_ref()?;
        (state.items.len() > 1).then(|| format!("{} / {}", state.current_index + 1, state.items.len()))
    }

    /// Playback state of the item at `index`; `None` for photos
    pub fn playback(&self, index: usize) -> Option<Playback> {
        self.state.as_ref()?.playback.get(index).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const WIDTH: f32 = 400.0;

    fn photos(n: usize) -> Vec<MediaItem> {
        (0..n).map(|i| MediaItem::image(format!("/media/{}.jpg", i))).collect()
    }

    fn viewer_with(items: Vec<MediaItem>, index: usize) -> MediaViewer {
        let mut viewer = MediaViewer::new(ViewerConfig::default());
        viewer.set_viewport_width(WIDTH);
        assert!(viewer.open(items, index));
        viewer.enable_transitions(viewer.generation());
        viewer
    }

    /// Drag from `from` to `to` over `ms` milliseconds and release
    fn swipe(viewer: &mut MediaViewer, from: f32, to: f32, ms: u64) -> SwipeOutcome {
        let t0 = Instant::now();
        viewer.touch_start(from, t0);
        viewer.touch_move((from + to) / 2.0, t0 + Duration::from_millis(ms / 2));
        viewer.touch_move(to, t0 + Duration::from_millis(ms));
        viewer.touch_end()
    }

    #[test]
    fn test_wrap_around_navigation() {
        for len in 1..6 {
            let mut viewer = viewer_with(photos(len), len - 1);
            viewer.go_to_next();
            assert_eq!(viewer.current_index(), Some(0));
            viewer.go_to_previous();
            assert_eq!(viewer.current_index(), Some(len - 1));
        }
    }

    #[test]
    fn test_navigation_ignored_while_dragging() {
        let mut viewer = viewer_with(photos(3), 1);
        viewer.touch_start(200.0, Instant::now());
        assert!(!viewer.go_to_next());
        assert!(!viewer.go_to_previous());
        assert_eq!(viewer.handle_key(ViewerKey::ArrowRight), KeyResponse::Ignored);
        assert_eq!(viewer.current_index(), Some(1));
    }

    #[test]
    fn test_distance_commit_is_strict() {
        // Slow drags so momentum never kicks in
        let mut viewer = viewer_with(photos(3), 1);
        assert_eq!(swipe(&mut viewer, 50.0, 250.0, 1000), SwipeOutcome::Cancelled);
        assert_eq!(viewer.current_index(), Some(1));
        assert_eq!(viewer.drag_offset(), 0.0);

        assert_eq!(swipe(&mut viewer, 50.0, 251.0, 1000), SwipeOutcome::Committed(0));
        assert_eq!(viewer.current_index(), Some(0));
    }

    #[test]
    fn test_fast_flick_commits() {
        let mut viewer = viewer_with(photos(3), 0);
        assert_eq!(swipe(&mut viewer, 300.0, 260.0, 50), SwipeOutcome::Committed(1));
    }

    #[test]
    fn test_slow_short_drag_cancels() {
        let mut viewer = viewer_with(photos(3), 0);
        assert_eq!(swipe(&mut viewer, 300.0, 260.0, 400), SwipeOutcome::Cancelled);
        assert_eq!(viewer.current_index(), Some(0));
    }

    #[test]
    fn test_swipe_past_boundaries_cancels() {
        let mut viewer = viewer_with(photos(3), 0);
        assert_eq!(swipe(&mut viewer, 50.0, 350.0, 100), SwipeOutcome::Cancelled);
        assert_eq!(viewer.current_index(), Some(0));
        assert_eq!(viewer.drag_offset(), 0.0);
        assert!(!viewer.is_dragging());

        let mut viewer = viewer_with(photos(3), 2);
        assert_eq!(swipe(&mut viewer, 350.0, 50.0, 100), SwipeOutcome::Cancelled);
        assert_eq!(viewer.current_index(), Some(2));
    }

    #[test]
    fn test_commit_keeps_strip_in_place() {
        let mut viewer = viewer_with(photos(4), 1);
        let t0 = Instant::now();
        viewer.touch_start(380.0, t0);
        viewer.touch_move(130.0, t0 + Duration::from_millis(600));
        let before = viewer.transform();
        assert_eq!(before, -(WIDTH + 16.0) - 250.0);

        assert_eq!(viewer.touch_end(), SwipeOutcome::Committed(2));
        assert_eq!(viewer.drag_offset(), (WIDTH + 16.0) - 250.0);
        assert!((viewer.transform() - before).abs() < 1e-3);
        assert!(viewer.needs_frame());

        assert!(viewer.animation_frame());
        assert_eq!(viewer.drag_offset(), 0.0);
        assert_eq!(viewer.transform(), -2.0 * (WIDTH + 16.0));
        assert!(!viewer.animation_frame());
    }

    #[test]
    fn test_rightward_commit_seeds_negative_offset() {
        let mut viewer = viewer_with(photos(4), 2);
        let before = {
            let t0 = Instant::now();
            viewer.touch_start(20.0, t0);
            viewer.touch_move(300.0, t0 + Duration::from_millis(700));
            viewer.transform()
        };
        assert_eq!(viewer.touch_end(), SwipeOutcome::Committed(1));
        assert_eq!(viewer.drag_offset(), -(WIDTH + 16.0) + 280.0);
        assert!((viewer.transform() - before).abs() < 1e-3);
    }

    #[test]
    fn test_videos_pause_off_screen() {
        let items = vec![
            MediaItem::video("/media/a.mp4", None),
            MediaItem::image("/media/b.jpg"),
            MediaItem::video("/media/c.mp4", Some("/media/c.jpg".into())),
        ];
        let mut viewer = viewer_with(items, 0);
        assert_eq!(viewer.playback(0), Some(Playback::Playing));
        assert_eq!(viewer.playback(1), None);
        assert_eq!(viewer.playback(2), Some(Playback::Paused));

        viewer.go_to_previous();
        assert_eq!(viewer.playback(0), Some(Playback::Paused));
        assert_eq!(viewer.playback(2), Some(Playback::Playing));

        assert_eq!(swipe(&mut viewer, 20.0, 350.0, 200), SwipeOutcome::Committed(1));
        assert_eq!(viewer.playback(0), Some(Playback::Paused));
        assert_eq!(viewer.playback(2), Some(Playback::Paused));
    }

    #[test]
    fn test_counter_only_for_multiple_items() {
        let viewer = viewer_with(photos(1), 0);
        assert_eq!(viewer.counter_label(), None);

        let viewer = viewer_with(photos(5), 2);
        assert_eq!(viewer.counter_label().as_deref(), Some("3 / 5"));
    }

    #[test]
    fn test_five_items_swipe_left_from_middle() {
        let mut viewer = viewer_with(photos(5), 2);
        assert_eq!(swipe(&mut viewer, 350.0, 50.0, 400), SwipeOutcome::Committed(3));
        assert_eq!(viewer.counter_label().as_deref(), Some("4 / 5"));
    }

    #[test]
    fn test_open_declines_bad_input() {
        let mut viewer = MediaViewer::new(ViewerConfig::default());
        assert!(!viewer.open(Vec::new(), 0));
        assert!(!viewer.open(photos(2), 2));
        assert!(!viewer.is_open());
        assert_eq!(viewer.counter_label(), None);
        assert_eq!(viewer.handle_key(ViewerKey::Escape), KeyResponse::Ignored);
    }

    #[test]
    fn test_open_disables_transitions_until_enabled() {
        let mut viewer = MediaViewer::new(ViewerConfig::default());
        viewer.set_viewport_width(WIDTH);
        viewer.open(photos(3), 1);
        assert!(!viewer.animates());

        let stale = viewer.generation();
        viewer.open(photos(3), 2);
        viewer.enable_transitions(stale);
        assert!(!viewer.animates());

        viewer.enable_transitions(viewer.generation());
        assert!(viewer.animates());
    }

    #[test]
    fn test_reopen_resets_state() {
        let mut viewer = viewer_with(photos(3), 0);
        viewer.touch_start(100.0, Instant::now());
        viewer.touch_move(60.0, Instant::now());

        viewer.open(photos(3), 2);
        assert_eq!(viewer.current_index(), Some(2));
        assert_eq!(viewer.drag_offset(), 0.0);
        assert!(!viewer.is_dragging());
    }

    #[test]
    fn test_keyboard() {
        let mut viewer = viewer_with(photos(3), 0);
        assert_eq!(viewer.handle_key(ViewerKey::ArrowLeft), KeyResponse::Navigated);
        assert_eq!(viewer.current_index(), Some(2));
        assert_eq!(viewer.handle_key(ViewerKey::ArrowRight), KeyResponse::Navigated);
        assert_eq!(viewer.current_index(), Some(0));
        assert_eq!(viewer.handle_key(ViewerKey::Escape), KeyResponse::Close);
        assert!(viewer.close());
        assert!(!viewer.is_open());
    }

    #[test]
    fn test_drag_disables_easing() {
        let mut viewer = viewer_with(photos(3), 1);
        assert!(viewer.animates());
        viewer.touch_start(200.0, Instant::now());
        assert!(!viewer.animates());
        viewer.touch_cancel();
        assert!(viewer.animates());
        assert_eq!(viewer.drag_offset(), 0.0);
    }
}
