/// Layout context for the navigation chrome
///
/// Full-screen surfaces (the media viewer) hide the bottom navigation and
/// lock scrolling of the screen underneath. Both flags live here, in the
/// application state, and views read them when rendering.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chrome {
    pub bottom_nav_visible: bool,
    pub scroll_locked: bool,
}

impl Default for Chrome {
    fn default() -> Self {
        Self {
            bottom_nav_visible: true,
            scroll_locked: false,
        }
    }
}

/// Values in effect before a full-screen surface took over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the snapshot is needed to restore the chrome"]
pub struct ChromeSnapshot(Chrome);

impl Chrome {
    pub fn enter_fullscreen(&mut self) -> ChromeSnapshot {
        let snapshot = ChromeSnapshot(*self);
        self.bottom_nav_visible = false;
        self.scroll_locked = true;
        snapshot
    }

    pub fn restore(&mut self, snapshot: ChromeSnapshot) {
        *self = snapshot.0;
    }
}
