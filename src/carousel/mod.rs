/// Full-screen swipeable media carousel
///
/// Pure interaction state for the media viewer, kept free of any widget
/// types so it can be driven from tests:
/// - Media descriptors shared by photos and videos (media.rs)
/// - Touch sample tracking and commit thresholds (gesture.rs)
/// - Eased display offset between pages (transition.rs)
/// - The viewer state machine itself (viewer.rs)

pub mod gesture;
pub mod media;
pub mod transition;
pub mod viewer;

pub use media::{MediaItem, MediaKind, Playback};
pub use transition::Transition;
pub use viewer::{KeyResponse, MediaViewer, SwipeOutcome, ViewerKey};
