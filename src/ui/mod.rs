/// User interface components
///
/// - `gallery`: moments grid, chat list and chat thread screens
/// - `viewer`: the full-screen swipeable media viewer surface

pub mod gallery;
pub mod viewer;
