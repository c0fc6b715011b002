use iced::alignment::{Horizontal, Vertical};
use iced::mouse::{self, Cursor};
use iced::touch;
use iced::widget::canvas::{self, Program};
use iced::widget::image::Handle;
use iced::widget::{button, canvas as canvas_widget, column, container, horizontal_space, row, stack, text, vertical_space};
use iced::{Color, Element, Length, Pixels, Point, Rectangle, Renderer, Size, Theme};
use std::time::Instant;

use crate::carousel::{MediaItem, MediaKind, MediaViewer, Playback, ViewerKey};
use crate::Message;

/// Events produced by the viewer surface and its controls
#[derive(Debug, Clone)]
pub enum ViewerMessage {
    /// A finger (or the left mouse button) went down at `x`
    Pressed { x: f32, width: f32 },
    Moved { x: f32 },
    Released,
    /// The pointer was taken away mid-gesture
    Lost,
    Previous,
    Next,
    Close,
    Key(ViewerKey),
    /// Delay after opening elapsed for the given open generation
    TransitionsReady(u64),
    Frame(Instant),
}

/// Pre-built image handles for the open items, indexed like the items.
/// Videos carry their poster frame, if any.
pub fn handles_for(items: &[MediaItem]) -> Vec<Option<Handle>> {
    items
        .iter()
        .map(|item| match &item.kind {
            MediaKind::Image => Some(Handle::from_path(&item.url)),
            MediaKind::Video { thumbnail } => thumbnail.as_ref().map(Handle::from_path),
        })
        .collect()
}

/// Canvas drawing the horizontally-paged strip and turning touch and
/// mouse drags into viewer messages
pub struct ViewerCanvas<'a> {
    pub viewer: &'a MediaViewer,
    pub handles: &'a [Option<Handle>],
    /// Displayed (eased) strip translation
    pub offset: f32,
}

impl<'a> ViewerCanvas<'a> {
    fn draw_page(&self, frame: &mut canvas::Frame, index: usize, item: &MediaItem, page: Rectangle) {
        let handle = self.handles.get(index).and_then(Option::as_ref);

        match &item.kind {
            MediaKind::Image => {
                if let Some(handle) = handle {
                    frame.draw_image(fit(page, item.size), handle);
                }
            }
            MediaKind::Video { .. } => {
                match handle {
                    Some(handle) => frame.draw_image(fit(page, item.size), handle),
                    None => frame.fill_rectangle(page.position(), page.size(), Color::from_rgb(0.12, 0.12, 0.12)),
                }

                let glyph = match self.viewer.playback(index) {
                    Some(Playback::Playing) => "❚❚",
                    _ => "▶",
                };
                frame.fill_text(canvas::Text {
                    content: glyph.to_string(),
                    position: page.center(),
                    color: Color::from_rgba(1.0, 1.0, 1.0, 0.85),
                    size: Pixels(56.0),
                    horizontal_alignment: Horizontal::Center,
                    vertical_alignment: Vertical::Center,
                    ..canvas::Text::default()
                });
            }
        }
    }
}

impl<'a> Program<Message> for ViewerCanvas<'a> {
    type State = PointerState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::BLACK);

        let width = bounds.width;
        let stride = width + self.viewer.config().page_gap;

        // Only pages that intersect the viewport are drawn
        for (i, item) in self.viewer.items().iter().enumerate() {
            let x = i as f32 * stride + self.offset;
            if x + width <= 0.0 || x >= width {
                continue;
            }
            let page = Rectangle::new(Point::new(x, 0.0), bounds.size());
            self.draw_page(&mut frame, i, item, page);
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        let width = bounds.width;
        let captured = |message: ViewerMessage| (canvas::event::Status::Captured, Some(Message::Viewer(message)));

        match event {
            canvas::Event::Touch(touch::Event::FingerPressed { id, position })
                if state.finger.is_none() && !state.mouse_down && bounds.contains(position) =>
            {
                state.finger = Some(id);
                return captured(ViewerMessage::Pressed {
                    x: position.x - bounds.x,
                    width,
                });
            }
            canvas::Event::Touch(touch::Event::FingerMoved { id, position }) if state.finger == Some(id) => {
                return captured(ViewerMessage::Moved {
                    x: position.x - bounds.x,
                });
            }
            canvas::Event::Touch(touch::Event::FingerLifted { id, .. }) if state.finger == Some(id) => {
                state.finger = None;
                return captured(ViewerMessage::Released);
            }
            canvas::Event::Touch(touch::Event::FingerLost { id, .. }) if state.finger == Some(id) => {
                state.finger = None;
                return captured(ViewerMessage::Lost);
            }

            // Mouse drags behave like a single finger
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) if state.finger.is_none() => {
                if let Some(pos) = cursor.position_in(bounds) {
                    state.mouse_down = true;
                    return captured(ViewerMessage::Pressed { x: pos.x, width });
                }
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) if state.mouse_down => {
                return captured(ViewerMessage::Moved {
                    x: position.x - bounds.x,
                });
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) if state.mouse_down => {
                state.mouse_down = false;
                return captured(ViewerMessage::Released);
            }
            canvas::Event::Mouse(mouse::Event::CursorLeft) if state.mouse_down => {
                state.mouse_down = false;
                return captured(ViewerMessage::Lost);
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }
}

/// Which pointer currently drives the gesture
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    pub finger: Option<touch::Finger>,
    pub mouse_down: bool,
}

/// Largest rectangle with the media's aspect ratio centered in `page`
fn fit(page: Rectangle, size: Option<(u32, u32)>) -> Rectangle {
    let Some((w, h)) = size.filter(|(w, h)| *w > 0 && *h > 0) else {
        return page;
    };
    let scale = (page.width / w as f32).min(page.height / h as f32);
    let fitted = Size::new(w as f32 * scale, h as f32 * scale);
    Rectangle::new(
        Point::new(
            page.x + (page.width - fitted.width) / 2.0,
            page.y + (page.height - fitted.height) / 2.0,
        ),
        fitted,
    )
}

/// Full-screen viewer: the paged canvas with close/prev/next controls and
/// the "i / N" counter on top
pub fn view<'a>(viewer: &'a MediaViewer, handles: &'a [Option<Handle>], offset: f32) -> Element<'a, Message> {
    let surface = canvas_widget(ViewerCanvas {
        viewer,
        handles,
        offset,
    })
    .width(Length::Fill)
    .height(Length::Fill);

    let counter = match viewer.counter_label() {
        Some(label) => text(label).size(16).color(Color::WHITE),
        None => text(""),
    };

    let top = row![
        counter,
        horizontal_space(),
        button(text("✕").size(20)).on_press(Message::Viewer(ViewerMessage::Close)).padding(8),
    ]
    .padding(16);

    let mut controls = column![top, vertical_space()];
    if viewer.items().len() > 1 {
        controls = controls.push(
            row![
                button(text("‹").size(28)).on_press(Message::Viewer(ViewerMessage::Previous)).padding(8),
                horizontal_space(),
                button(text("›").size(28)).on_press(Message::Viewer(ViewerMessage::Next)).padding(8),
            ]
            .padding(16),
        );
    }

    container(stack![surface, controls])
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_letterboxes_wide_media() {
        let page = Rectangle::new(Point::new(416.0, 0.0), Size::new(400.0, 800.0));
        let fitted = fit(page, Some((1600, 800)));
        assert_eq!(fitted.size(), Size::new(400.0, 200.0));
        assert_eq!(fitted.position(), Point::new(416.0, 300.0));
    }

    #[test]
    fn test_fit_without_size_fills_page() {
        let page = Rectangle::new(Point::ORIGIN, Size::new(400.0, 800.0));
        assert_eq!(fit(page, None), page);
        assert_eq!(fit(page, Some((0, 10))), page);
    }

    #[test]
    fn test_handles_follow_item_kinds() {
        let items = vec![
            MediaItem::image("/m/a.jpg"),
            MediaItem::video("/m/b.mp4", None),
            MediaItem::video("/m/c.mp4", Some("/m/c.jpg".into())),
        ];
        let handles = handles_for(&items);
        assert!(handles[0].is_some());
        assert!(handles[1].is_none());
        assert!(handles[2].is_some());
    }
}
