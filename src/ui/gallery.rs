use iced::widget::image::Handle;
use iced::widget::{button, column, container, image, row, scrollable, text, Column};
use iced::{Alignment, ContentFit, Element, Length};
use iced_aw::Wrap;
use std::collections::HashMap;

use crate::carousel::MediaKind;
use crate::state::data::{Chat, ChatMessage, MediaRecord, Moment};
use crate::Message;

const TILE_SIZE: f32 = 160.0;
const ATTACHMENT_SIZE: f32 = 96.0;

/// Bottom navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Moments,
    Chats,
}

/// A moment with its media, as shown in the grid
#[derive(Debug, Clone)]
pub struct MomentTile {
    pub moment: Moment,
    pub media: Vec<MediaRecord>,
}

/// An open chat with its messages and the sender names
#[derive(Debug, Clone)]
pub struct ChatThread {
    pub chat: Chat,
    pub messages: Vec<ChatMessage>,
    pub names: HashMap<i64, String>,
}

/// Wrap screen content in a scrollable unless scrolling is locked
fn scrolled<'a>(content: Column<'a, Message>, scroll_locked: bool) -> Element<'a, Message> {
    if scroll_locked {
        container(content).height(Length::Fill).into()
    } else {
        scrollable(content).height(Length::Fill).into()
    }
}

/// Square preview of a photo or video
fn thumbnail<'a>(record: &MediaRecord, size: f32) -> Element<'a, Message> {
    let poster = match &record.kind {
        MediaKind::Image => Some(record.url.as_str()),
        MediaKind::Video { thumbnail } => thumbnail.as_deref(),
    };

    match poster {
        Some(path) => image(Handle::from_path(path))
            .width(size)
            .height(size)
            .content_fit(ContentFit::Cover)
            .into(),
        None => container(text("▶").size(size / 4.0))
            .width(size)
            .height(size)
            .center_x(size)
            .center_y(size)
            .into(),
    }
}

pub fn moments_grid<'a>(tiles: &'a [MomentTile], scroll_locked: bool) -> Element<'a, Message> {
    if tiles.is_empty() {
        return container(text("No moments yet. Import a folder of photos to create one.").size(16))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into();
    }

    let cards: Vec<Element<'a, Message>> = tiles
        .iter()
        .map(|tile| {
            let cover = match tile.media.first() {
                Some(record) => thumbnail(record, TILE_SIZE),
                None => container(text("empty"))
                    .width(TILE_SIZE)
                    .height(TILE_SIZE)
                    .center_x(TILE_SIZE)
                    .center_y(TILE_SIZE)
                    .into(),
            };
            let card = column![
                cover,
                text(&tile.moment.caption).size(14),
                text(format!(
                    "{} · {} items",
                    tile.moment.created_at.format("%b %e, %Y"),
                    tile.moment.media_count
                ))
                .size(12),
            ]
            .spacing(4)
            .width(TILE_SIZE);

            button(card)
                .on_press(Message::OpenMoment(tile.moment.id))
                .padding(4)
                .into()
        })
        .collect();

    let grid = Wrap::with_elements(cards).spacing(12.0).line_spacing(12.0);
    scrolled(column![grid].padding(16), scroll_locked)
}

pub fn chat_list<'a>(chats: &'a [Chat], scroll_locked: bool) -> Element<'a, Message> {
    let mut list = column![button("New chat").on_press(Message::NewChat).padding(10)]
        .spacing(8)
        .padding(16);

    for chat in chats {
        list = list.push(
            button(
                column![
                    text(&chat.title).size(16),
                    text(format!("{} participants", chat.participants.len())).size(12),
                ]
                .spacing(2),
            )
            .on_press(Message::OpenChat(chat.id))
            .width(Length::Fill)
            .padding(10),
        );
    }

    scrolled(list, scroll_locked)
}

pub fn chat_thread<'a>(thread: &'a ChatThread, scroll_locked: bool) -> Element<'a, Message> {
    let header = row![
        button("‹ Back").on_press(Message::BackToChats).padding(8),
        text(&thread.chat.title).size(20),
        button("Attach photos").on_press(Message::AttachToChat).padding(8),
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    let mut list = column![header].spacing(12).padding(16);

    for message in &thread.messages {
        let sender = thread
            .names
            .get(&message.sender_id)
            .map(String::as_str)
            .unwrap_or("unknown");

        let mut entry = column![
            text(format!("{} · {}", sender, message.sent_at.format("%H:%M"))).size(12),
            text(&message.body).size(15),
        ]
        .spacing(4);

        if !message.attachments.is_empty() {
            let attachments = message.attachments.iter().enumerate().fold(
                row![].spacing(6),
                |row, (index, record)| {
                    row.push(
                        button(thumbnail(record, ATTACHMENT_SIZE))
                            .on_press(Message::OpenAttachment {
                                message_id: message.id,
                                index,
                            })
                            .padding(0),
                    )
                },
            );
            entry = entry.push(attachments);
        }

        list = list.push(entry);
    }

    scrolled(list, scroll_locked)
}

pub fn bottom_nav<'a>(active: Tab) -> Element<'a, Message> {
    let tab = |label: &'a str, tab: Tab| {
        let b = button(text(label).size(16)).padding(12).width(Length::Fill);
        if tab == active {
            b
        } else {
            b.on_press(Message::SelectTab(tab))
        }
    };

    row![tab("Moments", Tab::Moments), tab("Chats", Tab::Chats)]
        .spacing(8)
        .padding(8)
        .into()
}
