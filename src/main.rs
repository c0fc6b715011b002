use iced::keyboard::{self, key};
use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, stack, text};
use iced::{time, window, Alignment, Element, Length, Subscription, Task, Theme};
use rfd::FileDialog;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

mod carousel;
mod config;
mod error;
mod state;
mod ui;
mod upload;

use carousel::{KeyResponse, MediaItem, MediaViewer, SwipeOutcome, Transition, ViewerKey};
use config::AppConfig;
use state::chrome::{Chrome, ChromeSnapshot};
use state::data::{MediaOwner, Profile};
use state::library::Library;
use state::repository::MomentsRepository;
use ui::gallery::{ChatThread, MomentTile, Tab};
use ui::viewer::ViewerMessage;
use upload::{LocalStore, MediaStore, UploadReport};

/// Where a finished upload batch should be attached
#[derive(Debug, Clone)]
pub enum UploadTarget {
    NewMoment { caption: String },
    Chat(i64),
}

/// Main application state
struct Moments {
    config: AppConfig,
    /// Data access; screens never see the concrete catalog
    repo: Box<dyn MomentsRepository>,
    store: Arc<dyn MediaStore + Send + Sync>,
    /// The local user
    me: Profile,
    tab: Tab,
    chrome: Chrome,
    moments: Vec<MomentTile>,
    chats: Vec<state::data::Chat>,
    thread: Option<ChatThread>,
    viewer: MediaViewer,
    /// Chrome to put back when the viewer closes
    viewer_chrome: Option<ChromeSnapshot>,
    handles: Vec<Option<Handle>>,
    transition: Transition,
    window_width: f32,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    SelectTab(Tab),
    OpenMoment(i64),
    OpenChat(i64),
    BackToChats,
    NewChat,
    OpenAttachment { message_id: i64, index: usize },
    /// User clicked the "Import Folder" button
    ImportFolder,
    AttachToChat,
    /// Background upload finished
    UploadComplete(UploadTarget, Result<UploadReport, String>),
    WindowResized(f32),
    Viewer(ViewerMessage),
}

impl Moments {
    fn new(
        config: AppConfig,
        repo: Box<dyn MomentsRepository>,
        store: Arc<dyn MediaStore + Send + Sync>,
        me: Profile,
    ) -> (Self, Task<Message>) {
        let viewer = MediaViewer::new(config.viewer);
        let transition = Transition::new(Duration::from_millis(config.viewer.transition_ms));

        let mut app = Moments {
            config,
            repo,
            store,
            me,
            tab: Tab::Moments,
            chrome: Chrome::default(),
            moments: Vec::new(),
            chats: Vec::new(),
            thread: None,
            viewer,
            viewer_chrome: None,
            handles: Vec::new(),
            transition,
            window_width: 0.0,
            status: String::new(),
        };
        app.reload_moments();
        app.reload_chats();
        tracing::info!(moments = app.moments.len(), chats = app.chats.len(), "moments started");
        app.status = format!("Ready. {} moments.", app.moments.len());

        // The viewer needs the viewport width before the first touch arrives
        let size = window::get_latest()
            .and_then(window::get_size)
            .map(|size| Message::WindowResized(size.width));

        (app, size)
    }

    fn reload_moments(&mut self) {
        let result = self.repo.list_moments().and_then(|moments| {
            moments
                .into_iter()
                .map(|moment| {
                    let media = self.repo.get_media(MediaOwner::Moment(moment.id))?;
                    Ok(MomentTile { moment, media })
                })
                .collect::<error::Result<Vec<_>>>()
        });
        match result {
            Ok(tiles) => self.moments = tiles,
            Err(e) => self.report_error("loading moments", &e),
        }
    }

    fn reload_chats(&mut self) {
        match self.repo.list_chats() {
            Ok(chats) => self.chats = chats,
            Err(e) => self.report_error("loading chats", &e),
        }
    }

    fn load_thread(&mut self, chat_id: i64) {
        let result = self.repo.get_chat(chat_id).and_then(|chat| {
            let messages = self.repo.list_messages(chat_id)?;
            let mut names = HashMap::new();
            for id in chat.participants.iter().chain(messages.iter().map(|m| &m.sender_id)) {
                if !names.contains_key(id) {
                    names.insert(*id, self.repo.get_profile(*id)?.display_name);
                }
            }
            Ok(ChatThread { chat, messages, names })
        });
        match result {
            Ok(thread) => self.thread = Some(thread),
            Err(e) => self.report_error("opening chat", &e),
        }
    }

    fn report_error(&mut self, action: &str, error: &error::Error) {
        tracing::error!(action, %error, "request failed");
        self.status = format!("❌ Failed {}: {}", action, error);
    }

    /// Show `items` full screen, hiding the navigation chrome underneath
    fn open_viewer(&mut self, items: Vec<MediaItem>, index: usize) -> Task<Message> {
        let handles = ui::viewer::handles_for(&items);
        if !self.viewer.open(items, index) {
            self.close_viewer();
            return Task::none();
        }
        self.handles = handles;
        self.viewer.set_viewport_width(self.window_width);
        self.transition.retarget(self.viewer.transform(), false, Instant::now());
        if self.viewer_chrome.is_none() {
            self.viewer_chrome = Some(self.chrome.enter_fullscreen());
        }

        let generation = self.viewer.generation();
        let delay = Duration::from_millis(self.config.viewer.enable_delay_ms);
        Task::perform(async move { tokio::time::sleep(delay).await }, move |_| {
            Message::Viewer(ViewerMessage::TransitionsReady(generation))
        })
    }

    fn close_viewer(&mut self) {
        self.viewer.close();
        self.handles.clear();
        if let Some(snapshot) = self.viewer_chrome.take() {
            self.chrome.restore(snapshot);
        }
    }

    /// Point the displayed offset at the viewer's current transform
    fn sync_transition(&mut self, now: Instant) {
        self.transition
            .retarget(self.viewer.transform(), self.viewer.animates(), now);
    }

    fn resize_viewer(&mut self, width: f32, now: Instant) {
        if (width - self.viewer.viewport_width()).abs() > f32::EPSILON {
            self.viewer.set_viewport_width(width);
            self.transition.retarget(self.viewer.transform(), false, now);
        }
    }

    fn update_viewer(&mut self, message: ViewerMessage) -> Task<Message> {
        let mut now = Instant::now();
        match message {
            ViewerMessage::Pressed { x, width } => {
                self.resize_viewer(width, now);
                self.viewer.touch_start(x, now);
            }
            ViewerMessage::Moved { x } => self.viewer.touch_move(x, now),
            ViewerMessage::Released => {
                let offset = self.viewer.drag_offset();
                match self.viewer.touch_end() {
                    SwipeOutcome::Committed(index) => tracing::debug!(index, offset, "swipe committed"),
                    SwipeOutcome::Cancelled => {
                        tracing::debug!(index = ?self.viewer.current_index(), offset, "swipe snapped back")
                    }
                    SwipeOutcome::Ignored => {}
                }
            }
            ViewerMessage::Lost => {
                if self.viewer.is_dragging() {
                    tracing::debug!(index = ?self.viewer.current_index(), "swipe cancelled");
                }
                self.viewer.touch_cancel();
            }
            ViewerMessage::Previous => {
                self.viewer.go_to_previous();
            }
            ViewerMessage::Next => {
                self.viewer.go_to_next();
            }
            ViewerMessage::Close => {
                self.close_viewer();
                return Task::none();
            }
            ViewerMessage::Key(key) => {
                if self.viewer.handle_key(key) == KeyResponse::Close {
                    self.close_viewer();
                    return Task::none();
                }
            }
            ViewerMessage::TransitionsReady(generation) => self.viewer.enable_transitions(generation),
            ViewerMessage::Frame(at) => {
                now = at;
                self.viewer.animation_frame();
            }
        }
        self.sync_transition(now);
        Task::none()
    }

    /// Upload `paths` in the background and attach the result to `target`
    fn start_upload(&mut self, paths: Vec<PathBuf>, target: UploadTarget) -> Task<Message> {
        if paths.is_empty() {
            self.status = "No photos or videos found.".to_string();
            return Task::none();
        }
        self.status = format!("Uploading {} files...", paths.len());

        let store = Arc::clone(&self.store);
        let upload_config = self.config.upload;
        Task::perform(
            upload::upload_files_async(store, paths, upload_config),
            move |result| Message::UploadComplete(target.clone(), result.map_err(|e| e.to_string())),
        )
    }

    fn finish_upload(&mut self, target: UploadTarget, report: UploadReport) -> error::Result<()> {
        let media: Vec<_> = report.uploaded.into_iter().map(|u| u.media).collect();

        if media.is_empty() {
            tracing::warn!(failed = report.failed.len(), "nothing uploaded, skipping save");
            self.status = match report.failed.first() {
                Some((_, reason)) => format!("❌ All {} uploads failed ({}).", report.failed.len(), reason),
                None => "No photos or videos found.".to_string(),
            };
            return Ok(());
        }

        match target {
            UploadTarget::NewMoment { caption } => {
                self.repo.create_moment(self.me.id, &caption, &media)?;
                self.reload_moments();
            }
            UploadTarget::Chat(chat_id) => {
                let body = format!("Shared {} items", media.len());
                self.repo.send_message(chat_id, self.me.id, &body, &media)?;
                self.load_thread(chat_id);
            }
        }

        self.status = if report.failed.is_empty() {
            format!("✅ Uploaded {} items.", media.len())
        } else {
            format!(
                "⚠️ Uploaded {} items, {} failed ({}).",
                media.len(),
                report.failed.len(),
                report.failed[0].1
            )
        };
        Ok(())
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SelectTab(tab) => {
                self.tab = tab;
                match tab {
                    Tab::Moments => self.reload_moments(),
                    Tab::Chats => self.reload_chats(),
                }
                Task::none()
            }
            Message::OpenMoment(id) => match self
                .repo
                .get_moment(id)
                .and_then(|moment| {
                    self.repo
                        .get_media(MediaOwner::Moment(id))
                        .map(|media| (moment, media))
                })
            {
                Ok((moment, media)) => {
                    self.status = format!("{} · {} items", moment.caption, moment.media_count);
                    self.open_viewer(media.iter().map(MediaItem::from).collect(), 0)
                }
                Err(e) => {
                    self.report_error("opening moment", &e);
                    Task::none()
                }
            },
            Message::OpenChat(id) => {
                self.load_thread(id);
                Task::none()
            }
            Message::BackToChats => {
                self.thread = None;
                self.reload_chats();
                Task::none()
            }
            Message::NewChat => {
                let title = format!("Chat {}", chrono::Local::now().format("%b %e %H:%M"));
                let created = self
                    .repo
                    .create_chat(&title)
                    .and_then(|id| self.repo.add_participants(id, &[self.me.id]).map(|_| id));
                match created {
                    Ok(id) => {
                        self.reload_chats();
                        self.load_thread(id);
                    }
                    Err(e) => self.report_error("creating chat", &e),
                }
                Task::none()
            }
            Message::OpenAttachment { message_id, index } => {
                let items = self.thread.as_ref().and_then(|thread| {
                    thread
                        .messages
                        .iter()
                        .find(|m| m.id == message_id)
                        .map(|m| m.attachments.iter().map(MediaItem::from).collect::<Vec<_>>())
                });
                match items {
                    Some(items) => self.open_viewer(items, index),
                    None => Task::none(),
                }
            }
            Message::ImportFolder => {
                // Show the native folder picker dialog
                let folder = FileDialog::new()
                    .set_title("Select Folder with Photos")
                    .pick_folder();

                match folder {
                    Some(folder) => {
                        let caption = folder
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_else(|| "New moment".to_string());
                        let paths = collect_media(&folder);
                        self.start_upload(paths, UploadTarget::NewMoment { caption })
                    }
                    None => Task::none(),
                }
            }
            Message::AttachToChat => {
                let Some(chat_id) = self.thread.as_ref().map(|t| t.chat.id) else {
                    return Task::none();
                };
                let files = FileDialog::new()
                    .set_title("Attach Photos")
                    .add_filter("media", &["jpg", "jpeg", "png", "webp", "gif", "bmp", "mp4", "mov", "m4v", "webm"])
                    .pick_files();

                match files {
                    Some(paths) => self.start_upload(paths, UploadTarget::Chat(chat_id)),
                    None => Task::none(),
                }
            }
            Message::UploadComplete(target, Ok(report)) => {
                if let Err(e) = self.finish_upload(target, report) {
                    self.report_error("saving upload", &e);
                }
                Task::none()
            }
            Message::UploadComplete(_, Err(reason)) => {
                tracing::error!(%reason, "upload batch failed");
                self.status = format!("❌ Upload failed: {}", reason);
                Task::none()
            }
            Message::WindowResized(width) => {
                self.window_width = width;
                self.resize_viewer(width, Instant::now());
                Task::none()
            }
            Message::Viewer(message) => self.update_viewer(message),
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let locked = self.chrome.scroll_locked;
        let screen = match (self.tab, &self.thread) {
            (Tab::Moments, _) => ui::gallery::moments_grid(&self.moments, locked),
            (Tab::Chats, Some(thread)) => ui::gallery::chat_thread(thread, locked),
            (Tab::Chats, None) => ui::gallery::chat_list(&self.chats, locked),
        };

        let header = row![
            text("Moments").size(28),
            iced::widget::horizontal_space(),
            button("Import Folder").on_press(Message::ImportFolder).padding(10),
        ]
        .align_y(Alignment::Center)
        .padding(16);

        let mut content = column![header, screen, text(&self.status).size(14)]
            .spacing(8)
            .height(Length::Fill);
        if self.chrome.bottom_nav_visible {
            content = content.push(ui::gallery::bottom_nav(self.tab));
        }

        let base = container(content).width(Length::Fill).height(Length::Fill);

        if self.viewer.is_open() {
            let offset = self.transition.value(Instant::now());
            stack![base, ui::viewer::view(&self.viewer, &self.handles, offset)].into()
        } else {
            base.into()
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![window::resize_events().map(|(_id, size)| Message::WindowResized(size.width))];

        if self.viewer.is_open() {
            subscriptions.push(keyboard::on_key_press(viewer_key));

            if self.viewer.needs_frame() || self.transition.is_animating(Instant::now()) {
                subscriptions.push(
                    time::every(Duration::from_millis(16)).map(|at| Message::Viewer(ViewerMessage::Frame(at))),
                );
            }
        }

        Subscription::batch(subscriptions)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn viewer_key(key: keyboard::Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    let key = match key.as_ref() {
        keyboard::Key::Named(key::Named::Escape) => ViewerKey::Escape,
        keyboard::Key::Named(key::Named::ArrowLeft) => ViewerKey::ArrowLeft,
        keyboard::Key::Named(key::Named::ArrowRight) => ViewerKey::ArrowRight,
        _ => return None,
    };
    Some(Message::Viewer(ViewerMessage::Key(key)))
}

/// All photos and videos under `folder`, in path order
fn collect_media(folder: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| upload::compress::detect_kind(p).is_ok())
        .collect();
    paths.sort();

    tracing::info!(folder = %folder.display(), files = paths.len(), "scanned folder");
    paths
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_logging(&config);

    let library = Library::new()?;
    let user = std::env::var("USER").unwrap_or_else(|_| "me".to_string());
    let me = library.upsert_profile(&user, None)?;
    let store = LocalStore::in_cache_dir()?;

    iced::application("Moments", Moments::update, Moments::view)
        .subscription(Moments::subscription)
        .theme(Moments::theme)
        .centered()
        .run_with(move || Moments::new(config, Box::new(library), Arc::new(store), me))?;

    Ok(())
}
