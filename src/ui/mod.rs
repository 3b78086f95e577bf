/// Viewer window
///
/// This module handles:
/// - The iced application: state, messages, update and layout (this file)
/// - The zoomable, pannable main image canvas (canvas.rs)
/// - Background decoding of the current image (preview.rs)
/// - The thumbnail strip and its in-memory cache (thumbnails.rs)

pub mod canvas;
pub mod preview;
pub mod thumbnails;

use iced::keyboard::{self, key::Named, Key};
use iced::widget::{
    button, canvas as canvas_widget, checkbox, column, container, horizontal_space, radio, row,
    slider, text, text_input, Column,
};
use iced::{
    event, window, Alignment, Color, Element, Event, Font, Length, Size, Subscription, Task, Theme,
};
use rfd::{MessageButtons, MessageDialog, MessageLevel};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::state::data::ImageRecord;
use crate::state::filter::{FilterState, MAX_RANK, MIN_RANK};
use crate::state::library::Library;
use crate::state::view::{DisplayMode, ViewTransform, MAX_ZOOM, MIN_ZOOM};
use canvas::{Content, ImageCanvas};
use preview::PreviewImage;
use thumbnails::{ThumbnailCache, Tile, THUMBNAIL_HEIGHT};

pub const WINDOW_TITLE: &str = "Image Analyzer and Viewer";
pub const WINDOW_SIZE: Size = Size {
    width: 1400.0,
    height: 900.0,
};
pub const MIN_WINDOW_SIZE: Size = Size {
    width: 900.0,
    height: 600.0,
};

const LEFT_PANEL_WIDTH: f32 = 320.0;
const FILE_COLOR: Color = Color::from_rgb(0.165, 0.38, 0.757);

/// Open the viewer window and block until it is closed
pub fn run(records: Vec<ImageRecord>) -> iced::Result {
    iced::application(WINDOW_TITLE, Viewer::update, Viewer::view)
        .theme(Viewer::theme)
        .subscription(Viewer::subscription)
        .window(window::Settings {
            size: WINDOW_SIZE,
            min_size: Some(MIN_WINDOW_SIZE),
            ..window::Settings::default()
        })
        .centered()
        .run_with(move || Viewer::new(records))
}

/// What the main canvas should show for the current record
#[derive(Debug, Clone)]
enum Preview {
    /// Nothing passes the filters
    Empty,
    /// The record's file could not be found; holds the CSV filename
    Missing(String),
    Loading,
    Ready(PreviewImage),
    Failed(String),
}

impl Preview {
    /// Text drawn in place of an image, if any
    fn message(&self) -> Option<String> {
        match self {
            Preview::Empty => Some("No images match current filters".to_string()),
            Preview::Missing(filename) => Some(format!("Image not found: {}", filename)),
            Preview::Failed(reason) => Some(format!("Error loading image:\n{}", reason)),
            Preview::Loading | Preview::Ready(_) => None,
        }
    }
}

/// Main application state
pub struct Viewer {
    library: Library,
    filter: FilterState,
    view: ViewTransform,
    thumbnails: ThumbnailCache,
    /// Resolved file of every visible record, in strip order
    strip_paths: Vec<Option<PathBuf>>,
    preview: Preview,
    /// Bumped on every image change; late decode results are dropped
    generation: u64,
    /// Last size reported by the canvas, for pan clamping outside drag events
    canvas_size: Size,
    fullscreen: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    KeywordsChanged(String),
    ClearFilters,
    PartialToggled(bool),
    MinRankChanged(u32),
    Previous,
    Next,
    /// User clicked a thumbnail
    GotoIndex(usize),
    ModeChanged(DisplayMode),
    ZoomChanged(u32),
    /// Wheel zoom step from the canvas, with the canvas size
    ZoomBy(i32, Size),
    /// Drag delta in pixels from the canvas, with the canvas size
    Pan(cgmath::Vector2<f32>, Size),
    ToggleFullscreen,
    ExitFullscreen,
    /// Decode finished for the given generation
    PreviewLoaded(u64, Result<PreviewImage, String>),
    CopyKeywords,
    /// Clipboard write done, tell the user
    KeywordsCopied,
    OpenExternally,
}

impl Viewer {
    /// Create the viewer over the loaded records, showing the first image
    pub fn new(records: Vec<ImageRecord>) -> (Self, Task<Message>) {
        info!("🖼️  Viewer starting with {} record(s)", records.len());

        let mut viewer = Viewer {
            library: Library::new(records),
            filter: FilterState::default(),
            view: ViewTransform::default(),
            thumbnails: ThumbnailCache::new(),
            strip_paths: Vec::new(),
            preview: Preview::Empty,
            generation: 0,
            canvas_size: Size::ZERO,
            fullscreen: false,
        };
        let task = viewer.refresh();
        (viewer, task)
    }

    /// Handle application messages and update state
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::KeywordsChanged(keywords) => {
                self.filter.keywords = keywords;
                self.refresh()
            }
            Message::ClearFilters => {
                self.filter.reset();
                self.refresh()
            }
            Message::PartialToggled(partial) => {
                self.filter.partial = partial;
                self.refresh()
            }
            Message::MinRankChanged(rank) => {
                self.filter.set_min_rank(rank);
                self.refresh()
            }
            Message::Previous => {
                if self.library.previous() {
                    self.show_current()
                } else {
                    Task::none()
                }
            }
            Message::Next => {
                if self.library.next() {
                    self.show_current()
                } else {
                    Task::none()
                }
            }
            Message::GotoIndex(position) => {
                if self.library.goto(position) {
                    self.show_current()
                } else {
                    Task::none()
                }
            }
            Message::ModeChanged(mode) => {
                self.view.set_mode(mode);
                Task::none()
            }
            Message::ZoomChanged(percent) => {
                self.view.set_zoom(percent);
                self.reclamp();
                Task::none()
            }
            Message::ZoomBy(step, canvas_size) => {
                self.canvas_size = canvas_size;
                self.view.zoom_by(step);
                self.reclamp();
                Task::none()
            }
            Message::Pan(delta, canvas_size) => {
                self.canvas_size = canvas_size;
                if let Preview::Ready(image) = &self.preview {
                    self.view.pan(delta, canvas_size, image.size());
                }
                Task::none()
            }
            Message::ToggleFullscreen => self.set_fullscreen(!self.fullscreen),
            Message::ExitFullscreen => self.set_fullscreen(false),
            Message::PreviewLoaded(generation, result) => {
                if generation != self.generation {
                    debug!("Dropping stale decode result ({} != {})", generation, self.generation);
                    return Task::none();
                }
                self.preview = match result {
                    Ok(image) => Preview::Ready(image),
                    Err(reason) => {
                        warn!("⚠️  Error loading image: {}", reason);
                        Preview::Failed(reason)
                    }
                };
                Task::none()
            }
            Message::CopyKeywords => {
                let Some(record) = self.library.current_record() else {
                    return Task::none();
                };
                let keywords = record.keywords_text();
                if keywords.trim().is_empty() {
                    return Task::none();
                }
                iced::clipboard::write(keywords).chain(Task::done(Message::KeywordsCopied))
            }
            Message::KeywordsCopied => {
                MessageDialog::new()
                    .set_level(MessageLevel::Info)
                    .set_title("Copied")
                    .set_description("Keywords copied to clipboard")
                    .set_buttons(MessageButtons::Ok)
                    .show();
                Task::none()
            }
            Message::OpenExternally => {
                let Some(record) = self.library.current_record() else {
                    return Task::none();
                };
                match record.resolve_path() {
                    None => show_error("Not found", "Could not locate the image file on disk."),
                    Some(path) => {
                        info!("📂 Opening {}", path.display());
                        if let Err(err) = open::that(&path) {
                            show_error("Open failed", &format!("Could not open externally:\n{}", err));
                        }
                    }
                }
                Task::none()
            }
        }
    }

    /// Re-run the filter, rebuild the strip and show the first match
    fn refresh(&mut self) -> Task<Message> {
        self.library.apply_filter(&self.filter);
        if self.filter.is_cleared() {
            debug!("No filter: {} of {} shown", self.library.visible_len(), self.library.total());
        } else {
            debug!(
                "Filter {:?}: {} of {} shown, {} duplicate(s)",
                self.filter,
                self.library.visible_len(),
                self.library.total(),
                self.library.duplicates()
            );
        }

        self.strip_paths = self
            .library
            .visible_records()
            .map(|(_, record)| record.resolve_path())
            .collect();
        self.thumbnails
            .warm(self.strip_paths.iter().flatten().map(PathBuf::as_path));
        debug!("{} thumbnail(s) cached", self.thumbnails.len());

        self.show_current()
    }

    /// Start showing the current record; decoding happens in the background
    fn show_current(&mut self) -> Task<Message> {
        self.generation += 1;
        self.view.reset_pan();

        let Some(record) = self.library.current_record() else {
            self.preview = Preview::Empty;
            return Task::none();
        };

        match record.resolve_path() {
            None => {
                self.preview = Preview::Missing(record.filename.clone());
                Task::none()
            }
            Some(path) => {
                self.preview = Preview::Loading;
                let generation = self.generation;
                Task::perform(preview::load_preview(path), move |result| {
                    Message::PreviewLoaded(generation, result)
                })
            }
        }
    }

    fn reclamp(&mut self) {
        if let Preview::Ready(image) = &self.preview {
            self.view.reclamp(self.canvas_size, image.size());
        }
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Task<Message> {
        if self.fullscreen == fullscreen {
            return Task::none();
        }
        self.fullscreen = fullscreen;

        let mode = if fullscreen {
            window::Mode::Fullscreen
        } else {
            window::Mode::Windowed
        };
        window::get_latest().and_then(move |id| window::change_mode(id, mode))
    }

    /// Keyboard shortcuts
    ///
    /// Navigation and `f` only see keys no widget captured, so the filter box
    /// keeps Left/Right, Space and letters while Up/Down still navigate.
    /// Escape is watched separately and exits fullscreen even while the
    /// filter box has focus.
    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            keyboard::on_key_press(handle_key),
            event::listen_with(escape_pressed),
        ])
    }

    /// Set the application theme
    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Build the user interface
    pub fn view(&self) -> Element<Message> {
        row![
            self.view_left_panel(),
            column![
                self.view_controls(),
                self.view_strip(),
                self.view_canvas(),
                self.view_info(),
            ]
            .spacing(8)
            .width(Length::Fill)
            .height(Length::Fill),
        ]
        .spacing(12)
        .padding(12)
        .into()
    }

    fn view_left_panel(&self) -> Element<Message> {
        let filters = section(
            "Filters",
            column![
                text("Keywords, separated by commas"),
                row![
                    text_input("", &self.filter.keywords)
                        .on_input(Message::KeywordsChanged)
                        .width(Length::Fill),
                    button("Clear").on_press(Message::ClearFilters),
                ]
                .spacing(8)
                .align_y(Alignment::Center),
                checkbox("Enable partial contains matching", self.filter.partial)
                    .on_toggle(Message::PartialToggled),
                text("Minimum rank"),
                row![
                    slider(MIN_RANK..=MAX_RANK, self.filter.min_rank, Message::MinRankChanged),
                    text(self.filter.min_rank.to_string()),
                ]
                .spacing(8)
                .align_y(Alignment::Center),
            ]
            .spacing(8),
        );

        let statistics = section(
            "Statistics",
            column![
                text(format!("Total images: {}", self.library.total())),
                text(format!("Matching filters: {}", self.library.visible_len())),
                text(format!("Duplicates removed: {}", self.library.duplicates())),
            ]
            .spacing(4),
        );

        let navigation = section(
            "Navigation",
            column![
                row![
                    button(text("← Previous").align_x(Alignment::Center))
                        .width(Length::Fill)
                        .on_press_maybe(self.library.has_previous().then_some(Message::Previous)),
                    button(text("Next →").align_x(Alignment::Center))
                        .width(Length::Fill)
                        .on_press_maybe(self.library.has_next().then_some(Message::Next)),
                ]
                .spacing(8),
                text(self.library.position_label()),
            ]
            .spacing(8)
            .align_x(Alignment::Center),
        );

        let has_record = self.library.current_record().is_some();
        let actions = section(
            "Actions",
            column![
                button("Copy keywords")
                    .width(Length::Fill)
                    .on_press_maybe(has_record.then_some(Message::CopyKeywords)),
                button("Open image externally")
                    .width(Length::Fill)
                    .on_press_maybe(has_record.then_some(Message::OpenExternally)),
            ]
            .spacing(8),
        );

        column![filters, statistics, navigation, actions]
            .spacing(10)
            .width(LEFT_PANEL_WIDTH)
            .into()
    }

    fn view_controls(&self) -> Element<Message> {
        let mut controls = row![
            text("View"),
            radio("Fit", DisplayMode::Fit, Some(self.view.mode), Message::ModeChanged),
            radio("Actual", DisplayMode::Actual, Some(self.view.mode), Message::ModeChanged),
        ]
        .spacing(8)
        .padding(10)
        .align_y(Alignment::Center);

        // The zoom slider only applies to Actual mode
        if self.view.mode == DisplayMode::Actual {
            controls = controls
                .push(text("Zoom"))
                .push(
                    slider(MIN_ZOOM..=MAX_ZOOM, self.view.zoom_percent, Message::ZoomChanged)
                        .width(Length::Fill),
                )
                .push(text(format!("{}%", self.view.zoom_percent)));
        } else {
            controls = controls.push(horizontal_space());
        }

        controls
            .push(button("Fullscreen").on_press(Message::ToggleFullscreen))
            .into()
    }

    fn view_strip(&self) -> Element<Message> {
        let current = self.library.current_index();
        let tiles = self
            .library
            .visible_records()
            .zip(&self.strip_paths)
            .map(|((position, record), path)| Tile {
                thumbnail: path
                    .as_deref()
                    .and_then(|path| self.thumbnails.get(path, THUMBNAIL_HEIGHT)),
                rank: record.rank,
                selected: position == current,
            })
            .collect();

        thumbnails::strip(tiles)
    }

    fn view_canvas(&self) -> Element<Message> {
        let content = match (&self.preview, self.preview.message()) {
            (Preview::Ready(image), _) => Content::Image(image),
            (_, Some(message)) => Content::Message(message),
            (_, None) => Content::Blank,
        };

        canvas_widget(ImageCanvas {
            content,
            view: self.view,
        })
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }

    fn view_info(&self) -> Element<Message> {
        let (filename, keywords, rank, hash) = match self.library.current_record() {
            Some(record) => (
                record.filename.clone(),
                record.keywords_text(),
                record.rank.to_string(),
                record.hash.clone(),
            ),
            None => Default::default(),
        };

        section(
            "Image information",
            column![
                info_row("File", text(filename).color(FILE_COLOR).into()),
                info_row("Keywords", text(keywords).into()),
                info_row("Rank", text(rank).into()),
                info_row("Hash", text(hash).font(Font::MONOSPACE).size(13).into()),
            ]
            .spacing(6),
        )
    }
}

/// Map a key press to a viewer action
fn handle_key(key: Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    match key.as_ref() {
        Key::Named(Named::ArrowLeft | Named::ArrowUp) => Some(Message::Previous),
        Key::Named(Named::ArrowRight | Named::ArrowDown | Named::Space) => Some(Message::Next),
        Key::Character("f" | "F") => Some(Message::ToggleFullscreen),
        _ => None,
    }
}

/// Escape regardless of whether a widget captured it
fn escape_pressed(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
    match event {
        Event::Keyboard(keyboard::Event::KeyPressed {
            key: Key::Named(Named::Escape),
            ..
        }) => Some(Message::ExitFullscreen),
        _ => None,
    }
}

fn show_error(title: &str, description: &str) {
    warn!("⚠️  {}: {}", title, description);
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// A titled, bordered group of widgets
fn section<'a>(title: &'a str, content: Column<'a, Message>) -> Element<'a, Message> {
    column![
        text(title).size(16),
        container(content)
            .padding(12)
            .width(Length::Fill)
            .style(container::bordered_box),
    ]
    .spacing(4)
    .into()
}

fn info_row<'a>(label: &'a str, value: Element<'a, Message>) -> Element<'a, Message> {
    row![text(label).width(80), value].spacing(10).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, keyword: &str, rank: u32, hash: char) -> ImageRecord {
        ImageRecord {
            filename: name.to_string(),
            keywords: vec![keyword.to_string(), "outdoor".to_string()],
            rank,
            hash: hash.to_string().repeat(64),
            full_path: None,
        }
    }

    fn viewer() -> Viewer {
        let (viewer, _) = Viewer::new(vec![
            record("missing-1.jpg", "cat", 4, '1'),
            record("missing-2.jpg", "dog", 8, '2'),
            record("missing-3.jpg", "cat", 9, '3'),
        ]);
        viewer
    }

    fn dummy_image() -> PreviewImage {
        PreviewImage {
            handle: iced::widget::image::Handle::from_rgba(2, 2, vec![0; 16]),
            width: 2,
            height: 2,
        }
    }

    #[test]
    fn test_missing_file_message() {
        let viewer = viewer();
        assert_eq!(
            viewer.preview.message().as_deref(),
            Some("Image not found: missing-1.jpg")
        );
    }

    #[test]
    fn test_empty_filter_result() {
        let mut viewer = viewer();
        let _ = viewer.update(Message::KeywordsChanged("zebra".to_string()));

        assert_eq!(viewer.library.visible_len(), 0);
        assert!(viewer.strip_paths.is_empty());
        assert_eq!(
            viewer.preview.message().as_deref(),
            Some("No images match current filters")
        );
        assert_eq!(viewer.library.position_label(), "0 / 0");
    }

    #[test]
    fn test_filter_change_resets_position() {
        let mut viewer = viewer();
        let _ = viewer.update(Message::Next);
        let _ = viewer.update(Message::Next);
        assert_eq!(viewer.library.current_index(), 2);

        let _ = viewer.update(Message::MinRankChanged(8));
        assert_eq!(viewer.library.current_index(), 0);
        assert_eq!(viewer.library.visible_len(), 2);

        let _ = viewer.update(Message::ClearFilters);
        assert_eq!(viewer.filter, FilterState::default());
        assert_eq!(viewer.library.visible_len(), 3);
    }

    #[test]
    fn test_stale_preview_is_ignored() {
        let mut viewer = viewer();
        let old = viewer.generation;
        let _ = viewer.update(Message::Next);
        assert_ne!(viewer.generation, old);

        let _ = viewer.update(Message::PreviewLoaded(old, Ok(dummy_image())));
        assert!(!matches!(viewer.preview, Preview::Ready(_)));

        let current = viewer.generation;
        let _ = viewer.update(Message::PreviewLoaded(current, Err("bad header".to_string())));
        assert_eq!(
            viewer.preview.message().as_deref(),
            Some("Error loading image:\nbad header")
        );
    }

    #[test]
    fn test_navigation_resets_pan() {
        let mut viewer = viewer();
        let current = viewer.generation;
        let _ = viewer.update(Message::PreviewLoaded(current, Ok(dummy_image())));
        let _ = viewer.update(Message::ModeChanged(DisplayMode::Actual));
        let _ = viewer.update(Message::ZoomChanged(MAX_ZOOM));
        let _ = viewer.update(Message::Pan(
            cgmath::Vector2::new(-3.0, 0.0),
            Size::new(4.0, 4.0),
        ));
        assert_eq!(viewer.view.offset, cgmath::Vector2::new(-1.0, 0.0));

        let _ = viewer.update(Message::Next);
        assert_eq!(viewer.view.offset, cgmath::Vector2::new(0.0, 0.0));
        assert_eq!(viewer.view.zoom_percent, MAX_ZOOM);
    }

    #[test]
    fn test_key_bindings() {
        let key = |c: &str| Key::Character(c.into());
        assert!(matches!(
            handle_key(Key::Named(Named::ArrowUp), keyboard::Modifiers::empty()),
            Some(Message::Previous)
        ));
        assert!(matches!(
            handle_key(Key::Named(Named::Space), keyboard::Modifiers::empty()),
            Some(Message::Next)
        ));
        assert!(matches!(
            handle_key(key("F"), keyboard::Modifiers::empty()),
            Some(Message::ToggleFullscreen)
        ));
        assert!(handle_key(Key::Named(Named::Escape), keyboard::Modifiers::empty()).is_none());
        assert!(handle_key(key("x"), keyboard::Modifiers::empty()).is_none());
    }

    fn key_press(key: Key) -> Event {
        Event::Keyboard(keyboard::Event::KeyPressed {
            key: key.clone(),
            modified_key: key,
            physical_key: keyboard::key::Physical::Unidentified(
                keyboard::key::NativeCode::Unidentified,
            ),
            location: keyboard::Location::Standard,
            modifiers: keyboard::Modifiers::empty(),
            text: None,
        })
    }

    #[test]
    fn test_escape_exits_fullscreen_even_when_captured() {
        let window = window::Id::unique();
        for status in [event::Status::Captured, event::Status::Ignored] {
            assert!(matches!(
                escape_pressed(key_press(Key::Named(Named::Escape)), status, window),
                Some(Message::ExitFullscreen)
            ));
        }
        assert!(escape_pressed(
            key_press(Key::Character("f".into())),
            event::Status::Captured,
            window
        )
        .is_none());
    }

    #[test]
    fn test_copy_without_keywords_does_nothing() {
        let (mut viewer, _) = Viewer::new(vec![ImageRecord {
            keywords: Vec::new(),
            ..record("bare.jpg", "", 1, '4')
        }]);
        assert!(viewer.library.current_record().is_some());
        assert_eq!(viewer.update(Message::CopyKeywords).units(), 0);
    }

    #[test]
    fn test_actions_on_empty_result_do_nothing() {
        let mut viewer = viewer();
        let _ = viewer.update(Message::KeywordsChanged("zebra".to_string()));
        assert!(viewer.library.current_record().is_none());

        assert_eq!(viewer.update(Message::OpenExternally).units(), 0);
        assert_eq!(viewer.update(Message::CopyKeywords).units(), 0);
    }

    #[test]
    fn test_fullscreen_toggles() {
        let mut viewer = viewer();
        let _ = viewer.update(Message::ToggleFullscreen);
        assert!(viewer.fullscreen);
        let _ = viewer.update(Message::ExitFullscreen);
        assert!(!viewer.fullscreen);
        let _ = viewer.update(Message::ExitFullscreen);
        assert!(!viewer.fullscreen);
    }
}
