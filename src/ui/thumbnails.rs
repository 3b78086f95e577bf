/// Thumbnail strip
///
/// Thumbnails are decoded with the `image` crate, scaled to a fixed height
/// with Lanczos3 and kept in memory for the lifetime of the viewer, keyed by
/// path and height. A file that cannot be decoded gets a blank tile so it is
/// not retried on every filter change.

use iced::widget::image as image_widget;
use iced::widget::{button, column, container, row, scrollable, text, Space};
use iced::{Alignment, Background, Border, Color, Element, Length};
use image::imageops::FilterType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Message;

/// Height of generated thumbnails
pub const THUMBNAIL_HEIGHT: u32 = 84;

/// Width of the blank tile cached for undecodable files
pub const PLACEHOLDER_WIDTH: u32 = 100;

const STRIP_BACKGROUND: Color = Color::from_rgb(0.063, 0.063, 0.063);
const TILE_BORDER: Color = Color::from_rgb(0.188, 0.188, 0.188);
const TILE_SELECTED: Color = Color::from_rgb(0.353, 0.627, 1.0);
const CAPTION: Color = Color::from_rgb(0.867, 0.867, 0.867);

/// A decoded, scaled thumbnail ready for the image widget
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub handle: image_widget::Handle,
    pub width: u32,
    pub height: u32,
    /// True for the blank tile of a file that failed to decode
    pub placeholder: bool,
}

impl Thumbnail {
    fn blank(height: u32) -> Self {
        let pixels = vec![0u8; (PLACEHOLDER_WIDTH * height * 4) as usize];
        Self {
            handle: image_widget::Handle::from_rgba(PLACEHOLDER_WIDTH, height, pixels),
            width: PLACEHOLDER_WIDTH,
            height,
            placeholder: true,
        }
    }
}

/// Decode an image file and scale it to `height`, keeping the aspect ratio
pub fn render_thumbnail(path: &Path, height: u32) -> Result<Thumbnail, image::ImageError> {
    let img = image::open(path)?;
    let ratio = height as f64 / img.height().max(1) as f64;
    let width = ((img.width() as f64 * ratio) as u32).max(1);

    let scaled = img.resize_exact(width, height, FilterType::Lanczos3).to_rgba8();

    Ok(Thumbnail {
        handle: image_widget::Handle::from_rgba(width, height, scaled.into_raw()),
        width,
        height,
        placeholder: false,
    })
}

/// In-memory thumbnail cache, never evicted
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entries: HashMap<(PathBuf, u32), Thumbnail>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Cached thumbnail, if one was already made
    pub fn get(&self, path: &Path, height: u32) -> Option<&Thumbnail> {
        self.entries.get(&(path.to_path_buf(), height))
    }

    /// Cached thumbnail, decoding it first on a miss
    pub fn get_or_load(&mut self, path: &Path, height: u32) -> &Thumbnail {
        self.entries
            .entry((path.to_path_buf(), height))
            .or_insert_with(|| match render_thumbnail(path, height) {
                Ok(thumbnail) => thumbnail,
                Err(err) => {
                    debug!("Thumbnail failed for {}: {}", path.display(), err);
                    Thumbnail::blank(height)
                }
            })
    }

    /// Make sure every given path has a thumbnail at the strip height
    pub fn warm<'a, I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut blank = 0;
        for path in paths {
            if self.get_or_load(path, THUMBNAIL_HEIGHT).placeholder {
                blank += 1;
            }
        }
        if blank > 0 {
            debug!("{} thumbnail(s) could not be decoded", blank);
        }
    }
}

/// One tile of the strip
pub struct Tile<'a> {
    pub thumbnail: Option<&'a Thumbnail>,
    pub rank: u32,
    pub selected: bool,
}

/// Build the horizontally scrolling strip; clicking a tile jumps to it
pub fn strip<'a>(tiles: Vec<Tile<'a>>) -> Element<'a, Message> {
    if tiles.is_empty() {
        return container(Space::with_height(60))
            .width(Length::Fill)
            .style(|_| container::Style {
                background: Some(Background::Color(STRIP_BACKGROUND)),
                ..Default::default()
            })
            .into();
    }

    let items = tiles
        .into_iter()
        .enumerate()
        .map(|(position, tile)| view_tile(position, tile));

    let content = row(items).spacing(6).padding(6);

    container(
        scrollable(content).direction(scrollable::Direction::Horizontal(
            scrollable::Scrollbar::new(),
        )),
    )
    .width(Length::Fill)
    .style(|_| container::Style {
        background: Some(Background::Color(STRIP_BACKGROUND)),
        ..Default::default()
    })
    .into()
}

fn view_tile(position: usize, tile: Tile<'_>) -> Element<'_, Message> {
    let picture: Element<Message> = match tile.thumbnail {
        Some(thumb) => image_widget(thumb.handle.clone())
            .width(thumb.width as f32)
            .height(thumb.height as f32)
            .into(),
        None => container(text("No preview").size(12).color(CAPTION))
            .width(PLACEHOLDER_WIDTH as f32)
            .height(THUMBNAIL_HEIGHT as f32)
            .center_x(PLACEHOLDER_WIDTH as f32)
            .center_y(THUMBNAIL_HEIGHT as f32)
            .into(),
    };

    let body = column![picture, text(format!("R {}", tile.rank)).size(12).color(CAPTION)]
        .spacing(2)
        .align_x(Alignment::Center);

    let border_color = if tile.selected { TILE_SELECTED } else { TILE_BORDER };

    button(body)
        .padding(2)
        .on_press(Message::GotoIndex(position))
        .style(move |_theme, _status| button::Style {
            background: Some(Background::Color(STRIP_BACKGROUND)),
            border: Border {
                color: border_color,
                width: 2.0,
                radius: 0.0.into(),
            },
            ..button::Style::default()
        })
        .into()
}
