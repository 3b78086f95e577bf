use iced::alignment::{Horizontal, Vertical};
use iced::keyboard;
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Program};
use iced::{Color, Point, Rectangle, Renderer, Theme};
use std::time::{Duration, Instant};

use super::preview::PreviewImage;
use super::Message;
use crate::state::view::{ViewTransform, ZOOM_STEP};

/// Two clicks closer together than this are a double-click
const DOUBLE_CLICK: Duration = Duration::from_millis(400);

const BACKGROUND: Color = Color::from_rgb(0.043, 0.043, 0.043);
const MESSAGE_COLOR: Color = Color::from_rgb(0.878, 0.4, 0.4);

/// What the main view currently shows
pub enum Content<'a> {
    Image(&'a PreviewImage),
    Message(String),
    Blank,
}

/// Canvas for the main image with zoom/pan support
pub struct ImageCanvas<'a> {
    pub content: Content<'a>,
    pub view: ViewTransform,
}

impl Program<Message> for ImageCanvas<'_> {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKGROUND);

        match &self.content {
            Content::Image(preview) => {
                let placement = self.view.placement(bounds.size(), preview.size());
                frame.draw_image(placement, &preview.handle);
            }
            Content::Message(message) => {
                frame.fill_text(canvas::Text {
                    content: message.clone(),
                    position: frame.center(),
                    color: MESSAGE_COLOR,
                    size: 16.0.into(),
                    horizontal_alignment: Horizontal::Center,
                    vertical_alignment: Vertical::Center,
                    ..canvas::Text::default()
                });
            }
            Content::Blank => {}
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
        match event {
            canvas::Event::Keyboard(keyboard::Event::ModifiersChanged(modifiers)) => {
                state.modifiers = modifiers;
            }

            // Ctrl (Cmd on macOS) + wheel zooms
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.is_over(bounds) && state.modifiers.command() {
                    let y = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y,
                        mouse::ScrollDelta::Pixels { y, .. } => y,
                    };
                    if y != 0.0 {
                        let step = if y > 0.0 { ZOOM_STEP } else { -ZOOM_STEP };
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::ZoomBy(step, bounds.size())),
                        );
                    }
                }
            }

            // Mouse button press - start dragging, or toggle fullscreen on double-click
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_in(bounds) {
                    let now = Instant::now();
                    let double = state
                        .last_click
                        .is_some_and(|last| now.duration_since(last) < DOUBLE_CLICK);

                    if double {
                        state.last_click = None;
                        state.is_dragging = false;
                        state.last_position = None;
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::ToggleFullscreen),
                        );
                    }

                    state.last_click = Some(now);
                    state.is_dragging = true;
                    state.last_position = Some(pos);
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse button release - stop dragging
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    state.last_position = None;
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse move - pan if dragging; the image follows the cursor
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    if let Some(last_pos) = state.last_position {
                        let current_pos = Point::new(position.x - bounds.x, position.y - bounds.y);
                        let delta = cgmath::Vector2::new(
                            current_pos.x - last_pos.x,
                            current_pos.y - last_pos.y,
                        );

                        state.last_position = Some(current_pos);
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::Pan(delta, bounds.size())),
                        );
                    }
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.is_dragging {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::default()
        }
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
    pub last_position: Option<Point>,
    pub last_click: Option<Instant>,
    pub modifiers: keyboard::Modifiers,
}
