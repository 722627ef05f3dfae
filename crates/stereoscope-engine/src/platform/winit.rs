use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent};
use winit::window::Window;

use crate::camera::{DragEvent, SurfaceId};
use crate::frame::{PresentationSurface, TickSource};

/// Stable identifier for a window, matched against a camera's capture
/// surface.
pub fn surface_id(window: &Window) -> SurfaceId {
    let mut hasher = DefaultHasher::new();
    window.id().hash(&mut hasher);
    SurfaceId(hasher.finish())
}

/// A winit window as the render surface.
///
/// For a window the framebuffer and the layout size coincide, so `size`
/// and `client_size` both report the inner size.
pub struct WindowSurface(Arc<Window>);

impl WindowSurface {
    pub fn new(window: Arc<Window>) -> Self {
        Self(window)
    }
}

impl PresentationSurface for WindowSurface {
    fn size(&self) -> (u32, u32) {
        let size = self.0.inner_size();
        (size.width, size.height)
    }

    fn client_size(&self) -> (u32, u32) {
        self.size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        // The platform may refuse or defer the resize; the scheduler reads
        // the size back each frame either way.
        let _ = self.0.request_inner_size(PhysicalSize::new(width, height));
    }
}

/// Paces the mono loop with winit redraw requests.
pub struct WindowTicker(Arc<Window>);

impl WindowTicker {
    pub fn new(window: Arc<Window>) -> Self {
        Self(window)
    }
}

impl TickSource for WindowTicker {
    fn request_tick(&mut self) {
        self.0.request_redraw();
    }
}

/// Translates winit pointer events into camera drag gestures.
///
/// Tracks the cursor position so a button press can carry coordinates, and
/// only reports motion while the primary button (or a touch) is down.
pub struct PointerTracker {
    surface: SurfaceId,
    position: (f64, f64),
    pressed: bool,
}

impl PointerTracker {
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            position: (0.0, 0.0),
            pressed: false,
        }
    }

    /// Feeds one window event through; returns the drag gesture it maps
    /// to, if any.
    pub fn translate_window_event(&mut self, event: &WindowEvent) -> Option<DragEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor_moved(position.x, position.y)
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.on_primary_button(*state == ElementState::Pressed),
            WindowEvent::Touch(Touch {
                phase, location, ..
            }) => self.on_touch(*phase, location.x, location.y),
            _ => None,
        }
    }

    fn on_cursor_moved(&mut self, x: f64, y: f64) -> Option<DragEvent> {
        self.position = (x, y);
        self.pressed.then_some(DragEvent::Move { x, y })
    }

    fn on_primary_button(&mut self, pressed: bool) -> Option<DragEvent> {
        if pressed == self.pressed {
            return None;
        }
        self.pressed = pressed;
        if pressed {
            let (x, y) = self.position;
            Some(DragEvent::Begin {
                target: self.surface,
                x,
                y,
            })
        } else {
            Some(DragEvent::End)
        }
    }

    fn on_touch(&mut self, phase: TouchPhase, x: f64, y: f64) -> Option<DragEvent> {
        self.position = (x, y);
        match phase {
            TouchPhase::Started => {
                self.pressed = true;
                Some(DragEvent::Begin {
                    target: self.surface,
                    x,
                    y,
                })
            }
            TouchPhase::Moved => self.pressed.then_some(DragEvent::Move { x, y }),
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.pressed = false;
                Some(DragEvent::End)
            }
        }
    }
}
