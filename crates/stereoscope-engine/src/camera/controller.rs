use glam::{Mat4, Quat, Vec3};

/// Identifies the surface a pointer event came from. Drags are only honored
/// when they originate on the rig's capture surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SurfaceId(pub u64);

/// Pointer gesture fed to a [`CameraRig`].
///
/// Produced by a platform adapter; the rig itself never talks to a window
/// system, which keeps the orbit math testable with plain values.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DragEvent {
    Begin { target: SurfaceId, x: f64, y: f64 },
    Move { x: f64, y: f64 },
    End,
}

/// Drag-to-look camera used when rendering mono.
///
/// Horizontal drag turns the view (yaw, wrapped to (-pi, pi]), vertical drag
/// tilts it (pitch, clamped just short of straight up/down so the view
/// direction never degenerates).
#[derive(Debug, Clone)]
pub struct CameraRig {
    yaw: f32,
    pitch: f32,
    dragging: bool,
    last: Option<(f64, f64)>,
    sensitivity: f32,
    capture: SurfaceId,
}

const PITCH_LIMIT: f32 = std::f32::consts::PI / 2.001;

impl CameraRig {
    pub fn new(capture: SurfaceId, initial_yaw: f32, initial_pitch: f32) -> Self {
        Self {
            yaw: initial_yaw,
            pitch: initial_pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            dragging: false,
            last: None,
            sensitivity: 0.001,
            capture,
        }
    }

    /// Starts a drag. Returns false (and stays idle) when the event targets
    /// a different surface.
    pub fn begin_drag(&mut self, target: SurfaceId, x: f64, y: f64) -> bool {
        if target != self.capture {
            return false;
        }
        self.dragging = true;
        self.last = Some((x, y));
        true
    }

    /// Applies pointer motion while a drag is active; a no-op otherwise.
    pub fn move_drag(&mut self, x: f64, y: f64) {
        if !self.dragging {
            return;
        }
        let Some((last_x, last_y)) = self.last else {
            return;
        };

        let dx = (x - last_x) as f32;
        let dy = (y - last_y) as f32;
        self.last = Some((x, y));

        self.yaw += std::f32::consts::PI * dx * self.sensitivity;
        while self.yaw > std::f32::consts::PI {
            self.yaw -= 2.0 * std::f32::consts::PI;
        }
        while self.yaw <= -std::f32::consts::PI {
            self.yaw += 2.0 * std::f32::consts::PI;
        }

        self.pitch += std::f32::consts::PI * dy * self.sensitivity;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
        self.last = None;
    }

    /// Feeds one gesture event through the begin/move/end methods.
    pub fn handle(&mut self, event: DragEvent) {
        match event {
            DragEvent::Begin { target, x, y } => {
                self.begin_drag(target, x, y);
            }
            DragEvent::Move { x, y } => self.move_drag(x, y),
            DragEvent::End => self.end_drag(),
        }
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// The mono view matrix: pitch applied after yaw, so tilting always
    /// happens around the viewer's own horizontal axis.
    pub fn view_matrix(&self) -> Mat4 {
        let yaw = Quat::from_axis_angle(Vec3::Y, self.yaw);
        let pitch = Quat::from_axis_angle(Vec3::X, self.pitch);
        Mat4::from_quat(pitch * yaw)
    }
}
