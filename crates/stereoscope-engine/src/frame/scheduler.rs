use glam::Mat4;

use super::app::FrameApp;
use super::display::{DisplayProvider, PresentationSurface, StereoDisplay, TickSource};
use super::state::{Eye, EyePass, FrameState, PresentationMode};
use crate::camera::{CameraRig, DragEvent, SurfaceId};
use crate::coords::Viewport;
use crate::device::{GlApi, GraphicsContext};
use crate::time::FrameClock;

/// Whether the scheduler may render mono when no stereo display presents.
///
/// `Unset` behaves like `Allowed`; only an explicit `Denied` blocks the
/// fallback.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum MonoFallback {
    #[default]
    Unset,
    Allowed,
    Denied,
}

impl MonoFallback {
    pub fn allowed(self) -> bool {
        self != Self::Denied
    }
}

/// Scheduler settings. The mono projection fields only matter on the
/// fallback path; stereo frames take their projections from the display.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub fallback: MonoFallback,
    pub mono_fov_deg: f32,
    pub mono_near: f32,
    pub mono_far: f32,
    pub initial_yaw: f32,
    pub initial_pitch: f32,
    /// Surface whose pointer drags steer the mono camera.
    pub capture_surface: SurfaceId,
}

impl SchedulerConfig {
    pub fn new(capture_surface: SurfaceId) -> Self {
        Self {
            fallback: MonoFallback::default(),
            mono_fov_deg: 90.0,
            mono_near: 0.01,
            mono_far: 10_000.0,
            initial_yaw: 0.0,
            initial_pitch: 0.0,
            capture_surface,
        }
    }
}

/// Where the scheduler is in its lifecycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SchedulerState {
    /// Constructed, `start` not yet called.
    Idle,
    /// Display discovery in progress.
    Discovering,
    /// Stereo display presenting; ticks come from the display.
    Presenting,
    /// Mono fallback active; ticks come from the tick source.
    Running,
    /// No display and the fallback is denied. Terminal.
    Blocked,
}

/// Drives the frame loop: discovers a stereo display, falls back to mono
/// when allowed, and calls the application's hooks once per tick.
///
/// The tick, display, and surface dependencies are injected so the whole
/// loop runs under test without a window system.
pub struct FrameScheduler {
    state: SchedulerState,
    config: SchedulerConfig,
    camera: CameraRig,
    clock: FrameClock,
    ticker: Box<dyn TickSource>,
    provider: Box<dyn DisplayProvider>,
    display: Option<Box<dyn StereoDisplay>>,
    surface: Box<dyn PresentationSurface>,
    diagnostics: Vec<String>,
}

impl FrameScheduler {
    pub fn new(
        config: SchedulerConfig,
        provider: Box<dyn DisplayProvider>,
        ticker: Box<dyn TickSource>,
        surface: Box<dyn PresentationSurface>,
    ) -> Self {
        let camera = CameraRig::new(
            config.capture_surface,
            config.initial_yaw,
            config.initial_pitch,
        );
        Self {
            state: SchedulerState::Idle,
            config,
            camera,
            clock: FrameClock::new(),
            ticker,
            provider,
            display: None,
            surface,
            diagnostics: Vec::new(),
        }
    }

    /// Runs display discovery and schedules the first tick.
    ///
    /// On success the surface is resized to fit both eyes side by side and
    /// the display paces the loop. Every failure along the way lands on the
    /// mono fallback decision instead of erroring out.
    pub fn start(&mut self) {
        self.state = SchedulerState::Discovering;
        match self.provider.discover() {
            Ok(Some(mut display)) => {
                let (lw, lh) = display.eye_extent(Eye::Left);
                let (rw, rh) = display.eye_extent(Eye::Right);
                self.surface.resize(lw.max(rw) * 2, lh.max(rh));

                match display.request_present() {
                    Ok(()) => {
                        display.request_tick();
                        self.display = Some(display);
                        self.state = SchedulerState::Presenting;
                        log::info!("presenting stereo");
                    }
                    Err(err) => {
                        self.note(format!("Presentation request was denied: {err}"));
                        self.fall_back();
                    }
                }
            }
            Ok(None) => {
                self.note("No stereo display connected.".to_owned());
                self.fall_back();
            }
            Err(err) => {
                self.note(format!("Display discovery failed: {err}"));
                self.fall_back();
            }
        }
    }

    fn fall_back(&mut self) {
        if self.config.fallback.allowed() {
            self.state = SchedulerState::Running;
            self.ticker.request_tick();
            log::info!("rendering mono");
        } else {
            self.state = SchedulerState::Blocked;
            self.note("Mono fallback is disabled; nothing will be presented.".to_owned());
        }
    }

    /// Produces one frame. Call from the tick callback with the driver's
    /// timestamp in seconds.
    ///
    /// The next tick is requested before any application hook runs, then
    /// the frame goes pre_update, update, clear, render per eye, and (in
    /// stereo) submit.
    pub fn tick<D: GlApi, A: FrameApp<D>>(
        &mut self,
        timestamp: f64,
        ctx: &GraphicsContext<D>,
        app: &mut A,
    ) {
        let frame = match self.state {
            SchedulerState::Presenting => {
                let Some(display) = self.display.as_mut() else {
                    return;
                };
                display.request_tick();
                app.pre_update(timestamp);

                let time = self.clock.tick(timestamp);
                let pose = display.frame_pose();
                let (width, height) = self.surface.size();
                let half = (width / 2) as i32;
                FrameState {
                    mode: PresentationMode::Stereo,
                    time,
                    eyes: vec![
                        EyePass {
                            eye: Eye::Left,
                            projection: pose.left_projection,
                            view: pose.left_view,
                            viewport: Viewport::new(0, 0, half, height as i32),
                        },
                        EyePass {
                            eye: Eye::Right,
                            projection: pose.right_projection,
                            view: pose.right_view,
                            viewport: Viewport::new(half, 0, half, height as i32),
                        },
                    ],
                }
            }
            SchedulerState::Running => {
                self.ticker.request_tick();
                app.pre_update(timestamp);

                let time = self.clock.tick(timestamp);
                // Track the window's layout size so the projection never
                // stretches after a resize.
                let (cw, ch) = self.surface.client_size();
                if self.surface.size() != (cw, ch) {
                    self.surface.resize(cw, ch);
                }
                let viewport = Viewport::full(cw, ch);
                // A minimized window reports a degenerate size; skip the
                // frame but keep the loop armed.
                if !viewport.is_valid() {
                    return;
                }
                FrameState {
                    mode: PresentationMode::Mono,
                    time,
                    eyes: vec![EyePass {
                        eye: Eye::Mono,
                        projection: Mat4::perspective_rh_gl(
                            self.config.mono_fov_deg.to_radians(),
                            viewport.aspect(),
                            self.config.mono_near,
                            self.config.mono_far,
                        ),
                        view: self.camera.view_matrix(),
                        viewport,
                    }],
                }
            }
            _ => return,
        };

        app.update(&frame);

        // One clear covers both eyes; each pass only narrows the viewport.
        ctx.clear();
        for pass in &frame.eyes {
            ctx.device().set_viewport(pass.viewport);
            app.render(ctx, pass);
        }

        if frame.mode == PresentationMode::Stereo {
            if let Some(display) = self.display.as_mut() {
                display.submit_frame();
            }
        }
    }

    /// Routes a pointer gesture to the mono camera.
    pub fn handle_pointer(&mut self, event: DragEvent) {
        self.camera.handle(event);
    }

    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    #[inline]
    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    /// Human-readable notes about why the scheduler is in its current
    /// state. Notes accumulate; earlier ones are never replaced.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    fn note(&mut self, message: String) {
        log::warn!("{message}");
        self.diagnostics.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::fake::FakeDevice;
    use crate::device::ContextConfig;
    use crate::frame::display::{DisplayError, StereoPose};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    fn journal() -> Journal {
        Rc::new(RefCell::new(Vec::new()))
    }

    struct FakeTicker(Journal);

    impl TickSource for FakeTicker {
        fn request_tick(&mut self) {
            self.0.borrow_mut().push("ticker.request_tick".to_owned());
        }
    }

    struct FakeDisplay {
        journal: Journal,
        present_ok: bool,
    }

    impl StereoDisplay for FakeDisplay {
        fn eye_extent(&self, _eye: Eye) -> (u32, u32) {
            (512, 512)
        }

        fn request_present(&mut self) -> Result<(), DisplayError> {
            if self.present_ok {
                Ok(())
            } else {
                Err(DisplayError::PresentRequestFailed("declined".to_owned()))
            }
        }

        fn request_tick(&mut self) {
            self.journal.borrow_mut().push("display.request_tick".to_owned());
        }

        fn frame_pose(&mut self) -> StereoPose {
            StereoPose::default()
        }

        fn submit_frame(&mut self) {
            self.journal.borrow_mut().push("submit_frame".to_owned());
        }
    }

    struct FakeProvider(Result<Option<Box<dyn StereoDisplay>>, DisplayError>);

    impl DisplayProvider for FakeProvider {
        fn discover(&mut self) -> Result<Option<Box<dyn StereoDisplay>>, DisplayError> {
            std::mem::replace(&mut self.0, Ok(None))
        }
    }

    struct FakeSurface {
        size: Rc<Cell<(u32, u32)>>,
        client: (u32, u32),
    }

    impl PresentationSurface for FakeSurface {
        fn size(&self) -> (u32, u32) {
            self.size.get()
        }

        fn client_size(&self) -> (u32, u32) {
            self.client
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.size.set((width, height));
        }
    }

    struct TraceApp(Journal);

    impl FrameApp<FakeDevice> for TraceApp {
        fn pre_update(&mut self, _timestamp: f64) {
            self.0.borrow_mut().push("pre_update".to_owned());
        }

        fn update(&mut self, frame: &FrameState) {
            self.0
                .borrow_mut()
                .push(format!("update eyes={}", frame.eyes.len()));
        }

        fn render(&mut self, _ctx: &GraphicsContext<FakeDevice>, pass: &EyePass) {
            self.0.borrow_mut().push(format!("render {}", pass.eye.label()));
        }
    }

    struct Fixture {
        scheduler: FrameScheduler,
        journal: Journal,
        surface_size: Rc<Cell<(u32, u32)>>,
        ctx: GraphicsContext<FakeDevice>,
        app: TraceApp,
    }

    fn fixture(
        config: SchedulerConfig,
        discovery: Result<Option<Box<dyn StereoDisplay>>, DisplayError>,
    ) -> Fixture {
        let journal = journal();
        let surface_size = Rc::new(Cell::new((100, 100)));
        let scheduler = FrameScheduler::new(
            config,
            Box::new(FakeProvider(discovery)),
            Box::new(FakeTicker(journal.clone())),
            Box::new(FakeSurface {
                size: surface_size.clone(),
                client: (800, 600),
            }),
        );
        Fixture {
            scheduler,
            journal: journal.clone(),
            surface_size,
            ctx: GraphicsContext::new(FakeDevice::new(), ContextConfig::default()),
            app: TraceApp(journal),
        }
    }

    fn stereo_display(journal: &Journal, present_ok: bool) -> Box<dyn StereoDisplay> {
        Box::new(FakeDisplay {
            journal: journal.clone(),
            present_ok,
        })
    }

    // ── discovery ─────────────────────────────────────────────────────────

    #[test]
    fn stereo_discovery_presents_and_sizes_the_surface() {
        let journal = journal();
        let display = stereo_display(&journal, true);
        let mut f = fixture(SchedulerConfig::new(SurfaceId(1)), Ok(Some(display)));

        f.scheduler.start();
        assert_eq!(f.scheduler.state(), SchedulerState::Presenting);
        // Both eyes side by side.
        assert_eq!(f.surface_size.get(), (1024, 512));
        assert!(journal.borrow().contains(&"display.request_tick".to_owned()));
        assert!(f.scheduler.diagnostics().is_empty());
    }

    #[test]
    fn missing_display_falls_back_to_mono() {
        let mut f = fixture(SchedulerConfig::new(SurfaceId(1)), Ok(None));

        f.scheduler.start();
        assert_eq!(f.scheduler.state(), SchedulerState::Running);
        assert_eq!(f.journal.borrow().as_slice(), ["ticker.request_tick"]);
        assert!(f.scheduler.diagnostics()[0].contains("No stereo display"));
    }

    #[test]
    fn discovery_error_falls_back_to_mono() {
        let mut f = fixture(
            SchedulerConfig::new(SurfaceId(1)),
            Err(DisplayError::Unavailable),
        );

        f.scheduler.start();
        assert_eq!(f.scheduler.state(), SchedulerState::Running);
        assert!(f.scheduler.diagnostics()[0].contains("discovery failed"));
    }

    #[test]
    fn present_refusal_falls_back_to_mono() {
        let journal = journal();
        let display = stereo_display(&journal, false);
        let mut f = fixture(SchedulerConfig::new(SurfaceId(1)), Ok(Some(display)));

        f.scheduler.start();
        assert_eq!(f.scheduler.state(), SchedulerState::Running);
        assert!(f.scheduler.diagnostics()[0].contains("denied"));
    }

    #[test]
    fn denied_fallback_blocks_instead_of_running() {
        let mut config = SchedulerConfig::new(SurfaceId(1));
        config.fallback = MonoFallback::Denied;
        let mut f = fixture(config, Ok(None));

        f.scheduler.start();
        assert_eq!(f.scheduler.state(), SchedulerState::Blocked);
        // Both the missing display and the refusal to run are recorded.
        assert_eq!(f.scheduler.diagnostics().len(), 2);

        f.scheduler.tick(1.0, &f.ctx, &mut f.app);
        assert!(!f.journal.borrow().iter().any(|e| e == "pre_update"));
    }

    #[test]
    fn unset_fallback_behaves_as_allowed() {
        assert!(MonoFallback::Unset.allowed());
        assert!(MonoFallback::Allowed.allowed());
        assert!(!MonoFallback::Denied.allowed());
    }

    // ── frame production ──────────────────────────────────────────────────

    #[test]
    fn mono_tick_runs_hooks_in_order_and_rearms_first() {
        let mut f = fixture(SchedulerConfig::new(SurfaceId(1)), Ok(None));
        f.scheduler.start();
        f.journal.borrow_mut().clear();

        f.scheduler.tick(1.0, &f.ctx, &mut f.app);
        assert_eq!(
            f.journal.borrow().as_slice(),
            [
                "ticker.request_tick",
                "pre_update",
                "update eyes=1",
                "render mono"
            ]
        );
    }

    #[test]
    fn mono_frame_tracks_the_client_size() {
        let mut f = fixture(SchedulerConfig::new(SurfaceId(1)), Ok(None));
        f.scheduler.start();

        f.scheduler.tick(1.0, &f.ctx, &mut f.app);
        assert_eq!(f.surface_size.get(), (800, 600));

        let calls = f.ctx.device().calls();
        assert!(calls.contains(&"set_viewport 0 0 800 600".to_owned()));
    }

    #[test]
    fn stereo_tick_renders_left_then_right_then_submits() {
        let journal = journal();
        let display = stereo_display(&journal, true);
        let mut f = fixture(SchedulerConfig::new(SurfaceId(1)), Ok(Some(display)));
        // One shared journal so app and display ordering is observable.
        f.app = TraceApp(journal.clone());
        f.scheduler.start();
        journal.borrow_mut().clear();

        f.scheduler.tick(1.0, &f.ctx, &mut f.app);
        assert_eq!(
            journal.borrow().as_slice(),
            [
                "display.request_tick",
                "pre_update",
                "update eyes=2",
                "render left",
                "render right",
                "submit_frame"
            ]
        );

        // Half-surface viewports, cleared exactly once before either eye.
        let calls = f.ctx.device().calls();
        let clear = calls.iter().position(|c| c.starts_with("clear")).unwrap();
        let left = calls
            .iter()
            .position(|c| c == "set_viewport 0 0 512 512")
            .unwrap();
        let right = calls
            .iter()
            .position(|c| c == "set_viewport 512 0 512 512")
            .unwrap();
        assert!(clear < left && left < right);
        assert_eq!(f.ctx.device().count_calls("clear "), 1);
    }

    #[test]
    fn ticks_before_start_do_nothing() {
        let mut f = fixture(SchedulerConfig::new(SurfaceId(1)), Ok(None));
        f.scheduler.tick(1.0, &f.ctx, &mut f.app);
        assert!(f.journal.borrow().is_empty());
        assert!(f.ctx.device().calls().is_empty());
    }

    #[test]
    fn pointer_drags_steer_the_mono_camera() {
        let mut f = fixture(SchedulerConfig::new(SurfaceId(1)), Ok(None));
        f.scheduler.start();

        f.scheduler.handle_pointer(DragEvent::Begin {
            target: SurfaceId(1),
            x: 0.0,
            y: 0.0,
        });
        f.scheduler.handle_pointer(DragEvent::Move { x: 100.0, y: 0.0 });
        assert!(f.scheduler.camera().yaw() > 0.0);
    }
}
