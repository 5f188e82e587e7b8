use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Result;
use audrt_core::{KeyInput, ResponseKey};
use audrt_render::{Scene, SkiaRenderer};
use crossbeam::channel::{Receiver, Sender};
use pixels::{Pixels, SurfaceTexture};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

use crate::engine::{run_engine, EngineLaunch};
use crate::frontend::{FrontendMsg, KeyStamp};

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    scene: Scene,
    scene_rx: Receiver<FrontendMsg>,
    key_tx: Sender<KeyStamp>,
    launch: Option<EngineLaunch>,
    engine: Option<JoinHandle<()>>,
    should_exit: bool,
}

impl App {
    pub fn new(
        scene_rx: Receiver<FrontendMsg>,
        key_tx: Sender<KeyStamp>,
        launch: EngineLaunch,
    ) -> Self {
        Self {
            window: None,
            pixels: None,
            renderer: None,
            scene: Scene::Blank,
            scene_rx,
            key_tx,
            launch: Some(launch),
            engine: None,
            should_exit: false,
        }
    }

    pub fn run(mut self, event_loop: EventLoop<()>) -> Result<()> {
        event_loop.run_app(&mut self)?;

        // Dropping our channel ends unblocks an engine still waiting on
        // input; it reads the disconnect as an abort and flushes.
        let App {
            engine,
            key_tx,
            scene_rx,
            ..
        } = self;
        drop(key_tx);
        drop(scene_rx);
        if let Some(engine) = engine {
            let _ = engine.join();
        }
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());

        let window_attributes = Window::default_attributes()
            .with_title("audrt")
            .with_fullscreen(Some(Fullscreen::Borderless(monitor)))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let size = window.inner_size();
        log::info!("display surface: {}x{}", size.width, size.height);

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface)?);
        self.renderer = Some(SkiaRenderer::new(size.width, size.height)?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    /// Pulls pending engine messages, keeping only the newest scene.
    fn drain_messages(&mut self) {
        let mut dirty = false;
        while let Ok(msg) = self.scene_rx.try_recv() {
            match msg {
                FrontendMsg::Scene(scene) => {
                    self.scene = scene;
                    dirty = true;
                }
                FrontendMsg::Exit => self.should_exit = true,
            }
        }
        if dirty {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut())
        else {
            return Ok(());
        };
        renderer.render(&self.scene);
        let frame = pixels.frame_mut();
        let data = renderer.frame();
        if frame.len() == data.len() {
            frame.copy_from_slice(data);
        }
        pixels.render()?;
        Ok(())
    }

    fn handle_key(&mut self, key: winit::keyboard::PhysicalKey, event_loop: &ActiveEventLoop) {
        use winit::keyboard::PhysicalKey;
        let PhysicalKey::Code(code) = key else { return };
        let Some(key) = map_key(code) else { return };

        let stamp = KeyStamp {
            key,
            at: std::time::Instant::now(),
        };
        if self.key_tx.send(stamp).is_err() {
            // Engine is gone; nothing left to do but close.
            event_loop.exit();
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(size.width, size.height) {
                log::warn!("failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(size.width, size.height) {
                log::warn!("failed to resize buffer: {e}");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(size.width, size.height);
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        }
        if let Some(launch) = self.launch.take() {
            self.engine = Some(std::thread::spawn(move || run_engine(launch)));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                // Route through the engine so partial records get flushed.
                let stamp = KeyStamp {
                    key: KeyInput::Abort,
                    at: std::time::Instant::now(),
                };
                if self.key_tx.send(stamp).is_err() {
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                self.drain_messages();
                if let Err(e) = self.render() {
                    log::error!("render failed: {e}");
                    event_loop.exit();
                }
                if self.should_exit {
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && !event.repeat =>
            {
                self.handle_key(event.physical_key, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, _event: ()) {
        self.drain_messages();
        if self.should_exit {
            event_loop.exit();
        }
    }
}

fn map_key(code: winit::keyboard::KeyCode) -> Option<KeyInput> {
    use winit::keyboard::KeyCode;
    match code {
        KeyCode::KeyZ => Some(KeyInput::Category(ResponseKey::Left)),
        KeyCode::KeyM => Some(KeyInput::Category(ResponseKey::Right)),
        KeyCode::Space => Some(KeyInput::Advance),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(KeyInput::Confirm),
        KeyCode::KeyP => Some(KeyInput::Preview),
        KeyCode::ArrowUp => Some(KeyInput::VolumeUp),
        KeyCode::ArrowDown => Some(KeyInput::VolumeDown),
        KeyCode::Escape => Some(KeyInput::Abort),
        _ => None,
    }
}
