use std::time::{Duration, Instant};

use audrt_core::KeyInput;
use audrt_experiment::{DisplayError, Frontend};
use audrt_render::Scene;
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};
use winit::event_loop::EventLoopProxy;

/// A key event as the window thread saw it, stamped at arrival so channel
/// latency never inflates reaction times.
#[derive(Debug, Clone, Copy)]
pub struct KeyStamp {
    pub key: KeyInput,
    pub at: Instant,
}

/// Messages from the engine thread to the window.
#[derive(Debug)]
pub enum FrontendMsg {
    Scene(Scene),
    Exit,
}

/// Engine-side frontend: scenes go down a channel to the winit loop (with a
/// proxy wakeup), timestamped keys come back up. A dead window counts as an
/// abort so the engine can wind down and flush.
pub struct WinitFrontend {
    scene_tx: Sender<FrontendMsg>,
    key_rx: Receiver<KeyStamp>,
    proxy: EventLoopProxy<()>,
}

impl WinitFrontend {
    pub fn new(
        scene_tx: Sender<FrontendMsg>,
        key_rx: Receiver<KeyStamp>,
        proxy: EventLoopProxy<()>,
    ) -> Self {
        Self {
            scene_tx,
            key_rx,
            proxy,
        }
    }

    fn send(&mut self, scene: Scene) -> Result<(), DisplayError> {
        self.scene_tx
            .send(FrontendMsg::Scene(scene))
            .map_err(|_| DisplayError("window closed".into()))?;
        let _ = self.proxy.send_event(());
        Ok(())
    }

    /// Tells the window to shut down once the session is over.
    pub fn shutdown(&mut self) {
        let _ = self.scene_tx.send(FrontendMsg::Exit);
        let _ = self.proxy.send_event(());
    }
}

impl Frontend for WinitFrontend {
    fn render_fixation(&mut self) -> Result<(), DisplayError> {
        self.send(Scene::Fixation)
    }

    fn render_stimulus(&mut self, kind: audrt_core::StimulusKind) -> Result<(), DisplayError> {
        self.send(Scene::Stimulus(kind))
    }

    fn render_text(
        &mut self,
        text: &str,
        color: audrt_core::TextColor,
    ) -> Result<(), DisplayError> {
        self.send(Scene::Text {
            content: text.to_owned(),
            color,
        })
    }

    fn render_calibration(&mut self, volume: f32) -> Result<(), DisplayError> {
        self.send(Scene::Calibration { volume })
    }

    fn flush_input(&mut self) {
        while self.key_rx.try_recv().is_ok() {}
    }

    fn wait_key(
        &mut self,
        timeout: Option<Duration>,
        allowed: &[KeyInput],
    ) -> Option<(KeyInput, Duration)> {
        let start = Instant::now();
        loop {
            let event = match timeout {
                Some(window) => {
                    let remaining = window.checked_sub(start.elapsed())?;
                    match self.key_rx.recv_timeout(remaining) {
                        Ok(event) => event,
                        Err(RecvTimeoutError::Timeout) => return None,
                        Err(RecvTimeoutError::Disconnected) => {
                            return Some((KeyInput::Abort, start.elapsed()))
                        }
                    }
                }
                None => match self.key_rx.recv() {
                    Ok(event) => event,
                    Err(_) => return Some((KeyInput::Abort, start.elapsed())),
                },
            };

            // Non-allowed keys are discarded; FIFO order means the first
            // chronological allowed key wins.
            if allowed.contains(&event.key) {
                return Some((event.key, event.at.saturating_duration_since(start)));
            }
        }
    }
}
