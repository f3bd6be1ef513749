use ab_glyph::FontVec;
use anyhow::{Result, anyhow};
use flanker_core::FlankerError;
use flanker_experiment::{
    Display, Input, KeyPress, Resolution, ScreenProbe, SessionConfig, Visual,
};
use flanker_render::{SkiaRenderer, Style};
use crate::signals::Interrupt;
use flanker_timing::{CalibrationStats, HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Fullscreen, Window, WindowId},
};

const WAIT_SLICE: Duration = Duration::from_millis(5);

/// Fullscreen window driven frame by frame: every flip renders the queued
/// visuals, presents them (vsync-blocking) and pumps pending OS events.
pub struct WindowFrontend {
    event_loop: EventLoop<()>,
    state: WindowState,
}

struct WindowState {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    font: Option<FontVec>,
    style: Style,
    timer: HighPrecisionTimer,
    last_flip: Option<u64>,
    queued: Vec<Visual>,
    keys: KeyQueue,
    refresh_rate: Option<f64>,
    error: Option<anyhow::Error>,
}

impl WindowFrontend {
    pub fn new(config: &SessionConfig, font: FontVec, interrupt: Interrupt) -> Result<Self> {
        let mut event_loop = EventLoop::new()?;
        let mut state = WindowState {
            window: None,
            pixels: None,
            renderer: None,
            font: Some(font),
            style: Style::from_config(config),
            timer: HighPrecisionTimer::new(),
            last_flip: None,
            queued: Vec::new(),
            keys: KeyQueue::new(config.abort_key.clone(), interrupt),
            refresh_rate: None,
            error: None,
        };

        for _ in 0..200 {
            if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(WAIT_SLICE), &mut state)
            {
                return Err(anyhow!("event loop exited during startup ({code})"));
            }
            if let Some(e) = state.error.take() {
                return Err(e);
            }
            if state.renderer.is_some() {
                return Ok(Self { event_loop, state });
            }
        }
        Err(anyhow!("window was not created"))
    }

    pub fn refresh_rate(&self) -> Option<f64> {
        self.state.refresh_rate
    }

    /// Frame-interval statistics over the most recent flips.
    pub fn frame_stats(&self) -> CalibrationStats {
        self.state.timer.calibration_stats()
    }

    fn pump(&mut self, timeout: Option<Duration>) -> flanker_core::Result<()> {
        if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(timeout, &mut self.state) {
            return Err(FlankerError::Environment(format!("event loop exited ({code})")));
        }
        let now = self.state.timer.now_secs();
        self.state.keys.check_interrupt(now);
        match self.state.error.take() {
            Some(e) => Err(FlankerError::Environment(e.to_string())),
            None => Ok(()),
        }
    }
}

impl Display for WindowFrontend {
    fn draw(&mut self, visual: &Visual) {
        self.state.queued.push(visual.clone());
    }

    fn flip(&mut self) -> flanker_core::Result<f64> {
        self.pump(Some(Duration::ZERO))?;
        let state = &mut self.state;
        let (Some(pixels), Some(renderer)) = (state.pixels.as_mut(), state.renderer.as_mut())
        else {
            return Err(FlankerError::Environment("window is gone".into()));
        };

        renderer
            .render(&state.queued, pixels.frame_mut())
            .map_err(|e| FlankerError::Environment(format!("render failed: {e}")))?;
        pixels
            .render()
            .map_err(|e| FlankerError::Environment(format!("present failed: {e}")))?;
        state.queued.clear();

        let now = state.timer.now();
        if let Some(last) = state.last_flip.replace(now) {
            state.timer.record_frame(Duration::from_nanos(now.saturating_sub(last)));
        }
        Ok(now as f64 / 1e9)
    }
}

impl Input for WindowFrontend {
    fn poll_keys(&mut self, allowed: &[&str]) -> Vec<KeyPress> {
        if let Err(e) = self.pump(Some(Duration::ZERO)) {
            warn!("event pump failed: {e}");
        }
        self.state.keys.take_allowed(allowed)
    }

    fn wait_keys(&mut self, allowed: &[&str]) -> flanker_core::Result<Vec<KeyPress>> {
        loop {
            self.pump(Some(WAIT_SLICE))?;
            let keys = self.state.keys.take_allowed(allowed);
            if !keys.is_empty() {
                return Ok(keys);
            }
        }
    }

    fn clear_events(&mut self) {
        if let Err(e) = self.pump(Some(Duration::ZERO)) {
            warn!("event pump failed: {e}");
        }
        self.state.keys.clear();
    }
}

impl ScreenProbe for WindowFrontend {
    fn resolution(&self) -> flanker_core::Result<Resolution> {
        let window = self
            .state
            .window
            .as_ref()
            .ok_or_else(|| FlankerError::Environment("no window".into()))?;
        let size = window
            .current_monitor()
            .map(|m| m.size())
            .unwrap_or_else(|| window.inner_size());
        if size.width == 0 || size.height == 0 {
            return Err(FlankerError::Environment(
                "cannot determine screen resolution".into(),
            ));
        }
        Ok(Resolution {
            width: size.width,
            height: size.height,
        })
    }
}

impl Drop for WindowFrontend {
    fn drop(&mut self) {
        if let Some(window) = &self.state.window {
            window.set_cursor_visible(true);
        }
    }
}

impl WindowState {
    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Flanker Task")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor.clone()))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale = window.scale_factor(),
            refresh_hz = self.refresh_rate,
            "display configured"
        );

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);

        let font = self
            .font
            .take()
            .ok_or_else(|| anyhow!("renderer already created"))?;
        self.renderer = Some(SkiaRenderer::new(
            size.width,
            size.height,
            font,
            self.style.clone(),
        )?);

        window.set_cursor_visible(false);
        self.window = Some(window);
        Ok(())
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) -> Result<()> {
        if new_size.width == 0 || new_size.height == 0 {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(new_size.width, new_size.height)?;
            pixels.resize_buffer(new_size.width, new_size.height)?;
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(new_size.width, new_size.height)?;
        }
        debug!(width = new_size.width, height = new_size.height, "display resized");
        Ok(())
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                self.error = Some(e.context("Failed to create window and surface"));
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                let at = self.timer.now_secs();
                self.keys.push_abort(at);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                if let Some(name) = key_name(&event.logical_key) {
                    let at = self.timer.now_secs();
                    self.keys.push(KeyPress::new(name, at));
                }
            }
            WindowEvent::Resized(size) => {
                if let Err(e) = self.handle_resize(size) {
                    self.error = Some(e);
                }
            }
            _ => {}
        }
    }
}

/// Presses collected between pumps. Window close and SIGINT both arrive here
/// as the configured abort key.
struct KeyQueue {
    pending: VecDeque<KeyPress>,
    abort_key: String,
    interrupt: Interrupt,
}

impl KeyQueue {
    fn new(abort_key: String, interrupt: Interrupt) -> Self {
        Self {
            pending: VecDeque::new(),
            abort_key,
            interrupt,
        }
    }

    fn push(&mut self, press: KeyPress) {
        self.pending.push_back(press);
    }

    fn push_abort(&mut self, at: f64) {
        self.pending.push_back(KeyPress::new(self.abort_key.clone(), at));
    }

    fn check_interrupt(&mut self, at: f64) {
        if self.interrupt.take() {
            self.push_abort(at);
        }
    }

    /// Drains the queue, keeping only presses of `allowed` keys.
    fn take_allowed(&mut self, allowed: &[&str]) -> Vec<KeyPress> {
        self.pending
            .drain(..)
            .filter(|k| allowed.contains(&k.key.as_str()))
            .collect()
    }

    // Abort presses survive clearing.
    fn clear(&mut self) {
        let abort = self.abort_key.as_str();
        self.pending.retain(|k| k.key == abort);
    }
}

/// Lowercase key names as used in the config file.
pub fn key_name(key: &Key) -> Option<String> {
    let name = match key {
        Key::Character(s) => return Some(s.to_lowercase()),
        Key::Named(NamedKey::Enter) => "return",
        Key::Named(NamedKey::Space) => "space",
        Key::Named(NamedKey::Escape) => "escape",
        Key::Named(NamedKey::Tab) => "tab",
        Key::Named(NamedKey::F1) => "f1",
        Key::Named(NamedKey::F2) => "f2",
        Key::Named(NamedKey::F3) => "f3",
        Key::Named(NamedKey::F4) => "f4",
        Key::Named(NamedKey::F5) => "f5",
        Key::Named(NamedKey::F6) => "f6",
        Key::Named(NamedKey::F7) => "f7",
        Key::Named(NamedKey::F8) => "f8",
        Key::Named(NamedKey::F9) => "f9",
        Key::Named(NamedKey::F10) => "f10",
        Key::Named(NamedKey::F11) => "f11",
        Key::Named(NamedKey::F12) => "f12",
        Key::Named(NamedKey::ArrowLeft) => "left",
        Key::Named(NamedKey::ArrowRight) => "right",
        _ => return None,
    };
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_match_config_spelling() {
        assert_eq!(key_name(&Key::Character("K".into())).as_deref(), Some("k"));
        assert_eq!(key_name(&Key::Named(NamedKey::F7)).as_deref(), Some("f7"));
        assert_eq!(key_name(&Key::Named(NamedKey::Enter)).as_deref(), Some("return"));
        assert_eq!(key_name(&Key::Named(NamedKey::Space)).as_deref(), Some("space"));
        assert_eq!(key_name(&Key::Named(NamedKey::Shift)), None);
    }

    #[test]
    fn interrupt_becomes_an_abort_press() {
        let interrupt = Interrupt::new();
        let mut keys = KeyQueue::new("f7".into(), interrupt.clone());
        keys.push(KeyPress::new("x", 0.5));

        keys.check_interrupt(1.0);
        assert!(keys.take_allowed(&["a", "k", "f7"]).is_empty());

        interrupt.raise();
        keys.check_interrupt(2.0);
        keys.check_interrupt(2.5);
        assert_eq!(keys.take_allowed(&["a", "k", "f7"]), vec![KeyPress::new("f7", 2.0)]);
    }

    #[test]
    fn clearing_keeps_a_pending_abort() {
        let mut keys = KeyQueue::new("f7".into(), Interrupt::new());
        keys.push(KeyPress::new("a", 0.1));
        keys.push_abort(0.2);
        keys.clear();
        assert_eq!(keys.take_allowed(&["a", "f7"]), vec![KeyPress::new("f7", 0.2)]);
    }
}
