use crate::text::{render_text_pixmap, text_width, wrap_lines};
use ab_glyph::{Font, FontVec, ScaleFont};
use anyhow::{Result, anyhow};
use flanker_core::Color;
use flanker_experiment::{SessionConfig, Visual};
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::{Color as SkColor, Paint, Pixmap, PixmapPaint, Rect, Transform};

/// Colors and sizes the renderer needs, lifted from the session config.
#[derive(Debug, Clone)]
pub struct Style {
    pub background: Color,
    pub stimulus: Color,
    pub fixation: Color,
    pub text: Color,
    pub stim_height: f32,
    pub text_height: f32,
}

impl Style {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            background: config.background_color,
            stimulus: config.stim_color,
            fixation: config.fix_cross_color,
            text: config.text_color,
            stim_height: config.stim_height,
            text_height: config.text_height,
        }
    }
}

type TextKey = (String, u32, [u8; 4]);

struct TextCache {
    font: FontVec,
    map: HashMap<TextKey, Arc<Pixmap>>,
}

impl TextCache {
    fn new(font: FontVec) -> Self {
        Self {
            font,
            map: HashMap::new(),
        }
    }

    fn get_or_render(&mut self, text: &str, size_px: f32, color: Color) -> Option<Arc<Pixmap>> {
        let key = (text.to_string(), size_px.to_bits(), color.rgba());
        if let Some(p) = self.map.get(&key) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(text, size_px, &self.font, color.rgba())?);
        self.map.insert(key, Arc::clone(&pm));
        Some(pm)
    }

    fn line_height(&self, size_px: f32) -> f32 {
        let sf = self.font.as_scaled(size_px);
        sf.height() + sf.line_gap()
    }
}

/// Draws the cross as two bars, `size` px across.
pub fn fixation_pixmap(size: f32, color: Color) -> Option<Pixmap> {
    let extent = size.max(4.0).round();
    let bar = (extent / 10.0).round().max(2.0);
    let mut pm = Pixmap::new(extent as u32, extent as u32)?;

    let mut paint = Paint::default();
    paint.anti_alias = false;
    let [r, g, b, a] = color.rgba();
    paint.set_color(SkColor::from_rgba8(r, g, b, a));

    let h = Rect::from_xywh(0.0, (extent - bar) * 0.5, extent, bar)?;
    pm.fill_rect(h, &paint, Transform::identity(), None);
    let v = Rect::from_xywh((extent - bar) * 0.5, 0.0, bar, extent)?;
    pm.fill_rect(v, &paint, Transform::identity(), None);
    Some(pm)
}

/// Software renderer: composes queued visuals into an RGBA frame.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    center: (f32, f32),
    style: Style,
    canvas: Pixmap,
    text_cache: TextCache,
    fixation: Option<Pixmap>,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: FontVec, style: Style) -> Result<Self> {
        let canvas = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| anyhow!("Failed to create {width}x{height} canvas"))?;
        let fixation = fixation_pixmap(style.stim_height * 0.5, style.fixation);
        Ok(Self {
            width,
            height,
            center: (width as f32 / 2.0, height as f32 / 2.0),
            style,
            canvas,
            text_cache: TextCache::new(font),
            fixation,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.canvas = Pixmap::new(new_width.max(1), new_height.max(1))
            .ok_or_else(|| anyhow!("Failed to resize canvas pixmap"))?;
        self.width = new_width;
        self.height = new_height;
        self.center = (new_width as f32 / 2.0, new_height as f32 / 2.0);
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Clears to the background, draws `visuals` in order and copies the
    /// result into `frame` (RGBA8, `width * height * 4` bytes).
    pub fn render(&mut self, visuals: &[Visual], frame: &mut [u8]) -> Result<()> {
        let [r, g, b, a] = self.style.background.rgba();
        self.canvas.fill(SkColor::from_rgba8(r, g, b, a));

        for visual in visuals {
            match visual {
                Visual::Fixation => {
                    if let Some(cross) = self.fixation.take() {
                        self.blit_centered(&cross, self.center.1);
                        self.fixation = Some(cross);
                    }
                }
                Visual::Stimulus(stim) => {
                    let (size, color) = (self.style.stim_height, self.style.stimulus);
                    self.draw_line(stim.pattern(), size, color, self.center.1);
                }
                Visual::Feedback { correct } => {
                    let (size, color) = (self.style.text_height, self.style.text);
                    self.draw_line(Visual::feedback_text(*correct), size, color, self.center.1);
                }
                Visual::Message(text) => self.draw_message(text),
            }
        }

        let data = self.canvas.data();
        if frame.len() != data.len() {
            return Err(anyhow!(
                "frame buffer is {} bytes, canvas is {}",
                frame.len(),
                data.len()
            ));
        }
        frame.copy_from_slice(data);
        Ok(())
    }

    fn draw_message(&mut self, text: &str) {
        let size = self.style.text_height;
        let color = self.style.text;
        let font = &self.text_cache.font;
        let lines = wrap_lines(text, self.width as f32 * 0.9, |s| text_width(s, size, font));
        let line_height = self.text_cache.line_height(size);

        let block = line_height * lines.len() as f32;
        let mut cy = self.center.1 - block / 2.0 + line_height / 2.0;
        for line in &lines {
            self.draw_line(line, size, color, cy);
            cy += line_height;
        }
    }

    fn draw_line(&mut self, text: &str, size: f32, color: Color, cy: f32) {
        if let Some(pm) = self.text_cache.get_or_render(text, size, color) {
            self.blit_centered(&pm, cy);
        }
    }

    fn blit_centered(&mut self, pm: &Pixmap, cy: f32) {
        let x = (self.center.0 - pm.width() as f32 * 0.5).floor() as i32;
        let y = (cy - pm.height() as f32 * 0.5).floor() as i32;
        self.canvas.draw_pixmap(
            x,
            y,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}
