use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use anyhow::{Context, Result};
use audrt_core::{StimulusKind, TextColor};
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Rect,
    Transform,
};

use crate::scene::Scene;

const BACKGROUND: Color = Color::BLACK;

/// Font files probed in order when `AUDRT_FONT` is not set.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn load_font() -> Result<FontVec> {
    if let Ok(path) = std::env::var("AUDRT_FONT") {
        let bytes = std::fs::read(&path).with_context(|| format!("reading font {path}"))?;
        return FontVec::try_from_vec(bytes).with_context(|| format!("parsing font {path}"));
    }
    for path in FONT_CANDIDATES {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontVec::try_from_vec(bytes) {
                log::debug!("using font {path}");
                return Ok(font);
            }
        }
    }
    anyhow::bail!(
        "no usable system font found; set AUDRT_FONT to a .ttf file (tried {} locations)",
        FONT_CANDIDATES.len()
    )
}

fn skia_color(color: TextColor) -> Color {
    match color {
        TextColor::White => Color::from_rgba8(255, 255, 255, 255),
        TextColor::Green => Color::from_rgba8(40, 200, 80, 255),
        TextColor::Red => Color::from_rgba8(220, 60, 50, 255),
    }
}

/// Draws whole scenes into an owned pixmap the app copies to the surface.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    canvas: Pixmap,
    font: FontVec,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let canvas = Pixmap::new(width.max(1), height.max(1))
            .context("allocating render canvas")?;
        Ok(Self {
            width: width.max(1),
            height: height.max(1),
            canvas,
            font: load_font()?,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        if let Some(canvas) = Pixmap::new(self.width, self.height) {
            self.canvas = canvas;
        }
    }

    /// Renders `scene` and returns the finished frame.
    pub fn render(&mut self, scene: &Scene) -> &Pixmap {
        self.canvas.fill(BACKGROUND);
        match scene {
            Scene::Blank => {}
            Scene::Fixation => self.draw_fixation(),
            Scene::Stimulus(kind) => self.draw_stimulus(*kind),
            Scene::Text { content, color } => {
                self.draw_text_block(content, skia_color(*color));
            }
            Scene::Calibration { volume } => self.draw_calibration(*volume),
        }
        &self.canvas
    }

    pub fn frame(&self) -> &[u8] {
        self.canvas.data()
    }

    fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    fn white_paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(Color::WHITE);
        paint.anti_alias = true;
        paint
    }

    fn draw_fixation(&mut self) {
        let (cx, cy) = self.center();
        let arm = self.height as f32 * 0.05;
        let thickness = (self.height as f32 * 0.008).max(2.0);
        let paint = self.white_paint();

        let bars = [
            Rect::from_xywh(cx - arm, cy - thickness / 2.0, arm * 2.0, thickness),
            Rect::from_xywh(cx - thickness / 2.0, cy - arm, thickness, arm * 2.0),
        ];
        for bar in bars.into_iter().flatten() {
            self.canvas
                .fill_rect(bar, &paint, Transform::identity(), None);
        }
    }

    fn draw_stimulus(&mut self, kind: StimulusKind) {
        let (cx, cy) = self.center();
        let paint = self.white_paint();
        match kind {
            StimulusKind::Square => {
                let side = self.height as f32 * 0.2;
                if let Some(rect) =
                    Rect::from_xywh(cx - side / 2.0, cy - side / 2.0, side, side)
                {
                    self.canvas
                        .fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
            StimulusKind::Circle => {
                let radius = self.height as f32 * 0.1;
                let mut pb = PathBuilder::new();
                pb.push_circle(cx, cy, radius);
                if let Some(path) = pb.finish() {
                    self.canvas.fill_path(
                        &path,
                        &paint,
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
        }
    }

    fn draw_text_block(&mut self, text: &str, color: Color) {
        let lines: Vec<&str> = text.lines().collect();
        // Long passages (the consent form) drop to a smaller size so they
        // fit; prompts stay large.
        let px = if text.len() > 220 {
            (self.height as f32 * 0.028).max(12.0)
        } else {
            (self.height as f32 * 0.045).max(14.0)
        };
        let line_advance = px * 1.4;
        let block_height = line_advance * lines.len() as f32;
        let (cx, cy) = self.center();
        let mut y = cy - block_height / 2.0;

        for line in lines {
            if let Some(pm) = rasterize_line(&self.font, line, px, color) {
                let x = cx - pm.width() as f32 / 2.0;
                self.canvas.draw_pixmap(
                    x as i32,
                    y as i32,
                    pm.as_ref(),
                    &PixmapPaint::default(),
                    Transform::identity(),
                    None,
                );
            }
            y += line_advance;
        }
    }

    fn draw_calibration(&mut self, volume: f32) {
        let copy = "Adjust the noise volume with the UP/DOWN arrow keys.\n\
                    Press 'P' to play the noise and SPACE to confirm.\n\
                    The volume should be bothersome but not hurtful.";
        self.draw_text_block(copy, Color::WHITE);

        let (cx, cy) = self.center();
        let bar_w = self.width as f32 * 0.5;
        let bar_h = (self.height as f32 * 0.03).max(8.0);
        let y = cy + self.height as f32 * 0.18;

        let mut track = Paint::default();
        track.set_color(Color::from_rgba8(70, 70, 70, 255));
        if let Some(rect) = Rect::from_xywh(cx - bar_w / 2.0, y, bar_w, bar_h) {
            self.canvas
                .fill_rect(rect, &track, Transform::identity(), None);
        }

        let fill_w = bar_w * volume.clamp(0.0, 1.0);
        if fill_w > 0.5 {
            let paint = self.white_paint();
            if let Some(rect) = Rect::from_xywh(cx - bar_w / 2.0, y, fill_w, bar_h) {
                self.canvas
                    .fill_rect(rect, &paint, Transform::identity(), None);
            }
        }

        let label = format!("{:.0}%", volume.clamp(0.0, 1.0) * 100.0);
        if let Some(pm) = rasterize_line(&self.font, &label, bar_h * 1.2, Color::WHITE) {
            let x = cx - pm.width() as f32 / 2.0;
            self.canvas.draw_pixmap(
                x as i32,
                (y + bar_h * 1.6) as i32,
                pm.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }
}

/// Lays out and rasterizes one line of text into a tight pixmap.
fn rasterize_line(font: &FontVec, text: &str, px: f32, color: Color) -> Option<Pixmap> {
    if text.trim().is_empty() {
        return None;
    }

    let scale = PxScale::from(px);
    let sf = font.as_scaled(scale);

    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for g in &glyphs {
        if let Some(out) = font.outline_glyph(g.clone()) {
            let b = out.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
        }
    }
    if min_x == f32::INFINITY {
        return None;
    }

    let width = (max_x - min_x).ceil() as u32 + 2;
    let height = (max_y - min_y).ceil() as u32 + 2;
    let mut pm = Pixmap::new(width, height)?;

    let base = color.to_color_u8();
    let stride = pm.width() as usize;
    let pixels = pm.pixels_mut();
    for g in &glyphs {
        if let Some(out) = font.outline_glyph(g.clone()) {
            let b = out.px_bounds();
            let gx = (b.min.x - min_x) as i32 + 1;
            let gy = (b.min.y - min_y) as i32 + 1;
            out.draw(|x, y, coverage| {
                let px_x = gx + x as i32;
                let px_y = gy + y as i32;
                if px_x < 0 || px_y < 0 {
                    return;
                }
                let (px_x, px_y) = (px_x as usize, px_y as usize);
                if px_x >= stride || px_y >= height as usize {
                    return;
                }
                let c = coverage.clamp(0.0, 1.0);
                if let Some(p) = PremultipliedColorU8::from_rgba(
                    (base.red() as f32 * c) as u8,
                    (base.green() as f32 * c) as u8,
                    (base.blue() as f32 * c) as u8,
                    (255.0 * c) as u8,
                ) {
                    pixels[px_y * stride + px_x] = p;
                }
            });
        }
    }

    Some(pm)
}
