use ab_glyph::{Font, Glyph, PxScale, ScaleFont, point};
use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Horizontal advance of `text` at `font_size`, kerning included.
pub fn text_width<F: Font>(text: &str, font_size: f32, font: &F) -> f32 {
    let sf = font.as_scaled(PxScale::from(font_size));
    let mut width = 0.0;
    let mut prev = None;
    for ch in text.chars() {
        let id = sf.glyph_id(ch);
        if let Some(prev) = prev {
            width += sf.kern(prev, id);
        }
        width += sf.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Rasterizes one line of text into a transparent premultiplied pixmap.
///
/// The pixmap spans the full ascent-to-descent height so stacked lines
/// share a baseline grid. `None` for empty text.
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: [u8; 4],
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = sf.glyph_id(ch);
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

    let w = pen_x.ceil() as u32;
    let h = (sf.ascent() - sf.descent()).ceil() as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    for g in glyphs {
        let Some(out) = font.outline_glyph(g) else {
            continue;
        };
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = x as i32 + b.min.x.floor() as i32;
            let iy = y as i32 + b.min.y.floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // Premultiply by coverage, then composite over what is there.
            let a_lin = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a_lin * 255.0) as u8;
            let inv = 1.0 - (sa as f32 / 255.0);
            let bg = dst[i];
            let r = ((color[0] as f32 * a_lin) as u8).saturating_add((bg.red() as f32 * inv) as u8);
            let g = ((color[1] as f32 * a_lin) as u8).saturating_add((bg.green() as f32 * inv) as u8);
            let bl = ((color[2] as f32 * a_lin) as u8).saturating_add((bg.blue() as f32 * inv) as u8);
            let a = sa.saturating_add((bg.alpha() as f32 * inv) as u8);
            if let Some(px) = PremultipliedColorU8::from_rgba(r.min(a), g.min(a), bl.min(a), a) {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

/// Greedy word wrap. Explicit newlines are kept; a single word wider than
/// `max_width` gets a line of its own.
pub fn wrap_lines(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.trim_end_matches(['\n', '\r']).split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if measure(&candidate) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            }
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_lines("press the key on the left", 10.0, chars);
        assert_eq!(lines, vec!["press the", "key on the", "left"]);
    }

    #[test]
    fn keeps_explicit_breaks_and_blank_lines() {
        let lines = wrap_lines("Break\n\nBlock 1 of 2\n", 80.0, chars);
        assert_eq!(lines, vec!["Break", "", "Block 1 of 2"]);
    }

    #[test]
    fn overlong_word_stands_alone() {
        let lines = wrap_lines("a incomprehensibilities b", 5.0, chars);
        assert_eq!(lines, vec!["a", "incomprehensibilities", "b"]);
    }
}
