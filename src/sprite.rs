//! Sprite decoding and half-block rendering into the terminal buffer.

use std::io::Cursor;

use image::{codecs::gif::GifDecoder, AnimationDecoder, GenericImageView};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Pixels below this alpha render as empty cells.
const ALPHA_THRESHOLD: u8 = 16;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteFrame {
    /// Raw RGBA bytes, row-major.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteData {
    pub frames: Vec<SpriteFrame>,
    pub width: u32,
    pub height: u32,
}

impl SpriteData {
    pub fn frame(&self, index: usize) -> Option<&SpriteFrame> {
        if self.frames.is_empty() {
            return None;
        }
        self.frames.get(index % self.frames.len())
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }
}

impl SpriteFrame {
    fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        let px = self.pixels.get(offset..offset + 4)?;
        Some((px[0], px[1], px[2], px[3]))
    }
}

pub fn decode_sprite(bytes: &[u8], url: &str) -> Result<SpriteData, String> {
    if is_gif(bytes, url) {
        let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(|err| err.to_string())?;
        let frames = decoder
            .into_frames()
            .collect_frames()
            .map_err(|err| err.to_string())?;
        let mut sprite_frames = Vec::new();
        for frame in frames {
            let buffer = frame.into_buffer();
            let (width, height) = buffer.dimensions();
            sprite_frames.push(SpriteFrame {
                pixels: buffer.into_raw(),
                width,
                height,
            });
        }
        if let Some(first) = sprite_frames.first() {
            let (width, height) = (first.width, first.height);
            return Ok(SpriteData {
                frames: sprite_frames,
                width,
                height,
            });
        }
    }

    let image = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let (width, height) = image.dimensions();
    Ok(SpriteData {
        frames: vec![SpriteFrame {
            pixels: image.to_rgba8().into_raw(),
            width,
            height,
        }],
        width,
        height,
    })
}

/// Draw a frame into `area` using half-block cells, one cell per 1x2
/// pixel block. The sprite is scaled to fit and centered.
pub fn blit(frame: &SpriteFrame, buf: &mut Buffer, area: Rect) {
    if area.width == 0 || area.height == 0 || frame.width == 0 || frame.height == 0 {
        return;
    }

    // Available pixel grid: each cell is one pixel wide and two tall.
    let max_px_w = area.width as u32;
    let max_px_h = area.height as u32 * 2;
    let scale_num = (max_px_w * frame.height).min(max_px_h * frame.width);
    let out_w = (scale_num / frame.height).max(1).min(frame.width.max(1));
    let out_h = (out_w * frame.height / frame.width).max(1);

    let cell_w = out_w.min(max_px_w) as u16;
    let cell_h = (out_h.div_ceil(2)).min(area.height as u32) as u16;
    let x0 = area.x + (area.width - cell_w) / 2;
    let y0 = area.y + (area.height - cell_h) / 2;

    for cy in 0..cell_h {
        for cx in 0..cell_w {
            let src_x = cx as u32 * frame.width / out_w;
            let top_y = (cy as u32 * 2) * frame.height / out_h;
            let bot_y = (cy as u32 * 2 + 1) * frame.height / out_h;

            let top = frame.pixel(src_x, top_y).filter(|px| px.3 >= ALPHA_THRESHOLD);
            let bottom = frame.pixel(src_x, bot_y).filter(|px| px.3 >= ALPHA_THRESHOLD);

            let Some(cell) = buf.cell_mut((x0 + cx, y0 + cy)) else {
                continue;
            };
            match (top, bottom) {
                (Some(t), Some(b)) => {
                    cell.set_symbol("▀")
                        .set_fg(Color::Rgb(t.0, t.1, t.2))
                        .set_bg(Color::Rgb(b.0, b.1, b.2));
                }
                (Some(t), None) => {
                    cell.set_symbol("▀").set_fg(Color::Rgb(t.0, t.1, t.2));
                }
                (None, Some(b)) => {
                    cell.set_symbol("▄").set_fg(Color::Rgb(b.0, b.1, b.2));
                }
                (None, None) => {}
            }
        }
    }
}

fn is_gif(bytes: &[u8], url: &str) -> bool {
    if url.ends_with(".gif") {
        return true;
    }
    bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, rgba: [u8; 4]) -> SpriteFrame {
        SpriteFrame {
            pixels: rgba
                .iter()
                .copied()
                .cycle()
                .take((width * height * 4) as usize)
                .collect(),
            width,
            height,
        }
    }

    #[test]
    fn frame_wraps_around() {
        let data = SpriteData {
            frames: vec![solid_frame(2, 2, [1, 2, 3, 255]), solid_frame(2, 2, [9, 9, 9, 255])],
            width: 2,
            height: 2,
        };
        assert_eq!(data.frame(0), data.frame(2));
        assert_ne!(data.frame(0), data.frame(1));
    }

    #[test]
    fn empty_sprite_has_no_frame() {
        let data = SpriteData {
            frames: Vec::new(),
            width: 0,
            height: 0,
        };
        assert!(data.frame(0).is_none());
    }

    #[test]
    fn blit_fills_opaque_cells() {
        let frame = solid_frame(4, 4, [200, 10, 10, 255]);
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        blit(&frame, &mut buf, area);
        let cell = buf.cell((0, 0)).unwrap();
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(200, 10, 10));
        assert_eq!(cell.bg, Color::Rgb(200, 10, 10));
    }

    #[test]
    fn blit_skips_transparent_pixels() {
        let frame = solid_frame(4, 4, [200, 10, 10, 0]);
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        blit(&frame, &mut buf, area);
        assert_eq!(buf.cell((0, 0)).unwrap().symbol(), " ");
    }
}
