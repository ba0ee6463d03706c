//! Waveform strips
//!
//! Draws one strip per voice into a pixel surface owned by the GUI, one
//! sample per column starting at the voice's current fetch position. The
//! walk follows the DMA reload into the latched region but never writes the
//! voice back.
//!
//! Idle voices get a flat centre line, drawn once when they go idle and then
//! left alone until they play again.

use crate::bank::ScopeBank;
use crate::config::ScopeLayout;
use crate::constants::SCOPE_SAMPLE_SHIFT;

/// Something the scopes can be drawn into
pub trait PixelTarget {
    /// Set one pixel. Out-of-bounds coordinates are ignored.
    fn put_pixel(&mut self, x: usize, y: usize, color: u32);

    /// Fill a rectangle.
    fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize, color: u32) {
        for row in y..y + height {
            self.h_line(x, row, width, color);
        }
    }

    /// Draw a horizontal line.
    fn h_line(&mut self, x: usize, y: usize, width: usize, color: u32) {
        for col in x..x + width {
            self.put_pixel(col, y, color);
        }
    }
}

/// Row-major 32-bit frame buffer
#[derive(Debug)]
pub struct FrameBuffer<'a> {
    pixels: &'a mut [u32],
    stride: usize,
}

impl<'a> FrameBuffer<'a> {
    /// Wrap `pixels`, `stride` pixels per row.
    pub fn new(pixels: &'a mut [u32], stride: usize) -> Self {
        Self { pixels, stride }
    }

    /// Read back one pixel.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.stride {
            return None;
        }
        self.pixels.get(y * self.stride + x).copied()
    }
}

impl PixelTarget for FrameBuffer<'_> {
    #[inline]
    fn put_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x >= self.stride {
            return;
        }
        if let Some(pixel) = self.pixels.get_mut(y * self.stride + x) {
            *pixel = color;
        }
    }
}

/// Scope colours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopePalette {
    /// Strip background
    pub background: u32,
    /// Waveform and idle line
    pub foreground: u32,
}

impl Default for ScopePalette {
    fn default() -> Self {
        Self {
            background: 0x000000,
            foreground: 0xFFFFFF,
        }
    }
}

/// Draws the four scope strips
#[derive(Debug, Clone, Default)]
pub struct ScopeRenderer {
    layout: ScopeLayout,
    palette: ScopePalette,
}

impl ScopeRenderer {
    /// Create a renderer for the given strip placement.
    pub fn new(layout: ScopeLayout) -> Self {
        Self {
            layout,
            palette: ScopePalette::default(),
        }
    }

    /// Use the GUI's colours.
    pub fn with_palette(mut self, palette: ScopePalette) -> Self {
        self.palette = palette;
        self
    }

    /// Strip placement.
    pub fn layout(&self) -> &ScopeLayout {
        &self.layout
    }

    /// Draw every voice's strip.
    pub fn draw(&self, bank: &ScopeBank, target: &mut impl PixelTarget) {
        let _busy = bank.displaying().enter();

        let ScopeLayout {
            y, width, height, ..
        } = self.layout;
        let center_y = self.layout.center_y();
        // Rows above and below the centre line that still lie in the strip
        let max_up = (height / 2) as i32;
        let max_down = (height.saturating_sub(1) - height / 2) as i32;
        let ScopePalette {
            background,
            foreground,
        } = self.palette;

        for (ch, slot) in bank.slots().iter().enumerate() {
            let scope_x = self.layout.channel_x(ch);
            let voice = slot.load();

            if voice.is_audible() {
                slot.set_empty_scope_drawn(false);
                target.fill_rect(scope_x, y, width, height, background);

                let volume = -((voice.volume as i32) << 7);
                for (x, sample) in voice.cursor(bank.arena()).take(width).enumerate() {
                    let offset = ((sample as i32 * volume) >> SCOPE_SAMPLE_SHIFT)
                        .clamp(-max_up, max_down);
                    let row = center_y as i32 + offset;
                    target.put_pixel(scope_x + x, row as usize, foreground);
                }
            } else if !slot.empty_scope_drawn() {
                target.fill_rect(scope_x, y, width, height, background);
                target.h_line(scope_x, center_y, width, foreground);
                slot.set_empty_scope_drawn(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::SampleArena;
    use std::sync::Arc;

    const W: usize = 320;
    const H: usize = 100;
    const BG: u32 = 0x111111;
    const FG: u32 = 0x22FF22;

    /// Counts every pixel write
    struct CountingTarget {
        writes: usize,
    }

    impl PixelTarget for CountingTarget {
        fn put_pixel(&mut self, _x: usize, _y: usize, _color: u32) {
            self.writes += 1;
        }
    }

    fn renderer() -> ScopeRenderer {
        ScopeRenderer::new(ScopeLayout::default()).with_palette(ScopePalette {
            background: BG,
            foreground: FG,
        })
    }

    fn bank() -> ScopeBank {
        ScopeBank::new(Arc::new(SampleArena::new(64, 64)), 1.0)
    }

    #[test]
    fn test_idle_strip_is_a_centre_line() {
        let bank = bank();
        let mut pixels = vec![0u32; W * H];
        let mut fb = FrameBuffer::new(&mut pixels, W);
        renderer().draw(&bank, &mut fb);

        let layout = ScopeLayout::default();
        for ch in 0..4 {
            let x = layout.channel_x(ch);
            assert_eq!(fb.pixel(x, layout.center_y()), Some(FG));
            assert_eq!(fb.pixel(x + 39, layout.center_y()), Some(FG));
            assert_eq!(fb.pixel(x, layout.y), Some(BG));
            assert_eq!(fb.pixel(x + 40, layout.center_y()), Some(0));
        }
    }

    #[test]
    fn test_idle_placeholder_drawn_once() {
        let bank = bank();
        let renderer = renderer();
        let mut target = CountingTarget { writes: 0 };

        renderer.draw(&bank, &mut target);
        let first = target.writes;
        assert_eq!(first, 4 * (40 * 33 + 40));

        renderer.draw(&bank, &mut target);
        renderer.draw(&bank, &mut target);
        assert_eq!(target.writes, first);
    }

    #[test]
    fn test_placeholder_redrawn_after_next_stop() {
        let bank = bank();
        let renderer = renderer();
        let mut target = CountingTarget { writes: 0 };
        renderer.draw(&bank, &mut target);

        bank.set_volume(0, 64);
        bank.trigger(0, Some(0), 16);
        renderer.draw(&bank, &mut target);
        assert!(!bank.slot(0).empty_scope_drawn());

        bank.stop_voice(0);
        let before = target.writes;
        renderer.draw(&bank, &mut target);
        assert_eq!(target.writes - before, 40 * 33 + 40);
        assert!(bank.slot(0).empty_scope_drawn());
    }

    #[test]
    fn test_waveform_rows_follow_samples() {
        let bank = bank();
        // Full volume: offset = (s * -8192) >> 16 = -s / 8 (rounded down)
        bank.arena().write(0, &[0, 64, -64, 127, -128]);
        bank.set_volume(1, 64);
        bank.trigger(1, Some(0), 5);

        let mut pixels = vec![0u32; W * H];
        let mut fb = FrameBuffer::new(&mut pixels, W);
        renderer().draw(&bank, &mut fb);

        let layout = ScopeLayout::default();
        let x = layout.channel_x(1);
        let c = layout.center_y();
        assert_eq!(fb.pixel(x, c), Some(FG));
        assert_eq!(fb.pixel(x + 1, c - 8), Some(FG));
        assert_eq!(fb.pixel(x + 2, c + 8), Some(FG));
        assert_eq!(fb.pixel(x + 3, c - 16), Some(FG));
        assert_eq!(fb.pixel(x + 4, c + 16), Some(FG));
        // Region loops back to the first sample
        assert_eq!(fb.pixel(x + 5, c), Some(FG));
        assert_eq!(fb.pixel(x + 1, c), Some(BG));
    }

    #[test]
    fn test_even_height_strip_stays_inside() {
        let layout = ScopeLayout {
            y: 10,
            height: 32,
            ..ScopeLayout::default()
        };
        let renderer = ScopeRenderer::new(layout).with_palette(ScopePalette {
            background: BG,
            foreground: FG,
        });
        let bank = bank();
        bank.arena().write(0, &[-128, 127, -128, 127]);
        bank.set_volume(0, 64);
        bank.trigger(0, Some(0), 4);

        let mut pixels = vec![0u32; W * H];
        let mut fb = FrameBuffer::new(&mut pixels, W);
        renderer.draw(&bank, &mut fb);

        let x = layout.channel_x(0);
        // -128 pins to the bottom row, 127 reaches the top row
        assert_eq!(fb.pixel(x, layout.y + 31), Some(FG));
        assert_eq!(fb.pixel(x + 1, layout.y), Some(FG));
        for col in 0..layout.width {
            assert_eq!(fb.pixel(x + col, layout.y + layout.height), Some(0));
            assert_eq!(fb.pixel(x + col, layout.y - 1), Some(0));
        }
    }

    #[test]
    fn test_drawing_does_not_move_voices() {
        let bank = bank();
        bank.set_volume(0, 64);
        bank.trigger(0, Some(0), 8);
        bank.set_data(0, Some(32));
        let before = bank.voice(0);

        let mut target = CountingTarget { writes: 0 };
        renderer().draw(&bank, &mut target);
        assert_eq!(bank.voice(0), before);
        assert!(!bank.displaying().is_busy());
    }

    #[test]
    fn test_framebuffer_ignores_out_of_bounds() {
        let mut pixels = vec![0u32; 4 * 4];
        let mut fb = FrameBuffer::new(&mut pixels, 4);
        fb.put_pixel(4, 0, 1);
        fb.put_pixel(0, 4, 1);
        assert!(pixels.iter().all(|&p| p == 0));
    }
}
