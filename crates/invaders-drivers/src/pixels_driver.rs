use invaders_core::drivers::RenderInterface;
use invaders_core::errors::CResult;
use invaders_core::peripherals::screen::SCREEN_WIDTH;

/// Render driver writing RGBA pixels into a `pixels` frame.
pub struct PixelsRenderDriver<'a> {
    frame: &'a mut [u8],
}

impl<'a> PixelsRenderDriver<'a> {
    pub fn new(frame: &'a mut [u8]) -> Self {
        Self { frame }
    }
}

impl<'a> RenderInterface for PixelsRenderDriver<'a> {
    fn render_pixel(&mut self, x: usize, y: usize, on: bool) -> CResult {
        let luma = if on { 0xFF } else { 0x00 };
        let cursor = (y * SCREEN_WIDTH + x) * 4;

        let slice = &mut self.frame[cursor..cursor + 4];
        slice.copy_from_slice(&[luma, luma, luma, 0xFF]);

        Ok(())
    }
}
