//! Drivers.

use crate::emulator::{Emulator, EmulatorContext};
use crate::errors::CResult;
use crate::peripherals::controller::Controller;
use crate::peripherals::rom::Rom;

/// Window width.
pub const WINDOW_WIDTH: u32 = 448;
/// Window height.
pub const WINDOW_HEIGHT: u32 = 512;
/// Window title.
pub const WINDOW_TITLE: &str = "Space Invaders";

/// Window interface.
pub trait WindowInterface {
    /// Run emulator.
    fn run_emulator(
        &mut self,
        emulator: Emulator,
        emulator_ctx: EmulatorContext,
        rom: Rom,
    ) -> CResult;
}

/// Input interface.
pub trait InputInterface {
    /// Apply pending input events to the controller.
    fn update_input_state(&mut self, controller: &mut Controller);
}

/// Render interface.
pub trait RenderInterface {
    /// Render one framebuffer pixel.
    fn render_pixel(&mut self, x: usize, y: usize, on: bool) -> CResult;
}
