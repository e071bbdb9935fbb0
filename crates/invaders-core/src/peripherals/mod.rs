//! Peripherals.

pub mod bus;
pub mod controller;
pub mod memory;
pub mod rom;
pub mod screen;
pub mod shift;

use self::{bus::Bus, memory::Memory, screen::Screen};

/// Peripherals.
pub struct Peripherals {
    /// Memory.
    pub memory: Memory,
    /// I/O bus and its devices.
    pub bus: Bus,
    /// Framebuffer.
    pub screen: Screen,
}

impl Peripherals {
    /// Create new peripherals.
    ///
    /// # Returns
    ///
    /// * Peripherals instance.
    ///
    pub fn new() -> Self {
        Peripherals {
            memory: Memory::new(),
            bus: Bus::new(),
            screen: Screen::new(),
        }
    }

    /// Unpack VRAM into the framebuffer.
    pub fn refresh_screen(&mut self) {
        self.screen.update_from_vram(&self.memory);
    }

    /// Reset peripherals.
    pub fn reset(&mut self) {
        self.memory.reset();
        self.bus.reset();
        self.screen.reset();
    }
}

impl Default for Peripherals {
    fn default() -> Self {
        Self::new()
    }
}
