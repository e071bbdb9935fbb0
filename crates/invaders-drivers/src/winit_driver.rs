use std::time::{Duration, Instant};

use invaders_core::{
    drivers::{InputInterface, WindowInterface, WINDOW_HEIGHT, WINDOW_TITLE, WINDOW_WIDTH},
    emulator::{EmulationState, Emulator, EmulatorContext},
    errors::CResult,
    peripherals::{
        controller::{Button, Controller, Player},
        rom::Rom,
        screen::{SCREEN_HEIGHT, SCREEN_WIDTH},
    },
};
pub use pixels;
use pixels::{Pixels, SurfaceTexture};
pub use winit;
use winit::{
    dpi::LogicalSize,
    event::VirtualKeyCode,
    event_loop::{ControlFlow, EventLoop},
    window::Window,
};
use winit_input_helper::WinitInputHelper;

use super::pixels_driver::PixelsRenderDriver;

/// Half-frame period: two interrupts per 60 Hz frame.
const HALF_FRAME: Duration = Duration::from_micros(1_000_000 / 120);

/// Cabinet key map.
const KEY_MAP: [(VirtualKeyCode, Button); 9] = [
    (VirtualKeyCode::C, Button::Coin),
    (VirtualKeyCode::Key1, Button::Start1P),
    (VirtualKeyCode::Key2, Button::Start2P),
    (VirtualKeyCode::Left, Button::Left(Player::One)),
    (VirtualKeyCode::Right, Button::Right(Player::One)),
    (VirtualKeyCode::Space, Button::Fire(Player::One)),
    (VirtualKeyCode::A, Button::Left(Player::Two)),
    (VirtualKeyCode::D, Button::Right(Player::Two)),
    (VirtualKeyCode::S, Button::Fire(Player::Two)),
];

/// Window driver for winit.
#[derive(Default)]
pub struct WinitWindowDriver;

/// Input driver for winit.
pub struct WinitInputDriver {
    helper: WinitInputHelper,
}

impl Default for WinitInputDriver {
    fn default() -> Self {
        Self {
            helper: WinitInputHelper::new(),
        }
    }
}

impl WinitWindowDriver {
    /// Creates new driver.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn create_window(&mut self) -> CResult<(EventLoop<()>, Window)> {
        let event_loop = EventLoop::new();
        let sz = LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT);
        let window = winit::window::WindowBuilder::new()
            .with_title(WINDOW_TITLE)
            .with_inner_size(sz)
            .with_min_inner_size(sz)
            .build(&event_loop)?;

        Ok((event_loop, window))
    }
}

impl WinitInputDriver {
    /// Creates new driver.
    pub fn new() -> Self {
        Default::default()
    }

    /// Get helper.
    pub fn helper(&mut self) -> &mut WinitInputHelper {
        &mut self.helper
    }
}

impl WindowInterface for WinitWindowDriver {
    fn run_emulator(
        &mut self,
        mut emulator: Emulator,
        mut emulator_ctx: EmulatorContext,
        rom: Rom,
    ) -> CResult {
        let (event_loop, window) = self.create_window()?;

        let mut pixels = {
            let window_size = window.inner_size();
            let surface_texture =
                SurfaceTexture::new(window_size.width, window_size.height, &window);
            Pixels::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, surface_texture)?
        };

        let mut input = WinitInputDriver::new();
        emulator_ctx.prepare_tracefile(&emulator.cpu.tracefile);

        let mut last_half_frame = Instant::now();

        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Poll;

            if let winit::event::Event::RedrawRequested(_) = event {
                let mut render_driver = PixelsRenderDriver::new(pixels.get_frame());
                emulator
                    .cpu
                    .peripherals
                    .screen
                    .render_pixels(&mut render_driver)
                    .expect("render error");

                if pixels.render().is_err() {
                    *control_flow = ControlFlow::Exit;
                    return;
                }
            }

            if input.helper().update(&event) {
                if input.helper().quit() || input.helper().key_pressed(VirtualKeyCode::Escape) {
                    *control_flow = ControlFlow::Exit;
                    return;
                } else if input.helper().key_pressed(VirtualKeyCode::F5) {
                    emulator.reset(&rom);
                    println!("reset");
                } else if input.helper().key_pressed(VirtualKeyCode::F6) {
                    emulator.save_state(rom.get_title());
                    println!("state saved");
                } else if input.helper().key_pressed(VirtualKeyCode::F7) {
                    match emulator.load_state(rom.get_title()) {
                        Ok(()) => println!("state loaded"),
                        Err(e) => eprintln!("error: {}", e),
                    }
                }

                input.update_input_state(&mut emulator.cpu.peripherals.bus.controller);

                // Run the core one half-frame at a time, paced against the
                // wall clock.
                if last_half_frame.elapsed() >= HALF_FRAME {
                    last_half_frame = Instant::now();

                    loop {
                        match emulator.step(&mut emulator_ctx) {
                            EmulationState::Quit => {
                                *control_flow = ControlFlow::Exit;
                                break;
                            }
                            EmulationState::Frame => {
                                window.request_redraw();
                                break;
                            }
                            EmulationState::Normal => (),
                        }
                    }
                }
            }
        });
    }
}

impl InputInterface for WinitInputDriver {
    fn update_input_state(&mut self, controller: &mut Controller) {
        for (key, button) in &KEY_MAP {
            if self.helper.key_pressed(*key) {
                controller.press(*button);
            }

            if self.helper.key_released(*key) {
                controller.release(*button);
            }
        }
    }
}
