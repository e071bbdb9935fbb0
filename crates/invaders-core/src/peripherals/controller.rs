//! Player controller ports.
//!
//! Port layouts:
//!
//! * Port 1: bit 0 coin (active high), bit 1 P2 start, bit 2 P1 start,
//!   bit 3 always 1, bit 4 P1 fire, bit 5 P1 left, bit 6 P1 right.
//! * Port 2: bits 0-1 lives DIP, bit 3 bonus-life DIP, bit 4 P2 fire,
//!   bit 5 P2 left, bit 6 P2 right.

use nanoserde::{DeBin, SerBin};

use crate::core::types::I8Byte;

/// Player selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    /// Player one.
    One,
    /// Player two.
    Two,
}

/// Cabinet button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Coin slot.
    Coin,
    /// One-player start.
    Start1P,
    /// Two-player start.
    Start2P,
    /// Fire button.
    Fire(Player),
    /// Move left.
    Left(Player),
    /// Move right.
    Right(Player),
}

/// Cabinet DIP switches, encoded into the low bits of port 2.
#[derive(Clone, SerBin, DeBin)]
pub struct DipSwitches {
    /// Number of lives, 3 to 6.
    pub lives: I8Byte,
    /// Bonus life at 1000 points instead of 1500.
    pub bonus_at_1000: bool,
}

impl Default for DipSwitches {
    fn default() -> Self {
        DipSwitches {
            lives: 3,
            bonus_at_1000: false,
        }
    }
}

impl DipSwitches {
    /// Encode the switches into the port-2 base value.
    ///
    /// # Returns
    ///
    /// * Port bits.
    ///
    fn to_port_bits(&self) -> I8Byte {
        let lives = self.lives.clamp(3, 6) - 3;
        lives | ((self.bonus_at_1000 as I8Byte) << 3)
    }
}

/// Player input ports.
#[derive(Clone, SerBin, DeBin)]
pub struct Controller {
    p1: I8Byte,
    p2: I8Byte,
    coin_latched: bool,
    dip: DipSwitches,
}

// Port 1 bits.
const P1_COIN: I8Byte = 0x01;
const P1_START_2P: I8Byte = 0x02;
const P1_START_1P: I8Byte = 0x04;
const P1_FIXED: I8Byte = 0x08;
const FIRE: I8Byte = 0x10;
const LEFT: I8Byte = 0x20;
const RIGHT: I8Byte = 0x40;

impl Default for Controller {
    fn default() -> Self {
        Self::new(DipSwitches::default())
    }
}

impl Controller {
    /// Create a controller with the given DIP switch settings.
    ///
    /// # Arguments
    ///
    /// * `dip` - DIP switches.
    ///
    /// # Returns
    ///
    /// * Controller instance.
    ///
    pub fn new(dip: DipSwitches) -> Self {
        Controller {
            p1: P1_FIXED,
            p2: dip.to_port_bits(),
            coin_latched: false,
            dip,
        }
    }

    /// Port 1 register.
    ///
    /// # Returns
    ///
    /// * Port value.
    ///
    pub fn p1(&self) -> I8Byte {
        self.p1
    }

    /// Port 2 register.
    ///
    /// # Returns
    ///
    /// * Port value.
    ///
    pub fn p2(&self) -> I8Byte {
        self.p2
    }

    /// Press a button.
    ///
    /// A held coin registers once: it must be released before the next
    /// insertion counts.
    ///
    /// # Arguments
    ///
    /// * `button` - Button.
    ///
    pub fn press(&mut self, button: Button) {
        match button {
            Button::Coin => {
                if !self.coin_latched {
                    self.p1 |= P1_COIN;
                    self.coin_latched = true;
                }
            }
            Button::Start1P => self.p1 |= P1_START_1P,
            Button::Start2P => self.p1 |= P1_START_2P,
            Button::Fire(player) => self.set_player_bit(player, FIRE, true),
            Button::Left(player) => self.set_player_bit(player, LEFT, true),
            Button::Right(player) => self.set_player_bit(player, RIGHT, true),
        }
    }

    /// Release a button.
    ///
    /// # Arguments
    ///
    /// * `button` - Button.
    ///
    pub fn release(&mut self, button: Button) {
        match button {
            Button::Coin => {
                self.p1 &= !P1_COIN;
                self.coin_latched = false;
            }
            Button::Start1P => self.p1 &= !P1_START_1P,
            Button::Start2P => self.p1 &= !P1_START_2P,
            Button::Fire(player) => self.set_player_bit(player, FIRE, false),
            Button::Left(player) => self.set_player_bit(player, LEFT, false),
            Button::Right(player) => self.set_player_bit(player, RIGHT, false),
        }
    }

    fn set_player_bit(&mut self, player: Player, bit: I8Byte, on: bool) {
        let port = match player {
            Player::One => &mut self.p1,
            Player::Two => &mut self.p2,
        };

        if on {
            *port |= bit;
        } else {
            *port &= !bit;
        }
    }

    /// Reset the ports, keeping the DIP switches.
    pub fn reset(&mut self) {
        self.p1 = P1_FIXED;
        self.p2 = self.dip.to_port_bits();
        self.coin_latched = false;
    }
}
