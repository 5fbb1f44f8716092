/*++

Licensed under the Apache-2.0 license.

File Name:

    logic.rs

Abstract:

    File contains four-state logic values and the SPI signal set.

--*/

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// Resolved binary level of a line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    pub fn is_low(self) -> bool {
        self == Level::Low
    }

    /// Numeric value of the level, as shifted into a register.
    pub fn bit(self) -> u32 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(value: Level) -> Self {
        value.is_high()
    }
}

/// Value observed on a wire.
///
/// `X` is a conflicting or uninitialized value and `Z` an undriven line. Both
/// are resolved to a per-signal default by whoever samples the line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logic {
    Zero,
    One,
    X,
    #[default]
    Z,
}

impl Logic {
    pub fn is_defined(self) -> bool {
        matches!(self, Logic::Zero | Logic::One)
    }

    /// Resolve to a binary level, substituting `default` for `X` and `Z`.
    pub fn resolve(self, default: Level) -> Level {
        match self {
            Logic::Zero => Level::Low,
            Logic::One => Level::High,
            Logic::X | Logic::Z => default,
        }
    }
}

impl From<Level> for Logic {
    fn from(value: Level) -> Self {
        match value {
            Level::Low => Logic::Zero,
            Level::High => Logic::One,
        }
    }
}

impl From<bool> for Logic {
    fn from(value: bool) -> Self {
        Level::from(value).into()
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'x',
            Logic::Z => 'z',
        };
        write!(f, "{c}")
    }
}

/// The four SPI lines, numbered by their position on the `uio` pin bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SpiSignal {
    Miso = 0,
    Mosi = 1,
    Clk = 2,
    CsN = 3,
}

impl SpiSignal {
    pub const ALL: [SpiSignal; 4] = [
        SpiSignal::Miso,
        SpiSignal::Mosi,
        SpiSignal::Clk,
        SpiSignal::CsN,
    ];

    /// Level assumed when the line is sampled while `X` or `Z`.
    ///
    /// CS_N defaults to deselected so that a floating chip select never opens
    /// a transaction.
    pub fn default_level(self) -> Level {
        match self {
            SpiSignal::CsN => Level::High,
            SpiSignal::Miso | SpiSignal::Mosi | SpiSignal::Clk => Level::Low,
        }
    }

    pub fn index(self) -> usize {
        u8::from(self) as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            SpiSignal::Miso => "MISO",
            SpiSignal::Mosi => "MOSI",
            SpiSignal::Clk => "CLK",
            SpiSignal::CsN => "CS_N",
        }
    }
}

impl fmt::Display for SpiSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
