//! Motor line control.

use fh_core::{DigitalOutput, PinId};
use serde::Serialize;
use tracing::trace;

/// Motor drive command. Exactly one line is energised for `Open` and
/// `Close`, none for `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Drive {
    Off,
    Open,
    Close,
}

/// Open and close lines of the valve motor.
pub struct ValvePins {
    output: Box<dyn DigitalOutput>,
    open: PinId,
    close: PinId,
    drive: Drive,
}

impl ValvePins {
    /// Take over the output and de-energise both lines.
    pub fn new(mut output: Box<dyn DigitalOutput>, open: PinId, close: PinId) -> Self {
        output.set(open, false);
        output.set(close, false);
        Self {
            output,
            open,
            close,
            drive: Drive::Off,
        }
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    /// Apply `drive`. The line being released is always switched off before
    /// the other one is switched on. Repeating the current drive is a no-op.
    pub fn set(&mut self, drive: Drive) {
        if drive == self.drive {
            return;
        }
        trace!(?drive, "valve motor lines");
        match drive {
            Drive::Off => {
                self.output.set(self.open, false);
                self.output.set(self.close, false);
            }
            Drive::Open => {
                self.output.set(self.close, false);
                self.output.set(self.open, true);
            }
            Drive::Close => {
                self.output.set(self.open, false);
                self.output.set(self.close, true);
            }
        }
        self.drive = drive;
    }
}
