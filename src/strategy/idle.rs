//! A strategy that never acts.

use crate::error::{ControllerError, StrategyInitError};
use crate::game::{Controller, Map};
use crate::strategy::Strategy;

/// Does nothing every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl Idle {
    /// Registry constructor.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub fn create(_map: &Map) -> Result<Box<dyn Strategy>, StrategyInitError> {
        Ok(Box::new(Idle))
    }
}

impl Strategy for Idle {
    fn play_turn(&mut self, _rc: &mut Controller) -> Result<(), ControllerError> {
        Ok(())
    }
}
