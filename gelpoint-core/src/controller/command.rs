//! Operator commands

use super::CureController;
use crate::config::{ConfigError, Recipe};
use crate::state::{Event, ProcessState};
use crate::traits::Actuators;

/// Operator command rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Not accepted in the current state
    WrongState,
    /// No recipe has been loaded
    NoRecipe,
    /// The fault condition is still present
    ConditionActive,
    /// The emergency stop is still latched
    EstopLatched,
    /// Recipe failed validation
    InvalidRecipe(ConfigError),
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        CommandError::InvalidRecipe(err)
    }
}

impl<'a> CureController<'a> {
    /// Load and validate a recipe; only between cycles
    pub fn load_recipe(&mut self, recipe: Recipe) -> Result<(), CommandError> {
        if !matches!(self.state, ProcessState::Idle | ProcessState::Complete) {
            return reject(CommandError::WrongState);
        }
        if let Err(err) = recipe.validate(&self.limits) {
            return reject(err.into());
        }

        self.sequencer.set_profile(recipe.profile);
        self.kinetics.set_material(recipe.material);
        self.recipe_loaded = true;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Recipe loaded: {} ({} segments)",
            self.sequencer.profile().name.as_str(),
            self.sequencer.profile().len()
        );

        Ok(())
    }

    /// Request a cycle start
    ///
    /// The cycle begins on the next control tick that passes the readiness
    /// gate. The request stays pending until then or until
    /// [`CureController::stop_cycle`] cancels it.
    pub fn start_cycle(&mut self) -> Result<(), CommandError> {
        if self.state != ProcessState::Idle {
            return reject(CommandError::WrongState);
        }
        if !self.recipe_loaded {
            return reject(CommandError::NoRecipe);
        }
        if self.estop.is_asserted() {
            return reject(CommandError::EstopLatched);
        }
        self.start_requested = true;
        Ok(())
    }

    /// Abort the running cycle, forcing every output safe first
    pub fn stop_cycle<A: Actuators>(&mut self, actuators: &mut A) -> Result<(), CommandError> {
        if self.state == ProcessState::Idle && self.start_requested {
            self.start_requested = false;
            return Ok(());
        }
        if !self.state.is_cycle_active() {
            return reject(CommandError::WrongState);
        }
        self.hold_safe(actuators, false);
        self.apply(Event::Stop);
        Ok(())
    }

    /// Leave `Fault` or `Emergency` for `Idle`
    ///
    /// A fault resets once its condition has cleared; an emergency once
    /// the e-stop line has been released.
    pub fn reset_fault(&mut self) -> Result<(), CommandError> {
        match self.state {
            ProcessState::Emergency => {
                if self.estop.is_asserted() {
                    return reject(CommandError::EstopLatched);
                }
            }
            ProcessState::Fault(kind) => {
                let temps = self.zone_temps();
                let inputs = self.safety_inputs(false, &temps);
                if !self.safety.condition_cleared(kind, &inputs, &self.limits) {
                    return reject(CommandError::ConditionActive);
                }
            }
            _ => return reject(CommandError::WrongState),
        }

        self.alarms.clear_all();
        self.safety.reset();
        self.apply(Event::ResetFault);
        Ok(())
    }

    /// Return from `Complete` to `Idle`
    pub fn acknowledge(&mut self) -> Result<(), CommandError> {
        if self.state != ProcessState::Complete {
            return reject(CommandError::WrongState);
        }
        self.apply(Event::Acknowledge);
        Ok(())
    }
}

fn reject(err: CommandError) -> Result<(), CommandError> {
    #[cfg(feature = "defmt")]
    defmt::warn!("Command rejected: {}", err);
    Err(err)
}
