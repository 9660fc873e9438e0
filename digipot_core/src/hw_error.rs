//! Maps `Box<dyn Error>` from trait boundaries to typed `DigipotError`.
//!
//! The traits in `digipot_traits` use `Box<dyn Error + Send + Sync>` so any
//! transport can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `digipot_hardware::HwError`.

use crate::error::DigipotError;

/// Map a bus-boundary error to a typed `DigipotError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to the error's display text.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> DigipotError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<digipot_hardware::error::HwError>() {
            return DigipotError::BusFault(hw.to_string());
        }
    }

    DigipotError::Bus(e.to_string())
}

/// Map a display-boundary error. Display failures never end a session.
pub fn map_display_error(e: &(dyn std::error::Error + 'static)) -> DigipotError {
    DigipotError::Display(e.to_string())
}
