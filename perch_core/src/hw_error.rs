//! Maps `Box<dyn Error>` from trait boundaries to typed `PerchError`.
//!
//! `Speaker::speak` returns `Box<dyn Error + Send + Sync>`; this module
//! turns those into our typed error enum, with an optional feature-gated path
//! for `perch_hardware::HwError` downcasting.

use crate::error::PerchError;

/// Map a trait-boundary error to a typed `PerchError`.
///
/// Already-typed errors pass through, known hardware error types are
/// downcast next, then string heuristics apply.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> PerchError {
    if let Some(pe) = e.downcast_ref::<PerchError>() {
        return pe.clone();
    }

    #[cfg(feature = "hardware-errors")]
    {
        use perch_hardware::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => PerchError::Timeout,
                HwError::MissingClip { text, .. } => PerchError::MissingClip(text.clone()),
                HwError::Audio(msg) => PerchError::Playback(msg.clone()),
                other => PerchError::Hardware(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        PerchError::Timeout
    } else {
        PerchError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_pass_through() {
        let e: Box<dyn std::error::Error + Send + Sync> = Box::new(PerchError::PlaybackBusy);
        assert_eq!(map_hw_error(e.as_ref()), PerchError::PlaybackBusy);
    }

    #[test]
    fn strings_fall_back_to_heuristics() {
        let e: Box<dyn std::error::Error + Send + Sync> = "read timeout".into();
        assert_eq!(map_hw_error(e.as_ref()), PerchError::Timeout);
        let e: Box<dyn std::error::Error + Send + Sync> = "speaker unplugged".into();
        assert_eq!(
            map_hw_error(e.as_ref()),
            PerchError::Hardware("speaker unplugged".into())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn missing_clip_is_recognised() {
        let e: Box<dyn std::error::Error + Send + Sync> =
            Box::new(perch_hardware::HwError::MissingClip {
                text: "hi".into(),
                path: "audio/x.mp3".into(),
            });
        assert_eq!(map_hw_error(e.as_ref()), PerchError::MissingClip("hi".into()));
    }
}
