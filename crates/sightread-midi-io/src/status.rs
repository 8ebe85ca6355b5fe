//! User-visible state of the MIDI connection.

/// Message shown when MIDI access cannot be obtained.
pub const ACCESS_DENIED: &str = "MIDI not supported or access denied";

/// Outcome of the most recent connection request.
///
/// Failures never propagate into the practice engine; they are reported
/// here so the UI can show them while the trainer keeps working without
/// live MIDI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MidiStatus {
    /// MIDI access was granted by the host.
    pub supported: bool,
    /// At least one input device is subscribed.
    pub connected: bool,
    /// Names of the subscribed input devices.
    pub devices: Vec<String>,
    pub error: Option<String>,
}

impl MidiStatus {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            supported: false,
            connected: false,
            devices: Vec::new(),
            error: Some(reason.into()),
        }
    }

    pub fn connected_to(devices: Vec<String>) -> Self {
        Self {
            supported: true,
            connected: !devices.is_empty(),
            devices,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let status = MidiStatus::default();
        assert!(!status.supported);
        assert!(!status.connected);
        assert!(status.error.is_none());
    }

    #[test]
    fn test_no_devices_is_supported_but_not_connected() {
        let status = MidiStatus::connected_to(Vec::new());
        assert!(status.supported);
        assert!(!status.connected);
    }

    #[test]
    fn test_unsupported_carries_message() {
        let status = MidiStatus::unsupported(ACCESS_DENIED);
        assert_eq!(status.error.as_deref(), Some(ACCESS_DENIED));
    }
}
