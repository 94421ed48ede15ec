use crate::audio::device::{resolve_device, Direction};

/// Source of the record permission
///
/// Desktop hosts have no runtime microphone permission prompt, so the shipped
/// gate grants recording whenever a capture device can be resolved.
pub trait PermissionGate {
    fn is_granted(&self) -> bool;

    /// Whether the user should be told why recording needs the permission
    fn should_show_rationale(&self) -> bool;

    /// Ask again; returns the new answer
    fn request(&mut self) -> bool;
}

/// Grants recording when the configured input device is present
pub struct InputDevicePermission {
    selector: Option<String>,
    requested: bool,
}

impl InputDevicePermission {
    pub fn new(selector: Option<String>) -> Self {
        Self {
            selector,
            requested: false,
        }
    }
}

impl PermissionGate for InputDevicePermission {
    fn is_granted(&self) -> bool {
        resolve_device(Direction::Input, self.selector.as_deref()).is_ok()
    }

    /// Explain after the first refused request
    fn should_show_rationale(&self) -> bool {
        self.requested
    }

    fn request(&mut self) -> bool {
        let granted = self.is_granted();
        if !granted {
            log::warn!(
                "No input device available{}",
                self.selector
                    .as_deref()
                    .map(|s| format!(" matching '{}'", s))
                    .unwrap_or_default()
            );
        }
        self.requested = true;
        granted
    }
}
