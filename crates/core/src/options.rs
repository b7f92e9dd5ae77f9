use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Front-end behavior switches. Loaded from config and updated at runtime
/// when the server pushes its own option set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub debug_enabled: bool,
    pub notify_on_unread_when_unfocused: bool,
    pub play_sound_on_message: bool,
    /// Route `type: help` text into a popup instead of the output pane.
    pub help_popup: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            debug_enabled: false,
            notify_on_unread_when_unfocused: true,
            play_sound_on_message: false,
            help_popup: true,
        }
    }
}

impl ClientOptions {
    /// Merge a server-side option payload. Returns true if anything changed.
    pub fn apply_server_options(&mut self, opts: &Map<String, Value>) -> bool {
        let before = self.clone();
        for (key, value) in opts {
            let Some(on) = value.as_bool() else {
                debug!(target: "core", "ignoring non-boolean option {}={}", key, value);
                continue;
            };
            match key.as_str() {
                "notification_popup" => self.notify_on_unread_when_unfocused = on,
                "notification_sound" => self.play_sound_on_message = on,
                "helppopup" => self.help_popup = on,
                "debug" => self.debug_enabled = on,
                _ => {}
            }
        }
        *self != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn server_options_use_runtime_keys() {
        let mut o = ClientOptions::default();
        let changed = o.apply_server_options(&map(json!({
            "notification_popup": false,
            "notification_sound": true,
            "helppopup": false,
        })));
        assert!(changed);
        assert!(!o.notify_on_unread_when_unfocused);
        assert!(o.play_sound_on_message);
        assert!(!o.help_popup);
        assert!(!o.debug_enabled);
    }

    #[test]
    fn unknown_and_non_bool_values_are_ignored() {
        let mut o = ClientOptions::default();
        let changed = o.apply_server_options(&map(json!({
            "helppopup": "yes",
            "colors": true,
        })));
        assert!(!changed);
        assert_eq!(o, ClientOptions::default());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let o: ClientOptions = serde_json::from_str(r#"{"debug_enabled": true}"#).unwrap();
        assert!(o.debug_enabled);
        assert!(o.help_popup);
    }
}
