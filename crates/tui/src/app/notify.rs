use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::App;

/// Side effects on the hosting terminal, applied by the event loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TerminalEffect {
    SetTitle(String),
    Bell,
}

static MARKUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("markup regex"));

/// Drop markup tags so a notification shows plain text.
pub fn strip_markup(text: &str) -> String {
    MARKUP_RE.replace_all(text, "").into_owned()
}

impl App {
    /// Called for every new line of server text.
    pub fn on_new_line(&mut self, text: &str) {
        if self.focused {
            return;
        }
        self.unread += 1;
        if self.config.options.notify_on_unread_when_unfocused {
            self.effects
                .push(TerminalEffect::SetTitle(format!("({}) {}", self.unread, self.config.title)));
            self.last_notice = Some(strip_markup(text));
        }
        if self.config.options.play_sound_on_message {
            self.effects.push(TerminalEffect::Bell);
        }
        debug!(target: "tui", "unread={}", self.unread);
    }

    pub fn on_focus_change(&mut self, focused: bool) {
        self.focused = focused;
        if focused && self.unread > 0 {
            self.unread = 0;
            self.last_notice = None;
            self.effects
                .push(TerminalEffect::SetTitle(self.config.title.clone()));
        }
        self.dirty = true;
    }

    pub fn take_effects(&mut self) -> Vec<TerminalEffect> {
        std::mem::take(&mut self.effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::controller::tests::RecordingTransport;
    use tg_transport::ClientConfig;

    fn app(notify: bool, sound: bool) -> App {
        let mut cfg = ClientConfig::default();
        cfg.title = "TG".into();
        cfg.options.notify_on_unread_when_unfocused = notify;
        cfg.options.play_sound_on_message = sound;
        App::new(RecordingTransport::new(), cfg)
    }

    #[test]
    fn strips_tags() {
        assert_eq!(strip_markup("<span class='red'>Hi</span> there"), "Hi there");
        assert_eq!(strip_markup("no tags"), "no tags");
    }

    #[test]
    fn focused_terminal_gets_no_notifications() {
        let mut a = app(true, true);
        a.take_effects();
        a.on_new_line("hello");
        assert_eq!(a.unread, 0);
        assert!(a.take_effects().is_empty());
    }

    #[test]
    fn unfocused_counts_and_retitles() {
        let mut a = app(true, false);
        a.take_effects();
        a.on_focus_change(false);
        a.on_new_line("<b>one</b>");
        a.on_new_line("two");
        assert_eq!(a.unread, 2);
        assert_eq!(
            a.take_effects(),
            vec![
                TerminalEffect::SetTitle("(1) TG".into()),
                TerminalEffect::SetTitle("(2) TG".into()),
            ]
        );
        assert_eq!(a.last_notice.as_deref(), Some("two"));

        a.on_focus_change(true);
        assert_eq!(a.unread, 0);
        assert_eq!(a.take_effects(), vec![TerminalEffect::SetTitle("TG".into())]);
    }

    #[test]
    fn sound_without_title() {
        let mut a = app(false, true);
        a.take_effects();
        a.on_focus_change(false);
        a.on_new_line("ding");
        assert_eq!(a.unread, 1);
        assert_eq!(a.take_effects(), vec![TerminalEffect::Bell]);
    }
}
