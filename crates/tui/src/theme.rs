use ratatui::style::Color;

use crate::app::output::LineClass;

pub struct Theme {
    pub border_focus: Color,
    pub output_border: Color,
    pub echo: Color,
    pub system: Color,
    pub error: Color,
    pub debug: Color,
    pub prompt: Color,
}

pub const THEME: Theme = Theme {
    border_focus: Color::Cyan,
    output_border: Color::DarkGray,
    echo: Color::Green,
    system: Color::Yellow,
    error: Color::Red,
    debug: Color::DarkGray,
    prompt: Color::Magenta,
};

impl Theme {
    /// Foreground for a line class. Server classes follow the runtime's
    /// stock `out`/`err`/`sys`/`inp` names; anything else is unstyled.
    pub fn line_color(&self, class: &LineClass) -> Option<Color> {
        match class {
            LineClass::Echo => Some(self.echo),
            LineClass::System => Some(self.system),
            LineClass::Error => Some(self.error),
            LineClass::Debug => Some(self.debug),
            LineClass::Server(cls) => match cls.as_str() {
                "err" => Some(self.error),
                "sys" => Some(self.system),
                "inp" => Some(self.echo),
                _ => None,
            },
        }
    }
}
