use owo_colors::OwoColorize;

#[derive(Clone, Copy, Debug)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug)]
pub struct Style {
    pub emoji: bool,
    pub color: bool,
}

impl Default for Style {
    fn default() -> Self {
        // Colors only when stdout is a TTY; emojis always on by default.
        let color = atty::is(atty::Stream::Stdout);
        Self { emoji: true, color }
    }
}

pub fn info(msg: impl AsRef<str>) {
    print_line(Level::Info, msg.as_ref(), Style::default());
}

pub fn success(msg: impl AsRef<str>) {
    print_line(Level::Success, msg.as_ref(), Style::default());
}

pub fn warning(msg: impl AsRef<str>) {
    print_line(Level::Warning, msg.as_ref(), Style::default());
}

pub fn error(msg: impl AsRef<str>) {
    print_line(Level::Error, msg.as_ref(), Style::default());
}

pub fn print_line(level: Level, msg: &str, style: Style) {
    let emoji = match level {
        Level::Info => "ℹ️ ",
        Level::Success => "✅ ",
        Level::Warning => "⚠️ ",
        Level::Error => "❌ ",
    };

    let prefix = if style.emoji { emoji } else { "" };
    let line = format!("{}{}", prefix, msg);

    if style.color {
        match level {
            Level::Info => println!("{}", line.cyan()),
            Level::Success => println!("{}", line.green()),
            Level::Warning => println!("{}", line.yellow()),
            Level::Error => println!("{}", line.red()),
        }
    } else {
        println!("{}", line);
    }
}

/// Color a 0-100 score: green from 70, yellow from 40, red below.
pub fn score(value: f64, style: Style) -> String {
    let txt = format!("{value:.1}");
    if !style.color {
        return txt;
    }
    if value >= 70.0 {
        txt.green().to_string()
    } else if value >= 40.0 {
        txt.yellow().to_string()
    } else {
        txt.red().to_string()
    }
}

pub fn dim(s: impl AsRef<str>, style: Style) -> String {
    let s = s.as_ref();
    if style.color {
        s.bright_black().to_string()
    } else {
        s.to_string()
    }
}
