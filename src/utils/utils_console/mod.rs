use colored::{Color, ColoredString, Colorize};

/// Prints to stdout, optionally colored and bolded.
///
/// ## Example
/// ```
/// use blocksim::utils::utils_console::{blocksim_print, PrintMode, PrintColor};
/// blocksim_print("holding(block0)", PrintMode::Println, PrintColor::Green, false);
/// ```
pub fn blocksim_print(s: &str, mode: PrintMode, color: PrintColor, bolded: bool) {
    let styled = style_string(s, color, bolded);
    match mode {
        PrintMode::Println => { println!("{}", styled); }
        PrintMode::Print => { print!("{}", styled); }
    }
}

/// Bolded, colored `label` followed by a plain `value` on the same line.
pub fn blocksim_print_labeled(label: &str, value: &str, color: PrintColor) {
    blocksim_print(label, PrintMode::Print, color, true);
    blocksim_print(value, PrintMode::Println, PrintColor::None, false);
}

fn style_string(s: &str, color: PrintColor, bolded: bool) -> ColoredString {
    let mut out = match color.to_color() {
        None => { s.normal() }
        Some(c) => { s.color(c) }
    };
    if bolded { out = out.bold(); }
    out
}

/// Println ends the output with a new line, Print does not.
#[derive(Clone, Copy, Debug)]
pub enum PrintMode {
    Println,
    Print
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrintColor {
    None,
    Blue,
    Green,
    Red,
    Yellow,
    Cyan,
    Magenta
}
impl PrintColor {
    /// `None` leaves the terminal's default color in place.
    pub fn to_color(&self) -> Option<Color> {
        match self {
            PrintColor::None => { None }
            PrintColor::Blue => { Some(Color::Blue) }
            PrintColor::Green => { Some(Color::Green) }
            PrintColor::Red => { Some(Color::Red) }
            PrintColor::Yellow => { Some(Color::Yellow) }
            PrintColor::Cyan => { Some(Color::Cyan) }
            PrintColor::Magenta => { Some(Color::Magenta) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncolored_strings_keep_their_text() {
        colored::control::set_override(false);
        assert_eq!(style_string("ontable(block0)", PrintColor::None, false).to_string(), "ontable(block0)");
        assert_eq!(style_string("x", PrintColor::Red, true).to_string(), "x");
        colored::control::unset_override();
    }
}
