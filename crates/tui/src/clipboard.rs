//! Copy text through the terminal with an OSC 52 escape, which also works
//! over SSH without a local clipboard daemon.

use std::io::Write;

use base64::{engine::general_purpose::STANDARD, Engine};

pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

pub fn copy(out: &mut impl Write, text: &str) -> std::io::Result<()> {
    out.write_all(osc52_sequence(text).as_bytes())?;
    out.flush()
}
