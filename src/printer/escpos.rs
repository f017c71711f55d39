//! ESC/POS command encoding for thermal receipt printers.

use super::{Align, TextStyle};

const ESC: u8 = 0x1b;
const GS: u8 = 0x1d;
const DLE: u8 = 0x10;
const EOT: u8 = 0x04;

/// Lines fed before cutting so the last printed line clears the blade.
const CUT_FEED_LINES: u8 = 6;

/// Status bit set by the printer while it is offline.
const STATUS_OFFLINE_MASK: u8 = 0x08;

/// WPC1252 code page; agrees with Latin-1 for every printable character.
const CODE_PAGE_WPC1252: u8 = 16;

pub const INITIALIZE: [u8; 2] = [ESC, b'@'];

pub const SELECT_LATIN1_CODE_PAGE: [u8; 3] = [ESC, b't', CODE_PAGE_WPC1252];

/// Real-time request for the printer status byte.
pub const TRANSMIT_PRINTER_STATUS: [u8; 3] = [DLE, EOT, 1];

pub fn style(style: &TextStyle) -> Vec<u8> {
    let align = match style.align {
        Align::Left => 0,
        Align::Center => 1,
    };
    let size = ((style.width - 1) << 4) | (style.height - 1);

    vec![
        ESC,
        b'a',
        align,
        ESC,
        b'E',
        u8::from(style.bold),
        GS,
        b'!',
        size,
    ]
}

/// Encodes for the code page picked by [`SELECT_LATIN1_CODE_PAGE`]. Characters
/// outside Latin-1 print as `?`.
pub fn text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => c as u8,
            ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
            _ => b'?',
        })
        .collect()
}

pub fn feed_and_cut() -> [u8; 6] {
    [ESC, b'd', CUT_FEED_LINES, GS, b'V', 0]
}

pub fn is_online(status: u8) -> bool {
    status & STATUS_OFFLINE_MASK == 0
}
