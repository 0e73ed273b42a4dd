//! Presentation helpers attached to entries in API responses.

use common::entry::Entry;
use serde::Serialize;
use md5::{Digest, Md5};

const SATURATION: f64 = 70.0;
const LIGHTNESS: f64 = 65.0;

/// An entry plus the derived fields a front end needs to draw a placeholder
/// logo.
#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    #[serde(flatten)]
    pub entry: Entry,
    pub initials: String,
    pub accent_color: String,
}

impl From<Entry> for SiteView {
    fn from(entry: Entry) -> Self {
        let initials = initials(&entry.name);
        let accent_color = accent_color(&entry.name);
        Self {
            entry,
            initials,
            accent_color,
        }
    }
}

/// First letters of the first two words, otherwise the first one or two
/// characters of the name.
pub fn initials(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let Some(&first) = chars.first() else {
        return "?".into();
    };

    if name.len() > 3 {
        if let Some(space) = chars.iter().position(|c| *c == ' ') {
            if space > 0 && space < chars.len() - 1 {
                return [first, chars[space + 1]].iter().collect();
            }
        }
    }

    if chars.len() > 3 {
        chars[..2].iter().collect()
    } else {
        first.to_string()
    }
}

/// Stable `#rrggbb` colour for a name: hue from its digest, fixed saturation
/// and lightness.
pub fn accent_color(name: &str) -> String {
    let digest = Md5::digest(name.as_bytes());
    let hue = (u32::from(digest[0]) * 256 + u32::from(digest[1])) % 360;
    let (r, g, b) = hsl_to_rgb(f64::from(hue), SATURATION, LIGHTNESS);
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let h = h / 360.0;
    let s = s / 100.0;
    let l = l / 100.0;

    if s == 0.0 {
        let v = (l * 255.0) as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);
    ((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}
