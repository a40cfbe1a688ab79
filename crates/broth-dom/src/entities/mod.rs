//! Named and numeric character references.
//!
//! [§ 13.5 Named character references](https://html.spec.whatwg.org/multipage/named-characters.html)
//!
//! This module owns the static reference tables and the two directions of the
//! codec:
//! - [`escape`] turns text into markup-safe text for a given [`EscapeMode`]
//!   and output [`Charset`].
//! - [`unescape`] / [`unescape_with`] resolve `&name;`, `&#digits;` and
//!   `&#xhex;` references back into characters.
//!
//! The tables are loaded once, on first use, from the `.properties` files
//! next to this module and are read-only afterwards.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

use strum_macros::{Display, EnumString};

use broth_common::warning::warn_once;

/// Source of the base table: the Latin-1 references plus the markup-significant
/// characters.
const BASE_SOURCE: &str = include_str!("base.properties");

/// Source of the full table used for extended escaping and for unescaping.
const FULL_SOURCE: &str = include_str!("full.properties");

/// The references that are safe for XHTML output.
const XHTML_ENTITIES: [(&str, char); 5] = [
    ("quot", '"'),
    ("amp", '&'),
    ("apos", '\''),
    ("lt", '<'),
    ("gt", '>'),
];

/// A name -> character table together with its reverse mapping.
struct EntityTable {
    by_name: HashMap<&'static str, char>,
    by_char: HashMap<char, &'static str>,
}

impl EntityTable {
    /// Build a table from `name=hex` lines.
    ///
    /// # Panics
    ///
    /// Panics if a line is malformed. The tables are compiled into the
    /// binary, so this can only fail on a broken build; the codec is unusable
    /// without them.
    fn load(table: &str, source: &'static str) -> Self {
        let entries = parse_table(source)
            .unwrap_or_else(|line| panic!("error loading {table} entity table: bad line {line:?}"));
        Self::from_entries(entries)
    }

    fn from_entries(entries: impl IntoIterator<Item = (&'static str, char)>) -> Self {
        let mut by_name = HashMap::new();
        let mut by_char: HashMap<char, &'static str> = HashMap::new();
        for (name, c) in entries {
            let _ = by_name.insert(name, c);
            // Prefer the first lower-case name when several map to one character.
            match by_char.get(&c) {
                Some(existing) if is_lower(existing) || !is_lower(name) => {}
                _ => {
                    let _ = by_char.insert(c, name);
                }
            }
        }
        Self { by_name, by_char }
    }
}

fn is_lower(name: &str) -> bool {
    !name.bytes().any(|b| b.is_ascii_uppercase())
}

/// Parse `name=hex` lines, skipping blanks and `#` comments. On failure the
/// offending line is returned.
fn parse_table(source: &'static str) -> Result<Vec<(&'static str, char)>, &'static str> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let (name, hex) = line.split_once('=').ok_or(line)?;
            let c = u32::from_str_radix(hex.trim(), 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or(line)?;
            let name = name.trim();
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Err(line);
            }
            Ok((name, c))
        })
        .collect()
}

static XHTML: LazyLock<EntityTable> =
    LazyLock::new(|| EntityTable::from_entries(XHTML_ENTITIES));
static BASE: LazyLock<EntityTable> = LazyLock::new(|| EntityTable::load("base", BASE_SOURCE));
static FULL: LazyLock<EntityTable> = LazyLock::new(|| EntityTable::load("full", FULL_SOURCE));

/// Which named references [`escape`] may emit.
///
/// The modes are increasingly permissive: every mode escapes the
/// markup-significant characters, wider modes also name more characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum EscapeMode {
    /// `&quot;`, `&amp;`, `&apos;`, `&lt;` and `&gt;` only; safe for XHTML.
    #[strum(to_string = "xhtml")]
    Xhtml,
    /// The common set: markup characters plus the Latin-1 names.
    #[default]
    #[strum(to_string = "base")]
    Base,
    /// Every known named reference.
    #[strum(to_string = "extended")]
    Extended,
}

impl EscapeMode {
    fn table(self) -> &'static EntityTable {
        match self {
            Self::Xhtml => &XHTML,
            Self::Base => &BASE,
            Self::Extended => &FULL,
        }
    }

    /// The reference name this mode uses for `c`, if any.
    #[must_use]
    pub fn name_for(self, c: char) -> Option<&'static str> {
        self.table().by_char.get(&c).copied()
    }
}

/// Output character encoding: decides which characters may be written
/// literally and which must become numeric references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Charset {
    /// Every Unicode scalar value is representable.
    #[default]
    #[strum(to_string = "UTF-8", serialize = "utf8")]
    Utf8,
    /// Only U+0000..=U+007F.
    #[strum(to_string = "US-ASCII", serialize = "ascii")]
    Ascii,
    /// Only U+0000..=U+00FF.
    #[strum(to_string = "ISO-8859-1", serialize = "latin1", serialize = "latin-1")]
    Latin1,
}

impl Charset {
    /// Returns true if `c` can be written literally in this encoding.
    #[must_use]
    pub const fn can_encode(self, c: char) -> bool {
        match self {
            Self::Utf8 => true,
            Self::Ascii => c.is_ascii(),
            Self::Latin1 => (c as u32) <= 0xFF,
        }
    }

    /// Look up an encoding by label, falling back to UTF-8 for unknown labels.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        label.trim().parse().unwrap_or_else(|_| {
            warn_once("Entities", &format!("unknown charset '{label}', using UTF-8"));
            Self::Utf8
        })
    }
}

/// Returns true if `name` is a known named reference (without `&` and `;`).
#[must_use]
pub fn is_named_entity(name: &str) -> bool {
    FULL.by_name.contains_key(name)
}

/// Returns true if `name` is in the base set.
#[must_use]
pub fn is_base_named_entity(name: &str) -> bool {
    BASE.by_name.contains_key(name)
}

/// Resolve a reference name to its character.
///
/// # Example
/// ```
/// assert_eq!(broth_dom::entities::character_by_name("lt"), Some('<'));
/// assert_eq!(broth_dom::entities::character_by_name("nosuch"), None);
/// ```
#[must_use]
pub fn character_by_name(name: &str) -> Option<char> {
    FULL.by_name.get(name).copied()
}

/// Escape `text` for output.
///
/// Each character is emitted as a named reference if `mode` has one, else
/// literally if `charset` can encode it, else as `&#xHHHH;`. Characters the
/// charset can encode and the mode does not name are never touched, so
/// escaping already-escaped text only re-escapes its `&`s.
#[must_use]
pub fn escape(text: &str, charset: Charset, mode: EscapeMode) -> String {
    let table = mode.table();
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if let Some(name) = table.by_char.get(&c) {
            out.push('&');
            out.push_str(name);
            out.push(';');
        } else if charset.can_encode(c) {
            out.push(c);
        } else {
            let _ = write!(out, "&#x{:x};", u32::from(c));
        }
    }
    out
}

/// Resolve character references, tolerating a missing `;` (loose mode).
#[must_use]
pub fn unescape(text: &str) -> String {
    unescape_with(text, false)
}

/// Resolve character references.
///
/// With `strict`, only `;`-terminated references are decoded. Without it, a
/// missing `;` is tolerated and the longest known name prefix is used, so
/// `&ampx` becomes `&x`. Unknown or invalid references are left as literal
/// text; this never fails.
#[must_use]
pub fn unescape_with(text: &str, strict: bool) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('&') {
        let amp = pos + offset;
        out.push_str(&text[pos..amp]);
        let rest = &text[amp + 1..];
        match decode_reference(rest, strict) {
            Some((c, consumed)) => {
                out.push(c);
                pos = amp + 1 + consumed;
            }
            None => {
                out.push('&');
                pos = amp + 1;
            }
        }
    }
    out.push_str(&text[pos..]);
    out
}

/// Decode the reference at the start of `rest` (the text after `&`).
/// Returns the character and the number of bytes consumed.
fn decode_reference(rest: &str, strict: bool) -> Option<(char, usize)> {
    if let Some(numeric) = rest.strip_prefix('#') {
        let (radix, prefix) = match numeric.as_bytes().first() {
            Some(b'x' | b'X') => (16, 1),
            _ => (10, 0),
        };
        let digits_len = numeric[prefix..]
            .bytes()
            .take_while(|b| if radix == 16 { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
            .count();
        if digits_len == 0 {
            return None;
        }
        let digits = &numeric[prefix..prefix + digits_len];
        let mut consumed = 1 + prefix + digits_len;
        if rest[consumed..].starts_with(';') {
            consumed += 1;
        } else if strict {
            return None;
        }
        let c = u32::from_str_radix(digits, radix)
            .ok()
            .and_then(char::from_u32)
            .filter(|&c| c != '\0')?;
        return Some((c, consumed));
    }

    let name_len = rest.bytes().take_while(u8::is_ascii_alphanumeric).count();
    if name_len == 0 {
        return None;
    }
    let name = &rest[..name_len];
    if rest[name_len..].starts_with(';')
        && let Some(c) = character_by_name(name)
    {
        return Some((c, name_len + 1));
    }
    if strict {
        return None;
    }
    (1..=name_len)
        .rev()
        .find_map(|len| character_by_name(&name[..len]).map(|c| (c, len)))
}
