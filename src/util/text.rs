use std::{collections::HashSet, str::FromStr};

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

const NUMBER_ESCAPE_CHAR: &[char] = &['元', '%', ',', ' ', '"', '\n'];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Decodes raw bytes that are either UTF-8 (with or without BOM) or Big5.
///
/// The MOPS CSV feeds are UTF-8 with a BOM, while some of the older HTML
/// pages are still served as Big5 without a charset header.
pub fn decode_text(data: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(data);
    if !had_errors {
        return text.into_owned();
    }

    let (big5, _, _) = encoding_rs::BIG5.decode(data);
    big5.into_owned()
}

/// 將表頭中的換行與連續空白收斂成單一空白
///
/// 例︰"營業收入\n(百萬元)" => "營業收入 (百萬元)"
pub fn normalize_header(label: &str) -> String {
    WHITESPACE.replace_all(label.trim(), " ").to_string()
}

/// Parses a decimal value from a given string.
///
/// Thousands separators and the characters in `NUMBER_ESCAPE_CHAR` are
/// removed before parsing, plus any `escape_chars` supplied by the caller.
pub fn parse_decimal(s: &str, escape_chars: Option<Vec<char>>) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s, escape_chars);
    Decimal::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

/// Removes a set of escape characters from a given string.
pub(crate) fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.chars().filter(|c| !filters.contains(c)).collect()
}
