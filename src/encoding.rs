//! Best-effort recovery of legacy-encoded zip member filenames
//!
//! Zip entries carry a per-entry flag (bit 0x800 of the general-purpose
//! flags) declaring the stored name as UTF-8. Archives produced by older
//! tools leave the flag unset and store the name in whatever codepage the
//! producing machine happened to use, most commonly a regional multi-byte
//! encoding. This module guesses that encoding statistically and decodes the
//! raw bytes with it, substituting U+FFFD for anything unrecoverable so that
//! extraction never fails on a filename.

use encoding_rs::{Encoding, GB18030};
use tracing::debug;

/// Guess the source encoding of raw filename bytes
///
/// Runs statistical charset detection and maps the detected label onto an
/// [`Encoding`]. Detection that produces no usable label falls back to
/// GB18030, the superset most legacy non-UTF-8 archives in the wild turn out
/// to use.
///
/// The classifier is deliberately isolated here: callers only see
/// `bytes -> Encoding`, so the detector can be swapped without touching
/// extraction logic.
pub fn guess_encoding(raw: &[u8]) -> &'static Encoding {
    let (charset, confidence, _language) = chardet::detect(raw);
    let label = chardet::charset2encoding(&charset);
    debug!(charset = %charset, confidence = f64::from(confidence), label, "charset detection result");

    if label.is_empty() || confidence == 0.0 {
        return GB18030;
    }
    Encoding::for_label(label.as_bytes()).unwrap_or(GB18030)
}

/// Decode raw zip member filename bytes into text
///
/// When `utf8_declared` is set the entry marked its name as UTF-8; that path
/// is authoritative and never overridden. Otherwise the true encoding is
/// guessed via [`guess_encoding`]. Either way the result is lossy rather
/// than fallible: invalid sequences become U+FFFD instead of aborting the
/// extraction of the member.
pub fn decode_filename(raw: &[u8], utf8_declared: bool) -> String {
    if utf8_declared {
        return String::from_utf8_lossy(raw).into_owned();
    }
    let encoding = guess_encoding(raw);
    let (text, _, _) = encoding.decode(raw);
    text.into_owned()
}
