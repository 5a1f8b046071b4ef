//! Marker-region splicing into hand-maintained files.
//!
//! A generator is permitted to overwrite exactly the span between a matched
//! begin/end tag pair; everything outside the tags is hand-written and
//! never touched. The target files must pre-exist with the marker
//! scaffolding — there is nothing to "create".

use anyhow::{Result, bail};

/// Replace the body between `begin` and `end` (exclusive of the tag lines
/// themselves) with `new_inner`.
///
/// Fails if either tag is missing or the tags are out of order.
pub fn replace_marked_section(
    text: &str,
    begin: &str,
    end: &str,
    new_inner: &str,
) -> Result<String> {
    let Some(b) = text.find(begin) else {
        bail!("missing begin marker: {begin}");
    };
    let Some(e) = text.find(end) else {
        bail!("missing end marker: {end}");
    };
    if e < b {
        bail!("markers out of order: {begin} / {end}");
    }
    let Some(b_line_end) = text[b..].find('\n').map(|i| b + i) else {
        bail!("begin marker is not followed by a newline");
    };
    let Some(e_line_start) = text[..e].rfind('\n') else {
        bail!("end marker is not preceded by a newline");
    };

    let mut out = String::with_capacity(text.len() + new_inner.len());
    out.push_str(&text[..b_line_end + 1]);
    out.push_str(new_inner);
    out.push_str(&text[e_line_start + 1..]);
    Ok(out)
}

/// Empty out the body between `begin` and `end`.
///
/// Used before scanning a hand-maintained file for existing declarations,
/// so that previously generated content does not count as hand-written and
/// a rerun over the tool's own output stays byte-identical.
pub fn strip_marked_section(text: &str, begin: &str, end: &str) -> Result<String> {
    replace_marked_section(text, begin, end, "")
}
