//! Marker-region splicing tests.

use wgpu_mbt_gen::splice::{replace_marked_section, strip_marked_section};

const BEGIN: &str = "// --- BEGIN GEN ---";
const END: &str = "// --- END GEN ---";

fn doc(inner: &str) -> String {
    format!("// hand-written prologue\n{BEGIN}\n{inner}{END}\n// hand-written epilogue\n")
}

#[test]
fn replaces_only_the_region_body() {
    let text = doc("old line\n");
    let out = replace_marked_section(&text, BEGIN, END, "new line 1\nnew line 2\n").unwrap();
    assert_eq!(out, doc("new line 1\nnew line 2\n"));
}

#[test]
fn empty_region_accepts_content() {
    let text = doc("");
    let out = replace_marked_section(&text, BEGIN, END, "filled\n").unwrap();
    assert_eq!(out, doc("filled\n"));
}

#[test]
fn replacement_is_idempotent() {
    let text = doc("stale\n");
    let once = replace_marked_section(&text, BEGIN, END, "fresh\n").unwrap();
    let twice = replace_marked_section(&once, BEGIN, END, "fresh\n").unwrap();
    assert_eq!(once, twice);
}

#[test]
fn missing_begin_marker_is_an_error() {
    let text = format!("no markers here\n{END}\n");
    let err = replace_marked_section(&text, BEGIN, END, "x\n").unwrap_err();
    assert!(err.to_string().contains("missing begin marker"));
}

#[test]
fn missing_end_marker_is_an_error() {
    let text = format!("{BEGIN}\nbody\n");
    let err = replace_marked_section(&text, BEGIN, END, "x\n").unwrap_err();
    assert!(err.to_string().contains("missing end marker"));
}

#[test]
fn out_of_order_markers_are_an_error() {
    let text = format!("{END}\nbody\n{BEGIN}\n");
    let err = replace_marked_section(&text, BEGIN, END, "x\n").unwrap_err();
    assert!(err.to_string().contains("out of order"));
}

#[test]
fn stripping_empties_the_body() {
    let text = doc("generated stuff\nmore generated stuff\n");
    let out = strip_marked_section(&text, BEGIN, END).unwrap();
    assert_eq!(out, doc(""));
}

#[test]
fn text_outside_the_markers_survives_untouched() {
    let text = format!(
        "pub struct Keep {{\n  raw : @c.Keep\n}}\n{BEGIN}\ngen\n{END}\npub fn Keep::touch() -> Unit {{}}\n"
    );
    let out = replace_marked_section(&text, BEGIN, END, "gen2\n").unwrap();
    assert!(out.starts_with("pub struct Keep"));
    assert!(out.ends_with("pub fn Keep::touch() -> Unit {}\n"));
    assert!(out.contains("gen2\n"));
    assert!(!out.contains("\ngen\n"));
}
