//! Extraction — pattern-matching scanners over normalized header text.
//!
//! Each extractor is a pure function `&str -> records`, independent of the
//! others. The accepted grammar is deliberately a bounded dialect of the
//! wgpu-native headers, not full C: declarations that do not match are
//! skipped, never fatal. The caller is responsible for the one fatal check
//! (an empty combined function list).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Constant, ConstWidth, Func, MbtType, Param};

// ---------------------------------------------------------------------------
// Text normalization
// ---------------------------------------------------------------------------

static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)//.*?$").unwrap());
static WS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip `/* */` and `//` comments. Best-effort: the headers under audit do
/// not place symbol-relevant tokens inside string literals.
pub fn strip_comments(text: &str) -> String {
    let text = BLOCK_COMMENT.replace_all(text, "");
    LINE_COMMENT.replace_all(&text, "").into_owned()
}

/// Collapse whitespace runs to single spaces and trim.
pub fn norm_ws(text: &str) -> String {
    WS_RUN.replace_all(text, " ").trim().to_string()
}

// ---------------------------------------------------------------------------
// Type mapping: C type token + pointer depth → MbtType
// ---------------------------------------------------------------------------

static QUALIFIERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(const|struct|WGPU_NULLABLE|WGPU_NONNULL)\b").unwrap()
});

/// Remove qualifier keywords and attribute macros from a type expression.
fn strip_qualifiers(s: &str) -> String {
    norm_ws(&QUALIFIERS.replace_all(s, ""))
}

/// Map a C type token plus a pointer depth onto a MoonBit type descriptor.
///
/// Known primitives map to fixed scalars; any other name passes through
/// unchanged to be classified later as an enum, a primitive typedef, or an
/// opaque handle. Pointer depth is preserved on the descriptor regardless
/// of whether the base resolved to a primitive.
pub fn map_c_type(c_ty: &str, pointer_depth: usize) -> MbtType {
    let c_ty = strip_qualifiers(c_ty);
    let base = match c_ty.as_str() {
        "void" => "Unit",
        // `char` only ever appears behind pointers in these headers.
        "char" => "Byte",
        "int" | "int32_t" => "Int",
        "uint8_t" | "uint16_t" | "uint32_t" => "UInt",
        "uint64_t" | "size_t" => "UInt64",
        "float" => "Float",
        "double" => "Double",
        "WGPUBool" => "Bool",
        other => other,
    };
    MbtType {
        base: base.to_string(),
        ptr_depth: pointer_depth,
    }
}

// ---------------------------------------------------------------------------
// Enum type names
// ---------------------------------------------------------------------------

static ENUM_DECL: LazyLock<Regex> = LazyLock::new(|| {
    // Matches both `typedef enum Name { … } Name;` and `typedef enum { … } Name;`.
    Regex::new(r"(?s)typedef\s+enum(?:\s+\w+)?\s*\{(?P<body>.*?)\}\s*(?P<name>\w+)\s*;").unwrap()
});

/// Names declared via `typedef enum [tag]? { … } Name;`.
pub fn parse_enum_type_names(text: &str) -> BTreeSet<String> {
    ENUM_DECL
        .captures_iter(text)
        .map(|c| c["name"].to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Simple typedef aliases
// ---------------------------------------------------------------------------

/// Single-line `typedef <rhs> <Name>;` aliases, keyed by name.
///
/// Entries with braces, attribute macros, or parenthesized (function
/// pointer) forms are out of scope and silently skipped.
pub fn parse_typedef_aliases(text: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in text.lines() {
        let s = norm_ws(line);
        let Some(rest) = s.strip_prefix("typedef ") else {
            continue;
        };
        let Some(rest) = rest.strip_suffix(';') else {
            continue;
        };
        if s.contains('{') || s.contains('}') {
            continue;
        }
        if s.contains("WGPU_OBJECT_ATTRIBUTE") || s.contains("WGPU_FUNCTION_ATTRIBUTE") {
            continue;
        }
        if rest.contains('(') || rest.contains(')') {
            continue;
        }
        let rest = rest.trim();
        let parts: Vec<&str> = rest.split(' ').collect();
        if parts.len() < 2 {
            continue;
        }
        let name = parts[parts.len() - 1].to_string();
        let rhs = strip_qualifiers(&parts[..parts.len() - 1].join(" "));
        out.insert(name, rhs);
    }
    out
}

// ---------------------------------------------------------------------------
// Typedef resolution
// ---------------------------------------------------------------------------

/// Resolve typedef aliases transitively to MoonBit primitive names.
///
/// `WGPUFlags -> UInt64`, `WGPUBufferUsage -> UInt64` (via `WGPUFlags`).
/// Unresolvable or cyclic names are simply absent from the output map.
pub fn resolve_typedef_primitives(aliases: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut resolved: BTreeMap<String, String> = BTreeMap::new();
    for name in aliases.keys() {
        let mut seen = BTreeSet::new();
        resolve_one(name, aliases, &mut resolved, &mut seen);
    }
    resolved
}

fn resolve_one(
    name: &str,
    aliases: &BTreeMap<String, String>,
    resolved: &mut BTreeMap<String, String>,
    seen: &mut BTreeSet<String>,
) -> Option<String> {
    if let Some(prim) = resolved.get(name) {
        return Some(prim.clone());
    }
    // A revisited name means the chain is cyclic; leave it unresolved.
    if !seen.insert(name.to_string()) {
        return None;
    }
    let rhs = aliases.get(name)?;
    let mapped = map_c_type(rhs, 0);
    if mapped.is_primitive() {
        resolved.insert(name.to_string(), mapped.base.clone());
        return Some(mapped.base);
    }
    let chained = resolve_one(rhs, aliases, resolved, seen)?;
    resolved.insert(name.to_string(), chained.clone());
    Some(chained)
}

// ---------------------------------------------------------------------------
// Numeric constants
// ---------------------------------------------------------------------------

static MACRO_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([^()]+)\)$").unwrap());

/// The small subset of numeric `#define`s worth exposing: paren-wrapped
/// sentinel tokens like `#define WGPU_WHOLE_SIZE (UINT64_MAX)`.
pub fn parse_numeric_macros(text: &str) -> Vec<Constant> {
    let mut out = Vec::new();
    for line in text.lines() {
        let s = line.trim();
        let Some(rest) = s.strip_prefix("#define ") else {
            continue;
        };
        let mut parts = rest.splitn(2, char::is_whitespace);
        let Some(name) = parts.next() else { continue };
        let Some(rhs) = parts.next() else { continue };
        let Some(m) = MACRO_PAREN.captures(rhs.trim()) else {
            continue;
        };
        let (width, value) = match m[1].trim() {
            "UINT32_MAX" => (ConstWidth::U32, u32::MAX as u64),
            "UINT64_MAX" => (ConstWidth::U64, u64::MAX),
            // size_t is 64-bit in our ABI layer.
            "SIZE_MAX" => (ConstWidth::U64, u64::MAX),
            _ => continue,
        };
        out.push(Constant {
            name: name.to_string(),
            width,
            value,
        });
    }
    out
}

/// Parse an integer literal with base autodetect: `0x` hex or decimal.
fn parse_int_literal(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse::<u64>().ok()
    }
}

/// Numeric `Name = value` assignments inside enum bodies.
///
/// Non-numeric right-hand sides (expressions referencing other constants)
/// are dropped silently.
pub fn parse_enum_constants(text: &str) -> Vec<Constant> {
    let mut out = Vec::new();
    for m in ENUM_DECL.captures_iter(text) {
        for line in m["body"].lines() {
            let s = norm_ws(&strip_comments(line));
            if s.is_empty() || !s.contains('=') {
                continue;
            }
            let s = s.strip_suffix(',').unwrap_or(&s).trim();
            let Some((name, rhs)) = s.split_once('=') else {
                continue;
            };
            let Some(value) = parse_int_literal(rhs) else {
                continue;
            };
            out.push(Constant {
                name: name.trim().to_string(),
                width: ConstWidth::U32,
                value,
            });
        }
    }
    out
}

static STATIC_CONST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^static const\s+(\w+)\s+(\w+)\s*=\s*(.+);$").unwrap());

/// `static const <Type> <Name> = <int>;` declarations.
///
/// The declared type is resolved through the typedef-primitive map to pick
/// the output width; anything that is not explicitly 64-bit stays 32-bit
/// (enum-typed consts are treated as `UInt`).
pub fn parse_static_const_numbers(
    text: &str,
    typedef_primitives: &BTreeMap<String, String>,
) -> Vec<Constant> {
    let mut out = Vec::new();
    for line in text.lines() {
        let s = norm_ws(&strip_comments(line));
        let Some(m) = STATIC_CONST.captures(&s) else {
            continue;
        };
        let Some(value) = parse_int_literal(m[3].trim()) else {
            continue;
        };
        let width = match typedef_primitives.get(&m[1]).map(String::as_str) {
            Some("UInt64") => ConstWidth::U64,
            _ => ConstWidth::U32,
        };
        out.push(Constant {
            name: m[2].to_string(),
            width,
            value,
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Function prototypes
// ---------------------------------------------------------------------------

/// MoonBit keywords that cannot be used as parameter names.
const RESERVED_PARAM_NAMES: [&str; 5] = ["type", "let", "pub", "fn", "match"];

static EXPORT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)WGPU_EXPORT\s+.*?;").unwrap());
static EXPORT_PROTO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^WGPU_EXPORT\s+(?P<ret>.+?)\s+(?P<name>wgpu\w+)\s*\((?P<params>.*?)\)\s*[^;]*;")
        .unwrap()
});
static ANY_PROTO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<ret>.+?)\s+(?P<name>wgpu\w+)\s*\((?P<params>.*?)\)\s*;$").unwrap()
});

/// Split one comma-separated parameter token into (name, type).
///
/// The token is tokenized with `*` as a separate token so pointer depth can
/// be recovered by counting stars; the last remaining token is the
/// parameter name. Reserved MoonBit identifiers are escaped with a
/// trailing underscore.
fn parse_param(token: &str) -> Option<Param> {
    let p = strip_qualifiers(token).replace('*', " * ");
    let tokens: Vec<&str> = p.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }
    let mut name = tokens[tokens.len() - 1].to_string();
    let ty_tokens = &tokens[..tokens.len() - 1];
    let star_depth = ty_tokens.iter().filter(|t| **t == "*").count();
    let base_tokens: Vec<&str> = ty_tokens.iter().copied().filter(|t| *t != "*").collect();
    let base = if base_tokens.is_empty() {
        "void".to_string()
    } else {
        base_tokens.join(" ")
    };
    if RESERVED_PARAM_NAMES.contains(&name.as_str()) {
        name.push('_');
    }
    Some(Param {
        name,
        ty: map_c_type(&base, star_depth),
    })
}

fn parse_param_list(params_c: &str) -> Vec<Param> {
    let params_c = params_c.trim();
    if params_c.is_empty() || params_c == "void" {
        return Vec::new();
    }
    params_c.split(',').filter_map(parse_param).collect()
}

fn parse_return_type(ret_c: &str) -> MbtType {
    let depth = ret_c.matches('*').count();
    map_c_type(&ret_c.replace('*', ""), depth)
}

/// Prototypes marked with the `WGPU_EXPORT` token.
///
/// Function-pointer typedefs look similar but carry `typedef` and are
/// rejected; individually malformed prototypes are skipped.
pub fn parse_exported_functions(text: &str) -> Vec<Func> {
    let mut out = Vec::new();
    for span in EXPORT_SPAN.find_iter(text) {
        let proto = norm_ws(span.as_str());
        if proto.contains("typedef") {
            continue;
        }
        let Some(m) = EXPORT_PROTO.captures(&proto) else {
            continue;
        };
        out.push(Func {
            name: m["name"].to_string(),
            ret: parse_return_type(&m["ret"]),
            params: parse_param_list(&m["params"]),
        });
    }
    out
}

/// Prototypes not marked with `WGPU_EXPORT` (the wgpu-native extras):
/// any single-line `<ret> wgpu<Name>(<params>);` shape.
pub fn parse_any_functions(text: &str) -> Vec<Func> {
    let mut out = Vec::new();
    for line in text.lines() {
        let s = norm_ws(line);
        if !s.ends_with(';') || !s.contains("wgpu") || s.starts_with("typedef ") {
            continue;
        }
        let Some(m) = ANY_PROTO.captures(&s) else {
            continue;
        };
        out.push(Func {
            name: m["name"].to_string(),
            ret: parse_return_type(&m["ret"]),
            params: parse_param_list(&m["params"]),
        });
    }
    out
}
