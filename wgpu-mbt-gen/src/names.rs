//! Naming — native `WGPU`/`wgpu` identifiers → MoonBit snake_case.

use std::sync::LazyLock;

use regex::Regex;

static BOUNDARY_ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());
static BOUNDARY_LOWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
static DIGIT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)_([a-z])($|[^a-z0-9])").unwrap());

/// CamelCase → snake_case, with acronym and digit boundaries handled:
/// `TextureView` → `texture_view`, `GetWGSLLanguageFeatures` →
/// `get_wgsl_language_features`. A digit token followed by a single
/// trailing letter is collapsed back together so a dimensionality suffix
/// like `2D` becomes `2d`, not `2_d`.
pub fn camel_to_snake(name: &str) -> String {
    let s = BOUNDARY_ACRONYM.replace_all(name, "${1}_${2}");
    let s = BOUNDARY_LOWER.replace_all(&s, "${1}_${2}");
    let s = s.replace("__", "_").to_lowercase();
    DIGIT_SUFFIX.replace_all(&s, "${1}${2}${3}").into_owned()
}

/// Native constant name → MoonBit constant name.
///
/// `WGPUBufferUsage_CopySrc` → `buffer_usage_copy_src`,
/// `WGPU_WHOLE_SIZE` → `whole_size`,
/// `WGPUWaitStatus_Success` → `wait_status_success`.
pub fn constant_name(c_name: &str) -> String {
    if let Some(rest) = c_name.strip_prefix("WGPU_") {
        return rest.to_lowercase();
    }
    let Some(rest) = c_name.strip_prefix("WGPU") else {
        return camel_to_snake(c_name);
    };
    match rest.split_once('_') {
        Some((head, tail)) => format!("{}_{}", camel_to_snake(head), camel_to_snake(tail)),
        None => camel_to_snake(rest),
    }
}
