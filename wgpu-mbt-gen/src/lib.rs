//! wgpu-mbt-gen — keeps MoonBit FFI bindings for wgpu-native in sync with
//! the C API headers.
//!
//! The pipeline is deliberately regex-based (no libclang) so it runs
//! anywhere: strip comments, extract enum names / typedef chains /
//! prototypes / numeric constants from the headers, then render four
//! generated artifacts (declaration-only spec, extern bindings, constants,
//! symbol-coverage test) and splice synthesized handle wrappers into the
//! marked regions of the hand-maintained MoonBit files.
//!
//! Everything is generated in memory first; nothing is written until the
//! whole pipeline has succeeded.

pub mod audit;
pub mod config;
pub mod emit;
pub mod extract;
pub mod model;
pub mod names;
pub mod splice;
pub mod wrappers;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::config::Config;
use crate::model::{Constant, Func, TypeRegistry};
use crate::wrappers::{METHODS_BEGIN, METHODS_END, TYPES_BEGIN, TYPES_END};

/// Everything one generator run produces, rendered but not yet written.
#[derive(Debug)]
pub struct Artifacts {
    pub spec: String,
    pub bindings: String,
    pub constants: String,
    pub symbol_test: String,
    pub wrapper_impl: String,
    pub wrapper_spec: String,
    /// Function names the wrapper synthesizer could not map, unique and
    /// sorted.
    pub skipped: Vec<String>,
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_stripped(root: &Path, rels: &[PathBuf]) -> Result<String> {
    let mut out = String::new();
    for rel in rels {
        out.push_str(&extract::strip_comments(&read(&root.join(rel))?));
        out.push('\n');
    }
    Ok(out)
}

/// De-duplicate prototypes by full signature (last occurrence wins) and
/// sort by name. A symbol declared twice with differing signatures keeps
/// only the later declaration, with a warning; silently emitting both
/// would produce two MoonBit functions with the same name.
fn dedup_funcs(funcs: Vec<Func>) -> Vec<Func> {
    let mut by_sig: BTreeMap<(String, String, Vec<(String, String)>), Func> = BTreeMap::new();
    let mut sig_by_name: BTreeMap<String, (String, String, Vec<(String, String)>)> =
        BTreeMap::new();
    for f in funcs {
        let key = f.signature_key();
        if let Some(prev) = sig_by_name.get(&f.name) {
            if *prev != key {
                warn!(name = %f.name, "conflicting prototypes for symbol, keeping the last one");
                by_sig.remove(prev);
            }
        }
        sig_by_name.insert(f.name.clone(), key.clone());
        by_sig.insert(key, f);
    }
    let mut out: Vec<Func> = by_sig.into_values().collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Run the full pipeline against the repo at `root`, in memory.
pub fn generate(root: &Path, config: &Config) -> Result<Artifacts> {
    let exported_text = read_stripped(root, &config.headers.exported)?;
    let extras_text = read_stripped(root, &config.headers.extras)?;
    let combined = format!("{exported_text}\n{extras_text}");

    let enum_types = extract::parse_enum_type_names(&combined);
    let typedef_aliases = extract::parse_typedef_aliases(&combined);
    let typedef_primitives = extract::resolve_typedef_primitives(&typedef_aliases);

    let mut funcs = extract::parse_exported_functions(&exported_text);
    funcs.extend(extract::parse_any_functions(&extras_text));
    if funcs.is_empty() {
        bail!("no function prototypes found; header format changed?");
    }
    let funcs = dedup_funcs(funcs);
    info!(
        functions = funcs.len(),
        enums = enum_types.len(),
        "extracted header surface"
    );

    let registry = TypeRegistry::build(&funcs, &enum_types, &typedef_primitives);

    let mut constants: Vec<Constant> = extract::parse_numeric_macros(&combined);
    constants.extend(extract::parse_static_const_numbers(
        &combined,
        &typedef_primitives,
    ));
    constants.extend(extract::parse_enum_constants(&combined));

    let spec = emit::render_spec(&funcs, &registry);
    let bindings = emit::render_bindings(&funcs, &registry, &config.handle_aliases);
    let constants = emit::render_constants(&constants);
    let symbol_test = emit::render_symbol_test(&funcs);

    // Wrapper synthesis over the hand-maintained files. Generated regions
    // are stripped before scanning so previously generated structs and
    // methods never count as hand-written and reruns are idempotent.
    let tables = config.wrapper_tables();
    let handles = wrappers::handle_types(&funcs);

    let impl_text = read(&root.join(&config.wrappers.impl_file))?;
    let spec_text = read(&root.join(&config.wrappers.spec_file))?;

    let scan_text = splice::strip_marked_section(&impl_text, TYPES_BEGIN, TYPES_END)?;
    let scan_text = splice::strip_marked_section(&scan_text, METHODS_BEGIN, METHODS_END)?;
    let existing_structs = wrappers::parse_existing_wrapper_structs(&scan_text);
    let existing_methods = wrappers::parse_existing_methods(&scan_text);
    let existing_wrapper_names: BTreeSet<String> = existing_structs.values().cloned().collect();

    let structs = wrappers::generate_structs(&handles, &existing_wrapper_names, &tables);
    let spec_types = wrappers::generate_spec_types(&handles, &existing_wrapper_names, &tables);

    let mut used = wrappers::UsedNames::seeded(existing_methods);
    let generated = wrappers::generate_methods(&funcs, &handles, &existing_structs, &mut used, &tables);
    info!(
        handles = handles.len(),
        methods = generated.methods.len(),
        skipped = generated.skipped.len(),
        "synthesized handle wrappers"
    );

    let wrapper_impl = splice::replace_marked_section(&impl_text, TYPES_BEGIN, TYPES_END, &structs)?;
    let wrapper_impl = splice::replace_marked_section(
        &wrapper_impl,
        METHODS_BEGIN,
        METHODS_END,
        &wrappers::render_method_blocks(&generated.methods),
    )?;

    let wrapper_spec =
        splice::replace_marked_section(&spec_text, TYPES_BEGIN, TYPES_END, &spec_types)?;
    let wrapper_spec = splice::replace_marked_section(
        &wrapper_spec,
        METHODS_BEGIN,
        METHODS_END,
        &wrappers::render_spec_method_blocks(&generated.methods),
    )?;

    let skipped: BTreeSet<String> = generated.skipped.into_iter().collect();

    Ok(Artifacts {
        spec,
        bindings,
        constants,
        symbol_test,
        wrapper_impl,
        wrapper_spec,
        skipped: skipped.into_iter().collect(),
    })
}

fn write(root: &Path, rel: &Path, text: &str, what: &str) -> Result<()> {
    let path = root.join(rel);
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %rel.display(), bytes = text.len(), "wrote {what}");
    Ok(())
}

/// Generate everything and write the results back into the repo at `root`.
pub fn run(root: &Path, config: &Config) -> Result<()> {
    let artifacts = generate(root, config)?;

    write(root, &config.output.spec, &artifacts.spec, "spec")?;
    write(root, &config.output.bindings, &artifacts.bindings, "bindings")?;
    write(root, &config.output.constants, &artifacts.constants, "constants")?;
    write(root, &config.output.symbol_test, &artifacts.symbol_test, "symbol test")?;
    write(root, &config.wrappers.impl_file, &artifacts.wrapper_impl, "wrappers")?;
    write(root, &config.wrappers.spec_file, &artifacts.wrapper_spec, "wrapper spec")?;

    if !artifacts.skipped.is_empty() {
        warn!(
            count = artifacts.skipped.len(),
            "skipped functions (need by-value struct helpers)"
        );
        for name in artifacts.skipped.iter().take(50) {
            warn!(name = %name, "skipped");
        }
        if artifacts.skipped.len() > 50 {
            warn!("... and {} more", artifacts.skipped.len() - 50);
        }
    }

    Ok(())
}
