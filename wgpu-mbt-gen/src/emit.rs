//! Emitters — registry + function list → generated MoonBit source files.
//!
//! Every generator is a pure function of its inputs and emits type and
//! function lists sorted by name, so regeneration on unchanged input is
//! byte-identical.

use std::collections::BTreeMap;

use crate::model::{Constant, ConstWidth, Func, TypeClass, TypeRegistry};
use crate::names;

/// License header for generated MoonBit files.
pub const LICENSE_HEADER: &str = "\
// Copyright 2025 International Digital Economy Academy
//
// Licensed under the Apache License, Version 2.0 (the \"License\");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an \"AS IS\" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.";

fn sorted_funcs(funcs: &[Func]) -> Vec<&Func> {
    let mut list: Vec<&Func> = funcs.iter().collect();
    list.sort_by(|a, b| a.name.cmp(&b.name));
    list
}

fn param_sig(f: &Func) -> String {
    f.params
        .iter()
        .map(|p| format!("{} : {}", p.name, p.ty.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Hex literal sized to the constant's width.
pub fn int_literal(value: u64, width: ConstWidth) -> String {
    match width {
        ConstWidth::U64 => format!("0x{value:016X}UL"),
        ConstWidth::U32 => format!("0x{value:08X}U"),
    }
}

// ---------------------------------------------------------------------------
// Declaration-only spec
// ---------------------------------------------------------------------------

/// The declaration-only contract file: a type-checkable mirror of the
/// header with no executable content.
pub fn render_spec(funcs: &[Func], registry: &TypeRegistry) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(LICENSE_HEADER.to_string());
    lines.push(String::new());
    lines.push("///|".to_string());
    lines.push("/// WebGPU C API contract (generated from webgpu.h).".to_string());
    lines.push("///".to_string());
    lines.push("/// This is a declaration-only mirror of the upstream header.".to_string());
    lines.push("/// It is meant for spec-first / test-first development:".to_string());
    lines.push("/// - `moon check` must stay green".to_string());
    lines.push("/// - `moon test` is allowed to be red until the real FFI is implemented".to_string());
    lines.push("///".to_string());
    lines.push("/// Generated by: wgpu-mbt-gen".to_string());

    for (name, entry) in &registry.types {
        lines.push(String::new());
        lines.push("///|".to_string());
        match &entry.class {
            TypeClass::Enum => lines.push(format!("pub type {name} = UInt")),
            TypeClass::Alias(prim) => lines.push(format!("pub type {name} = {prim}")),
            TypeClass::Opaque => {
                lines.push("#declaration_only".to_string());
                lines.push(format!("pub type {name}"));
            }
        }
    }

    for f in sorted_funcs(funcs) {
        lines.push(String::new());
        lines.push("///|".to_string());
        lines.push("#declaration_only".to_string());
        lines.push(format!(
            "declare pub fn {}({}) -> {}",
            f.name,
            param_sig(f),
            f.ret.name()
        ));
    }

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Executable bindings
// ---------------------------------------------------------------------------

/// The executable bindings file: concrete type representations plus
/// `extern "C"` linkage declarations.
///
/// Opaque handle types are aliased to the hand-written wrapper names from
/// `handle_aliases` where one exists; generic pointer-wrapper types are
/// aliased to the opaque `UnitPtr` representation. Pointer-typed
/// parameters are flagged `#borrow` — the binding must not outlive the
/// call.
pub fn render_bindings(
    funcs: &[Func],
    registry: &TypeRegistry,
    handle_aliases: &BTreeMap<String, String>,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(LICENSE_HEADER.to_string());
    lines.push(String::new());
    lines.push("///|".to_string());
    lines.push("/// WebGPU C API bindings (generated).".to_string());
    lines.push("///".to_string());
    lines.push("/// This file exists to satisfy `#declaration_only` items in the".to_string());
    lines.push("/// generated contract file, so `moon check` has zero".to_string());
    lines.push("/// `declaration_unimplemented` warnings.".to_string());
    lines.push("///".to_string());
    lines.push("/// Generated by: wgpu-mbt-gen".to_string());

    for (name, entry) in &registry.types {
        // Enum- and typedef-backed value types are defined in the spec file.
        if !matches!(entry.class, TypeClass::Opaque) {
            continue;
        }
        lines.push(String::new());
        lines.push("///|".to_string());
        lines.push("#external".to_string());
        if let Some(alias) = handle_aliases.get(name) {
            lines.push(format!("#alias({alias})"));
        } else if entry.ty.is_ptr() && name != "UnitPtr" && name != "UIntPtr" {
            lines.push("#alias(UnitPtr)".to_string());
        }
        lines.push(format!("pub type {name}"));
    }

    for f in sorted_funcs(funcs) {
        lines.push(String::new());
        lines.push("///|".to_string());
        let borrowed: Vec<&str> = f
            .params
            .iter()
            .filter(|p| p.ty.is_ptr())
            .map(|p| p.name.as_str())
            .collect();
        if !borrowed.is_empty() {
            lines.push(format!("#borrow({})", borrowed.join(", ")));
        }
        lines.push(format!(
            "pub extern \"C\" fn {}({}) -> {} = \"{}\"",
            f.name,
            param_sig(f),
            f.ret.name(),
            f.name
        ));
    }

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The constants file: numeric macros, static consts, and enum constants,
/// deduplicated by native name (first occurrence wins) and emitted in
/// sorted order as fixed-width hex literals.
pub fn render_constants(constants: &[Constant]) -> String {
    let mut seen = std::collections::BTreeSet::new();
    let mut uniq: Vec<&Constant> = Vec::new();
    for c in constants {
        if seen.insert(c.name.as_str()) {
            uniq.push(c);
        }
    }
    uniq.sort_by(|a, b| a.name.cmp(&b.name));

    let mut lines: Vec<String> = Vec::new();
    lines.push(LICENSE_HEADER.to_string());
    lines.push(String::new());
    lines.push("///|".to_string());
    lines.push("/// WebGPU constants (generated from `webgpu.h`).".to_string());
    lines.push("///".to_string());
    lines.push("/// This file intentionally exposes the full constant surface (enums,".to_string());
    lines.push("/// bitflags, and a small subset of numeric `#define`s) for MoonBit usage.".to_string());

    for c in uniq {
        let ty = match c.width {
            ConstWidth::U32 => "UInt",
            ConstWidth::U64 => "UInt64",
        };
        lines.push(String::new());
        lines.push("///|".to_string());
        lines.push(format!(
            "pub let {} : {} = {}",
            names::constant_name(&c.name),
            ty,
            int_literal(c.value, c.width)
        ));
    }

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Symbol coverage test
// ---------------------------------------------------------------------------

/// An always-passing marker test whose statically-false branch references
/// every bound symbol by name, turning "symbol not found" into a check
/// failure without requiring runtime execution.
pub fn render_symbol_test(funcs: &[Func]) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(LICENSE_HEADER.to_string());
    lines.push(String::new());
    lines.push("///|".to_string());
    lines.push("test \"spec: webgpu.h symbol coverage (expected red)\" {".to_string());
    lines.push(
        "  // This block is never executed; it only forces the compiler to resolve symbols."
            .to_string(),
    );
    lines.push("  if false {".to_string());
    for f in sorted_funcs(funcs) {
        lines.push(format!("    let _ = @wgpu_c.{}", f.name));
    }
    lines.push("  }".to_string());
    lines.push(
        "  // Snapshot a stable marker so this stays green while providing symbol coverage."
            .to_string(),
    );
    lines.push("  inspect(\"symbol coverage ok\", content=\"symbol coverage ok\")".to_string());
    lines.push("}".to_string());

    lines.join("\n") + "\n"
}
