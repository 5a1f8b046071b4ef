//! Handle & wrapper synthesis — reference-counted handle detection and
//! object-style method generation for the hand-maintained wrapper files.
//!
//! Only "handle methods" are generated: functions named `wgpu<Handle><Op>`
//! whose first parameter is a detected handle type. API shapes the generic
//! mapper cannot represent safely (by-value structs, callback/future APIs)
//! go through an ordered special-case table first; whatever that table
//! neither rewrites nor marks covered falls back to the generic mapper or
//! is skipped with a diagnostic.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::model::Func;
use crate::names::camel_to_snake;

pub const TYPES_BEGIN: &str = "// --- BEGIN GENERATED WEBGPU HANDLE TYPES ---";
pub const TYPES_END: &str = "// --- END GENERATED WEBGPU HANDLE TYPES ---";
pub const METHODS_BEGIN: &str = "// --- BEGIN GENERATED WEBGPU HANDLE METHODS ---";
pub const METHODS_END: &str = "// --- END GENERATED WEBGPU HANDLE METHODS ---";

/// Hand-written lookup tables steering wrapper generation; loaded from the
/// config file (with the wgpu defaults).
#[derive(Debug, Clone)]
pub struct WrapperTables {
    /// Raw handle base name (without `WGPU`) → public wrapper type name,
    /// for handles whose public name differs from the mechanical
    /// strip-prefix derivation.
    pub overrides: BTreeMap<String, String>,
    /// Wrapper type names that are fully hand-written (extra fields) and
    /// must never be auto-generated.
    pub skip_structs: BTreeSet<String>,
    /// Type-name substrings marking a parameter/return as unsupported for
    /// wrapper generation (by-value structs, callback infos).
    pub unsupported_substrings: Vec<String>,
}

impl WrapperTables {
    /// Public wrapper type name for a raw handle type (`WGPUFoo` → `Foo`,
    /// modulo overrides).
    pub fn wrapper_name(&self, handle_ty: &str) -> String {
        let base = handle_ty.strip_prefix("WGPU").unwrap_or(handle_ty);
        self.overrides
            .get(base)
            .cloned()
            .unwrap_or_else(|| base.to_string())
    }

    fn is_unsupported(&self, ty_name: &str) -> bool {
        if ty_name == "UnitPtr" || ty_name == "UIntPtr" {
            return true;
        }
        self.unsupported_substrings
            .iter()
            .any(|s| ty_name.contains(s.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Handle detection
// ---------------------------------------------------------------------------

static LIFECYCLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^wgpu(?P<h>[A-Za-z0-9]+?)(?P<op>AddRef|Release)$").unwrap());

/// Detect handle types from paired lifecycle functions: a base name is a
/// handle iff both `wgpu<Base>AddRef` and `wgpu<Base>Release` exist with
/// the handle as first parameter.
pub fn handle_types(funcs: &[Func]) -> BTreeSet<String> {
    let mut addref: BTreeSet<String> = BTreeSet::new();
    let mut release: BTreeSet<String> = BTreeSet::new();
    for f in funcs {
        let Some(m) = LIFECYCLE.captures(&f.name) else {
            continue;
        };
        let handle = format!("WGPU{}", &m["h"]);
        if f.params.first().map(|p| p.ty.name()) != Some(handle.clone()) {
            continue;
        }
        match &m["op"] {
            "AddRef" => addref.insert(handle),
            _ => release.insert(handle),
        };
    }
    addref.intersection(&release).cloned().collect()
}

// ---------------------------------------------------------------------------
// Scanning the hand-maintained files
// ---------------------------------------------------------------------------

static WRAPPER_STRUCT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)pub\s+struct\s+(?P<w>[A-Za-z0-9_]+)\s*\{\s*raw\s*:\s*(?P<raw>@c\.[A-Za-z0-9_]+)")
        .unwrap()
});
static WRAPPER_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"pub\s+fn\s+(?P<t>[A-Za-z0-9_]+)::(?P<m>[A-Za-z0-9_]+)\s*\(").unwrap()
});

/// Wrapper structs already present in a hand-maintained file, as a map
/// from raw type (`@c.Foo`) to wrapper name. The caller must strip the
/// generated marker regions first so previously generated structs do not
/// count as hand-written.
pub fn parse_existing_wrapper_structs(text: &str) -> BTreeMap<String, String> {
    WRAPPER_STRUCT
        .captures_iter(text)
        .map(|c| (c["raw"].to_string(), c["w"].to_string()))
        .collect()
}

/// Methods already present in a hand-maintained file, grouped by wrapper
/// type. Same marker-stripping caveat as [`parse_existing_wrapper_structs`].
pub fn parse_existing_methods(text: &str) -> BTreeMap<String, BTreeSet<String>> {
    let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for c in WRAPPER_METHOD.captures_iter(text) {
        out.entry(c["t"].to_string())
            .or_default()
            .insert(c["m"].to_string());
    }
    out
}

// ---------------------------------------------------------------------------
// Name allocation state
// ---------------------------------------------------------------------------

/// Per-receiver claimed method names, threaded explicitly through one
/// synthesis pass. Seeded from the hand-written file so generated methods
/// never collide with hand-written ones; consumed as methods are
/// allocated, so a pass must not be rerun on the same instance.
#[derive(Debug, Default)]
pub struct UsedNames {
    map: BTreeMap<String, BTreeSet<String>>,
}

impl UsedNames {
    pub fn seeded(existing: BTreeMap<String, BTreeSet<String>>) -> Self {
        UsedNames { map: existing }
    }

    pub fn contains(&self, recv: &str, name: &str) -> bool {
        self.map.get(recv).is_some_and(|s| s.contains(name))
    }

    /// Claim `desired` on `recv`, appending `_raw` until unique.
    pub fn claim(&mut self, recv: &str, desired: &str) -> String {
        let used = self.map.entry(recv.to_string()).or_default();
        let mut name = desired.to_string();
        while used.contains(&name) {
            name.push_str("_raw");
        }
        used.insert(name.clone());
        name
    }
}

// ---------------------------------------------------------------------------
// Wrapper methods
// ---------------------------------------------------------------------------

/// One synthesized wrapper method; rendered into both the executable
/// wrapper file and the declaration-only spec file.
#[derive(Debug, Clone)]
pub struct WrapperMethod {
    pub recv: String,
    pub name: String,
    /// Parameters excluding the receiver, as (name, type) pairs.
    pub params: Vec<(String, String)>,
    pub ret: String,
    /// Body lines, unindented.
    pub body: Vec<String>,
}

impl WrapperMethod {
    pub fn render_impl(&self) -> String {
        let mut lines = vec![
            "///|".to_string(),
            format!("pub fn {}::{}(", self.recv, self.name),
            format!("  self : {},", self.recv),
        ];
        for (name, ty) in &self.params {
            lines.push(format!("  {name} : {ty},"));
        }
        lines.push(format!(") -> {} {{", self.ret));
        for line in &self.body {
            lines.push(format!("  {line}"));
        }
        lines.push("}".to_string());
        lines.join("\n")
    }

    pub fn render_spec(&self) -> String {
        let mut lines = vec![
            "///|".to_string(),
            "#declaration_only".to_string(),
            format!("declare pub fn {}::{}(", self.recv, self.name),
            format!("  self : {},", self.recv),
        ];
        for (name, ty) in &self.params {
            lines.push(format!("  {name} : {ty},"));
        }
        lines.push(format!(") -> {}", self.ret));
        lines.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Struct generation
// ---------------------------------------------------------------------------

/// Generated wrapper structs for handles that are neither hand-written nor
/// in the skip set.
pub fn generate_structs(
    handles: &BTreeSet<String>,
    existing_wrapper_names: &BTreeSet<String>,
    tables: &WrapperTables,
) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for h in handles {
        let wrapper = tables.wrapper_name(h);
        if tables.skip_structs.contains(&wrapper) || existing_wrapper_names.contains(&wrapper) {
            continue;
        }
        // Handles are exposed in the c package via #alias(<BaseName>).
        blocks.push(format!(
            "///|\npub struct {wrapper} {{\n  raw : @c.{wrapper}\n}}"
        ));
    }
    if blocks.is_empty() {
        return String::new();
    }
    blocks.join("\n") + "\n"
}

/// Declaration-only counterparts of [`generate_structs`].
pub fn generate_spec_types(
    handles: &BTreeSet<String>,
    existing_wrapper_names: &BTreeSet<String>,
    tables: &WrapperTables,
) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for h in handles {
        let wrapper = tables.wrapper_name(h);
        if tables.skip_structs.contains(&wrapper) || existing_wrapper_names.contains(&wrapper) {
            continue;
        }
        blocks.push(format!("///|\n#declaration_only\npub type {wrapper}"));
    }
    if blocks.is_empty() {
        return String::new();
    }
    blocks.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Special-case table
// ---------------------------------------------------------------------------

/// Outcome of a special-case rule. A rule never falls through silently:
/// it either rewrites the method, declares the API already covered by a
/// hand-written helper, or explicitly defers to the generic mapper.
enum SpecialOutcome {
    Emit(WrapperMethod),
    Covered,
    Passthrough,
}

/// Checked before generic mapping, in priority order: string-view label
/// setters, dynamic bind-group offsets, push-constant uploads, queue
/// writes, callback/future async APIs, and the buffer-mapping triplet.
fn special_case(
    f: &Func,
    recv: &str,
    op_camel: &str,
    used: &mut UsedNames,
) -> SpecialOutcome {
    // WGPUStringView label/marker APIs: route through the *_utf8 helpers
    // that take raw bytes plus a length.
    if matches!(op_camel, "SetLabel" | "InsertDebugMarker" | "PushDebugGroup") {
        let desired = camel_to_snake(op_camel);
        if used.contains(recv, &desired) {
            return SpecialOutcome::Covered;
        }
        let helper = format!("{}_{}_utf8", camel_to_snake(recv), desired);
        let name = used.claim(recv, &desired);
        return SpecialOutcome::Emit(WrapperMethod {
            recv: recv.to_string(),
            name,
            params: vec![("label".into(), "String".into())],
            ret: "Unit".into(),
            body: vec![
                "let bytes = label.to_bytes()".into(),
                format!("@c.{helper}(self.raw, bytes, bytes.length().to_uint64())"),
            ],
        });
    }

    // Dynamic bind-group offset arrays: Array[UInt] helper in @c.
    if op_camel == "SetBindGroup" {
        if used.contains(recv, "set_bind_group") {
            return SpecialOutcome::Covered;
        }
        let helper = format!("{}_set_bind_group", camel_to_snake(recv));
        let name = used.claim(recv, "set_bind_group");
        return SpecialOutcome::Emit(WrapperMethod {
            recv: recv.to_string(),
            name,
            params: vec![
                ("index".into(), "UInt".into()),
                ("group".into(), "BindGroup".into()),
                ("dynamic_offsets".into(), "Array[UInt]".into()),
            ],
            ret: "Unit".into(),
            body: vec![format!(
                "@c.{helper}(self.raw, index, group.raw, dynamic_offsets)"
            )],
        });
    }

    // Push-constant byte uploads: borrowed Bytes helpers per receiver kind.
    if op_camel == "SetPushConstants" {
        if used.contains(recv, "set_push_constants") {
            return SpecialOutcome::Covered;
        }
        let (params, helper): (Vec<(String, String)>, &str) = match recv {
            "ComputePass" => (
                vec![
                    ("offset".into(), "UInt".into()),
                    ("data".into(), "Bytes".into()),
                ],
                "compute_pass_set_push_constants_bytes",
            ),
            "RenderPass" => (
                vec![
                    ("stages".into(), "UInt64".into()),
                    ("offset".into(), "UInt".into()),
                    ("data".into(), "Bytes".into()),
                ],
                "render_pass_set_push_constants_bytes",
            ),
            "RenderBundleEncoder" => (
                vec![
                    ("stages".into(), "UInt64".into()),
                    ("offset".into(), "UInt".into()),
                    ("data".into(), "Bytes".into()),
                ],
                "render_bundle_encoder_set_push_constants_bytes",
            ),
            _ => return SpecialOutcome::Passthrough,
        };
        let args = params
            .iter()
            .map(|(n, _)| n.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let name = used.claim(recv, "set_push_constants");
        return SpecialOutcome::Emit(WrapperMethod {
            recv: recv.to_string(),
            name,
            params,
            ret: "Unit".into(),
            body: vec![format!(
                "@c.{helper}(self.raw, {args}, data.length().to_uint64())"
            )],
        });
    }

    // Queue writes: the public API already exposes Bytes-based wrappers.
    if f.name == "wgpuQueueWriteBuffer" && used.contains(recv, "write_buffer") {
        return SpecialOutcome::Covered;
    }
    if f.name == "wgpuQueueWriteTexture" && used.contains(recv, "write_texture_ptr") {
        return SpecialOutcome::Covered;
    }

    // CallbackInfo/future APIs: synchronous blocking counterparts that take
    // an explicit Instance to pump the event loop.
    if let Some(m) = async_sync_counterpart(f, recv, used) {
        return m;
    }

    // Buffer mapping and mapped-range access are covered by the safe sync
    // helpers (map_{read,write}_sync + unmap).
    if matches!(
        f.name.as_str(),
        "wgpuBufferMapAsync" | "wgpuBufferGetConstMappedRange" | "wgpuBufferGetMappedRange"
    ) && used.contains(recv, "map_read_sync")
        && used.contains(recv, "map_write_sync")
    {
        return SpecialOutcome::Covered;
    }

    SpecialOutcome::Passthrough
}

/// Synchronous-blocking replacements for the callback/future APIs.
fn async_sync_counterpart(f: &Func, recv: &str, used: &mut UsedNames) -> Option<SpecialOutcome> {
    struct SyncRule {
        desired: &'static str,
        params: Vec<(String, String)>,
        ret: &'static str,
        body: Vec<String>,
    }

    let rule = match f.name.as_str() {
        "wgpuInstanceRequestAdapter" => SyncRule {
            desired: "request_adapter_sync_ptr",
            params: vec![("options".into(), "@c.WGPURequestAdapterOptionsPtr".into())],
            ret: "Adapter",
            body: vec![
                "Adapter::{ raw: @c.instance_request_adapter_sync_ptr(self.raw, options) }".into(),
            ],
        },
        "wgpuAdapterRequestDevice" => SyncRule {
            desired: "request_device_sync_ptr",
            params: vec![
                ("instance".into(), "Instance".into()),
                ("descriptor".into(), "@c.WGPUDeviceDescriptorPtr".into()),
            ],
            ret: "Device",
            body: vec![
                "Device::{ raw: @c.adapter_request_device_sync_ptr(instance.raw, self.raw, descriptor) }"
                    .into(),
            ],
        },
        "wgpuQueueOnSubmittedWorkDone" => SyncRule {
            desired: "on_submitted_work_done_sync",
            params: vec![("instance".into(), "Instance".into())],
            ret: "UInt",
            body: vec!["@c.queue_on_submitted_work_done_sync(instance.raw, self.raw)".into()],
        },
        "wgpuDevicePopErrorScope" => SyncRule {
            desired: "pop_error_scope_sync",
            params: vec![("instance".into(), "Instance".into())],
            ret: "UInt",
            body: vec!["@c.device_pop_error_scope_sync_u32(instance.raw, self.raw)".into()],
        },
        "wgpuDeviceCreateComputePipelineAsync" => SyncRule {
            desired: "create_compute_pipeline_async_sync_ptr",
            params: vec![
                ("instance".into(), "Instance".into()),
                ("descriptor".into(), "@c.WGPUComputePipelineDescriptorPtr".into()),
            ],
            ret: "ComputePipeline",
            body: vec![
                "ComputePipeline::{ raw: @c.device_create_compute_pipeline_async_sync_ptr(instance.raw, self.raw, descriptor) }"
                    .into(),
            ],
        },
        "wgpuDeviceCreateRenderPipelineAsync" => SyncRule {
            desired: "create_render_pipeline_async_sync_ptr",
            params: vec![
                ("instance".into(), "Instance".into()),
                ("descriptor".into(), "@c.WGPURenderPipelineDescriptorPtr".into()),
            ],
            ret: "RenderPipeline",
            body: vec![
                "RenderPipeline::{ raw: @c.device_create_render_pipeline_async_sync_ptr(instance.raw, self.raw, descriptor) }"
                    .into(),
            ],
        },
        "wgpuShaderModuleGetCompilationInfo" => SyncRule {
            desired: "get_compilation_info_sync_status_u32",
            params: vec![("instance".into(), "Instance".into())],
            ret: "UInt",
            body: vec![
                "@c.shader_module_get_compilation_info_sync_status_u32(instance.raw, self.raw)"
                    .into(),
            ],
        },
        _ => return None,
    };

    if used.contains(recv, rule.desired) {
        return Some(SpecialOutcome::Covered);
    }
    let name = used.claim(recv, rule.desired);
    Some(SpecialOutcome::Emit(WrapperMethod {
        recv: recv.to_string(),
        name,
        params: rule.params,
        ret: rule.ret.to_string(),
        body: rule.body,
    }))
}

// ---------------------------------------------------------------------------
// Method generation
// ---------------------------------------------------------------------------

/// Result of one method-synthesis pass.
#[derive(Debug, Default)]
pub struct MethodGen {
    pub methods: Vec<WrapperMethod>,
    /// Function names skipped because their shape cannot be wrapped; the
    /// caller logs a bounded, deduplicated summary.
    pub skipped: Vec<String>,
}

fn sig_type_for_param(ty_name: &str, handles: &BTreeSet<String>, tables: &WrapperTables) -> (String, bool) {
    if handles.contains(ty_name) {
        return (tables.wrapper_name(ty_name), true);
    }
    if ty_name == "UnitPtr" || ty_name == "UIntPtr" || ty_name.starts_with("WGPU") {
        // Declared in the c package (the generated bindings file).
        return (format!("@c.{ty_name}"), false);
    }
    (ty_name.to_string(), false)
}

fn sig_type_for_return(
    ty_name: &str,
    handles: &BTreeSet<String>,
    tables: &WrapperTables,
) -> (String, Option<String>) {
    if handles.contains(ty_name) {
        let wrapper = tables.wrapper_name(ty_name);
        return (wrapper.clone(), Some(wrapper));
    }
    if ty_name == "UnitPtr" || ty_name == "UIntPtr" || ty_name.starts_with("WGPU") {
        return (format!("@c.{ty_name}"), None);
    }
    (ty_name.to_string(), None)
}

/// Derive wrapper methods from every function whose first parameter is a
/// handle type.
///
/// `funcs` must be in globally sorted-by-name order so collision suffixing
/// is deterministic; `used` must be freshly seeded from the hand-written
/// file for this run (the pass consumes it).
pub fn generate_methods(
    funcs: &[Func],
    handles: &BTreeSet<String>,
    existing_structs: &BTreeMap<String, String>,
    used: &mut UsedNames,
    tables: &WrapperTables,
) -> MethodGen {
    let mut out = MethodGen::default();

    // Receivers that will exist after this run: hand-written wrappers plus
    // the handles we generate structs for.
    let mut wrapper_names: BTreeSet<String> = existing_structs.values().cloned().collect();
    for h in handles {
        let w = tables.wrapper_name(h);
        if !tables.skip_structs.contains(&w) {
            wrapper_names.insert(w);
        }
    }

    for f in funcs {
        if !f.name.starts_with("wgpu") || f.params.is_empty() {
            continue;
        }
        let recv_ty = f.params[0].ty.name();
        if !handles.contains(&recv_ty) {
            continue;
        }
        let recv = tables.wrapper_name(&recv_ty);
        if !wrapper_names.contains(&recv) {
            out.skipped.push(f.name.clone());
            continue;
        }

        let base = recv_ty.strip_prefix("WGPU").unwrap_or(&recv_ty);
        let Some(op_camel) = f.name.strip_prefix("wgpu").and_then(|n| n.strip_prefix(base))
        else {
            out.skipped.push(f.name.clone());
            continue;
        };
        if op_camel.is_empty() {
            out.skipped.push(f.name.clone());
            continue;
        }

        match special_case(f, &recv, op_camel, used) {
            SpecialOutcome::Emit(m) => {
                out.methods.push(m);
                continue;
            }
            SpecialOutcome::Covered => {
                trace!(name = %f.name, "already covered by a hand-written method");
                continue;
            }
            SpecialOutcome::Passthrough => {}
        }

        // Generic mapping: skip signatures that still mention by-value
        // struct types or raw untyped pointers.
        if tables.is_unsupported(&f.ret.name())
            || f.params.iter().any(|p| tables.is_unsupported(&p.ty.name()))
        {
            out.skipped.push(f.name.clone());
            continue;
        }

        let name = used.claim(&recv, &camel_to_snake(op_camel));

        let mut params: Vec<(String, String)> = Vec::new();
        let mut call_args: Vec<String> = vec!["self.raw".to_string()];
        for p in &f.params[1..] {
            let mut pname = camel_to_snake(&p.name);
            if pname == "self" {
                pname = "arg_self".to_string();
            }
            let (pty, is_handle) = sig_type_for_param(&p.ty.name(), handles, tables);
            call_args.push(if is_handle {
                format!("{pname}.raw")
            } else {
                pname.clone()
            });
            params.push((pname, pty));
        }

        let (ret_ty, ret_wrapper) = sig_type_for_return(&f.ret.name(), handles, tables);
        let call = format!("@c.{}({})", f.name, call_args.join(", "));
        let body = match ret_wrapper {
            // Hand-written Surface keeps its extra layer field.
            Some(w) if w == "Surface" => {
                vec![format!("Surface::{{ raw: {call}, layer: @c.null_opaque_ptr() }}")]
            }
            Some(w) => vec![format!("{w}::{{ raw: {call} }}")],
            None => vec![call],
        };

        out.methods.push(WrapperMethod {
            recv,
            name,
            params,
            ret: ret_ty,
            body,
        });
    }

    out
}

/// Render a method list into the executable wrapper region body.
pub fn render_method_blocks(methods: &[WrapperMethod]) -> String {
    if methods.is_empty() {
        return String::new();
    }
    methods
        .iter()
        .map(WrapperMethod::render_impl)
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

/// Render a method list into the declaration-only spec region body.
pub fn render_spec_method_blocks(methods: &[WrapperMethod]) -> String {
    if methods.is_empty() {
        return String::new();
    }
    methods
        .iter()
        .map(WrapperMethod::render_spec)
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}
