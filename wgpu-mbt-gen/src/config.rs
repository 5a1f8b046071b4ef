//! Generator configuration, loaded from a TOML file.
//!
//! All paths are relative to the repo root the tool is pointed at. Every
//! table carries wgpu-native defaults so a minimal config only needs to
//! exist; the lookup tables can be overridden per project.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::wrappers::WrapperTables;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub wrappers: Wrappers,
    /// Opaque handle type → `#alias(...)` name in the generated bindings.
    #[serde(default = "default_handle_aliases")]
    pub handle_aliases: BTreeMap<String, String>,
}

/// Input headers. `exported` headers contribute only `WGPU_EXPORT`
/// prototypes; `extras` headers contribute every prototype (shim helpers
/// carry no export attribute).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Headers {
    #[serde(default = "default_exported_headers")]
    pub exported: Vec<PathBuf>,
    #[serde(default = "default_extras_headers")]
    pub extras: Vec<PathBuf>,
}

/// Generated artifact locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Output {
    #[serde(default = "default_spec_out")]
    pub spec: PathBuf,
    #[serde(default = "default_bindings_out")]
    pub bindings: PathBuf,
    #[serde(default = "default_constants_out")]
    pub constants: PathBuf,
    #[serde(default = "default_symbol_test_out")]
    pub symbol_test: PathBuf,
}

/// Hand-maintained wrapper files and the tables steering method synthesis.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Wrappers {
    #[serde(default = "default_wrapper_impl")]
    pub impl_file: PathBuf,
    #[serde(default = "default_wrapper_spec")]
    pub spec_file: PathBuf,
    /// Raw handle base name (without WGPU) → public wrapper name.
    #[serde(default = "default_overrides")]
    pub overrides: BTreeMap<String, String>,
    /// Wrapper types that stay hand-written.
    #[serde(default = "default_skip_structs")]
    pub skip_structs: BTreeSet<String>,
    /// Type-name substrings the generic method mapper refuses.
    #[serde(default = "default_unsupported_substrings")]
    pub unsupported_substrings: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config =
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn wrapper_tables(&self) -> WrapperTables {
        WrapperTables {
            overrides: self.wrappers.overrides.clone(),
            skip_structs: self.wrappers.skip_structs.clone(),
            unsupported_substrings: self.wrappers.unsupported_substrings.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            headers: Headers::default(),
            output: Output::default(),
            wrappers: Wrappers::default(),
            handle_aliases: default_handle_aliases(),
        }
    }
}

impl Default for Headers {
    fn default() -> Self {
        Headers {
            exported: default_exported_headers(),
            extras: default_extras_headers(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Output {
            spec: default_spec_out(),
            bindings: default_bindings_out(),
            constants: default_constants_out(),
            symbol_test: default_symbol_test_out(),
        }
    }
}

impl Default for Wrappers {
    fn default() -> Self {
        Wrappers {
            impl_file: default_wrapper_impl(),
            spec_file: default_wrapper_spec(),
            overrides: default_overrides(),
            skip_structs: default_skip_structs(),
            unsupported_substrings: default_unsupported_substrings(),
        }
    }
}

// ---- wgpu-native defaults ----

fn default_exported_headers() -> Vec<PathBuf> {
    vec![PathBuf::from("src/c/webgpu.h")]
}

fn default_extras_headers() -> Vec<PathBuf> {
    vec![PathBuf::from("src/c/wgpu_native_shim.h")]
}

fn default_spec_out() -> PathBuf {
    PathBuf::from("src/c/webgpu_capi_spec.mbt")
}

fn default_bindings_out() -> PathBuf {
    PathBuf::from("src/c/webgpu_capi.mbt")
}

fn default_constants_out() -> PathBuf {
    PathBuf::from("src/consts.mbt")
}

fn default_symbol_test_out() -> PathBuf {
    PathBuf::from("src/tests/wgpu_capi_symbols_test.mbt")
}

fn default_wrapper_impl() -> PathBuf {
    PathBuf::from("src/wgpu.mbt")
}

fn default_wrapper_spec() -> PathBuf {
    PathBuf::from("src/wgpu_spec.mbt")
}

fn default_overrides() -> BTreeMap<String, String> {
    // Public wrapper types drop the Encoder suffix for pass encoders.
    BTreeMap::from([
        ("RenderPassEncoder".to_string(), "RenderPass".to_string()),
        ("ComputePassEncoder".to_string(), "ComputePass".to_string()),
    ])
}

fn default_skip_structs() -> BTreeSet<String> {
    // Hand-written wrappers with extra fields or non-handle shapes.
    [
        "Surface",
        "SurfaceTexture",
        "GlobalReport",
        "InstanceCapabilities",
        "WaitAnyResult",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_unsupported_substrings() -> Vec<String> {
    // By-value structs that cannot cross the FFI boundary without
    // dedicated C builder stubs.
    vec!["WGPUStringView".to_string(), "CallbackInfo".to_string()]
}

fn default_handle_aliases() -> BTreeMap<String, String> {
    [
        ("WGPUInstance", "Instance"),
        ("WGPUAdapter", "Adapter"),
        ("WGPUDevice", "Device"),
        ("WGPUQueue", "Queue"),
        ("WGPUBuffer", "Buffer"),
        ("WGPUShaderModule", "ShaderModule"),
        ("WGPUComputePipeline", "ComputePipeline"),
        ("WGPUComputePassEncoder", "ComputePassEncoder"),
        ("WGPURenderPipeline", "RenderPipeline"),
        ("WGPURenderPassEncoder", "RenderPassEncoder"),
        ("WGPUTexture", "Texture"),
        ("WGPUTextureView", "TextureView"),
        ("WGPUBindGroupLayout", "BindGroupLayout"),
        ("WGPUBindGroup", "BindGroup"),
        ("WGPUPipelineLayout", "PipelineLayout"),
        ("WGPUCommandEncoder", "CommandEncoder"),
        ("WGPUCommandBuffer", "CommandBuffer"),
        ("WGPUSampler", "Sampler"),
        ("WGPUQuerySet", "QuerySet"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
