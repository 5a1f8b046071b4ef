//! End-to-end pipeline tests over the fixture header slice: run the full
//! generator against a scratch copy of the fixtures and check the emitted
//! artifacts, then rerun to check byte-identical regeneration.

use std::fs;
use std::path::{Path, PathBuf};

use wgpu_mbt_gen::config::Config;

const FIXTURE_FILES: [&str; 5] = ["webgpu.h", "wgpu_shim.h", "wgpu.mbt", "wgpu_spec.mbt", "gen.toml"];

const OUTPUTS: [&str; 6] = [
    "webgpu_capi_spec.mbt",
    "webgpu_capi.mbt",
    "webgpu_constants.mbt",
    "webgpu_symbols_test.mbt",
    "wgpu.mbt",
    "wgpu_spec.mbt",
];

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn scratch_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in FIXTURE_FILES {
        fs::copy(fixtures().join(name), dir.path().join(name)).unwrap();
    }
    dir
}

fn run_generator(root: &Path) {
    let config = Config::load(&root.join("gen.toml")).unwrap();
    wgpu_mbt_gen::run(root, &config).unwrap();
}

fn read(root: &Path, name: &str) -> String {
    fs::read_to_string(root.join(name)).unwrap()
}

#[test]
fn spec_mirrors_the_header_surface() {
    let dir = scratch_repo();
    run_generator(dir.path());
    let spec = read(dir.path(), "webgpu_capi_spec.mbt");

    // Enums become UInt aliases, typedef chains resolve to primitives,
    // everything else is an opaque declaration.
    assert!(spec.contains("pub type WGPUStatus = UInt"));
    assert!(spec.contains("pub type WGPULogLevel = UInt"));
    assert!(spec.contains("pub type WGPUMapMode = UInt64"));
    assert!(spec.contains("#declaration_only\npub type WGPUBuffer"));
    assert!(spec.contains("#declaration_only\npub type WGPULimitsPtr"));

    assert!(spec.contains("declare pub fn wgpuBufferGetSize(buffer : WGPUBuffer) -> UInt64"));
    assert!(spec.contains(
        "declare pub fn wgpuDevicePoll(device : WGPUDevice, wait : Bool, submissionIndex : WGPUSubmissionIndexPtr) -> Bool"
    ));
    // Reserved words are kept usable by suffixing.
    assert!(spec.contains(
        "declare pub fn wgpuDevicePushErrorScope(device : WGPUDevice, type_ : WGPUErrorFilter) -> Unit"
    ));
    assert!(!spec.contains("extern \"C\""), "spec file must stay declaration-only");
}

#[test]
fn bindings_link_every_prototype_once() {
    let dir = scratch_repo();
    run_generator(dir.path());
    let bindings = read(dir.path(), "webgpu_capi.mbt");

    assert!(bindings.contains("#external\n#alias(Buffer)\npub type WGPUBuffer"));
    assert!(bindings.contains("#external\n#alias(UnitPtr)\npub type WGPULimitsPtr"));
    // Non-handle by-value types carry no alias.
    assert!(bindings.contains("#external\npub type WGPUStringView"));

    assert!(bindings.contains(
        "#borrow(descriptor)\npub extern \"C\" fn wgpuDeviceCreateBuffer(device : WGPUDevice, descriptor : WGPUBufferDescriptorPtr) -> WGPUBuffer = \"wgpuDeviceCreateBuffer\""
    ));
    assert!(bindings.contains(
        "#borrow(descriptor)\npub extern \"C\" fn wgpuCreateInstance(descriptor : WGPUInstanceDescriptorPtr) -> WGPUInstance = \"wgpuCreateInstance\""
    ));
    assert!(bindings.contains(
        "pub extern \"C\" fn wgpuGetVersion() -> UInt = \"wgpuGetVersion\""
    ));
    // The shim declares wgpuGetVersion twice; the bindings must not.
    assert_eq!(bindings.matches("= \"wgpuGetVersion\"").count(), 1);
}

#[test]
fn constants_cover_macros_consts_and_enums() {
    let dir = scratch_repo();
    run_generator(dir.path());
    let constants = read(dir.path(), "webgpu_constants.mbt");

    assert!(constants.contains("pub let whole_size : UInt64 = 0xFFFFFFFFFFFFFFFFUL"));
    assert!(constants.contains("pub let whole_map_size : UInt64 = 0xFFFFFFFFFFFFFFFFUL"));
    assert!(constants.contains("pub let limit_u32_undefined : UInt = 0xFFFFFFFFU"));
    assert!(constants.contains("pub let buffer_usage_copy_src : UInt64 = 0x0000000000000004UL"));
    assert!(constants.contains("pub let map_mode_read : UInt64 = 0x0000000000000001UL"));
    assert!(constants.contains("pub let error_filter_validation : UInt = 0x00000001U"));
    assert!(constants.contains("pub let power_preference_high_performance : UInt = 0x00000002U"));
    assert!(constants.contains("pub let native_feature_push_constants : UInt = 0x00030001U"));
}

#[test]
fn symbol_test_names_every_binding() {
    let dir = scratch_repo();
    run_generator(dir.path());
    let test = read(dir.path(), "webgpu_symbols_test.mbt");

    assert!(test.contains("    let _ = @wgpu_c.wgpuCreateInstance"));
    assert!(test.contains("    let _ = @wgpu_c.wgpuQueueWriteTexture"));
    assert!(test.contains("inspect(\"symbol coverage ok\", content=\"symbol coverage ok\")"));
}

#[test]
fn wrapper_splice_preserves_hand_written_code() {
    let dir = scratch_repo();
    run_generator(dir.path());
    let out = read(dir.path(), "wgpu.mbt");

    assert!(out.contains("pub fn Queue::write_buffer("));
    assert!(out.contains("pub fn Buffer::map_read_sync("));
    assert_eq!(out.matches("pub struct Surface").count(), 1);
    assert_eq!(out.matches("pub struct Buffer").count(), 1);
}

#[test]
fn wrapper_splice_generates_structs_and_methods() {
    let dir = scratch_repo();
    run_generator(dir.path());
    let out = read(dir.path(), "wgpu.mbt");

    // Structs for handles without a hand-written wrapper; overrides apply.
    assert!(out.contains("pub struct Adapter {\n  raw : @c.Adapter\n}"));
    assert!(out.contains("pub struct BindGroup {\n  raw : @c.BindGroup\n}"));
    assert!(out.contains("pub struct ComputePass {\n  raw : @c.ComputePass\n}"));
    assert!(out.contains("pub struct Device {\n  raw : @c.Device\n}"));
    assert!(out.contains("pub struct Instance {\n  raw : @c.Instance\n}"));
    assert!(!out.contains("pub struct ComputePassEncoder"));

    // Generic methods wrap handle params/returns.
    assert!(out.contains(
        "pub fn Device::get_queue(\n  self : Device,\n) -> Queue {\n  Queue::{ raw: @c.wgpuDeviceGetQueue(self.raw) }\n}"
    ));
    assert!(out.contains(
        "pub fn Device::poll(\n  self : Device,\n  wait : Bool,\n  submission_index : @c.WGPUSubmissionIndexPtr,\n) -> Bool {\n  @c.wgpuDevicePoll(self.raw, wait, submission_index)\n}"
    ));
    assert!(out.contains(
        "pub fn Queue::submit(\n  self : Queue,\n  command_count : UInt64,\n  commands : @c.WGPUCommandBufferPtr,\n) -> Unit {\n  @c.wgpuQueueSubmit(self.raw, command_count, commands)\n}"
    ));

    // Hand-written Buffer::destroy forces a suffixed generated name.
    assert!(out.contains("pub fn Buffer::destroy_raw("));

    // Special cases.
    assert!(out.contains("@c.buffer_set_label_utf8(self.raw, bytes, bytes.length().to_uint64())"));
    assert!(out.contains("@c.bind_group_set_label_utf8(self.raw, bytes, bytes.length().to_uint64())"));
    assert!(out.contains(
        "@c.compute_pass_set_bind_group(self.raw, index, group.raw, dynamic_offsets)"
    ));
    assert!(out.contains(
        "@c.compute_pass_set_push_constants_bytes(self.raw, offset, data, data.length().to_uint64())"
    ));
    assert!(out.contains(
        "pub fn Instance::request_adapter_sync_ptr(\n  self : Instance,\n  options : @c.WGPURequestAdapterOptionsPtr,\n) -> Adapter {\n  Adapter::{ raw: @c.instance_request_adapter_sync_ptr(self.raw, options) }\n}"
    ));
    assert!(out.contains(
        "Surface::{ raw: @c.wgpuInstanceCreateSurface(self.raw, descriptor), layer: @c.null_opaque_ptr() }"
    ));

    // Covered and unsupported shapes must not surface as methods.
    assert!(!out.contains("pub fn Buffer::map_async"));
    assert!(!out.contains("pub fn Buffer::get_mapped_range"));
    assert!(!out.contains("pub fn Queue::write_texture"));
    assert_eq!(out.matches("pub fn Queue::write_buffer").count(), 1);
}

#[test]
fn wrapper_spec_mirrors_the_impl_regions() {
    let dir = scratch_repo();
    run_generator(dir.path());
    let out = read(dir.path(), "wgpu_spec.mbt");

    assert!(out.contains("#declaration_only\npub type Adapter"));
    assert!(out.contains("#declaration_only\npub type ComputePass"));
    assert!(out.contains(
        "declare pub fn Device::get_queue(\n  self : Device,\n) -> Queue"
    ));
    assert!(out.contains(
        "declare pub fn Buffer::destroy_raw(\n  self : Buffer,\n) -> Unit"
    ));
    // Hand-written declarations survive.
    assert!(out.contains("declare pub fn Queue::write_buffer("));
    assert!(!out.contains("extern \"C\""));
}

#[test]
fn rerun_is_byte_identical() {
    let dir = scratch_repo();
    run_generator(dir.path());
    let first: Vec<String> = OUTPUTS.iter().map(|n| read(dir.path(), n)).collect();

    run_generator(dir.path());
    let second: Vec<String> = OUTPUTS.iter().map(|n| read(dir.path(), n)).collect();

    for (name, (a, b)) in OUTPUTS.iter().zip(first.iter().zip(second.iter())) {
        assert_eq!(a, b, "{name} changed on rerun");
    }
}

#[test]
fn conflicting_prototypes_keep_the_last_declaration() {
    // The shim header redeclares a symbol with a different signature; the
    // later declaration must win and the symbol must be bound exactly once.
    let dir = tempfile::tempdir().unwrap();
    fs::copy(fixtures().join("gen.toml"), dir.path().join("gen.toml")).unwrap();
    fs::copy(fixtures().join("wgpu.mbt"), dir.path().join("wgpu.mbt")).unwrap();
    fs::copy(fixtures().join("wgpu_spec.mbt"), dir.path().join("wgpu_spec.mbt")).unwrap();
    fs::write(
        dir.path().join("webgpu.h"),
        "WGPU_EXPORT void wgpuBufferDestroy(WGPUBuffer buffer);\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("wgpu_shim.h"),
        "void wgpuBufferDestroy(WGPUBuffer buffer, uint32_t mode);\n",
    )
    .unwrap();

    let config = Config::load(&dir.path().join("gen.toml")).unwrap();
    let artifacts = wgpu_mbt_gen::generate(dir.path(), &config).unwrap();

    assert!(artifacts.bindings.contains(
        "pub extern \"C\" fn wgpuBufferDestroy(buffer : WGPUBuffer, mode : UInt) -> Unit = \"wgpuBufferDestroy\""
    ));
    assert!(!artifacts.bindings.contains("wgpuBufferDestroy(buffer : WGPUBuffer) -> Unit"));
    assert_eq!(artifacts.bindings.matches("= \"wgpuBufferDestroy\"").count(), 1);
    assert!(artifacts.spec.contains(
        "declare pub fn wgpuBufferDestroy(buffer : WGPUBuffer, mode : UInt) -> Unit"
    ));
}

#[test]
fn empty_headers_fail_before_writing_anything() {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(fixtures().join("gen.toml"), dir.path().join("gen.toml")).unwrap();
    fs::copy(fixtures().join("wgpu.mbt"), dir.path().join("wgpu.mbt")).unwrap();
    fs::copy(fixtures().join("wgpu_spec.mbt"), dir.path().join("wgpu_spec.mbt")).unwrap();
    fs::write(dir.path().join("webgpu.h"), "typedef uint32_t WGPUBool;\n").unwrap();
    fs::write(dir.path().join("wgpu_shim.h"), "/* nothing here */\n").unwrap();

    let config = Config::load(&dir.path().join("gen.toml")).unwrap();
    let err = wgpu_mbt_gen::run(dir.path(), &config).unwrap_err();
    assert!(err.to_string().contains("no function prototypes"));

    assert!(!dir.path().join("webgpu_capi_spec.mbt").exists());
    assert!(!dir.path().join("webgpu_capi.mbt").exists());
    assert!(!dir.path().join("webgpu_constants.mbt").exists());
    assert!(!dir.path().join("webgpu_symbols_test.mbt").exists());
}
