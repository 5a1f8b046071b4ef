//! Intermediate model types — the bridge between header extraction and
//! MoonBit emission.
//!
//! These types are header-syntax-independent and output-format-independent,
//! making both the extractors and the emitters easier to test in isolation.

use std::collections::BTreeMap;

/// MoonBit primitive type names the C type mapper can produce.
pub const PRIMITIVES: [&str; 8] = [
    "Unit", "Int", "UInt", "UInt64", "Float", "Double", "Bool", "Byte",
];

/// Returns `true` if `name` is one of the MoonBit primitives we map C
/// scalars onto.
pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// A MoonBit type descriptor: a base type name plus a pointer depth.
///
/// `base` is already mapped — either a MoonBit primitive (`UInt`) or a
/// pass-through C name (`WGPUBuffer`). Pointer indirection is preserved as
/// an abstract wrapper suffix, one `Ptr` per level, so `uint8_t **` renders
/// as `BytePtrPtr` and stays distinct from `BytePtr`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MbtType {
    pub base: String,
    pub ptr_depth: usize,
}

impl MbtType {
    /// A depth-0 type from a base name.
    pub fn scalar(base: impl Into<String>) -> Self {
        MbtType {
            base: base.into(),
            ptr_depth: 0,
        }
    }

    /// The rendered MoonBit type name (`base` plus one `Ptr` per level).
    pub fn name(&self) -> String {
        let mut out = self.base.clone();
        for _ in 0..self.ptr_depth {
            out.push_str("Ptr");
        }
        out
    }

    /// Pointer-wrapper types must not be owned across the FFI boundary;
    /// the bindings flag them `#borrow`.
    pub fn is_ptr(&self) -> bool {
        self.ptr_depth > 0
    }

    /// Depth-0 primitives map to fixed MoonBit scalars; everything else is
    /// a named type that the registry classifies later.
    pub fn is_primitive(&self) -> bool {
        self.ptr_depth == 0 && is_primitive(&self.base)
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: MbtType,
}

/// An extracted C function declaration, already mapped to MoonBit types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    pub name: String,
    pub ret: MbtType,
    pub params: Vec<Param>,
}

impl Func {
    /// Dedup key: name, return type, and the full parameter list.
    /// Two declarations with the same key are the same binding.
    pub fn signature_key(&self) -> (String, String, Vec<(String, String)>) {
        (
            self.name.clone(),
            self.ret.name(),
            self.params
                .iter()
                .map(|p| (p.name.clone(), p.ty.name()))
                .collect(),
        )
    }
}

/// Output width for a generated constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstWidth {
    U32,
    U64,
}

/// A numeric constant extracted from a `#define`, a `static const`
/// declaration, or an enum body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub name: String,
    pub width: ConstWidth,
    pub value: u64,
}

/// How a non-primitive type referenced by the function list is backed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeClass {
    /// Declared via `typedef enum { … } Name;` — aliased to `UInt`.
    Enum,
    /// Resolves through the typedef chain to a MoonBit primitive.
    Alias(String),
    /// Everything else: opaque handles and pointer-wrapper types.
    Opaque,
}

/// One registry entry: the descriptor plus its classification.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub ty: MbtType,
    pub class: TypeClass,
}

/// All distinct non-primitive types referenced by the extracted functions,
/// keyed by rendered name so iteration order (and therefore emission order)
/// is sorted and stable.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    pub types: BTreeMap<String, TypeEntry>,
}

impl TypeRegistry {
    /// Collect every non-primitive return/parameter type from `funcs` and
    /// classify it against the extracted enum names and the resolved
    /// typedef-primitive map. Pointer-wrapper types are always opaque.
    pub fn build(
        funcs: &[Func],
        enum_types: &std::collections::BTreeSet<String>,
        typedef_primitives: &BTreeMap<String, String>,
    ) -> Self {
        let mut registry = TypeRegistry::default();
        for f in funcs {
            registry.add(&f.ret, enum_types, typedef_primitives);
            for p in &f.params {
                registry.add(&p.ty, enum_types, typedef_primitives);
            }
        }
        registry
    }

    fn add(
        &mut self,
        ty: &MbtType,
        enum_types: &std::collections::BTreeSet<String>,
        typedef_primitives: &BTreeMap<String, String>,
    ) {
        if ty.is_primitive() {
            return;
        }
        let name = ty.name();
        if self.types.contains_key(&name) {
            return;
        }
        let class = if ty.is_ptr() {
            TypeClass::Opaque
        } else if enum_types.contains(&name) {
            TypeClass::Enum
        } else if let Some(prim) = typedef_primitives.get(&name) {
            TypeClass::Alias(prim.clone())
        } else {
            TypeClass::Opaque
        };
        self.types.insert(name, TypeEntry { ty: ty.clone(), class });
    }
}
