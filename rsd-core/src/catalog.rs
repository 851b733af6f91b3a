//! The static request catalog.
//!
//! One immutable entry per recognized request: positional argument types,
//! the request's category (which selects the handler method), whether a
//! trailing parameter list is permitted, and the arity rule that derives
//! expected per-class element counts from the positional arguments.
//!
//! Built once at compile time; shared read-only across sessions. Unknown
//! request names are not a table failure - the dispatcher reports them as
//! `UnknownRequest` and resynchronizes.

use phf::phf_map;

use crate::declare::StorageClass;
use crate::value::Value;

/// Positional argument type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Int,
    Float,
    Str,
    /// Bracketed float array; the count is the required length, 0 = any.
    Floats(u8),
}

impl ArgType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "integer",
            Self::Float => "float",
            Self::Str => "string",
            Self::Floats(_) => "float array",
        }
    }
}

/// Bracketing scopes that arrive as begin/end request pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Frame,
    World,
    Attribute,
    Transform,
    Motion,
    Object,
    Solid,
}

/// Transformation requests: accumulate or replace the current transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOp {
    Identity,
    Transform,
    ConcatTransform,
    Translate,
    Rotate,
    Scale,
    Skew,
    Perspective,
}

/// Attribute-setting requests: shading assignments, visibility, detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    Color,
    Opacity,
    Surface,
    Displacement,
    Atmosphere,
    LightSource,
    AreaLightSource,
    Attribute,
    Option,
    ShadingRate,
    ShadingInterpolation,
    Sides,
    Matte,
    Detail,
    Illuminate,
}

/// Geometric primitive requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Sphere,
    Cone,
    Cylinder,
    Disk,
    Torus,
    Paraboloid,
    Hyperboloid,
    Polygon,
    Points,
    Patch,
}

/// The category of a request, selecting the handler method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Begin(ScopeKind),
    End(ScopeKind),
    Declare,
    Transform(TransformOp),
    Attribute(AttributeOp),
    Primitive(PrimitiveKind),
    /// Reserved: handled by the dispatcher itself, never forwarded.
    Archive,
}

/// Expected element counts per storage class for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassCounts {
    pub varying: usize,
    pub vertex: usize,
    pub facevarying: usize,
}

impl ClassCounts {
    /// Elements expected for a parameter of the given class.
    /// Uniform and Constant always expect exactly one.
    pub fn for_class(&self, class: StorageClass) -> usize {
        match class {
            StorageClass::Constant | StorageClass::Uniform => 1,
            StorageClass::Varying => self.varying,
            StorageClass::Vertex => self.vertex,
            StorageClass::FaceVarying => self.facevarying,
        }
    }
}

/// How a request derives its per-class element counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Every class expects one element.
    One,
    /// Quadric surface: four corners for all primitive-sized classes.
    Quadric,
    /// The integer positional at this index gives the count for all
    /// primitive-sized classes.
    FromCount(u8),
    /// Patch: the basis string selects 4 (bilinear) or 16 (bicubic)
    /// vertices; varying stays at the 4 corners.
    PatchVertices,
}

impl Arity {
    /// Derive the expected counts from decoded positional arguments.
    pub fn counts(self, args: &[Value]) -> ClassCounts {
        match self {
            Self::One => ClassCounts { varying: 1, vertex: 1, facevarying: 1 },
            Self::Quadric => ClassCounts { varying: 4, vertex: 4, facevarying: 4 },
            Self::FromCount(i) => {
                let n = args
                    .get(i as usize)
                    .and_then(Value::as_integer)
                    .map(|n| n.max(0) as usize)
                    .unwrap_or(0);
                ClassCounts { varying: n, vertex: n, facevarying: n }
            }
            Self::PatchVertices => {
                let vertex = match args.first().and_then(Value::as_str) {
                    Some("bicubic") => 16,
                    _ => 4,
                };
                ClassCounts { varying: 4, vertex, facevarying: 4 }
            }
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub name: &'static str,
    /// Ordered positional argument types.
    pub args: &'static [ArgType],
    pub kind: RequestKind,
    /// Whether a trailing name/value parameter list is permitted.
    pub params: bool,
    pub arity: Arity,
}

/// The reserved inclusion request, recognized by the dispatcher.
pub const ARCHIVE_REQUEST: &str = "ReadArchive";

const fn req(
    name: &'static str,
    args: &'static [ArgType],
    kind: RequestKind,
    params: bool,
    arity: Arity,
) -> RequestDescriptor {
    RequestDescriptor { name, args, kind, params, arity }
}

use ArgType::{Float as F, Floats, Int as I, Str as S};

static CATALOG: phf::Map<&'static str, RequestDescriptor> = phf_map! {
    // Structural bracketing
    "FrameBegin" => req("FrameBegin", &[I], RequestKind::Begin(ScopeKind::Frame), false, Arity::One),
    "FrameEnd" => req("FrameEnd", &[], RequestKind::End(ScopeKind::Frame), false, Arity::One),
    "WorldBegin" => req("WorldBegin", &[], RequestKind::Begin(ScopeKind::World), false, Arity::One),
    "WorldEnd" => req("WorldEnd", &[], RequestKind::End(ScopeKind::World), false, Arity::One),
    "AttributeBegin" => req("AttributeBegin", &[], RequestKind::Begin(ScopeKind::Attribute), false, Arity::One),
    "AttributeEnd" => req("AttributeEnd", &[], RequestKind::End(ScopeKind::Attribute), false, Arity::One),
    "TransformBegin" => req("TransformBegin", &[], RequestKind::Begin(ScopeKind::Transform), false, Arity::One),
    "TransformEnd" => req("TransformEnd", &[], RequestKind::End(ScopeKind::Transform), false, Arity::One),
    "MotionBegin" => req("MotionBegin", &[Floats(0)], RequestKind::Begin(ScopeKind::Motion), false, Arity::One),
    "MotionEnd" => req("MotionEnd", &[], RequestKind::End(ScopeKind::Motion), false, Arity::One),
    "ObjectBegin" => req("ObjectBegin", &[I], RequestKind::Begin(ScopeKind::Object), false, Arity::One),
    "ObjectEnd" => req("ObjectEnd", &[], RequestKind::End(ScopeKind::Object), false, Arity::One),
    "SolidBegin" => req("SolidBegin", &[S], RequestKind::Begin(ScopeKind::Solid), false, Arity::One),
    "SolidEnd" => req("SolidEnd", &[], RequestKind::End(ScopeKind::Solid), false, Arity::One),

    // Declarations
    "Declare" => req("Declare", &[S, S], RequestKind::Declare, false, Arity::One),

    // Transformations
    "Identity" => req("Identity", &[], RequestKind::Transform(TransformOp::Identity), false, Arity::One),
    "Transform" => req("Transform", &[Floats(16)], RequestKind::Transform(TransformOp::Transform), false, Arity::One),
    "ConcatTransform" => req("ConcatTransform", &[Floats(16)], RequestKind::Transform(TransformOp::ConcatTransform), false, Arity::One),
    "Translate" => req("Translate", &[F, F, F], RequestKind::Transform(TransformOp::Translate), false, Arity::One),
    "Rotate" => req("Rotate", &[F, F, F, F], RequestKind::Transform(TransformOp::Rotate), false, Arity::One),
    "Scale" => req("Scale", &[F, F, F], RequestKind::Transform(TransformOp::Scale), false, Arity::One),
    "Skew" => req("Skew", &[Floats(7)], RequestKind::Transform(TransformOp::Skew), false, Arity::One),
    "Perspective" => req("Perspective", &[F], RequestKind::Transform(TransformOp::Perspective), false, Arity::One),

    // Attribute state
    "Color" => req("Color", &[Floats(3)], RequestKind::Attribute(AttributeOp::Color), false, Arity::One),
    "Opacity" => req("Opacity", &[Floats(3)], RequestKind::Attribute(AttributeOp::Opacity), false, Arity::One),
    "Surface" => req("Surface", &[S], RequestKind::Attribute(AttributeOp::Surface), true, Arity::One),
    "Displacement" => req("Displacement", &[S], RequestKind::Attribute(AttributeOp::Displacement), true, Arity::One),
    "Atmosphere" => req("Atmosphere", &[S], RequestKind::Attribute(AttributeOp::Atmosphere), true, Arity::One),
    "LightSource" => req("LightSource", &[S, I], RequestKind::Attribute(AttributeOp::LightSource), true, Arity::One),
    "AreaLightSource" => req("AreaLightSource", &[S, I], RequestKind::Attribute(AttributeOp::AreaLightSource), true, Arity::One),
    "Attribute" => req("Attribute", &[S], RequestKind::Attribute(AttributeOp::Attribute), true, Arity::One),
    "Option" => req("Option", &[S], RequestKind::Attribute(AttributeOp::Option), true, Arity::One),
    "ShadingRate" => req("ShadingRate", &[F], RequestKind::Attribute(AttributeOp::ShadingRate), false, Arity::One),
    "ShadingInterpolation" => req("ShadingInterpolation", &[S], RequestKind::Attribute(AttributeOp::ShadingInterpolation), false, Arity::One),
    "Sides" => req("Sides", &[I], RequestKind::Attribute(AttributeOp::Sides), false, Arity::One),
    "Matte" => req("Matte", &[I], RequestKind::Attribute(AttributeOp::Matte), false, Arity::One),
    "Detail" => req("Detail", &[Floats(6)], RequestKind::Attribute(AttributeOp::Detail), false, Arity::One),
    "Illuminate" => req("Illuminate", &[I, I], RequestKind::Attribute(AttributeOp::Illuminate), false, Arity::One),

    // Primitives
    "Sphere" => req("Sphere", &[F, F, F, F], RequestKind::Primitive(PrimitiveKind::Sphere), true, Arity::Quadric),
    "Cone" => req("Cone", &[F, F, F], RequestKind::Primitive(PrimitiveKind::Cone), true, Arity::Quadric),
    "Cylinder" => req("Cylinder", &[F, F, F, F], RequestKind::Primitive(PrimitiveKind::Cylinder), true, Arity::Quadric),
    "Disk" => req("Disk", &[F, F, F], RequestKind::Primitive(PrimitiveKind::Disk), true, Arity::Quadric),
    "Torus" => req("Torus", &[F, F, F, F, F], RequestKind::Primitive(PrimitiveKind::Torus), true, Arity::Quadric),
    "Paraboloid" => req("Paraboloid", &[F, F, F, F], RequestKind::Primitive(PrimitiveKind::Paraboloid), true, Arity::Quadric),
    "Hyperboloid" => req("Hyperboloid", &[F, F, F, F, F, F, F], RequestKind::Primitive(PrimitiveKind::Hyperboloid), true, Arity::Quadric),
    "Polygon" => req("Polygon", &[I], RequestKind::Primitive(PrimitiveKind::Polygon), true, Arity::FromCount(0)),
    "Points" => req("Points", &[I], RequestKind::Primitive(PrimitiveKind::Points), true, Arity::FromCount(0)),
    "Patch" => req("Patch", &[S], RequestKind::Primitive(PrimitiveKind::Patch), true, Arity::PatchVertices),

    // Inclusion (reserved)
    "ReadArchive" => req("ReadArchive", &[S], RequestKind::Archive, false, Arity::One),
};

/// Look up a request by name.
#[inline]
pub fn lookup(name: &str) -> Option<&'static RequestDescriptor> {
    CATALOG.get(name)
}

/// True when the symbol names any cataloged request; used by the
/// dispatcher's resynchronization scan.
#[inline]
pub fn is_request(name: &str) -> bool {
    CATALOG.contains_key(name)
}

/// Iterate all entries (for tooling and tests).
pub fn entries() -> impl Iterator<Item = &'static RequestDescriptor> {
    CATALOG.values()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let sphere = lookup("Sphere").unwrap();
        assert_eq!(sphere.args.len(), 4);
        assert!(sphere.params);
        assert_eq!(sphere.kind, RequestKind::Primitive(PrimitiveKind::Sphere));

        assert!(lookup("Blobby").is_none());
        assert!(is_request("WorldBegin"));
        assert!(!is_request("worldbegin"));
    }

    #[test]
    fn test_names_match_keys() {
        for desc in entries() {
            assert_eq!(lookup(desc.name).unwrap().name, desc.name);
        }
    }

    #[test]
    fn test_scope_pairs_closed() {
        // Every Begin has a matching End for the same scope.
        for desc in entries() {
            if let RequestKind::Begin(scope) = desc.kind {
                assert!(
                    entries().any(|d| d.kind == RequestKind::End(scope)),
                    "no End for {:?}",
                    scope
                );
            }
        }
    }

    #[test]
    fn test_arity_one() {
        let counts = Arity::One.counts(&[]);
        assert_eq!(counts.for_class(StorageClass::Varying), 1);
        assert_eq!(counts.for_class(StorageClass::Uniform), 1);
    }

    #[test]
    fn test_arity_quadric() {
        let counts = Arity::Quadric.counts(&[]);
        assert_eq!(counts.for_class(StorageClass::Varying), 4);
        assert_eq!(counts.for_class(StorageClass::Vertex), 4);
        // Uniform is one no matter the primitive size.
        assert_eq!(counts.for_class(StorageClass::Uniform), 1);
    }

    #[test]
    fn test_arity_from_count() {
        let args = vec![Value::Integer(5)];
        let counts = Arity::FromCount(0).counts(&args);
        assert_eq!(counts.for_class(StorageClass::Varying), 5);
        assert_eq!(counts.for_class(StorageClass::Vertex), 5);
        assert_eq!(counts.for_class(StorageClass::FaceVarying), 5);
        assert_eq!(counts.for_class(StorageClass::Constant), 1);
    }

    #[test]
    fn test_arity_patch() {
        let bilinear = vec![Value::String("bilinear".to_string())];
        let bicubic = vec![Value::String("bicubic".to_string())];
        assert_eq!(Arity::PatchVertices.counts(&bilinear).for_class(StorageClass::Vertex), 4);
        assert_eq!(Arity::PatchVertices.counts(&bicubic).for_class(StorageClass::Vertex), 16);
        assert_eq!(Arity::PatchVertices.counts(&bicubic).for_class(StorageClass::Varying), 4);
    }
}
