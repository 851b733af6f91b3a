//! Parameter declarations and the session-scoped registry.
//!
//! A declaration binds a parameter name to its storage class, element type
//! and array arity so that later untyped references can be decoded. The
//! compact specification grammar is `[class] type[ [n] ]`, e.g.
//! `"uniform float"`, `"varying color"`, `"float[3]"`. Inline forms append
//! the parameter name: `"vertex point P"`.

use std::collections::HashMap;

use phf::phf_map;

/// How many elements a parameter expects relative to a primitive's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Constant,
    Uniform,
    Varying,
    Vertex,
    FaceVarying,
}

impl StorageClass {
    pub fn name(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Uniform => "uniform",
            Self::Varying => "varying",
            Self::Vertex => "vertex",
            Self::FaceVarying => "facevarying",
        }
    }
}

/// The scalar or aggregate type of one parameter element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Integer,
    Float,
    String,
    Point,
    Vector,
    Normal,
    Color,
    Matrix,
}

impl ElementType {
    /// Scalars per element. Aggregates decode into float payloads.
    pub fn components(self) -> usize {
        match self {
            Self::Integer | Self::Float | Self::String => 1,
            Self::Point | Self::Vector | Self::Normal | Self::Color => 3,
            Self::Matrix => 16,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Point => "point",
            Self::Vector => "vector",
            Self::Normal => "normal",
            Self::Color => "color",
            Self::Matrix => "matrix",
        }
    }

    /// True when elements decode into the float payload.
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::String)
    }
}

static CLASSES: phf::Map<&'static str, StorageClass> = phf_map! {
    "constant" => StorageClass::Constant,
    "uniform" => StorageClass::Uniform,
    "varying" => StorageClass::Varying,
    "vertex" => StorageClass::Vertex,
    "facevarying" => StorageClass::FaceVarying,
};

static TYPES: phf::Map<&'static str, ElementType> = phf_map! {
    "integer" => ElementType::Integer,
    "int" => ElementType::Integer,
    "float" => ElementType::Float,
    "string" => ElementType::String,
    "point" => ElementType::Point,
    "vector" => ElementType::Vector,
    "normal" => ElementType::Normal,
    "color" => ElementType::Color,
    "matrix" => ElementType::Matrix,
};

/// One parameter declaration: class, element type, array length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDecl {
    pub class: StorageClass,
    pub ty: ElementType,
    /// Array arity; 1 = scalar.
    pub len: u32,
}

impl ParamDecl {
    pub fn new(class: StorageClass, ty: ElementType) -> Self {
        Self { class, ty, len: 1 }
    }

    /// Scalars per expected element: components x array length.
    pub fn scalars_per_element(&self) -> usize {
        self.ty.components() * self.len as usize
    }

    /// Parse a compact type specification with no trailing name.
    ///
    /// The storage class defaults to `uniform` when omitted.
    pub fn parse(spec: &str) -> Option<ParamDecl> {
        let mut words = spec.split_ascii_whitespace();
        let first = words.next()?;

        let (class, type_word) = match CLASSES.get(first) {
            Some(&class) => (class, words.next()?),
            None => (StorageClass::Uniform, first),
        };
        if words.next().is_some() {
            return None;
        }
        Self::parse_typed(class, type_word)
    }

    /// Parse an inline specification: `[class] type[ [n] ] name`.
    ///
    /// Returns `None` when the string is not shaped like a declaration,
    /// which callers treat as a plain (previously declared) name.
    pub fn parse_inline(text: &str) -> Option<(ParamDecl, String)> {
        let words: Vec<&str> = text.split_ascii_whitespace().collect();
        let (decl_words, name) = words.split_last().map(|(n, d)| (d, *n))?;
        if decl_words.is_empty() {
            return None;
        }

        let (class, type_word) = match CLASSES.get(decl_words[0]) {
            Some(&class) => {
                if decl_words.len() != 2 {
                    return None;
                }
                (class, decl_words[1])
            }
            None => {
                if decl_words.len() != 1 {
                    return None;
                }
                (StorageClass::Uniform, decl_words[0])
            }
        };
        let decl = Self::parse_typed(class, type_word)?;
        Some((decl, name.to_string()))
    }

    fn parse_typed(class: StorageClass, type_word: &str) -> Option<ParamDecl> {
        let (type_name, len) = match type_word.find('[') {
            Some(open) => {
                let rest = &type_word[open + 1..];
                let close = rest.find(']')?;
                if close + 1 != rest.len() {
                    return None;
                }
                let len: u32 = rest[..close].parse().ok()?;
                if len == 0 {
                    return None;
                }
                (&type_word[..open], len)
            }
            None => (type_word, 1),
        };
        let &ty = TYPES.get(type_name)?;
        Some(ParamDecl { class, ty, len })
    }
}

impl std::fmt::Display for ParamDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.class.name(), self.ty.name())?;
        if self.len > 1 {
            write!(f, "[{}]", self.len)?;
        }
        Ok(())
    }
}

/// The session-scoped declaration registry.
///
/// Keyed by parameter name, last write wins. Declarations made inside a
/// nested archive stay visible after the archive is popped; nothing
/// survives the session.
#[derive(Debug, Clone)]
pub struct Declarations {
    map: HashMap<String, ParamDecl>,
}

/// Parameters every session knows without an explicit declaration,
/// matching the standard geometry and shading vocabulary.
const STANDARD: &[(&str, StorageClass, ElementType, u32)] = &[
    ("P", StorageClass::Vertex, ElementType::Point, 1),
    ("Pz", StorageClass::Vertex, ElementType::Float, 1),
    ("N", StorageClass::Varying, ElementType::Normal, 1),
    ("Np", StorageClass::Uniform, ElementType::Normal, 1),
    ("Cs", StorageClass::Varying, ElementType::Color, 1),
    ("Os", StorageClass::Varying, ElementType::Color, 1),
    ("s", StorageClass::Varying, ElementType::Float, 1),
    ("t", StorageClass::Varying, ElementType::Float, 1),
    ("st", StorageClass::Varying, ElementType::Float, 2),
    ("width", StorageClass::Varying, ElementType::Float, 1),
    ("constantwidth", StorageClass::Constant, ElementType::Float, 1),
    ("intensity", StorageClass::Uniform, ElementType::Float, 1),
    ("lightcolor", StorageClass::Uniform, ElementType::Color, 1),
    ("from", StorageClass::Uniform, ElementType::Point, 1),
    ("to", StorageClass::Uniform, ElementType::Point, 1),
    ("Ka", StorageClass::Uniform, ElementType::Float, 1),
    ("Kd", StorageClass::Uniform, ElementType::Float, 1),
    ("Ks", StorageClass::Uniform, ElementType::Float, 1),
    ("roughness", StorageClass::Uniform, ElementType::Float, 1),
    ("specularcolor", StorageClass::Uniform, ElementType::Color, 1),
    ("fov", StorageClass::Uniform, ElementType::Float, 1),
];

impl Declarations {
    /// Registry pre-seeded with the standard parameter vocabulary.
    pub fn with_standard() -> Self {
        let map = STANDARD
            .iter()
            .map(|&(name, class, ty, len)| (name.to_string(), ParamDecl { class, ty, len }))
            .collect();
        Self { map }
    }

    /// Empty registry.
    pub fn empty() -> Self {
        Self { map: HashMap::new() }
    }

    /// Store or overwrite the declaration for `name`.
    pub fn declare(&mut self, name: impl Into<String>, decl: ParamDecl) {
        self.map.insert(name.into(), decl);
    }

    /// Look up a declared name.
    pub fn lookup(&self, name: &str) -> Option<&ParamDecl> {
        self.map.get(name)
    }

    /// Number of declarations held.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for Declarations {
    fn default() -> Self {
        Self::with_standard()
    }
}
