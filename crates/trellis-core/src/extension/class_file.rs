//! Structural reader for compiled class files.
//!
//! Parses just enough of the class-file format to list the annotations attached
//! to the class itself: the constant pool, the class header, and the class-level
//! `RuntimeVisibleAnnotations` / `RuntimeInvisibleAnnotations` attributes. Field
//! and method tables are skipped without interpretation, and nothing the class
//! references is ever resolved, so classes with missing dependencies read fine.

const MAGIC: u32 = 0xCAFE_BABE;

const ATTR_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
const ATTR_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";

/// Deepest nesting of array and annotation element values accepted
pub const MAX_ELEMENT_DEPTH: usize = 64;

/// Reason a class file could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassFormatError {
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),
    #[error("unexpected end of data at offset {0}")]
    Truncated(usize),
    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },
    #[error("constant pool index {index} is not a valid {expected} entry")]
    BadConstantIndex { index: u16, expected: &'static str },
    #[error("annotation element values nested deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("unknown annotation element tag '{0}'")]
    UnknownElementTag(char),
    #[error("attribute '{name}' declares {declared} bytes but {consumed} were used")]
    AttributeLength {
        name: String,
        declared: usize,
        consumed: usize,
    },
}

type Result<T> = std::result::Result<T, ClassFormatError>;

/// Constant pool entries the annotation reader needs. Everything else is kept
/// as `Other` so indices stay aligned.
#[derive(Debug, Clone, PartialEq)]
enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    Other,
    /// Second slot taken by a long or double
    Unusable,
}

/// A constant value held by an annotation element
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// `byte`, `char`, `short`, `int` and `boolean` elements
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

/// Value of one annotation element
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum {
        type_descriptor: String,
        constant: String,
    },
    /// A class literal, kept as its field descriptor (e.g. `Lcom/acme/Api;`)
    Class(String),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation type, e.g. `Lorg/pf4j/Extension;`
    pub type_descriptor: String,
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|(element, _)| element == name)
            .map(|(_, value)| value)
    }
}

/// The parts of a class file the extension scanner cares about
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    /// Binary name with dots, e.g. `com.acme.Greeter$Inner`
    pub class_name: String,
    /// Both runtime-visible and runtime-invisible class annotations
    pub annotations: Vec<Annotation>,
}

impl ClassInfo {
    /// Parse a class file from raw bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        ClassParser::new(data).parse()
    }

    /// Annotation whose type matches `type_descriptor`
    pub fn annotation(&self, type_descriptor: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|annotation| annotation.type_descriptor == type_descriptor)
    }
}

/// `com.acme.Api` -> `Lcom/acme/Api;`
pub fn class_name_to_descriptor(class_name: &str) -> String {
    format!("L{};", class_name.replace('.', "/"))
}

/// Turn a field descriptor into a readable type name: `Lcom/acme/Api;` ->
/// `com.acme.Api`, `[I` -> `int[]`. Unrecognised input is returned unchanged.
pub fn descriptor_to_class_name(descriptor: &str) -> String {
    if let Some(element) = descriptor.strip_prefix('[') {
        return format!("{}[]", descriptor_to_class_name(element));
    }
    if let Some(name) = descriptor
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
    {
        return name.replace('/', ".");
    }
    let primitive = match descriptor {
        "B" => "byte",
        "C" => "char",
        "D" => "double",
        "F" => "float",
        "I" => "int",
        "J" => "long",
        "S" => "short",
        "Z" => "boolean",
        "V" => "void",
        other => other,
    };
    primitive.to_string()
}

/// Decode the "modified UTF-8" used by class files: NUL is encoded on two bytes
/// and supplementary characters as surrogate pairs of three bytes each.
fn decode_modified_utf8(bytes: &[u8]) -> String {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i] as u16;
        if b & 0x80 == 0 {
            units.push(b);
            i += 1;
        } else if b & 0xE0 == 0xC0 && i + 1 < bytes.len() {
            units.push(((b & 0x1F) << 6) | (bytes[i + 1] as u16 & 0x3F));
            i += 2;
        } else if b & 0xF0 == 0xE0 && i + 2 < bytes.len() {
            units.push(((b & 0x0F) << 12) | ((bytes[i + 1] as u16 & 0x3F) << 6) | (bytes[i + 2] as u16 & 0x3F));
            i += 3;
        } else {
            units.push(char::REPLACEMENT_CHARACTER as u16);
            i += 1;
        }
    }
    String::from_utf16_lossy(&units)
}

struct ClassParser<'a> {
    data: &'a [u8],
    pos: usize,
    pool: Vec<Constant>,
}

impl<'a> ClassParser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            pool: Vec::new(),
        }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = self.data;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= data.len())
            .ok_or(ClassFormatError::Truncated(self.pos))?;
        let slice = &data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64> {
        let hi = self.u32()? as u64;
        let lo = self.u32()? as u64;
        Ok((hi << 32) | lo)
    }

    fn parse(mut self) -> Result<ClassInfo> {
        let magic = self.u32()?;
        if magic != MAGIC {
            return Err(ClassFormatError::BadMagic(magic));
        }
        let _minor = self.u16()?;
        let _major = self.u16()?;
        self.read_constant_pool()?;

        let _access_flags = self.u16()?;
        let this_class = self.u16()?;
        let class_name = self.class_name(this_class)?.replace('/', ".");
        let _super_class = self.u16()?;
        let interfaces = self.u16()? as usize;
        self.bytes(interfaces * 2)?;

        // fields, then methods: identical layout
        for _ in 0..2 {
            let members = self.u16()?;
            for _ in 0..members {
                self.bytes(6)?; // access flags, name, descriptor
                self.skip_attributes()?;
            }
        }

        let mut annotations = Vec::new();
        let attributes = self.u16()?;
        for _ in 0..attributes {
            let name_index = self.u16()?;
            let length = self.u32()? as usize;
            let name = self.utf8(name_index)?.to_string();
            if name == ATTR_VISIBLE_ANNOTATIONS || name == ATTR_INVISIBLE_ANNOTATIONS {
                let start = self.pos;
                let count = self.u16()?;
                for _ in 0..count {
                    annotations.push(self.annotation(0)?);
                }
                let consumed = self.pos - start;
                if consumed != length {
                    return Err(ClassFormatError::AttributeLength {
                        name,
                        declared: length,
                        consumed,
                    });
                }
            } else {
                self.bytes(length)?;
            }
        }

        Ok(ClassInfo {
            class_name,
            annotations,
        })
    }

    fn read_constant_pool(&mut self) -> Result<()> {
        let count = self.u16()?;
        self.pool = Vec::with_capacity(count as usize);
        self.pool.push(Constant::Unusable); // index 0 is never valid

        // u32 so a wide constant in the last slot cannot overflow the counter
        let mut index: u32 = 1;
        while index < u32::from(count) {
            let tag = self.u8()?;
            let constant = match tag {
                1 => {
                    let len = self.u16()? as usize;
                    Constant::Utf8(decode_modified_utf8(self.bytes(len)?))
                }
                3 => Constant::Integer(self.u32()? as i32),
                4 => Constant::Float(f32::from_bits(self.u32()?)),
                5 => Constant::Long(self.u64()? as i64),
                6 => Constant::Double(f64::from_bits(self.u64()?)),
                7 => Constant::Class(self.u16()?),
                // String, MethodType, Module, Package
                8 | 16 | 19 | 20 => {
                    self.bytes(2)?;
                    Constant::Other
                }
                // Field/Method/InterfaceMethod refs, NameAndType, Dynamic, InvokeDynamic
                9 | 10 | 11 | 12 | 17 | 18 => {
                    self.bytes(4)?;
                    Constant::Other
                }
                // MethodHandle
                15 => {
                    self.bytes(3)?;
                    Constant::Other
                }
                _ => {
                    return Err(ClassFormatError::UnknownConstantTag {
                        tag,
                        index: index as u16,
                    })
                }
            };
            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            self.pool.push(constant);
            index += 1;
            if wide {
                self.pool.push(Constant::Unusable);
                index += 1;
            }
        }
        Ok(())
    }

    fn constant(&self, index: u16) -> Option<&Constant> {
        self.pool.get(index as usize)
    }

    fn utf8(&self, index: u16) -> Result<&str> {
        match self.constant(index) {
            Some(Constant::Utf8(value)) => Ok(value),
            _ => Err(ClassFormatError::BadConstantIndex {
                index,
                expected: "Utf8",
            }),
        }
    }

    fn class_name(&self, index: u16) -> Result<&str> {
        match self.constant(index) {
            Some(Constant::Class(name_index)) => self.utf8(*name_index),
            _ => Err(ClassFormatError::BadConstantIndex {
                index,
                expected: "Class",
            }),
        }
    }

    fn skip_attributes(&mut self) -> Result<()> {
        let count = self.u16()?;
        for _ in 0..count {
            self.bytes(2)?;
            let length = self.u32()? as usize;
            self.bytes(length)?;
        }
        Ok(())
    }

    fn annotation(&mut self, depth: usize) -> Result<Annotation> {
        let type_index = self.u16()?;
        let type_descriptor = self.utf8(type_index)?.to_string();
        let pairs = self.u16()?;
        let mut elements = Vec::with_capacity(pairs as usize);
        for _ in 0..pairs {
            let name_index = self.u16()?;
            let name = self.utf8(name_index)?.to_string();
            elements.push((name, self.element_value(depth)?));
        }
        Ok(Annotation {
            type_descriptor,
            elements,
        })
    }

    fn element_value(&mut self, depth: usize) -> Result<ElementValue> {
        if depth > MAX_ELEMENT_DEPTH {
            return Err(ClassFormatError::NestingTooDeep(MAX_ELEMENT_DEPTH));
        }
        let tag = self.u8()? as char;
        let value = match tag {
            'B' | 'C' | 'I' | 'S' | 'Z' => {
                let index = self.u16()?;
                match self.constant(index) {
                    Some(Constant::Integer(v)) => ElementValue::Const(ConstValue::Int(*v)),
                    _ => return Err(ClassFormatError::BadConstantIndex { index, expected: "Integer" }),
                }
            }
            'J' => {
                let index = self.u16()?;
                match self.constant(index) {
                    Some(Constant::Long(v)) => ElementValue::Const(ConstValue::Long(*v)),
                    _ => return Err(ClassFormatError::BadConstantIndex { index, expected: "Long" }),
                }
            }
            'F' => {
                let index = self.u16()?;
                match self.constant(index) {
                    Some(Constant::Float(v)) => ElementValue::Const(ConstValue::Float(*v)),
                    _ => return Err(ClassFormatError::BadConstantIndex { index, expected: "Float" }),
                }
            }
            'D' => {
                let index = self.u16()?;
                match self.constant(index) {
                    Some(Constant::Double(v)) => ElementValue::Const(ConstValue::Double(*v)),
                    _ => return Err(ClassFormatError::BadConstantIndex { index, expected: "Double" }),
                }
            }
            's' => {
                let index = self.u16()?;
                ElementValue::Const(ConstValue::String(self.utf8(index)?.to_string()))
            }
            'e' => {
                let type_index = self.u16()?;
                let const_index = self.u16()?;
                ElementValue::Enum {
                    type_descriptor: self.utf8(type_index)?.to_string(),
                    constant: self.utf8(const_index)?.to_string(),
                }
            }
            'c' => {
                let index = self.u16()?;
                ElementValue::Class(self.utf8(index)?.to_string())
            }
            '@' => ElementValue::Annotation(self.annotation(depth + 1)?),
            '[' => {
                let count = self.u16()?;
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    values.push(self.element_value(depth + 1)?);
                }
                ElementValue::Array(values)
            }
            other => return Err(ClassFormatError::UnknownElementTag(other)),
        };
        Ok(value)
    }
}
