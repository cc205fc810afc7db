// ============================================================================
// Class 文件解析 - JVM class file format
// ============================================================================
//
// Only the parts the lint needs are decoded: constant pool, access flags,
// this/super class, interfaces, fields and methods. Attributes are skipped.

use std::path::Path;

use super::{ClassExtractor, Extraction};
use crate::error::{LintError, LintResult};
use crate::symbol_table::{AccessFlags, ClassDescriptor, FieldInfo, MethodInfo};

const MAGIC: u32 = 0xCAFE_BABE;

/// Constant pool entries the lint cares about
#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class(u16),
    /// Any other entry, and the dead slot after Long/Double
    Other,
}

/// Big-endian cursor over the class file bytes
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], String> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.data.len()).ok_or_else(|| {
            format!("truncated at offset {} (wanted {} more bytes)", self.pos, len)
        })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, String> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, String> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, String> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Reads compiled `.class` files
#[derive(Debug, Default)]
pub struct ClassFileReader;

impl ClassFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl ClassExtractor for ClassFileReader {
    fn supported_extensions(&self) -> &[&str] {
        &["class"]
    }

    fn extract(&self, bytes: &[u8], file_path: &Path) -> LintResult<Extraction> {
        let parsed = parse_class_file(bytes, file_path).map_err(|reason| LintError::ClassFormat {
            path: file_path.to_path_buf(),
            reason,
        })?;

        Ok(Extraction {
            classes: parsed.into_iter().collect(),
            links: Vec::new(),
        })
    }
}

/// Parse one class file. Returns `None` for `module-info.class`.
pub fn parse_class_file(bytes: &[u8], file_path: &Path) -> Result<Option<ClassDescriptor>, String> {
    let mut reader = ByteReader::new(bytes);

    let magic = reader.u32()?;
    if magic != MAGIC {
        return Err(format!("bad magic 0x{magic:08X}"));
    }
    let _minor = reader.u16()?;
    let _major = reader.u16()?;

    let pool = read_constant_pool(&mut reader)?;

    let access = AccessFlags(reader.u16()?);
    let this_class = class_name(&pool, reader.u16()?)?;
    if access.contains(AccessFlags::MODULE) {
        return Ok(None);
    }

    let super_index = reader.u16()?;
    let superclass = if super_index == 0 {
        None
    } else {
        Some(class_name(&pool, super_index)?)
    };

    let interface_count = reader.u16()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(class_name(&pool, reader.u16()?)?);
    }

    let mut fields = Vec::new();
    for _ in 0..reader.u16()? {
        let member = read_member(&mut reader, &pool)?;
        fields.push(FieldInfo::new(&member.name, member.access));
    }

    let mut methods = Vec::new();
    for _ in 0..reader.u16()? {
        let member = read_member(&mut reader, &pool)?;
        // getDeclaredMethods() semantics: constructors and <clinit> are not methods
        if member.name == "<init>" || member.name == "<clinit>" {
            continue;
        }
        let (param_count, return_type) = parse_method_descriptor(&member.descriptor)?;
        let mut method = MethodInfo::new(&member.name, param_count, member.access);
        method.return_type = return_type;
        methods.push(method);
    }

    let mut info = ClassDescriptor::new(&this_class, file_path.to_path_buf());
    info.access = access;
    info.superclass = superclass;
    info.interfaces = interfaces;
    info.fields = fields;
    info.methods = methods;
    Ok(Some(info))
}

fn read_constant_pool(reader: &mut ByteReader<'_>) -> Result<Vec<Constant>, String> {
    let count = reader.u16()? as usize;
    // Index 0 is unused
    let mut pool = Vec::with_capacity(count);
    pool.push(Constant::Other);

    while pool.len() < count {
        let tag = reader.u8()?;
        match tag {
            1 => {
                let len = reader.u16()? as usize;
                let raw = reader.take(len)?;
                pool.push(Constant::Utf8(decode_modified_utf8(raw)?));
            }
            7 => pool.push(Constant::Class(reader.u16()?)),
            // Integer, Float
            3 | 4 => {
                reader.take(4)?;
                pool.push(Constant::Other);
            }
            // Long, Double take two slots
            5 | 6 => {
                reader.take(8)?;
                pool.push(Constant::Other);
                pool.push(Constant::Other);
            }
            // String, MethodType, Module, Package
            8 | 16 | 19 | 20 => {
                reader.take(2)?;
                pool.push(Constant::Other);
            }
            // Fieldref, Methodref, InterfaceMethodref, NameAndType, Dynamic, InvokeDynamic
            9 | 10 | 11 | 12 | 17 | 18 => {
                reader.take(4)?;
                pool.push(Constant::Other);
            }
            // MethodHandle
            15 => {
                reader.take(3)?;
                pool.push(Constant::Other);
            }
            other => {
                return Err(format!(
                    "unknown constant pool tag {} at index {}",
                    other,
                    pool.len()
                ))
            }
        }
    }

    Ok(pool)
}

/// Decode a CONSTANT_Utf8 payload.
///
/// Modified UTF-8 encodes U+0000 as `C0 80` and supplementary characters as
/// two 3-byte surrogates, so it is decoded to UTF-16 units first.
fn decode_modified_utf8(raw: &[u8]) -> Result<String, String> {
    if raw.iter().all(|b| (0x01..0x80).contains(b)) {
        return Ok(raw.iter().map(|&b| b as char).collect());
    }

    let continuation = |i: usize| -> Result<u16, String> {
        match raw.get(i) {
            Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
            _ => Err(format!("invalid modified UTF-8 continuation at byte {i}")),
        }
    };

    let mut units = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        match b {
            0x01..=0x7F => {
                units.push(b as u16);
                i += 1;
            }
            0xC0..=0xDF => {
                units.push(((b & 0x1F) as u16) << 6 | continuation(i + 1)?);
                i += 2;
            }
            0xE0..=0xEF => {
                units.push(((b & 0x0F) as u16) << 12 | continuation(i + 1)? << 6 | continuation(i + 2)?);
                i += 3;
            }
            _ => return Err(format!("invalid modified UTF-8 byte 0x{b:02X} at byte {i}")),
        }
    }

    String::from_utf16(&units).map_err(|_| "unpaired surrogate in modified UTF-8".to_string())
}

fn utf8(pool: &[Constant], index: u16) -> Result<&str, String> {
    match pool.get(index as usize) {
        Some(Constant::Utf8(s)) => Ok(s),
        _ => Err(format!("constant pool index {index} is not a Utf8 entry")),
    }
}

/// Binary name of a Class constant: `com/example/Outer$Inner` -> `com.example.Outer$Inner`
fn class_name(pool: &[Constant], index: u16) -> Result<String, String> {
    match pool.get(index as usize) {
        Some(Constant::Class(name_index)) => Ok(utf8(pool, *name_index)?.replace('/', ".")),
        _ => Err(format!("constant pool index {index} is not a Class entry")),
    }
}

struct RawMember {
    access: AccessFlags,
    name: String,
    descriptor: String,
}

fn read_member(reader: &mut ByteReader<'_>, pool: &[Constant]) -> Result<RawMember, String> {
    let access = AccessFlags(reader.u16()?);
    let name = utf8(pool, reader.u16()?)?.to_string();
    let descriptor = utf8(pool, reader.u16()?)?.to_string();

    for _ in 0..reader.u16()? {
        let _name = reader.u16()?;
        let len = reader.u32()? as usize;
        reader.take(len)?;
    }

    Ok(RawMember { access, name, descriptor })
}

/// `(ILjava/lang/String;[J)Ljava/lang/String;` -> (3, Some("java.lang.String"))
pub fn parse_method_descriptor(descriptor: &str) -> Result<(usize, Option<String>), String> {
    let malformed = || format!("malformed method descriptor {descriptor:?}");

    let rest = descriptor.strip_prefix('(').ok_or_else(malformed)?;
    let close = rest.find(')').ok_or_else(malformed)?;
    let (params, ret) = (&rest[..close], &rest[close + 1..]);

    let mut count = 0;
    let mut chars = params.chars();
    while let Some(c) = chars.next() {
        let mut c = c;
        while c == '[' {
            c = chars.next().ok_or_else(malformed)?;
        }
        match c {
            'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' => {}
            'L' => {
                if !chars.by_ref().any(|c| c == ';') {
                    return Err(malformed());
                }
            }
            _ => return Err(malformed()),
        }
        count += 1;
    }

    let return_type = if ret == "V" { None } else { Some(field_type_name(ret).ok_or_else(malformed)?) };
    Ok((count, return_type))
}

/// Field descriptor to a Java type name: `[Ljava/lang/String;` -> `java.lang.String[]`
fn field_type_name(descriptor: &str) -> Option<String> {
    let dims = descriptor.chars().take_while(|c| *c == '[').count();
    let element = &descriptor[dims..];
    let base = match element {
        "B" => "byte".to_string(),
        "C" => "char".to_string(),
        "D" => "double".to_string(),
        "F" => "float".to_string(),
        "I" => "int".to_string(),
        "J" => "long".to_string(),
        "S" => "short".to_string(),
        "Z" => "boolean".to_string(),
        _ => element.strip_prefix('L')?.strip_suffix(';')?.replace('/', "."),
    };
    Some(format!("{}{}", base, "[]".repeat(dims)))
}
