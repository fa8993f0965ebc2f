//! Class-file linking.
//!
//! Linking validates the structure a driver manager relies on: magic number,
//! version, constant pool, declared class name, super class and interfaces.
//! Method bodies are not verified.

use thiserror::Error;

const MAGIC: u32 = 0xCAFE_BABE;
/// JDK 1.1, the oldest version a class-file parser has to accept.
const MIN_MAJOR_VERSION: u16 = 45;

/// Link-time checks applied to every candidate class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPolicy {
    /// Highest accepted class-file major version (65 = Java 21).
    pub max_major_version: u16,
    /// Largest entry that will be read from a source.
    pub max_entry_bytes: u64,
    /// Interface the class must declare directly, e.g. `java.sql.Driver`.
    pub required_interface: Option<String>,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            max_major_version: 65,
            max_entry_bytes: 16 * 1024 * 1024,
            required_interface: None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("bad magic number 0x{0:08X}")]
    BadMagic(u32),

    #[error("truncated class file at offset {0}")]
    Truncated(usize),

    #[error("unsupported class file version {major}.{minor} (supported {min}..={max})")]
    UnsupportedVersion { major: u16, minor: u16, min: u16, max: u16 },

    #[error("invalid constant pool: {0}")]
    ConstantPool(String),

    #[error("entry declares class {declared}, expected {expected}")]
    NameMismatch { declared: String, expected: String },

    #[error("class does not implement {0}")]
    MissingInterface(String),
}

/// Structural metadata of a linked class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFileInfo {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub major_version: u16,
    pub minor_version: u16,
    pub access_flags: u16,
}

/// Archive entry name for a binary class name.
pub fn entry_name(qualified_name: &str) -> String {
    format!("{}.class", qualified_name.replace('.', "/"))
}

/// Whether `name` is a syntactically valid binary class name.
pub fn is_valid_binary_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
                    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
                }
                _ => false,
            }
        })
}

/// Parse class-file bytes without applying a policy.
pub fn parse(bytes: &[u8]) -> Result<ClassFileInfo, LinkError> {
    let mut r = Reader { data: bytes, pos: 0 };

    let magic = r.u32()?;
    if magic != MAGIC {
        return Err(LinkError::BadMagic(magic));
    }
    let minor_version = r.u16()?;
    let major_version = r.u16()?;

    let pool = ConstantPool::read(&mut r)?;

    let access_flags = r.u16()?;
    let this_class = r.u16()?;
    let super_class = r.u16()?;
    let interface_count = r.u16()?;

    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(r.u16()?)?);
    }

    let name = pool.class_name(this_class)?;
    let super_name = match super_class {
        0 => None,
        idx => Some(pool.class_name(idx)?),
    };

    Ok(ClassFileInfo {
        name,
        super_name,
        interfaces,
        major_version,
        minor_version,
        access_flags,
    })
}

/// Parse `bytes` and check them against `policy` for the requested class.
pub fn link(bytes: &[u8], expected: &str, policy: &LinkPolicy) -> Result<ClassFileInfo, LinkError> {
    let info = parse(bytes)?;

    if !(MIN_MAJOR_VERSION..=policy.max_major_version).contains(&info.major_version) {
        return Err(LinkError::UnsupportedVersion {
            major: info.major_version,
            minor: info.minor_version,
            min: MIN_MAJOR_VERSION,
            max: policy.max_major_version,
        });
    }
    if info.name != expected {
        return Err(LinkError::NameMismatch {
            declared: info.name,
            expected: expected.to_string(),
        });
    }
    if let Some(iface) = &policy.required_interface {
        if !info.interfaces.iter().any(|i| i == iface) {
            return Err(LinkError::MissingInterface(iface.clone()));
        }
    }

    Ok(info)
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], LinkError> {
        let end = self.pos.checked_add(n).ok_or(LinkError::Truncated(self.pos))?;
        let slice = self.data.get(self.pos..end).ok_or(LinkError::Truncated(self.pos))?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, LinkError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, LinkError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, LinkError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

enum Constant {
    Utf8(String),
    Class(u16),
    Other,
    /// Second slot of a long or double.
    Unusable,
}

struct ConstantPool {
    // Index 0 is unused, as in the class-file format.
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn read(r: &mut Reader<'_>) -> Result<Self, LinkError> {
        let count = r.u16()? as usize;
        if count == 0 {
            return Err(LinkError::ConstantPool("constant pool count is zero".into()));
        }

        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);
        while entries.len() < count {
            let index = entries.len();
            let tag = r.u8()?;
            match tag {
                1 => {
                    let len = r.u16()? as usize;
                    let bytes = r.take(len)?;
                    entries.push(Constant::Utf8(decode_modified_utf8(bytes)));
                }
                7 => entries.push(Constant::Class(r.u16()?)),
                8 | 16 | 19 | 20 => {
                    r.take(2)?;
                    entries.push(Constant::Other);
                }
                15 => {
                    r.take(3)?;
                    entries.push(Constant::Other);
                }
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                    r.take(4)?;
                    entries.push(Constant::Other);
                }
                5 | 6 => {
                    r.take(8)?;
                    if index + 1 >= count {
                        return Err(LinkError::ConstantPool(format!(
                            "8-byte constant at index {} overruns the pool",
                            index
                        )));
                    }
                    entries.push(Constant::Other);
                    entries.push(Constant::Unusable);
                }
                other => {
                    return Err(LinkError::ConstantPool(format!(
                        "unknown tag {} at index {}",
                        other, index
                    )));
                }
            }
        }

        Ok(Self { entries })
    }

    fn utf8(&self, index: u16) -> Result<&str, LinkError> {
        match self.entries.get(index as usize) {
            Some(Constant::Utf8(s)) => Ok(s),
            _ => Err(LinkError::ConstantPool(format!("index {} is not a UTF-8 constant", index))),
        }
    }

    /// Resolve a CONSTANT_Class index to a dotted binary name.
    fn class_name(&self, index: u16) -> Result<String, LinkError> {
        match self.entries.get(index as usize) {
            Some(Constant::Class(name_index)) if index != 0 => {
                Ok(self.utf8(*name_index)?.replace('/', "."))
            }
            _ => Err(LinkError::ConstantPool(format!("index {} is not a class constant", index))),
        }
    }
}

/// Decode a class-file `Utf8` constant.
///
/// Modified UTF-8 writes NUL as `C0 80` and supplementary characters as two
/// three-byte surrogates. Unpaired surrogates and invalid sequences decode to
/// U+FFFD.
fn decode_modified_utf8(bytes: &[u8]) -> String {
    let cont = |i: usize| bytes.get(i).map_or(false, |b| b & 0xC0 == 0x80);
    let low = |i: usize| (bytes[i] & 0x3F) as u32;

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i] as u32;
        if b < 0x80 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 && cont(i + 1) {
            units.push((((b & 0x1F) << 6) | low(i + 1)) as u16);
            i += 2;
        } else if b & 0xF0 == 0xE0 && cont(i + 1) && cont(i + 2) {
            units.push((((b & 0x0F) << 12) | (low(i + 1) << 6) | low(i + 2)) as u16);
            i += 3;
        } else if b & 0xF8 == 0xF0 && cont(i + 1) && cont(i + 2) && cont(i + 3) {
            // Standard four-byte form, emitted by some non-javac tools.
            let cp = ((b & 0x07) << 18) | (low(i + 1) << 12) | (low(i + 2) << 6) | low(i + 3);
            let mut buf = [0u16; 2];
            match char::from_u32(cp) {
                Some(c) => units.extend_from_slice(c.encode_utf16(&mut buf)),
                None => units.push(0xFFFD),
            }
            i += 4;
        } else {
            units.push(0xFFFD);
            i += 1;
        }
    }
    String::from_utf16_lossy(&units)
}
