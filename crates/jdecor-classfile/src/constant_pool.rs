use crate::error::{Error, Result};
use crate::reader::Reader;

/// One parsed `cp_info` entry.
///
/// `Utf8` keeps both the raw modified-UTF-8 payload and its decoded form so a
/// parsed pool can be re-serialized byte-identically.
#[derive(Debug, Clone, PartialEq)]
pub enum CpInfo {
    Utf8 { raw: Vec<u8>, decoded: String },
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl CpInfo {
    /// Whether the entry occupies two pool slots (JVMS 4.4.5).
    pub fn is_wide(&self) -> bool {
        matches!(self, CpInfo::Long(_) | CpInfo::Double(_))
    }
}

/// The constant pool of a parsed classfile.
///
/// Entries are stored 1-indexed; the phantom slot following a `Long`/`Double`
/// entry is `None`.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Option<CpInfo>>,
}

impl ConstantPool {
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        let mut entries: Vec<Option<CpInfo>> = Vec::with_capacity(count);
        entries.push(None); // index 0 is unusable

        while entries.len() < count {
            let tag = reader.read_u1()?;
            let info = match tag {
                1 => {
                    let len = reader.read_u2()? as usize;
                    let raw = reader.read_bytes(len)?.to_vec();
                    let decoded = decode_mutf8(&raw)?;
                    CpInfo::Utf8 { raw, decoded }
                }
                3 => CpInfo::Integer(reader.read_u4()?),
                4 => CpInfo::Float(reader.read_u4()?),
                5 => {
                    let high = reader.read_u4()? as u64;
                    let low = reader.read_u4()? as u64;
                    CpInfo::Long((high << 32) | low)
                }
                6 => {
                    let high = reader.read_u4()? as u64;
                    let low = reader.read_u4()? as u64;
                    CpInfo::Double((high << 32) | low)
                }
                7 => CpInfo::Class {
                    name_index: reader.read_u2()?,
                },
                8 => CpInfo::String {
                    string_index: reader.read_u2()?,
                },
                9 => CpInfo::Fieldref {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                10 => CpInfo::Methodref {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                11 => CpInfo::InterfaceMethodref {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                12 => CpInfo::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => CpInfo::MethodHandle {
                    reference_kind: reader.read_u1()?,
                    reference_index: reader.read_u2()?,
                },
                16 => CpInfo::MethodType {
                    descriptor_index: reader.read_u2()?,
                },
                17 => CpInfo::Dynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                18 => CpInfo::InvokeDynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                19 => CpInfo::Module {
                    name_index: reader.read_u2()?,
                },
                20 => CpInfo::Package {
                    name_index: reader.read_u2()?,
                },
                other => return Err(Error::InvalidConstantPoolTag(other)),
            };
            let wide = info.is_wide();
            entries.push(Some(info));
            if wide {
                entries.push(None);
            }
        }

        Ok(Self { entries })
    }

    pub fn get(&self, index: u16) -> Result<&CpInfo> {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(Error::InvalidConstantPoolIndex(index))
    }

    pub fn get_utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            CpInfo::Utf8 { decoded, .. } => Ok(decoded),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Utf8",
                found: tag_name(other),
            }),
        }
    }

    pub fn get_class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            CpInfo::Class { name_index } => Ok(self.get_utf8(*name_index)?.to_string()),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Class",
                found: tag_name(other),
            }),
        }
    }

    /// Number of slots, including the unusable index 0 and phantom wide slots.
    /// This is the value of the classfile `constant_pool_count` field.
    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }

    /// Slot-indexed iteration; phantom slots yield `None`.
    pub fn slots(&self) -> impl Iterator<Item = (u16, Option<&CpInfo>)> {
        self.entries
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, e)| (i as u16, e.as_ref()))
    }
}

fn tag_name(info: &CpInfo) -> &'static str {
    match info {
        CpInfo::Utf8 { .. } => "Utf8",
        CpInfo::Integer(_) => "Integer",
        CpInfo::Float(_) => "Float",
        CpInfo::Long(_) => "Long",
        CpInfo::Double(_) => "Double",
        CpInfo::Class { .. } => "Class",
        CpInfo::String { .. } => "String",
        CpInfo::Fieldref { .. } => "Fieldref",
        CpInfo::Methodref { .. } => "Methodref",
        CpInfo::InterfaceMethodref { .. } => "InterfaceMethodref",
        CpInfo::NameAndType { .. } => "NameAndType",
        CpInfo::MethodHandle { .. } => "MethodHandle",
        CpInfo::MethodType { .. } => "MethodType",
        CpInfo::Dynamic { .. } => "Dynamic",
        CpInfo::InvokeDynamic { .. } => "InvokeDynamic",
        CpInfo::Module { .. } => "Module",
        CpInfo::Package { .. } => "Package",
    }
}

pub(crate) fn decode_mutf8(bytes: &[u8]) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            0x01..=0x7f => {
                units.push(b as u16);
                i += 1;
            }
            0xc0..=0xdf => {
                let b2 = *bytes.get(i + 1).ok_or(Error::InvalidModifiedUtf8)?;
                if b2 & 0xc0 != 0x80 {
                    return Err(Error::InvalidModifiedUtf8);
                }
                units.push((((b as u16) & 0x1f) << 6) | ((b2 as u16) & 0x3f));
                i += 2;
            }
            0xe0..=0xef => {
                let b2 = *bytes.get(i + 1).ok_or(Error::InvalidModifiedUtf8)?;
                let b3 = *bytes.get(i + 2).ok_or(Error::InvalidModifiedUtf8)?;
                if b2 & 0xc0 != 0x80 || b3 & 0xc0 != 0x80 {
                    return Err(Error::InvalidModifiedUtf8);
                }
                units.push(
                    (((b as u16) & 0x0f) << 12)
                        | (((b2 as u16) & 0x3f) << 6)
                        | ((b3 as u16) & 0x3f),
                );
                i += 3;
            }
            _ => return Err(Error::InvalidModifiedUtf8),
        }
    }
    String::from_utf16(&units).map_err(|_| Error::InvalidModifiedUtf8)
}

pub(crate) fn encode_mutf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        let cp = c as u32;
        if cp == 0 {
            out.extend_from_slice(&[0xc0, 0x80]);
        } else if cp < 0x80 {
            out.push(cp as u8);
        } else if cp < 0x800 {
            out.push(0xc0 | (cp >> 6) as u8);
            out.push(0x80 | (cp & 0x3f) as u8);
        } else if cp < 0x10000 {
            out.push(0xe0 | (cp >> 12) as u8);
            out.push(0x80 | ((cp >> 6) & 0x3f) as u8);
            out.push(0x80 | (cp & 0x3f) as u8);
        } else {
            // Supplementary characters are encoded as a surrogate pair of
            // 3-byte sequences (JVMS 4.4.7).
            let v = cp - 0x10000;
            for unit in [0xd800 | (v >> 10), 0xdc00 | (v & 0x3ff)] {
                out.push(0xe0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutf8_round_trips() {
        for s in ["java/lang/Object", "<init>", "(Ljava/lang/String;)I", "héllo", "\u{1F600}"] {
            let encoded = encode_mutf8(s);
            assert_eq!(decode_mutf8(&encoded).unwrap(), s);
        }
    }

    #[test]
    fn mutf8_rejects_embedded_nul_byte() {
        assert!(decode_mutf8(&[0x41, 0x00]).is_err());
    }

    #[test]
    fn mutf8_encodes_nul_as_two_bytes() {
        assert_eq!(encode_mutf8("\0"), vec![0xc0, 0x80]);
    }
}
