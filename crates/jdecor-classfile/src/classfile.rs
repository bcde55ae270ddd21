use crate::access;
use crate::constant_pool::ConstantPool;
use crate::error::{Error, Result};
use crate::reader::Reader;

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    /// Raw class-level `attribute_info` structures, one element per
    /// attribute. Indices inside them are only meaningful together with
    /// `constant_pool`.
    pub attributes: Vec<Vec<u8>>,
    pub constant_pool: ConstantPool,
}

#[derive(Debug, Clone, Default)]
pub struct ClassMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    /// Generic signature, when a `Signature` attribute is present.
    pub signature: Option<String>,
    /// Classes named by the `Exceptions` attribute (the `throws` clause).
    pub exceptions: Vec<String>,
    pub code: Option<CodeSummary>,
    /// The member's complete raw `field_info`/`method_info` bytes. Only
    /// usable against the pool of the classfile the member was parsed from.
    pub raw: Vec<u8>,
}

/// The parts of a `Code` attribute the generator and checker care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSummary {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != 0xCAFEBABE {
            return Err(Error::InvalidMagic(magic));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let cp = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = cp.get_class_name(reader.read_u2()?)?;
        let super_class_idx = reader.read_u2()?;
        let super_class = if super_class_idx == 0 {
            None
        } else {
            Some(cp.get_class_name(super_class_idx)?)
        };

        let interfaces_count = reader.read_u2()? as usize;
        let mut interfaces = Vec::with_capacity(interfaces_count);
        for _ in 0..interfaces_count {
            interfaces.push(cp.get_class_name(reader.read_u2()?)?);
        }

        let fields_count = reader.read_u2()? as usize;
        let mut fields = Vec::with_capacity(fields_count);
        for _ in 0..fields_count {
            fields.push(parse_member(&mut reader, &cp)?);
        }

        let methods_count = reader.read_u2()? as usize;
        let mut methods = Vec::with_capacity(methods_count);
        for _ in 0..methods_count {
            methods.push(parse_member(&mut reader, &cp)?);
        }

        let attributes_count = reader.read_u2()? as usize;
        let mut attributes = Vec::with_capacity(attributes_count);
        for _ in 0..attributes_count {
            let mark = reader.pos();
            reader.read_u2()?;
            let length = reader.read_u4()? as usize;
            reader.read_bytes(length)?;
            attributes.push(reader.taken_since(mark).to_vec());
        }

        reader.ensure_empty()?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
            constant_pool: cp,
        })
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & access::ACC_INTERFACE != 0
    }
}

fn parse_member(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<ClassMember> {
    let mark = reader.pos();
    let access_flags = reader.read_u2()?;
    let name = cp.get_utf8(reader.read_u2()?)?.to_string();
    let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();

    let mut signature = None;
    let mut exceptions = Vec::new();
    let mut code = None;

    let attributes_count = reader.read_u2()? as usize;
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let info = reader.read_bytes(length)?;
        let attr_name = cp.get_utf8(name_index)?;

        let mut sub = Reader::new(info);
        match attr_name {
            "Signature" => {
                let sig_index = sub.read_u2()?;
                signature = Some(cp.get_utf8(sig_index)?.to_string());
                sub.ensure_empty()?;
            }
            "Exceptions" => {
                let num = sub.read_u2()? as usize;
                for _ in 0..num {
                    exceptions.push(cp.get_class_name(sub.read_u2()?)?);
                }
                sub.ensure_empty()?;
            }
            "Code" => {
                let max_stack = sub.read_u2()?;
                let max_locals = sub.read_u2()?;
                let code_length = sub.read_u4()? as usize;
                let body = sub.read_bytes(code_length)?.to_vec();
                // Exception table and nested attributes are carried only via
                // the raw bytes.
                code = Some(CodeSummary {
                    max_stack,
                    max_locals,
                    code: body,
                });
            }
            _ => {
                // Unknown attribute: intentionally skipped.
            }
        }
    }

    Ok(ClassMember {
        access_flags,
        name,
        descriptor,
        signature,
        exceptions,
        code,
        raw: reader.taken_since(mark).to_vec(),
    })
}
