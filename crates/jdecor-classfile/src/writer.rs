use std::collections::HashMap;

use crate::constant_pool::{encode_mutf8, ConstantPool, CpInfo};
use crate::error::{Error, Result};

/// Emit side of the constant pool.
///
/// Interns `Utf8`/`Class`/`NameAndType` and the member-ref kinds. A builder
/// can be seeded from a parsed pool, in which case every existing entry keeps
/// its index and re-serializes byte-identically, so raw member bytes copied
/// from the source classfile stay valid in the output.
pub struct ConstantPoolBuilder {
    entries: Vec<Option<CpInfo>>,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
    name_and_types: HashMap<(u16, u16), u16>,
    field_refs: HashMap<(u16, u16), u16>,
    method_refs: HashMap<(u16, u16, bool), u16>,
}

impl ConstantPoolBuilder {
    pub fn new() -> Self {
        Self {
            entries: vec![None],
            utf8: HashMap::new(),
            classes: HashMap::new(),
            name_and_types: HashMap::new(),
            field_refs: HashMap::new(),
            method_refs: HashMap::new(),
        }
    }

    /// Seed from a parsed pool, preserving every slot index.
    pub fn from_pool(pool: &ConstantPool) -> Result<Self> {
        let mut builder = Self::new();
        for (index, slot) in pool.slots() {
            builder.entries.push(slot.cloned());
            let Some(info) = slot else { continue };
            match info {
                CpInfo::Utf8 { decoded, .. } => {
                    builder.utf8.entry(decoded.clone()).or_insert(index);
                }
                CpInfo::Class { name_index } => {
                    let name = pool.get_utf8(*name_index)?.to_string();
                    builder.classes.entry(name).or_insert(index);
                }
                CpInfo::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    builder
                        .name_and_types
                        .entry((*name_index, *descriptor_index))
                        .or_insert(index);
                }
                CpInfo::Fieldref {
                    class_index,
                    name_and_type_index,
                } => {
                    builder
                        .field_refs
                        .entry((*class_index, *name_and_type_index))
                        .or_insert(index);
                }
                CpInfo::Methodref {
                    class_index,
                    name_and_type_index,
                } => {
                    builder
                        .method_refs
                        .entry((*class_index, *name_and_type_index, false))
                        .or_insert(index);
                }
                CpInfo::InterfaceMethodref {
                    class_index,
                    name_and_type_index,
                } => {
                    builder
                        .method_refs
                        .entry((*class_index, *name_and_type_index, true))
                        .or_insert(index);
                }
                _ => {}
            }
        }
        Ok(builder)
    }

    fn push(&mut self, info: CpInfo) -> Result<u16> {
        let index = self.entries.len();
        let wide = info.is_wide();
        self.entries.push(Some(info));
        if wide {
            self.entries.push(None);
        }
        // constant_pool_count is itself a u16.
        if self.entries.len() > u16::MAX as usize {
            return Err(Error::ConstantPoolOverflow);
        }
        Ok(index as u16)
    }

    pub fn utf8(&mut self, text: &str) -> Result<u16> {
        if let Some(&index) = self.utf8.get(text) {
            return Ok(index);
        }
        let index = self.push(CpInfo::Utf8 {
            raw: encode_mutf8(text),
            decoded: text.to_string(),
        })?;
        self.utf8.insert(text.to_string(), index);
        Ok(index)
    }

    pub fn class(&mut self, internal_name: &str) -> Result<u16> {
        if let Some(&index) = self.classes.get(internal_name) {
            return Ok(index);
        }
        let name_index = self.utf8(internal_name)?;
        let index = self.push(CpInfo::Class { name_index })?;
        self.classes.insert(internal_name.to_string(), index);
        Ok(index)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let key = (self.utf8(name)?, self.utf8(descriptor)?);
        if let Some(&index) = self.name_and_types.get(&key) {
            return Ok(index);
        }
        let index = self.push(CpInfo::NameAndType {
            name_index: key.0,
            descriptor_index: key.1,
        })?;
        self.name_and_types.insert(key, index);
        Ok(index)
    }

    pub fn field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
        let key = (self.class(class)?, self.name_and_type(name, descriptor)?);
        if let Some(&index) = self.field_refs.get(&key) {
            return Ok(index);
        }
        let index = self.push(CpInfo::Fieldref {
            class_index: key.0,
            name_and_type_index: key.1,
        })?;
        self.field_refs.insert(key, index);
        Ok(index)
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
        self.any_method_ref(class, name, descriptor, false)
    }

    pub fn interface_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
        self.any_method_ref(class, name, descriptor, true)
    }

    fn any_method_ref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
        interface: bool,
    ) -> Result<u16> {
        let class_index = self.class(class)?;
        let name_and_type_index = self.name_and_type(name, descriptor)?;
        let key = (class_index, name_and_type_index, interface);
        if let Some(&index) = self.method_refs.get(&key) {
            return Ok(index);
        }
        let info = if interface {
            CpInfo::InterfaceMethodref {
                class_index,
                name_and_type_index,
            }
        } else {
            CpInfo::Methodref {
                class_index,
                name_and_type_index,
            }
        };
        let index = self.push(info)?;
        self.method_refs.insert(key, index);
        Ok(index)
    }

    fn serialize_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.entries.len() as u16).to_be_bytes());
        for slot in self.entries.iter().skip(1) {
            let Some(info) = slot else { continue };
            serialize_entry(info, out);
        }
    }
}

impl Default for ConstantPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize_entry(info: &CpInfo, out: &mut Vec<u8>) {
    match info {
        CpInfo::Utf8 { raw, .. } => {
            out.push(1);
            out.extend_from_slice(&(raw.len() as u16).to_be_bytes());
            out.extend_from_slice(raw);
        }
        CpInfo::Integer(bits) => {
            out.push(3);
            out.extend_from_slice(&bits.to_be_bytes());
        }
        CpInfo::Float(bits) => {
            out.push(4);
            out.extend_from_slice(&bits.to_be_bytes());
        }
        CpInfo::Long(bits) => {
            out.push(5);
            out.extend_from_slice(&bits.to_be_bytes());
        }
        CpInfo::Double(bits) => {
            out.push(6);
            out.extend_from_slice(&bits.to_be_bytes());
        }
        CpInfo::Class { name_index } => {
            out.push(7);
            out.extend_from_slice(&name_index.to_be_bytes());
        }
        CpInfo::String { string_index } => {
            out.push(8);
            out.extend_from_slice(&string_index.to_be_bytes());
        }
        CpInfo::Fieldref {
            class_index,
            name_and_type_index,
        } => {
            out.push(9);
            out.extend_from_slice(&class_index.to_be_bytes());
            out.extend_from_slice(&name_and_type_index.to_be_bytes());
        }
        CpInfo::Methodref {
            class_index,
            name_and_type_index,
        } => {
            out.push(10);
            out.extend_from_slice(&class_index.to_be_bytes());
            out.extend_from_slice(&name_and_type_index.to_be_bytes());
        }
        CpInfo::InterfaceMethodref {
            class_index,
            name_and_type_index,
        } => {
            out.push(11);
            out.extend_from_slice(&class_index.to_be_bytes());
            out.extend_from_slice(&name_and_type_index.to_be_bytes());
        }
        CpInfo::NameAndType {
            name_index,
            descriptor_index,
        } => {
            out.push(12);
            out.extend_from_slice(&name_index.to_be_bytes());
            out.extend_from_slice(&descriptor_index.to_be_bytes());
        }
        CpInfo::MethodHandle {
            reference_kind,
            reference_index,
        } => {
            out.push(15);
            out.push(*reference_kind);
            out.extend_from_slice(&reference_index.to_be_bytes());
        }
        CpInfo::MethodType { descriptor_index } => {
            out.push(16);
            out.extend_from_slice(&descriptor_index.to_be_bytes());
        }
        CpInfo::Dynamic {
            bootstrap_method_attr_index,
            name_and_type_index,
        } => {
            out.push(17);
            out.extend_from_slice(&bootstrap_method_attr_index.to_be_bytes());
            out.extend_from_slice(&name_and_type_index.to_be_bytes());
        }
        CpInfo::InvokeDynamic {
            bootstrap_method_attr_index,
            name_and_type_index,
        } => {
            out.push(18);
            out.extend_from_slice(&bootstrap_method_attr_index.to_be_bytes());
            out.extend_from_slice(&name_and_type_index.to_be_bytes());
        }
        CpInfo::Module { name_index } => {
            out.push(19);
            out.extend_from_slice(&name_index.to_be_bytes());
        }
        CpInfo::Package { name_index } => {
            out.push(20);
            out.extend_from_slice(&name_index.to_be_bytes());
        }
    }
}

/// A generated method body plus the sizing the `Code` attribute needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCode {
    pub code: Vec<u8>,
    pub max_stack: u16,
    pub max_locals: u16,
}

/// Builds a classfile: header, fields, methods, final serialization.
///
/// Members are serialized eagerly against the builder's pool, so the pool can
/// only grow while the writer is alive — which keeps already-written member
/// bytes valid.
pub struct ClassWriter {
    pool: ConstantPoolBuilder,
    minor_version: u16,
    major_version: u16,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Vec<u8>>,
}

impl ClassWriter {
    pub fn new(major_version: u16, minor_version: u16) -> Self {
        Self::with_pool(ConstantPoolBuilder::new(), major_version, minor_version)
    }

    pub fn with_pool(pool: ConstantPoolBuilder, major_version: u16, minor_version: u16) -> Self {
        Self {
            pool,
            minor_version,
            major_version,
            access_flags: 0,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn pool_mut(&mut self) -> &mut ConstantPoolBuilder {
        &mut self.pool
    }

    pub fn set_header(
        &mut self,
        access_flags: u16,
        this_class: &str,
        super_class: &str,
        interfaces: &[String],
    ) -> Result<()> {
        self.access_flags = access_flags;
        self.this_class = self.pool.class(this_class)?;
        self.super_class = self.pool.class(super_class)?;
        self.interfaces = interfaces
            .iter()
            .map(|name| self.pool.class(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    pub fn add_field(&mut self, access_flags: u16, name: &str, descriptor: &str) -> Result<()> {
        let name_index = self.pool.utf8(name)?;
        let descriptor_index = self.pool.utf8(descriptor)?;
        let mut out = Vec::with_capacity(8);
        out.extend_from_slice(&access_flags.to_be_bytes());
        out.extend_from_slice(&name_index.to_be_bytes());
        out.extend_from_slice(&descriptor_index.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // attributes_count
        self.fields.push(out);
        Ok(())
    }

    pub fn add_method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        code: Option<&MethodCode>,
        signature: Option<&str>,
        exceptions: &[String],
    ) -> Result<()> {
        let name_index = self.pool.utf8(name)?;
        let descriptor_index = self.pool.utf8(descriptor)?;

        let mut attrs: Vec<Vec<u8>> = Vec::new();
        if let Some(code) = code {
            attrs.push(self.code_attribute(code)?);
        }
        if !exceptions.is_empty() {
            attrs.push(self.exceptions_attribute(exceptions)?);
        }
        if let Some(signature) = signature {
            attrs.push(self.signature_attribute(signature)?);
        }

        let mut out = Vec::new();
        out.extend_from_slice(&access_flags.to_be_bytes());
        out.extend_from_slice(&name_index.to_be_bytes());
        out.extend_from_slice(&descriptor_index.to_be_bytes());
        out.extend_from_slice(&(attrs.len() as u16).to_be_bytes());
        for attr in attrs {
            out.extend_from_slice(&attr);
        }
        self.methods.push(out);
        Ok(())
    }

    /// Copy a complete `field_info` verbatim. The writer's pool must have
    /// been seeded from the pool the bytes were parsed against.
    pub fn add_raw_field(&mut self, raw: &[u8]) {
        self.fields.push(raw.to_vec());
    }

    /// Copy a complete `method_info` verbatim. Same pool caveat as
    /// [`ClassWriter::add_raw_field`].
    pub fn add_raw_method(&mut self, raw: &[u8]) {
        self.methods.push(raw.to_vec());
    }

    /// Carry class-level attributes (raw `attribute_info` structures) over
    /// from a parsed classfile sharing this writer's pool.
    pub fn set_raw_attributes(&mut self, attributes: Vec<Vec<u8>>) {
        self.attributes = attributes;
    }

    fn code_attribute(&mut self, code: &MethodCode) -> Result<Vec<u8>> {
        let name_index = self.pool.utf8("Code")?;
        let mut out = Vec::with_capacity(18 + code.code.len());
        out.extend_from_slice(&name_index.to_be_bytes());
        out.extend_from_slice(&(12 + code.code.len() as u32).to_be_bytes());
        out.extend_from_slice(&code.max_stack.to_be_bytes());
        out.extend_from_slice(&code.max_locals.to_be_bytes());
        out.extend_from_slice(&(code.code.len() as u32).to_be_bytes());
        out.extend_from_slice(&code.code);
        out.extend_from_slice(&0u16.to_be_bytes()); // exception_table_length
        out.extend_from_slice(&0u16.to_be_bytes()); // attributes_count
        Ok(out)
    }

    fn exceptions_attribute(&mut self, exceptions: &[String]) -> Result<Vec<u8>> {
        let name_index = self.pool.utf8("Exceptions")?;
        let mut out = Vec::with_capacity(8 + exceptions.len() * 2);
        out.extend_from_slice(&name_index.to_be_bytes());
        out.extend_from_slice(&(2 + exceptions.len() as u32 * 2).to_be_bytes());
        out.extend_from_slice(&(exceptions.len() as u16).to_be_bytes());
        for exception in exceptions {
            let index = self.pool.class(exception)?;
            out.extend_from_slice(&index.to_be_bytes());
        }
        Ok(out)
    }

    fn signature_attribute(&mut self, signature: &str) -> Result<Vec<u8>> {
        let name_index = self.pool.utf8("Signature")?;
        let signature_index = self.pool.utf8(signature)?;
        let mut out = Vec::with_capacity(8);
        out.extend_from_slice(&name_index.to_be_bytes());
        out.extend_from_slice(&2u32.to_be_bytes());
        out.extend_from_slice(&signature_index.to_be_bytes());
        Ok(out)
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if self.this_class == 0 {
            return Err(Error::Other("class header was never set"));
        }
        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        self.pool.serialize_into(&mut out);
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }
        out.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            out.extend_from_slice(field);
        }
        out.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            out.extend_from_slice(method);
        }
        out.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attribute in &self.attributes {
            out.extend_from_slice(attribute);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{ACC_ABSTRACT, ACC_INTERFACE, ACC_PUBLIC};
    use crate::classfile::ClassFile;
    use crate::opcodes;
    use pretty_assertions::assert_eq;

    #[test]
    fn pool_interns_duplicates() {
        let mut pool = ConstantPoolBuilder::new();
        let a = pool.utf8("java/lang/Object").unwrap();
        let b = pool.utf8("java/lang/Object").unwrap();
        assert_eq!(a, b);
        let c = pool.class("java/lang/Object").unwrap();
        let d = pool.class("java/lang/Object").unwrap();
        assert_eq!(c, d);
        let e = pool.method_ref("A", "m", "()V").unwrap();
        let f = pool.method_ref("A", "m", "()V").unwrap();
        assert_eq!(e, f);
        // An interface method ref with the same symbol is a distinct entry.
        let g = pool.interface_method_ref("A", "m", "()V").unwrap();
        assert_ne!(f, g);
    }

    #[test]
    fn written_class_parses_back() {
        let mut writer = ClassWriter::new(52, 0);
        writer
            .set_header(
                ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT,
                "com/example/Greeter",
                "java/lang/Object",
                &[],
            )
            .unwrap();
        writer
            .add_method(
                ACC_PUBLIC | ACC_ABSTRACT,
                "greet",
                "()Ljava/lang/String;",
                None,
                None,
                &["java/io/IOException".to_string()],
            )
            .unwrap();

        let bytes = writer.into_bytes().unwrap();
        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.this_class, "com/example/Greeter");
        assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
        assert!(class.is_interface());
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].name, "greet");
        assert_eq!(class.methods[0].exceptions, vec!["java/io/IOException".to_string()]);
        assert!(class.methods[0].code.is_none());
    }

    #[test]
    fn seeded_pool_keeps_raw_members_valid() {
        // Write a class with one concrete method, parse it, then copy the
        // method verbatim into a new writer seeded from the parsed pool.
        let mut writer = ClassWriter::new(52, 0);
        writer
            .set_header(ACC_PUBLIC, "com/example/A", "java/lang/Object", &[])
            .unwrap();
        let body = MethodCode {
            code: vec![opcodes::RETURN],
            max_stack: 0,
            max_locals: 1,
        };
        writer
            .add_method(ACC_PUBLIC, "noop", "()V", Some(&body), None, &[])
            .unwrap();
        let original = ClassFile::parse(&writer.into_bytes().unwrap()).unwrap();

        let pool = ConstantPoolBuilder::from_pool(&original.constant_pool).unwrap();
        let mut copier = ClassWriter::with_pool(pool, 52, 0);
        copier
            .set_header(ACC_PUBLIC, "com/example/A", "java/lang/Object", &[])
            .unwrap();
        copier.add_raw_method(&original.methods[0].raw);

        let copied = ClassFile::parse(&copier.into_bytes().unwrap()).unwrap();
        assert_eq!(copied.methods[0].name, "noop");
        assert_eq!(copied.methods[0].code, original.methods[0].code);
    }
}
