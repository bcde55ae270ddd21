#![forbid(unsafe_code)]

pub mod access;
mod check;
mod classfile;
mod constant_pool;
mod descriptor;
mod error;
pub mod opcodes;
mod reader;
mod writer;

pub use crate::check::check_class;
pub use crate::classfile::{ClassFile, ClassMember, CodeSummary};
pub use crate::constant_pool::{ConstantPool, CpInfo};
pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
pub use crate::descriptor::{BaseType, FieldType, MethodDescriptor, ReturnType};
pub use crate::error::{Error, Result};
pub use crate::writer::{ClassWriter, ConstantPoolBuilder, MethodCode};
