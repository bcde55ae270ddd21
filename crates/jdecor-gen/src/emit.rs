use jdecor_classfile::opcodes::{
    ALOAD, ALOAD_0, ARETURN, DLOAD, DLOAD_0, DRETURN, FLOAD, FLOAD_0, FRETURN, GETFIELD,
    ILOAD, ILOAD_0, INVOKEINTERFACE, INVOKESPECIAL, INVOKEVIRTUAL, IRETURN, LLOAD, LLOAD_0,
    LRETURN, PUTFIELD, RETURN,
};
use jdecor_classfile::{
    BaseType, ConstantPoolBuilder, FieldType, MethodCode, MethodDescriptor, ReturnType,
};

use crate::hierarchy::OBJECT;
use crate::policy::CONSTRUCTOR_NAME;
use crate::{Result, DELEGATE_FIELD};

/// How the delegate is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// `invokevirtual`: the wrapped type is a class.
    Virtual,
    /// `invokeinterface`: the wrapped type is an interface.
    Interface,
}

fn field_descriptor(internal_name: &str) -> String {
    format!("L{internal_name};")
}

/// Body of a delegating method: load `this.wrapped`, replay the arguments,
/// invoke the member on the delegate, return its result unchanged.
///
/// Pure except for constant interning: the shape of the code depends only on
/// `(name, descriptor, dispatch)`. The stack high-water mark and local count
/// both come out as the running local index plus one.
pub fn delegation_body(
    pool: &mut ConstantPoolBuilder,
    decorator: &str,
    wrapped: &str,
    dispatch: Dispatch,
    name: &str,
    descriptor: &MethodDescriptor,
) -> Result<MethodCode> {
    let mut code = Vec::new();

    push_load(&mut code, LoadKind::Reference, 0); // this
    let field = pool.field_ref(decorator, DELEGATE_FIELD, &field_descriptor(wrapped))?;
    code.push(GETFIELD);
    code.extend_from_slice(&field.to_be_bytes());

    let mut index: u16 = 0;
    for param in &descriptor.params {
        index += 1;
        push_load(&mut code, LoadKind::of(param), index);
        if param.slot_width() == 2 {
            index += 1;
        }
    }

    let raw_descriptor = descriptor.descriptor();
    match dispatch {
        Dispatch::Virtual => {
            let method = pool.method_ref(wrapped, name, &raw_descriptor)?;
            code.push(INVOKEVIRTUAL);
            code.extend_from_slice(&method.to_be_bytes());
        }
        Dispatch::Interface => {
            let method = pool.interface_method_ref(wrapped, name, &raw_descriptor)?;
            code.push(INVOKEINTERFACE);
            code.extend_from_slice(&method.to_be_bytes());
            // count operand: receiver plus argument slots
            code.push((index + 1) as u8);
            code.push(0);
        }
    }

    code.push(return_op(&descriptor.return_type));

    Ok(MethodCode {
        code,
        max_stack: index + 1,
        max_locals: index + 1,
    })
}

/// Body of the generated constructor: super-call, then store the single
/// argument into the delegate field. Exactly two stack slots and two locals.
pub fn constructor_body(
    pool: &mut ConstantPoolBuilder,
    decorator: &str,
    wrapped: &str,
    wrapped_is_interface: bool,
) -> Result<MethodCode> {
    let super_class = if wrapped_is_interface { OBJECT } else { wrapped };

    let mut code = Vec::new();
    push_load(&mut code, LoadKind::Reference, 0);
    let super_init = pool.method_ref(super_class, CONSTRUCTOR_NAME, "()V")?;
    code.push(INVOKESPECIAL);
    code.extend_from_slice(&super_init.to_be_bytes());

    push_load(&mut code, LoadKind::Reference, 0);
    push_load(&mut code, LoadKind::Reference, 1);
    let field = pool.field_ref(decorator, DELEGATE_FIELD, &field_descriptor(wrapped))?;
    code.push(PUTFIELD);
    code.extend_from_slice(&field.to_be_bytes());

    code.push(RETURN);

    Ok(MethodCode {
        code,
        max_stack: 2,
        max_locals: 2,
    })
}

/// Descriptor of the generated constructor for a given wrapped type.
pub fn constructor_descriptor(wrapped: &str) -> String {
    format!("({})V", field_descriptor(wrapped))
}

enum LoadKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl LoadKind {
    fn of(param: &FieldType) -> Self {
        match param {
            FieldType::Base(BaseType::Long) => LoadKind::Long,
            FieldType::Base(BaseType::Float) => LoadKind::Float,
            FieldType::Base(BaseType::Double) => LoadKind::Double,
            FieldType::Base(_) => LoadKind::Int,
            FieldType::Object(_) | FieldType::Array(_) => LoadKind::Reference,
        }
    }

    fn ops(&self) -> (u8, u8) {
        match self {
            LoadKind::Int => (ILOAD, ILOAD_0),
            LoadKind::Long => (LLOAD, LLOAD_0),
            LoadKind::Float => (FLOAD, FLOAD_0),
            LoadKind::Double => (DLOAD, DLOAD_0),
            LoadKind::Reference => (ALOAD, ALOAD_0),
        }
    }
}

fn push_load(code: &mut Vec<u8>, kind: LoadKind, index: u16) {
    let (op, op_0) = kind.ops();
    if index <= 3 {
        code.push(op_0 + index as u8);
    } else {
        // Parameter slots top out at 255, so the one-byte form always fits.
        code.push(op);
        code.push(index as u8);
    }
}

fn return_op(return_type: &ReturnType) -> u8 {
    match return_type {
        ReturnType::Void => RETURN,
        ReturnType::Type(ty) => match ty {
            FieldType::Base(BaseType::Long) => LRETURN,
            FieldType::Base(BaseType::Float) => FRETURN,
            FieldType::Base(BaseType::Double) => DRETURN,
            FieldType::Base(_) => IRETURN,
            FieldType::Object(_) | FieldType::Array(_) => ARETURN,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jdecor_classfile::parse_method_descriptor;
    use pretty_assertions::assert_eq;

    #[test]
    fn constructor_shape() {
        let mut pool = ConstantPoolBuilder::new();
        let body = constructor_body(&mut pool, "com/x/Decorator", "com/x/Iface", true).unwrap();
        assert_eq!(body.max_stack, 2);
        assert_eq!(body.max_locals, 2);
        assert_eq!(body.code[0], ALOAD_0);
        assert_eq!(body.code[1], INVOKESPECIAL);
        assert_eq!(body.code[4], ALOAD_0);
        assert_eq!(body.code[5], ALOAD_0 + 1);
        assert_eq!(body.code[6], PUTFIELD);
        assert_eq!(*body.code.last().unwrap(), RETURN);
    }

    #[test]
    fn interface_dispatch_counts_argument_slots() {
        let mut pool = ConstantPoolBuilder::new();
        let descriptor = parse_method_descriptor("(Ljava/lang/String;J)I").unwrap();
        let body = delegation_body(
            &mut pool,
            "com/x/Decorator",
            "com/x/Iface",
            Dispatch::Interface,
            "m",
            &descriptor,
        )
        .unwrap();
        // this + String + J(2) = 4 slots used, sizing is last index + 1
        assert_eq!(body.max_stack, 4);
        assert_eq!(body.max_locals, 4);
        let invoke = body
            .code
            .iter()
            .position(|&op| op == INVOKEINTERFACE)
            .expect("invokeinterface emitted");
        assert_eq!(body.code[invoke + 3], 4); // receiver + 3 argument slots
        assert_eq!(body.code[invoke + 4], 0);
        assert_eq!(*body.code.last().unwrap(), IRETURN);
    }

    #[test]
    fn virtual_dispatch_and_wide_loads() {
        let mut pool = ConstantPoolBuilder::new();
        let descriptor = parse_method_descriptor("(DD)D").unwrap();
        let body = delegation_body(
            &mut pool,
            "com/x/Decorator",
            "com/x/Wrapped",
            Dispatch::Virtual,
            "add",
            &descriptor,
        )
        .unwrap();
        assert_eq!(body.max_stack, 5);
        assert_eq!(body.max_locals, 5);
        assert!(body.code.contains(&INVOKEVIRTUAL));
        assert!(!body.code.contains(&INVOKEINTERFACE));
        assert_eq!(body.code[4], DLOAD_0 + 1); // dload_1
        // second double lands at slot 3
        assert_eq!(body.code[5], DLOAD_0 + 3);
        assert_eq!(*body.code.last().unwrap(), DRETURN);
    }

    #[test]
    fn deep_parameter_lists_use_indexed_loads() {
        let mut pool = ConstantPoolBuilder::new();
        let descriptor = parse_method_descriptor("(IIIII)V").unwrap();
        let body = delegation_body(
            &mut pool,
            "com/x/Decorator",
            "com/x/Wrapped",
            Dispatch::Virtual,
            "m",
            &descriptor,
        )
        .unwrap();
        // slots 1..=3 short form, slots 4 and 5 indexed
        assert!(body.code.windows(2).any(|w| w == [ILOAD, 4]));
        assert!(body.code.windows(2).any(|w| w == [ILOAD, 5]));
        assert_eq!(body.max_locals, 6);
    }

    #[test]
    fn void_return_on_no_arg_method() {
        let mut pool = ConstantPoolBuilder::new();
        let descriptor = parse_method_descriptor("()V").unwrap();
        let body = delegation_body(
            &mut pool,
            "com/x/Decorator",
            "com/x/Iface",
            Dispatch::Interface,
            "doAction",
            &descriptor,
        )
        .unwrap();
        assert_eq!(body.max_stack, 1);
        assert_eq!(body.max_locals, 1);
        assert_eq!(*body.code.last().unwrap(), RETURN);
    }
}
