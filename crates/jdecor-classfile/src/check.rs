use crate::access::{ACC_ABSTRACT, ACC_NATIVE};
use crate::classfile::{ClassFile, ClassMember};
use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};

/// Structural check over finished classfile bytes.
///
/// Returns human-readable diagnostics, one finding per line; an empty string
/// means the artifact is structurally valid. The check never repairs
/// anything — callers treat a non-empty result as fatal.
pub fn check_class(bytes: &[u8]) -> String {
    let class = match ClassFile::parse(bytes) {
        Ok(class) => class,
        Err(err) => return format!("unparsable classfile: {err}"),
    };

    let mut findings = Vec::new();

    if class.this_class.is_empty() {
        findings.push("empty class name".to_string());
    }
    if class.super_class.is_none() && class.this_class != "java/lang/Object" {
        findings.push(format!("class {} has no super class", class.this_class));
    }

    for field in &class.fields {
        if let Err(err) = parse_field_descriptor(&field.descriptor) {
            findings.push(format!("field {}: {err}", field.name));
        }
    }

    for method in &class.methods {
        check_method(method, &mut findings);
    }

    findings.join("\n")
}

fn check_method(method: &ClassMember, findings: &mut Vec<String>) {
    let descriptor = match parse_method_descriptor(&method.descriptor) {
        Ok(descriptor) => descriptor,
        Err(err) => {
            findings.push(format!("method {}: {err}", method.name));
            return;
        }
    };

    let abstract_or_native = method.access_flags & (ACC_ABSTRACT | ACC_NATIVE) != 0;
    match &method.code {
        None if !abstract_or_native => findings.push(format!(
            "method {}{} has no Code attribute",
            method.name, method.descriptor
        )),
        Some(_) if abstract_or_native => findings.push(format!(
            "abstract or native method {}{} carries a Code attribute",
            method.name, method.descriptor
        )),
        Some(code) => {
            if code.code.is_empty() {
                findings.push(format!("method {}{} has empty code", method.name, method.descriptor));
            }
            // `this` occupies slot 0 of instance methods.
            let is_static = method.access_flags & crate::access::ACC_STATIC != 0;
            let min_locals = descriptor.param_slots() + u16::from(!is_static);
            if code.max_locals < min_locals {
                findings.push(format!(
                    "method {}{} declares {} locals but its parameters need {}",
                    method.name, method.descriptor, code.max_locals, min_locals
                ));
            }
        }
        None => {}
    }
}
