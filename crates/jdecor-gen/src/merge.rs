use std::collections::HashSet;

use jdecor_classfile::access::{ACC_FINAL, ACC_PRIVATE, ACC_PUBLIC};
use jdecor_classfile::{ClassFile, ClassWriter, ConstantPoolBuilder};

use crate::emit::{constructor_body, delegation_body, Dispatch};
use crate::hierarchy::OBJECT;
use crate::policy::CONSTRUCTOR_NAME;
use crate::{Error, Result, DELEGATE_FIELD};

/// Overlay an authored template over the plain generated decorator.
///
/// Two sequential folds. The first copies the template verbatim (its
/// constant pool seeds the output pool so raw member bytes stay valid) and
/// records every `(name, descriptor)` it contributes. The second walks the
/// plain artifact and fills in only the members the template did not supply,
/// so template-authored bodies always win over generated delegation.
pub fn merge_template(
    template_bytes: &[u8],
    plain_bytes: &[u8],
    wrapped: &ClassFile,
) -> Result<Vec<u8>> {
    let template = ClassFile::parse(template_bytes)?;
    let plain = ClassFile::parse(plain_bytes)?;

    let pool = ConstantPoolBuilder::from_pool(&template.constant_pool)?;
    let mut writer = ClassWriter::with_pool(pool, template.major_version, template.minor_version);

    // Header: the template's, with access normalized to public and the
    // wrapped interface joined to the template's declared interfaces.
    let mut interfaces: Vec<String> = Vec::new();
    if wrapped.is_interface() {
        interfaces.push(wrapped.this_class.clone());
    }
    for interface in &template.interfaces {
        if !interfaces.contains(interface) {
            interfaces.push(interface.clone());
        }
    }
    let super_class = template.super_class.as_deref().unwrap_or(OBJECT);
    writer.set_header(ACC_PUBLIC, &template.this_class, super_class, &interfaces)?;
    writer.set_raw_attributes(template.attributes.clone());

    // Pass 1: the template. The delegate field is dropped here and emitted
    // fresh in pass 2.
    let mut present: HashSet<(String, String)> = HashSet::new();
    let mut template_has_constructor = false;
    for field in &template.fields {
        if field.name == DELEGATE_FIELD {
            continue;
        }
        writer.add_raw_field(&field.raw);
    }
    for method in &template.methods {
        if method.name == CONSTRUCTOR_NAME {
            template_has_constructor = true;
        }
        tracing::debug!(
            target: "jdecor.gen",
            method = %method.name,
            descriptor = %method.descriptor,
            "copying template method"
        );
        present.insert((method.name.clone(), method.descriptor.clone()));
        writer.add_raw_method(&method.raw);
    }

    // Pass 2: the plain artifact. Its members are deterministic emitter
    // output, so replaying them through the merged pool reproduces them
    // exactly; only the pool indices differ from the plain bytes.
    let wrapped_name = wrapped.this_class.as_str();
    let dispatch = if wrapped.is_interface() {
        Dispatch::Interface
    } else {
        Dispatch::Virtual
    };
    writer.add_field(
        ACC_PRIVATE | ACC_FINAL,
        DELEGATE_FIELD,
        &format!("L{wrapped_name};"),
    )?;
    for method in &plain.methods {
        if present.contains(&(method.name.clone(), method.descriptor.clone())) {
            continue;
        }
        if method.name == CONSTRUCTOR_NAME && template_has_constructor {
            continue;
        }
        let body = if method.name == CONSTRUCTOR_NAME {
            constructor_body(
                writer.pool_mut(),
                &template.this_class,
                wrapped_name,
                wrapped.is_interface(),
            )?
        } else {
            let descriptor = jdecor_classfile::parse_method_descriptor(&method.descriptor)
                .map_err(|source| Error::MalformedSignature {
                    owner: plain.this_class.clone(),
                    name: method.name.clone(),
                    descriptor: method.descriptor.clone(),
                    source,
                })?;
            delegation_body(
                writer.pool_mut(),
                &template.this_class,
                wrapped_name,
                dispatch,
                &method.name,
                &descriptor,
            )?
        };
        writer.add_method(
            method.access_flags,
            &method.name,
            &method.descriptor,
            Some(&body),
            method.signature.as_deref(),
            &method.exceptions,
        )?;
    }

    Ok(writer.into_bytes()?)
}
