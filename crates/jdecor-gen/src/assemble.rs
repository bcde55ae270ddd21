use jdecor_classfile::access::{ACC_FINAL, ACC_PRIVATE, ACC_PUBLIC};
use jdecor_classfile::{ClassFile, ClassWriter};

use crate::diag::{DiagnosticsSink, SkipReason, SkippedMember};
use crate::emit::{constructor_body, constructor_descriptor, delegation_body, Dispatch};
use crate::hierarchy::OBJECT;
use crate::policy::{classify, effective_access, Action, GenerationState};
use crate::{Error, Result, DELEGATE_FIELD};

/// Build the plain (template-less) decorator.
///
/// Streams every member of every hierarchy class through the policy and
/// forwards the accepted ones to the emitter. The caller owns the hierarchy
/// ordering contract; this function owns the artifact and the generation
/// state for exactly one run.
pub fn assemble_plain(
    hierarchy: &[ClassFile],
    wrapped: &ClassFile,
    decorator: &str,
    diags: &mut DiagnosticsSink,
) -> Result<Vec<u8>> {
    let wrapped_name = wrapped.this_class.as_str();
    let wrapped_is_interface = wrapped.is_interface();
    let dispatch = if wrapped_is_interface {
        Dispatch::Interface
    } else {
        Dispatch::Virtual
    };

    let mut writer = ClassWriter::new(wrapped.major_version, wrapped.minor_version);

    let super_class = if wrapped_is_interface { OBJECT } else { wrapped_name };
    let interfaces: Vec<String> = if wrapped_is_interface {
        vec![wrapped_name.to_string()]
    } else {
        Vec::new()
    };
    writer.set_header(ACC_PUBLIC, decorator, super_class, &interfaces)?;
    writer.add_field(
        ACC_PRIVATE | ACC_FINAL,
        DELEGATE_FIELD,
        &format!("L{wrapped_name};"),
    )?;

    let mut state = GenerationState::default();
    for class in hierarchy {
        state.visiting = class.this_class.clone();
        for member in &class.methods {
            match classify(member, &mut state) {
                Action::RouteConstructor => {
                    tracing::debug!(target: "jdecor.gen", "creating decorator constructor");
                    let body = constructor_body(
                        writer.pool_mut(),
                        decorator,
                        wrapped_name,
                        wrapped_is_interface,
                    )?;
                    writer.add_method(
                        effective_access(member.access_flags),
                        &member.name,
                        &constructor_descriptor(wrapped_name),
                        Some(&body),
                        None,
                        &[],
                    )?;
                }
                Action::Generate => {
                    tracing::debug!(
                        target: "jdecor.gen",
                        method = %member.name,
                        descriptor = %member.descriptor,
                        "creating delegation method"
                    );
                    let descriptor = jdecor_classfile::parse_method_descriptor(&member.descriptor)
                        .map_err(|source| Error::MalformedSignature {
                            owner: class.this_class.clone(),
                            name: member.name.clone(),
                            descriptor: member.descriptor.clone(),
                            source,
                        })?;
                    let body = delegation_body(
                        writer.pool_mut(),
                        decorator,
                        wrapped_name,
                        dispatch,
                        &member.name,
                        &descriptor,
                    )?;
                    writer.add_method(
                        effective_access(member.access_flags),
                        &member.name,
                        &member.descriptor,
                        Some(&body),
                        member.signature.as_deref(),
                        &member.exceptions,
                    )?;
                }
                action => {
                    let Some(reason) = SkipReason::from_action(action) else {
                        continue;
                    };
                    if reason == SkipReason::Final {
                        tracing::warn!(
                            target: "jdecor.gen",
                            class = %class.this_class,
                            method = %member.name,
                            descriptor = %member.descriptor,
                            "ignored final method"
                        );
                    }
                    diags.record(SkippedMember {
                        owner: class.this_class.clone(),
                        name: member.name.clone(),
                        descriptor: member.descriptor.clone(),
                        reason,
                    });
                }
            }
        }
    }

    Ok(writer.into_bytes()?)
}
