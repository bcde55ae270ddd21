use crate::assemble::assemble_plain;
use crate::diag::DiagnosticsSink;
use crate::hierarchy::walk;
use crate::merge::merge_template;
use crate::{Error, Result, TypeReader, Verifier};

/// Drives one generation run: hierarchy walk, plain assembly, optional
/// template merge, structural verification.
///
/// A generator is configured once and produces one artifact per
/// [`DecoratorGenerator::generate`] call; all run state lives inside the
/// call.
pub struct DecoratorGenerator<'a> {
    reader: &'a dyn TypeReader,
    verifier: &'a dyn Verifier,
    wrapped: String,
    decorator: String,
    template: Option<String>,
}

impl<'a> DecoratorGenerator<'a> {
    /// Generator for a plain decorator named `decorator`. Names may be given
    /// in either dotted or internal form.
    pub fn plain(
        reader: &'a dyn TypeReader,
        verifier: &'a dyn Verifier,
        wrapped: &str,
        decorator: &str,
    ) -> Self {
        Self {
            reader,
            verifier,
            wrapped: internal_name(wrapped),
            decorator: internal_name(decorator),
            template: None,
        }
    }

    /// Generator for a decorator built over a template class. The decorator
    /// takes the template's name.
    pub fn with_template(
        reader: &'a dyn TypeReader,
        verifier: &'a dyn Verifier,
        wrapped: &str,
        template: &str,
    ) -> Self {
        Self {
            reader,
            verifier,
            wrapped: internal_name(wrapped),
            decorator: internal_name(template),
            template: Some(internal_name(template)),
        }
    }

    pub fn decorator_name(&self) -> &str {
        &self.decorator
    }

    /// Run the generation to completion and hand back the artifact bytes.
    ///
    /// The artifact is only returned once it passes the structural check;
    /// every failure before that point aborts the run with no output.
    pub fn generate(&self, diags: &mut DiagnosticsSink) -> Result<Vec<u8>> {
        match &self.template {
            None => tracing::info!(
                target: "jdecor.gen",
                wrapped = %self.wrapped,
                decorator = %self.decorator,
                "generating plain decorator"
            ),
            Some(template) => tracing::info!(
                target: "jdecor.gen",
                wrapped = %self.wrapped,
                template = %template,
                "generating decorator from template"
            ),
        }

        let wrapped = self
            .reader
            .read_class(&self.wrapped)
            .map_err(|source| Error::UnresolvedType {
                name: self.wrapped.clone(),
                source,
            })?;

        let hierarchy = walk(self.reader, &wrapped)?;
        let plain = assemble_plain(&hierarchy, &wrapped, &self.decorator, diags)?;

        let bytes = match &self.template {
            None => plain,
            Some(template) => {
                let template_bytes = self.reader.read_bytes(template).map_err(|source| {
                    Error::UnresolvedType {
                        name: template.clone(),
                        source,
                    }
                })?;
                merge_template(&template_bytes, &plain, &wrapped)?
            }
        };

        tracing::debug!(target: "jdecor.gen", "checking class structure");
        let diagnostics = self.verifier.verify(&bytes);
        if !diagnostics.is_empty() {
            return Err(Error::InvalidArtifact(diagnostics));
        }

        Ok(bytes)
    }
}

fn internal_name(name: &str) -> String {
    name.replace('.', "/")
}
