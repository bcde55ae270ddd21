use std::collections::HashSet;

use jdecor_classfile::ClassFile;

use crate::{Error, Result, TypeReader};

/// Internal name of the universal root type.
pub const OBJECT: &str = "java/lang/Object";

/// Collect the classes and interfaces contributing members to a decorator of
/// `root`, in the order their members must be considered.
///
/// The walk is depth-first (the type itself, then its super-class chain,
/// then its declared interfaces in declaration order) and duplicate-free
/// with first-seen order winning, so the most-derived declaration of a
/// method is always encountered first. When the root is an interface,
/// `java/lang/Object` is appended last so the decorator still forwards the
/// universal methods.
pub fn walk(reader: &dyn TypeReader, root: &ClassFile) -> Result<Vec<ClassFile>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    fill(reader, root.clone(), &mut seen, &mut out)?;
    if root.is_interface() && !seen.contains(OBJECT) {
        out.push(read(reader, OBJECT)?);
    }
    Ok(out)
}

fn fill(
    reader: &dyn TypeReader,
    class: ClassFile,
    seen: &mut HashSet<String>,
    out: &mut Vec<ClassFile>,
) -> Result<()> {
    if !seen.insert(class.this_class.clone()) {
        return Ok(());
    }
    tracing::debug!(target: "jdecor.gen", class = %class.this_class, "reading hierarchy class");

    // An interface's classfile-level super class is always java/lang/Object;
    // only real super classes take part in the walk.
    let super_class = if class.is_interface() {
        None
    } else {
        class.super_class.clone()
    };
    let interfaces = class.interfaces.clone();
    out.push(class);

    if let Some(super_class) = super_class {
        if !seen.contains(&super_class) {
            let parsed = read(reader, &super_class)?;
            fill(reader, parsed, seen, out)?;
        }
    }
    for interface in interfaces {
        if !seen.contains(&interface) {
            let parsed = read(reader, &interface)?;
            fill(reader, parsed, seen, out)?;
        }
    }
    Ok(())
}

fn read(reader: &dyn TypeReader, name: &str) -> Result<ClassFile> {
    reader.read_class(name).map_err(|source| Error::UnresolvedType {
        name: name.to_string(),
        source,
    })
}
