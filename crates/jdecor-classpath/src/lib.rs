//! Classpath resolution for the decorator generator.
//!
//! Maps JVM internal names to classfile bytes from class directories and
//! jars, with a built-in minimal JDK so the universal root type and a
//! handful of ubiquitous interfaces resolve without a JDK on disk.

#![forbid(unsafe_code)]

mod jdk;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use jdecor_classfile::ClassFile;
use jdecor_gen::{TypeReadError, TypeReader};

pub use crate::jdk::minimal_jdk_class;

#[derive(Debug, Error)]
pub enum ClasspathError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("classfile error: {0}")]
    ClassFile(#[from] jdecor_classfile::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClasspathEntry {
    ClassDir(PathBuf),
    Jar(PathBuf),
}

impl ClasspathEntry {
    /// Classify a user-supplied path: `.jar`/`.zip` files are archives,
    /// everything else is treated as a class directory.
    pub fn from_path(path: PathBuf) -> Self {
        let is_archive = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"));
        if is_archive {
            ClasspathEntry::Jar(path)
        } else {
            ClasspathEntry::ClassDir(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ClasspathEntry::ClassDir(p) | ClasspathEntry::Jar(p) => p,
        }
    }

    fn class_bytes(&self, internal_name: &str) -> Result<Option<Vec<u8>>, ClasspathError> {
        let relative = format!("{internal_name}.class");
        match self {
            ClasspathEntry::ClassDir(dir) => {
                let path = dir.join(&relative);
                match std::fs::read(&path) {
                    Ok(bytes) => Ok(Some(bytes)),
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(err) => Err(err.into()),
                }
            }
            ClasspathEntry::Jar(path) => {
                let file = File::open(path)?;
                let mut archive = zip::ZipArchive::new(file)?;
                let mut entry = match archive.by_name(&relative) {
                    Ok(entry) => entry,
                    Err(zip::result::ZipError::FileNotFound) => return Ok(None),
                    Err(err) => return Err(err.into()),
                };
                let mut bytes = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut bytes)?;
                Ok(Some(bytes))
            }
        }
    }
}

/// An ordered list of classpath entries; the first entry containing a class
/// wins.
#[derive(Debug, Default)]
pub struct Classpath {
    entries: Vec<ClasspathEntry>,
}

impl Classpath {
    pub fn new(entries: Vec<ClasspathEntry>) -> Self {
        Self { entries }
    }

    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self::new(paths.into_iter().map(ClasspathEntry::from_path).collect())
    }

    pub fn class_bytes(&self, internal_name: &str) -> Result<Option<Vec<u8>>, ClasspathError> {
        for entry in &self.entries {
            if let Some(bytes) = entry.class_bytes(internal_name)? {
                tracing::debug!(
                    target: "jdecor.classpath",
                    class = internal_name,
                    entry = %entry.path().display(),
                    "resolved class"
                );
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }

    pub fn contains_class(&self, internal_name: &str) -> Result<bool, ClasspathError> {
        Ok(self.class_bytes(internal_name)?.is_some())
    }
}

fn read_error(name: &str, err: ClasspathError) -> TypeReadError {
    match err {
        ClasspathError::Io(source) => TypeReadError::Io {
            name: name.to_string(),
            source,
        },
        ClasspathError::Zip(err) => TypeReadError::Io {
            name: name.to_string(),
            source: std::io::Error::other(err),
        },
        ClasspathError::ClassFile(err) => TypeReadError::ClassFile(err),
    }
}

impl TypeReader for Classpath {
    fn read_class(&self, internal_name: &str) -> Result<ClassFile, TypeReadError> {
        match self.class_bytes(internal_name) {
            Ok(Some(bytes)) => Ok(ClassFile::parse(&bytes)?),
            Ok(None) => match minimal_jdk_class(internal_name) {
                Some(class) => {
                    tracing::debug!(
                        target: "jdecor.classpath",
                        class = internal_name,
                        "resolved class from built-in minimal JDK"
                    );
                    Ok(class)
                }
                None => Err(TypeReadError::NotFound(internal_name.to_string())),
            },
            Err(err) => Err(read_error(internal_name, err)),
        }
    }

    fn read_bytes(&self, internal_name: &str) -> Result<Vec<u8>, TypeReadError> {
        match self.class_bytes(internal_name) {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(TypeReadError::NotFound(internal_name.to_string())),
            Err(err) => Err(read_error(internal_name, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jdecor_classfile::access::{ACC_ABSTRACT, ACC_INTERFACE, ACC_PUBLIC};
    use jdecor_classfile::ClassWriter;

    fn greeter_bytes() -> Vec<u8> {
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
            .add_method(ACC_PUBLIC | ACC_ABSTRACT, "greet", "()Ljava/lang/String;", None, None, &[])
            .unwrap();
        writer.into_bytes().unwrap()
    }

    #[test]
    fn resolves_from_class_directory() {
        let dir = tempfile::tempdir().unwrap();
        let class_dir = dir.path().join("com/example");
        std::fs::create_dir_all(&class_dir).unwrap();
        std::fs::write(class_dir.join("Greeter.class"), greeter_bytes()).unwrap();

        let classpath = Classpath::from_paths([dir.path().to_path_buf()]);
        assert!(classpath.contains_class("com/example/Greeter").unwrap());
        let class = classpath.read_class("com/example/Greeter").unwrap();
        assert_eq!(class.this_class, "com/example/Greeter");
        assert!(!classpath.contains_class("com/example/Missing").unwrap());
    }

    #[test]
    fn resolves_from_jar() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let jar_path = dir.path().join("greeter.jar");
        let file = File::create(&jar_path).unwrap();
        let mut jar = zip::ZipWriter::new(file);
        jar.start_file("com/example/Greeter.class", zip::write::FileOptions::default())
            .unwrap();
        jar.write_all(&greeter_bytes()).unwrap();
        jar.finish().unwrap();

        let classpath = Classpath::from_paths([jar_path]);
        let class = classpath.read_class("com/example/Greeter").unwrap();
        assert_eq!(class.this_class, "com/example/Greeter");
    }

    #[test]
    fn falls_back_to_minimal_jdk() {
        let classpath = Classpath::default();
        let object = classpath.read_class("java/lang/Object").unwrap();
        assert_eq!(object.this_class, "java/lang/Object");
        assert!(object.super_class.is_none());
        // Bytes are never synthesized for built-in types.
        assert!(matches!(
            classpath.read_bytes("java/lang/Object"),
            Err(TypeReadError::NotFound(_))
        ));
    }

    #[test]
    fn first_entry_wins() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        for dir in [&dir_a, &dir_b] {
            let class_dir = dir.path().join("com/example");
            std::fs::create_dir_all(&class_dir).unwrap();
            std::fs::write(class_dir.join("Greeter.class"), greeter_bytes()).unwrap();
        }
        let classpath =
            Classpath::from_paths([dir_a.path().to_path_buf(), dir_b.path().to_path_buf()]);
        assert!(classpath.contains_class("com/example/Greeter").unwrap());
    }
}
