//! Built-in descriptions of the JDK types the generator meets in practice.
//!
//! Hierarchy walks always terminate at `java/lang/Object`, and wrapped types
//! routinely implement marker or single-method JDK interfaces. Modeling
//! those few types here keeps the tool usable against a bare classpath;
//! anything else from the JDK must be provided as a classpath entry.

use jdecor_classfile::access::{
    ACC_ABSTRACT, ACC_FINAL, ACC_INTERFACE, ACC_NATIVE, ACC_PROTECTED, ACC_PUBLIC, ACC_SUPER,
};
use jdecor_classfile::{ClassFile, ClassMember, ConstantPool};

pub fn minimal_jdk_class(internal_name: &str) -> Option<ClassFile> {
    match internal_name {
        "java/lang/Object" => Some(object()),
        "java/io/Serializable" => Some(marker_interface("java/io/Serializable")),
        "java/lang/Cloneable" => Some(marker_interface("java/lang/Cloneable")),
        "java/lang/Comparable" => Some(interface(
            "java/lang/Comparable",
            &[],
            vec![abstract_method("compareTo", "(Ljava/lang/Object;)I")],
        )),
        "java/lang/Runnable" => Some(interface(
            "java/lang/Runnable",
            &[],
            vec![abstract_method("run", "()V")],
        )),
        "java/lang/Iterable" => Some(interface(
            "java/lang/Iterable",
            &[],
            vec![abstract_method("iterator", "()Ljava/util/Iterator;")],
        )),
        "java/lang/AutoCloseable" => Some(interface(
            "java/lang/AutoCloseable",
            &[],
            vec![abstract_method_throws("close", "()V", "java/lang/Exception")],
        )),
        "java/io/Closeable" => Some(interface(
            "java/io/Closeable",
            &["java/lang/AutoCloseable"],
            vec![abstract_method_throws("close", "()V", "java/io/IOException")],
        )),
        _ => None,
    }
}

fn object() -> ClassFile {
    let methods = vec![
        method(ACC_PUBLIC, "<init>", "()V"),
        method(ACC_PUBLIC | ACC_FINAL | ACC_NATIVE, "getClass", "()Ljava/lang/Class;"),
        method(ACC_PUBLIC | ACC_NATIVE, "hashCode", "()I"),
        method(ACC_PUBLIC, "equals", "(Ljava/lang/Object;)Z"),
        method(ACC_PROTECTED | ACC_NATIVE, "clone", "()Ljava/lang/Object;"),
        method(ACC_PUBLIC, "toString", "()Ljava/lang/String;"),
        method(ACC_PUBLIC | ACC_FINAL | ACC_NATIVE, "notify", "()V"),
        method(ACC_PUBLIC | ACC_FINAL | ACC_NATIVE, "notifyAll", "()V"),
        method(ACC_PUBLIC | ACC_FINAL, "wait", "()V"),
        method(ACC_PUBLIC | ACC_FINAL | ACC_NATIVE, "wait", "(J)V"),
        method(ACC_PUBLIC | ACC_FINAL, "wait", "(JI)V"),
        method(ACC_PROTECTED, "finalize", "()V"),
    ];
    ClassFile {
        minor_version: 0,
        major_version: 52,
        access_flags: ACC_PUBLIC | ACC_SUPER,
        this_class: "java/lang/Object".to_string(),
        super_class: None,
        interfaces: Vec::new(),
        fields: Vec::new(),
        methods,
        attributes: Vec::new(),
        constant_pool: ConstantPool::default(),
    }
}

fn marker_interface(name: &str) -> ClassFile {
    interface(name, &[], Vec::new())
}

fn interface(name: &str, extends: &[&str], methods: Vec<ClassMember>) -> ClassFile {
    ClassFile {
        minor_version: 0,
        major_version: 52,
        access_flags: ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT,
        this_class: name.to_string(),
        super_class: Some("java/lang/Object".to_string()),
        interfaces: extends.iter().map(|s| s.to_string()).collect(),
        fields: Vec::new(),
        methods,
        attributes: Vec::new(),
        constant_pool: ConstantPool::default(),
    }
}

fn method(access_flags: u16, name: &str, descriptor: &str) -> ClassMember {
    ClassMember {
        access_flags,
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        ..ClassMember::default()
    }
}

fn abstract_method(name: &str, descriptor: &str) -> ClassMember {
    method(ACC_PUBLIC | ACC_ABSTRACT, name, descriptor)
}

fn abstract_method_throws(name: &str, descriptor: &str, exception: &str) -> ClassMember {
    ClassMember {
        exceptions: vec![exception.to_string()],
        ..abstract_method(name, descriptor)
    }
}
