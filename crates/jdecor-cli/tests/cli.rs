use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

use jdecor_classfile::access::{
    ACC_ABSTRACT, ACC_FINAL, ACC_INTERFACE, ACC_PRIVATE, ACC_PUBLIC, ACC_SUPER,
};
use jdecor_classfile::opcodes::IRETURN;
use jdecor_classfile::{ClassFile, ClassWriter, MethodCode};
use jdecor_gen::constructor_body;

const ICONST_5: u8 = 0x08;

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
    writer
        .add_method(ACC_PUBLIC | ACC_ABSTRACT, "getCount", "()I", None, None, &[])
        .unwrap();
    writer.into_bytes().unwrap()
}

fn template_bytes() -> Vec<u8> {
    let mut writer = ClassWriter::new(52, 0);
    writer
        .set_header(
            ACC_PUBLIC | ACC_SUPER,
            "com/example/CountingGreeter",
            "java/lang/Object",
            &[],
        )
        .unwrap();
    writer
        .add_field(ACC_PRIVATE | ACC_FINAL, "wrapped", "Lcom/example/Greeter;")
        .unwrap();
    let ctor = constructor_body(
        writer.pool_mut(),
        "com/example/CountingGreeter",
        "com/example/Greeter",
        true,
    )
    .unwrap();
    writer
        .add_method(ACC_PUBLIC, "<init>", "(Lcom/example/Greeter;)V", Some(&ctor), None, &[])
        .unwrap();
    let body = MethodCode {
        code: vec![ICONST_5, IRETURN],
        max_stack: 1,
        max_locals: 1,
    };
    writer
        .add_method(ACC_PUBLIC, "getCount", "()I", Some(&body), None, &[])
        .unwrap();
    writer.into_bytes().unwrap()
}

fn write_class(root: &Path, internal_name: &str, bytes: &[u8]) {
    let path = root.join(format!("{internal_name}.class"));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn jdecor() -> Command {
    Command::cargo_bin("jdecor").unwrap()
}

#[test]
fn generates_plain_decorator_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_class(dir.path(), "com/example/Greeter", &greeter_bytes());
    let output = dir.path().join("GreeterDecorator.class");

    jdecor()
        .arg("com.example.Greeter")
        .arg("com.example.GreeterDecorator")
        .arg(&output)
        .arg("--classpath")
        .arg(dir.path())
        .assert()
        .success();

    let class = ClassFile::parse(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(class.this_class, "com/example/GreeterDecorator");
    assert_eq!(class.interfaces, vec!["com/example/Greeter".to_string()]);
    assert!(class.methods.iter().any(|m| m.name == "greet"));
    assert_eq!(class.methods.iter().filter(|m| m.name == "<init>").count(), 1);
}

#[test]
fn second_positional_resolving_on_classpath_is_a_template() {
    let dir = tempfile::tempdir().unwrap();
    write_class(dir.path(), "com/example/Greeter", &greeter_bytes());
    write_class(dir.path(), "com/example/CountingGreeter", &template_bytes());
    let output = dir.path().join("CountingGreeter.generated.class");

    jdecor()
        .arg("com.example.Greeter")
        .arg("com.example.CountingGreeter")
        .arg(&output)
        .arg("--classpath")
        .arg(dir.path())
        .assert()
        .success();

    let class = ClassFile::parse(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(class.this_class, "com/example/CountingGreeter");
    // template body wins, the rest still delegates
    let get_count = class.methods.iter().find(|m| m.name == "getCount").unwrap();
    assert_eq!(get_count.code.as_ref().unwrap().code, vec![ICONST_5, IRETURN]);
    assert!(class.methods.iter().any(|m| m.name == "greet"));
}

#[test]
fn json_report_lists_skipped_members() {
    let dir = tempfile::tempdir().unwrap();
    write_class(dir.path(), "com/example/Greeter", &greeter_bytes());
    let output = dir.path().join("GreeterDecorator.class");

    jdecor()
        .arg("com.example.Greeter")
        .arg("com.example.GreeterDecorator")
        .arg(&output)
        .arg("--classpath")
        .arg(dir.path())
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"decorator\": \"com/example/GreeterDecorator\""))
        .stdout(predicate::str::contains("\"skipped\""));
}

#[test]
fn unresolvable_wrapped_class_fails_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.class");

    jdecor()
        .arg("com.example.Missing")
        .arg("com.example.MissingDecorator")
        .arg(&output)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unable to resolve type"));

    assert!(!output.exists());
}
