//! Cross-cutting properties of the whole VM: round-trip encoding,
//! determinism, isolation, and the exit taxonomy.

use wvm::{
    codes, ErrorCategory, InstantiateMode, Value, Vm,
};

fn compile(source: &str) -> Vec<u8> {
    wat::parse_str(source).unwrap()
}

#[test]
fn decode_encode_round_trip() {
    for source in [
        "(module)",
        r#"(module
            (type (func (param i32 i32) (result i32)))
            (import "env" "mul" (func (type 0)))
            (func (type 0) local.get 0 local.get 1 i32.add)
            (export "add" (func 1)))"#,
        r#"(module
            (memory 1 16)
            (table 4 8 funcref)
            (global (mut f64) (f64.const 2.5))
            (global i64 (i64.const -1))
            (func $f (param i64) (result i64)
                (local f32 f32 i64)
                local.get 0
                (if (result i64) (i64.eqz (local.get 0))
                    (then (i64.const 1))
                    (else (local.get 0)))
                i64.add)
            (elem (i32.const 1) $f)
            (data (i32.const 16) "rodata\ff\00"))"#,
        r#"(module
            (func (result f64)
                (block (result f64)
                    (loop (br_if 0 (i32.const 0)))
                    f64.const nan:0x8000000000001)
                f64.const -0.0
                f64.min))"#,
    ] {
        let bytes = compile(source);
        let module = wvm::load(&bytes).unwrap();
        assert_eq!(
            wvm::encode_module(&module),
            bytes,
            "round trip failed for {source}"
        );
    }
}

#[test]
fn round_trip_preserves_interleaved_custom_sections() {
    // header, custom "a", type section, custom "b", function+code, custom "c"
    let mut bytes = Vec::from(&b"\0asm\x01\0\0\0"[..]);
    bytes.extend([0x00, 0x02, 0x01, b'a']);
    bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
    bytes.extend([0x00, 0x02, 0x01, b'b']);
    bytes.extend([0x03, 0x02, 0x01, 0x00]);
    bytes.extend([0x0A, 0x04, 0x01, 0x02, 0x00, 0x0B]);
    bytes.extend([0x00, 0x03, 0x01, b'c', 0x07]);
    let module = wvm::load(&bytes).unwrap();
    assert_eq!(module.custom_sections.len(), 3);
    assert_eq!(wvm::encode_module(&module), bytes);
}

#[test]
fn invocation_is_deterministic() {
    let bytes = compile(
        r#"(module
            (func (export "churn") (param f32) (result f32)
                local.get 0
                f32.sqrt
                (f32.div (f32.const 0) (f32.const 0))
                f32.min
                (f32.mul (f32.const 3.0e+38))
                (f32.add (f32.const 1.5))))"#,
    );
    let module = wvm::load(&bytes).unwrap();

    let run = || {
        let mut vm = Vm::default();
        vm.instantiate(&module, "m", InstantiateMode::Instantiate)
            .unwrap();
        vm.invoke("m", "churn", &[Value::F32(wvm::FloatBits32::from_float(-4.0))])
            .unwrap()
    };
    let first = run();
    let second = run();
    // Bit-identical, including the canonical NaN from 0/0 and
    // sqrt(-4).
    assert_eq!(first, second);
    assert_eq!(first[0], Value::F32(wvm::FloatBits32::NAN));
}

#[test]
fn failed_instantiation_is_isolated() {
    let mut vm = Vm::default();
    let good = wvm::load(&compile(
        r#"(module (func (export "f") (result i32) (i32.const 3)))"#,
    ))
    .unwrap();
    vm.instantiate(&good, "good", InstantiateMode::Instantiate)
        .unwrap();

    let bad = wvm::load(&compile(
        r#"(module
            (memory 1)
            (data (i32.const 70000) "x")
            (func (export "f")))"#,
    ))
    .unwrap();
    let err = vm
        .instantiate(&bad, "bad", InstantiateMode::Instantiate)
        .unwrap_err();
    assert_eq!(err.code, codes::DATA_SEGMENT_OUT_OF_BOUNDS);

    // The failed name resolves to nothing; the good module still runs.
    assert!(vm.store.find_module("bad").is_none());
    assert_eq!(
        vm.invoke("good", "f", &[]).unwrap(),
        [Value::I32(3)]
    );
}

#[test]
fn user_modules_can_link_to_each_other() {
    let mut vm = Vm::default();
    let library = wvm::load(&compile(
        r#"(module
            (func (export "three") (result i32) (i32.const 3)))"#,
    ))
    .unwrap();
    vm.instantiate(&library, "lib", InstantiateMode::Instantiate)
        .unwrap();

    let client = wvm::load(&compile(
        r#"(module
            (import "lib" "three" (func $three (result i32)))
            (func (export "nine") (result i32)
                (i32.mul (call $three) (call $three))))"#,
    ))
    .unwrap();
    vm.instantiate(&client, "client", InstantiateMode::Instantiate)
        .unwrap();
    assert_eq!(
        vm.invoke("client", "nine", &[]).unwrap(),
        [Value::I32(9)]
    );
}

#[test]
fn invoke_rejects_wrong_arguments() {
    let mut vm = Vm::default();
    let module = wvm::load(&compile(
        r#"(module (func (export "id") (param i32) (result i32) (local.get 0)))"#,
    ))
    .unwrap();
    vm.instantiate(&module, "m", InstantiateMode::Instantiate)
        .unwrap();

    let err = vm.invoke("m", "id", &[]).unwrap_err();
    assert_eq!(err.code, codes::INVALID_ARGUMENTS);
    let err = vm.invoke("m", "id", &[Value::I64(1)]).unwrap_err();
    assert_eq!(err.code, codes::INVALID_ARGUMENTS);
    let err = vm.invoke("m", "missing", &[Value::I32(1)]).unwrap_err();
    assert_eq!(err.code, codes::EXPORT_NOT_FOUND);
    let err = vm.invoke("ghost", "id", &[Value::I32(1)]).unwrap_err();
    assert_eq!(err.code, codes::MODULE_NOT_FOUND);
}

#[test]
fn exit_taxonomy_buckets() {
    // Decode failure.
    let err = wvm::load(b"\0asm").unwrap_err();
    assert_eq!(err.category.exit_code(), 1);

    // Validation failure: add on an empty stack.
    let bytes = compile(r#"(module (func))"#);
    let mut module = wvm::load(&bytes).unwrap();
    module.code[0].instructions.insert(0, wvm::Instruction::I32Add);
    let err = wvm::validate_module(&module).unwrap_err();
    assert_eq!(err.category.exit_code(), 2);

    // Link failure.
    let mut vm = Vm::default();
    let importer = wvm::load(&compile(
        r#"(module (import "nope" "f" (func)))"#,
    ))
    .unwrap();
    let err = vm
        .instantiate(&importer, "m", InstantiateMode::Instantiate)
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::Link);
    assert_eq!(err.category.exit_code(), 3);

    // Trap.
    let trapping = wvm::load(&compile(
        r#"(module (func (export "t") unreachable))"#,
    ))
    .unwrap();
    vm.instantiate(&trapping, "t", InstantiateMode::Instantiate)
        .unwrap();
    let err = vm.invoke("t", "t", &[]).unwrap_err();
    assert!(err.is_trap());
    assert_eq!(err.category.exit_code(), 5);
}

#[test]
fn sign_extension_and_saturating_ops() {
    let mut vm = Vm::default();
    let module = wvm::load(&compile(
        r#"(module
            (func (export "ext8") (param i32) (result i32)
                local.get 0
                i32.extend8_s)
            (func (export "sat") (param f32) (result i32)
                local.get 0
                i32.trunc_sat_f32_s))"#,
    ))
    .unwrap();
    vm.instantiate(&module, "m", InstantiateMode::Instantiate)
        .unwrap();
    assert_eq!(
        vm.invoke("m", "ext8", &[Value::I32(0x80)]).unwrap(),
        [Value::I32(-128)]
    );
    assert_eq!(
        vm.invoke(
            "m",
            "sat",
            &[Value::F32(wvm::FloatBits32::from_float(f32::NAN))]
        )
        .unwrap(),
        [Value::I32(0)]
    );
    assert_eq!(
        vm.invoke(
            "m",
            "sat",
            &[Value::F32(wvm::FloatBits32::from_float(1e30))]
        )
        .unwrap(),
        [Value::I32(i32::MAX)]
    );
}
