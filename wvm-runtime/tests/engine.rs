//! End-to-end engine tests: decode + validate with wvm-decoder, then
//! instantiate and invoke.

use wvm_error::codes;
use wvm_format::Module;
use wvm_math::FloatBits32;
use wvm_runtime::{
    EngineConfig, FunctionInstance, InstantiateMode, Interpreter, ModuleInstance, Store,
};
use wvm_types::{ExternKind, FuncType, GlobalType, Limits, MemoryType, Mutability, Value, ValueType};

fn load(source: &str) -> Module {
    let bytes = wat::parse_str(source).unwrap();
    wvm_decoder::load(&bytes).unwrap()
}

fn setup(source: &str, name: &str) -> (Interpreter, Store) {
    let module = load(source);
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let mut store = Store::new();
    interpreter
        .instantiate(&mut store, &module, name, InstantiateMode::Instantiate)
        .unwrap();
    (interpreter, store)
}

#[test]
fn add_two_numbers() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (func (export "add") (param i32 i32) (result i32)
                local.get 0
                local.get 1
                i32.add))"#,
        "adder",
    );
    let results = interpreter
        .invoke(&mut store, "adder", "add", &[Value::I32(2), Value::I32(3)])
        .unwrap();
    assert_eq!(results, [Value::I32(5)]);
}

#[test]
fn data_segment_and_memory_bounds() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (memory 1)
            (data (i32.const 65530) "hello\00")
            (func (export "load8") (param i32) (result i32)
                local.get 0
                i32.load8_u))"#,
        "mem",
    );
    // Last in-bounds byte is the NUL terminator.
    let results = interpreter
        .invoke(&mut store, "mem", "load8", &[Value::I32(65535)])
        .unwrap();
    assert_eq!(results, [Value::I32(0)]);
    // The 'o' just before it.
    let results = interpreter
        .invoke(&mut store, "mem", "load8", &[Value::I32(65534)])
        .unwrap();
    assert_eq!(results, [Value::I32(i32::from(b'o'))]);
    // One past the end traps.
    let err = interpreter
        .invoke(&mut store, "mem", "load8", &[Value::I32(65536)])
        .unwrap_err();
    assert_eq!(err.code, codes::OUT_OF_BOUNDS_MEMORY_ACCESS);
    // The trap left the instance usable.
    let results = interpreter
        .invoke(&mut store, "mem", "load8", &[Value::I32(65530)])
        .unwrap();
    assert_eq!(results, [Value::I32(i32::from(b'h'))]);
}

#[test]
fn div_s_overflow_traps() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (func (export "div") (param i32 i32) (result i32)
                local.get 0
                local.get 1
                i32.div_s))"#,
        "math",
    );
    let err = interpreter
        .invoke(
            &mut store,
            "math",
            "div",
            &[Value::I32(i32::MIN), Value::I32(-1)],
        )
        .unwrap_err();
    assert_eq!(err.code, codes::INTEGER_OVERFLOW);
    let err = interpreter
        .invoke(&mut store, "math", "div", &[Value::I32(1), Value::I32(0)])
        .unwrap_err();
    assert_eq!(err.code, codes::INTEGER_DIVIDE_BY_ZERO);
}

#[test]
fn convert_u32_rounds_up() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (func (export "cvt") (param i32) (result f32)
                local.get 0
                f32.convert_i32_u))"#,
        "cvt",
    );
    let results = interpreter
        .invoke(&mut store, "cvt", "cvt", &[Value::I32(-1)])
        .unwrap();
    assert_eq!(
        results,
        [Value::F32(FloatBits32::from_float(4_294_967_296.0))]
    );
}

#[test]
fn module_name_conflict_keeps_first_module() {
    let source = r#"(module
        (func (export "one") (result i32) (i32.const 1)))"#;
    let (mut interpreter, mut store) = setup(source, "A");

    let err = interpreter
        .instantiate(&mut store, &load(source), "A", InstantiateMode::Instantiate)
        .unwrap_err();
    assert_eq!(err.code, codes::MODULE_NAME_CONFLICT);

    let results = interpreter.invoke(&mut store, "A", "one", &[]).unwrap();
    assert_eq!(results, [Value::I32(1)]);
}

#[test]
fn trapping_start_function_is_not_registered() {
    let module = load(
        r#"(module
            (func $boom unreachable)
            (start $boom))"#,
    );
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let mut store = Store::new();
    let err = interpreter
        .instantiate(&mut store, &module, "boom", InstantiateMode::Instantiate)
        .unwrap_err();
    assert_eq!(err.code, codes::TRAP_UNREACHABLE);
    assert!(store.find_module("boom").is_none());
}

#[test]
fn start_function_runs_before_first_invoke() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (memory 1)
            (func $init (i32.store8 (i32.const 0) (i32.const 42)))
            (start $init)
            (func (export "peek") (result i32) (i32.load8_u (i32.const 0))))"#,
        "init",
    );
    let results = interpreter.invoke(&mut store, "init", "peek", &[]).unwrap();
    assert_eq!(results, [Value::I32(42)]);
}

#[test]
fn loops_and_branches() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (func (export "sum_to") (param i32) (result i32)
                (local i32)
                (block $exit
                    (loop $top
                        local.get 0
                        i32.eqz
                        br_if $exit
                        (local.set 1 (i32.add (local.get 1) (local.get 0)))
                        (local.set 0 (i32.sub (local.get 0) (i32.const 1)))
                        br $top))
                local.get 1))"#,
        "loops",
    );
    let results = interpreter
        .invoke(&mut store, "loops", "sum_to", &[Value::I32(10)])
        .unwrap();
    assert_eq!(results, [Value::I32(55)]);
}

#[test]
fn select_and_drop() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (func (export "pick") (param i32 i64 i64) (result i64)
                local.get 1
                local.get 2
                local.get 0
                select)
            (func (export "second") (param i32 i32) (result i32)
                local.get 0
                local.get 1
                drop))"#,
        "par",
    );
    let results = interpreter
        .invoke(
            &mut store,
            "par",
            "pick",
            &[Value::I32(1), Value::I64(10), Value::I64(20)],
        )
        .unwrap();
    assert_eq!(results, [Value::I64(10)]);
    let results = interpreter
        .invoke(
            &mut store,
            "par",
            "pick",
            &[Value::I32(0), Value::I64(10), Value::I64(20)],
        )
        .unwrap();
    assert_eq!(results, [Value::I64(20)]);
    let results = interpreter
        .invoke(
            &mut store,
            "par",
            "second",
            &[Value::I32(8), Value::I32(9)],
        )
        .unwrap();
    assert_eq!(results, [Value::I32(8)]);
}

#[test]
fn br_table_dispatch() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (func (export "classify") (param i32) (result i32)
                (block $default
                    (block $one
                        (block $zero
                            local.get 0
                            br_table $zero $one $default)
                        (return (i32.const 100)))
                    (return (i32.const 200)))
                i32.const 300))"#,
        "table",
    );
    for (arg, expected) in [(0, 100), (1, 200), (2, 300), (9, 300)] {
        let results = interpreter
            .invoke(&mut store, "table", "classify", &[Value::I32(arg)])
            .unwrap();
        assert_eq!(results, [Value::I32(expected)], "arg {arg}");
    }
}

#[test]
fn call_indirect_through_table() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (type $binop (func (param i32 i32) (result i32)))
            (table 3 funcref)
            (elem (i32.const 0) $add $sub)
            (func $add (type $binop) (i32.add (local.get 0) (local.get 1)))
            (func $sub (type $binop) (i32.sub (local.get 0) (local.get 1)))
            (func $other (param i64) (result i64) (local.get 0))
            (func (export "dispatch") (param i32 i32 i32) (result i32)
                local.get 1
                local.get 2
                local.get 0
                call_indirect (type $binop)))"#,
        "indirect",
    );
    let results = interpreter
        .invoke(
            &mut store,
            "indirect",
            "dispatch",
            &[Value::I32(0), Value::I32(7), Value::I32(5)],
        )
        .unwrap();
    assert_eq!(results, [Value::I32(12)]);
    let results = interpreter
        .invoke(
            &mut store,
            "indirect",
            "dispatch",
            &[Value::I32(1), Value::I32(7), Value::I32(5)],
        )
        .unwrap();
    assert_eq!(results, [Value::I32(2)]);
    // Slot 2 was never filled.
    let err = interpreter
        .invoke(
            &mut store,
            "indirect",
            "dispatch",
            &[Value::I32(2), Value::I32(0), Value::I32(0)],
        )
        .unwrap_err();
    assert_eq!(err.code, codes::UNINITIALIZED_ELEMENT);
    // Out of table bounds.
    let err = interpreter
        .invoke(
            &mut store,
            "indirect",
            "dispatch",
            &[Value::I32(3), Value::I32(0), Value::I32(0)],
        )
        .unwrap_err();
    assert_eq!(err.code, codes::OUT_OF_BOUNDS_TABLE_ACCESS);
}

#[test]
fn call_indirect_type_mismatch() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (type $binop (func (param i32 i32) (result i32)))
            (table 1 funcref)
            (elem (i32.const 0) $id64)
            (func $id64 (param i64) (result i64) (local.get 0))
            (func (export "dispatch") (param i32 i32) (result i32)
                local.get 0
                local.get 1
                i32.const 0
                call_indirect (type $binop)))"#,
        "badsig",
    );
    let err = interpreter
        .invoke(
            &mut store,
            "badsig",
            "dispatch",
            &[Value::I32(1), Value::I32(2)],
        )
        .unwrap_err();
    assert_eq!(err.code, codes::INDIRECT_CALL_TYPE_MISMATCH);
}

#[test]
fn memory_grow_and_size() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (memory 1 3)
            (func (export "grow") (param i32) (result i32)
                local.get 0
                memory.grow)
            (func (export "size") (result i32) memory.size))"#,
        "grow",
    );
    let size = |interp: &mut Interpreter, store: &mut Store| {
        interp.invoke(store, "grow", "size", &[]).unwrap()[0]
    };
    assert_eq!(size(&mut interpreter, &mut store), Value::I32(1));
    let results = interpreter
        .invoke(&mut store, "grow", "grow", &[Value::I32(1)])
        .unwrap();
    assert_eq!(results, [Value::I32(1)]);
    assert_eq!(size(&mut interpreter, &mut store), Value::I32(2));
    // Past the declared maximum: -1, size unchanged.
    let results = interpreter
        .invoke(&mut store, "grow", "grow", &[Value::I32(5)])
        .unwrap();
    assert_eq!(results, [Value::I32(-1)]);
    assert_eq!(size(&mut interpreter, &mut store), Value::I32(2));
}

#[test]
fn unbounded_recursion_exhausts_call_stack() {
    let (mut interpreter, mut store) = setup(
        r#"(module
            (func $spin (export "spin") (call $spin)))"#,
        "rec",
    );
    let err = interpreter.invoke(&mut store, "rec", "spin", &[]).unwrap_err();
    assert_eq!(err.code, codes::CALL_STACK_EXHAUSTED);
    // The engine unwound fully; the instance still works.
    let err = interpreter.invoke(&mut store, "rec", "spin", &[]).unwrap_err();
    assert_eq!(err.code, codes::CALL_STACK_EXHAUSTED);
}

/// A host module exporting one function, one global, and one memory.
fn register_host_module(store: &mut Store) {
    let mut instance = ModuleInstance::new("env");

    let double_ty = FuncType::new(vec![ValueType::I32], vec![ValueType::I32]);
    let func_addr = store.alloc_function(FunctionInstance::host(
        double_ty,
        Box::new(|args| {
            let value = args[0].as_i32().unwrap_or(0);
            Ok(vec![Value::I32(value * 2)])
        }),
    ));
    instance.add_func(func_addr);
    instance
        .add_export(
            "double",
            wvm_runtime::ExportTarget {
                kind: ExternKind::Func,
                index: 0,
            },
        )
        .unwrap();

    let global_addr = store.alloc_global(
        GlobalType {
            value_type: ValueType::I32,
            mutability: Mutability::Const,
        },
        Value::I32(40),
    );
    instance.add_global(global_addr);
    instance
        .add_export(
            "base",
            wvm_runtime::ExportTarget {
                kind: ExternKind::Global,
                index: 0,
            },
        )
        .unwrap();

    let memory = wvm_runtime::MemoryInstance::new(
        MemoryType {
            limits: Limits::bounded(2, 4),
        },
        wvm_runtime::MAX_PAGES,
    )
    .unwrap();
    let mem_addr = store.alloc_memory(memory);
    instance.add_memory(mem_addr);
    instance
        .add_export(
            "memory",
            wvm_runtime::ExportTarget {
                kind: ExternKind::Memory,
                index: 0,
            },
        )
        .unwrap();

    store.import_module(instance);
}

#[test]
fn host_functions_and_imported_globals() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let mut store = Store::new();
    register_host_module(&mut store);

    let module = load(
        r#"(module
            (import "env" "double" (func $double (param i32) (result i32)))
            (import "env" "base" (global $base i32))
            (global $answer i32 (global.get $base))
            (func (export "run") (result i32)
                global.get $answer
                call $double))"#,
    );
    interpreter
        .instantiate(&mut store, &module, "user", InstantiateMode::Instantiate)
        .unwrap();
    let results = interpreter.invoke(&mut store, "user", "run", &[]).unwrap();
    assert_eq!(results, [Value::I32(80)]);
}

#[test]
fn import_limit_subtyping() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let mut store = Store::new();
    register_host_module(&mut store);

    // Exporter has (2, 4): an import asking for at least 1 page links.
    let compatible = load(
        r#"(module
            (import "env" "memory" (memory 1)))"#,
    );
    interpreter
        .instantiate(&mut store, &compatible, "ok", InstantiateMode::Instantiate)
        .unwrap();

    // An import demanding max 3 does not: the exporter may grow to 4.
    let incompatible = load(
        r#"(module
            (import "env" "memory" (memory 1 3)))"#,
    );
    let err = interpreter
        .instantiate(
            &mut store,
            &incompatible,
            "bad",
            InstantiateMode::Instantiate,
        )
        .unwrap_err();
    assert_eq!(err.code, codes::INCOMPATIBLE_IMPORT_TYPE);
    assert!(store.find_module("bad").is_none());

    // Unknown field name.
    let unknown = load(
        r#"(module
            (import "env" "missing" (func (param i32) (result i32))))"#,
    );
    let err = interpreter
        .instantiate(&mut store, &unknown, "bad2", InstantiateMode::Instantiate)
        .unwrap_err();
    assert_eq!(err.code, codes::UNKNOWN_IMPORT);
}

#[test]
fn reset_drops_user_modules_only() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let mut store = Store::new();
    register_host_module(&mut store);

    let module = load(r#"(module (func (export "f") (result i32) (i32.const 9)))"#);
    interpreter
        .instantiate(&mut store, &module, "user", InstantiateMode::Instantiate)
        .unwrap();
    assert!(store.find_module("user").is_some());

    store.reset();
    assert!(store.find_module("user").is_none());
    assert!(store.find_module("env").is_some());

    // The name is free again after reset.
    interpreter
        .instantiate(&mut store, &module, "user", InstantiateMode::Instantiate)
        .unwrap();
    let results = interpreter.invoke(&mut store, "user", "f", &[]).unwrap();
    assert_eq!(results, [Value::I32(9)]);
}

#[test]
fn import_mode_survives_reset() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let mut store = Store::new();

    let module = load(r#"(module (func (export "f") (result i32) (i32.const 4)))"#);
    interpreter
        .instantiate(&mut store, &module, "lib", InstantiateMode::Import)
        .unwrap();
    store.reset();
    let results = interpreter.invoke(&mut store, "lib", "f", &[]).unwrap();
    assert_eq!(results, [Value::I32(4)]);
}

#[test]
fn element_segment_out_of_bounds_rolls_back() {
    let module = load(
        r#"(module
            (table 1 funcref)
            (func $f)
            (elem (i32.const 1) $f))"#,
    );
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let mut store = Store::new();
    let err = interpreter
        .instantiate(&mut store, &module, "oob", InstantiateMode::Instantiate)
        .unwrap_err();
    assert_eq!(err.code, codes::ELEMENT_SEGMENT_OUT_OF_BOUNDS);
    assert!(store.find_module("oob").is_none());
}

#[test]
fn data_segment_out_of_bounds_rolls_back() {
    let module = load(
        r#"(module
            (memory 1)
            (data (i32.const 65535) "ab"))"#,
    );
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let mut store = Store::new();
    let err = interpreter
        .instantiate(&mut store, &module, "oob", InstantiateMode::Instantiate)
        .unwrap_err();
    assert_eq!(err.code, codes::DATA_SEGMENT_OUT_OF_BOUNDS);
    assert!(store.find_module("oob").is_none());
}

#[test]
fn compiled_ctor_runs_with_proxies() {
    use core::sync::atomic::{AtomicI32, Ordering};
    static GROW_RESULT: AtomicI32 = AtomicI32::new(i32::MIN);

    fn ctor(ctx: &mut dyn wvm_format::CtorContext) -> wvm_error::Result<()> {
        // Memory address 0 belongs to this module's own memory.
        GROW_RESULT.store(ctx.memory_grow(0, 1), Ordering::SeqCst);
        assert_eq!(ctx.memory_size(0), 2);
        Ok(())
    }

    let mut module = load(r#"(module (memory 1 4))"#);
    module.ctor = Some(ctor);

    let mut interpreter = Interpreter::new(EngineConfig {
        interpret_mode: wvm_runtime::InterpretMode::CompiledIfPresent,
        ..EngineConfig::default()
    });
    let mut store = Store::new();
    interpreter
        .instantiate(&mut store, &module, "aot", InstantiateMode::Instantiate)
        .unwrap();
    assert_eq!(GROW_RESULT.load(Ordering::SeqCst), 1);

    // In pure mode the same module's ctor is ignored.
    GROW_RESULT.store(i32::MIN, Ordering::SeqCst);
    let mut pure = Interpreter::new(EngineConfig::default());
    let mut store2 = Store::new();
    pure.instantiate(&mut store2, &module, "aot", InstantiateMode::Instantiate)
        .unwrap();
    assert_eq!(GROW_RESULT.load(Ordering::SeqCst), i32::MIN);
}

#[test]
fn host_trap_unwinds() {
    let mut interpreter = Interpreter::new(EngineConfig::default());
    let mut store = Store::new();

    let mut instance = ModuleInstance::new("env");
    let ty = FuncType::new(vec![], vec![]);
    let func_addr = store.alloc_function(FunctionInstance::host(
        ty,
        Box::new(|_| Err(wvm_error::kinds::host_trap())),
    ));
    instance.add_func(func_addr);
    instance
        .add_export(
            "boom",
            wvm_runtime::ExportTarget {
                kind: ExternKind::Func,
                index: 0,
            },
        )
        .unwrap();
    store.import_module(instance);

    let module = load(
        r#"(module
            (import "env" "boom" (func $boom))
            (func (export "go") (call $boom)))"#,
    );
    interpreter
        .instantiate(&mut store, &module, "user", InstantiateMode::Instantiate)
        .unwrap();
    let err = interpreter.invoke(&mut store, "user", "go", &[]).unwrap_err();
    assert_eq!(err.code, codes::HOST_TRAP);
}
