use std::sync::atomic::Ordering;

use boost_multidex::{load_direct_dex, make_opt_dex_file, recover_action};

use crate::test_ctx::{
    NullRuntime, STUB_COOKIE, STUB_OPEN_COUNT, STUB_RAW_OPEN_COUNT, scratch_file, stub_context,
};

const DEX_MAGIC: &[u8] = b"dex\n035\0";

pub unsafe fn scenario_direct_load_from_bytes() {
    let context = stub_context(false);
    let mut runtime = NullRuntime::default();
    let bytes = DEX_MAGIC.to_vec();

    let before = STUB_OPEN_COUNT.load(Ordering::Relaxed);
    let cookie = load_direct_dex(&mut runtime, &context, None, Some(&bytes));
    assert_eq!(cookie, Some(STUB_COOKIE));
    assert_eq!(STUB_OPEN_COUNT.load(Ordering::Relaxed), before + 1);
    assert_eq!(runtime.result_paths, vec![None]);
}

pub unsafe fn scenario_direct_load_from_path() {
    let context = stub_context(false);
    let mut runtime = NullRuntime::default();
    let path = scratch_file("classes2.dex", DEX_MAGIC);
    let path = path.to_str().expect("utf8 path").to_string();

    let cookie = load_direct_dex(&mut runtime, &context, Some(&path), None);
    assert_eq!(cookie, Some(STUB_COOKIE));
    assert_eq!(runtime.result_paths, vec![Some(path)]);

    // 映射失败只返回 None，不影响后续加载
    let missing = format!("{}.absent", runtime.result_paths[0].as_deref().unwrap_or(""));
    assert_eq!(load_direct_dex(&mut runtime, &context, Some(&missing), None), None);
    let bytes = DEX_MAGIC.to_vec();
    assert_eq!(
        load_direct_dex(&mut runtime, &context, None, Some(&bytes)),
        Some(STUB_COOKIE)
    );
}

pub unsafe fn scenario_direct_load_missing_input() {
    let context = stub_context(false);
    let mut runtime = NullRuntime::default();
    let before = STUB_OPEN_COUNT.load(Ordering::Relaxed);
    assert_eq!(load_direct_dex(&mut runtime, &context, None, None), None);
    assert_eq!(STUB_OPEN_COUNT.load(Ordering::Relaxed), before);
    assert!(runtime.result_paths.is_empty());
}

pub unsafe fn scenario_opt_dex_file() {
    let without_symbol = stub_context(false);
    assert!(!make_opt_dex_file(&without_symbol, "/data/local/tmp/a.dex", "/data/local/tmp/a.odex"));

    let context = stub_context(true);
    let before = STUB_RAW_OPEN_COUNT.load(Ordering::Relaxed);
    assert!(make_opt_dex_file(&context, "/data/local/tmp/a.dex", "/data/local/tmp/a.odex"));
    assert!(!make_opt_dex_file(&context, "/data/local/tmp/a.zip", "/data/local/tmp/a.odex"));
    assert_eq!(STUB_RAW_OPEN_COUNT.load(Ordering::Relaxed), before + 2);
}

pub unsafe fn scenario_recover_idempotent() {
    recover_action();
    recover_action();
    let context = stub_context(false);
    let mut runtime = NullRuntime::default();
    let bytes = DEX_MAGIC.to_vec();
    assert_eq!(
        load_direct_dex(&mut runtime, &context, None, Some(&bytes)),
        Some(STUB_COOKIE)
    );
}
