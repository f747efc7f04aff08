use super::{detect_vendor_quirk, find_native_method, resolve};
use crate::android::signal_guard;
use crate::android::system_props::fake::FakeProperties;
use crate::config::ResolverConfig;
use crate::errno::Errno;
use crate::runtime::fake::{FakeLibrary, FakeRuntime, fake_open_dex_file_bytes, fake_raw_dex_open};
use crate::runtime::profile::{EntryPoint, VendorQuirk};
use crate::test_support::guard_lock;
use jni::sys::JNINativeMethod;
use std::ffi::{CStr, c_void};
use std::ptr;

unsafe extern "C" fn other_native(_args: *const usize, _result: *mut u64) {}

fn entry(name: &'static CStr, signature: &'static CStr, fn_ptr: *mut c_void) -> JNINativeMethod {
    JNINativeMethod {
        name: name.as_ptr() as *mut _,
        signature: signature.as_ptr() as *mut _,
        fnPtr: fn_ptr,
    }
}

fn terminator() -> JNINativeMethod {
    JNINativeMethod {
        name: ptr::null_mut(),
        signature: ptr::null_mut(),
        fnPtr: ptr::null_mut(),
    }
}

// Dalvik 4.x 中 dvm_dalvik_system_DexFile 的条目顺序
fn dalvik_table() -> Vec<JNINativeMethod> {
    vec![
        entry(
            c"openDexFileNative",
            c"(Ljava/lang/String;Ljava/lang/String;I)I",
            other_native as *mut c_void,
        ),
        entry(c"openDexFile", c"([B)I", fake_open_dex_file_bytes as *mut c_void),
        entry(c"closeDexFile", c"(I)V", other_native as *mut c_void),
        terminator(),
    ]
}

fn library_with_table(table: &[JNINativeMethod]) -> FakeLibrary {
    FakeLibrary::default()
        .with_symbol(c"dvm_dalvik_system_DexFile", table.as_ptr() as usize)
        .with_symbol(
            c"_Z17dvmRawDexFileOpenPKcS0_PP10RawDexFileb",
            fake_raw_dex_open as *const () as usize,
        )
}

fn config(sdk: i32) -> ResolverConfig {
    let mut config = ResolverConfig::for_sdk(sdk);
    config.yunos_marker_path = std::env::temp_dir().join("boost_multidex_no_yunos_marker");
    config
}

#[test]
fn native_table_scan_finds_byte_array_overload() {
    let table = dalvik_table();
    let found = unsafe { find_native_method(table.as_ptr(), c"openDexFile", c"([B)I") };
    assert_eq!(found.map(|f| f as *const () as usize), Some(fake_open_dex_file_bytes as *const () as usize));
}

#[test]
fn native_table_scan_matches_name_prefix() {
    // 只比较目标名称长度，名称更长但签名相同的条目排在前面时会被选中
    let table = vec![
        entry(c"openDexFileBytes", c"([B)I", other_native as *mut c_void),
        entry(c"openDexFile", c"([B)I", fake_open_dex_file_bytes as *mut c_void),
        terminator(),
    ];
    let found = unsafe { find_native_method(table.as_ptr(), c"openDexFile", c"([B)I") };
    assert_eq!(found.map(|f| f as *const () as usize), Some(other_native as *const () as usize));
}

#[test]
fn native_table_scan_without_match_returns_none() {
    let table = vec![
        entry(c"closeDexFile", c"(I)V", other_native as *mut c_void),
        terminator(),
    ];
    assert!(unsafe { find_native_method(table.as_ptr(), c"openDexFile", c"([B)I") }.is_none());
}

#[test]
fn vendor_quirk_matches_brand_or_manufacturer_case_insensitive() {
    let brand = FakeProperties::with(&[("ro.product.brand", "HTC_Europe")]);
    assert_eq!(detect_vendor_quirk(&brand, "htc"), VendorQuirk::Htc);

    let manufacturer = FakeProperties::with(&[
        ("ro.product.brand", "google"),
        ("ro.product.manufacturer", "htc"),
    ]);
    assert_eq!(detect_vendor_quirk(&manufacturer, "htc"), VendorQuirk::Htc);

    let other = FakeProperties::with(&[
        ("ro.product.brand", "samsung"),
        ("ro.product.manufacturer", "not-htc"),
    ]);
    assert_eq!(detect_vendor_quirk(&other, "htc"), VendorQuirk::None);
    assert_eq!(detect_vendor_quirk(&brand, ""), VendorQuirk::None);
}

#[test]
fn legacy_sdk_with_public_method_selects_legacy_entry() {
    let _lock = guard_lock();
    let table = dalvik_table();
    let library = library_with_table(&table);
    let mut runtime = FakeRuntime {
        legacy_available: true,
        ..FakeRuntime::default()
    };

    let context = resolve(&mut runtime, &config(16), Some(&library), &FakeProperties::default())
        .expect("resolve");

    assert!(matches!(context.profile().entry_point, EntryPoint::LegacyMethod));
    assert_eq!(context.profile().vendor_quirk, VendorQuirk::None);
    assert!(context.profile().raw_dex_open.is_some());
    assert!(context.bindings().legacy_open);
    assert!(!runtime.called("bind_dex_wrapper"));
    assert!(signal_guard::is_installed());
    signal_guard::uninstall();
}

#[test]
fn legacy_sdk_without_public_method_falls_back_to_private_symbol() {
    let _lock = guard_lock();
    let table = dalvik_table();
    let library = library_with_table(&table);
    let mut runtime = FakeRuntime::default();

    let context = resolve(&mut runtime, &config(18), Some(&library), &FakeProperties::default())
        .expect("resolve");

    match context.profile().entry_point {
        EntryPoint::PrivateSymbol(open) => {
            assert_eq!(open as *const () as usize, fake_open_dex_file_bytes as *const () as usize)
        }
        other => panic!("unexpected entry point {other:?}"),
    }
    signal_guard::uninstall();
}

#[test]
fn kitkat_selects_constructor_and_detects_vendor() {
    let _lock = guard_lock();
    let table = dalvik_table();
    let library = library_with_table(&table);
    let mut runtime = FakeRuntime::default();
    let props = FakeProperties::with(&[("ro.product.brand", "htc")]);

    let context = resolve(&mut runtime, &config(19), Some(&library), &props).expect("resolve");

    assert!(matches!(
        context.profile().entry_point,
        EntryPoint::NewConstructor(_)
    ));
    assert_eq!(context.profile().vendor_quirk, VendorQuirk::Htc);
    assert!(context.bindings().dex_wrapper);
    assert!(!runtime.called("bind_legacy_open"));
    signal_guard::uninstall();
}

#[test]
fn missing_runtime_library_is_fatal() {
    let _lock = guard_lock();
    let mut runtime = FakeRuntime::default();
    let result = resolve::<_, FakeLibrary, _>(
        &mut runtime,
        &config(16),
        None,
        &FakeProperties::default(),
    );
    assert_eq!(result.err(), Some(Errno::RuntimeNotFound));
    assert!(runtime.called("bind_result_type"));
    assert!(!signal_guard::is_installed());
}

#[test]
fn result_type_failure_stops_before_library() {
    let _lock = guard_lock();
    let mut runtime = FakeRuntime {
        fail_result_type: true,
        ..FakeRuntime::default()
    };
    let result = resolve::<_, FakeLibrary, _>(
        &mut runtime,
        &config(16),
        None,
        &FakeProperties::default(),
    );
    assert_eq!(result.err(), Some(Errno::PendingException));
}

#[test]
fn missing_native_table_is_fatal() {
    let _lock = guard_lock();
    let library = FakeLibrary::default();
    let mut runtime = FakeRuntime::default();
    let result = resolve(&mut runtime, &config(16), Some(&library), &FakeProperties::default());
    assert_eq!(result.err(), Some(Errno::SymbolMissing));
    assert!(!signal_guard::is_installed());
}

#[test]
fn native_table_without_open_dex_file_is_fatal() {
    let _lock = guard_lock();
    let table = vec![
        entry(c"closeDexFile", c"(I)V", other_native as *mut c_void),
        terminator(),
    ];
    let library = FakeLibrary::default().with_symbol(c"dvm_dalvik_system_DexFile", table.as_ptr() as usize);
    let mut runtime = FakeRuntime::default();
    let result = resolve(&mut runtime, &config(19), Some(&library), &FakeProperties::default());
    assert_eq!(result.err(), Some(Errno::MethodMissing));
}

#[test]
fn missing_raw_dex_open_is_tolerated() {
    let _lock = guard_lock();
    let table = dalvik_table();
    let library =
        FakeLibrary::default().with_symbol(c"dvm_dalvik_system_DexFile", table.as_ptr() as usize);
    let mut runtime = FakeRuntime::default();
    let context = resolve(&mut runtime, &config(17), Some(&library), &FakeProperties::default())
        .expect("resolve");
    assert!(context.profile().raw_dex_open.is_none());
    signal_guard::uninstall();
}

#[test]
fn art_runtime_is_rejected_before_binding() {
    let _lock = guard_lock();
    let props = FakeProperties::with(&[("persist.sys.dalvik.vm.lib", "libart.so")]);
    let mut runtime = FakeRuntime::default();
    let result = resolve::<_, FakeLibrary, _>(&mut runtime, &config(19), None, &props);
    assert_eq!(result.err(), Some(Errno::UnsupportedVm));
    assert!(runtime.calls.is_empty());
}
