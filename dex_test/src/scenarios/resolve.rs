use boost_multidex::{BoostErrno, ResolverConfig, initialize};

use crate::test_ctx::{NullRuntime, StaticProps, scratch_file, scratch_missing};

fn host_config(sdk_version: i32) -> ResolverConfig {
    ResolverConfig {
        runtime_library: c"libboost_multidex_absent_vm.so",
        yunos_marker_path: scratch_missing("libvmkid_lemur.so"),
        ..ResolverConfig::for_sdk(sdk_version)
    }
}

pub unsafe fn scenario_initialize_missing_runtime() {
    let mut runtime = NullRuntime::default();
    let props = StaticProps::with(&[]);
    let result = initialize(&mut runtime, &host_config(21), &props);
    assert_eq!(result.err(), Some(BoostErrno::RuntimeNotFound));
    assert_eq!(
        BoostErrno::RuntimeNotFound.exception_message(),
        Some("Fail to find dvm")
    );
}

pub unsafe fn scenario_initialize_art_rejected() {
    let mut runtime = NullRuntime::default();
    let props = StaticProps::with(&[("persist.sys.dalvik.vm.lib", "libart.so")]);
    let result = initialize(&mut runtime, &host_config(19), &props);
    assert_eq!(result.err(), Some(BoostErrno::UnsupportedVm));
}

pub unsafe fn scenario_initialize_yunos_rejected() {
    let mut runtime = NullRuntime::default();
    let props = StaticProps::with(&[]);
    let config = ResolverConfig {
        yunos_marker_path: scratch_file("libvmkid_lemur.so", b"\x7fELF"),
        ..host_config(17)
    };
    let result = initialize(&mut runtime, &config, &props);
    assert_eq!(result.err(), Some(BoostErrno::UnsupportedVm));
    std::fs::remove_file(&config.yunos_marker_path).expect("remove marker failed");
}
