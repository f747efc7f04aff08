// JNI 导出函数：Java 层 BoostNative 的 native 方法
mod env_runtime;

use env_runtime::{JniBindings, JniRuntime};

use crate::android::system_props::SystemProperties;
use crate::api;
use crate::config::ResolverConfig;
use crate::log;
use crate::runtime::DexContext;
use jni::objects::{JByteArray, JClass, JString};
use jni::sys::{JNI_ERR, JNI_FALSE, JNI_TRUE, JNI_VERSION_1_6, jboolean, jint, jlong, jobject};
use jni::{JNIEnv, JavaVM, NativeMethod};
use once_cell::sync::OnceCell;
use std::ffi::c_void;

const NATIVE_CLASS: &str = "com/bytedance/boost_multidex/BoostNative";

static CONTEXT: OnceCell<DexContext<JniBindings>> = OnceCell::new();

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_bytedance_boost_1multidex_BoostNative_obtainCheckSum<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    path: JString<'local>,
) -> jlong {
    if path.is_null() {
        return 0;
    }
    let path: String = match env.get_string(&path) {
        Ok(path) => path.into(),
        Err(_) => return 0,
    };
    api::obtain_checksum(&path)
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_bytedance_boost_1multidex_BoostNative_loadDirectDex<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    path: JString<'local>,
    bytes: JByteArray<'local>,
) -> jobject {
    let Some(context) = CONTEXT.get() else {
        log::error(format_args!("loadDirectDex called before initialize"));
        return std::ptr::null_mut();
    };

    let path = (!path.is_null()).then_some(path);
    let bytes = (!bytes.is_null()).then_some(bytes);

    let mut runtime = JniRuntime::new(env);
    match api::load_direct_dex(&mut runtime, context, path.as_ref(), bytes.as_ref()) {
        Some(dex_file) => dex_file.into_raw(),
        None => std::ptr::null_mut(),
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_bytedance_boost_1multidex_BoostNative_recoverAction<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) {
    api::recover_action();
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_bytedance_boost_1multidex_BoostNative_makeOptDexFile<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    path: JString<'local>,
    opt_path: JString<'local>,
) -> jboolean {
    let Some(context) = CONTEXT.get() else {
        log::error(format_args!("makeOptDexFile called before initialize"));
        return JNI_FALSE;
    };
    if path.is_null() || opt_path.is_null() {
        return JNI_FALSE;
    }

    let path: String = match env.get_string(&path) {
        Ok(path) => path.into(),
        Err(_) => return JNI_FALSE,
    };
    let opt_path: String = match env.get_string(&opt_path) {
        Ok(path) => path.into(),
        Err(_) => return JNI_FALSE,
    };

    if api::make_opt_dex_file(context, &path, &opt_path) {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_bytedance_boost_1multidex_BoostNative_initialize<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    sdk_version: jint,
    runtime_exception_class: JClass<'local>,
) -> jboolean {
    if CONTEXT.get().is_some() {
        return JNI_TRUE;
    }

    let config = ResolverConfig::for_sdk(sdk_version);
    let mut runtime = JniRuntime::new(env);
    match api::initialize(&mut runtime, &config, &SystemProperties) {
        Ok(context) => {
            // 调用方保证串行，set 失败只可能是重复初始化
            let _ = CONTEXT.set(context);
            JNI_TRUE
        }
        Err(errno) => {
            log::error(format_args!(
                "initialize failed, sdk {}, errno {}",
                sdk_version,
                errno.as_i32()
            ));
            let env = runtime.env_mut();
            if let Some(message) = errno.exception_message()
                && !runtime_exception_class.is_null()
                && !env.exception_check().unwrap_or(true)
            {
                let _ = env.throw_new(&runtime_exception_class, message);
            }
            JNI_FALSE
        }
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn JNI_OnLoad(vm: *mut jni::sys::JavaVM, _reserved: *mut c_void) -> jint {
    let vm = match unsafe { JavaVM::from_raw(vm) } {
        Ok(vm) => vm,
        Err(_) => return JNI_ERR,
    };
    let mut env = match vm.get_env() {
        Ok(env) => env,
        Err(_) => return JNI_ERR,
    };
    let class = match env.find_class(NATIVE_CLASS) {
        Ok(class) => class,
        Err(_) => {
            let _ = env.exception_clear();
            log::error(format_args!("fail to find {}", NATIVE_CLASS));
            return JNI_ERR;
        }
    };

    let methods = [NativeMethod {
        name: "obtainCheckSum".into(),
        sig: "(Ljava/lang/String;)J".into(),
        fn_ptr: Java_com_bytedance_boost_1multidex_BoostNative_obtainCheckSum as *mut c_void,
    }];
    if env.register_native_methods(&class, &methods).is_err() {
        let _ = env.exception_clear();
        log::error(format_args!("fail to register native methods"));
        return JNI_ERR;
    }

    JNI_VERSION_1_6
}
