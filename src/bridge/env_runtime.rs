// DexRuntime 的 JNI 实现：所有对 Java 层的访问都经由 JNIEnv
use crate::errno::Errno;
use crate::log;
use crate::runtime::{DexCookie, DexRuntime};
use jni::JNIEnv;
use jni::objects::{
    GlobalRef, JByteArray, JClass, JFieldID, JMethodID, JObject, JStaticMethodID, JString, JValue,
    ReleaseMode,
};
use jni::signature::{Primitive, ReturnType};
use jni::sys::jint;
use std::ffi::c_void;

const DEX_FILE_CLASS: &str = "dalvik/system/DexFile";
const CLOSE_GUARD_CLASS: &str = "dalvik/system/CloseGuard";
const DEX_CLASS: &str = "com/android/dex/Dex";

// initialize 时缓存的类全局引用与成员 ID
pub struct JniBindings {
    dex_file_class: GlobalRef,
    cookie_field: JFieldID,
    file_name_field: JFieldID,
    guard_field: JFieldID,
    close_guard_class: GlobalRef,
    guard_get_method: JStaticMethodID,
    open_dex_file_method: Option<JStaticMethodID>,
    dex_class: Option<GlobalRef>,
    dex_constructor: Option<JMethodID>,
}

// 成员 ID 与全局引用在类卸载前始终有效，可跨线程共享
unsafe impl Send for JniBindings {}
unsafe impl Sync for JniBindings {}

fn as_class(global: &GlobalRef) -> &JClass<'static> {
    <&JClass>::from(global.as_obj())
}

pub struct JniRuntime<'local> {
    env: JNIEnv<'local>,
}

impl<'local> JniRuntime<'local> {
    pub fn new(env: JNIEnv<'local>) -> Self {
        Self { env }
    }

    pub fn env_mut(&mut self) -> &mut JNIEnv<'local> {
        &mut self.env
    }
}

impl<'local> DexRuntime for JniRuntime<'local> {
    type Bindings = JniBindings;
    type Path = JString<'local>;
    type Bytes = JByteArray<'local>;
    type Object = JObject<'local>;

    fn bind_result_type(&mut self) -> Result<JniBindings, Errno> {
        let env = &mut self.env;

        let class = env.find_class(DEX_FILE_CLASS)?;
        let dex_file_class = env.new_global_ref(&class)?;
        let cookie_field = env.get_field_id(&class, "mCookie", "I")?;
        let file_name_field = env.get_field_id(&class, "mFileName", "Ljava/lang/String;")?;
        let guard_field = env.get_field_id(&class, "guard", "Ldalvik/system/CloseGuard;")?;

        let class = env.find_class(CLOSE_GUARD_CLASS)?;
        let close_guard_class = env.new_global_ref(&class)?;
        let guard_get_method =
            env.get_static_method_id(&class, "get", "()Ldalvik/system/CloseGuard;")?;

        Ok(JniBindings {
            dex_file_class,
            cookie_field,
            file_name_field,
            guard_field,
            close_guard_class,
            guard_get_method,
            open_dex_file_method: None,
            dex_class: None,
            dex_constructor: None,
        })
    }

    fn bind_legacy_open(&mut self, bindings: &mut JniBindings) -> bool {
        let class = as_class(&bindings.dex_file_class);
        match self.env.get_static_method_id(class, "openDexFile", "([B)I") {
            Ok(method) => {
                bindings.open_dex_file_method = Some(method);
                true
            }
            Err(_) => {
                let _ = self.env.exception_clear();
                log::debug(format_args!("DexFile.openDexFile([B)I unavailable"));
                false
            }
        }
    }

    fn bind_dex_wrapper(&mut self, bindings: &mut JniBindings) -> Result<(), Errno> {
        let env = &mut self.env;
        let class = env.find_class(DEX_CLASS)?;
        let dex_class = env.new_global_ref(&class)?;
        let dex_constructor = env.get_method_id(&class, "<init>", "([B)V")?;
        bindings.dex_class = Some(dex_class);
        bindings.dex_constructor = Some(dex_constructor);
        Ok(())
    }

    fn path_string(&mut self, path: &JString<'local>) -> Result<String, Errno> {
        Ok(self.env.get_string(path)?.into())
    }

    fn new_bytes(&mut self, data: &[u8]) -> Result<JByteArray<'local>, Errno> {
        Ok(self.env.byte_array_from_slice(data)?)
    }

    fn with_bytes_critical<T>(
        &mut self,
        bytes: &JByteArray<'local>,
        f: impl FnOnce(&[u8]) -> T,
    ) -> Result<T, Errno> {
        let elements = unsafe {
            self.env
                .get_array_elements_critical(bytes, ReleaseMode::NoCopyBack)?
        };
        let data =
            unsafe { std::slice::from_raw_parts(elements.as_ptr() as *const u8, elements.len()) };
        Ok(f(data))
    }

    fn call_legacy_open(
        &mut self,
        bindings: &JniBindings,
        bytes: &JByteArray<'local>,
    ) -> Result<DexCookie, Errno> {
        let method = bindings.open_dex_file_method.ok_or(Errno::MethodMissing)?;
        let class = as_class(&bindings.dex_file_class);
        let cookie = unsafe {
            self.env.call_static_method_unchecked(
                class,
                method,
                ReturnType::Primitive(Primitive::Int),
                &[JValue::Object(bytes).as_jni()],
            )
        }?
        .i()?;
        Ok(cookie as u32 as DexCookie)
    }

    fn exception_pending(&mut self) -> bool {
        self.env.exception_check().unwrap_or(true)
    }

    fn new_dex_wrapper(
        &mut self,
        bindings: &JniBindings,
        bytes: &JByteArray<'local>,
    ) -> Result<*mut c_void, Errno> {
        let class = bindings.dex_class.as_ref().ok_or(Errno::ClassMissing)?;
        let constructor = bindings.dex_constructor.ok_or(Errno::ClassMissing)?;
        let dex = unsafe {
            self.env.new_object_unchecked(
                as_class(class),
                constructor,
                &[JValue::Object(bytes).as_jni()],
            )
        }?;
        let global = self.env.new_global_ref(&dex)?;
        let raw = global.as_obj().as_raw();
        // 全局引用由 DvmDex 持有，随 dex 生命周期存在，不在这里释放
        std::mem::forget(global);
        Ok(raw.cast())
    }

    fn new_result_object(
        &mut self,
        bindings: &JniBindings,
        cookie: DexCookie,
        path: Option<&JString<'local>>,
    ) -> Result<JObject<'local>, Errno> {
        let dex_file = self.env.alloc_object(as_class(&bindings.dex_file_class))?;
        let guard = unsafe {
            self.env.call_static_method_unchecked(
                as_class(&bindings.close_guard_class),
                bindings.guard_get_method,
                ReturnType::Object,
                &[],
            )
        }?
        .l()?;

        let null_name = JObject::null();
        let file_name: &JObject = match path {
            Some(path) => &**path,
            None => &null_name,
        };

        self.env.set_field_unchecked(
            &dex_file,
            bindings.cookie_field,
            JValue::Int(cookie as jint),
        )?;
        self.env
            .set_field_unchecked(&dex_file, bindings.file_name_field, JValue::Object(file_name))?;
        self.env
            .set_field_unchecked(&dex_file, bindings.guard_field, JValue::Object(&guard))?;
        Ok(dex_file)
    }
}
