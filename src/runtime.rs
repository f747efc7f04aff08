// runtime 模块入口：Dalvik ABI 解析、参数布局与直接加载
use std::sync::{Mutex, MutexGuard};

mod host;
mod layout;
mod library;
mod loader;
mod probe;
mod profile;
mod resolver;

#[cfg(test)]
pub(crate) mod fake;

pub use host::{DexCookie, DexRuntime};
pub use layout::ArgumentLayout;
pub use library::DlLibrary;
pub use profile::{EntryPoint, RuntimeProfile, VendorQuirk};

pub(crate) use loader::{load_direct, make_opt_dex_file};
pub(crate) use resolver::resolve;

pub(crate) trait MutexPoisonRecover<T> {
    fn lock_or_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> MutexPoisonRecover<T> for Mutex<T> {
    fn lock_or_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// 解析结果与托管运行时句柄的组合，所有加载操作都显式接收它
pub struct DexContext<B> {
    profile: RuntimeProfile,
    bindings: B,
}

impl<B> DexContext<B> {
    pub fn new(profile: RuntimeProfile, bindings: B) -> Self {
        Self { profile, bindings }
    }

    pub fn profile(&self) -> &RuntimeProfile {
        &self.profile
    }

    pub fn bindings(&self) -> &B {
        &self.bindings
    }
}
