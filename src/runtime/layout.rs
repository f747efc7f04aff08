// Dalvik 内部结构的 #[repr(C)] 镜像，所有原始布局假设集中在此
//
// 新增厂商或版本布局时只需扩展 ArgumentLayout 以及本文件中的构造与回填函数。

use super::profile::VendorQuirk;
use crate::errno::Errno;
use std::alloc::{self, Layout};
use std::ffi::{c_char, c_void};
use std::ptr::{self, NonNull};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArgumentLayout {
    // Object { clazz, lock } + length + 内联数据
    DalvikArrayObject,
}

#[repr(C)]
pub struct Object {
    pub clazz: *mut c_void,
    pub lock: u32,
}

#[repr(C)]
pub struct ArrayObject {
    pub object: Object,
    pub length: u32,
    pub contents: [u64; 1],
}

#[repr(C)]
pub struct MemMapping {
    pub addr: *mut c_void,
    pub length: usize,
    pub base_addr: *mut c_void,
    pub base_length: usize,
}

#[repr(C)]
pub struct DvmDex {
    pub unused_ptr: [*mut c_void; 7],
    pub is_mapped_read_only: bool,
    pub mem_map: MemMapping,
    pub dex_object: *mut c_void,
    // HTC 固件额外使用的字段
    pub dex_object_htc: *mut c_void,
}

#[repr(C)]
pub struct RawDexFile {
    pub cache_file_name: *mut c_char,
    pub p_dvm_dex: *mut DvmDex,
}

#[repr(C)]
pub struct DexOrJar {
    pub file_name: *mut c_char,
    pub is_dex: bool,
    pub okay_to_free: bool,
    pub p_raw_dex_file: *mut RawDexFile,
    pub p_jar_file: *mut c_void,
    pub p_dex_memory: *mut u8,
}

// 伪装成 Dalvik 数组对象的堆缓冲区，仅作为私有入口的参数，drop 时释放
pub struct InternalByteBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
    payload_len: usize,
}

impl InternalByteBuffer {
    pub fn as_array_object(&self) -> *const ArrayObject {
        self.ptr.as_ptr() as *const ArrayObject
    }

    pub fn payload(&self) -> &[u8] {
        unsafe {
            std::slice::from_raw_parts(
                self.ptr.as_ptr().add(payload_offset()),
                self.payload_len,
            )
        }
    }
}

impl Drop for InternalByteBuffer {
    fn drop(&mut self) {
        unsafe {
            alloc::dealloc(self.ptr.as_ptr(), self.layout);
        }
    }
}

#[inline]
fn payload_offset() -> usize {
    std::mem::offset_of!(ArrayObject, contents)
}

// 按指定布局构造私有入口需要的参数缓冲区
pub fn build_argument_buffer(
    layout: ArgumentLayout,
    bytes: &[u8],
) -> Result<InternalByteBuffer, Errno> {
    match layout {
        ArgumentLayout::DalvikArrayObject => build_array_object(bytes),
    }
}

fn build_array_object(bytes: &[u8]) -> Result<InternalByteBuffer, Errno> {
    let length = u32::try_from(bytes.len()).map_err(|_| Errno::InvalidArg)?;
    let size = payload_offset()
        .checked_add(bytes.len())
        .ok_or(Errno::NoMem)?
        .max(std::mem::size_of::<ArrayObject>());
    let layout = Layout::from_size_align(size, std::mem::align_of::<ArrayObject>())
        .map_err(|_| Errno::NoMem)?;

    let ptr = NonNull::new(unsafe { alloc::alloc_zeroed(layout) }).ok_or(Errno::NoMem)?;
    unsafe {
        let array = ptr.as_ptr() as *mut ArrayObject;
        ptr::addr_of_mut!((*array).length).write(length);
        ptr::copy_nonoverlapping(
            bytes.as_ptr(),
            ptr.as_ptr().add(payload_offset()),
            bytes.len(),
        );
    }

    Ok(InternalByteBuffer {
        ptr,
        layout,
        payload_len: bytes.len(),
    })
}

// 通过 cookie 找到 DexOrJar -> RawDexFile -> DvmDex，写入 Dex 对象引用
// cookie 必须是 Dalvik 刚返回的 DexOrJar 指针
pub unsafe fn backfill_dex_object(
    cookie: usize,
    dex_object: *mut c_void,
    quirk: VendorQuirk,
) -> Result<(), Errno> {
    let dex_or_jar = cookie as *mut DexOrJar;
    if dex_or_jar.is_null() {
        return Err(Errno::InvalidArg);
    }
    let raw_dex_file = (*dex_or_jar).p_raw_dex_file;
    if raw_dex_file.is_null() {
        return Err(Errno::InvalidArg);
    }
    let dvm_dex = (*raw_dex_file).p_dvm_dex;
    if dvm_dex.is_null() {
        return Err(Errno::InvalidArg);
    }

    (*dvm_dex).dex_object = dex_object;
    if quirk == VendorQuirk::Htc {
        (*dvm_dex).dex_object_htc = dex_object;
    }
    Ok(())
}
