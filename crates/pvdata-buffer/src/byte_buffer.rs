use core::mem::size_of;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    error::CodecError,
    options::{BufferOptions, ByteOrder},
};

/// 为定长数值生成成对的读写方法，按缓冲当前字节序分派到 `bytes` 的大端/小端实现。
macro_rules! fixed_width_accessors {
    ($($ty:ty => $put:ident / $put_le:ident, $get:ident / $get_le:ident;)*) => {
        $(
            #[doc = concat!("按缓冲字节序写入一个 `", stringify!($ty), "`，空间不足时返回 [`CodecError::BufferOverflow`]。")]
            pub fn $put(&mut self, value: $ty) -> Result<(), CodecError> {
                self.require_writable(size_of::<$ty>())?;
                match self.order {
                    ByteOrder::BigEndian => self.data.$put(value),
                    ByteOrder::LittleEndian => self.data.$put_le(value),
                }
                Ok(())
            }

            #[doc = concat!("按缓冲字节序读取一个 `", stringify!($ty), "`，数据不足时返回 [`CodecError::BufferUnderflow`]。")]
            pub fn $get(&mut self) -> Result<$ty, CodecError> {
                self.require_readable(size_of::<$ty>())?;
                Ok(match self.order {
                    ByteOrder::BigEndian => self.data.$get(),
                    ByteOrder::LittleEndian => self.data.$get_le(),
                })
            }
        )*
    };
}

/// `ByteBuffer` 是编解码两侧共用的定长字节缓冲。
///
/// # 设计背景（Why）
/// - 结构数组的线协议以“有界缓冲 + 流控钩子”的方式工作：写满即刷新，读空即拉取；
///   缓冲本身只负责记账与越界防御，不做任何隐式扩容。
///
/// # 逻辑解析（How）
/// - 内部以 `BytesMut` 作为先进先出队列：写入追加到尾部，读取从头部消费；
/// - `capacity` 是逻辑上限，独立于 `BytesMut` 的实际分配，`take_written` 拆分后仍按该上限计算剩余空间；
/// - 多字节数值按 `order` 选择 `bytes` 的大端或小端方法。
///
/// # 契约说明（What）
/// - `remaining_mut() + remaining() == capacity()` 恒成立；
/// - 越界写入/读取一律返回错误，缓冲状态保持不变；
/// - 单线程独占使用，跨线程共享需外部同步。
#[derive(Debug)]
pub struct ByteBuffer {
    data: BytesMut,
    capacity: usize,
    order: ByteOrder,
}

impl ByteBuffer {
    /// 创建大端字节序、容量为 `capacity` 的空缓冲。
    pub fn new(capacity: usize) -> Self {
        Self::with_order(capacity, ByteOrder::BigEndian)
    }

    pub fn with_order(capacity: usize, order: ByteOrder) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            capacity,
            order,
        }
    }

    pub fn from_options(options: &BufferOptions) -> Self {
        Self::with_order(options.capacity, options.byte_order)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// 切换字节序；只影响此后的读写。
    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// 剩余可写字节数。
    pub fn remaining_mut(&self) -> usize {
        self.capacity.saturating_sub(self.data.len())
    }

    /// 当前可读字节数。
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 当前尚未消费的字节视图。
    pub fn chunk(&self) -> &[u8] {
        &self.data
    }

    pub fn put_u8(&mut self, value: u8) -> Result<(), CodecError> {
        self.require_writable(1)?;
        self.data.put_u8(value);
        Ok(())
    }

    pub fn put_i8(&mut self, value: i8) -> Result<(), CodecError> {
        self.require_writable(1)?;
        self.data.put_i8(value);
        Ok(())
    }

    pub fn put_bool(&mut self, value: bool) -> Result<(), CodecError> {
        self.put_u8(u8::from(value))
    }

    /// 写入整段字节；剩余空间不足时整段拒绝，不做部分写入。
    pub fn put_slice(&mut self, src: &[u8]) -> Result<(), CodecError> {
        self.require_writable(src.len())?;
        self.data.put_slice(src);
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8, CodecError> {
        self.require_readable(1)?;
        Ok(self.data.get_u8())
    }

    pub fn get_i8(&mut self) -> Result<i8, CodecError> {
        self.require_readable(1)?;
        Ok(self.data.get_i8())
    }

    /// 任意非零字节均视为 `true`。
    pub fn get_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.get_u8()? != 0)
    }

    /// 将 `dst.len()` 个字节复制到目标切片并推进读指针。
    pub fn copy_to_slice(&mut self, dst: &mut [u8]) -> Result<(), CodecError> {
        self.require_readable(dst.len())?;
        self.data.copy_to_slice(dst);
        Ok(())
    }

    /// 以零拷贝方式拆出前 `len` 个可读字节。
    pub fn get_bytes(&mut self, len: usize) -> Result<Bytes, CodecError> {
        self.require_readable(len)?;
        Ok(self.data.split_to(len).freeze())
    }

    fixed_width_accessors! {
        i16 => put_i16 / put_i16_le, get_i16 / get_i16_le;
        u16 => put_u16 / put_u16_le, get_u16 / get_u16_le;
        i32 => put_i32 / put_i32_le, get_i32 / get_i32_le;
        u32 => put_u32 / put_u32_le, get_u32 / get_u32_le;
        i64 => put_i64 / put_i64_le, get_i64 / get_i64_le;
        u64 => put_u64 / put_u64_le, get_u64 / get_u64_le;
        f32 => put_f32 / put_f32_le, get_f32 / get_f32_le;
        f64 => put_f64 / put_f64_le, get_f64 / get_f64_le;
    }

    /// 取走全部已写入字节并复位缓冲，供刷新钩子交给传输层。
    pub fn take_written(&mut self) -> Bytes {
        self.data.split().freeze()
    }

    /// 由拉取钩子调用，向缓冲尾部追加新到达的字节。
    pub fn feed(&mut self, src: &[u8]) -> Result<(), CodecError> {
        self.put_slice(src)
    }

    /// 丢弃全部未消费字节。
    pub fn clear(&mut self) {
        self.data.clear();
    }

    fn require_writable(&self, requested: usize) -> Result<(), CodecError> {
        let available = self.remaining_mut();
        if requested > available {
            return Err(CodecError::BufferOverflow {
                requested,
                available,
            });
        }
        Ok(())
    }

    fn require_readable(&self, requested: usize) -> Result<(), CodecError> {
        let available = self.remaining();
        if requested > available {
            return Err(CodecError::BufferUnderflow {
                requested,
                available,
            });
        }
        Ok(())
    }
}
