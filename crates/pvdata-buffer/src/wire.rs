//! 尺寸头与字符串的线格式。
//!
//! # 格式（What）
//! - `0xFF`：空尺寸（数组缺失），解码为 `None`；
//! - `0x00..=0xFD`：单字节表示 `0..=253`；
//! - `0xFE` + 32 位有符号整数（缓冲字节序）：表示 `254` 及以上；解出负值视为协议错误；
//! - 字符串：尺寸头 + UTF-8 字节，字节段可跨越多次刷新/拉取。

use tracing::trace;

use crate::{
    byte_buffer::ByteBuffer,
    control::{DeserializableControl, SerializableControl},
    error::CodecError,
};

/// 空尺寸标记。
pub const NULL_SIZE_MARKER: u8 = 0xFF;
/// 长尺寸前缀标记，其后紧跟 4 字节整数。
pub const LONG_SIZE_MARKER: u8 = 0xFE;
/// 单字节可表示的尺寸上界（不含）。
pub const SHORT_SIZE_LIMIT: usize = 254;

/// 写入尺寸头。
pub fn write_size(
    size: usize,
    buffer: &mut ByteBuffer,
    control: &mut dyn SerializableControl,
) -> Result<(), CodecError> {
    if size < SHORT_SIZE_LIMIT {
        control.ensure_buffer(buffer, 1)?;
        return buffer.put_u8(size as u8);
    }
    let value = i32::try_from(size).map_err(|_| CodecError::SizeOutOfRange { size })?;
    control.ensure_buffer(buffer, 5)?;
    buffer.put_u8(LONG_SIZE_MARKER)?;
    buffer.put_i32(value)
}

/// 写入空尺寸标记。
pub fn write_null_size(
    buffer: &mut ByteBuffer,
    control: &mut dyn SerializableControl,
) -> Result<(), CodecError> {
    control.ensure_buffer(buffer, 1)?;
    buffer.put_u8(NULL_SIZE_MARKER)
}

/// 读取尺寸头；空尺寸返回 `None`。
pub fn read_size(
    buffer: &mut ByteBuffer,
    control: &mut dyn DeserializableControl,
) -> Result<Option<usize>, CodecError> {
    control.ensure_data(buffer, 1)?;
    match buffer.get_u8()? {
        NULL_SIZE_MARKER => Ok(None),
        LONG_SIZE_MARKER => {
            control.ensure_data(buffer, 4)?;
            let value = buffer.get_i32()?;
            usize::try_from(value)
                .map(Some)
                .map_err(|_| CodecError::InvalidSize { value })
        }
        short => Ok(Some(usize::from(short))),
    }
}

/// 写入字符串；长于缓冲剩余空间的字节段按空间分片写出，分片之间触发刷新。
pub fn write_string(
    value: &str,
    buffer: &mut ByteBuffer,
    control: &mut dyn SerializableControl,
) -> Result<(), CodecError> {
    let mut bytes = value.as_bytes();
    write_size(bytes.len(), buffer, control)?;
    while !bytes.is_empty() {
        if buffer.remaining_mut() == 0 {
            control.flush_serialize_buffer(buffer)?;
        }
        let take = buffer.remaining_mut().min(bytes.len());
        if take == 0 {
            return Err(CodecError::BufferOverflow {
                requested: bytes.len(),
                available: 0,
            });
        }
        let (head, tail) = bytes.split_at(take);
        buffer.put_slice(head)?;
        bytes = tail;
    }
    Ok(())
}

/// 读取字符串；空尺寸与零长度都解码为空串。
pub fn read_string(
    buffer: &mut ByteBuffer,
    control: &mut dyn DeserializableControl,
) -> Result<String, CodecError> {
    let Some(size) = read_size(buffer, control)? else {
        return Ok(String::new());
    };
    // 尺寸来自对端，预分配不超过一个缓冲容量，其余随数据到达增长。
    let mut bytes = Vec::with_capacity(size.min(buffer.capacity()));
    while bytes.len() < size {
        if buffer.is_empty() {
            control.ensure_data(buffer, 1)?;
        }
        let take = buffer.remaining().min(size - bytes.len());
        bytes.extend_from_slice(&buffer.get_bytes(take)?);
    }
    trace!(bytes = size, "read string payload");
    Ok(String::from_utf8(bytes)?)
}
