//! `pvdata-buffer` 提供结构数组线协议所依赖的有界缓冲与流控钩子。
//!
//! # 模块定位（Why）
//! - 编解码逻辑只与“定长缓冲 + 刷新/拉取钩子”交互，具体传输（socket、文件、内存）由钩子实现决定；
//! - 将这些协作方独立成 crate，使容器 crate 只依赖稳定的 trait 契约。
//!
//! # 设计概要（How）
//! - [`ByteBuffer`]：基于 `bytes::BytesMut` 的先进先出定长缓冲，支持大端/小端数值读写；
//! - [`SerializableControl`]/[`DeserializableControl`]：写满刷新、读空拉取的同步钩子；
//! - [`wire`]：尺寸头与字符串的共享线格式；
//! - [`BufferOptions`]：可由配置文件反序列化的缓冲参数。

mod byte_buffer;
mod control;
mod error;
mod options;
pub mod wire;

pub use byte_buffer::ByteBuffer;
pub use control::{
    DeserializableControl, ReadFeeder, SerializableControl, SliceFeeder, VecFlusher, WriteFlusher,
};
pub use error::CodecError;
pub use options::{BufferOptions, ByteOrder};
