//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 汇总缓冲读写、流控钩子与尺寸头解析的全部失败路径；
//! - 上层容器将其视为“传输/协议错误”，直接中止正在进行的编解码。
//!
//! ## 设计要求（What）
//! - 所有变体派生 `thiserror::Error`，可直接交给 `?` 传播；
//! - 通过 [`CodecError::code`] 暴露 `<领域>.<语义>` 形式的稳定错误码，便于日志聚合。

use thiserror::Error;

/// 缓冲与线协议层的错误域。
#[derive(Debug, Error)]
pub enum CodecError {
    /// 写入超出缓冲剩余空间；通常意味着刷新钩子未能腾出空间。
    #[error("buffer overflow: requested {requested} bytes, {available} writable")]
    BufferOverflow { requested: usize, available: usize },

    /// 读取超出当前已到达的字节数；调用方应先执行 `ensure_data`。
    #[error("buffer underflow: requested {requested} bytes, {available} readable")]
    BufferUnderflow { requested: usize, available: usize },

    /// 数据源已耗尽，无法满足 `ensure_data` 请求。
    #[error("end of stream: requested {requested} bytes, {available} readable")]
    EndOfStream { requested: usize, available: usize },

    /// 底层传输返回的 I/O 错误。
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),

    /// 尺寸头解码出负值。
    #[error("invalid size header value {value}")]
    InvalidSize { value: i32 },

    /// 待编码的尺寸超过 32 位有符号整数的表达范围。
    #[error("size {size} exceeds the encodable range")]
    SizeOutOfRange { size: usize },

    /// 字符串负载不是合法 UTF-8。
    #[error("string payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl CodecError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::BufferOverflow { .. } => "buffer.overflow",
            CodecError::BufferUnderflow { .. } => "buffer.underflow",
            CodecError::EndOfStream { .. } => "transport.end_of_stream",
            CodecError::Transport(_) => "transport.io",
            CodecError::InvalidSize { .. } => "protocol.invalid_size",
            CodecError::SizeOutOfRange { .. } => "protocol.size_out_of_range",
            CodecError::InvalidUtf8(_) => "protocol.invalid_utf8",
        }
    }
}
