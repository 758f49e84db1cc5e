//! 流控钩子契约与常用实现。
//!
//! # 模块定位（Why）
//! - 编码侧在缓冲写满时需要把已写内容交给传输层（刷新），解码侧在缓冲读空时需要从传输层拉取更多字节；
//! - 这两个动作由调用方提供，编解码逻辑只在约定的时机同步调用，不假设任何事件循环。
//!
//! # 契约说明（What）
//! - [`SerializableControl::flush_serialize_buffer`] 返回后缓冲必须有可写空间，否则返回错误；
//! - [`DeserializableControl::ensure_data`] 返回后缓冲至少有 `size` 个可读字节，否则返回
//!   [`CodecError::EndOfStream`] 或传输错误；
//! - 钩子可以阻塞调用线程；取消需要在传输层完成。

use std::io::{ErrorKind, Read, Write};

use bytes::Bytes;
use tracing::trace;

use crate::{byte_buffer::ByteBuffer, error::CodecError};

/// 编码侧流控钩子。
pub trait SerializableControl {
    /// 将缓冲内已写入的字节交给传输层，并复位缓冲以便继续写入。
    fn flush_serialize_buffer(&mut self, buffer: &mut ByteBuffer) -> Result<(), CodecError>;

    /// 确保缓冲至少有 `size` 字节可写，不足时先刷新一次。
    ///
    /// 刷新后仍不足说明 `size` 超过了缓冲容量，返回 [`CodecError::BufferOverflow`]。
    fn ensure_buffer(&mut self, buffer: &mut ByteBuffer, size: usize) -> Result<(), CodecError> {
        if buffer.remaining_mut() >= size {
            return Ok(());
        }
        self.flush_serialize_buffer(buffer)?;
        let available = buffer.remaining_mut();
        if available < size {
            return Err(CodecError::BufferOverflow {
                requested: size,
                available,
            });
        }
        Ok(())
    }
}

/// 解码侧流控钩子。
pub trait DeserializableControl {
    /// 确保缓冲至少有 `size` 个可读字节。
    fn ensure_data(&mut self, buffer: &mut ByteBuffer, size: usize) -> Result<(), CodecError>;
}

/// `VecFlusher` 把每次刷新出的字节帧收集到内存中。
///
/// - 常用于测试与离线编码：`flush_count` 记录刷新次数，`finish` 取走尾部未刷新的残余并拼接全部帧。
#[derive(Debug, Default)]
pub struct VecFlusher {
    frames: Vec<Bytes>,
    flushes: usize,
}

impl VecFlusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 至今触发的刷新次数。
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// 已收集的刷新帧。
    pub fn frames(&self) -> &[Bytes] {
        &self.frames
    }

    /// 取走缓冲残余并返回完整字节流；残余不计入刷新次数。
    pub fn finish(mut self, buffer: &mut ByteBuffer) -> Vec<u8> {
        let tail = buffer.take_written();
        if !tail.is_empty() {
            self.frames.push(tail);
        }
        self.frames.concat()
    }
}

impl SerializableControl for VecFlusher {
    fn flush_serialize_buffer(&mut self, buffer: &mut ByteBuffer) -> Result<(), CodecError> {
        let frame = buffer.take_written();
        self.flushes += 1;
        trace!(bytes = frame.len(), flushes = self.flushes, "flush serialize buffer");
        if !frame.is_empty() {
            self.frames.push(frame);
        }
        Ok(())
    }
}

/// `WriteFlusher` 将刷新帧写入任意 [`Write`] 实现。
#[derive(Debug)]
pub struct WriteFlusher<W> {
    writer: W,
}

impl<W: Write> WriteFlusher<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 写出缓冲残余并冲刷底层写入器，返回写入器本身。
    pub fn finish(mut self, buffer: &mut ByteBuffer) -> Result<W, CodecError> {
        self.flush_serialize_buffer(buffer)?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> SerializableControl for WriteFlusher<W> {
    fn flush_serialize_buffer(&mut self, buffer: &mut ByteBuffer) -> Result<(), CodecError> {
        let frame = buffer.take_written();
        trace!(bytes = frame.len(), "write serialize buffer to transport");
        self.writer.write_all(&frame)?;
        Ok(())
    }
}

/// `SliceFeeder` 以至多 `chunk` 字节为单位，把一段内存按需喂给解码缓冲。
///
/// - 用于模拟分片到达的传输：`pull_count` 记录实际补充次数；
/// - 数据耗尽仍不满足请求时返回 [`CodecError::EndOfStream`]。
#[derive(Debug)]
pub struct SliceFeeder<'a> {
    source: &'a [u8],
    position: usize,
    chunk: usize,
    pulls: usize,
}

impl<'a> SliceFeeder<'a> {
    /// `chunk` 为 0 时按 1 处理。
    pub fn new(source: &'a [u8], chunk: usize) -> Self {
        Self {
            source,
            position: 0,
            chunk: chunk.max(1),
            pulls: 0,
        }
    }

    pub fn pull_count(&self) -> usize {
        self.pulls
    }

    /// 尚未喂入缓冲的字节数。
    pub fn pending(&self) -> usize {
        self.source.len() - self.position
    }
}

impl DeserializableControl for SliceFeeder<'_> {
    fn ensure_data(&mut self, buffer: &mut ByteBuffer, size: usize) -> Result<(), CodecError> {
        while buffer.remaining() < size {
            let room = buffer.remaining_mut();
            if room == 0 {
                return Err(CodecError::BufferOverflow {
                    requested: size,
                    available: buffer.remaining(),
                });
            }
            if self.pending() == 0 {
                return Err(CodecError::EndOfStream {
                    requested: size,
                    available: buffer.remaining(),
                });
            }
            let take = self.chunk.min(room).min(self.pending());
            buffer.feed(&self.source[self.position..self.position + take])?;
            self.position += take;
            self.pulls += 1;
            trace!(bytes = take, pulls = self.pulls, "feed deserialize buffer");
        }
        Ok(())
    }
}

/// `ReadFeeder` 从任意 [`Read`] 实现拉取字节，单次至多 `chunk` 字节。
#[derive(Debug)]
pub struct ReadFeeder<R> {
    reader: R,
    scratch: Vec<u8>,
}

impl<R: Read> ReadFeeder<R> {
    /// `chunk` 为 0 时按 1 处理。
    pub fn new(reader: R, chunk: usize) -> Self {
        Self {
            reader,
            scratch: vec![0; chunk.max(1)],
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> DeserializableControl for ReadFeeder<R> {
    fn ensure_data(&mut self, buffer: &mut ByteBuffer, size: usize) -> Result<(), CodecError> {
        while buffer.remaining() < size {
            let room = buffer.remaining_mut().min(self.scratch.len());
            if room == 0 {
                return Err(CodecError::BufferOverflow {
                    requested: size,
                    available: buffer.remaining(),
                });
            }
            let read = match self.reader.read(&mut self.scratch[..room]) {
                Ok(0) => {
                    return Err(CodecError::EndOfStream {
                        requested: size,
                        available: buffer.remaining(),
                    });
                }
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            buffer.feed(&self.scratch[..read])?;
            trace!(bytes = read, "read into deserialize buffer");
        }
        Ok(())
    }
}
