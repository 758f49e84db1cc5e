//! 结构数组的线格式编解码。
//!
//! # 格式（What）
//! `[尺寸头][尺寸 × (存在标记 1|0, 标记为 1 时紧跟元素负载)]`
//!
//! - 尺寸头见 [`pvdata_buffer::wire`]，空尺寸表示整个数组缺失；
//! - 存在标记让空槽可以原样往返，无需先压缩；
//! - 元素负载由元素自身的 [`StructureElement::serialize`] 决定。
//!
//! # 流控（How）
//! - 编码时每写一个存在标记前检查缓冲，写满即调用刷新钩子；元素内部按需调用 `ensure_buffer`；
//! - 解码时每读一个存在标记前要求至少 1 字节可读，传输错误原样上抛，不做内部重试。

use pvdata_buffer::{ByteBuffer, DeserializableControl, SerializableControl, wire};
use tracing::{debug, trace};

use super::StructureArray;
use crate::{
    element::{ElementFactory, StructureElement},
    error::ArrayError,
};

const PRESENT: u8 = 1;
const ABSENT: u8 = 0;

impl<E, F> StructureArray<E, F>
where
    E: StructureElement,
    F: ElementFactory<E>,
{
    /// 编码整个有效前缀，等价于 `serialize_range(buffer, control, 0, None)`。
    pub fn serialize(
        &self,
        buffer: &mut ByteBuffer,
        control: &mut dyn SerializableControl,
    ) -> Result<usize, ArrayError> {
        self.serialize_range(buffer, control, 0, None)
    }

    /// 编码 `[offset, offset + count)` 与有效前缀的交集，返回写出的槽位数。
    ///
    /// - `offset` 截断到 `len()`；`count` 为 `None` 表示写到末尾，否则截断到 `len() - offset`；
    /// - 传输错误中途返回时，已刷新的字节无法撤回，调用方应丢弃该连接上的后续数据。
    pub fn serialize_range(
        &self,
        buffer: &mut ByteBuffer,
        control: &mut dyn SerializableControl,
        offset: usize,
        count: Option<usize>,
    ) -> Result<usize, ArrayError> {
        let start = offset.min(self.length);
        let available = self.length - start;
        let count = count.map_or(available, |count| count.min(available));

        wire::write_size(count, buffer, control)?;
        for slot in &self.slots[start..start + count] {
            if buffer.remaining_mut() < 1 {
                control.flush_serialize_buffer(buffer)?;
            }
            match slot {
                None => buffer.put_u8(ABSENT)?,
                Some(element) => {
                    buffer.put_u8(PRESENT)?;
                    element.serialize(buffer, control)?;
                }
            }
        }
        trace!(
            structure = self.structure.id(),
            offset = start,
            count,
            "structure array serialized"
        );
        Ok(count)
    }

    /// 从线格式就地解码，返回解码后的长度；空尺寸返回 `Ok(None)` 且不修改容器。
    ///
    /// # 执行步骤（How）
    /// 1. 只读容器在读取任何字节前返回 [`ArrayError::ImmutableViolation`]；
    /// 2. 读取尺寸头，超过容量时扩容，容量冻结则返回 [`ArrayError::CapacityFixed`]，
    ///    槽位表无法分配则返回 [`ArrayError::Allocation`]；
    /// 3. 逐槽读取存在标记：为 0 释放槽位元素，非 0 则复用已有元素或经工厂新建后就地解码负载；
    /// 4. 全部槽位完成后提交长度并通知写入钩子。
    ///
    /// # 风险提示（Trade-offs）
    /// - 解码中途失败时，已处理的槽位保持新值，而 `len()` 仍为调用前的值。
    pub fn deserialize(
        &mut self,
        buffer: &mut ByteBuffer,
        control: &mut dyn DeserializableControl,
    ) -> Result<Option<usize>, ArrayError> {
        if self.immutable {
            return Err(self.reject_immutable("deserialize"));
        }
        let Some(size) = wire::read_size(buffer, control)? else {
            debug!(
                structure = self.structure.id(),
                "null size header; structure array left untouched"
            );
            return Ok(None);
        };
        if size > self.slots.len() {
            self.set_capacity(size)?;
        }
        for slot in &mut self.slots[..size] {
            control.ensure_data(buffer, 1)?;
            if buffer.get_u8()? == ABSENT {
                *slot = None;
                continue;
            }
            slot.get_or_insert_with(|| self.factory.create(&self.structure))
                .deserialize(buffer, control)?;
        }
        self.length = size;
        trace!(
            structure = self.structure.id(),
            length = size,
            "structure array deserialized"
        );
        self.notify_post_put();
        Ok(Some(size))
    }
}
