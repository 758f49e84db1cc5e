//! 可变长结构数组容器。
//!
//! # 设计背景（Why）
//! - 每个槽位独占至多一个结构元素，数组需要支持扩容、打洞、压缩以及按窗口批量读写；
//! - 槽位表以 `Vec<Option<E>>` 表达，释放元素即把槽位置为 `None`，扩缩容即调整向量长度，
//!   所有权转移由类型系统保证，不存在重复释放或悬垂访问。
//!
//! # 逻辑解析（How）
//! - 容量等于槽位表长度；`length` 为从 0 开始的有效前缀长度；
//! - 变更操作在入口处完成只读、容量冻结与越界检查，拒绝时不修改任何状态；
//! - 成功的 `put`/`deserialize` 之后通知 [`PostPutObserver`]。
//!
//! # 契约说明（What）
//! - 恒有 `0 <= len() <= capacity()`；
//! - 所有非空槽位的元素类型都等于 [`StructureArray::structure`]；
//! - 容器不做内部同步，并发变更需要调用方加锁。

use std::{fmt, sync::Arc};

use tracing::{debug, warn};

use crate::{
    element::{DefaultElementFactory, ElementFactory, PvStructure, StructureElement},
    error::ArrayError,
    options::{ArrayOptions, PutPolicy},
    structure::Structure,
};

mod codec;
mod window;

pub use window::ElementWindow;

/// 成功写入（`put`/`deserialize`）后的通知钩子，参数为写入后的数组长度。
pub trait PostPutObserver: Send + Sync {
    fn post_put(&self, length: usize);
}

impl<T> PostPutObserver for T
where
    T: Fn(usize) + Send + Sync,
{
    fn post_put(&self, length: usize) {
        self(length)
    }
}

/// 结构数组容器。
///
/// # 使用方式（How）
/// ```rust
/// use pvdata_core::{ScalarType, StructureArray, StructureBuilder};
///
/// let structure = StructureBuilder::new("sample")
///     .add("value", ScalarType::Double)
///     .build()
///     .expect("合法结构");
/// let mut array = StructureArray::new(structure);
/// assert_eq!(array.append(3).expect("可扩容"), 3);
/// assert_eq!(array.len(), 0);
/// array.set_length(3).expect("可变容器");
/// assert_eq!(array.get(0, 10).len(), 3);
/// ```
pub struct StructureArray<E = PvStructure, F = DefaultElementFactory> {
    structure: Arc<Structure>,
    factory: F,
    slots: Vec<Option<E>>,
    length: usize,
    capacity_mutable: bool,
    immutable: bool,
    put_policy: PutPolicy,
    observer: Option<Arc<dyn PostPutObserver>>,
}

impl StructureArray<PvStructure, DefaultElementFactory> {
    /// 以 [`DefaultElementFactory`] 创建空数组。
    pub fn new(structure: Arc<Structure>) -> Self {
        Self::with_factory(structure, DefaultElementFactory)
    }
}

impl<E, F> StructureArray<E, F>
where
    E: StructureElement,
    F: ElementFactory<E>,
{
    /// 创建绑定 `structure` 的空数组，容量与长度均为 0。
    pub fn with_factory(structure: Arc<Structure>, factory: F) -> Self {
        Self {
            structure,
            factory,
            slots: Vec::new(),
            length: 0,
            capacity_mutable: true,
            immutable: false,
            put_policy: PutPolicy::default(),
            observer: None,
        }
    }

    /// 按配置创建数组；`initial_capacity` 个槽位均为空。
    pub fn from_options(structure: Arc<Structure>, factory: F, options: &ArrayOptions) -> Self {
        let mut array = Self::with_factory(structure, factory);
        array.slots.resize_with(options.initial_capacity, || None);
        array.capacity_mutable = options.capacity_mutable;
        array.immutable = options.immutable;
        array.put_policy = options.put_policy;
        array
    }

    pub fn structure(&self) -> &Arc<Structure> {
        &self.structure
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn is_capacity_mutable(&self) -> bool {
        self.capacity_mutable
    }

    pub fn set_capacity_mutable(&mut self, mutable: bool) {
        self.capacity_mutable = mutable;
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// 将容器标记为只读；该操作不可撤销。
    pub fn set_immutable(&mut self) {
        self.immutable = true;
    }

    pub fn put_policy(&self) -> PutPolicy {
        self.put_policy
    }

    pub fn set_put_policy(&mut self, policy: PutPolicy) {
        self.put_policy = policy;
    }

    /// 安装写入通知钩子，替换已有钩子。
    pub fn set_observer(&mut self, observer: Arc<dyn PostPutObserver>) {
        self.observer = Some(observer);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// 调整容量。
    ///
    /// # 执行步骤（How）
    /// 1. 与当前容量相同直接返回；
    /// 2. 容量冻结时返回 [`ArrayError::CapacityFixed`]，状态不变；
    /// 3. 缩容时释放 `[capacity, 当前容量)` 内的全部元素；扩容时先尝试预留空间，
    ///    分配失败返回 [`ArrayError::Allocation`] 且状态不变，成功后新增槽位为空；
    /// 4. `length` 截断到新容量。
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), ArrayError> {
        let current = self.slots.len();
        if capacity == current {
            return Ok(());
        }
        if !self.capacity_mutable {
            warn!(
                structure = self.structure.id(),
                requested = capacity,
                capacity = current,
                "structure array capacity is not mutable"
            );
            return Err(ArrayError::CapacityFixed {
                requested: capacity,
                capacity: current,
            });
        }
        if capacity < current {
            self.slots.truncate(capacity);
            self.slots.shrink_to_fit();
        } else {
            if self.slots.try_reserve_exact(capacity - current).is_err() {
                warn!(
                    structure = self.structure.id(),
                    requested = capacity,
                    capacity = current,
                    "structure array slot table allocation failed"
                );
                return Err(ArrayError::Allocation {
                    requested: capacity,
                });
            }
            self.slots.resize_with(capacity, || None);
        }
        self.length = self.length.min(capacity);
        debug!(
            structure = self.structure.id(),
            from = current,
            to = capacity,
            length = self.length,
            "structure array capacity changed"
        );
        Ok(())
    }

    /// 扩容 `count` 个槽位并为每个新槽位构造默认元素，返回新容量；长度不变。
    pub fn append(&mut self, count: usize) -> Result<usize, ArrayError> {
        let start = self.slots.len();
        let Some(capacity) = start.checked_add(count) else {
            return Err(self.reject_out_of_bounds(start, count, usize::MAX));
        };
        self.set_capacity(capacity)?;
        for slot in &mut self.slots[start..] {
            *slot = Some(self.factory.create(&self.structure));
        }
        Ok(self.slots.len())
    }

    /// 释放 `[offset, offset + count)` 内的元素；不移动其余槽位，也不改变长度。
    pub fn remove(&mut self, offset: usize, count: usize) -> Result<(), ArrayError> {
        let capacity = self.slots.len();
        let end = offset
            .checked_add(count)
            .filter(|end| *end <= capacity)
            .ok_or_else(|| self.reject_out_of_bounds(offset, count, capacity))?;
        self.slots[offset..end].iter_mut().for_each(|slot| *slot = None);
        Ok(())
    }

    /// 压缩空洞，返回保留的元素数。
    ///
    /// # 执行步骤（How）
    /// 1. 自左向右扫描，遇到空槽就把其后第一个非空元素移入；
    /// 2. 其后再无非空元素时停止扫描，剩余后缀视为全空；
    /// 3. 以保留数调用 [`set_capacity`](Self::set_capacity)，容量与长度随之收缩。
    ///
    /// 幸存元素保持相对顺序。容量冻结时元素已完成前移，但容量保持不变并返回
    /// [`ArrayError::CapacityFixed`]。
    pub fn compress(&mut self) -> Result<usize, ArrayError> {
        let capacity = self.slots.len();
        let mut retained = 0;
        // 读游标只前进：游标之前、扫描位置之后的槽位全部为空。
        let mut next = 0;
        for index in 0..capacity {
            if self.slots[index].is_none() {
                next = next.max(index + 1);
                while next < capacity && self.slots[next].is_none() {
                    next += 1;
                }
                if next == capacity {
                    break;
                }
                self.slots.swap(index, next);
                next += 1;
            }
            retained += 1;
        }
        debug!(
            structure = self.structure.id(),
            capacity,
            retained,
            "structure array compressed"
        );
        self.set_capacity(retained)?;
        Ok(retained)
    }

    /// 设置有效长度，返回实际生效的长度。
    ///
    /// 超出容量时先尝试扩容；容量冻结则截断到现有容量，分配失败原样返回。
    pub fn set_length(&mut self, length: usize) -> Result<usize, ArrayError> {
        if self.immutable {
            return Err(self.reject_immutable("set_length"));
        }
        if length == self.length {
            return Ok(length);
        }
        if length > self.slots.len() {
            match self.set_capacity(length) {
                Ok(()) => {}
                Err(ArrayError::CapacityFixed { .. }) => {
                    debug!(requested = length, "structure array length clipped to capacity");
                }
                Err(err) => return Err(err),
            }
        }
        self.length = length.min(self.slots.len());
        Ok(self.length)
    }

    /// 返回 `[offset, offset + len)` 与有效前缀交集上的只读窗口。
    ///
    /// 可见数量为 `min(len, len() - offset)`，`offset >= len()` 时为空窗口。
    pub fn get(&self, offset: usize, len: usize) -> ElementWindow<'_, E> {
        let start = offset.min(self.length);
        let count = len.min(self.length - start);
        ElementWindow::new(offset, &self.slots[start..start + count])
    }

    /// 有效前缀内的槽位。
    pub fn as_slice(&self) -> &[Option<E>] {
        &self.slots[..self.length]
    }

    /// 容量范围内下标 `index` 处的元素。
    pub fn element(&self, index: usize) -> Option<&E> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// 就地修改元素；只读容器返回 `None`。
    pub fn element_mut(&mut self, index: usize) -> Option<&mut E> {
        if self.immutable {
            return None;
        }
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// 从 `source[source_offset..]` 移入 `len` 个元素到 `[offset, offset + len)`，返回实际写入数。
    ///
    /// # 执行步骤（How）
    /// 1. `len == 0` 直接返回 0；只读容器返回 [`ArrayError::ImmutableViolation`]；
    /// 2. 目标区间超出容量且容量冻结时，`len` 截断到容量以内，截断为 0 则返回 0；
    /// 3. 源区间不足返回 [`ArrayError::OutOfBounds`]；
    /// 4. [`PutPolicy::Atomic`] 下先校验全部源元素类型，不符时不做任何修改；
    /// 5. 必要时扩容并把长度延伸到目标区间末尾；
    /// 6. 逐个释放目标槽位原有元素，源为空则目标置空，否则把源元素的所有权移入目标槽位。
    ///    [`PutPolicy::Legacy`] 下在此处遇到类型不符即中止，此前已写入的槽位不回滚；
    /// 7. 通知写入钩子。
    ///
    /// # 契约说明（What）
    /// - 源序列不可能与容器自身槽位表重叠：借用检查器拒绝这种别名。
    /// - 被移入的源条目变为 `None`；类型不符的源元素保留在原处。
    pub fn put(
        &mut self,
        offset: usize,
        len: usize,
        source: &mut [Option<E>],
        source_offset: usize,
    ) -> Result<usize, ArrayError> {
        if len == 0 {
            return Ok(0);
        }
        if self.immutable {
            return Err(self.reject_immutable("put"));
        }
        let capacity = self.slots.len();
        let mut len = len;
        let requested_end = offset.saturating_add(len);
        if requested_end > capacity && !self.capacity_mutable {
            len = capacity.saturating_sub(offset);
            warn!(
                structure = self.structure.id(),
                requested = requested_end,
                capacity,
                written = len,
                "structure array capacity is not mutable; put clipped"
            );
            if len == 0 {
                return Ok(0);
            }
        }
        let source_end = source_offset
            .checked_add(len)
            .filter(|end| *end <= source.len())
            .ok_or_else(|| self.reject_out_of_bounds(source_offset, len, source.len()))?;
        let incoming = &mut source[source_offset..source_end];

        if self.put_policy == PutPolicy::Atomic {
            for (index, entry) in incoming.iter().enumerate() {
                if let Some(element) = entry {
                    ensure_same_type(&self.structure, source_offset + index, element)?;
                }
            }
        }

        let Some(end) = offset.checked_add(len) else {
            return Err(self.reject_out_of_bounds(offset, len, usize::MAX));
        };
        if end > self.slots.len() {
            self.set_capacity(end)?;
        }
        if end > self.length {
            self.length = end;
        }
        for (index, (target, entry)) in self.slots[offset..end]
            .iter_mut()
            .zip(incoming.iter_mut())
            .enumerate()
        {
            *target = None;
            if let Some(element) = entry {
                ensure_same_type(&self.structure, source_offset + index, element)?;
                *target = entry.take();
            }
        }
        self.notify_post_put();
        Ok(len)
    }

    /// 以调用方提供的槽位表整体替换当前内容。
    ///
    /// 容量变为新表长度，`length` 截断到该容量；元素类型不符或容量冻结且表长不同时不做修改。
    pub fn share_data(&mut self, slots: Vec<Option<E>>, length: usize) -> Result<(), ArrayError> {
        if self.immutable {
            return Err(self.reject_immutable("share_data"));
        }
        for (index, entry) in slots.iter().enumerate() {
            if let Some(element) = entry {
                ensure_same_type(&self.structure, index, element)?;
            }
        }
        if !self.capacity_mutable && slots.len() != self.slots.len() {
            warn!(
                structure = self.structure.id(),
                requested = slots.len(),
                capacity = self.slots.len(),
                "structure array capacity is not mutable; shared data rejected"
            );
            return Err(ArrayError::CapacityFixed {
                requested: slots.len(),
                capacity: self.slots.len(),
            });
        }
        self.slots = slots;
        self.length = length.min(self.slots.len());
        Ok(())
    }

    fn reject_immutable(&self, operation: &'static str) -> ArrayError {
        warn!(
            structure = self.structure.id(),
            operation, "structure array is immutable"
        );
        ArrayError::ImmutableViolation { operation }
    }

    fn reject_out_of_bounds(&self, offset: usize, count: usize, bound: usize) -> ArrayError {
        warn!(
            structure = self.structure.id(),
            offset, count, bound, "structure array range out of bounds"
        );
        ArrayError::OutOfBounds {
            offset,
            count,
            bound,
        }
    }

    fn notify_post_put(&self) {
        if let Some(observer) = &self.observer {
            observer.post_put(self.length);
        }
    }
}

fn ensure_same_type<E: StructureElement>(
    expected: &Arc<Structure>,
    index: usize,
    element: &E,
) -> Result<(), ArrayError> {
    if Structure::same_type(expected, element.structure()) {
        return Ok(());
    }
    warn!(
        expected = expected.id(),
        actual = element.structure().id(),
        index,
        "element is not a compatible structure"
    );
    Err(ArrayError::TypeMismatch {
        index,
        expected: expected.id().to_owned(),
        actual: element.structure().id().to_owned(),
    })
}

impl<E: fmt::Debug, F> fmt::Debug for StructureArray<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureArray")
            .field("structure", &self.structure.id())
            .field("capacity", &self.slots.len())
            .field("length", &self.length)
            .field("capacity_mutable", &self.capacity_mutable)
            .field("immutable", &self.immutable)
            .field("put_policy", &self.put_policy)
            .field("slots", &&self.slots[..self.length])
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing_test::traced_test;

    use super::*;
    use crate::{
        scalar::ScalarValue,
        structure::{ScalarType, StructureBuilder},
    };

    fn structure() -> Arc<Structure> {
        StructureBuilder::new("sample")
            .add("value", ScalarType::Int)
            .build()
            .expect("合法结构")
    }

    fn element(value: i32) -> PvStructure {
        PvStructure::new(structure())
            .with("value", ScalarValue::Int(value))
            .expect("类型一致")
    }

    #[traced_test]
    #[test]
    fn fixed_capacity_rejection_is_logged() {
        let mut array = StructureArray::new(structure());
        array.set_capacity_mutable(false);
        let err = array.set_capacity(4).expect_err("容量冻结");
        assert!(matches!(
            err,
            ArrayError::CapacityFixed {
                requested: 4,
                capacity: 0
            }
        ));
        assert_eq!(array.capacity(), 0);
        assert!(logs_contain("structure array capacity is not mutable"));
    }

    #[traced_test]
    #[test]
    fn immutable_put_is_logged_with_operation() {
        let mut array = StructureArray::new(structure());
        array.set_immutable();
        let mut source = vec![Some(element(1))];
        assert!(array.put(0, 1, &mut source, 0).is_err());
        assert!(source[0].is_some());
        assert!(logs_contain("structure array is immutable"));
        assert!(logs_contain("operation=\"put\""));
    }

    #[traced_test]
    #[test]
    fn bounds_and_shared_data_rejections_are_logged() {
        let mut array = StructureArray::new(structure());
        array.append(2).expect("扩容");

        assert!(array.remove(1, 5).is_err());
        assert!(logs_contain("structure array range out of bounds"));
        assert!(logs_contain("bound=2"));

        let mut source = vec![Some(element(1))];
        assert!(array.put(0, 3, &mut source, 0).is_err());
        assert!(logs_contain("count=3"));

        array.set_capacity_mutable(false);
        assert!(array.share_data(vec![None], 1).is_err());
        assert!(logs_contain("shared data rejected"));
        assert_eq!(array.capacity(), 2);
    }

    #[traced_test]
    #[test]
    fn failed_slot_allocation_is_logged() {
        let mut array = StructureArray::new(structure());
        assert!(matches!(
            array.set_capacity(usize::MAX),
            Err(ArrayError::Allocation {
                requested: usize::MAX
            })
        ));
        assert_eq!(array.capacity(), 0);
        assert!(logs_contain("slot table allocation failed"));
    }

    #[test]
    fn observer_sees_length_after_put() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut array = StructureArray::new(structure());
        let tally = Arc::clone(&seen);
        array.set_observer(Arc::new(move |length: usize| {
            tally.store(length, Ordering::SeqCst);
        }));
        let mut source = vec![Some(element(1)), None];
        assert_eq!(array.put(1, 2, &mut source, 0).expect("写入"), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn set_length_clips_to_fixed_capacity() {
        let mut array = StructureArray::new(structure());
        array.append(2).expect("扩容");
        array.set_capacity_mutable(false);
        assert_eq!(array.set_length(5).expect("可变长度"), 2);
        assert_eq!(array.len(), 2);
    }

    #[test]
    fn share_data_validates_types_first() {
        let other = StructureBuilder::new("other")
            .add("value", ScalarType::Int)
            .build()
            .expect("合法结构");
        let mut array = StructureArray::new(structure());
        let foreign = vec![Some(element(1)), Some(PvStructure::new(other))];
        assert!(matches!(
            array.share_data(foreign, 2),
            Err(ArrayError::TypeMismatch { index: 1, .. })
        ));
        assert_eq!(array.capacity(), 0);

        array
            .share_data(vec![Some(element(7)), None, None], 5)
            .expect("类型一致");
        assert_eq!((array.capacity(), array.len()), (3, 3));
        assert_eq!(
            array.element(0).and_then(|e| e.get("value").ok()),
            Some(&ScalarValue::Int(7))
        );
    }

    #[test]
    fn element_mut_is_denied_on_immutable_array() {
        let mut array = StructureArray::new(structure());
        array.append(1).expect("扩容");
        assert!(array.element_mut(0).is_some());
        array.set_immutable();
        assert!(array.element_mut(0).is_none());
    }
}
