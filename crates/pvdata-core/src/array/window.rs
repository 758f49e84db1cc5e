use core::slice;

/// `ElementWindow` 是 [`get`](super::StructureArray::get) 返回的只读借用窗口。
///
/// # 契约说明（What）
/// - 窗口覆盖容器槽位 `[offset, offset + len)`，空槽以 `None` 出现；
/// - 生命周期绑定容器的不可变借用，窗口存活期间任何变更调用都无法通过编译。
pub struct ElementWindow<'a, E> {
    offset: usize,
    items: &'a [Option<E>],
}

impl<'a, E> ElementWindow<'a, E> {
    pub(crate) fn new(offset: usize, items: &'a [Option<E>]) -> Self {
        Self { offset, items }
    }

    /// 调用方请求的起始下标。
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 实际可见的槽位数，即请求长度按容器长度截断后的结果。
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &'a [Option<E>] {
        self.items
    }

    /// 窗口内第 `index` 个槽位的元素；空槽或越界返回 `None`。
    pub fn get(&self, index: usize) -> Option<&'a E> {
        self.items.get(index).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> slice::Iter<'a, Option<E>> {
        self.items.iter()
    }
}

impl<E> Clone for ElementWindow<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for ElementWindow<'_, E> {}

impl<'a, E> IntoIterator for ElementWindow<'a, E> {
    type Item = &'a Option<E>;
    type IntoIter = slice::Iter<'a, Option<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<E: core::fmt::Debug> core::fmt::Debug for ElementWindow<'_, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ElementWindow")
            .field("offset", &self.offset)
            .field("items", &self.items)
            .finish()
    }
}
