//! `structure_array_properties`：以随机操作序列验证容器不变量。
//!
//! # 测试目标（Why）
//! - 任意合法调用序列之后，`len() <= capacity()` 且所有元素都属于容器绑定的结构类型；
//! - 压缩幂等且不会增加长度；两步缩容与一次缩容结果一致；
//! - 任意空洞分布与负载都能经过小缓冲完成编解码往返。
//!
//! # 设计手法（How）
//! - `Op` 枚举覆盖全部变更入口，调用失败也属于合法结果，只检查失败后不变量依然成立；
//! - 元素只携带一个 `Int` 字段，状态比较时把槽位映射为 `Option<i32>`。

use std::sync::Arc;

use proptest::prelude::*;
use pvdata_core::{
    PvStructure, ScalarType, ScalarValue, Structure, StructureArray, StructureBuilder,
    StructureElement,
    pvdata_buffer::{ByteBuffer, SliceFeeder, VecFlusher},
};

fn sample() -> Arc<Structure> {
    StructureBuilder::new("sample")
        .add("x", ScalarType::Int)
        .build()
        .expect("合法结构")
}

fn element(structure: &Arc<Structure>, x: i32) -> PvStructure {
    PvStructure::new(Arc::clone(structure))
        .with("x", ScalarValue::Int(x))
        .expect("字段类型一致")
}

/// 容量范围内全部槽位的快照。
fn snapshot(array: &StructureArray) -> (usize, usize, Vec<Option<ScalarValue>>) {
    let slots = (0..array.capacity())
        .map(|i| array.element(i).map(|e| e.values()[0].clone()))
        .collect();
    (array.capacity(), array.len(), slots)
}

fn build(structure: &Arc<Structure>, xs: &[Option<i32>]) -> StructureArray {
    let mut array = StructureArray::new(Arc::clone(structure));
    let mut source: Vec<_> = xs.iter().map(|x| x.map(|x| element(structure, x))).collect();
    array
        .put(0, source.len(), &mut source, 0)
        .expect("填充数组");
    array
}

#[derive(Clone, Debug)]
enum Op {
    Append(usize),
    Remove(usize, usize),
    SetCapacity(usize),
    SetLength(usize),
    Put(usize, Vec<Option<i32>>),
    Compress,
    FreezeCapacity(bool),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4).prop_map(Op::Append),
        (0usize..10, 0usize..4).prop_map(|(o, c)| Op::Remove(o, c)),
        (0usize..12).prop_map(Op::SetCapacity),
        (0usize..12).prop_map(Op::SetLength),
        (0usize..10, prop::collection::vec(prop::option::of(any::<i32>()), 0..5))
            .prop_map(|(o, xs)| Op::Put(o, xs)),
        Just(Op::Compress),
        any::<bool>().prop_map(Op::FreezeCapacity),
    ]
}

fn slots() -> impl Strategy<Value = Vec<Option<i32>>> {
    prop::collection::vec(prop::option::of(any::<i32>()), 0..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn invariants_hold_across_random_operations(ops in prop::collection::vec(op(), 0..40)) {
        let structure = sample();
        let mut array = StructureArray::new(Arc::clone(&structure));
        for op in ops {
            let _ = match op {
                Op::Append(count) => array.append(count).map(|_| ()),
                Op::Remove(offset, count) => array.remove(offset, count),
                Op::SetCapacity(capacity) => array.set_capacity(capacity),
                Op::SetLength(length) => array.set_length(length).map(|_| ()),
                Op::Put(offset, xs) => {
                    let mut source: Vec<_> =
                        xs.iter().map(|x| x.map(|x| element(&structure, x))).collect();
                    array.put(offset, source.len(), &mut source, 0).map(|_| ())
                }
                Op::Compress => array.compress().map(|_| ()),
                Op::FreezeCapacity(frozen) => {
                    array.set_capacity_mutable(!frozen);
                    Ok(())
                }
            };
            prop_assert!(array.len() <= array.capacity());
            for index in 0..array.capacity() {
                if let Some(element) = array.element(index) {
                    prop_assert!(Structure::same_type(element.structure(), &structure));
                }
            }
        }
    }

    #[test]
    fn compress_is_idempotent_and_never_grows(xs in slots()) {
        let structure = sample();
        let mut array = build(&structure, &xs);
        let before = array.len();

        array.compress().expect("可缩容");
        let once = snapshot(&array);
        prop_assert!(array.len() <= before);
        prop_assert_eq!(array.len(), xs.iter().filter(|x| x.is_some()).count());

        array.compress().expect("可缩容");
        prop_assert_eq!(snapshot(&array), once);
    }

    #[test]
    fn compress_keeps_exactly_the_present_elements_in_order(xs in slots()) {
        let structure = sample();
        let mut array = build(&structure, &xs);
        array.compress().expect("可缩容");

        let survivors: Vec<_> = xs.iter().flatten().map(|x| Some(ScalarValue::Int(*x))).collect();
        let (capacity, length, slots) = snapshot(&array);
        prop_assert_eq!((capacity, length), (survivors.len(), survivors.len()));
        prop_assert_eq!(slots, survivors);
    }

    #[test]
    fn two_step_shrink_matches_direct_shrink(
        xs in slots(),
        (first, second) in (0usize..12, 0usize..12).prop_map(|(a, b)| (a.max(b), a.min(b))),
    ) {
        let structure = sample();
        let mut stepped = build(&structure, &xs);
        let mut direct = build(&structure, &xs);
        prop_assume!(first < stepped.capacity());

        stepped.set_capacity(first).expect("可缩容");
        stepped.set_capacity(second).expect("可缩容");
        direct.set_capacity(second).expect("可缩容");
        prop_assert_eq!(snapshot(&stepped), snapshot(&direct));
    }

    #[test]
    fn serialize_then_deserialize_reproduces_slots(
        xs in slots(),
        capacity in 5usize..16,
        chunk in 1usize..8,
    ) {
        let structure = sample();
        let array = build(&structure, &xs);

        let mut buffer = ByteBuffer::new(capacity);
        let mut flusher = VecFlusher::new();
        array.serialize(&mut buffer, &mut flusher).expect("编码");
        let bytes = flusher.finish(&mut buffer);

        let mut decoded = StructureArray::new(Arc::clone(&structure));
        let mut buffer = ByteBuffer::new(capacity);
        let mut feeder = SliceFeeder::new(&bytes, chunk);
        prop_assert_eq!(decoded.deserialize(&mut buffer, &mut feeder).expect("解码"), Some(xs.len()));
        prop_assert_eq!(decoded.as_slice(), array.as_slice());
    }
}
