use proptest::prelude::*;
use sovran_dyn::{DynArray, DynList, DynVar, TypeTag};
use std::cmp::Ordering;

fn scalar() -> impl Strategy<Value = DynVar> {
    prop_oneof![
        any::<i8>().prop_map(DynVar::Char),
        any::<i16>().prop_map(DynVar::Short),
        any::<i32>().prop_map(DynVar::Int),
        any::<u64>().prop_map(DynVar::ULLong),
        (-1.0e9f64..1.0e9).prop_map(DynVar::Double),
        "[a-z]{0,8}".prop_map(DynVar::from),
    ]
}

fn value() -> impl Strategy<Value = DynVar> {
    scalar().prop_recursive(2, 8, 1, |inner| inner.prop_map(|v| DynVar::nested(&v)))
}

proptest! {
    #[test]
    fn test_count_never_exceeds_capacity(values in prop::collection::vec(any::<i32>(), 0..64), start in 0usize..8) {
        let mut array = DynArray::new(start, TypeTag::Int).unwrap();
        for v in &values {
            array.add(&DynVar::Int(*v)).unwrap();
            prop_assert!(array.count() <= array.capacity());
        }
        prop_assert_eq!(array.count(), values.len());
    }

    #[test]
    fn test_sorted_ints_are_ordered(values in prop::collection::vec(any::<i32>(), 0..64)) {
        let mut array = DynArray::new(0, TypeTag::Int).unwrap();
        for v in &values {
            array.add(&DynVar::Int(*v)).unwrap();
        }
        array.sort_ascending();
        let mut expected = values.clone();
        expected.sort();
        let sorted: Vec<DynVar> = array.iter().collect();
        prop_assert_eq!(sorted, expected.into_iter().map(DynVar::Int).collect::<Vec<_>>());
    }

    #[test]
    fn test_var_sort_groups_by_tag(values in prop::collection::vec(value(), 0..32)) {
        let mut array = DynArray::new(0, TypeTag::Var).unwrap();
        for v in &values {
            array.add(v).unwrap();
        }
        array.sort_ascending();
        let sorted: Vec<DynVar> = array.iter().collect();
        for pair in sorted.windows(2) {
            prop_assert!(pair[0].raw_tag() <= pair[1].raw_tag());
            prop_assert_ne!(pair[0].compare(&pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_insert_then_remove_is_identity(
        values in prop::collection::vec(any::<i16>(), 1..32),
        index in 0usize..40,
        extra in any::<i16>(),
    ) {
        let mut array = DynArray::new(0, TypeTag::Short).unwrap();
        for v in &values {
            array.add(&DynVar::Short(*v)).unwrap();
        }
        let before: Vec<DynVar> = array.iter().collect();
        let landed = array.insert_element(index, &DynVar::Short(extra)).unwrap() - 1;
        prop_assert_eq!(array.get(landed), Some(DynVar::Short(extra)));
        array.remove(landed).unwrap();
        prop_assert_eq!(array.iter().collect::<Vec<_>>(), before);
    }

    #[test]
    fn test_list_walks_agree(values in prop::collection::vec(value(), 0..32), removals in prop::collection::vec(0usize..40, 0..8)) {
        let mut list = DynList::new();
        for v in &values {
            list.push(v).unwrap();
        }
        for index in removals {
            list.remove_at(index);
        }
        let forward: Vec<&DynVar> = list.iter().map(|n| n.data()).collect();
        let mut backward: Vec<&DynVar> = list.iter_rev().map(|n| n.data()).collect();
        backward.reverse();
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward.len(), list.count());
        for (index, data) in forward.iter().enumerate() {
            prop_assert_eq!(list.get(index).map(|n| n.data()), Some(*data));
        }
    }

    #[test]
    fn test_integers_render_as_assigned(long in any::<i64>(), ushort in any::<u16>(), whole in any::<i32>()) {
        let mut var = DynVar::new();
        var.assign_long(long);
        prop_assert_eq!(var.render("").unwrap(), long.to_string());
        var.assign_ushort(ushort);
        prop_assert_eq!(var.render("").unwrap(), ushort.to_string());
        var.assign_ldouble(f64::from(whole));
        prop_assert_eq!(var.render("").unwrap(), whole.to_string());
    }

    #[test]
    fn test_copy_survives_clear(v in value()) {
        let mut original = v.clone();
        let copy = original.copy();
        original.clear();
        original.clear();
        prop_assert!(original.is_empty());
        prop_assert_eq!(copy, v);
    }
}
