mod common;

use sovran_dyn::{DynError, DynList, DynVar, TypeTag};
use std::mem::size_of;

fn rendered(list: &DynList) -> Vec<String> {
    list.iter().map(|node| node.data().to_string()).collect()
}

#[test]
fn test_stack_operations() -> Result<(), DynError> {
    common::init_tracing();
    let mut list = DynList::new();
    list.push_back(&DynVar::from("a"))?;
    list.push_back(&DynVar::from("b"))?;
    list.push_back(&DynVar::from("c"))?;

    assert_eq!(list.pop_back(), Some(DynVar::from("c")));
    assert_eq!(rendered(&list), ["a", "b"]);

    assert_eq!(list.remove_at_front(), Some(DynVar::from("a")));
    assert_eq!(rendered(&list), ["b"]);

    assert_eq!(list.pop(), Some(DynVar::from("b")));
    assert_eq!(list.pop(), None);
    assert_eq!(list.remove_at_front(), None);
    Ok(())
}

#[test]
fn test_queue_keeps_arrival_order() -> Result<(), DynError> {
    let mut queue = DynList::new();
    for n in 1..=4 {
        queue.enqueue(&DynVar::Int(n))?;
    }
    let drained: Vec<DynVar> = std::iter::from_fn(|| queue.dequeue()).collect();
    assert_eq!(drained, [1, 2, 3, 4].map(DynVar::Int).to_vec());
    assert!(queue.is_empty());
    Ok(())
}

#[test]
fn test_out_of_range_indices_clamp() -> Result<(), DynError> {
    common::init_tracing();
    let mut list = DynList::new();
    list.insert_at(5, &DynVar::Int(1))?;
    list.insert_at(50, &DynVar::Int(3))?;
    list.insert_at(1, &DynVar::Int(2))?;
    list.insert_at(0, &DynVar::Int(0))?;
    assert_eq!(rendered(&list), ["0", "1", "2", "3"]);

    assert_eq!(list.remove_at(99), Some(DynVar::Int(3)));
    assert_eq!(list.remove_at(0), Some(DynVar::Int(0)));
    assert_eq!(rendered(&list), ["1", "2"]);
    Ok(())
}

#[test]
fn test_get_and_set_are_bounds_checked() -> Result<(), DynError> {
    let mut list = DynList::new();
    for word in ["zero", "one", "two", "three", "four"] {
        list.push(&DynVar::from(word))?;
    }
    // both halves of the list
    assert_eq!(list.get(1).map(|n| n.data().clone()), Some(DynVar::from("one")));
    assert_eq!(list.get(4).map(|n| n.data().clone()), Some(DynVar::from("four")));
    assert!(list.get(5).is_none());

    list.set_at(2, &DynVar::Float(2.5))?;
    assert_eq!(list.render_at(2, ";")?, "2.5;");
    assert_eq!(list.get(2).and_then(|n| n.tag()), Some(TypeTag::Float));
    assert_eq!(
        list.set_at(5, &DynVar::Int(0)),
        Err(DynError::IndexOutOfRange { index: 5, len: 5 })
    );
    assert_eq!(
        list.render_at(7, ";"),
        Err(DynError::IndexOutOfRange { index: 7, len: 5 })
    );
    Ok(())
}

#[test]
fn test_index_of_compares_bytes() -> Result<(), DynError> {
    let mut list = DynList::new();
    list.push(&DynVar::from("stuff"))?;
    list.push(&DynVar::from("crap"))?;
    list.push(&DynVar::Int(7))?;
    list.push(&DynVar::nested(&DynVar::Int(8)))?;

    assert_eq!(list.index_of(&DynVar::from("crap")), Some(1));
    assert_eq!(list.index_of(&DynVar::from("whoops")), None);
    // same width and bytes under another tag still matches
    assert_eq!(list.index_of(&DynVar::UInt(7)), Some(2));
    assert_eq!(list.index_of(&DynVar::Int(8)), None);
    assert_eq!(list.index_of(&DynVar::nested(&DynVar::Int(7))), None);
    Ok(())
}

#[test]
fn test_size_accounting() -> Result<(), DynError> {
    let mut list = DynList::new();
    assert_eq!(list.size(), 0);
    assert_eq!(list.total_size(), DynList::HEADER_SIZE);

    list.push(&DynVar::Int(1))?;
    list.push(&DynVar::from("four"))?;
    list.push(&DynVar::nested(&DynVar::Short(2)))?;

    let nested = size_of::<DynVar>() + 2;
    assert_eq!(list.size(), 4 + 5 + nested);
    assert_eq!(
        list.total_size(),
        DynList::HEADER_SIZE + list.size() + 3 * DynList::NODE_OVERHEAD
    );
    assert_eq!(list.get(1).map(|n| n.element_size()), Some(1));
    assert_eq!(list.get(0).map(|n| n.element_size()), Some(4));

    list.set_at(1, &DynVar::Double(1.0))?;
    assert_eq!(list.size(), 4 + 8 + nested);

    list.clear();
    list.clear();
    assert_eq!(list.count(), 0);
    assert_eq!(list.size(), 0);
    assert_eq!(list.total_size(), DynList::HEADER_SIZE);
    Ok(())
}

#[test]
fn test_render_all_and_reverse_walk() -> Result<(), DynError> {
    let mut list = DynList::new();
    list.push(&DynVar::Char(b'x' as i8))?;
    list.push(&DynVar::from(&[1u8, 2][..]))?;
    list.push(&DynVar::Long(-3))?;

    // the blob has no text form and is skipped
    assert_eq!(list.render(","), "x,-3,");
    let report = list.render_all(",");
    assert!(report.starts_with("Elements: x,-3,\nCount = 3\n"));
    assert!(report.contains(&format!("Size = {} bytes\n", 1 + 2 + 8)));

    let backwards: Vec<DynVar> = list.iter_rev().map(|n| n.data().clone()).collect();
    assert_eq!(backwards.first(), Some(&DynVar::Long(-3)));
    assert_eq!(backwards.last(), Some(&DynVar::Char(b'x' as i8)));
    assert_eq!(list.front(), Some(&DynVar::Char(b'x' as i8)));
    assert_eq!(list.back(), Some(&DynVar::Long(-3)));
    Ok(())
}

#[test]
fn test_nodes_own_copies() -> Result<(), DynError> {
    let mut source = DynVar::from("original");
    let mut list = DynList::new();
    list.push(&source)?;
    source.assign_string("changed")?;
    assert_eq!(list.front().and_then(DynVar::as_str), Some("original"));
    Ok(())
}
