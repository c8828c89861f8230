use krait_codec::info::{FieldDescriptor, TypeDescriptor};
use krait_codec::value::Handle;
use krait_codec::{descriptor, impl_value, CodecError, CodecRegistry, Session};
use krait_io::{Input, Output};

#[derive(Debug, Default)]
struct Node {
    value: i32,
    next: Option<Handle>,
}

impl_value!(Node);

fn node_registry() -> CodecRegistry {
    let mut registry = CodecRegistry::new();
    registry
        .register_object(descriptor!(Node {
            value: i32,
            next: handle,
        }))
        .unwrap();
    registry
}

fn node(value: i32) -> Handle {
    Handle::new(Node {
        value,
        next: None,
    })
}

fn link(from: &Handle, to: &Handle) {
    from.try_borrow_mut()
        .unwrap()
        .downcast_mut::<Node>()
        .unwrap()
        .next = Some(to.clone());
}

fn next_of(handle: &Handle) -> Handle {
    handle
        .try_borrow()
        .unwrap()
        .downcast_ref::<Node>()
        .unwrap()
        .next
        .clone()
        .unwrap()
}

fn value_of(handle: &Handle) -> i32 {
    handle
        .try_borrow()
        .unwrap()
        .downcast_ref::<Node>()
        .unwrap()
        .value
}

fn round_trip(registry: &CodecRegistry, root: &Handle) -> Handle {
    let mut session = Session::new(registry);
    let mut out = Output::new();
    session.write_graph(&mut out, root).unwrap();

    session.reset();
    let mut input = Input::new(out.into_bytes());
    let read = session.read_graph(&mut input).unwrap();
    assert_eq!(input.remaining(), 0);
    read
}

#[test]
fn null_references_round_trip() {
    let registry = node_registry();
    let read = round_trip(&registry, &node(7));
    assert_eq!(value_of(&read), 7);
    assert!(read
        .try_borrow()
        .unwrap()
        .downcast_ref::<Node>()
        .unwrap()
        .next
        .is_none());
}

#[test]
fn chains_round_trip() {
    let registry = node_registry();
    let a = node(1);
    let b = node(2);
    link(&a, &b);

    let read = round_trip(&registry, &a);
    assert_eq!(value_of(&read), 1);
    let read_b = next_of(&read);
    assert_eq!(value_of(&read_b), 2);
    assert!(!read.ptr_eq(&read_b));
}

#[test]
fn two_node_cycles_survive_the_wire() {
    let registry = node_registry();
    let a = node(1);
    let b = node(2);
    link(&a, &b);
    link(&b, &a);

    let read_a = round_trip(&registry, &a);
    let read_b = next_of(&read_a);
    assert_eq!(value_of(&read_a), 1);
    assert_eq!(value_of(&read_b), 2);
    // b.next is the very object a was decoded into, not a twin.
    assert!(next_of(&read_b).ptr_eq(&read_a));
}

#[test]
fn self_cycles_survive_the_wire() {
    let registry = node_registry();
    let a = node(9);
    link(&a, &a);

    let read = round_trip(&registry, &a);
    assert!(next_of(&read).ptr_eq(&read));
}

#[test]
fn non_nullable_references_refuse_null_writes() {
    let mut registry = CodecRegistry::new();
    let descriptor = TypeDescriptor::of::<Node>("Node")
        .field(FieldDescriptor::value::<Node, i32>(
            "value",
            |n| &n.value,
            |n| &mut n.value,
        ))
        .field(
            FieldDescriptor::handle::<Node>("next", |n| &n.next, |n| &mut n.next)
                .with_nullable(false),
        );
    registry.register_object(descriptor).unwrap();

    let mut session = Session::new(&registry);
    let mut out = Output::new();
    let err = session
        .write_value(&mut out, &Node { value: 1, next: None })
        .unwrap_err();
    assert!(matches!(
        err,
        CodecError::NullNotAllowed {
            field: "next",
            owner: "Node",
        }
    ));

    // A present reference still writes, with no presence byte ahead of it.
    let target = node(2);
    link(&target, &target);
    session.reset();
    let mut out = Output::new();
    session
        .write_value(
            &mut out,
            &Node {
                value: 1,
                next: Some(target),
            },
        )
        .unwrap();

    session.reset();
    let mut input = Input::new(out.into_bytes());
    let read = session
        .read_value(&mut input, core::any::TypeId::of::<Node>())
        .unwrap();
    let read = read.take::<Node>().unwrap();
    assert_eq!(read.value, 1);
    let inner = read.next.unwrap();
    assert_eq!(value_of(&inner), 2);
    assert!(next_of(&inner).ptr_eq(&inner));
}

// -----------------------------------------------------------------------------
// shared (diamond) references

#[derive(Debug, Default)]
struct Fork {
    left: Option<Handle>,
    right: Option<Handle>,
}

impl_value!(Fork);

fn fork_registry() -> CodecRegistry {
    let mut registry = CodecRegistry::new();
    registry
        .register_object(descriptor!(Node {
            value: i32,
            next: handle,
        }))
        .unwrap();
    registry
        .register_object(descriptor!(Fork {
            left: handle,
            right: handle,
        }))
        .unwrap();
    registry
}

fn diamond() -> Handle {
    let leaf = node(42);
    Handle::new(Fork {
        left: Some(leaf.clone()),
        right: Some(leaf),
    })
}

fn arms(fork: &Handle) -> (Handle, Handle) {
    let borrow = fork.try_borrow().unwrap();
    let fork = borrow.downcast_ref::<Fork>().unwrap();
    (
        fork.left.clone().unwrap(),
        fork.right.clone().unwrap(),
    )
}

#[test]
fn shared_references_stay_shared_after_read() {
    let registry = fork_registry();
    let read = round_trip(&registry, &diamond());
    let (left, right) = arms(&read);
    assert!(left.ptr_eq(&right));
    assert_eq!(value_of(&left), 42);
}

#[test]
fn shared_references_stay_shared_after_copy() {
    let registry = fork_registry();
    let original = diamond();
    let mut session = Session::new(&registry);
    let copy = session.copy_graph(&original).unwrap();

    assert!(!copy.ptr_eq(&original));
    let (orig_left, _) = arms(&original);
    let (left, right) = arms(&copy);
    assert!(left.ptr_eq(&right));
    assert!(!left.ptr_eq(&orig_left));
    assert_eq!(value_of(&left), 42);
}

#[test]
fn cyclic_graphs_copy_without_diverging() {
    let registry = node_registry();
    let a = node(1);
    let b = node(2);
    link(&a, &b);
    link(&b, &a);

    let mut session = Session::new(&registry);
    let copy_a = session.copy_graph(&a).unwrap();
    let copy_b = next_of(&copy_a);
    assert!(!copy_a.ptr_eq(&a));
    assert_eq!(value_of(&copy_b), 2);
    assert!(next_of(&copy_b).ptr_eq(&copy_a));
}

#[test]
fn reset_separates_graphs() {
    let registry = node_registry();
    let shared = node(3);
    let mut session = Session::new(&registry);

    let mut out = Output::new();
    session.write_graph(&mut out, &shared).unwrap();
    session.reset();
    session.write_graph(&mut out, &shared).unwrap();

    session.reset();
    let mut input = Input::new(out.into_bytes());
    let first = session.read_graph(&mut input).unwrap();
    session.reset();
    let second = session.read_graph(&mut input).unwrap();
    // Written as two independent graphs, so they decode as two objects.
    assert!(!first.ptr_eq(&second));
    assert_eq!(value_of(&second), 3);
}
