use super::*;
use ktc_common::Interner;

fn named_class(interner: &mut Interner, table: &mut DescriptorTable, name: &str) -> ClassId {
    let atom = interner.intern(name);
    table.add_class(ClassDescriptor {
        name: atom,
        fq_name: atom,
        ..ClassDescriptor::default()
    })
}

#[test]
fn add_callable_links_members_and_constructors() {
    let mut interner = Interner::new();
    let mut table = DescriptorTable::new();
    let c = named_class(&mut interner, &mut table, "C");

    let mut ctor = CallableDescriptor::new(interner.intern("<init>"), CallableKind::Constructor, TypeId::DONT_CARE);
    ctor.containing = Container::Class(c);
    let ctor = table.add_callable(ctor);

    let foo_name = interner.intern("foo");
    let mut foo = CallableDescriptor::new(foo_name, CallableKind::Function, TypeId::DONT_CARE);
    foo.containing = Container::Class(c);
    let foo = table.add_callable(foo);

    let mut prop = CallableDescriptor::new(interner.intern("x"), CallableKind::Property { getter: None, setter: None }, TypeId::DONT_CARE);
    prop.containing = Container::Class(c);
    let prop = table.add_callable(prop);

    let mut getter = CallableDescriptor::new(interner.intern("getX"), CallableKind::PropertyGetter { property: prop }, TypeId::DONT_CARE);
    getter.containing = Container::Class(c);
    let getter = table.add_callable(getter);
    table.set_accessors(prop, Some(getter), None);

    let class = table.class(c).unwrap();
    assert_eq!(class.constructors, vec![ctor]);
    assert_eq!(class.members, vec![foo, prop]);
    assert_eq!(table.members_named(c, foo_name), vec![foo]);
    assert_eq!(table.declared_properties(c), vec![prop]);
    assert!(matches!(
        table.callable(prop).unwrap().kind,
        CallableKind::Property { getter: Some(g), setter: None } if g == getter
    ));
}

#[test]
fn statics_and_nested_constructors_are_found_by_name() {
    let mut interner = Interner::new();
    let mut table = DescriptorTable::new();
    let outer = named_class(&mut interner, &mut table, "Outer");
    let nested_name = interner.intern("Nested");
    let nested = table.add_nested_class(
        outer,
        ClassDescriptor {
            name: nested_name,
            ..ClassDescriptor::default()
        },
    );
    let mut ctor = CallableDescriptor::new(nested_name, CallableKind::Constructor, TypeId::DONT_CARE);
    ctor.containing = Container::Class(nested);
    let ctor = table.add_callable(ctor);

    let create = interner.intern("create");
    let stat = table.add_static_callable(
        outer,
        CallableDescriptor::new(create, CallableKind::Function, TypeId::DONT_CARE),
    );

    assert_eq!(table.class(nested).unwrap().containing, Some(outer));
    assert_eq!(table.nested_class_constructors_named(outer, nested_name), vec![ctor]);
    assert!(table.nested_class_constructors_named(outer, create).is_empty());
    assert_eq!(table.static_members_named(outer, create), vec![stat]);
    assert!(table.members_named(outer, create).is_empty());
}

#[test]
fn inner_class_constructors_are_not_reachable_statically() {
    let mut interner = Interner::new();
    let mut table = DescriptorTable::new();
    let outer = named_class(&mut interner, &mut table, "Outer");
    let inner_name = interner.intern("Inner");
    let inner = table.add_nested_class(
        outer,
        ClassDescriptor {
            name: inner_name,
            is_inner: true,
            ..ClassDescriptor::default()
        },
    );
    let mut ctor = CallableDescriptor::new(inner_name, CallableKind::Constructor, TypeId::DONT_CARE);
    ctor.containing = Container::Class(inner);
    let ctor = table.add_callable(ctor);

    assert!(table.nested_class_constructors_named(outer, inner_name).is_empty());
    assert_eq!(table.inner_class_constructors_named(outer, inner_name), vec![ctor]);
}

#[test]
fn parents_with_self_walks_containers() {
    let mut interner = Interner::new();
    let mut table = DescriptorTable::new();
    let outer = named_class(&mut interner, &mut table, "Outer");
    let inner = table.add_nested_class(
        outer,
        ClassDescriptor {
            name: interner.intern("Inner"),
            ..ClassDescriptor::default()
        },
    );
    let mut f = CallableDescriptor::new(interner.intern("f"), CallableKind::Function, TypeId::DONT_CARE);
    f.containing = Container::Class(inner);
    let f = table.add_callable(f);
    let mut local = CallableDescriptor::new(interner.intern("v"), CallableKind::LocalVariable, TypeId::DONT_CARE);
    local.containing = Container::Callable(f);
    let local = table.add_callable(local);

    assert_eq!(
        table.parents_with_self(local),
        vec![
            Container::Callable(local),
            Container::Callable(f),
            Container::Class(inner),
            Container::Class(outer),
        ]
    );
}

#[test]
fn type_params_link_to_owner() {
    let mut interner = Interner::new();
    let mut table = DescriptorTable::new();
    let list = named_class(&mut interner, &mut table, "List");
    let t = table.add_type_param(TypeParameterDescriptor {
        name: interner.intern("T"),
        variance: Variance::Out,
        upper_bounds: Vec::new(),
        owner: TypeParamOwner::Class(list),
        reified: false,
    });
    assert_eq!(table.class(list).unwrap().type_params, vec![t]);
    assert_eq!(table.type_param(t).unwrap().variance, Variance::Out);
    assert_eq!(table.find_class_by_fq_name(interner.intern("List")), Some(list));
}

#[test]
fn table_deserializes_from_json() {
    let json = r#"{
        "classes": [{ "name": 1, "fq_name": 1, "modality": "open" }],
        "callables": [{
            "name": 2,
            "kind": { "kind": "property" },
            "containing": { "kind": "class", "id": 0 },
            "return_type": 1,
            "flags": "VAR"
        }]
    }"#;
    let table: DescriptorTable = serde_json::from_str(json).unwrap();
    assert_eq!(table.class_count(), 1);
    assert!(table.class(ClassId(0)).unwrap().modality.is_overridable());
    let prop = table.callable(CallableId(0)).unwrap();
    assert!(prop.is_var());
    assert!(prop.kind.is_property());
    assert_eq!(prop.containing_class(), Some(ClassId(0)));
}

#[test]
fn callable_kind_labels() {
    assert_eq!(CallableKind::Constructor.label(), "constructor");
    assert!(CallableKind::Constructor.is_function_like());
    assert!(CallableKind::PropertySetter { property: CallableId(0) }.is_accessor());
    assert!(!CallableKind::LocalVariable.is_property());
}
