use super::*;
use crate::descriptors::ClassDescriptor;

fn class_with_supers(table: &mut DescriptorTable, supers: &[ClassId]) -> ClassId {
    table.add_class(ClassDescriptor {
        supertypes: supers.to_vec(),
        ..ClassDescriptor::default()
    })
}

#[test]
fn closure_is_breadth_first_and_deduplicated() {
    let mut table = DescriptorTable::new();
    let any = class_with_supers(&mut table, &[]);
    let a = class_with_supers(&mut table, &[any]);
    let b = class_with_supers(&mut table, &[any]);
    let c = class_with_supers(&mut table, &[a, b]);
    let hierarchy = ClassHierarchy::new(&table);
    assert_eq!(hierarchy.supertype_closure(c), vec![a, b, any]);
    assert!(hierarchy.is_subclass_of(c, any));
    assert!(hierarchy.is_subclass_of(c, c));
    assert!(!hierarchy.is_subclass_of(a, b));
}

#[test]
fn cyclic_supertypes_terminate() {
    let mut table = DescriptorTable::new();
    let a = class_with_supers(&mut table, &[]);
    let b = class_with_supers(&mut table, &[a]);
    if let Some(desc) = table.class_mut(a) {
        desc.supertypes.push(b);
    }
    let hierarchy = ClassHierarchy::new(&table);
    assert_eq!(hierarchy.supertype_closure(a), vec![b]);
    assert!(hierarchy.is_subclass_of(a, b));
}

#[test]
fn receiver_applicability_uses_class_identity() {
    let mut table = DescriptorTable::new();
    let base = class_with_supers(&mut table, &[]);
    let derived = class_with_supers(&mut table, &[base]);
    let types = TypeInterner::new();
    let base_ty = types.class(base);
    let derived_ty = types.class(derived);
    let hierarchy = ClassHierarchy::new(&table);
    assert!(hierarchy.is_receiver_applicable(&types, derived_ty, base_ty));
    assert!(!hierarchy.is_receiver_applicable(&types, base_ty, derived_ty));
    assert!(!hierarchy.is_receiver_applicable(&types, TypeId::ERROR, base_ty));
}
