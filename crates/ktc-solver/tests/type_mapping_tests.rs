use super::*;
use crate::descriptors::{
    CallableDescriptor, CallableKind, ClassDescriptor, ClassId, Container, Modality,
    TypeParamOwner, TypeParameterDescriptor,
};
use crate::types::{AnnotationList, TypeArgs};
use ktc_common::Interner;

struct World {
    interner: Interner,
    table: DescriptorTable,
    types: TypeInterner,
    names: KnownNames,
}

impl World {
    fn new() -> Self {
        let mut interner = Interner::new();
        let names = KnownNames::new(&mut interner);
        Self {
            interner,
            table: DescriptorTable::new(),
            types: TypeInterner::new(),
            names,
        }
    }

    fn class(&mut self, fq: &str, modality: Modality, params: &[Variance]) -> ClassId {
        let fq_name = self.interner.intern(fq);
        let id = self.table.add_class(ClassDescriptor {
            fq_name,
            modality,
            ..ClassDescriptor::default()
        });
        for variance in params {
            self.table.add_type_param(TypeParameterDescriptor {
                name: fq_name,
                variance: *variance,
                upper_bounds: Vec::new(),
                owner: TypeParamOwner::Class(id),
                reified: false,
            });
        }
        id
    }

    fn param(&self, class: ClassId) -> TypeParamId {
        match self.table.class(class) {
            Some(c) => c.type_params[0],
            None => panic!("class {class:?} missing"),
        }
    }

    fn annotated(&self, class: ClassId, arg: TypeArgument, annotations: &[AnnotationRef]) -> TypeId {
        self.types.intern(TypeData::Class {
            class,
            args: TypeArgs::from_slice(&[arg]),
            nullable: false,
            annotations: AnnotationList::from_slice(annotations),
        })
    }

    fn mapper(&self) -> TypeMapper<'_> {
        TypeMapper::new(&self.types, &self.table, &self.names)
    }
}

struct Fixture {
    w: World,
    out_box: ClassId,
    sink: ClassId,
    array: ClassId,
    string: TypeId,
    base: TypeId,
    any: TypeId,
    suppress: ClassId,
    wildcard: ClassId,
}

fn fixture() -> Fixture {
    let mut w = World::new();
    let out_box = w.class("a.OutBox", Modality::Final, &[Variance::Out]);
    let sink = w.class("a.Sink", Modality::Final, &[Variance::In]);
    let array = w.class("kotlin.Array", Modality::Final, &[Variance::Invariant]);
    let string_class = w.class("kotlin.String", Modality::Final, &[]);
    let base_class = w.class("a.Base", Modality::Open, &[]);
    let any_class = w.class("kotlin.Any", Modality::Open, &[]);
    let suppress = w.class("kotlin.jvm.JvmSuppressWildcards", Modality::Final, &[]);
    let wildcard = w.class("kotlin.jvm.JvmWildcard", Modality::Final, &[]);
    let string = w.types.class(string_class);
    let base = w.types.class(base_class);
    let any = w.types.class(any_class);
    Fixture {
        w,
        out_box,
        sink,
        array,
        string,
        base,
        any,
        suppress,
        wildcard,
    }
}

#[test]
fn star_is_unbounded() {
    let f = fixture();
    let mapper = f.w.mapper();
    assert_eq!(
        mapper.wildcard_for_argument(f.w.param(f.out_box), TypeArgument::Star, &TypeMappingMode::DEFAULT),
        Wildcard::Unbounded
    );
}

#[test]
fn covariant_parameter_gets_extends_unless_precise() {
    let f = fixture();
    let mapper = f.w.mapper();
    let p = f.w.param(f.out_box);
    let s = TypeArgument::invariant(f.string);
    let b = TypeArgument::invariant(f.base);

    assert_eq!(
        mapper.wildcard_for_argument(p, s, &TypeMappingMode::DEFAULT),
        Wildcard::Extends(f.string)
    );
    assert_eq!(
        mapper.wildcard_for_argument(p, s, &TypeMappingMode::VALUE_PARAMETER),
        Wildcard::None(f.string)
    );
    assert_eq!(
        mapper.wildcard_for_argument(p, b, &TypeMappingMode::VALUE_PARAMETER),
        Wildcard::Extends(f.base)
    );
    assert_eq!(
        mapper.wildcard_for_argument(p, b, &TypeMappingMode::RETURN_TYPE),
        Wildcard::None(f.base)
    );
}

#[test]
fn contravariant_parameter_gets_super_unless_any() {
    let f = fixture();
    let mapper = f.w.mapper();
    let p = f.w.param(f.sink);
    assert_eq!(
        mapper.wildcard_for_argument(p, TypeArgument::invariant(f.any), &TypeMappingMode::VALUE_PARAMETER),
        Wildcard::None(f.any)
    );
    assert_eq!(
        mapper.wildcard_for_argument(p, TypeArgument::invariant(f.string), &TypeMappingMode::VALUE_PARAMETER),
        Wildcard::Super(f.string)
    );
}

#[test]
fn use_site_projection_on_invariant_parameter_is_kept() {
    let f = fixture();
    let mapper = f.w.mapper();
    let p = f.w.param(f.array);
    let arg = TypeArgument::projected(Variance::Out, f.string);
    assert_eq!(
        mapper.wildcard_for_argument(p, arg, &TypeMappingMode::RETURN_TYPE),
        Wildcard::Extends(f.string)
    );
    assert_eq!(
        mapper.wildcard_for_argument(p, TypeArgument::invariant(f.string), &TypeMappingMode::DEFAULT),
        Wildcard::None(f.string)
    );
}

#[test]
fn contradictory_projection_maps_to_extends() {
    let f = fixture();
    let mapper = f.w.mapper();
    let p = f.w.param(f.sink);
    let arg = TypeArgument::projected(Variance::Out, f.string);
    assert_eq!(
        mapper.wildcard_for_argument(p, arg, &TypeMappingMode::VALUE_PARAMETER),
        Wildcard::Extends(f.string)
    );
}

#[test]
fn suppress_wildcards_on_type_switches_mode() {
    let f = fixture();
    let mapper = f.w.mapper();
    let base_arg = TypeArgument::invariant(f.base);

    let suppressed = f.w.annotated(f.out_box, base_arg, &[AnnotationRef::new(f.suppress)]);
    assert_eq!(
        mapper.argument_wildcards(suppressed, &TypeMappingMode::DEFAULT),
        vec![Wildcard::None(f.base)]
    );

    let not_suppressed = f.w.annotated(
        f.out_box,
        base_arg,
        &[AnnotationRef {
            class: f.suppress,
            value: Some(false),
        }],
    );
    assert_eq!(
        mapper.argument_wildcards(not_suppressed, &TypeMappingMode::RETURN_TYPE),
        vec![Wildcard::Extends(f.base)]
    );
}

#[test]
fn jvm_wildcard_forces_wildcards_and_falls_back_for_arguments() {
    let f = fixture();
    let mapper = f.w.mapper();
    let forced = f.w.annotated(
        f.out_box,
        TypeArgument::invariant(f.string),
        &[AnnotationRef::new(f.wildcard)],
    );
    let mode = mapper.update_argument_mode_from_annotations(&TypeMappingMode::VALUE_PARAMETER, forced);
    assert!(!mode.skip_declaration_site_wildcards);
    assert_eq!(mode.argument_mode(), TypeMappingMode::VALUE_PARAMETER);
    assert_eq!(
        mapper.argument_wildcards(forced, &TypeMappingMode::VALUE_PARAMETER),
        vec![Wildcard::Extends(f.string)]
    );

    let plain = f.w.types.generic(f.out_box, [TypeArgument::invariant(f.string)]);
    assert_eq!(
        mapper.update_argument_mode_from_annotations(&TypeMappingMode::VALUE_PARAMETER, plain),
        TypeMappingMode::VALUE_PARAMETER
    );
}

#[test]
fn mode_extracted_from_enclosing_declaration() {
    let mut f = fixture();
    let name = f.w.interner.intern("Holder");
    let holder = f.w.table.add_class(ClassDescriptor {
        name,
        annotations: vec![AnnotationRef::new(f.suppress)],
        ..ClassDescriptor::default()
    });
    let mut method = CallableDescriptor::new(name, CallableKind::Function, f.string);
    method.containing = Container::Class(holder);
    let method = f.w.table.add_callable(method);
    let free = f
        .w
        .table
        .add_callable(CallableDescriptor::new(name, CallableKind::Function, f.string));

    let generic = f.w.types.generic(f.out_box, [TypeArgument::invariant(f.base)]);
    let mapper = f.w.mapper();

    let mode = mapper.extract_type_mapping_mode_from_annotation(Some(method), generic, false);
    assert_eq!(
        mode,
        Some(TypeMappingMode::with_constant_declaration_site_wildcards(true, false, None))
    );
    assert_eq!(
        mapper.extract_type_mapping_mode_from_annotation(Some(method), f.string, false),
        Some(TypeMappingMode::DEFAULT)
    );
    assert_eq!(
        mapper.extract_type_mapping_mode_from_annotation(Some(free), generic, false),
        None
    );
    assert_eq!(
        mapper.extract_type_mapping_mode_from_annotation(None, generic, true),
        None
    );
}

#[test]
fn collection_methods_keep_wildcards_through_overrides() {
    let mut f = fixture();
    let add_all = f.w.interner.intern("addAll");
    let fq = f.w.interner.intern("kotlin.MutableList.addAll");
    let mut base = CallableDescriptor::new(add_all, CallableKind::Function, f.string);
    base.fq_name = fq;
    let base = f.w.table.add_callable(base);
    let mut derived = CallableDescriptor::new(add_all, CallableKind::Function, f.string);
    derived.overridden = vec![base];
    let derived = f.w.table.add_callable(derived);
    let other = f
        .w
        .table
        .add_callable(CallableDescriptor::new(add_all, CallableKind::Function, f.string));

    let mapper = f.w.mapper();
    assert!(mapper.is_method_with_declaration_site_wildcards(base));
    assert!(mapper.is_method_with_declaration_site_wildcards(derived));
    assert!(!mapper.is_method_with_declaration_site_wildcards(other));
}
