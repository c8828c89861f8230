use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashSet;

use super::FieldCodec;
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::info::{FieldDescriptor, GenericScope, TypeArg, TypeDescriptor};

// -----------------------------------------------------------------------------
// FieldPlan

/// The compiled field sequences of one described type.
///
/// Plans are deterministic: fields are ordered by declaring depth
/// descending (ancestors first) and name ascending within a depth, so two
/// descriptors listing the same fields in any order compile to the same
/// wire layout. Transient fields are planned separately and never
/// interleave with active fields.
pub struct FieldPlan {
    active: Vec<FieldCodec>,
    transient: Vec<FieldCodec>,
    bound_args: Option<Vec<TypeArg>>,
    scope: Option<Rc<GenericScope>>,
}

impl core::fmt::Debug for FieldPlan {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldPlan")
            .field("active", &self.active.len())
            .field("transient", &self.transient.len())
            .finish_non_exhaustive()
    }
}

impl FieldPlan {
    /// Compile `descriptor` under `config`, with `args` optionally bound to
    /// the descriptor's generic parameters and `context` the currently
    /// enabled context keys.
    pub(crate) fn build(
        descriptor: &TypeDescriptor,
        config: &CodecConfig,
        args: Option<&[TypeArg]>,
        context: &HashSet<&'static str>,
    ) -> Result<Self, CodecError> {
        let owner = descriptor.name();
        let mut survivors: Vec<&FieldDescriptor> = Vec::new();
        let mut by_name: hashbrown::HashMap<&'static str, usize> = hashbrown::HashMap::new();

        for field in descriptor.fields() {
            if let Some(key) = field.optional_key() {
                if !context.contains(key) {
                    continue;
                }
            }
            match by_name.get(field.name()).copied() {
                None => {
                    by_name.insert(field.name(), survivors.len());
                    survivors.push(field);
                }
                Some(index) => {
                    let held = survivors[index];
                    if held.depth() == field.depth() {
                        return Err(CodecError::DuplicateField {
                            field: field.name(),
                            owner,
                        });
                    }
                    // The most-derived declaration (lowest depth) wins.
                    if field.depth() < held.depth() {
                        log::warn!(
                            "field `{}` of `{owner}` at depth {} shadows the declaration at depth {}",
                            field.name(),
                            field.depth(),
                            held.depth(),
                        );
                        survivors[index] = field;
                    } else {
                        log::warn!(
                            "field `{}` of `{owner}` at depth {} is shadowed by the declaration at depth {}",
                            field.name(),
                            field.depth(),
                            held.depth(),
                        );
                    }
                }
            }
        }

        survivors.sort_by(|a, b| b.depth().cmp(&a.depth()).then(a.name().cmp(b.name())));

        let mut active = Vec::new();
        let mut transient = Vec::new();
        for field in survivors {
            let codec = FieldCodec::new(owner, field);
            if field.is_transient() {
                transient.push(codec);
            } else {
                active.push(codec);
            }
        }
        log::trace!(
            "compiled field plan for `{owner}`: {} active, {} transient",
            active.len(),
            transient.len(),
        );

        let (bound_args, scope) = Self::bind_scope(descriptor, config, args)?;
        Ok(Self {
            active,
            transient,
            bound_args,
            scope,
        })
    }

    /// Recompute only the generic bindings, keeping both field sequences
    /// and any per-field tuning untouched.
    pub(crate) fn rebind(
        &mut self,
        descriptor: &TypeDescriptor,
        config: &CodecConfig,
        args: Option<&[TypeArg]>,
    ) -> Result<(), CodecError> {
        let (bound_args, scope) = Self::bind_scope(descriptor, config, args)?;
        self.bound_args = bound_args;
        self.scope = scope;
        Ok(())
    }

    fn bind_scope(
        descriptor: &TypeDescriptor,
        config: &CodecConfig,
        args: Option<&[TypeArg]>,
    ) -> Result<(Option<Vec<TypeArg>>, Option<Rc<GenericScope>>), CodecError> {
        match args {
            Some(args) if config.optimized_generics() && descriptor.has_params() => {
                let scope = GenericScope::bind(descriptor.name(), descriptor.params(), args)?;
                Ok((Some(args.to_vec()), Some(Rc::new(scope))))
            }
            _ => Ok((None, None)),
        }
    }

    #[inline]
    pub(crate) fn active(&self) -> &[FieldCodec] {
        &self.active
    }

    #[inline]
    pub(crate) fn active_mut(&mut self) -> &mut [FieldCodec] {
        &mut self.active
    }

    #[inline]
    pub(crate) fn transient(&self) -> &[FieldCodec] {
        &self.transient
    }

    #[inline]
    pub(crate) fn scope(&self) -> Option<Rc<GenericScope>> {
        self.scope.clone()
    }

    #[inline]
    pub(crate) fn bound_args(&self) -> Option<&[TypeArg]> {
        self.bound_args.as_deref()
    }

    #[inline]
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.active.iter().position(|field| field.name() == name)
    }

    #[inline]
    pub(crate) fn remove_active_at(&mut self, index: usize) -> Option<FieldCodec> {
        if index < self.active.len() {
            Some(self.active.remove(index))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_value;
    use crate::info::FieldDescriptor;
    use alloc::string::String;
    use alloc::vec;

    #[derive(Debug, Default)]
    struct Animal {
        name: String,
        legs: i32,
        id: i64,
    }

    impl_value!(Animal);

    fn name_field() -> FieldDescriptor {
        FieldDescriptor::value::<Animal, String>("name", |a| &a.name, |a| &mut a.name)
    }

    fn legs_field() -> FieldDescriptor {
        FieldDescriptor::value::<Animal, i32>("legs", |a| &a.legs, |a| &mut a.legs)
    }

    fn id_field() -> FieldDescriptor {
        FieldDescriptor::value::<Animal, i64>("id", |a| &a.id, |a| &mut a.id)
    }

    fn names(plan: &FieldPlan) -> Vec<&'static str> {
        plan.active().iter().map(|f| f.name()).collect()
    }

    #[test]
    fn order_is_depth_descending_then_name_ascending() {
        let context = HashSet::new();
        let config = CodecConfig::new();
        // Declaration order scrambled on purpose.
        let descriptor = TypeDescriptor::of::<Animal>("Animal")
            .field(name_field())
            .field(id_field().at_depth(1))
            .field(legs_field());
        let plan = FieldPlan::build(&descriptor, &config, None, &context).unwrap();
        assert_eq!(names(&plan), vec!["id", "legs", "name"]);

        let reordered = TypeDescriptor::of::<Animal>("Animal")
            .field(legs_field())
            .field(name_field())
            .field(id_field().at_depth(1));
        let plan = FieldPlan::build(&reordered, &config, None, &context).unwrap();
        assert_eq!(names(&plan), vec!["id", "legs", "name"]);
    }

    #[test]
    fn same_depth_duplicate_is_an_error() {
        let context = HashSet::new();
        let descriptor = TypeDescriptor::of::<Animal>("Animal")
            .field(legs_field())
            .field(legs_field());
        let err = FieldPlan::build(&descriptor, &CodecConfig::new(), None, &context).unwrap_err();
        assert!(matches!(
            err,
            CodecError::DuplicateField { field: "legs", .. }
        ));
    }

    #[test]
    fn most_derived_declaration_wins_a_shadow() {
        let context = HashSet::new();
        // `legs` declared both on the type itself and on an ancestor.
        let descriptor = TypeDescriptor::of::<Animal>("Animal")
            .field(legs_field().at_depth(1))
            .field(legs_field());
        let plan = FieldPlan::build(&descriptor, &CodecConfig::new(), None, &context).unwrap();
        assert_eq!(plan.active().len(), 1);
        assert_eq!(plan.active()[0].depth(), 0);

        // Same outcome regardless of which declaration is listed first.
        let descriptor = TypeDescriptor::of::<Animal>("Animal")
            .field(legs_field())
            .field(legs_field().at_depth(1));
        let plan = FieldPlan::build(&descriptor, &CodecConfig::new(), None, &context).unwrap();
        assert_eq!(plan.active()[0].depth(), 0);
    }

    #[test]
    fn optional_fields_require_their_context_key() {
        let config = CodecConfig::new();
        let descriptor = || {
            TypeDescriptor::of::<Animal>("Animal")
                .field(legs_field())
                .field(id_field().optional("audit"))
        };

        let plan = FieldPlan::build(&descriptor(), &config, None, &HashSet::new()).unwrap();
        assert_eq!(names(&plan), vec!["legs"]);

        let mut context = HashSet::new();
        context.insert("audit");
        let plan = FieldPlan::build(&descriptor(), &config, None, &context).unwrap();
        assert_eq!(names(&plan), vec!["id", "legs"]);
    }

    #[test]
    fn transient_fields_plan_separately() {
        let context = HashSet::new();
        let descriptor = TypeDescriptor::of::<Animal>("Animal")
            .field(legs_field().transient())
            .field(name_field());
        let plan = FieldPlan::build(&descriptor, &CodecConfig::new(), None, &context).unwrap();
        assert_eq!(names(&plan), vec!["name"]);
        assert_eq!(plan.transient().len(), 1);
        assert_eq!(plan.transient()[0].name(), "legs");
    }
}
