//! Binding plans.
//!
//! A [`BindingPlan`] is produced once per handler or dependency by the
//! introspector and never changes afterwards. It lists the sourced fields of
//! the request type in declaration order, the validation rules to apply and
//! whether the JSON body is needed.

use hermes_core::{DependencyRef, FieldType, RuleTable, SourceKind};
use hermes_extract::FieldExtractor;

/// One sourced field of a request type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) ty: FieldType,
    pub(crate) extractor: FieldExtractor,
    pub(crate) rule: Option<String>,
}

impl FieldSlot {
    /// Position of the field in the request type's declaration.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared semantic type.
    #[must_use]
    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    /// The chosen extractor.
    #[must_use]
    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    /// Source kind of the extractor.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.extractor.kind()
    }

    /// Validation rule, verbatim.
    #[must_use]
    pub fn rule(&self) -> Option<&str> {
        self.rule.as_deref()
    }

    /// Dependency reference, for dependency-sourced fields.
    #[must_use]
    pub fn dependency(&self) -> Option<&DependencyRef> {
        self.extractor.dependency()
    }
}

/// Immutable description of how to bind one request type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingPlan {
    pub(crate) type_name: String,
    pub(crate) response_type: &'static str,
    pub(crate) slots: Vec<FieldSlot>,
    pub(crate) rules: RuleTable,
    pub(crate) needs_body: bool,
}

impl BindingPlan {
    /// Name of the request type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Name of the response (or dependency output) type.
    #[must_use]
    pub fn response_type(&self) -> &'static str {
        self.response_type
    }

    /// Sourced fields in declaration order.
    #[must_use]
    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    /// Validation rules by field, including fields without a source.
    #[must_use]
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Returns `true` if this request type itself reads the JSON body.
    ///
    /// Dependencies may need the body too; see
    /// [`DependencyRegistry::needs_body`](crate::DependencyRegistry::needs_body).
    #[must_use]
    pub fn reads_body(&self) -> bool {
        self.needs_body
    }

    /// Names of the dependencies referenced directly by this plan, in field
    /// order and without duplicates.
    #[must_use]
    pub fn dependencies(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for dep in self.slots.iter().filter_map(FieldSlot::dependency) {
            if !names.contains(&dep.name()) {
                names.push(dep.name());
            }
        }
        names
    }
}
