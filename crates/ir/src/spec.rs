//! Operation signatures and commutativity declarations.

use crate::{Layout, ProgramError};
use smallvec::SmallVec;

/// Declared contract of an external operation: ordered inputs and outputs
/// plus the effect categories it reads (`deps`) and writes (`affects`).
///
/// Category lists preserve declaration order but carry set semantics; a
/// category may not repeat within a list nor appear in both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpSpec {
    /// Input layout.
    pub inputs: Layout,
    /// Output layout.
    pub outputs: Layout,
    /// Effect categories this operation observes.
    pub deps: Vec<String>,
    /// Effect categories this operation mutates.
    pub affects: Vec<String>,
}

impl OpSpec {
    /// Creates a new signature.
    pub fn new(
        inputs: Layout,
        outputs: Layout,
        deps: impl IntoIterator<Item = impl Into<String>>,
        affects: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            inputs,
            outputs,
            deps: deps.into_iter().map(Into::into).collect(),
            affects: affects.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of declared inputs.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.inputs.size()
    }

    /// Returns true if the operation declares no effects at all.
    #[must_use]
    pub fn is_pure(&self) -> bool {
        self.deps.is_empty() && self.affects.is_empty()
    }

    pub(crate) fn validate(&self, op: &str) -> Result<(), ProgramError> {
        self.inputs.validate()?;
        self.outputs.validate()?;

        for (i, category) in self.deps.iter().enumerate() {
            if self.deps[..i].contains(category) {
                return Err(ProgramError::DuplicateCategory {
                    op: op.to_string(),
                    category: category.clone(),
                });
            }
        }
        for (i, category) in self.affects.iter().enumerate() {
            if self.affects[..i].contains(category) {
                return Err(ProgramError::DuplicateCategory {
                    op: op.to_string(),
                    category: category.clone(),
                });
            }
            if self.deps.contains(category) {
                return Err(ProgramError::EffectOverlap {
                    op: op.to_string(),
                    category: category.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A named operation signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpDef {
    /// The operation's unique name.
    pub name: String,
    /// Its signature.
    pub spec: OpSpec,
}

impl OpDef {
    /// Creates a named signature.
    pub fn new(name: impl Into<String>, spec: OpSpec) -> Self {
        Self { name: name.into(), spec }
    }
}

/// One member of a substitution group: an operation name plus a fixed
/// tuple of argument positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    /// The operation name.
    pub name: String,
    /// Argument positions, by index into the original argument list.
    pub params: SmallVec<[u32; 4]>,
}

impl Substitution {
    /// Creates a substitution member.
    pub fn new(name: impl Into<String>, params: impl IntoIterator<Item = u32>) -> Self {
        Self { name: name.into(), params: params.into_iter().collect() }
    }
}

/// A commutativity declaration: two or more equal-arity argument orderings
/// declared equivalent, e.g. `add(0, 1) ≡ add(1, 0)` or the comparison
/// symmetry `lt(0, 1) ≡ gt(1, 0)`.
///
/// Groups are carried through validation and exposed to external search
/// heuristics; the graph builder and scheduling state never consume them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubGroup {
    /// The equivalent orderings.
    pub members: Vec<Substitution>,
}

impl SubGroup {
    /// Creates a group from its members.
    pub fn new(members: impl IntoIterator<Item = Substitution>) -> Self {
        Self { members: members.into_iter().collect() }
    }

    /// Returns true if `name` participates in this group.
    #[must_use]
    pub fn mentions(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name)
    }

    pub(crate) fn validate(&self) -> Result<(), ProgramError> {
        let Some(first) = self.members.first() else {
            return Err(ProgramError::SubGroupTooSmall { name: String::new(), len: 0 });
        };
        if self.members.len() < 2 {
            return Err(ProgramError::SubGroupTooSmall {
                name: first.name.clone(),
                len: self.members.len(),
            });
        }
        let expected = first.params.len();
        for member in &self.members[1..] {
            if member.params.len() != expected {
                return Err(ProgramError::SubGroupArityMismatch {
                    name: member.name.clone(),
                    expected,
                    found: member.params.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_overlap() {
        let spec = OpSpec::new(Layout::default(), Layout::default(), ["storage"], ["storage"]);
        assert_eq!(
            spec.validate("sweep"),
            Err(ProgramError::EffectOverlap { op: "sweep".into(), category: "storage".into() })
        );
    }

    #[test]
    fn duplicate_category() {
        let spec = OpSpec::new(
            Layout::default(),
            Layout::default(),
            ["memory", "memory"],
            std::iter::empty::<&str>(),
        );
        assert_eq!(
            spec.validate("probe"),
            Err(ProgramError::DuplicateCategory { op: "probe".into(), category: "memory".into() })
        );
    }

    #[test]
    fn sub_group_arity() {
        let group = SubGroup::new([
            Substitution::new("addmod", [0, 1, 2]),
            Substitution::new("addmod", [1, 0]),
        ]);
        assert_eq!(
            group.validate(),
            Err(ProgramError::SubGroupArityMismatch {
                name: "addmod".into(),
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn sub_group_too_small() {
        let group = SubGroup::new([Substitution::new("add", [0, 1])]);
        assert!(matches!(group.validate(), Err(ProgramError::SubGroupTooSmall { len: 1, .. })));
    }
}
