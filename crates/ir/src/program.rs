//! The validated program: signature table, main contract, statement list.

use crate::{OpDef, OpSpec, ProgramError, Stmt, SubGroup};
use rustc_hash::FxHashSet;

/// A whole program: the table of named external operation signatures, the
/// commutativity declarations, the designated main signature, and the
/// ordered statement list.
///
/// Built once by a front end and immutable thereafter. [`validate`] must
/// pass before the program is handed to the graph builder.
///
/// [`validate`]: Program::validate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    /// Operation definitions, in declaration order. Names are unique.
    pub defs: Vec<OpDef>,
    /// Commutativity declarations, carried through for external heuristics.
    pub sub_groups: Vec<SubGroup>,
    /// The main signature. Its input layout seeds the initial machine
    /// state; its output layout names the bindings that must be live at
    /// the end.
    pub main: OpSpec,
    /// The statement list, in program order.
    pub body: Vec<Stmt>,
}

impl Program {
    /// Creates an empty program with the given main signature.
    #[must_use]
    pub fn new(main: OpSpec) -> Self {
        Self { defs: Vec::new(), sub_groups: Vec::new(), main, body: Vec::new() }
    }

    /// Looks up a signature by name.
    #[must_use]
    pub fn spec(&self, name: &str) -> Option<&OpSpec> {
        self.defs.iter().find(|def| def.name == name).map(|def| &def.spec)
    }

    /// Iterates the substitution groups mentioning `name`.
    pub fn subs_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SubGroup> {
        self.sub_groups.iter().filter(move |group| group.mentions(name))
    }

    /// Checks every structural invariant: unique operation names, unique
    /// local slots per layout, disjoint `deps`/`affects` per signature,
    /// well-formed substitution groups.
    ///
    /// Rejects the whole program on the first defect; no partial state is
    /// ever produced from an invalid program.
    pub fn validate(&self) -> Result<(), ProgramError> {
        let mut names = FxHashSet::default();
        for def in &self.defs {
            if !names.insert(def.name.as_str()) {
                return Err(ProgramError::DuplicateOp { name: def.name.clone() });
            }
            def.spec.validate(&def.name)?;
        }
        self.main.validate("main")?;
        for group in &self.sub_groups {
            group.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Layout;

    fn sstore() -> OpDef {
        OpDef::new(
            "sstore",
            OpSpec::new(
                Layout::stack_only(["key", "value"]),
                Layout::default(),
                std::iter::empty::<&str>(),
                ["storage"],
            ),
        )
    }

    #[test]
    fn duplicate_op() {
        let mut program = Program::new(OpSpec::default());
        program.defs = vec![sstore(), sstore()];
        assert_eq!(
            program.validate(),
            Err(ProgramError::DuplicateOp { name: "sstore".into() })
        );
    }

    #[test]
    fn main_is_validated_too() {
        let mut program = Program::new(OpSpec::default());
        program.main.inputs = Layout::new(["x"], [("a", 1), ("b", 1)]);
        assert!(matches!(
            program.validate(),
            Err(ProgramError::SlotConflict { slot: 1, .. })
        ));
    }

    #[test]
    fn valid_program() {
        let mut program = Program::new(OpSpec::default());
        program.defs = vec![sstore()];
        assert_eq!(program.validate(), Ok(()));
        assert!(program.spec("sstore").is_some());
        assert!(program.spec("mstore").is_none());
    }
}
