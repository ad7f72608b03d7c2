//! Data layouts for operation inputs and outputs.

use crate::ProgramError;
use rustc_hash::FxHashMap;

/// How a tuple of values is addressed by an operation: an ordered run of
/// stack-passed names followed by any number of named local-slot bindings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    /// Stack-passed names, bottom to top.
    pub stack: Vec<String>,
    /// `(name, slot)` local bindings.
    pub locals: Vec<(String, u32)>,
}

impl Layout {
    /// Creates a layout from stack names and local bindings.
    pub fn new(
        stack: impl IntoIterator<Item = impl Into<String>>,
        locals: impl IntoIterator<Item = (impl Into<String>, u32)>,
    ) -> Self {
        Self {
            stack: stack.into_iter().map(Into::into).collect(),
            locals: locals.into_iter().map(|(name, slot)| (name.into(), slot)).collect(),
        }
    }

    /// Creates a layout with stack-passed names only.
    pub fn stack_only(stack: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(stack, std::iter::empty::<(String, u32)>())
    }

    /// Total number of names in the layout.
    #[must_use]
    pub fn size(&self) -> usize {
        self.stack.len() + self.locals.len()
    }

    /// Returns true if the layout binds no names at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty() && self.locals.is_empty()
    }

    /// Iterates all names: stack names first, then local names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stack.iter().map(String::as_str).chain(self.locals.iter().map(|(name, _)| name.as_str()))
    }

    /// Checks that every local binding claims a distinct slot.
    pub(crate) fn validate(&self) -> Result<(), ProgramError> {
        let mut slots = FxHashMap::default();
        for (name, slot) in &self.locals {
            if let Some(existing) = slots.insert(*slot, name.as_str()) {
                return Err(ProgramError::SlotConflict {
                    name: name.clone(),
                    existing: existing.to_string(),
                    slot: *slot,
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
    fn names_order() {
        let layout = Layout::new(["a", "b"], [("c", 0), ("d", 3)]);
        assert_eq!(layout.size(), 4);
        assert_eq!(layout.names().collect::<Vec<_>>(), ["a", "b", "c", "d"]);
    }

    #[test]
    fn slot_conflict() {
        let layout = Layout::new(["a"], [("x", 2), ("y", 2)]);
        assert_eq!(
            layout.validate(),
            Err(ProgramError::SlotConflict {
                name: "y".into(),
                existing: "x".into(),
                slot: 2
            })
        );
    }

    #[test]
    fn sparse_slots_ok() {
        let layout = Layout::new(Vec::<String>::new(), [("x", 0), ("y", 7)]);
        assert_eq!(layout.validate(), Ok(()));
    }
}
