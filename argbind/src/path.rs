/*!
Navigation from the root of a destination value to the storage of a single
field, through embedded and optional nested records.
*/

use core::fmt;

use joinery::JoinableIterator as _;

use crate::reflect::{Record, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Step {
    pub index: usize,
    pub name: &'static str,
}

/// The location of a field relative to the root record, as a list of field
/// indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    steps: Vec<Step>,
}

impl FieldPath {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn child(&self, index: usize, name: &'static str) -> Self {
        let mut steps = self.steps.clone();
        steps.push(Step { index, name });
        Self { steps }
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.steps.iter().map(|step| step.name).join_with("."))
    }
}

/// What to do about an absent optional record along the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Give up.
    Existing,

    /// Create it.
    Allocate,
}

/// Find the storage of the field at `path`. Returns `None` if the path
/// passes through a record that is absent (with [`Access::Existing`]), or
/// that doesn't exist in the value at all.
pub fn resolve<'a>(
    root: &'a mut dyn Record,
    path: &FieldPath,
    access: Access,
) -> Option<&'a mut dyn Slot> {
    let (last, parents) = path.steps.split_last()?;
    descend(root, parents, access)?.field_mut(last.index)
}

/// Find the record at `path`. The empty path is the root itself.
pub fn resolve_record<'a>(
    root: &'a mut dyn Record,
    path: &FieldPath,
    access: Access,
) -> Option<&'a mut dyn Record> {
    descend(root, &path.steps, access)
}

fn descend<'a>(
    mut record: &'a mut dyn Record,
    steps: &[Step],
    access: Access,
) -> Option<&'a mut dyn Record> {
    for step in steps {
        let slot = record.field_mut(step.index)?;

        record = match access {
            Access::Existing => slot.record()?,
            Access::Allocate => slot.allocate()?,
        };
    }

    Some(record)
}
