use std::collections::HashSet;

use crate::keys::ProjectPermission;

/// Multi-permission check expression, evaluated structurally against a
/// resolved permission set. Pure boolean evaluation; nesting is allowed.
#[derive(Debug, Clone)]
pub enum Requirement {
    /// The single key must be present.
    Key(ProjectPermission),
    /// Every sub-requirement must hold.
    All(Vec<Requirement>),
    /// At least one sub-requirement must hold.
    Any(Vec<Requirement>),
}

impl Requirement {
    pub fn all(keys: impl IntoIterator<Item = ProjectPermission>) -> Self {
        Requirement::All(keys.into_iter().map(Requirement::Key).collect())
    }

    pub fn any(keys: impl IntoIterator<Item = ProjectPermission>) -> Self {
        Requirement::Any(keys.into_iter().map(Requirement::Key).collect())
    }

    pub fn satisfied_by(&self, resolved: &HashSet<ProjectPermission>) -> bool {
        match self {
            Requirement::Key(key) => resolved.contains(key),
            Requirement::All(inner) => inner.iter().all(|req| req.satisfied_by(resolved)),
            Requirement::Any(inner) => inner.iter().any(|req| req.satisfied_by(resolved)),
        }
    }
}

impl From<ProjectPermission> for Requirement {
    fn from(key: ProjectPermission) -> Self {
        Requirement::Key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProjectPermission::*;

    fn set(keys: &[ProjectPermission]) -> HashSet<ProjectPermission> {
        keys.iter().copied().collect()
    }

    #[test]
    fn and_requires_every_key() {
        let req = Requirement::all([IssueRead, IssueUpdate]);
        assert!(req.satisfied_by(&set(&[IssueRead, IssueUpdate, CommentRead])));
        assert!(!req.satisfied_by(&set(&[IssueRead])));
    }

    #[test]
    fn or_requires_one_key() {
        let req = Requirement::any([CommentDelete, CommentDeleteOwn]);
        assert!(req.satisfied_by(&set(&[CommentDeleteOwn])));
        assert!(!req.satisfied_by(&set(&[CommentRead])));
    }

    #[test]
    fn nested_expressions_evaluate_structurally() {
        // read AND (delete OR delete_own)
        let req = Requirement::All(vec![
            Requirement::Key(CommentRead),
            Requirement::any([CommentDelete, CommentDeleteOwn]),
        ]);
        assert!(req.satisfied_by(&set(&[CommentRead, CommentDelete])));
        assert!(!req.satisfied_by(&set(&[CommentDelete, CommentDeleteOwn])));
    }

    #[test]
    fn empty_set_only_satisfies_empty_all() {
        let empty = HashSet::new();
        assert!(Requirement::All(vec![]).satisfied_by(&empty));
        assert!(!Requirement::Any(vec![]).satisfied_by(&empty));
        assert!(!Requirement::Key(IssueRead).satisfied_by(&empty));
    }
}
