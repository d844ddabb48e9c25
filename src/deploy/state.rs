//! deploy::state
//!
//! Lifecycle of the staging worktree during one deployment.
//!
//! ```text
//! Absent -> Created -> ContentStaged -+-> SkippedNoChange ------------------------------+
//!                                     |                                                 |
//!                                     +-> Committed -> PushedDirectly    -+-> Restored <-+
//!                                                   \-> PushedAfterRebase-+      |
//!                                                       [ArtifactUploaded -> PagesDeployed]
//!                                                                                v
//!                                                                             Removed
//! ```
//!
//! Finalization may jump from any state to `Restored` (when content is still
//! away from the source directory) and to `Removed`.

/// Where a deployment currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorktreeState {
    /// No staging worktree exists.
    Absent,
    /// Staging worktree registered and checked out on the target branch.
    Created,
    /// Source content renamed into the staging worktree and staged.
    ContentStaged,
    /// Staged content was identical to the branch tip.
    SkippedNoChange,
    /// A commit with the staged content exists locally.
    Committed,
    /// The first push succeeded.
    PushedDirectly,
    /// The push succeeded after one rebase onto the remote branch.
    PushedAfterRebase,
    /// The staging tree was uploaded as a build artifact.
    ArtifactUploaded,
    /// The Pages deployment request was accepted.
    PagesDeployed,
    /// Content is back in the source directory.
    Restored,
    /// The staging worktree is unregistered and gone.
    Removed,
}

impl WorktreeState {
    /// Whether source content currently lives inside the staging worktree.
    ///
    /// This is the only signal finalization uses to decide whether a
    /// restorative move is owed.
    pub fn content_moved(self) -> bool {
        matches!(
            self,
            WorktreeState::ContentStaged
                | WorktreeState::SkippedNoChange
                | WorktreeState::Committed
                | WorktreeState::PushedDirectly
                | WorktreeState::PushedAfterRebase
                | WorktreeState::ArtifactUploaded
                | WorktreeState::PagesDeployed
        )
    }

    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_transition_to(self, next: WorktreeState) -> bool {
        use WorktreeState::*;

        match (self, next) {
            (_, Removed) => true,
            (from, Restored) => from.content_moved(),
            (Absent, Created) => true,
            (Created, ContentStaged) => true,
            (ContentStaged, SkippedNoChange | Committed) => true,
            (Committed, PushedDirectly | PushedAfterRebase) => true,
            (PushedDirectly | PushedAfterRebase, ArtifactUploaded) => true,
            (ArtifactUploaded, PagesDeployed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for WorktreeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WorktreeState::Absent => "absent",
            WorktreeState::Created => "created",
            WorktreeState::ContentStaged => "content staged",
            WorktreeState::SkippedNoChange => "skipped (no change)",
            WorktreeState::Committed => "committed",
            WorktreeState::PushedDirectly => "pushed",
            WorktreeState::PushedAfterRebase => "pushed after rebase",
            WorktreeState::ArtifactUploaded => "artifact uploaded",
            WorktreeState::PagesDeployed => "pages deployed",
            WorktreeState::Restored => "restored",
            WorktreeState::Removed => "removed",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::WorktreeState::*;
    use super::*;

    const ALL: [WorktreeState; 11] = [
        Absent,
        Created,
        ContentStaged,
        SkippedNoChange,
        Committed,
        PushedDirectly,
        PushedAfterRebase,
        ArtifactUploaded,
        PagesDeployed,
        Restored,
        Removed,
    ];

    #[test]
    fn happy_path_is_legal() {
        let path = [
            Absent,
            Created,
            ContentStaged,
            Committed,
            PushedAfterRebase,
            ArtifactUploaded,
            PagesDeployed,
            Restored,
            Removed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn no_change_path_is_legal() {
        assert!(ContentStaged.can_transition_to(SkippedNoChange));
        assert!(SkippedNoChange.can_transition_to(Restored));
        assert!(!SkippedNoChange.can_transition_to(Committed));
    }

    #[test]
    fn restore_requires_moved_content() {
        for state in ALL {
            assert_eq!(state.can_transition_to(Restored), state.content_moved());
        }
    }

    #[test]
    fn removal_always_allowed() {
        for state in ALL {
            assert!(state.can_transition_to(Removed));
        }
    }

    #[test]
    fn skipping_steps_rejected() {
        assert!(!Absent.can_transition_to(ContentStaged));
        assert!(!Created.can_transition_to(Committed));
        assert!(!Committed.can_transition_to(ArtifactUploaded));
        assert!(!PushedDirectly.can_transition_to(PagesDeployed));
    }

    #[test]
    fn content_moved_window() {
        assert!(!Absent.content_moved());
        assert!(!Created.content_moved());
        assert!(ContentStaged.content_moved());
        assert!(PagesDeployed.content_moved());
        assert!(!Restored.content_moved());
        assert!(!Removed.content_moved());
    }
}
