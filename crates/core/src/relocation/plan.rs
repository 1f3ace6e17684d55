//! Path planning for relocations.

use crate::attachment::{Attachment, AttachmentId, Visibility};
use crate::path;
use crate::private_dir::PrivateDir;

/// One file move, relative to the upload root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMove {
    /// Current path.
    pub from: String,
    /// Target path.
    pub to: String,
}

impl FileMove {
    /// Create a move.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// The same move in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.to.clone(), self.from.clone())
    }
}

/// Every move needed to bring an attachment into its target partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    /// Attachment being moved.
    pub attachment_id: AttachmentId,
    /// Partition after the move.
    pub target: Visibility,
    /// Primary file move.
    pub primary: FileMove,
    /// One move per variant, in the attachment's variant order.
    pub variants: Vec<FileMove>,
}

impl RelocationPlan {
    /// Directory the primary file ends up in.
    #[must_use]
    pub fn destination_dir(&self) -> &str {
        path::dirname(&self.primary.to)
    }

    /// New `attached_path`.
    #[must_use]
    pub fn new_path(&self) -> &str {
        &self.primary.to
    }
}

/// Result of planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Files must move.
    Relocate(RelocationPlan),
    /// Already in the target partition.
    NoOp,
}

/// Computes relocation plans against one private directory.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    private_dir: PrivateDir,
}

impl PathPlanner {
    /// Create a planner for `private_dir`.
    #[must_use]
    pub fn new(private_dir: PrivateDir) -> Self {
        Self { private_dir }
    }

    /// Plan the move of `attachment` into `target`.
    ///
    /// The partition is decided by where the primary file lives, not by
    /// the stored flag. Attachments without a primary file never move.
    #[must_use]
    pub fn plan(&self, attachment: &Attachment, target: Visibility) -> PlanOutcome {
        let old = attachment.attached_path.as_str();
        if old.is_empty() {
            return PlanOutcome::NoOp;
        }

        let new = match target {
            Visibility::Private if !self.private_dir.contains(old) => self.private_dir.wrap(old),
            Visibility::Public => match self.private_dir.strip(old) {
                Some(stripped) => stripped.to_string(),
                None => return PlanOutcome::NoOp,
            },
            Visibility::Private => return PlanOutcome::NoOp,
        };

        let old_dir = path::dirname(old);
        let new_dir = path::dirname(&new);
        let variants = attachment
            .variants
            .iter()
            .map(|v| FileMove::new(path::join(old_dir, &v.file), path::join(new_dir, &v.file)))
            .collect();

        PlanOutcome::Relocate(RelocationPlan {
            attachment_id: attachment.id,
            target,
            primary: FileMove::new(old, new),
            variants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> PathPlanner {
        PathPlanner::new(PrivateDir::from_token("abc123"))
    }

    fn image() -> Attachment {
        Attachment::new(42, "img", "2024/img.jpg", "image/jpeg")
            .with_variant("thumbnail", "img-150x150.jpg")
            .with_variant("medium", "img-300x200.jpg")
    }

    fn expect_plan(outcome: PlanOutcome) -> RelocationPlan {
        match outcome {
            PlanOutcome::Relocate(plan) => plan,
            PlanOutcome::NoOp => panic!("expected a relocation plan"),
        }
    }

    #[test]
    fn test_plan_to_private() {
        let plan = expect_plan(planner().plan(&image(), Visibility::Private));

        assert_eq!(plan.attachment_id, AttachmentId(42));
        assert_eq!(plan.primary, FileMove::new("2024/img.jpg", "private-files-abc123/2024/img.jpg"));
        assert_eq!(
            plan.variants,
            vec![
                FileMove::new("2024/img-150x150.jpg", "private-files-abc123/2024/img-150x150.jpg"),
                FileMove::new("2024/img-300x200.jpg", "private-files-abc123/2024/img-300x200.jpg"),
            ]
        );
        assert_eq!(plan.destination_dir(), "private-files-abc123/2024");
    }

    #[test]
    fn test_plan_to_public_strips_prefix() {
        let attachment = Attachment::new(42, "img", "private-files-abc123/2024/img.jpg", "image/jpeg")
            .with_variant("thumbnail", "img-150x150.jpg")
            .with_private(true);
        let plan = expect_plan(planner().plan(&attachment, Visibility::Public));

        assert_eq!(plan.new_path(), "2024/img.jpg");
        assert_eq!(plan.variants[0].to, "2024/img-150x150.jpg");
    }

    #[test]
    fn test_plan_at_upload_root() {
        let attachment = Attachment::new(1, "doc", "doc.pdf", "application/pdf");
        let plan = expect_plan(planner().plan(&attachment, Visibility::Private));
        assert_eq!(plan.new_path(), "private-files-abc123/doc.pdf");
        assert_eq!(plan.destination_dir(), "private-files-abc123");

        let back = expect_plan(planner().plan(
            &Attachment::new(1, "doc", plan.new_path(), "application/pdf"),
            Visibility::Public,
        ));
        assert_eq!(back.new_path(), "doc.pdf");
        assert_eq!(back.destination_dir(), "");
    }

    #[test]
    fn test_already_in_target_partition() {
        assert_eq!(planner().plan(&image(), Visibility::Public), PlanOutcome::NoOp);

        let private = Attachment::new(42, "img", "private-files-abc123/2024/img.jpg", "image/jpeg");
        assert_eq!(planner().plan(&private, Visibility::Private), PlanOutcome::NoOp);
    }

    #[test]
    fn test_location_wins_over_flag() {
        // Flagged private but the file still sits in the public tree.
        let attachment = image().with_private(true);
        assert!(matches!(
            planner().plan(&attachment, Visibility::Private),
            PlanOutcome::Relocate(_)
        ));
    }

    #[test]
    fn test_empty_path_never_moves() {
        let attachment = Attachment::new(3, "ghost", "", "image/png");
        assert_eq!(planner().plan(&attachment, Visibility::Private), PlanOutcome::NoOp);
    }

    #[test]
    fn test_reversed_move() {
        let m = FileMove::new("a/b.jpg", "x/a/b.jpg");
        assert_eq!(m.reversed(), FileMove::new("x/a/b.jpg", "a/b.jpg"));
    }
}
