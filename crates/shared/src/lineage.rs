use crate::domain::{Cast, CastId, NewCast};

/// Branch depth at which a lineage root gets locked.
pub const LINEAGE_LOCK_DEPTH: u32 = 10;

/// Where a new derivative sits in its parent's lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivativePlan {
    pub parent_id: CastId,
    pub branch_num: u32,
    pub layer_1_cast_id: Option<CastId>,
}

impl DerivativePlan {
    pub fn for_parent(parent: &Cast) -> Self {
        Self::from_parts(parent.id, parent.branch_num, parent.layer_1_cast_id)
    }

    pub fn from_parts(
        parent_id: CastId,
        parent_branch_num: u32,
        parent_layer_1_cast_id: Option<CastId>,
    ) -> Self {
        let branch_num = parent_branch_num.saturating_add(1);
        Self {
            parent_id,
            branch_num,
            layer_1_cast_id: root_pointer(branch_num, parent_id, parent_layer_1_cast_id),
        }
    }

    /// The lineage root to lock once this derivative is stored, if any.
    pub fn lock_target(&self) -> Option<CastId> {
        if self.branch_num == LINEAGE_LOCK_DEPTH {
            self.layer_1_cast_id
        } else {
            None
        }
    }

    pub fn new_cast(&self, name: &str, farcaster_id: &str, prompt: &str) -> NewCast {
        NewCast {
            name: name.to_string(),
            farcaster_id: farcaster_id.to_string(),
            image_path: None,
            parent_id: Some(self.parent_id),
            branch_num: self.branch_num,
            prompt_input: Some(prompt.to_string()),
            layer_1_cast_id: self.layer_1_cast_id,
        }
    }
}

/// First derivatives have no root pointer, second ones point at their
/// parent, deeper ones inherit the parent's pointer.
pub fn root_pointer(
    branch_num: u32,
    parent_id: CastId,
    parent_layer_1_cast_id: Option<CastId>,
) -> Option<CastId> {
    match branch_num {
        0 | 1 => None,
        2 => Some(parent_id),
        _ => parent_layer_1_cast_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_derivative_has_no_root_pointer() {
        let plan = DerivativePlan::from_parts(CastId(1), 0, None);
        assert_eq!(plan.branch_num, 1);
        assert_eq!(plan.layer_1_cast_id, None);
    }

    #[test]
    fn second_derivative_points_at_parent() {
        let plan = DerivativePlan::from_parts(CastId(2), 1, None);
        assert_eq!(plan.branch_num, 2);
        assert_eq!(plan.layer_1_cast_id, Some(CastId(2)));
    }

    #[test]
    fn deeper_derivatives_inherit_parent_pointer() {
        let plan = DerivativePlan::from_parts(CastId(3), 2, Some(CastId(2)));
        assert_eq!(plan.branch_num, 3);
        assert_eq!(plan.layer_1_cast_id, Some(CastId(2)));

        let plan = DerivativePlan::from_parts(CastId(8), 7, Some(CastId(2)));
        assert_eq!(plan.layer_1_cast_id, Some(CastId(2)));
    }

    #[test]
    fn only_branch_ten_locks_the_root() {
        assert_eq!(
            DerivativePlan::from_parts(CastId(10), 9, Some(CastId(2))).lock_target(),
            Some(CastId(2))
        );
        assert_eq!(
            DerivativePlan::from_parts(CastId(9), 8, Some(CastId(2))).lock_target(),
            None
        );
        assert_eq!(
            DerivativePlan::from_parts(CastId(11), 10, Some(CastId(2))).lock_target(),
            None
        );
    }

    #[test]
    fn new_cast_carries_plan_fields() {
        let plan = DerivativePlan::from_parts(CastId(4), 3, Some(CastId(2)));
        let cast = plan.new_cast("sunset", "artcast", "make it purple");
        assert_eq!(cast.parent_id, Some(CastId(4)));
        assert_eq!(cast.branch_num, 4);
        assert_eq!(cast.layer_1_cast_id, Some(CastId(2)));
        assert_eq!(cast.image_path, None);
        assert_eq!(cast.prompt_input.as_deref(), Some("make it purple"));
    }
}
