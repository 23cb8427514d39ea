//! Hierarchy invariant checker.
//!
//! # Responsibility
//! - Decide whether a proposed role assignment or group move is compatible
//!   with the current role assignments of the whole organization.
//!
//! # Invariants
//! - At most one `DepartmentHead` per department.
//! - At most one `GroupLeader` per group.
//! - `President` is never granted or revoked through role management.
//! - Checks are pure: callers must build the snapshot inside the same
//!   write transaction that applies the accepted change.

use crate::model::member::{DepartmentId, GroupId, MemberId, Role, RoleAssignment};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reason a proposed assignment was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// `DepartmentHead` requested without a department.
    MissingDepartment,
    /// Another member already heads the requested department.
    DepartmentHeadConflict {
        department_id: DepartmentId,
        holder_id: MemberId,
    },
    /// `GroupLeader` requested for a member who has not chosen a group.
    NoGroupAssigned,
    /// Another member already leads the group.
    GroupLeaderConflict { group_id: GroupId, holder_id: MemberId },
    /// President is granted at bootstrap only and cannot be changed here.
    ProtectedRole,
}

impl InvariantViolation {
    /// Stable code for logs and callers that branch on the kind.
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingDepartment => "missing_department",
            Self::DepartmentHeadConflict { .. } => "department_head_conflict",
            Self::NoGroupAssigned => "no_group_assigned",
            Self::GroupLeaderConflict { .. } => "group_leader_conflict",
            Self::ProtectedRole => "protected_role",
        }
    }
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDepartment => write!(f, "department head requires a department"),
            Self::DepartmentHeadConflict {
                department_id,
                holder_id,
            } => write!(
                f,
                "department {department_id} already has a head: {holder_id}"
            ),
            Self::NoGroupAssigned => write!(f, "group leader requires an assigned group"),
            Self::GroupLeaderConflict {
                group_id,
                holder_id,
            } => write!(f, "group {group_id} already has a leader: {holder_id}"),
            Self::ProtectedRole => write!(f, "president role cannot be changed"),
        }
    }
}

impl Error for InvariantViolation {}

/// Proposed role change for one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleProposal {
    pub subject_id: MemberId,
    pub new_role: Role,
    pub department_id: Option<DepartmentId>,
}

/// Point-in-time view of every member's role assignment.
#[derive(Debug, Clone, Default)]
pub struct HierarchySnapshot {
    assignments: Vec<RoleAssignment>,
}

impl HierarchySnapshot {
    pub fn new(assignments: Vec<RoleAssignment>) -> Self {
        Self { assignments }
    }

    /// Returns the subject's current assignment, if the member exists.
    pub fn get(&self, member_id: MemberId) -> Option<&RoleAssignment> {
        self.assignments
            .iter()
            .find(|assignment| assignment.member_id == member_id)
    }

    /// Checks a proposed role assignment.
    ///
    /// Rules, in order:
    /// 1. the president's own role and the president role are protected;
    /// 2. a department head needs a department;
    /// 3. no other member may already head that department;
    /// 4. a group leader needs a group on the subject;
    /// 5. no other member may already lead that group.
    ///
    /// A subject missing from the snapshot is treated as having no group.
    pub fn check(&self, proposal: &RoleProposal) -> Result<(), InvariantViolation> {
        let subject = self.get(proposal.subject_id);

        if proposal.new_role == Role::President
            || subject.is_some_and(|current| current.role == Role::President)
        {
            return Err(InvariantViolation::ProtectedRole);
        }

        match proposal.new_role {
            Role::DepartmentHead => {
                let department_id = proposal
                    .department_id
                    .ok_or(InvariantViolation::MissingDepartment)?;
                if let Some(holder_id) = self.department_head_of(department_id, proposal.subject_id)
                {
                    return Err(InvariantViolation::DepartmentHeadConflict {
                        department_id,
                        holder_id,
                    });
                }
            }
            Role::GroupLeader => {
                let group_id = subject
                    .and_then(|current| current.group_id)
                    .ok_or(InvariantViolation::NoGroupAssigned)?;
                if let Some(holder_id) = self.group_leader_of(group_id, proposal.subject_id) {
                    return Err(InvariantViolation::GroupLeaderConflict {
                        group_id,
                        holder_id,
                    });
                }
            }
            Role::President | Role::Member => {}
        }

        Ok(())
    }

    /// Checks that moving `subject_id` into `group_id` keeps one leader per group.
    ///
    /// Only group leaders carry their role into the new group, so plain
    /// members and department heads always pass.
    pub fn check_group_move(
        &self,
        subject_id: MemberId,
        group_id: GroupId,
    ) -> Result<(), InvariantViolation> {
        let is_leader = self
            .get(subject_id)
            .is_some_and(|current| current.role == Role::GroupLeader);
        if !is_leader {
            return Ok(());
        }
        match self.group_leader_of(group_id, subject_id) {
            Some(holder_id) => Err(InvariantViolation::GroupLeaderConflict {
                group_id,
                holder_id,
            }),
            None => Ok(()),
        }
    }

    fn department_head_of(
        &self,
        department_id: DepartmentId,
        excluding: MemberId,
    ) -> Option<MemberId> {
        self.assignments
            .iter()
            .find(|other| {
                other.member_id != excluding
                    && other.role == Role::DepartmentHead
                    && other.department_id == Some(department_id)
            })
            .map(|other| other.member_id)
    }

    fn group_leader_of(&self, group_id: GroupId, excluding: MemberId) -> Option<MemberId> {
        self.assignments
            .iter()
            .find(|other| {
                other.member_id != excluding
                    && other.role == Role::GroupLeader
                    && other.group_id == Some(group_id)
            })
            .map(|other| other.member_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{HierarchySnapshot, InvariantViolation, RoleProposal};
    use crate::model::member::{Role, RoleAssignment};
    use uuid::Uuid;

    fn assignment(role: Role) -> RoleAssignment {
        RoleAssignment {
            member_id: Uuid::new_v4(),
            role,
            department_id: None,
            group_id: None,
        }
    }

    fn propose(subject: &RoleAssignment, role: Role) -> RoleProposal {
        RoleProposal {
            subject_id: subject.member_id,
            new_role: role,
            department_id: None,
        }
    }

    #[test]
    fn department_head_without_department_is_rejected() {
        let subject = assignment(Role::Member);
        let snapshot = HierarchySnapshot::new(vec![subject]);

        let err = snapshot
            .check(&propose(&subject, Role::DepartmentHead))
            .unwrap_err();
        assert_eq!(err, InvariantViolation::MissingDepartment);
    }

    #[test]
    fn second_department_head_conflicts_but_reconfirming_holder_passes() {
        let department_id = Uuid::new_v4();
        let mut head = assignment(Role::DepartmentHead);
        head.department_id = Some(department_id);
        let challenger = assignment(Role::Member);
        let snapshot = HierarchySnapshot::new(vec![head, challenger]);

        let mut proposal = propose(&challenger, Role::DepartmentHead);
        proposal.department_id = Some(department_id);
        assert_eq!(
            snapshot.check(&proposal).unwrap_err(),
            InvariantViolation::DepartmentHeadConflict {
                department_id,
                holder_id: head.member_id,
            }
        );

        let mut same_holder = propose(&head, Role::DepartmentHead);
        same_holder.department_id = Some(department_id);
        assert!(snapshot.check(&same_holder).is_ok());
    }

    #[test]
    fn group_leader_requires_group_and_single_holder() {
        let group_id = Uuid::new_v4();
        let no_group = assignment(Role::Member);
        let mut leader = assignment(Role::GroupLeader);
        leader.group_id = Some(group_id);
        let mut peer = assignment(Role::Member);
        peer.group_id = Some(group_id);
        let snapshot = HierarchySnapshot::new(vec![no_group, leader, peer]);

        assert_eq!(
            snapshot
                .check(&propose(&no_group, Role::GroupLeader))
                .unwrap_err(),
            InvariantViolation::NoGroupAssigned
        );
        assert_eq!(
            snapshot.check(&propose(&peer, Role::GroupLeader)).unwrap_err(),
            InvariantViolation::GroupLeaderConflict {
                group_id,
                holder_id: leader.member_id,
            }
        );
    }

    #[test]
    fn president_is_protected_both_ways() {
        let president = assignment(Role::President);
        let member = assignment(Role::Member);
        let snapshot = HierarchySnapshot::new(vec![president, member]);

        assert_eq!(
            snapshot.check(&propose(&member, Role::President)).unwrap_err(),
            InvariantViolation::ProtectedRole
        );
        assert_eq!(
            snapshot.check(&propose(&president, Role::Member)).unwrap_err(),
            InvariantViolation::ProtectedRole
        );
    }

    #[test]
    fn demotion_always_passes() {
        let mut head = assignment(Role::DepartmentHead);
        head.department_id = Some(Uuid::new_v4());
        let snapshot = HierarchySnapshot::new(vec![head]);

        assert!(snapshot.check(&propose(&head, Role::Member)).is_ok());
    }

    #[test]
    fn group_move_only_constrains_leaders() {
        let target = Uuid::new_v4();
        let mut sitting = assignment(Role::GroupLeader);
        sitting.group_id = Some(target);
        let mut mover = assignment(Role::GroupLeader);
        mover.group_id = Some(Uuid::new_v4());
        let plain = assignment(Role::Member);
        let snapshot = HierarchySnapshot::new(vec![sitting, mover, plain]);

        assert!(matches!(
            snapshot.check_group_move(mover.member_id, target),
            Err(InvariantViolation::GroupLeaderConflict { .. })
        ));
        assert!(snapshot.check_group_move(plain.member_id, target).is_ok());
    }
}
