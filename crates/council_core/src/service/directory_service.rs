//! Member directory service.
//!
//! # Responsibility
//! - Bootstrap the single president and register plain members.
//! - Read members and department/group reference data.

use crate::error::{CoreError, CoreResult};
use crate::model::member::{Department, DepartmentId, Group, GroupId, Member, MemberId};
use crate::model::validation::{
    ensure_id, normalize_display_name, normalize_handle, normalize_limit,
};
use crate::repo::directory_repo::{
    DirectoryRepository, MemberListQuery, NewMember, PresidentBootstrap,
};
use crate::repo::EntityRef;
use crate::service::log_outcome;
use std::time::Instant;

/// Default page size for member listing.
pub const MEMBERS_DEFAULT_LIMIT: u32 = 100;
/// Upper bound for member listing page size.
pub const MEMBERS_LIMIT_MAX: u32 = 500;

/// Directory facade.
pub struct DirectoryService<R: DirectoryRepository> {
    repo: R,
}

impl<R: DirectoryRepository> DirectoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates the president on first call; later calls return the existing
    /// president unchanged, whatever handle they pass.
    pub fn bootstrap_president(
        &self,
        handle: &str,
        display_name: &str,
    ) -> CoreResult<PresidentBootstrap> {
        let started_at = Instant::now();
        let result = self.bootstrap_president_inner(handle, display_name);
        let created = matches!(&result, Ok(bootstrap) if bootstrap.created);
        log_outcome(
            "president_bootstrap",
            "directory",
            &format!("created={created}"),
            started_at,
            &result,
        );
        result
    }

    fn bootstrap_president_inner(
        &self,
        handle: &str,
        display_name: &str,
    ) -> CoreResult<PresidentBootstrap> {
        let handle = normalize_handle(handle)?;
        let display_name = normalize_display_name(display_name)?;
        Ok(self.repo.bootstrap_president(&handle, &display_name)?)
    }

    /// Registers a plain member with an optional initial group.
    ///
    /// The initial group is not counted as a group change.
    pub fn register_member(
        &self,
        handle: &str,
        display_name: &str,
        group_id: Option<GroupId>,
    ) -> CoreResult<Member> {
        let started_at = Instant::now();
        let result = self.register_member_inner(handle, display_name, group_id);
        let member_id = result
            .as_ref()
            .map_or_else(|_| "none".to_string(), |member| member.id.to_string());
        log_outcome(
            "member_register",
            "directory",
            &format!("member_id={member_id}"),
            started_at,
            &result,
        );
        result
    }

    fn register_member_inner(
        &self,
        handle: &str,
        display_name: &str,
        group_id: Option<GroupId>,
    ) -> CoreResult<Member> {
        let member = NewMember {
            handle: normalize_handle(handle)?,
            display_name: normalize_display_name(display_name)?,
            group_id: group_id.map(|id| ensure_id(id, "group_id")).transpose()?,
        };
        Ok(self.repo.create_member(&member)?)
    }

    /// Loads one member or fails with `NotFound`.
    pub fn get_member(&self, id: MemberId) -> CoreResult<Member> {
        let id = ensure_id(id, "member_id")?;
        self.repo
            .get_member(id)?
            .ok_or(CoreError::NotFound(EntityRef::Member(id)))
    }

    pub fn find_member_by_handle(&self, handle: &str) -> CoreResult<Option<Member>> {
        let handle = normalize_handle(handle)?;
        Ok(self.repo.find_member_by_handle(&handle)?)
    }

    /// Lists members newest first with optional role/group/department filters.
    pub fn list_members(&self, query: &MemberListQuery) -> CoreResult<Vec<Member>> {
        let normalized = MemberListQuery {
            limit: Some(normalize_limit(
                query.limit,
                MEMBERS_DEFAULT_LIMIT,
                MEMBERS_LIMIT_MAX,
            )),
            ..query.clone()
        };
        Ok(self.repo.list_members(&normalized)?)
    }

    pub fn get_department(&self, id: DepartmentId) -> CoreResult<Department> {
        self.repo
            .get_department(id)?
            .ok_or(CoreError::NotFound(EntityRef::Department(id)))
    }

    /// Looks up a department by symbolic name, e.g. `sports_department`.
    pub fn department_by_name(&self, name: &str) -> CoreResult<Option<Department>> {
        Ok(self.repo.find_department_by_name(name.trim())?)
    }

    pub fn list_departments(&self) -> CoreResult<Vec<Department>> {
        Ok(self.repo.list_departments()?)
    }

    pub fn get_group(&self, id: GroupId) -> CoreResult<Group> {
        self.repo
            .get_group(id)?
            .ok_or(CoreError::NotFound(EntityRef::Group(id)))
    }

    /// Looks up a group by symbolic name, e.g. `G1`.
    pub fn group_by_name(&self, name: &str) -> CoreResult<Option<Group>> {
        Ok(self.repo.find_group_by_name(name.trim())?)
    }

    pub fn list_groups(&self) -> CoreResult<Vec<Group>> {
        Ok(self.repo.list_groups()?)
    }
}
