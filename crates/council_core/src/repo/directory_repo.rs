//! Member directory and reference data repository.
//!
//! # Responsibility
//! - Create and read member records.
//! - Read static department and group reference rows.
//! - Provide shared member row loaders for the transactional repositories.
//!
//! # Invariants
//! - Member listing is deterministic: `created_seq DESC`.
//! - At most one president exists; bootstrap is idempotent.

use crate::model::hierarchy::HierarchySnapshot;
use crate::model::member::{Department, DepartmentId, Group, GroupId, Member, MemberId, Role};
use crate::model::validation::ValidationError;
use crate::repo::role_repo::{insert_role_change_log, NewRoleChangeLog};
use crate::repo::{
    ensure_connection_ready, group_exists, optional_uuid_text, parse_optional_uuid, parse_role,
    parse_uuid, EntityRef, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use uuid::Uuid;

pub(crate) const MEMBER_SELECT_SQL: &str = "SELECT
    member_uuid,
    handle,
    display_name,
    role,
    department_uuid,
    group_uuid,
    group_change_count,
    seq,
    created_at,
    updated_at
FROM members";

/// Input for registering a new plain member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    /// Already normalized handle.
    pub handle: String,
    pub display_name: String,
    pub group_id: Option<GroupId>,
}

/// Filter and pagination options for member listing.
#[derive(Debug, Clone, Default)]
pub struct MemberListQuery {
    pub role: Option<Role>,
    pub group_id: Option<GroupId>,
    pub department_id: Option<DepartmentId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Result of the one-time president bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresidentBootstrap {
    pub president: Member,
    /// `false` when an existing president was returned unchanged.
    pub created: bool,
}

/// Repository interface for the member directory and reference data.
pub trait DirectoryRepository {
    /// Creates the president once, with its bootstrap audit entry.
    fn bootstrap_president(
        &self,
        handle: &str,
        display_name: &str,
    ) -> RepoResult<PresidentBootstrap>;
    /// Creates one plain member.
    fn create_member(&self, member: &NewMember) -> RepoResult<Member>;
    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>>;
    fn find_member_by_handle(&self, handle: &str) -> RepoResult<Option<Member>>;
    fn list_members(&self, query: &MemberListQuery) -> RepoResult<Vec<Member>>;
    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<Department>>;
    fn find_department_by_name(&self, name: &str) -> RepoResult<Option<Department>>;
    /// Departments ordered by display name.
    fn list_departments(&self) -> RepoResult<Vec<Department>>;
    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>>;
    fn find_group_by_name(&self, name: &str) -> RepoResult<Option<Group>>;
    /// Groups ordered by symbolic name.
    fn list_groups(&self) -> RepoResult<Vec<Group>>;
}

/// SQLite-backed directory repository.
pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["members", "departments", "member_groups"])?;
        Ok(Self { conn })
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn bootstrap_president(
        &self,
        handle: &str,
        display_name: &str,
    ) -> RepoResult<PresidentBootstrap> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let existing = tx
            .query_row(
                &format!("{MEMBER_SELECT_SQL} WHERE role = 'president';"),
                [],
                |row| Ok(parse_member_row(row)),
            )
            .optional()?
            .transpose()?;
        if let Some(president) = existing {
            return Ok(PresidentBootstrap {
                president,
                created: false,
            });
        }

        let president_id = insert_member(
            &tx,
            &NewMember {
                handle: handle.to_string(),
                display_name: display_name.to_string(),
                group_id: None,
            },
            Role::President,
        )?;
        insert_role_change_log(
            &tx,
            &NewRoleChangeLog {
                member_id: president_id,
                old_role: None,
                new_role: Role::President,
                old_department_id: None,
                new_department_id: None,
                actor_id: president_id,
                reason: Some("bootstrap".to_string()),
            },
        )?;
        let president = load_required_member(&tx, president_id)?;
        tx.commit()?;

        Ok(PresidentBootstrap {
            president,
            created: true,
        })
    }

    fn create_member(&self, member: &NewMember) -> RepoResult<Member> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Some(group_id) = member.group_id {
            if !group_exists(&tx, group_id)? {
                return Err(RepoError::NotFound(EntityRef::Group(group_id)));
            }
        }
        let member_id = insert_member(&tx, member, Role::Member)?;
        let created = load_required_member(&tx, member_id)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        load_member(self.conn, id)
    }

    fn find_member_by_handle(&self, handle: &str) -> RepoResult<Option<Member>> {
        self.conn
            .query_row(
                &format!("{MEMBER_SELECT_SQL} WHERE handle = ?1;"),
                [handle],
                |row| Ok(parse_member_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_members(&self, query: &MemberListQuery) -> RepoResult<Vec<Member>> {
        let mut sql = format!("{MEMBER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(role) = query.role {
            sql.push_str(" AND role = ?");
            bind_values.push(Value::Text(role.as_str().to_string()));
        }
        if let Some(group_id) = query.group_id {
            sql.push_str(" AND group_uuid = ?");
            bind_values.push(Value::Text(group_id.to_string()));
        }
        if let Some(department_id) = query.department_id {
            sql.push_str(" AND department_uuid = ?");
            bind_values.push(Value::Text(department_id.to_string()));
        }

        sql.push_str(" ORDER BY seq DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ? OFFSET ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            bind_values.push(Value::Integer(i64::from(query.offset)));
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<Department>> {
        query_department(self.conn, "department_uuid", &id.to_string())
    }

    fn find_department_by_name(&self, name: &str) -> RepoResult<Option<Department>> {
        query_department(self.conn, "name", name)
    }

    fn list_departments(&self) -> RepoResult<Vec<Department>> {
        let mut stmt = self.conn.prepare(
            "SELECT department_uuid, name, display_name, description
             FROM departments
             ORDER BY display_name ASC, name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut departments = Vec::new();
        while let Some(row) = rows.next()? {
            departments.push(parse_department_row(row)?);
        }
        Ok(departments)
    }

    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>> {
        query_group(self.conn, "group_uuid", &id.to_string())
    }

    fn find_group_by_name(&self, name: &str) -> RepoResult<Option<Group>> {
        query_group(self.conn, "name", name)
    }

    fn list_groups(&self) -> RepoResult<Vec<Group>> {
        let mut stmt = self.conn.prepare(
            "SELECT group_uuid, name, display_name
             FROM member_groups
             ORDER BY name ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            groups.push(parse_group_row(row)?);
        }
        Ok(groups)
    }
}

fn insert_member(conn: &Connection, member: &NewMember, role: Role) -> RepoResult<MemberId> {
    let taken: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM members WHERE handle = ?1);",
        [member.handle.as_str()],
        |row| row.get(0),
    )?;
    if taken == 1 {
        return Err(RepoError::Validation(ValidationError::DuplicateHandle(
            member.handle.clone(),
        )));
    }

    let member_id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO members (
            member_uuid,
            handle,
            display_name,
            role,
            department_uuid,
            group_uuid,
            group_change_count
        ) VALUES (?1, ?2, ?3, ?4, NULL, ?5, 0);",
        params![
            member_id.to_string(),
            member.handle.as_str(),
            member.display_name.as_str(),
            role.as_str(),
            optional_uuid_text(member.group_id),
        ],
    )?;
    Ok(member_id)
}

pub(crate) fn load_member(conn: &Connection, id: MemberId) -> RepoResult<Option<Member>> {
    conn.query_row(
        &format!("{MEMBER_SELECT_SQL} WHERE member_uuid = ?1;"),
        [id.to_string()],
        |row| Ok(parse_member_row(row)),
    )
    .optional()?
    .transpose()
}

pub(crate) fn load_required_member(conn: &Connection, id: MemberId) -> RepoResult<Member> {
    load_member(conn, id)?.ok_or(RepoError::NotFound(EntityRef::Member(id)))
}

/// Reads every member's role assignment as one snapshot.
///
/// Must be called inside the write transaction that applies the change.
pub(crate) fn load_hierarchy_snapshot(conn: &Connection) -> RepoResult<HierarchySnapshot> {
    let mut stmt = conn.prepare(&format!("{MEMBER_SELECT_SQL} ORDER BY seq ASC;"))?;
    let mut rows = stmt.query([])?;
    let mut assignments = Vec::new();
    while let Some(row) = rows.next()? {
        assignments.push(parse_member_row(row)?.assignment());
    }
    Ok(HierarchySnapshot::new(assignments))
}

pub(crate) fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let member_uuid: String = row.get("member_uuid")?;
    let role_text: String = row.get("role")?;
    let group_change_count: i64 = row.get("group_change_count")?;
    let group_change_count = u32::try_from(group_change_count).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid group_change_count `{group_change_count}` in members.group_change_count"
        ))
    })?;

    Ok(Member {
        id: parse_uuid(&member_uuid, "members.member_uuid")?,
        handle: row.get("handle")?,
        display_name: row.get("display_name")?,
        role: parse_role(&role_text, "members.role")?,
        department_id: parse_optional_uuid(row.get("department_uuid")?, "members.department_uuid")?,
        group_id: parse_optional_uuid(row.get("group_uuid")?, "members.group_uuid")?,
        group_change_count,
        created_seq: row.get("seq")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn query_department(
    conn: &Connection,
    column: &'static str,
    value: &str,
) -> RepoResult<Option<Department>> {
    conn.query_row(
        &format!(
            "SELECT department_uuid, name, display_name, description
             FROM departments
             WHERE {column} = ?1;"
        ),
        [value],
        |row| Ok(parse_department_row(row)),
    )
    .optional()?
    .transpose()
}

fn query_group(conn: &Connection, column: &'static str, value: &str) -> RepoResult<Option<Group>> {
    conn.query_row(
        &format!(
            "SELECT group_uuid, name, display_name
             FROM member_groups
             WHERE {column} = ?1;"
        ),
        [value],
        |row| Ok(parse_group_row(row)),
    )
    .optional()?
    .transpose()
}

fn parse_department_row(row: &Row<'_>) -> RepoResult<Department> {
    let department_uuid: String = row.get("department_uuid")?;
    Ok(Department {
        id: parse_uuid(&department_uuid, "departments.department_uuid")?,
        name: row.get("name")?,
        display_name: row.get("display_name")?,
        description: row.get("description")?,
    })
}

fn parse_group_row(row: &Row<'_>) -> RepoResult<Group> {
    let group_uuid: String = row.get("group_uuid")?;
    Ok(Group {
        id: parse_uuid(&group_uuid, "member_groups.group_uuid")?,
        name: row.get("name")?,
        display_name: row.get("display_name")?,
    })
}
