use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::Value;

use crate::admin::{AccessKey, AdminApi, AdminError, Group, User, GROUP_PAGE_SIZE};

#[derive(Debug)]
struct MemoryAdminInner {
    /// groups keyed by id; ids sort in creation order
    groups: BTreeMap<String, Group>,
    /// users keyed by id
    users: BTreeMap<String, User>,
    /// access keys issued, keyed by user id (`current-user` for the broker)
    keys: Vec<(String, AccessKey)>,
    next_id: u64,
    page_size: usize,
    /// injected failures keyed by operation name
    failures: HashMap<&'static str, StatusCode>,
    /// markers passed to `list_groups`, in call order
    list_markers: Vec<Option<String>>,
    calls: Vec<String>,
}

/// In-memory tenant administration API
#[derive(Debug, Clone)]
pub struct MemoryAdmin {
    inner: Arc<Mutex<MemoryAdminInner>>,
}

impl Default for MemoryAdmin {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAdmin {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryAdminInner {
                groups: BTreeMap::new(),
                users: BTreeMap::new(),
                keys: Vec::new(),
                next_id: 0,
                page_size: GROUP_PAGE_SIZE,
                failures: HashMap::new(),
                list_markers: Vec::new(),
                calls: Vec::new(),
            })),
        }
    }

    fn inner(&self) -> MutexGuard<'_, MemoryAdminInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shrink the group listing page size
    pub fn with_page_size(self, page_size: usize) -> Self {
        self.inner().page_size = page_size;
        self
    }

    /// Make every later call to `operation` (e.g. `"delete_group"`) answer `status`
    pub fn fail(&self, operation: &'static str, status: StatusCode) {
        self.inner().failures.insert(operation, status);
    }

    /// Add a group without recording a call
    pub fn insert_group(&self, name: &str, policy: Value) -> Group {
        let mut inner = self.inner();
        let id = next_id(&mut inner, "group");
        let group = Group {
            id: id.clone(),
            group_urn: Some(format!("urn:sgws:identity::12345:group/{}", name)),
            ..Group::new(name, policy)
        };
        inner.groups.insert(id, group.clone());
        group
    }

    pub fn group(&self, name: &str) -> Option<Group> {
        self.inner()
            .groups
            .values()
            .find(|g| g.display_name == name)
            .cloned()
    }

    pub fn group_count(&self) -> usize {
        self.inner().groups.len()
    }

    pub fn user(&self, name: &str) -> Option<User> {
        let unique_name = format!("user/{}", name);
        self.inner()
            .users
            .values()
            .find(|u| u.unique_name == unique_name)
            .cloned()
    }

    pub fn user_count(&self) -> usize {
        self.inner().users.len()
    }

    /// Access keys issued so far, with the user id they were issued to
    pub fn issued_keys(&self) -> Vec<(String, AccessKey)> {
        self.inner().keys.clone()
    }

    pub fn list_markers(&self) -> Vec<Option<String>> {
        self.inner().list_markers.clone()
    }

    /// Names of the operations called so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.inner().calls.clone()
    }

    fn begin(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, MemoryAdminInner>, AdminError> {
        let mut inner = self.inner();
        inner.calls.push(operation.to_string());
        let failure = inner.failures.get(operation).copied();
        match failure {
            Some(status) => Err(AdminError::unexpected(status, "injected failure")),
            None => Ok(inner),
        }
    }
}

fn next_id(inner: &mut MemoryAdminInner, kind: &str) -> String {
    inner.next_id += 1;
    format!("{}-{:06}", kind, inner.next_id)
}

fn not_found(what: &str) -> AdminError {
    AdminError::unexpected(StatusCode::NOT_FOUND, format!("{} not found", what))
}

fn issue_key(
    inner: &mut MemoryAdminInner,
    owner: &str,
    expires: Option<DateTime<Utc>>,
) -> AccessKey {
    let id = next_id(inner, "key");
    let key = AccessKey {
        id: id.clone(),
        display_name: format!("****{}", &id[id.len() - 4..]),
        expires: expires.map(|e| e.to_rfc3339()),
        access_key: format!("AK{}", id.replace('-', "").to_uppercase()),
        secret_access_key: format!("secret/{}+{}", owner, id),
        ..Default::default()
    };
    inner.keys.push((owner.to_string(), key.clone()));
    key
}

#[async_trait]
impl AdminApi for MemoryAdmin {
    async fn create_group(&self, name: &str, policy: Value) -> Result<Group, AdminError> {
        let mut inner = self.begin("create_group")?;
        if inner.groups.values().any(|g| g.display_name == name) {
            return Err(AdminError::unexpected(
                StatusCode::CONFLICT,
                format!("group {} already exists", name),
            ));
        }

        let id = next_id(&mut inner, "group");
        let group = Group {
            id: id.clone(),
            group_urn: Some(format!("urn:sgws:identity::12345:group/{}", name)),
            ..Group::new(name, policy)
        };
        inner.groups.insert(id, group.clone());
        Ok(group)
    }

    async fn update_group(&self, group: &Group) -> Result<Group, AdminError> {
        let mut inner = self.begin("update_group")?;
        match inner.groups.get_mut(&group.id) {
            Some(stored) => {
                *stored = group.clone();
                Ok(stored.clone())
            }
            None => Err(not_found("group")),
        }
    }

    async fn delete_group(&self, id: &str) -> Result<(), AdminError> {
        let mut inner = self.begin("delete_group")?;
        inner
            .groups
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("group"))
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Group, AdminError> {
        let inner = self.begin("get_group_by_name")?;
        inner
            .groups
            .values()
            .find(|g| g.display_name == name)
            .cloned()
            .ok_or_else(|| not_found("group"))
    }

    async fn list_groups(&self, marker: Option<&str>) -> Result<Vec<Group>, AdminError> {
        let mut inner = self.begin("list_groups")?;
        inner.list_markers.push(marker.map(str::to_string));

        let page_size = inner.page_size;
        Ok(inner
            .groups
            .iter()
            .filter(|(id, _)| marker.map_or(true, |m| id.as_str() > m))
            .take(page_size)
            .map(|(_, g)| g.clone())
            .collect())
    }

    async fn create_user(
        &self,
        name: &str,
        full_name: &str,
        member_of: &[String],
    ) -> Result<User, AdminError> {
        let mut inner = self.begin("create_user")?;
        let unique_name = format!("user/{}", name);
        if inner.users.values().any(|u| u.unique_name == unique_name) {
            return Err(AdminError::unexpected(
                StatusCode::CONFLICT,
                format!("user {} already exists", name),
            ));
        }

        let id = next_id(&mut inner, "user");
        let user = User {
            id: id.clone(),
            full_name: full_name.to_string(),
            unique_name,
            member_of: member_of.to_vec(),
            ..Default::default()
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user_by_name(&self, name: &str) -> Result<User, AdminError> {
        let inner = self.begin("get_user_by_name")?;
        let unique_name = format!("user/{}", name);
        inner
            .users
            .values()
            .find(|u| u.unique_name == unique_name)
            .cloned()
            .ok_or_else(|| not_found("user"))
    }

    async fn delete_user(&self, id: &str) -> Result<(), AdminError> {
        let mut inner = self.begin("delete_user")?;
        inner
            .users
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("user"))
    }

    async fn create_user_access_key(&self, user_id: &str) -> Result<AccessKey, AdminError> {
        let mut inner = self.begin("create_user_access_key")?;
        if !inner.users.contains_key(user_id) {
            return Err(not_found("user"));
        }
        Ok(issue_key(&mut inner, user_id, None))
    }

    async fn create_current_user_access_key(
        &self,
        expires: DateTime<Utc>,
    ) -> Result<AccessKey, AdminError> {
        let mut inner = self.begin("create_current_user_access_key")?;
        Ok(issue_key(&mut inner, "current-user", Some(expires)))
    }
}
