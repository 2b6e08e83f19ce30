use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use tokenchat_crypto::{hash_password, verify_password};
use tokenchat_types::models::{PublicUser, Role};

use crate::models::UserRow;
use crate::{Result, StoreError, UserStore};

struct UserTable {
    rows: BTreeMap<u64, UserRow>,
    next_id: u64,
}

/// In-process account store. Ids start at 1 and only grow.
pub struct MemoryUserStore {
    table: Mutex<UserTable>,
    client_start_tokens: u64,
}

impl MemoryUserStore {
    pub fn new(client_start_tokens: u64) -> Self {
        Self {
            table: Mutex::new(UserTable {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
            client_start_tokens,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, UserTable>> {
        self.table
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn starting_balance(&self, role: Role) -> u64 {
        match role {
            Role::Client => self.client_start_tokens,
            Role::Model => 0,
        }
    }
}

fn exists(table: &UserTable, email: &str, role: Role) -> bool {
    table
        .rows
        .values()
        .any(|row| row.role == role && row.email_matches(email))
}

impl UserStore for MemoryUserStore {
    fn register(&self, email: &str, password: &str, role: &str) -> Result<PublicUser> {
        let email = email.trim();
        let role = role.trim();
        if email.is_empty() || password.is_empty() || role.is_empty() {
            return Err(StoreError::validation("email, password and role are required"));
        }
        let role = role
            .parse::<Role>()
            .map_err(|e| StoreError::validation(e.to_string()))?;

        // Cheap rejection before paying for the hash.
        if exists(&*self.lock()?, email, role) {
            return Err(StoreError::Conflict);
        }

        let password_hash = hash_password(password)?;

        let mut table = self.lock()?;
        // Re-check: another registration may have landed while hashing.
        if exists(&table, email, role) {
            return Err(StoreError::Conflict);
        }

        let id = table.next_id;
        table.next_id += 1;

        let row = UserRow {
            id,
            email: email.to_string(),
            password_hash,
            role,
            tokens: self.starting_balance(role),
            created_at: chrono::Utc::now(),
        };
        let user = row.to_public();
        table.rows.insert(id, row);

        info!(user_id = id, role = %role, tokens = user.tokens, "User registered");
        Ok(user)
    }

    fn authenticate(&self, email: &str, password: &str, role: Option<&str>) -> Result<PublicUser> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(StoreError::validation("email and password are required"));
        }
        let role = match role.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => Some(r.parse::<Role>().map_err(|_| StoreError::Auth)?),
            None => None,
        };

        // Snapshot candidate hashes so verification runs without the lock.
        let candidates: Vec<(u64, String)> = self
            .lock()?
            .rows
            .values()
            .filter(|row| row.email_matches(email) && role.is_none_or(|r| r == row.role))
            .map(|row| (row.id, row.password_hash.clone()))
            .collect();

        for (id, hash) in candidates {
            if verify_password(password, &hash)? {
                debug!(user_id = id, "Credentials verified");
                return self.find_by_id(id);
            }
        }

        Err(StoreError::Auth)
    }

    fn list(&self, role: Option<Role>) -> Result<Vec<PublicUser>> {
        Ok(self
            .lock()?
            .rows
            .values()
            .filter(|row| role.is_none_or(|r| r == row.role))
            .map(UserRow::to_public)
            .collect())
    }

    fn find_by_id(&self, id: u64) -> Result<PublicUser> {
        self.lock()?
            .rows
            .get(&id)
            .map(UserRow::to_public)
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    fn debit_if_sufficient(&self, id: u64, amount: u64) -> Result<u64> {
        let mut table = self.lock()?;
        let row = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::user_not_found(id))?;

        row.tokens = row
            .tokens
            .checked_sub(amount)
            .ok_or(StoreError::InsufficientTokens {
                balance: row.tokens,
                cost: amount,
            })?;

        Ok(row.tokens)
    }

    fn credit(&self, id: u64, amount: u64) -> Result<u64> {
        let mut table = self.lock()?;
        let row = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::user_not_found(id))?;

        row.tokens = row.tokens.saturating_add(amount);
        Ok(row.tokens)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.lock()?.rows.len())
    }
}
