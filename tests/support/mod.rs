//! In-memory persistence shared by the integration suites.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use expense_tracker::config::Config;
use expense_tracker::domain::{
    Actor, AuditLog, CreateExpense, Expense, NewAuditLog, NewExpense, NewReceipt, NewUser,
    Password, Range, Receipt, ReceiptContent, User, UserRole,
};
use expense_tracker::errors::{AppError, AppResult};
use expense_tracker::infra::{
    AuditRepository, ExpenseRepository, ReceiptRepository, UnitOfWork, UserRepository,
};
use expense_tracker::types::page_offset;

pub const SECRET: &str = "integration-test-secret-at-least-32-chars";

pub fn config() -> Config {
    Config::new("postgres://unused@localhost/unused", SECRET)
}

/// Every table behind one lock per collection.
#[derive(Default)]
pub struct InMemory {
    users: Mutex<HashMap<String, User>>,
    expenses: Mutex<HashMap<Uuid, Expense>>,
    receipts: Mutex<HashMap<Uuid, ReceiptContent>>,
    audit: Mutex<Vec<AuditLog>>,
    audit_offline: AtomicBool,
}

impl InMemory {
    fn receipt_of(&self, expense_id: Uuid) -> Option<Receipt> {
        self.receipts
            .lock()
            .unwrap()
            .values()
            .find(|c| c.receipt.expense_id == expense_id)
            .map(|c| c.receipt.clone())
    }

    fn with_receipt(&self, mut expense: Expense) -> Expense {
        expense.receipt = self.receipt_of(expense.id);
        expense
    }

    fn replace_receipt(&self, new: NewReceipt) -> Receipt {
        let now = Utc::now();
        let receipt = Receipt {
            id: new.id,
            expense_id: new.expense_id,
            username: new.username,
            name: new.file.file_name.clone(),
            category: new.category,
            file_name: new.file.file_name.clone(),
            content_type: new.file.content_type().to_string(),
            size_bytes: new.file.size_bytes(),
            created_at: now,
            updated_at: now,
        };
        let mut receipts = self.receipts.lock().unwrap();
        receipts.retain(|_, c| c.receipt.expense_id != new.expense_id);
        receipts.insert(
            receipt.id,
            ReceiptContent {
                receipt: receipt.clone(),
                data: new.file.data,
            },
        );
        receipt
    }

    pub fn receipt_count(&self) -> usize {
        self.receipts.lock().unwrap().len()
    }

    pub fn stored_expense(&self, id: Uuid) -> Option<Expense> {
        self.expenses.lock().unwrap().get(&id).cloned()
    }

    pub fn audit_entries(&self) -> Vec<AuditLog> {
        self.audit.lock().unwrap().clone()
    }

    /// Make every audit append fail
    pub fn take_audit_offline(&self) {
        self.audit_offline.store(true, Ordering::SeqCst);
    }

    /// Store an active user whose password is `password123`
    pub fn insert_user(&self, username: &str, role: UserRole) -> User {
        let mut user = User::new(username.to_string(), password_hash(), None);
        user.role = role;
        self.users
            .lock()
            .unwrap()
            .insert(username.to_string(), user.clone());
        user
    }

    /// Store an expense directly, bypassing validation
    pub fn insert_expense(
        &self,
        username: &str,
        title: &str,
        category: &str,
        amount: Decimal,
        expense_date: DateTime<Utc>,
    ) -> Expense {
        let input = CreateExpense {
            title: title.to_string(),
            category: category.to_string(),
            notes: None,
            amount,
            expense_date: Some(expense_date),
            receipt: None,
        };
        let row = NewExpense::new(&input, username, username, Utc::now());
        let expense = to_expense(row);
        self.expenses
            .lock()
            .unwrap()
            .insert(expense.id, expense.clone());
        expense
    }
}

/// Hashing is slow, so every seeded user shares one hash
fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| Password::new("password123").unwrap().into_string())
        .clone()
}

fn to_expense(row: NewExpense) -> Expense {
    Expense {
        id: row.id,
        username: row.username,
        title: row.title,
        category: row.category,
        notes: row.notes,
        amount: row.amount,
        expense_date: row.expense_date,
        created_at: row.created_at,
        updated_at: row.created_at,
        created_by: row.created_by,
        updated_by: None,
        version: 1,
        receipt: None,
    }
}

#[async_trait]
impl UserRepository for InMemory {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.get(username).filter(|u| u.is_active()).cloned())
    }

    async fn find_by_username_with_deleted(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(username).cloned())
    }

    async fn create(&self, new: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&new.username) {
            return Err(AppError::duplicate("User"));
        }
        let mut user = User::new(new.username, new.password_hash, new.phone);
        user.role = new.role;
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if !users.contains_key(&user.username) {
            return Err(AppError::EntityNotFound("User"));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(user.clone())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.is_active())
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

#[async_trait]
impl ExpenseRepository for InMemory {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Expense>> {
        let found = self.stored_expense(id);
        Ok(found.map(|e| self.with_receipt(e)))
    }

    async fn find_by_owner(
        &self,
        username: &str,
        date: Option<Range<DateTime<Utc>>>,
    ) -> AppResult<Vec<Expense>> {
        let mut owned: Vec<Expense> = self
            .expenses
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.username == username)
            .filter(|e| date.map_or(true, |r| r.contains(&e.expense_date)))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.expense_date.cmp(&a.expense_date));
        Ok(owned.into_iter().map(|e| self.with_receipt(e)).collect())
    }

    async fn find_all(&self) -> AppResult<Vec<Expense>> {
        let mut all: Vec<Expense> = self.expenses.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.expense_date.cmp(&a.expense_date));
        Ok(all.into_iter().map(|e| self.with_receipt(e)).collect())
    }

    async fn find_page_by_owner(
        &self,
        username: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<Expense>, u64)> {
        let mut owned: Vec<Expense> = self
            .expenses
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.username == username)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = owned.len() as u64;
        let skip = match page_offset(page, per_page) {
            Some(offset) if offset < total => offset as usize,
            _ => return Ok((Vec::new(), total)),
        };
        let items = owned
            .into_iter()
            .skip(skip)
            .take(per_page as usize)
            .map(|e| self.with_receipt(e))
            .collect();
        Ok((items, total))
    }

    async fn create(&self, row: NewExpense, receipt: Option<NewReceipt>) -> AppResult<Expense> {
        let expense = to_expense(row);
        self.expenses
            .lock()
            .unwrap()
            .insert(expense.id, expense.clone());
        if let Some(new) = receipt {
            self.replace_receipt(new);
        }
        Ok(self.with_receipt(expense))
    }

    async fn update(
        &self,
        expense: &Expense,
        expected_version: i32,
        receipt: Option<NewReceipt>,
    ) -> AppResult<Expense> {
        {
            let mut expenses = self.expenses.lock().unwrap();
            let stored = expenses
                .get_mut(&expense.id)
                .ok_or(AppError::EntityNotFound("Expense"))?;
            if stored.version != expected_version {
                return Err(AppError::StaleEntity("Expense"));
            }
            *stored = Expense {
                version: expected_version + 1,
                receipt: None,
                ..expense.clone()
            };
        }
        if let Some(new) = receipt {
            self.replace_receipt(new);
        }
        ExpenseRepository::find_by_id(self, expense.id)
            .await?
            .ok_or(AppError::EntityNotFound("Expense"))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        if self.expenses.lock().unwrap().remove(&id).is_none() {
            return Err(AppError::EntityNotFound("Expense"));
        }
        // Mirrors the cascading foreign key
        self.receipts
            .lock()
            .unwrap()
            .retain(|_, c| c.receipt.expense_id != id);
        Ok(())
    }
}

#[async_trait]
impl ReceiptRepository for InMemory {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ReceiptContent>> {
        Ok(self.receipts.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_owner(&self, username: &str) -> AppResult<Vec<Receipt>> {
        let mut owned: Vec<Receipt> = self
            .receipts
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.receipt.username == username)
            .map(|c| c.receipt.clone())
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn upsert_for_expense(&self, receipt: NewReceipt) -> AppResult<Receipt> {
        Ok(self.replace_receipt(receipt))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        match self.receipts.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(AppError::EntityNotFound("Receipt")),
        }
    }
}

#[async_trait]
impl AuditRepository for InMemory {
    async fn append(&self, entry: NewAuditLog) -> AppResult<()> {
        if self.audit_offline.load(Ordering::SeqCst) {
            return Err(AppError::internal("audit store offline"));
        }
        self.audit.lock().unwrap().push(entry.into());
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<AuditLog>> {
        let mut entries = self.audit_entries();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}

/// Unit of Work over one shared `InMemory`
#[derive(Clone, Default)]
pub struct FakeUnitOfWork {
    pub store: Arc<InMemory>,
}

impl FakeUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UnitOfWork for FakeUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.store.clone()
    }

    fn expenses(&self) -> Arc<dyn ExpenseRepository> {
        self.store.clone()
    }

    fn receipts(&self) -> Arc<dyn ReceiptRepository> {
        self.store.clone()
    }

    fn audit_logs(&self) -> Arc<dyn AuditRepository> {
        self.store.clone()
    }
}

pub fn actor(username: &str, role: UserRole) -> Actor {
    Actor::new(username.to_string(), role)
}

/// Give the background audit writer a chance to drain its queue
pub async fn settle_audit() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}
