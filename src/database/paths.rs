//! 文档路径工具
//!
//! 所有数据都挂在用户节点下：`users/{userId}` 为用户档案，
//! `users/{userId}/{subcollection}/{entryId}` 为该用户拥有的条目。
//! 段数为奇数的是集合路径，偶数的是文档路径。

use crate::error::{Result, TeamLedgerError};
use crate::utils::Validator;

pub const USERS: &str = "users";
pub const TRANSACTIONS: &str = "transactions";
pub const RECAPS: &str = "recaps";
pub const MISSIONS: &str = "missions";
pub const NOTIFICATIONS: &str = "notifications";

pub fn user(user_id: &str) -> String {
    format!("{USERS}/{user_id}")
}

pub fn user_collection(user_id: &str, collection: &str) -> String {
    format!("{USERS}/{user_id}/{collection}")
}

pub fn user_entry(user_id: &str, collection: &str, entry_id: &str) -> String {
    format!("{USERS}/{user_id}/{collection}/{entry_id}")
}

/// 拆分并校验路径的每一段
pub fn segments(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.iter().all(|p| Validator::is_valid_document_id(p)) {
        Ok(parts)
    } else {
        Err(TeamLedgerError::invalid_path(path))
    }
}

pub fn is_document_path(path: &str) -> bool {
    segments(path).map(|s| s.len() % 2 == 0).unwrap_or(false)
}

pub fn is_collection_path(path: &str) -> bool {
    segments(path).map(|s| s.len() % 2 == 1).unwrap_or(false)
}

/// 文档路径 -> (所在集合路径, 文档 ID)
pub fn split_document(path: &str) -> Result<(&str, &str)> {
    if !is_document_path(path) {
        return Err(TeamLedgerError::invalid_path(path));
    }
    path.rsplit_once('/')
        .ok_or_else(|| TeamLedgerError::invalid_path(path))
}

/// 路径所属用户
pub fn owner_of(path: &str) -> Option<&str> {
    let mut parts = path.split('/');
    match (parts.next(), parts.next()) {
        (Some(USERS), Some(owner)) if !owner.is_empty() => Some(owner),
        _ => None,
    }
}
