//! 标识分配
//!
//! 给定 URL：已存在则返回原标识，否则分配下一个顺序标识（从 1 开始，连续无空洞）。
//! 内存和行日志后端共用这套逻辑；数据库后端依赖唯一索引和自增主键，外部行为一致。

use std::collections::HashMap;

/// 分配结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// URL 已存在，沿用原标识
    Existing(u64),
    /// 新分配的标识
    Created(u64),
}

impl Assignment {
    pub fn id(&self) -> u64 {
        match *self {
            Assignment::Existing(id) | Assignment::Created(id) => id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Assignment::Created(_))
    }
}

/// full_url → short_id 索引
///
/// `next` 单独记录：行日志里可能存在历史重复行，它们占用位置但不进入索引。
#[derive(Debug, Clone)]
pub struct UrlIndex {
    ids: HashMap<String, u64>,
    next: u64,
}

impl Default for UrlIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlIndex {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            next: 1,
        }
    }

    pub fn lookup(&self, url: &str) -> Option<u64> {
        self.ids.get(url).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// 下一个将被分配的标识
    pub fn next_id(&self) -> u64 {
        self.next
    }

    /// 只计算，不修改索引
    pub fn plan(&self, url: &str) -> Assignment {
        match self.lookup(url) {
            Some(id) => Assignment::Existing(id),
            None => Assignment::Created(self.next_id()),
        }
    }

    /// 计算整批的分配结果（按输入顺序），不修改索引
    ///
    /// 同一批次内重复的 URL 共用第一次出现时分配的标识。
    pub fn plan_batch<'a, I>(&self, urls: I) -> Vec<Assignment>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut pending: HashMap<&'a str, u64> = HashMap::new();
        let mut next = self.next_id();

        urls.into_iter()
            .map(|url| {
                if let Some(id) = self.lookup(url) {
                    return Assignment::Existing(id);
                }
                if let Some(&id) = pending.get(url) {
                    return Assignment::Existing(id);
                }
                let id = next;
                next += 1;
                pending.insert(url, id);
                Assignment::Created(id)
            })
            .collect()
    }

    /// 记录一个已经持久化的新标识
    ///
    /// 只接受 `next_id()`，保证标识连续；返回 false 表示调用方状态已错乱。
    pub fn commit(&mut self, url: &str, id: u64) -> bool {
        if id != self.next || self.ids.contains_key(url) {
            return false;
        }
        self.ids.insert(url.to_owned(), id);
        self.next += 1;
        true
    }

    /// 从持久化数据恢复一个位置
    ///
    /// 重复的 URL 只占位，查找时以第一次出现为准。返回 false 表示该行是重复行。
    pub fn restore(&mut self, url: &str) -> bool {
        let id = self.next;
        self.next += 1;
        if self.ids.contains_key(url) {
            return false;
        }
        self.ids.insert(url.to_owned(), id);
        true
    }

    /// plan + commit
    pub fn assign(&mut self, url: &str) -> Assignment {
        let assignment = self.plan(url);
        if let Assignment::Created(id) = assignment {
            self.ids.insert(url.to_owned(), id);
            self.next += 1;
        }
        assignment
    }
}
