//! 行日志存储
//!
//! 每行一个 JSON 记录，只追加不修改；标识就是记录的序号（从 1 开始，空行不计）。
//! 打开时扫描一遍文件重建 `UrlIndex` 和行偏移表，之后的查重 O(1)，
//! 按标识查找直接 seek 到对应行。
//!
//! 同一路径在进程内只对应一份状态（一把锁），多个 `LineLogStore` 打开同一个文件时共享它。
//! 其他进程对文件的插入、删除或重排会破坏“行号即标识”，追加前会校验文件长度。

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::assigner::{Assignment, UrlIndex};
use super::links::LinkBuilder;
use super::models::{BatchItem, Entry, LogRecord};
use super::{BackendKind, UrlStore};
use crate::errors::{Result, ShortenerError};

type SharedLog = Arc<Mutex<LogState>>;

/// 已打开的行日志文件，按规范化路径索引
static OPEN_LOGS: Lazy<DashMap<PathBuf, Weak<Mutex<LogState>>>> = Lazy::new(DashMap::new);

struct LogState {
    path: PathBuf,
    index: UrlIndex,
    /// offsets[i] 是第 i + 1 条记录的起始字节（空行不计）
    offsets: Vec<u64>,
    /// 已确认写入的文件长度
    end: u64,
    /// 最后一行缺少换行符，下次追加前先补上
    needs_newline: bool,
}

fn trim_line(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

fn is_blank(buf: &[u8]) -> bool {
    buf.iter().all(u8::is_ascii_whitespace)
}

fn parse_record(path: &Path, line_no: u64, buf: &[u8]) -> Result<LogRecord> {
    serde_json::from_slice(trim_line(buf)).map_err(|e| {
        ShortenerError::serialization(format!(
            "{}:{}: malformed record: {}",
            path.display(),
            line_no,
            e
        ))
    })
}

impl LogState {
    fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            ShortenerError::storage_io(format!("failed to open {}: {}", path.display(), e))
        })?;
        let mut reader = BufReader::new(file);

        let mut state = LogState {
            path: path.to_path_buf(),
            index: UrlIndex::new(),
            offsets: Vec::new(),
            end: 0,
            needs_newline: false,
        };

        let mut buf = Vec::new();
        let mut duplicates = 0usize;
        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }

            let start = state.end;
            state.end += read as u64;
            state.needs_newline = buf.last() != Some(&b'\n');
            if is_blank(&buf) {
                continue;
            }

            let line_no = state.offsets.len() as u64 + 1;
            let record = parse_record(path, line_no, &buf)?;
            if !state.index.restore(&record.full_url) {
                duplicates += 1;
            }
            state.offsets.push(start);
        }

        if duplicates > 0 {
            warn!(
                "Line log {} contains {} duplicate URL lines; the first occurrence wins",
                path.display(),
                duplicates
            );
        }

        Ok(state)
    }

    /// 追加若干条记录，全部写入并 flush 后才推进偏移表
    ///
    /// 写入失败时把文件截断回写入前的长度，避免半行破坏后续行号。
    fn append(&mut self, records: &[LogRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;

        let on_disk = file.metadata()?.len();
        if on_disk != self.end {
            error!(
                "Line log {} changed outside this process ({} bytes on disk, {} expected)",
                self.path.display(),
                on_disk,
                self.end
            );
            return Err(ShortenerError::storage_io(format!(
                "line log {} was modified externally",
                self.path.display()
            )));
        }

        let mut buf = Vec::new();
        if self.needs_newline {
            buf.push(b'\n');
        }
        let mut new_offsets = Vec::with_capacity(records.len());
        for record in records {
            new_offsets.push(self.end + buf.len() as u64);
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }

        if let Err(e) = file.write_all(&buf).and_then(|_| file.flush()) {
            error!("Failed to append to {}: {}", self.path.display(), e);
            if let Err(truncate_err) = file.set_len(self.end) {
                warn!(
                    "Failed to roll back partial write on {}: {}",
                    self.path.display(),
                    truncate_err
                );
            }
            return Err(e.into());
        }

        self.end += buf.len() as u64;
        self.offsets.extend(new_offsets);
        self.needs_newline = false;
        Ok(())
    }

    fn read_record(&self, short_id: u64) -> Result<LogRecord> {
        let offset = short_id
            .checked_sub(1)
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| self.offsets.get(idx))
            .copied()
            .ok_or_else(|| ShortenerError::not_found(format!("short id {} not found", short_id)))?;

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut buf = Vec::new();
        BufReader::new(file).read_until(b'\n', &mut buf)?;
        parse_record(&self.path, short_id, &buf)
    }

    /// 顺序扫描已知的行（外部追加的行不计入）
    fn scan<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(u64, LogRecord),
    {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();

        let total = self.offsets.len() as u64;
        let mut line_no = 0u64;
        while line_no < total {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Err(ShortenerError::storage_io(format!(
                    "line log {} truncated at record {}",
                    self.path.display(),
                    line_no + 1
                )));
            }
            if is_blank(&buf) {
                continue;
            }
            line_no += 1;
            visit(line_no, parse_record(&self.path, line_no, &buf)?);
        }
        Ok(())
    }
}

/// 追加写行日志存储
pub struct LineLogStore {
    links: LinkBuilder,
    state: SharedLog,
}

impl LineLogStore {
    /// 打开（不存在则创建）行日志文件
    pub fn open(path: impl AsRef<Path>, links: LinkBuilder) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                ShortenerError::storage_io(format!("failed to create {}: {}", path.display(), e))
            })?;

        let canonical = fs::canonicalize(path)?;
        let state = Self::shared_state(&canonical)?;

        {
            let guard = state.lock();
            info!(
                "Line log opened: {} ({} lines, {} unique URLs)",
                canonical.display(),
                guard.offsets.len(),
                guard.index.len()
            );
        }

        Ok(Self { links, state })
    }

    fn shared_state(canonical: &Path) -> Result<SharedLog> {
        match OPEN_LOGS.entry(canonical.to_path_buf()) {
            MapEntry::Occupied(mut occupied) => {
                if let Some(state) = occupied.get().upgrade() {
                    debug!("Reusing open line log {}", canonical.display());
                    return Ok(state);
                }
                let state = Arc::new(Mutex::new(LogState::load(canonical)?));
                occupied.insert(Arc::downgrade(&state));
                Ok(state)
            }
            MapEntry::Vacant(vacant) => {
                let state = Arc::new(Mutex::new(LogState::load(canonical)?));
                vacant.insert(Arc::downgrade(&state));
                Ok(state)
            }
        }
    }

    /// 文件中的记录数
    pub fn line_count(&self) -> usize {
        self.state.lock().offsets.len()
    }

    fn record_for(&self, url: &str, owner_token: &str, id: u64, correlation_id: &str) -> LogRecord {
        LogRecord {
            full_url: url.to_owned(),
            short_url: self.links.link(id),
            user_token: owner_token.to_owned(),
            correlation_id: correlation_id.to_owned(),
        }
    }
}

#[async_trait]
impl UrlStore for LineLogStore {
    async fn store(&self, url: &str, owner_token: &str) -> Result<u64> {
        let mut state = self.state.lock();

        match state.index.plan(url) {
            Assignment::Existing(id) => Ok(id),
            Assignment::Created(id) => {
                let record = self.record_for(url, owner_token, id, "");
                state.append(std::slice::from_ref(&record))?;
                state.index.commit(url, id);
                debug!("Line log store: {} -> {}", url, id);
                Ok(id)
            }
        }
    }

    async fn find(&self, short_id: u64) -> Result<String> {
        let state = self.state.lock();
        state.read_record(short_id).map(|record| record.full_url)
    }

    async fn get_by_user(&self, owner_token: &str) -> Result<Vec<Entry>> {
        let state = self.state.lock();
        let mut entries = Vec::new();
        state.scan(|line_no, record| {
            // 历史重复行不算独立记录
            if record.user_token == owner_token
                && state.index.lookup(&record.full_url) == Some(line_no)
            {
                entries.push(record.into_entry(line_no));
            }
        })?;
        Ok(entries)
    }

    async fn batch(&self, items: &[BatchItem], owner_token: &str) -> Result<Vec<(String, u64)>> {
        let mut state = self.state.lock();

        let plan = state
            .index
            .plan_batch(items.iter().map(|item| item.original_url.as_str()));

        let records: Vec<LogRecord> = items
            .iter()
            .zip(&plan)
            .filter(|(_, assignment)| assignment.is_created())
            .map(|(item, assignment)| {
                self.record_for(
                    &item.original_url,
                    owner_token,
                    assignment.id(),
                    &item.correlation_id,
                )
            })
            .collect();

        // 一次打开、一次 flush
        state.append(&records)?;
        for record in &records {
            let id = state.index.next_id();
            state.index.commit(&record.full_url, id);
        }

        debug!(
            "Line log batch: {} items, {} new lines",
            items.len(),
            records.len()
        );

        Ok(items
            .iter()
            .zip(plan)
            .map(|(item, assignment)| (item.correlation_id.clone(), assignment.id()))
            .collect())
    }

    async fn ping(&self) -> bool {
        true
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::File
    }
}
