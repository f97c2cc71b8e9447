//! 字段上下文
//!
//! `Fields` 是附加在 logger 上的键值上下文。它按约定不可变：每次派生
//! （`merge`）都会产生新的映射，因此共享同一祖先的 logger 之间不会看到
//! 彼此追加的字段。
//!
//! `flatten` 输出的缓冲区来自 [`FlattenPool`]，调用方在发射器消费完毕后
//! 必须通过 [`FlattenPool::release`] 归还。`release` 按值接收缓冲区，
//! 重复归还在编译期即被拒绝。

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// 由记录格式本身产生、不允许作为上下文字段再次输出的键
pub const RESERVED_KEYS: [&str; 4] = ["@timestamp", "message", "level", "service"];

static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| RESERVED_KEYS.into_iter().collect());

/// 判断键是否为保留键
pub fn is_reserved(key: &str) -> bool {
    RESERVED.contains(key)
}

/// 扁平化后的键值序列
pub type FlatFields = Vec<(String, Value)>;

/// 字段上下文
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(HashMap<String, Value>);

impl Fields {
    /// 创建空的字段上下文
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// 构造期间追加字段（消费自身）
    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// 返回内容相同、互不共享存储的新映射
    pub fn copy(&self) -> Fields {
        let mut copied = HashMap::with_capacity(self.0.len());
        for (k, v) in &self.0 {
            copied.insert(k.clone(), v.clone());
        }
        Fields(copied)
    }

    /// 在副本上应用 `overrides`，键冲突时以 `overrides` 为准
    ///
    /// 两个输入都不会被修改。
    pub fn merge(&self, overrides: &Fields) -> Fields {
        let mut copied = self.copy();
        for (k, v) in &overrides.0 {
            copied.0.insert(k.clone(), v.clone());
        }
        copied
    }

    /// 展开为键值序列，跳过保留键
    ///
    /// 返回的缓冲区由调用方独占，使用后须交给 `pool.release`。
    pub fn flatten(&self, pool: &FlattenPool) -> FlatFields {
        let mut list = pool.acquire();
        for (k, v) in &self.0 {
            if is_reserved(k) {
                continue;
            }
            list.push((k.clone(), v.clone()));
        }
        list
    }

    /// 读取字段
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<HashMap<String, Value>> for Fields {
    fn from(map: HashMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// 构造 [`Fields`] 的便捷宏
///
/// ```rust
/// use tee_log::fields;
///
/// let f = fields! { "user" => "alice", "attempt" => 3 };
/// assert_eq!(f.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Fields::new()$(.with_field($key, $value))+
    };
}

/// 默认空闲缓冲区上限
pub const DEFAULT_POOL_CAPACITY: usize = 64;

/// 扁平化缓冲区池
///
/// 一个由互斥锁保护的定长空闲链表。每次 `acquire` 得到的缓冲区在归还
/// 之前只属于当前调用方；归还时清空内容、保留容量。
#[derive(Debug)]
pub struct FlattenPool {
    free: Mutex<Vec<FlatFields>>,
    max_idle: usize,
}

impl FlattenPool {
    pub fn new(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_idle)),
            max_idle,
        }
    }

    /// 取出一个空缓冲区
    pub fn acquire(&self) -> FlatFields {
        if let Ok(mut free) = self.free.lock() {
            if let Some(buf) = free.pop() {
                return buf;
            }
        }
        Vec::new()
    }

    /// 归还缓冲区
    ///
    /// 空闲链表已满时直接丢弃。
    pub fn release(&self, mut buf: FlatFields) {
        buf.clear();
        if let Ok(mut free) = self.free.lock() {
            if free.len() < self.max_idle {
                free.push(buf);
            }
        }
    }

    /// 当前空闲缓冲区数量
    pub fn idle(&self) -> usize {
        self.free.lock().map(|free| free.len()).unwrap_or(0)
    }
}

impl Default for FlattenPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}
