// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Memoized expression typing
//!
//! Typing is a pure function of the expression, the binding types and the
//! context type, so results can be reused across edits. Entries are keyed by
//! a [`TypeCacheKey`] holding those three inputs. A cache belongs to one
//! analyzer: registries and resolver are not part of the key.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use rustc_hash::FxBuildHasher;

use crate::model::types::Type;
use crate::parser::tokens::Token;

use super::type_analyzer::BindingTypes;

/// Inputs of one typing request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeCacheKey {
    tokens: Vec<Token>,
    bindings: Vec<(String, Type)>,
    context: Type,
}

impl TypeCacheKey {
    /// Key of typing `tokens` under `bindings` and `context`
    pub fn new(tokens: &[Token], bindings: &BindingTypes, context: &Type) -> Self {
        Self {
            tokens: tokens.to_vec(),
            bindings: bindings
                .iter()
                .map(|(name, ty)| (name.clone(), ty.clone()))
                .collect(),
            context: context.clone(),
        }
    }
}

/// Counters of a [`TypeCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to compute the type
    pub misses: u64,
    /// Entries currently stored
    pub len: usize,
    /// Maximum number of entries
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of expression types
pub struct TypeCache {
    entries: Mutex<LruCache<TypeCacheKey, Type, FxBuildHasher>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TypeCache {
    /// Create a cache holding up to `capacity` types; `None` when `capacity` is zero
    pub fn new(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            entries: Mutex::new(LruCache::with_hasher(capacity, FxBuildHasher)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Cached type for `key`, refreshing its recency
    pub fn get(&self, key: &TypeCacheKey) -> Option<Type> {
        let found = self.entries.lock().get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store a computed type
    pub fn insert(&self, key: TypeCacheKey, ty: Type) {
        if let Some((evicted, _)) = self.entries.lock().push(key, ty) {
            let dropped = evicted.tokens.len();
            log::trace!("type cache dropped an entry of {dropped} tokens");
        }
    }

    /// Type for `key`, computing and storing it on a miss
    pub fn get_or_insert_with<F>(&self, key: TypeCacheKey, compute: F) -> Type
    where
        F: FnOnce() -> Type,
    {
        if let Some(ty) = self.get(&key) {
            return ty;
        }
        // computed without holding the lock: typing may recurse into the cache
        let ty = compute();
        self.insert(key, ty.clone());
        ty
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len: entries.len(),
            capacity: entries.cap().get(),
        }
    }
}

impl std::fmt::Debug for TypeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeCache")
            .field("stats", &self.stats())
            .finish()
    }
}
