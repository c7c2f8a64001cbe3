/*
 * Copyright 2019 Zejun Li
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::geometry::Polygon;
use crate::nfp::key::NfpKey;

/// Thread-safe NFP result cache: many concurrent readers, exclusive
/// writers, acquired strictly after any geometry-backend lock has been
/// released (see `geometry::ops`) so cache writes never block behind a
/// boolean-op call.
#[derive(Default)]
pub struct NfpCache {
    entries: RwLock<HashMap<NfpKey, Vec<Polygon>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl NfpCache {
    pub fn new() -> NfpCache {
        NfpCache::default()
    }

    pub fn has(&self, key: &NfpKey) -> bool {
        self.entries.read().unwrap().contains_key(key)
    }

    pub fn find(&self, key: &NfpKey) -> Option<Vec<Polygon>> {
        let result = self.entries.read().unwrap().get(key).cloned();
        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    pub fn insert(&self, key: NfpKey, nfp: Vec<Polygon>) {
        self.entries.write().unwrap().insert(key, nfp);
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    pub fn size(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.size(),
        }
    }

    pub fn reset_statistics(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
