// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Collaborator contracts for the surrounding service layer.
//!
//! The watermark core never talks to storage itself; these traits pin the
//! two seams it hands results to. The relational store assigns the
//! `metadata_id` that goes into the payload, and the vector store answers
//! nearest-neighbour queries over fingerprints. A small exact-scan
//! in-memory vector store is included for tests and small deployments.

use std::collections::HashMap;
use std::convert::Infallible;

use uuid::Uuid;

use crate::fingerprint::Fingerprint;

/// A metadata row as submitted by the caller, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImageRecord {
    pub serial_id: String,
    pub title: String,
    pub is_ai: bool,
}

/// A stored metadata row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub uuid: Uuid,
    /// The 64-bit id embedded in the watermark payload.
    pub metadata_id: u64,
    pub serial_id: String,
    pub title: String,
    pub is_ai: bool,
}

/// Relational store holding one row per registered image.
pub trait MetadataStore {
    type Error;

    /// Insert a row; the returned `metadata_id` is what gets embedded.
    fn insert(&mut self, record: NewImageRecord) -> Result<(Uuid, u64), Self::Error>;

    fn lookup_by_metadata_id(&self, metadata_id: u64)
        -> Result<Option<ImageRecord>, Self::Error>;

    fn lookup_batch_by_uuid(&self, ids: &[Uuid])
        -> Result<HashMap<Uuid, ImageRecord>, Self::Error>;
}

/// Vector store holding one 1024-D fingerprint per image uuid.
pub trait VectorStore {
    type Error;

    fn upsert(&mut self, id: Uuid, fingerprint: &Fingerprint) -> Result<(), Self::Error>;

    /// The `k` nearest fingerprints by cosine similarity, best first,
    /// scores in `[0, 1]`.
    fn knn(&self, query: &Fingerprint, k: usize)
        -> Result<Vec<(Uuid, f64)>, Self::Error>;
}

/// Metadata store backed by a vec, assigning sequential `metadata_id`s
/// starting at 1. Suitable for tests and single-process deployments.
#[derive(Debug)]
pub struct InMemoryMetadataStore {
    rows: Vec<ImageRecord>,
    next_id: u64,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self { rows: Vec::new(), next_id: 1 }
    }
}

impl Default for InMemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore for InMemoryMetadataStore {
    type Error = Infallible;

    fn insert(&mut self, record: NewImageRecord) -> Result<(Uuid, u64), Infallible> {
        let uuid = Uuid::new_v4();
        let metadata_id = self.next_id;
        self.next_id += 1;
        self.rows.push(ImageRecord {
            uuid,
            metadata_id,
            serial_id: record.serial_id,
            title: record.title,
            is_ai: record.is_ai,
        });
        Ok((uuid, metadata_id))
    }

    fn lookup_by_metadata_id(
        &self,
        metadata_id: u64,
    ) -> Result<Option<ImageRecord>, Infallible> {
        Ok(self.rows.iter().find(|row| row.metadata_id == metadata_id).cloned())
    }

    fn lookup_batch_by_uuid(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ImageRecord>, Infallible> {
        Ok(self
            .rows
            .iter()
            .filter(|row| ids.contains(&row.uuid))
            .map(|row| (row.uuid, row.clone()))
            .collect())
    }
}

/// Exact-scan vector store. Insertion order is kept so results are
/// deterministic; ties break on uuid.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: Vec<(Uuid, Fingerprint)>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VectorStore for InMemoryVectorStore {
    type Error = Infallible;

    fn upsert(&mut self, id: Uuid, fingerprint: &Fingerprint) -> Result<(), Infallible> {
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, stored)) => *stored = fingerprint.clone(),
            None => self.entries.push((id, fingerprint.clone())),
        }
        Ok(())
    }

    fn knn(&self, query: &Fingerprint, k: usize) -> Result<Vec<(Uuid, f64)>, Infallible> {
        let mut scored: Vec<(Uuid, f64)> = self
            .entries
            .iter()
            .map(|(id, stored)| (*id, query.cosine_similarity(stored).clamp(0.0, 1.0)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::generate;
    use image::{DynamicImage, Rgb, RgbImage};

    fn fingerprint_of(shade: u8) -> Fingerprint {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            256,
            256,
            Rgb([shade, shade, shade]),
        ));
        generate(&img).unwrap()
    }

    fn gradient_fingerprint() -> Fingerprint {
        let mut img = RgbImage::new(256, 256);
        for (x, y, p) in img.enumerate_pixels_mut() {
            let v = ((x / 32 + y / 32) % 2) as u8 * 200;
            *p = Rgb([v, v, v]);
        }
        generate(&DynamicImage::ImageRgb8(img)).unwrap()
    }

    #[test]
    fn knn_ranks_by_similarity() {
        let mut store = InMemoryVectorStore::new();
        let near = Uuid::new_v4();
        let far = Uuid::new_v4();
        store.upsert(near, &fingerprint_of(120)).unwrap();
        store.upsert(far, &gradient_fingerprint()).unwrap();

        let hits = store.knn(&fingerprint_of(128), 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, near);
        assert!(hits[0].1 > hits[1].1);
        for (_, score) in &hits {
            assert!((0.0..=1.0).contains(score));
        }
    }

    #[test]
    fn knn_truncates_to_k() {
        let mut store = InMemoryVectorStore::new();
        for shade in [40, 90, 140, 190] {
            store.upsert(Uuid::new_v4(), &fingerprint_of(shade)).unwrap();
        }
        assert_eq!(store.knn(&fingerprint_of(100), 2).unwrap().len(), 2);
        assert_eq!(store.knn(&fingerprint_of(100), 10).unwrap().len(), 4);
    }

    #[test]
    fn metadata_ids_are_sequential_and_queryable() {
        let mut store = InMemoryMetadataStore::new();
        let record = NewImageRecord {
            serial_id: "CAM-00017".to_string(),
            title: "harbour at dusk".to_string(),
            is_ai: false,
        };
        let (uuid_a, id_a) = store.insert(record.clone()).unwrap();
        let (uuid_b, id_b) = store.insert(record).unwrap();
        assert_eq!(id_a, 1);
        assert_eq!(id_b, 2);

        let row = store.lookup_by_metadata_id(id_a).unwrap().unwrap();
        assert_eq!(row.uuid, uuid_a);
        assert_eq!(row.serial_id, "CAM-00017");
        assert!(store.lookup_by_metadata_id(99).unwrap().is_none());

        let batch = store.lookup_batch_by_uuid(&[uuid_a, uuid_b, Uuid::new_v4()]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[&uuid_b].metadata_id, id_b);
    }

    #[test]
    fn upsert_replaces_existing_entries() {
        let mut store = InMemoryVectorStore::new();
        let id = Uuid::new_v4();
        store.upsert(id, &fingerprint_of(30)).unwrap();
        store.upsert(id, &fingerprint_of(220)).unwrap();
        assert_eq!(store.len(), 1);

        let hits = store.knn(&fingerprint_of(220), 1).unwrap();
        assert!((hits[0].1 - 1.0).abs() < 1e-9);
    }
}
