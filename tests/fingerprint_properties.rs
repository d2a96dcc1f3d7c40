// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/lumamark

//! Fingerprint determinism and nearest-neighbour behaviour.

use std::f64::consts::TAU;

use image::{DynamicImage, Rgb, RgbImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use lumamark::fingerprint::generate;
use lumamark::{embed, CancelToken, InMemoryVectorStore, PayloadFields, VectorStore, FINGERPRINT_DIM};

fn random_image(width: u32, height: u32, seed: u64) -> DynamicImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut img = RgbImage::new(width, height);
    for pixel in img.pixels_mut() {
        *pixel = Rgb([rng.gen(), rng.gen(), rng.gen()]);
    }
    DynamicImage::ImageRgb8(img)
}

/// Low-frequency content that differs clearly between seeds, so cosine
/// comparisons are not dominated by the shared DC level alone.
fn structured_image(width: u32, height: u32, seed: u64) -> DynamicImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let fx: f64 = rng.gen_range(1.0..4.0);
    let fy: f64 = rng.gen_range(1.0..4.0);
    let px: f64 = rng.gen_range(0.0..TAU);
    let py: f64 = rng.gen_range(0.0..TAU);

    let mut img = RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let wave = (TAU * fx * x as f64 / width as f64 + px).sin()
            * (TAU * fy * y as f64 / height as f64 + py).cos();
        let v = (128.0 + 80.0 * wave).round().clamp(0.0, 255.0) as u8;
        *pixel = Rgb([v, v, v]);
    }
    DynamicImage::ImageRgb8(img)
}

#[test]
fn deterministic_across_calls() {
    let img = random_image(640, 480, 31);
    let a = generate(&img).unwrap();
    let b = generate(&img).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.as_slice().len(), FINGERPRINT_DIM);
}

#[test]
fn all_components_are_finite() {
    let fp = generate(&random_image(512, 384, 77)).unwrap();
    assert!(fp.as_slice().iter().all(|v| v.is_finite()));
}

#[test]
fn resize_makes_sizes_comparable() {
    // The same content at two scales lands much closer together than
    // content with a different low-frequency layout.
    let base = structured_image(256, 256, 5);
    let upscaled = DynamicImage::ImageRgb8(
        base.resize_exact(512, 512, image::imageops::FilterType::CatmullRom).to_rgb8(),
    );
    let unrelated = structured_image(256, 256, 6);

    let fp_base = generate(&base).unwrap();
    let fp_up = generate(&upscaled).unwrap();
    let fp_other = generate(&unrelated).unwrap();

    let same = fp_base.cosine_similarity(&fp_up);
    let different = fp_base.cosine_similarity(&fp_other);
    assert!(same > different, "same={same} different={different}");
    assert!(same > 0.9, "same={same}");
}

#[test]
fn knn_finds_the_registered_image_from_a_damaged_copy() {
    let fields = PayloadFields { version: 1, is_ai: false, reserved: 0, metadata_id: 5 };
    let outcome =
        embed(&structured_image(512, 512, 11), &fields, &CancelToken::new()).unwrap();

    let mut store = InMemoryVectorStore::new();
    let registered = Uuid::new_v4();
    store.upsert(registered, &outcome.fingerprint).unwrap();
    for seed in 90..95 {
        let other = generate(&structured_image(512, 512, seed)).unwrap();
        store.upsert(Uuid::new_v4(), &other).unwrap();
    }

    // Query with a locally damaged copy of the registered image.
    let mut damaged = outcome.image;
    for y in 100..120u32 {
        for x in 200..260u32 {
            damaged.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
    let query = generate(&DynamicImage::ImageRgb8(damaged)).unwrap();

    let hits = store.knn(&query, 3).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].0, registered);
    assert!(hits[0].1 > 0.9, "best score {}", hits[0].1);
}
