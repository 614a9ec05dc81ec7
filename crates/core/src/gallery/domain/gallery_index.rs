use std::collections::HashMap;

use thiserror::Error;

use crate::gallery::domain::embedding::{cosine_distance, l2_normalize};

/// Raw enrollment data as produced by a gallery store: identity key to
/// the embedding samples captured for that identity.
pub type RawGallery = HashMap<String, Vec<Vec<f32>>>;

#[derive(Error, Debug)]
pub enum GalleryLoadError {
    #[error("no identity in the gallery has a usable embedding")]
    Empty,
}

/// One enrolled identity: its normalized embedding samples and their
/// renormalized centroid.
///
/// The centroid is kept as a cheap representative for inspection and
/// diagnostics; matching always scans the individual samples, which
/// tolerates intra-identity variation (pose, lighting) far better than a
/// single averaged vector.
#[derive(Clone, Debug)]
pub struct GalleryEntry {
    pub identity: String,
    pub embeddings: Vec<Vec<f32>>,
    pub centroid: Vec<f32>,
}

/// Outcome of a nearest-identity query.
#[derive(Clone, Debug, PartialEq)]
pub struct NearestMatch {
    pub identity: String,
    pub distance: f64,
    /// Minimum distance of the runner-up identity; `None` when only one
    /// identity is enrolled.
    pub runner_up: Option<f64>,
}

/// Immutable nearest-neighbor index over the enrolled gallery.
///
/// Built once at startup and shared by read-only reference with the
/// recognition worker; never mutated afterwards, so no locking is needed.
#[derive(Debug, Default)]
pub struct GalleryIndex {
    entries: Vec<GalleryEntry>,
    dim: usize,
}

impl GalleryIndex {
    /// Builds the index from raw per-identity samples.
    ///
    /// Each sample is L2-normalized. A sample is usable if it is
    /// non-empty and matches the gallery dimension, fixed by the first
    /// usable sample seen. Identities with no usable sample are skipped
    /// with a warning; the load only fails when nothing survives.
    pub fn from_raw(raw: RawGallery) -> Result<Self, GalleryLoadError> {
        let mut identities: Vec<(String, Vec<Vec<f32>>)> = raw.into_iter().collect();
        // HashMap order is nondeterministic; fix it so ties in queries
        // and log output are reproducible.
        identities.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut entries = Vec::new();
        let mut dim = 0usize;

        for (identity, samples) in identities {
            let total = samples.len();
            let mut embeddings = Vec::new();
            for mut sample in samples {
                if sample.is_empty() || (dim != 0 && sample.len() != dim) {
                    continue;
                }
                if dim == 0 {
                    dim = sample.len();
                }
                l2_normalize(&mut sample);
                embeddings.push(sample);
            }

            if embeddings.is_empty() {
                log::warn!("skipping identity '{identity}': no usable embedding among {total} samples");
                continue;
            }

            let centroid = centroid_of(&embeddings, dim);
            log::debug!("enrolled '{identity}' with {} embeddings", embeddings.len());
            entries.push(GalleryEntry {
                identity,
                embeddings,
                centroid,
            });
        }

        if entries.is_empty() {
            return Err(GalleryLoadError::Empty);
        }
        Ok(Self { entries, dim })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Nearest enrolled identity by minimum per-sample cosine distance.
    ///
    /// Scans every stored embedding of every identity — O(total samples)
    /// per query, acceptable because enrollment sets are small and this
    /// runs on the background worker. Returns the globally best identity,
    /// its distance, and the runner-up identity's minimum distance.
    pub fn query(&self, embedding: &[f32]) -> Option<NearestMatch> {
        let mut best: Option<(usize, f64)> = None;
        let mut second: Option<f64> = None;

        for (i, entry) in self.entries.iter().enumerate() {
            let min_dist = entry
                .embeddings
                .iter()
                .map(|e| cosine_distance(embedding, e))
                .fold(f64::INFINITY, f64::min);

            match best {
                None => best = Some((i, min_dist)),
                Some((_, best_dist)) if min_dist < best_dist => {
                    second = Some(best_dist);
                    best = Some((i, min_dist));
                }
                Some(_) => {
                    if second.map_or(true, |s| min_dist < s) {
                        second = Some(min_dist);
                    }
                }
            }
        }

        best.map(|(i, distance)| NearestMatch {
            identity: self.entries[i].identity.clone(),
            distance,
            runner_up: second,
        })
    }
}

fn centroid_of(embeddings: &[Vec<f32>], dim: usize) -> Vec<f32> {
    let mut centroid = vec![0.0f32; dim];
    for e in embeddings {
        for (c, x) in centroid.iter_mut().zip(e.iter()) {
            *c += x;
        }
    }
    let n = embeddings.len() as f32;
    for c in centroid.iter_mut() {
        *c /= n;
    }
    l2_normalize(&mut centroid);
    centroid
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn raw(entries: &[(&str, Vec<Vec<f32>>)]) -> RawGallery {
        entries
            .iter()
            .map(|(id, samples)| (id.to_string(), samples.clone()))
            .collect()
    }

    #[test]
    fn test_from_raw_normalizes_samples() {
        let index = GalleryIndex::from_raw(raw(&[("a", vec![vec![3.0, 4.0]])])).unwrap();
        let e = &index.entries()[0].embeddings[0];
        assert_relative_eq!(e[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(e[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_from_raw_skips_identity_without_usable_samples() {
        let index = GalleryIndex::from_raw(raw(&[
            ("good", vec![vec![1.0, 0.0]]),
            ("empty", vec![vec![]]),
        ]))
        .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.entries()[0].identity, "good");
    }

    #[test]
    fn test_from_raw_skips_dimension_mismatch() {
        let index = GalleryIndex::from_raw(raw(&[
            ("a", vec![vec![1.0, 0.0]]),
            ("b", vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0]]),
        ]))
        .unwrap();
        assert_eq!(index.dim(), 2);
        let b = index
            .entries()
            .iter()
            .find(|e| e.identity == "b")
            .unwrap();
        assert_eq!(b.embeddings.len(), 1);
    }

    #[test]
    fn test_from_raw_fails_when_nothing_usable() {
        let err = GalleryIndex::from_raw(raw(&[("a", vec![vec![]]), ("b", vec![])]));
        assert!(matches!(err, Err(GalleryLoadError::Empty)));
    }

    #[test]
    fn test_centroid_is_renormalized_mean() {
        let index = GalleryIndex::from_raw(raw(&[(
            "a",
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )]))
        .unwrap();
        let c = &index.entries()[0].centroid;
        let inv_sqrt2 = 1.0 / 2.0f32.sqrt();
        assert_relative_eq!(c[0], inv_sqrt2, epsilon = 1e-6);
        assert_relative_eq!(c[1], inv_sqrt2, epsilon = 1e-6);
    }

    #[test]
    fn test_query_returns_nearest_identity_with_runner_up() {
        let index = GalleryIndex::from_raw(raw(&[
            ("alice", vec![vec![1.0, 0.0]]),
            ("bob", vec![vec![0.0, 1.0]]),
        ]))
        .unwrap();
        let m = index.query(&[0.9, 0.1]).unwrap();
        assert_eq!(m.identity, "alice");
        assert!(m.distance < 0.1);
        let runner_up = m.runner_up.unwrap();
        assert!(runner_up > m.distance);
    }

    #[test]
    fn test_query_single_identity_has_no_runner_up() {
        let index = GalleryIndex::from_raw(raw(&[("solo", vec![vec![1.0, 0.0]])])).unwrap();
        let m = index.query(&[1.0, 0.0]).unwrap();
        assert_eq!(m.identity, "solo");
        assert!(m.runner_up.is_none());
    }

    #[test]
    fn test_query_uses_per_sample_minimum_not_centroid() {
        // "varied" has two very different poses; their centroid points
        // nowhere near either. A query matching one pose exactly must
        // still win against "steady", whose centroid is closer to the
        // varied centroid than either pose is.
        let index = GalleryIndex::from_raw(raw(&[
            ("varied", vec![vec![1.0, 0.0], vec![0.0, 1.0]]),
            ("steady", vec![vec![0.8, 0.6]]),
        ]))
        .unwrap();
        let m = index.query(&[1.0, 0.0]).unwrap();
        assert_eq!(m.identity, "varied");
        assert_relative_eq!(m.distance, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_query_runner_up_is_minimum_of_the_rest() {
        let index = GalleryIndex::from_raw(raw(&[
            ("near", vec![vec![1.0, 0.0]]),
            ("mid", vec![vec![0.8, 0.6]]),
            ("far", vec![vec![-1.0, 0.0]]),
        ]))
        .unwrap();
        let m = index.query(&[1.0, 0.0]).unwrap();
        assert_eq!(m.identity, "near");
        // runner-up must be "mid" (distance 0.2), not "far" (distance 2.0)
        assert_relative_eq!(m.runner_up.unwrap(), 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_query_empty_index_returns_none() {
        let index = GalleryIndex::default();
        assert!(index.query(&[1.0, 0.0]).is_none());
    }
}
