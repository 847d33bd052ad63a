//! Synthetic multi-view scenes with exact two-view observations.

use std::collections::HashMap;

use anyhow::{ensure, Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{centroid, rotation_from_angle_axis, Real, Rot3, TwoViewInfo, Vec3, ViewId, ViewIdPair};

/// Which view pairs receive an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairTopology {
    /// Every pair of views.
    Complete,
    /// Each view `i` is linked to `i + 1` and to `i + chord_step` (mod n).
    RingWithChords { chord_step: usize },
}

/// Ground-truth camera centres and world-to-camera orientations.
#[derive(Debug, Clone)]
pub struct SyntheticScene {
    pub positions: HashMap<ViewId, Vec3>,
    pub orientations: HashMap<ViewId, Rot3>,
}

impl SyntheticScene {
    /// Views `0..num_views` with centres uniform in `[-10, 10]^3` and
    /// orientations with angle-axis components uniform in `[-0.5, 0.5]`.
    pub fn random(num_views: usize, seed: u64) -> Result<Self> {
        ensure!(num_views >= 2, "a scene needs at least two views, got {num_views}");
        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions = HashMap::with_capacity(num_views);
        let mut orientations = HashMap::with_capacity(num_views);
        for i in 0..num_views {
            let id = ViewId::try_from(i).context("view index does not fit a ViewId")?;
            let c = Vec3::new(
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
            );
            let aa = Vec3::new(
                rng.random_range(-0.5..0.5),
                rng.random_range(-0.5..0.5),
                rng.random_range(-0.5..0.5),
            );
            positions.insert(id, c);
            orientations.insert(id, rotation_from_angle_axis(&aa));
        }
        Ok(Self {
            positions,
            orientations,
        })
    }

    /// View ids in ascending order.
    pub fn view_ids(&self) -> Vec<ViewId> {
        let mut ids: Vec<_> = self.positions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Exact observation for one pair, expressed in the frame of the
    /// smaller view id.
    pub fn two_view_info(&self, pair: ViewIdPair) -> Result<TwoViewInfo> {
        let (a, b) = (pair.first(), pair.second());
        let (ca, cb) = (self.position(a)?, self.position(b)?);
        let (ra, rb) = (self.orientation(a)?, self.orientation(b)?);
        let direction = ra * (cb - ca);
        ensure!(
            direction.norm() > 0.0,
            "views {a} and {b} share the same centre"
        );
        Ok(TwoViewInfo::from_relative_pose(&(rb * ra.transpose()), &direction))
    }

    /// Exact observations for every edge of the requested topology.
    pub fn view_pairs(&self, topology: PairTopology) -> HashMap<ViewIdPair, TwoViewInfo> {
        let ids = self.view_ids();
        let n = ids.len();
        let mut edges = Vec::new();
        match topology {
            PairTopology::Complete => {
                for i in 0..n {
                    for j in (i + 1)..n {
                        edges.push((ids[i], ids[j]));
                    }
                }
            }
            PairTopology::RingWithChords { chord_step } => {
                for i in 0..n {
                    edges.push((ids[i], ids[(i + 1) % n]));
                    if chord_step > 1 {
                        edges.push((ids[i], ids[(i + chord_step) % n]));
                    }
                }
            }
        }

        edges
            .into_iter()
            .filter_map(|(a, b)| ViewIdPair::new(a, b).ok())
            .filter_map(|pair| self.two_view_info(pair).ok().map(|info| (pair, info)))
            .collect()
    }

    fn position(&self, id: ViewId) -> Result<Vec3> {
        self.positions
            .get(&id)
            .copied()
            .with_context(|| format!("view {id} has no position"))
    }

    fn orientation(&self, id: ViewId) -> Result<Rot3> {
        self.orientations
            .get(&id)
            .copied()
            .with_context(|| format!("view {id} has no orientation"))
    }
}

/// Replace the observed direction of `pair` with `direction` (normalised),
/// turning the observation into an outlier.
pub fn corrupt_pair(
    view_pairs: &mut HashMap<ViewIdPair, TwoViewInfo>,
    pair: ViewIdPair,
    direction: Vec3,
) -> Result<()> {
    ensure!(direction.norm() > 0.0, "corrupted direction must be non-zero");
    let info = view_pairs
        .get_mut(&pair)
        .with_context(|| format!("pair {pair} is not in the view graph"))?;
    info.position_2 = direction.normalize();
    Ok(())
}

/// Map `estimated` onto `truth` with the translation and uniform scale that
/// minimise the squared error over the common views.
pub fn align_to_ground_truth(
    estimated: &HashMap<ViewId, Vec3>,
    truth: &HashMap<ViewId, Vec3>,
) -> Result<HashMap<ViewId, Vec3>> {
    let common: Vec<ViewId> = estimated
        .keys()
        .filter(|id| truth.contains_key(id))
        .copied()
        .collect();
    ensure!(common.len() >= 2, "need at least two common views to align");

    let est: Vec<Vec3> = common.iter().map(|id| estimated[id]).collect();
    let gt: Vec<Vec3> = common.iter().map(|id| truth[id]).collect();
    let ce = centroid(&est).context("empty estimate")?;
    let cg = centroid(&gt).context("empty ground truth")?;

    let (mut num, mut den) = (0.0, 0.0);
    for (e, g) in est.iter().zip(&gt) {
        num += (e - ce).dot(&(g - cg));
        den += (e - ce).norm_squared();
    }
    ensure!(den > 0.0, "estimated positions are all identical");
    let scale = num / den;

    Ok(estimated
        .iter()
        .map(|(id, e)| (*id, (e - ce) * scale + cg))
        .collect())
}

/// Largest distance between matching positions of two maps.
pub fn max_position_error(a: &HashMap<ViewId, Vec3>, b: &HashMap<ViewId, Vec3>) -> Real {
    a.iter()
        .filter_map(|(id, p)| b.get(id).map(|q| (p - q).norm()))
        .fold(0.0, Real::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotate_to_world;

    #[test]
    fn scene_is_reproducible_from_seed() {
        let a = SyntheticScene::random(5, 42).unwrap();
        let b = SyntheticScene::random(5, 42).unwrap();
        for id in a.view_ids() {
            assert_eq!(a.positions[&id], b.positions[&id]);
        }
    }

    #[test]
    fn observations_match_world_directions() {
        let scene = SyntheticScene::random(4, 3).unwrap();
        let pairs = scene.view_pairs(PairTopology::Complete);
        for (pair, info) in &pairs {
            let (i, j) = (pair.first(), pair.second());
            let world = rotate_to_world(&scene.orientations[&i], &info.position_2);
            let expected = (scene.positions[&j] - scene.positions[&i]).normalize();
            assert!((world - expected).norm() < 1e-12, "pair {pair}");
        }
    }

    #[test]
    fn ring_with_chords_edge_count() {
        let scene = SyntheticScene::random(8, 1).unwrap();
        let pairs = scene.view_pairs(PairTopology::RingWithChords { chord_step: 3 });
        assert_eq!(pairs.len(), 16);
    }

    #[test]
    fn alignment_removes_translation_and_scale() {
        let scene = SyntheticScene::random(6, 9).unwrap();
        let shifted: HashMap<_, _> = scene
            .positions
            .iter()
            .map(|(id, p)| (*id, p * 0.25 + Vec3::new(3.0, -1.0, 2.0)))
            .collect();
        let aligned = align_to_ground_truth(&shifted, &scene.positions).unwrap();
        assert!(max_position_error(&aligned, &scene.positions) < 1e-9);
    }

    #[test]
    fn too_small_scene_is_rejected() {
        assert!(SyntheticScene::random(1, 0).is_err());
    }
}
