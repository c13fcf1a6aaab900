use crate::core::models::lattice::Lattice;
use nalgebra::Vector3;
use std::ops::RangeInclusive;

/// Axis-wise periodicity flags. Layered structures are periodic in-plane but
/// not along the vacuum-padded stacking axis, so wrap-around logic must take
/// the periodic axes as an explicit parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicAxes(pub [bool; 3]);

impl PeriodicAxes {
    /// All three axes periodic.
    pub fn all() -> Self {
        Self([true; 3])
    }

    /// Periodic on the two axes orthogonal to the stacking axis only.
    pub fn in_plane_of(stacking_axis: usize) -> Self {
        let mut axes = [true; 3];
        axes[stacking_axis] = false;
        Self(axes)
    }

    pub fn is_periodic(&self, axis: usize) -> bool {
        self.0[axis]
    }
}

/// Returns a finite, restartable iterator over the shifted fractional
/// coordinates `frac + (i, j, k)` for every integer shift in the per-axis
/// ranges. The iterator holds no hidden state; calling this again yields the
/// same sequence.
pub fn periodic_images(
    frac: Vector3<f64>,
    shifts: [RangeInclusive<i32>; 3],
) -> impl Iterator<Item = Vector3<f64>> {
    let [ra, rb, rc] = shifts;
    ra.flat_map(move |i| {
        let rb = rb.clone();
        let rc = rc.clone();
        rb.flat_map(move |j| {
            let rc = rc.clone();
            rc.map(move |k| frac + Vector3::new(f64::from(i), f64::from(j), f64::from(k)))
        })
    })
}

/// Wraps each component of a fractional coordinate into `[0, 1)`.
pub fn wrap_frac(frac: &Vector3<f64>) -> Vector3<f64> {
    frac.map(|x| x.rem_euclid(1.0))
}

/// Maps a fractional delta to its minimum-image representative: components on
/// periodic axes are shifted into `[-0.5, 0.5)`, non-periodic components pass
/// through unchanged.
pub fn min_image_delta(delta: &Vector3<f64>, periodic: PeriodicAxes) -> Vector3<f64> {
    let mut out = *delta;
    for axis in 0..3 {
        if periodic.is_periodic(axis) {
            out[axis] -= out[axis].round();
        }
    }
    out
}

/// Minimum-image distance between two fractional coordinates in the
/// fractional metric, wrapping only on the periodic axes.
pub fn frac_separation(a: &Vector3<f64>, b: &Vector3<f64>, periodic: PeriodicAxes) -> f64 {
    min_image_delta(&(a - b), periodic).norm()
}

/// Minimum-image Cartesian distance between two fractional coordinates,
/// searching unit shifts on the periodic axes. Exact for any cell whose
/// nearest image lies within one lattice translation, which holds for the
/// in-plane wrapping used throughout this crate.
pub fn cartesian_separation(
    lattice: &Lattice,
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    periodic: PeriodicAxes,
) -> f64 {
    let delta = a - b;
    let range = |axis: usize| -> RangeInclusive<i32> {
        if periodic.is_periodic(axis) {
            -1..=1
        } else {
            0..=0
        }
    };
    let mut best = f64::INFINITY;
    for image in periodic_images(delta, [range(0), range(1), range(2)]) {
        let cart = lattice.fractional_to_cartesian(&image);
        best = best.min(cart.coords.norm());
    }
    best
}
