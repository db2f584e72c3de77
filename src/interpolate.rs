//! Spherical interpolation: SLERP and SQUAD.
//!
//! All functions expect unit quaternions. Interpolation always follows the shorter arc:
//! the end point is negated first when its dot product with the start is negative.
//!
//! SQUAD joins consecutive keyframes with de Casteljau-style nested slerps through two
//! auxiliary control points per segment. The control points are built from the log maps
//! of the neighbouring keyframes, so the curve passes through every keyframe with a
//! continuous angular velocity.

use crate::array::{BatchArray, QuaternionArray, RealArray};
use crate::broadcast::BroadcastPlan;
use crate::config::Tolerances;
use crate::error::{QuaternionError, QuaternionResult};
use crate::quaternion::Quaternion;
use crate::stability::unflip_sequence;
use tracing::{debug, trace};

impl Quaternion {
    /// Spherical linear interpolation from `self` (t = 0) to `other` (t = 1).
    ///
    /// Values of `t` outside `[0, 1]` extrapolate along the same great circle.
    pub fn slerp(&self, other: &Self, t: f64) -> Self {
        self.slerp_with(other, t, &Tolerances::default())
    }

    /// Spherical linear interpolation with explicit tolerances.
    ///
    /// When the arc angle is below `small_angle` the result is the normalized linear
    /// interpolation, which avoids the `0/0` of the slerp weights.
    ///
    /// Inputs are not validated. A zero or non-finite end point never raises an error
    /// here: the linear fallback is returned unnormalized when it has no direction, so
    /// a zero input yields a zero result that the next normalizing consumer reports.
    /// Callers holding unchecked data should run [`Quaternion::normalize_with`] first.
    pub fn slerp_with(&self, other: &Self, t: f64, tolerances: &Tolerances) -> Self {
        let end = other.aligned_with(self);
        let dot = self.dot(&end).clamp(-1.0, 1.0);
        let theta = dot.acos();

        if theta < tolerances.small_angle || theta.is_nan() {
            let lerp = self.scalar_multiply(1.0 - t).add(&end.scalar_multiply(t));
            return match lerp.normalize_with(tolerances) {
                Ok(unit) => unit,
                Err(error) => {
                    trace!(%error, "slerp fallback has no direction, returned unnormalized");
                    lerp
                }
            };
        }

        let sin_theta = theta.sin();
        let a = ((1.0 - t) * theta).sin() / sin_theta;
        let b = (t * theta).sin() / sin_theta;
        self.scalar_multiply(a).add(&end.scalar_multiply(b))
    }
}

/// SQUAD control point of `current` given its neighbours:
/// `current · exp(−(log(current⁻¹·next) + log(current⁻¹·prev)) / 4)`.
pub fn squad_control_point(
    prev: &Quaternion,
    current: &Quaternion,
    next: &Quaternion,
) -> QuaternionResult<Quaternion> {
    squad_control_point_with(prev, current, next, &Tolerances::default())
}

/// [`squad_control_point`] with explicit tolerances.
pub fn squad_control_point_with(
    prev: &Quaternion,
    current: &Quaternion,
    next: &Quaternion,
    tolerances: &Tolerances,
) -> QuaternionResult<Quaternion> {
    weighted_control_point(prev, current, next, 1.0, tolerances)
}

/// Control point with the `prev` log map scaled by `prev_weight` (the ratio of the
/// outgoing to the incoming time step for non-uniform keyframes).
fn weighted_control_point(
    prev: &Quaternion,
    current: &Quaternion,
    next: &Quaternion,
    prev_weight: f64,
    tolerances: &Tolerances,
) -> QuaternionResult<Quaternion> {
    let inverse = current.inverse_with(tolerances)?;
    let log_next = inverse.multiply(next).log_with(tolerances)?;
    let log_prev = inverse.multiply(prev).log_with(tolerances)?;
    let tangent = log_next.add(&log_prev.scalar_multiply(prev_weight));
    Ok(current.multiply(&tangent.scalar_multiply(-0.25).exp_with(tolerances)))
}

/// One SQUAD segment from `p` to `q` with control points `a` and `b`:
/// `slerp(slerp(p, q, t), slerp(a, b, t), 2t(1 − t))`.
pub fn squad_segment(
    p: &Quaternion,
    a: &Quaternion,
    b: &Quaternion,
    q: &Quaternion,
    t: f64,
) -> Quaternion {
    squad_segment_with(p, a, b, q, t, &Tolerances::default())
}

/// [`squad_segment`] with explicit tolerances.
pub fn squad_segment_with(
    p: &Quaternion,
    a: &Quaternion,
    b: &Quaternion,
    q: &Quaternion,
    t: f64,
    tolerances: &Tolerances,
) -> Quaternion {
    let outer = p.slerp_with(q, t, tolerances);
    let inner = a.slerp_with(b, t, tolerances);
    outer.slerp_with(&inner, 2.0 * t * (1.0 - t), tolerances)
}

/// SQUAD between `q1` (t = 0) and `q2` (t = 1) with `q0` and `q3` as outer neighbours.
///
/// The four quaternions are first made sign-continuous, so the result may be `−q2` at
/// `t = 1` when `q2` lies in the opposite hemisphere of `q1`.
pub fn squad(
    q0: &Quaternion,
    q1: &Quaternion,
    q2: &Quaternion,
    q3: &Quaternion,
    t: f64,
) -> QuaternionResult<Quaternion> {
    squad_with(q0, q1, q2, q3, t, &Tolerances::default())
}

/// [`squad`] with explicit tolerances.
pub fn squad_with(
    q0: &Quaternion,
    q1: &Quaternion,
    q2: &Quaternion,
    q3: &Quaternion,
    t: f64,
    tolerances: &Tolerances,
) -> QuaternionResult<Quaternion> {
    let mut points = [*q0, *q1, *q2, *q3];
    unflip_sequence(&mut points);
    let [q0, q1, q2, q3] = points;

    let a = squad_control_point_with(&q0, &q1, &q2, tolerances)?;
    let b = squad_control_point_with(&q1, &q2, &q3, tolerances)?;
    Ok(squad_segment_with(&q1, &a, &b, &q2, t, tolerances))
}

/// Resample a keyframe sequence with SQUAD at arbitrary query times.
///
/// `times` must be strictly increasing and have one entry per keyframe; every query time
/// must lie within `[times[0], times[n − 1]]`. Keyframes are normalized and made
/// sign-continuous first. Control points weight the incoming log map by the ratio of the
/// neighbouring time steps, and the sequence is extended at both ends by reflecting the
/// first and last steps (`R₋₁ = R₀ R₁⁻¹ R₀`, `Rₙ = Rₙ₋₁ Rₙ₋₂⁻¹ Rₙ₋₁`).
pub fn squad_sequence(
    keyframes: &[Quaternion],
    times: &[f64],
    query_times: &[f64],
) -> QuaternionResult<QuaternionArray> {
    squad_sequence_with(keyframes, times, query_times, &Tolerances::default())
}

/// [`squad_sequence`] with explicit tolerances.
pub fn squad_sequence_with(
    keyframes: &[Quaternion],
    times: &[f64],
    query_times: &[f64],
    tolerances: &Tolerances,
) -> QuaternionResult<QuaternionArray> {
    if keyframes.len() != times.len() {
        return Err(QuaternionError::InvalidArgument(format!(
            "{} keyframes but {} times",
            keyframes.len(),
            times.len()
        )));
    }
    let n = keyframes.len();
    if n < 2 {
        return Err(QuaternionError::InvalidArgument(format!(
            "squad needs at least 2 keyframes, got {n}"
        )));
    }
    if let Some(i) = times
        .windows(2)
        .position(|w| !w[0].is_finite() || !w[1].is_finite() || w[1] <= w[0])
    {
        return Err(QuaternionError::InvalidArgument(format!(
            "times must be finite and strictly increasing, but times[{}] = {} and times[{}] = {}",
            i,
            times[i],
            i + 1,
            times[i + 1]
        )));
    }
    let (start, end) = (times[0], times[n - 1]);
    if let Some(&t) = query_times
        .iter()
        .find(|t| t.is_nan() || **t < start || **t > end)
    {
        return Err(QuaternionError::InvalidArgument(format!(
            "query time {t} outside keyframe range [{start}, {end}]"
        )));
    }

    debug!(keyframes = n, queries = query_times.len(), "squad resampling");

    let mut rotors = keyframes
        .iter()
        .map(|q| q.normalize_with(tolerances))
        .collect::<QuaternionResult<Vec<_>>>()?;
    unflip_sequence(&mut rotors);

    let before = rotors[0]
        .multiply(&rotors[1].inverse_with(tolerances)?)
        .multiply(&rotors[0])
        .aligned_with(&rotors[0]);
    let after = rotors[n - 1]
        .multiply(&rotors[n - 2].inverse_with(tolerances)?)
        .multiply(&rotors[n - 1])
        .aligned_with(&rotors[n - 1]);

    // extended[i + 1] holds R_i for i in -1..=n
    let mut extended = Vec::with_capacity(n + 2);
    extended.push(before);
    extended.extend_from_slice(&rotors);
    extended.push(after);

    // step(i) = t_{i+1} - t_i, reflected at both ends
    let steps: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
    let step = |i: isize| -> f64 {
        let clamped = i.clamp(0, steps.len() as isize - 1) as usize;
        steps[clamped]
    };

    let mut controls = Vec::with_capacity(n - 1);
    for i in 0..n - 1 {
        let r_prev = &extended[i];
        let r_i = &extended[i + 1];
        let r_next = &extended[i + 2];
        let r_after = &extended[i + 3];
        let si = i as isize;

        let a = weighted_control_point(r_prev, r_i, r_next, step(si) / step(si - 1), tolerances)?;
        let b = weighted_control_point(r_after, r_next, r_i, step(si) / step(si + 1), tolerances)?;
        controls.push((a, b));
    }

    let samples = query_times
        .iter()
        .map(|&t| {
            let segment = times.partition_point(|&x| x <= t).clamp(1, n - 1) - 1;
            let tau = (t - times[segment]) / steps[segment];
            let (a, b) = &controls[segment];
            squad_segment_with(&rotors[segment], a, b, &rotors[segment + 1], tau, tolerances)
        })
        .collect();

    trace!(segments = controls.len(), "squad control points computed");
    Ok(QuaternionArray::from_vec(samples))
}

impl QuaternionArray {
    /// Element-wise slerp with broadcast end points and parameters.
    pub fn slerp(&self, other: &QuaternionArray, t: &RealArray) -> QuaternionResult<QuaternionArray> {
        self.slerp_with(other, t, &Tolerances::default())
    }

    /// Element-wise slerp with explicit tolerances.
    pub fn slerp_with(
        &self,
        other: &QuaternionArray,
        t: &RealArray,
        tolerances: &Tolerances,
    ) -> QuaternionResult<QuaternionArray> {
        debug!(
            start = %self.shape(),
            end = %other.shape(),
            t = %t.shape(),
            "slerp"
        );
        self.zip3_with(other, t, |q0, q1, t| q0.slerp_with(q1, *t, tolerances))
    }

    /// Element-wise [`squad`] with all five operands broadcast together.
    pub fn squad(
        q0: &QuaternionArray,
        q1: &QuaternionArray,
        q2: &QuaternionArray,
        q3: &QuaternionArray,
        t: &RealArray,
    ) -> QuaternionResult<QuaternionArray> {
        Self::squad_with(q0, q1, q2, q3, t, &Tolerances::default())
    }

    /// Element-wise [`squad`] with explicit tolerances.
    pub fn squad_with(
        q0: &QuaternionArray,
        q1: &QuaternionArray,
        q2: &QuaternionArray,
        q3: &QuaternionArray,
        t: &RealArray,
        tolerances: &Tolerances,
    ) -> QuaternionResult<QuaternionArray> {
        let plan = BroadcastPlan::new(&[q0.shape(), q1.shape(), q2.shape(), q3.shape(), t.shape()])?;
        debug!(shape = %plan.shape(), "squad");

        let data = plan.try_generate(|flat| {
            squad_with(
                &q0.as_slice()[plan.source(0, flat)],
                &q1.as_slice()[plan.source(1, flat)],
                &q2.as_slice()[plan.source(2, flat)],
                &q3.as_slice()[plan.source(3, flat)],
                t.as_slice()[plan.source(4, flat)],
                tolerances,
            )
        })?;
        Ok(BatchArray::from_parts_unchecked(data, plan.shape().clone()))
    }
}

// ============================================================================
// Tests
// ============================================================================
