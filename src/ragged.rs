//! Ragged shapes: multi-axis jagged index spaces.
//!
//! A shape with axes `A0..An` stores, for each inner axis `k`, the
//! exclusive prefix sums `row_splits(k)` (length `tot_size(k-1) + 1`) and
//! their inverse `row_ids(k)` (length `tot_size(k)`, mapping an element of
//! axis `k` back to its sublist on axis `k-1`). An `idxK` is a position
//! within axis `K` of one sublist; an `idx0..K` is the flat global index
//! obtained by nesting axes `0..=K`.
//!
//! [`Ragged<T>`] pairs a shape with one value per element of the last
//! axis. The handful of bulk operations here (composition, axis removal,
//! stacking, sublist max, renumbering, subsampling) are exactly what the
//! intersection needs; none of them allocate more than the output.

use crate::context::Context;

/// Exclusive prefix sum; output has one more element than the input.
pub fn exclusive_sum(counts: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(counts.len() + 1);
    let mut acc = 0usize;
    out.push(0);
    for &c in counts {
        acc += c;
        out.push(acc);
    }
    out
}

fn row_ids_from_row_splits(row_splits: &[usize]) -> Vec<usize> {
    let mut ids = Vec::with_capacity(*row_splits.last().unwrap_or(&0));
    for row in 0..row_splits.len().saturating_sub(1) {
        for _ in row_splits[row]..row_splits[row + 1] {
            ids.push(row);
        }
    }
    ids
}

#[derive(Clone, Debug)]
struct ShapeLayer {
    row_splits: Vec<usize>,
    row_ids: Vec<usize>,
}

impl ShapeLayer {
    fn from_row_splits(row_splits: Vec<usize>) -> Self {
        assert!(!row_splits.is_empty(), "row_splits must start with 0");
        assert_eq!(row_splits[0], 0, "row_splits must start with 0");
        assert!(
            row_splits.windows(2).all(|w| w[0] <= w[1]),
            "row_splits must be non-decreasing"
        );
        let row_ids = row_ids_from_row_splits(&row_splits);
        ShapeLayer {
            row_splits,
            row_ids,
        }
    }
}

/// A jagged shape over 2 or more axes.
#[derive(Clone, Debug)]
pub struct RaggedShape {
    layers: Vec<ShapeLayer>,
}

impl RaggedShape {
    /// Build a 2-axis shape from the row-splits of axis 1.
    pub fn from_row_splits(row_splits: Vec<usize>) -> Self {
        RaggedShape {
            layers: vec![ShapeLayer::from_row_splits(row_splits)],
        }
    }

    /// Build an n-axis shape from one row-splits vector per inner axis.
    pub fn from_layers(layer_splits: Vec<Vec<usize>>) -> Self {
        assert!(!layer_splits.is_empty(), "a shape needs at least 2 axes");
        let layers: Vec<ShapeLayer> = layer_splits
            .into_iter()
            .map(ShapeLayer::from_row_splits)
            .collect();
        for k in 1..layers.len() {
            assert_eq!(
                *layers[k - 1].row_splits.last().unwrap(),
                layers[k].row_splits.len() - 1,
                "row_splits of consecutive axes must chain"
            );
        }
        RaggedShape { layers }
    }

    /// A 2-axis shape with `n` rows of `m` elements each.
    pub fn regular(n: usize, m: usize) -> Self {
        RaggedShape::from_row_splits((0..=n).map(|i| i * m).collect())
    }

    pub fn num_axes(&self) -> usize {
        self.layers.len() + 1
    }

    pub fn dim0(&self) -> usize {
        self.layers[0].row_splits.len() - 1
    }

    /// Number of elements on axis `k`.
    pub fn tot_size(&self, k: usize) -> usize {
        if k == 0 {
            self.dim0()
        } else {
            *self.layers[k - 1].row_splits.last().unwrap()
        }
    }

    pub fn row_splits(&self, k: usize) -> &[usize] {
        assert!(k >= 1 && k < self.num_axes(), "no row_splits for axis {k}");
        &self.layers[k - 1].row_splits
    }

    pub fn row_ids(&self, k: usize) -> &[usize] {
        assert!(k >= 1 && k < self.num_axes(), "no row_ids for axis {k}");
        &self.layers[k - 1].row_ids
    }

    /// Largest sublist on axis 1.
    pub fn max_size(&self, k: usize) -> usize {
        let splits = self.row_splits(k);
        splits.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(0)
    }

    /// Concatenate the axes of `inner` after the axes of `self`; the last
    /// axis of `self` must have as many elements as `inner` has rows.
    pub fn compose(&self, inner: &RaggedShape) -> RaggedShape {
        assert_eq!(
            self.tot_size(self.num_axes() - 1),
            inner.dim0(),
            "composed shapes must chain"
        );
        let mut layers = self.layers.clone();
        layers.extend(inner.layers.iter().cloned());
        RaggedShape { layers }
    }

    /// Remove one axis, merging its row structure into the neighbours.
    pub fn remove_axis(&self, axis: usize) -> RaggedShape {
        let n = self.num_axes();
        assert!(n >= 3, "cannot remove an axis from a 2-axis shape");
        assert!(axis < n, "axis {axis} out of range for {n}-axis shape");
        let mut layers: Vec<ShapeLayer> = Vec::with_capacity(n - 2);
        if axis == 0 {
            layers.extend(self.layers[1..].iter().cloned());
        } else if axis == n - 1 {
            layers.extend(self.layers[..n - 2].iter().cloned());
        } else {
            layers.extend(self.layers[..axis - 1].iter().cloned());
            let outer = &self.layers[axis - 1].row_splits;
            let inner = &self.layers[axis].row_splits;
            let merged: Vec<usize> = outer.iter().map(|&i| inner[i]).collect();
            layers.push(ShapeLayer::from_row_splits(merged));
            layers.extend(self.layers[axis + 1..].iter().cloned());
        }
        RaggedShape { layers }
    }
}

/// Stack 3-axis shapes along a new axis inserted at position 1.
///
/// All shapes must share `dim0`; the result has axes
/// `[dim0][shapes.len()][..][..]` with each stacked shape's element order
/// preserved inside its slot.
pub fn stack_axis1(shapes: &[&RaggedShape]) -> RaggedShape {
    assert!(!shapes.is_empty(), "stack_axis1 needs at least one shape");
    let dim0 = shapes[0].dim0();
    for s in shapes {
        assert_eq!(s.num_axes(), 3, "stack_axis1 expects 3-axis shapes");
        assert_eq!(s.dim0(), dim0, "stacked shapes must share dim0");
    }
    let width = shapes.len();
    let mut rs2 = Vec::with_capacity(dim0 * width + 1);
    rs2.push(0);
    let mut states = 0usize;
    for f in 0..dim0 {
        for s in shapes {
            let r = s.row_splits(1);
            states += r[f + 1] - r[f];
            rs2.push(states);
        }
    }

    let mut rs3 = Vec::with_capacity(states + 1);
    rs3.push(0);
    let mut elems = 0usize;
    for f in 0..dim0 {
        for s in shapes {
            let r1 = s.row_splits(1);
            let r2 = s.row_splits(2);
            for row in r1[f]..r1[f + 1] {
                elems += r2[row + 1] - r2[row];
                rs3.push(elems);
            }
        }
    }

    RaggedShape::regular(dim0, width)
        .compose(&RaggedShape::from_row_splits(rs2))
        .compose(&RaggedShape::from_row_splits(rs3))
}

/// A shape plus one value per element of the last axis.
#[derive(Clone, Debug)]
pub struct Ragged<T> {
    pub shape: RaggedShape,
    pub values: Vec<T>,
}

impl<T> Ragged<T> {
    pub fn new(shape: RaggedShape, values: Vec<T>) -> Self {
        assert_eq!(
            values.len(),
            shape.tot_size(shape.num_axes() - 1),
            "values must cover the last axis"
        );
        Ragged { shape, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-sublist max with an identity for empty sublists.
pub fn max_per_sublist<T>(ctx: Context, row_splits: &[usize], values: &[T], identity: T) -> Vec<T>
where
    T: Copy + PartialOrd + Send + Sync,
{
    let rows = row_splits.len() - 1;
    ctx.tabulate(rows, |r| {
        let mut best = identity;
        for v in &values[row_splits[r]..row_splits[r + 1]] {
            if *v > best {
                best = *v;
            }
        }
        best
    })
}

/// A keep-mask over one axis together with the maps it induces between the
/// old and subsampled numberings.
#[derive(Clone, Debug)]
pub struct Renumbering {
    keep: Vec<bool>,
    prefix: Vec<usize>,
    new2old: Vec<usize>,
}

impl Renumbering {
    pub fn from_keep(keep: Vec<bool>) -> Self {
        let prefix = exclusive_sum(&keep.iter().map(|&k| k as usize).collect::<Vec<_>>());
        let new2old = (0..keep.len()).filter(|&i| keep[i]).collect();
        Renumbering {
            keep,
            prefix,
            new2old,
        }
    }

    /// Number of old elements the mask covers.
    pub fn len(&self) -> usize {
        self.keep.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keep.is_empty()
    }

    pub fn num_new(&self) -> usize {
        self.new2old.len()
    }

    #[inline]
    pub fn is_kept(&self, old: usize) -> bool {
        self.keep[old]
    }

    /// Kept count among old indices `[0, old)`.
    #[inline]
    pub fn prefix(&self, old: usize) -> usize {
        self.prefix[old]
    }

    /// New index of a kept old element.
    #[inline]
    pub fn to_new(&self, old: usize) -> usize {
        debug_assert!(self.keep[old], "to_new on a pruned element");
        self.prefix[old]
    }

    pub fn new2old(&self) -> &[usize] {
        &self.new2old
    }
}

/// Subsample a 4-axis shape by keep-masks over its axis-2 and axis-3
/// elements. Axes 0 and 1 are preserved.
///
/// Every kept axis-3 element must lie under a kept axis-2 element; the
/// masks the backward pass produces satisfy this by construction.
pub fn subsample_shape4(
    shape: &RaggedShape,
    states: &Renumbering,
    arcs: &Renumbering,
) -> RaggedShape {
    assert_eq!(shape.num_axes(), 4, "subsample_shape4 expects 4 axes");
    assert_eq!(states.len(), shape.tot_size(2), "state mask size mismatch");
    assert_eq!(arcs.len(), shape.tot_size(3), "arc mask size mismatch");

    let rs1 = shape.row_splits(1).to_vec();
    let old_rs2 = shape.row_splits(2);
    let old_rs3 = shape.row_splits(3);

    let rs2: Vec<usize> = old_rs2.iter().map(|&i| states.prefix(i)).collect();
    let mut rs3 = Vec::with_capacity(states.num_new() + 1);
    rs3.push(0);
    for &old_state in states.new2old() {
        rs3.push(arcs.prefix(old_rs3[old_state + 1]));
    }
    debug_assert_eq!(
        *rs3.last().unwrap(),
        arcs.num_new(),
        "kept arcs must all lie under kept states"
    );

    RaggedShape::from_layers(vec![rs1, rs2, rs3])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape3(rows1: Vec<usize>, rows2: Vec<usize>) -> RaggedShape {
        RaggedShape::from_layers(vec![rows1, rows2])
    }

    #[test]
    fn row_ids_invert_row_splits() {
        let s = RaggedShape::from_row_splits(vec![0, 2, 2, 5]);
        assert_eq!(s.row_ids(1), &[0, 0, 2, 2, 2]);
        assert_eq!(s.dim0(), 3);
        assert_eq!(s.tot_size(1), 5);
        assert_eq!(s.max_size(1), 3);
    }

    #[test]
    fn compose_chains_axes() {
        let outer = RaggedShape::from_row_splits(vec![0, 2, 3]);
        let inner = RaggedShape::from_row_splits(vec![0, 1, 1, 4]);
        let s = outer.compose(&inner);
        assert_eq!(s.num_axes(), 3);
        assert_eq!(s.tot_size(2), 4);
        assert_eq!(s.row_ids(2), &[0, 2, 2, 2]);
    }

    #[test]
    #[should_panic(expected = "chain")]
    fn compose_rejects_mismatched_shapes() {
        let outer = RaggedShape::from_row_splits(vec![0, 2]);
        let inner = RaggedShape::from_row_splits(vec![0, 1, 1, 4]);
        let _ = outer.compose(&inner);
    }

    #[test]
    fn remove_middle_axis_merges_row_structure() {
        // [2 fsas][..][..]: fsa0 has rows {2,1} elems, fsa1 has row {3}.
        let s = shape3(vec![0, 2, 3], vec![0, 2, 3, 6]);
        let flat = s.remove_axis(1);
        assert_eq!(flat.num_axes(), 2);
        assert_eq!(flat.row_splits(1), &[0, 3, 6]);
    }

    #[test]
    fn remove_first_and_last_axis() {
        let s = shape3(vec![0, 2, 3], vec![0, 2, 3, 6]);
        assert_eq!(s.remove_axis(0).row_splits(1), &[0, 2, 3, 6]);
        assert_eq!(s.remove_axis(2).row_splits(1), &[0, 2, 3]);
    }

    #[test]
    fn stack_axis1_orders_by_fsa_then_slot() {
        // Two "frames" over 2 fsas.
        let a = shape3(vec![0, 1, 2], vec![0, 2, 3]); // fsa0: 1 state/2 arcs; fsa1: 1 state/1 arc
        let b = shape3(vec![0, 2, 2], vec![0, 0, 1]); // fsa0: 2 states/1 arc; fsa1: none
        let s = stack_axis1(&[&a, &b]);
        assert_eq!(s.num_axes(), 4);
        assert_eq!(s.row_splits(1), &[0, 2, 4]);
        // axis-2 rows in (fsa, slot) order: [1, 2, 1, 0] states
        assert_eq!(s.row_splits(2), &[0, 1, 3, 4, 4]);
        // states in order: (f0,a) s0; (f0,b) s0,s1; (f1,a) s0
        assert_eq!(s.row_splits(3), &[0, 2, 2, 3, 4]);
    }

    #[test]
    fn max_per_sublist_uses_identity_for_empty_rows() {
        let m = max_per_sublist(
            Context::Sequential,
            &[0, 2, 2, 5],
            &[1.0f32, 3.0, -2.0, -1.0, 0.5],
            f32::NEG_INFINITY,
        );
        assert_eq!(m, vec![3.0, f32::NEG_INFINITY, 0.5]);
    }

    #[test]
    fn renumbering_maps_between_numberings() {
        let r = Renumbering::from_keep(vec![true, false, true, true, false]);
        assert_eq!(r.num_new(), 3);
        assert_eq!(r.new2old(), &[0, 2, 3]);
        assert_eq!(r.to_new(2), 1);
        assert_eq!(r.prefix(5), 3);
        assert!(!r.is_kept(4));
    }

    #[test]
    fn subsample_drops_masked_rows_and_elements() {
        // [1 fsa][2 slots][3 states][4 arcs]
        let s = RaggedShape::from_layers(vec![vec![0, 2], vec![0, 2, 3], vec![0, 2, 3, 4]]);
        let states = Renumbering::from_keep(vec![true, false, true]);
        let arcs = Renumbering::from_keep(vec![true, true, false, true]);
        let sub = subsample_shape4(&s, &states, &arcs);
        assert_eq!(sub.row_splits(1), &[0, 2]);
        assert_eq!(sub.row_splits(2), &[0, 1, 2]);
        assert_eq!(sub.row_splits(3), &[0, 2, 3]);
    }
}
