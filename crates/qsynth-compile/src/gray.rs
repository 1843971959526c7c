//! Gray-code sequencing for uniformly controlled rotations.
//!
//! A uniformly controlled rotation over `k` control wires is realized as
//! `2^k` single-qubit rotations separated by CNOTs. Walking the controls in
//! Gray-code order means exactly one control drives each CNOT, and the
//! sequence of driving controls is what [`control_ladder`] computes.

/// Reflected binary Gray code of `i`.
#[inline]
pub fn greyencode(i: usize) -> usize {
    i ^ (i >> 1)
}

/// Positions of the set bits of `n`, ascending.
pub fn svalue(n: usize) -> Vec<u32> {
    let mut bits = Vec::with_capacity(n.count_ones() as usize);
    let mut rest = n;
    while rest != 0 {
        let bit = rest.trailing_zeros();
        bits.push(bit);
        rest &= rest - 1;
    }
    bits
}

/// Signed toggles of one bit along the Gray walk over `dim` codes.
///
/// `bit_pos` is 1-based from the most significant of the `log2(dim)` bits.
/// Entry `j - 1` is `bit(g(j)) - bit(g(j - 1))` for `j` in `1..dim`: `+1`
/// when the bit is set at step `j`, `-1` when cleared, `0` when another bit
/// toggled. An out-of-range `bit_pos` never toggles.
pub fn flip_state(bit_pos: u32, dim: usize) -> Vec<i8> {
    let nbits = dim.max(1).trailing_zeros();
    let steps = dim.saturating_sub(1);
    let Some(bit) = nbits.checked_sub(bit_pos).filter(|_| bit_pos > 0) else {
        return vec![0; steps];
    };
    let bit_of = |j: usize| ((greyencode(j) >> bit) & 1) as i8;
    (1..dim).map(|j| bit_of(j) - bit_of(j - 1)).collect()
}

/// Column `i` (of `len + 1`) of the `len × (len + 1)` forward-difference
/// operator: `+1` at row `i - 1` and `-1` at row `i`, where those rows exist.
pub fn eta_col(len: usize, i: usize) -> Vec<f64> {
    let mut col = vec![0.0; len];
    if i >= 1 && i - 1 < len {
        col[i - 1] = 1.0;
    }
    if i < len {
        col[i] = -1.0;
    }
    col
}

/// Control bit driving the CNOT after each of the `2^k` rotation steps.
///
/// Step `j < 2^k - 1` uses the bit that toggles between `g(j)` and
/// `g(j + 1)`. The final step closes the cycle back to `g(0) = 0` through
/// the most significant bit. Empty when `k == 0`.
pub fn control_ladder(k: u32) -> Vec<u32> {
    if k == 0 {
        return vec![];
    }
    let dim = 1usize << k;
    let wrap = svalue(greyencode(dim - 1));
    let mut ladder = vec![wrap.last().copied().unwrap_or(k - 1); dim];
    for bit_pos in 1..=k {
        let bit = k - bit_pos;
        for (j, toggle) in flip_state(bit_pos, dim).iter().enumerate() {
            if *toggle != 0 {
                ladder[j] = bit;
            }
        }
    }
    ladder
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_greyencode_sequence() {
        let codes: Vec<usize> = (0..16).map(greyencode).collect();
        assert_eq!(
            codes,
            vec![0, 1, 3, 2, 6, 7, 5, 4, 12, 13, 15, 14, 10, 11, 9, 8]
        );
    }

    #[test]
    fn test_svalue() {
        assert_eq!(svalue(0), Vec::<u32>::new());
        assert_eq!(svalue(0b1011), vec![0, 1, 3]);
        assert_eq!(svalue(1 << 20), vec![20]);
    }

    #[test]
    fn test_flip_state_lsb() {
        assert_eq!(flip_state(3, 8), vec![1, 0, -1, 0, 1, 0, -1]);
    }

    #[test]
    fn test_flip_state_msb() {
        assert_eq!(flip_state(1, 8), vec![0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_flip_state_out_of_range() {
        assert_eq!(flip_state(0, 8), vec![0; 7]);
        assert_eq!(flip_state(4, 8), vec![0; 7]);
        assert!(flip_state(1, 1).is_empty());
    }

    #[test]
    fn test_eta_columns() {
        let cols: Vec<Vec<f64>> = (0..=4).map(|i| eta_col(4, i)).collect();
        assert_eq!(
            cols,
            vec![
                vec![-1.0, 0.0, 0.0, 0.0],
                vec![1.0, -1.0, 0.0, 0.0],
                vec![0.0, 1.0, -1.0, 0.0],
                vec![0.0, 0.0, 1.0, -1.0],
                vec![0.0, 0.0, 0.0, 1.0],
            ]
        );
    }

    #[test]
    fn test_control_ladder_small() {
        assert!(control_ladder(0).is_empty());
        assert_eq!(control_ladder(1), vec![0, 0]);
        assert_eq!(control_ladder(2), vec![0, 1, 0, 1]);
        assert_eq!(control_ladder(3), vec![0, 1, 0, 2, 0, 1, 0, 2]);
    }

    proptest! {
        #[test]
        fn gray_neighbours_differ_in_one_bit(i in 0usize..(1 << 20)) {
            let diff = greyencode(i) ^ greyencode(i + 1);
            prop_assert_eq!(diff.count_ones(), 1);
            prop_assert_eq!(svalue(diff).len(), 1);
        }

        #[test]
        fn ladder_matches_gray_transitions(k in 1u32..9) {
            let dim = 1usize << k;
            let ladder = control_ladder(k);
            prop_assert_eq!(ladder.len(), dim);
            for j in 0..dim {
                let next = greyencode((j + 1) % dim);
                let toggled = svalue(greyencode(j) ^ next);
                prop_assert_eq!(toggled, vec![ladder[j]]);
            }
        }

        #[test]
        fn flip_state_sums_to_final_bit(k in 1u32..9, pos in 1u32..9) {
            prop_assume!(pos <= k);
            let dim = 1usize << k;
            let total: i32 = flip_state(pos, dim).iter().map(|&v| i32::from(v)).sum();
            let final_bit = ((greyencode(dim - 1) >> (k - pos)) & 1) as i32;
            prop_assert_eq!(total, final_bit);
        }
    }
}
