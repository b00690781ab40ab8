//! Peak finding with prominence and width, on sampled 1-D data.
//!
//! Peaks are local maxima (plateaus resolve to their midpoint). Candidates
//! are filtered by height, then prominence, then width. The width of a peak
//! is measured at `peak - prominence * rel_height` with linear interpolation
//! between samples, so its bounds are fractional indices.

/// Selection criteria, every bound is a minimum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCriteria {
    /// Minimum peak height
    pub height: Option<f64>,
    /// Minimum prominence
    pub prominence: Option<f64>,
    /// Minimum width in samples
    pub width: Option<f64>,
    /// Relative height at which the width is measured, in (0, 1]
    pub rel_height: f64,
}

impl Default for PeakCriteria {
    fn default() -> Self {
        PeakCriteria {
            height: None,
            prominence: None,
            width: None,
            rel_height: 0.5,
        }
    }
}

/// A detected peak with its attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Sample index of the peak
    pub index: usize,
    /// Value at the peak
    pub height: f64,
    /// Height above the higher of the two surrounding bases
    pub prominence: f64,
    /// Index of the lowest point on the left before a higher sample
    pub left_base: usize,
    /// Index of the lowest point on the right before a higher sample
    pub right_base: usize,
    /// Height at which the width is measured
    pub width_height: f64,
    /// Interpolated left crossing (fractional index)
    pub left_ip: f64,
    /// Interpolated right crossing (fractional index)
    pub right_ip: f64,
}

impl Peak {
    /// Width in samples at `width_height`
    pub fn width(&self) -> f64 {
        self.right_ip - self.left_ip
    }
}

// widths equal to the bound within rounding are accepted
const WIDTH_TOLERANCE: f64 = 1.0e-9;

/// Local maxima, with flat tops reduced to their (lower) middle index
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && x[i_ahead] == x[i] {
                i_ahead += 1;
            }
            if x[i_ahead] < x[i] {
                let left_edge = i;
                let right_edge = i_ahead - 1;
                peaks.push((left_edge + right_edge) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Prominence of the peak at `peak` with its left and right bases
pub fn prominence(x: &[f64], peak: usize) -> (f64, usize, usize) {
    let top = x[peak];

    let mut left_min = top;
    let mut left_base = peak;
    let mut i = peak;
    loop {
        if x[i] > top {
            break;
        }
        if x[i] < left_min {
            left_min = x[i];
            left_base = i;
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut right_min = top;
    let mut right_base = peak;
    for (j, &v) in x.iter().enumerate().skip(peak) {
        if v > top {
            break;
        }
        if v < right_min {
            right_min = v;
            right_base = j;
        }
    }

    (top - left_min.max(right_min), left_base, right_base)
}

/// Interpolated crossings of `peak - prominence * rel_height`, bounded by the bases
pub fn width_bounds(
    x: &[f64],
    peak: usize,
    prominence: f64,
    left_base: usize,
    right_base: usize,
    rel_height: f64,
) -> (f64, f64, f64) {
    let height = x[peak] - prominence * rel_height;

    let mut i = peak;
    while left_base < i && height < x[i] {
        i -= 1;
    }
    let mut left_ip = i as f64;
    if x[i] < height {
        left_ip += (height - x[i]) / (x[i + 1] - x[i]);
    }

    let mut i = peak;
    while i < right_base && height < x[i] {
        i += 1;
    }
    let mut right_ip = i as f64;
    if x[i] < height {
        right_ip -= (height - x[i]) / (x[i - 1] - x[i]);
    }

    (height, left_ip, right_ip)
}

/// Finds the peaks of `x` that satisfy `criteria`, in increasing index order.
pub fn find_peaks(x: &[f64], criteria: &PeakCriteria) -> Vec<Peak> {
    local_maxima(x)
        .into_iter()
        .filter(|&p| criteria.height.is_none_or(|h| x[p] >= h))
        .map(|p| {
            let (prom, left_base, right_base) = prominence(x, p);
            let (width_height, left_ip, right_ip) =
                width_bounds(x, p, prom, left_base, right_base, criteria.rel_height);
            Peak {
                index: p,
                height: x[p],
                prominence: prom,
                left_base,
                right_base,
                width_height,
                left_ip,
                right_ip,
            }
        })
        .filter(|peak| criteria.prominence.is_none_or(|m| peak.prominence >= m))
        .filter(|peak| {
            criteria
                .width
                .is_none_or(|w| peak.width() >= w - WIDTH_TOLERANCE)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_maxima_with_plateau() {
        let x = [0.0, 1.0, 0.0, 2.0, 2.0, 2.0, 0.0, 3.0, 3.0, 0.0, 1.0];
        // plateau 3..=5 -> 4, plateau 7..=8 -> 7, edge samples never count
        assert_eq!(local_maxima(&x), vec![1, 4, 7]);
        assert!(local_maxima(&[1.0, 2.0]).is_empty());
        // a plateau reaching the end is not a peak
        assert!(local_maxima(&[0.0, 1.0, 1.0]).is_empty());
    }

    #[test]
    fn test_prominence_uses_higher_base() {
        let x = [0.0, 5.0, 1.0, 3.0, 2.0, 4.0, -1.0];
        let (prom, left_base, right_base) = prominence(&x, 3);
        // left walk stops at 5.0 with min 1.0, right walk stops at 4.0 with min 2.0
        assert_eq!(prom, 1.0);
        assert_eq!(left_base, 2);
        assert_eq!(right_base, 4);

        let (prom, left_base, right_base) = prominence(&x, 1);
        assert_eq!(prom, 5.0);
        assert_eq!(left_base, 0);
        assert_eq!(right_base, 6);
    }

    #[test]
    fn test_width_triangle() {
        let x = [0.0, 0.0, 1.0, 2.0, 1.0, 0.0, 0.0];
        let (h, l, r) = width_bounds(&x, 3, 2.0, 0, 6, 0.5);
        assert_eq!(h, 1.0);
        assert_eq!(l, 2.0);
        assert_eq!(r, 4.0);
        let (h, l, r) = width_bounds(&x, 3, 2.0, 0, 6, 1.0);
        assert_eq!(h, 0.0);
        assert_eq!(l, 1.0);
        assert_eq!(r, 5.0);
    }

    #[test]
    fn test_single_sample_spike_has_unit_width() {
        let mut x = vec![0.0; 21];
        x[10] = 10.0;
        let peaks = find_peaks(
            &x,
            &PeakCriteria {
                height: Some(6.0),
                prominence: Some(3.0),
                width: Some(1.0),
                rel_height: 0.5,
            },
        );
        assert_eq!(peaks.len(), 1);
        let p = peaks[0];
        assert_eq!(p.index, 10);
        assert_eq!(p.prominence, 10.0);
        assert!((p.left_ip - 9.5).abs() < 1e-12);
        assert!((p.right_ip - 10.5).abs() < 1e-12);
        assert!((p.width() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_filters() {
        let x = [0.0, 2.0, 0.0, 8.0, 7.5, 8.0, 0.0, 5.0, 5.0, 5.0, 0.0];
        let all = find_peaks(&x, &PeakCriteria::default());
        assert_eq!(
            all.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![1, 3, 5, 8]
        );

        let tall = find_peaks(
            &x,
            &PeakCriteria {
                height: Some(4.0),
                ..Default::default()
            },
        );
        assert_eq!(
            tall.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![3, 5, 8]
        );

        // an equal neighbour does not stop the base search
        let prominent = find_peaks(
            &x,
            &PeakCriteria {
                prominence: Some(3.0),
                ..Default::default()
            },
        );
        assert_eq!(
            prominent.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![3, 5, 8]
        );

        let wide = find_peaks(
            &x,
            &PeakCriteria {
                width: Some(2.0),
                ..Default::default()
            },
        );
        assert_eq!(
            wide.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![3, 5, 8]
        );
        assert_eq!(wide[0].prominence, 8.0);
        assert!((wide[0].left_ip - 2.5).abs() < 1e-12);
        assert!((wide[0].right_ip - 5.5).abs() < 1e-12);
    }
}
