//! Peak detection in sampled signals.
//!
//! Peaks are local maxima, possibly flat, which are strictly higher than their direct
//! neighbors. Each peak is characterized by its prominence, i.e., its height above the
//! highest of the lowest points reached on both sides before a higher sample, and by its
//! width at half prominence, measured in samples with linear interpolation.

/// A peak of a sampled signal.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Peak {
    /// Sample index of the peak. For flat peaks, the middle of the plateau (rounded down).
    pub index: usize,
    pub prominence: f64,
    /// Width at half prominence, in samples.
    pub width: f64,
    /// Interpolated positions of the left and right half-prominence crossings.
    pub left_ip: f64,
    pub right_ip: f64,
}

/// Returns the indices of all local maxima of the signal.
/// A maximum can be flat; the first and last samples are never maxima.
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut maxima = vec![];
    if x.len() < 3 {
        return maxima;
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
                maxima.push((i + i_ahead - 1) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }

    maxima
}

/// Returns the prominence of the peak together with its left and right bases.
fn prominence(x: &[f64], peak: usize) -> (f64, usize, usize) {
    let height = x[peak];

    let mut left_min = height;
    let mut left_base = peak;
    for (i, v) in x[..=peak].iter().enumerate().rev() {
        if *v > height {
            break;
        }
        if *v < left_min {
            left_min = *v;
            left_base = i;
        }
    }

    let mut right_min = height;
    let mut right_base = peak;
    for (i, v) in x.iter().enumerate().skip(peak) {
        if *v > height {
            break;
        }
        if *v < right_min {
            right_min = *v;
            right_base = i;
        }
    }

    (height - left_min.max(right_min), left_base, right_base)
}

/// Returns the interpolated positions where the signal crosses `height` on both sides of the
/// peak, searching no further than the bases.
fn crossings(
    x: &[f64],
    peak: usize,
    height: f64,
    left_base: usize,
    right_base: usize,
) -> (f64, f64) {
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

    (left_ip, right_ip)
}

/// Find all peaks of the signal, in increasing index order.
pub fn find_all(x: &[f64]) -> Vec<Peak> {
    local_maxima(x)
        .into_iter()
        .map(|index| {
            let (prominence, left_base, right_base) = prominence(x, index);
            let height = x[index] - 0.5 * prominence;
            let (left_ip, right_ip) = crossings(x, index, height, left_base, right_base);
            Peak {
                index,
                prominence,
                width: right_ip - left_ip,
                left_ip,
                right_ip,
            }
        })
        .collect()
}

/// Find the peaks of the signal at least `min_width` samples wide at half prominence.
pub fn find_peaks(x: &[f64], min_width: f64) -> Vec<Peak> {
    find_all(x)
        .into_iter()
        .filter(|peak| peak.width >= min_width)
        .collect()
}
