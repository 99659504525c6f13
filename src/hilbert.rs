//! Hilbert curve on an `n×n` grid, `n` a power of two.
//!
//! Used per level of the cell hierarchy, so `n ≤ 16` and every distance
//! fits the one-byte digit of a [`SpatialCell`](crate::SpatialCell).

#[inline]
fn rotate(n: u32, x: &mut u32, y: &mut u32, rx: u32, ry: u32) {
    if ry == 0 {
        if rx == 1 {
            *x = n - 1 - *x;
            *y = n - 1 - *y;
        }
        std::mem::swap(x, y);
    }
}

/// Distance along the curve of grid position `(x, y)`.
pub fn xy2d(n: u32, mut x: u32, mut y: u32) -> u32 {
    debug_assert!(n.is_power_of_two());
    debug_assert!(x < n && y < n);
    let mut d = 0;
    let mut s = n / 2;
    while s > 0 {
        let rx = u32::from(x & s != 0);
        let ry = u32::from(y & s != 0);
        d += s * s * ((3 * rx) ^ ry);
        rotate(n, &mut x, &mut y, rx, ry);
        s /= 2;
    }
    d
}

/// Grid position at curve distance `d`.
pub fn d2xy(n: u32, d: u32) -> (u32, u32) {
    debug_assert!(n.is_power_of_two());
    debug_assert!(d < n * n);
    let (mut x, mut y) = (0, 0);
    let mut t = d;
    let mut s = 1;
    while s < n {
        let rx = 1 & (t / 2);
        let ry = 1 & (t ^ rx);
        rotate(s, &mut x, &mut y, rx, ry);
        x += s * rx;
        y += s * ry;
        t /= 4;
        s *= 2;
    }
    (x, y)
}
