use super::butterworth::Biquad;

/// Odd-extension length used on each side of the signal before the
/// forward-backward passes.
pub fn pad_len(sections: &[Biquad]) -> usize {
    3 * (2 * sections.len() + 1)
}

/// Forward-backward filtering with odd-extended edges and steady-state
/// initial conditions. Callers guarantee `data.len() > pad_len(sections)`.
pub fn filtfilt(sections: &[Biquad], data: &[f64]) -> Vec<f64> {
    let edge = pad_len(sections);
    debug_assert!(data.len() > edge);
    let zi = steady_state(sections);

    let mut ext = odd_extend(data, edge);
    let x0 = ext[0];
    run_cascade(sections, &mut ext, &zi, x0);

    ext.reverse();
    let y0 = ext[0];
    run_cascade(sections, &mut ext, &zi, y0);
    ext.reverse();

    ext[edge..edge + data.len()].to_vec()
}

/// Per-section states that make the cascade's response to a constant input
/// start in steady state.
fn steady_state(sections: &[Biquad]) -> Vec<[f64; 2]> {
    let mut scale = 1.0;
    sections
        .iter()
        .map(|s| {
            let [z0, z1] = s.step_state();
            let zi = [z0 * scale, z1 * scale];
            scale *= s.dc_gain();
            zi
        })
        .collect()
}

fn run_cascade(sections: &[Biquad], data: &mut [f64], zi: &[[f64; 2]], level: f64) {
    for (s, init) in sections.iter().zip(zi) {
        let mut z = [init[0] * level, init[1] * level];
        for x in data.iter_mut() {
            let input = *x;
            let y = s.b[0] * input + z[0];
            z[0] = s.b[1] * input + z[1] - s.a[1] * y;
            z[1] = s.b[2] * input - s.a[2] * y;
            *x = y;
        }
    }
}

fn odd_extend(data: &[f64], edge: usize) -> Vec<f64> {
    let n = data.len();
    let first = data[0];
    let last = data[n - 1];
    let mut out = Vec::with_capacity(n + 2 * edge);
    out.extend((1..=edge).rev().map(|i| 2.0 * first - data[i]));
    out.extend_from_slice(data);
    out.extend((1..=edge).map(|i| 2.0 * last - data[n - 1 - i]));
    out
}
