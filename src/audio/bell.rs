use std::f32::consts::TAU;

/// Harmonic partials of the phase-transition bell: frequency ratio against the
/// fundamental and relative amplitude. The slightly inharmonic 4.2 partial is
/// what makes it read as a struck bell rather than an organ tone.
const PARTIALS: [(f32, f32); 4] = [(1.0, 1.0), (2.0, 0.55), (3.0, 0.30), (4.2, 0.18)];

const FUNDAMENTAL_HZ: f32 = 432.0;
const BELL_SECONDS: f32 = 1.6;

/// Subtle pitch modulation on the fundamental only.
const VIBRATO_HZ: f32 = 5.0;
const VIBRATO_DEPTH: f32 = 0.003;

/// Short attack ramp so the onset does not click.
const ATTACK_SECONDS: f32 = 0.01;

/// Renders one bell strike as a mono buffer: each partial is a decaying sine,
/// higher partials decaying faster, summed and normalized so the output never
/// exceeds `volume`.
pub fn render(sample_rate: u32, volume: f32) -> Vec<f32> {
    let len = (sample_rate as f32 * BELL_SECONDS) as usize;
    let norm: f32 = PARTIALS.iter().map(|(_, amp)| amp).sum();
    let volume = volume.clamp(0.0, 1.0);

    let mut fundamental_phase = 0.0f32;
    let mut samples = Vec::with_capacity(len);

    for i in 0..len {
        let t = i as f32 / sample_rate as f32;
        let attack = (t / ATTACK_SECONDS).min(1.0);

        // Integrate the vibrato-modulated frequency for the fundamental so the
        // modulation bends pitch instead of jumping phase.
        let f0 = FUNDAMENTAL_HZ * (1.0 + VIBRATO_DEPTH * (TAU * VIBRATO_HZ * t).sin());
        fundamental_phase += TAU * f0 / sample_rate as f32;

        let mut sample = 0.0f32;
        for (ratio, amp) in PARTIALS {
            let envelope = (-t * (2.5 + 1.5 * ratio)).exp();
            let osc = if ratio == 1.0 {
                fundamental_phase.sin()
            } else {
                (TAU * FUNDAMENTAL_HZ * ratio * t).sin()
            };
            sample += amp * envelope * osc;
        }

        samples.push(sample / norm * attack * volume);
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::noise::SAMPLE_RATE;

    fn rms(window: &[f32]) -> f32 {
        (window.iter().map(|s| s * s).sum::<f32>() / window.len() as f32).sqrt()
    }

    #[test]
    fn bell_has_the_expected_length() {
        let buf = render(SAMPLE_RATE, 0.8);
        assert_eq!(buf.len(), (SAMPLE_RATE as f32 * BELL_SECONDS) as usize);
    }

    #[test]
    fn bell_stays_within_its_volume() {
        let buf = render(SAMPLE_RATE, 0.5);
        assert!(buf.iter().all(|s| s.abs() <= 0.5 + 1e-6));
    }

    #[test]
    fn envelope_decays_toward_the_tail() {
        let buf = render(SAMPLE_RATE, 1.0);
        let tenth = buf.len() / 10;
        let head = rms(&buf[..tenth]);
        let tail = rms(&buf[buf.len() - tenth..]);
        assert!(tail < head * 0.2, "head rms {} tail rms {}", head, tail);
    }

    #[test]
    fn zero_volume_renders_silence() {
        let buf = render(SAMPLE_RATE, 0.0);
        assert!(buf.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn onset_is_attack_faded() {
        let buf = render(SAMPLE_RATE, 1.0);
        assert_eq!(buf[0], 0.0);
        assert!(buf[1].abs() < 0.05);
    }
}
