use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const SAMPLE_RATE: u32 = 44100;

/// Length of each pre-rendered noise loop.
pub const LOOP_SECONDS: u32 = 4;

/// Samples at the loop seam faded to zero so the wrap never clicks.
const SEAM_FADE_SAMPLES: usize = 256;

/// Background noise texture color.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NoiseKind {
    White,
    Pink,
    Brown,
}

impl NoiseKind {
    pub const ALL: [NoiseKind; 3] = [NoiseKind::White, NoiseKind::Pink, NoiseKind::Brown];

    pub fn as_str(self) -> &'static str {
        match self {
            NoiseKind::White => "white",
            NoiseKind::Pink => "pink",
            NoiseKind::Brown => "brown",
        }
    }

    pub fn parse(s: &str) -> Option<NoiseKind> {
        NoiseKind::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// Renders one loopable mono noise buffer of the given kind.
pub fn render_loop(kind: NoiseKind) -> Vec<f32> {
    let len = (SAMPLE_RATE * LOOP_SECONDS) as usize;
    let mut samples = match kind {
        NoiseKind::White => white_noise(len),
        NoiseKind::Pink => pink_noise(len),
        NoiseKind::Brown => brown_noise(len),
    };
    apply_seam_fade(&mut samples);
    samples
}

fn white_noise(len: usize) -> Vec<f32> {
    let mut rng = StdRng::from_entropy();
    (0..len).map(|_| rng.gen_range(-1.0f32..1.0) * 0.25).collect()
}

/// Pink noise via Paul Kellet's one-pole filter bank: seven filtered copies of
/// white noise summed, giving roughly -3 dB/octave across the audio band.
fn pink_noise(len: usize) -> Vec<f32> {
    let mut rng = StdRng::from_entropy();
    let (mut b0, mut b1, mut b2, mut b3, mut b4, mut b5, mut b6) =
        (0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32);

    (0..len)
        .map(|_| {
            let white = rng.gen_range(-1.0f32..1.0);
            b0 = 0.99886 * b0 + white * 0.0555179;
            b1 = 0.99332 * b1 + white * 0.0750759;
            b2 = 0.96900 * b2 + white * 0.1538520;
            b3 = 0.86650 * b3 + white * 0.3104856;
            b4 = 0.55000 * b4 + white * 0.5329522;
            b5 = -0.7616 * b5 - white * 0.0168980;
            let pink = b0 + b1 + b2 + b3 + b4 + b5 + b6 + white * 0.5362;
            b6 = white * 0.115926;
            pink * 0.11
        })
        .collect()
}

/// Brown noise: leaky-integrated white noise, then normalized to a fixed peak
/// so every generated loop lands at the same loudness.
fn brown_noise(len: usize) -> Vec<f32> {
    let mut rng = StdRng::from_entropy();
    let mut last = 0.0f32;
    let mut samples: Vec<f32> = (0..len)
        .map(|_| {
            let white = rng.gen_range(-1.0f32..1.0);
            last += white * 0.02;
            last = last.clamp(-1.0, 1.0);
            // Leak a little each sample to keep the walk off the rails.
            last *= 0.9999;
            last
        })
        .collect();

    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        let scale = 0.3 / peak;
        for s in &mut samples {
            *s *= scale;
        }
    }
    samples
}

fn apply_seam_fade(samples: &mut [f32]) {
    let fade = SEAM_FADE_SAMPLES.min(samples.len() / 2);
    for i in 0..fade {
        let gain = i as f32 / fade as f32;
        samples[i] *= gain;
        let last = samples.len() - 1 - i;
        samples[last] *= gain;
    }
}
