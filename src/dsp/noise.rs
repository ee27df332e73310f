//! White noise — independent uniform samples in `[-1, 1]`, no carried state
//! beyond the generator itself.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct WhiteNoise {
    rng: ChaCha8Rng,
}

impl WhiteNoise {
    pub fn new(seed: u64) -> Self {
        WhiteNoise {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        self.rng.gen_range(-1.0..=1.0)
    }

    /// Overwrite `output` with fresh noise.
    pub fn fill(&mut self, output: &mut [f32]) {
        for sample in output.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Fill every channel of an output port.
    pub fn process(&mut self, outputs: &mut [Vec<f32>]) {
        for channel in outputs.iter_mut() {
            self.fill(channel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_range() {
        let mut noise = WhiteNoise::new(7);
        let mut buf = vec![0.0; 10_000];
        noise.fill(&mut buf);
        assert!(buf.iter().all(|&s| (-1.0..=1.0).contains(&s)));
    }

    #[test]
    fn roughly_zero_mean_and_spread() {
        let mut noise = WhiteNoise::new(42);
        let mut buf = vec![0.0; 50_000];
        noise.fill(&mut buf);
        let mean = buf.iter().map(|&s| s as f64).sum::<f64>() / buf.len() as f64;
        assert!(mean.abs() < 0.02, "mean {mean}");
        assert!(buf.iter().any(|&s| s > 0.9));
        assert!(buf.iter().any(|&s| s < -0.9));
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = WhiteNoise::new(1);
        let mut b = WhiteNoise::new(1);
        let mut c = WhiteNoise::new(2);
        let (mut xa, mut xb, mut xc) = (vec![0.0; 64], vec![0.0; 64], vec![0.0; 64]);
        a.fill(&mut xa);
        b.fill(&mut xb);
        c.fill(&mut xc);
        assert_eq!(xa, xb);
        assert_ne!(xa, xc);
    }

    #[test]
    fn channels_get_independent_samples() {
        let mut noise = WhiteNoise::new(3);
        let mut outputs = vec![vec![0.0; 128]; 2];
        noise.process(&mut outputs);
        assert_ne!(outputs[0], outputs[1]);
    }
}
