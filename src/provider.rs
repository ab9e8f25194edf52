//! Pluggable background-image sourcing
//!
//! The core never fetches anything itself; it only needs "given a width and
//! height, produce a URL". Hosts can swap the default public photo service
//! for their own endpoint by implementing [`ImageProvider`] or passing a
//! closure.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::PICSUM_MAX_ID;

/// URL source for puzzle background images
pub trait ImageProvider {
    /// Produce a URL for an image of the given dimensions. Called again
    /// with the same dimensions for every load retry, so randomized
    /// providers get a fresh chance each attempt.
    fn image_url(&mut self, width: u32, height: u32) -> String;
}

/// Closures work as providers directly
impl<F: FnMut(u32, u32) -> String> ImageProvider for F {
    fn image_url(&mut self, width: u32, height: u32) -> String {
        self(width, height)
    }
}

/// Default provider: random photos from picsum.photos keyed by id
pub struct PicsumProvider {
    rng: Pcg32,
}

impl PicsumProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl ImageProvider for PicsumProvider {
    fn image_url(&mut self, width: u32, height: u32) -> String {
        let id = self.rng.random_range(0..=PICSUM_MAX_ID);
        format!("https://picsum.photos/{width}/{height}/?image={id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picsum_url_shape() {
        let mut provider = PicsumProvider::new(1);
        let url = provider.image_url(310, 155);
        assert!(url.starts_with("https://picsum.photos/310/155/?image="));
        let id: u32 = url.rsplit('=').next().unwrap().parse().unwrap();
        assert!(id <= PICSUM_MAX_ID);
    }

    #[test]
    fn test_picsum_is_deterministic_per_seed() {
        let mut a = PicsumProvider::new(42);
        let mut b = PicsumProvider::new(42);
        assert_eq!(a.image_url(310, 155), b.image_url(310, 155));
    }

    #[test]
    fn test_closure_provider() {
        let mut provider = |w: u32, h: u32| format!("/bg?w={w}&h={h}");
        assert_eq!(provider.image_url(310, 155), "/bg?w=310&h=155");
    }
}
