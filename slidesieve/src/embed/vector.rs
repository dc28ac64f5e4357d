pub type Similarity = f64;

/// A fixed-dimension feature vector describing the visual content of a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(components: Vec<f32>) -> Self {
        Self(components)
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn norm(&self) -> f64 {
        self.0
            .iter()
            .map(|&c| f64::from(c) * f64::from(c))
            .sum::<f64>()
            .sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0.0)
    }

    fn dot(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(&a, &b)| f64::from(a) * f64::from(b))
            .sum()
    }

    /// The cosine similarity to another embedding of the same dimension, in
    /// [-1, 1]. Returns None when either vector has zero norm, where the
    /// cosine is undefined.
    pub fn cosine(&self, other: &Self) -> Option<Similarity> {
        assert_eq!(
            self.dimension(),
            other.dimension(),
            "embeddings must have the same dimension"
        );

        if self.is_zero() || other.is_zero() {
            return None;
        }

        let cos = self.dot(other) / (self.norm() * other.norm());
        Some(cos.clamp(-1.0, 1.0))
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;

    fn random_embedding<R: Rng>(rng: &mut R, dimension: usize) -> Embedding {
        Embedding::new(
            (0..dimension)
                .map(|_| rng.gen_range(-1.0f32..1.0))
                .collect(),
        )
    }

    #[test]
    fn known_cosines() {
        let e1 = Embedding::new(vec![1.0, 0.0]);
        let e2 = Embedding::new(vec![0.0, 1.0]);
        assert_eq!(Some(0.0), e1.cosine(&e2));

        let a = Embedding::new(vec![1.0, 2.0, 3.0]);
        let b = Embedding::new(vec![2.0, 4.0, 6.0]);
        let cos = a.cosine(&b).unwrap();
        assert!((cos - 1.0).abs() < 1e-9);

        let c = Embedding::new(vec![-1.0, -2.0, -3.0]);
        let cos = a.cosine(&c).unwrap();
        assert!((cos + 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_is_symmetric() {
        let mut rng = SmallRng::seed_from_u64(9485);
        for _ in 0..100 {
            let a = random_embedding(&mut rng, 8);
            let b = random_embedding(&mut rng, 8);
            assert_eq!(a.cosine(&b), b.cosine(&a));
        }
    }

    #[test]
    fn cosine_stays_in_range() {
        let mut rng = SmallRng::seed_from_u64(1234);
        for _ in 0..100 {
            let a = random_embedding(&mut rng, 16);
            let b = random_embedding(&mut rng, 16);
            let cos = a.cosine(&b).unwrap();
            assert!((-1.0..=1.0).contains(&cos), "out of range: {cos}");
        }
    }

    #[test]
    fn zero_norm_has_no_cosine() {
        let zero = Embedding::new(vec![0.0; 4]);
        let other = Embedding::new(vec![1.0, 2.0, 3.0, 4.0]);

        assert!(zero.is_zero());
        assert_eq!(0.0, zero.norm());
        assert_eq!(None, zero.cosine(&other));
        assert_eq!(None, other.cosine(&zero));
        assert_eq!(None, zero.cosine(&zero));
    }

    #[test]
    fn norm() {
        let e = Embedding::new(vec![3.0, 4.0]);
        assert_eq!(5.0, e.norm());
    }

    #[test]
    #[should_panic]
    fn mismatched_dimensions_panic() {
        let a = Embedding::new(vec![1.0, 2.0]);
        let b = Embedding::new(vec![1.0, 2.0, 3.0]);
        let _ = a.cosine(&b);
    }
}
