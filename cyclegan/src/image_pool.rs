//! History of generated images.
//!
//! Discriminators are updated with a mix of the latest fakes and fakes produced
//! by earlier generator states, which keeps them from chasing the most recent
//! generator only.

use burn::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A bounded buffer of previously generated images of one domain.
#[derive(Debug, Clone)]
pub struct ImagePool<B: Backend> {
    pool_size: usize,
    images: Vec<Tensor<B, 4>>,
    rng: StdRng,
}

impl<B: Backend> ImagePool<B> {
    /// Create an empty pool. A `pool_size` of 0 disables the buffer.
    pub fn new(pool_size: usize, seed: u64) -> Self {
        Self {
            pool_size,
            images: Vec::with_capacity(pool_size),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Maximum number of stored images.
    pub const fn capacity(&self) -> usize {
        self.pool_size
    }

    /// Return a batch of the same shape, drawn from the latest images and the history.
    ///
    /// Each image of the batch is detached and handled on its own. While the pool is
    /// not full it is stored and returned as is. Once full, with probability 0.5 it
    /// replaces a random stored image and that older image is returned instead;
    /// otherwise it is returned unchanged.
    ///
    /// # Shapes
    /// - images: `[batch_size, channels, height, width]`
    /// - output: `[batch_size, channels, height, width]`
    pub fn query(&mut self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        if self.pool_size == 0 {
            return images;
        }

        let returned: Vec<_> = images
            .detach()
            .iter_dim(0)
            .map(|image| self.exchange(image))
            .collect();

        Tensor::cat(returned, 0)
    }

    fn exchange(&mut self, image: Tensor<B, 4>) -> Tensor<B, 4> {
        if self.images.len() < self.pool_size {
            self.images.push(image.clone());
            return image;
        }

        if self.rng.gen::<f64>() > 0.5 {
            let index = self.rng.gen_range(0..self.pool_size);
            core::mem::replace(&mut self.images[index], image)
        } else {
            image
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArray, Autodiff};

    type TestBackend = Autodiff<NdArray<f32>>;

    fn batch(values: &[f32]) -> Tensor<TestBackend, 4> {
        let device = Default::default();
        let images = values
            .iter()
            .map(|&value| Tensor::full([1, 2, 3, 3], value, &device))
            .collect();
        Tensor::cat(images, 0)
    }

    fn sample_values(tensor: Tensor<TestBackend, 4>) -> Vec<f32> {
        tensor
            .mean_dim(3)
            .mean_dim(2)
            .mean_dim(1)
            .into_data()
            .iter::<f32>()
            .collect()
    }

    #[test]
    fn empty_pool_is_pass_through() {
        let mut pool = ImagePool::new(0, 0);

        for _ in 0..3 {
            let output = pool.query(batch(&[1.0, 2.0]));
            assert_eq!(sample_values(output), vec![1.0, 2.0]);
        }
        assert!(pool.is_empty());
    }

    #[test]
    fn fills_before_exchanging() {
        let mut pool = ImagePool::new(3, 7);

        let output = pool.query(batch(&[1.0, 2.0]));
        assert_eq!(sample_values(output), vec![1.0, 2.0]);
        assert_eq!(pool.len(), 2);

        // The first image fills the last slot and comes back unchanged.
        let output = pool.query(batch(&[3.0]));
        assert_eq!(sample_values(output), vec![3.0]);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.capacity(), 3);
    }

    #[test]
    fn full_pool_returns_fresh_or_stored_images() {
        let mut pool = ImagePool::new(2, 42);
        pool.query(batch(&[1.0, 2.0]));

        let mut seen_history = false;
        for step in 0..32 {
            let fresh = 10.0 + step as f32;
            let output = pool.query(batch(&[fresh]));

            assert_eq!(output.dims(), [1, 2, 3, 3]);
            assert_eq!(pool.len(), 2);
            let value = sample_values(output)[0];
            if value != fresh {
                seen_history = true;
                assert!(value < fresh);
            }
        }

        assert!(seen_history);
    }

    #[test]
    fn returned_images_are_detached() {
        let device = Default::default();
        let source = Tensor::<TestBackend, 4>::ones([2, 1, 2, 2], &device).require_grad();
        let mut pool = ImagePool::new(4, 0);

        let output = pool.query(source.clone().mul_scalar(2.0));
        let grads = output.sum().backward();

        assert!(source.grad(&grads).is_none());
    }
}
