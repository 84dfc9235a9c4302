use crate::error::Result;
use async_trait::async_trait;

/// An axis-aligned bounding box in source image coordinates.
#[derive(Debug, Clone, Copy)]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Face detection + encoding + clustering, used by ingestion stage S1.
#[async_trait]
pub trait FaceRecognitionAdapter: Send + Sync {
    async fn locate_and_encode(&self, image: &[u8]) -> Result<Vec<(BBox, Vec<f32>)>>;

    /// Groups `encodings` with the given clustering tolerance; returns one
    /// cluster label per input encoding, in the same order. Label `-1` is
    /// never returned (`min_samples=1` strict clustering assigns every
    /// encoding a cluster).
    async fn cluster(&self, encodings: &[Vec<f32>], tolerance: f32) -> Result<Vec<i32>>;
}
