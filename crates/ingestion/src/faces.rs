//! S1: face extraction & clustering. Detects faces in images and sampled
//! video frames, pads and crops each detection, then groups every
//! encoding across the whole event with a strict density-based clusterer.

use crate::media::{MediaFile, MediaKind};
use image::ImageFormat;
use rand::seq::SliceRandom;
use remind_config::constants::ingestion::{
    FACE_CLUSTER_EPS, FACE_CLUSTER_MIN_SAMPLES, FACE_CROP_MARGIN_RATIO, MAX_SAMPLED_FACES,
    VIDEO_SAMPLE_FPS,
};
use remind_core::traits::face_recognition::BBox;
use remind_core::traits::{AudioDecoderAdapter, FaceRecognitionAdapter};
use remind_core::{FaceCluster, FaceSourceRef, FaceSourceType, Result};
use std::io::Cursor;
use std::sync::Arc;

/// One face observation before clustering: its crop, encoding, and where
/// it came from.
struct Detection {
    crop: Vec<u8>,
    encoding: Vec<f32>,
    source: FaceSourceRef,
}

/// Runs S1 over every media file in one event folder and returns the
/// resulting clusters, each a candidate Person pending caregiver review.
pub async fn extract_and_cluster(
    face_recognition: &Arc<dyn FaceRecognitionAdapter>,
    audio_decoder: &Arc<dyn AudioDecoderAdapter>,
    event_name: &str,
    files: &[MediaFile],
) -> Result<Vec<FaceCluster>> {
    let mut detections = Vec::new();

    for file in files {
        match file.kind {
            MediaKind::Image => {
                let found = locate_in_image(face_recognition, &file.bytes).await?;
                for (bbox, encoding) in found {
                    let crop = crop_with_margin(&file.bytes, bbox);
                    detections.push(Detection {
                        crop,
                        encoding,
                        source: FaceSourceRef {
                            event_name: event_name.to_string(),
                            file_name: file.file_name.clone(),
                            source_type: FaceSourceType::Image,
                        },
                    });
                }
            }
            MediaKind::Video => {
                let frames = audio_decoder
                    .sample_frames(&file.bytes, VIDEO_SAMPLE_FPS)
                    .await?;
                for frame in frames {
                    let found = locate_in_image(face_recognition, &frame).await?;
                    for (bbox, encoding) in found {
                        let crop = crop_with_margin(&frame, bbox);
                        detections.push(Detection {
                            crop,
                            encoding,
                            source: FaceSourceRef {
                                event_name: event_name.to_string(),
                                file_name: file.file_name.clone(),
                                source_type: FaceSourceType::VideoFrame,
                            },
                        });
                    }
                }
            }
        }
    }

    if detections.is_empty() {
        return Ok(Vec::new());
    }

    let encodings: Vec<Vec<f32>> = detections.iter().map(|d| d.encoding.clone()).collect();
    let labels = face_recognition
        .cluster(&encodings, FACE_CLUSTER_EPS)
        .await?;
    debug_assert!(FACE_CLUSTER_MIN_SAMPLES >= 1);

    Ok(build_clusters(detections, labels))
}

async fn locate_in_image(
    face_recognition: &Arc<dyn FaceRecognitionAdapter>,
    bytes: &[u8],
) -> Result<Vec<(BBox, Vec<f32>)>> {
    face_recognition.locate_and_encode(bytes).await
}

/// Groups detections by cluster label, producing one [`FaceCluster`] per
/// distinct label with up to [`MAX_SAMPLED_FACES`] randomly sampled crops.
fn build_clusters(detections: Vec<Detection>, labels: Vec<i32>) -> Vec<FaceCluster> {
    use std::collections::BTreeMap;

    let mut by_label: BTreeMap<i32, Vec<Detection>> = BTreeMap::new();
    for (detection, label) in detections.into_iter().zip(labels) {
        by_label.entry(label).or_default().push(detection);
    }

    let mut rng = rand::thread_rng();
    by_label
        .into_iter()
        .map(|(label, members)| {
            let encodings: Vec<Vec<f32>> = members.iter().map(|d| d.encoding.clone()).collect();
            let source_refs: Vec<FaceSourceRef> = members.iter().map(|d| d.source.clone()).collect();

            let mut indices: Vec<usize> = (0..members.len()).collect();
            indices.shuffle(&mut rng);
            indices.truncate(MAX_SAMPLED_FACES);
            indices.sort();

            let sampled_faces: Vec<String> = indices
                .into_iter()
                .map(|i| as_data_uri(&members[i].crop))
                .collect();

            FaceCluster {
                cluster_id: label.max(0) as u32,
                encodings,
                sampled_faces,
                source_refs,
            }
        })
        .collect()
}

/// Embeds a PNG crop as a `data:` URI so a review bundle can be returned
/// directly in a JSON response body without a separate upload round trip.
fn as_data_uri(png_bytes: &[u8]) -> String {
    use base64::Engine;
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png_bytes)
    )
}

/// Pads `bbox` by [`FACE_CROP_MARGIN_RATIO`] of its larger side on every
/// edge, clamped to the source image bounds, and crops. Falls back to the
/// original bytes if the image can't be decoded (never aborts ingestion
/// over one bad frame).
fn crop_with_margin(image_bytes: &[u8], bbox: BBox) -> Vec<u8> {
    let Ok(image) = image::load_from_memory(image_bytes) else {
        return image_bytes.to_vec();
    };

    let (width, height) = (image.width(), image.height());
    let margin = ((bbox.width.max(bbox.height)) as f32 * FACE_CROP_MARGIN_RATIO) as u32;

    let x0 = bbox.x.saturating_sub(margin);
    let y0 = bbox.y.saturating_sub(margin);
    let x1 = (bbox.x + bbox.width + margin).min(width);
    let y1 = (bbox.y + bbox.height + margin).min(height);

    if x1 <= x0 || y1 <= y0 {
        return image_bytes.to_vec();
    }

    let cropped = image.crop_imm(x0, y0, x1 - x0, y1 - y0);
    let mut out = Cursor::new(Vec::new());
    match cropped.write_to(&mut out, ImageFormat::Png) {
        Ok(()) => out.into_inner(),
        Err(_) => image_bytes.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use async_trait::async_trait;
    use remind_core::Result as CoreResult;
    use remind_core::traits::audio_decoder::fixtures::FixedAudioDecoder;

    /// Reports one face per image/frame at a fixed bbox, encoded as the
    /// byte length so distinct inputs cluster distinctly.
    struct FixedFaceRecognition {
        cluster_labels: Vec<i32>,
    }

    #[async_trait]
    impl FaceRecognitionAdapter for FixedFaceRecognition {
        async fn locate_and_encode(&self, image: &[u8]) -> CoreResult<Vec<(BBox, Vec<f32>)>> {
            Ok(vec![(
                BBox { x: 2, y: 2, width: 2, height: 2 },
                vec![image.len() as f32],
            )])
        }

        async fn cluster(&self, encodings: &[Vec<f32>], _tolerance: f32) -> CoreResult<Vec<i32>> {
            Ok(self.cluster_labels.iter().copied().take(encodings.len()).collect())
        }
    }

    fn tiny_png() -> Vec<u8> {
        use image::{ImageBuffer, Rgb};
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(8, 8, Rgb([10, 20, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn groups_detections_into_clusters_by_label() {
        let face_recognition: Arc<dyn FaceRecognitionAdapter> =
            Arc::new(FixedFaceRecognition { cluster_labels: vec![0, 1] });
        let audio_decoder: Arc<dyn AudioDecoderAdapter> = Arc::new(FixedAudioDecoder { frame_count: 1 });

        let files = vec![
            MediaFile { file_name: "a.png".into(), bytes: tiny_png(), kind: MediaKind::Image },
            MediaFile { file_name: "b.png".into(), bytes: vec![0u8; 9], kind: MediaKind::Image },
        ];

        let clusters = extract_and_cluster(&face_recognition, &audio_decoder, "trip", &files)
            .await
            .unwrap();
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| !c.sampled_faces.is_empty()));
    }

    #[tokio::test]
    async fn video_frames_are_sampled_and_detected() {
        let face_recognition: Arc<dyn FaceRecognitionAdapter> =
            Arc::new(FixedFaceRecognition { cluster_labels: vec![0, 0, 0] });
        let audio_decoder: Arc<dyn AudioDecoderAdapter> = Arc::new(FixedAudioDecoder { frame_count: 3 });

        let files = vec![MediaFile {
            file_name: "clip.mp4".into(),
            bytes: vec![1u8; 20],
            kind: MediaKind::Video,
        }];

        let clusters = extract_and_cluster(&face_recognition, &audio_decoder, "trip", &files)
            .await
            .unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].source_refs.len(), 3);
        assert!(clusters[0]
            .source_refs
            .iter()
            .all(|r| r.source_type == FaceSourceType::VideoFrame));
    }

    #[tokio::test]
    async fn no_detections_yields_no_clusters() {
        struct EmptyFaceRecognition;
        #[async_trait]
        impl FaceRecognitionAdapter for EmptyFaceRecognition {
            async fn locate_and_encode(&self, _image: &[u8]) -> CoreResult<Vec<(BBox, Vec<f32>)>> {
                Ok(vec![])
            }
            async fn cluster(&self, _encodings: &[Vec<f32>], _tolerance: f32) -> CoreResult<Vec<i32>> {
                Ok(vec![])
            }
        }
        let face_recognition: Arc<dyn FaceRecognitionAdapter> = Arc::new(EmptyFaceRecognition);
        let audio_decoder: Arc<dyn AudioDecoderAdapter> = Arc::new(FixedAudioDecoder { frame_count: 1 });
        let files = vec![MediaFile { file_name: "a.png".into(), bytes: tiny_png(), kind: MediaKind::Image }];
        let clusters = extract_and_cluster(&face_recognition, &audio_decoder, "trip", &files)
            .await
            .unwrap();
        assert!(clusters.is_empty());
    }
}
